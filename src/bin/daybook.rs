use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    daybook::cli::run().await
}
