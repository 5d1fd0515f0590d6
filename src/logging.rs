use std::io::IsTerminal;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Filter directives read from the environment, e.g. `DAYBOOK_LOG=daybook::section=trace`.
pub const LOG_ENV_VAR: &str = "DAYBOOK_LOG";

/// Each `-v` raises the level by one step and each `-q` lowers it, starting
/// from warnings.
pub fn verbosity(verbose: u8, quiet: u8) -> LevelFilter {
    match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-1 => LevelFilter::ERROR,
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global fmt subscriber on stderr. Directives in
/// [`LOG_ENV_VAR`] are layered on top of the verbosity level. A subscriber
/// installed earlier (tests, embedding apps) is left in place.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity(verbose, quiet).into())
        .with_env_var(LOG_ENV_VAR)
        .from_env()?;

    if let Err(err) = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
    {
        debug!(error = %err, "tracing subscriber already set");
    }
    Ok(())
}
