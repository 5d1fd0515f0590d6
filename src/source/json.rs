use crate::model::RawEvent;
use crate::source::memory::MemorySource;
use crate::source::{EventPage, EventSource, FetchError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Events exported as a JSON array, paged like [`MemorySource`].
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    inner: MemorySource,
}

impl JsonFileSource {
    pub async fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self, FetchError> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path).await?;
        let events: Vec<RawEvent> = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), count = events.len(), "loaded events file");
        Ok(Self {
            inner: MemorySource::new(events, page_size),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl EventSource for JsonFileSource {
    async fn fetch_by_course(
        &self,
        course_id: i64,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError> {
        self.inner.fetch_by_course(course_id, cursor, search).await
    }

    async fn fetch_by_timesort(
        &self,
        cursor: Option<i64>,
        search: &str,
    ) -> Result<EventPage, FetchError> {
        self.inner.fetch_by_timesort(cursor, search).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_events_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 2, "name": "B", "timesort": 20, "eventtype": "due"}},
                {{"id": 1, "name": "A", "timesort": 10, "eventtype": "due"}}]"#
        )
        .unwrap();

        let source = JsonFileSource::open(file.path(), 5).await.unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.path(), file.path());

        let page = source.fetch_by_timesort(None, "").await.unwrap();
        let ids: Vec<i64> = page.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            JsonFileSource::open(file.path(), 5).await,
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonFileSource::open(dir.path().join("nope.json"), 5).await,
            Err(FetchError::Io(_))
        ));
    }
}
