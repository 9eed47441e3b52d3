//! Track loading.
//!
//! Fetching runs on the async runtime; decoding happens later on the
//! audio output.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::error::SoundError;
use super::source::SoundSource;

/// Loads the raw bytes of a track.
pub trait SoundFetcher: Send + Sync + 'static {
    /// Returns the encoded track data.
    fn fetch(&self, source: &SoundSource) -> impl Future<Output = Result<Vec<u8>, SoundError>> + Send;
}

/// Fetches URLs over HTTP and paths from disk.
#[derive(Debug, Clone)]
pub struct HttpSoundFetcher {
    client: Client,
}

impl HttpSoundFetcher {
    /// Creates a fetcher whose downloads give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SoundError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SoundError::FetchError(e.to_string()))?;
        Ok(Self { client })
    }
}

impl SoundFetcher for HttpSoundFetcher {
    async fn fetch(&self, source: &SoundSource) -> Result<Vec<u8>, SoundError> {
        match source {
            SoundSource::Url(url) => {
                debug!(%url, "downloading track");
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| SoundError::FetchError(e.to_string()))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| SoundError::FetchError(e.to_string()))?;
                Ok(bytes.to_vec())
            }
            SoundSource::File(path) => {
                debug!(path = %path.display(), "reading track");
                tokio::fs::read(path)
                    .await
                    .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))
            }
        }
    }
}

/// Mock fetcher for testing.
#[derive(Debug)]
pub struct MockSoundFetcher {
    fetch_calls: Mutex<Vec<SoundSource>>,
    should_fail: AtomicBool,
    data: Vec<u8>,
}

impl MockSoundFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fetch_calls: Mutex::new(Vec::new()),
            should_fail: AtomicBool::new(false),
            data: b"mock-track".to_vec(),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.lock().unwrap().len()
    }

    pub fn fetch_calls(&self) -> Vec<SoundSource> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

impl Default for MockSoundFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundFetcher for MockSoundFetcher {
    async fn fetch(&self, source: &SoundSource) -> Result<Vec<u8>, SoundError> {
        self.fetch_calls.lock().unwrap().push(source.clone());
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::FetchError("mock fetch failure".to_string()));
        }
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_local_file() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(b"RIFF").unwrap();

        let fetcher = HttpSoundFetcher::new(Duration::from_secs(1)).unwrap();
        let data = fetcher
            .fetch(&SoundSource::file(file.path()))
            .await
            .unwrap();
        assert_eq!(data, b"RIFF");
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let fetcher = HttpSoundFetcher::new(Duration::from_secs(1)).unwrap();
        let err = fetcher
            .fetch(&SoundSource::file("/nonexistent/track.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, SoundError::FileNotFound(_)));
        assert!(err.is_load_error());
    }

    #[tokio::test]
    async fn test_mock_records_and_fails() {
        let fetcher = MockSoundFetcher::new();
        let source = SoundSource::url("https://example.com/a.mp3");

        assert!(fetcher.fetch(&source).await.is_ok());
        fetcher.set_should_fail(true);
        assert!(fetcher.fetch(&source).await.is_err());

        assert_eq!(fetcher.fetch_count(), 2);
        assert_eq!(fetcher.fetch_calls()[0], source);
    }
}
