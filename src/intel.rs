//! Intel gathering
//!
//! One GET per cycle against a fixed endpoint. The outcome is always
//! reduced to a human-readable line; a failed fetch is data, not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Something that can produce a short piece of text from the outside world
#[async_trait]
pub trait IntelSource: Send + Sync {
    /// Fetch one payload. Any error is reported, never retried.
    async fn fetch(&self) -> Result<String>;
}

/// HTTP GET against a fixed URL with a request timeout
pub struct HttpIntel {
    client: reqwest::Client,
    url: String,
}

impl HttpIntel {
    /// Build a source for `url` that gives up after `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("viren/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl IntelSource for HttpIntel {
    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        let text = response.error_for_status()?.text().await?;
        Ok(text)
    }
}

/// Outcome of one intel attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntelReport {
    /// Payload fetched and written to `path`
    Fetched {
        /// Trimmed payload
        data: String,
        /// Intel artifact for this cycle
        path: PathBuf,
    },
    /// Fetch or write failed; no artifact exists for this cycle
    Failed {
        /// Rendered error chain
        error: String,
    },
}

impl IntelReport {
    /// Line stored in state and the cycle log
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Fetched { data, .. } => format!("Fetched intel: {data}"),
            Self::Failed { error } => format!("Failed to gather intel: {error}"),
        }
    }

    /// Whether the fetch succeeded
    #[must_use]
    pub const fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// Fetch intel and, on success, write it to `path`.
///
/// Never returns an error: every fault becomes [`IntelReport::Failed`].
pub async fn gather_intel(source: &dyn IntelSource, path: &Path) -> IntelReport {
    match fetch_and_store(source, path).await {
        Ok(data) => {
            tracing::info!(path = %path.display(), "intel stored");
            IntelReport::Fetched {
                data,
                path: path.to_path_buf(),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "intel fetch failed");
            IntelReport::Failed {
                error: format!("{err:#}"),
            }
        }
    }
}

async fn fetch_and_store(source: &dyn IntelSource, path: &Path) -> Result<String> {
    let data = source.fetch().await?.trim().to_string();
    std::fs::write(path, format!("{data}\n"))
        .with_context(|| format!("Failed to write intel: {}", path.display()))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixed(&'static str);

    #[async_trait]
    impl IntelSource for Fixed {
        async fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl IntelSource for Broken {
        async fn fetch(&self) -> Result<String> {
            Err(anyhow!("network unreachable"))
        }
    }

    #[tokio::test]
    async fn test_success_writes_trimmed_payload_with_newline() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("intel_1.txt");

        let report = gather_intel(&Fixed("  Keep it logically awesome.\n"), &target).await;

        assert_eq!(
            report,
            IntelReport::Fetched {
                data: "Keep it logically awesome.".to_string(),
                path: target.clone(),
            }
        );
        assert_eq!(report.summary(), "Fetched intel: Keep it logically awesome.");
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "Keep it logically awesome.\n"
        );
    }

    #[tokio::test]
    async fn test_failure_creates_no_artifact() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("intel_1.txt");

        let report = gather_intel(&Broken, &target).await;

        assert!(!report.is_fetched());
        assert_eq!(
            report.summary(),
            "Failed to gather intel: network unreachable"
        );
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_unwritable_target_is_reported_not_raised() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("missing-dir").join("intel_1.txt");

        let report = gather_intel(&Fixed("data"), &target).await;

        assert!(report.summary().starts_with("Failed to gather intel: "));
    }

    #[tokio::test]
    async fn test_http_source_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/zen"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Design for failure."))
            .mount(&server)
            .await;

        let source =
            HttpIntel::new(&format!("{}/zen", server.uri()), Duration::from_secs(5)).unwrap();

        assert_eq!(source.fetch().await.unwrap(), "Design for failure.");
    }

    #[tokio::test]
    async fn test_http_error_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("intel_2.txt");
        let source =
            HttpIntel::new(&format!("{}/zen", server.uri()), Duration::from_secs(5)).unwrap();

        let report = gather_intel(&source, &target).await;

        assert!(!report.is_fetched());
        assert!(report.summary().contains("503"), "got: {}", report.summary());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_http_timeout_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("intel_3.txt");
        let source =
            HttpIntel::new(&format!("{}/zen", server.uri()), Duration::from_millis(200)).unwrap();

        let report = gather_intel(&source, &target).await;

        assert!(!report.is_fetched());
        assert!(!target.exists());
    }
}
