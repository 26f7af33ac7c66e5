//! Earnings Pulse transcript fetcher.
//!
//! Implements [`pipeline::TranscriptFetcher`] over plain HTTP: the configured
//! listing page is scanned for transcript links, and each linked page is
//! reduced to text. No JavaScript is executed, so the listing page must serve
//! its links in the initial HTML.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, link discovery and HTML reduction live
//! here. The fetch stage sees only [`pipeline::TranscriptFetcher`].

pub mod html;

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{FetchError, RawTranscript, TranscriptFetcher, TranscriptName};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Where transcripts are found and how many are retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Page listing the company's transcripts, newest first.
    pub listing_url: String,
    /// Base against which relative links are resolved.
    pub base_url: String,
    /// Substrings a link must all contain (case-insensitive) to count as a
    /// transcript link.
    pub link_patterns: Vec<String>,
    /// Number of most recent transcripts to retrieve.
    pub count: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.fool.com/quote/nasdaq/nvda/".to_string(),
            base_url: "https://www.fool.com".to_string(),
            link_patterns: vec![
                "/earnings/call-transcripts/".to_string(),
                "nvidia-nvda-".to_string(),
            ],
            count: 4,
            timeout_secs: 90,
            user_agent: concat!("earnings-pulse/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A [`TranscriptFetcher`] reading transcripts over HTTP.
#[derive(Clone)]
pub struct HttpTranscriptFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpTranscriptFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Transport {
                url: config.listing_url.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport)
    }

    /// The newest transcript URLs on the listing page.
    pub async fn transcript_urls(&self) -> Result<Vec<Url>, FetchError> {
        let listing = self.get_text(&self.config.listing_url).await?;
        let base = Url::parse(&self.config.base_url).map_err(|e| FetchError::Transport {
            url: self.config.base_url.clone(),
            message: format!("invalid base URL: {e}"),
        })?;
        let urls = select_transcript_links(
            &html::extract_links(&listing),
            &base,
            &self.config.link_patterns,
            self.config.count,
        );
        info!(found = urls.len(), listing = %self.config.listing_url, "Found transcript links");
        Ok(urls)
    }
}

/// Keeps links containing every pattern, resolved against `base`, without
/// duplicates, up to `count` of them in document order.
pub fn select_transcript_links(
    hrefs: &[String],
    base: &Url,
    patterns: &[String],
    count: usize,
) -> Vec<Url> {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
    let mut selected: Vec<Url> = Vec::new();

    for href in hrefs {
        if selected.len() == count {
            break;
        }
        let lowered = href.to_lowercase();
        if !patterns.iter().all(|p| lowered.contains(p.as_str())) {
            continue;
        }
        match base.join(href) {
            Ok(url) if !selected.contains(&url) => selected.push(url),
            Ok(_) => {}
            Err(e) => debug!(href = %href, error = %e, "Skipping unresolvable link"),
        }
    }
    selected
}

/// Transcript name for a page: the last non-empty path segment.
pub fn transcript_name(url: &Url) -> Option<TranscriptName> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .and_then(TranscriptName::new)
        .filter(TranscriptName::is_plain)
}

#[async_trait]
impl TranscriptFetcher for HttpTranscriptFetcher {
    async fn fetch_latest(&self) -> Result<Vec<RawTranscript>, FetchError> {
        let urls = self.transcript_urls().await?;
        let mut transcripts = Vec::with_capacity(urls.len());

        for url in urls {
            let name = transcript_name(&url).ok_or_else(|| FetchError::UnnamedTranscript {
                url: url.to_string(),
            })?;
            let page = self.get_text(url.as_str()).await?;
            let text = html::html_to_text(&page);
            if text.is_empty() {
                warn!(url = %url, "Transcript page has no readable text; skipping");
                continue;
            }
            debug!(url = %url, transcript = %name, chars = text.len(), "Fetched transcript");
            transcripts.push(RawTranscript { name, text });
        }

        Ok(transcripts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.fool.com").unwrap()
    }

    #[test]
    fn selects_matching_links_without_duplicates() {
        let hrefs: Vec<String> = [
            "/earnings/call-transcripts/2025/05/28/nvidia-nvda-q1-2026-earnings-call/",
            "/investing/nvidia-nvda-stock/",
            "https://www.fool.com/earnings/call-transcripts/2025/05/28/nvidia-nvda-q1-2026-earnings-call/",
            "/Earnings/Call-Transcripts/2025/02/26/NVIDIA-NVDA-Q4-2025-earnings-call/",
            "/earnings/call-transcripts/2024/11/20/nvidia-nvda-q3-2025-earnings-call/",
        ]
        .map(String::from)
        .to_vec();
        let patterns = FetchConfig::default().link_patterns;

        let urls = select_transcript_links(&hrefs, &base(), &patterns, 2);

        assert_eq!(
            urls.iter().map(Url::as_str).collect::<Vec<_>>(),
            vec![
                "https://www.fool.com/earnings/call-transcripts/2025/05/28/nvidia-nvda-q1-2026-earnings-call/",
                "https://www.fool.com/Earnings/Call-Transcripts/2025/02/26/NVIDIA-NVDA-Q4-2025-earnings-call/",
            ]
        );
    }

    #[test]
    fn name_is_last_path_segment() {
        let url = Url::parse("https://www.fool.com/a/b/nvidia-nvda-q1-2026-earnings-call/").unwrap();
        assert_eq!(
            transcript_name(&url).unwrap().as_str(),
            "nvidia-nvda-q1-2026-earnings-call"
        );
        assert!(transcript_name(&base()).is_none());
    }
}
