use crate::error::{BkmError, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

/// Raw icon as returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconData {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Source of site icons. Implementations must be callable from worker threads.
pub trait IconProvider: Send + Sync {
    fn fetch_icon(&self, url: &str) -> Result<IconData>;
}

const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Favicon service reached over HTTP, queried with the bookmark's origin
pub struct HttpIconProvider {
    client: Client,
    base_url: String,
}

impl HttpIconProvider {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn request_url(&self, bookmark_url: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url, origin_of(bookmark_url)?))
    }
}

impl IconProvider for HttpIconProvider {
    fn fetch_icon(&self, url: &str) -> Result<IconData> {
        let request_url = self.request_url(url)?;
        log::debug!("Fetching icon for {} from {}", url, request_url);

        let resp = self.client.get(&request_url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BkmError::Icon(format!(
                "provider answered {} for {}",
                status, request_url
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = resp.bytes()?.to_vec();
        if bytes.is_empty() {
            return Err(BkmError::Icon(format!("empty icon for {}", url)));
        }

        Ok(IconData {
            content_type,
            bytes,
        })
    }
}

/// `scheme://host[:port]` of a URL
pub fn origin_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| BkmError::UrlParse(format!("{}: {}", url, e)))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(BkmError::UrlParse(format!("{} has no host", url)));
    }
    Ok(origin.ascii_serialization())
}
