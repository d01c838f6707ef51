//! Construction of GitHub API requests.

use url::Url;

use super::error::FetchError;
use crate::http::{HttpMethod, HttpRequest};

pub const API_VERSION: &str = "2022-11-28";
pub const USER_AGENT: &str = "repotrack";

/// Build a request carrying the headers every GitHub call needs.
///
/// The URL must be an absolute `http` or `https` URL with a host.
pub fn build_request(
    method: HttpMethod,
    url: &str,
    body: Option<Vec<u8>>,
    token: Option<&str>,
) -> Result<HttpRequest, FetchError> {
    let parsed =
        Url::parse(url).map_err(|e| FetchError::RequestConstruction(format!("{url}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(FetchError::RequestConstruction(format!(
            "{url}: expected an absolute http(s) URL"
        )));
    }

    let mut headers = vec![
        ("X-GitHub-Api-Version".to_string(), API_VERSION.to_string()),
        ("Accept".to_string(), "application/json".to_string()),
        ("User-Agent".to_string(), USER_AGENT.to_string()),
    ];
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }

    Ok(HttpRequest {
        method,
        url: url.to_string(),
        headers,
        body: body.unwrap_or_default(),
    })
}
