use url::Url;

use super::error::FetchError;

pub const API_BASE: &str = "https://api.github.com";

/// Turn a GitHub web URL into the repository's API URL.
///
/// `https://github.com/owner/repo` (optionally ending in `/` or `.git`) maps to
/// `https://api.github.com/repos/owner/repo`. URLs already pointing at
/// `api.github.com` are returned without a trailing `/`.
pub fn sanitize_repo_url(input: &str) -> Result<String, FetchError> {
    let input = input.trim();
    if input.contains("api.github.com") {
        return Ok(input.trim_end_matches('/').to_string());
    }

    let invalid = || FetchError::InvalidRepoUrl(input.to_string());

    let parsed = Url::parse(input).map_err(|_| invalid())?;
    let host = parsed.host_str().ok_or_else(invalid)?;
    if !matches!(host, "github.com" | "www.github.com") {
        return Err(invalid());
    }

    let mut segments = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return Err(invalid());
    }

    Ok(format!("{API_BASE}/repos/{owner}/{repo}"))
}
