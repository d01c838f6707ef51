//! `link` response header parsing.
//!
//! GitHub paginates with headers of the form
//! `<https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"`.

use url::Url;

/// Relations extracted from a `link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    pub next: Option<String>,
    pub last: Option<String>,
}

impl LinkPagination {
    /// Page number of the `last` relation, used to estimate the page count.
    pub fn last_page(&self) -> Option<u32> {
        self.last.as_deref().and_then(extract_page_from_url)
    }
}

/// Parse a `link` header into its `next` and `last` URLs.
///
/// Segments that are not `<url>; rel="..."` pairs are ignored, as are empty
/// URLs.
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rels: Vec<&str> = Vec::new();

        for segment in part.split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment
                .strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
            {
                url = Some(inner.trim());
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rels.extend(value.trim_matches('"').split_whitespace());
            }
        }

        let Some(url) = url.filter(|u| !u.is_empty()) else {
            continue;
        };

        for rel in rels {
            match rel {
                "next" => info.next = Some(url.to_string()),
                "last" => info.last = Some(url.to_string()),
                _ => {}
            }
        }
    }

    info
}

/// URL of the next page, or `None` when the header has no `next` relation.
pub fn next_page_url(link_header: Option<&str>) -> Option<String> {
    link_header.and_then(|h| parse_link_header(h).next)
}

fn extract_page_from_url(url: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}
