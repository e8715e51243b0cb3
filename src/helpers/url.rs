//! URL helper functions

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/style.css") // -> "/blog-root/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// URL of a post detail page, always with a trailing slash
pub fn post_url(config: &SiteConfig, slug: &str) -> String {
    url_for(config, &format!("blog/{}/", encode_path(slug)))
}

/// Percent-encode every segment of a path, keeping the `/` separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a request path into decoded, non-empty segments
pub fn decode_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com".to_string(),
            root: "/site/".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/style.css"), "/site/style.css");
        assert_eq!(url_for(&config, "blog/"), "/site/blog/");
        assert_eq!(url_for(&config, ""), "/site/");
        assert_eq!(url_for(&SiteConfig::default(), "/"), "/");
    }

    #[test]
    fn test_post_url_encodes_slug() {
        let config = SiteConfig::default();
        assert_eq!(post_url(&config, "hello-world"), "/blog/hello-world/");
        assert_eq!(post_url(&config, "what's-new?"), "/blog/what%27s-new%3F/");
        assert_eq!(post_url(&config, "2024/recap"), "/blog/2024/recap/");
    }

    #[test]
    fn test_decode_segments() {
        assert_eq!(
            decode_segments("/what%27s-new%3F/"),
            vec!["what's-new?".to_string()]
        );
        assert_eq!(decode_segments("a//b/"), vec!["a", "b"]);
        assert!(decode_segments("/").is_empty());
    }
}
