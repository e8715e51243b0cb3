//! Slug normalization

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize a slug for lookups.
///
/// Drops a trailing `.md`, lowercases, collapses every run of characters
/// outside `[a-z0-9]` into a single hyphen and trims hyphens from both ends.
///
/// # Examples
/// ```
/// use inkpress::content::normalize_slug;
/// assert_eq!(normalize_slug("Hello, World!.md"), "hello-world");
/// ```
pub fn normalize_slug(slug: &str) -> String {
    let without_ext = slug.strip_suffix(".md").unwrap_or(slug);
    let lowered = without_ext.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Normalize each path segment and join them with `/`
pub fn normalize_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| normalize_slug(s.as_ref()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the slug of a newly created post from its title.
///
/// Only lowercases and turns whitespace runs into hyphens; punctuation is kept.
pub fn slug_from_title(title: &str) -> String {
    WHITESPACE
        .replace_all(&title.to_lowercase(), "-")
        .into_owned()
}

/// Whether a slug can be used as a file stem inside the posts directory
pub fn is_safe_file_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains('/')
        && !slug.contains('\\')
        && !slug.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("Hello World"), "hello-world");
        assert_eq!(normalize_slug("hello-world.md"), "hello-world");
        assert_eq!(normalize_slug("  --Rust & Tokio: 2024!--  "), "rust-tokio-2024");
        assert_eq!(normalize_slug("already-normal"), "already-normal");
    }

    #[test]
    fn test_normalize_slug_non_ascii() {
        // Non-ASCII letters are treated as punctuation
        assert_eq!(normalize_slug("Café Résumé"), "caf-r-sum");
        assert_eq!(normalize_slug("日本語"), "");
    }

    #[test]
    fn test_normalize_segments() {
        assert_eq!(normalize_segments(&["2024", "My Post.md"]), "2024/my-post");
        assert_eq!(normalize_segments(&["Only"]), "only");
    }

    #[test]
    fn test_slug_from_title() {
        assert_eq!(slug_from_title("Hello World"), "hello-world");
        assert_eq!(slug_from_title("What's   New?"), "what's-new?");
        assert_eq!(slug_from_title("Tabs\tand\nlines"), "tabs-and-lines");
    }

    #[test]
    fn test_is_safe_file_slug() {
        assert!(is_safe_file_slug("hello-world"));
        assert!(is_safe_file_slug("what's-new?"));
        assert!(!is_safe_file_slug(""));
        assert!(!is_safe_file_slug(".."));
        assert!(!is_safe_file_slug("../etc/passwd"));
        assert!(!is_safe_file_slug("a\\b"));
    }
}
