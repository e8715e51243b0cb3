//! Post model

use chrono::{DateTime, Local};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

use super::FrontMatter;
use crate::helpers;

/// A blog post backed by one markdown file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,

    /// Slug from front-matter, or the file stem
    pub slug: String,

    /// Date exactly as written in front-matter (or the load time)
    pub date: String,

    /// Raw markdown body
    pub content: String,

    pub excerpt: Option<String>,
    pub read_time: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,

    /// Backing file
    #[serde(skip)]
    pub source: PathBuf,

    /// Front-matter as parsed, including unrecognized keys
    #[serde(skip)]
    pub front_matter: FrontMatter,
}

impl Post {
    /// Build a post from parsed front-matter, filling the fallbacks the caller
    /// chose for title and slug
    pub(crate) fn from_parts(
        front_matter: FrontMatter,
        body: &str,
        source: PathBuf,
        title: String,
        slug: String,
    ) -> Self {
        let fm = &front_matter;
        Self {
            title,
            slug,
            date: non_empty(fm.date.clone()).unwrap_or_else(helpers::now_rfc3339),
            content: body.to_string(),
            excerpt: non_empty(fm.excerpt.clone()),
            read_time: non_empty(fm.read_time.clone()),
            category: non_empty(fm.category.clone()),
            cover_image: non_empty(fm.cover_image.clone()),
            author: non_empty(fm.author.clone()),
            source,
            front_matter,
        }
    }

    /// The date parsed with the generic date parser
    pub fn parsed_date(&self) -> Option<DateTime<Local>> {
        helpers::parse_date(&self.date)
    }
}

/// `None` for missing and blank values alike
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Order two parsed dates newest first; undated entries go last
pub fn newest_first(a: Option<&DateTime<Local>>, b: Option<&DateTime<Local>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post_with(fm: FrontMatter) -> Post {
        Post::from_parts(
            fm,
            "Body",
            PathBuf::from("content/posts/first.md"),
            "First".to_string(),
            "first".to_string(),
        )
    }

    #[test]
    fn test_from_parts_defaults() {
        let post = post_with(FrontMatter::default());
        assert_eq!(post.content, "Body");
        assert!(post.parsed_date().is_some(), "defaults to the load time");
        assert_eq!(post.excerpt, None);
    }

    #[test]
    fn test_blank_date_defaults_to_load_time() {
        let post = post_with(FrontMatter {
            date: Some(String::new()),
            ..Default::default()
        });
        assert!(!post.date.is_empty());
        assert!(post.parsed_date().is_some());
    }

    #[test]
    fn test_blank_optional_fields_are_none() {
        let post = post_with(FrontMatter {
            excerpt: Some("  ".to_string()),
            category: Some("Rust".to_string()),
            ..Default::default()
        });
        assert_eq!(post.excerpt, None);
        assert_eq!(post.category.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let post = post_with(FrontMatter {
            read_time: Some("4".to_string()),
            cover_image: Some("/c.png".to_string()),
            ..Default::default()
        });
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["readTime"], "4");
        assert_eq!(value["coverImage"], "/c.png");
        assert!(value.get("source").is_none());
    }

    #[test]
    fn test_newest_first() {
        let older = Local.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let newer = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(newest_first(Some(&newer), Some(&older)), Ordering::Less);
        assert_eq!(newest_first(Some(&older), Some(&newer)), Ordering::Greater);
        assert_eq!(newest_first(Some(&older), None), Ordering::Less);
        assert_eq!(newest_first(None, Some(&older)), Ordering::Greater);
        assert_eq!(newest_first(None, None), Ordering::Equal);
    }
}
