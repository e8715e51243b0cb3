//! Content module - posts, front-matter, slugs and markdown rendering

mod frontmatter;
mod markdown;
mod post;
mod repository;
mod slug;

pub use frontmatter::{quote_yaml, FrontMatter};
pub use markdown::MarkdownRenderer;
pub use post::{newest_first, Post};
pub use repository::PostRepository;
pub use slug::{is_safe_file_slug, normalize_segments, normalize_slug, slug_from_title};
