//! Post repository - the posts directory is the only source of truth
//!
//! Every call rescans the directory. Reads never fail: a missing directory
//! lists as empty and a lookup that hits an unreadable file returns `None`,
//! with the cause logged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::frontmatter::quote_yaml;
use super::post::non_empty;
use super::slug::{is_safe_file_slug, normalize_segments, normalize_slug, slug_from_title};
use super::{FrontMatter, MarkdownRenderer, Post};
use crate::error::{Error, Result};
use crate::helpers;
use crate::Blog;

/// File extension of post files
const POST_EXTENSION: &str = "md";

/// Default title for posts without one in front-matter
const UNTITLED: &str = "Untitled";

/// Reads and writes posts in a single directory
#[derive(Debug, Clone)]
pub struct PostRepository {
    dir: PathBuf,
    excerpt_separator: String,
}

impl PostRepository {
    /// Create a repository over `dir` with the default excerpt separator
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            excerpt_separator: "<!-- excerpt -->".to_string(),
        }
    }

    /// Create the repository configured for a site
    pub fn for_blog(blog: &Blog) -> Self {
        Self::new(&blog.posts_dir).with_excerpt_separator(&blog.config.excerpt_separator)
    }

    pub fn with_excerpt_separator(mut self, separator: &str) -> Self {
        self.excerpt_separator = separator.to_string();
        self
    }

    /// The posts directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `slug`
    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug, POST_EXTENSION))
    }

    /// Markdown files directly inside the posts directory, by file name
    fn markdown_files(&self) -> io::Result<Vec<PathBuf>> {
        if !fs::metadata(&self.dir)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{:?} is not a directory", self.dir),
            ));
        }

        let files = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", self.dir, err);
                    None
                }
            })
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && is_markdown_file(path))
            .collect();

        Ok(files)
    }

    /// All posts, newest first.
    ///
    /// Missing fields default to title "Untitled", the current time and the
    /// file stem as slug. Posts whose date cannot be parsed come last.
    pub fn list_all(&self) -> Vec<Post> {
        tracing::debug!("Reading posts from directory: {:?}", self.dir);
        let files = match self.markdown_files() {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Error reading posts from {:?}: {}", self.dir, e);
                return Vec::new();
            }
        };
        tracing::debug!("Found {} markdown files", files.len());

        let mut posts: Vec<_> = files
            .iter()
            .filter_map(|path| match self.load_listed(path) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Error processing file {:?}: {}", path, e);
                    None
                }
            })
            .map(|post| (post.parsed_date(), post))
            .collect();

        posts.sort_by(|(a, _), (b, _)| super::post::newest_first(a.as_ref(), b.as_ref()));
        posts.into_iter().map(|(_, post)| post).collect()
    }

    fn load_listed(&self, path: &Path) -> io::Result<Post> {
        let raw = read_lossy(path)?;
        let (fm, body) = FrontMatter::parse(&raw);
        let stem = file_stem(path);

        tracing::debug!(
            "File {:?} front-matter: title={:?} slug={:?} date={:?}",
            path,
            fm.title,
            fm.slug,
            fm.date
        );

        let title = non_empty(fm.title.clone()).unwrap_or_else(|| UNTITLED.to_string());
        let slug = non_empty(fm.slug.clone()).unwrap_or(stem);
        let mut post = Post::from_parts(fm, body, path.to_path_buf(), title, slug);
        if post.excerpt.is_none() {
            post.excerpt = MarkdownRenderer::split_excerpt(body, &self.excerpt_separator)
                .filter(|e| !e.is_empty())
                .map(|e| e.to_string());
        }
        Ok(post)
    }

    /// Find the first post whose front-matter slug or file name normalizes to
    /// the same value as `slug`.
    ///
    /// Files are scanned in name order; within a file the front-matter slug is
    /// tried before the file name. Any read failure ends the scan with `None`.
    /// A query that normalizes to nothing (e.g. `日本語`) matches the first
    /// post whose slug also normalizes to nothing.
    pub fn find_by_slug(&self, slug: &str) -> Option<Post> {
        tracing::debug!("find_by_slug called with slug: {:?}", slug);
        self.find(&normalize_slug(slug), normalize_slug)
    }

    /// Look up a post by URL path segments, e.g. from a catch-all route.
    ///
    /// Each segment is normalized on its own and the results are joined with
    /// `/`, so a front-matter slug of `2024/recap` is reachable.
    pub fn find_by_segments<S: AsRef<str>>(&self, segments: &[S]) -> Option<Post> {
        self.find(&normalize_segments(segments), |s| {
            normalize_segments(&s.split('/').collect::<Vec<_>>())
        })
    }

    fn find(&self, wanted: &str, normalize: impl Fn(&str) -> String) -> Option<Post> {
        let files = match self.markdown_files() {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Error reading post: {}", e);
                return None;
            }
        };

        for path in files {
            let raw = match read_lossy(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!("Error reading post {:?}: {}", path, e);
                    return None;
                }
            };
            let (fm, body) = FrontMatter::parse(&raw);

            if let Some(fm_slug) = non_empty(fm.slug.clone()) {
                if normalize(&fm_slug) == wanted {
                    let title =
                        non_empty(fm.title.clone()).unwrap_or_else(|| UNTITLED.to_string());
                    return Some(Post::from_parts(fm, body, path, title, fm_slug));
                }
            }

            let stem = file_stem(&path);
            if normalize(&stem) == wanted {
                let title = non_empty(fm.title.clone()).unwrap_or_else(|| stem.clone());
                return Some(Post::from_parts(fm, body, path, title, stem));
            }
        }

        None
    }

    /// Create a post from a title and markdown body.
    ///
    /// The slug is the lowercased title with whitespace runs turned into
    /// hyphens. An existing post with the same slug is overwritten.
    pub fn create(&self, title: &str, content: &str) -> Result<String> {
        let slug = slug_from_title(title);
        let raw = format!(
            "---\ntitle: {}\nslug: {}\ndate: {}\n---\n\n{}",
            quote_yaml(title),
            quote_yaml(&slug),
            quote_yaml(&helpers::today()),
            content
        );
        self.save(&slug, &raw)?;
        tracing::info!("Created post {:?}", slug);
        Ok(slug)
    }

    /// Write raw markdown to `<slug>.md`, replacing any existing file
    pub fn save(&self, slug: &str, raw: &str) -> Result<PathBuf> {
        if !is_safe_file_slug(slug) {
            return Err(Error::InvalidSlug(slug.to_string()));
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(slug);
        fs::write(&path, raw)?;
        tracing::debug!("Wrote {:?}", path);
        Ok(path)
    }

    /// Replace the title and body of an existing post.
    ///
    /// The whole file is rewritten; every other front-matter key is kept.
    pub fn overwrite(&self, slug: &str, title: &str, content: &str) -> Result<Post> {
        let post = self
            .find_by_slug(slug)
            .ok_or_else(|| Error::NotFound(format!("post {:?}", slug)))?;

        let mut fm = post.front_matter.clone();
        fm.title = Some(title.to_string());
        let raw = format!("{}{}", fm.to_block()?, content);
        fs::write(&post.source, raw)?;
        tracing::info!("Updated post {:?} ({:?})", post.slug, post.source);

        let post_title = title.to_string();
        Ok(Post::from_parts(fm, content, post.source, post_title, post.slug))
    }

    /// Remove `<slug>.md`. A file that is already gone is not an error.
    pub fn delete(&self, slug: &str) -> Result<()> {
        if !is_safe_file_slug(slug) {
            return Err(Error::InvalidSlug(slug.to_string()));
        }
        let path = self.path_for(slug);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted post {:?}", slug);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Nothing to delete at {:?}", path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Check if a file is a markdown post
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == POST_EXTENSION)
        .unwrap_or(false)
}

/// Read a post file, replacing invalid UTF-8 instead of failing
fn read_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> (TempDir, PostRepository) {
        let dir = TempDir::new().unwrap();
        let repo = PostRepository::new(dir.path().join("posts"));
        fs::create_dir_all(repo.dir()).unwrap();
        (dir, repo)
    }

    fn write(repo: &PostRepository, name: &str, content: &str) {
        fs::write(repo.dir().join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory_lists_empty() {
        let dir = TempDir::new().unwrap();
        let repo = PostRepository::new(dir.path().join("nope"));
        assert!(repo.list_all().is_empty());
        assert!(repo.find_by_slug("anything").is_none());
    }

    #[test]
    fn test_list_all_sorted_newest_first() {
        let (_dir, repo) = repo();
        write(&repo, "a.md", "---\ntitle: A\ndate: 2023-05-01\n---\nA");
        write(&repo, "b.md", "---\ntitle: B\ndate: 2024-02-10 08:00:00\n---\nB");
        write(&repo, "c.md", "---\ntitle: C\ndate: 2021-12-31T23:59:59Z\n---\nC");
        write(&repo, "d.md", "---\ntitle: D\ndate: 2024-02-10\n---\nD");

        let titles: Vec<_> = repo.list_all().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_list_all_defaults_and_filters() {
        let (_dir, repo) = repo();
        write(&repo, "plain.md", "No front-matter at all.");
        write(&repo, "notes.txt", "---\ntitle: Not a post\n---\n");
        fs::create_dir_all(repo.dir().join("nested.md")).unwrap();

        let posts = repo.list_all();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.title, "Untitled");
        assert_eq!(post.slug, "plain");
        assert!(post.parsed_date().is_some());
        assert_eq!(post.content, "No front-matter at all.");
    }

    #[test]
    fn test_undated_posts_sort_last() {
        let (_dir, repo) = repo();
        write(&repo, "old.md", "---\ntitle: Old\ndate: 2001-01-01\n---\n");
        write(&repo, "odd.md", "---\ntitle: Odd\ndate: sometime soon\n---\n");
        write(&repo, "new.md", "---\ntitle: New\ndate: 2020-01-01\n---\n");

        let titles: Vec<_> = repo.list_all().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["New", "Old", "Odd"]);
    }

    #[test]
    fn test_excerpt_from_separator() {
        let (_dir, repo) = repo();
        write(
            &repo,
            "sep.md",
            "---\ntitle: Sep\n---\nIntro text.\n<!-- excerpt -->\nRest of post.",
        );
        write(
            &repo,
            "explicit.md",
            "---\ntitle: Explicit\nexcerpt: Given\n---\nIntro.\n<!-- excerpt -->\nRest.",
        );

        let posts = repo.list_all();
        let sep = posts.iter().find(|p| p.title == "Sep").unwrap();
        assert_eq!(sep.excerpt.as_deref(), Some("Intro text."));
        assert!(sep.content.contains("Rest of post."));
        let explicit = posts.iter().find(|p| p.title == "Explicit").unwrap();
        assert_eq!(explicit.excerpt.as_deref(), Some("Given"));
    }

    #[test]
    fn test_find_by_front_matter_slug() {
        let (_dir, repo) = repo();
        write(
            &repo,
            "2024-01-01-whatever.md",
            "---\ntitle: Rust Tips\nslug: Rust_Tips!\ndate: 2024-01-01\n---\nBody",
        );

        let post = repo.find_by_slug("rust-tips").unwrap();
        assert_eq!(post.title, "Rust Tips");
        assert_eq!(post.slug, "Rust_Tips!");
        assert_eq!(post.date, "2024-01-01");
        assert_eq!(normalize_slug(&post.slug), normalize_slug("rust-tips"));
    }

    #[test]
    fn test_find_by_filename() {
        let (_dir, repo) = repo();
        write(&repo, "Hello World.md", "Just a body");

        let post = repo.find_by_slug("hello-world.md").unwrap();
        assert_eq!(post.slug, "Hello World");
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.content, "Just a body");
        assert!(repo.find_by_slug("goodbye").is_none());
        assert!(repo.find_by_slug("!!!").is_none());
    }

    #[test]
    fn test_blank_front_matter_uses_defaults() {
        let (_dir, repo) = repo();
        write(
            &repo,
            "empty-fields.md",
            "---\ntitle: \"\"\nslug: \"\"\ndate: \"\"\n---\nBody",
        );

        let posts = repo.list_all();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Untitled");
        assert_eq!(posts[0].slug, "empty-fields");
        assert!(posts[0].parsed_date().is_some());

        let post = repo.find_by_slug("empty-fields").unwrap();
        assert_eq!(post.slug, "empty-fields");
        assert_eq!(post.title, "empty-fields");
    }

    #[test]
    fn test_invalid_utf8_is_read_lossily() {
        let (_dir, repo) = repo();
        fs::write(repo.dir().join("a-latin1.md"), b"---\ntitle: Caf\xe9\n---\nCaf\xe9").unwrap();
        write(&repo, "b.md", "---\ntitle: B\n---\nBody");

        assert_eq!(repo.list_all().len(), 2);
        assert_eq!(repo.find_by_slug("b").unwrap().title, "B");
        let latin = repo.find_by_slug("a-latin1").unwrap();
        assert_eq!(latin.title, "Caf\u{FFFD}");
    }

    #[test]
    fn test_create_and_find_non_ascii_title() {
        let (_dir, repo) = repo();
        let slug = repo.create("日本語", "x").unwrap();
        assert_eq!(slug, "日本語");

        let listed: Vec<_> = repo.list_all().into_iter().map(|p| p.slug).collect();
        assert_eq!(listed, vec!["日本語"]);
        let post = repo.find_by_slug(&slug).unwrap();
        assert_eq!(post.title, "日本語");
        assert_eq!(post.slug, "日本語");
    }

    #[test]
    fn test_first_match_wins() {
        let (_dir, repo) = repo();
        write(&repo, "a.md", "---\ntitle: First\nslug: dup\n---\n");
        write(&repo, "b.md", "---\ntitle: Second\nslug: dup\n---\n");
        write(&repo, "dup.md", "---\ntitle: Third\n---\n");

        assert_eq!(repo.find_by_slug("dup").unwrap().title, "First");
    }

    #[test]
    fn test_find_by_segments() {
        let (_dir, repo) = repo();
        write(&repo, "recap.md", "---\ntitle: Recap\nslug: 2024/Year Recap\n---\n");

        let post = repo.find_by_segments(&["2024", "year-recap"]).unwrap();
        assert_eq!(post.title, "Recap");
        assert!(repo.find_by_segments(&["year-recap"]).is_none());
        assert_eq!(repo.find_by_segments(&["Recap"]).unwrap().title, "Recap");
    }

    #[test]
    fn test_create_hello_world() {
        let (_dir, repo) = repo();
        let slug = repo.create("Hello World", "Welcome!").unwrap();
        assert_eq!(slug, "hello-world");

        let raw = fs::read_to_string(repo.path_for("hello-world")).unwrap();
        assert!(raw.starts_with("---\ntitle: \"Hello World\"\nslug: \"hello-world\"\ndate: \""));
        assert!(raw.ends_with("---\n\nWelcome!"));

        let post = repo.find_by_slug("hello-world").unwrap();
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.date, helpers::today());
        assert_eq!(post.content, "\nWelcome!");
    }

    #[test]
    fn test_create_escapes_title_and_makes_directory() {
        let dir = TempDir::new().unwrap();
        let repo = PostRepository::new(dir.path().join("fresh/posts"));
        let slug = repo.create("Say \"Hi\": Now", "x").unwrap();
        assert_eq!(slug, "say-\"hi\":-now");

        let post = repo.find_by_slug(&slug).unwrap();
        assert_eq!(post.title, "Say \"Hi\": Now");
    }

    #[test]
    fn test_create_rejects_path_escape() {
        let (_dir, repo) = repo();
        assert!(matches!(
            repo.create("../../etc/passwd", "x"),
            Err(Error::InvalidSlug(_))
        ));
        assert!(matches!(repo.create("", "x"), Err(Error::InvalidSlug(_))));
    }

    #[test]
    fn test_create_then_delete() {
        let (_dir, repo) = repo();
        let slug = repo.create("Short Lived", "bye").unwrap();
        assert!(repo.list_all().iter().any(|p| p.slug == slug));

        repo.delete(&slug).unwrap();
        assert!(repo.list_all().iter().all(|p| p.slug != slug));
        assert!(!repo.path_for(&slug).exists());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_dir, repo) = repo();
        assert!(repo.delete("never-existed").is_ok());
        assert!(matches!(repo.delete(".."), Err(Error::InvalidSlug(_))));
    }

    #[test]
    fn test_overwrite_keeps_other_fields() {
        let (_dir, repo) = repo();
        write(
            &repo,
            "guide.md",
            "---\ntitle: Old\ndate: 2022-03-04\ncategory: Guides\ntags:\n  - rust\n---\nOld body",
        );

        let updated = repo.overwrite("guide", "New Title", "New body").unwrap();
        assert_eq!(updated.title, "New Title");

        let post = repo.find_by_slug("guide").unwrap();
        assert_eq!(post.title, "New Title");
        assert_eq!(post.date, "2022-03-04");
        assert_eq!(post.category.as_deref(), Some("Guides"));
        assert!(post.front_matter.extra.contains_key("tags"));
        assert_eq!(post.content, "New body");
    }

    #[test]
    fn test_overwrite_unknown_post() {
        let (_dir, repo) = repo();
        assert!(matches!(
            repo.overwrite("ghost", "t", "c"),
            Err(Error::NotFound(_))
        ));
    }
}
