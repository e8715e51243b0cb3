//! Generator module - exports the public site using the built-in Tera templates

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::content::{is_safe_file_slug, MarkdownRenderer, Post};
use crate::templates::{PostData, SiteData, TemplateRenderer, STYLE_CSS};
use crate::Blog;

/// Directory (under the public dir) holding the blog list and post pages
const BLOG_DIR: &str = "blog";

/// Static site generator
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::from_config(&blog.config.highlight),
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Generate the entire site
    pub fn generate(&self) -> Result<()> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)?;

        let repo = self.blog.posts();
        let posts = repo.list_all();
        tracing::info!("Loaded {} posts from {:?}", posts.len(), repo.dir());

        let post_data: Vec<PostData> = posts
            .iter()
            .map(|p| PostData::from_post(p, &self.blog.config))
            .collect();

        // Pages of deleted posts must not survive a rebuild
        let blog_dir = public_dir.join(BLOG_DIR);
        if blog_dir.exists() {
            fs::remove_dir_all(&blog_dir)?;
        }

        let home_posts: Vec<PostData> = post_data
            .iter()
            .take(self.blog.config.home_posts)
            .cloned()
            .collect();
        write_page(&public_dir.join("index.html"), &self.render_home(&home_posts)?)?;

        let list_html = if post_data.is_empty() {
            self.render_not_found(Some("No posts have been published yet."))?
        } else {
            self.render_blog_list(&post_data)?
        };
        write_page(&blog_dir.join("index.html"), &list_html)?;

        let mut written = 0;
        for post in &posts {
            if self.generate_post_page(post)? {
                written += 1;
            }
        }

        write_page(&public_dir.join("404.html"), &self.render_not_found(None)?)?;
        write_page(&public_dir.join("style.css"), STYLE_CSS)?;

        tracing::info!("Generated {} post pages into {:?}", written, public_dir);
        Ok(())
    }

    /// Write the detail page of one listed post; returns whether a page was written
    fn generate_post_page(&self, listed: &Post) -> Result<bool> {
        let Some(output_dir) = post_output_dir(&self.blog.public_dir, &listed.slug) else {
            tracing::error!("Skipping post with unusable slug {:?}", listed.slug);
            return Ok(false);
        };

        let Some(post) = self.blog.posts().find_by_slug(&listed.slug) else {
            tracing::error!("Post {:?} disappeared while generating", listed.slug);
            return Ok(false);
        };

        let output_path = output_dir.join("index.html");
        write_page(&output_path, &self.render_post(&post)?)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(true)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&self.blog.config));
        context
    }

    /// Render the home page with the latest posts
    pub fn render_home(&self, posts: &[PostData]) -> Result<String> {
        let mut context = self.base_context();
        context.insert("posts", posts);
        Ok(self.renderer.render("home.html", &context)?)
    }

    /// Render the list of all posts
    pub fn render_blog_list(&self, posts: &[PostData]) -> Result<String> {
        let mut context = self.base_context();
        context.insert("posts", posts);
        Ok(self.renderer.render("blog_list.html", &context)?)
    }

    /// Render a post detail page
    pub fn render_post(&self, post: &Post) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &PostData::from_post(post, &self.blog.config));
        context.insert("content", &self.markdown.render(&post.content));
        Ok(self.renderer.render("post.html", &context)?)
    }

    /// Render the not-found page
    pub fn render_not_found(&self, message: Option<&str>) -> Result<String> {
        let mut context = self.base_context();
        context.insert("message", &message.unwrap_or_default());
        Ok(self.renderer.render("404.html", &context)?)
    }
}

/// Output directory of a post page, or `None` when a slug segment could
/// escape `blog/`
fn post_output_dir(public_dir: &Path, slug: &str) -> Option<PathBuf> {
    let mut dir = public_dir.join(BLOG_DIR);
    for segment in slug.split('/') {
        if !is_safe_file_slug(segment) {
            return None;
        }
        dir.push(segment);
    }
    Some(dir)
}

fn write_page(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))?;
    Ok(())
}
