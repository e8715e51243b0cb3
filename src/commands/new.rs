//! Create a new post

use anyhow::Result;

use crate::Blog;

/// Create a post from a title and optional body, returning its slug
pub fn run(blog: &Blog, title: &str, content: Option<&str>) -> Result<String> {
    let repo = blog.posts();
    let slug = repo.create(title, content.unwrap_or_default())?;
    println!("Created: {:?}", repo.path_for(&slug));
    Ok(slug)
}
