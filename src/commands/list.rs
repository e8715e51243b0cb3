//! List posts

use anyhow::Result;

use crate::helpers;
use crate::Blog;

/// One line per post: date, slug and title
pub fn format_lines(blog: &Blog) -> Vec<String> {
    blog.posts()
        .list_all()
        .iter()
        .map(|post| {
            let date = post
                .parsed_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| helpers::display_date(&post.date));
            format!("  {}  {}  {}", date, post.slug, post.title)
        })
        .collect()
}

/// Print the posts, newest first
pub fn run(blog: &Blog) -> Result<()> {
    let lines = format_lines(blog);
    println!("Posts ({}):", lines.len());
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
