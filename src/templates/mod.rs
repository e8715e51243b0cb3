//! Built-in templates using the Tera template engine
//!
//! All templates are embedded in the binary. `.html` templates are
//! autoescaped; rendered markdown is passed through with `| safe`.

use anyhow::Result;
use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers;

/// Stylesheet shared by the public site and the dashboard
pub const STYLE_CSS: &str = include_str!("site/style.css");

/// Template renderer with the embedded site and dashboard templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("base.html", include_str!("site/base.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog_list.html", include_str!("site/blog_list.html")),
            ("post.html", include_str!("site/post.html")),
            ("404.html", include_str!("site/404.html")),
            ("partials/post_card.html", include_str!("site/partials/post_card.html")),
            // Dashboard
            ("login.html", include_str!("dashboard/login.html")),
            ("dashboard/layout.html", include_str!("dashboard/layout.html")),
            ("dashboard/home.html", include_str!("dashboard/home.html")),
            ("dashboard/post_form.html", include_str!("dashboard/post_form.html")),
            ("dashboard/settings.html", include_str!("dashboard/settings.html")),
            ("dashboard/profile.html", include_str!("dashboard/profile.html")),
            (
                "dashboard/profile_edit.html",
                include_str!("dashboard/profile_edit.html"),
            ),
            ("dashboard/error.html", include_str!("dashboard/error.html")),
        ])?;

        tera.register_filter("long_date", long_date_filter);
        tera.register_filter("initial", initial_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(template_name, context)
    }
}

/// Tera filter: format a raw date string as "January 5, 2024"
fn long_date_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("long_date", "value", String, value);
    Ok(tera::Value::String(helpers::display_date(&s)))
}

/// Tera filter: first character of a name, or a fallback
fn initial_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let fallback = match args.get("default") {
        Some(val) => tera::try_get_value!("initial", "default", String, val),
        None => "A".to_string(),
    };
    let initial = value
        .as_str()
        .and_then(|s| s.trim().chars().next())
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or(fallback);
    Ok(tera::Value::String(initial))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        return Ok(tera::Value::String(s));
    }
    let truncated: String = s.chars().take(length).collect();
    Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
}

// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub root: String,
    pub blog_url: String,
    pub dashboard_url: String,
    pub style_url: String,
    pub year: i32,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            root: helpers::url_for(config, "/"),
            blog_url: helpers::url_for(config, "blog/"),
            dashboard_url: "/dashboard".to_string(),
            style_url: helpers::url_for(config, "style.css"),
            year: chrono::Local::now().year(),
        }
    }
}

/// A post as shown in lists and on its own page
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub date: String,
    pub excerpt: Option<String>,
    pub read_time: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
}

impl PostData {
    pub fn from_post(post: &Post, config: &SiteConfig) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            url: helpers::post_url(config, &post.slug),
            date: post.date.clone(),
            excerpt: post.excerpt.clone(),
            read_time: post.read_time.clone(),
            category: post.category.clone(),
            cover_image: post.cover_image.clone(),
            author: post.author.clone(),
        }
    }
}

/// Dashboard sidebar entry
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// Dashboard sidebar for the page at `current`
pub fn dashboard_nav(current: &str) -> Vec<NavItem> {
    [
        ("Dashboard", "/dashboard"),
        ("Posts", "/dashboard/posts/"),
        ("Profile", "/dashboard/profile"),
        ("Settings", "/dashboard/settings"),
    ]
    .into_iter()
    .map(|(name, href)| NavItem {
        name,
        href,
        active: current == href,
    })
    .collect()
}
