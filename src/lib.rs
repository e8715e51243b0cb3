//! inkpress: a markdown blog with static export and an admin dashboard
//!
//! Posts live as markdown files with YAML front-matter in a single directory.
//! The [`content::PostRepository`] lists, looks up, creates and deletes them;
//! the [`generator`] exports the public site and the [`server`] serves it
//! together with a form-driven dashboard.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

/// Configuration file at the site root
pub const CONFIG_FILE: &str = "_config.yml";

/// A blog site rooted at a directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding post markdown files
    pub posts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open the site in `base_dir`, using defaults when there is no `_config.yml`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE, base_dir);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site handle from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let posts_dir = base_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            posts_dir,
            public_dir,
        }
    }

    /// Repository over this site's posts directory
    pub fn posts(&self) -> content::PostRepository {
        content::PostRepository::for_blog(self)
    }

    /// Dashboard settings and profile
    pub fn dashboard(&self) -> config::DashboardConfig {
        config::DashboardConfig::load(&self.base_dir)
    }

    /// Generate the static site
    pub fn generate(&self) -> anyhow::Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.posts_dir, dir.path().join("content/posts"));
        assert_eq!(blog.public_dir, dir.path().join("out"));
    }

    #[test]
    fn test_new_with_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "title: Field Notes\nposts_dir: notes\npublic_dir: dist\n",
        )
        .unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Field Notes");
        assert_eq!(blog.posts_dir, dir.path().join("notes"));
        assert_eq!(blog.public_dir, dir.path().join("dist"));
        assert_eq!(blog.posts().dir(), dir.path().join("notes"));
    }

    #[test]
    fn test_new_with_broken_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "title: [oops").unwrap();
        assert!(Blog::new(dir.path()).is_err());
    }
}
