//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Site
title: My Blog
description: Insights, tutorials, and updates from our team.
author: Admin User
language: en

# URL
url: http://localhost:4000
root: /

# Directory
posts_dir: content/posts
public_dir: out

# Writing
excerpt_separator: "<!-- excerpt -->"
highlight:
  theme: base16-ocean.dark
  line_number: false

# Home page
home_posts: 6
"#;

const HELLO_WORLD: &str = r#"---
title: "Hello World"
slug: "hello-world"
date: "{date}"
excerpt: "Your very first post."
category: "General"
readTime: "2"
---

Welcome to your new blog! This post lives in `content/posts/hello-world.md`.

<!-- excerpt -->

## Create a new post

```bash
$ inkpress new "My New Post" --content "Hello there"
```

Or start the server and use the dashboard at `/dashboard`:

```bash
$ inkpress serve
```

## Generate static files

```bash
$ inkpress generate
```
"#;

/// Initialize a new site in the given directory.
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        tracing::warn!("{:?} already exists, keeping it", config_path);
    } else {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
    }

    let config = SiteConfig::load(&config_path)?;
    let posts_dir = target_dir.join(&config.posts_dir);
    fs::create_dir_all(&posts_dir)?;

    let sample = posts_dir.join("hello-world.md");
    if !sample.exists() {
        let today = crate::helpers::today();
        fs::write(&sample, HELLO_WORLD.replace("{date}", &today))?;
    }

    Ok(())
}
