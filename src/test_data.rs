use std::path::Path;

use crate::config::{parse_config, Config};

pub const POST_DATA: &str = "---
title: What I learned
date: 2012-12-19 20:10:12
status: Published
layout: post
tags: [rust, blogging]
categories: programming
---

How to be a great software engineer?

<!-- more -->

The rest of the post.
";

pub const LEGACY_POST_DATA: &str = "Hello, legacy world
----------
Date: 2011-03-04 08:30:00
Slug: hello-legacy
Status: Publish
Tags: python, blog
Categories: misc

First paragraph.

Date: this line is content, the label was already used.
";

pub const CONFIG_DATA: &str = r##"
[blog]
title = "The Example Blog"
url = "http://example.com/"
description = "Sparse thoughts"
posts_per_page = 2
"##;

/// Configuration rooted at `base_dir`, every directory at its default.
pub fn test_config(base_dir: &Path) -> Config {
    let cfg = format!("{}\n[paths]\nbase_dir = \"{}\"\n", CONFIG_DATA, base_dir.display());
    parse_config(&cfg, base_dir).unwrap()
}

/// Header format post with the given fields and a one-line body.
pub fn post_source(title: &str, date: &str, status: &str, layout: &str, tags: &str) -> String {
    format!("---\ntitle: {title}\ndate: {date}\nstatus: {status}\nlayout: {layout}\ntags: [{tags}]\n---\nBody of {title}.\n")
}
