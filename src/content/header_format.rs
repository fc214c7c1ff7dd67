//! The structured-header post format, canonical for new content:
//!
//! ```text
//! ---
//! title: What I learned
//! date: 2012-12-19 20:10:12
//! status: Published
//! layout: post
//! tags: [rust, blog]
//! ---
//! Body in markdown
//! ```
//!
//! The delimiter is any line made of three or more header delimiter
//! characters. Keys are case-insensitive.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::content::parsing_utils::{format_post_date, parse_post_date, yaml_to_list, yaml_to_string};
use crate::error::PostError;
use crate::post::{Header, Post, PostStatus, PostType};
use crate::text_utils::{is_safe_slug, slugify};

fn is_delimiter(line: &str, marker: char) -> bool {
    let line = line.trim();
    line.chars().count() >= 3 && line.chars().all(|c| c == marker)
}

/// Splits the raw file into header and content lines. `None` when the file
/// does not open with a delimited header block.
fn split_header(raw: &str, marker: char) -> Option<(String, String)> {
    let mut lines = raw.lines().map(|line| line.trim_end());

    loop {
        match lines.next() {
            Some(line) if line.is_empty() => continue,
            Some(line) if is_delimiter(line, marker) => break,
            _ => return None,
        }
    }

    let mut header: Vec<&str> = vec![];
    loop {
        match lines.next() {
            Some(line) if is_delimiter(line, marker) => break,
            Some(line) => header.push(line),
            None => return None,
        }
    }

    let content: Vec<&str> = lines.collect();
    Some((header.join("\n"), content.join("\n")))
}

fn read_fields(file_name: &Path, header: &str) -> Result<HashMap<String, serde_yaml::Value>, PostError> {
    let data: serde_yaml::Value = serde_yaml::from_str(header).map_err(|source| PostError::Yaml {
        path: file_name.to_path_buf(),
        source,
    })?;

    let mapping = match data {
        serde_yaml::Value::Mapping(mapping) => mapping,
        serde_yaml::Value::Null => serde_yaml::Mapping::new(),
        _ => return Err(PostError::NotAPost(file_name.to_path_buf())),
    };

    let mut fields = HashMap::new();
    for (key, value) in mapping {
        if let Some(key) = yaml_to_string(&key) {
            fields.insert(key.trim().to_lowercase(), value);
        }
    }
    Ok(fields)
}

fn required(file_name: &Path, fields: &HashMap<String, serde_yaml::Value>, field: &'static str) -> Result<String, PostError> {
    fields
        .get(field)
        .and_then(yaml_to_string)
        .ok_or_else(|| PostError::MissingField {
            path: file_name.to_path_buf(),
            field,
        })
}

fn invalid(file_name: &Path, field: &'static str, value: &str) -> PostError {
    PostError::InvalidField {
        path: file_name.to_path_buf(),
        field,
        value: value.to_string(),
    }
}

pub fn parse(file_name: &Path, raw: &str, config: &Config) -> Result<(Header, String), PostError> {
    let (header, content) = split_header(raw, config.content.header_delimiter)
        .ok_or_else(|| PostError::NotAPost(file_name.to_path_buf()))?;
    let fields = read_fields(file_name, &header)?;

    let status = required(file_name, &fields, "status")?;
    let status = PostStatus::parse(&status).ok_or_else(|| invalid(file_name, "status", &status))?;
    if status == PostStatus::Draft {
        return Err(PostError::DraftEncountered(file_name.to_path_buf()));
    }

    let title = required(file_name, &fields, "title")?;
    let date = required(file_name, &fields, "date")?;
    let layout = required(file_name, &fields, "layout")?;

    let date = parse_post_date(&date, &config.content).ok_or_else(|| invalid(file_name, "date", &date))?;
    let post_type = PostType::parse(&layout).ok_or_else(|| invalid(file_name, "layout", &layout))?;

    let slug = match fields.get("slug").and_then(yaml_to_string) {
        Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
        _ => slugify(&title),
    };
    if slug.is_empty() {
        return Err(PostError::MissingField {
            path: file_name.to_path_buf(),
            field: "slug",
        });
    }
    if !is_safe_slug(&slug) {
        return Err(invalid(file_name, "slug", &slug));
    }

    let list = |key: &str| fields.get(key).map(yaml_to_list).unwrap_or_default();
    let header = Header {
        title,
        date,
        slug,
        status,
        post_type,
        tags: list("tags"),
        categories: list("categories"),
        comments: fields.get("comments").and_then(yaml_to_string),
        title_link: fields.get("title_link").and_then(yaml_to_string),
    };

    Ok((header, content))
}

#[derive(Serialize)]
struct CanonicalHeader<'a> {
    title: &'a str,
    slug: &'a str,
    date: String,
    status: &'a str,
    layout: &'a str,
    permalink: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    categories: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    comments: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title_link: Option<&'a str>,
}

pub fn render(post: &Post, config: &Config) -> Result<String, PostError> {
    let header = &post.header;
    let canonical = CanonicalHeader {
        title: &header.title,
        slug: &header.slug,
        date: format_post_date(&header.date, &config.content),
        status: header.status.as_str(),
        layout: header.post_type.as_str(),
        permalink: post.permalink(),
        tags: &header.tags,
        categories: &header.categories,
        comments: header.comments.as_deref(),
        title_link: header.title_link.as_deref(),
    };

    let yaml = serde_yaml::to_string(&canonical).map_err(|source| PostError::Yaml {
        path: post.file_name.clone(),
        source,
    })?;
    let delimiter: String = std::iter::repeat(config.content.header_delimiter).take(3).collect();

    Ok(format!("{delimiter}\n{yaml}{delimiter}\n{}\n", post.content))
}
