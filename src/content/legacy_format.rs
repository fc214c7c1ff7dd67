//! The legacy label format:
//!
//! ```text
//! What I learned
//! ----------
//! Date: 2012-12-19 20:10:12
//! Slug: what-i-learned
//! Status: Publish
//! Tags: rust, blog
//!
//! Body in markdown
//! ```
//!
//! Labels may appear anywhere in the file and are claimed at most once;
//! a second `Date:` line is plain content, and so is a label with no value.
//! The title is the body line right above the first divider line.

use std::path::Path;

use crate::config::{Config, Labels};
use crate::content::parsing_utils::{extract_label_value, file_date, format_post_date, parse_post_date, split_list};
use crate::error::PostError;
use crate::post::{Header, Post, PostStatus, PostType};
use crate::text_utils::{is_safe_slug, slugify};

#[derive(Default)]
struct Fields {
    title: Option<String>,
    date: Option<String>,
    slug: Option<String>,
    status: Option<String>,
    tags: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    post_type: Option<String>,
    title_link: Option<String>,
    comments: Option<String>,
}

fn claim(slot: &mut Option<String>, label: &str, line: &str) -> bool {
    if slot.is_some() {
        return false;
    }
    match extract_label_value(label, line) {
        Some(value) if !value.is_empty() => {
            *slot = Some(value.to_string());
            true
        }
        _ => false,
    }
}

fn claim_list(slot: &mut Option<Vec<String>>, label: &str, line: &str) -> bool {
    if slot.is_some() {
        return false;
    }
    let items = match extract_label_value(label, line) {
        Some(value) => split_list(value),
        None => return false,
    };
    if items.is_empty() {
        return false;
    }
    *slot = Some(items);
    true
}

fn looks_like_label(labels: &Labels, line: &str) -> bool {
    [
        &labels.date,
        &labels.slug,
        &labels.status,
        &labels.post_type,
        &labels.tags,
        &labels.categories,
        &labels.title_link,
        &labels.comments,
    ]
    .iter()
    .any(|label| extract_label_value(label, line).is_some())
}

fn invalid(file_name: &Path, field: &'static str, value: &str) -> PostError {
    PostError::InvalidField {
        path: file_name.to_path_buf(),
        field,
        value: value.to_string(),
    }
}

pub fn parse(file_name: &Path, raw: &str, config: &Config) -> Result<(Header, String), PostError> {
    let labels = &config.labels;
    let title_delimiter = config.content.title_delimiter.trim();

    let mut fields = Fields::default();
    let mut content: Vec<&str> = vec![];

    for line in raw.lines().map(|line| line.trim_end()) {
        // The title is the body line right above the first divider.
        let title = match content.last() {
            Some(prev) if fields.title.is_none()
                && line.trim_start().starts_with(title_delimiter)
                && !prev.trim().is_empty()
                && !looks_like_label(labels, prev) => Some(prev.trim().to_string()),
            _ => None,
        };

        let claimed = if title.is_some() {
            fields.title = title;
            content.pop();
            true
        } else {
            claim(&mut fields.date, &labels.date, line)
                || claim(&mut fields.slug, &labels.slug, line)
                || claim(&mut fields.status, &labels.status, line)
                || claim_list(&mut fields.tags, &labels.tags, line)
                || claim_list(&mut fields.categories, &labels.categories, line)
                || claim(&mut fields.post_type, &labels.post_type, line)
                || claim(&mut fields.title_link, &labels.title_link, line)
                || claim(&mut fields.comments, &labels.comments, line)
        };

        if !claimed {
            content.push(line);
        }
    }

    let status = match fields.status {
        Some(status) => PostStatus::parse(&status).ok_or_else(|| invalid(file_name, "status", &status))?,
        None => PostStatus::Published,
    };
    if status == PostStatus::Draft {
        return Err(PostError::DraftEncountered(file_name.to_path_buf()));
    }

    let date = match fields.date {
        Some(date) => parse_post_date(&date, &config.content).ok_or_else(|| invalid(file_name, "date", &date))?,
        None => file_date(file_name)?,
    };

    let post_type = match fields.post_type {
        Some(post_type) => PostType::parse(&post_type).ok_or_else(|| invalid(file_name, "type", &post_type))?,
        None => PostType::Post,
    };

    let slug = match fields.slug {
        Some(slug) => slug,
        None => file_name
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default(),
    };
    let slug = if is_safe_slug(&slug) { slug } else { slugify(&slug) };
    if slug.is_empty() {
        return Err(PostError::MissingField {
            path: file_name.to_path_buf(),
            field: "slug",
        });
    }

    let header = Header {
        title: fields.title.unwrap_or_default(),
        date,
        slug,
        status,
        post_type,
        tags: fields.tags.unwrap_or_default(),
        categories: fields.categories.unwrap_or_default(),
        comments: fields.comments,
        title_link: fields.title_link,
    };

    Ok((header, content.join("\n")))
}

pub fn render(post: &Post, config: &Config) -> String {
    let header = &post.header;
    let labels = &config.labels;
    let mut out = String::new();

    if !header.title.is_empty() {
        out.push_str(&header.title);
        out.push('\n');
        out.push_str(&config.content.title_delimiter);
        out.push('\n');
    }

    out.push_str(&format!("{}: {}\n", labels.date, format_post_date(&header.date, &config.content)));
    out.push_str(&format!("{}: {}\n", labels.slug, header.slug));
    out.push_str(&format!("{}: {}\n", labels.status, header.status));
    out.push_str(&format!("{}: {}\n", labels.post_type, header.post_type));
    if let Some(link) = &header.title_link {
        out.push_str(&format!("{}: {}\n", labels.title_link, link));
    }
    if !header.tags.is_empty() {
        out.push_str(&format!("{}: {}\n", labels.tags, header.tags.join(", ")));
    }
    if !header.categories.is_empty() {
        out.push_str(&format!("{}: {}\n", labels.categories, header.categories.join(", ")));
    }
    if let Some(comments) = &header.comments {
        out.push_str(&format!("{}: {}\n", labels.comments, comments));
    }

    out.push_str(&post.content);
    out.push('\n');
    out
}
