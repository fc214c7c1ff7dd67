use chrono::Datelike;
use ramhorns::Content;

use crate::config::Config;
use crate::error::PublishError;
use crate::post::Post;
use crate::text_utils::{beautify, format_date_time, slugify};
use crate::view::markdown_renderer::MarkdownRenderer;

pub mod markdown_renderer;
pub mod rss_renderer;
pub mod template_renderer;

/// Marks the end of the summary shown on list pages.
const MORE_TAG: &str = "<!-- more -->";

#[derive(Content, Debug, Clone)]
pub struct TagView {
    pub name: String,
    pub url: String,
}

#[derive(Content, Debug, Clone)]
pub struct CategoryView {
    pub name: String,
}

/// A post as templates see it: markdown already converted, title beautified.
#[derive(Content, Debug, Clone)]
pub struct PostView {
    pub title: String,
    pub slug: String,
    pub permalink: String,
    pub date: String,
    pub time: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub content: String,
    pub summary: String,
    pub has_more: bool,
    pub tags: Vec<TagView>,
    pub categories: Vec<CategoryView>,
    pub title_link: Option<String>,
    pub comments: Option<String>,
}

impl PostView {
    pub fn from_post(post: &Post, markdown: &MarkdownRenderer, config: &Config) -> Result<PostView, PublishError> {
        let header = &post.header;
        let content = markdown.convert(&post.content)?;
        let (summary, has_more) = match content.find(MORE_TAG) {
            Some(pos) => (content[..pos].trim_end().to_string(), true),
            None => (content.clone(), false),
        };
        let (date, time) = format_date_time(&header.date);

        Ok(PostView {
            title: beautify(&header.title),
            slug: header.slug.clone(),
            permalink: post.permalink().to_string(),
            date,
            time,
            year: format!("{:04}", header.date.year()),
            month: format!("{:02}", header.date.month()),
            day: format!("{:02}", header.date.day()),
            content,
            summary,
            has_more,
            tags: header.tags.iter().filter_map(|tag| {
                let slug = slugify(tag);
                if slug.is_empty() {
                    return None;
                }
                Some(TagView {
                    name: tag.clone(),
                    url: format!("/{}/{}/", config.output.tagged_url, slug),
                })
            }).collect(),
            categories: header.categories.iter().map(|c| CategoryView { name: c.clone() }).collect(),
            title_link: header.title_link.clone(),
            comments: header.comments.clone(),
        })
    }
}

/// Entry of the `pages` list available to every template.
#[derive(Content, Debug, Clone, PartialEq)]
pub struct PageLink {
    pub url: String,
    pub title: String,
}

/// Entry of the `archive` list available to every template.
#[derive(Content, Debug, Clone, PartialEq)]
pub struct ArchiveLink {
    pub url: String,
    pub date: String,
    pub title: String,
}

/// Everything a template can reference. Keys that do not apply to an
/// artifact are left empty.
#[derive(Content)]
pub struct PageContext<'a> {
    pub blog_title: &'a str,
    pub blog_url: &'a str,
    pub blog_description: &'a str,
    pub post: Option<&'a PostView>,
    pub posts: Vec<&'a PostView>,
    pub prev_page_url: Option<String>,
    pub next_page_url: Option<String>,
    pub tag: Option<&'a str>,
    pub archive_title: Option<String>,
    pub pages: &'a Vec<PageLink>,
    pub archive: &'a Vec<ArchiveLink>,
}

impl<'a> PageContext<'a> {
    pub fn new(config: &'a Config, pages: &'a Vec<PageLink>, archive: &'a Vec<ArchiveLink>) -> Self {
        PageContext {
            blog_title: &config.blog.title,
            blog_url: config.blog_url(),
            blog_description: &config.blog.description,
            post: None,
            posts: vec![],
            prev_page_url: None,
            next_page_url: None,
            tag: None,
            archive_title: None,
            pages,
            archive,
        }
    }

    pub fn with_post(mut self, post: &'a PostView) -> Self {
        self.post = Some(post);
        self
    }

    pub fn with_posts(mut self, posts: Vec<&'a PostView>) -> Self {
        self.posts = posts;
        self
    }
}
