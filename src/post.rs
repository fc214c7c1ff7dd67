use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};
use spdlog::debug;

use crate::config::{Config, PostFormat};
use crate::content::{header_format, legacy_format};
use crate::error::PostError;
use crate::util::fs_helper::replace_file;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PostStatus {
    Draft,
    Publish,
    Published,
}

impl PostStatus {
    pub fn parse(value: &str) -> Option<PostStatus> {
        match value.trim().to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "publish" => Some(PostStatus::Publish),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "Draft",
            PostStatus::Publish => "Publish",
            PostStatus::Published => "Published",
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PostType {
    Post,
    Page,
}

impl PostType {
    pub fn parse(value: &str) -> Option<PostType> {
        match value.trim().to_lowercase().as_str() {
            "post" => Some(PostType::Post),
            "page" => Some(PostType::Page),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "Post",
            PostType::Page => "Page",
        }
    }
}

impl Display for PostType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub title: String,
    pub date: NaiveDateTime,
    pub slug: String,
    pub status: PostStatus,
    pub post_type: PostType,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub comments: Option<String>,
    pub title_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub file_name: PathBuf,
    pub header: Header,
    pub content: String,
    permalink: String,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "slug={}, date={}, status={}, type={}\ntitle={}\npermalink={}",
               self.header.slug,
               self.header.date,
               self.header.status,
               self.header.post_type,
               self.header.title,
               self.permalink,
        )
    }
}

impl Post {
    /// The permalink is fixed here, from the date and slug the post was
    /// parsed with.
    pub fn new(file_name: &Path, header: Header, content: String, blog_url: &str) -> Post {
        let permalink = format!("{}/{:04}/{:02}/{:02}/{}",
                                blog_url.trim_end_matches('/'),
                                header.date.year(),
                                header.date.month(),
                                header.date.day(),
                                header.slug);
        Post {
            file_name: file_name.to_path_buf(),
            header,
            content,
            permalink,
        }
    }

    pub fn permalink(&self) -> &str {
        &self.permalink
    }

    /// File name without directory and extension.
    pub fn file_stem(&self) -> String {
        self.file_name
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn set_status(&mut self, status: PostStatus) {
        self.header.status = status;
    }

    pub fn is_draft(&self) -> bool {
        self.header.status == PostStatus::Draft
    }

    /// Serializes the post in the canonical form of `format`.
    pub fn to_canonical(&self, format: PostFormat, config: &Config) -> Result<String, PostError> {
        match format {
            PostFormat::Header => header_format::render(self, config),
            PostFormat::Legacy => Ok(legacy_format::render(self, config)),
        }
    }

    /// Rewrites the source file with the current field values.
    pub fn normalize(&self, format: PostFormat, config: &Config) -> Result<(), PostError> {
        let canonical = self.to_canonical(format, config)?;
        replace_file(&self.file_name, &canonical)
            .map_err(|e| PostError::Io(self.file_name.clone(), e))?;
        debug!("Normalized {}", self.file_name.display());
        Ok(())
    }
}

/// Parses `raw` as read from `file_name` with the given strategy. Drafts are
/// rejected with [`PostError::DraftEncountered`].
pub fn parse_post_str(format: PostFormat, file_name: &Path, raw: &str, config: &Config) -> Result<Post, PostError> {
    let (header, content) = match format {
        PostFormat::Header => header_format::parse(file_name, raw, config)?,
        PostFormat::Legacy => legacy_format::parse(file_name, raw, config)?,
    };

    if header.status == PostStatus::Draft {
        return Err(PostError::DraftEncountered(file_name.to_path_buf()));
    }

    Ok(Post::new(file_name, header, content, config.blog_url()))
}

pub fn parse_post(format: PostFormat, file_name: &Path, config: &Config) -> Result<Post, PostError> {
    let raw = fs::read_to_string(file_name)
        .map_err(|e| PostError::Io(file_name.to_path_buf(), e))?;
    parse_post_str(format, file_name, &raw, config)
}

/// Newest first. Posts sharing a date are ordered by file name, descending.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.header.date.cmp(&a.header.date)
            .then_with(|| b.file_name.file_name().cmp(&a.file_name.file_name()))
    });
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use crate::test_data::{test_config, LEGACY_POST_DATA, POST_DATA};

    use super::*;

    #[test]
    fn test_status_and_type() {
        assert_eq!(PostStatus::parse(" PUBLISHED "), Some(PostStatus::Published));
        assert_eq!(PostStatus::parse("draft"), Some(PostStatus::Draft));
        assert_eq!(PostStatus::parse("later"), None);
        assert_eq!(PostType::parse("Page"), Some(PostType::Page));
        assert_eq!(PostStatus::Publish.to_string(), "Publish");
    }

    #[test]
    fn test_permalink() {
        let config = test_config(Path::new("/blog"));
        let post = parse_post_str(PostFormat::Header, Path::new("hello.md"), POST_DATA, &config).unwrap();
        assert_eq!(post.permalink(), "http://example.com/2012/12/19/what-i-learned");
        assert_eq!(post.file_stem(), "hello");
    }

    #[test]
    fn test_draft_never_parses() {
        let config = test_config(Path::new("/blog"));
        let draft = POST_DATA.replace("status: Published", "status: draft");
        let res = parse_post_str(PostFormat::Header, Path::new("hello.md"), &draft, &config);
        assert!(matches!(res, Err(PostError::DraftEncountered(_))));

        let legacy_draft = LEGACY_POST_DATA.replace("Status: Publish", "Status: Draft");
        let res = parse_post_str(PostFormat::Legacy, Path::new("hello.md"), &legacy_draft, &config);
        assert!(matches!(res, Err(PostError::DraftEncountered(_))));
    }

    #[test]
    fn test_normalize_round_trip() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let path = dir.path().join("hello.md");
        fs::write(&path, POST_DATA).unwrap();

        let first = parse_post(PostFormat::Header, &path, &config).unwrap();
        first.normalize(PostFormat::Header, &config).unwrap();
        let normalized_once = fs::read_to_string(&path).unwrap();

        let second = parse_post(PostFormat::Header, &path, &config).unwrap();
        assert_eq!(second.header.title, first.header.title);
        assert_eq!(second.header.slug, first.header.slug);
        assert_eq!(second.header.date, first.header.date);
        assert_eq!(second.header.status, first.header.status);
        assert_eq!(second.header.tags, first.header.tags);
        assert_eq!(second.header.categories, first.header.categories);
        assert_eq!(second.permalink(), first.permalink());

        second.normalize(PostFormat::Header, &config).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), normalized_once);
    }

    #[test]
    fn test_legacy_normalize_round_trip() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let path = dir.path().join("hello.md");
        fs::write(&path, LEGACY_POST_DATA).unwrap();

        let first = parse_post(PostFormat::Legacy, &path, &config).unwrap();
        first.normalize(PostFormat::Legacy, &config).unwrap();
        let normalized_once = fs::read_to_string(&path).unwrap();

        let second = parse_post(PostFormat::Legacy, &path, &config).unwrap();
        assert_eq!(second.header, first.header);
        assert_eq!(second.content, first.content);

        second.normalize(PostFormat::Legacy, &config).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), normalized_once);
    }

    #[test]
    fn test_set_status_survives_normalize() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let path = dir.path().join("hello.md");
        fs::write(&path, POST_DATA.replace("status: Published", "status: Publish")).unwrap();

        let mut post = parse_post(PostFormat::Header, &path, &config).unwrap();
        assert_eq!(post.header.status, PostStatus::Publish);
        post.set_status(PostStatus::Published);
        post.normalize(PostFormat::Header, &config).unwrap();

        let post = parse_post(PostFormat::Header, &path, &config).unwrap();
        assert_eq!(post.header.status, PostStatus::Published);
    }

    #[test]
    fn test_sort_posts() {
        let config = test_config(Path::new("/blog"));
        let older = parse_post_str(PostFormat::Header, Path::new("20121219-p01-a.md"), POST_DATA, &config).unwrap();
        let same_day = parse_post_str(PostFormat::Header, Path::new("20121219-p02-b.md"), POST_DATA, &config).unwrap();
        let newer_src = POST_DATA.replace("date: 2012-12-19 20:10:12", "date: 2013-01-01");
        let newer = parse_post_str(PostFormat::Header, Path::new("20130101-p01-c.md"), &newer_src, &config).unwrap();

        let mut posts = vec![older, newer, same_day];
        sort_posts(&mut posts);
        let names: Vec<String> = posts.iter().map(|p| p.file_stem()).collect();
        assert_eq!(names, ["20130101-p01-c", "20121219-p02-b", "20121219-p01-a"]);
    }
}
