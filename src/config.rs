use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Which of the two on-disk post formats a blog uses. The two are not
/// compatible with each other, so the blog picks one and sticks to it.
#[derive(Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostFormat {
    /// `---` delimited YAML-like header, then the body. Canonical.
    Header,
    /// `Label: value` lines plus a title underlined by a delimiter line.
    Legacy,
}

#[derive(Deserialize)]
pub struct Blog {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
    #[serde(default = "default_max_posts_per_day")]
    pub max_posts_per_day: u32,
}

/// Directory layout. Only `base_dir` is required, everything else defaults to
/// a directory below it.
#[derive(Deserialize)]
pub struct Paths {
    pub base_dir: PathBuf,
    #[serde(default)]
    pub drafts_dir: PathBuf,
    #[serde(default)]
    pub preview_dir: PathBuf,
    #[serde(default)]
    pub publish_now_dir: PathBuf,
    #[serde(default)]
    pub posts_dir: PathBuf,
    #[serde(default)]
    pub pages_dir: PathBuf,
    #[serde(default)]
    pub www_dir: PathBuf,
    #[serde(default)]
    pub templates_dir: PathBuf,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Templates {
    pub permalink: String,
    pub index: String,
    pub page: String,
    pub archive: String,
    pub archive_index: String,
    pub err_404: String,
    pub err_500: String,
    pub tagged: String,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            permalink: "permalink.html".to_string(),
            index: "front_page.html".to_string(),
            page: "page.html".to_string(),
            archive: "monthly_archive.html".to_string(),
            archive_index: "archive_index.html".to_string(),
            err_404: "err_404.html".to_string(),
            err_500: "err_500.html".to_string(),
            tagged: "tags.html".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Output {
    pub index_page: String,
    pub archive_page: String,
    pub archive_index_page: String,
    pub tagged_page: String,
    pub err_404_page: String,
    pub err_500_page: String,
    pub rss_file: String,
    pub pages_url: String,
    pub tagged_url: String,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            index_page: "index.html".to_string(),
            archive_page: "index.html".to_string(),
            archive_index_page: "archive.html".to_string(),
            tagged_page: "index.html".to_string(),
            err_404_page: "404.html".to_string(),
            err_500_page: "500.html".to_string(),
            rss_file: "rss.xml".to_string(),
            pages_url: "pages".to_string(),
            tagged_url: "tag".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ContentOptions {
    pub format: PostFormat,
    pub extension: String,
    pub html_extension: String,
    pub input_encoding: String,
    pub output_encoding: String,
    pub header_delimiter: char,
    pub title_delimiter: String,
    pub date_format: String,
    pub datetime_format: String,
}

impl Default for ContentOptions {
    fn default() -> Self {
        ContentOptions {
            format: PostFormat::Header,
            extension: "md".to_string(),
            html_extension: "html".to_string(),
            input_encoding: "utf-8".to_string(),
            output_encoding: "utf-8".to_string(),
            header_delimiter: '-',
            title_delimiter: "----------".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

/// Label names recognised by the legacy format.
#[derive(Deserialize)]
#[serde(default)]
pub struct Labels {
    pub date: String,
    pub slug: String,
    pub status: String,
    pub post_type: String,
    pub tags: String,
    pub categories: String,
    pub title_link: String,
    pub comments: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            date: "Date".to_string(),
            slug: "Slug".to_string(),
            status: "Status".to_string(),
            post_type: "Type".to_string(),
            tags: "Tags".to_string(),
            categories: "Categories".to_string(),
            title_link: "Link".to_string(),
            comments: "Comments".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub gfm: bool,
    pub allow_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        MarkdownOptions {
            gfm: true,
            allow_html: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub blog: Blog,
    pub paths: Paths,
    #[serde(default)]
    pub templates: Templates,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub content: ContentOptions,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub markdown: MarkdownOptions,
    #[serde(default)]
    pub server: Server,
    pub log: Option<Log>,
}

impl Config {
    /// Blog URL without the trailing slash.
    pub fn blog_url(&self) -> &str {
        self.blog.url.trim_end_matches('/')
    }

    /// `{stem}.{html_extension}`
    pub fn html_file(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.content.html_extension)
    }

    /// `{stem}.{extension}`
    pub fn content_file(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.content.extension)
    }

    pub fn is_content_file(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => ext == self.content.extension,
            None => false,
        }
    }
}

fn default_posts_per_page() -> usize {
    5
}

fn default_max_posts_per_day() -> u32 {
    99
}

const CONFIG_DIR_VAR: &str = "${config_dir}";

fn parse_path(path: &Path, config_dir: &Path) -> PathBuf {
    let path = match path.to_str() {
        Some(str_path) if str_path.starts_with(CONFIG_DIR_VAR) => {
            let rest = str_path[CONFIG_DIR_VAR.len()..].trim_start_matches(['/', '\\']);
            config_dir.join(rest)
        }
        _ => path.to_path_buf(),
    };

    if path.is_relative() {
        config_dir.join(path)
    } else {
        path
    }
}

fn or_default(path: PathBuf, default: PathBuf, config_dir: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        default
    } else {
        parse_path(&path, config_dir)
    }
}

fn resolve_paths(paths: Paths, config_dir: &Path) -> Paths {
    let base_dir = parse_path(&paths.base_dir, config_dir);
    let drafts_dir = or_default(paths.drafts_dir, base_dir.join("drafts"), config_dir);
    let preview_dir = or_default(paths.preview_dir, drafts_dir.join("_preview"), config_dir);
    let publish_now_dir = or_default(paths.publish_now_dir, drafts_dir.join("_publishnow"), config_dir);

    Paths {
        posts_dir: or_default(paths.posts_dir, base_dir.join("posts"), config_dir),
        pages_dir: or_default(paths.pages_dir, base_dir.join("pages"), config_dir),
        www_dir: or_default(paths.www_dir, base_dir.join("www"), config_dir),
        templates_dir: or_default(paths.templates_dir, base_dir.join("templates"), config_dir),
        drafts_dir,
        preview_dir,
        publish_now_dir,
        base_dir,
    }
}

fn is_utf8(encoding: &str) -> bool {
    matches!(encoding.to_lowercase().as_str(), "utf-8" | "utf8")
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.blog.posts_per_page == 0 {
        return Err(ConfigError::Validation("blog.posts_per_page must be at least 1".to_string()));
    }
    if cfg.blog.max_posts_per_day == 0 || cfg.blog.max_posts_per_day > 99 {
        return Err(ConfigError::Validation(format!(
            "blog.max_posts_per_day must be between 1 and 99, got {}", cfg.blog.max_posts_per_day
        )));
    }
    if !is_utf8(&cfg.content.input_encoding) || !is_utf8(&cfg.content.output_encoding) {
        return Err(ConfigError::Validation(format!(
            "unsupported encoding: input={}, output={}. Only utf-8 is supported",
            cfg.content.input_encoding, cfg.content.output_encoding
        )));
    }
    if cfg.content.header_delimiter.is_alphanumeric() || cfg.content.header_delimiter.is_whitespace() {
        return Err(ConfigError::Validation(format!(
            "content.header_delimiter must be a punctuation character, got '{}'", cfg.content.header_delimiter
        )));
    }
    if cfg.content.title_delimiter.trim().is_empty() {
        return Err(ConfigError::Validation("content.title_delimiter cannot be empty".to_string()));
    }
    if cfg.content.extension.is_empty() || cfg.content.extension.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "content.extension must be given without the dot, got '{}'", cfg.content.extension
        )));
    }
    Ok(())
}

/// Parses configuration text. Relative paths are resolved against `config_dir`.
pub fn parse_config(cfg_content: &str, config_dir: &Path) -> Result<Config, ConfigError> {
    let mut cfg: Config = toml::from_str::<Config>(cfg_content)?;
    cfg.paths = resolve_paths(cfg.paths, config_dir);
    validate(&cfg)?;
    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> Result<Config, ConfigError> {
    let cfg_content = fs::read_to_string(cfg_path)
        .map_err(|e| ConfigError::Io(cfg_path.to_path_buf(), e))?;

    let config_dir = match cfg_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    parse_config(&cfg_content, &config_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
[blog]
title = "The Example Blog"
url = "http://example.com/"
description = "Sparse thoughts"

[paths]
base_dir = "blog"
"##;

    #[test]
    fn test_defaults() {
        let cfg = parse_config(MINIMAL, Path::new("/srv")).unwrap();
        assert_eq!(cfg.blog.posts_per_page, 5);
        assert_eq!(cfg.blog.max_posts_per_day, 99);
        assert_eq!(cfg.blog_url(), "http://example.com");
        assert_eq!(cfg.paths.base_dir, PathBuf::from("/srv/blog"));
        assert_eq!(cfg.paths.drafts_dir, PathBuf::from("/srv/blog/drafts"));
        assert_eq!(cfg.paths.preview_dir, PathBuf::from("/srv/blog/drafts/_preview"));
        assert_eq!(cfg.paths.publish_now_dir, PathBuf::from("/srv/blog/drafts/_publishnow"));
        assert_eq!(cfg.paths.posts_dir, PathBuf::from("/srv/blog/posts"));
        assert_eq!(cfg.paths.www_dir, PathBuf::from("/srv/blog/www"));
        assert_eq!(cfg.content.format, PostFormat::Header);
        assert_eq!(cfg.templates.index, "front_page.html");
        assert_eq!(cfg.output.archive_index_page, "archive.html");
        assert_eq!(cfg.labels.categories, "Categories");
        assert_eq!(cfg.server.port, 8000);
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_overrides() {
        let toml_str = r##"
[blog]
title = "t"
url = "http://example.com"
description = "d"
posts_per_page = 12

[paths]
base_dir = "/var/blog"
www_dir = "${config_dir}/public"

[content]
format = "legacy"
extension = "txt"
header_delimiter = "="

[log]
level = "Debug"
log_to_console = true
"##;
        let cfg = parse_config(toml_str, Path::new("/etc/ristretto")).unwrap();
        assert_eq!(cfg.blog.posts_per_page, 12);
        assert_eq!(cfg.paths.base_dir, PathBuf::from("/var/blog"));
        assert_eq!(cfg.paths.www_dir, PathBuf::from("/etc/ristretto/public"));
        assert_eq!(cfg.content.format, PostFormat::Legacy);
        assert_eq!(cfg.content.header_delimiter, '=');
        assert!(cfg.is_content_file(Path::new("a/b/post.txt")));
        assert!(!cfg.is_content_file(Path::new("a/b/post.md")));
        assert_eq!(cfg.html_file("hello"), "hello.html");
        assert!(cfg.log.unwrap().log_to_console);
    }

    #[test]
    fn test_validation() {
        let bad_page_size = MINIMAL.replace("description = \"Sparse thoughts\"", "description = \"x\"\nposts_per_page = 0");
        assert!(matches!(parse_config(&bad_page_size, Path::new("/")), Err(ConfigError::Validation(_))));

        let bad_max = MINIMAL.replace("description = \"Sparse thoughts\"", "description = \"x\"\nmax_posts_per_day = 100");
        assert!(matches!(parse_config(&bad_max, Path::new("/")), Err(ConfigError::Validation(_))));

        let bad_encoding = format!("{}\n[content]\ninput_encoding = \"latin-1\"\n", MINIMAL);
        assert!(matches!(parse_config(&bad_encoding, Path::new("/")), Err(ConfigError::Validation(_))));

        assert!(matches!(parse_config("[blog]\n", Path::new("/")), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_sample_config() {
        let cfg = parse_config(include_str!("../ristretto.toml"), Path::new("/home/me/blog")).unwrap();
        assert_eq!(cfg.paths.base_dir, PathBuf::from("/home/me/blog"));
        assert_eq!(cfg.paths.templates_dir, PathBuf::from("/home/me/blog/templates"));
        assert!(cfg.log.is_some());
    }
}
