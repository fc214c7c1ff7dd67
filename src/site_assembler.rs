use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use spdlog::{error, info, warn};

use crate::config::Config;
use crate::error::PublishError;
use crate::paginator::Paginator;
use crate::post::Post;
use crate::text_utils::{beautify, slugify};
use crate::util::fs_helper::write_file;
use crate::view::markdown_renderer::MarkdownRenderer;
use crate::view::rss_renderer::{FeedItem, RssChannel};
use crate::view::template_renderer::TemplateRenderer;
use crate::view::{ArchiveLink, PageContext, PageLink, PostView};

/// `{www}/{YYYY}/{MM}/{DD}/{slug}.html`
pub fn permalink_path(config: &Config, post: &Post) -> PathBuf {
    let date = &post.header.date;
    config.paths.www_dir
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
        .join(config.html_file(&post.header.slug))
}

/// `(year, month)` of a post.
pub type Bucket = (i32, u32);

pub fn bucket_of(post: &Post) -> Bucket {
    (post.header.date.year(), post.header.date.month())
}

/// A post together with its rendered view.
pub struct PreparedPost<'a> {
    pub post: &'a Post,
    pub view: PostView,
}

#[derive(Debug, Default)]
pub struct AssemblyReport {
    pub written: Vec<PathBuf>,
    pub failures: usize,
}

/// Renders every output artifact of the site. A failing artifact is logged
/// and counted, the remaining ones are still generated.
pub struct SiteAssembler<'a> {
    config: &'a Config,
    templates: &'a TemplateRenderer,
    markdown: &'a MarkdownRenderer,
    pages: Vec<PageLink>,
    archive: Vec<ArchiveLink>,
    report: AssemblyReport,
}

impl<'a> SiteAssembler<'a> {
    /// `pages` and `posts` feed the navigation lists every template gets.
    /// `posts` must be sorted newest first.
    pub fn new(
        config: &'a Config,
        templates: &'a TemplateRenderer,
        markdown: &'a MarkdownRenderer,
        pages: &[Post],
        posts: &[Post],
    ) -> Self {
        SiteAssembler {
            config,
            templates,
            markdown,
            pages: page_links(config, pages),
            archive: archive_links(config, posts),
            report: AssemblyReport::default(),
        }
    }

    /// Converts posts for rendering. Posts whose markdown cannot be converted
    /// are left out and counted as failures.
    pub fn prepare<'p>(&mut self, posts: &'p [Post]) -> Vec<PreparedPost<'p>> {
        let mut prepared = Vec::with_capacity(posts.len());
        for post in posts {
            match PostView::from_post(post, self.markdown, self.config) {
                Ok(view) => prepared.push(PreparedPost { post, view }),
                Err(e) => self.fail(&post.file_name, e),
            }
        }
        prepared
    }

    fn fail(&mut self, artifact: &Path, e: PublishError) {
        error!("Could not generate {}: {}", artifact.display(), e);
        self.report.failures += 1;
    }

    fn emit(&mut self, path: PathBuf, rendered: Result<String, PublishError>) {
        match rendered.and_then(|html| write_file(&path, &html)) {
            Ok(()) => self.report.written.push(path),
            Err(e) => self.fail(&path, e),
        }
    }

    fn context(&self) -> PageContext<'_> {
        PageContext::new(self.config, &self.pages, &self.archive)
    }

    pub fn publish_permalinks(&mut self, posts: &[&PreparedPost]) {
        let config = self.config;
        for prepared in posts {
            let path = permalink_path(config, prepared.post);
            let rendered = {
                let ctx = self.context().with_post(&prepared.view);
                self.templates.render(&config.templates.permalink, &ctx)
            };
            self.emit(path, rendered);
        }
    }

    /// Static pages, rendered every run.
    pub fn publish_pages(&mut self, pages: &[PreparedPost]) {
        let config = self.config;
        let pages_dir = config.paths.www_dir.join(&config.output.pages_url);
        for page in pages {
            let path = pages_dir.join(config.html_file(&page.post.header.slug));
            let rendered = {
                let ctx = self.context().with_post(&page.view);
                self.templates.render(&config.templates.page, &ctx)
            };
            self.emit(path, rendered);
        }
    }

    pub fn publish_error_pages(&mut self) {
        let config = self.config;
        let www = &config.paths.www_dir;
        let artifacts = [
            (&config.templates.err_404, www.join(&config.output.err_404_page)),
            (&config.templates.err_500, www.join(&config.output.err_500_page)),
        ];
        for (template, path) in artifacts {
            let rendered = self.templates.render(template, &self.context());
            self.emit(path, rendered);
        }
    }

    /// Front page plus `index-N` pages, always from the full post list.
    pub fn publish_index_pages(&mut self, posts: &[PreparedPost]) {
        let config = self.config;
        let views: Vec<&PostView> = posts.iter().map(|p| &p.view).collect();
        let paginator = Paginator::from(&views, config.blog.posts_per_page);

        for page in paginator.pages(&config.output.index_page) {
            let path = config.paths.www_dir.join(&page.file_name);
            let rendered = {
                let mut ctx = self.context().with_posts(page.items.to_vec());
                ctx.prev_page_url = page.prev_file;
                ctx.next_page_url = page.next_file;
                self.templates.render(&config.templates.index, &ctx)
            };
            self.emit(path, rendered);
            info!("Wrote {} posts to page {}", page.items.len(), page.number);
        }
    }

    /// One page per contiguous `(year, month)` run of the sorted posts, then the
    /// archive index. With `only` set, buckets outside it are left alone.
    pub fn publish_monthly_archive(&mut self, posts: &[PreparedPost], only: Option<&HashSet<Bucket>>) {
        let config = self.config;
        for run in posts.chunk_by(|a, b| bucket_of(a.post) == bucket_of(b.post)) {
            let bucket = bucket_of(run[0].post);
            if only.map(|buckets| !buckets.contains(&bucket)).unwrap_or(false) {
                continue;
            }

            let path = config.paths.www_dir
                .join(format!("{:04}", bucket.0))
                .join(format!("{:02}", bucket.1))
                .join(&config.output.archive_page);
            let rendered = {
                let mut ctx = self.context().with_posts(run.iter().map(|p| &p.view).collect());
                ctx.archive_title = Some(month_title(bucket));
                self.templates.render(&config.templates.archive, &ctx)
            };
            self.emit(path, rendered);
        }

        let path = config.paths.www_dir.join(&config.output.archive_index_page);
        let rendered = self.templates.render(&config.templates.archive_index, &self.context());
        self.emit(path, rendered);
    }

    /// One unpaginated page per tag, under the tag's slug. Tags sharing a slug
    /// share a page. With `only` set, other slugs are left alone.
    pub fn publish_tags(&mut self, posts: &[PreparedPost], only: Option<&HashSet<String>>) {
        let mut tagged: BTreeMap<String, (&str, Vec<&PostView>)> = BTreeMap::new();
        for prepared in posts {
            for tag in &prepared.post.header.tags {
                let slug = slugify(tag);
                if slug.is_empty() {
                    warn!("Tag '{}' has no usable characters, skipping - file={}", tag, prepared.post.file_name.display());
                    continue;
                }
                let (_, views) = tagged.entry(slug).or_insert_with(|| (tag.as_str(), vec![]));
                if !views.last().is_some_and(|last| std::ptr::eq(*last, &prepared.view)) {
                    views.push(&prepared.view);
                }
            }
        }

        let config = self.config;
        let tags_dir = config.paths.www_dir.join(&config.output.tagged_url);
        for (slug, (tag, views)) in tagged {
            if only.map(|slugs| !slugs.contains(&slug)).unwrap_or(false) {
                continue;
            }

            let path = tags_dir.join(&slug).join(&config.output.tagged_page);
            let rendered = {
                let mut ctx = self.context().with_posts(views);
                ctx.tag = Some(tag);
                self.templates.render(&config.templates.tagged, &ctx)
            };
            self.emit(path, rendered);
        }
    }

    /// RSS feed of every post, newest first.
    pub fn publish_rss(&mut self, posts: &[PreparedPost], last_build_date: NaiveDateTime) {
        let config = self.config;
        let items: Vec<FeedItem> = posts
            .iter()
            .map(|p| FeedItem {
                title: &p.view.title,
                link: p.post.permalink(),
                description: &p.view.content,
                guid: p.post.permalink(),
                pub_date: p.post.header.date,
            })
            .collect();

        let channel = RssChannel {
            ch_title: &config.blog.title,
            ch_link: config.blog_url(),
            ch_desc: &config.blog.description,
            last_build_date,
        };

        let path = config.paths.www_dir.join(&config.output.rss_file);
        let rendered = channel
            .render(&items)
            .map(|xml| String::from_utf8_lossy(&xml).to_string())
            .map_err(PublishError::from);
        self.emit(path, rendered);
    }

    pub fn finish(self) -> AssemblyReport {
        self.report
    }
}

fn month_title((year, month): Bucket) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{:04}-{:02}", year, month))
}

/// `{url: /{pages_url}/{slug}.html, title}` for every static page.
pub fn page_links(config: &Config, pages: &[Post]) -> Vec<PageLink> {
    pages
        .iter()
        .map(|page| PageLink {
            url: format!("/{}/{}", config.output.pages_url, config.html_file(&page.header.slug)),
            title: beautify(&page.header.title),
        })
        .collect()
}

/// One entry per `(year, month)` holding at least one post, newest first.
pub fn archive_links(config: &Config, posts: &[Post]) -> Vec<ArchiveLink> {
    let mut buckets: Vec<Bucket> = posts.iter().map(bucket_of).collect();
    buckets.sort_unstable_by(|a, b| b.cmp(a));
    buckets.dedup();

    buckets
        .into_iter()
        .map(|bucket| ArchiveLink {
            url: format!("/{:04}/{:02}/{}", bucket.0, bucket.1, config.output.archive_page),
            date: format!("{:04}-{:02}", bucket.0, bucket.1),
            title: month_title(bucket),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::config::PostFormat;
    use crate::post::{parse_post_str, sort_posts};
    use crate::test_data::{post_source, test_config};

    use super::*;

    const LIST_TPL: &str = "{{#tag}}[{{tag}}]{{/tag}}{{#archive_title}}{{archive_title}}:{{/archive_title}}{{#posts}}{{slug}};{{/posts}}|{{prev_page_url}}|{{next_page_url}}";
    const POST_TPL: &str = "{{blog_title}}{{#post}}:{{title}}{{/post}}";
    const ARCHIVE_INDEX_TPL: &str = "{{#archive}}{{url}}={{title}};{{/archive}}";
    const NAV_TPL: &str = "{{#pages}}{{url}};{{/pages}}";

    fn setup(base: &Path) -> (Config, TemplateRenderer, MarkdownRenderer) {
        let config = test_config(base);
        let tpl = &config.paths.templates_dir;
        fs::create_dir_all(tpl).unwrap();
        for name in ["front_page.html", "monthly_archive.html", "tags.html"] {
            fs::write(tpl.join(name), LIST_TPL).unwrap();
        }
        for name in ["permalink.html", "page.html", "err_404.html"] {
            fs::write(tpl.join(name), POST_TPL).unwrap();
        }
        fs::write(tpl.join("archive_index.html"), ARCHIVE_INDEX_TPL).unwrap();
        fs::write(tpl.join("err_500.html"), NAV_TPL).unwrap();
        let templates = TemplateRenderer::new(tpl);
        let markdown = MarkdownRenderer::new(&config.markdown);
        (config, templates, markdown)
    }

    fn post(config: &Config, file: &str, title: &str, date: &str, tags: &str) -> Post {
        let source = post_source(title, date, "Published", "post", tags);
        parse_post_str(PostFormat::Header, Path::new(file), &source, config).unwrap()
    }

    fn sample_posts(config: &Config) -> Vec<Post> {
        let mut posts = vec![
            post(config, "20231130-p01-nov.md", "Nov", "2023-11-30", "rust"),
            post(config, "20231201-p01-dec-a.md", "Dec a", "2023-12-01 08:00:00", ""),
            post(config, "20231201-p02-dec-b.md", "Dec b", "2023-12-01 08:00:00", "rust, life"),
            post(config, "20240105-p01-jan.md", "Jan", "2024-01-05", "life"),
        ];
        sort_posts(&mut posts);
        posts
    }

    fn read(config: &Config, rel: &str) -> String {
        fs::read_to_string(config.paths.www_dir.join(rel)).unwrap()
    }

    #[test]
    fn test_permalink_path() {
        let config = test_config(Path::new("/blog"));
        let p = post(&config, "a.md", "Hello there", "2024-03-09", "");
        assert_eq!(permalink_path(&config, &p), PathBuf::from("/blog/www/2024/03/09/hello-there.html"));
    }

    #[test]
    fn test_permalinks_and_error_pages() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        let refs: Vec<&PreparedPost> = prepared.iter().collect();
        assembler.publish_permalinks(&refs);
        assembler.publish_error_pages();
        let report = assembler.finish();

        assert_eq!(report.failures, 0);
        assert_eq!(report.written.len(), 6);
        assert_eq!(read(&config, "2024/01/05/jan.html"), "The Example Blog:Jan");
        assert_eq!(read(&config, "404.html"), "The Example Blog");
    }

    #[test]
    fn test_index_pages() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        assembler.publish_index_pages(&prepared);

        assert_eq!(read(&config, "index.html"), "jan;dec-b;||index-1.html");
        assert_eq!(read(&config, "index-1.html"), "dec-a;nov;|index.html|");
        assert!(!config.paths.www_dir.join("index-2.html").exists());
    }

    #[test]
    fn test_monthly_archive() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        assembler.publish_monthly_archive(&prepared, None);
        let report = assembler.finish();

        assert_eq!(report.written.len(), 4);
        assert_eq!(read(&config, "2024/01/index.html"), "January 2024:jan;||");
        assert_eq!(read(&config, "2023/12/index.html"), "December 2023:dec-b;dec-a;||");
        assert_eq!(read(&config, "2023/11/index.html"), "November 2023:nov;||");
        assert_eq!(
            read(&config, "archive.html"),
            "/2024/01/index.html=January 2024;/2023/12/index.html=December 2023;/2023/11/index.html=November 2023;"
        );
    }

    #[test]
    fn test_monthly_archive_filtered() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        let only: HashSet<Bucket> = [(2023, 12)].into_iter().collect();
        assembler.publish_monthly_archive(&prepared, Some(&only));

        assert_eq!(read(&config, "2023/12/index.html"), "December 2023:dec-b;dec-a;||");
        assert!(!config.paths.www_dir.join("2024/01/index.html").exists());
        assert!(config.paths.www_dir.join("archive.html").exists());
    }

    #[test]
    fn test_tags() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        assembler.publish_tags(&prepared, None);

        assert_eq!(read(&config, "tag/rust/index.html"), "[rust]dec-b;nov;||");
        assert_eq!(read(&config, "tag/life/index.html"), "[life]jan;dec-b;||");
    }

    #[test]
    fn test_tags_use_slugs() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let mut posts = vec![
            post(&config, "20240105-p01-ci.md", "Ci", "2024-01-05", "CI/CD, Static Sites"),
            post(&config, "20240106-p01-both.md", "Both", "2024-01-06", "ci cd, ci/cd, \"???\""),
        ];
        sort_posts(&mut posts);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        assembler.publish_tags(&prepared, None);
        let report = assembler.finish();

        assert_eq!(report.failures, 0);
        assert_eq!(read(&config, "tag/ci-cd/index.html"), "[ci cd]both;ci;||");
        assert_eq!(read(&config, "tag/static-sites/index.html"), "[Static Sites]ci;||");
        assert_eq!(report.written.len(), 2);
    }

    #[test]
    fn test_tags_filtered() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        let only: HashSet<String> = ["life".to_string()].into_iter().collect();
        assembler.publish_tags(&prepared, Some(&only));
        let report = assembler.finish();

        assert_eq!(report.written, [config.paths.www_dir.join("tag/life/index.html")]);
        assert_eq!(read(&config, "tag/life/index.html"), "[life]jan;dec-b;||");
        assert!(!config.paths.www_dir.join("tag/rust").exists());
    }

    #[test]
    fn test_pages_and_nav() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let source = post_source("About me", "2020-01-01", "Published", "page", "");
        let pages = vec![parse_post_str(PostFormat::Header, Path::new("about.md"), &source, &config).unwrap()];

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &pages, &[]);
        let prepared = assembler.prepare(&pages);
        assembler.publish_pages(&prepared);
        assembler.publish_error_pages();

        assert_eq!(read(&config, "pages/about-me.html"), "The Example Blog:About me");
        assert_eq!(read(&config, "500.html"), "/pages/about-me.html;");
    }

    #[test]
    fn test_missing_template_is_counted() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        fs::remove_file(config.paths.templates_dir.join("err_404.html")).unwrap();

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &[]);
        assembler.publish_error_pages();
        let report = assembler.finish();

        assert_eq!(report.failures, 1);
        assert_eq!(report.written, [config.paths.www_dir.join("500.html")]);
    }

    #[test]
    fn test_rss() {
        let dir = tempdir().unwrap();
        let (config, templates, markdown) = setup(dir.path());
        let posts = sample_posts(&config);

        let mut assembler = SiteAssembler::new(&config, &templates, &markdown, &[], &posts);
        let prepared = assembler.prepare(&posts);
        let built = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assembler.publish_rss(&prepared, built);

        let rss = read(&config, "rss.xml");
        assert!(rss.contains("<lastBuildDate>Thu, 1 Feb 2024 00:00:00 +0000</lastBuildDate>"));
        assert!(rss.contains("<guid>http://example.com/2024/01/05/jan</guid>"));
        let jan = rss.find("<title>Jan</title>").unwrap();
        let nov = rss.find("<title>Nov</title>").unwrap();
        assert!(jan < nov);
    }
}
