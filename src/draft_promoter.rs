use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use spdlog::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{PostError, PublishError};
use crate::post::{parse_post, Post, PostStatus, PostType};
use crate::util::fs_helper::{ensure_dir, list_files, move_file, write_file};
use crate::view::markdown_renderer::MarkdownRenderer;
use crate::view::template_renderer::TemplateRenderer;
use crate::view::{PageContext, PostView};

#[derive(Debug, Default, PartialEq)]
pub struct PromotionReport {
    /// Preview files written.
    pub previews: Vec<PathBuf>,
    /// Destination of every promoted file.
    pub promoted: Vec<PathBuf>,
    /// Previews that could not be rendered.
    pub failures: usize,
}

/// Moves content out of the drafts area: previews for drafts marked
/// `Publish`, promotion into the content tree for whatever sits in the
/// publish-now directory.
pub struct DraftPromoter<'a> {
    config: &'a Config,
    templates: &'a TemplateRenderer,
    markdown: &'a MarkdownRenderer,
}

impl<'a> DraftPromoter<'a> {
    pub fn new(config: &'a Config, templates: &'a TemplateRenderer, markdown: &'a MarkdownRenderer) -> Self {
        DraftPromoter {
            config,
            templates,
            markdown,
        }
    }

    pub fn promote(&self) -> Result<PromotionReport, PublishError> {
        let mut report = PromotionReport::default();
        self.process_drafts(&mut report)?;
        self.process_publish_now(&mut report)?;
        Ok(report)
    }

    fn parse(&self, path: &Path) -> Option<Post> {
        match parse_post(self.config.content.format, path, self.config) {
            Ok(post) => Some(post),
            Err(PostError::DraftEncountered(_)) => {
                debug!("Skipping draft {}", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Renders a preview of every draft whose status is `Publish`. The draft
    /// itself is left untouched.
    pub fn process_drafts(&self, report: &mut PromotionReport) -> Result<(), PublishError> {
        let paths = &self.config.paths;
        ensure_dir(&paths.publish_now_dir)?;

        for path in list_files(&paths.drafts_dir, &self.config.content.extension)? {
            let scheduled = path
                .file_name()
                .map(|name| paths.publish_now_dir.join(name).exists())
                .unwrap_or(false);
            if scheduled {
                debug!("{} is scheduled for publishing, no preview", path.display());
                continue;
            }

            let post = match self.parse(&path) {
                Some(post) if post.header.status == PostStatus::Publish => post,
                _ => continue,
            };

            let preview_path = paths.preview_dir.join(self.config.html_file(&post.file_stem()));
            match self.write_preview(&post, &preview_path) {
                Ok(()) => {
                    info!("Wrote preview of {} to {}", path.display(), preview_path.display());
                    report.previews.push(preview_path);
                }
                Err(e) => {
                    error!("Could not write preview of {}: {}", path.display(), e);
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    fn write_preview(&self, post: &Post, preview_path: &Path) -> Result<(), PublishError> {
        let view = PostView::from_post(post, self.markdown, self.config)?;
        let (pages, archive) = (vec![], vec![]);
        let ctx = PageContext::new(self.config, &pages, &archive).with_post(&view);
        let html = self.templates.render(&self.config.templates.permalink, &ctx)?;
        write_file(preview_path, &html)
    }

    /// Promotes every file in the publish-now directory. Running out of
    /// sequence numbers stops the whole run.
    pub fn process_publish_now(&self, report: &mut PromotionReport) -> Result<(), PublishError> {
        let format = self.config.content.format;

        for path in list_files(&self.config.paths.publish_now_dir, &self.config.content.extension)? {
            let mut post = match self.parse(&path) {
                Some(post) => post,
                None => continue,
            };

            post.set_status(PostStatus::Published);
            if let Err(e) = post.normalize(format, self.config) {
                error!("Could not normalize {}: {}", path.display(), e);
                continue;
            }

            let destination = match post.header.post_type {
                PostType::Page => self.config.paths.pages_dir.join(self.config.content_file(&post.header.slug)),
                PostType::Post => self.post_destination(&post)?,
            };

            match move_file(&path, &destination) {
                Ok(()) => report.promoted.push(destination),
                Err(e) => error!("Could not move file {} to {}. Error: {}", path.display(), destination.display(), e),
            }
        }

        Ok(())
    }

    /// `{posts_dir}/YYYY/MM/YYYYMMDD-pSS-slug.ext`
    fn post_destination(&self, post: &Post) -> Result<PathBuf, PublishError> {
        let date = post.header.date.date();
        let sequence = self.next_sequence(date)?;
        let file_name = self.config.content_file(&format!("{}-p{:02}-{}", date.format("%Y%m%d"), sequence, post.header.slug));
        Ok(self.month_dir(date).join(file_name))
    }

    fn month_dir(&self, date: NaiveDate) -> PathBuf {
        self.config.paths.posts_dir
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
    }

    /// One past the highest sequence already used on `date`.
    pub fn next_sequence(&self, date: NaiveDate) -> Result<u32, PublishError> {
        lazy_static! {
            static ref SEQUENCE: Regex = Regex::new(r"^(\d{8})-p(\d{2})").unwrap();
        }

        let day = date.format("%Y%m%d").to_string();
        let bucket = self.month_dir(date);
        let mut highest = 0;

        if bucket.is_dir() {
            let entries = fs::read_dir(&bucket).map_err(|e| PublishError::Io(bucket.clone(), e))?;
            for entry in entries.flatten() {
                let path = entry.path();
                if !self.config.is_content_file(&path) {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy().to_string();
                if let Some(caps) = SEQUENCE.captures(&file_name) {
                    if caps[1] == day {
                        let sequence: u32 = caps[2].parse().unwrap_or(0);
                        highest = highest.max(sequence);
                    }
                }
            }
        }

        let sequence = highest + 1;
        let max = self.config.blog.max_posts_per_day;
        if sequence > max {
            return Err(PublishError::SequenceExhausted { date, sequence, max });
        }
        Ok(sequence)
    }
}
