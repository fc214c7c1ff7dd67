use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Local;
use spdlog::info;

use crate::config::Config;
use crate::draft_promoter::DraftPromoter;
use crate::error::PublishError;
use crate::publish_planner::{Plan, PublishPlanner};
use crate::site_assembler::{bucket_of, Bucket, PreparedPost, SiteAssembler};
use crate::text_utils::slugify;
use crate::view::markdown_renderer::MarkdownRenderer;
use crate::view::template_renderer::TemplateRenderer;

#[derive(Debug, Default, PartialEq)]
pub struct PublishSummary {
    pub previews: usize,
    pub promoted: usize,
    pub posts: usize,
    pub written: usize,
}

/// One full run: promote drafts, find stale posts, regenerate the site.
///
/// Running out of daily sequence numbers stops the run before anything is
/// generated. Any other failing artifact is skipped and reported at the end
/// as [`PublishError::ArtifactsFailed`].
pub fn publish(config: &Config) -> Result<PublishSummary, PublishError> {
    let templates = TemplateRenderer::new(&config.paths.templates_dir);
    let markdown = MarkdownRenderer::new(&config.markdown);

    let promotion = DraftPromoter::new(config, &templates, &markdown).promote()?;
    info!("{} preview(s) written, {} draft(s) promoted", promotion.previews.len(), promotion.promoted.len());

    let planner = PublishPlanner::new(config);
    let plan = planner.plan();
    let pages = planner.load_pages();
    let posts = planner.load_posts();

    let mut assembler = SiteAssembler::new(config, &templates, &markdown, &pages, &posts);

    let prepared_pages = assembler.prepare(&pages);
    assembler.publish_pages(&prepared_pages);
    assembler.publish_error_pages();

    let prepared = assembler.prepare(&posts);
    match plan {
        Plan::Full => {
            info!("No stale posts, regenerating all {} posts", prepared.len());
            let all: Vec<&PreparedPost> = prepared.iter().collect();
            assembler.publish_permalinks(&all);
            assembler.publish_index_pages(&prepared);
            assembler.publish_monthly_archive(&prepared, None);
            assembler.publish_tags(&prepared, None);
        }
        Plan::Incremental(stale) => {
            info!("{} stale post(s)", stale.len());
            let stale: HashSet<PathBuf> = stale.into_iter().collect();
            let changed: Vec<&PreparedPost> = prepared
                .iter()
                .filter(|p| stale.contains(&p.post.file_name))
                .collect();
            let buckets: HashSet<Bucket> = changed.iter().map(|p| bucket_of(p.post)).collect();
            let tags: HashSet<String> = changed
                .iter()
                .flat_map(|p| p.post.header.tags.iter().map(|tag| slugify(tag)))
                .collect();

            assembler.publish_permalinks(&changed);
            assembler.publish_index_pages(&prepared);
            assembler.publish_monthly_archive(&prepared, Some(&buckets));
            assembler.publish_tags(&prepared, Some(&tags));
        }
    }
    assembler.publish_rss(&prepared, Local::now().naive_local());

    let report = assembler.finish();
    let failures = report.failures + promotion.failures;
    if failures > 0 {
        return Err(PublishError::ArtifactsFailed(failures));
    }

    Ok(PublishSummary {
        previews: promotion.previews.len(),
        promoted: promotion.promoted.len(),
        posts: posts.len(),
        written: report.written.len(),
    })
}
