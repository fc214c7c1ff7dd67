use std::path::{Path, PathBuf};

use spdlog::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::PostError;
use crate::post::{parse_post, sort_posts, Post};
use crate::site_assembler::permalink_path;
use crate::util::fs_helper::{list_files, modified_time};

/// What the next run regenerates.
#[derive(Debug, PartialEq)]
pub enum Plan {
    /// Only these sources changed since their permalink was written.
    Incremental(Vec<PathBuf>),
    /// Nothing is stale: everything is regenerated so reruns stay consistent.
    Full,
}

pub struct PublishPlanner<'a> {
    config: &'a Config,
}

impl<'a> PublishPlanner<'a> {
    pub fn new(config: &'a Config) -> Self {
        PublishPlanner { config }
    }

    /// Every content file under the posts directory, at any depth.
    pub fn content_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.config.paths.posts_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.config.is_content_file(path))
            .collect();
        files.sort();
        files
    }

    /// The permalink is missing or older than its source.
    pub fn post_needs_publishing(&self, path: &Path) -> Result<bool, PostError> {
        let post = parse_post(self.config.content.format, path, self.config)?;
        let output = permalink_path(self.config, &post);
        if !output.exists() {
            return Ok(true);
        }

        let source_time = modified_time(path).map_err(|e| PostError::Io(path.to_path_buf(), e))?;
        let output_time = modified_time(&output).map_err(|e| PostError::Io(output.clone(), e))?;
        Ok(output_time < source_time)
    }

    pub fn need_publishing(&self) -> Vec<PathBuf> {
        let mut stale = vec![];
        for path in self.content_files() {
            match self.post_needs_publishing(&path) {
                Ok(true) => stale.push(path),
                Ok(false) => {}
                Err(e) if e.is_draft() => debug!("Skipping draft {}", path.display()),
                Err(e) => warn!("Ignoring {}: {}", path.display(), e),
            }
        }
        stale
    }

    pub fn plan(&self) -> Plan {
        let stale = self.need_publishing();
        if stale.is_empty() {
            Plan::Full
        } else {
            Plan::Incremental(stale)
        }
    }

    /// Every publishable post, newest first.
    pub fn load_posts(&self) -> Vec<Post> {
        load_posts(self.config, &self.content_files())
    }

    /// Static pages, ordered by file name.
    pub fn load_pages(&self) -> Vec<Post> {
        match list_files(&self.config.paths.pages_dir, &self.config.content.extension) {
            Ok(files) => files.iter().filter_map(|path| load_post(self.config, path)).collect(),
            Err(e) => {
                warn!("Could not list pages: {}", e);
                vec![]
            }
        }
    }
}

fn load_post(config: &Config, path: &Path) -> Option<Post> {
    match parse_post(config.content.format, path, config) {
        Ok(post) => Some(post),
        Err(e) if e.is_draft() => {
            debug!("Skipping draft {}", path.display());
            None
        }
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Parses `paths`, leaving out drafts and files that fail to parse.
pub fn load_posts(config: &Config, paths: &[PathBuf]) -> Vec<Post> {
    let mut posts: Vec<Post> = paths.iter().filter_map(|path| load_post(config, path)).collect();
    sort_posts(&mut posts);
    posts
}
