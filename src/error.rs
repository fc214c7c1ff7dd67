use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Why a content file could not become a [`crate::post::Post`].
#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0} does not look like a post")]
    NotAPost(PathBuf),

    #[error("required field '{field}' is missing - file={path}")]
    MissingField { path: PathBuf, field: &'static str },

    /// Not really an error: drafts are skipped by every caller.
    #[error("{0} is a draft")]
    DraftEncountered(PathBuf),

    #[error("invalid value '{value}' for '{field}' - file={path}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        value: String,
    },

    #[error("error parsing post header - file={path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] io::Error),
}

impl PostError {
    pub fn is_draft(&self) -> bool {
        matches!(self, PostError::DraftEncountered(_))
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("max posts per day is {max}. Got {sequence} posts for {date}")]
    SequenceExhausted {
        date: NaiveDate,
        sequence: u32,
        max: u32,
    },

    #[error("template `{0}` not found")]
    TemplateNotFound(PathBuf),

    #[error("error parsing template `{path}`: {reason}")]
    Template { path: PathBuf, reason: String },

    #[error("error converting markdown: {0}")]
    Markdown(String),

    #[error("error writing feed: {0}")]
    Feed(#[from] quick_xml::Error),

    #[error(transparent)]
    Post(#[from] PostError),

    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("{0} artifact(s) could not be generated")]
    ArtifactsFailed(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("config file parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
