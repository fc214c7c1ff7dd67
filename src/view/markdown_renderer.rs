use markdown::Options;

use crate::config::MarkdownOptions;
use crate::error::PublishError;
use crate::text_utils::beautify;

pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new(markdown: &MarkdownOptions) -> Self {
        let mut options = if markdown.gfm { Options::gfm() } else { Options::default() };
        options.compile.allow_dangerous_html = markdown.allow_html;
        MarkdownRenderer { options }
    }

    /// Markdown to HTML, typographically beautified.
    pub fn convert(&self, text: &str) -> Result<String, PublishError> {
        match markdown::to_html_with_options(text, &self.options) {
            Ok(html) => Ok(beautify(&html)),
            Err(e) => Err(PublishError::Markdown(e.reason)),
        }
    }
}
