use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ramhorns::{Content, Template};

use crate::error::PublishError;

/// Renders mustache templates read from the templates directory.
pub struct TemplateRenderer {
    template_dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template_dir: &Path) -> Self {
        TemplateRenderer {
            template_dir: template_dir.to_path_buf(),
        }
    }

    pub fn render<C: Content>(&self, template_name: &str, context: &C) -> Result<String, PublishError> {
        let template_path = self.template_dir.join(template_name);
        let template_src = match fs::read_to_string(&template_path) {
            Ok(src) => src,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(PublishError::TemplateNotFound(template_path)),
            Err(e) => return Err(PublishError::Io(template_path, e)),
        };

        let template = Template::new(template_src).map_err(|e| PublishError::Template {
            path: template_path.clone(),
            reason: e.to_string(),
        })?;

        Ok(template.render(context))
    }
}
