//! Preview server for the generated site. Serves the output directory as
//! static files; it plays no part in generation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ntex::web;
use ntex_files::NamedFile;
use spdlog::{debug, info};

use crate::config::Config;

struct AppState {
    www_dir: PathBuf,
    index_page: String,
    html_extension: String,
}

/// Maps a request path to a file under `www_dir`. Directories resolve to
/// their index page and extensionless permalinks to their `.html` file.
/// `None` for anything outside `www_dir` or missing.
pub fn resolve_path(www_dir: &Path, request_path: &str, index_page: &str, html_extension: &str) -> Option<PathBuf> {
    let rel = request_path.trim_start_matches('/');
    if rel.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }

    let candidate = www_dir.join(rel);
    if candidate.is_dir() {
        let index_file = candidate.join(index_page);
        return if index_file.is_file() { Some(index_file) } else { None };
    }
    if candidate.is_file() {
        return Some(candidate);
    }

    let with_ext = www_dir.join(format!("{}.{}", rel.trim_end_matches('/'), html_extension));
    if with_ext.is_file() {
        Some(with_ext)
    } else {
        None
    }
}

fn open_file(state: &AppState, request_path: &str) -> Result<NamedFile, web::Error> {
    match resolve_path(&state.www_dir, request_path, &state.index_page, &state.html_extension) {
        Some(file_path) => {
            debug!("Serving {}", file_path.display());
            Ok(NamedFile::open(file_path)?)
        }
        None => Err(web::error::ErrorNotFound("Not found").into()),
    }
}

#[web::get("/")]
async fn site_root(state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    open_file(&state, "")
}

#[web::get("/{path}*")]
async fn site_files(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    open_file(&state, &path.into_inner())
}

/// Serves `www_dir` on the configured address and `port`.
pub async fn server_run(config: Config, port: u16) -> io::Result<()> {
    let app_state = Arc::new(AppState {
        www_dir: config.paths.www_dir.clone(),
        index_page: config.output.index_page.clone(),
        html_extension: config.content.html_extension.clone(),
    });

    let bind_addr = config.server.address.clone();
    info!("Serving {} on http://{}:{}/", config.paths.www_dir.display(), bind_addr, port);

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(site_root)
            .service(site_files)
    })
        .bind((bind_addr, port))?
        .run()
        .await
}
