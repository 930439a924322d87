// ABOUTME: Preview server for generated builds
// ABOUTME: Serves the build directory over HTTP so the bundle can be checked in a browser

use crate::errors::{CastError, Result};
use crate::utils;
use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Content type for a served file, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Map a request URL to a file under `root`. Returns None for paths escaping it.
pub fn resolve_request_path(root: &Path, index: &str, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let clean = path.trim_start_matches('/');
    if clean.is_empty() {
        return Some(root.join(index));
    }

    if !utils::is_contained_path(clean) {
        return None;
    }
    Some(root.join(clean))
}

/// Serve `build_dir` on `port` until the process is stopped.
pub fn serve(build_dir: &Path, index: &str, port: u16) -> Result<()> {
    if !build_dir.is_dir() {
        return Err(CastError::StateError(
            "Please generate your project before.".to_string(),
        ));
    }

    let server = Server::http(format!("127.0.0.1:{}", port))
        .map_err(|e| CastError::ServerError(format!("Failed to start HTTP server: {}", e)))?;
    info!("Preview listening on http://localhost:{}", port);
    println!("Preview listening on http://localhost:{}", port);

    for request in server.incoming_requests() {
        respond(request, build_dir, index);
    }
    Ok(())
}

fn respond(request: Request, root: &Path, index: &str) {
    let url = request.url().to_string();
    let file_path = match resolve_request_path(root, index, &url) {
        Some(path) if path.is_file() => path,
        _ => {
            debug!("404 for {}", url);
            let response = Response::from_string("404 Not Found").with_status_code(StatusCode(404));
            if let Err(e) = request.respond(response) {
                error!("Failed to send response: {}", e);
            }
            return;
        }
    };

    debug!("Request for {:?} -> {:?}", url, file_path);
    let result = match fs::read(&file_path) {
        Ok(content) => {
            let response = Response::from_data(content);
            match Header::from_bytes("Content-Type", content_type(&file_path)) {
                Ok(header) => request.respond(response.with_header(header)),
                Err(_) => request.respond(response),
            }
        }
        Err(e) => {
            error!("Failed to read file {:?}: {}", file_path, e);
            request.respond(
                Response::from_string(format!("Failed to read file: {}", e))
                    .with_status_code(StatusCode(500)),
            )
        }
    };
    if let Err(e) = result {
        error!("Failed to send response: {}", e);
    }
}
