//! HTTP response handlers.

use crate::bundle::Bundle;
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Bundle ids are content digests: a bundle never changes.
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Respond with a bundle.
pub fn respond_bundle(request: Request, bundle: &Bundle) -> Result<()> {
    let content_type = bundle.kind.mime();

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let response = Response::from_data(bundle.content.as_bytes().to_vec())
        .with_status_code(StatusCode(200))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", IMMUTABLE));
    request.respond(response)?;
    Ok(())
}

/// Respond with a static file.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;

    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
