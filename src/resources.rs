//! Ancillary files served next to the report
//!
//! `?resource=<name>` serves a bundled static asset and `?build=<name>` a
//! piece of build metadata. Only names on the allow-lists below resolve;
//! anything else (including path tricks) is a 404.

use std::borrow::Cow;
use std::path::Path;

/// A resolved download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub content_type: &'static str,
    pub bytes: Cow<'static, [u8]>,
}

const STATIC_RESOURCES: &[(&str, &[u8])] = &[
    ("probewatch.css", include_bytes!("../resources/probewatch.css") as &[u8]),
    ("tabs.js", include_bytes!("../resources/tabs.js") as &[u8]),
];

const BUILD_RESOURCES: &[&str] = &["version.txt", "build-info.json"];

/// MIME type from the file extension
pub fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn static_resource(name: &str) -> Option<Resource> {
    STATIC_RESOURCES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(known, bytes)| Resource {
            content_type: content_type_for(known),
            bytes: Cow::Borrowed(*bytes),
        })
}

pub fn build_resource(name: &str) -> Option<Resource> {
    if !BUILD_RESOURCES.contains(&name) {
        return None;
    }
    let body = match name {
        "version.txt" => format!("{}\n", env!("CARGO_PKG_VERSION")),
        _ => serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        })
        .to_string(),
    };
    Some(Resource {
        content_type: content_type_for(name),
        bytes: Cow::Owned(body.into_bytes()),
    })
}
