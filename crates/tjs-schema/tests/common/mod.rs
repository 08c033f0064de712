//! Shared fixtures for the schema resolution suites.

#![allow(dead_code)]

use std::path::Path;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// On-disk / on-wire encoding of a fixture schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Json, Format::Yaml];

    pub fn ext(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

/// Person schema used by every suite.
pub fn person_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "age": {"type": "integer", "minimum": 0}
        }
    })
}

/// `(data, expected validity)` pairs checked against [`person_schema`].
pub fn cases() -> Vec<(Value, bool)> {
    vec![(json!({"age": 30}), true), (json!({"age": -1}), false)]
}

pub fn serialize(value: &Value, format: Format) -> String {
    match format {
        Format::Json => serde_json::to_string_pretty(value).unwrap(),
        Format::Yaml => serde_yaml::to_string(value).unwrap(),
    }
}

/// Write `files` (relative path → contents) below `root`.
pub fn build_file_tree(root: &Path, files: &[(String, String)]) {
    for (relative, contents) in files {
        let file = root.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, contents).unwrap();
    }
}

/// Serve `files` (relative path → contents) from a local mock HTTP server.
///
/// Unmounted paths answer 404. The server is torn down when dropped.
pub async fn serve_file_tree(files: &[(String, String)]) -> MockServer {
    let server = MockServer::start().await;
    for (relative, contents) in files {
        Mock::given(method("GET"))
            .and(path(format!("/{relative}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(contents.clone()))
            .mount(&server)
            .await;
    }
    server
}
