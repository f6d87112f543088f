#![allow(dead_code)]

//! Shared fixtures for pipeline integration tests.
//!
//! Each test builds a throwaway web root under a temp directory, drops
//! stage scripts and content files into it with explicit permission
//! bits, and drives the engine directly.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use cascade_server::config::ServerConfig;
use cascade_server::pipeline::{Engine, Request};
use url::Url;

/// Write a plain file with the given permission bits.
pub fn write_file(root: &Path, rel: &str, contents: impl AsRef<[u8]>, mode: u32) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents.as_ref()).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}

/// Write an executable shell script (mode 0755).
pub fn write_script(root: &Path, rel: &str, body: &str) -> PathBuf {
    write_file(root, rel, format!("#!/bin/sh\n{body}\n"), 0o755)
}

/// An engine rooted at `root` with test-friendly settings.
pub fn engine(root: &Path) -> Engine {
    engine_with(root, |_| {})
}

/// An engine rooted at `root`, with extra config tweaks applied.
pub fn engine_with(root: &Path, tweak: impl FnOnce(&mut ServerConfig)) -> Engine {
    let mut config = ServerConfig::default();
    config.pipeline.web_root = root.to_path_buf();
    config.timeouts.stage_secs = 5;
    tweak(&mut config);
    Engine::new(&config)
}

/// A GET request for the given path (and optional query).
pub fn get(path_and_query: &str) -> Request {
    Request::new(
        "GET",
        Url::parse(&format!("http://localhost{path_and_query}")).unwrap(),
    )
}

/// A POST request carrying a body.
#[allow(dead_code)]
pub fn post(path_and_query: &str, body: &[u8]) -> Request {
    let mut request = Request::new(
        "POST",
        Url::parse(&format!("http://localhost{path_and_query}")).unwrap(),
    );
    request.body = body.to_vec();
    request
}
