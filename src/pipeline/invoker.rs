//! External process execution for content and stage files.
//!
//! # Responsibilities
//! - Marshal request metadata into the child's environment
//! - Feed the request body on stdin, capture stdout as the produced body
//! - Parse stderr line by line as the out-of-band control channel
//! - Bound execution time and kill the child on timeout or cancellation
//!
//! # Environment contract
//! `HEADER_<name>` per request header, `QUERY_<name>` per query parameter,
//! `VERB`, `REQUESTED` (URL path), `STATUS` for response-side stages only,
//! plus any `[env]` pairs from the directory config layers and a `PATH`
//! passthrough. The child's working directory is the executable's parent,
//! and argv[1] carries the trailing path info (empty when none).
//!
//! # Control channel
//! `status <code>` sets the output status, `header <name> <value>` sets a
//! header (empty value removes on merge), `log <message>` forwards to the
//! server log. Anything else on stderr is child diagnostics.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::pipeline::error::EngineError;
use crate::pipeline::request::Request;
use crate::pipeline::response::Response;

/// Spawns and supervises one child process per stage invocation.
#[derive(Debug, Clone)]
pub struct Invoker {
    stage_timeout: Duration,
}

/// Per-invocation context beyond the request itself.
pub struct StageEnv<'a> {
    /// Extra environment from the layered directory config.
    pub extra_env: &'a HashMap<String, String>,
    /// Current response status; set only when invoking response-side stages.
    pub status: Option<u16>,
    /// Path segments beyond the executable, exposed as argv[1].
    pub trailing: &'a str,
}

impl Invoker {
    pub fn new(stage_timeout: Duration) -> Self {
        Self { stage_timeout }
    }

    /// Execute `exe` against `request`, returning its raw stage output.
    ///
    /// Exit code 0 maps to status 200; a nonzero exit code becomes the
    /// status unless the child's control stream overrode it. The future
    /// owns the child; dropping it (timeout, cancellation) kills the
    /// process.
    pub async fn invoke(
        &self,
        exe: &Path,
        request: &Request,
        ctx: StageEnv<'_>,
    ) -> Result<Response, EngineError> {
        let mut cmd = Command::new(exe);
        cmd.arg(ctx.trailing);
        if let Some(parent) = exe.parent() {
            cmd.current_dir(parent);
        }

        cmd.env_clear();
        for (name, value) in &request.headers {
            cmd.env(format!("HEADER_{name}"), value);
        }
        for (name, value) in &request.query {
            cmd.env(format!("QUERY_{name}"), value);
        }
        cmd.env("VERB", &request.verb);
        cmd.env("REQUESTED", request.url.path());
        for (name, value) in ctx.extra_env {
            cmd.env(name, value);
        }
        if let Some(status) = ctx.status {
            cmd.env("STATUS", status.to_string());
        }
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            path: exe.to_path_buf(),
            source,
        })?;

        // Feed the body from a separate task so a child that fills its
        // stdout pipe before draining stdin cannot deadlock the invoker.
        if let Some(mut stdin) = child.stdin.take() {
            let body = request.body.clone();
            tokio::spawn(async move {
                let _ = stdin.write_all(&body).await;
            });
        }

        let output = tokio::time::timeout(self.stage_timeout, child.wait_with_output())
            .await
            .map_err(|_| EngineError::Timeout {
                path: exe.to_path_buf(),
                timeout: self.stage_timeout,
            })?
            .map_err(|source| EngineError::StageIo {
                path: exe.to_path_buf(),
                source,
            })?;

        let mut response = Response {
            status: match output.status.code() {
                Some(0) => 200,
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                Some(n) => n as u16,
                None => {
                    tracing::warn!(path = %exe.display(), "Stage terminated by signal");
                    500
                }
            },
            headers: HashMap::new(),
            body: output.stdout,
        };
        parse_control_stream(&output.stderr, &mut response);
        Ok(response)
    }
}

/// Interpret the child's stderr as the control channel.
fn parse_control_stream(stderr: &[u8], response: &mut Response) {
    for line in String::from_utf8_lossy(stderr).lines() {
        if let Some(message) = line.strip_prefix("log ") {
            tracing::info!(target: "cascade_server::stage", "{message}");
        } else if let Some(pair) = line.strip_prefix("header ") {
            if let Some(split) = pair.find(' ') {
                response
                    .headers
                    .insert(pair[..split].to_string(), pair[split + 1..].to_string());
            }
        } else if let Some(code) = line.strip_prefix("status ") {
            response.status = code.trim().parse().unwrap_or(500);
        } else if !line.is_empty() {
            tracing::debug!(target: "cascade_server::stage", "child stderr: {line}");
        }
    }
}
