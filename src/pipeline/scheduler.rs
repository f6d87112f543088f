//! Pipeline scheduling and phase ordering.
//!
//! # Phase machine
//! ```text
//! resolve ──▶ gatekeepers (depth asc, seq asc)
//!                 │ first failure: record cutoff depth, adopt verdict
//!                 ▼
//!             request transformers (depth asc, seq asc)
//!                 ▼
//!             content (execute or read the target)
//!                 ▼
//!             response transformers (depth desc, seq asc,
//!                                    depth ≤ cutoff after a rejection)
//!                 ▼
//!             finalize ──▶ loggers (async, best-effort)
//! ```
//!
//! # Design Decisions
//! - Stages within one request run strictly sequentially; each may depend
//!   on the cumulative effect of the previous ones
//! - A gatekeeper rejection is a normal outcome and still flows through
//!   the (truncated) response-transform phase
//! - Any spawn/timeout/read fault aborts the pipeline into a fixed 500
//! - Loggers are fire-and-forget; they can never block or fail a response

use std::cmp::Reverse;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::observability::metrics;
use crate::pipeline::assembler;
use crate::pipeline::discovery::{self, StageFile, StageKind};
use crate::pipeline::error::EngineError;
use crate::pipeline::invoker::{Invoker, StageEnv};
use crate::pipeline::request::Request;
use crate::pipeline::response::Response;
use crate::pipeline::walker::{self, Resolution, ResolvedTarget};

/// The pipeline engine: one instance serves many concurrent requests.
///
/// Holds only immutable settings; all per-request state lives on the
/// stack of [`Engine::handle`].
#[derive(Debug, Clone)]
pub struct Engine {
    root: PathBuf,
    default_index: String,
    invoker: Invoker,
}

impl Engine {
    /// Build an engine from the server configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            root: config.pipeline.web_root.clone(),
            default_index: config.pipeline.default_index.clone(),
            invoker: Invoker::new(Duration::from_secs(config.timeouts.stage_secs)),
        }
    }

    /// Run one request through the full pipeline.
    ///
    /// Never returns an error: resolution misses become 404s, gatekeeper
    /// rejections flow through as their own responses, and execution
    /// faults collapse into the fixed internal-error response.
    pub async fn handle(&self, mut request: Request) -> Response {
        let resolution = walker::resolve(&self.root, request.url.path(), &self.default_index);
        let target = match resolution {
            Resolution::NotFound => {
                tracing::debug!(path = %request.url.path(), "Path did not resolve");
                return Response::not_found();
            }
            Resolution::Found(target) => target,
        };

        match self.run_pipeline(&mut request, &target).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    path = %e.path().display(),
                    requested = %request.url.path(),
                    error = %e,
                    "Pipeline aborted on execution fault"
                );
                Response::internal_error()
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &mut Request,
        target: &ResolvedTarget,
    ) -> Result<Response, EngineError> {
        let stages = discovery::discover(&target.dirs);
        let requested_path = request.url.path().to_string();

        let mut response = Response::default();
        let mut cutoff: Option<usize> = None;

        // Phase 1: gatekeepers.
        let mut gatekeepers = stages_of(&stages, StageKind::Gatekeeper);
        gatekeepers.sort_by_key(|s| (s.depth, s.sequence, s.name.clone()));
        for stage in gatekeepers {
            let verdict = self.run_stage(stage, request, target, None, &requested_path).await?;
            if !verdict.is_ok() {
                tracing::debug!(
                    depth = stage.depth,
                    sequence = stage.sequence,
                    status = verdict.status,
                    "Gatekeeper rejected request"
                );
                cutoff = Some(stage.depth);
                response = verdict;
                break;
            }
        }

        if cutoff.is_none() {
            // Phase 2: request transformers, each observing the previous
            // one's mutations.
            let mut transformers = stages_of(&stages, StageKind::RequestTransformer);
            transformers.sort_by_key(|s| (s.depth, s.sequence, s.name.clone()));
            for stage in transformers {
                let output = self.run_stage(stage, request, target, None, &requested_path).await?;
                if output.is_ok() {
                    assembler::apply_request_stage(request, output);
                }
            }

            // Phase 3: content.
            response = if target.is_executable {
                let env = StageEnv {
                    extra_env: target.overlay.env(),
                    status: None,
                    trailing: &target.trailing,
                };
                self.invoker.invoke(&target.target, request, env).await?
            } else {
                let body = std::fs::read(&target.target).map_err(|source| EngineError::Read {
                    path: target.target.clone(),
                    source,
                })?;
                Response {
                    status: 200,
                    body,
                    ..Default::default()
                }
            };
            assembler::apply_content_type(&mut response, &target.overlay, &target.target);
        }

        // Phase 4: response transformers, deepest first. After a rejection
        // only those no deeper than the failing gatekeeper run; the request
        // never earned the deeper, more specific ones.
        let mut transformers = stages_of(&stages, StageKind::ResponseTransformer);
        transformers.retain(|s| cutoff.map_or(true, |depth| s.depth <= depth));
        transformers.sort_by_key(|s| (Reverse(s.depth), s.sequence, s.name.clone()));
        for stage in transformers {
            let pseudo = response_view(request, &response);
            let output = self
                .run_stage(stage, &pseudo, target, Some(response.status), &requested_path)
                .await?;
            assembler::apply_response_stage(&mut response, output);
        }

        assembler::finalize(&mut response);

        // Phase 5: loggers, spawned off the request's critical path.
        let mut loggers = stages_of(&stages, StageKind::Logger);
        loggers.retain(|s| cutoff.map_or(true, |depth| s.depth <= depth));
        loggers.sort_by_key(|s| (s.depth, s.sequence, s.name.clone()));
        if !loggers.is_empty() {
            self.spawn_loggers(
                loggers.into_iter().cloned().collect(),
                request.clone(),
                response.status,
                target.overlay.env().clone(),
                requested_path,
            );
        }

        Ok(response)
    }

    /// Execute one stage file, recording metrics and fault context.
    async fn run_stage(
        &self,
        stage: &StageFile,
        request: &Request,
        target: &ResolvedTarget,
        status: Option<u16>,
        requested_path: &str,
    ) -> Result<Response, EngineError> {
        let trailing = trailing_below(requested_path, stage.depth);
        let env = StageEnv {
            extra_env: target.overlay.env(),
            status,
            trailing: &trailing,
        };
        match self.invoker.invoke(&stage.path, request, env).await {
            Ok(output) => {
                metrics::record_stage(stage.kind.label(), "ok");
                Ok(output)
            }
            Err(e) => {
                tracing::error!(
                    kind = stage.kind.label(),
                    depth = stage.depth,
                    sequence = stage.sequence,
                    path = %stage.path.display(),
                    error = %e,
                    "Stage execution fault"
                );
                metrics::record_stage(stage.kind.label(), "fault");
                Err(e)
            }
        }
    }

    fn spawn_loggers(
        &self,
        loggers: Vec<StageFile>,
        request: Request,
        status: u16,
        extra_env: std::collections::HashMap<String, String>,
        requested_path: String,
    ) {
        let invoker = self.invoker.clone();
        tokio::spawn(async move {
            for stage in loggers {
                let trailing = trailing_below(&requested_path, stage.depth);
                let env = StageEnv {
                    extra_env: &extra_env,
                    status: Some(status),
                    trailing: &trailing,
                };
                if let Err(e) = invoker.invoke(&stage.path, &request, env).await {
                    tracing::debug!(
                        path = %stage.path.display(),
                        depth = stage.depth,
                        sequence = stage.sequence,
                        error = %e,
                        "Logger stage failed"
                    );
                    metrics::record_stage(stage.kind.label(), "fault");
                } else {
                    metrics::record_stage(stage.kind.label(), "ok");
                }
            }
        });
    }
}

/// The request a response transformer observes: response headers and body
/// under a GET, with the original URL and query intact.
fn response_view(request: &Request, response: &Response) -> Request {
    Request {
        verb: "GET".to_string(),
        url: request.url.clone(),
        headers: response.headers.clone(),
        query: request.query.clone(),
        body: response.body.clone(),
    }
}

/// The request path below a stage's directory, handed to the stage as
/// extra path info.
fn trailing_below(url_path: &str, depth: usize) -> String {
    url_path
        .split('/')
        .filter(|s| !s.is_empty())
        .skip(depth)
        .collect::<Vec<_>>()
        .join("/")
}

fn stages_of(stages: &[StageFile], kind: StageKind) -> Vec<&StageFile> {
    stages.iter().filter(|s| s.kind == kind).collect()
}
