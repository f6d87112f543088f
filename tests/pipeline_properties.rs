//! End-to-end pipeline behavior against real fixture trees.
//!
//! These tests exercise the engine the way a listener would: build a web
//! root with stage scripts and content, hand a request to the engine,
//! inspect the response.

#![cfg(unix)]

mod common;

use common::{engine, engine_with, get, post, write_file, write_script};
use tempfile::TempDir;

#[tokio::test]
async fn serves_static_file_verbatim() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "a/b/report.txt", "quarterly numbers", 0o644);

    let response = engine(root.path()).handle(get("/a/b/report.txt")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"quarterly numbers");
}

#[tokio::test]
async fn missing_path_is_not_found() {
    let root = TempDir::new().unwrap();
    let response = engine(root.path()).handle(get("/no/such/page")).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn unreadable_target_is_not_found_regardless_of_stages() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "secret.txt", "hidden", 0o600);
    // A gatekeeper that would reject with 403; it must never run, because
    // resolution fails before any stage is considered.
    write_script(
        root.path(),
        ".gatekeeper#1",
        "printf 'status 403\\n' >&2\nprintf 'denied'",
    );

    let response = engine(root.path()).handle(get("/secret.txt")).await;
    assert_eq!(response.status, 404);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn content_script_controls_status_and_body() {
    let root = TempDir::new().unwrap();
    write_script(
        root.path(),
        "a/script",
        "printf 'status 201\\n' >&2\nprintf '{\"ok\":true}'",
    );

    let response = engine(root.path()).handle(get("/a/script")).await;
    assert_eq!(response.status, 201);
    assert_eq!(response.body, b"{\"ok\":true}");
}

#[tokio::test]
async fn failing_root_gatekeeper_rejects_every_request() {
    let root = TempDir::new().unwrap();
    write_script(
        root.path(),
        ".gatekeeper#1",
        "printf 'status 403\\n' >&2\nprintf 'denied'",
    );
    write_file(root.path(), "open.txt", "public", 0o644);
    write_script(root.path(), "sub/run", "touch content_ran\nprintf 'content'");

    let eng = engine(root.path());
    let first = eng.handle(get("/open.txt")).await;
    let second = eng.handle(get("/sub/run")).await;
    assert_eq!(first.status, 403);
    assert_eq!(second.status, 403);
    assert_eq!(first.body, b"denied");
    // the content phase never started
    assert!(!root.path().join("sub/content_ran").exists());
}

#[tokio::test]
async fn gatekeeper_cutoff_truncates_deeper_response_transformers() {
    let root = TempDir::new().unwrap();
    // depth 0: passthrough transformer tagging X-Outer
    write_script(
        root.path(),
        ".res_transformer#1",
        "printf 'header X-Outer yes\\n' >&2\nprintf 'status %s\\n' \"$STATUS\" >&2\ncat",
    );
    // depth 1: rejecting gatekeeper
    write_script(
        root.path(),
        "sub/.gatekeeper#1",
        "printf 'status 403\\n' >&2\nprintf 'denied'",
    );
    // depth 2: transformer that must be skipped
    write_script(
        root.path(),
        "sub/deep/.res_transformer#1",
        "printf 'header X-Inner yes\\n' >&2\nprintf 'status %s\\n' \"$STATUS\" >&2\ncat",
    );
    write_file(root.path(), "sub/deep/page.txt", "page", 0o644);

    let response = engine(root.path()).handle(get("/sub/deep/page.txt")).await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, b"denied");
    assert_eq!(response.headers.get("X-Outer").map(String::as_str), Some("yes"));
    assert!(!response.headers.contains_key("X-Inner"));
}

#[tokio::test]
async fn request_transformers_chain_in_sequence_order() {
    let root = TempDir::new().unwrap();
    write_script(root.path(), ".req_transformer#1", "cat >/dev/null\nprintf 'one'");
    write_script(root.path(), ".req_transformer#2", "printf '%s-two' \"$(cat)\"");
    write_script(root.path(), "echo", "cat");

    let response = engine(root.path()).handle(post("/echo", b"zero")).await;
    assert_eq!(response.status, 200);
    // transformer #2 saw #1's body, and content saw #2's
    assert_eq!(response.body, b"one-two");
}

#[tokio::test]
async fn response_transformers_run_depth_descending_so_shallow_wins() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "sub/page.txt", "base", 0o644);
    write_script(
        root.path(),
        ".res_transformer#1",
        "printf 'status 201\\n' >&2\nprintf '%s+root' \"$(cat)\"",
    );
    write_script(
        root.path(),
        "sub/.res_transformer#1",
        "printf 'status 202\\n' >&2\nprintf '%s+deep' \"$(cat)\"",
    );

    let response = engine(root.path()).handle(get("/sub/page.txt")).await;
    // depth 1 ran first, depth 0 ran last; the last write wins
    assert_eq!(response.body, b"base+deep+root");
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn config_overlay_merges_key_by_key_deepest_wins() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        ".cascade.toml",
        "[env]\nGREETING = \"shallow\"\nSITE = \"cascade\"\n",
        0o644,
    );
    write_file(root.path(), "a/b/.cascade.toml", "[env]\nGREETING = \"mid\"\n", 0o644);
    write_script(root.path(), "a/b/c/show", "printf '%s:%s' \"$GREETING\" \"$SITE\"");

    let response = engine(root.path()).handle(get("/a/b/c/show")).await;
    // GREETING overridden at depth 2; SITE inherited from the root layer
    assert_eq!(response.body, b"mid:cascade");
}

#[tokio::test]
async fn directory_target_uses_configured_index() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        ".cascade.toml",
        "[resolution]\nindex = \"main.txt\"\n",
        0o644,
    );
    write_file(root.path(), "main.txt", "custom index", 0o644);

    let response = engine(root.path()).handle(get("/")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"custom index");
}

#[tokio::test]
async fn mime_override_sets_content_type_for_static_files() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        ".cascade.toml",
        "[mime]\ngmi = \"text/gemini\"\n",
        0o644,
    );
    write_file(root.path(), "page.gmi", "# hello", 0o644);

    let response = engine(root.path()).handle(get("/page.gmi")).await;
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("text/gemini")
    );
}

#[tokio::test]
async fn environment_contract_reaches_the_content_process() {
    let root = TempDir::new().unwrap();
    write_script(
        root.path(),
        "show",
        "printf '%s|%s|%s|%s' \"$VERB\" \"$REQUESTED\" \"$QUERY_format\" \"$HEADER_Token\"",
    );

    let mut request = get("/show?format=txt");
    request.headers.insert("Token".to_string(), "abc123".to_string());
    let response = engine(root.path()).handle(request).await;
    assert_eq!(response.body, b"GET|/show|txt|abc123");
}

#[tokio::test]
async fn request_transformer_header_writes_merge_and_empty_removes() {
    let root = TempDir::new().unwrap();
    write_script(
        root.path(),
        ".req_transformer#1",
        "printf 'header Injected v1\\n' >&2\nprintf 'header Token \\n' >&2\ncat",
    );
    write_script(
        root.path(),
        "show",
        "printf '%s|%s' \"${HEADER_Injected:-none}\" \"${HEADER_Token:-gone}\"",
    );

    let mut request = get("/show");
    request.headers.insert("Token".to_string(), "secret".to_string());
    let response = engine(root.path()).handle(request).await;
    assert_eq!(response.body, b"v1|gone");
}

#[tokio::test]
async fn trailing_path_info_reaches_the_executable() {
    let root = TempDir::new().unwrap();
    write_script(root.path(), "app", "printf '%s' \"$1\"");

    let response = engine(root.path()).handle(get("/app/extra/info")).await;
    assert_eq!(response.body, b"extra/info");
}

#[tokio::test]
async fn mid_path_file_without_execute_bit_is_not_found() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "app", "not a script", 0o644);

    let response = engine(root.path()).handle(get("/app/extra")).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn stage_timeout_is_an_execution_fault() {
    let root = TempDir::new().unwrap();
    write_script(root.path(), "slow", "sleep 3\nprintf 'too late'");

    let eng = engine_with(root.path(), |c| c.timeouts.stage_secs = 1);
    let response = eng.handle(get("/slow")).await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body, b"internal server error");
}

#[tokio::test]
async fn unspawnable_content_is_an_execution_fault() {
    let root = TempDir::new().unwrap();
    // executable bit set, but not something the OS can exec
    write_file(root.path(), "garbled", [0u8, 159, 146, 150], 0o755);

    let response = engine(root.path()).handle(get("/garbled")).await;
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn loggers_observe_the_final_status_off_the_critical_path() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "page.txt", "hi", 0o644);
    write_script(root.path(), ".logger#1", "printf '%s' \"$STATUS\" > log_marker");
    // a broken logger must not affect the response either
    write_script(root.path(), ".logger#2", "exit 9");

    let response = engine(root.path()).handle(get("/page.txt")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"hi");

    // fire-and-forget: wait for the logger to land
    let marker = root.path().join("log_marker");
    for _ in 0..100 {
        if marker.exists() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "200");
}

#[tokio::test]
async fn identical_requests_yield_identical_responses() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), ".cascade.toml", "[env]\nTAG = \"r1\"\n", 0o644);
    write_script(root.path(), "page", "printf 'tag=%s' \"$TAG\"");

    let eng = engine(root.path());
    let first = eng.handle(get("/page")).await;
    let second = eng.handle(get("/page")).await;
    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body);
}
