//! A stand-in for the remote collection: serves scripted JSON pages over
//! real HTTP on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use valsearch::db;
use valsearch::index::{RecordIndex, SqliteIndex};
use valsearch::ingest::IngestOptions;

#[derive(Default)]
struct Script {
    pages: Vec<Vec<Value>>,
    failures: HashMap<usize, u32>,
    hits: Vec<usize>,
}

#[derive(Clone)]
pub struct FakeRemote {
    addr: SocketAddr,
    script: Arc<Mutex<Script>>,
    handle: Arc<JoinHandle<()>>,
}

pub fn record(id: &str, username: &str, name: &str, code: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "author": { "username": username },
        "code": code,
        "privacy": "public"
    })
}

impl FakeRemote {
    pub async fn start() -> Self {
        let script = Arc::new(Mutex::new(Script::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/v1/page/{n}", get(serve_page))
            .with_state((script.clone(), addr));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            script,
            handle: Arc::new(handle),
        }
    }

    /// Replaces the whole collection with `pages`.
    pub fn set_pages(&self, pages: Vec<Vec<Value>>) {
        self.script.lock().unwrap().pages = pages;
    }

    /// Makes page `n` answer HTTP 500 for its next `times` requests.
    pub fn fail_page(&self, n: usize, times: u32) {
        self.script.lock().unwrap().failures.insert(n, times);
    }

    /// Page numbers requested so far, in order (failed requests included).
    pub fn hits(&self) -> Vec<usize> {
        self.script.lock().unwrap().hits.clone()
    }

    pub fn start_url(&self) -> String {
        format!("http://{}/v1/page/0", self.addr)
    }

    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            start_url: self.start_url(),
            retry_delay: std::time::Duration::ZERO,
            max_page_attempts: None,
            prune_missing: false,
        }
    }
}

impl Drop for FakeRemote {
    fn drop(&mut self) {
        if Arc::strong_count(&self.handle) == 1 {
            self.handle.abort();
        }
    }
}

async fn serve_page(
    State((script, addr)): State<(Arc<Mutex<Script>>, SocketAddr)>,
    Path(n): Path<usize>,
) -> Response {
    let mut script = script.lock().unwrap();
    script.hits.push(n);

    if let Some(left) = script.failures.get_mut(&n) {
        if *left > 0 {
            *left -= 1;
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream hiccup").into_response();
        }
    }

    let data = script.pages.get(n).cloned().unwrap_or_default();
    let next = if n + 1 < script.pages.len() {
        Value::String(format!("http://{}/v1/page/{}", addr, n + 1))
    } else {
        Value::Null
    };

    Json(json!({
        "data": data,
        "links": { "self": format!("http://{}/v1/page/{}", addr, n), "next": next }
    }))
    .into_response()
}

pub async fn temp_index(tmp: &TempDir) -> SqliteIndex {
    let pool = db::connect_path(&tmp.path().join("valsearch.db"))
        .await
        .unwrap();
    let index = SqliteIndex::new(pool);
    index.ensure_schema().await.unwrap();
    index
}
