#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use base64::{engine::general_purpose, Engine as _};

pub const SENTENCE: &str = "brown fox jumps over the lazy dog";
pub const SENTENCE_IDS: [u32; 7] = [2, 3, 4, 5, 6, 7, 8];
pub const CLS: u32 = 101;
pub const SEP: u32 = 102;

/// Word level `tokenizer.json` with BERT style `[CLS] ... [SEP]` wrapping,
/// whitespace splitting and no decoder, so decode joins tokens with spaces.
pub fn word_level_json() -> String {
    let added = |id: u32, content: &str| {
        format!(
            r#"{{"id":{},"content":"{}","single_word":false,"lstrip":false,"rstrip":false,"normalized":false,"special":true}}"#,
            id, content
        )
    };
    format!(
        r#"{{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [{}, {}, {}, {}, {}],
  "normalizer": null,
  "pre_tokenizer": {{"type": "WhitespaceSplit"}},
  "post_processor": {{"type": "BertProcessing", "sep": ["[SEP]", 102], "cls": ["[CLS]", 101]}},
  "decoder": null,
  "model": {{
    "type": "WordLevel",
    "vocab": {{
      "[PAD]": 0, "[UNK]": 1,
      "brown": 2, "fox": 3, "jumps": 4, "over": 5, "the": 6, "lazy": 7, "dog": 8,
      "hello": 9, "world": 10,
      "[CLS]": 101, "[SEP]": 102
    }},
    "unk_token": "[UNK]"
  }}
}}"#,
        added(0, "[PAD]"),
        added(1, "[UNK]"),
        added(101, "[CLS]"),
        added(102, "[SEP]"),
        added(103, "<eot>"),
    )
}

/// Unique entries across the model vocabulary and the added tokens
pub const WORD_LEVEL_VOCAB_SIZE: u32 = 14;

pub fn write_word_level(dir: &Path) -> PathBuf {
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, word_level_json()).unwrap();
    path
}

/// Tiktoken fixture: `a..z` are ranks 0-25, space 26, `hi` 27, the two
/// halves of `é` 28 and 29, special `<|eot|>` 30.
pub const TIKTOKEN_PATTERN: &str = r"[a-z]+| ?[a-z]+|\s+";
pub const EOT: u32 = 30;

pub fn write_tiktoken(dir: &Path) -> (PathBuf, PathBuf) {
    let mut tokens: Vec<Vec<u8>> = (b'a'..=b'z').map(|b| vec![b]).collect();
    tokens.push(b" ".to_vec());
    tokens.push(b"hi".to_vec());
    tokens.push(vec![0xC3]);
    tokens.push(vec![0xA9]);
    let ranks: String = tokens
        .iter()
        .enumerate()
        .map(|(rank, token)| format!("{} {}\n", general_purpose::STANDARD.encode(token), rank))
        .collect();
    write_tiktoken_files(dir, &ranks, &[(EOT, "<|eot|>")])
}

pub fn write_tiktoken_files(dir: &Path, ranks: &str, specials: &[(u32, &str)]) -> (PathBuf, PathBuf) {
    let model = dir.join("tokenizer.model");
    std::fs::write(&model, ranks).unwrap();

    let decoder: serde_json::Map<String, serde_json::Value> = specials
        .iter()
        .map(|(id, content)| {
            (
                id.to_string(),
                serde_json::json!({
                    "content": content,
                    "lstrip": false,
                    "normalized": false,
                    "rstrip": false,
                    "single_word": false,
                    "special": true
                }),
            )
        })
        .collect();
    let config = dir.join("tokenizer_config.json");
    std::fs::write(
        &config,
        serde_json::json!({ "added_tokens_decoder": decoder, "model_max_length": 128 }).to_string(),
    )
    .unwrap();
    (model, config)
}

/// In-process file server answering `/{model}/resolve/{revision}/{file}`.
#[derive(Default)]
pub struct FileServer {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
    paths: Mutex<Vec<String>>,
    auth_headers: Mutex<Vec<Option<String>>>,
    hits: AtomicUsize,
}

impl FileServer {
    pub fn serve_file(&self, name: &str, body: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(name.to_string(), body.into());
    }

    /// Answer requests for `name` with a 500 until `recover` is called
    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn recover(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Requested file names, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Decoded request paths, in arrival order
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
        self.paths.lock().unwrap().clear();
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.auth_headers.lock().unwrap().clone()
    }
}

async fn serve(
    State(server): State<Arc<FileServer>>,
    UrlPath(path): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    server.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    server.auth_headers.lock().unwrap().push(auth);
    server.paths.lock().unwrap().push(path.clone());

    let name = path.rsplit('/').next().unwrap_or_default().to_string();
    server.requests.lock().unwrap().push(name.clone());

    if !path.contains("/resolve/") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if server.failing.lock().unwrap().contains(&name) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "unavailable").into_response();
    }
    match server.files.lock().unwrap().get(&name) {
        Some(body) => body.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Starts a file server on an ephemeral port and returns its base URL.
pub async fn start_server(server: Arc<FileServer>) -> String {
    let app = Router::new().route("/{*path}", get(serve)).with_state(server);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
