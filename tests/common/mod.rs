// Copyright 2026 Content Hub Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use assert_cmd::Command;
use serde_json::Value;
use serde_json::json;

pub struct StubRequest {
    pub path: String,
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
}

pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: serde_json::to_vec(value).expect("encode json"),
        }
    }

    pub fn bytes(content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.to_vec(),
        }
    }
}

type Handler = dyn Fn(&StubRequest) -> StubResponse + Send + Sync;

/// Minimal HTTP/1.1 server on a background thread. One request per
/// connection; every request is recorded.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    pub fn start(handler: impl Fn(&StubRequest) -> StubResponse + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let handler: Arc<Handler> = Arc::new(handler);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                serve(stream, handler.as_ref(), &seen);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests").len()
    }

    pub fn param_log(&self, key: &str) -> Vec<Option<String>> {
        self.requests
            .lock()
            .expect("requests")
            .iter()
            .filter(|r| r.path == "/contents")
            .map(|r| r.params.get(key).cloned())
            .collect()
    }

    pub fn header_log(&self, key: &str) -> Vec<Option<String>> {
        self.requests
            .lock()
            .expect("requests")
            .iter()
            .map(|r| r.headers.get(&key.to_ascii_lowercase()).cloned())
            .collect()
    }
}

fn serve(stream: TcpStream, handler: &Handler, seen: &Mutex<Vec<StubRequest>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let request = StubRequest {
        path: path.to_string(),
        params: parse_query(query),
        headers,
    };
    let response = handler(&request);
    seen.lock().expect("requests").push(request);

    let mut stream = stream;
    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub fn record(id: i64, kind: &str, title: &str) -> Value {
    let (text_data, link) = if kind == "image" {
        (Value::Null, format!("https://cdn.example/{id}.png"))
    } else {
        (Value::from(format!("{title} body")), String::new())
    };
    json!({
        "id": id,
        "title": title,
        "type": kind,
        "text_data": text_data,
        "link": link,
        "tags": null,
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-01T10:00:00Z",
    })
}

/// Backend double: filters by `keywords` (substring of the title) and
/// `type`, then returns up to `num` records with an id above `cursor`.
pub fn fake_backend(records: Vec<Value>) -> StubServer {
    StubServer::start(move |req| {
        if req.path != "/contents" {
            return StubResponse::json(404, &json!({"error": "not found"}));
        }
        let num: usize = req
            .params
            .get("num")
            .and_then(|n| n.parse().ok())
            .unwrap_or(10);
        let cursor: i64 = req
            .params
            .get("cursor")
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let keywords = req.params.get("keywords").map(|k| k.to_lowercase());
        let kind = req.params.get("type");

        let page: Vec<Value> = records
            .iter()
            .filter(|r| r["id"].as_i64().unwrap_or(0) > cursor)
            .filter(|r| kind.is_none_or(|k| r["type"].as_str() == Some(k.as_str())))
            .filter(|r| {
                keywords.as_ref().is_none_or(|k| {
                    r["title"]
                        .as_str()
                        .unwrap_or("")
                        .to_lowercase()
                        .contains(k.as_str())
                })
            })
            .take(num)
            .cloned()
            .collect();
        StubResponse::json(200, &Value::Array(page))
    })
}

pub fn sample_records() -> Vec<Value> {
    vec![
        record(1, "text", "cat joke"),
        record(2, "image", "dog meme"),
        record(3, "image", "cat meme"),
        record(4, "text", "dog joke"),
        record(5, "image", "Dog face"),
    ]
}

pub fn contenthub_cmd(config_root: &Path, base_url: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("contenthub"));
    cmd.env("XDG_CONFIG_HOME", config_root);
    cmd.env("HOME", config_root);
    cmd.env("APPDATA", config_root);
    cmd.env("CONTENTHUB_API_URL", base_url);
    cmd.env_remove("CONTENTHUB_API_KEY");
    cmd.env_remove("CONTENTHUB_LOG");
    cmd
}

pub fn global_config_path(config_root: &Path) -> PathBuf {
    let base = if cfg!(target_os = "macos") {
        config_root.join("Library").join("Application Support")
    } else {
        config_root.to_path_buf()
    };
    base.join("contenthub").join("contenthub.toml")
}

pub fn history_path(config_root: &Path) -> PathBuf {
    global_config_path(config_root).with_file_name("history.json")
}

pub fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("parse json")
}

pub fn result_ids(value: &Value) -> Vec<String> {
    value
        .get("results")
        .and_then(|v| v.as_array())
        .expect("results array")
        .iter()
        .filter_map(|item| item.get("id"))
        .filter_map(|id| id.as_str())
        .map(str::to_string)
        .collect()
}
