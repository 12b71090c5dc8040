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

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::model::ContentItem;
use crate::model::SearchFilter;
use crate::session::SearchSession;

#[derive(Debug, Clone, Serialize, Default)]
pub struct StatsOut {
    pub took_ms: i64,
    pub returned: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOut {
    pub text: String,
    pub filter: SearchFilter,
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorOut {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct JsonResponse {
    pub ok: bool,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOut>,
}

impl JsonResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            schema_version: "1".to_string(),
            ..Default::default()
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            schema_version: "1".to_string(),
            error: Some(ErrorOut {
                code: code.to_string(),
                message: message.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, text: &str, filter: &SearchFilter, page_size: usize) -> Self {
        self.query = Some(QueryOut {
            text: text.to_string(),
            filter: filter.clone(),
            page_size: page_size as i64,
        });
        self
    }

    /// Results, pagination state and stats of a session.
    pub fn with_session(mut self, session: &SearchSession, pages: usize, took_ms: i64) -> Self {
        self.results = Some(session.items().iter().map(ContentItem::to_json).collect());
        self.has_more = Some(session.has_more());
        self.next_cursor = session.cursor().map(str::to_string);
        self.stats = Some(StatsOut {
            took_ms,
            returned: session.items().len() as i64,
            total: session.total() as i64,
            pages: pages as i64,
        });
        self
    }

    pub fn with_history(mut self, history: Value) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_saved(mut self, saved: Value) -> Self {
        self.saved = Some(saved);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

pub fn print_json(resp: &JsonResponse) -> Result<()> {
    let text = serde_json::to_string_pretty(resp)?;
    println!("{text}");
    Ok(())
}

const PREVIEW_CHARS: usize = 72;

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
    format!("{cut}...")
}

pub fn print_items(items: &[ContentItem]) {
    for item in items {
        println!("[{}] ({}) {}", item.id, item.content_type(), item.title);
        println!("    {}", preview(item.content()));
        if !item.tags.is_empty() {
            let tags: Vec<String> = item.tags.iter().map(|t| format!("#{}", t.name)).collect();
            println!("    {}", tags.join(" "));
        }
    }
}

pub fn print_summary(session: &SearchSession) {
    let count = session.items().len();
    if count == 0 {
        println!("No results");
        return;
    }
    if session.has_more() {
        println!("{count} results (more available)");
    } else {
        println!("{count} results");
    }
}
