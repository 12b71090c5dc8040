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

//! Search provider seam and the HTTP client for the `/contents` endpoint.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::config::Config;
use crate::model::ContentBody;
use crate::model::ContentItem;
use crate::model::ContentType;
use crate::model::Tag;

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No response was received (connect, DNS, TLS, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Mapping(String),
}

/// How the next-page cursor is derived from a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationStrategy {
    /// A page holding at least `num` items continues from its last id.
    #[default]
    FullPage,
    /// Only an explicit `next_cursor` in the response continues.
    Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub keywords: Option<String>,
    pub content_type: Option<ContentType>,
    pub num: usize,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("num", self.num.to_string())];
        if let Some(keywords) = &self.keywords {
            pairs.push(("keywords", keywords.clone()));
        }
        if let Some(content_type) = self.content_type {
            pairs.push(("type", content_type.as_str().to_string()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<ContentItem>,
    pub next_cursor: Option<String>,
}

pub trait SearchProvider {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SearchError>;
}

#[derive(Debug, Deserialize)]
struct ApiTag {
    id: Value,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    id: i64,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text_data: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    tags: Option<Vec<ApiTag>>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiPage {
    Bare(Vec<ApiContent>),
    Envelope {
        items: Vec<ApiContent>,
        #[serde(default)]
        next_cursor: Option<String>,
    },
}

/// Decode a `/contents` response body into a page of items.
pub fn decode_page(
    body: &[u8],
    requested: usize,
    strategy: PaginationStrategy,
) -> Result<Page, SearchError> {
    let raw: ApiPage =
        serde_json::from_slice(body).map_err(|err| SearchError::Mapping(err.to_string()))?;
    let (records, envelope_cursor) = match raw {
        ApiPage::Bare(items) => (items, None),
        ApiPage::Envelope { items, next_cursor } => (items, next_cursor),
    };
    let items = records
        .into_iter()
        .map(map_content)
        .collect::<Result<Vec<_>, _>>()?;

    let next_cursor = match strategy {
        PaginationStrategy::FullPage => {
            if requested > 0 && items.len() >= requested {
                items.last().map(|item| item.id.clone())
            } else {
                None
            }
        }
        PaginationStrategy::Cursor => envelope_cursor.filter(|c| !c.is_empty()),
    };
    Ok(Page { items, next_cursor })
}

fn map_content(raw: ApiContent) -> Result<ContentItem, SearchError> {
    let body = match raw.kind.as_str() {
        "image" => ContentBody::Image {
            url: raw.link.unwrap_or_default(),
        },
        "text" => ContentBody::Text {
            body: raw.text_data.unwrap_or_default(),
        },
        other => {
            return Err(SearchError::Mapping(format!(
                "content {} has unknown type {other:?}",
                raw.id
            )));
        }
    };
    let tags = raw
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(|tag| Tag {
            id: id_string(&tag.id),
            name: tag.name,
        })
        .collect();
    Ok(ContentItem {
        id: raw.id.to_string(),
        title: raw.title,
        body,
        tags,
        category: String::new(),
        created_at: parse_timestamp(raw.id, "created_at", &raw.created_at)?,
        updated_at: parse_timestamp(raw.id, "updated_at", &raw.updated_at)?,
    })
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_timestamp(id: i64, field: &str, text: &str) -> Result<OffsetDateTime, SearchError> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|err| SearchError::Mapping(format!("content {id} has bad {field} {text:?}: {err}")))
}

/// Blocking client for the Content Hub backend.
pub struct HttpProvider {
    client: reqwest::blocking::Client,
    media: reqwest::blocking::Client,
    base_url: String,
    strategy: PaginationStrategy,
}

impl HttpProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if config.base_url.trim().is_empty() {
            anyhow::bail!("no API base URL set; put base_url in the config or set CONTENTHUB_API_URL");
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if !config.api_key.is_empty() {
            headers.insert(
                API_KEY_HEADER,
                reqwest::header::HeaderValue::from_str(&config.api_key)?,
            );
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        // Media links point at arbitrary hosts; the API key stays with the backend.
        let media = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            media,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            strategy: config.pagination,
        })
    }

    /// Client for fetching image links. Sends no credentials.
    pub fn media_client(&self) -> &reqwest::blocking::Client {
        &self.media
    }

    /// Scan the first `scan` unfiltered results for an item id. The
    /// backend has no single-item endpoint.
    pub fn find_by_id(&self, id: &str, scan: usize) -> Result<Option<ContentItem>, SearchError> {
        let page = self.fetch_page(&PageRequest {
            keywords: None,
            content_type: None,
            num: scan,
            cursor: None,
        })?;
        Ok(page.items.into_iter().find(|item| item.id == id))
    }
}

impl SearchProvider for HttpProvider {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page, SearchError> {
        let url = format!("{}/contents", self.base_url);
        debug!(%url, query = ?request.query_pairs(), "fetching page");

        let resp = self
            .client
            .get(&url)
            .query(&request.query_pairs())
            .send()?;
        let status = resp.status();
        let body = resp.bytes()?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let page = decode_page(&body, request.num, self.strategy)?;
        debug!(
            returned = page.items.len(),
            next_cursor = ?page.next_cursor,
            "page decoded"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, kind: &str) -> Value {
        let text_data = if kind == "text" {
            Value::from(format!("body {id}"))
        } else {
            Value::Null
        };
        let link = if kind == "image" {
            format!("https://cdn.example/{id}.png")
        } else {
            String::new()
        };
        serde_json::json!({
            "id": id,
            "title": format!("item {id}"),
            "type": kind,
            "text_data": text_data,
            "link": link,
            "tags": null,
            "created_at": "2025-03-01T10:00:00Z",
            "updated_at": "2025-03-02T11:30:00.123456+07:00",
        })
    }

    fn body(records: Vec<Value>) -> Vec<u8> {
        serde_json::to_vec(&Value::Array(records)).unwrap()
    }

    #[test]
    fn maps_text_and_image_records() {
        let page = decode_page(
            &body(vec![record(7, "text"), record(8, "image")]),
            10,
            PaginationStrategy::FullPage,
        )
        .unwrap();
        assert_eq!(page.items.len(), 2);

        let text = &page.items[0];
        assert_eq!(text.id, "7");
        assert_eq!(text.content_type(), ContentType::Text);
        assert_eq!(text.content(), "body 7");
        assert!(text.tags.is_empty());
        assert_eq!(text.category, "");

        let image = &page.items[1];
        assert_eq!(
            image.body,
            ContentBody::Image {
                url: "https://cdn.example/8.png".to_string()
            }
        );
        assert_eq!(image.updated_at.offset().whole_hours(), 7);
    }

    #[test]
    fn null_text_becomes_empty_body() {
        let mut rec = record(1, "text");
        rec["text_data"] = Value::Null;
        let page = decode_page(&body(vec![rec]), 10, PaginationStrategy::FullPage).unwrap();
        assert_eq!(page.items[0].content(), "");
    }

    #[test]
    fn tag_ids_are_stringified() {
        let mut rec = record(1, "image");
        rec["tags"] = serde_json::json!([{"id": 3, "name": "cat"}, {"id": "x9", "name": "dog"}]);
        let page = decode_page(&body(vec![rec]), 10, PaginationStrategy::FullPage).unwrap();
        let tags = &page.items[0].tags;
        assert_eq!(tags[0].id, "3");
        assert_eq!(tags[0].name, "cat");
        assert_eq!(tags[1].id, "x9");
    }

    #[test]
    fn full_page_continues_from_last_id() {
        let records = vec![record(1, "text"), record(2, "text")];
        let page = decode_page(&body(records.clone()), 2, PaginationStrategy::FullPage).unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("2"));

        let page = decode_page(&body(records), 3, PaginationStrategy::FullPage).unwrap();
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn cursor_strategy_uses_envelope_only() {
        let envelope = serde_json::json!({
            "items": [record(1, "text")],
            "next_cursor": "abc",
        });
        let raw = serde_json::to_vec(&envelope).unwrap();
        let page = decode_page(&raw, 1, PaginationStrategy::Cursor).unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));

        let page = decode_page(&raw, 1, PaginationStrategy::FullPage).unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("1"));

        let page = decode_page(&body(vec![record(1, "text")]), 1, PaginationStrategy::Cursor)
            .unwrap();
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn unknown_type_is_a_mapping_error() {
        let err = decode_page(
            &body(vec![record(5, "video")]),
            10,
            PaginationStrategy::FullPage,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::Mapping(_)));
        assert!(err.to_string().contains("video"));
    }

    #[test]
    fn bad_timestamp_is_a_mapping_error() {
        let mut rec = record(5, "text");
        rec["created_at"] = Value::from("yesterday");
        let err = decode_page(&body(vec![rec]), 10, PaginationStrategy::FullPage).unwrap_err();
        assert!(err.to_string().contains("created_at"));
    }

    #[test]
    fn query_pairs_omit_unset_fields() {
        let req = PageRequest {
            keywords: None,
            content_type: Some(ContentType::Image),
            num: 10,
            cursor: None,
        };
        assert_eq!(
            req.query_pairs(),
            vec![("num", "10".to_string()), ("type", "image".to_string())]
        );
    }
}
