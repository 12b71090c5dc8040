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

//! Shared domain types used across parsing, paging, and output.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured form of a raw search string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Payload of a content item. Text items carry their body inline, image
/// items carry the URL the image is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBody {
    Text { body: String },
    Image { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub body: ContentBody,
    pub tags: Vec<Tag>,
    pub category: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ContentItem {
    pub fn content_type(&self) -> ContentType {
        match self.body {
            ContentBody::Text { .. } => ContentType::Text,
            ContentBody::Image { .. } => ContentType::Image,
        }
    }

    /// Flat view of the payload: the text body or the image URL.
    pub fn content(&self) -> &str {
        match &self.body {
            ContentBody::Text { body } => body,
            ContentBody::Image { url } => url,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fmt = |t: &OffsetDateTime| {
            t.format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default()
        };
        serde_json::json!({
            "id": self.id,
            "type": self.content_type(),
            "title": self.title,
            "content": self.content(),
            "category": self.category,
            "tags": self.tags,
            "created_at": fmt(&self.created_at),
            "updated_at": fmt(&self.updated_at),
        })
    }
}
