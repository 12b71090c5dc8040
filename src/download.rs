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

//! Saving a single content item to disk.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::model::ContentBody;
use crate::model::ContentItem;

#[derive(Debug, Clone, Serialize)]
pub struct SavedItem {
    pub id: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// File stem for an item: whitespace runs become `-`, lowercased.
pub fn file_stem(item: &ContentItem) -> String {
    let slug = item
        .title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .replace(['/', '\\'], "-");
    let slug = slug.trim_matches('.').to_string();
    if slug.is_empty() {
        item.id.clone()
    } else {
        slug
    }
}

/// Extension from the last path segment of an image URL, `bin` if none.
pub fn image_extension(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}

pub fn save_item(
    client: &reqwest::blocking::Client,
    item: &ContentItem,
    out_dir: &Path,
) -> Result<SavedItem> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("create dir {}", out_dir.display()))?;
    let stem = file_stem(item);

    let (path, bytes) = match &item.body {
        ContentBody::Text { body } => {
            if body.is_empty() {
                anyhow::bail!("content {} has no text", item.id);
            }
            let path = out_dir.join(format!("{stem}.txt"));
            std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
            (path, body.len() as u64)
        }
        ContentBody::Image { url } => {
            if url.is_empty() {
                anyhow::bail!("content {} has no image link", item.id);
            }
            debug!(%url, "fetching image");
            let resp = client
                .get(url)
                .send()
                .with_context(|| format!("fetch {url}"))?;
            let status = resp.status();
            if !status.is_success() {
                anyhow::bail!("fetch {url}: server returned {status}");
            }
            let data = resp.bytes().with_context(|| format!("read {url}"))?;
            let path = out_dir.join(format!("{stem}.{}", image_extension(url)));
            std::fs::write(&path, &data).with_context(|| format!("write {}", path.display()))?;
            (path, data.len() as u64)
        }
    };

    Ok(SavedItem {
        id: item.id.clone(),
        path,
        bytes,
    })
}
