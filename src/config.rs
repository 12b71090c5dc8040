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

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::provider::PaginationStrategy;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const ENV_API_URL: &str = "CONTENTHUB_API_URL";
pub const ENV_API_KEY: &str = "CONTENTHUB_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub history_limit: usize,
    pub pagination: PaginationStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 15,
            history_limit: DEFAULT_HISTORY_LIMIT,
            pagination: PaginationStrategy::FullPage,
        }
    }
}

impl Config {
    /// Copy with the API key hidden, for display.
    pub fn masked(&self) -> Self {
        let mut out = self.clone();
        if !out.api_key.is_empty() {
            out.api_key = "********".to_string();
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct ConfigCtx {
    pub path: Option<PathBuf>,
    pub config: Config,
}

impl ConfigCtx {
    pub fn load() -> Result<Self> {
        let path = global_config_path();
        let mut config = match &path {
            Some(p) if p.exists() => read_config(p)?,
            _ => Config::default(),
        };
        apply_env(&mut config);
        Ok(Self { path, config })
    }

    /// History lives next to the config file.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|dir| dir.join("history.json"))
    }
}

fn config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Some(PathBuf::from(appdata));
        }
        if let Ok(profile) = std::env::var("USERPROFILE") {
            return Some(PathBuf::from(profile).join("AppData").join("Roaming"));
        }
        return None;
    }

    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").ok()?;
        return Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support"),
        );
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config"))
}

pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("contenthub").join("contenthub.toml"))
}

fn apply_env(config: &mut Config) {
    if let Ok(url) = std::env::var(ENV_API_URL)
        && !url.trim().is_empty()
    {
        config.base_url = url.trim().to_string();
    }
    if let Ok(key) = std::env::var(ENV_API_KEY) {
        config.api_key = key;
    }
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut config: Config = toml::from_str(&text).context("parse contenthub.toml")?;
    if config.page_size == 0 {
        config.page_size = DEFAULT_PAGE_SIZE;
    }
    if config.history_limit == 0 {
        config.history_limit = DEFAULT_HISTORY_LIMIT;
    }
    Ok(config)
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(config).context("encode config")?;
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
