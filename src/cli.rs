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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "contenthub",
    version,
    about = "Search the Content Hub meme collection",
    after_help = "Query syntax: free text, plus @image/@i or @text/@t to restrict the type.\nExample: contenthub search funny cat @i"
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search content
    Search(SearchArgs),

    /// Interactive search over one session
    Shell,

    /// Show or edit recent searches
    History(HistoryArgs),

    /// Save a content item to disk
    Download(DownloadArgs),

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text (words are joined with spaces)
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Load pages until the results are exhausted
    #[arg(long, conflicts_with = "pages")]
    pub all: bool,

    /// Items per page (defaults to the configured page size)
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub page_size: Option<usize>,

    /// Do not record the query in history
    #[arg(long)]
    pub no_history: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub action: Option<HistoryAction>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List recent searches
    List,
    /// Remove all recent searches
    Clear,
    /// Remove one recent search
    Rm {
        /// Entry id
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Content id
    pub id: String,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// How many recent items to scan for the id
    #[arg(long, default_value_t = 100)]
    pub scan: usize,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default config file
    Init,
    /// Print the effective config
    Show {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file path
    Path,
}
