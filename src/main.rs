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

mod cli;
mod config;
mod download;
mod history;
mod model;
mod output;
mod provider;
mod query;
mod session;

use std::io::BufRead;
use std::io::Write;
use std::time::Instant;

use anyhow::Context as _;
use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::ConfigAction;
use crate::cli::DownloadArgs;
use crate::cli::HistoryAction;
use crate::cli::HistoryArgs;
use crate::cli::SearchArgs;
use crate::config::Config;
use crate::config::ConfigCtx;
use crate::history::SearchHistory;
use crate::output::JsonResponse;
use crate::output::print_json;
use crate::provider::HttpProvider;
use crate::provider::SearchError;
use crate::session::SearchSession;

const LOG_ENV: &str = "CONTENTHUB_LOG";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Search(args) => {
            let json = args.json;
            handle_result(cmd_search(args), json)
        }
        Commands::Shell => cmd_shell(),
        Commands::History(args) => {
            let json = args.json;
            handle_result(cmd_history(args), json)
        }
        Commands::Download(args) => {
            let json = args.json;
            handle_result(cmd_download(args), json)
        }
        Commands::Config { action } => cmd_config(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "contenthub",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "contenthub=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_result(result: Result<()>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let code = if err.downcast_ref::<SearchError>().is_some() {
                    "search_failed"
                } else {
                    "error"
                };
                let resp = JsonResponse::error(code, &err.to_string());
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn load_history(ctx: &ConfigCtx) -> Result<SearchHistory> {
    match ctx.history_path() {
        Some(path) => history::load(&path, ctx.config.history_limit),
        None => Ok(SearchHistory::new(ctx.config.history_limit)),
    }
}

/// Apply `mutate` to the persisted history under its lock and return the
/// fresh result.
fn update_history<T>(
    ctx: &ConfigCtx,
    mutate: impl FnOnce(&mut SearchHistory) -> T,
) -> Result<(SearchHistory, T)> {
    match ctx.history_path() {
        Some(path) => history::update(&path, ctx.config.history_limit, mutate),
        None => {
            debug!("no config dir; history not persisted");
            let mut history = SearchHistory::new(ctx.config.history_limit);
            let out = mutate(&mut history);
            Ok((history, out))
        }
    }
}

fn record_search(ctx: &ConfigCtx, query: &str) -> Result<SearchHistory> {
    let (history, _) = update_history(ctx, |h| h.add_search(query))?;
    Ok(history)
}

fn cmd_search(args: SearchArgs) -> Result<()> {
    let ctx = ConfigCtx::load()?;
    let provider = HttpProvider::new(&ctx.config)?;
    // session-local; the file is updated under its lock afterwards
    let mut history = SearchHistory::new(ctx.config.history_limit);

    let query = args.query.join(" ");
    let page_size = args.page_size.unwrap_or(ctx.config.page_size);
    let mut session = SearchSession::new(page_size);
    let start = Instant::now();

    session.search(&provider, &mut history, &query)?;
    let mut pages = 1usize;
    let mut warnings = Vec::new();
    while session.has_more() && (args.all || pages < args.pages) {
        match session.load_more(&provider) {
            Ok(_) => pages += 1,
            Err(err) => {
                warnings.push(format!("load more failed: {err}"));
                break;
            }
        }
    }
    let took_ms = start.elapsed().as_millis() as i64;
    debug!(
        pages,
        returned = session.items().len(),
        has_more = session.has_more(),
        loading = session.is_loading(),
        took_ms,
        "search finished"
    );

    if !args.no_history && !history.entries().is_empty() {
        record_search(&ctx, &query)?;
    }

    if args.json {
        let resp = JsonResponse::ok()
            .with_query(&query, session.filter(), session.page_size())
            .with_session(&session, pages, took_ms)
            .with_warnings(warnings);
        print_json(&resp)?;
    } else {
        output::print_items(session.items());
        output::print_summary(&session);
        for warn in warnings {
            eprintln!("warning: {warn}");
        }
    }
    Ok(())
}

fn cmd_shell() -> Result<()> {
    let ctx = ConfigCtx::load()?;
    let provider = HttpProvider::new(&ctx.config)?;
    let mut history = load_history(&ctx)?;
    let mut session = SearchSession::new(ctx.config.page_size);

    println!("Type a query to search, :more, :reset, :history or :quit");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush().context("flush stdout")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("read stdin")?;
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" | ":q" => break,
            ":reset" => {
                session.reset();
                println!("Session cleared");
            }
            ":history" => {
                match load_history(&ctx) {
                    Ok(fresh) => history = fresh,
                    Err(err) => eprintln!("warning: {err}"),
                }
                for entry in history.entries() {
                    println!("{}  {}", entry.id, entry.query);
                }
            }
            ":more" => {
                let shown = session.items().len();
                match session.load_more(&provider) {
                    Ok(session::Applied::Skipped) => println!("No more results"),
                    Ok(_) => {
                        output::print_items(&session.items()[shown..]);
                        output::print_summary(&session);
                    }
                    Err(err) => eprintln!("error: {err}"),
                }
            }
            query => {
                match session.search(&provider, &mut history, query) {
                    Ok(_) => {
                        output::print_items(session.items());
                        output::print_summary(&session);
                        match record_search(&ctx, query) {
                            Ok(fresh) => history = fresh,
                            Err(err) => eprintln!("warning: {err}"),
                        }
                    }
                    Err(err) => eprintln!("error: {err}"),
                }
            }
        }
    }
    Ok(())
}

fn cmd_history(args: HistoryArgs) -> Result<()> {
    let ctx = ConfigCtx::load()?;
    let history = match args.action.unwrap_or(HistoryAction::List) {
        HistoryAction::List => load_history(&ctx)?,
        HistoryAction::Clear => update_history(&ctx, SearchHistory::clear)?.0,
        HistoryAction::Rm { id } => {
            let (history, removed) = update_history(&ctx, |h| h.remove(&id))?;
            if !removed {
                anyhow::bail!("no history entry with id {id}");
            }
            history
        }
    };

    if args.json {
        let entries = serde_json::to_value(history.entries())?;
        print_json(&JsonResponse::ok().with_history(entries))?;
    } else if history.entries().is_empty() {
        println!("No recent searches");
    } else {
        for entry in history.entries() {
            let when = entry
                .timestamp
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default();
            println!("{}  {}  {}", entry.id, when, entry.query);
        }
    }
    Ok(())
}

fn cmd_download(args: DownloadArgs) -> Result<()> {
    let ctx = ConfigCtx::load()?;
    let provider = HttpProvider::new(&ctx.config)?;
    let item = provider
        .find_by_id(&args.id, args.scan)?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "content {} not found in the first {} items",
                args.id,
                args.scan
            )
        })?;
    let saved = download::save_item(provider.media_client(), &item, &args.out)?;

    if args.json {
        print_json(&JsonResponse::ok().with_saved(serde_json::to_value(&saved)?))?;
    } else {
        println!("Saved {} to {}", saved.id, saved.path.display());
    }
    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config::global_config_path()
                .ok_or_else(|| anyhow::anyhow!("cannot locate a config directory"))?;
            if path.exists() {
                anyhow::bail!("config already exists at {}", path.display());
            }
            config::write_config(&path, &Config::default())?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Show { json } => {
            let ctx = ConfigCtx::load()?;
            let shown = ctx.config.masked();
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print!("{}", toml::to_string_pretty(&shown)?);
            }
        }
        ConfigAction::Path => {
            let path = config::global_config_path()
                .ok_or_else(|| anyhow::anyhow!("cannot locate a config directory"))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
