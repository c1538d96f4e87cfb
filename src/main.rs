//! CLI entry point for dimmer.

mod cli;

use std::path::Path;

use clap::Parser;
use serde::Serialize;
use tracing::info;

use dimmer::classifier::PageContext;
use dimmer::config::{load_config, Config};
use dimmer::coordinator::{
    Coordinator, HostAction, JsonFileStore, MemoryStore, Mode, Outcome, RecordingHost,
    ReplayScript, StateStore,
};
use dimmer::dom::{Document, NodeId};
use dimmer::error::AppError;
use dimmer::logging::init_logging;
use dimmer::recolor::{paint, render_stylesheet, RuleTable};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> Result<(), AppError> {
    let mut config = load_config(args.config.as_deref())?.config;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config.logging).map_err(|e| AppError::Logging(e.to_string()))?;

    match args.command {
        cli::Command::Stylesheet { output } => {
            let css = render_stylesheet(&RuleTable::with_palette(config.recolor));
            write_output(output.as_deref(), &css)
        }
        cli::Command::Classify { snapshot } => {
            let doc = Document::load(&snapshot)?;
            let mut page = PageContext::<NodeId>::new(config.classifier.thresholds());
            let message = page.report(&doc);
            info!(page_is_dark = message.page_is_dark, snapshot = %snapshot.display(), "classified");
            println!("{}", to_json(&message)?);
            Ok(())
        }
        cli::Command::Paint { snapshot, output } => {
            let mut doc = Document::load(&snapshot)?;
            let report = paint(&mut doc, &RuleTable::with_palette(config.recolor));
            info!(
                visited = report.visited,
                styled = report.styled,
                preserved_text = report.preserved_text,
                preserved_background = report.preserved_background,
                "painted snapshot"
            );
            match output {
                Some(path) => Ok(doc.save(&path)?),
                None => {
                    println!("{}", to_json(&doc.to_file())?);
                    Ok(())
                }
            }
        }
        cli::Command::Replay { events, state } => {
            let script = ReplayScript::load(&events)?;
            let report = match state {
                Some(path) => replay(JsonFileStore::new(path), &script, &config).await?,
                None => replay(MemoryStore::new(), &script, &config).await?,
            };
            println!("{}", to_json(&report)?);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ReplayReport {
    outcomes: Vec<Outcome>,
    host_actions: Vec<HostAction>,
    mode: Option<Mode>,
}

async fn replay<S: StateStore>(
    store: S,
    script: &ReplayScript,
    config: &Config,
) -> Result<ReplayReport, AppError> {
    let host = RecordingHost::new();
    host.set_active_url(script.active_url.clone());
    let coordinator = Coordinator::new(store, host, config.coordinator.clone());
    let outcomes = coordinator.replay(&script.events).await;
    let mode = coordinator
        .store()
        .get_mode()
        .await?
        .as_deref()
        .and_then(Mode::parse);
    let abandoned = outcomes.iter().filter(|o| !o.is_complete()).count();
    info!(events = outcomes.len(), abandoned, "replay finished");
    Ok(ReplayReport {
        outcomes,
        host_actions: coordinator.host().actions(),
        mode,
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Snapshot(dimmer::error::SnapshotError::Json(e)))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), AppError> {
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(path = %path.display(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}
