//! OnlyWorlds command-line editor.
//!
//! Reads and edits world elements through the online API or the local
//! store, saving edits with the same debounced autosave the editor uses.
//!
//! Usage:
//!   owt --mode local import world.json
//!   owt edit character <id> --set name=Alice --set tags="hero, exile"

use std::{path::PathBuf, sync::Arc, time::Duration};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use owt_autosave::{
    AutosavePreference, AutosaveSession, FieldSource, MemoryFieldSource, SaveStatus, coerce,
};
use owt_backend::{
    ApiConfig, ElementBackend, LocalBackend, Mode, ModeRouter, RemoteBackend, import_world,
};
use owt_model::{Element, ElementSchema};
use owt_storage::{KeyValueStore, SqliteKvStore};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "owt")]
#[command(about = "OnlyWorlds element editor with autosave")]
struct Args {
    /// SQLite file holding the local store and preferences
    #[arg(long, default_value = "owt.db")]
    db: PathBuf,

    /// Backend for this run (online or local); defaults to the saved mode
    #[arg(long)]
    mode: Option<Mode>,

    /// World API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// World API key
    #[arg(long, default_value = "")]
    api_key: String,

    /// World PIN
    #[arg(long, default_value = "")]
    api_pin: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON world export
    Import { file: PathBuf },
    /// List elements of a type
    List { element_type: String },
    /// Print one element as JSON
    Show { element_type: String, id: String },
    /// Edit fields and let autosave persist them
    Edit {
        element_type: String,
        id: String,
        /// `field=value` assignments, applied in order
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        assignments: Vec<(String, String)>,
    },
    /// Show or change the autosave preference
    Autosave { action: Toggle },
    /// Show or change the saved backend mode
    Mode { mode: Option<Mode> },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
    Status,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got {s:?}"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in {s:?}"));
    }
    Ok((field.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteKvStore::open(&args.db)
            .with_context(|| format!("Failed to open {}", args.db.display()))?,
    );

    match &args.command {
        Command::Autosave { action } => autosave(store, *action),
        Command::Mode { mode } => {
            let router = build_router(&args, store, true)?;
            match mode {
                Some(mode) => router.set_mode(*mode).context("Failed to save mode")?,
                None => println!("{}", router.mode()),
            }
            Ok(())
        }
        Command::Import { file } => {
            let router = build_router(&args, store, false)?;
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let world: serde_json::Value =
                serde_json::from_str(&raw).context("Import file is not valid JSON")?;
            let summary = import_world(router.as_ref(), &world).await?;
            for (element_type, count) in &summary.created {
                println!("{element_type}: {count}");
            }
            for failure in &summary.failures {
                warn!(
                    "Failed to import {} {}: {}",
                    failure.element_type,
                    failure.id.as_deref().unwrap_or("<new>"),
                    failure.reason
                );
            }
            info!(
                "Imported {} elements into {}",
                summary.total_created(),
                router.backend_name()
            );
            Ok(())
        }
        Command::List { element_type } => {
            let router = build_router(&args, store, false)?;
            for element in router.list_elements(element_type).await? {
                println!("{}\t{}", element.id, element.name().unwrap_or(""));
            }
            Ok(())
        }
        Command::Show { element_type, id } => {
            let router = build_router(&args, store, false)?;
            let element = router.get_element(element_type, id).await?;
            println!("{}", serde_json::to_string_pretty(&element.to_json())?);
            Ok(())
        }
        Command::Edit {
            element_type,
            id,
            assignments,
        } => {
            let router = build_router(&args, store.clone(), false)?;
            let element = router.get_element(element_type, id).await?;
            edit(router, store, element, assignments).await
        }
    }
}

/// Builds the mode router. `--mode` applies to this run only, unless
/// `persist` is set.
fn build_router(
    args: &Args,
    store: Arc<dyn KeyValueStore>,
    persist: bool,
) -> Result<Arc<ModeRouter>> {
    let mut config = ApiConfig {
        api_key: args.api_key.clone(),
        api_pin: args.api_pin.clone(),
        ..ApiConfig::default()
    };
    if let Some(url) = &args.api_url {
        config.base_url = url.clone();
    }
    let remote = RemoteBackend::new(config)?;
    let has_credentials = remote.has_credentials();
    let local = Arc::new(LocalBackend::new(store.clone()));

    let router = match args.mode {
        Some(mode) if !persist => {
            let router = ModeRouter::new(Arc::new(remote), local);
            router.set_mode(mode)?;
            router
        }
        _ => ModeRouter::with_persistence(Arc::new(remote), local, store),
    };
    if router.mode() == Mode::Online && !has_credentials {
        warn!("No API key/PIN set; online requests will be rejected");
    }
    Ok(Arc::new(router))
}

fn autosave(store: Arc<dyn KeyValueStore>, action: Toggle) -> Result<()> {
    let preference = AutosavePreference::load(store);
    match action {
        Toggle::On => preference.set(true)?,
        Toggle::Off => preference.set(false)?,
        Toggle::Status => {}
    }
    println!("{}", if preference.is_enabled() { "on" } else { "off" });
    Ok(())
}

/// Applies `assignments` through an autosave session and waits for the
/// save to settle. With autosave off each field is saved explicitly.
async fn edit(
    router: Arc<ModeRouter>,
    store: Arc<dyn KeyValueStore>,
    element: Element,
    assignments: &[(String, String)],
) -> Result<()> {
    let schema = ElementSchema::base(&element.element_type);
    let source = Arc::new(MemoryFieldSource::from_element(&element, Some(&schema)));
    let session = AutosaveSession::builder(router, source.clone())
        .preference(AutosavePreference::load(store))
        .build();
    session.begin_session(element);

    for (field, value) in assignments {
        if !source.set_text(field, value.as_str()) {
            bail!("Element has no field {field:?}");
        }
        if session.is_enabled() {
            session.on_field_changed(field);
        } else {
            let Some(input) = source.read(field) else {
                continue;
            };
            session.save_field(field, coerce(input.kind, &input.raw)).await;
        }
    }

    while session.has_pending_save()
        || session.is_saving()
        || (!session.dirty_fields().is_empty() && session.status() != SaveStatus::Error)
    {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    println!("{}", session.status());
    if session.status() == SaveStatus::Error {
        bail!(session.last_error().unwrap_or_default());
    }
    if let Some(element) = session.element() {
        println!("{}", serde_json::to_string_pretty(&element.to_json())?);
    }
    session.end_session();
    Ok(())
}
