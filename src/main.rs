//! CacheArena - phone specification cache
//!
//! Command-line front-end: every command is sent through the cache service
//! queue, the same way the extension's pages message the background worker.

use cachearena::config::{source_for_url, DEFAULT_MEDIA_TYPE, DEFAULT_SOURCE, EXTRACT_SOURCE};
use cachearena::io::{read_records_csv, read_records_json};
use cachearena::{
    extract_phone_page, key_for, Background, CacheError, CacheService, DirectoryDownloads,
    Downloads, ExportMode, JsonFileStorage, Request, Response, ServiceHandle, Settings,
    UpdateMeta,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Phone spec cache - merge scraped records and export them as CSV
#[derive(Parser, Debug)]
#[command(name = "cachearena")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the cache and settings files
    #[arg(short, long, default_value_t = default_data_dir())]
    data_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a saved spec page and merge it into the cache
    Ingest {
        /// Saved HTML of the spec page
        html: PathBuf,
        /// URL the page was loaded from
        #[arg(long)]
        url: String,
    },
    /// Merge a JSON array or map of records into the cache
    Update {
        json: PathBuf,
        #[arg(long, default_value = DEFAULT_SOURCE)]
        source: String,
        #[arg(long, default_value = DEFAULT_MEDIA_TYPE)]
        media_type: String,
    },
    /// Re-ingest a previously exported CSV
    Import {
        csv: PathBuf,
        #[arg(long, default_value = "import:csv")]
        source: String,
        #[arg(long, default_value = DEFAULT_MEDIA_TYPE)]
        media_type: String,
    },
    /// Summarise the cache
    Show {
        /// Dump the whole aggregate as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Find a record by brand and model
    Lookup { brand: String, model: String },
    /// Export the cache as CSV
    Export {
        /// Directory to save into (default: the user's download directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Print the CSV instead of saving a file
        #[arg(long, default_value_t = false)]
        inline: bool,
    },
    /// Delete the cache
    Clear,
    /// Show or change which media types are collected
    Settings {
        #[arg(long)]
        enable: Vec<String>,
        #[arg(long)]
        disable: Vec<String>,
    },
}

/// Returns the default data directory: ~/.local/share/cachearena
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cachearena")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=cachearena=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::debug!("Data directory: {}", args.data_dir);

    if let Err(e) = run(args).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> cachearena::Result<()> {
    let storage = Arc::new(JsonFileStorage::open(&args.data_dir)?);
    log::info!("Using cache files in {}", storage.dir().display());

    let directory = match &args.command {
        Command::Export {
            inline: false,
            out_dir,
        } => Some(match out_dir {
            Some(dir) => DirectoryDownloads::new(dir),
            None => DirectoryDownloads::user_default(),
        }),
        _ => None,
    };
    let export_dir = directory.as_ref().map(|d| d.dir().to_path_buf());
    let downloads = directory.map(|d| Box::new(d) as Box<dyn Downloads>);

    let background = Background::new(storage, downloads);
    background.on_installed()?;

    let service = CacheService::spawn(background);
    let result = execute(&service.handle(), args.command, export_dir).await;
    service.shutdown().await?;
    result
}

async fn execute(
    handle: &ServiceHandle,
    command: Command,
    export_dir: Option<PathBuf>,
) -> cachearena::Result<()> {
    match command {
        Command::Ingest { html, url } => {
            let content = std::fs::read_to_string(&html)?;
            let media_type = match source_for_url(&url) {
                Some(source) => source.media_type,
                None => {
                    log::warn!("{} is not a known source, assuming {}", url, DEFAULT_MEDIA_TYPE);
                    DEFAULT_MEDIA_TYPE
                }
            };
            let record = extract_phone_page(&content, &url).ok_or_else(|| {
                CacheError::Extract(format!("no phone data in {}", html.display()))
            })?;
            let meta = UpdateMeta::new(EXTRACT_SOURCE, media_type);
            let response = handle
                .request(Request::update(Value::Array(vec![Value::Object(record)]), meta))
                .await?;
            report_update(&response);
        }
        Command::Update {
            json,
            source,
            media_type,
        } => {
            let records = read_records_json(&json)?;
            let response = handle
                .request(Request::update(records, UpdateMeta::new(source, media_type)))
                .await?;
            report_update(&response);
        }
        Command::Import {
            csv,
            source,
            media_type,
        } => {
            let records = read_records_csv(&csv)?
                .into_iter()
                .map(Value::Object)
                .collect();
            let response = handle
                .request(Request::update(
                    Value::Array(records),
                    UpdateMeta::new(source, media_type),
                ))
                .await?;
            report_update(&response);
        }
        Command::Show { json } => {
            let response = handle.request(Request::CacheRequest).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }
            match response {
                Response::Cache(Some(cache)) => {
                    println!(
                        "{} entries, last sync {} from {}",
                        cache.entries.len(),
                        format_sync(Some(cache.last_sync)),
                        cache.source
                    );
                    for entry in &cache.entries {
                        println!("  {} {} [{}]", entry.media_type, entry.model, entry.slug);
                    }
                }
                _ => println!("Cache is empty"),
            }
        }
        Command::Lookup { brand, model } => {
            let key = key_for(&brand, &model);
            match handle.request(Request::CacheRequest).await? {
                Response::Cache(Some(cache)) => match cache.index.get(&key) {
                    Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
                    None => println!("No record for {}", key),
                },
                _ => println!("Cache is empty"),
            }
        }
        Command::Export { .. } => {
            if let Response::Export(result) = handle.request(Request::CacheExport).await? {
                match result.mode {
                    Some(ExportMode::Inline) => {
                        println!("{}", result.csv.unwrap_or_default());
                    }
                    Some(ExportMode::Downloads) => {
                        let filename = result.filename.unwrap_or_default();
                        let path = match &export_dir {
                            Some(dir) => dir.join(&filename),
                            None => PathBuf::from(&filename),
                        };
                        println!(
                            "Exported {} entries to {} (last sync {})",
                            result.count,
                            path.display(),
                            format_sync(result.last_sync)
                        );
                    }
                    None => println!("Nothing to export"),
                }
            }
        }
        Command::Clear => {
            handle.request(Request::CacheClear).await?;
            println!("Cache cleared");
        }
        Command::Settings { enable, disable } => {
            let response = if enable.is_empty() && disable.is_empty() {
                handle.request(Request::SettingsGet).await?
            } else {
                let mut partial = Settings::default();
                partial
                    .sources
                    .extend(enable.into_iter().map(|m| (m, true)));
                partial
                    .sources
                    .extend(disable.into_iter().map(|m| (m, false)));
                handle
                    .request(Request::SettingsSet { settings: partial })
                    .await?
            };
            if let Response::Settings(settings) = response {
                for (media_type, enabled) in &settings.sources {
                    println!("{}: {}", media_type, if *enabled { "enabled" } else { "disabled" });
                }
            }
        }
    }
    Ok(())
}

fn report_update(response: &Response) {
    if let Response::Update(result) = response {
        if result.is_skipped() {
            println!("Skipped: media type is disabled");
        } else {
            println!("Merged {} records", result.count.unwrap_or(0));
        }
    }
}

fn format_sync(last_sync: Option<i64>) -> String {
    last_sync
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "never".to_string())
}
