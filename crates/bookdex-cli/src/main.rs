mod commands;
mod logging;
mod progress;

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::process;

use bookdex_core::fmt::human_bytes;
use bookdex_core::{AppConfig, Library};
use chrono::{Local, TimeZone};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match bookdex_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::List) => {
            if let Err(err) = run_list(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Summary) => {
            if let Err(err) = run_summary(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Reload) => {
            if let Err(err) = run_reload(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Sync(sync_args)) => {
            if let Err(err) = run_sync(&config, sync_args.check) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Cleanup(cleanup_args)) => {
            if let Err(err) = run_cleanup(&config, cleanup_args.check_hash) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::FindTitle(find_args)) => {
            if let Err(err) = run_find_title(&config, &find_args.title) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::FindHash(find_args)) => {
            if let Err(err) = run_find_hash(&config, &find_args.hash) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::DumpTitles(dump_args)) => {
            if let Err(err) = run_dump_titles(&config, &dump_args.file) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        Some(Commands::ResetDb) => {
            match prompt_confirm(
                "Are you SURE you want to COMPLETELY DELETE both indexes?",
                Some(false),
            ) {
                Ok(true) => {
                    if let Err(err) = run_reset(&config) {
                        error!("Error: {}", err);
                    }
                }
                _ => {
                    process::exit(0);
                }
            }
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_list(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    let reporter = CliReporter::new();
    let rows = library.list(&reporter)?;

    for row in &rows {
        let when = Local
            .timestamp_opt(row.mtime, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<8} {:<24} {:>10}  {}  {}",
            row.file_type,
            row.directory,
            human_bytes(row.size.max(0) as u64, true, 1),
            when,
            row.title,
        );
    }
    info!("{} documents", rows.len());
    Ok(())
}

fn run_summary(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    let reporter = CliReporter::new();
    let summary = library.summarize(&reporter)?;

    print_counts("Detailed", &summary.by_directory, summary.total);
    print_counts("Summary", &summary.by_root, summary.total);
    Ok(())
}

fn print_counts(
    caption: &str,
    counts: &std::collections::BTreeMap<String, u64>,
    total: u64,
) {
    println!();
    println!("{}:", caption);
    for (name, count) in counts {
        let percent = if total == 0 {
            0.0
        } else {
            *count as f64 / total as f64 * 100.0
        };
        println!("  {:<24} {:>6} {:>6.2}%", name, count, percent);
    }
    println!("  {:<24} {:>6}", "Total", total);
}

fn run_reload(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    let reporter = CliReporter::new();
    let rows = library.reload(&reporter)?;
    info!("{} rows", format!("{}", rows).green());
    Ok(())
}

fn run_sync(config: &AppConfig, check_hash: bool) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    let reporter = CliReporter::new();

    let stats = library.rescan(&reporter)?;
    println!();
    info!(
        "{} scanned, {} inserted, {} updated, {} backfilled, {} hash failures",
        stats.scanned,
        format!("{}", stats.inserted).green(),
        format!("{}", stats.updated).green(),
        format!("{}", stats.backfilled).cyan(),
        format!("{}", stats.hash_failures).red(),
    );

    let cleanup = library.cleanup(check_hash, &reporter)?;
    info!(
        "{} examined, {} removed, {} mismatched, {} read failures",
        cleanup.examined,
        format!("{}", cleanup.removed).red(),
        format!("{}", cleanup.mismatched).red(),
        format!("{}", cleanup.read_failures).red(),
    );

    println!("{} documents", library.count()?);
    Ok(())
}

fn run_cleanup(config: &AppConfig, check_hash: bool) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    let reporter = CliReporter::new();
    let stats = library.cleanup(check_hash, &reporter)?;
    info!(
        "{} examined, {} removed, {} verified, {} mismatched",
        stats.examined,
        format!("{}", stats.removed).red(),
        stats.verified,
        format!("{}", stats.mismatched).red(),
    );
    println!("{} documents", library.count()?);
    Ok(())
}

fn run_find_title(config: &AppConfig, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    let documents = library.find_by_title(title)?;
    for doc in &documents {
        print_document(doc);
    }
    info!("{} matching documents", documents.len());
    Ok(())
}

fn run_find_hash(config: &AppConfig, hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    let hash = u64::from_str_radix(hash.trim_start_matches("0x"), 16)?;
    let library = Library::open(config.clone())?;
    let documents = library.find_by_hash(hash)?;
    for doc in &documents {
        print_document(doc);
    }
    info!("{} matching documents", documents.len());
    Ok(())
}

fn print_document(doc: &bookdex_core::sync::Document) {
    println!(
        "{:<8} {:<24} {:>10}  {}  {}",
        doc.file_type,
        doc.directory,
        human_bytes(doc.size, true, 1),
        doc.hash
            .map(|h| format!("{:016x}", h))
            .unwrap_or_else(|| "-".repeat(16)),
        doc.title,
    );
}

fn run_dump_titles(config: &AppConfig, file: &str) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::open(config.clone())?;
    info!("Dumping titles to {}", file);
    let mut out = fs::File::create(file)?;
    let count = library.dump_titles(&mut out)?;
    println!("Dumped {} titles", count);
    Ok(())
}

fn run_reset(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let summary_db = config.summary_db_path();
    if let Err(err) = fs::remove_file(&summary_db) {
        if err.kind() != ErrorKind::NotFound {
            return Err(err.into());
        }
    }
    let sync_store = config.sync_store_path();
    if let Err(err) = fs::remove_dir_all(&sync_store) {
        if err.kind() != ErrorKind::NotFound {
            return Err(err.into());
        }
    }
    println!("Indexes deleted");
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
