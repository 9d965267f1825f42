//! Operation log observation command
//!
//! Replays the tail of `.warden/operations.jsonl` and then follows it,
//! similar to `tail -f`.

use colored::*;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::oplog::{OpRecord, OPLOG_DOC};
use crate::state::STATE_DIR;

pub fn run(filter: Option<&str>, last: usize, include_payload: bool, follow: bool, _config: &Config) -> Result<()> {
    let log_file = oplog_path();

    println!("{} Observing operations in {}", "👁".blue(), log_file.display());
    if let Some(f) = filter {
        println!("  Filter: {}", f.cyan());
    }
    println!();

    if last > 0 {
        show_recent(&log_file, last, filter, include_payload)?;
    }

    if follow {
        println!("{}", "--- Live tail (Ctrl+C to stop) ---".dimmed());
        println!();
        tail(&log_file, filter, include_payload)?;
    }

    Ok(())
}

fn oplog_path() -> PathBuf {
    Config::project_root(None).join(STATE_DIR).join(OPLOG_DOC)
}

/// Show the last N records
fn show_recent(log_file: &Path, count: usize, filter: Option<&str>, include_payload: bool) -> Result<()> {
    if !log_file.exists() {
        println!("{}", "(no operations logged yet)".dimmed());
        return Ok(());
    }

    let content = std::fs::read_to_string(log_file).context("Failed to read operation log")?;
    let records: Vec<OpRecord> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .filter(|r| matches_filter(r, filter))
        .collect();

    let start = records.len().saturating_sub(count);
    for record in &records[start..] {
        print_record(record, include_payload);
    }

    Ok(())
}

/// Follow the log file as records are appended
fn tail(log_file: &Path, filter: Option<&str>, include_payload: bool) -> Result<()> {
    // Wait for the file to exist, then seek to its end
    let file = loop {
        match File::open(log_file) {
            Ok(file) => break file,
            Err(_) => thread::sleep(Duration::from_secs(1)),
        }
    };

    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::End(0))?;

    let mut line = String::new();
    loop {
        match reader.read_line(&mut line) {
            Ok(0) => {
                thread::sleep(Duration::from_millis(100));
            }
            Ok(_) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    if let Ok(record) = serde_json::from_str::<OpRecord>(trimmed) {
                        if matches_filter(&record, filter) {
                            print_record(&record, include_payload);
                        }
                    }
                }
                line.clear();
            }
            Err(e) => {
                log::warn!("Error reading operation log: {}", e);
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}

fn matches_filter(record: &OpRecord, filter: Option<&str>) -> bool {
    match filter {
        Some(f) => {
            let f = f.to_lowercase();
            record.event_type.to_lowercase().contains(&f) || record.decision.to_lowercase().contains(&f)
        }
        None => true,
    }
}

fn print_record(record: &OpRecord, include_payload: bool) {
    println!("{}", record.format_display());

    if include_payload {
        if let Some(ref payload) = record.payload {
            let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
            for line in pretty.lines() {
                println!("  {}", line.dimmed());
            }
        }
    }
}
