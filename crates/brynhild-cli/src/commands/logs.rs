//! `brynhild logs list|view|validate` (spec.md §6).

use std::path::Path;

use brynhild_logger::LogReader;

use crate::app::App;

/// List every `.jsonl` log file under the logs directory.
pub fn list(app: &App) -> anyhow::Result<()> {
    if !app.logs_dir.is_dir() {
        println!("no logs");
        return Ok(());
    }
    let mut paths: Vec<_> = std::fs::read_dir(&app.logs_dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("jsonl"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        println!("no logs");
        return Ok(());
    }
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Print every event in `path` as `[n] event_type`.
pub fn view(path: &Path) -> anyhow::Result<()> {
    let reader = LogReader::open(path)?;
    for event in reader.events() {
        let json = serde_json::to_value(&event.payload)?;
        let event_type = json.get("event_type").and_then(|v| v.as_str()).unwrap_or("?");
        println!("[{}] {event_type} {json}", event.event_number);
    }
    Ok(())
}

/// Validate `path`'s internal consistency (monotonic event numbers,
/// content hashes matching their content, well-formed version sequence).
///
/// Exits with an error (code 1) if the log is invalid.
pub fn validate(path: &Path) -> anyhow::Result<()> {
    let reader = LogReader::open(path)?;
    let (ok, problems) = reader.validate();
    if ok {
        println!("valid: {}", path.display());
        return Ok(());
    }
    println!("invalid: {}", path.display());
    for problem in &problems {
        println!("  - {problem}");
    }
    anyhow::bail!("log failed validation with {} problem(s)", problems.len());
}
