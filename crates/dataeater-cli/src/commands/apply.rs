//! Apply command - run a script of mutations and export the result.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use colored::Colorize;
use dataeater::{DataEaterConfig, DataStore, HistoryKind};
use serde::Deserialize;

use super::{open_store, print_last_error};

/// One step of a mutation script.
#[derive(Debug, Deserialize)]
pub struct ScriptStep {
    pub sql: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: HistoryKind,
}

fn default_kind() -> HistoryKind {
    HistoryKind::Transform
}

/// Read a JSON array of steps.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>, Box<dyn std::error::Error>> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open script '{}': {}", path.display(), e))?;
    let steps: Vec<ScriptStep> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Failed to parse script '{}': {}", path.display(), e))?;
    Ok(steps)
}

pub fn run(
    file: PathBuf,
    script: PathBuf,
    history: Option<PathBuf>,
    transactional: bool,
    export: Option<PathBuf>,
    config: DataEaterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let steps = load_script(&script)?;
    let mut store = open_store(&file, config)?;

    if steps.is_empty() {
        println!("{} Script has no steps.", "Warning:".yellow().bold());
    } else {
        println!(
            "{} {} steps{}",
            "Applying".cyan().bold(),
            steps.len().to_string().white().bold(),
            if transactional { " in one transaction" } else { "" }
        );
        let outcome = if transactional {
            apply_transactional(&mut store, &steps, &script)
        } else {
            apply_steps(&mut store, &steps)
        };
        if let Err(e) = outcome {
            print_last_error(&store);
            return Err(e);
        }
    }

    if let Some(path) = &export {
        export_json(&mut store, path)?;
        println!("  Exported to {}", path.display().to_string().cyan());
    }

    if let Some(path) = &history {
        let source = store.source().map(|s| s.metadata.file.clone());
        store.history().save(path, source.as_deref())?;
        println!("  History saved to {}", path.display().to_string().cyan());
    }

    println!();
    println!(
        "{} {} rows, {} columns",
        "Result:".green().bold(),
        store.row_count().to_string().white().bold(),
        store.columns().len().to_string().white().bold()
    );
    for column in store.columns() {
        println!("  {}  {}", column.name.white(), column.column_type.to_string().cyan());
    }

    Ok(())
}

fn apply_steps(
    store: &mut DataStore,
    steps: &[ScriptStep],
) -> Result<(), Box<dyn std::error::Error>> {
    for (i, step) in steps.iter().enumerate() {
        store.execute_mutation_as(step.kind, &step.sql, step.description.as_deref())?;
        println!(
            "  {} {}",
            format!("[{}]", i + 1).dimmed(),
            step.description.as_deref().unwrap_or(&step.sql)
        );
    }
    Ok(())
}

fn apply_transactional(
    store: &mut DataStore,
    steps: &[ScriptStep],
    script: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let statements: Vec<&str> = steps.iter().map(|s| s.sql.as_str()).collect();
    let kind = match steps {
        [only] => only.kind,
        _ => HistoryKind::Transform,
    };
    let description = match steps {
        [only] => only
            .description
            .clone()
            .unwrap_or_else(|| format!("Applied {}", script.display())),
        _ => format!("Applied {} ({} steps)", script.display(), steps.len()),
    };
    store.execute_transaction(&statements, kind, Some(&description))?;
    println!("  {}", description);
    Ok(())
}

/// Write every row as a JSON array of objects and record the export.
fn export_json(store: &mut DataStore, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rows = store.fetch_all()?;
    let file = File::create(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &rows)?;

    store.record_event(
        HistoryKind::Export,
        format!("Exported {} rows to {}", rows.len(), path.display()),
    );
    store.mark_saved();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_script_defaults() {
        let script = create_test_file(
            ".json",
            r#"[
                {"sql": "UPDATE current_dataset SET a = a + 1"},
                {"sql": "DELETE FROM current_dataset WHERE a > 2", "description": "Trim", "kind": "DELETE"}
            ]"#,
        );
        let steps = load_script(script.path()).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].kind, HistoryKind::Transform);
        assert!(steps[0].description.is_none());
        assert_eq!(steps[1].kind, HistoryKind::Delete);
    }

    #[test]
    fn test_transactional_script_is_all_or_nothing() {
        let data = create_test_file(".csv", "a\n1\n2\n");
        let mut store = DataStore::new();
        store.load_file(data.path()).unwrap();

        let steps = vec![
            ScriptStep {
                sql: "DELETE FROM current_dataset WHERE a = 1".to_string(),
                description: None,
                kind: HistoryKind::Delete,
            },
            ScriptStep {
                sql: "UPDATE current_dataset SET nope = 1".to_string(),
                description: None,
                kind: HistoryKind::Transform,
            },
        ];
        assert!(apply_transactional(&mut store, &steps, Path::new("fix.json")).is_err());
        assert_eq!(store.row_count(), 2);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_export_records_history() {
        let data = create_test_file(".csv", "a,b\n1,x\n");
        let out = NamedTempFile::with_suffix(".json").unwrap();
        let mut store = DataStore::new();
        store.load_file(data.path()).unwrap();
        store
            .execute_mutation("UPDATE current_dataset SET b = upper(b)", Some("Upper"))
            .unwrap();

        export_json(&mut store, out.path()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!([{"a": 1, "b": "X"}]));
        assert_eq!(store.history().last().unwrap().kind, HistoryKind::Export);
        assert!(!store.has_unsaved_changes());
    }
}
