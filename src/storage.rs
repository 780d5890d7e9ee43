use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use tracing::info;

use crate::config::ResearchConfig;
use crate::types::Report;

/// Default config location relative to the project root
pub const CONFIG_PATH: &str = "Config/research.yaml";

pub fn config_path(root: &str) -> PathBuf {
    PathBuf::from(root).join(CONFIG_PATH)
}

/// Load the research config; a missing file means built-in defaults
pub fn load_config(path: &Path) -> Result<ResearchConfig> {
    if !path.exists() {
        info!("No config at {:?}, using built-in defaults", path);
        return Ok(ResearchConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;

    let config: ResearchConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config YAML {:?}", path))?;

    Ok(config)
}

/// Write the report as CSV: header row, then one row per record.
/// Multi-line cells are quoted by the writer.
pub fn save_report_csv(path: &Path, report: &Report) -> Result<()> {
    create_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV at {:?}", path))?;

    writer.write_record(report.headers())
        .context("Failed to write CSV header")?;
    for record in &report.records {
        writer.write_record(report.row(record))
            .with_context(|| format!("Failed to write CSV row for {}", record.entity))?;
    }

    writer.flush()
        .with_context(|| format!("Failed to flush CSV to {:?}", path))?;
    Ok(())
}

/// Read a CSV report back as (headers, rows)
pub fn read_report_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV {:?}", path))?;

    let headers: Vec<String> = reader.headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in reader.records() {
        let row = row.context("Failed to read CSV row")?;
        rows.push(row.iter().map(str::to_string).collect());
    }

    Ok((headers, rows))
}

/// Full report, statuses included, as pretty JSON
pub fn save_report_json(path: &Path, report: &Report) -> Result<()> {
    create_parent_dir(path)?;
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report JSON to {:?}", path))?;
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategorySet, CategorySpec, CategoryValue, Entity, Record, ValueStatus};

    fn sample_report() -> Report {
        let categories = CategorySet::new(vec![
            CategorySpec::new("Prerequisites", &["requirement"], 0, 10),
            CategorySpec::new("Career Outcomes", &["career"], 0, 10),
        ])
        .unwrap();

        let mut report = Report::new("University", &categories);
        report.records.push(Record {
            entity: Entity::new("University of Oxford"),
            values: vec![
                CategoryValue {
                    category: "Prerequisites".to_string(),
                    text: "Requirement one, with a comma\nRequirement \"two\"".to_string(),
                    status: ValueStatus::Matched(2),
                },
                CategoryValue {
                    category: "Career Outcomes".to_string(),
                    text: "Not found".to_string(),
                    status: ValueStatus::NoMatch,
                },
            ],
        });
        report
    }

    #[test]
    fn test_csv_round_trip_keeps_multiline_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/universities_info.csv");
        let report = sample_report();

        save_report_csv(&path, &report).unwrap();
        let (headers, rows) = read_report_csv(&path).unwrap();

        assert_eq!(headers, vec!["University", "Prerequisites", "Career Outcomes"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "University of Oxford");
        assert_eq!(rows[0][1], "Requirement one, with a comma\nRequirement \"two\"");
        assert_eq!(rows[0][2], "Not found");
    }

    #[test]
    fn test_json_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        save_report_json(&path, &sample_report()).unwrap();

        let parsed: Report = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, sample_report());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&config_path(dir.path().to_str().unwrap())).unwrap();
        assert_eq!(config, ResearchConfig::default());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("research.yaml");
        fs::write(&path, "universities: 42\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
