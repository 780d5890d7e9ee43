//! Config Validation Binary
//!
//! Validates Config/research.yaml before a run:
//! - Checks every category set (names, keywords, caps)
//! - Checks search templates and URL tables
//! - Reports configuration issues before any page is fetched

use anyhow::{Result, Context};
use search_admissions::config::Severity;
use search_admissions::storage;
use std::path::PathBuf;

fn main() -> Result<()> {
    let root = std::env::var("ROOT").unwrap_or_else(|_| ".".to_string());
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| storage::config_path(&root));

    println!("=== Research Config Validator ===");
    println!("Config: {}", path.display());

    if !path.exists() {
        println!("No config file; the built-in defaults will be used");
    }

    let config = storage::load_config(&path)
        .context("Failed to load research config")?;

    let issues = config.validate();
    let errors: Vec<_> = issues.iter().filter(|i| i.severity == Severity::Error).collect();
    let warnings: Vec<_> = issues.iter().filter(|i| i.severity == Severity::Warning).collect();

    if issues.is_empty() {
        println!(
            "✓ Config is valid: {} universities, {} categories, {} courses",
            config.universities.len(),
            config.categories.len(),
            config.courses.len()
        );
        return Ok(());
    }

    if !errors.is_empty() {
        println!("\n❌ ERRORS (must fix):");
        for error in &errors {
            println!("  - {}", error.message);
        }
    }

    if !warnings.is_empty() {
        println!("\n⚠️  WARNINGS:");
        for warning in &warnings {
            println!("  - {}", warning.message);
        }
    }

    if !errors.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
