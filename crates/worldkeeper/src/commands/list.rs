//! List command

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use tabled::{settings::Style, Table, Tabled};
use worldkeeper_backup::{backup_root, list_units, BackupUnit};

use crate::cli::DataDirArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub data: DataDirArgs,
}

/// Backup row for list output
#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "Backup ID")]
    id: String,
    #[tabled(rename = "Created (UTC)")]
    created: String,
    #[tabled(rename = "Directory")]
    directory: String,
    #[tabled(rename = "Archive")]
    archive: String,
}

impl From<&BackupUnit> for BackupRow {
    fn from(unit: &BackupUnit) -> Self {
        let archive = unit
            .archive
            .as_ref()
            .map(|path| match fs::metadata(path) {
                Ok(meta) => output::format_bytes(meta.len()),
                Err(_) => "?".to_string(),
            })
            .unwrap_or_else(|| "-".to_string());

        Self {
            id: unit.id.to_string(),
            created: unit.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
            directory: if unit.directory.is_some() { "yes" } else { "-" }.to_string(),
            archive,
        }
    }
}

pub fn run(args: ListArgs) -> Result<()> {
    let root = backup_root(&args.data.data_dir);
    let units = list_units(&root)
        .with_context(|| format!("Failed to list backups in {}", root.display()))?;

    if units.is_empty() {
        output::info(&format!("No backups found in {}", root.display()));
        return Ok(());
    }

    output::header(&format!("Backups in {}", root.display()));
    let rows: Vec<BackupRow> = units.iter().map(BackupRow::from).collect();
    let table = Table::new(&rows).with(Style::sharp()).to_string();
    println!("{}", table);
    println!();
    output::info(&format!("{} backups", units.len()));

    Ok(())
}
