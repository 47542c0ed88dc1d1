//! Command-line surface and resolved runtime settings. Every flag has an
//! environment fallback so the TUI can be launched from a desktop shortcut
//! without arguments.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use directories::BaseDirs;

use crate::export::ExportFormat;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-inventory";
/// Inventory file name stored inside the data directory.
const INVENTORY_FILE_NAME: &str = "inventario_libros.csv";
/// Diagnostics file written next to the inventory.
const LOG_FILE_NAME: &str = "book-inventory.log";
/// Default export folder beneath the data directory. Kept apart from the
/// inventory because the CSV export shares its file name.
const EXPORT_DIR_NAME: &str = "exports";

/// Manage a small book catalog stored in a CSV file.
#[derive(Debug, Parser)]
#[command(name = "book-inventory", version, long_about = None)]
pub struct Cli {
    /// Inventory CSV file.
    #[arg(long, env = "BOOK_INVENTORY_FILE")]
    pub file: Option<PathBuf>,

    /// Directory that receives exported files.
    #[arg(long, env = "BOOK_INVENTORY_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Log filter, e.g. `info` or `book_inventory=debug`.
    #[arg(long, env = "BOOK_INVENTORY_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive terminal UI (default).
    Tui,
    /// Print every book in the inventory.
    List,
    /// Write the inventory to a CSV or Excel file.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output format.
    #[arg(long, value_enum, default_value = "csv")]
    pub format: ExportFormat,

    /// Destination file. Defaults to `inventario_libros.<ext>` in the export
    /// directory.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Settings after defaults have been filled in.
#[derive(Debug, Clone)]
pub struct Config {
    pub inventory_file: PathBuf,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Cli {
    /// Resolve defaults against the user's home directory.
    pub fn config(&self) -> Result<Config> {
        let data_dir = data_dir()?;
        Ok(self.config_in(data_dir))
    }

    fn config_in(&self, data_dir: PathBuf) -> Config {
        Config {
            inventory_file: self
                .file
                .clone()
                .unwrap_or_else(|| data_dir.join(INVENTORY_FILE_NAME)),
            export_dir: self
                .export_dir
                .clone()
                .unwrap_or_else(|| data_dir.join(EXPORT_DIR_NAME)),
            log_file: data_dir.join(LOG_FILE_NAME),
            log_level: self.log_level.clone(),
        }
    }
}

impl Config {
    /// Where an export in `format` lands unless the caller names a file.
    pub fn export_path(&self, format: ExportFormat) -> PathBuf {
        self.export_dir.join(format.file_name())
    }
}

/// Resolve the absolute path to the application data directory.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_in_data_dir() {
        let cli = Cli::parse_from(["book-inventory"]);
        let config = cli.config_in(PathBuf::from("/home/reader/.book-inventory"));
        assert!(cli.command.is_none());
        assert_eq!(
            config.inventory_file,
            PathBuf::from("/home/reader/.book-inventory/inventario_libros.csv")
        );
        assert_eq!(
            config.export_path(ExportFormat::Xlsx),
            PathBuf::from("/home/reader/.book-inventory/exports/inventario_libros.xlsx")
        );
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn default_csv_export_does_not_overwrite_inventory() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Cli::parse_from(["book-inventory"]).config_in(dir.path().to_path_buf());
        assert_ne!(config.export_path(ExportFormat::Csv), config.inventory_file);

        let mut inventory = crate::Inventory::open(&config.inventory_file).unwrap();
        inventory
            .add(crate::Book::create("Dune", "Herbert", "1965", "SciFi", "111").unwrap())
            .unwrap();
        crate::export::export(&[], ExportFormat::Csv, &config.export_path(ExportFormat::Csv))
            .unwrap();

        let reloaded = crate::Inventory::open(&config.inventory_file).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "book-inventory",
            "--file",
            "/tmp/books.csv",
            "--export-dir",
            "/tmp/out",
            "--log-level",
            "debug",
            "export",
            "--format",
            "xlsx",
        ]);
        let config = cli.config_in(PathBuf::from("/data"));
        assert_eq!(config.inventory_file, PathBuf::from("/tmp/books.csv"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_file, PathBuf::from("/data/book-inventory.log"));
        assert_eq!(config.log_level, "debug");
        match cli.command {
            Some(Command::Export(args)) => {
                assert_eq!(args.format, ExportFormat::Xlsx);
                assert!(args.output.is_none());
            }
            other => panic!("expected export command, got {other:?}"),
        }
    }
}
