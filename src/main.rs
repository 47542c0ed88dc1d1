//! Binary entry point. Resolve configuration, start logging, open the
//! inventory once, and hand it to whichever front end was requested.
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::error;

use book_inventory::config::{Cli, Command, Config, ExportArgs};
use book_inventory::{export, logging, run_app, App, Inventory};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;
    logging::init(&config.log_file, &config.log_level)?;

    let result = run(cli.command.unwrap_or(Command::Tui), &config);
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "command failed");
    }
    result
}

fn run(command: Command, config: &Config) -> Result<()> {
    let inventory = Inventory::open(&config.inventory_file).with_context(|| {
        format!(
            "failed to load inventory from {}",
            config.inventory_file.display()
        )
    })?;

    match command {
        Command::Tui => {
            let mut app = App::new(inventory, config.export_dir.clone());
            run_app(&mut app)
        }
        Command::List => {
            for line in list_lines(&inventory) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Export(args) => export_inventory(&inventory, &args, config),
    }
}

fn list_lines(inventory: &Inventory) -> Vec<String> {
    if inventory.is_empty() {
        return vec!["No books in the inventory.".to_string()];
    }
    inventory.list().iter().map(ToString::to_string).collect()
}

/// Exports never replace the inventory file itself.
fn export_target(inventory: &Inventory, args: &ExportArgs, config: &Config) -> Result<PathBuf> {
    let target = args
        .output
        .clone()
        .unwrap_or_else(|| config.export_path(args.format));
    ensure!(
        target != inventory.path(),
        "refusing to export over the inventory file {}",
        target.display()
    );
    Ok(target)
}

fn export_inventory(inventory: &Inventory, args: &ExportArgs, config: &Config) -> Result<()> {
    let target = export_target(inventory, args, config)?;
    let path = export::export(inventory.list(), args.format, &target)?;
    println!(
        "Exported {} books as {} to {}",
        inventory.len(),
        args.format,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_inventory::export::ExportFormat;
    use book_inventory::Book;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            inventory_file: dir.path().join("inventario_libros.csv"),
            export_dir: dir.path().join("exports"),
            log_file: dir.path().join("book-inventory.log"),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn list_reports_empty_inventory() {
        let dir = TempDir::new().unwrap();
        let inventory = Inventory::open(dir.path().join("books.csv")).unwrap();
        assert_eq!(list_lines(&inventory), vec!["No books in the inventory."]);
    }

    #[test]
    fn list_prints_one_line_per_book() {
        let dir = TempDir::new().unwrap();
        let mut inventory = Inventory::open(dir.path().join("books.csv")).unwrap();
        inventory
            .add(Book::create("Dune", "Herbert", "1965", "SciFi", "111").unwrap())
            .unwrap();
        assert_eq!(list_lines(&inventory), vec!["Dune, Herbert, 1965, SciFi, 111"]);
    }

    #[test]
    fn export_refuses_the_inventory_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let inventory = Inventory::open(&config.inventory_file).unwrap();

        let args = ExportArgs {
            format: ExportFormat::Csv,
            output: Some(config.inventory_file.clone()),
        };
        assert!(export_target(&inventory, &args, &config).is_err());

        let args = ExportArgs {
            format: ExportFormat::Csv,
            output: None,
        };
        assert_eq!(
            export_target(&inventory, &args, &config).unwrap(),
            dir.path().join("exports").join("inventario_libros.csv")
        );
    }
}
