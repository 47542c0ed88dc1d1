//! Read-only renderings of the catalog for sharing outside the app. Nothing
//! here touches the inventory file; callers pass in `Inventory::list()`.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::inventory::{write_table, COLUMNS};
use crate::models::Book;

/// Worksheet name used in spreadsheet exports.
const SHEET_NAME: &str = "Inventario";
/// Base name shared by every export file.
const EXPORT_STEM: &str = "inventario_libros";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// Default file name for this format, e.g. `inventario_libros.xlsx`.
    pub fn file_name(self) -> String {
        format!("{EXPORT_STEM}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Xlsx => write!(f, "Excel"),
        }
    }
}

/// Write `books` to `path` in the requested format and return the path.
pub fn export(books: &[Book], format: ExportFormat, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("failed to create export directory")?;
    }
    match format {
        ExportFormat::Csv => write_csv(books, path)?,
        ExportFormat::Xlsx => write_xlsx(books, path)?,
    }
    info!(path = %path.display(), %format, books = books.len(), "inventory exported");
    Ok(path.to_path_buf())
}

/// Same layout as the inventory file itself.
pub fn write_csv(books: &[Book], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_table(file, books).context("failed to write CSV export")
}

/// One worksheet with a bold header row. Years are written as numbers so
/// spreadsheet sorting and filtering behave.
pub fn write_xlsx(books: &[Book], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("failed to name worksheet")?;

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *name, &header)
            .context("failed to write header row")?;
    }

    for (index, book) in books.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet
            .write_string(row, 0, &book.title)
            .and_then(|ws| ws.write_string(row, 1, &book.author))
            .and_then(|ws| ws.write_number(row, 2, book.year))
            .and_then(|ws| ws.write_string(row, 3, &book.genre))
            .and_then(|ws| ws.write_string(row, 4, &book.isbn))
            .with_context(|| format!("failed to write row for ISBN {}", book.isbn))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn books() -> Vec<Book> {
        vec![
            Book::create("Dune", "Herbert", "1965", "SciFi", "111").unwrap(),
            Book::create("Emma", "Austen", "1815", "Novel", "222").unwrap(),
        ]
    }

    #[test]
    fn csv_export_matches_inventory_layout() {
        let dir = TempDir::new().unwrap();
        let path = export(&books(), ExportFormat::Csv, &dir.path().join("out.csv")).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "title,author,anio,genero,isbn\n\
             Dune,Herbert,1965,SciFi,111\n\
             Emma,Austen,1815,Novel,222\n"
        );
    }

    #[test]
    fn xlsx_export_has_one_inventory_sheet() {
        use calamine::{open_workbook, Data, Reader, Xlsx};

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("exports").join(ExportFormat::Xlsx.file_name());
        let path = export(&books(), ExportFormat::Xlsx, &target).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
        let text = |value: &str| Data::String(value.to_string());
        assert_eq!(
            rows,
            vec![
                COLUMNS.iter().map(|name| text(name)).collect::<Vec<_>>(),
                vec![
                    text("Dune"),
                    text("Herbert"),
                    Data::Float(1965.0),
                    text("SciFi"),
                    text("111"),
                ],
                vec![
                    text("Emma"),
                    text("Austen"),
                    Data::Float(1815.0),
                    text("Novel"),
                    text("222"),
                ],
            ]
        );
    }

    #[test]
    fn file_names_follow_format() {
        assert_eq!(ExportFormat::Csv.file_name(), "inventario_libros.csv");
        assert_eq!(ExportFormat::Xlsx.file_name(), "inventario_libros.xlsx");
    }
}
