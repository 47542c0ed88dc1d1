use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InventoryError, Result};
use crate::models::{parse_year, Book};

/// Column order of the persisted file. Changing it breaks existing files.
pub const COLUMNS: [&str; 5] = ["title", "author", "anio", "genero", "isbn"];

/// On-disk shape of one row. The year stays text here so a bad value turns
/// into a `Malformed` error with a row number instead of a bare CSV error.
#[derive(Debug, Serialize, Deserialize)]
struct BookRecord {
    #[serde(alias = "titulo")]
    title: String,
    #[serde(alias = "autor")]
    author: String,
    #[serde(rename = "anio")]
    year: String,
    #[serde(rename = "genero")]
    genre: String,
    isbn: String,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            genre: book.genre.clone(),
            isbn: book.isbn.clone(),
        }
    }
}

/// Read every row of `path` in file order. A missing file is an empty
/// catalog, not an error.
pub fn read_books(path: &Path) -> Result<Vec<Book>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "inventory file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(InventoryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut reader = csv::Reader::from_reader(file);
    let mut books = Vec::new();
    for (index, record) in reader.deserialize::<BookRecord>().enumerate() {
        let row = index + 1;
        let record = record.map_err(|source| csv_error(path, source))?;
        let year = parse_year(record.year.trim()).map_err(|err| InventoryError::Malformed {
            path: path.to_path_buf(),
            row,
            reason: err.to_string(),
        })?;
        books.push(Book {
            title: record.title,
            author: record.author,
            year,
            genre: record.genre,
            isbn: record.isbn,
        });
    }

    debug!(path = %path.display(), rows = books.len(), "read inventory file");
    Ok(books)
}

/// Rewrite the whole table. Rows go to a sibling temp file that is renamed
/// over `path`, so a failed write never leaves a half-written catalog.
pub fn write_books(path: &Path, books: &[Book]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }

    let tmp_path = temp_path(path);
    let file = File::create(&tmp_path).map_err(|source| io_error(&tmp_path, source))?;
    write_table(file, books).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        csv_error(&tmp_path, source)
    })?;

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        io_error(path, source)
    })?;
    debug!(path = %path.display(), rows = books.len(), "wrote inventory file");
    Ok(())
}

/// Write the header and one row per book to any writer. The header is written
/// explicitly so an empty catalog still produces a well-formed file.
pub(crate) fn write_table<W: Write>(writer: W, books: &[Book]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(COLUMNS)?;
    for book in books {
        writer.serialize(BookRecord::from(book))?;
    }
    writer.flush()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: io::Error) -> InventoryError {
    InventoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> InventoryError {
    InventoryError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn book(title: &str, isbn: &str) -> Book {
        Book::create(title, "Author", "2001", "Genre", isbn).unwrap()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let books = read_books(&dir.path().join("nope.csv")).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.csv");
        write_books(&path, &[]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "title,author,anio,genero,isbn\n");
    }

    #[test]
    fn rows_follow_fixed_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.csv");
        write_books(&path, &[book("Dune", "111")]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "title,author,anio,genero,isbn\nDune,Author,2001,Genre,111\n"
        );
    }

    #[test]
    fn fields_with_delimiters_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.csv");
        let tricky = Book::create(
            "Guns, Germs, and Steel",
            "Diamond, Jared",
            "1997",
            "History \"popular\"",
            "978-0393317558",
        )
        .unwrap();
        write_books(&path, &[tricky.clone()]).unwrap();
        assert_eq!(read_books(&path).unwrap(), vec![tricky]);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("books.csv");
        write_books(&path, &[book("A", "1")]).unwrap();
        assert_eq!(read_books(&path).unwrap().len(), 1);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn accepts_legacy_spanish_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "titulo,autor,anio,genero,isbn\nRayuela,Cortázar,1963,Novela,42\n",
        )
        .unwrap();
        let books = read_books(&path).unwrap();
        assert_eq!(
            books,
            vec![Book::create("Rayuela", "Cortázar", "1963", "Novela", "42").unwrap()]
        );
    }

    #[test]
    fn bad_year_reports_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "title,author,anio,genero,isbn\nA,B,1999,C,1\nD,E,someday,F,2\n",
        )
        .unwrap();
        let err = read_books(&path).unwrap_err();
        assert!(matches!(err, InventoryError::Malformed { row: 2, .. }), "{err:?}");
    }
}
