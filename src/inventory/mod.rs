//! The in-memory catalog and its CSV snapshot. The `Inventory` is the only
//! owner of mutable book state; every mutation rewrites the whole file before
//! returning so the snapshot on disk is always current.

mod storage;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{InventoryError, Result};
use crate::models::{Book, BookPatch};

pub use storage::{read_books, write_books, COLUMNS};
pub(crate) use storage::write_table;

/// Ordered ISBN → book mapping bound to a CSV file.
///
/// Books live in a `Vec` so listing follows insertion order; ISBN uniqueness
/// is enforced on every public insertion path. Catalogs are small enough that
/// linear lookups are not worth an index.
#[derive(Debug)]
pub struct Inventory {
    books: Vec<Book>,
    path: PathBuf,
}

impl Inventory {
    /// Open the catalog stored at `path`, loading whatever is already there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut inventory = Self {
            books: Vec::new(),
            path: path.into(),
        };
        inventory.load()?;
        Ok(inventory)
    }

    /// Replace the in-memory state with the file contents. Rows are inserted
    /// without the duplicate check, so a repeated ISBN in the file resolves to
    /// its last row.
    pub fn load(&mut self) -> Result<()> {
        let rows = read_books(&self.path)?;
        let row_count = rows.len();
        self.books.clear();
        for book in rows {
            self.insert_unchecked(book);
        }
        if self.books.len() < row_count {
            warn!(
                path = %self.path.display(),
                rows = row_count,
                books = self.books.len(),
                "inventory file repeats ISBNs; later rows replaced earlier ones"
            );
        }
        info!(path = %self.path.display(), books = self.books.len(), "inventory loaded");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new book. Fails when the ISBN is already taken.
    pub fn add(&mut self, book: Book) -> Result<Book> {
        if self.position_by_isbn(&book.isbn).is_some() {
            return Err(InventoryError::DuplicateIsbn { isbn: book.isbn });
        }
        let stored = book.clone();
        self.mutate(|books| {
            books.push(book);
            Ok(())
        })?;
        info!(isbn = %stored.isbn, title = %stored.title, "book added");
        Ok(stored)
    }

    /// Remove the book keyed by `isbn` and return it.
    pub fn remove_by_isbn(&mut self, isbn: &str) -> Result<Book> {
        let index = self
            .position_by_isbn(isbn)
            .ok_or_else(|| InventoryError::not_found(isbn))?;
        self.remove_at(index)
    }

    /// Remove the first book whose title matches ignoring case. Titles are not
    /// unique, so only the earliest inserted match goes.
    pub fn remove_by_title(&mut self, title: &str) -> Result<Book> {
        let index = self
            .position_by_title(title)
            .ok_or_else(|| InventoryError::not_found(title))?;
        self.remove_at(index)
    }

    /// First book whose title matches ignoring case, if any.
    pub fn find_by_title(&self, title: &str) -> Option<&Book> {
        self.position_by_title(title).map(|index| &self.books[index])
    }

    pub fn find_by_isbn(&self, isbn: &str) -> Option<&Book> {
        self.position_by_isbn(isbn).map(|index| &self.books[index])
    }

    /// Every book in insertion order.
    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Apply `patch` to the book keyed by `isbn` and return the new value.
    pub fn update(&mut self, isbn: &str, patch: &BookPatch) -> Result<Book> {
        let index = self
            .position_by_isbn(isbn)
            .ok_or_else(|| InventoryError::not_found(isbn))?;
        self.update_at(index, patch)
    }

    /// Apply `patch` to the first book whose title matches ignoring case.
    pub fn update_by_title(&mut self, title: &str, patch: &BookPatch) -> Result<Book> {
        let index = self
            .position_by_title(title)
            .ok_or_else(|| InventoryError::not_found(title))?;
        self.update_at(index, patch)
    }

    /// Write the current state to disk.
    pub fn save(&self) -> Result<()> {
        write_books(&self.path, &self.books)
    }

    fn remove_at(&mut self, index: usize) -> Result<Book> {
        let removed = self.mutate(|books| Ok(books.remove(index)))?;
        info!(isbn = %removed.isbn, title = %removed.title, "book removed");
        Ok(removed)
    }

    fn update_at(&mut self, index: usize, patch: &BookPatch) -> Result<Book> {
        let updated = self.mutate(|books| {
            patch.apply_to(&mut books[index])?;
            Ok(books[index].clone())
        })?;
        info!(isbn = %updated.isbn, ?patch, "book updated");
        Ok(updated)
    }

    /// Run `change` against the books and persist. If either step fails the
    /// previous state is put back, so callers never observe a half-applied
    /// mutation.
    fn mutate<T, F>(&mut self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Book>) -> Result<T>,
    {
        let previous = self.books.clone();
        let outcome = change(&mut self.books).and_then(|value| self.save().map(|()| value));
        if let Err(err) = &outcome {
            warn!(path = %self.path.display(), error = %err, "mutation rolled back");
            self.books = previous;
        }
        outcome
    }

    /// Insert or replace in place, skipping the public duplicate check.
    fn insert_unchecked(&mut self, book: Book) {
        match self.position_by_isbn(&book.isbn) {
            Some(index) => self.books[index] = book,
            None => self.books.push(book),
        }
    }

    fn position_by_isbn(&self, isbn: &str) -> Option<usize> {
        self.books.iter().position(|book| book.isbn == isbn)
    }

    fn position_by_title(&self, title: &str) -> Option<usize> {
        self.books.iter().position(|book| book.title_matches(title))
    }
}
