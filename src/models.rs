//! Domain models handed between the inventory and the terminal UI. They stay
//! plain data holders: the inventory owns the authoritative copies and only
//! ever hands out clones, so a `Book` in the UI is a snapshot.

use std::fmt;

use crate::error::{InventoryError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One catalog entry. The ISBN doubles as the primary key inside the
/// inventory; it is treated as an opaque string and never checksum-validated.
pub struct Book {
    pub title: String,
    pub author: String,
    /// Publication year. Stored as an integer so it round-trips through the
    /// text file as the same value even if the file held leading zeros.
    pub year: u32,
    pub genre: String,
    pub isbn: String,
}

impl Book {
    /// Build a book from raw form or file input. Only the year is validated;
    /// empty titles and oddly shaped ISBNs are accepted as-is.
    pub fn create(
        title: impl Into<String>,
        author: impl Into<String>,
        year: &str,
        genre: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            title: title.into(),
            author: author.into(),
            year: parse_year(year)?,
            genre: genre.into(),
            isbn: isbn.into(),
        })
    }

    /// Detail rendering with the ISBN labelled, used by search results.
    pub fn labeled(&self) -> String {
        format!(
            "{}, {}, {}, {}, ISBN: {}",
            self.title, self.author, self.year, self.genre, self.isbn
        )
    }

    /// Case-insensitive exact comparison against a title query.
    pub(crate) fn title_matches(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.title, self.author, self.year, self.genre, self.isbn
        )
    }
}

/// Partial update for an existing book. Absent fields are left untouched.
/// The ISBN is deliberately missing: it is the key and never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Raw year text, validated when the patch is applied.
    pub year: Option<String>,
    pub genre: Option<String>,
}

impl BookPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none() && self.genre.is_none()
    }

    /// Apply the present fields to `book`. The year is parsed before anything
    /// is assigned so a bad year leaves the book unchanged.
    pub(crate) fn apply_to(&self, book: &mut Book) -> Result<()> {
        let year = self.year.as_deref().map(parse_year).transpose()?;

        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(year) = year {
            book.year = year;
        }
        if let Some(genre) = &self.genre {
            book.genre = genre.clone();
        }
        Ok(())
    }
}

/// Accept only a non-empty run of ASCII digits that fits in a `u32`.
pub fn parse_year(raw: &str) -> Result<u32> {
    let invalid = || InventoryError::InvalidYear {
        value: raw.to_string(),
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<u32>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> Book {
        Book::create("Dune", "Herbert", "1965", "SciFi", "111").unwrap()
    }

    #[test]
    fn create_stores_numeric_year() {
        let book = dune();
        assert_eq!(book.year, 1965);
        assert_eq!(book.isbn, "111");
    }

    #[test]
    fn create_rejects_non_numeric_years() {
        for bad in ["", "abc", "19x5", "-1965", " 1965", "1965.0", "99999999999"] {
            let err = Book::create("t", "a", bad, "g", "i").unwrap_err();
            assert!(
                matches!(err, InventoryError::InvalidYear { ref value } if value == bad),
                "expected InvalidYear for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn year_out_of_range_names_the_limit() {
        assert_eq!(parse_year("4294967295").unwrap(), u32::MAX);
        let err = parse_year("99999999999").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Year must be a whole number from 0 to 4294967295 (got \"99999999999\")."
        );
    }

    #[test]
    fn create_accepts_empty_title_and_odd_isbn() {
        let book = Book::create("", "", "0", "", "not-an-isbn").unwrap();
        assert_eq!(book.year, 0);
        assert_eq!(book.isbn, "not-an-isbn");
    }

    #[test]
    fn display_formats() {
        let book = dune();
        assert_eq!(book.to_string(), "Dune, Herbert, 1965, SciFi, 111");
        assert_eq!(book.labeled(), "Dune, Herbert, 1965, SciFi, ISBN: 111");
    }

    #[test]
    fn patch_changes_only_present_fields() {
        let mut book = dune();
        BookPatch::default().genre("Fantasy").apply_to(&mut book).unwrap();
        assert_eq!(
            book,
            Book {
                genre: "Fantasy".to_string(),
                ..dune()
            }
        );
    }

    #[test]
    fn patch_with_bad_year_leaves_book_untouched() {
        let mut book = dune();
        let err = BookPatch::default()
            .title("Dune Messiah")
            .year("soon")
            .apply_to(&mut book)
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidYear { .. }));
        assert_eq!(book, dune());
    }

    #[test]
    fn title_match_ignores_case_but_not_whitespace() {
        let book = dune();
        assert!(book.title_matches("dUNE"));
        assert!(!book.title_matches("dune "));
    }
}
