use crate::models::Book;

/// Selection state for the book list. The books themselves stay inside the
/// inventory; this only tracks which row is highlighted.
#[derive(Debug, Default)]
pub(crate) struct BookList {
    pub(crate) selected: usize,
}

impl BookList {
    pub(crate) fn move_selection(&mut self, len: usize, offset: isize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let last = len as isize - 1;
        let new = (self.selected as isize + offset).clamp(0, last);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Highlight the book keyed by `isbn`, if it is listed.
    pub(crate) fn select_isbn(&mut self, books: &[Book], isbn: &str) -> bool {
        match books.iter().position(|book| book.isbn == isbn) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// Keep the selection valid after the list shrinks.
    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub(crate) fn current<'a>(&self, books: &'a [Book]) -> Option<&'a Book> {
        books.get(self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(n: usize) -> Vec<Book> {
        (0..n)
            .map(|i| Book::create(format!("Book {i}"), "A", "2000", "G", i.to_string()).unwrap())
            .collect()
    }

    #[test]
    fn selection_is_clamped() {
        let mut list = BookList::default();
        list.move_selection(3, -5);
        assert_eq!(list.selected, 0);
        list.move_selection(3, 10);
        assert_eq!(list.selected, 2);
        list.ensure_in_bounds(1);
        assert_eq!(list.selected, 0);
        list.move_selection(0, 1);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn select_by_isbn() {
        let books = books(4);
        let mut list = BookList::default();
        assert!(list.select_isbn(&books, "2"));
        assert_eq!(list.current(&books).unwrap().title, "Book 2");
        assert!(!list.select_isbn(&books, "missing"));
        assert_eq!(list.selected, 2);
        list.select_last(books.len());
        assert_eq!(list.selected, 3);
    }
}
