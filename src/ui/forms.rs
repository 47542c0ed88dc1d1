use anyhow::Result;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookPatch};

/// Fields of the book form in tab order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Year,
    Genre,
    Isbn,
}

impl BookField {
    pub(crate) const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Year,
        BookField::Genre,
        BookField::Isbn,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Year => "Year",
            BookField::Genre => "Genre",
            BookField::Isbn => "ISBN",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Input state for the add/edit modal.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) genre: String,
    pub(crate) isbn: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
    /// Set when editing: the ISBN is the record key and cannot change.
    pub(crate) isbn_locked: bool,
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            genre: book.genre.clone(),
            isbn: book.isbn.clone(),
            active: BookField::Title,
            error: None,
            isbn_locked: true,
        }
    }

    /// Move focus forward, skipping the ISBN while it is locked.
    pub(crate) fn next_field(&mut self) {
        self.step(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.step(BookField::ALL.len() - 1);
    }

    fn step(&mut self, by: usize) {
        let len = BookField::ALL.len();
        let mut index = self.active.index();
        loop {
            index = (index + by) % len;
            let field = BookField::ALL[index];
            if !(self.isbn_locked && field == BookField::Isbn) {
                self.active = field;
                return;
            }
        }
    }

    /// Append a character to the active field. The year only takes digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == BookField::Year && !ch.is_ascii_digit() {
            return false;
        }
        if self.active == BookField::Isbn && self.isbn_locked {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == BookField::Isbn && self.isbn_locked {
            return;
        }
        self.value_mut(self.active).pop();
    }

    /// Build a new book from the inputs. Surrounding whitespace is dropped.
    pub(crate) fn parse_new(&self) -> Result<Book> {
        let book = Book::create(
            self.title.trim(),
            self.author.trim(),
            self.year.trim(),
            self.genre.trim(),
            self.isbn.trim(),
        )?;
        Ok(book)
    }

    /// Patch holding only the fields that differ from `current`. The year is
    /// left as text so the inventory does the validation.
    pub(crate) fn to_patch(&self, current: &Book) -> BookPatch {
        let mut patch = BookPatch::default();
        let title = self.title.trim();
        if title != current.title {
            patch = patch.title(title);
        }
        let author = self.author.trim();
        if author != current.author {
            patch = patch.author(author);
        }
        let year = self.year.trim();
        if year != current.year.to_string() {
            patch = patch.year(year);
        }
        let genre = self.genre.trim();
        if genre != current.genre {
            patch = patch.genre(genre);
        }
        patch
    }

    pub(crate) fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Year => &self.year,
            BookField::Genre => &self.genre,
            BookField::Isbn => &self.isbn,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Year => &mut self.year,
            BookField::Genre => &mut self.genre,
            BookField::Isbn => &mut self.isbn,
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;
        let locked = field == BookField::Isbn && self.isbn_locked;

        let display = if value.is_empty() {
            "<empty>".to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if locked {
            Style::default().fg(Color::Gray)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ];
        if locked {
            spans.push(Span::styled(" (locked)", Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    }

    /// Cursor column offset inside the form for the active field.
    pub(crate) fn cursor_offset(&self) -> u16 {
        let field = self.active;
        (field.label().len() + 2 + self.value(field).chars().count()) as u16
    }

    pub(crate) fn active_row(&self) -> u16 {
        self.active.index() as u16
    }
}

/// Book awaiting a yes/no before deletion.
#[derive(Debug)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) book: Book,
}

/// Which key the find dialog looks up.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum FindBy {
    #[default]
    Title,
    Isbn,
}

impl FindBy {
    pub(crate) fn label(self) -> &'static str {
        match self {
            FindBy::Title => "Title",
            FindBy::Isbn => "ISBN",
        }
    }
}

/// State for the exact-match find dialog.
#[derive(Default, Debug)]
pub(crate) struct FindForm {
    pub(crate) query: String,
    pub(crate) by: FindBy,
    pub(crate) error: Option<String>,
}

impl FindForm {
    pub(crate) fn toggle_target(&mut self) {
        self.by = match self.by {
            FindBy::Title => FindBy::Isbn,
            FindBy::Isbn => FindBy::Title,
        };
        self.error = None;
    }

    pub(crate) fn prompt(&self) -> String {
        format!("{}: ", self.by.label())
    }
}
