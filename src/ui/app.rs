use std::cmp::min;
use std::mem;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::error;

use crate::error::InventoryError;
use crate::export::{export, ExportFormat};
use crate::inventory::Inventory;
use crate::models::Book;

use super::forms::{BookField, BookForm, ConfirmBookDelete, FindBy, FindForm};
use super::helpers::{centered_rect, is_input_error, key_hints, surface_error};
use super::screens::BookList;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per book card.
const BOOK_CARD_HEIGHT: u16 = 5;
/// Rows moved by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// Fine-grained modes layered over the book list.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { isbn: String, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Finding(FindForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Application state for one session. The inventory is handed in by the
/// caller and lives exactly as long as the app.
pub struct App {
    inventory: Inventory,
    export_dir: PathBuf,
    list: BookList,
    mode: Mode,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(inventory: Inventory, export_dir: PathBuf) -> Self {
        Self {
            inventory,
            export_dir,
            list: BookList::default(),
            mode: Mode::Normal,
            status: None,
            last_export: None,
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Route a key press to the active mode. Returns `true` when the user asked
    /// to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::EditingBook { isbn, form } => self.handle_edit_book(code, isbn, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Finding(find) => self.handle_find(code, find),
        };

        Ok(exit)
    }

    /// Show a failure that escaped a key handler without ending the session.
    /// Typed input problems never get here; they are shown next to the form.
    pub(crate) fn report_unexpected(&mut self, err: &anyhow::Error) {
        error!(error = %format!("{err:#}"), "unexpected error while handling input");
        self.mode = Mode::Normal;
        self.set_status(
            format!("Unexpected error: {}", surface_error(err)),
            StatusKind::Error,
        );
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let len = self.inventory.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.list.move_selection(len, -1),
            KeyCode::Down => self.list.move_selection(len, 1),
            KeyCode::PageUp => self.list.move_selection(len, -PAGE_STEP),
            KeyCode::PageDown => self.list.move_selection(len, PAGE_STEP),
            KeyCode::Home => self.list.select_first(),
            KeyCode::End => self.list.select_last(len),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Enter => match self.current_book().cloned() {
                Some(book) => {
                    self.clear_status();
                    return Ok(Mode::EditingBook {
                        isbn: book.isbn.clone(),
                        form: BookForm::from_book(&book),
                    });
                }
                None => self.set_status("No book selected.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                match self.current_book().cloned() {
                    Some(book) => return Ok(Mode::ConfirmDelete(ConfirmBookDelete { book })),
                    None => self.set_status("No book selected.", StatusKind::Error),
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Finding(FindForm::default()));
            }
            KeyCode::Char('c') => self.run_export(ExportFormat::Csv)?,
            KeyCode::Char('x') => self.run_export(ExportFormat::Xlsx)?,
            KeyCode::Char('o') => self.open_last_export(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(()) => keep_open = false,
                Err(err) if is_input_error(&err) => self.show_form_error(&mut form, &err),
                Err(err) => return Err(err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBook(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_book(
        &mut self,
        code: KeyCode,
        isbn: String,
        mut form: BookForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_book(&isbn, &form) {
                Ok(()) => keep_open = false,
                Err(err) if is_input_error(&err) => self.show_form_error(&mut form, &err),
                Err(err) => return Err(err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingBook { isbn, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBookDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.inventory.remove_by_isbn(&confirm.book.isbn) {
                    Ok(removed) => {
                        self.list.ensure_in_bounds(self.inventory.len());
                        self.set_status(format!("Deleted {}.", removed.title), StatusKind::Info);
                        Ok(Mode::Normal)
                    }
                    Err(err) if err.is_input_error() => {
                        self.list.ensure_in_bounds(self.inventory.len());
                        self.set_status(err.to_string(), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                    Err(err) => Err(err).context("failed to delete book"),
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_find(&mut self, code: KeyCode, mut find: FindForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => find.toggle_target(),
            KeyCode::Backspace => {
                find.query.pop();
                find.error = None;
            }
            KeyCode::Enter => {
                if let Some(book) = self.find(&find).cloned() {
                    self.list.select_isbn(self.inventory.list(), &book.isbn);
                    self.set_status(format!("Found: {}", book.labeled()), StatusKind::Info);
                    return Mode::Normal;
                }
                find.error = Some("Book not found.".to_string());
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                find.query.push(ch);
                find.error = None;
            }
            _ => {}
        }
        Mode::Finding(find)
    }

    fn find(&self, find: &FindForm) -> Option<&Book> {
        let query = find.query.trim();
        match find.by {
            FindBy::Title => self.inventory.find_by_title(query),
            FindBy::Isbn => self.inventory.find_by_isbn(query),
        }
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let book = form.parse_new()?;
        let added = self.inventory.add(book).context("failed to add book")?;
        self.list.select_isbn(self.inventory.list(), &added.isbn);
        self.set_status(format!("Added {}.", added.title), StatusKind::Info);
        Ok(())
    }

    fn save_existing_book(&mut self, isbn: &str, form: &BookForm) -> Result<()> {
        let current = self
            .inventory
            .find_by_isbn(isbn)
            .cloned()
            .ok_or_else(|| InventoryError::not_found(isbn))?;
        let patch = form.to_patch(&current);
        if patch.is_empty() {
            self.set_status("No changes to save.", StatusKind::Info);
            return Ok(());
        }
        let updated = self
            .inventory
            .update(isbn, &patch)
            .context("failed to update book")?;
        self.set_status(format!("Updated {}.", updated.title), StatusKind::Info);
        Ok(())
    }

    fn run_export(&mut self, format: ExportFormat) -> Result<()> {
        let target = self.export_dir.join(format.file_name());
        ensure!(
            target != self.inventory.path(),
            "refusing to export over the inventory file {}",
            target.display()
        );
        let path = export(self.inventory.list(), format, &target)?;
        self.set_status(
            format!(
                "Exported {} books as {format} to {}. Press [o] to open.",
                self.inventory.len(),
                path.display()
            ),
            StatusKind::Info,
        );
        self.last_export = Some(path);
        Ok(())
    }

    fn open_last_export(&mut self) {
        match self.last_export.clone() {
            None => self.set_status("Nothing exported yet.", StatusKind::Error),
            Some(path) => match open_path(&path) {
                Ok(()) => self.set_status(format!("Opened {}.", path.display()), StatusKind::Info),
                Err(err) => {
                    self.set_status(format!("Failed to open export: {err}"), StatusKind::Error)
                }
            },
        }
    }

    fn show_form_error(&mut self, form: &mut BookForm, err: &anyhow::Error) {
        let message = surface_error(err);
        form.error = Some(message.clone());
        self.set_status(message, StatusKind::Error);
    }

    fn current_book(&self) -> Option<&Book> {
        self.list.current(self.inventory.list())
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_book_list(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Finding(find) => self.draw_find(frame, area, find),
            Mode::Normal => {}
        }
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            "Books ({}) - {}",
            self.inventory.len(),
            self.inventory.path().display()
        );

        if self.inventory.is_empty() {
            let message = Paragraph::new("No books in the inventory. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.render_book_cards(frame, inner, self.inventory.list(), self.list.selected);
    }

    fn render_book_cards(&self, frame: &mut Frame, area: Rect, books: &[Book], selected: usize) {
        if books.is_empty() || area.height == 0 {
            return;
        }

        let card_height = BOOK_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = books.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(BOOK_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            let book_index = start + idx;
            if chunk.height == 0 || book_index >= len {
                continue;
            }

            let book = &books[book_index];
            let is_selected = book_index == selected;
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if is_selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let title = if book.title.trim().is_empty() {
                "Untitled".to_string()
            } else {
                book.title.clone()
            };
            let title = if is_selected {
                format!("▶ {title}")
            } else {
                title
            };

            let lines = vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} • {} • {}", book.author, book.year, book.genre),
                    Style::default().fg(Color::Gray),
                )),
                Line::from(Span::styled(
                    format!("ISBN {}", book.isbn),
                    Style::default().fg(Color::Cyan),
                )),
            ];

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match &self.mode {
            Mode::AddingBook(_) | Mode::EditingBook { .. } => key_hints(&[
                ("Tab", "Next Field"),
                ("Enter", "Save"),
                ("Esc", "Cancel"),
            ]),
            Mode::ConfirmDelete(_) => key_hints(&[("y", "Delete"), ("n", "Keep")]),
            Mode::Finding(_) => key_hints(&[
                ("Tab", "Title/ISBN"),
                ("Enter", "Find"),
                ("Esc", "Close"),
            ]),
            Mode::Normal => key_hints(&[
                ("↑↓", "Select"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("f", "Find"),
                ("c", "Export CSV"),
                ("x", "Export Excel"),
                ("o", "Open Export"),
                ("q", "Quit"),
            ]),
        }
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + form.cursor_offset(),
            inner.y + form.active_row(),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Book").borders(Borders::ALL);
        let lines = vec![
            Line::from(Span::styled(
                confirm.book.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(confirm.book.labeled()),
            Line::from(""),
            Line::from("Delete this book? (y/n)"),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_find(&self, frame: &mut Frame, area: Rect, find: &FindForm) {
        let height = if find.error.is_some() { 4 } else { 3 };
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: height.min(area.height),
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Find by {}", find.by.label()));
        let prompt = find.prompt();
        let mut lines = vec![Line::from(format!("{prompt}{}", find.query))];
        if let Some(error) = &find.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        let paragraph = Paragraph::new(lines).block(block.clone());
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prompt.len() as u16 + find.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }
}
