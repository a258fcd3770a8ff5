use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use records_core::{
    models::SUMMARY_COLUMNS, NewRecord, Persistence, Record, RecordFile, RecordKind, RecordPatch,
    RecordSession, SessionError,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::form::{
    FormModal, FormPurpose, AIRLINE_ID_LABEL, ANY_KIND, CLIENT_ID_LABEL, FLIGHT_LABEL, ID_LABEL,
    TYPE_LABEL,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const TAB_TITLES: [&str; 4] = ["All", "Client", "Airline", "Flight"];
const COLUMN_WIDTHS: [Constraint; 6] = [
    Constraint::Length(8),
    Constraint::Length(8),
    Constraint::Percentage(22),
    Constraint::Percentage(28),
    Constraint::Percentage(18),
    Constraint::Percentage(16),
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Active search, shown in place of the tab contents until cleared.
#[derive(Debug, Clone)]
struct SearchView {
    label: String,
    results: Vec<Record>,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal frontend over a [`RecordSession`].
pub struct RecordsApp<P = RecordFile> {
    session: RecordSession<P>,
    state: UiState,
    form: Option<FormModal>,
    theme: Theme,
}

impl<P: Persistence> RecordsApp<P> {
    pub fn new(session: RecordSession<P>) -> Self {
        let mut app = Self {
            session,
            state: UiState::default(),
            form: None,
            theme: Theme::default(),
        };
        app.refresh_rows();
        let total = app.state.rows.len();
        app.state
            .set_status(StatusLevel::Info, format!("Loaded {total} records"));
        app
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Event::Key(key) = event {
                        self.handle_key(key);
                    }
                }
                Some(AppEvent::Tick) => {}
                None => break,
            }
        }

        restore_terminal(&mut terminal)?;
        if self.session.is_dirty() {
            warn!("Exiting with unsaved changes discarded");
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.form.is_some() {
            self.handle_form_key(key);
        } else {
            self.handle_browse_key(key);
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        let plain = key.modifiers.is_empty() || key.modifiers == KeyModifiers::ALT;
        let quit_confirmed = std::mem::take(&mut self.state.quit_armed);
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.request_quit(quit_confirmed),
            KeyCode::Char('s') if key.modifiers == KeyModifiers::CONTROL => self.save(),
            KeyCode::Char('c') if plain => self.open_form(FormModal::create(
                self.state.tab.unwrap_or(RecordKind::Client),
            )),
            KeyCode::Char('u') if plain => self.open_form(FormModal::update()),
            KeyCode::Char('d') if plain => self.open_form(FormModal::delete()),
            KeyCode::Char('s') if plain => self.open_form(FormModal::search(self.state.tab)),
            KeyCode::Esc if self.state.search.is_some() => {
                self.state.search = None;
                self.refresh_rows();
                self.state
                    .set_status(StatusLevel::Info, "Search cleared".to_string());
            }
            KeyCode::Tab => self.select_tab(self.state.tab_index() + 1),
            KeyCode::BackTab => self.select_tab(self.state.tab_index() + TAB_TITLES.len() - 1),
            KeyCode::Char(ch @ '1'..='4') if key.modifiers.is_empty() => {
                self.select_tab(ch as usize - '1' as usize)
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.move_to(0),
            KeyCode::Char('G') if key.modifiers.is_empty() => self.state.move_to_end(),
            KeyCode::Home => self.state.move_to(0),
            KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::PageUp => self.state.page_up(),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut submit = false;
        if let Some(form) = self.form.as_mut() {
            match key.code {
                KeyCode::Esc => {
                    let purpose = form.purpose;
                    self.form = None;
                    self.state.set_status(
                        StatusLevel::Info,
                        format!("Cancelled {}", purpose.submit_label()),
                    );
                    return;
                }
                KeyCode::Enter => submit = true,
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                KeyCode::Left => form.shift(-1),
                KeyCode::Right => form.shift(1),
                KeyCode::Home => form.home(),
                KeyCode::End => form.end(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Delete => form.delete_char(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        form.insert(ch);
                    }
                }
                _ => {}
            }
        }
        if submit {
            self.submit_form();
        }
    }

    /// Quitting with unsaved changes needs a second `q`.
    fn request_quit(&mut self, confirmed: bool) {
        if confirmed || !self.session.is_dirty() {
            self.state.should_quit = true;
            return;
        }
        self.state.quit_armed = true;
        self.state.set_status(
            StatusLevel::Warning,
            "Unsaved changes: Ctrl-S to save, q again to discard".to_string(),
        );
    }

    fn open_form(&mut self, form: FormModal) {
        debug!(purpose = ?form.purpose, "Opening form");
        self.form = Some(form);
    }

    /// Run the open form; it stays open when the input is rejected.
    fn submit_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };
        let outcome = match form.purpose {
            FormPurpose::Create => self.submit_create(&form),
            FormPurpose::Update => self.submit_update(&form),
            FormPurpose::Delete => self.submit_delete(&form),
            FormPurpose::Search => self.submit_search(&form),
        };
        match outcome {
            Ok(message) => {
                self.refresh_rows();
                self.state.set_status(StatusLevel::Success, message);
            }
            Err(Failure::Rejected(message)) => {
                self.form = Some(form);
                self.state.set_status(StatusLevel::Error, message);
            }
            Err(Failure::Unsaved(message)) => {
                self.refresh_rows();
                self.state.set_status(StatusLevel::Warning, message);
            }
        }
    }

    fn submit_create(&self, form: &FormModal) -> Result<String, Failure> {
        let kind = form.create_kind();
        let fields = form.filled_fields(&[TYPE_LABEL]);
        let request = NewRecord::from_fields(kind, &fields).map_err(Failure::rejected)?;
        let record = self.session.create(request).map_err(Failure::from)?;
        let [id, ..] = record.summary_row();
        info!(%kind, %id, "Created record");
        Ok(format!("{kind} record {id} created"))
    }

    fn submit_update(&self, form: &FormModal) -> Result<String, Failure> {
        let client_id = form.text(CLIENT_ID_LABEL);
        let airline_id = form.text(AIRLINE_ID_LABEL);
        let kind = resolve_target(client_id, airline_id, form.toggled(FLIGHT_LABEL))?;
        let fields = form.filled_fields(&[CLIENT_ID_LABEL, AIRLINE_ID_LABEL]);
        if fields.is_empty() {
            return Err(Failure::Rejected(
                "Fill in at least one field to update".to_string(),
            ));
        }
        let patch = RecordPatch::from_fields(kind, &fields).map_err(Failure::rejected)?;
        self.session
            .update(&patch, non_blank(client_id), non_blank(airline_id))
            .map_err(Failure::from)?;
        info!(%kind, client_id, airline_id, "Updated record");
        Ok(format!("{kind} record updated"))
    }

    fn submit_delete(&self, form: &FormModal) -> Result<String, Failure> {
        let client_id = form.text(CLIENT_ID_LABEL);
        let airline_id = form.text(AIRLINE_ID_LABEL);
        let kind = resolve_target(client_id, airline_id, form.toggled(FLIGHT_LABEL))?;
        self.session
            .delete(kind, non_blank(client_id), non_blank(airline_id))
            .map_err(Failure::from)?;
        info!(%kind, client_id, airline_id, "Deleted record");
        Ok(format!("{kind} record deleted"))
    }

    /// Searches are read-only; the result set replaces the table until cleared.
    fn submit_search(&mut self, form: &FormModal) -> Result<String, Failure> {
        let id = form.text(ID_LABEL);
        if id.is_empty() {
            return Err(Failure::Rejected("ID cannot be blank".to_string()));
        }
        let choice = form.choice(TYPE_LABEL);
        let kind = if choice == ANY_KIND {
            None
        } else {
            Some(choice.parse::<RecordKind>().map_err(Failure::rejected)?)
        };
        let results = self.session.search(kind, id).map_err(Failure::rejected)?;
        let scope = kind.map_or_else(|| "any".to_string(), |kind| kind.to_string());
        let message = format!(
            "Found {} record(s) for {scope} ID {id}; Esc clears the search",
            results.len()
        );
        self.state.search = Some(SearchView {
            label: format!("Search: {scope} ID {id}"),
            results,
        });
        Ok(message)
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(()) => {
                let stamp = Local::now().format("%H:%M:%S");
                self.state
                    .set_status(StatusLevel::Success, format!("Saved at {stamp}"));
            }
            Err(err) => {
                error!("Manual save failed: {err}");
                self.state
                    .set_status(StatusLevel::Error, format!("Save failed: {err}"));
            }
        }
    }

    fn select_tab(&mut self, index: usize) {
        let index = index % TAB_TITLES.len();
        self.state.tab = index
            .checked_sub(1)
            .and_then(|kind| RecordKind::ALL.get(kind).copied());
        self.state.search = None;
        self.refresh_rows();
        self.state.move_to(0);
    }

    fn refresh_rows(&mut self) {
        self.state.rows = match &self.state.search {
            Some(search) => search.results.clone(),
            None => self.session.records(self.state.tab),
        };
        self.state.clamp_cursor();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(frame.size());

        self.render_tabs(frame, layout[0]);
        self.render_records(frame, layout[1]);
        self.render_status(frame, layout[2]);
        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(TAB_TITLES.to_vec())
            .select(self.state.tab_index())
            .block(Block::default().borders(Borders::ALL).title("Records"))
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_records(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(3) as usize;
        self.state.clamp_cursor();

        let header = Row::new(SUMMARY_COLUMNS.iter().map(|column| {
            Cell::from(*column).style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        }));
        let rows: Vec<Row> = self
            .state
            .rows
            .iter()
            .map(|record| Row::new(record.summary_row().map(Cell::from)))
            .collect();

        let title = match &self.state.search {
            Some(search) => search.label.clone(),
            None => format!("{} ({})", TAB_TITLES[self.state.tab_index()], rows.len()),
        };
        let empty = rows.is_empty();
        let table = Table::new(rows, COLUMN_WIDTHS)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(self.theme.primary_fg))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg),
            )
            .highlight_symbol("▶ ");

        let mut table_state = TableState::default();
        if !empty {
            table_state.select(Some(self.state.cursor));
        }
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let color = match self.state.status_level {
            StatusLevel::Info => self.theme.primary_fg,
            StatusLevel::Success => self.theme.success,
            StatusLevel::Warning => self.theme.warning,
            StatusLevel::Error => self.theme.danger,
        };
        let save_note = if self.session.autosave() {
            "auto-save enabled"
        } else if self.session.is_dirty() {
            "unsaved changes, Ctrl-S saves"
        } else {
            "all changes saved"
        };
        let help = format!(
            "c create  u update  d delete  s search  Tab/1-4 view  q quit  ({save_note})"
        );
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                self.state.status.clone(),
                Style::default().fg(color),
            )),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, form: &FormModal) {
        let frame_area = frame.size();
        let label_width = form
            .fields
            .iter()
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0) as u16;
        let mut width = cmp::min(72_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 32_u16);
        let wanted = form.fields.len() as u16 + 4;
        let height = wanted.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
        let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        // Keep the focused field visible when the form is taller than the screen.
        let visible = height.saturating_sub(4) as usize;
        let skip = (form.focus + 1).saturating_sub(visible.max(1));

        let mut lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .skip(skip)
            .take(visible)
            .map(|(index, field)| {
                let focused = index == form.focus;
                let marker = if focused {
                    Span::styled("▶ ", Style::default().fg(self.theme.accent))
                } else {
                    Span::raw("  ")
                };
                let label_style = if focused {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                Line::from(vec![
                    marker,
                    Span::styled(
                        format!("{:width$} ", field.label, width = label_width as usize),
                        label_style,
                    ),
                    Span::raw(field.display_value()),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" {}  ", form.purpose.submit_label())),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(form.purpose.title()),
        );
        frame.render_widget(paragraph, area);

        if let Some(cursor) = form.focused().and_then(|field| field.cursor()) {
            let row = (form.focus - skip) as u16;
            let cursor_x = (area.x + 1 + 2 + label_width + 1 + cursor as u16)
                .min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 1 + row);
        }
    }
}

/// Why a form submission did not complete cleanly.
#[derive(Debug)]
enum Failure {
    /// Input rejected; nothing changed.
    Rejected(String),
    /// Applied in memory but not written to disk.
    Unsaved(String),
}

impl Failure {
    fn rejected(err: impl std::fmt::Display) -> Self {
        Failure::Rejected(err.to_string())
    }
}

impl From<SessionError> for Failure {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Record(err) => Failure::Rejected(err.to_string()),
            SessionError::Unsaved(err) => {
                Failure::Unsaved(format!("Change kept in memory but not saved: {err}"))
            }
        }
    }
}

/// Pick the record kind an update or delete targets from the id inputs.
fn resolve_target(client_id: &str, airline_id: &str, flight: bool) -> Result<RecordKind, Failure> {
    let message = match (client_id.is_empty(), airline_id.is_empty(), flight) {
        (false, false, true) => return Ok(RecordKind::Flight),
        (false, true, false) => return Ok(RecordKind::Client),
        (true, false, false) => return Ok(RecordKind::Airline),
        (_, _, true) => "A flight needs both a client ID and an airline ID",
        (false, false, false) => "Tick Flight to target a flight, or give only one ID",
        (true, true, false) => "Enter a client ID or an airline ID",
    };
    Err(Failure::Rejected(message.to_string()))
}

fn non_blank(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    rows: Vec<Record>,
    tab: Option<RecordKind>,
    search: Option<SearchView>,
    cursor: usize,
    list_height: usize,
    status: String,
    status_level: StatusLevel,
    quit_armed: bool,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            tab: None,
            search: None,
            cursor: 0,
            list_height: 1,
            status: "Ready".to_string(),
            status_level: StatusLevel::Info,
            quit_armed: false,
            should_quit: false,
        }
    }
}

impl UiState {
    fn tab_index(&self) -> usize {
        self.tab
            .and_then(|kind| RecordKind::ALL.iter().position(|k| *k == kind))
            .map_or(0, |index| index + 1)
    }

    fn set_status(&mut self, level: StatusLevel, message: String) {
        self.status_level = level;
        self.status = message;
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len - 1) as usize;
    }

    fn move_to(&mut self, index: usize) {
        if self.rows.is_empty() {
            return;
        }
        self.cursor = index.min(self.rows.len() - 1);
    }

    fn move_to_end(&mut self) {
        self.move_to(usize::MAX);
    }

    fn page_down(&mut self) {
        if self.list_height > 0 {
            self.move_cursor(self.list_height as isize);
        }
    }

    fn page_up(&mut self) {
        if self.list_height > 0 {
            self.move_cursor(-(self.list_height as isize));
        }
    }

    fn clamp_cursor(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use records_core::RecordStore;
    use tempfile::tempdir;

    fn app_at(dir: &std::path::Path) -> RecordsApp {
        app_with_autosave(dir, true)
    }

    fn app_with_autosave(dir: &std::path::Path, autosave: bool) -> RecordsApp {
        let file = RecordFile::new(dir.join("records.json"));
        RecordsApp::new(RecordSession::open(file, autosave))
    }

    fn press(app: &mut RecordsApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut RecordsApp, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn fill(app: &mut RecordsApp, label: &str, text: &str) {
        let form = app.form.as_mut().expect("form is open");
        form.focus = form
            .fields
            .iter()
            .position(|field| field.label == label)
            .expect("field exists");
        type_text(app, text);
    }

    fn create_client(app: &mut RecordsApp, name: &str) {
        press(app, KeyCode::Char('c'));
        fill(app, "Name", name);
        press(app, KeyCode::Enter);
    }

    fn create_airline(app: &mut RecordsApp, name: &str) {
        press(app, KeyCode::Char('c'));
        let form = app.form.as_mut().expect("form is open");
        form.focus = 0;
        form.shift(1);
        fill(app, "Company Name", name);
        press(app, KeyCode::Enter);
    }

    fn stored(app: &RecordsApp) -> RecordStore {
        RecordFile::new(app.session.persistence().path()).load()
    }

    #[test]
    fn target_resolution_follows_the_id_inputs() {
        assert_eq!(resolve_target("1", "", false).ok(), Some(RecordKind::Client));
        assert_eq!(resolve_target("", "2", false).ok(), Some(RecordKind::Airline));
        assert_eq!(resolve_target("1", "2", true).ok(), Some(RecordKind::Flight));
        assert!(resolve_target("1", "2", false).is_err());
        assert!(resolve_target("1", "", true).is_err());
        assert!(resolve_target("", "", false).is_err());
    }

    #[test]
    fn created_records_are_listed_and_saved() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        create_client(&mut app, "John Doe");
        create_airline(&mut app, "Delta");

        assert!(app.form.is_none());
        assert_eq!(app.state.rows.len(), 2);
        assert_eq!(app.state.status_level, StatusLevel::Success);
        let store = stored(&app);
        assert_eq!(store.clients()[0].details.name, "John Doe");
        assert_eq!(store.airlines()[0].details.company_name, "Delta");
        Ok(())
    }

    #[test]
    fn flight_with_unknown_client_keeps_the_form_open() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        create_airline(&mut app, "Delta");

        press(&mut app, KeyCode::Char('c'));
        let form = app.form.as_mut().expect("form is open");
        form.focus = 0;
        form.shift(-1);
        assert_eq!(form.create_kind(), RecordKind::Flight);
        fill(&mut app, "Client_ID", "7");
        fill(&mut app, "Airline_ID", "1");
        press(&mut app, KeyCode::Enter);

        assert!(app.form.is_some());
        assert_eq!(app.state.status_level, StatusLevel::Error);
        assert!(stored(&app).flights().is_empty());
        Ok(())
    }

    #[test]
    fn update_patches_only_filled_fields() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        create_client(&mut app, "John Doe");

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.status_level, StatusLevel::Error);

        fill(&mut app, CLIENT_ID_LABEL, "1");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.status, "Fill in at least one field to update");

        fill(&mut app, "City", "Boston");
        press(&mut app, KeyCode::Enter);
        assert!(app.form.is_none());
        let store = stored(&app);
        let client = &store.clients()[0];
        assert_eq!(client.details.city, "Boston");
        assert_eq!(client.details.name, "John Doe");
        Ok(())
    }

    #[test]
    fn delete_removes_the_target() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        create_client(&mut app, "John Doe");
        create_client(&mut app, "Jane Roe");

        press(&mut app, KeyCode::Char('d'));
        fill(&mut app, CLIENT_ID_LABEL, "1");
        press(&mut app, KeyCode::Enter);

        let store = stored(&app);
        assert_eq!(store.clients().len(), 1);
        assert_eq!(store.clients()[0].details.name, "Jane Roe");
        Ok(())
    }

    #[test]
    fn search_replaces_rows_until_escape() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        create_client(&mut app, "John Doe");
        create_client(&mut app, "Jane Roe");

        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.status, "ID cannot be blank");

        type_text(&mut app, "2");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.rows.len(), 1);
        assert_eq!(app.state.rows[0].summary_row()[2], "Jane Roe");

        press(&mut app, KeyCode::Esc);
        assert!(app.state.search.is_none());
        assert_eq!(app.state.rows.len(), 2);

        press(&mut app, KeyCode::Char('s'));
        type_text(&mut app, "9");
        press(&mut app, KeyCode::Enter);
        assert!(app.form.is_some());
        assert_eq!(app.state.status_level, StatusLevel::Error);
        Ok(())
    }

    #[test]
    fn tabs_filter_by_kind() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        create_client(&mut app, "John Doe");
        create_airline(&mut app, "Delta");

        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.state.tab, Some(RecordKind::Airline));
        assert_eq!(app.state.rows.len(), 1);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state.tab, Some(RecordKind::Flight));
        assert!(app.state.rows.is_empty());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state.tab, None);
        assert_eq!(app.state.rows.len(), 2);
        Ok(())
    }

    #[test]
    fn alt_shortcuts_open_forms() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_at(dir.path());
        app.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::ALT));
        assert_eq!(app.form.as_ref().map(|form| form.purpose), Some(FormPurpose::Delete));
        press(&mut app, KeyCode::Esc);
        assert!(app.form.is_none());
        Ok(())
    }

    #[test]
    fn quitting_with_unsaved_changes_needs_confirmation() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_autosave(dir.path(), false);
        create_client(&mut app, "John Doe");
        assert!(app.session.is_dirty());

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.state.should_quit);
        assert_eq!(app.state.status_level, StatusLevel::Warning);

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.state.should_quit);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.state.should_quit);
        assert!(stored(&app).clients().is_empty());
        Ok(())
    }

    #[test]
    fn saving_clears_the_quit_prompt() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_autosave(dir.path(), false);
        create_client(&mut app, "John Doe");

        press(&mut app, KeyCode::Char('q'));
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(!app.session.is_dirty());
        assert_eq!(stored(&app).clients().len(), 1);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.state.should_quit);
        Ok(())
    }

}
