// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use gridview_app::{
    FieldValue, GridCommand, GridEvent, GridState, QualityBand, Record, SortDirection,
    compare_text,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_TTL: Duration = Duration::from_secs(4);
const WHEEL_ROWS: i64 = 3;
const MAX_CELL_WIDTH: usize = 28;
const SEARCH_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 3;
// table borders plus the header row
const TABLE_CHROME: u16 = 3;
const CHECKBOX_ON: &str = "[x]";
const CHECKBOX_OFF: &str = "[ ]";
const CHECKBOX_PARTIAL: &str = "[-]";
const FACET_MARK: &str = "▼";

/// Side effects the grid view cannot perform on its own.
pub trait GridRuntime<R: Record> {
    /// Persists `records` somewhere outside the view and returns where.
    fn export_records(&mut self, dataset: &str, records: &[&R]) -> Result<PathBuf>;

    /// Fresh records from the data source, or `None` when the source is static.
    fn reload_records(&mut self) -> Result<Option<Vec<R>>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Nav,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    mode: InputMode,
    cursor_row: usize,
    cursor_col: usize,
    detail_visible: bool,
    help_visible: bool,
    status_line: Option<String>,
    status_token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    MoveHalfPageDown,
    MoveHalfPageUp,
    MoveFullPageDown,
    MoveFullPageUp,
    JumpFirstRow,
    JumpLastRow,
    ToggleSort,
    ClearSort,
    ToggleRow,
    ToggleAll,
    ClearSelection,
    CycleFacet,
    ClearFacets,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TableStatus {
    SortUnavailable(String),
    SortAsc(String),
    SortDesc(String),
    SortCleared,
    NoSort,
    RowSelected(String),
    RowUnselected(String),
    AllSelected(usize),
    AllUnselected,
    SelectionCleared,
    NothingSelected,
    NoRows,
    FacetOn { label: String, value: String },
    FacetOff(String),
    FacetUnavailable(String),
    FacetsCleared,
    NoFacets,
}

impl TableStatus {
    fn message(self) -> String {
        match self {
            Self::SortUnavailable(label) if label.is_empty() => "sort unavailable".to_owned(),
            Self::SortUnavailable(label) => format!("sort unavailable for {label}"),
            Self::SortAsc(label) => format!("sort {label} asc"),
            Self::SortDesc(label) => format!("sort {label} desc"),
            Self::SortCleared => "sort cleared".to_owned(),
            Self::NoSort => "no sort to clear".to_owned(),
            Self::RowSelected(id) => format!("selected {id}"),
            Self::RowUnselected(id) => format!("unselected {id}"),
            Self::AllSelected(count) => format!("selected all {count}"),
            Self::AllUnselected => "unselected all".to_owned(),
            Self::SelectionCleared => "selection cleared".to_owned(),
            Self::NothingSelected => "nothing selected".to_owned(),
            Self::NoRows => "no rows".to_owned(),
            Self::FacetOn { label, value } => format!("facet {label} = {value}"),
            Self::FacetOff(label) => format!("facet {label} off"),
            Self::FacetUnavailable(label) => format!("no facet values for {label}"),
            Self::FacetsCleared => "facets cleared".to_owned(),
            Self::NoFacets => "no facets to clear".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TableEvent {
    CursorUpdated,
    Status(TableStatus),
}

/// A row of the current window, already formatted for display.
#[derive(Debug, Clone, PartialEq)]
struct RowView {
    position: usize,
    checked: bool,
    cells: Vec<String>,
    quality: Option<QualityBand>,
}

pub fn run_app<R, T>(state: &mut GridState<R>, runtime: &mut T) -> Result<()>
where
    R: Record,
    T: GridRuntime<R>,
{
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    tracing::info!(
        dataset = state.name(),
        records = state.records().len(),
        "grid view started"
    );

    let result = event_loop(
        &mut terminal,
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        &internal_rx,
    );

    state.teardown();
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen)
        .context("leave alternate screen")?;
    tracing::info!(dataset = state.name(), "grid view stopped");
    result
}

fn event_loop<B, R, T>(
    terminal: &mut Terminal<B>,
    state: &mut GridState<R>,
    runtime: &mut T,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) -> Result<()>
where
    B: Backend,
    R: Record,
    T: GridRuntime<R>,
{
    loop {
        process_internal_events(view_data, internal_rx);

        let size = terminal.size().context("read terminal size")?;
        let area = Rect::new(0, 0, size.width, size.height);
        if !state
            .dispatch(GridCommand::Resize(table_body_height(area)))
            .is_empty()
        {
            clamp_cursor(state, view_data);
        }

        terminal
            .draw(|frame| render(frame, state, view_data))
            .context("draw frame")?;

        let timeout = poll_timeout(state.next_deadline(), Instant::now());
        if event::poll(timeout).context("poll event")? {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, view_data, internal_tx, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(state, view_data, mouse),
                _ => {}
            }
        }

        if sequence_rebuilt(&state.tick(Instant::now())) {
            clamp_cursor(state, view_data);
        }
    }
}

/// Wait for input no longer than the pending search deadline.
fn poll_timeout(deadline: Option<Instant>, now: Instant) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).min(POLL_INTERVAL),
        None => POLL_INTERVAL,
    }
}

fn table_body_height(area: Rect) -> u32 {
    u32::from(
        area.height
            .saturating_sub(SEARCH_HEIGHT + STATUS_HEIGHT + TABLE_CHROME),
    )
}

fn process_internal_events(view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_TTL);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn sequence_rebuilt(events: &[GridEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, GridEvent::SequenceRebuilt { .. }))
}

fn handle_key_event<R, T>(
    state: &mut GridState<R>,
    runtime: &mut T,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool
where
    R: Record,
    T: GridRuntime<R>,
{
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.detail_visible {
        view_data.detail_visible = false;
        return false;
    }

    match view_data.mode {
        InputMode::Search => {
            handle_search_key(state, view_data, internal_tx, key);
            false
        }
        InputMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_search_key<R: Record>(
    state: &mut GridState<R>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) => {
            state.dispatch(GridCommand::FlushSearch);
            view_data.mode = InputMode::Nav;
            clamp_cursor(state, view_data);
            let message = format!("{} of {} rows", state.derived_len(), state.records().len());
            emit_status(view_data, internal_tx, message);
        }
        (KeyCode::Esc, _) => {
            state.dispatch(GridCommand::Search(String::new()));
            state.dispatch(GridCommand::FlushSearch);
            view_data.mode = InputMode::Nav;
            clamp_cursor(state, view_data);
            emit_status(view_data, internal_tx, "search cleared");
        }
        (KeyCode::Backspace, _) => {
            let mut text = state.search_input().to_owned();
            text.pop();
            state.dispatch(GridCommand::Search(text));
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            state.dispatch(GridCommand::Search(String::new()));
        }
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let mut text = state.search_input().to_owned();
            text.push(ch);
            state.dispatch(GridCommand::Search(text));
        }
        _ => {}
    }
}

fn handle_nav_key<R, T>(
    state: &mut GridState<R>,
    runtime: &mut T,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool
where
    R: Record,
    T: GridRuntime<R>,
{
    if let Some(command) = table_command_for_key(key) {
        if let TableEvent::Status(status) = apply_table_command(state, view_data, command) {
            emit_status(view_data, internal_tx, status.message());
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => {
            view_data.mode = InputMode::Search;
        }
        KeyCode::Enter | KeyCode::Char('v') => {
            if state.record_at(view_data.cursor_row).is_some() {
                view_data.detail_visible = true;
            } else {
                emit_status(view_data, internal_tx, TableStatus::NoRows.message());
            }
        }
        KeyCode::Char('?') => {
            view_data.help_visible = true;
        }
        KeyCode::Char('e') => {
            let message = export_current(state, runtime);
            emit_status(view_data, internal_tx, message);
        }
        KeyCode::Char('r') => {
            let message = reload_records(state, runtime, view_data);
            emit_status(view_data, internal_tx, message);
        }
        _ => {}
    }
    false
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveHalfPageDown)
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveHalfPageUp)
        }
        (KeyCode::PageDown, _) => Some(TableCommand::MoveFullPageDown),
        (KeyCode::PageUp, _) => Some(TableCommand::MoveFullPageUp),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(TableCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(TableCommand::JumpLastRow),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(TableCommand::ToggleSort),
        (KeyCode::Char('S'), _) => Some(TableCommand::ClearSort),
        (KeyCode::Char(' '), _) => Some(TableCommand::ToggleRow),
        (KeyCode::Char('a'), KeyModifiers::NONE) => Some(TableCommand::ToggleAll),
        (KeyCode::Char('x'), KeyModifiers::NONE) => Some(TableCommand::ClearSelection),
        (KeyCode::Char('f'), KeyModifiers::NONE) => Some(TableCommand::CycleFacet),
        (KeyCode::Char('F'), _) => Some(TableCommand::ClearFacets),
        _ => None,
    }
}

fn apply_table_command<R: Record>(
    state: &mut GridState<R>,
    view_data: &mut ViewData,
    command: TableCommand,
) -> TableEvent {
    let page = page_rows(state);
    match command {
        TableCommand::MoveRow(delta) => {
            move_row(state, view_data, delta);
            TableEvent::CursorUpdated
        }
        TableCommand::MoveColumn(delta) => {
            move_col(state, view_data, delta);
            TableEvent::CursorUpdated
        }
        TableCommand::MoveHalfPageDown => {
            move_row(state, view_data, (page / 2).max(1));
            TableEvent::CursorUpdated
        }
        TableCommand::MoveHalfPageUp => {
            move_row(state, view_data, -(page / 2).max(1));
            TableEvent::CursorUpdated
        }
        TableCommand::MoveFullPageDown => {
            move_row(state, view_data, page);
            TableEvent::CursorUpdated
        }
        TableCommand::MoveFullPageUp => {
            move_row(state, view_data, -page);
            TableEvent::CursorUpdated
        }
        TableCommand::JumpFirstRow => {
            move_row(state, view_data, isize::MIN);
            TableEvent::CursorUpdated
        }
        TableCommand::JumpLastRow => {
            move_row(state, view_data, isize::MAX);
            TableEvent::CursorUpdated
        }
        TableCommand::ToggleSort => TableEvent::Status(toggle_sort(state, view_data)),
        TableCommand::ClearSort => {
            let status = if state.dispatch(GridCommand::ClearSort).is_empty() {
                TableStatus::NoSort
            } else {
                TableStatus::SortCleared
            };
            clamp_cursor(state, view_data);
            TableEvent::Status(status)
        }
        TableCommand::ToggleRow => TableEvent::Status(toggle_row(state, view_data)),
        TableCommand::ToggleAll => {
            if state.derived_len() == 0 {
                return TableEvent::Status(TableStatus::NoRows);
            }
            if state.all_derived_selected() {
                state.dispatch(GridCommand::ToggleAll(false));
                TableEvent::Status(TableStatus::AllUnselected)
            } else {
                state.dispatch(GridCommand::ToggleAll(true));
                TableEvent::Status(TableStatus::AllSelected(state.selected_count()))
            }
        }
        TableCommand::ClearSelection => {
            if state.dispatch(GridCommand::ClearSelection).is_empty() {
                TableEvent::Status(TableStatus::NothingSelected)
            } else {
                TableEvent::Status(TableStatus::SelectionCleared)
            }
        }
        TableCommand::CycleFacet => TableEvent::Status(cycle_facet(state, view_data)),
        TableCommand::ClearFacets => {
            let fields = state
                .params()
                .facets
                .iter()
                .map(|facet| facet.field.clone())
                .collect::<Vec<_>>();
            if fields.is_empty() {
                return TableEvent::Status(TableStatus::NoFacets);
            }
            for field in fields {
                state.dispatch(GridCommand::SetFacet { field, value: None });
            }
            clamp_cursor(state, view_data);
            TableEvent::Status(TableStatus::FacetsCleared)
        }
    }
}

/// Whole rows that fit in the container.
fn page_rows<R: Record>(state: &GridState<R>) -> isize {
    let viewport = state.viewport();
    let rows = u64::from(viewport.container_height) / viewport.effective_row_height();
    isize::try_from(rows).unwrap_or(isize::MAX).max(1)
}

fn move_row<R: Record>(state: &mut GridState<R>, view_data: &mut ViewData, delta: isize) {
    let len = state.derived_len();
    if len == 0 {
        view_data.cursor_row = 0;
        return;
    }
    view_data.cursor_row = view_data.cursor_row.saturating_add_signed(delta).min(len - 1);
    state.dispatch(GridCommand::Reveal(view_data.cursor_row));
}

fn move_col<R: Record>(state: &GridState<R>, view_data: &mut ViewData, delta: isize) {
    let count = state.columns().len();
    if count == 0 {
        view_data.cursor_col = 0;
        return;
    }
    view_data.cursor_col = view_data.cursor_col.saturating_add_signed(delta).min(count - 1);
}

/// Keeps the cursor on a real row after the derived sequence changes.
fn clamp_cursor<R: Record>(state: &mut GridState<R>, view_data: &mut ViewData) {
    let len = state.derived_len();
    if len == 0 {
        view_data.cursor_row = 0;
        return;
    }
    view_data.cursor_row = view_data.cursor_row.min(len - 1);
    state.dispatch(GridCommand::Reveal(view_data.cursor_row));
}

/// Pulls the cursor back inside the viewport after a scroll that did not move it.
fn keep_cursor_in_view<R: Record>(state: &GridState<R>, view_data: &mut ViewData) {
    let len = state.derived_len();
    if len == 0 {
        view_data.cursor_row = 0;
        return;
    }
    let first = state
        .viewport()
        .first_visible_index(state.scroll_top())
        .min(len - 1);
    let rows = usize::try_from(page_rows(state)).unwrap_or(1);
    let last = first.saturating_add(rows - 1).min(len - 1);
    view_data.cursor_row = view_data.cursor_row.clamp(first, last);
}

fn handle_mouse_event<R: Record>(
    state: &mut GridState<R>,
    view_data: &mut ViewData,
    mouse: MouseEvent,
) {
    if view_data.detail_visible || view_data.help_visible {
        return;
    }
    let step = WHEEL_ROWS.saturating_mul(
        i64::try_from(state.viewport().effective_row_height()).unwrap_or(i64::MAX),
    );
    let delta = match mouse.kind {
        MouseEventKind::ScrollDown => step,
        MouseEventKind::ScrollUp => -step,
        _ => return,
    };
    state.dispatch(GridCommand::ScrollBy(delta));
    keep_cursor_in_view(state, view_data);
}

fn toggle_sort<R: Record>(state: &mut GridState<R>, view_data: &mut ViewData) -> TableStatus {
    let Some(column) = state.columns().get(view_data.cursor_col).cloned() else {
        return TableStatus::SortUnavailable(String::new());
    };
    if !column.sortable {
        return TableStatus::SortUnavailable(column.label);
    }

    state.dispatch(GridCommand::ToggleSort(column.key));
    clamp_cursor(state, view_data);
    match state.sort().map(|sort| sort.direction) {
        Some(SortDirection::Asc) => TableStatus::SortAsc(column.label),
        Some(SortDirection::Desc) => TableStatus::SortDesc(column.label),
        None => TableStatus::SortCleared,
    }
}

fn toggle_row<R: Record>(state: &mut GridState<R>, view_data: &ViewData) -> TableStatus {
    let Some(id) = state
        .record_at(view_data.cursor_row)
        .map(|record| record.id())
    else {
        return TableStatus::NoRows;
    };
    let checked = !state.is_selected(&id);
    let label = id.to_string();
    state.dispatch(GridCommand::ToggleRow { id, checked });
    if checked {
        TableStatus::RowSelected(label)
    } else {
        TableStatus::RowUnselected(label)
    }
}

/// Distinct values of `field` across the source records, list fields
/// contributing each element, ordered the way text sorts.
fn facet_values<R: Record>(state: &GridState<R>, field: &str) -> Vec<String> {
    let mut values = Vec::new();
    for record in state.records() {
        match record.field(field) {
            Some(FieldValue::List(items)) => values.extend(items.iter().cloned()),
            Some(value) => values.push(value.display()),
            None => {}
        }
    }
    values.sort_by(|left, right| compare_text(left, right));
    values.dedup_by(|left, right| left.eq_ignore_ascii_case(right));
    values
}

/// Steps the cursor column's facet through its values, then back to off.
fn cycle_facet<R: Record>(state: &mut GridState<R>, view_data: &mut ViewData) -> TableStatus {
    let Some(column) = state.columns().get(view_data.cursor_col).cloned() else {
        return TableStatus::FacetUnavailable(String::new());
    };
    let values = facet_values(state, &column.key);
    if values.is_empty() {
        return TableStatus::FacetUnavailable(column.label);
    }

    let next = match state.facet(&column.key) {
        None => values.first().cloned(),
        Some(current) => values
            .iter()
            .position(|value| value.eq_ignore_ascii_case(current))
            .and_then(|index| values.get(index + 1))
            .cloned(),
    };
    state.dispatch(GridCommand::SetFacet {
        field: column.key,
        value: next.clone(),
    });
    clamp_cursor(state, view_data);
    match next {
        Some(value) => TableStatus::FacetOn {
            label: column.label,
            value,
        },
        None => TableStatus::FacetOff(column.label),
    }
}

/// Exports the selection, or every derived row when nothing is selected.
fn export_current<R, T>(state: &GridState<R>, runtime: &mut T) -> String
where
    R: Record,
    T: GridRuntime<R>,
{
    let records = if state.selected_count() > 0 {
        state.selected_records()
    } else {
        state.derived_records()
    };
    if records.is_empty() {
        return "nothing to export".to_owned();
    }
    match runtime.export_records(state.name(), &records) {
        Ok(path) => format!("exported {} rows to {}", records.len(), path.display()),
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "export failed");
            format!("export failed: {error:#}")
        }
    }
}

fn reload_records<R, T>(state: &mut GridState<R>, runtime: &mut T, view_data: &mut ViewData) -> String
where
    R: Record,
    T: GridRuntime<R>,
{
    match runtime.reload_records() {
        Ok(Some(records)) => {
            let count = records.len();
            state.replace_records(records);
            clamp_cursor(state, view_data);
            format!("reloaded {count} rows")
        }
        Ok(None) => "reload unavailable for built-in data".to_owned(),
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "reload failed");
            format!("reload failed: {error:#}")
        }
    }
}

fn render<R: Record>(frame: &mut ratatui::Frame<'_>, state: &GridState<R>, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SEARCH_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let search_style = match view_data.mode {
        InputMode::Search => Style::default().fg(Color::Cyan),
        InputMode::Nav => Style::default(),
    };
    let search = Paragraph::new(search_text(state, view_data)).block(
        Block::default()
            .title("search")
            .borders(Borders::ALL)
            .border_style(search_style),
    );
    frame.render_widget(search, layout[0]);

    render_table(frame, layout[1], state, view_data);

    let status = Paragraph::new(status_text(view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if view_data.detail_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let detail = Paragraph::new(render_detail_text(state, view_data))
            .block(Block::default().title("row").borders(Borders::ALL));
        frame.render_widget(detail, area);
    }

    if view_data.help_visible {
        let area = centered_rect(64, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn search_text<R: Record>(state: &GridState<R>, view_data: &ViewData) -> String {
    let input = state.search_input();
    let mut text = match view_data.mode {
        InputMode::Search => format!("/{input}▏"),
        InputMode::Nav if input.is_empty() => "press / to search".to_owned(),
        InputMode::Nav => format!("/{input}"),
    };
    if state.next_deadline().is_some() {
        text.push_str(" …");
    }
    text
}

fn render_table<R: Record>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &GridState<R>,
    view_data: &ViewData,
) {
    let rows = window_rows(state);
    let widths = std::iter::once(Constraint::Length(3))
        .chain(
            column_widths(state, &rows)
                .into_iter()
                .map(Constraint::Length),
        )
        .collect::<Vec<_>>();

    let header_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let header_cells = std::iter::once(Cell::from(header_checkbox(state)).style(header_style))
        .chain((0..state.columns().len()).map(|index| {
            let mut style = header_style;
            if index == view_data.cursor_col {
                style = style.fg(Color::Cyan);
            }
            Cell::from(header_label_for_column(state, index)).style(style)
        }));
    let header = Row::new(header_cells);

    let row_height = u16::try_from(state.viewport().effective_row_height()).unwrap_or(u16::MAX);
    let quality_index = state
        .columns()
        .iter()
        .position(|column| column.key == "quality");
    let status_index = state
        .columns()
        .iter()
        .position(|column| column.key == "status");

    let table_rows = rows.iter().map(|row| {
        let cursor_row = row.position == view_data.cursor_row;
        let checkbox = if row.checked { CHECKBOX_ON } else { CHECKBOX_OFF };
        let mut checkbox_style = Style::default();
        if row.checked {
            checkbox_style = checkbox_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        if cursor_row {
            checkbox_style = checkbox_style.bg(Color::DarkGray);
        }

        let cells = row.cells.iter().enumerate().map(|(column_index, text)| {
            let mut style = Style::default();
            if Some(column_index) == quality_index
                && let Some(band) = row.quality
            {
                style = style.fg(quality_color(band));
            }
            if Some(column_index) == status_index
                && let Some(color) = status_color(text)
            {
                style = style.fg(color);
            }
            if cursor_row {
                style = style.bg(Color::DarkGray);
            }
            if cursor_row && column_index == view_data.cursor_col {
                style = Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
            }
            Cell::from(text.clone()).style(style)
        });

        Row::new(std::iter::once(Cell::from(checkbox).style(checkbox_style)).chain(cells))
            .height(row_height)
    });

    let window = state.window();
    let first_visible = state.viewport().first_visible_index(state.scroll_top());
    let mut table_state =
        TableState::default().with_offset(first_visible.saturating_sub(window.start_index));

    let table = Table::new(table_rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state))
                .borders(Borders::ALL),
        );
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Formats only the rows inside the current window.
fn window_rows<R: Record>(state: &GridState<R>) -> Vec<RowView> {
    state
        .visible_rows()
        .into_iter()
        .map(|(position, record)| RowView {
            position,
            checked: state.is_selected(&record.id()),
            cells: state
                .columns()
                .iter()
                .map(|column| {
                    record
                        .field(&column.key)
                        .map(|value| truncate_label(&value.display(), MAX_CELL_WIDTH))
                        .unwrap_or_default()
                })
                .collect(),
            quality: record
                .field("quality")
                .and_then(|value| value.as_number())
                .map(QualityBand::from_score),
        })
        .collect()
}

fn column_widths<R: Record>(state: &GridState<R>, rows: &[RowView]) -> Vec<u16> {
    (0..state.columns().len())
        .map(|index| {
            let header = header_label_for_column(state, index).chars().count();
            let widest = rows
                .iter()
                .filter_map(|row| row.cells.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            let width = header.max(widest).clamp(3, MAX_CELL_WIDTH);
            u16::try_from(width).unwrap_or(u16::MAX)
        })
        .collect()
}

fn header_checkbox<R: Record>(state: &GridState<R>) -> &'static str {
    if state.is_all_selected() {
        CHECKBOX_ON
    } else if state.selected_count() > 0 {
        CHECKBOX_PARTIAL
    } else {
        CHECKBOX_OFF
    }
}

fn header_label_for_column<R: Record>(state: &GridState<R>, column_index: usize) -> String {
    let Some(column) = state.columns().get(column_index) else {
        return String::new();
    };
    let mut label = column.label.clone();
    if let Some(sort) = state.sort()
        && sort.column == column.key
    {
        label.push_str(match sort.direction {
            SortDirection::Asc => " ↑",
            SortDirection::Desc => " ↓",
        });
    }
    if state.facet(&column.key).is_some() {
        label.push(' ');
        label.push_str(FACET_MARK);
    }
    label
}

fn table_title<R: Record>(state: &GridState<R>) -> String {
    let mut title = format!(
        "{} {}/{}",
        state.name(),
        state.derived_len(),
        state.records().len()
    );
    if state.selected_count() > 0 {
        title.push_str(&format!(" | {} selected", state.selected_count()));
    }
    for facet in &state.params().facets {
        title.push_str(&format!(" | {}={}", facet.field, facet.value));
    }
    title
}

fn render_detail_text<R: Record>(state: &GridState<R>, view_data: &ViewData) -> String {
    let Some(record) = state.record_at(view_data.cursor_row) else {
        return TableStatus::NoRows.message();
    };
    let id = record.id();
    let mut lines = vec![format!("id: {id}")];
    for column in state.columns() {
        let value = record
            .field(&column.key)
            .map(|value| value.display())
            .unwrap_or_else(|| "-".to_owned());
        lines.push(format!("{}: {value}", column.label));
    }
    if let Some(band) = record
        .field("quality")
        .and_then(|value| value.as_number())
        .map(QualityBand::from_score)
    {
        lines.push(format!("quality band: {}", band.as_str()));
    }
    let selected = if state.is_selected(&id) { "yes" } else { "no" };
    lines.push(format!("selected: {selected}"));
    lines.push(String::new());
    lines.push("any key closes".to_owned());
    lines.join("\n")
}

fn status_text(view_data: &ViewData) -> String {
    if view_data.detail_visible || view_data.help_visible {
        return String::new();
    }
    let (mode, default) = match view_data.mode {
        InputMode::Nav => (
            "NAV",
            "j/k g/G pg | / search | s/S sort | space a x select | f/F facet | enter row | e export | r reload | ? | q",
        ),
        InputMode::Search => ("SEARCH", "type to filter | enter apply | esc clear | ctrl+u"),
    };
    match &view_data.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn help_overlay_text() -> &'static str {
    "j/k up/down      move row\n\
     h/l left/right   move column\n\
     ctrl+d/ctrl+u    half page\n\
     pgdn/pgup        full page\n\
     g/G              first/last row\n\
     /                search (enter applies, esc clears)\n\
     s                sort column asc, then desc\n\
     S                clear sort\n\
     space            toggle row\n\
     a                toggle all filtered rows\n\
     x                clear selection\n\
     f                cycle column facet\n\
     F                clear facets\n\
     enter/v          row details\n\
     e                export selection or filtered rows\n\
     r                reload data\n\
     q/ctrl+q         quit"
}

fn quality_color(band: QualityBand) -> Color {
    match band {
        QualityBand::High => Color::Green,
        QualityBand::Medium => Color::Yellow,
        QualityBand::Low => Color::Red,
    }
}

fn status_color(value: &str) -> Option<Color> {
    match value.to_ascii_lowercase().as_str() {
        "active" => Some(Color::Green),
        "processing" | "deprecated" => Some(Color::Yellow),
        "error" => Some(Color::Red),
        "archived" => Some(Color::DarkGray),
        _ => None,
    }
}

fn truncate_label(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }
    let mut truncated = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    truncated.push('…');
    truncated
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
