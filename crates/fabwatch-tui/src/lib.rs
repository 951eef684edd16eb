// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use fabwatch_app::{AppCommand, AppEvent, AppState, StatusCategory, StatusCounts, ToolRecord};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const FILTER_MARK_ACTIVE: &str = "▼";
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(5);
const TABLE_HEADERS: [&str; 7] = [
    "ID",
    "Tool",
    "Status",
    "Next Action",
    "Responsible",
    "ETA",
    "Updated",
];

/// One of the three wire operations a key press can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Reload,
    Upload,
    Refresh,
}

impl TransferAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::Upload => "upload",
            Self::Refresh => "refresh",
        }
    }

    /// Replaces the key hint while the transfer is pending.
    pub const fn busy_label(self) -> &'static str {
        match self {
            Self::Reload => "Loading...",
            Self::Upload => "Uploading...",
            Self::Refresh => "Refreshing...",
        }
    }

    pub const fn error_prefix(self) -> &'static str {
        match self {
            Self::Reload => "Error reloading data",
            Self::Upload => "Error uploading file",
            Self::Refresh => "Error refreshing data",
        }
    }
}

/// Work order handed to the runtime when a transfer starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferJob {
    Reload,
    Upload { file_name: String, bytes: Vec<u8> },
    Refresh,
}

impl TransferJob {
    pub const fn action(&self) -> TransferAction {
        match self {
            Self::Reload => TransferAction::Reload,
            Self::Upload { .. } => TransferAction::Upload,
            Self::Refresh => TransferAction::Refresh,
        }
    }
}

/// Application-level result of a settled transfer. `success: false` is a
/// failure the server reported, as opposed to a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub success: bool,
    pub message: String,
    pub tools: Option<Vec<ToolRecord>>,
}

/// Outcome synthesized for a plain refresh, which has no server envelope.
pub fn refresh_outcome(tools: Vec<ToolRecord>) -> TransferOutcome {
    TransferOutcome {
        success: true,
        message: "Data refreshed successfully".to_owned(),
        tools: Some(tools),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Settled {
        request_id: u64,
        action: TransferAction,
        outcome: TransferOutcome,
    },
    Failed {
        request_id: u64,
        action: TransferAction,
        error: String,
    },
}

impl TransferEvent {
    const fn request_id(&self) -> u64 {
        match self {
            Self::Settled { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Transfer(TransferEvent),
}

/// Runtime backing the dashboard. The default `spawn_transfer` runs the
/// job synchronously and posts its completion event; runtimes doing real
/// network work override it to run the job on a worker thread.
pub trait DashboardRuntime {
    fn fetch_tools(&mut self) -> Result<Vec<ToolRecord>>;
    fn reload(&mut self) -> Result<TransferOutcome>;
    fn upload_csv(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<TransferOutcome>;

    fn run_transfer(&mut self, job: TransferJob) -> Result<TransferOutcome> {
        match job {
            TransferJob::Reload => self.reload(),
            TransferJob::Upload { file_name, bytes } => self.upload_csv(&file_name, bytes),
            TransferJob::Refresh => Ok(refresh_outcome(self.fetch_tools()?)),
        }
    }

    fn spawn_transfer(
        &mut self,
        request_id: u64,
        job: TransferJob,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let action = job.action();
        let event = match self.run_transfer(job) {
            Ok(outcome) => TransferEvent::Settled {
                request_id,
                action,
                outcome,
            },
            Err(error) => TransferEvent::Failed {
                request_id,
                action,
                error: error.to_string(),
            },
        };
        tx.send(InternalEvent::Transfer(event))
            .map_err(|_| anyhow::anyhow!("transfer event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlightTransfer {
    request_id: u64,
    action: TransferAction,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct UploadPromptUiState {
    visible: bool,
    input: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    records: Vec<ToolRecord>,
    counts: StatusCounts,
    last_refresh: Option<OffsetDateTime>,
    clock_offset: UtcOffset,
    selected_row: usize,
    status_token: u64,
    next_request_id: u64,
    in_flight: Option<InFlightTransfer>,
    upload_prompt: UploadPromptUiState,
    help_visible: bool,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            counts: StatusCounts::default(),
            last_refresh: None,
            clock_offset: UtcOffset::UTC,
            selected_row: 0,
            status_token: 0,
            next_request_id: 0,
            in_flight: None,
            upload_prompt: UploadPromptUiState::default(),
            help_visible: false,
        }
    }
}

/// Resolves the local UTC offset for display stamps, falling back to UTC.
/// Must run before any thread is spawned; the offset lookup refuses to
/// read the environment once the process is multi-threaded.
pub fn local_clock_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn run_app<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    clock_offset: UtcOffset,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        clock_offset,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    // The table starts empty; one synchronous fetch fills it. A failure
    // leaves it empty behind a notice instead of aborting.
    match runtime.fetch_tools() {
        Ok(tools) => apply_records(state, &mut view_data, tools),
        Err(error) => emit_status(
            state,
            &mut view_data,
            &internal_tx,
            format!("{}: {error}", TransferAction::Refresh.error_prefix()),
        ),
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Transfer(event) => {
                handle_transfer_event(state, view_data, tx, event);
            }
        }
    }
}

fn handle_transfer_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: TransferEvent,
) {
    let Some(in_flight) = view_data.in_flight else {
        return;
    };
    if event.request_id() != in_flight.request_id {
        return;
    }
    view_data.in_flight = None;

    match event {
        TransferEvent::Settled { outcome, .. } => {
            if outcome.success
                && let Some(tools) = outcome.tools
            {
                apply_records(state, view_data, tools);
            }
            emit_status(state, view_data, tx, outcome.message);
        }
        TransferEvent::Failed { action, error, .. } => {
            emit_status(
                state,
                view_data,
                tx,
                format!("{}: {error}", action.error_prefix()),
            );
        }
    }
}

/// Full-replacement render step: swap in the record list, retally the
/// counters over the whole set, and stamp the wall clock. The active
/// filter applies on the next draw since visibility derives from state.
fn apply_records(state: &AppState, view_data: &mut ViewData, tools: Vec<ToolRecord>) {
    view_data.counts = StatusCounts::tally(&tools);
    view_data.records = tools;
    view_data.last_refresh = Some(OffsetDateTime::now_utc().to_offset(view_data.clock_offset));
    clamp_selection(state, view_data);
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Runs a state command and keeps the view consistent with it: selection
/// re-clamps when the filter moved, and any status the command set gets a
/// scheduled clear so it behaves like every other notice.
fn dispatch_and_sync(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::FilterChanged(_)))
    {
        clamp_selection(state, view_data);
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn handle_key_event<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.upload_prompt.visible {
        handle_upload_prompt_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('j') | KeyCode::Down => move_selection(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(state, view_data, -1),
        KeyCode::Char('g') => view_data.selected_row = 0,
        KeyCode::Char('G') => select_last(state, view_data),
        KeyCode::Char('a') | KeyCode::Char('1') => dispatch_and_sync(
            state,
            view_data,
            internal_tx,
            AppCommand::SetFilter(StatusCategory::All),
        ),
        KeyCode::Char('o') | KeyCode::Char('2') => dispatch_and_sync(
            state,
            view_data,
            internal_tx,
            AppCommand::SetFilter(StatusCategory::Operational),
        ),
        KeyCode::Char('m') | KeyCode::Char('3') => dispatch_and_sync(
            state,
            view_data,
            internal_tx,
            AppCommand::SetFilter(StatusCategory::Maintenance),
        ),
        KeyCode::Char('d') | KeyCode::Char('4') => dispatch_and_sync(
            state,
            view_data,
            internal_tx,
            AppCommand::SetFilter(StatusCategory::Down),
        ),
        KeyCode::Char('f') | KeyCode::Tab => {
            dispatch_and_sync(state, view_data, internal_tx, AppCommand::NextFilter);
        }
        KeyCode::Char('b') | KeyCode::BackTab => {
            dispatch_and_sync(state, view_data, internal_tx, AppCommand::PrevFilter);
        }
        KeyCode::Char('r') => {
            begin_transfer(state, runtime, view_data, internal_tx, TransferJob::Reload);
        }
        KeyCode::Char('R') => {
            begin_transfer(state, runtime, view_data, internal_tx, TransferJob::Refresh);
        }
        KeyCode::Char('u') => view_data.upload_prompt.visible = true,
        _ => {}
    }
    false
}

fn handle_upload_prompt_key<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.upload_prompt = UploadPromptUiState::default();
        }
        KeyCode::Enter => submit_upload_prompt(state, runtime, view_data, internal_tx),
        KeyCode::Backspace => {
            view_data.upload_prompt.input.pop();
        }
        KeyCode::Char(ch) => {
            view_data.upload_prompt.input.push(ch);
        }
        _ => {}
    }
}

fn submit_upload_prompt<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let path_text = view_data.upload_prompt.input.trim().to_owned();
    view_data.upload_prompt = UploadPromptUiState::default();
    if path_text.is_empty() {
        // No file picked: close quietly, no request, no notice.
        return;
    }

    let path = Path::new(&path_text);
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{}: {error}", TransferAction::Upload.error_prefix()),
            );
            return;
        }
    };
    let file_name = path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("upload.csv")
        .to_owned();

    begin_transfer(
        state,
        runtime,
        view_data,
        internal_tx,
        TransferJob::Upload { file_name, bytes },
    );
}

fn begin_transfer<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    job: TransferJob,
) {
    let action = job.action();
    if let Some(in_flight) = view_data.in_flight {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("{} already in progress", in_flight.action.label()),
        );
        return;
    }

    view_data.next_request_id = view_data.next_request_id.saturating_add(1);
    let request_id = view_data.next_request_id;
    view_data.in_flight = Some(InFlightTransfer { request_id, action });

    if let Err(error) = runtime.spawn_transfer(request_id, job, internal_tx.clone()) {
        view_data.in_flight = None;
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("{}: {error}", action.error_prefix()),
        );
    }
}

/// Indices of the records visible under the given filter, in record
/// order.
fn visible_indices(records: &[ToolRecord], filter: StatusCategory) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter.matches(&record.current_status))
        .map(|(index, _)| index)
        .collect()
}

fn clamp_selection(state: &AppState, view_data: &mut ViewData) {
    let visible = visible_indices(&view_data.records, state.active_filter).len();
    if visible == 0 {
        view_data.selected_row = 0;
    } else {
        view_data.selected_row = view_data.selected_row.min(visible - 1);
    }
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let visible = visible_indices(&view_data.records, state.active_filter).len();
    if visible == 0 {
        view_data.selected_row = 0;
        return;
    }
    let current = view_data.selected_row.min(visible - 1) as isize;
    view_data.selected_row = (current + delta).clamp(0, visible as isize - 1) as usize;
}

fn select_last(state: &AppState, view_data: &mut ViewData) {
    let visible = visible_indices(&view_data.records, state.active_filter).len();
    view_data.selected_row = visible.saturating_sub(1);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let title = Paragraph::new(title_bar_text(view_data))
        .block(Block::default().title("fabwatch").borders(Borders::ALL));
    frame.render_widget(title, layout[0]);

    render_summary_strip(frame, layout[1], state, view_data);
    render_table(frame, layout[2], state, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.upload_prompt.visible {
        let area = centered_rect(64, 24, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(upload_prompt_text(&view_data.upload_prompt))
            .block(Block::default().title("upload CSV").borders(Borders::ALL));
        frame.render_widget(prompt, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 52, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_summary_strip(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    for (slot, category) in StatusCategory::ALL.into_iter().enumerate() {
        let active = category == state.active_filter;
        let style = if active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let card = Paragraph::new(summary_card_text(category, view_data.counts, active))
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(card, cards[slot]);
    }
}

fn summary_card_text(category: StatusCategory, counts: StatusCounts, active: bool) -> String {
    let text = format!("{} {}", counts.value_for(category), category.label());
    if active {
        format!("{FILTER_MARK_ACTIVE} {text}")
    } else {
        text
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let visible = visible_indices(&view_data.records, state.active_filter);

    let header_cells = TABLE_HEADERS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);

    let rows = visible.iter().enumerate().map(|(visible_index, record_index)| {
        let record = &view_data.records[*record_index];
        let row_style = if visible_index == view_data.selected_row {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(row_cells(record)).style(row_style)
    });

    let widths = [
        Constraint::Length(5),
        Constraint::Min(12),
        Constraint::Min(10),
        Constraint::Min(12),
        Constraint::Min(10),
        Constraint::Min(6),
        Constraint::Min(12),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(table_title(state, view_data)),
    );
    frame.render_widget(table, area);
}

fn row_cells(record: &ToolRecord) -> Vec<Cell<'static>> {
    vec![
        Cell::from(record.id.get().to_string()),
        Cell::from(sanitize_cell(&record.mfg_tool_name)),
        Cell::from(sanitize_cell(&record.current_status))
            .style(badge_style(&record.current_status)),
        Cell::from(sanitize_cell(&record.next_action)),
        Cell::from(sanitize_cell(&record.responsible_party)),
        Cell::from(sanitize_cell(&record.eta)),
        Cell::from(sanitize_cell(&record.last_updated)),
    ]
}

fn table_title(state: &AppState, view_data: &ViewData) -> String {
    let visible = visible_indices(&view_data.records, state.active_filter).len();
    let mut parts = vec![format!("tools {visible}/{}", view_data.records.len())];
    if state.active_filter != StatusCategory::All {
        parts.push(format!(
            "{FILTER_MARK_ACTIVE} {}",
            state.active_filter.as_str()
        ));
    }
    parts.join(" | ")
}

fn title_bar_text(view_data: &ViewData) -> String {
    match view_data.last_refresh {
        Some(stamp) => format!("last updated: {}", format_last_refresh(stamp)),
        None => "last updated: --".to_owned(),
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    // Overlays suppress the status/keybinding bar.
    if view_data.help_visible || view_data.upload_prompt.visible {
        return String::new();
    }

    let reload = transfer_hint(view_data, TransferAction::Reload, "r reload");
    let upload = transfer_hint(view_data, TransferAction::Upload, "u upload");
    let refresh = transfer_hint(view_data, TransferAction::Refresh, "R refresh");
    let default = format!(
        "j/k rows | a/o/m/d filter | f/b cycle | {reload} | {upload} | {refresh} | ? help | ctrl+q"
    );

    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default,
    }
}

fn transfer_hint(view_data: &ViewData, action: TransferAction, idle: &'static str) -> String {
    match view_data.in_flight {
        Some(in_flight) if in_flight.action == action => in_flight.action.busy_label().to_owned(),
        _ => idle.to_owned(),
    }
}

fn upload_prompt_text(prompt: &UploadPromptUiState) -> String {
    format!(
        "path to a replacement CSV:\n> {}\n\nenter send | esc cancel",
        prompt.input
    )
}

fn help_overlay_text() -> &'static str {
    "filters: a all | o operational | m maintenance | d down/idle | 1-4 direct | f/b or tab cycle\n\
data: r reload server CSV | u upload replacement CSV | R refresh from server\n\
nav: j/k or arrows move | g/G first/last\n\
upload prompt: type a .csv path | enter send | esc cancel\n\
global: ? toggle help | q or ctrl+q quit"
}

/// Style lookup key for a status badge: lowercased, internal whitespace
/// collapsed to single hyphens.
fn badge_style_key(status: &str) -> String {
    status
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn badge_style(status: &str) -> Style {
    let key = badge_style_key(status);
    match key.as_str() {
        "operational" => Style::default().fg(Color::Green),
        "down" => Style::default().fg(Color::Red),
        "idle" => Style::default().fg(Color::Yellow),
        "under-repair" | "scheduled-maintenance" | "preventive-maintenance" => {
            Style::default().fg(Color::Yellow)
        }
        _ => match StatusCategory::classify(status) {
            Some(StatusCategory::Operational) => Style::default().fg(Color::Green),
            Some(StatusCategory::Maintenance) => Style::default().fg(Color::Yellow),
            Some(StatusCategory::Down) => Style::default().fg(Color::Red),
            _ => Style::default().fg(Color::Gray),
        },
    }
}

/// Record text is data, never terminal input: control bytes (including
/// escape introducers) become spaces so a hostile cell cannot move the
/// cursor or restyle the screen. Printable markup stays literal.
fn sanitize_cell(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

fn format_last_refresh(stamp: OffsetDateTime) -> String {
    stamp
        .format(&format_description!(
            "[month repr:short] [day padding:none], [year], [hour repr:12]:[minute]:[second] [period]"
        ))
        .unwrap_or_else(|_| stamp.to_string())
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

#[cfg(test)]
mod tests {
    use super::{
        DashboardRuntime, InFlightTransfer, InternalEvent, TransferAction, TransferEvent,
        TransferJob, TransferOutcome, UploadPromptUiState, ViewData, apply_records, badge_style_key,
        begin_transfer, clamp_selection, format_last_refresh, handle_key_event, sanitize_cell,
        status_text, summary_card_text, table_title, visible_indices,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use fabwatch_app::{AppCommand, AppState, StatusCategory, StatusCounts, ToolId, ToolRecord};
    use std::io::Write;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        tools: Vec<ToolRecord>,
        fetch_error: Option<String>,
        reload_outcome: Option<TransferOutcome>,
        reload_error: Option<String>,
        upload_outcome: Option<TransferOutcome>,
        upload_error: Option<String>,
        fetch_calls: usize,
        reload_calls: usize,
        upload_calls: usize,
        last_upload: Option<(String, Vec<u8>)>,
    }

    impl DashboardRuntime for TestRuntime {
        fn fetch_tools(&mut self) -> anyhow::Result<Vec<ToolRecord>> {
            self.fetch_calls += 1;
            if let Some(error) = self.fetch_error.take() {
                return Err(anyhow::anyhow!("{error}"));
            }
            Ok(self.tools.clone())
        }

        fn reload(&mut self) -> anyhow::Result<TransferOutcome> {
            self.reload_calls += 1;
            if let Some(error) = self.reload_error.take() {
                return Err(anyhow::anyhow!("{error}"));
            }
            Ok(self.reload_outcome.clone().unwrap_or(TransferOutcome {
                success: true,
                message: "Successfully loaded 0 tools from CSV".to_owned(),
                tools: Some(Vec::new()),
            }))
        }

        fn upload_csv(&mut self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<TransferOutcome> {
            self.upload_calls += 1;
            self.last_upload = Some((file_name.to_owned(), bytes));
            if let Some(error) = self.upload_error.take() {
                return Err(anyhow::anyhow!("{error}"));
            }
            Ok(self.upload_outcome.clone().unwrap_or(TransferOutcome {
                success: true,
                message: "Successfully loaded 0 tools from uploaded CSV".to_owned(),
                tools: Some(Vec::new()),
            }))
        }
    }

    fn sample_tool(id: i64, status: &str) -> ToolRecord {
        ToolRecord {
            id: ToolId::new(id),
            mfg_tool_name: format!("Tool {id}"),
            current_status: status.to_owned(),
            next_action: "None".to_owned(),
            responsible_party: "Ops".to_owned(),
            eta: "N/A".to_owned(),
            last_updated: "2026-08-20 09:00:00".to_owned(),
        }
    }

    fn sample_fleet() -> Vec<ToolRecord> {
        vec![
            sample_tool(1, "Operational"),
            sample_tool(2, "Under Repair"),
            sample_tool(3, "Down"),
            sample_tool(4, "Idle"),
            sample_tool(5, "Qualification"),
        ]
    }

    fn internal_channel() -> (
        mpsc::Sender<InternalEvent>,
        mpsc::Receiver<InternalEvent>,
    ) {
        mpsc::channel()
    }

    fn pump_internal(
        state: &mut AppState,
        view_data: &mut ViewData,
        tx: &mpsc::Sender<InternalEvent>,
        rx: &mpsc::Receiver<InternalEvent>,
    ) {
        super::process_internal_events(state, view_data, tx, rx);
    }

    fn press(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &mpsc::Sender<InternalEvent>,
        code: KeyCode,
    ) -> bool {
        handle_key_event(
            state,
            runtime,
            view_data,
            tx,
            KeyEvent::new(code, KeyModifiers::NONE),
        )
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &mpsc::Sender<InternalEvent>,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, runtime, view_data, tx, KeyCode::Char(ch));
        }
    }

    #[test]
    fn filter_keys_select_categories_and_announce_them() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('o'));
        assert_eq!(state.active_filter, StatusCategory::Operational);
        assert_eq!(
            state.status_line.as_deref(),
            Some("Showing operational tools only")
        );

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('1'));
        assert_eq!(state.active_filter, StatusCategory::All);
        assert_eq!(state.status_line.as_deref(), Some("Showing all tools"));
    }

    #[test]
    fn filter_cycle_keys_wrap_both_directions() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('b'));
        assert_eq!(state.active_filter, StatusCategory::Down);

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('f'));
        assert_eq!(state.active_filter, StatusCategory::All);
    }

    #[test]
    fn visible_rows_follow_the_active_filter() {
        let records = sample_fleet();

        assert_eq!(
            visible_indices(&records, StatusCategory::All),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(
            visible_indices(&records, StatusCategory::Operational),
            vec![0]
        );
        assert_eq!(
            visible_indices(&records, StatusCategory::Maintenance),
            vec![1]
        );
        assert_eq!(visible_indices(&records, StatusCategory::Down), vec![2, 3]);
    }

    #[test]
    fn reapplying_a_filter_leaves_the_visible_set_unchanged() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('m'));
        let first = visible_indices(&view_data.records, state.active_filter);
        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('m'));
        let second = visible_indices(&view_data.records, state.active_filter);

        assert_eq!(first, second);
        assert_eq!(first, vec![1]);
    }

    #[test]
    fn counters_cover_the_full_set_regardless_of_filter() {
        let mut state = AppState::default();
        let mut view_data = ViewData::default();
        apply_records(&state, &mut view_data, sample_fleet());

        let expected = StatusCounts {
            total: 5,
            operational: 1,
            maintenance: 1,
            down: 2,
        };
        assert_eq!(view_data.counts, expected);

        state.dispatch(AppCommand::SetFilter(StatusCategory::Down));
        clamp_selection(&state, &mut view_data);
        assert_eq!(view_data.counts, expected);
    }

    #[test]
    fn rendering_the_same_records_twice_is_stable() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetFilter(StatusCategory::Maintenance));
        let mut view_data = ViewData::default();

        apply_records(&state, &mut view_data, sample_fleet());
        let counts_first = view_data.counts;
        let visible_first = visible_indices(&view_data.records, state.active_filter);

        apply_records(&state, &mut view_data, sample_fleet());
        assert_eq!(view_data.counts, counts_first);
        assert_eq!(
            visible_indices(&view_data.records, state.active_filter),
            visible_first
        );
    }

    #[test]
    fn empty_record_set_renders_zero_rows_and_counters() {
        let state = AppState::default();
        let mut view_data = ViewData::default();
        apply_records(&state, &mut view_data, Vec::new());

        assert_eq!(view_data.counts, StatusCounts::default());
        assert!(visible_indices(&view_data.records, state.active_filter).is_empty());
        assert_eq!(view_data.selected_row, 0);
        assert!(view_data.last_refresh.is_some());
    }

    #[test]
    fn refresh_stamp_carries_the_configured_clock_offset() {
        let offset = time::UtcOffset::from_hms(9, 0, 0).expect("valid offset");
        let state = AppState::default();
        let mut view_data = ViewData {
            clock_offset: offset,
            ..ViewData::default()
        };

        apply_records(&state, &mut view_data, sample_fleet());

        let stamp = view_data.last_refresh.expect("stamp should be set");
        assert_eq!(stamp.offset(), offset);
    }

    #[test]
    fn reload_success_renders_returned_records_and_server_message() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            reload_outcome: Some(TransferOutcome {
                success: true,
                message: "Successfully loaded 2 tools from CSV".to_owned(),
                tools: Some(vec![
                    sample_tool(10, "Operational"),
                    sample_tool(11, "Down"),
                ]),
            }),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('r'));
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(runtime.reload_calls, 1);
        assert_eq!(view_data.records.len(), 2);
        assert_eq!(view_data.counts.total, 2);
        assert_eq!(view_data.in_flight, None);
        assert_eq!(
            state.status_line.as_deref(),
            Some("Successfully loaded 2 tools from CSV")
        );
    }

    #[test]
    fn reload_failure_envelope_keeps_table_and_shows_server_message() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            reload_outcome: Some(TransferOutcome {
                success: false,
                message: "File not found".to_owned(),
                tools: None,
            }),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());
        let records_before = view_data.records.clone();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('r'));
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(view_data.records, records_before);
        assert_eq!(state.status_line.as_deref(), Some("File not found"));
        assert_eq!(view_data.in_flight, None);
    }

    #[test]
    fn reload_transport_failure_reports_reason_and_keeps_table() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            reload_error: Some("cannot reach http://127.0.0.1:5000".to_owned()),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());
        let records_before = view_data.records.clone();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('r'));
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(view_data.records, records_before);
        assert_eq!(
            state.status_line.as_deref(),
            Some("Error reloading data: cannot reach http://127.0.0.1:5000")
        );
    }

    #[test]
    fn transfer_keys_are_rejected_while_one_is_in_flight() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData {
            in_flight: Some(InFlightTransfer {
                request_id: 9,
                action: TransferAction::Upload,
            }),
            ..ViewData::default()
        };
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('r'));

        assert_eq!(runtime.reload_calls, 0);
        assert_eq!(state.status_line.as_deref(), Some("upload already in progress"));
        assert_eq!(
            view_data.in_flight,
            Some(InFlightTransfer {
                request_id: 9,
                action: TransferAction::Upload,
            })
        );
    }

    #[test]
    fn stale_transfer_completions_are_dropped() {
        let mut state = AppState::default();
        let mut view_data = ViewData {
            in_flight: Some(InFlightTransfer {
                request_id: 7,
                action: TransferAction::Reload,
            }),
            ..ViewData::default()
        };
        let (tx, rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());
        let records_before = view_data.records.clone();

        tx.send(InternalEvent::Transfer(TransferEvent::Settled {
            request_id: 3,
            action: TransferAction::Reload,
            outcome: TransferOutcome {
                success: true,
                message: "stale".to_owned(),
                tools: Some(Vec::new()),
            },
        }))
        .expect("send stale completion");
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(view_data.records, records_before);
        assert_eq!(state.status_line, None);
        assert!(view_data.in_flight.is_some());
    }

    #[test]
    fn refresh_key_renders_and_shows_generic_success_notice() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            tools: sample_fleet(),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('R'));
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(runtime.fetch_calls, 1);
        assert_eq!(view_data.records.len(), 5);
        assert_eq!(
            state.status_line.as_deref(),
            Some("Data refreshed successfully")
        );
    }

    #[test]
    fn refresh_transport_failure_keeps_rows_and_reports_reason() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            fetch_error: Some("request timed out".to_owned()),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('R'));
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(view_data.records.len(), 5);
        assert_eq!(
            state.status_line.as_deref(),
            Some("Error refreshing data: request timed out")
        );
    }

    #[test]
    fn empty_upload_prompt_submit_is_a_silent_noop() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());
        state.status_line = None;
        let records_before = view_data.records.clone();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('u'));
        assert!(view_data.upload_prompt.visible);
        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Enter);
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert!(!view_data.upload_prompt.visible);
        assert_eq!(runtime.upload_calls, 0);
        assert_eq!(state.status_line, None);
        assert_eq!(view_data.records, records_before);
        assert_eq!(view_data.in_flight, None);
    }

    #[test]
    fn upload_prompt_esc_cancels_and_discards_input() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('u'));
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "/tmp/x.csv");
        assert_eq!(view_data.upload_prompt.input, "/tmp/x.csv");

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Esc);
        assert_eq!(view_data.upload_prompt, UploadPromptUiState::default());
        assert_eq!(runtime.upload_calls, 0);
    }

    #[test]
    fn upload_reads_the_file_and_clears_the_prompt() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("tools.csv");
        let mut file = std::fs::File::create(&path).expect("create csv");
        file.write_all(b"MFGToolName,CurrentStatus\nEtcher,Down\n")
            .expect("write csv");

        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            upload_outcome: Some(TransferOutcome {
                success: true,
                message: "Successfully loaded 1 tools from uploaded CSV".to_owned(),
                tools: Some(vec![sample_tool(1, "Down")]),
            }),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('u'));
        type_text(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            path.to_str().expect("utf-8 temp path"),
        );
        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Enter);
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(runtime.upload_calls, 1);
        let (file_name, bytes) = runtime.last_upload.expect("upload should run");
        assert_eq!(file_name, "tools.csv");
        assert_eq!(bytes, b"MFGToolName,CurrentStatus\nEtcher,Down\n");
        assert_eq!(view_data.upload_prompt, UploadPromptUiState::default());
        assert_eq!(view_data.records.len(), 1);
        assert_eq!(
            state.status_line.as_deref(),
            Some("Successfully loaded 1 tools from uploaded CSV")
        );
    }

    #[test]
    fn upload_with_unreadable_path_reports_error_without_network_call() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('u'));
        type_text(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            "/no/such/fabwatch-upload.csv",
        );
        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Enter);

        assert_eq!(runtime.upload_calls, 0);
        let status = state.status_line.expect("error notice expected");
        assert!(status.starts_with("Error uploading file: "), "got {status}");
        assert_eq!(view_data.upload_prompt, UploadPromptUiState::default());
    }

    #[test]
    fn upload_failure_envelope_clears_prompt_and_keeps_table() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "not,a,tool,sheet\n").expect("write csv");

        let mut state = AppState::default();
        let mut runtime = TestRuntime {
            upload_outcome: Some(TransferOutcome {
                success: false,
                message: "File must be a CSV".to_owned(),
                tools: None,
            }),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());
        let records_before = view_data.records.clone();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('u'));
        type_text(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            path.to_str().expect("utf-8 temp path"),
        );
        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Enter);
        pump_internal(&mut state, &mut view_data, &tx, &rx);

        assert_eq!(view_data.records, records_before);
        assert_eq!(state.status_line.as_deref(), Some("File must be a CSV"));
        assert_eq!(view_data.upload_prompt, UploadPromptUiState::default());
    }

    #[test]
    fn notice_clear_ignores_stale_tokens() {
        let mut state = AppState::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        super::emit_status(&mut state, &mut view_data, &tx, "first");
        let stale_token = view_data.status_token;
        super::emit_status(&mut state, &mut view_data, &tx, "second");

        tx.send(InternalEvent::ClearStatus { token: stale_token })
            .expect("send stale clear");
        pump_internal(&mut state, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line.as_deref(), Some("second"));

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token,
        })
        .expect("send current clear");
        pump_internal(&mut state, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn filter_notices_participate_in_token_scheme() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('d'));
        assert!(view_data.status_token > 0);

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token,
        })
        .expect("send clear");
        pump_internal(&mut state, &mut view_data, &tx, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn sanitize_keeps_markup_literal_and_neutralizes_control_bytes() {
        assert_eq!(sanitize_cell("<script>x</script>"), "<script>x</script>");
        assert_eq!(sanitize_cell("\u{1b}[31mred"), " [31mred");
        assert_eq!(sanitize_cell("a\tb\nc"), "a b c");
        assert_eq!(sanitize_cell("Etcher & Co <1>"), "Etcher & Co <1>");
    }

    #[test]
    fn badge_style_key_lowercases_and_collapses_whitespace() {
        assert_eq!(badge_style_key("Operational"), "operational");
        assert_eq!(badge_style_key("Under  Repair"), "under-repair");
        assert_eq!(badge_style_key("Scheduled Maintenance"), "scheduled-maintenance");
        assert_eq!(badge_style_key(" Down "), "down");
    }

    #[test]
    fn summary_cards_mark_exactly_one_filter_active() {
        let counts = StatusCounts {
            total: 5,
            operational: 1,
            maintenance: 1,
            down: 2,
        };

        for active_filter in StatusCategory::ALL {
            let marked = StatusCategory::ALL
                .into_iter()
                .filter(|category| {
                    summary_card_text(*category, counts, *category == active_filter)
                        .starts_with(super::FILTER_MARK_ACTIVE)
                })
                .count();
            assert_eq!(marked, 1);
        }
    }

    #[test]
    fn summary_card_text_pairs_count_with_label() {
        let counts = StatusCounts {
            total: 12,
            operational: 7,
            maintenance: 3,
            down: 2,
        };
        assert_eq!(summary_card_text(StatusCategory::All, counts, false), "12 total");
        assert_eq!(
            summary_card_text(StatusCategory::Down, counts, true),
            "▼ 2 down/idle"
        );
    }

    #[test]
    fn table_title_reports_visible_share_and_filter() {
        let mut state = AppState::default();
        let mut view_data = ViewData::default();
        apply_records(&state, &mut view_data, sample_fleet());
        assert_eq!(table_title(&state, &view_data), "tools 5/5");

        state.dispatch(AppCommand::SetFilter(StatusCategory::Maintenance));
        assert_eq!(table_title(&state, &view_data), "tools 1/5 | ▼ maintenance");
    }

    #[test]
    fn status_bar_substitutes_busy_labels_while_in_flight() {
        let state = AppState::default();
        let idle = ViewData::default();
        let idle_text = status_text(&state, &idle);
        assert!(idle_text.contains("r reload"));
        assert!(idle_text.contains("u upload"));

        let busy = ViewData {
            in_flight: Some(InFlightTransfer {
                request_id: 1,
                action: TransferAction::Upload,
            }),
            ..ViewData::default()
        };
        let busy_text = status_text(&state, &busy);
        assert!(busy_text.contains("Uploading..."));
        assert!(!busy_text.contains("u upload"));
        assert!(busy_text.contains("r reload"));
    }

    #[test]
    fn status_bar_hides_behind_overlays() {
        let state = AppState::default();
        let view_data = ViewData {
            help_visible: true,
            ..ViewData::default()
        };
        assert_eq!(status_text(&state, &view_data), "");
    }

    #[test]
    fn selection_moves_within_visible_rows_and_clamps() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();
        apply_records(&state, &mut view_data, sample_fleet());

        for _ in 0..10 {
            press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('j'));
        }
        assert_eq!(view_data.selected_row, 4);

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('d'));
        assert_eq!(view_data.selected_row, 1);

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('g'));
        assert_eq!(view_data.selected_row, 0);

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('G'));
        assert_eq!(view_data.selected_row, 1);
    }

    #[test]
    fn help_overlay_swallows_keys_until_dismissed() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('?'));
        assert!(view_data.help_visible);

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('r'));
        assert_eq!(runtime.reload_calls, 0);

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Esc);
        assert!(!view_data.help_visible);
    }

    #[test]
    fn quit_keys_exit_but_prompt_text_does_not() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        assert!(press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        ));

        press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('u'));
        assert!(!press(&mut state, &mut runtime, &mut view_data, &tx, KeyCode::Char('q')));
        assert_eq!(view_data.upload_prompt.input, "q");
    }

    #[test]
    fn begin_transfer_assigns_monotonic_request_ids() {
        let mut state = AppState::default();
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = internal_channel();

        begin_transfer(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            TransferJob::Refresh,
        );
        pump_internal(&mut state, &mut view_data, &tx, &rx);
        begin_transfer(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            TransferJob::Refresh,
        );

        assert_eq!(view_data.next_request_id, 2);
        assert_eq!(
            view_data.in_flight,
            Some(InFlightTransfer {
                request_id: 2,
                action: TransferAction::Refresh,
            })
        );
    }

    #[test]
    fn last_refresh_formats_with_seconds_precision() {
        let stamp = time::macros::datetime!(2026-08-23 14:11:09 UTC);
        assert_eq!(format_last_refresh(stamp), "Aug 23, 2026, 02:11:09 PM");

        let morning = time::macros::datetime!(2026-01-05 09:03:07 UTC);
        assert_eq!(format_last_refresh(morning), "Jan 5, 2026, 09:03:07 AM");
    }
}
