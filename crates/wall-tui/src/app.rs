//! App: terminal event loop for the wall.
//!
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks
//!   (terminal input, the core's broadcast stream).
//! - The loop draws a frame whenever something changed, then awaits the next message.
//! - Key and mouse handlers return `Vec<Action>`; `apply_action` carries them out.
//! - Commands to the wall core flow out through `event_tx`.

use std::io;
use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use wall_core::{BroadcastMessage, SharedState, WallEvent};
use wall_proto::protocol::{Command, TileSnapshot, WallState, TILE_COUNT};
use wall_proto::{normalize, VideoId};

use crate::action::Action;
use crate::theme::C_BG;
use crate::ui;
use crate::widgets::source_input::{EditOutcome, SourceInput};
use crate::widgets::toast::{Severity, ToastManager};

enum AppMessage {
    Event(Event),
    StateUpdated(WallState),
    Notice { tile: Option<usize>, message: String },
}

pub struct App {
    event_tx: mpsc::Sender<WallEvent>,
    shared: SharedState,
    state: WallState,
    columns: u16,
    selected: usize,
    show_help: bool,
    should_quit: bool,
    editor: SourceInput,
    toasts: ToastManager,
    /// Tile rectangles from the last frame, for mouse hit-testing.
    tile_areas: Vec<Rect>,
    last_notice: Option<(DateTime<Local>, String)>,
}

impl App {
    pub fn new(event_tx: mpsc::Sender<WallEvent>, shared: SharedState, columns: u16) -> Self {
        let mut toasts = ToastManager::new();
        toasts.spinner("Loading SDK…");
        Self {
            event_tx,
            shared,
            state: WallState::default(),
            columns: columns.max(1),
            selected: 0,
            show_help: false,
            should_quit: false,
            editor: SourceInput::new(),
            toasts,
            tile_areas: Vec::new(),
            last_notice: None,
        }
    }

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // The core may have published before we subscribed.
        self.state = self.shared.get_state().await;
        self.sync_spinner();

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: broadcast receiver (WallCore → AppMessage) ──────
        let bc_tx = tx.clone();
        let bc_shared = self.shared.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        let app_msg = match msg {
                            BroadcastMessage::StateUpdated => {
                                AppMessage::StateUpdated(bc_shared.get_state().await)
                            }
                            BroadcastMessage::Notice { tile, message } => {
                                AppMessage::Notice { tile, message }
                            }
                        };
                        if bc_tx.send(app_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // Toast expiry + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                }
                _ = toast_tick.tick() => {
                    if !self.toasts.is_empty() {
                        self.toasts.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("TUI closed");

        Ok(())
    }

    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => {
                let actions = match ev {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => return true,
                    _ => return false,
                };
                for action in actions {
                    self.apply_action(action).await;
                }
                true
            }
            AppMessage::StateUpdated(state) => {
                // Broadcasts can overtake each other through the shared read.
                if state.rev >= self.state.rev {
                    self.state = state;
                    self.sync_spinner();
                }
                true
            }
            AppMessage::Notice { tile, message } => {
                match tile {
                    Some(_) => self.toasts.warning(message.clone()),
                    None => self.toasts.info(message.clone()),
                }
                self.last_notice = Some((Local::now(), message));
                true
            }
        }
    }

    fn sync_spinner(&mut self) {
        if self.state.sdk_ready && self.toasts.has_spinner() {
            self.toasts.resolve_spinner(Severity::Success, "players can load");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if let Some(tile) = self.editor.tile() {
            return match self.editor.handle_key(key) {
                EditOutcome::Commit(reference) => vec![Action::CommitSource { tile, reference }],
                EditOutcome::Cancel => vec![Action::CancelEdit],
                EditOutcome::Editing => vec![],
            };
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Action::Quit];
        }

        if let KeyCode::Char(c) = key.code {
            if let Some(tile) = focus_key(c) {
                return vec![Action::Send(Command::Focus { tile })];
            }
        }

        let tile = self.selected;
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => vec![Action::Move { dx: -1, dy: 0 }],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::Move { dx: 1, dy: 0 }],
            KeyCode::Up | KeyCode::Char('k') => vec![Action::Move { dx: 0, dy: -1 }],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::Move { dx: 0, dy: 1 }],
            KeyCode::Tab => vec![Action::SelectNext],
            KeyCode::BackTab => vec![Action::SelectPrev],
            KeyCode::Enter | KeyCode::Char('o') => vec![Action::Send(Command::Load { tile })],
            KeyCode::Char('r') => vec![Action::Send(Command::Reload { tile })],
            KeyCode::Char('L') => vec![Action::Send(Command::LoadAll)],
            KeyCode::Char('m') => vec![Action::Send(Command::MuteAll)],
            KeyCode::Char('p') => vec![Action::Send(Command::PauseAll)],
            KeyCode::Char('P') => vec![Action::Send(Command::PlayAllMuted)],
            KeyCode::Char('e') => vec![Action::EditSource],
            KeyCode::Char('y') => vec![Action::CopyWatchUrl],
            KeyCode::Char('?') => vec![Action::ToggleHelp],
            KeyCode::Char('q') => vec![Action::Quit],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return vec![];
        }
        let (col, row) = (event.column, event.row);
        let Some(tile) = self
            .tile_areas
            .iter()
            .position(|area| ui::hit(*area, col, row))
        else {
            return vec![];
        };
        if ui::hit(ui::reload_button(self.tile_areas[tile]), col, row) {
            vec![Action::Select(tile), Action::Send(Command::Reload { tile })]
        } else {
            vec![Action::Select(tile), Action::Send(Command::Focus { tile })]
        }
    }

    async fn apply_action(&mut self, action: Action) {
        debug!("apply_action: {:?}", action);
        match action {
            Action::Send(cmd) => self.send_cmd(cmd).await,
            Action::Move { dx, dy } => {
                self.selected = move_selection(self.selected, dx, dy, self.columns, TILE_COUNT);
            }
            Action::SelectNext => self.selected = (self.selected + 1) % TILE_COUNT,
            Action::SelectPrev => self.selected = (self.selected + TILE_COUNT - 1) % TILE_COUNT,
            Action::Select(tile) => {
                if tile < TILE_COUNT {
                    self.selected = tile;
                }
            }
            Action::EditSource => {
                let current = self.tile_snapshot(self.selected).source;
                self.editor.open(self.selected, &current);
            }
            Action::CommitSource { tile, reference } => {
                self.send_cmd(Command::SetSource { tile, reference }).await;
                self.toasts.success(format!("tile {} source saved", tile + 1));
            }
            Action::CancelEdit => self.editor.close(),
            Action::CopyWatchUrl => self.copy_watch_url(),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Quit => self.should_quit = true,
        }
    }

    fn copy_watch_url(&mut self) {
        let tile = self.tile_snapshot(self.selected);
        let id = tile
            .video_id
            .as_deref()
            .and_then(VideoId::parse)
            .or_else(|| normalize(&tile.source));
        let Some(id) = id else {
            self.toasts
                .warning(format!("tile {}: nothing to copy", tile.index + 1));
            return;
        };
        let url = id.watch_url();
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url.clone())) {
            Ok(()) => self.toasts.success(format!("copied {}", url)),
            Err(e) => {
                warn!("clipboard unavailable: {}", e);
                self.toasts.error("clipboard unavailable");
            }
        }
    }

    fn tile_snapshot(&self, tile: usize) -> TileSnapshot {
        self.state.tile(tile).cloned().unwrap_or(TileSnapshot {
            index: tile,
            ..TileSnapshot::default()
        })
    }

    async fn send_cmd(&self, cmd: Command) {
        let _ = self.event_tx.send(WallEvent::ClientCommand(cmd)).await;
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        ui::draw_header(frame, rows[0], &self.state);

        self.tile_areas = ui::tile_grid(rows[1], TILE_COUNT, self.columns);
        for (i, cell) in self.tile_areas.iter().enumerate() {
            let tile = self.tile_snapshot(i);
            ui::draw_tile(
                frame,
                *cell,
                &tile,
                i == self.selected,
                self.state.active == Some(i),
            );
        }

        if self.editor.tile().is_some() {
            self.editor.draw(frame, rows[2]);
        } else {
            let notice = self
                .last_notice
                .as_ref()
                .map(|(at, msg)| format!("{} {}", at.format("%H:%M:%S"), msg));
            ui::draw_footer(frame, rows[2], self.show_help, notice.as_deref());
        }

        self.toasts.draw(frame, area);
    }
}

/// Digit keys `1`..`N` map to zero-based tiles.
pub fn focus_key(c: char) -> Option<usize> {
    let n = c.to_digit(10)? as usize;
    (1..=TILE_COUNT).contains(&n).then(|| n - 1)
}

/// Move a row-major grid selection, staying on the grid.
pub fn move_selection(selected: usize, dx: i32, dy: i32, columns: u16, count: usize) -> usize {
    let columns = i32::from(columns.max(1));
    let count = count as i32;
    let col = (selected as i32 % columns + dx).clamp(0, columns - 1);
    let row = selected as i32 / columns + dy;
    let rows = (count + columns - 1) / columns;
    let row = row.clamp(0, rows - 1);
    (row * columns + col).clamp(0, count - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (App, mpsc::Receiver<WallEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (App::new(tx, SharedState::new(), 3), rx)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digit_keys_focus_tiles() {
        assert_eq!(focus_key('1'), Some(0));
        assert_eq!(focus_key('6'), Some(5));
        assert_eq!(focus_key('0'), None);
        assert_eq!(focus_key('7'), None);
        assert_eq!(focus_key('x'), None);

        let (mut app, _rx) = app();
        assert_eq!(
            app.handle_key(press(KeyCode::Char('5'))),
            vec![Action::Send(Command::Focus { tile: 4 })]
        );
    }

    #[test]
    fn load_keys_target_the_selection() {
        let (mut app, _rx) = app();
        app.selected = 2;
        assert_eq!(
            app.handle_key(press(KeyCode::Enter)),
            vec![Action::Send(Command::Load { tile: 2 })]
        );
        assert_eq!(
            app.handle_key(press(KeyCode::Char('r'))),
            vec![Action::Send(Command::Reload { tile: 2 })]
        );
        assert_eq!(
            app.handle_key(press(KeyCode::Char('L'))),
            vec![Action::Send(Command::LoadAll)]
        );
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            vec![Action::Quit]
        );
    }

    #[test]
    fn editor_swallows_keys_until_enter() {
        let (mut app, _rx) = app();
        app.editor.open(1, "");
        assert!(app.handle_key(press(KeyCode::Char('q'))).is_empty());
        assert_eq!(
            app.handle_key(press(KeyCode::Enter)),
            vec![Action::CommitSource {
                tile: 1,
                reference: "q".into()
            }]
        );
    }

    #[test]
    fn selection_moves_on_the_grid() {
        assert_eq!(move_selection(0, 1, 0, 3, 6), 1);
        assert_eq!(move_selection(2, 1, 0, 3, 6), 2);
        assert_eq!(move_selection(1, 0, 1, 3, 6), 4);
        assert_eq!(move_selection(4, 0, 1, 3, 6), 4);
        assert_eq!(move_selection(3, 0, -1, 3, 6), 0);
    }

    #[test]
    fn clicks_split_between_reload_and_focus() {
        let (mut app, _rx) = app();
        app.tile_areas = ui::tile_grid(Rect::new(0, 0, 90, 20), TILE_COUNT, 3);
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        let reload = ui::reload_button(app.tile_areas[4]);
        assert_eq!(
            app.handle_mouse(click(reload.x + 1, reload.y)),
            vec![Action::Select(4), Action::Send(Command::Reload { tile: 4 })]
        );
        assert_eq!(
            app.handle_mouse(click(35, 15)),
            vec![Action::Select(4), Action::Send(Command::Focus { tile: 4 })]
        );
    }

    #[tokio::test]
    async fn committed_source_is_sent_verbatim() {
        let (mut app, mut rx) = app();
        app.apply_action(Action::CommitSource {
            tile: 3,
            reference: "  dQw4w9WgXcQ \n".into(),
        })
        .await;
        match rx.recv().await {
            Some(WallEvent::ClientCommand(cmd)) => assert_eq!(
                cmd,
                Command::SetSource {
                    tile: 3,
                    reference: "  dQw4w9WgXcQ \n".into()
                }
            ),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
