//! SourceInput: one-line tui-input editor for a tile's source reference.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_edit, style_muted};

#[derive(Debug, PartialEq)]
pub enum EditOutcome {
    /// Enter: the edited text.
    Commit(String),
    /// Esc: editing abandoned.
    Cancel,
    Editing,
}

pub struct SourceInput {
    input: Input,
    tile: Option<usize>,
}

impl SourceInput {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            tile: None,
        }
    }

    /// Start editing `tile`, seeded with its current reference.
    pub fn open(&mut self, tile: usize, current: &str) {
        self.input = Input::new(current.to_string());
        self.tile = Some(tile);
    }

    pub fn close(&mut self) {
        self.tile = None;
    }

    /// Tile being edited, if any.
    pub fn tile(&self) -> Option<usize> {
        self.tile
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditOutcome {
        match key.code {
            KeyCode::Esc => {
                self.close();
                EditOutcome::Cancel
            }
            KeyCode::Enter => {
                self.close();
                EditOutcome::Commit(self.input.value().to_string())
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                EditOutcome::Editing
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let Some(tile) = self.tile else {
            return;
        };
        let prefix = format!("tile {} source: ", tile + 1);
        let prefix_w = prefix.chars().count() as u16;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prefix_w + 1) as usize);
        let value = self.input.value();
        let shown: String = value.chars().skip(scroll).collect();

        let line = if value.is_empty() {
            Line::from(vec![
                Span::styled(prefix, style_edit()),
                Span::styled("paste a link or 11-character id", style_muted()),
            ])
        } else {
            Line::from(vec![Span::styled(prefix, style_edit()), Span::styled(shown, style_edit())])
        };
        frame.render_widget(Paragraph::new(line).style(style_edit()), area);

        let cursor_x = area.x + prefix_w + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
        frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
    }
}

impl Default for SourceInput {
    fn default() -> Self {
        Self::new()
    }
}
