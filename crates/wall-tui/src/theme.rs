//! Color palette and style constants for the wall TUI.

use ratatui::style::{Color, Modifier, Style};
use wall_proto::protocol::TileStatus;

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(18, 18, 18);
pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_READY: Color = Color::Rgb(80, 200, 120);
pub const C_LOADING: Color = Color::Rgb(255, 184, 80);
pub const C_QUEUED: Color = Color::Rgb(80, 140, 200);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_SELECTED: Color = Color::Rgb(120, 100, 200);
pub const C_AUDIO: Color = Color::Rgb(255, 210, 50);
pub const C_EDIT_BG: Color = Color::Rgb(20, 20, 32);
pub const C_EDIT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT)
}

/// Border of a tile: the audio tile wins over the keyboard selection.
pub fn style_tile_border(selected: bool, active: bool) -> Style {
    match (active, selected) {
        (true, _) => Style::default().fg(C_AUDIO).add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(C_PANEL_BORDER_SELECTED),
        (false, false) => Style::default().fg(C_PANEL_BORDER),
    }
}

pub fn style_tile_body(selected: bool) -> Style {
    if selected {
        Style::default().bg(C_SELECTION_BG).fg(C_PRIMARY)
    } else {
        style_default()
    }
}

pub fn style_status(status: TileStatus) -> Style {
    let color = match status {
        TileStatus::Empty => C_MUTED,
        TileStatus::Queued => C_QUEUED,
        TileStatus::Constructing => C_LOADING,
        TileStatus::Ready => C_READY,
    };
    Style::default().fg(color)
}

pub fn style_edit() -> Style {
    Style::default().fg(C_EDIT_FG).bg(C_EDIT_BG)
}
