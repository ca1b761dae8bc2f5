//! Layout and drawing for the wall: header, the tile grid, footer.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use wall_proto::protocol::{TileSnapshot, TileStatus, WallState};

use crate::theme::{
    style_accent, style_default, style_muted, style_secondary, style_status, style_tile_body,
    style_tile_border, C_AUDIO, C_LOADING, C_READY,
};

pub const RELOAD_LABEL: &str = " [reload] ";

/// Split `area` into `count` cells, row-major, `columns` wide.
pub fn tile_grid(area: Rect, count: usize, columns: u16) -> Vec<Rect> {
    let columns = usize::from(columns.max(1));
    let rows = count.div_ceil(columns).max(1);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);
    row_areas
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
                .split(*row)
                .to_vec()
        })
        .take(count)
        .collect()
}

/// Clickable `[reload]` control on a tile's top border.
pub fn reload_button(tile: Rect) -> Rect {
    let w = (RELOAD_LABEL.width() as u16).min(tile.width.saturating_sub(2));
    Rect {
        x: tile.x + tile.width.saturating_sub(w + 1),
        y: tile.y,
        width: w,
        height: if tile.height > 0 { 1 } else { 0 },
    }
}

pub fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

pub fn draw_header(frame: &mut Frame, area: Rect, state: &WallState) {
    let mut spans = vec![Span::styled(
        " tilewall ",
        style_accent().add_modifier(Modifier::BOLD),
    )];
    if state.sdk_ready {
        spans.push(Span::styled("● player ready", Style::default().fg(C_READY)));
    } else {
        spans.push(Span::styled("Loading SDK…", Style::default().fg(C_LOADING)));
    }
    if state.pending_jobs > 0 {
        spans.push(Span::styled(
            format!("  {} queued", state.pending_jobs),
            style_secondary(),
        ));
    }
    let audio = match state.active {
        Some(tile) => Span::styled(format!("  ♪ tile {}", tile + 1), Style::default().fg(C_AUDIO)),
        None => Span::styled("  ♪ none (press 1–6)", style_muted()),
    };
    spans.push(audio);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn draw_tile(
    frame: &mut Frame,
    area: Rect,
    tile: &TileSnapshot,
    selected: bool,
    active: bool,
) {
    let mut title = vec![
        Span::styled(format!(" [{}] ", tile.index + 1), style_secondary()),
        Span::styled(tile.status.label(), style_status(tile.status)),
    ];
    if active {
        title.push(Span::styled(
            " ♪",
            Style::default().fg(C_AUDIO).add_modifier(Modifier::BOLD),
        ));
    }
    title.push(Span::raw(" "));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_tile_border(selected, active))
        .title(Line::from(title))
        .title_top(Line::from(Span::styled(RELOAD_LABEL, style_secondary())).right_aligned())
        .style(style_tile_body(selected));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let source = if tile.source.is_empty() {
        Span::styled("(no source, press e)", style_muted())
    } else {
        Span::styled(truncate_to_width(&tile.source, width), style_default())
    };
    let id_line = match (&tile.video_id, tile.status) {
        (Some(id), _) => Line::from(Span::styled(id.clone(), style_secondary())),
        (None, TileStatus::Queued) => {
            Line::from(Span::styled("waiting for player SDK", style_muted()))
        }
        (None, _) => Line::from(Span::styled("enter/o to load", style_muted())),
    };
    frame.render_widget(
        Paragraph::new(vec![Line::from(source), id_line]).wrap(Wrap { trim: true }),
        inner,
    );
}

pub fn draw_footer(frame: &mut Frame, area: Rect, show_help: bool, notice: Option<&str>) {
    let text = if show_help {
        "1-6 audio · ←↑↓→/hjkl/tab select · enter/o load · r reload · L load all · \
         m mute all · p pause all · P play muted · e edit · y copy url · q quit"
    } else {
        "1-6 give a tile the sound · click a tile to focus it · ? help"
    };
    let mut spans = vec![Span::styled(format!(" {}", text), style_muted())];
    if let Some(notice) = notice {
        spans.push(Span::styled(format!("  {}", notice), style_secondary()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }), area);
}
