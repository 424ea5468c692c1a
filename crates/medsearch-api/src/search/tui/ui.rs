//! UI rendering

use crate::search::display::MedicineCardDisplay;
use crate::search::session::Focus;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use std::time::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::app::App;

/// Border plus manufacturer, two composition lines, pack/price and type/badge
const CARD_HEIGHT: u16 = 7;
const MIN_CARD_WIDTH: u16 = 36;
const MAX_COLUMNS: u16 = 3;
/// Popover rows before the list is cut off
const MAX_POPOVER_ROWS: u16 = 8;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search input
            Constraint::Length(1), // Spinner / error banner / summary
            Constraint::Length(1), // Did you mean
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    render_title(frame, app, chunks[0]);
    render_search_input(frame, app, chunks[1]);
    render_status_line(frame, app, chunks[2]);
    render_did_you_mean(frame, app, chunks[3]);
    render_card_grid(frame, app, chunks[4]);
    render_help_bar(frame, app, chunks[5]);

    // Popover is drawn last so it sits on top of the grid
    if app.session.popover_visible() {
        render_popover(frame, app, chunks[1]);
    }
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " Medicine Search",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", app.api_url),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.session.focus() != Focus::Results;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(if focused {
            Color::Yellow
        } else {
            Color::DarkGray
        }));

    let cursor_style = Style::default().fg(Color::White).bg(Color::DarkGray);
    let text_style = Style::default().fg(Color::White);

    let input = &app.input;
    let (before, after) = input.text.split_at(input.cursor);
    let cursor_char = after.chars().next();
    let after_cursor = cursor_char.map(|c| &after[c.len_utf8()..]).unwrap_or("");

    let mut spans = Vec::new();
    if input.text.is_empty() {
        if focused {
            spans.push(Span::styled("█", Style::default().fg(Color::White)));
        }
        spans.push(Span::styled(
            "Search medicines...",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        if !before.is_empty() {
            spans.push(Span::styled(before, text_style));
        }
        match cursor_char {
            Some(c) if focused => spans.push(Span::styled(c.to_string(), cursor_style)),
            Some(c) => spans.push(Span::styled(c.to_string(), text_style)),
            None if focused => spans.push(Span::styled("█", Style::default().fg(Color::White))),
            None => {}
        }
        if !after_cursor.is_empty() {
            spans.push(Span::styled(after_cursor, text_style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.view();

    let line = if view.show_spinner {
        let elapsed = app.search_started.map(|t| t.elapsed()).unwrap_or_default();
        let spinner = spinner_frame(elapsed);
        Line::from(Span::styled(
            format!("  {} Searching...", spinner),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::DIM),
        ))
    } else if let Some(banner) = view.error_banner {
        Line::from(Span::styled(
            format!("  ✗ {}", banner),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(summary) = view.summary {
        Line::from(Span::styled(
            format!("  {}", summary),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::default()
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_did_you_mean(frame: &mut Frame, app: &App, area: Rect) {
    let did_you_mean = &app.session.results().did_you_mean;
    if did_you_mean.is_empty() || !app.session.results().medicines.is_empty() {
        return;
    }

    let line = Line::from(vec![
        Span::styled("  Did you mean: ", Style::default().fg(Color::DarkGray)),
        Span::styled(did_you_mean.join(", "), Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn grid_columns(width: u16) -> u16 {
    (width / MIN_CARD_WIDTH).clamp(1, MAX_COLUMNS)
}

fn render_card_grid(frame: &mut Frame, app: &mut App, area: Rect) {
    let columns = grid_columns(area.width);
    app.grid_columns = columns as usize;

    let cards: Vec<MedicineCardDisplay> = app.view().cards;
    if cards.is_empty() {
        return;
    }

    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = app.selected_card / columns as usize;
    let first_row = selected_row.saturating_sub(visible_rows - 1);
    let grid_focused = app.session.focus() == Focus::Results;

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (row_index, row_area) in row_areas.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns as usize])
            .split(*row_area);

        for (col_index, cell) in cols.iter().enumerate() {
            let index = (first_row + row_index) * columns as usize + col_index;
            let Some(card) = cards.get(index) else {
                return;
            };
            let selected = grid_focused && index == app.selected_card;
            render_card(frame, card, selected, *cell);
        }
    }
}

fn render_card(frame: &mut Frame, card: &MedicineCardDisplay, selected: bool, area: Rect) {
    let title_width = area.width.saturating_sub(4) as usize;
    let border_style = if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(border_style)
        .title(Span::styled(
            format!(" {} ", truncate(&card.name, title_width)),
            title_style,
        ));

    let body_width = area.width.saturating_sub(2) as usize;
    let mut lines = card.to_tui_lines();
    // Short compositions leave a gap; keep the price rows at the bottom
    while lines.len() < (CARD_HEIGHT - 2) as usize {
        lines.insert(lines.len() - 2, Line::default());
    }
    let lines: Vec<Line> = lines
        .into_iter()
        .map(|line| truncate_line(line, body_width))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let bracket = Style::default().fg(Color::DarkGray);

    let hints: &[&str] = match app.session.focus() {
        Focus::Results => &["←↑↓→ move", "Tab input", "Esc back"],
        Focus::Suggestions => &["↑↓ select", "Enter search", "Esc close"],
        Focus::Input => &["Enter search", "↓ suggestions", "Tab results", "Esc quit"],
    };

    let mut spans = vec![Span::styled(" ", dim)];
    for hint in hints {
        spans.push(Span::styled(" [", bracket));
        spans.push(Span::styled(*hint, dim));
        spans.push(Span::styled("]", bracket));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Suggestion list anchored just below the input box
fn render_popover(frame: &mut Frame, app: &App, input_area: Rect) {
    let screen = frame.area();
    let suggestions = app.session.suggestions();
    let highlighted = app.session.highlighted();

    let rows = (suggestions.len() as u16).min(MAX_POPOVER_ROWS);
    let y = input_area.y + input_area.height;
    let height = (rows + 2).min(screen.height.saturating_sub(y));
    if height <= 2 {
        return;
    }
    let width = input_area.width.saturating_sub(2).min(60);
    let popover_area = Rect::new(input_area.x + 1, y, width, height);

    frame.render_widget(Clear, popover_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Green));
    let inner_width = block.inner(popover_area).width as usize;

    // Keep the highlighted entry inside the window
    let visible = (height - 2) as usize;
    let first = highlighted
        .map(|i| i.saturating_sub(visible - 1))
        .unwrap_or(0);

    let selection_bg = Color::Rgb(38, 38, 38);
    let items: Vec<ListItem> = suggestions
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(i, suggestion)| {
            let text = truncate(suggestion, inner_width.saturating_sub(2));
            if highlighted == Some(i) {
                let pad = inner_width.saturating_sub(2 + text.width());
                ListItem::new(Line::from(vec![
                    Span::styled("▌ ", Style::default().fg(Color::LightRed).bg(selection_bg)),
                    Span::styled(
                        text,
                        Style::default()
                            .fg(Color::Yellow)
                            .bg(selection_bg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(" ".repeat(pad), Style::default().bg(selection_bg)),
                ]))
            } else {
                ListItem::new(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(text, Style::default().fg(Color::White)),
                ]))
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), popover_area);
}

/// Cut `text` to at most `max_width` terminal columns, marking the cut with `…`
fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn truncate_line(line: Line<'static>, max_width: usize) -> Line<'static> {
    let mut remaining = max_width;
    let mut spans = Vec::with_capacity(line.spans.len());
    for span in line.spans {
        if remaining == 0 {
            break;
        }
        let width = span.content.width();
        if width <= remaining {
            remaining -= width;
            spans.push(span);
        } else {
            spans.push(Span::styled(truncate(&span.content, remaining), span.style));
            remaining = 0;
        }
    }
    Line::from(spans)
}

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAME_TIME: Duration = Duration::from_millis(80);

/// Spinner glyph for a search that has been running for `elapsed`
fn spinner_frame(elapsed: Duration) -> &'static str {
    let ticks = elapsed.as_millis() / SPINNER_FRAME_TIME.as_millis();
    SPINNER_FRAMES[(ticks % SPINNER_FRAMES.len() as u128) as usize]
}
