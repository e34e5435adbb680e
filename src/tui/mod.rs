// TUI module for rendering the review screen
pub mod colors;
pub mod helpers;
pub mod input;

// Re-exports
pub use colors::*;
pub use helpers::{calculate_progress, format_file_size};
pub use input::{handle_confirm_input, handle_key_event, KeyAction, SwipeTracker, SwipeUpdate};

use crate::domain::{MediaItem, MediaKind, QueueState, SwipeOutcome};
use crate::feedback::{Feedback, Tone};
use crate::session::QueueSnapshot;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

/// UI view state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Main review view
    Browsing,
    /// Help overlay visible
    Help,
    /// Confirmation dialog before sending the batch to the trash
    ConfirmFinish,
}

/// Everything one frame needs
#[derive(Debug, Clone, Copy)]
pub struct Screen<'a> {
    pub snapshot: &'a QueueSnapshot,
    pub feedback: Option<&'a Feedback>,
    /// Horizontal offset of a mouse drag in progress
    pub drag: Option<f32>,
    pub dry_run: bool,
}

/// Renders the review screen and the overlay for `view`
pub fn render(frame: &mut Frame, screen: &Screen, view: ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with progress
            Constraint::Min(0),    // Card or end screen
            Constraint::Length(3), // Feedback / controls
        ])
        .split(frame.area());

    render_header(frame, chunks[0], screen.snapshot);
    match &screen.snapshot.current {
        Some(item) => render_card(frame, chunks[1], item, screen),
        None => render_end_screen(frame, chunks[1], screen.snapshot),
    }
    render_footer(frame, chunks[2], screen.feedback);

    match view {
        ViewState::Help => render_help_overlay(frame),
        ViewState::ConfirmFinish => {
            render_confirm_finish_overlay(frame, screen.snapshot.pending_deletions, screen.dry_run)
        }
        ViewState::Browsing => {}
    }
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// "Review (i/n)" plus a gauge of reviewed items
fn render_header(frame: &mut Frame, area: Rect, snapshot: &QueueSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(area);

    let total = snapshot.total_count.unwrap_or(snapshot.loaded);
    let title = if snapshot.current.is_some() {
        format!(" Review ({}/{}) ", snapshot.cursor + 1, total)
    } else {
        " Review ".to_string()
    };

    let mut status = vec![
        Span::styled(
            format!("{} pending deletion", snapshot.pending_deletions),
            Style::default().fg(if snapshot.pending_deletions > 0 {
                ACCENT_PRIMARY
            } else {
                TEXT_SECONDARY
            }),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} loaded", snapshot.loaded),
            Style::default().fg(TEXT_SECONDARY),
        ),
    ];
    if snapshot.fetch_in_flight {
        status.push(Span::styled(
            "  loading more...",
            Style::default()
                .fg(TEXT_SECONDARY)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    if snapshot.finish_in_flight {
        status.push(Span::styled(
            "  deleting...",
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(status),
    ])
    .block(
        Block::default()
            .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_COLOR)),
    )
    .alignment(Alignment::Left);

    frame.render_widget(header, chunks[0]);

    let reviewed = snapshot.stats.reviewed;
    let progress = calculate_progress(reviewed, total);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::BOTTOM | Borders::LEFT | Borders::RIGHT)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .gauge_style(Style::default().fg(ACCENT_SECONDARY).bg(BG_DARK))
        .ratio(progress)
        .label(format!(
            "{}% ({}/{})",
            (progress * 100.0) as u16,
            reviewed,
            total
        ));

    frame.render_widget(gauge, chunks[1]);
}

/// Metadata card for the current item; the border follows a drag in progress
fn render_card(frame: &mut Frame, area: Rect, item: &MediaItem, screen: &Screen) {
    let outcome = screen
        .drag
        .map(|offset| (offset, SwipeOutcome::classify(offset, screen.snapshot.swipe_threshold)));

    let border = match outcome {
        Some((_, SwipeOutcome::Keep)) => ACCENT_SECONDARY,
        Some((_, SwipeOutcome::Delete)) => ACCENT_PRIMARY,
        _ => BORDER_COLOR,
    };

    let kind = match item.kind {
        MediaKind::Photo => "Photo",
        MediaKind::Video => "Video",
    };
    let dimensions = item
        .dimensions()
        .map(|(w, h)| format!("{} x {}", w, h))
        .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            item.name.clone(),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Type", kind.to_string()),
        field("Size", format_file_size(item.size_bytes)),
        field("Dimensions", dimensions),
        field(
            "Created",
            item.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ),
        field("Location", item.display_uri().to_string()),
        Line::from(""),
    ];

    lines.push(match outcome {
        Some((offset, SwipeOutcome::Keep)) => Line::from(Span::styled(
            format!("Release to keep  (+{:.0})", offset),
            Style::default()
                .fg(ACCENT_SECONDARY)
                .add_modifier(Modifier::BOLD),
        )),
        Some((offset, SwipeOutcome::Delete)) => Line::from(Span::styled(
            format!("Release to delete  ({:.0})", offset),
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Some((_, SwipeOutcome::Cancel)) => Line::from(Span::styled(
            "Drag further to decide",
            Style::default().fg(TEXT_SECONDARY),
        )),
        None => Line::from(Span::styled(
            "Drag the card left or right, or use the arrow keys",
            Style::default().fg(TEXT_SECONDARY),
        )),
    });

    let card = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border))
                .title(format!(" {} ", item.name)),
        )
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY))
        .wrap(Wrap { trim: false });

    frame.render_widget(card, area);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(TEXT_SECONDARY)),
        Span::styled(value, Style::default().fg(TEXT_PRIMARY)),
    ])
}

/// Shown when the cursor has no item: either waiting for a page or done
fn render_end_screen(frame: &mut Frame, area: Rect, snapshot: &QueueSnapshot) {
    let mut lines = vec![Line::from(""), Line::from("")];

    match snapshot.state {
        QueueState::Exhausted => {
            lines.push(Line::from(Span::styled(
                "All caught up",
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            if snapshot.pending_deletions > 0 {
                lines.push(Line::from(Span::styled(
                    format!(
                        "{} item(s) marked for deletion",
                        snapshot.pending_deletions
                    ),
                    Style::default().fg(ACCENT_PRIMARY),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("f", Style::default().fg(ACCENT_HIGHLIGHT)),
                    Span::raw(" to delete them, "),
                    Span::styled("u", Style::default().fg(ACCENT_HIGHLIGHT)),
                    Span::raw(" to undo"),
                ]));
            } else {
                lines.push(Line::from(Span::styled(
                    "Nothing marked for deletion",
                    Style::default().fg(TEXT_SECONDARY),
                )));
            }
            lines.push(Line::from(vec![
                Span::raw("Press "),
                Span::styled("r", Style::default().fg(ACCENT_HIGHLIGHT)),
                Span::raw(" to start over"),
            ]));
        }
        QueueState::Loading | QueueState::Reviewing => {
            lines.push(Line::from(Span::styled(
                "Loading more...",
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::ITALIC),
            )));
            if !snapshot.fetch_in_flight {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Waiting for the library to respond",
                    Style::default().fg(TEXT_SECONDARY),
                )));
            }
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Feedback message when one is showing, otherwise the key hints
fn render_footer(frame: &mut Frame, area: Rect, feedback: Option<&Feedback>) {
    let line = match feedback {
        Some(feedback) => {
            let color = match feedback.tone {
                Tone::Positive => ACCENT_SECONDARY,
                Tone::Negative => ACCENT_PRIMARY,
                Tone::Neutral => ACCENT_HIGHLIGHT,
            };
            Line::from(Span::styled(
                feedback.message.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => controls_line(),
    };

    let footer = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}

fn controls_line() -> Line<'static> {
    let hint = |key: &'static str, color: Color, label: &'static str| {
        [
            Span::styled(key, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(label, Style::default().fg(TEXT_SECONDARY)),
        ]
    };
    let sep = || Span::raw("  │  ");

    let mut spans = Vec::new();
    spans.extend(hint(" ← ", ACCENT_PRIMARY, "Delete"));
    spans.push(sep());
    spans.extend(hint("→ ", ACCENT_SECONDARY, "Keep"));
    spans.push(sep());
    spans.extend(hint("u ", ACCENT_HIGHLIGHT, "Undo"));
    spans.push(sep());
    spans.extend(hint("f ", ACCENT_HIGHLIGHT, "Finish"));
    spans.push(sep());
    spans.extend(hint("? ", TEXT_SECONDARY, "Help"));
    spans.push(sep());
    spans.extend(hint("q ", TEXT_SECONDARY, "Quit"));
    Line::from(spans)
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let help_area = centered_rect(50, 70, frame.area());

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let key = |text: &'static str, color: Color| Span::styled(text, Style::default().fg(color));
    let help_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            key("  → ", ACCENT_SECONDARY),
            Span::raw("or "),
            key("k", ACCENT_SECONDARY),
            Span::raw("      Keep"),
        ]),
        Line::from(vec![
            key("  ← ", ACCENT_PRIMARY),
            Span::raw("or "),
            key("d", ACCENT_PRIMARY),
            Span::raw("      Mark for deletion"),
        ]),
        Line::from(vec![
            key("  drag", TEXT_SECONDARY),
            Span::raw("        Swipe with the mouse"),
        ]),
        Line::from(""),
        Line::from(vec![
            key("  u ", ACCENT_HIGHLIGHT),
            Span::raw("or "),
            key("Ctrl+Z", ACCENT_HIGHLIGHT),
            Span::raw(" Undo"),
        ]),
        Line::from(vec![
            key("  f", ACCENT_HIGHLIGHT),
            Span::raw("           Delete marked items"),
        ]),
        Line::from(vec![
            key("  r", TEXT_SECONDARY),
            Span::raw("           Start over"),
        ]),
        Line::from(""),
        Line::from(vec![
            key("  q ", TEXT_SECONDARY),
            Span::raw("or "),
            key("Esc", TEXT_SECONDARY),
            Span::raw("    Quit"),
        ]),
        Line::from(vec![
            key("  ?", TEXT_SECONDARY),
            Span::raw("           Toggle help"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the confirmation dialog before deleting the batch
pub fn render_confirm_finish_overlay(frame: &mut Frame, pending: usize, dry_run: bool) {
    let confirm_area = centered_rect(50, 50, frame.area());

    frame.render_widget(Clear, confirm_area);

    let block = Block::default()
        .title(" ⚠ Confirm Delete ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_PRIMARY))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(confirm_area);
    frame.render_widget(block, confirm_area);

    let consequence = if dry_run {
        "Dry run: no file will actually be touched."
    } else {
        "They will be moved to the system trash."
    };

    let confirm_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Delete {} marked item(s)?", pending),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            consequence,
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Y]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("es  "),
            Span::styled("[Enter]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("     "),
            Span::styled("[N]", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("o  "),
            Span::styled("[Esc]", Style::default().fg(ACCENT_PRIMARY)),
        ]),
    ];

    let paragraph = Paragraph::new(confirm_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}
