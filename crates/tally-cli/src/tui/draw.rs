use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tally_core::view::Screen;
use tally_view::RowView;

use super::app::{App, ROW_HEIGHT};
use crate::commands::output;

const ACCENT_COLOR: Color = Color::LightGreen;
const LEADER_COLOR: Color = Color::Yellow;
const FOOTER_KEY_COLOR: Color = Color::Cyan;
const FOOTER_LABEL_COLOR: Color = Color::Gray;
/// Rows fainter than this are drawn dim.
const DIM_OPACITY: f32 = 0.6;

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.size());
    let (header, body, footer) = (layout[0], layout[1], layout[2]);

    draw_header(frame, app, header);
    match &app.view.screen {
        Screen::Loading => {
            let loading = Paragraph::new("Loading sessions…")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(loading, body);
        }
        Screen::Dashboard => draw_dashboard(frame, app, body),
        Screen::Session { .. } => draw_session(frame, app, body),
    }
    draw_footer(frame, app, footer);

    if app.prompt.is_some() {
        draw_prompt(frame, app, body);
    }
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = match app.current_session() {
        Some(session) => format!(" tally › {}", session.name),
        None => " tally".to_string(),
    };
    let header = Paragraph::new(Line::from(Span::styled(
        title,
        Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(header, area);
}

fn draw_dashboard(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Sessions ");
    let summaries = app.summaries();
    if summaries.is_empty() {
        let empty = Paragraph::new("No sessions yet. Press n to create one.")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = summaries
        .iter()
        .map(|summary| {
            let leading = match &summary.leading {
                Some((emoji, title)) => format!("{emoji} {title}"),
                None => "no votes yet".to_string(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    summary.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!(
                        "{} votes · {} choices · {leading}",
                        summary.total_votes, summary.choice_count
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.dashboard_index));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_session(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let selected = app.selected_choice_id();
    let bar_width = usize::from(inner.width.saturating_sub(12));
    let bottom = i32::from(inner.y) + i32::from(inner.height);

    for row in app.list.rows() {
        let y = i32::from(inner.y) + (row.position.y + row.style.offset.y).round() as i32;
        let x = i32::from(inner.x) + (row.style.offset.x).round() as i32;
        if y < i32::from(inner.y) || y >= bottom || x < i32::from(inner.x) {
            continue;
        }
        let height = (bottom - y).min(i32::from(ROW_HEIGHT)) as u16;
        let rect = Rect::new(
            x as u16,
            y as u16,
            inner.width.saturating_sub((x - i32::from(inner.x)) as u16),
            height,
        );

        let is_selected = selected.as_deref() == Some(row.node.key());
        let rank = app.display_rank(row.node.key());
        let lines = row_lines(&row, rank, bar_width, is_selected);
        frame.render_widget(Paragraph::new(lines), rect);
    }
}

fn row_lines(
    row: &RowView<'_>,
    rank: Option<usize>,
    bar_width: usize,
    selected: bool,
) -> Vec<Line<'static>> {
    let node = row.node;
    let mut base = Style::default();
    if row.style.opacity < DIM_OPACITY {
        base = base.add_modifier(Modifier::DIM);
    }
    let title_style = if selected && !node.is_exiting() {
        base.fg(ACCENT_COLOR).add_modifier(Modifier::BOLD)
    } else {
        base
    };

    let minus = if node.can_decrement {
        Span::styled("[-]", base)
    } else {
        Span::styled("[-]", base.fg(Color::DarkGray))
    };
    let mut title = vec![
        Span::styled(
            match rank {
                Some(rank) => format!("{}{rank:>2}. ", if selected { "›" } else { " " }),
                None => "     ".to_string(),
            },
            base,
        ),
        Span::styled(format!("{} {}", node.emoji, node.title), title_style),
    ];
    if node.leader {
        title.push(Span::styled(
            "  LEADER",
            base.fg(LEADER_COLOR).add_modifier(Modifier::BOLD),
        ));
    }
    title.extend([
        Span::raw("  "),
        minus,
        Span::styled(format!(" {} ", node.votes_text), base.add_modifier(Modifier::BOLD)),
        Span::styled("[+]", base),
    ]);

    let bar_color = if node.leader { LEADER_COLOR } else { ACCENT_COLOR };
    let bar = Line::from(vec![
        Span::raw("     "),
        Span::styled(
            output::bar(f64::from(row.style.bar), bar_width),
            base.fg(bar_color),
        ),
    ]);
    let notes = Line::from(Span::styled(
        format!("     {}", node.notes.clone().unwrap_or_default()),
        base.fg(Color::DarkGray),
    ));

    vec![Line::from(title), bar, notes]
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect) {
    if let Some(status) = &app.status {
        frame.render_widget(
            Paragraph::new(Span::styled(status.clone(), Style::default().fg(ACCENT_COLOR))),
            area,
        );
        return;
    }

    let keys: &[(&str, &str)] = match (&app.prompt, &app.view.screen) {
        (Some(_), _) => &[("Enter", "submit"), ("Esc", "cancel")],
        (None, Screen::Session { .. }) => &[
            ("↑↓", "select"),
            ("+/-", "vote"),
            ("a", "add"),
            ("x", "remove"),
            ("m", "motion"),
            ("D", "delete"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        (None, _) => &[
            ("↑↓", "select"),
            ("Enter", "open"),
            ("n", "new"),
            ("D", "delete"),
            ("q", "quit"),
        ],
    };
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(format!(" {key}"), Style::default().fg(FOOTER_KEY_COLOR)),
                Span::styled(format!(" {label} "), Style::default().fg(FOOTER_LABEL_COLOR)),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_prompt(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    let popup = centered(area, 70, 5);

    let mut lines = Vec::new();
    if let Some(input) = prompt.input() {
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(ACCENT_COLOR)),
            Span::raw(input.value().to_string()),
            Span::styled("█", Style::default().fg(ACCENT_COLOR)),
        ]));
    }
    if let Some(error) = prompt.error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", prompt.title()))
                .border_style(Style::default().fg(ACCENT_COLOR)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, popup);
    frame.render_widget(widget, popup);
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
