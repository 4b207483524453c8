use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};

use crate::auth::IdentityOrigin;
use crate::config::ConfigError;
use crate::context::AppContext;
use crate::domain::settings::SettingsField;
use crate::sync::{DashboardModel, Phase, SettingsModel};
use crate::terminal::state::{AppState, FormField, NoticeKind, Page, View};
use crate::terminal::style;

fn format_millis(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(t) if ms > 0 => t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "never".to_string(),
    }
}

fn bold(s: &str) -> Span<'_> {
    Span::styled(s, Style::default().add_modifier(Modifier::BOLD))
}

pub fn render(f: &mut Frame, state: &AppState, ctx: &AppContext) {
    let [header, body, notice, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, state, ctx);

    if state.view.phase() != Phase::SubscriptionActive {
        let waiting = match state.view.phase() {
            Phase::Uninitialized => "Signing in…",
            _ => "Loading…",
        };
        f.render_widget(
            Paragraph::new(waiting).block(Block::default().borders(Borders::ALL)),
            body,
        );
    } else {
        match &state.view {
            View::Dashboard(s) => render_dashboard(f, body, s.model()),
            View::Accounts(_) => render_accounts(f, body, state),
            View::Settings(s) => render_settings(f, body, s.model(), state, ctx),
        }
    }

    if let Some(n) = &state.notice {
        let color = match n.kind {
            NoticeKind::Info => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        let line = Line::from(vec![
            Span::styled(n.text.clone(), Style::default().fg(color)),
            Span::styled("  (x to dismiss)", Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(Paragraph::new(line), notice);
    }

    f.render_widget(Paragraph::new(hints(state)), footer);

    if let Some(form) = &state.form {
        render_form(f, form.email.as_str(), form.password.len(), form.field);
    }
}

fn render_header(f: &mut Frame, area: Rect, state: &AppState, ctx: &AppContext) {
    let who = match ctx.identity.get() {
        None => "signing in…".to_string(),
        Some(id) => match id.origin {
            IdentityOrigin::LocalFallback => format!("{} (offline session, not saved)", id.uid),
            _ => id.uid.clone(),
        },
    };
    let titles: Vec<String> = Page::ALL
        .iter()
        .map(|p| format!("{} {}", p.index() + 1, p.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.page.index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Email Warmup ")
                .title_bottom(Line::from(format!(" {who} ")).right_aligned()),
        );
    f.render_widget(tabs, area);
}

fn stat_card<'a>(value: String, label: &'a str) -> Paragraph<'a> {
    Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
    ]))
    .block(Block::default().borders(Borders::ALL))
}

fn render_dashboard(f: &mut Frame, area: Rect, model: &DashboardModel) {
    let [cards, activity] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);
    let [a, b, c] = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .areas(cards);

    f.render_widget(stat_card(model.stats.total_accounts.to_string(), "Total accounts"), a);
    f.render_widget(stat_card(model.stats.active_warmup.to_string(), "Active warmup"), b);
    f.render_widget(
        stat_card(model.stats.deliverability_score.to_string(), "Deliverability"),
        c,
    );

    let items: Vec<ListItem> = model
        .logs
        .iter()
        .map(|entry| {
            let st = style::log_status(entry.status);
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", st.symbol), Style::default().fg(st.color)),
                Span::styled(
                    format_millis(entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw("  "),
                bold(&entry.event),
                Span::raw("  "),
                Span::raw(entry.email.as_str()),
            ]))
        })
        .collect();

    let list = if items.is_empty() {
        List::new(vec![ListItem::new("No activity yet.")])
    } else {
        List::new(items)
    };
    f.render_widget(
        list.block(Block::default().title(" Recent activity ").borders(Borders::ALL)),
        activity,
    );
}

fn render_accounts(f: &mut Frame, area: Rect, state: &AppState) {
    let rows = state.account_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let st = style::account_status(row.status);
            let status = Span::styled(
                format!("{} {:<10}", st.symbol, st.label),
                Style::default().fg(st.color),
            );
            let detail = match &row.account {
                Some(a) => format!(
                    "sent {:>5}  received {:>5}  last connected {}",
                    a.sent_count,
                    a.received_count,
                    format_millis(a.last_connected)
                ),
                None => String::new(),
            };
            ListItem::new(Text::from(vec![
                Line::from(vec![status, Span::raw(" "), bold(&row.email)]),
                Line::from(Span::styled(detail, Style::default().fg(Color::Gray))),
            ]))
        })
        .collect();

    let block = Block::default()
        .title(format!(" Accounts ({}) ", rows.len()))
        .borders(Borders::ALL);

    if items.is_empty() {
        f.render_widget(
            Paragraph::new("No accounts connected. Press 'a' to add one.").block(block),
            area,
        );
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_stateful_widget(list, area, &mut state.list_state.clone());
}

fn render_settings(
    f: &mut Frame,
    area: Rect,
    model: &SettingsModel,
    state: &AppState,
    ctx: &AppContext,
) {
    let [fields, backend] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let items: Vec<ListItem> = SettingsField::ALL
        .iter()
        .map(|field| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<18}", field.label())),
                Span::styled(
                    model.settings.display(*field),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ]))
        })
        .collect();
    let mut list_state = ratatui::widgets::ListState::default();
    list_state.select(Some(state.settings_cursor));
    f.render_stateful_widget(
        List::new(items)
            .block(Block::default().title(" Warmup settings ").borders(Borders::ALL))
            .highlight_symbol("➜ ")
            .highlight_style(Style::default().fg(Color::Yellow)),
        fields,
        &mut list_state,
    );

    let (text, border) = match &state.url_input {
        Some(input) => (format!("{input}▏"), Color::Yellow),
        None => (ctx.backend.base_url(), Color::DarkGray),
    };
    f.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .title(" Backend URL ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        ),
        backend,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn render_form(f: &mut Frame, email: &str, password_len: usize, field: FormField) {
    let area = centered(f.area(), 60, 8);
    let active = |this: FormField| {
        if this == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let text = Text::from(vec![
        Line::from(vec![
            Span::styled("Email:    ", active(FormField::Email)),
            Span::raw(email),
        ]),
        Line::from(vec![
            Span::styled("Password: ", active(FormField::Password)),
            Span::raw("•".repeat(password_len)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Tab switch field · Enter connect · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .title(" Connect account ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        ),
        area,
    );
}

fn hints(state: &AppState) -> Line<'static> {
    let mut spans = vec![
        Span::styled("1-3/Tab", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" page  "),
    ];
    let page: &[(&'static str, &'static str)] = match state.page {
        Page::Dashboard => &[],
        Page::Accounts => &[("j/k", " move  "), ("a", " add  "), ("d", " remove  ")],
        Page::Settings => &[("j/k", " move  "), ("+/-", " change  "), ("e", " backend url  ")],
    };
    for (key, what) in page {
        spans.push(Span::styled(*key, Style::default().add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(*what));
    }
    spans.push(Span::styled("q", Style::default().add_modifier(Modifier::BOLD)));
    spans.push(Span::raw(" quit"));
    Line::from(spans)
}

/// Full-screen page for a configuration problem the dashboard cannot run
/// without.
pub fn render_config_error(f: &mut Frame, err: &ConfigError) {
    let text = Text::from(vec![
        Line::from(bold("The dashboard cannot start.")),
        Line::from(""),
        Line::from(err.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Set WARMUP_STORE_CONFIG, e.g. {\"kind\":\"sqlite\",\"path\":\"/path/to/warmup.db\"}. Press q to quit.",
            Style::default().fg(Color::Gray),
        )),
    ]);
    f.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(" Configuration error ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        ),
        f.area(),
    );
}
