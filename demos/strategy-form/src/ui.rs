//! Rendering

use form_dispatch::{StatusButton, StatusLabels};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::strategy::StrategyKind;

const HELP: &str =
    "↑/↓ target  ←/→ strategy  tab field  +/- adjust  enter save  esc discard  i invalidate  x dismiss  q quit";

pub fn render(frame: &mut Frame, app: &App) {
    let [main, messages, help] = Layout::vertical([
        Constraint::Min(8),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [targets, form] =
        Layout::horizontal([Constraint::Length(26), Constraint::Min(40)]).areas(main);

    render_targets(frame, targets, app);
    render_form(frame, form, app);
    render_messages(frame, messages, app);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        help,
    );
}

fn render_targets(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .targets()
        .iter()
        .map(|target| ListItem::new(target.name.as_str()))
        .collect();

    let list = List::new(items)
        .block(Block::bordered().title(" Targets "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_form(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::bordered().title(" Caching ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 4 {
        return;
    }

    let form = app.form();
    let target_id = app.target_id();
    let name = app.target().map(|t| t.name.as_str()).unwrap_or_default();

    // Header: target name and, for databases, the invalidate button
    let header = Rect { height: 1, ..inner };
    frame.render_widget(
        Line::from(Span::styled(name, Style::default().add_modifier(Modifier::BOLD))),
        header,
    );
    if let Some(invalidate) = app.invalidate() {
        let labels = StatusLabels::invalidate();
        let offset = name.chars().count() as u16 + 2;
        let button_area = Rect {
            x: header.x.saturating_add(offset),
            width: header.width.saturating_sub(offset),
            ..header
        };
        frame.render_widget(
            StatusButton::new(&labels, invalidate.status()).enabled(!invalidate.is_pending()),
            button_area,
        );
    }

    // Strategy choices and fields
    let mut lines = vec![
        Line::default(),
        Line::from("When should cached query results be invalidated?"),
    ];
    let current = form.value().kind();
    for kind in StrategyKind::available(target_id) {
        let marker = if *kind == current { "(•) " } else { "( ) " };
        let style = if *kind == current {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("{marker}{}", kind.label()), style)));
    }

    if !form.value().fields().is_empty() {
        lines.push(Line::default());
    }
    let focused = app.focused_field();
    for field in form.value().fields() {
        let value = form.value().field_value(*field).unwrap_or_default();
        let mut value_style = Style::default().add_modifier(Modifier::BOLD);
        if focused == Some(*field) {
            value_style = value_style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(vec![
            Span::raw(format!("{:<36}", field.label())),
            Span::styled(format!(" {value} "), value_style),
        ]));
    }

    let body = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(2),
        ..inner
    };
    frame.render_widget(Paragraph::new(lines), body);

    // Buttons stay up while dirty, saving, or just saved
    let buttons = form.buttons();
    if !buttons.visible {
        return;
    }
    let row = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };
    let discard_style = if buttons.discard_enabled {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Line::from(Span::styled("[ Discard changes ]", discard_style)),
        row,
    );

    let labels = StatusLabels::save();
    let save_area = Rect {
        x: row.x.saturating_add(21),
        width: row.width.saturating_sub(21),
        ..row
    };
    frame.render_widget(
        StatusButton::new(&labels, buttons.status).enabled(buttons.submit_enabled),
        save_area,
    );
}

fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = app
        .toasts()
        .map(|toast| {
            Line::from(vec![
                Span::styled("⚠ ", Style::default().fg(Color::Yellow)),
                Span::styled(toast.message.as_str(), Style::default().fg(Color::Red)),
            ])
        })
        .collect();

    if let Some(hint) = app.hint() {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Yellow))));
    } else if lines.is_empty() {
        if let Some(failure) = app.last_failure() {
            lines.push(Line::from(Span::styled(
                failure,
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
}
