use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::app::{App, DateField, DatePicker, Mode};
use crate::models::{Priority, Task};

const STATUS_WIDTH: usize = 6;
const PRIORITY_WIDTH: usize = 8;
const TITLE_WIDTH: usize = 40;
const DEADLINE_WIDTH: usize = 19;

const HELP: &str = "  ↑/↓ move • a add • e edit • space done • x delete • q quit";
const EMPTY: &str = "No tasks yet, press a to add";

fn dim() -> Style {
    Style::default().fg(Color::Indexed(242))
}

fn accent() -> Style {
    Style::default().fg(Color::Indexed(62)).add_modifier(Modifier::BOLD)
}

fn focused() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Indexed(160)).add_modifier(Modifier::BOLD),
        Priority::Medium => Style::default().fg(Color::Indexed(214)),
        Priority::Low => Style::default().fg(Color::Indexed(34)),
    }
}

/// Pads or cuts `text` to exactly `width` columns (counted in chars).
fn cell(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

fn centered(text: &str, width: usize) -> String {
    let len = text.chars().count().min(width);
    let left = (width - len) / 2;
    cell(&format!("{}{}", " ".repeat(left), text), width)
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_WIDTH - 2 {
        let head: String = title.chars().take(TITLE_WIDTH - 5).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

fn header(app: &App) -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            " TODO ",
            Style::default()
                .bg(Color::Indexed(62))
                .fg(Color::Indexed(255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}/{} done", app.tasks.done_count(), app.tasks.len()),
            dim(),
        ),
    ])
}

fn table(app: &App) -> Vec<Line<'static>> {
    let head = Style::default()
        .fg(Color::Indexed(240))
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(cell("Status", STATUS_WIDTH), head),
            Span::styled(centered("Priority", PRIORITY_WIDTH), head),
            Span::styled(cell("Task", TITLE_WIDTH), head),
            Span::styled(cell("Deadline", DEADLINE_WIDTH), head),
        ]),
        Line::styled(
            "─".repeat(STATUS_WIDTH + PRIORITY_WIDTH + TITLE_WIDTH + DEADLINE_WIDTH),
            Style::default().fg(Color::Indexed(236)),
        ),
    ];
    lines.extend(
        app.tasks
            .iter()
            .map(|task| row(task, app.selection.is_selected(task))),
    );
    lines
}

fn row(task: &Task, selected: bool) -> Line<'static> {
    let base = if selected {
        Style::default().bg(Color::Indexed(235))
    } else {
        Style::default()
    };

    let mark = if task.done { "✓" } else { "○" };
    let status = if selected {
        format!("▶ {mark}")
    } else {
        mark.to_string()
    };

    let title_style = if task.done {
        base.fg(Color::Indexed(240)).add_modifier(Modifier::CROSSED_OUT)
    } else {
        base
    };

    let deadline_style = if task.is_overdue() {
        base.fg(Color::Indexed(160)).add_modifier(Modifier::BOLD)
    } else {
        base.patch(dim())
    };

    Line::from(vec![
        Span::styled(cell(&status, STATUS_WIDTH), base.patch(accent())),
        Span::styled(
            centered(task.priority.label(), PRIORITY_WIDTH),
            base.patch(priority_style(task.priority)),
        ),
        Span::styled(cell(&truncate_title(&task.title), TITLE_WIDTH), title_style),
        Span::styled(cell(&task.format_deadline(), DEADLINE_WIDTH), deadline_style),
    ])
}

fn input_line(app: &App) -> Line<'static> {
    let mut spans = vec![Span::raw("  "), Span::styled("» ", accent())];
    if app.input.is_empty() {
        spans.push(Span::styled(" ", Style::default().bg(Color::Cyan)));
        spans.push(Span::styled(app.input.placeholder.clone(), dim()));
        return Line::from(spans);
    }

    let (text, at) = app.input.visible();
    let chars: Vec<char> = text.chars().collect();
    let before: String = chars[..at].iter().collect();
    let under = chars.get(at).map(|c| c.to_string()).unwrap_or_else(|| " ".into());
    let after: String = chars.get(at + 1..).map(|c| c.iter().collect()).unwrap_or_default();
    spans.push(Span::raw(before));
    spans.push(Span::styled(under, Style::default().bg(Color::Cyan).fg(Color::Black)));
    spans.push(Span::raw(after));
    Line::from(spans)
}

fn priority_picker(choice: Priority) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw(" Choose priority:"), Line::raw("")];
    for priority in Priority::ALL {
        if priority == choice {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("┃ ", accent()),
                Span::styled(priority.label(), focused()),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(priority.label(), dim()),
            ]));
        }
    }
    lines
}

fn date_picker(picker: &DatePicker) -> Line<'static> {
    let v = picker.value;
    let part = |text: String, field: DateField| {
        if picker.field == field {
            Span::styled(text, focused())
        } else {
            Span::raw(text)
        }
    };
    Line::from(vec![
        Span::raw("  Deadline: "),
        part(v.format("%Y").to_string(), DateField::Year),
        Span::raw("-"),
        part(v.format("%m").to_string(), DateField::Month),
        Span::raw("-"),
        part(v.format("%d").to_string(), DateField::Day),
        Span::raw(" "),
        part(v.format("%H").to_string(), DateField::Hour),
        Span::raw(":"),
        part(v.format("%M").to_string(), DateField::Minute),
        Span::raw(":"),
        part(v.format("%S").to_string(), DateField::Second),
    ])
}

fn interaction(app: &App) -> Vec<Line<'static>> {
    match &app.mode {
        Mode::Normal => vec![Line::raw(""), Line::styled(HELP, dim())],
        Mode::InputTitle(_) => vec![Line::raw(""), input_line(app)],
        Mode::PickPriority { choice, .. } => {
            let mut lines = vec![Line::raw("")];
            lines.extend(priority_picker(*choice));
            lines
        }
        Mode::PickDate { picker, .. } => vec![Line::raw(""), date_picker(picker)],
    }
}

/// Every line of the screen for the given state.
pub fn lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw(""), header(app), Line::raw("")];

    if app.tasks.is_empty() {
        lines.push(Line::styled(format!("  {EMPTY}"), dim()));
    } else {
        lines.extend(table(app));
    }

    lines.extend(interaction(app));

    if let Some(status) = &app.status {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("● ", Style::default().fg(Color::Indexed(220))),
            Span::raw(status.clone()),
        ]));
    }
    lines
}

/// The screen as plain text, styles dropped.
pub fn render(app: &App) -> String {
    lines(app)
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
