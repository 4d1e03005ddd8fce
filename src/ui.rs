//! Terminal rendering of a snapshot.
//!
//! Drawing is a pure function of the snapshot, the poll statistics and the
//! display options. Nothing here keeps state between frames.

use herakles_top::{PollStats, ProcessMetric, Snapshot, SortKey};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

/// Display settings taken from the effective configuration.
#[derive(Debug, Clone)]
pub struct UiOptions {
    pub display_limit: usize,
    pub cpu_warn_percent: f64,
    pub mem_warn_percent: f64,
    /// Row to emphasise, normally our own pid.
    pub highlight_pid: Option<u32>,
}

const KEY_HELP: &str = "q quit  c cpu  m mem  p pid  Tab cycle";

/// Paints one frame.
pub fn draw(frame: &mut Frame, snapshot: &Snapshot, stats: &PollStats, options: &UiOptions) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, snapshot, chunks[0]);
    draw_system(frame, snapshot, options, chunks[1]);
    draw_processes(frame, snapshot, options, chunks[2]);
    draw_footer(frame, snapshot, stats, chunks[3]);
}

fn draw_header(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            "herakles-top",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {}  cycle {}  ",
            snapshot.taken_at.format("%H:%M:%S"),
            snapshot.cycle
        )),
        Span::styled(KEY_HELP, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_system(frame: &mut Frame, snapshot: &Snapshot, options: &UiOptions, area: Rect) {
    let system = &snapshot.system;
    let mem_percent = system.mem_used_percent();

    let line = Line::from(vec![
        Span::styled("CPU ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("{:5.1}%", system.cpu_percent),
            Style::default().fg(level_color(system.cpu_percent, options.cpu_warn_percent)),
        ),
        Span::raw("   "),
        Span::styled("MEM ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "{:.1}/{:.1} MB ({:.1}%)",
                system.mem_used_mb, system.mem_total_mb, mem_percent
            ),
            Style::default().fg(level_color(mem_percent, options.mem_warn_percent)),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_processes(frame: &mut Frame, snapshot: &Snapshot, options: &UiOptions, area: Rect) {
    let shown = snapshot.processes.top(options.display_limit);

    let title = format!(
        " Processes ({}/{}) | Sort: {} {} ",
        shown.len(),
        snapshot.processes.len(),
        snapshot.sort.label(),
        sort_arrow(snapshot.sort)
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let header = Row::new(vec![
        column_title(SortKey::ByPid, snapshot.sort),
        Span::raw("NAME"),
        Span::raw("S"),
        column_title(SortKey::ByCpu, snapshot.sort),
        column_title(SortKey::ByMem, snapshot.sort),
    ])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = shown.iter().map(|p| process_row(p, options)).collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(2),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn process_row<'a>(p: &'a ProcessMetric, options: &UiOptions) -> Row<'a> {
    let own = options.highlight_pid == Some(p.pid);
    let base = if own {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let cpu_style = if own {
        base
    } else {
        Style::default().fg(level_color(p.cpu_metric, options.cpu_warn_percent))
    };

    Row::new(vec![
        Span::styled(format!("{:>7}", p.pid), base),
        Span::styled(p.name.as_str(), base),
        Span::styled(p.state.to_string(), base),
        Span::styled(format!("{:>7.1}", p.cpu_metric), cpu_style),
        Span::styled(format!("{:>9.1}", p.mem_metric), base),
    ])
}

fn draw_footer(frame: &mut Frame, snapshot: &Snapshot, stats: &PollStats, area: Rect) {
    let last = &stats.last;
    let mut spans = vec![Span::styled(
        format!(
            "poll {:.1}ms (avg {:.1}, max {:.1}) | {} sampled (avg {:.0}) | {} vanished",
            stats.cycle_ms.last(),
            stats.cycle_ms.avg(),
            stats.cycle_ms.max(),
            last.sampled,
            stats.processes_sampled.avg(),
            stats.vanished_total
        ),
        Style::default().fg(Color::DarkGray),
    )];

    if stats.unreadable_total > 0 {
        spans.push(Span::styled(
            format!(" | {} unreadable", stats.unreadable_total),
            Style::default().fg(Color::Yellow),
        ));
    }
    if snapshot.processes.overflow() > 0 {
        spans.push(Span::styled(
            format!(" | {} over capacity", snapshot.processes.overflow()),
            Style::default().fg(Color::Yellow),
        ));
    }
    if last.enumeration_failed {
        spans.push(Span::styled(
            " | process list unavailable",
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Ascending for pid, descending for the metrics.
fn sort_arrow(key: SortKey) -> &'static str {
    match key {
        SortKey::ByPid => "↑",
        SortKey::ByCpu | SortKey::ByMem => "↓",
    }
}

fn column_title(key: SortKey, active: SortKey) -> Span<'static> {
    if key == active {
        Span::styled(
            format!("{}{}", key.label(), sort_arrow(key)),
            Style::default().add_modifier(Modifier::UNDERLINED),
        )
    } else {
        Span::raw(key.label())
    }
}

fn level_color(percent: f64, warn: f64) -> Color {
    if percent >= warn {
        Color::Red
    } else if percent >= warn / 2.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}
