//! Candidates panel: screen results table and the selected verdict's checks.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use bearscan_core::screen::Condition;
use bearscan_core::Verdict;

use crate::app::AppState;
use crate::theme;

/// Lines used by the header and the detail footer.
const CHROME: usize = 6;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let c = &app.candidates;
    let mut lines: Vec<Line> = Vec::new();

    // Header
    let view = if c.show_all { "all verdicts" } else { "candidates" };
    let mut header = vec![
        Span::styled("View: ", theme::muted()),
        Span::styled(view, theme::accent()),
        Span::styled(" | Sort: ", theme::muted()),
        Span::styled(c.sort.label(), theme::accent()),
    ];
    if let Some(report) = &c.report {
        let s = report.summary();
        header.push(Span::styled(
            format!(
                " | as of {} | {}/{} candidates, {} excluded",
                report.as_of, s.candidates, s.evaluated, s.excluded
            ),
            theme::muted(),
        ));
    }
    header.push(Span::styled("  [s]can [a]ll [o]rder [x]cancel", theme::muted()));
    lines.push(Line::from(header));
    lines.push(Line::from(""));

    if app.scan.running {
        lines.push(Line::from(vec![
            Span::styled("Scanning ", theme::warning()),
            Span::styled(
                app.scan.current_symbol.as_deref().unwrap_or("..."),
                theme::accent(),
            ),
            Span::styled(
                format!(" [{}/{}]", app.scan.completed, app.scan.total),
                theme::muted(),
            ),
        ]));
        lines.push(Line::from(""));
    }

    let rows = c.rows();
    if c.report.is_none() {
        lines.push(Line::from(Span::styled(
            "No scan yet. Press s to screen the universe.",
            theme::muted(),
        )));
    } else if rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "No candidates. Press a to show every verdict.",
            theme::muted(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!(
                "{:<10} {:>9} {:>9} {:>9} {:>9} {:>7} {:>9} {:>5}  {}",
                "Symbol", "Close", "MA5", "MA20", "Dev%", "Vol", "Vol5", "Score", "Result"
            ),
            theme::accent_bold(),
        )));

        let height = (area.height as usize).saturating_sub(CHROME + lines.len());
        let start = super::scroll_start(c.cursor, height);
        let end = (start + height).min(rows.len());
        for (i, verdict) in rows.iter().enumerate().take(end).skip(start) {
            lines.push(verdict_line(verdict, i == c.cursor));
        }

        if let Some(selected) = app.selected_verdict() {
            lines.push(Line::from(""));
            lines.push(checks_line(selected));
        }
    }

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

fn verdict_line(v: &Verdict, is_cursor: bool) -> Line<'static> {
    let cursor_style = theme::accent().add_modifier(Modifier::REVERSED);
    let pick = |style| if is_cursor { cursor_style } else { style };

    let s = &v.snapshot;
    let (ma5, ma20, dev, vol5, score) = match &s.trend {
        Some(t) => (
            format!("{:>9.2}", t.ma_short),
            format!("{:>9.2}", t.ma_long),
            format!("{:>8.2}%", t.deviation * 100.0),
            format!("{:>9.0}", t.volume_avg),
            format!("{:>5}", t.bear_score),
        ),
        None => (
            format!("{:>9}", "-"),
            format!("{:>9}", "-"),
            format!("{:>9}", "-"),
            format!("{:>9}", "-"),
            format!("{:>5}", "-"),
        ),
    };
    let result = if v.candidate {
        "SHORT".to_string()
    } else {
        v.checks
            .first_failure()
            .map_or("-".to_string(), |c| format!("fail: {}", c.label()))
    };

    let dev_style = v.deviation().map_or(theme::muted(), theme::deviation_style);
    let score_style = v.bear_score().map_or(theme::muted(), theme::score_style);
    let result_style = if v.candidate {
        theme::negative()
    } else {
        theme::muted()
    };

    Line::from(vec![
        Span::styled(format!("{:<10} ", v.symbol), pick(theme::text())),
        Span::styled(format!("{:>9.2} ", s.close), pick(theme::text())),
        Span::styled(format!("{ma5} "), pick(theme::neutral())),
        Span::styled(format!("{ma20} "), pick(theme::neutral())),
        Span::styled(format!("{dev} "), pick(dev_style)),
        Span::styled(format!("{:>7} ", s.volume), pick(theme::text())),
        Span::styled(format!("{vol5} "), pick(theme::muted())),
        Span::styled(score, pick(score_style)),
        Span::styled(format!("  {result}"), pick(result_style)),
    ])
}

/// One mark per condition for the row under the cursor.
fn checks_line(v: &Verdict) -> Line<'static> {
    let mut spans = vec![Span::styled(format!("{}: ", v.symbol), theme::accent_bold())];
    for condition in Condition::ALL {
        let (mark, style) = match v.checks.get(condition) {
            Some(true) => ("+", theme::positive()),
            Some(false) => ("x", theme::negative()),
            None => ("·", theme::muted()),
        };
        spans.push(Span::styled(format!("{mark} {}  ", condition.label()), style));
    }
    Line::from(spans)
}
