//! Bottom status bar: scan progress, latest status message, notices.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();

    spans.push(Span::styled(" 1:Candidates 2:Universe 3:Help", theme::muted()));
    spans.push(Span::raw(" | "));

    if app.scan.running {
        let pct = if app.scan.total == 0 {
            0
        } else {
            app.scan.completed * 100 / app.scan.total
        };
        spans.push(Span::styled(format!("scan {pct}% "), theme::warning()));
    }

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    for notice in &app.notices {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(notice.as_str(), theme::warning()));
    }

    let para = Paragraph::new(Line::from(spans));
    f.render_widget(para, area);
}
