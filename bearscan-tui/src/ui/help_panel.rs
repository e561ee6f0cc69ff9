//! Help panel: keyboard shortcuts and the screen rules.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global");
    key(&mut lines, "1-3", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "s", "Scan the universe");
    key(&mut lines, "x / Esc", "Cancel the running scan");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1 - Candidates");
    key(&mut lines, "j / k", "Move cursor down / up");
    key(&mut lines, "g / G", "Jump to first / last row");
    key(&mut lines, "a", "Toggle candidates only / all verdicts");
    key(&mut lines, "o", "Cycle sort: symbol, deviation, score");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2 - Universe");
    key(&mut lines, "j / k", "Scroll groups and tickers");
    lines.push(Line::from(""));

    section(&mut lines, "Screen (all must hold)");
    key(&mut lines, "Liquidity", "Volume above the lot threshold");
    key(&mut lines, "Downtrend break", "Close < MA5 and MA5 below yesterday's");
    key(&mut lines, "Bearish candle", "Close < open");
    key(&mut lines, "Overheated", "Close more than 5% above MA20");
    key(&mut lines, "Volume on decline", "Volume up while close is down");
    key(&mut lines, "Score", "Bear score 0-5, for ordering only");

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
