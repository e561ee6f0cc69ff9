//! Universe panel: groups and tickers with cache coverage.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let u = &app.universe;
    let cached = u.cache_status.values().filter(|c| **c).count();
    let total = u.universe.ticker_count();

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("Tickers: ", theme::muted()),
            Span::styled(format!("{total}"), theme::accent()),
            Span::styled(" | Cached: ", theme::muted()),
            Span::styled(format!("{cached}/{total}"), theme::accent()),
            Span::styled(
                format!(" | Cache dir: {}", app.cache_dir.display()),
                theme::muted(),
            ),
        ]),
        Line::from(""),
    ];

    let mut rows: Vec<Line> = Vec::new();
    for group in u.universe.group_names() {
        let tickers = u.universe.group_tickers(group).unwrap_or(&[]);
        let style = if rows.len() == u.cursor {
            theme::accent_bold().add_modifier(Modifier::REVERSED)
        } else {
            theme::accent_bold()
        };
        rows.push(Line::from(Span::styled(
            format!("{group} ({})", tickers.len()),
            style,
        )));

        for ticker in tickers {
            let is_cached = u.cache_status.get(ticker).copied().unwrap_or(false);
            let (mark, mark_style) = if is_cached {
                ("●", theme::positive())
            } else {
                ("○", theme::muted())
            };
            let text_style = if rows.len() == u.cursor {
                theme::accent().add_modifier(Modifier::REVERSED)
            } else {
                theme::text()
            };
            rows.push(Line::from(vec![
                Span::styled(format!("  {mark} "), mark_style),
                Span::styled(ticker.clone(), text_style),
            ]));
        }
    }

    let height = (area.height as usize).saturating_sub(lines.len());
    let start = super::scroll_start(u.cursor, height);
    lines.extend(rows.into_iter().skip(start).take(height));

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

#[cfg(test)]
mod tests {
    use crate::app::tests::test_app;
    use crate::app::Panel;
    use crate::ui::render_to_string;

    #[test]
    fn lists_groups_and_cache_marks() {
        let (mut app, _rx) = test_app();
        app.active_panel = Panel::Universe;
        let first = app.universe.universe.all_tickers()[0].to_string();
        app.universe.cache_status.insert(first.clone(), true);

        let screen = render_to_string(&app, 100, 200);
        assert!(screen.contains(&first));
        assert!(screen.contains("●"));
        assert!(screen.contains(&format!("Cached: 1/{}", app.universe.universe.ticker_count())));
    }
}
