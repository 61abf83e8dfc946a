use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph, Wrap},
};
use furnish_core::{
    analytics::DerivedChartData, AnalyticsView, Message, MessageContent, Page, Recommendation,
    Sender,
};
use crate::app::{App, InputMode};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.page {
        Page::Recommendation => render_chat_page(app, frame, body_area),
        Page::Analytics => render_analytics_page(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" AI Furniture Hub ", Style::default().fg(Color::Magenta).bold()),
        Span::raw(" "),
    ];

    for page in Page::all() {
        let style = if page == app.page {
            Style::default().bg(Color::Magenta).fg(Color::White).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", page.display_name()), style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(app.api_url.clone(), Style::default().fg(Color::DarkGray)));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mode = match (app.page, app.input_mode) {
        (Page::Analytics, _) => Span::styled(" DASHBOARD ", Style::default().bg(Color::Blue).fg(Color::White)),
        (Page::Recommendation, InputMode::Normal) => {
            Span::styled(" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
        }
        (Page::Recommendation, InputMode::Editing) => {
            Span::styled(" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black))
        }
    };

    let keys: &[(&str, &str)] = match (app.page, app.input_mode) {
        (Page::Recommendation, InputMode::Editing) => &[
            ("Enter", "ask"),
            ("Esc", "normal"),
            ("Tab", "analytics"),
        ],
        (Page::Recommendation, InputMode::Normal) => &[
            ("i", "type"),
            ("j/k", "scroll"),
            ("g/G", "top/bottom"),
            ("Tab", "analytics"),
            ("q", "quit"),
        ],
        (Page::Analytics, _) => &[
            ("r", "reload"),
            ("Tab", "chat"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![mode, Span::raw(" ")];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Recommendation chat
// ---------------------------------------------------------------------------

fn render_chat_page(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Inner size minus borders, used for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.conversation.messages() {
        lines.extend(message_lines(msg));
    }

    if app.conversation.is_pending() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("AI is thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    app.fit_chat_scroll(wrapped_height(&lines, app.chat_width));

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Recommendation Chat ");

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn message_lines(msg: &Message) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match msg.sender {
        Sender::User => lines.push(Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))),
        Sender::Assistant => lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))),
    }

    match &msg.content {
        MessageContent::Text(text) => {
            for line in text.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        MessageContent::Recommendations(recs) if recs.is_empty() => {
            lines.push(Line::from(Span::styled(
                "No matching products found. Try describing it differently.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        MessageContent::Recommendations(recs) => {
            lines.push(Line::from(Span::styled(
                format!("Top {} Recommendations for You:", recs.len()),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )));
            for (i, rec) in recs.iter().enumerate() {
                lines.extend(recommendation_lines(i + 1, rec));
            }
        }
    }

    lines.push(Line::default());
    lines
}

fn recommendation_lines(position: usize, rec: &Recommendation) -> Vec<Line<'static>> {
    let price = rec.display_price();
    let price_style = if rec.price_value().is_some() {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    vec![
        Line::from(vec![
            Span::styled(format!(" {}. ", position), Style::default().fg(Color::DarkGray)),
            Span::styled(rec.display_title(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(price, price_style),
        ]),
        Line::from(vec![
            Span::styled("    AI Says: ", Style::default().fg(Color::Magenta).bold()),
            Span::styled(
                format!("\"{}\"", rec.creative_description),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(Span::styled(
            format!("    {}", rec.image_or_placeholder()),
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

/// Rows a set of lines takes once wrapped to `width` columns
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = if width == 0 { 50 } else { width as usize };
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let enabled = app.input_enabled();

    let border_color = if !enabled {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if enabled {
        " Describe the furniture you want "
    } else {
        " Waiting for recommendations... "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .conversation
        .draft()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if enabled { Color::Cyan } else { Color::DarkGray };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    if editing && enabled {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

// ---------------------------------------------------------------------------
// Analytics dashboard
// ---------------------------------------------------------------------------

fn render_analytics_page(app: &App, frame: &mut Frame, area: Rect) {
    match &app.analytics {
        AnalyticsView::Loading => {
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            render_centered(
                frame,
                area,
                Span::styled(format!("Loading Analytics Dashboard{}", dots), Style::default().bold()),
            );
        }
        AnalyticsView::Unavailable => {
            render_centered(
                frame,
                area,
                Span::styled(
                    "Could not load analytics data. Is the backend running? (r to retry)",
                    Style::default().fg(Color::Red).bold(),
                ),
            );
        }
        AnalyticsView::Loaded { snapshot, charts } => {
            render_dashboard(frame, area, snapshot.total_products, charts);
        }
    }
}

fn render_centered(frame: &mut Frame, area: Rect, span: Span<'static>) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage(45),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);
    frame.render_widget(Paragraph::new(Line::from(span)).alignment(Alignment::Center), middle);
}

fn render_dashboard(frame: &mut Frame, area: Rect, total_products: u64, charts: &DerivedChartData) {
    let [metrics_area, charts_area, brands_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Min(10),
        Constraint::Length(8),
    ])
    .areas(area);

    // Key metric cards
    let [total_area, brand_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(metrics_area);

    let total_card = Paragraph::new(vec![
        Line::from(Span::styled("Total Products Indexed", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            group_thousands(total_products),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Magenta)));
    frame.render_widget(total_card, total_area);

    let top_brand_count = charts
        .top_brand()
        .map(|b| format!("({} products)", group_thousands(b.count)))
        .unwrap_or_default();
    let brand_card = Paragraph::new(vec![
        Line::from(Span::styled("Top Brand", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            charts.top_brand_label().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(top_brand_count, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    frame.render_widget(brand_card, brand_area);

    // Charts
    let [categories_area, prices_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(charts_area);

    render_categories_chart(frame, categories_area, charts);
    render_price_chart(frame, prices_area, charts);
    render_brand_list(frame, brands_area, charts);
}

fn render_categories_chart(frame: &mut Frame, area: Rect, charts: &DerivedChartData) {
    let total: u64 = charts.top_categories.iter().map(|c| c.value).sum();
    let bars: Vec<Bar> = charts
        .top_categories
        .iter()
        .map(|c| {
            Bar::default()
                .label(Line::from(c.name.clone()))
                .value(c.value)
                .text_value(format!("{} ({:.0}%)", group_thousands(c.value), percent(c.value, total)))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Top Categories by Product Count "),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    render_bars(frame, area, chart, &bars);
}

fn render_price_chart(frame: &mut Frame, area: Rect, charts: &DerivedChartData) {
    let bars: Vec<Bar> = charts
        .avg_price
        .iter()
        .map(|m| {
            Bar::default()
                .label(Line::from(m.material.clone()))
                .value(m.avg_price.max(0.0).round() as u64)
                .text_value(format!("${:.2}", m.avg_price))
        })
        .collect();

    let count = bars.len().max(1) as u16;
    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / count).saturating_sub(1).clamp(3, 12);

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Average Price by Primary Material "),
        )
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::White).bg(Color::Magenta));

    render_bars(frame, area, chart, &bars);
}

fn render_bars<'a>(frame: &mut Frame, area: Rect, chart: BarChart<'a>, bars: &[Bar<'a>]) {
    if bars.is_empty() {
        frame.render_widget(chart, area);
    } else {
        frame.render_widget(chart.data(BarGroup::default().bars(bars)), area);
    }
}

fn render_brand_list(frame: &mut Frame, area: Rect, charts: &DerivedChartData) {
    let items: Vec<ListItem> = if charts.brand_distribution.is_empty() {
        vec![ListItem::new(Span::styled("No brand data", Style::default().fg(Color::DarkGray)))]
    } else {
        charts
            .brand_distribution
            .iter()
            .enumerate()
            .map(|(i, b)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {}. ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::raw(b.name.clone()),
                    Span::styled(format!("  {}", group_thousands(b.count)), Style::default().fg(Color::Cyan)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Brand Distribution "));
    frame.render_widget(list, area);
}

fn percent(value: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        value as f64 * 100.0 / total as f64
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use furnish_core::{AnalyticsSnapshot, ApiError, Backend};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct NoBackend;

    #[async_trait]
    impl Backend for NoBackend {
        async fn recommend(&self, _prompt: &str) -> Result<Vec<Recommendation>, ApiError> {
            Ok(Vec::new())
        }

        async fn analytics(&self) -> Result<AnalyticsSnapshot, ApiError> {
            Ok(serde_json::from_str(r#"{"total_products": 0}"#).unwrap())
        }
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1024), "1,024");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("a".repeat(25)), Line::default(), Line::from("short")];
        assert_eq!(wrapped_height(&lines, 10), 3 + 1 + 1);
    }

    #[test]
    fn test_recommendation_lines_use_sentinels() {
        let rec: Recommendation =
            serde_json::from_str(r#"{"title": "Stool", "price": "call us", "creative_description": "Tall."}"#).unwrap();
        let lines = recommendation_lines(1, &rec);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let last: String = lines[2].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.ends_with("N/A"));
        assert!(last.contains("placehold.co"));
    }

    #[test]
    fn test_chat_renders_greeting() {
        let mut app = App::new(Arc::new(NoBackend), "http://localhost:8000".to_string());
        let text = screen_text(&mut app);
        assert!(text.contains("Tell me what kind of furniture"));
        assert!(text.contains("Recommendation Chat"));
    }

    #[test]
    fn test_dashboard_unavailable_and_empty_brand() {
        let mut app = App::new(Arc::new(NoBackend), String::new());
        app.page = Page::Analytics;

        app.analytics = AnalyticsView::Unavailable;
        assert!(screen_text(&mut app).contains("Could not load analytics data"));

        app.analytics = AnalyticsView::from_snapshot(Some(
            serde_json::from_str(r#"{"total_products": 1024}"#).unwrap(),
        ));
        let text = screen_text(&mut app);
        assert!(text.contains("1,024"));
        assert!(text.contains("N/A"));
    }
}
