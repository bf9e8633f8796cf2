use crate::config::DashboardConfig;
use crate::metrics::{format_percent, ModelMetrics};
use crate::risk::{RiskBand, RiskSummary, RiskTable};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use std::io;

pub struct App {
    pub summary: RiskSummary,
    pub metrics: ModelMetrics,
    /// Display labels of the driver features, same as the HTML page
    pub config: DashboardConfig,
    /// Driver shown in the detail table
    pub selected_driver: usize,
}

impl App {
    pub fn new(summary: RiskSummary, config: DashboardConfig) -> Self {
        Self {
            summary,
            metrics: config.metrics,
            config,
            selected_driver: 0,
        }
    }

    pub fn label_for<'a>(&'a self, feature: &'a str) -> &'a str {
        self.config.label_for(feature)
    }

    pub fn next_driver(&mut self) {
        let len = self.summary.drivers.len();
        if len > 0 {
            self.selected_driver = (self.selected_driver + 1) % len;
        }
    }

    pub fn previous_driver(&mut self) {
        let len = self.summary.drivers.len();
        if len > 0 {
            self.selected_driver = (self.selected_driver + len - 1) % len;
        }
    }

    pub fn selected(&self) -> Option<&RiskTable> {
        self.summary.drivers.get(self.selected_driver)
    }
}

fn band_color(band: RiskBand) -> Color {
    match band {
        RiskBand::Low => Color::LightGreen,
        RiskBand::Elevated => Color::Yellow,
        RiskBand::High => Color::LightRed,
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "terminal dashboard failed");
    }

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_driver();
                    } else {
                        app.next_driver();
                    }
                }
                KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.previous_driver(),
                KeyCode::Right | KeyCode::Char('l') => app.next_driver(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Overall rate gauge
            Constraint::Percentage(45), // Driver bar charts
            Constraint::Min(0),         // Detail table + metrics
            Constraint::Length(3),      // Status bar
        ])
        .split(f.size());

    render_gauge(f, chunks[0], app);
    render_drivers(f, chunks[1], app);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    render_detail(f, bottom[0], app);
    render_metrics(f, bottom[1], app);
    render_status_bar(f, chunks[3], app);
}

fn render_gauge(f: &mut Frame, area: Rect, app: &App) {
    let summary = &app.summary;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Overall Loan Default Rate "),
        )
        .gauge_style(Style::default().fg(band_color(summary.band)))
        .ratio(summary.overall_default_rate.clamp(0.0, 1.0))
        .label(format!(
            "{} ({} of {} loans, {} risk)",
            format_percent(summary.overall_default_rate, 1),
            summary.total_defaults,
            summary.total_loans,
            summary.band.name()
        ));

    f.render_widget(gauge, area);
}

fn render_drivers(f: &mut Frame, area: Rect, app: &App) {
    let drivers = &app.summary.drivers;
    if drivers.is_empty() {
        let empty = Paragraph::new("No driver features configured")
            .block(Block::default().borders(Borders::ALL).title(" Drivers "));
        f.render_widget(empty, area);
        return;
    }

    let constraints: Vec<Constraint> = drivers
        .iter()
        .map(|_| Constraint::Ratio(1, drivers.len() as u32))
        .collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, table) in drivers.iter().enumerate() {
        let bars: Vec<Bar> = table
            .rows
            .iter()
            .map(|row| {
                Bar::default()
                    .label(Line::from(row.category.clone()))
                    // Tenths of a percent keep one decimal of precision
                    .value((row.default_rate * 1000.0).round() as u64)
                    .text_value(format_percent(row.default_rate, 1))
                    .style(Style::default().fg(band_color(RiskBand::from_rate(row.default_rate))))
            })
            .collect();

        let border_style = if i == app.selected_driver {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" Risk by {} ", app.label_for(&table.feature))),
            )
            .data(BarGroup::default().bars(&bars))
            .bar_width(9)
            .bar_gap(2)
            .max(1000);

        f.render_widget(chart, columns[i]);
    }
}

fn render_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(table) = app.selected() else {
        return;
    };

    let header = Row::new(vec!["Category", "Loans", "Defaults", "Rate"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.category.clone()),
                Cell::from(row.loans.to_string()),
                Cell::from(row.defaults.to_string()),
                Cell::from(format_percent(row.default_rate, 1)),
            ])
        })
        .collect();

    let widget = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", app.label_for(&table.feature))),
    );

    f.render_widget(widget, area);
}

fn render_metrics(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = app
        .metrics
        .insights()
        .into_iter()
        .map(|insight| {
            Line::from(vec![
                Span::styled(
                    format!("{}: ", insight.label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(insight.text),
            ])
        })
        .collect();

    let ranked: Vec<String> = app
        .summary
        .ranked_drivers()
        .iter()
        .map(|t| app.label_for(&t.feature).to_string())
        .collect();
    if !ranked.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Key drivers: ", Style::default().fg(Color::Cyan)),
            Span::raw(ranked.join(", ")),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Model Evaluation & Insights "),
        );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app
        .selected()
        .map(|t| app.label_for(&t.feature))
        .unwrap_or("-");

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" q ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" quit  "),
        Span::styled(" Tab ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" next driver  "),
        Span::raw(format!("│ Showing: {}", selected)),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskRow;
    use ratatui::backend::TestBackend;

    fn create_test_app() -> App {
        let table = |feature: &str| RiskTable {
            feature: feature.to_string(),
            rows: vec![RiskRow {
                category: "Poor".to_string(),
                loans: 4,
                defaults: 3,
                default_rate: 0.75,
            }],
        };

        App::new(
            RiskSummary {
                total_loans: 8,
                total_defaults: 3,
                overall_default_rate: 0.375,
                band: RiskBand::Elevated,
                drivers: vec![table("Employment_Type"), table("Credit_History")],
            },
            DashboardConfig::default(),
        )
    }

    #[test]
    fn test_driver_selection_wraps() {
        let mut app = create_test_app();

        app.next_driver();
        assert_eq!(app.selected().unwrap().feature, "Credit_History");
        app.next_driver();
        assert_eq!(app.selected_driver, 0);
        app.previous_driver();
        assert_eq!(app.selected_driver, 1);
    }

    #[test]
    fn test_draws_without_panicking() {
        let app = create_test_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        terminal.draw(|f| ui(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Overall Loan Default Rate"));
        assert!(text.contains("37.5%"));
        assert!(text.contains("Risk by Employment Type"));
        assert!(text.contains("Risk by Credit History"));
        assert!(!text.contains("Risk by Credit_History"));
    }
}
