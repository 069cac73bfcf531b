use crate::aggregator::summarize;
use crate::interpreter::Interpreter;
use crate::ledger;
use crate::session::{Role, Session};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use rand::Rng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

pub struct App<R = StdRng> {
    pub session: Session,
    pub interpreter: Interpreter<R>,
    pub input: String,
    pub sales_state: TableState,
}

impl<R: Rng> App<R> {
    pub fn new(interpreter: Interpreter<R>, session: Session) -> Self {
        let mut app = Self {
            session,
            interpreter,
            input: String::new(),
            sales_state: TableState::default(),
        };
        app.select_last_sale();
        app
    }

    /// Feed one key press. Returns false when the shell should close.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc => return false,
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            _ => {}
        }
        !self.session.ended
    }

    pub fn submit(&mut self) {
        let utterance = std::mem::take(&mut self.input);
        if let Some(reply) = self.session.submit(&mut self.interpreter, &utterance) {
            if reply.refresh.contains(&ledger::Table::Sales) {
                self.select_last_sale();
            }
        }
    }

    fn currency(&self) -> &str {
        &self.interpreter.ledger().config().currency
    }

    fn select_last_sale(&mut self) {
        let len = self.session.sales.len();
        self.sales_state.select(len.checked_sub(1));
    }

    pub fn next(&mut self) {
        let len = self.session.sales.len();
        if len == 0 {
            return;
        }
        let i = match self.sales_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.sales_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.session.sales.len();
        if len == 0 {
            return;
        }
        let i = match self.sales_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.sales_state.select(Some(i));
    }
}

pub fn run_ui<R: Rng>(app: &mut App<R>) -> Result<()> {
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

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, R: Rng>(
    terminal: &mut Terminal<B>,
    app: &mut App<R>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui<R: Rng>(f: &mut Frame, app: &mut App<R>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Chat
            Constraint::Percentage(60), // Tables
        ])
        .split(f.size());

    let chat = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Transcript
            Constraint::Length(3), // Input line
        ])
        .split(columns[0]);

    render_transcript(f, chat[0], app);
    render_input(f, chat[1], app);

    let tables = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Total
            Constraint::Percentage(45), // Sales
            Constraint::Percentage(25), // Customers
            Constraint::Min(0),         // Products
        ])
        .split(columns[1]);

    render_total(f, tables[0], app);
    render_sales(f, tables[1], app);
    render_customers(f, tables[2], app);
    render_products(f, tables[3], app);
}

fn render_transcript<R: Rng>(f: &mut Frame, area: Rect, app: &App<R>) {
    let mut lines = Vec::new();

    for message in &app.session.transcript {
        let style = match message.role {
            Role::User => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            Role::Bot => Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        };

        for (i, text) in message.content.lines().enumerate() {
            let prefix = if i == 0 {
                format!("{} {}: ", message.at.format("%H:%M"), message.role.label())
            } else {
                "       ".to_string()
            };
            lines.push(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(text.to_string(), style),
            ]));
        }
    }

    // Keep the newest messages in view
    let visible = area.height.saturating_sub(2) as usize;
    let offset = lines.len().saturating_sub(visible) as u16;

    let transcript = Paragraph::new(lines).scroll((offset, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 💬 Chat with your Sales Bot "),
    );

    f.render_widget(transcript, area);
}

fn render_input<R: Rng>(f: &mut Frame, area: Rect, app: &App<R>) {
    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(app.input.as_str()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Enter send | Esc quit "),
    );

    f.render_widget(input, area);
}

fn render_total<R: Rng>(f: &mut Frame, area: Rect, app: &App<R>) {
    let summary = summarize(&app.session.sales);

    let text = Line::from(vec![
        Span::styled(
            format!(" 💰 Total Sales: {:.2} {}", summary.total, app.currency()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("{} sales, {} units", summary.count, summary.units),
            Style::default().fg(Color::White),
        ),
    ]);

    let total = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(total, area);
}

fn header_row(titles: &[String]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(h.clone()).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_sales<R: Rng>(f: &mut Frame, area: Rect, app: &mut App<R>) {
    let currency = app.currency().to_string();
    let header = header_row(&[
        "Product".to_string(),
        "Quantity".to_string(),
        format!("Price ({})", currency),
        format!("Total ({})", currency),
    ]);

    let rows = app.session.sales.iter().map(|sale| {
        Row::new(vec![
            Cell::from(sale.product.clone()),
            Cell::from(sale.quantity.to_string()),
            Cell::from(format!("{:.2}", sale.unit_price)),
            Cell::from(format!("{:.2}", sale.total)).style(Style::default().fg(Color::Green)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 📊 Sales Records "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.sales_state);
}

fn render_customers<R: Rng>(f: &mut Frame, area: Rect, app: &App<R>) {
    let rows = app
        .session
        .customers
        .iter()
        .map(|c| Row::new(vec![Cell::from(c.name.clone())]));

    let table = Table::new(rows, [Constraint::Min(20)])
        .header(header_row(&["Customer Name".to_string()]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" 👥 Customer List "),
        );

    f.render_widget(table, area);
}

fn render_products<R: Rng>(f: &mut Frame, area: Rect, app: &App<R>) {
    let rows = app.session.products.iter().map(|p| {
        Row::new(vec![
            Cell::from(p.name.clone()),
            Cell::from(format!("{:.2}", p.price)),
        ])
    });

    let table = Table::new(rows, [Constraint::Length(20), Constraint::Length(16)])
        .header(header_row(&[
            "Product".to_string(),
            format!("Price ({})", app.currency()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" 📦 Product Inventory "),
        );

    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ledger::Ledger;
    use rand::rngs::mock::StepRng;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App<StepRng>) {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(Config::with_data_dir(dir.path())).unwrap();
        let session = Session::open(&ledger).unwrap();
        let app = App::new(Interpreter::with_rng(ledger, StepRng::new(0, 0)), session);
        (dir, app)
    }

    fn type_line<R: Rng>(app: &mut App<R>, line: &str) -> bool {
        for c in line.chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter)
    }

    #[test]
    fn test_typing_and_submitting() {
        let (_dir, mut app) = test_app();

        assert!(type_line(&mut app, "add sale apple 5 200"));
        assert!(app.input.is_empty());
        assert_eq!(app.session.sales.len(), 1);
        assert_eq!(app.sales_state.selected(), Some(0));
    }

    #[test]
    fn test_backspace_edits_input() {
        let (_dir, mut app) = test_app();

        app.handle_key(KeyCode::Char('h'));
        app.handle_key(KeyCode::Char('x'));
        app.handle_key(KeyCode::Backspace);
        assert_eq!(app.input, "h");
    }

    #[test]
    fn test_bye_closes_shell() {
        let (_dir, mut app) = test_app();

        assert!(!type_line(&mut app, "bye"));
        assert!(app.session.ended);
    }

    #[test]
    fn test_escape_closes_shell() {
        let (_dir, mut app) = test_app();
        assert!(!app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn test_sales_navigation_wraps() {
        let (_dir, mut app) = test_app();

        type_line(&mut app, "add sale apple 5 200");
        type_line(&mut app, "add sale rice 2 400");
        assert_eq!(app.sales_state.selected(), Some(1));

        app.next();
        assert_eq!(app.sales_state.selected(), Some(0));
        app.previous();
        assert_eq!(app.sales_state.selected(), Some(1));
    }

    #[test]
    fn test_other_tables_keep_sales_cursor() {
        let (_dir, mut app) = test_app();

        type_line(&mut app, "add sale apple 5 200");
        type_line(&mut app, "add sale rice 2 400");
        app.next();
        assert_eq!(app.sales_state.selected(), Some(0));

        type_line(&mut app, "add customer alice");
        type_line(&mut app, "add product oil 900");
        assert_eq!(app.sales_state.selected(), Some(0));

        type_line(&mut app, "add sale mango 1 50");
        assert_eq!(app.sales_state.selected(), Some(2));
    }
}
