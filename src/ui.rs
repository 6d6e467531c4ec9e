// 🖥️ Tracking View - terminal UI over a live processor
//
// The user types a shipment id to start tracking it. Each tracked shipment
// gets its own Tracker observer; cards are redrawn from the trackers' views
// while a background replay keeps mutating the shipments.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use shipment_tracker::{CalendarZone, ObserverId, SharedProcessor, ShipmentObserver, Tracker, TrackerView};
use std::io;
use std::sync::Arc;
use std::time::Duration;

const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

struct TrackedShipment {
    tracker: Arc<Tracker>,
    observer_id: ObserverId,
}

pub struct App {
    processor: SharedProcessor,
    zone: CalendarZone,
    tracked: Vec<TrackedShipment>,
    pub input: String,
    pub error_message: Option<String>,
    pub state: TableState,
    pub simulation_status: String,
}

impl App {
    pub fn new(processor: SharedProcessor) -> Self {
        let zone = processor.lock().rules().zone();

        Self {
            processor,
            zone,
            tracked: Vec::new(),
            input: String::new(),
            error_message: None,
            state: TableState::default(),
            simulation_status: "Simulation running".to_string(),
        }
    }

    pub fn is_tracked(&self, shipment_id: &str) -> bool {
        self.tracked
            .iter()
            .any(|entry| entry.tracker.shipment_id() == shipment_id)
    }

    /// Attach a tracker to an existing shipment and pull its current state
    pub fn track(&mut self, shipment_id: &str) -> Result<(), String> {
        let shipment_id = shipment_id.trim();
        if self.is_tracked(shipment_id) {
            return Err(format!("Shipment {} is already being tracked.", shipment_id));
        }

        let mut processor = self.processor.lock();
        let shipment = processor
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| format!("Shipment with ID '{}' not found.", shipment_id))?;

        let tracker = Arc::new(Tracker::new(shipment_id, self.zone));
        let observer_id = shipment.add_observer(tracker.clone());
        tracker.notify(shipment);
        drop(processor);

        tracing::info!(shipment_id, "started tracking shipment");
        self.tracked.push(TrackedShipment { tracker, observer_id });
        self.state.select(Some(self.tracked.len() - 1));
        Ok(())
    }

    /// Detach the tracker so the shipment stops notifying it
    pub fn stop_tracking(&mut self, shipment_id: &str) -> Result<(), String> {
        let shipment_id = shipment_id.trim();
        let index = self
            .tracked
            .iter()
            .position(|entry| entry.tracker.shipment_id() == shipment_id)
            .ok_or_else(|| format!("Shipment {} is not currently tracked.", shipment_id))?;

        let entry = self.tracked.remove(index);
        if let Some(shipment) = self.processor.lock().find_shipment_mut(shipment_id) {
            shipment.remove_observer(entry.observer_id);
        }
        tracing::info!(shipment_id, "stopped tracking shipment");

        let selected = match self.tracked.len() {
            0 => None,
            len => Some(index.min(len - 1)),
        };
        self.state.select(selected);
        Ok(())
    }

    /// Track the id in the input box
    pub fn submit(&mut self) {
        let id = self.input.trim().to_string();
        if id.is_empty() {
            return;
        }
        match self.track(&id) {
            Ok(()) => {
                self.error_message = None;
                self.input.clear();
            }
            Err(message) => self.error_message = Some(message),
        }
    }

    /// Stop tracking the id in the input box, or the selected card when it is empty
    pub fn stop_selected(&mut self) {
        let id = if self.input.trim().is_empty() {
            match self.selected_view() {
                Some(view) => view.shipment_id,
                None => return,
            }
        } else {
            self.input.trim().to_string()
        };

        match self.stop_tracking(&id) {
            Ok(()) => {
                self.error_message = None;
                self.input.clear();
            }
            Err(message) => self.error_message = Some(message),
        }
    }

    pub fn views(&self) -> Vec<TrackerView> {
        self.tracked.iter().map(|entry| entry.tracker.view()).collect()
    }

    pub fn selected_view(&self) -> Option<TrackerView> {
        self.state
            .selected()
            .and_then(|i| self.tracked.get(i))
            .map(|entry| entry.tracker.view())
    }

    pub fn next(&mut self) {
        let len = self.tracked.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.tracked.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Detach every tracker before the UI goes away
    pub fn detach_all(&mut self) {
        let ids: Vec<String> = self
            .tracked
            .iter()
            .map(|entry| entry.tracker.shipment_id().to_string())
            .collect();
        for id in ids {
            let _ = self.stop_tracking(&id);
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.detach_all();
    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Redraw on a timer as well, the replay thread changes shipments underneath us
        if !event::poll(REFRESH_INTERVAL)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('x') if key.modifiers.contains(KeyModifiers::CONTROL) => app.stop_selected(),
                KeyCode::Delete => app.stop_selected(),
                KeyCode::Enter => app.submit(),
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Down => app.next(),
                KeyCode::Up => app.previous(),
                KeyCode::Char(c) => app.input.push(c),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Shipment id input
            Constraint::Min(0),    // Tracked shipments
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_input(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_table(f, content_chunks[0], app);
    render_detail_panel(f, content_chunks[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let input = Paragraph::new(Line::from(vec![
        Span::styled("Shipment ID: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(app.input.as_str()),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Shipment Tracking Simulator "),
    );

    f.render_widget(input, area);
}

fn status_color(status: &str) -> Color {
    match status {
        "Delivered" => Color::Green,
        "Shipped" | "Created" => Color::Cyan,
        "Delayed" => Color::Yellow,
        "Lost" | "Canceled" => Color::Red,
        _ => Color::White,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let views = app.views();

    if views.is_empty() {
        let empty = Paragraph::new("No shipments currently tracked. Enter an ID above to start tracking.")
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Tracked Shipments "));
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["ID", "Type", "Status", "Location", "Expected Delivery"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = views.iter().map(|view| {
        let mut id_style = Style::default();
        if view.has_violations() {
            id_style = id_style.fg(Color::Red);
        }

        Row::new(vec![
            Cell::from(view.shipment_id.clone()).style(id_style),
            Cell::from(view.shipment_type.clone().unwrap_or_else(|| "-".to_string())),
            Cell::from(view.status.clone()).style(Style::default().fg(status_color(&view.status))),
            Cell::from(truncate(view.current_location.as_deref().unwrap_or("N/A"), 20)),
            Cell::from(view.expected_delivery.clone().unwrap_or_else(|| "N/A".to_string())),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(22),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Tracked Shipments "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Shipment Details ");

    let view = match app.selected_view() {
        Some(view) => view,
        None => {
            f.render_widget(Paragraph::new("No shipment selected").block(block), area);
            return;
        }
    };

    let mut content = vec![
        Line::from(""),
        field("Shipment ID", view.shipment_id.clone()),
        field("Status", view.status.clone()),
        field("Location", view.current_location.clone().unwrap_or_else(|| "N/A".to_string())),
        field(
            "Expected Delivery",
            view.expected_delivery.clone().unwrap_or_else(|| "N/A".to_string()),
        ),
        Line::from(""),
    ];

    if !view.rule_violations.is_empty() {
        content.push(section("RULE VIOLATIONS"));
        for violation in &view.rule_violations {
            content.push(Line::from(Span::styled(
                format!("  - {}", violation),
                Style::default().fg(Color::Red),
            )));
        }
        content.push(Line::from(""));
    }

    if !view.notes.is_empty() {
        content.push(section("NOTES"));
        for note in &view.notes {
            content.push(Line::from(format!("  - {}", note)));
        }
        content.push(Line::from(""));
    }

    if !view.update_history.is_empty() {
        content.push(section("UPDATE HISTORY"));
        for update in &view.update_history {
            content.push(Line::from(Span::styled(
                format!("  - {}", update),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let detail_panel = Paragraph::new(content).wrap(Wrap { trim: false }).block(block);
    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.simulation_status),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.error_message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Red)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Track | "));
    status_spans.push(Span::styled("Ctrl-X/Del", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Stop | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
