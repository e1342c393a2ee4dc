use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use poi_taxonomy::{
    Classification, DataProvider, SelectionAction, SelectionController, SelectionState,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

/// What a key press means for the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Up,
    Down,
    Top,
    Bottom,
    Act(SelectionAction),
}

/// Map a key to a command for the current screen
///
/// On the POI type screen printable characters go to the search line, so
/// only arrows navigate there.
pub fn command_for_key(
    state: SelectionState,
    query: &str,
    selected_key: Option<&str>,
    key: KeyEvent,
) -> Option<UiCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiCommand::Act(SelectionAction::Cancel));
    }

    let pick = |key: &str| match state {
        SelectionState::CategoryScreen => SelectionAction::PickCategory(key.to_string()),
        _ => SelectionAction::PickType(key.to_string()),
    };

    match key.code {
        KeyCode::Esc => Some(UiCommand::Act(SelectionAction::Cancel)),
        KeyCode::Up => Some(UiCommand::Up),
        KeyCode::Down => Some(UiCommand::Down),
        KeyCode::Home => Some(UiCommand::Top),
        KeyCode::End => Some(UiCommand::Bottom),
        KeyCode::Enter => selected_key.map(|k| UiCommand::Act(pick(k))),
        KeyCode::Left => Some(UiCommand::Act(SelectionAction::Back)),
        KeyCode::Backspace => match state {
            SelectionState::PoiTypeScreen if !query.is_empty() => {
                let mut shorter = query.to_string();
                shorter.pop();
                Some(UiCommand::Act(SelectionAction::Search(shorter)))
            }
            _ => Some(UiCommand::Act(SelectionAction::Back)),
        },
        KeyCode::Char(c) => match state {
            SelectionState::PoiTypeScreen => {
                Some(UiCommand::Act(SelectionAction::Search(format!("{}{}", query, c))))
            }
            SelectionState::CategoryScreen => match c {
                'j' => Some(UiCommand::Down),
                'k' => Some(UiCommand::Up),
                'q' => Some(UiCommand::Act(SelectionAction::Cancel)),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

pub struct App<P: DataProvider> {
    pub controller: SelectionController<P>,
    pub state: TableState,
}

impl<P: DataProvider> App<P> {
    pub fn new(controller: SelectionController<P>) -> Self {
        let mut app = Self {
            controller,
            state: TableState::default(),
        };
        app.reset_selection();
        app
    }

    pub fn into_controller(self) -> SelectionController<P> {
        self.controller
    }

    fn row_count(&self) -> usize {
        match self.controller.state() {
            SelectionState::CategoryScreen => self.controller.category_rows().len(),
            SelectionState::PoiTypeScreen => self.controller.type_rows().len(),
            _ => 0,
        }
    }

    fn selected_key(&self) -> Option<String> {
        let i = self.state.selected()?;
        match self.controller.state() {
            SelectionState::CategoryScreen => self.controller.category_rows().get(i).map(|r| r.key.clone()),
            SelectionState::PoiTypeScreen => self.controller.type_rows().get(i).map(|r| r.key().to_string()),
            _ => None,
        }
    }

    fn reset_selection(&mut self) {
        if self.row_count() == 0 {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next(&mut self) {
        let len = self.row_count();
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
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Apply one key; returns the controller state afterwards
    pub fn on_key(&mut self, key: KeyEvent) -> SelectionState {
        let selected = self.selected_key();
        let command = command_for_key(
            self.controller.state(),
            self.controller.search_query(),
            selected.as_deref(),
            key,
        );

        match command {
            Some(UiCommand::Up) => self.previous(),
            Some(UiCommand::Down) => self.next(),
            Some(UiCommand::Top) => self.reset_selection(),
            Some(UiCommand::Bottom) => {
                let len = self.row_count();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            Some(UiCommand::Act(action)) => {
                let before = self.controller.state();
                let is_search = matches!(action, SelectionAction::Search(_));
                let after = self.controller.handle(action);
                if before != after || is_search {
                    self.reset_selection();
                }
            }
            None => {}
        }

        self.controller.state()
    }
}

pub fn run_ui<P: DataProvider>(app: &mut App<P>) -> Result<()> {
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

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, P: DataProvider>(
    terminal: &mut Terminal<B>,
    app: &mut App<P>,
) -> io::Result<()> {
    while !app.controller.is_finished() {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.on_key(key);
            }
        }
    }
    Ok(())
}

fn ui<P: DataProvider>(f: &mut Frame, app: &mut App<P>) {
    let on_types = app.controller.state() == SelectionState::PoiTypeScreen;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                   // Header
            Constraint::Length(if on_types { 3 } else { 0 }),        // Search line
            Constraint::Min(0),                                      // Rows
            Constraint::Length(3),                                   // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    if on_types {
        render_search(f, chunks[1], app);
        render_types(f, chunks[2], app);
    } else {
        render_categories(f, chunks[2], app);
    }
    render_status_bar(f, chunks[3], app);
}

fn render_header<P: DataProvider>(f: &mut Frame, area: Rect, app: &App<P>) {
    let mut spans = vec![Span::styled(
        "Categories",
        if app.controller.state() == SelectionState::CategoryScreen {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        },
    )];

    if app.controller.state() == SelectionState::PoiTypeScreen {
        spans.push(Span::raw(" › "));
        let title = match app.controller.active_category() {
            Some(category) => format!("{} {}", category.icon.as_deref().unwrap_or(""), category.name),
            None => "POI types".to_string(),
        };
        spans.push(Span::styled(
            title.trim().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Select POI type "),
    );

    f.render_widget(header, area);
}

fn render_search<P: DataProvider>(f: &mut Frame, area: Rect, app: &App<P>) {
    let query = app.controller.search_query();
    let line = if query.is_empty() {
        Line::from(Span::styled(
            "Type to search…",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(vec![
            Span::styled(query.to_string(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])
    };

    let search = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Search "),
    );

    f.render_widget(search, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_categories<P: DataProvider>(f: &mut Frame, area: Rect, app: &mut App<P>) {
    let rows: Vec<Row> = app
        .controller
        .category_rows()
        .iter()
        .map(|row| {
            let count_color = if row.type_count == 0 { Color::DarkGray } else { Color::Green };
            Row::new(vec![
                Cell::from(row.icon.clone().unwrap_or_default()),
                Cell::from(row.name.clone()),
                Cell::from(format!("{}", row.type_count)).style(Style::default().fg(count_color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(4), Constraint::Length(32), Constraint::Length(8)],
    )
    .header(header_row(&["", "Category", "Types"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Categories "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_types<P: DataProvider>(f: &mut Frame, area: Rect, app: &mut App<P>) {
    let rows: Vec<Row> = app
        .controller
        .type_rows()
        .iter()
        .map(|row| {
            let marker = if row.is_current { "●" } else { "" };
            let tag = row.poi_type.tag().map(|t| t.to_string()).unwrap_or_default();
            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(Color::Green)),
                Cell::from(row.poi_type.display_name().to_string()),
                Cell::from(tag).style(Style::default().fg(Color::Cyan)),
                Cell::from(row.filter_name.clone().unwrap_or_default())
                    .style(Style::default().fg(Color::DarkGray)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(28),
            Constraint::Length(28),
            Constraint::Length(24),
        ],
    )
    .header(header_row(&["", "Type", "Tag", "Filter"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" POI types "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar<P: DataProvider>(f: &mut Frame, area: Rect, app: &App<P>) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.row_count();

    let mut spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    spans.push(Span::raw(" | "));
    spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Pick | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Nav | "));
    spans.push(Span::styled("←", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Back | "));
    spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Cancel"));

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
