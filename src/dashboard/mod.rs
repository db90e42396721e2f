use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::*,
};
use futures_util::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
    style::{Color, Modifier},
    text::{Line, Span},
};
use tokio_util::sync::CancellationToken;

use crate::core::StatusIndicator;
use crate::monitoring::display::{DisplayModel, PoolTable, TableRow};
use crate::monitoring::{DisplayHandle, MonitorFrame, PollState};

/// Runs the terminal view until the user quits or the poll loop stops.
/// Quitting cancels `cancel`.
pub async fn start_dashboard(
    mut handle: DisplayHandle,
    endpoint: String,
    cancel: CancellationToken,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut handle, &endpoint, &cancel).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    cancel.cancel();
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    handle: &mut DisplayHandle,
    endpoint: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut current = handle.current();

    loop {
        terminal.draw(|f| draw(f, &current, endpoint))?;

        tokio::select! {
            _ = cancel.cancelled() => break,
            next = handle.changed() => match next {
                Some(frame) => current = frame,
                None => break,
            },
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}

pub fn draw(f: &mut Frame, frame: &MonitorFrame, endpoint: &str) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Table
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    f.render_widget(header(frame, endpoint), layout[0]);

    match &frame.model {
        DisplayModel::Table(table) => f.render_widget(pool_table(table), layout[1]),
        DisplayModel::Error { message } => f.render_widget(
            message_panel(message, Style::new().fg(Color::Red).add_modifier(Modifier::BOLD)),
            layout[1],
        ),
        DisplayModel::Pending => f.render_widget(
            message_panel("Waiting for the first refresh...", Style::new().fg(Color::Gray)),
            layout[1],
        ),
        DisplayModel::Stopped => f.render_widget(
            message_panel("Monitor stopped", Style::new().fg(Color::Gray)),
            layout[1],
        ),
    }

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Q/Esc: Quit", Style::new().fg(Color::LightYellow)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(footer, layout[2]);
}

fn header(frame: &MonitorFrame, endpoint: &str) -> Paragraph<'static> {
    let state = match frame.state {
        PollState::Idle => Span::styled("Idle", Style::new().fg(Color::LightGreen)),
        PollState::Polling => Span::styled("Polling", Style::new().fg(Color::LightYellow)),
    };
    let updated = frame
        .published_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    Paragraph::new(Line::from(vec![
        Span::styled(endpoint.to_string(), Style::new().fg(Color::Cyan)),
        Span::raw("  |  "),
        state,
        Span::raw(format!("  |  cycle {}  |  updated {}", frame.cycle, updated)),
    ]))
    .block(
        Block::default()
            .title("Cloud Resource Pool")
            .borders(Borders::ALL)
            .border_style(Style::new().fg(Color::LightBlue)),
    )
}

fn message_panel(message: &str, style: Style) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(message.to_string(), style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn pool_table(table: &PoolTable) -> Table<'static> {
    let header = Row::new(vec!["Cluster", "Virtual Machines", "Status"])
        .style(Style::new().fg(Color::LightBlue).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let mut rows = Vec::with_capacity(table.row_count());
    for group in &table.groups {
        for (i, row) in group.rows.iter().enumerate() {
            // terminals have no row span: the cluster cell sits on the group's first row
            let cluster = if i == 0 {
                Text::from(vec![
                    Line::from(format!("Name:  {}", group.cluster.name)),
                    Line::from(format!("Type:  {}", group.cluster.cloud_type)),
                    Line::from(format!("Available VM Slots:  {}", group.cluster.vm_slots)),
                ])
            } else {
                Text::default()
            };

            rows.push(match row {
                TableRow::ClusterOnly => Row::new(vec![Cell::from(cluster)]).height(3),
                TableRow::Vm { vm, status } => Row::new(vec![
                    Cell::from(cluster),
                    Cell::from(Text::from(vec![
                        Line::from(vm.name.clone()),
                        Line::from(format!("mem: {}", vm.memory)),
                        Line::from(format!("cpus: {}", vm.cpucores)),
                        Line::from(format!("type: {}", vm.vmtype)),
                    ])),
                    Cell::from(status.text.clone()).style(
                        Style::new()
                            .fg(Color::Black)
                            .bg(indicator_color(status.indicator)),
                    ),
                ])
                .height(4),
            });
        }
    }

    Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL))
}

pub fn indicator_color(indicator: StatusIndicator) -> Color {
    match indicator {
        StatusIndicator::Green => Color::Green,
        StatusIndicator::Yellow => Color::Yellow,
        StatusIndicator::Red => Color::Red,
    }
}
