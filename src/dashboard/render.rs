//! Dashboard frame: status line, two live charts, two history tables.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use super::poller::ConnectionState;
use super::view::{DashboardView, LiveChart, TableRow};
use super::LIVE_CHART_MAX_POINTS;
use crate::domain::SystemStatus;

pub fn hex_color(hex: &str) -> Color {
    hex.parse().unwrap_or(Color::Reset)
}

fn indicator_color(connection: &ConnectionState) -> Color {
    match connection {
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Connected => Color::Green,
        ConnectionState::Error(_) => Color::Red,
    }
}

/// text on the control button for the last known status
pub fn control_label(status: SystemStatus) -> &'static str {
    match status {
        SystemStatus::On => "Turn Off",
        SystemStatus::Off => "Turn On",
    }
}

/// chart coordinates, x = position in the live window.
/// a stepped series holds each value until the next point.
pub fn chart_points(chart: &LiveChart) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = Vec::new();
    for (i, value) in chart.values().into_iter().enumerate() {
        let x = i as f64;
        if chart.series.stepped() {
            if let Some(&(_, previous)) = points.last() {
                if previous != value {
                    points.push((x, previous));
                }
            }
        }
        points.push((x, value));
    }
    points
}

fn status_line(connection: &ConnectionState, status: SystemStatus) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled("● ", Style::default().fg(indicator_color(connection))),
        Span::raw(connection.label().to_string()),
        Span::raw("    system: "),
        Span::styled(status.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("    [enter] {}  [q] quit", control_label(status))),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Sensor Relay "))
}

fn live_chart_widget<'a>(chart: &'a LiveChart, points: &'a [(f64, f64)]) -> Chart<'a> {
    let axis = chart.series.axis();
    let dataset = Dataset::default()
        .name(chart.series.label())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(hex_color(chart.series.color())))
        .data(points);

    let first = chart.points.first().map(|p| p.label.clone()).unwrap_or_default();
    let last = chart.points.last().map(|p| p.label.clone()).unwrap_or_default();

    Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Live {} ", chart.series.label())),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, (LIVE_CHART_MAX_POINTS - 1) as f64])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .bounds(axis.bounds())
                .labels(vec![Span::raw(axis.min.to_string()), Span::raw(axis.max.to_string())]),
        )
}

fn history_table_widget<'a>(title: &'a str, rows: &'a [TableRow]) -> Table<'a> {
    let rows = rows.iter().map(|row| {
        let style = match row.tone.color() {
            Some(hex) => Style::default().fg(hex_color(hex)).add_modifier(Modifier::BOLD),
            None => Style::default(),
        };
        Row::new(vec![
            Cell::from(row.time.as_str()),
            Cell::from(row.value.as_str()).style(style),
        ])
    });

    Table::new(rows, [Constraint::Length(10), Constraint::Min(8)])
        .header(Row::new(vec!["Time", "Value"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL).title(title))
}

/// Draws one whole frame. Without a view only the status line and a
/// waiting notice are shown.
pub fn draw(
    frame: &mut Frame,
    view: Option<&DashboardView>,
    connection: &ConnectionState,
    status: SystemStatus,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // status
            Constraint::Length(12), // live charts
            Constraint::Min(5),     // history tables
        ])
        .split(frame.area());

    frame.render_widget(status_line(connection, status), chunks[0]);

    let Some(view) = view else {
        frame.render_widget(
            Paragraph::new("waiting for sensor data...").block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );
        return;
    };

    let halves = [Constraint::Percentage(50), Constraint::Percentage(50)];
    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(halves)
        .split(chunks[1]);
    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(halves)
        .split(chunks[2]);

    let distance_points = chart_points(&view.distance_chart);
    let detection_points = chart_points(&view.detection_chart);
    frame.render_widget(live_chart_widget(&view.distance_chart, &distance_points), charts[0]);
    frame.render_widget(live_chart_widget(&view.detection_chart, &detection_points), charts[1]);

    frame.render_widget(
        history_table_widget(" Distance History (cm) ", &view.distance_table),
        tables[0],
    );
    frame.render_widget(
        history_table_widget(" Detection History ", &view.detection_table),
        tables[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::view::{build_view, live_chart, tests::readings, Series};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn render(view: Option<&DashboardView>, connection: &ConnectionState, status: SystemStatus) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, view, connection, status)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn hex_colors_parse_to_rgb() {
        assert_eq!(hex_color("#dc3545"), Color::Rgb(0xdc, 0x35, 0x45));
        assert_eq!(hex_color("nonsense"), Color::Reset);
    }

    #[test]
    fn stepped_series_holds_value_until_change() {
        let chart = live_chart(Series::Detection, &readings(3));
        assert_eq!(chart_points(&chart), vec![(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (2.0, 0.0)]);
    }

    #[test]
    fn distance_series_is_plotted_as_is() {
        let chart = live_chart(Series::Distance, &readings(30));
        let points = chart_points(&chart);
        assert_eq!(points.len(), LIVE_CHART_MAX_POINTS);
        assert_eq!(points[0], (0.0, 0.5));
    }

    #[test]
    fn frame_without_data_waits() {
        let buffer = render(None, &ConnectionState::Connecting, SystemStatus::On);
        let frame = text(&buffer);
        assert!(frame.contains("Connecting..."));
        assert!(frame.contains("Turn Off"));
        assert!(frame.contains("waiting for sensor data"));
    }

    #[test]
    fn frame_lists_tables_and_error_label() {
        let view = build_view(&readings(4)).unwrap();
        let buffer = render(
            Some(&view),
            &ConnectionState::Error("Server Error".to_string()),
            SystemStatus::Off,
        );
        let frame = text(&buffer);
        assert!(frame.contains("Server Error"));
        assert!(frame.contains("Turn On"));
        assert!(frame.contains("Detected"));
        assert!(frame.contains("Clear"));
        assert!(frame.contains("3.50"));
    }

    #[test]
    fn detection_cells_are_bold_and_colored() {
        let view = build_view(&readings(4)).unwrap();
        let buffer = render(Some(&view), &ConnectionState::Connected, SystemStatus::On);

        let styled = |color: Color| {
            buffer
                .content
                .iter()
                .any(|cell| cell.fg == color && cell.modifier.contains(Modifier::BOLD))
        };
        assert!(styled(hex_color("#dc3545")));
        assert!(styled(hex_color("#28a745")));
    }
}
