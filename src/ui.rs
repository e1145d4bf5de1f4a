use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use movelab::charting::{chart_bounds, format_label};
use movelab::experiment::ExperimentKind;
use movelab::session::{Phase, Region};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

// Factor levels are expressed in px; the terminal grid is mapped onto a
// fixed logical span so layouts stay proportional across resizes.
const HORIZONTAL_SPAN_PX: f64 = 640.0;
const VERTICAL_SPAN_PX: f64 = 320.0;

fn h_cells(px: u32, area: Rect) -> u16 {
    ((px as f64 / HORIZONTAL_SPAN_PX) * area.width as f64).round() as u16
}

fn v_cells(px: u32, area: Rect) -> u16 {
    ((px as f64 / VERTICAL_SPAN_PX) * area.height as f64).round() as u16
}

/// Start and target bars for the pointing task, both `width` px wide with
/// their centers `distance` px apart, centered as a pair.
pub fn fitts_layout(distance: u32, width: u32, area: Rect) -> (Rect, Rect) {
    let w = h_cells(width, area).max(1);
    let half_d = h_cells(distance, area) / 2;
    let center = area.x + area.width / 2;
    let max_x = (area.x + area.width).saturating_sub(w).max(area.x);

    let start_x = center.saturating_sub(half_d + w / 2).clamp(area.x, max_x);
    let target_x = (center + half_d).saturating_sub(w / 2).clamp(area.x, max_x);

    (
        Rect::new(start_x, area.y, w, area.height),
        Rect::new(target_x, area.y, w, area.height),
    )
}

/// Start band, tunnel and end band for the steering task. The tunnel is
/// `amplitude` px long and `width` px tall, centered; the bands fill the
/// remaining columns on either side. Everything else is outside the path.
pub fn steering_layout(amplitude: u32, width: u32, area: Rect) -> (Rect, Rect, Rect) {
    let tunnel_w = h_cells(amplitude, area)
        .max(1)
        .min(area.width.saturating_sub(2).max(1));
    let tunnel_h = v_cells(width, area).max(1).min(area.height);
    let tunnel_x = area.x + area.width.saturating_sub(tunnel_w) / 2;
    let tunnel_y = area.y + area.height.saturating_sub(tunnel_h) / 2;

    let start = Rect::new(area.x, area.y, tunnel_x - area.x, area.height);
    let end_x = tunnel_x + tunnel_w;
    let end = Rect::new(
        end_x,
        area.y,
        (area.x + area.width).saturating_sub(end_x),
        area.height,
    );
    let middle = Rect::new(tunnel_x, tunnel_y, tunnel_w, tunnel_h);

    (start, middle, end)
}

/// Map a pointer position onto the steering regions.
pub fn steering_region_at(column: u16, row: u16, layout: &(Rect, Rect, Rect)) -> Region {
    let position = Position::new(column, row);
    let (start, middle, end) = layout;

    if start.contains(position) {
        Region::Start
    } else if middle.contains(position) {
        Region::Middle
    } else if end.contains(position) {
        Region::End
    } else {
        Region::Outside
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Running => match self.settings.experiment {
                ExperimentKind::Reaction => render_reaction(self, area, buf),
                ExperimentKind::Fitts => render_fitts(self, area, buf),
                ExperimentKind::Steering => render_steering(self, area, buf),
            },
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_reaction(app: &App, area: Rect, buf: &mut Buffer) {
    let armed = app.session.phase() == Phase::Running;
    let background = if armed { Color::Red } else { Color::Reset };
    Block::default()
        .style(Style::default().bg(background))
        .render(area, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let message = if armed {
        Span::styled("CLICK!", Style::default().add_modifier(Modifier::BOLD))
    } else if let Some(feedback) = &app.feedback {
        Span::styled(feedback.as_str(), Style::default().fg(Color::Yellow))
    } else if let Some(ms) = app.last_reaction_ms {
        Span::styled(
            format!("{ms:.0} ms"),
            Style::default().add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "wait for the signal, then click",
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    Paragraph::new(message)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    render_progress(app, chunks[3], buf);
}

fn render_fitts(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(condition) = app.session.current_condition() else {
        return;
    };
    let (Some(distance), Some(width)) = (condition.level(0), condition.level(1)) else {
        return;
    };

    let (start, target) = fitts_layout(distance, width, area);
    let started = app.session.phase() == Phase::Running;

    let start_color = if started { Color::Blue } else { Color::Gray };
    Block::default()
        .style(Style::default().bg(start_color))
        .render(start, buf);
    Block::default()
        .style(Style::default().bg(Color::Green))
        .render(target, buf);

    render_condition_header(app, width, distance, area, buf);
    render_progress(app, bottom_line(area), buf);
}

fn render_steering(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(condition) = app.session.current_condition() else {
        return;
    };
    let (Some(amplitude), Some(width)) = (condition.level(0), condition.level(1)) else {
        return;
    };

    let background = match app.session.phase() {
        Phase::Running => Color::Yellow,
        Phase::Error => Color::Red,
        _ => Color::DarkGray,
    };
    Block::default()
        .style(Style::default().bg(background))
        .render(area, buf);

    let (start, middle, end) = steering_layout(amplitude, width, area);
    Block::default()
        .style(Style::default().bg(Color::Blue))
        .render(start, buf);
    Block::default()
        .style(Style::default().bg(Color::White))
        .render(middle, buf);
    Block::default()
        .style(Style::default().bg(Color::Green))
        .render(end, buf);

    render_condition_header(app, width, amplitude, area, buf);
    render_progress(app, bottom_line(area), buf);
}

fn render_condition_header(app: &App, width: u32, amplitude: u32, area: Rect, buf: &mut Buffer) {
    let header = format!(
        "W: {}   {}: {}",
        width,
        app.settings.experiment.amplitude_tag(),
        amplitude
    );
    let line = Rect::new(area.x + 1, area.y, area.width.saturating_sub(1), 1);
    Paragraph::new(Span::styled(header, Style::default().add_modifier(Modifier::BOLD)))
        .render(line.intersection(area), buf);
}

fn bottom_line(area: Rect) -> Rect {
    Rect::new(
        area.x,
        (area.y + area.height).saturating_sub(1),
        area.width,
        1,
    )
    .intersection(area)
}

fn render_progress(app: &App, area: Rect, buf: &mut Buffer) {
    let done = app.session.completed_trials();
    let text = format!(
        "trial {}/{}   (esc)ape",
        (done + 1).min(app.session.generated()),
        app.session.generated()
    );
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);
    let cyan_style = Style::default().fg(Color::Cyan);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // fit equation / feedback
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    match &app.summary {
        Some(summary) => {
            let scatter: Vec<(f64, f64)> = if summary.kind.has_fit() {
                summary
                    .points
                    .iter()
                    .map(|p| (p.difficulty, p.mean_ms))
                    .collect()
            } else {
                summary
                    .trial_times
                    .iter()
                    .enumerate()
                    .map(|(i, &ms)| ((i + 1) as f64, ms))
                    .collect()
            };
            let (bound_x, bound_y) = chart_bounds(&scatter);

            let fit_points: Vec<(f64, f64)> = summary
                .fit
                .map(|fit| {
                    let x0 = scatter.first().map(|p| p.0).unwrap_or(0.0);
                    vec![(x0, fit.predict(x0)), (bound_x, fit.predict(bound_x))]
                })
                .unwrap_or_default();

            let mut datasets = vec![Dataset::default()
                .marker(Marker::Dot)
                .style(cyan_style)
                .graph_type(GraphType::Scatter)
                .data(&scatter)];
            if !fit_points.is_empty() {
                datasets.push(
                    Dataset::default()
                        .marker(Marker::Braille)
                        .style(magenta_style)
                        .graph_type(GraphType::Line)
                        .data(&fit_points),
                );
            }

            let chart = Chart::new(datasets)
                .x_axis(
                    Axis::default()
                        .title(summary.kind.x_label())
                        .bounds([0.0, bound_x])
                        .labels(vec![
                            Span::styled("0", bold_style),
                            Span::styled(format_label(bound_x), bold_style),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .title(summary.kind.y_label())
                        .bounds([0.0, bound_y])
                        .labels(vec![
                            Span::styled("0", bold_style),
                            Span::styled(format_label(bound_y), bold_style),
                        ]),
                );
            chart.render(chunks[0], buf);

            let stats = Paragraph::new(Span::styled(
                format!(
                    "{} trials   {:.2} ms avg   {:.2} sd",
                    summary.completed_trials, summary.mean_ms, summary.std_dev_ms
                ),
                bold_style,
            ))
            .alignment(Alignment::Center);
            stats.render(chunks[1], buf);

            let fit_text = if summary.kind.has_fit() {
                summary.fit_line()
            } else {
                String::from("reaction test: no difficulty model")
            };
            Paragraph::new(Span::styled(
                fit_text,
                cyan_style.add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        }
        None => {
            let message = app
                .feedback
                .clone()
                .unwrap_or_else(|| String::from("no results recorded"));
            Paragraph::new(Span::styled(message, Style::default().fg(Color::Red)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[0], buf);
        }
    }

    Paragraph::new(Span::styled("(r)etry / (esc)ape", italic_style)).render(chunks[4], buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitts_bars_sit_either_side_of_center() {
        let area = Rect::new(0, 0, 100, 40);

        let (start, target) = fitts_layout(384, 64, area);

        assert!(start.x < target.x);
        assert_eq!(start.width, target.width);
        assert!(start.width >= 1);
        assert!(target.x + target.width <= area.x + area.width);
        assert_eq!(start.height, area.height);
    }

    #[test]
    fn fitts_bars_stay_inside_tiny_areas() {
        let area = Rect::new(0, 0, 10, 4);

        let (start, target) = fitts_layout(512, 96, area);

        assert!(start.x + start.width <= area.x + area.width);
        assert!(target.x + target.width <= area.x + area.width);
    }

    #[test]
    fn steering_layout_spans_the_area() {
        let area = Rect::new(0, 0, 100, 40);

        let (start, middle, end) = steering_layout(384, 64, area);

        assert_eq!(start.x, 0);
        assert_eq!(start.x + start.width, middle.x);
        assert_eq!(middle.x + middle.width, end.x);
        assert_eq!(end.x + end.width, area.x + area.width);
        assert!(middle.height < area.height);
    }

    #[test]
    fn pointer_positions_map_to_regions() {
        let area = Rect::new(0, 0, 100, 40);
        let layout = steering_layout(384, 64, area);
        let (_, middle, end) = layout;

        assert_eq!(steering_region_at(0, 0, &layout), Region::Start);
        assert_eq!(
            steering_region_at(middle.x + 1, middle.y + 1, &layout),
            Region::Middle
        );
        assert_eq!(steering_region_at(end.x, 0, &layout), Region::End);
        // between the bands but off the tunnel
        assert_eq!(steering_region_at(middle.x + 1, 0, &layout), Region::Outside);
    }
}
