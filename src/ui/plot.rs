use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Align2, Color32, FontId, Sense, Ui, vec2};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use disaster_dash::data::stats::{CorrelationMatrix, NumericField};

use crate::color::correlation_color;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// One labelled bar.
pub struct BarItem {
    pub label: String,
    pub value: f64,
    pub color: Color32,
}

impl BarItem {
    pub fn new(label: impl Into<String>, value: f64, color: Color32) -> Self {
        BarItem {
            label: label.into(),
            value,
            color,
        }
    }
}

/// Label for an integer grid mark, empty between categories.
fn category_label(labels: &[String], mark: GridMark) -> String {
    let idx = mark.value.round();
    if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Categorical bar chart. Horizontal charts list the first item at the top.
pub fn bar_chart(ui: &mut Ui, id: &str, items: &[BarItem], value_label: &str, horizontal: bool) {
    let n = items.len();
    let bars: Vec<Bar> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let pos = if horizontal { (n - 1 - i) as f64 } else { i as f64 };
            Bar::new(pos, item.value)
                .name(&item.label)
                .fill(item.color)
                .width(0.7)
        })
        .collect();

    let mut labels: Vec<String> = items.iter().map(|it| it.label.clone()).collect();
    if horizontal {
        labels.reverse();
    }

    let mut chart = BarChart::new(bars).name(value_label);
    let mut plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .show_grid([!horizontal, horizontal]);
    if horizontal {
        chart = chart.horizontal();
        plot = plot
            .y_axis_formatter(move |mark, _range| category_label(&labels, mark))
            .x_axis_label(value_label);
    } else {
        plot = plot
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark))
            .y_axis_label(value_label);
    }

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(chart);
    });
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// A named line over calendar dates.
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
    pub color: Color32,
    pub width: f32,
}

fn date_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_date_label(mark: GridMark) -> String {
    NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Line chart with a date x-axis.
pub fn time_series(ui: &mut Ui, id: &str, series: Vec<Series>, y_label: &str) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(|mark, _range| x_date_label(mark))
        .y_axis_label(y_label)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for s in series {
                let points: PlotPoints = s
                    .points
                    .iter()
                    .map(|&(d, v)| [date_x(d), v])
                    .collect();
                plot_ui.line(Line::new(points).name(&s.name).color(s.color).width(s.width));
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// One coloured point group of a scatter plot.
pub struct PointGroup {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
}

pub fn scatter(ui: &mut Ui, id: &str, groups: Vec<PointGroup>, x_label: &str, y_label: &str) {
    Plot::new(id)
        .height(CHART_HEIGHT * 1.4)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for g in groups {
                plot_ui.points(
                    Points::new(PlotPoints::from(g.points))
                        .name(&g.name)
                        .color(g.color)
                        .radius(3.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// 5x5 grid of coloured cells with the coefficient printed in each.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let cell = vec2(110.0, 38.0);
    egui::Grid::new("correlation_heatmap")
        .spacing(vec2(2.0, 2.0))
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for f in NumericField::ALL {
                ui.strong(f.label());
            }
            ui.end_row();

            for a in NumericField::ALL {
                ui.strong(a.label());
                for b in NumericField::ALL {
                    let r = matrix.get(a, b);
                    let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                    ui.painter().rect_filled(rect, 3.0, correlation_color(r));
                    let text = if r.is_nan() { "n/a".to_string() } else { format!("{r:.2}") };
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        text,
                        FontId::proportional(14.0),
                        Color32::BLACK,
                    );
                    response.on_hover_text(format!("{} vs {}", a.label(), b.label()));
                }
                ui.end_row();
            }
        });
}
