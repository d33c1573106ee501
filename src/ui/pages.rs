use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use disaster_dash::data::aggregate::{
    by_disaster_type, by_location, count_by, daily_counts, efficiency_by_type, monthly_counts,
    monthly_mean, moving_average, top_locations,
};
use disaster_dash::data::category::{
    EconomicImpactCategory, PopulationImpactCategory, ResponseCategory, SeverityCategory,
};
use disaster_dash::data::model::{CleanedEvent, month_name, weekday_name};
use disaster_dash::data::stats::Summary;

use crate::color::{ColorMap, band_color, severity_color};
use crate::state::{AppState, Page};
use crate::ui::plot::{self, BarItem, PointGroup, Series};

const ACCENT: Color32 = Color32::from_rgb(102, 126, 234);
const ACCENT_DIM: Color32 = Color32::from_rgb(118, 75, 162);
const TOP_LOCATIONS: usize = 15;

/// Render the active dashboard page for the visible events.
pub fn show(ui: &mut Ui, state: &AppState) {
    let (Some(view), Some(summary)) = (state.view(), state.summary.as_ref()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Open a cleaned disaster-events file (File → Open…) to begin.");
        });
        return;
    };

    ui.heading(state.page.title());
    ui.separator();

    if view.is_empty() {
        ui.label(
            RichText::new("No events match the current filters. Widen the selection in the side panel.")
                .color(Color32::YELLOW),
        );
        return;
    }

    let events: Vec<&CleanedEvent> = view.iter().collect();
    let fallback = ColorMap::new(std::iter::empty::<&String>());
    let colors = state.type_colors.as_ref().unwrap_or(&fallback);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Overview => overview(ui, &events, summary),
            Page::Temporal => temporal(ui, &events),
            Page::DisasterTypes => disaster_types(ui, &events, colors),
            Page::Geographic => geographic(ui, &events, colors),
            Page::SeverityImpact => severity_impact(ui, &events),
            Page::Response => response(ui, &events, summary),
            Page::Correlations => correlations(ui, summary),
        });
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

fn overview(ui: &mut Ui, events: &[&CleanedEvent], summary: &Summary) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        metric_card(
            ui,
            "Total events",
            fmt_count(summary.total_events as f64),
            format!("{} major ({})", summary.major_disasters, fmt_pct(summary.major_share_pct())),
        );
        metric_card(
            ui,
            "People affected",
            fmt_compact(summary.affected_population.sum),
            format!("avg {} per event", fmt_compact(summary.affected_population.mean)),
        );
        metric_card(
            ui,
            "Economic loss",
            fmt_usd(summary.economic_loss.sum),
            format!("avg {} per event", fmt_usd(summary.economic_loss.mean)),
        );
        metric_card(
            ui,
            "Response time",
            fmt_hours(summary.response_time.mean),
            format!("median {}", fmt_hours(summary.response_time.median)),
        );
    });
    ui.add_space(8.0);

    ui.strong("Executive summary");
    let span = summary
        .date_range_days
        .map_or("n/a".to_string(), |d| format!("{d} days"));
    let most_common = summary.most_common_type.as_deref().unwrap_or("n/a");
    ui.label(format!(
        "{} events across {} locations and {} disaster types over {span}. \
         {most_common} is the most frequent disaster type. \
         Average severity is {:.1} and average infrastructure damage is {:.2}.",
        fmt_count(summary.total_events as f64),
        summary.unique_locations,
        summary.unique_disaster_types,
        summary.avg_severity,
        summary.avg_infrastructure_damage,
    ));
    ui.add_space(8.0);

    ui.strong("Daily events");
    let daily = daily_counts(events.iter().copied());
    let values: Vec<f64> = daily.iter().map(|&(_, n)| n as f64).collect();
    let ma = moving_average(&values, 7);
    plot::time_series(
        ui,
        "daily_events",
        vec![
            Series {
                name: "Events".into(),
                points: daily.iter().map(|&(d, n)| (d, n as f64)).collect(),
                color: ACCENT,
                width: 1.0,
            },
            Series {
                name: "7-day average".into(),
                points: daily.iter().map(|&(d, _)| d).zip(ma).collect(),
                color: Color32::from_rgb(245, 87, 108),
                width: 2.5,
            },
        ],
        "Events",
    );

    ui.strong("Cumulative people affected");
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for e in events {
        *per_day.entry(e.event.date).or_default() += e.event.affected_population as f64;
    }
    let mut running = 0.0;
    let cumulative: Vec<(NaiveDate, f64)> = per_day
        .into_iter()
        .map(|(d, v)| {
            running += v;
            (d, running)
        })
        .collect();
    plot::time_series(
        ui,
        "cumulative_affected",
        vec![Series {
            name: "Cumulative affected".into(),
            points: cumulative,
            color: ACCENT_DIM,
            width: 2.0,
        }],
        "People",
    );
}

// ---------------------------------------------------------------------------
// Temporal
// ---------------------------------------------------------------------------

fn temporal(ui: &mut Ui, events: &[&CleanedEvent]) {
    ui.strong("Events per month");
    let monthly: Vec<BarItem> = monthly_counts(events.iter().copied())
        .into_iter()
        .map(|((year, month), n)| BarItem::new(month_label(year, month), n as f64, ACCENT))
        .collect();
    plot::bar_chart(ui, "monthly_events", &monthly, "Events", false);

    ui.columns(2, |cols| {
        cols[0].strong("Events by day of week");
        let by_day = count_by(events.iter().copied(), |e| e.event.date.weekday().num_days_from_monday());
        let days = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        let day_bars: Vec<BarItem> = days
            .iter()
            .map(|&d| {
                let n = by_day.get(&d.num_days_from_monday()).copied().unwrap_or(0);
                BarItem::new(&weekday_name(d)[..3], n as f64, ACCENT_DIM)
            })
            .collect();
        plot::bar_chart(&mut cols[0], "weekday_events", &day_bars, "Events", false);

        cols[1].strong("Events by quarter");
        let by_quarter = count_by(events.iter().copied(), |e| e.derived.temporal.quarter);
        let quarter_bars: Vec<BarItem> = (1..=4)
            .map(|q| {
                let n = by_quarter.get(&q).copied().unwrap_or(0);
                BarItem::new(format!("Q{q}"), n as f64, band_color(q as usize - 1))
            })
            .collect();
        plot::bar_chart(&mut cols[1], "quarter_events", &quarter_bars, "Events", false);
    });

    ui.strong("Average severity by month");
    let severity = monthly_mean(events.iter().copied(), |e| e.event.severity_level as f64);
    plot::time_series(
        ui,
        "monthly_severity",
        vec![Series {
            name: "Average severity".into(),
            points: month_points(&severity),
            color: severity_color(SeverityCategory::High),
            width: 2.0,
        }],
        "Severity",
    );
}

// ---------------------------------------------------------------------------
// Disaster types
// ---------------------------------------------------------------------------

fn disaster_types(ui: &mut Ui, events: &[&CleanedEvent], colors: &ColorMap) {
    let rows = by_disaster_type(events.iter().copied());

    ui.columns(2, |cols| {
        cols[0].strong("Events by type");
        let counts: Vec<BarItem> = rows
            .iter()
            .map(|r| BarItem::new(&r.disaster_type, r.events as f64, colors.color_for(&r.disaster_type)))
            .collect();
        plot::bar_chart(&mut cols[0], "type_events", &counts, "Events", true);

        cols[1].strong("Economic loss by type (USD)");
        let mut losses: Vec<BarItem> = rows
            .iter()
            .map(|r| BarItem::new(&r.disaster_type, r.total_loss, colors.color_for(&r.disaster_type)))
            .collect();
        losses.sort_by(|a, b| b.value.total_cmp(&a.value));
        plot::bar_chart(&mut cols[1], "type_losses", &losses, "USD", true);
    });

    ui.add_space(8.0);
    ui.strong("Breakdown");
    egui::Grid::new("type_table")
        .striped(true)
        .num_columns(8)
        .show(ui, |ui: &mut Ui| {
            for h in [
                "Type",
                "Events",
                "Major",
                "Affected",
                "Loss",
                "Avg response",
                "Avg severity",
                "Avg damage",
            ] {
                ui.strong(h);
            }
            ui.end_row();
            for r in &rows {
                ui.label(RichText::new(&r.disaster_type).color(colors.color_for(&r.disaster_type)));
                ui.label(fmt_count(r.events as f64));
                ui.label(fmt_count(r.major_events as f64));
                ui.label(fmt_compact(r.total_affected));
                ui.label(fmt_usd(r.total_loss));
                ui.label(fmt_hours(r.avg_response_hours));
                ui.label(format!("{:.1}", r.avg_severity));
                ui.label(format!("{:.2}", r.avg_infrastructure_damage));
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Geographic
// ---------------------------------------------------------------------------

fn geographic(ui: &mut Ui, events: &[&CleanedEvent], colors: &ColorMap) {
    ui.strong("Event locations");
    let mut groups: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for e in events {
        groups
            .entry(e.event.disaster_type.as_str())
            .or_default()
            .push([e.event.longitude, e.event.latitude]);
    }
    let point_groups: Vec<PointGroup> = groups
        .into_iter()
        .map(|(kind, points)| PointGroup {
            name: kind.to_string(),
            points,
            color: colors.color_for(kind),
        })
        .collect();
    plot::scatter(ui, "event_map", point_groups, "Longitude", "Latitude");

    let locations = by_location(events.iter().copied());
    let top = top_locations(&locations, TOP_LOCATIONS, |r| r.total_affected);

    ui.strong(format!("Top {TOP_LOCATIONS} locations by people affected"));
    let bars: Vec<BarItem> = top
        .iter()
        .map(|r| BarItem::new(&r.location, r.total_affected, ACCENT))
        .collect();
    plot::bar_chart(ui, "top_locations", &bars, "People affected", true);

    egui::Grid::new("location_table")
        .striped(true)
        .num_columns(5)
        .show(ui, |ui: &mut Ui| {
            for h in ["Location", "Events", "Affected", "Loss", "Disaster types"] {
                ui.strong(h);
            }
            ui.end_row();
            for r in &top {
                ui.label(&r.location);
                ui.label(fmt_count(r.events as f64));
                ui.label(fmt_compact(r.total_affected));
                ui.label(fmt_usd(r.total_loss));
                ui.label(r.disaster_types.to_string());
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Severity & impact
// ---------------------------------------------------------------------------

fn severity_impact(ui: &mut Ui, events: &[&CleanedEvent]) {
    ui.columns(3, |cols| {
        cols[0].strong("Severity");
        let by_severity = count_by(events.iter().copied(), |e| e.derived.severity_category);
        let bars: Vec<BarItem> = SeverityCategory::ALL
            .into_iter()
            .map(|c| {
                let n = by_severity.get(&c).copied().unwrap_or(0);
                BarItem::new(c.label(), n as f64, severity_color(c))
            })
            .collect();
        plot::bar_chart(&mut cols[0], "severity_bands", &bars, "Events", false);

        cols[1].strong("Economic impact");
        let by_economic = count_by(events.iter().copied(), |e| e.derived.economic_impact_category);
        let bars: Vec<BarItem> = EconomicImpactCategory::ALL
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let n = by_economic.get(&c).copied().unwrap_or(0);
                BarItem::new(c.label(), n as f64, band_color(i))
            })
            .collect();
        plot::bar_chart(&mut cols[1], "economic_bands", &bars, "Events", false);

        cols[2].strong("Population impact");
        let by_population = count_by(events.iter().copied(), |e| e.derived.population_impact_category);
        let bars: Vec<BarItem> = PopulationImpactCategory::ALL
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let n = by_population.get(&c).copied().unwrap_or(0);
                BarItem::new(c.label(), n as f64, band_color(i))
            })
            .collect();
        plot::bar_chart(&mut cols[2], "population_bands", &bars, "Events", false);
    });

    ui.add_space(8.0);
    ui.strong("Major vs. other disasters");
    let (major, other): (Vec<&CleanedEvent>, Vec<&CleanedEvent>) =
        events.iter().copied().partition(|e| e.event.is_major_disaster);
    let major = Summary::compute(major);
    let other = Summary::compute(other);

    egui::Grid::new("major_comparison")
        .striped(true)
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            ui.strong("");
            ui.strong("Major");
            ui.strong("Other");
            ui.end_row();

            let rows: [(&str, fn(&Summary) -> String); 6] = [
                ("Events", |s| fmt_count(s.total_events as f64)),
                ("Avg people affected", |s| fmt_compact(s.affected_population.mean)),
                ("Avg economic loss", |s| fmt_usd(s.economic_loss.mean)),
                ("Avg response time", |s| fmt_hours(s.response_time.mean)),
                ("Avg severity", |s| format!("{:.1}", s.avg_severity)),
                ("Avg infrastructure damage", |s| format!("{:.2}", s.avg_infrastructure_damage)),
            ];
            for (label, cell) in rows {
                ui.label(label);
                ui.label(cell(&major));
                ui.label(cell(&other));
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

fn response(ui: &mut Ui, events: &[&CleanedEvent], summary: &Summary) {
    let stats = &summary.response_time;
    ui.horizontal_wrapped(|ui: &mut Ui| {
        metric_card(ui, "Average", fmt_hours(stats.mean), format!("std {}", fmt_hours(stats.std_dev)));
        metric_card(ui, "Median", fmt_hours(stats.median), String::new());
        metric_card(ui, "Fastest", fmt_hours(stats.min), String::new());
        metric_card(ui, "Slowest", fmt_hours(stats.max), String::new());
    });
    ui.add_space(8.0);

    ui.columns(2, |cols| {
        cols[0].strong("Response speed");
        let by_speed = count_by(events.iter().copied(), |e| e.derived.response_category);
        let bars: Vec<BarItem> = ResponseCategory::ALL
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let n = by_speed.get(&c).copied().unwrap_or(0);
                BarItem::new(c.label(), n as f64, band_color(i))
            })
            .collect();
        plot::bar_chart(&mut cols[0], "response_bands", &bars, "Events", false);

        cols[1].strong("Response efficiency by type");
        let ranked: Vec<BarItem> = efficiency_by_type(events.iter().copied())
            .into_iter()
            .map(|(kind, score)| BarItem::new(kind, score, ACCENT))
            .collect();
        plot::bar_chart(&mut cols[1], "efficiency", &ranked, "Score", true);
    });

    ui.strong("Average response time by month");
    let monthly = monthly_mean(events.iter().copied(), |e| e.event.response_time_hours);
    let values: Vec<f64> = monthly.iter().map(|&(_, v)| v).collect();
    let smoothed: Vec<((i32, u32), f64)> = monthly
        .iter()
        .map(|&(k, _)| k)
        .zip(moving_average(&values, 3))
        .collect();
    plot::time_series(
        ui,
        "monthly_response",
        vec![
            Series {
                name: "Monthly average".into(),
                points: month_points(&monthly),
                color: ACCENT,
                width: 1.5,
            },
            Series {
                name: "3-month average".into(),
                points: month_points(&smoothed),
                color: Color32::from_rgb(245, 87, 108),
                width: 2.5,
            },
        ],
        "Hours",
    );
}

// ---------------------------------------------------------------------------
// Correlations
// ---------------------------------------------------------------------------

fn correlations(ui: &mut Ui, summary: &Summary) {
    let matrix = &summary.correlations;
    ui.strong("Correlation matrix");
    plot::correlation_heatmap(ui, matrix);
    ui.add_space(8.0);

    let pairs = matrix.ranked_pairs();
    let defined = || pairs.iter().filter(|p| !p.r.is_nan());
    if let Some(p) = defined().max_by(|a, b| a.r.total_cmp(&b.r)) {
        ui.label(format!(
            "Strongest positive: {} and {} (r = {:.3})",
            p.a.label(),
            p.b.label(),
            p.r
        ));
    }
    if let Some(p) = defined().min_by(|a, b| a.r.total_cmp(&b.r)) {
        ui.label(format!(
            "Strongest negative: {} and {} (r = {:.3})",
            p.a.label(),
            p.b.label(),
            p.r
        ));
    }
    ui.add_space(8.0);

    ui.strong("Pairs by strength");
    egui::Grid::new("correlation_pairs")
        .striped(true)
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            for p in &pairs {
                ui.label(p.a.label());
                ui.label(p.b.label());
                ui.label(if p.r.is_nan() { "n/a".to_string() } else { format!("{:+.3}", p.r) });
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Shared widgets and formatting
// ---------------------------------------------------------------------------

fn metric_card(ui: &mut Ui, title: &str, value: String, detail: String) {
    egui::Frame::group(ui.style())
        .inner_margin(10.0)
        .show(ui, |ui: &mut Ui| {
            ui.set_min_width(170.0);
            ui.vertical(|ui: &mut Ui| {
                ui.label(RichText::new(title).small().weak());
                ui.label(RichText::new(value).heading().strong());
                ui.label(RichText::new(detail).small());
            });
        });
}

fn month_label(year: i32, month: u32) -> String {
    format!("{} {year}", &month_name(month)[..3])
}

fn month_points(series: &[((i32, u32), f64)]) -> Vec<(NaiveDate, f64)> {
    series
        .iter()
        .filter_map(|&((y, m), v)| NaiveDate::from_ymd_opt(y, m, 1).map(|d| (d, v)))
        .collect()
}

/// Integer with thousands separators.
fn fmt_count(v: f64) -> String {
    if v.is_nan() {
        return "n/a".to_string();
    }
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// 1234567 → "1.23M".
fn fmt_compact(v: f64) -> String {
    if v.is_nan() {
        return "n/a".to_string();
    }
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else {
        format!("{v:.0}")
    }
}

fn fmt_usd(v: f64) -> String {
    if v.is_nan() {
        "n/a".to_string()
    } else {
        format!("${}", fmt_compact(v))
    }
}

fn fmt_hours(v: f64) -> String {
    if v.is_nan() {
        "n/a".to_string()
    } else {
        format!("{v:.1} h")
    }
}

fn fmt_pct(v: f64) -> String {
    if v.is_nan() {
        "n/a".to_string()
    } else {
        format!("{v:.1}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(fmt_count(0.0), "0");
        assert_eq!(fmt_count(999.0), "999");
        assert_eq!(fmt_count(1000.0), "1,000");
        assert_eq!(fmt_count(236_500.0), "236,500");
        assert_eq!(fmt_count(-1_234_567.0), "-1,234,567");
        assert_eq!(fmt_count(f64::NAN), "n/a");
    }

    #[test]
    fn compact_amounts() {
        assert_eq!(fmt_compact(950.0), "950");
        assert_eq!(fmt_compact(12_500.0), "12.5K");
        assert_eq!(fmt_compact(3_000_000.0), "3.00M");
        assert_eq!(fmt_usd(2_500_000_000.0), "$2.50B");
        assert_eq!(fmt_usd(f64::NAN), "n/a");
    }

    #[test]
    fn month_labels_and_points() {
        assert_eq!(month_label(2025, 3), "Mar 2025");
        let points = month_points(&[((2025, 1), 2.0), ((2025, 13), 1.0)]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].0, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
