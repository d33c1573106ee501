use std::collections::BTreeSet;
use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use disaster_dash::data::category::SeverityCategory;
use disaster_dash::data::filter::{FilterConfig, LocationFilter};

use crate::color::{ColorMap, severity_color};
use crate::state::{AppState, Page, toggle};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            ui.strong("Date range");
            egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("From");
                ui.add(DatePickerButton::new(&mut state.filters.date_range.start).id_salt("date_from"));
                ui.end_row();
                ui.label("To");
                ui.add(DatePickerButton::new(&mut state.filters.date_range.end).id_salt("date_to"));
                ui.end_row();
            });
            if state.filters.date_range.days() == 0 {
                ui.label(RichText::new("Start is after end").color(Color32::YELLOW));
            }
            ui.separator();

            // ---- Disaster types ----
            string_filter(
                ui,
                "Disaster type",
                dataset.disaster_types(),
                &mut state.filters.disaster_types,
                state.type_colors.as_ref(),
            );

            // ---- Severity ----
            let n_selected = state.filters.severity_categories.len();
            egui::CollapsingHeader::new(
                RichText::new(format!("Severity  ({n_selected}/{})", SeverityCategory::ALL.len())).strong(),
            )
            .id_salt("severity")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for category in SeverityCategory::ALL {
                    let mut checked = state.filters.severity_categories.contains(&category);
                    let text = RichText::new(category.description()).color(severity_color(category));
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_severity(category, checked);
                    }
                }
            });

            // ---- Locations ----
            let mut all_locations = matches!(state.filters.locations, LocationFilter::All);
            egui::CollapsingHeader::new(RichText::new("Location").strong())
                .id_salt("location")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if ui.checkbox(&mut all_locations, "All locations").changed() {
                        state.set_all_locations(all_locations);
                    }
                    if let LocationFilter::Only(selected) = &mut state.filters.locations {
                        for location in &state.location_choices {
                            let mut checked = selected.contains(location);
                            if ui.checkbox(&mut checked, location).changed() {
                                toggle(selected, location.clone(), checked);
                            }
                        }
                    }
                });

            // ---- Aid types ----
            string_filter(
                ui,
                "Aid provided",
                dataset.aid_types(),
                &mut state.filters.aid_types,
                None,
            );
            ui.separator();

            ui.checkbox(&mut state.filters.major_only, "Major disasters only");
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }

            ui.add_space(8.0);
            let share = if dataset.is_empty() {
                0.0
            } else {
                state.visible_indices.len() as f64 / dataset.len() as f64 * 100.0
            };
            ui.label(format!(
                "{} of {} events ({share:.1}%)",
                state.visible_indices.len(),
                dataset.len()
            ));
            ui.label(format!("{} days selected", state.filters.date_range.days()));
        });

    // Recompute visible indices after any widget changes.
    state.refilter();
}

/// Collapsible checkbox list over the distinct values of a text column.
fn string_filter(
    ui: &mut Ui,
    title: &str,
    all_values: &BTreeSet<String>,
    selected: &mut BTreeSet<String>,
    colors: Option<&ColorMap>,
) {
    let header_text = format!("{title}  ({}/{})", selected.len(), all_values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    selected.clone_from(all_values);
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                }
            });

            for val in all_values {
                let mut text = RichText::new(val);
                if let Some(cm) = colors {
                    text = text.color(cm.color_for(val));
                }
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, text).changed() {
                    toggle(selected, val.clone(), checked);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let has_data = state.dataset.is_some();
            if ui.add_enabled(has_data, egui::Button::new("Save filters…")).clicked() {
                save_filters_dialog(state);
                ui.close_menu();
            }
            if ui.add_enabled(has_data, egui::Button::new("Load filters…")).clicked() {
                load_filters_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            ui.selectable_value(&mut state.page, page, page.title());
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} events loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open cleaned disaster events")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

fn save_filters_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save filters")
        .add_filter("JSON", &["json"])
        .set_file_name("filters.json")
        .save_file();

    if let Some(path) = file {
        let result = state
            .filters
            .to_json()
            .map_err(anyhow::Error::from)
            .and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));
        report(state, &path, "save filters to", result);
    }
}

fn load_filters_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load filters")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        let result = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|text| FilterConfig::from_json(&text).map_err(anyhow::Error::from));
        match result {
            Ok(filters) => {
                state.filters = filters;
                state.status_message = None;
                state.refilter();
            }
            Err(e) => report(state, &path, "load filters from", Err(e)),
        }
    }
}

fn report(state: &mut AppState, path: &Path, action: &str, result: anyhow::Result<()>) {
    match result {
        Ok(_) => {
            log::info!("Filters written to {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to {action} {}: {e:#}", path.display());
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
