//! Event builders shared by the unit tests.

use chrono::NaiveDate;

use super::model::{CleanedEvent, Dataset, DisasterEvent};

pub fn event(id: &str, date: (i32, u32, u32), location: &str) -> DisasterEvent {
    DisasterEvent {
        event_id: id.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        disaster_type: "Flood".to_string(),
        location: location.to_string(),
        latitude: 10.0,
        longitude: 20.0,
        severity_level: 5,
        affected_population: 1200,
        estimated_economic_loss_usd: 2_500_000.0,
        response_time_hours: 12.0,
        infrastructure_damage_index: 0.4,
        aid_provided: "Medical".to_string(),
        is_major_disaster: false,
    }
}

/// Six events over three types, three locations and two aid kinds.
pub fn small_dataset() -> Dataset {
    let specs: [(&str, (i32, u32, u32), &str, &str, i64, i64, f64, f64, f64, &str, bool); 6] = [
        ("E1", (2025, 1, 5), "Lima", "Flood", 2, 500, 500_000.0, 3.0, 0.10, "Food", false),
        ("E2", (2025, 2, 14), "Oslo", "Storm", 5, 4_000, 3_000_000.0, 10.0, 0.35, "Medical", false),
        ("E3", (2025, 3, 3), "Lima", "Earthquake", 9, 150_000, 200_000_000.0, 80.0, 0.90, "Shelter", true),
        ("E4", (2025, 3, 20), "Kobe", "Earthquake", 7, 20_000, 40_000_000.0, 30.0, 0.70, "Medical", true),
        ("E5", (2025, 6, 10), "Oslo", "Flood", 4, 2_000, 1_500_000.0, 8.0, 0.25, "Food", false),
        ("E6", (2025, 6, 11), "Kobe", "Storm", 8, 60_000, 12_000_000.0, 50.0, 0.60, "Shelter", true),
    ];

    let events = specs
        .into_iter()
        .map(|(id, date, loc, kind, sev, pop, loss, resp, infra, aid, major)| {
            let mut e = event(id, date, loc);
            e.disaster_type = kind.to_string();
            e.severity_level = sev;
            e.affected_population = pop;
            e.estimated_economic_loss_usd = loss;
            e.response_time_hours = resp;
            e.infrastructure_damage_index = infra;
            e.aid_provided = aid.to_string();
            e.is_major_disaster = major;
            CleanedEvent::new(e)
        })
        .collect();

    Dataset::from_events(events)
}
