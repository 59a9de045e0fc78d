//! Plain-text rendering of donor tables, routes and map frames.

use bloodbuddy_app::{DonorRow, MapSnapshot, MarkerKind};
use bloodbuddy_core::RouteSummary;

pub(crate) fn print_donor_table(rows: &[DonorRow]) {
    if rows.is_empty() {
        println!("no donors found");
        return;
    }
    println!("{:<4}{:<24}{:<20}{:<10}CONTACT", "#", "NAME", "CITY", "KM");
    for (index, row) in rows.iter().enumerate() {
        println!(
            "{:<4}{:<24}{:<20}{:<10}{}",
            index,
            truncate(&row.name, 22),
            truncate(&row.city, 18),
            row.distance,
            row.contact
        );
    }
}

pub(crate) fn print_route(summary: &RouteSummary) {
    println!("{}", summary.label());
    for step in &summary.steps {
        println!("  {} {}", step.maneuver.glyph(), step.text);
    }
}

/// One line per published frame of the map.
pub(crate) fn describe_frame(snapshot: &MapSnapshot) -> String {
    let donors = snapshot
        .markers
        .iter()
        .filter(|m| m.kind == MarkerKind::Donor)
        .count();
    let mut line = format!(
        "[{}] donors={donors} tile={}",
        snapshot.center, snapshot.center_tile_url
    );
    if let Some(route) = &snapshot.route {
        line.push_str(&format!(" route=\"{}\"", route.label));
    }
    if let Some(panel) = &snapshot.navigation {
        line.push_str(&format!(
            " nav=\"{} {}\" bearing={:.0}",
            panel.glyph, panel.instruction, snapshot.bearing_degrees
        ));
    }
    if let Some(banner) = &snapshot.banner {
        line.push_str(&format!(" banner=\"{banner}\""));
    }
    line
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width - 3).collect::<String>())
    } else {
        text.to_string()
    }
}
