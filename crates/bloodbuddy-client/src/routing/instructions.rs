//! Normalizes OSRM maneuvers into [`ManeuverKind`] and English instruction text.

use bloodbuddy_core::ManeuverKind;

/// Maps an OSRM maneuver `type` and optional `modifier` onto a [`ManeuverKind`].
pub(super) fn maneuver_kind(kind: &str, modifier: Option<&str>) -> ManeuverKind {
    match kind {
        "depart" => ManeuverKind::Depart,
        "arrive" => ManeuverKind::Arrive,
        "roundabout" | "rotary" | "roundabout turn" | "exit roundabout" | "exit rotary" => {
            ManeuverKind::Roundabout
        }
        "merge" => ManeuverKind::Merge,
        "fork" => ManeuverKind::Fork,
        _ => modifier_kind(modifier),
    }
}

fn modifier_kind(modifier: Option<&str>) -> ManeuverKind {
    match modifier {
        Some("uturn") => ManeuverKind::UTurn,
        Some("sharp right") => ManeuverKind::SharpRight,
        Some("right") => ManeuverKind::Right,
        Some("slight right") => ManeuverKind::SlightRight,
        Some("slight left") => ManeuverKind::SlightLeft,
        Some("left") => ManeuverKind::Left,
        Some("sharp left") => ManeuverKind::SharpLeft,
        _ => ManeuverKind::Straight,
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Builds the spoken/displayed text for one step.
pub(super) fn instruction_text(
    maneuver: ManeuverKind,
    osrm_type: &str,
    modifier: Option<&str>,
    road: &str,
    exit: Option<u32>,
) -> String {
    let road = road.trim();
    let onto = if road.is_empty() {
        String::new()
    } else {
        format!(" onto {road}")
    };

    match maneuver {
        ManeuverKind::Depart => {
            if road.is_empty() {
                "Head out".to_string()
            } else {
                format!("Head out on {road}")
            }
        }
        ManeuverKind::Arrive => "You have arrived at your destination".to_string(),
        ManeuverKind::Roundabout => match exit {
            Some(n) => format!("Enter the roundabout and take the {} exit{onto}", ordinal(n)),
            None => format!("Enter the roundabout{onto}"),
        },
        ManeuverKind::Merge => format!("Merge{onto}"),
        ManeuverKind::Fork => {
            let side = match modifier {
                Some(m) if m.contains("left") => "left",
                Some(m) if m.contains("right") => "right",
                _ => "straight",
            };
            format!("Keep {side} at the fork{onto}")
        }
        ManeuverKind::UTurn => format!("Make a U-turn{onto}"),
        ManeuverKind::Straight => {
            if road.is_empty() {
                "Continue straight".to_string()
            } else {
                format!("Continue{onto}")
            }
        }
        turn => {
            let direction = match turn {
                ManeuverKind::SlightLeft => "slightly left",
                ManeuverKind::SharpLeft => "sharp left",
                ManeuverKind::SlightRight => "slightly right",
                ManeuverKind::Right => "right",
                ManeuverKind::SharpRight => "sharp right",
                _ => "left",
            };
            if matches!(osrm_type, "on ramp" | "off ramp") {
                format!("Take the ramp on the {}{onto}", side_of(turn))
            } else {
                format!("Turn {direction}{onto}")
            }
        }
    }
}

fn side_of(kind: ManeuverKind) -> &'static str {
    match kind {
        ManeuverKind::SlightRight | ManeuverKind::Right | ManeuverKind::SharpRight => "right",
        _ => "left",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_modifiers_map_to_kinds() {
        assert_eq!(maneuver_kind("turn", Some("left")), ManeuverKind::Left);
        assert_eq!(
            maneuver_kind("end of road", Some("sharp right")),
            ManeuverKind::SharpRight
        );
        assert_eq!(maneuver_kind("continue", Some("uturn")), ManeuverKind::UTurn);
        assert_eq!(maneuver_kind("new name", None), ManeuverKind::Straight);
        assert_eq!(maneuver_kind("rotary", Some("right")), ManeuverKind::Roundabout);
        assert_eq!(maneuver_kind("arrive", Some("left")), ManeuverKind::Arrive);
    }

    #[test]
    fn turn_text_names_the_road() {
        let kind = maneuver_kind("turn", Some("slight left"));
        assert_eq!(
            instruction_text(kind, "turn", Some("slight left"), "MG Road", None),
            "Turn slightly left onto MG Road"
        );
        assert_eq!(
            instruction_text(ManeuverKind::Right, "turn", Some("right"), "", None),
            "Turn right"
        );
    }

    #[test]
    fn roundabout_text_uses_ordinal_exit() {
        assert_eq!(
            instruction_text(ManeuverKind::Roundabout, "roundabout", None, "Camp Road", Some(2)),
            "Enter the roundabout and take the 2nd exit onto Camp Road"
        );
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(3), "3rd");
    }

    #[test]
    fn depart_and_arrive_text() {
        assert_eq!(
            instruction_text(ManeuverKind::Depart, "depart", None, "Station Road", None),
            "Head out on Station Road"
        );
        assert_eq!(
            instruction_text(ManeuverKind::Arrive, "arrive", None, "Station Road", None),
            "You have arrived at your destination"
        );
    }

    #[test]
    fn ramps_and_forks() {
        assert_eq!(
            instruction_text(ManeuverKind::SlightRight, "off ramp", Some("slight right"), "NH 53", None),
            "Take the ramp on the right onto NH 53"
        );
        assert_eq!(
            instruction_text(ManeuverKind::Fork, "fork", Some("slight left"), "", None),
            "Keep left at the fork"
        );
    }
}
