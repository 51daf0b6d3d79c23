use crate::route::Route;
use serde::{Deserialize, Serialize};

// Regulatory thresholds in meters. Daytime limits apply to buildings in use;
// the tighter nighttime limits to buildings where occupants may be asleep.
const DAY_STAIR_MAX: f64 = 30.0;
const NIGHT_STAIR_MAX: f64 = 20.0;
const DAY_EXIT_MAX: f64 = 45.0;
const NIGHT_EXIT_MAX: f64 = 30.0;
const DAY_SECOND_EXIT_MAX: f64 = 80.0;
const NIGHT_SECOND_EXIT_MAX: f64 = 60.0;
const DEAD_END_MAX: f64 = 15.0;
const STAIR_CORRIDOR_MIN: f64 = 10.0;
const STAIR_CORRIDOR_MAX: f64 = 60.0;

/// Rule violations of one route, grouped by the scenario they apply to.
/// The general group stays empty until rules independent of the time of day
/// are added.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Violations {
    pub general: Vec<String>,
    pub daytime: Vec<String>,
    pub nighttime: Vec<String>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.daytime.is_empty() && self.nighttime.is_empty()
    }
}

/// Checks a route's metric outputs against the thresholds. Distances on the
/// route are expected in meters already.
pub fn check_route(route: &Route) -> Violations {
    let mut violations = Violations::default();

    if let Some(stair_distance) = route.distance_to_stair {
        if stair_distance >= 0.0 {
            check_max(
                &mut violations.daytime,
                "Distance to evacuation route",
                stair_distance,
                DAY_STAIR_MAX,
            );
            check_max(
                &mut violations.nighttime,
                "Distance to evacuation route",
                stair_distance,
                NIGHT_STAIR_MAX,
            );
        }
    }

    if let Some(distance) = route.distance {
        check_max(&mut violations.daytime, "Distance to nearest exit", distance, DAY_EXIT_MAX);
        check_max(
            &mut violations.nighttime,
            "Distance to nearest exit",
            distance,
            NIGHT_EXIT_MAX,
        );
    }

    if let Some(second) = route.second_exit_distance {
        check_max(
            &mut violations.daytime,
            "Distance to second exit",
            second,
            DAY_SECOND_EXIT_MAX,
        );
        check_max(
            &mut violations.nighttime,
            "Distance to second exit",
            second,
            NIGHT_SECOND_EXIT_MAX,
        );
    }

    if let Some(dead_end) = route.dead_end_length {
        check_max(&mut violations.daytime, "Dead-end corridor length", dead_end, DEAD_END_MAX);
        check_max(
            &mut violations.nighttime,
            "Dead-end corridor length",
            dead_end,
            DEAD_END_MAX,
        );
    }

    if let Some(corridor) = route.stair_corridor_length {
        if !(STAIR_CORRIDOR_MIN..=STAIR_CORRIDOR_MAX).contains(&corridor) {
            let message = format!(
                "Stair corridor length ({:.2}m) outside allowed range ({}m to {}m)",
                corridor, STAIR_CORRIDOR_MIN, STAIR_CORRIDOR_MAX
            );
            violations.daytime.push(message.clone());
            violations.nighttime.push(message);
        }
    }

    violations
}

fn check_max(bucket: &mut Vec<String>, description: &str, value: f64, limit: f64) {
    if value > limit {
        bucket.push(format!("{} ({:.2}m) exceeds maximum ({}m)", description, value, limit));
    }
}
