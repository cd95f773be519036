use std::collections::HashSet;

use geo_types::Point;
use log::debug;

use crate::{
    geodesy::haversine_distance,
    tour::stop::{Stop, StopId},
};

/// Outcome of checking one position against the stop list.
#[derive(Debug, Clone, Copy)]
pub enum TriggerResult<'a> {
    NoTrigger,
    Triggered { stop: &'a Stop, distance: f64 },
}

impl<'a> TriggerResult<'a> {
    pub fn stop(&self) -> Option<&'a Stop> {
        match *self {
            TriggerResult::NoTrigger => None,
            TriggerResult::Triggered { stop, .. } => Some(stop),
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, TriggerResult::Triggered { .. })
    }
}

/// Finds the stop that `position` has just entered, if any.
///
/// Stops are scanned in authored order and the first one whose geofence
/// contains the position wins, even if a later stop is closer. The stop equal
/// to `last_triggered` is skipped so staying inside a geofence fires once.
pub fn evaluate<'a>(
    position: Point<f64>,
    stops: &'a [Stop],
    last_triggered: Option<StopId>,
) -> TriggerResult<'a> {
    stops
        .iter()
        .find_map(|stop| {
            let distance = haversine_distance(position, stop.coord);
            debug!("Stop {} ({}) is {distance:.1}m away", stop.id, stop.name);

            if distance <= stop.radius && last_triggered != Some(stop.id) {
                Some(TriggerResult::Triggered { stop, distance })
            } else {
                None
            }
        })
        .unwrap_or(TriggerResult::NoTrigger)
}

/// First stop in authored order that has not been completed yet.
pub fn next_pending_stop<'a>(stops: &'a [Stop], completed: &HashSet<StopId>) -> Option<&'a Stop> {
    stops.iter().find(|s| !completed.contains(&s.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_stops() -> Vec<Stop> {
        vec![
            Stop::new(StopId::new(1), "Stearns Wharf", 34.4087, -119.6857, 75.0),
            Stop::new(StopId::new(2), "Funk Zone", 34.4036, -119.6916, 100.0),
        ]
    }

    fn triggered_id(result: TriggerResult<'_>) -> Option<u32> {
        result.stop().map(|s| s.id.get())
    }

    #[test]
    fn empty_stop_list_never_triggers() {
        let result = evaluate(Point::new(-119.6857, 34.4087), &[], None);
        assert!(!result.is_triggered());
    }

    #[test]
    fn outside_every_radius_is_no_trigger() {
        let stops = scenario_stops();
        let outside = [
            Point::new(-119.6857, 34.4200),
            Point::new(-119.6700, 34.4087),
            Point::new(-119.6890, 34.4060),
            Point::new(0.0, 0.0),
        ];

        for p in outside {
            assert!(!evaluate(p, &stops, None).is_triggered(), "{p:?}");
        }
    }

    #[test]
    fn fires_once_while_inside() {
        let stops = scenario_stops();
        let at_first = stops[0].coord;

        let first = evaluate(at_first, &stops, None);
        assert_eq!(triggered_id(first), Some(1));

        for _ in 0..3 {
            assert!(!evaluate(at_first, &stops, Some(StopId::new(1))).is_triggered());
        }
    }

    #[test]
    fn guard_resets_only_after_another_stop_fires() {
        let stops = scenario_stops();

        assert_eq!(
            triggered_id(evaluate(stops[1].coord, &stops, Some(StopId::new(1)))),
            Some(2)
        );
        assert_eq!(
            triggered_id(evaluate(stops[0].coord, &stops, Some(StopId::new(2)))),
            Some(1)
        );
    }

    #[test]
    fn authored_order_beats_proximity_on_overlap() {
        // Both geofences contain the position, and the second stop is closer.
        let stops = vec![
            Stop::new(StopId::new(1), "Plaza", 34.4200, -119.7000, 300.0),
            Stop::new(StopId::new(2), "Fountain", 34.4210, -119.7000, 300.0),
        ];
        let position = Point::new(-119.7000, 34.4209);

        let distance_to_second = haversine_distance(position, stops[1].coord);
        let distance_to_first = haversine_distance(position, stops[0].coord);
        assert!(distance_to_second < distance_to_first);

        assert_eq!(triggered_id(evaluate(position, &stops, None)), Some(1));
        assert_eq!(
            triggered_id(evaluate(position, &stops, Some(StopId::new(1)))),
            Some(2)
        );
    }

    #[test]
    fn reports_distance_of_the_match() {
        let stops = vec![Stop::new(StopId::new(1), "Origin", 0.0, 0.0, 1.0)];

        match evaluate(Point::new(0.0, 0.0), &stops, None) {
            TriggerResult::Triggered { distance, .. } => assert_eq!(distance, 0.0),
            TriggerResult::NoTrigger => panic!("expected trigger"),
        }
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let position = Point::new(-119.6890, 34.4080);
        let coord = Point::new(-119.6857, 34.4087);
        let edge = haversine_distance(position, coord);

        let on_edge = vec![Stop::new(StopId::new(1), "Edge", coord.y(), coord.x(), edge)];
        assert_eq!(triggered_id(evaluate(position, &on_edge, None)), Some(1));

        let just_short = vec![Stop::new(StopId::new(1), "Edge", coord.y(), coord.x(), edge - 1e-9)];
        assert!(!evaluate(position, &just_short, None).is_triggered());
    }

    #[test]
    fn next_pending_follows_authored_order() {
        let stops = scenario_stops();
        let mut completed = HashSet::new();

        assert_eq!(next_pending_stop(&stops, &completed).map(|s| s.id.get()), Some(1));

        completed.insert(StopId::new(2));
        assert_eq!(next_pending_stop(&stops, &completed).map(|s| s.id.get()), Some(1));

        completed.insert(StopId::new(1));
        assert!(next_pending_stop(&stops, &completed).is_none());
    }
}
