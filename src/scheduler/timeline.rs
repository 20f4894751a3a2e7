//! Resource occupancy bookkeeping.
//!
//! A `Timeline` tracks the busy windows of one disjunctive resource
//! (a room or a surgeon). An `EquipmentLedger` tracks cumulative use of
//! shared equipment against its capacity.
//!
//! The earliest feasible start of a surgery is always either its own
//! earliest start or the end of some busy window, so the solver only
//! needs to probe those points (`release_points`).

use std::collections::BTreeMap;

use crate::models::{Minutes, TimeWindow};

/// Busy windows of a single resource, kept sorted by start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    busy: Vec<TimeWindow>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `window` overlaps no busy window.
    pub fn is_free(&self, window: &TimeWindow) -> bool {
        !self.busy.iter().any(|b| b.overlaps(window))
    }

    /// End of the latest busy window overlapping `window`, if any.
    pub fn blocked_until(&self, window: &TimeWindow) -> Option<Minutes> {
        self.busy
            .iter()
            .filter(|b| b.overlaps(window))
            .map(|b| b.end)
            .max()
    }

    /// Marks `window` busy.
    pub fn occupy(&mut self, window: TimeWindow) {
        let pos = self.busy.partition_point(|b| b.start <= window.start);
        self.busy.insert(pos, window);
    }

    /// Ends of busy windows at or after `from`.
    pub fn release_points(&self, from: Minutes) -> impl Iterator<Item = Minutes> + '_ {
        self.busy.iter().map(|b| b.end).filter(move |&e| e >= from)
    }

    /// Busy windows, in start order.
    pub fn windows(&self) -> &[TimeWindow] {
        &self.busy
    }
}

/// Cumulative usage of shared equipment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentLedger {
    capacity: BTreeMap<String, u32>,
    usage: BTreeMap<String, Vec<TimeWindow>>,
}

impl EquipmentLedger {
    /// Creates a ledger with the given capacities.
    pub fn new(capacity: BTreeMap<String, u32>) -> Self {
        Self {
            capacity,
            usage: BTreeMap::new(),
        }
    }

    /// Whether one more unit of `name` is available throughout `window`.
    ///
    /// Unknown equipment never fits.
    pub fn fits(&self, name: &str, window: &TimeWindow) -> bool {
        let Some(&cap) = self.capacity.get(name) else {
            return false;
        };
        let overlapping: Vec<&TimeWindow> = self
            .usage
            .get(name)
            .map(|u| u.iter().filter(|w| w.overlaps(window)).collect())
            .unwrap_or_default();

        // Peak concurrency inside `window` is reached at its start or at
        // the start of one of the overlapping uses.
        let peak = std::iter::once(window.start)
            .chain(overlapping.iter().map(|w| w.start.max(window.start)))
            .map(|t| overlapping.iter().filter(|w| w.contains(t)).count())
            .max()
            .unwrap_or(0);

        (peak as u32) < cap
    }

    /// Whether every item in `names` fits throughout `window`.
    pub fn fits_all(&self, names: &[String], window: &TimeWindow) -> bool {
        names.iter().all(|n| self.fits(n, window))
    }

    /// Records one unit of each item in `names` during `window`.
    pub fn occupy(&mut self, names: &[String], window: TimeWindow) {
        for name in names {
            self.usage.entry(name.clone()).or_default().push(window);
        }
    }

    /// Ends of uses of `names` at or after `from`.
    pub fn release_points(&self, names: &[String], from: Minutes) -> Vec<Minutes> {
        names
            .iter()
            .filter_map(|n| self.usage.get(n))
            .flat_map(|u| u.iter().map(|w| w.end))
            .filter(|&e| e >= from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_occupy_keeps_order() {
        let mut tl = Timeline::new();
        tl.occupy(TimeWindow::new(600, 700));
        tl.occupy(TimeWindow::new(480, 540));
        tl.occupy(TimeWindow::new(540, 600));
        let starts: Vec<i64> = tl.windows().iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![480, 540, 600]);
    }

    #[test]
    fn test_timeline_free_and_blocked() {
        let mut tl = Timeline::new();
        tl.occupy(TimeWindow::new(480, 600));
        assert!(!tl.is_free(&TimeWindow::new(590, 620)));
        assert!(tl.is_free(&TimeWindow::new(600, 620)));
        assert_eq!(tl.blocked_until(&TimeWindow::new(500, 510)), Some(600));
        assert_eq!(tl.blocked_until(&TimeWindow::new(600, 610)), None);
    }

    #[test]
    fn test_release_points() {
        let mut tl = Timeline::new();
        tl.occupy(TimeWindow::new(480, 540));
        tl.occupy(TimeWindow::new(540, 660));
        let points: Vec<i64> = tl.release_points(600).collect();
        assert_eq!(points, vec![660]);
    }

    #[test]
    fn test_equipment_capacity() {
        let caps = BTreeMap::from([("Robot".to_string(), 1), ("C-Arm".to_string(), 2)]);
        let mut ledger = EquipmentLedger::new(caps);
        let robot = vec!["Robot".to_string()];
        let carm = vec!["C-Arm".to_string()];

        assert!(ledger.fits_all(&robot, &TimeWindow::new(480, 600)));
        ledger.occupy(&robot, TimeWindow::new(480, 600));
        assert!(!ledger.fits_all(&robot, &TimeWindow::new(590, 650)));
        assert!(ledger.fits_all(&robot, &TimeWindow::new(600, 650)));

        ledger.occupy(&carm, TimeWindow::new(480, 540));
        ledger.occupy(&carm, TimeWindow::new(560, 620));
        // Never more than one C-Arm in use at once inside [500, 600).
        assert!(ledger.fits_all(&carm, &TimeWindow::new(500, 600)));
        ledger.occupy(&carm, TimeWindow::new(500, 600));
        assert!(!ledger.fits_all(&carm, &TimeWindow::new(510, 530)));
        assert_eq!(ledger.release_points(&carm, 550), vec![600, 620]);
    }

    #[test]
    fn test_unknown_equipment_never_fits() {
        let ledger = EquipmentLedger::new(BTreeMap::new());
        assert!(!ledger.fits("Laser", &TimeWindow::new(480, 490)));
        assert!(ledger.fits_all(&[], &TimeWindow::new(480, 490)));
    }
}
