use super::MetricKind;

/// Alert state change to report to the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertTransition {
    On,
    Off,
}

/// Hysteresis alert state for one metric.
///
/// Every sub-threshold keeps its own "over limit" flag, while the alert
/// itself has a single firing flag for the whole metric: it turns on when
/// any sub-threshold goes over and only turns off once every one of them is
/// back under. A sub-signal oscillating around its limit therefore cannot
/// flap the alert while another one is still over.
#[derive(Debug)]
pub struct AlertTracker {
    kind: MetricKind,
    firing: bool,
    over: Vec<bool>,
}

impl AlertTracker {
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            firing: false,
            over: vec![false; kind.sub_threshold_count()],
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Record whether sub-threshold `sub` is over its configured limit.
    /// A limit of 0 means the sub-threshold is disabled and never trips.
    pub fn observe(&mut self, sub: usize, limit: u64, value: u64) {
        self.over[sub] = limit > 0 && value >= limit;
    }

    /// Evaluate the firing flag against the sub-threshold flags, returning
    /// the transition to report, if any.
    pub fn transition(&mut self) -> Option<AlertTransition> {
        let any_over = self.over.iter().any(|over| *over);
        match (any_over, self.firing) {
            (true, false) => {
                self.firing = true;
                Some(AlertTransition::On)
            }
            (false, true) => {
                self.firing = false;
                Some(AlertTransition::Off)
            }
            _ => None,
        }
    }

    /// Feed one `(limit, value)` reading per sub-threshold and evaluate.
    pub fn update(&mut self, readings: &[(u64, u64)]) -> Option<AlertTransition> {
        for (sub, (limit, value)) in readings.iter().enumerate() {
            self.observe(sub, *limit, *value);
        }
        self.transition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_on_crossing() {
        let mut tracker = AlertTracker::new(MetricKind::Cpu);

        assert_eq!(tracker.update(&[(50, 10), (0, 90)]), None);
        assert_eq!(
            tracker.update(&[(50, 70), (0, 90)]),
            Some(AlertTransition::On)
        );
        // Staying over the limit must not re-fire
        assert_eq!(tracker.update(&[(50, 80), (0, 90)]), None);
        assert_eq!(
            tracker.update(&[(50, 10), (0, 90)]),
            Some(AlertTransition::Off)
        );
        assert_eq!(tracker.update(&[(50, 10), (0, 90)]), None);
    }

    #[test]
    fn value_equal_to_limit_trips() {
        let mut tracker = AlertTracker::new(MetricKind::Memory);
        assert_eq!(tracker.update(&[(80, 80)]), Some(AlertTransition::On));
    }

    #[test]
    fn zero_limit_never_trips() {
        let mut tracker = AlertTracker::new(MetricKind::Network);
        assert_eq!(tracker.update(&[(0, u64::MAX), (0, u64::MAX)]), None);
        assert_eq!(tracker.update(&[(0, 0), (0, 0)]), None);
    }

    #[test]
    fn stays_on_until_all_sub_thresholds_clear() {
        let mut tracker = AlertTracker::new(MetricKind::Gpu);

        assert_eq!(
            tracker.update(&[(90, 95), (4000, 4500)]),
            Some(AlertTransition::On)
        );
        // Load drops back but memory is still over: no transition
        assert_eq!(tracker.update(&[(90, 10), (4000, 4500)]), None);
        // Load oscillates over again while memory stays over: still nothing
        assert_eq!(tracker.update(&[(90, 95), (4000, 4500)]), None);
        assert_eq!(
            tracker.update(&[(90, 10), (4000, 100)]),
            Some(AlertTransition::Off)
        );
    }
}
