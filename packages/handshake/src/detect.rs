use core::fmt::Write;

use heapless::String;

use crate::types::SampleBatch;

pub const INITIAL_SENSITIVITY: i32 = 850;
pub const SENSITIVITY_STEP: i32 = 25;
/// A negative threshold would turn every batch into a gesture.
pub const SENSITIVITY_FLOOR: i32 = 0;

pub const STATUS_LINE_MAX: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Shake { dy: i32 },
    Quiet,
}

/// Streaming gesture filter: end-minus-start difference along the
/// vertical axis against a user-adjustable threshold. No retained
/// history, no smoothing.
pub struct Detector {
    sensitivity: i32,
}

impl Detector {
    pub const fn new() -> Self {
        Self {
            sensitivity: INITIAL_SENSITIVITY,
        }
    }

    pub fn classify(&self, batch: &SampleBatch) -> Classification {
        let dy = i32::from(batch.last_y()) - i32::from(batch.first_y());
        if dy > self.sensitivity {
            Classification::Shake { dy }
        } else {
            Classification::Quiet
        }
    }

    pub fn raise(&mut self) -> i32 {
        self.sensitivity += SENSITIVITY_STEP;
        self.sensitivity
    }

    pub fn lower(&mut self) -> i32 {
        self.sensitivity = (self.sensitivity - SENSITIVITY_STEP).max(SENSITIVITY_FLOOR);
        self.sensitivity
    }

    pub fn sensitivity(&self) -> i32 {
        self.sensitivity
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

pub fn status_line(sensitivity: i32, detected: bool) -> String<STATUS_LINE_MAX> {
    let mut out = String::new();
    let _ = write!(&mut out, "Threshold: {sensitivity}");
    if detected {
        let _ = out.push_str("\nHandshake!");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleBatch;

    #[test]
    fn shake_strictly_above_threshold() {
        let detector = Detector::new();
        let over = SampleBatch::from_y([0, 120, -40, 310, 900]);
        assert_eq!(detector.classify(&over), Classification::Shake { dy: 900 });

        let exact = SampleBatch::from_y([0, 500, 700, 800, 850]);
        assert_eq!(detector.classify(&exact), Classification::Quiet);
    }

    #[test]
    fn only_endpoints_matter() {
        let detector = Detector::new();
        let spiky_middle = SampleBatch::from_y([0, 4_000, -4_000, 4_000, 100]);
        assert_eq!(detector.classify(&spiky_middle), Classification::Quiet);
    }

    #[test]
    fn steps_accumulate_in_any_interleaving() {
        let mut detector = Detector::new();
        assert_eq!(detector.raise(), 875);
        assert_eq!(detector.raise(), 900);
        assert_eq!(detector.lower(), 875);
        assert_eq!(detector.raise(), 900);
        // 850 + 25 * 3 - 25 * 1
        assert_eq!(detector.sensitivity(), 900);
    }

    #[test]
    fn lower_clamps_at_floor() {
        let mut detector = Detector::new();
        for _ in 0..40 {
            detector.lower();
        }
        assert_eq!(detector.sensitivity(), SENSITIVITY_FLOOR);
        assert_eq!(detector.lower(), SENSITIVITY_FLOOR);
        assert_eq!(detector.raise(), SENSITIVITY_FLOOR + SENSITIVITY_STEP);
    }

    #[test]
    fn status_line_literals() {
        assert_eq!(status_line(850, false).as_str(), "Threshold: 850");
        assert_eq!(status_line(950, false).as_str(), "Threshold: 950");
        assert_eq!(status_line(850, true).as_str(), "Threshold: 850\nHandshake!");
    }
}
