use serde::Deserialize;
use serde::Serialize;

/// Gain range reported by a device: minimum and maximum in dB plus the step
/// between adjacent settings.
///
/// Some drivers report a step of zero; [`effective_step`](Self::effective_step)
/// substitutes one so step arithmetic never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainRange {
    pub minimum: f64,
    pub maximum: f64,
    pub step: f64,
}

impl GainRange {
    pub fn new(minimum: f64, maximum: f64, step: f64) -> Self {
        Self {
            minimum,
            maximum,
            step,
        }
    }

    /// The reported step, with zero mapped to one.
    pub fn effective_step(&self) -> f64 {
        if self.step == 0.0 {
            1.0
        } else {
            self.step
        }
    }

    /// Number of discrete steps between minimum and maximum, truncated
    /// toward zero.
    pub fn step_count(&self) -> u32 {
        ((self.maximum - self.minimum) / self.effective_step()) as u32
    }

    /// The dB value corresponding to `step`.
    pub fn step_to_db(&self, step: u32) -> f64 {
        self.minimum + step as f64 * self.effective_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_step_counts_as_one() {
        let r = GainRange::new(0.0, 48.0, 0.0);
        assert_eq!(r.effective_step(), 1.0);
        assert_eq!(r.step_count(), 48);
        assert_eq!(r.step_to_db(20), 20.0);
    }
    #[test]
    fn step_count_truncates() {
        let r = GainRange::new(0.0, 10.0, 3.0);
        assert_eq!(r.step_count(), 3);
    }
    #[test]
    fn step_to_db_offsets_from_minimum() {
        let r = GainRange::new(-12.0, 36.0, 0.5);
        assert_eq!(r.step_to_db(0), -12.0);
        assert_eq!(r.step_to_db(10), -7.0);
    }
    #[test]
    fn fractional_range() {
        let r = GainRange::new(20.0, 59.0, 2.0);
        assert_eq!(r.step_count(), 19);
        assert_eq!(r.step_to_db(19), 58.0);
    }
}
