use log::info;

use crate::device::SdrDevice;
use crate::range::GainRange;
use crate::Error;

/// Translates abstract gain steps to and from a device's reported dB range.
///
/// The device's native gain setter takes an absolute value in its own units,
/// so [`set_gain_step`](Self::set_gain_step) passes the raw step through
/// unmodified. [`step_to_db`](Self::step_to_db) exists only to report the
/// equivalent dB figure to the operator and never feeds back into the
/// setter.
pub struct GainController<'a, D: SdrDevice> {
    dev: &'a D,
    channel: usize,
}

impl<'a, D: SdrDevice> GainController<'a, D> {
    pub fn new(dev: &'a D, channel: usize) -> Self {
        Self { dev, channel }
    }

    pub fn gain_range(&self) -> Result<GainRange, Error> {
        self.dev.gain_range(self.channel)
    }

    /// Number of discrete gain steps exposed to the caller.
    pub fn step_count(&self) -> Result<u32, Error> {
        Ok(self.gain_range()?.step_count())
    }

    /// The dB value reported for `step`.
    pub fn step_to_db(&self, step: u32) -> Result<f64, Error> {
        Ok(self.gain_range()?.step_to_db(step))
    }

    /// Set the device gain to the raw `step` value and return the gain the
    /// device reports afterwards.
    pub fn set_gain_step(&self, step: u32) -> Result<f64, Error> {
        self.dev.set_gain(self.channel, step as f64)?;
        if let Ok(db) = self.step_to_db(step) {
            info!("gain set to {:.1}dB{}", db, self.element_report());
        }
        self.dev.gain(self.channel)
    }

    /// Log the device's current gain and every per-element gain. Used when
    /// the caller left the gain at its device default.
    pub fn report_defaults(&self) {
        if let Ok(db) = self.dev.gain(self.channel) {
            info!("gain is {:.1}dB{}", db, self.element_report());
        }
    }

    fn element_report(&self) -> String {
        let mut out = String::new();
        if let Ok(elements) = self.dev.gain_elements(self.channel) {
            for name in elements {
                if let Ok(db) = self.dev.gain_element(self.channel, &name) {
                    out.push_str(&format!(", {name}={db:.1}dB"));
                }
            }
        }
        out
    }
}
