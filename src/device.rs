use crate::kwargs::Kwargs;
use crate::range::GainRange;
use crate::stream::RxStream;
use crate::Error;

/// Recognized device families. The family only influences defaults; the
/// acquisition loop never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    Generic,
    /// Devices that want a 5 MHz baseband filter when none is requested.
    WideBandwidthDefault,
}

impl DeviceFamily {
    /// Classify a device from its enumerated metadata.
    ///
    /// Case-sensitive prefix match: any key starting with `driver` whose
    /// value starts with `sdrplay` marks the wide-bandwidth family.
    pub fn classify(info: &Kwargs) -> DeviceFamily {
        for (key, value) in info.iter() {
            if key.starts_with("driver") && value.starts_with("sdrplay") {
                return DeviceFamily::WideBandwidthDefault;
            }
        }
        DeviceFamily::Generic
    }

    /// Baseband filter width applied when the caller requested none.
    pub fn default_bandwidth(&self) -> f64 {
        match self {
            DeviceFamily::WideBandwidthDefault => 5.0e6,
            DeviceFamily::Generic => 3.0e6,
        }
    }
}

/// Capability interface of an RX-capable SDR device.
///
/// Required parameters (sample rate, frequency, bandwidth) have plain
/// setters whose failure is fatal to configuration. Optional features come
/// in probe/act pairs: callers must check the `has_*` probe before touching
/// the corresponding getter or setter, so drivers are never asked for
/// operations they do not implement.
pub trait SdrDevice: Send {
    /// Associated RX stream type.
    type Rx: RxStream;

    /// Enumerate devices matching `args`, returning metadata per device.
    fn probe(args: &Kwargs) -> Result<Vec<Kwargs>, Error>
    where
        Self: Sized;
    /// Create a device from an argument string.
    fn open(args: &Kwargs) -> Result<Self, Error>
    where
        Self: Sized;

    fn hardware_info(&self) -> Result<Kwargs, Error>;
    fn hardware_key(&self) -> Result<String, Error>;
    /// Number of RX channels.
    fn num_channels(&self) -> Result<usize, Error>;

    fn antennas(&self, channel: usize) -> Result<Vec<String>, Error>;
    fn antenna(&self, channel: usize) -> Result<String, Error>;
    fn set_antenna(&self, channel: usize, name: &str) -> Result<(), Error>;

    fn sample_rate(&self, channel: usize) -> Result<f64, Error>;
    fn set_sample_rate(&self, channel: usize, rate: f64) -> Result<(), Error>;
    fn frequency(&self, channel: usize) -> Result<f64, Error>;
    fn set_frequency(&self, channel: usize, frequency: f64) -> Result<(), Error>;
    fn bandwidth(&self, channel: usize) -> Result<f64, Error>;
    fn set_bandwidth(&self, channel: usize, bandwidth: f64) -> Result<(), Error>;

    /// Does the device support automatic gain control?
    fn has_agc(&self, channel: usize) -> Result<bool, Error>;
    fn agc(&self, channel: usize) -> Result<bool, Error>;
    fn set_agc(&self, channel: usize, agc: bool) -> Result<(), Error>;

    /// Overall gain in dB, as reported by the device.
    fn gain(&self, channel: usize) -> Result<f64, Error>;
    /// Set the overall gain. The value is in the device's native units.
    fn set_gain(&self, channel: usize, gain: f64) -> Result<(), Error>;
    fn gain_range(&self, channel: usize) -> Result<GainRange, Error>;
    /// Names of the individually addressable gain stages.
    fn gain_elements(&self, channel: usize) -> Result<Vec<String>, Error>;
    fn gain_element(&self, channel: usize, name: &str) -> Result<f64, Error>;
    fn set_gain_element(&self, channel: usize, name: &str, db: f64) -> Result<(), Error>;

    fn has_dc_offset_mode(&self, channel: usize) -> Result<bool, Error>;
    fn dc_offset_mode(&self, channel: usize) -> Result<bool, Error>;
    fn has_dc_offset(&self, channel: usize) -> Result<bool, Error>;
    fn dc_offset(&self, channel: usize) -> Result<(f64, f64), Error>;
    fn has_iq_balance_mode(&self, channel: usize) -> Result<bool, Error>;
    fn iq_balance_mode(&self, channel: usize) -> Result<bool, Error>;
    fn has_iq_balance(&self, channel: usize) -> Result<bool, Error>;
    fn iq_balance(&self, channel: usize) -> Result<(f64, f64), Error>;
    fn has_frequency_correction(&self, channel: usize) -> Result<bool, Error>;
    fn frequency_correction(&self, channel: usize) -> Result<f64, Error>;

    /// Create a single-channel RX stream in interleaved signed 16-bit IQ.
    fn rx_stream(&self, channel: usize) -> Result<Self::Rx, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(pairs: &[(&str, &str)]) -> Kwargs {
        let mut k = Kwargs::new();
        for (key, value) in pairs {
            k.set(*key, *value);
        }
        k
    }

    #[test]
    fn classify_sdrplay_prefix() {
        let k = info(&[("driver", "sdrplay"), ("label", "RSP1A")]);
        assert_eq!(DeviceFamily::classify(&k), DeviceFamily::WideBandwidthDefault);
        let k = info(&[("driver", "sdrplay_rsp1a")]);
        assert_eq!(DeviceFamily::classify(&k), DeviceFamily::WideBandwidthDefault);
    }
    #[test]
    fn classify_matches_driver_key_prefix() {
        let k = info(&[("driver0", "sdrplay")]);
        assert_eq!(DeviceFamily::classify(&k), DeviceFamily::WideBandwidthDefault);
    }
    #[test]
    fn classify_is_case_sensitive() {
        let k = info(&[("driver", "SDRplay")]);
        assert_eq!(DeviceFamily::classify(&k), DeviceFamily::Generic);
    }
    #[test]
    fn classify_other_drivers_generic() {
        let k = info(&[("driver", "rtlsdr"), ("serial", "0001")]);
        assert_eq!(DeviceFamily::classify(&k), DeviceFamily::Generic);
        assert_eq!(DeviceFamily::classify(&Kwargs::new()), DeviceFamily::Generic);
    }
    #[test]
    fn default_bandwidths() {
        assert_eq!(DeviceFamily::Generic.default_bandwidth(), 3.0e6);
        assert_eq!(
            DeviceFamily::WideBandwidthDefault.default_bandwidth(),
            5.0e6
        );
    }
}
