/// A per-element gain request: the name of a gain stage and the dB value to
/// apply, or `None` to leave the element at its device default.
///
/// Overrides are applied in sequence during configure. Duplicate names are
/// allowed; each apply is an independent device register write, so the last
/// one wins.
#[derive(Debug, Clone, PartialEq)]
pub struct GainOverride {
    pub name: String,
    pub db: Option<f64>,
}

impl GainOverride {
    pub fn new(name: impl Into<String>, db: Option<f64>) -> Self {
        Self {
            name: name.into(),
            db,
        }
    }
}

/// Validated inputs for one [`DeviceSession`](crate::DeviceSession).
///
/// Constructed once from CLI or config parsing (not this crate's concern)
/// and read-only afterwards. `None` means "use the device default" for the
/// optional fields.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device selector in key/value form, e.g. `driver=sdrplay`.
    pub device_args: String,
    /// RX channel index, validated against the device at open time.
    pub channel: usize,
    pub antenna: Option<String>,
    /// Baseband filter width in Hz. Defaults to 3 MHz, or 5 MHz for device
    /// families that want a wide filter.
    pub bandwidth: Option<f64>,
    /// Request automatic gain control. Fatal if the device lacks it.
    pub agc: bool,
    /// Top-level gain step. When `None` the device default is kept and
    /// reported instead.
    pub gain_step: Option<u32>,
    pub gain_overrides: Vec<GainOverride>,
    pub sample_rate: f64,
    pub frequency: f64,
    /// Enable the converter's DC blocker.
    pub dc_filter: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_args: String::new(),
            channel: 0,
            antenna: None,
            bandwidth: None,
            agc: false,
            gain_step: None,
            gain_overrides: Vec::new(),
            sample_rate: 2_400_000.0,
            frequency: 100_000_000.0,
            dc_filter: false,
        }
    }
}
