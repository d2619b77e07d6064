//! Capability negotiation.
//!
//! Optional device features are probed before they are touched; the value
//! getters and setters below are only reached when the matching `has_*`
//! probe answered true. Required parameters (sample rate, frequency,
//! bandwidth) have no probe and fail the configure phase directly.

use log::info;

use crate::device::SdrDevice;
use crate::Error;

/// Apply the requested AGC mode.
///
/// Requesting AGC on a device without support is fatal. When AGC is
/// supported but not requested it is explicitly disabled rather than left
/// in its power-on state.
pub fn apply_agc<D: SdrDevice>(dev: &D, channel: usize, requested: bool) -> Result<(), Error> {
    let has_agc = dev.has_agc(channel).unwrap_or(false);
    if requested {
        if !has_agc {
            return Err(Error::Configuration(
                "device does not support enabling AGC".into(),
            ));
        }
        dev.set_agc(channel, true)
            .map_err(|e| Error::Configuration(format!("set_agc failed: {e}")))?;
    } else if has_agc {
        dev.set_agc(channel, false)
            .map_err(|e| Error::Configuration(format!("set_agc failed: {e}")))?;
    }
    Ok(())
}

/// Log the negotiated device settings. Best effort; never fatal.
pub fn report_settings<D: SdrDevice>(dev: &D, channel: usize) {
    if let Ok(f) = dev.frequency(channel) {
        info!("frequency is {:.1} MHz", f / 1e6);
    }
    if let Ok(r) = dev.sample_rate(channel) {
        info!("sample rate is {:.1} MHz", r / 1e6);
    }
    if let Ok(b) = dev.bandwidth(channel) {
        info!("bandwidth is {:.1} MHz", b / 1e6);
    }
    if dev.has_agc(channel).unwrap_or(false) {
        if let Ok(agc) = dev.agc(channel) {
            info!("AGC mode is {}", if agc { "enabled" } else { "disabled" });
        }
    }
    if let Ok(antenna) = dev.antenna(channel) {
        info!("antenna is {antenna}");
    }
    if dev.has_dc_offset_mode(channel).unwrap_or(false) {
        if let Ok(auto) = dev.dc_offset_mode(channel) {
            info!(
                "DC offset mode is {}",
                if auto { "enabled" } else { "disabled" }
            );
        }
    }
    if dev.has_dc_offset(channel).unwrap_or(false) {
        if let Ok((i, q)) = dev.dc_offset(channel) {
            info!("DC offset is I={i:.1}, Q={q:.1}");
        }
    }
    if dev.has_iq_balance_mode(channel).unwrap_or(false) {
        if let Ok(auto) = dev.iq_balance_mode(channel) {
            info!(
                "IQ balance mode is {}",
                if auto { "enabled" } else { "disabled" }
            );
        }
    }
    if dev.has_iq_balance(channel).unwrap_or(false) {
        if let Ok((i, q)) = dev.iq_balance(channel) {
            info!("IQ balance is I={i:.1}, Q={q:.1}");
        }
    }
    if dev.has_frequency_correction(channel).unwrap_or(false) {
        if let Ok(ppm) = dev.frequency_correction(channel) {
            info!("frequency correction is {ppm:.1} ppm");
        }
    }
}
