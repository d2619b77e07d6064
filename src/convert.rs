use num_complex::Complex;
use num_complex::Complex32;

use crate::Error;

/// Wire format of the raw stream a converter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Interleaved signed 16-bit IQ.
    Cs16,
}

/// Signal statistics accumulated while converting one block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockStats {
    /// Mean magnitude of the converted samples.
    pub mean_level: f32,
    /// Mean squared magnitude of the converted samples.
    pub mean_power: f32,
}

/// Stateful transform from raw device samples to the canonical complex
/// float format. State (e.g. the DC estimate) carries across blocks.
pub trait SampleConverter: Send {
    /// Convert `raw` into `out`.
    ///
    /// # Panics
    /// If `raw` and `out` differ in length.
    fn convert(&mut self, raw: &[Complex<i16>], out: &mut [Complex32]) -> BlockStats;
}

/// Build a converter for `format` at the configured sample rate.
pub fn make_converter(
    format: InputFormat,
    _sample_rate: f64,
    dc_filter: bool,
) -> Result<Box<dyn SampleConverter>, Error> {
    match format {
        InputFormat::Cs16 => Ok(Box::new(Cs16Converter::new(dc_filter))),
    }
}

const SCALE: f32 = 1.0 / 32768.0;
/// Single-pole DC tracker coefficient. Small enough that the estimate moves
/// slowly compared to any signal of interest.
const DC_ALPHA: f32 = 1.0 / 4096.0;

struct Cs16Converter {
    dc_filter: bool,
    dc: Complex32,
}

impl Cs16Converter {
    fn new(dc_filter: bool) -> Self {
        Self {
            dc_filter,
            dc: Complex32::default(),
        }
    }
}

impl SampleConverter for Cs16Converter {
    fn convert(&mut self, raw: &[Complex<i16>], out: &mut [Complex32]) -> BlockStats {
        assert_eq!(raw.len(), out.len());
        if raw.is_empty() {
            return BlockStats::default();
        }
        let mut level = 0.0f64;
        let mut power = 0.0f64;
        for (r, o) in raw.iter().zip(out.iter_mut()) {
            let mut s = Complex32::new(f32::from(r.re) * SCALE, f32::from(r.im) * SCALE);
            if self.dc_filter {
                self.dc += (s - self.dc) * DC_ALPHA;
                s -= self.dc;
            }
            let p = f64::from(s.norm_sqr());
            power += p;
            level += p.sqrt();
            *o = s;
        }
        let n = raw.len() as f64;
        BlockStats {
            mean_level: (level / n) as f32,
            mean_power: (power / n) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(dc_filter: bool) -> Box<dyn SampleConverter> {
        make_converter(InputFormat::Cs16, 2.4e6, dc_filter).unwrap()
    }

    #[test]
    fn scales_to_unit_range() {
        let mut c = converter(false);
        let raw = vec![Complex::new(16384i16, -16384i16); 8];
        let mut out = vec![Complex32::default(); 8];
        let stats = c.convert(&raw, &mut out);
        assert!((out[0].re - 0.5).abs() < 1e-4);
        assert!((out[0].im + 0.5).abs() < 1e-4);
        let expected_power = 0.5f32;
        assert!((stats.mean_power - expected_power).abs() < 1e-3);
        assert!((stats.mean_level - expected_power.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn empty_block_is_harmless() {
        let mut c = converter(false);
        let stats = c.convert(&[], &mut []);
        assert_eq!(stats, BlockStats::default());
    }

    #[test]
    fn dc_filter_pulls_constant_input_toward_zero() {
        let mut c = converter(true);
        let raw = vec![Complex::new(8192i16, 0i16); 4096];
        let mut out = vec![Complex32::default(); 4096];
        c.convert(&raw, &mut out);
        let first = out[0].re;
        let last = out[4095].re;
        assert!(last.abs() < first.abs());
    }

    #[test]
    fn dc_state_carries_across_blocks() {
        let mut c = converter(true);
        let raw = vec![Complex::new(8192i16, 0i16); 1024];
        let mut out = vec![Complex32::default(); 1024];
        c.convert(&raw, &mut out);
        let end_of_first = out[1023].re;
        c.convert(&raw, &mut out);
        assert!(out[0].re.abs() < end_of_first.abs() + 1e-6);
        assert!(out[1023].re.abs() < end_of_first.abs());
    }
}
