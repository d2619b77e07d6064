//! Scripted in-process device backend for tests and demos.
//!
//! The device records every mutating call and can be told to fail specific
//! operations or to serve a fixed sequence of reads. Knobs are passed in the
//! open arguments:
//!
//! - `channels=N` number of RX channels (default 1)
//! - `enumerate='sdrplay rtlsdr'` driver names to report from `probe`
//! - `agc=0|1` whether AGC is supported (default 1)
//! - `fail='open set_bandwidth'` operations that return an error
//! - `reads='1024 1024'` read sizes to serve before end-of-stream

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use num_complex::Complex;

use crate::range::GainRange;
use crate::Error;
use crate::Kwargs;
use crate::RxStream;
use crate::SdrDevice;

struct State {
    args: Kwargs,
    num_channels: usize,
    agc_supported: bool,
    agc: bool,
    sample_rate: f64,
    frequency: f64,
    bandwidth: f64,
    antenna: String,
    gain: f64,
    gain_range: GainRange,
    elements: Vec<(String, f64)>,
    fail: Vec<String>,
    reads: VecDeque<usize>,
    calls: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            args: Kwargs::new(),
            num_channels: 1,
            agc_supported: true,
            agc: false,
            sample_rate: 0.0,
            frequency: 0.0,
            bandwidth: 0.0,
            antenna: "RX".to_string(),
            gain: 12.0,
            gain_range: GainRange::new(0.0, 48.0, 1.0),
            elements: vec![("RF".to_string(), 12.0), ("IF".to_string(), 0.0)],
            fail: Vec::new(),
            reads: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

/// Scripted device. Cloning yields a handle to the same device state.
#[derive(Clone)]
pub struct Dummy {
    state: Arc<Mutex<State>>,
}

impl Dummy {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Every mutating call made so far, in order, e.g. `set_agc(false)`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn check_channel(&self, channel: usize) -> Result<(), Error> {
        if channel >= self.lock().num_channels {
            return Err(Error::ValueError);
        }
        Ok(())
    }

    fn record(&self, op: &str, record: String) -> Result<(), Error> {
        let mut s = self.lock();
        s.calls.push(record);
        if s.fail.iter().any(|f| f == op) {
            return Err(Error::Device(format!("{op} failed")));
        }
        Ok(())
    }
}

fn word_list(args: &Kwargs, key: &str) -> Vec<String> {
    args.get::<String>(key)
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

impl SdrDevice for Dummy {
    type Rx = DummyRxStream;

    fn probe(args: &Kwargs) -> Result<Vec<Kwargs>, Error> {
        let drivers = word_list(args, "enumerate");
        if !drivers.is_empty() {
            return Ok(drivers
                .into_iter()
                .map(|d| {
                    let mut k = Kwargs::new();
                    k.set("driver", d);
                    k
                })
                .collect());
        }
        if args.contains("driver") {
            Ok(vec![args.clone()])
        } else {
            let mut k = Kwargs::new();
            k.set("driver", "dummy");
            Ok(vec![k])
        }
    }

    fn open(args: &Kwargs) -> Result<Self, Error> {
        let mut state = State {
            args: args.clone(),
            ..State::default()
        };
        if let Ok(n) = args.get::<usize>("channels") {
            state.num_channels = n;
        }
        if let Ok(agc) = args.get::<u32>("agc") {
            state.agc_supported = agc != 0;
        }
        state.fail = word_list(args, "fail");
        state.reads = word_list(args, "reads")
            .iter()
            .filter_map(|w| w.parse().ok())
            .collect();
        if state.fail.iter().any(|f| f == "open") {
            return Err(Error::Device("open failed".to_string()));
        }
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    fn hardware_info(&self) -> Result<Kwargs, Error> {
        Ok(self.lock().args.clone())
    }

    fn hardware_key(&self) -> Result<String, Error> {
        Ok("DUMMY".to_string())
    }

    fn num_channels(&self) -> Result<usize, Error> {
        Ok(self.lock().num_channels)
    }

    fn antennas(&self, channel: usize) -> Result<Vec<String>, Error> {
        self.check_channel(channel)?;
        Ok(vec!["RX".to_string(), "AUX".to_string()])
    }

    fn antenna(&self, channel: usize) -> Result<String, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().antenna.clone())
    }

    fn set_antenna(&self, channel: usize, name: &str) -> Result<(), Error> {
        self.check_channel(channel)?;
        self.record("set_antenna", format!("set_antenna({name})"))?;
        self.lock().antenna = name.to_string();
        Ok(())
    }

    fn sample_rate(&self, channel: usize) -> Result<f64, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().sample_rate)
    }

    fn set_sample_rate(&self, channel: usize, rate: f64) -> Result<(), Error> {
        self.check_channel(channel)?;
        self.record("set_sample_rate", format!("set_sample_rate({rate})"))?;
        self.lock().sample_rate = rate;
        Ok(())
    }

    fn frequency(&self, channel: usize) -> Result<f64, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().frequency)
    }

    fn set_frequency(&self, channel: usize, frequency: f64) -> Result<(), Error> {
        self.check_channel(channel)?;
        self.record("set_frequency", format!("set_frequency({frequency})"))?;
        self.lock().frequency = frequency;
        Ok(())
    }

    fn bandwidth(&self, channel: usize) -> Result<f64, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().bandwidth)
    }

    fn set_bandwidth(&self, channel: usize, bandwidth: f64) -> Result<(), Error> {
        self.check_channel(channel)?;
        self.record("set_bandwidth", format!("set_bandwidth({bandwidth})"))?;
        self.lock().bandwidth = bandwidth;
        Ok(())
    }

    fn has_agc(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().agc_supported)
    }

    fn agc(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        let s = self.lock();
        if !s.agc_supported {
            return Err(Error::NotSupported);
        }
        Ok(s.agc)
    }

    fn set_agc(&self, channel: usize, agc: bool) -> Result<(), Error> {
        self.check_channel(channel)?;
        if !self.lock().agc_supported {
            return Err(Error::NotSupported);
        }
        self.record("set_agc", format!("set_agc({agc})"))?;
        self.lock().agc = agc;
        Ok(())
    }

    fn gain(&self, channel: usize) -> Result<f64, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().gain)
    }

    fn set_gain(&self, channel: usize, gain: f64) -> Result<(), Error> {
        self.check_channel(channel)?;
        self.record("set_gain", format!("set_gain({gain})"))?;
        self.lock().gain = gain;
        Ok(())
    }

    fn gain_range(&self, channel: usize) -> Result<GainRange, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().gain_range)
    }

    fn gain_elements(&self, channel: usize) -> Result<Vec<String>, Error> {
        self.check_channel(channel)?;
        Ok(self.lock().elements.iter().map(|(n, _)| n.clone()).collect())
    }

    fn gain_element(&self, channel: usize, name: &str) -> Result<f64, Error> {
        self.check_channel(channel)?;
        self.lock()
            .elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, db)| *db)
            .ok_or(Error::NotFound)
    }

    fn set_gain_element(&self, channel: usize, name: &str, db: f64) -> Result<(), Error> {
        self.check_channel(channel)?;
        self.record(
            "set_gain_element",
            format!("set_gain_element({name}, {db})"),
        )?;
        let mut s = self.lock();
        let entry = s
            .elements
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or(Error::NotFound)?;
        entry.1 = db;
        Ok(())
    }

    fn has_dc_offset_mode(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Ok(false)
    }

    fn dc_offset_mode(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Err(Error::NotSupported)
    }

    fn has_dc_offset(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Ok(false)
    }

    fn dc_offset(&self, channel: usize) -> Result<(f64, f64), Error> {
        self.check_channel(channel)?;
        Err(Error::NotSupported)
    }

    fn has_iq_balance_mode(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Ok(false)
    }

    fn iq_balance_mode(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Err(Error::NotSupported)
    }

    fn has_iq_balance(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Ok(false)
    }

    fn iq_balance(&self, channel: usize) -> Result<(f64, f64), Error> {
        self.check_channel(channel)?;
        Err(Error::NotSupported)
    }

    fn has_frequency_correction(&self, channel: usize) -> Result<bool, Error> {
        self.check_channel(channel)?;
        Ok(false)
    }

    fn frequency_correction(&self, channel: usize) -> Result<f64, Error> {
        self.check_channel(channel)?;
        Err(Error::NotSupported)
    }

    fn rx_stream(&self, channel: usize) -> Result<Self::Rx, Error> {
        self.check_channel(channel)?;
        self.record("rx_stream", "rx_stream".to_string())?;
        Ok(DummyRxStream {
            state: Arc::clone(&self.state),
        })
    }
}

/// Stream side of [`Dummy`]. Serves the scripted read sizes, then signals
/// end-of-stream with a zero-length read.
pub struct DummyRxStream {
    state: Arc<Mutex<State>>,
}

impl DummyRxStream {
    fn fail_requested(&self, op: &str) -> bool {
        self.state.lock().unwrap().fail.iter().any(|f| f == op)
    }
}

impl RxStream for DummyRxStream {
    fn activate(&mut self) -> Result<(), Error> {
        self.state.lock().unwrap().calls.push("activate".to_string());
        if self.fail_requested("activate") {
            return Err(Error::Device("activate failed".to_string()));
        }
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), Error> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push("deactivate".to_string());
        if self.fail_requested("deactivate") {
            return Err(Error::Device("deactivate failed".to_string()));
        }
        Ok(())
    }

    fn read(&mut self, buffer: &mut [Complex<i16>], _timeout_us: i64) -> Result<usize, Error> {
        if self.fail_requested("read") {
            return Err(Error::StreamRead("scripted read failure".to_string()));
        }
        match self.state.lock().unwrap().reads.pop_front() {
            Some(n) => {
                let n = n.min(buffer.len());
                buffer[..n].fill(Complex::new(0, 0));
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Kwargs {
        s.parse().unwrap()
    }

    #[test]
    fn knobs_from_args() {
        let d = Dummy::open(&args("driver=dummy, channels=2, agc=0")).unwrap();
        assert_eq!(d.num_channels().unwrap(), 2);
        assert!(!d.has_agc(0).unwrap());
        assert_eq!(d.set_agc(0, true), Err(Error::NotSupported));
    }

    #[test]
    fn scripted_open_failure() {
        assert!(Dummy::open(&args("driver=dummy, fail=open")).is_err());
    }

    #[test]
    fn scripted_reads_then_end_of_stream() {
        let d = Dummy::open(&args("driver=dummy, reads='8 4'")).unwrap();
        let mut s = d.rx_stream(0).unwrap();
        let mut buf = [Complex::new(0i16, 0i16); 16];
        assert_eq!(s.read(&mut buf, 0).unwrap(), 8);
        assert_eq!(s.read(&mut buf, 0).unwrap(), 4);
        assert_eq!(s.read(&mut buf, 0).unwrap(), 0);
    }

    #[test]
    fn records_calls_in_order() {
        let d = Dummy::open(&args("driver=dummy")).unwrap();
        d.set_sample_rate(0, 2_400_000.0).unwrap();
        d.set_gain(0, 40.0).unwrap();
        assert_eq!(d.calls(), vec!["set_sample_rate(2400000)", "set_gain(40)"]);
    }

    #[test]
    fn channel_bounds_checked() {
        let d = Dummy::open(&args("driver=dummy")).unwrap();
        assert_eq!(d.set_gain(1, 40.0), Err(Error::ValueError));
    }

    #[test]
    fn probe_enumerates_scripted_drivers() {
        let found = Dummy::probe(&args("driver=dummy, enumerate='sdrplay rtlsdr'")).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].get::<String>("driver").unwrap(), "sdrplay");
        assert_eq!(found[1].get::<String>("driver").unwrap(), "rtlsdr");
    }

    #[test]
    fn correction_surface_answers_probes_only() {
        let d = Dummy::open(&args("driver=dummy")).unwrap();
        assert!(!d.has_iq_balance_mode(0).unwrap());
        assert_eq!(d.iq_balance_mode(0), Err(Error::NotSupported));
        assert!(!d.has_iq_balance(0).unwrap());
        assert!(!d.has_dc_offset_mode(0).unwrap());
        assert!(!d.has_frequency_correction(0).unwrap());
    }

    #[test]
    fn probe_echoes_selector() {
        let found = Dummy::probe(&args("driver=sdrplay, serial=1")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get::<String>("driver").unwrap(), "sdrplay");
        let found = Dummy::probe(&Kwargs::new()).unwrap();
        assert_eq!(found[0].get::<String>("driver").unwrap(), "dummy");
    }
}
