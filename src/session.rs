use std::sync::atomic::AtomicBool;

use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::acquire::AcquisitionLoop;
use crate::caps;
use crate::config::SessionConfig;
use crate::convert::make_converter;
use crate::convert::InputFormat;
use crate::convert::SampleConverter;
use crate::device::DeviceFamily;
use crate::device::SdrDevice;
use crate::fifo::SampleFifo;
use crate::gain::GainController;
use crate::kwargs::Kwargs;
use crate::stream::RxStream;
use crate::Error;

/// Lifecycle phase of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// Device handle exists, parameters not applied yet.
    Open,
    /// Parameters applied, no stream yet.
    Configured,
    /// Stream and converter exist, not running.
    Ready,
    /// The acquisition loop is pumping samples.
    Streaming,
    /// All resources released. Terminal for this session.
    Closed,
}

/// One receive session over a single device.
///
/// Drives the device through open, configure and stream setup; any failure
/// along the way rolls the session back to [`SessionState::Closed`] with all
/// acquired resources released, in reverse order of acquisition.
pub struct DeviceSession<D: SdrDevice> {
    config: SessionConfig,
    state: SessionState,
    family: DeviceFamily,
    dev: Option<D>,
    stream: Option<D::Rx>,
    converter: Option<Box<dyn SampleConverter>>,
}

impl<D: SdrDevice> DeviceSession<D> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
            family: DeviceFamily::Generic,
            dev: None,
            stream: None,
            converter: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The open device, if the session currently holds one.
    pub fn device(&self) -> Option<&D> {
        self.dev.as_ref()
    }

    /// Enumerate matching devices, classify the family and open the device.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.dev.is_some() {
            return Err(Error::Configuration("device is already open".into()));
        }
        let args: Kwargs = self
            .config
            .device_args
            .parse()
            .map_err(|e| Error::Configuration(format!("bad device arguments: {e}")))?;

        for (i, found) in D::probe(&args)?.iter().enumerate() {
            info!("found device #{i}: {found}");
            // Sticky: one matching device marks the whole session, no matter
            // what else the enumeration turns up.
            if DeviceFamily::classify(found) == DeviceFamily::WideBandwidthDefault {
                self.family = DeviceFamily::WideBandwidthDefault;
            }
        }

        let dev = D::open(&args)
            .map_err(|e| Error::Configuration(format!("failed to create device: {e}")))?;
        if let Ok(hw) = dev.hardware_key() {
            info!("opened {hw}");
        }
        if let Ok(hw_info) = dev.hardware_info() {
            if !hw_info.is_empty() {
                info!("hardware info: {hw_info}");
            }
        }

        if self.config.channel != 0 {
            let channels = dev.num_channels()?;
            if self.config.channel >= channels {
                return Err(Error::Configuration(format!(
                    "device only supports {channels} channels"
                )));
            }
        }
        if let Ok(antennas) = dev.antennas(self.config.channel) {
            info!("available antennas: {}", antennas.join(", "));
        }

        self.dev = Some(dev);
        self.state = SessionState::Open;
        Ok(())
    }

    /// Apply the configured parameters to the open device.
    pub fn configure(&mut self) -> Result<(), Error> {
        let Some(dev) = self.dev.as_ref() else {
            return Err(Error::Configuration("device is not open".into()));
        };
        let channel = self.config.channel;

        dev.set_sample_rate(channel, self.config.sample_rate)
            .map_err(|e| Error::Configuration(format!("set_sample_rate failed: {e}")))?;
        dev.set_frequency(channel, self.config.frequency)
            .map_err(|e| Error::Configuration(format!("set_frequency failed: {e}")))?;

        caps::apply_agc(dev, channel, self.config.agc)?;

        let gain = GainController::new(dev, channel);
        if let Some(step) = self.config.gain_step {
            gain.set_gain_step(step)
                .map_err(|e| Error::Configuration(format!("set gain failed: {e}")))?;
        }
        for o in &self.config.gain_overrides {
            if let Some(db) = o.db {
                dev.set_gain_element(channel, &o.name, db).map_err(|e| {
                    Error::Configuration(format!(
                        "set_gain_element for {} failed: {e}",
                        o.name
                    ))
                })?;
            }
        }
        if self.config.gain_step.is_none() {
            gain.report_defaults();
        }

        let bandwidth = self
            .config
            .bandwidth
            .unwrap_or_else(|| self.family.default_bandwidth());
        dev.set_bandwidth(channel, bandwidth)
            .map_err(|e| Error::Configuration(format!("set_bandwidth failed: {e}")))?;

        if let Some(name) = &self.config.antenna {
            dev.set_antenna(channel, name)
                .map_err(|e| Error::Configuration(format!("set_antenna failed: {e}")))?;
        }

        caps::report_settings(dev, channel);
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Create the RX stream and the sample converter.
    pub fn setup_stream(&mut self) -> Result<(), Error> {
        let Some(dev) = self.dev.as_ref() else {
            return Err(Error::Configuration("device is not open".into()));
        };
        let stream = dev
            .rx_stream(self.config.channel)
            .map_err(|e| Error::Configuration(format!("stream setup failed: {e}")))?;
        let converter = make_converter(
            InputFormat::Cs16,
            self.config.sample_rate,
            self.config.dc_filter,
        )
        .map_err(|e| Error::Configuration(format!("cannot initialize sample converter: {e}")))?;
        self.stream = Some(stream);
        self.converter = Some(converter);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Open, configure and set up the stream; on any failure the session is
    /// closed and the error returned.
    pub fn start(&mut self) -> Result<(), Error> {
        match self.try_start() {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("{e}");
                self.close();
                Err(e)
            }
        }
    }

    fn try_start(&mut self) -> Result<(), Error> {
        self.open()?;
        self.configure()?;
        self.setup_stream()?;
        Ok(())
    }

    /// Activate the stream and pump samples into `fifo` until `shutdown` is
    /// set or the stream fails.
    pub fn run(&mut self, fifo: &SampleFifo, shutdown: &AtomicBool) {
        if self.dev.is_none() {
            return;
        }
        let (Some(stream), Some(converter)) = (self.stream.as_mut(), self.converter.as_mut())
        else {
            return;
        };
        if let Err(e) = stream.activate() {
            error!("failed to activate stream: {e}");
            return;
        }
        self.state = SessionState::Streaming;

        let mut acq = AcquisitionLoop::new(converter.as_mut(), fifo, self.config.sample_rate);
        acq.run(stream, shutdown);
        info!("acquisition stopped after {} samples", acq.total_samples());
        self.state = SessionState::Ready;
    }

    /// Release everything in reverse order of acquisition. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("closing stream");
            if let Err(e) = stream.deactivate() {
                warn!("failed to deactivate stream: {e}");
            }
        }
        self.converter = None;
        if let Some(dev) = self.dev.take() {
            debug!("closing device");
            drop(dev);
        }
        self.state = SessionState::Closed;
    }
}

impl<D: SdrDevice> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        self.close();
    }
}
