//! Resilient IQ sample acquisition from SDR devices.
//!
//! The crate drives one receive session per device: open the device from a
//! key/value argument string, negotiate its capabilities (gain, antenna,
//! bandwidth, AGC, DC/IQ correction), set up a CS16 RX stream, and pump
//! fixed-size blocks of converted samples into a bounded FIFO without ever
//! blocking on a slow consumer. When the FIFO is full, the newest block is
//! dropped and accounted for, so downstream code always knows about gaps.

mod kwargs;
pub use kwargs::Kwargs;

mod range;
pub use range::GainRange;

mod config;
pub use config::GainOverride;
pub use config::SessionConfig;

mod device;
pub use device::DeviceFamily;
pub use device::SdrDevice;

mod stream;
pub use stream::RxStream;

mod gain;
pub use gain::GainController;

pub mod caps;

mod convert;
pub use convert::make_converter;
pub use convert::BlockStats;
pub use convert::InputFormat;
pub use convert::SampleConverter;

mod fifo;
pub use fifo::SampleBlock;
pub use fifo::SampleFifo;

mod acquire;
pub use acquire::AcquisitionLoop;
pub use acquire::READ_TIMEOUT_US;
pub use acquire::REFERENCE_CLOCK_HZ;

mod session;
pub use session::DeviceSession;
pub use session::SessionState;

pub mod impls;
#[cfg(feature = "dummy")]
pub use impls::Dummy;
#[cfg(all(feature = "soapy", not(target_arch = "wasm32")))]
pub use impls::Soapy;

use thiserror::Error;

/// Acquisition error.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Fatal to the open/configure/stream-setup sequence. The session rolls
    /// back to closed and acquisition never starts.
    #[error("configuration failed: {0}")]
    Configuration(String),
    /// Fatal to the running acquisition loop.
    #[error("stream read failed: {0}")]
    StreamRead(String),
    /// Error reported by the device binding.
    #[error("device error: {0}")]
    Device(String),
    #[error("not supported")]
    NotSupported,
    #[error("not found")]
    NotFound,
    #[error("value error")]
    ValueError,
}
