use num_complex::Complex;

use crate::Error;

/// Receive side of an active device stream.
///
/// Samples arrive as interleaved signed 16-bit IQ pairs, the wire format
/// requested at stream setup.
pub trait RxStream: Send {
    /// Enable the stream. Must be called before [`read`](Self::read).
    fn activate(&mut self) -> Result<(), Error>;

    /// Halt the stream. Called once during session close.
    fn deactivate(&mut self) -> Result<(), Error>;

    /// Blocking read with a bounded timeout.
    ///
    /// Returns the number of IQ pairs written to `buffer`, which may be
    /// smaller than the buffer. Zero samples or an error mean the hardware
    /// link is gone; callers treat both as fatal to the stream.
    fn read(&mut self, buffer: &mut [Complex<i16>], timeout_us: i64) -> Result<usize, Error>;
}
