use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use log::error;
use log::warn;
use num_complex::Complex;
use num_complex::Complex32;

use crate::convert::SampleConverter;
use crate::fifo::SampleFifo;
use crate::stream::RxStream;

/// Sample timestamps are expressed on this fixed reference clock, so blocks
/// from devices at different sample rates stay comparable.
pub const REFERENCE_CLOCK_HZ: f64 = 12_000_000.0;

/// Per-read timeout handed to the stream. Generous; a healthy device fills a
/// block in well under a second at any supported rate.
pub const READ_TIMEOUT_US: i64 = 5_000_000;

/// IQ pairs requested per stream read.
const BLOCK_SAMPLES: usize = 131_072;

/// Pumps samples from an active stream into a [`SampleFifo`].
///
/// The loop never blocks on the consumer: when no free block is available
/// the read is discarded and counted, and the next delivered block is marked
/// discontinuous with the accumulated drop total attached.
pub struct AcquisitionLoop<'a> {
    converter: &'a mut dyn SampleConverter,
    fifo: &'a SampleFifo,
    sample_rate: f64,
    sample_counter: u64,
    dropped: u64,
    overlap_tail: Vec<Complex32>,
}

impl<'a> AcquisitionLoop<'a> {
    pub fn new(
        converter: &'a mut dyn SampleConverter,
        fifo: &'a SampleFifo,
        sample_rate: f64,
    ) -> Self {
        Self {
            converter,
            fifo,
            sample_rate,
            sample_counter: 0,
            dropped: 0,
            overlap_tail: Vec::new(),
        }
    }

    /// Total samples read from the device, delivered or not.
    pub fn total_samples(&self) -> u64 {
        self.sample_counter
    }

    /// Drops accumulated since the last delivered block.
    pub fn pending_dropped(&self) -> u64 {
        self.dropped
    }

    /// Read until shutdown is requested or the stream fails.
    ///
    /// A read error or an empty read both mean the hardware link is gone and
    /// end the loop; the read timeout itself surfaces as an error from the
    /// stream.
    pub fn run<S: RxStream>(&mut self, stream: &mut S, shutdown: &AtomicBool) {
        let mut scratch = vec![Complex::new(0i16, 0i16); BLOCK_SAMPLES];
        while !shutdown.load(Ordering::Relaxed) {
            match stream.read(&mut scratch, READ_TIMEOUT_US) {
                Ok(n) if n > 0 => self.process_block(&scratch[..n]),
                Ok(_) => {
                    error!("stream returned no samples, stopping acquisition");
                    break;
                }
                Err(e) => {
                    error!("stream read failed, stopping acquisition: {e}");
                    break;
                }
            }
        }
    }

    /// Account for and deliver one read's worth of raw samples.
    pub fn process_block(&mut self, raw: &[Complex<i16>]) {
        let n = raw.len() as u64;
        let Some(mut block) = self.fifo.try_acquire() else {
            warn!("sample FIFO is full, dropping {} samples", raw.len());
            self.dropped += n;
            self.sample_counter += n;
            return;
        };

        block.discontinuous = self.dropped > 0;
        block.dropped = self.dropped;
        self.dropped = 0;

        block.sample_timestamp =
            (self.sample_counter as f64 * REFERENCE_CLOCK_HZ / self.sample_rate) as u64;
        self.sample_counter += n;
        let duration_ms = (raw.len() as f64 * 1e3 / self.sample_rate) as u64;
        block.sys_timestamp = wall_clock_ms().saturating_sub(duration_ms);

        let overlap = block.overlap;
        debug_assert!(overlap <= block.capacity());
        let room = block.capacity().saturating_sub(overlap);
        let to_convert = raw.len().min(room);
        let excess = raw.len() - to_convert;
        if excess > 0 {
            // Reads are sized to fit a block; anything beyond the block is
            // discarded and shows up as a drop on the next block.
            warn!("read exceeds block capacity, dropping {excess} samples");
            self.dropped += excess as u64;
        }

        self.overlap_tail.resize(overlap, Complex32::default());
        block.data[..overlap].copy_from_slice(&self.overlap_tail);
        let stats = self
            .converter
            .convert(&raw[..to_convert], &mut block.data[overlap..overlap + to_convert]);
        block.mean_level = stats.mean_level;
        block.mean_power = stats.mean_power;
        block.valid_len = overlap + to_convert;

        if overlap > 0 {
            let end = block.valid_len;
            let start = end.saturating_sub(overlap);
            self.overlap_tail.clear();
            self.overlap_tail
                .extend_from_slice(&block.data[start..end]);
            self.overlap_tail.resize(overlap, Complex32::default());
        }

        self.fifo.enqueue(block);
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
