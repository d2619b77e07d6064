use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use num_complex::Complex32;

/// One fixed-capacity block of converted samples plus its provenance.
///
/// The first `overlap` samples repeat the tail of the previous block so a
/// consumer can run window-based processing across block boundaries. Only
/// `valid_len` samples of `data` are meaningful.
#[derive(Debug)]
pub struct SampleBlock {
    pub data: Vec<Complex32>,
    /// Samples at the head carried over from the previous block.
    pub overlap: usize,
    /// Valid prefix of `data`, including the overlap.
    pub valid_len: usize,
    /// First new sample's position on the reference clock.
    pub sample_timestamp: u64,
    /// Wall-clock milliseconds at the start of the block.
    pub sys_timestamp: u64,
    /// Samples were lost since the previous delivered block.
    pub discontinuous: bool,
    /// How many samples were lost.
    pub dropped: u64,
    pub mean_level: f32,
    pub mean_power: f32,
}

impl SampleBlock {
    fn new(len: usize, overlap: usize) -> Self {
        Self {
            data: vec![Complex32::default(); len],
            overlap,
            valid_len: 0,
            sample_timestamp: 0,
            sys_timestamp: 0,
            discontinuous: false,
            dropped: 0,
            mean_level: 0.0,
            mean_power: 0.0,
        }
    }

    /// Total capacity of the block in samples, overlap included.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    fn reset(&mut self) {
        self.valid_len = 0;
        self.sample_timestamp = 0;
        self.sys_timestamp = 0;
        self.discontinuous = false;
        self.dropped = 0;
        self.mean_level = 0.0;
        self.mean_power = 0.0;
    }
}

struct Inner {
    free: Vec<SampleBlock>,
    queue: VecDeque<SampleBlock>,
}

/// Bounded block pool between the acquisition thread and a consumer.
///
/// All blocks are allocated up front; the producer side never allocates and
/// never blocks. When no free block is available [`try_acquire`]
/// (Self::try_acquire) returns `None` and the producer drops the data.
#[derive(Clone)]
pub struct SampleFifo {
    inner: Arc<Mutex<Inner>>,
}

impl SampleFifo {
    /// Create a pool of `depth` blocks of `block_len` samples each, with
    /// `overlap` samples of carry-over at the head of every block.
    pub fn new(depth: usize, block_len: usize, overlap: usize) -> Self {
        assert!(overlap == 0 || overlap < block_len);
        let free = (0..depth).map(|_| SampleBlock::new(block_len, overlap)).collect();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                free,
                queue: VecDeque::with_capacity(depth),
            })),
        }
    }

    /// Take a free block without waiting. `None` means the consumer holds
    /// every block and the caller must drop the data.
    pub fn try_acquire(&self) -> Option<SampleBlock> {
        self.inner.lock().unwrap().free.pop()
    }

    /// Hand a filled block to the consumer side.
    pub fn enqueue(&self, block: SampleBlock) {
        self.inner.lock().unwrap().queue.push_back(block);
    }

    /// Take the oldest filled block, if any.
    pub fn dequeue(&self) -> Option<SampleBlock> {
        self.inner.lock().unwrap().queue.pop_front()
    }

    /// Return a consumed block to the free pool.
    pub fn release(&self, mut block: SampleBlock) {
        block.reset();
        self.inner.lock().unwrap().free.push(block);
    }

    /// Number of filled blocks waiting for the consumer.
    pub fn queued(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_exhausts_pool() {
        let fifo = SampleFifo::new(2, 64, 0);
        let a = fifo.try_acquire().unwrap();
        let b = fifo.try_acquire().unwrap();
        assert!(fifo.try_acquire().is_none());
        fifo.release(a);
        assert!(fifo.try_acquire().is_some());
        drop(b);
    }

    #[test]
    fn enqueue_dequeue_is_fifo() {
        let fifo = SampleFifo::new(2, 16, 0);
        let mut a = fifo.try_acquire().unwrap();
        a.sample_timestamp = 1;
        let mut b = fifo.try_acquire().unwrap();
        b.sample_timestamp = 2;
        fifo.enqueue(a);
        fifo.enqueue(b);
        assert_eq!(fifo.queued(), 2);
        assert_eq!(fifo.dequeue().unwrap().sample_timestamp, 1);
        assert_eq!(fifo.dequeue().unwrap().sample_timestamp, 2);
        assert!(fifo.dequeue().is_none());
    }

    #[test]
    #[should_panic]
    fn overlap_must_fit_inside_a_block() {
        SampleFifo::new(1, 0, 16);
    }

    #[test]
    fn release_resets_metadata() {
        let fifo = SampleFifo::new(1, 16, 4);
        let mut a = fifo.try_acquire().unwrap();
        a.valid_len = 16;
        a.discontinuous = true;
        a.dropped = 100;
        a.sample_timestamp = 7;
        fifo.release(a);
        let a = fifo.try_acquire().unwrap();
        assert_eq!(a.valid_len, 0);
        assert!(!a.discontinuous);
        assert_eq!(a.dropped, 0);
        assert_eq!(a.sample_timestamp, 0);
        assert_eq!(a.overlap, 4);
        assert_eq!(a.capacity(), 16);
    }
}
