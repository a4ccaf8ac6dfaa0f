//! Fixed-capacity circular delay buffer with a variable active length.
//!
//! Storage is allocated once, at construction or through
//! [`DelayBuffer::try_with_capacity`] on a control thread. Changing the
//! active length never allocates, so delay times can move on the audio
//! thread.

use alloc::vec::Vec;

/// Heap allocation for a delay buffer failed.
///
/// Returned by the fallible constructors; the caller keeps whatever buffer
/// it already had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    /// Number of samples that could not be reserved.
    pub requested: usize,
}

#[cfg(feature = "std")]
impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "failed to allocate delay buffer of {} samples", self.requested)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}

/// Circular buffer read at its write index (one full active length behind).
///
/// # Example
///
/// ```rust
/// use polyvox_core::DelayBuffer;
///
/// let mut buf = DelayBuffer::new(8);
/// buf.set_len(3);
/// assert_eq!(buf.read(), 0.0);
/// buf.write_advance(1.0);
/// buf.write_advance(0.0);
/// buf.write_advance(0.0);
/// assert_eq!(buf.read(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayBuffer {
    buffer: Vec<f32>,
    len: usize,
    write_pos: usize,
}

impl DelayBuffer {
    /// Allocate a buffer of `capacity` samples (at least 1), fully active.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: alloc::vec![0.0; capacity],
            len: capacity,
            write_pos: 0,
        }
    }

    /// Fallible constructor for control-thread reallocation.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let capacity = capacity.max(1);
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError {
                requested: capacity,
            })?;
        buffer.resize(capacity, 0.0);
        Ok(Self {
            buffer,
            len: capacity,
            write_pos: 0,
        })
    }

    /// Allocated size in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Active delay length in samples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; the active length is at least one sample.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Change the active length, clamped to `1..=capacity`.
    ///
    /// A change in length clears the contents, like reallocating a fresh
    /// delay line would.
    pub fn set_len(&mut self, len: usize) {
        let len = len.clamp(1, self.buffer.len());
        if len != self.len {
            self.len = len;
            self.clear();
        }
    }

    /// Sample written `len` samples ago.
    #[inline]
    pub fn read(&self) -> f32 {
        self.buffer[self.write_pos]
    }

    /// Overwrite the oldest sample and advance the write index.
    #[inline]
    pub fn write_advance(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= self.len {
            self.write_pos = 0;
        }
    }

    /// Zero the contents and rewind.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_buffer_delays_by_len() {
        let mut buf = DelayBuffer::new(100);
        buf.set_len(10);
        buf.write_advance(1.0);
        for i in 1..10 {
            assert_eq!(buf.read(), 0.0, "early output at {}", i);
            buf.write_advance(0.0);
        }
        assert_eq!(buf.read(), 1.0);
    }

    #[test]
    fn test_delay_buffer_len_clamped() {
        let mut buf = DelayBuffer::new(16);
        buf.set_len(0);
        assert_eq!(buf.len(), 1);
        buf.set_len(1000);
        assert_eq!(buf.len(), 16);
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn test_delay_buffer_len_change_clears() {
        let mut buf = DelayBuffer::new(8);
        for _ in 0..8 {
            buf.write_advance(0.5);
        }
        buf.set_len(4);
        for _ in 0..4 {
            assert_eq!(buf.read(), 0.0);
            buf.write_advance(0.0);
        }
    }

    #[test]
    fn test_try_with_capacity() {
        let buf = DelayBuffer::try_with_capacity(32);
        assert!(buf.is_ok());
        assert_eq!(buf.map(|b| b.capacity()).unwrap_or(0), 32);
    }
}
