use bytes::{BufMut, Bytes, BytesMut};

/// Outcome of appending one byte to a [`FrameBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Stored,
    /// The buffer already holds its maximum content; the byte was not stored.
    Full,
}

/// Fixed-capacity byte accumulator for the frame being received.
///
/// Storage is allocated once. The last slot is reserved for a terminator
/// sentinel, so at most `capacity - 1` bytes are ever stored.
#[derive(Debug)]
pub struct FrameBuffer {
    bytes: BytesMut,
    capacity: usize,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `byte` if there is room for it.
    pub fn push(&mut self, byte: u8) -> Push {
        if self.is_full() {
            return Push::Full;
        }
        self.bytes.put_u8(byte);
        Push::Stored
    }

    /// Copy the current content out and reset the fill count.
    pub fn take(&mut self) -> Bytes {
        let frame = Bytes::copy_from_slice(&self.bytes);
        self.bytes.clear();
        frame
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn is_full(&self) -> bool {
        self.bytes.len() >= self.limit()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn limit(&self) -> usize {
        self.capacity.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_up_to_capacity_minus_one() {
        let mut buf = FrameBuffer::new(4);
        assert_eq!(buf.push(b'a'), Push::Stored);
        assert_eq!(buf.push(b'b'), Push::Stored);
        assert!(!buf.is_full());
        assert_eq!(buf.push(b'c'), Push::Stored);
        assert!(buf.is_full());
        assert_eq!(buf.push(b'd'), Push::Full);

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.as_slice(), b"abc");
    }

    #[test]
    fn take_copies_and_resets() {
        let mut buf = FrameBuffer::new(8);
        for &b in b"xyz" {
            buf.push(b);
        }

        let frame = buf.take();
        assert_eq!(frame.as_ref(), b"xyz");
        assert!(buf.is_empty());

        // The snapshot is independent of the reused storage.
        buf.push(b'q');
        assert_eq!(frame.as_ref(), b"xyz");
        assert_eq!(buf.as_slice(), b"q");
    }

    #[test]
    fn storage_is_not_reallocated() {
        let mut buf = FrameBuffer::new(16);
        let ptr = buf.as_slice().as_ptr();
        for round in 0..4u8 {
            for i in 0..15u8 {
                buf.push(round ^ i);
            }
            let _ = buf.take();
        }
        assert_eq!(buf.as_slice().as_ptr(), ptr);
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn take_on_empty_buffer_is_empty() {
        let mut buf = FrameBuffer::new(2);
        assert!(buf.take().is_empty());
        buf.push(1);
        buf.clear();
        assert!(buf.is_empty());
    }
}
