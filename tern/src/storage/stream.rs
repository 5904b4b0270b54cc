use std::collections::VecDeque;

/// A bounded in-order byte stream.
///
/// The writer appends octets as long as capacity remains and eventually marks the end of input.
/// The reader peeks and pops from the front. Either side may set the error flag, which is sticky.
#[derive(Clone, Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: usize,
    bytes_written: u64,
    bytes_read: u64,
    input_ended: bool,
    error: bool,
}

impl ByteStream {
    /// Create an empty stream that buffers at most `capacity` octets.
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            bytes_written: 0,
            bytes_read: 0,
            input_ended: false,
            error: false,
        }
    }

    /// Append as much of `data` as fits, returning the number of octets accepted.
    ///
    /// Nothing is accepted after the input has ended.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.input_ended {
            return 0;
        }

        let accepted = data.len().min(self.remaining_capacity());
        self.buffer.extend(&data[..accepted]);
        self.bytes_written += accepted as u64;
        accepted
    }

    /// Copy up to `len` octets from the front without consuming them.
    pub fn peek_output(&self, len: usize) -> Vec<u8> {
        self.buffer.iter().take(len).copied().collect()
    }

    /// Discard up to `len` octets from the front.
    pub fn pop_output(&mut self, len: usize) {
        let len = len.min(self.buffer.len());
        self.buffer.drain(..len);
        self.bytes_read += len as u64;
    }

    /// Consume up to `len` octets from the front.
    pub fn read(&mut self, len: usize) -> Vec<u8> {
        let data = self.peek_output(len);
        self.pop_output(data.len());
        data
    }

    /// Signal that no more octets will be written.
    pub fn end_input(&mut self) {
        self.input_ended = true;
    }

    /// Whether the writer has signalled the end of input.
    pub fn input_ended(&self) -> bool {
        self.input_ended
    }

    /// Whether the input ended and every octet has been read.
    pub fn eof(&self) -> bool {
        self.input_ended && self.buffer.is_empty()
    }

    /// The number of octets written but not yet read.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no octets are waiting to be read.
    pub fn buffer_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total number of octets ever accepted.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Total number of octets ever consumed.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The maximum number of buffered octets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many more octets a write would currently accept.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Mark the stream as having suffered an error.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    /// Whether the stream has suffered an error.
    pub fn error(&self) -> bool {
        self.error
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_is_bounded() {
        let mut stream = ByteStream::new(4);
        assert_eq!(stream.write(b"abc"), 3);
        assert_eq!(stream.write(b"def"), 1);
        assert_eq!(stream.remaining_capacity(), 0);
        assert_eq!(stream.bytes_written(), 4);
        assert_eq!(stream.peek_output(10), b"abcd");
    }

    #[test]
    fn read_frees_capacity() {
        let mut stream = ByteStream::new(4);
        stream.write(b"abcd");
        assert_eq!(stream.read(2), b"ab");
        assert_eq!(stream.bytes_read(), 2);
        assert_eq!(stream.remaining_capacity(), 2);
        assert_eq!(stream.write(b"efg"), 2);
        assert_eq!(stream.read(10), b"cdef");
        assert!(stream.buffer_empty());
    }

    #[test]
    fn eof_after_drain() {
        let mut stream = ByteStream::new(8);
        stream.write(b"hi");
        stream.end_input();
        assert!(stream.input_ended());
        assert!(!stream.eof());
        assert_eq!(stream.write(b"more"), 0);
        stream.pop_output(2);
        assert!(stream.eof());
    }

    #[test]
    fn error_is_sticky() {
        let mut stream = ByteStream::new(1);
        assert!(!stream.error());
        stream.set_error();
        assert!(stream.error());
    }
}
