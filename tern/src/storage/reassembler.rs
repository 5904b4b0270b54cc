use std::collections::VecDeque;

use super::{Assembler, ByteStream};

/// Reassembles substrings of a byte stream into the stream itself.
///
/// Substrings are indexed by their absolute position in the stream and may arrive in any order,
/// overlap, or repeat. Octets are only kept while they fall inside the window that starts at the
/// first not yet assembled octet and ends `capacity` octets after the first unread one. Everything
/// else is discarded. Once the substring carrying the end of the stream has been seen and every
/// octet before it was written, the output is ended.
#[derive(Clone, Debug)]
pub struct Reassembler {
    output: ByteStream,
    capacity: usize,
    /// Octets of the window, index 0 is the first unassembled octet.
    buffer: VecDeque<u8>,
    /// Which octets of `buffer` are valid.
    present: Assembler,
    eof_index: Option<u64>,
}

impl Reassembler {
    /// Create a reassembler whose output buffers at most `capacity` octets.
    pub fn new(capacity: usize) -> Self {
        let mut buffer = VecDeque::with_capacity(capacity);
        buffer.resize(capacity, 0);
        Reassembler {
            output: ByteStream::new(capacity),
            capacity,
            buffer,
            present: Assembler::new(),
            eof_index: None,
        }
    }

    /// Accept a substring starting at absolute stream position `index`.
    ///
    /// When `eof` is set the last octet of `data` is the last octet of the stream.
    pub fn push_substring(&mut self, data: &[u8], index: u64, eof: bool) {
        if eof {
            self.eof_index = Some(index + data.len() as u64);
        }

        let first_unassembled = self.output.bytes_written();
        let window_end = self.output.bytes_read() + self.capacity as u64;
        let start = index.max(first_unassembled);
        let end = (index + data.len() as u64).min(window_end);

        if start < end {
            let data = &data[(start - index) as usize..(end - index) as usize];
            let offset = (start - first_unassembled) as usize;
            for (slot, &byte) in self.buffer.iter_mut().skip(offset).zip(data) {
                *slot = byte;
            }
            self.present.add(start - first_unassembled, end - start);
        }

        self.flush();

        if self.eof_index == Some(self.output.bytes_written()) {
            self.output.end_input();
        }
    }

    fn flush(&mut self) {
        let ready = self.present.front_len() as usize;
        if ready == 0 {
            return;
        }

        let assembled: Vec<u8> = self.buffer.iter().take(ready).copied().collect();
        let written = self.output.write(&assembled);
        self.buffer.drain(..written);
        self.buffer.resize(self.capacity, 0);
        self.present.reduce_front(written as u64);
    }

    /// The number of octets stored but not yet assembled.
    pub fn unassembled_bytes(&self) -> u64 {
        self.present.data_len()
    }

    /// Whether no octets are waiting for assembly.
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// The assembled output.
    pub fn stream_out(&self) -> &ByteStream {
        &self.output
    }

    /// The assembled output, for reading.
    pub fn stream_out_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }
}
