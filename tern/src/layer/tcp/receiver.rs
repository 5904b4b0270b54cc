use crate::storage::{ByteStream, Reassembler};
use crate::wire::{TcpSegment, TcpSeqNumber};

use super::state::ReceiverState;

/// The receiving half of a connection.
///
/// Places the payload of incoming segments into a [`Reassembler`] and reports the acknowledgment
/// number and window that should be advertised to the remote.
///
/// Nothing is accepted before a SYN established the remote's initial sequence number. Additional
/// SYNs and FINs after the first are ignored.
///
/// [`Reassembler`]: ../../storage/struct.Reassembler.html
#[derive(Clone, Debug)]
pub struct Receiver {
    reassembler: Reassembler,
    capacity: usize,
    isn: Option<TcpSeqNumber>,
    fin_received: bool,
}

impl Receiver {
    /// Create a receiver whose inbound stream holds at most `capacity` octets.
    pub fn new(capacity: usize) -> Self {
        Receiver {
            reassembler: Reassembler::new(capacity),
            capacity,
            isn: None,
            fin_received: false,
        }
    }

    /// Process an incoming segment.
    pub fn segment_received(&mut self, segment: &TcpSegment) {
        let header = &segment.header;
        let mut seq_number = header.seq_number;

        if header.flags.syn() {
            if self.isn.is_some() {
                return;
            }
            self.isn = Some(seq_number);
            // The payload begins after the SYN.
            seq_number += 1;
        }

        let isn = match self.isn {
            Some(isn) => isn,
            None => return,
        };

        if header.flags.fin() && self.fin_received {
            return;
        }

        let checkpoint = self.reassembler.stream_out().bytes_written();
        let absolute = seq_number.unwrap(isn, checkpoint);
        // Data never occupies the sequence number of the SYN.
        let index = match absolute.checked_sub(1) {
            Some(index) => index,
            None => return,
        };

        // Only a FIN that reaches the reassembler counts.
        self.fin_received |= header.flags.fin();
        self.reassembler.push_substring(&segment.payload, index, header.flags.fin());
    }

    /// The acknowledgment number to advertise, if the SYN has arrived.
    ///
    /// Acknowledges the SYN, every assembled octet and, once the stream has ended, the FIN.
    pub fn ackno(&self) -> Option<TcpSeqNumber> {
        let isn = self.isn?;
        let stream = self.reassembler.stream_out();
        let absolute = stream.bytes_written() + 1 + u64::from(stream.input_ended());
        Some(TcpSeqNumber::wrap(absolute, isn))
    }

    /// The window to advertise, the capacity not occupied by unread octets.
    pub fn window_size(&self) -> usize {
        self.capacity - self.reassembler.stream_out().buffer_size()
    }

    /// The number of octets received out of order and waiting for the gap before them.
    pub fn unassembled_bytes(&self) -> u64 {
        self.reassembler.unassembled_bytes()
    }

    /// The inbound stream.
    pub fn stream_out(&self) -> &ByteStream {
        self.reassembler.stream_out()
    }

    /// The inbound stream, for reading.
    pub fn stream_out_mut(&mut self) -> &mut ByteStream {
        self.reassembler.stream_out_mut()
    }

    /// Summarize the state of the receiving half.
    pub fn state(&self) -> ReceiverState {
        if self.stream_out().error() {
            ReceiverState::Error
        } else if self.isn.is_none() {
            ReceiverState::Listen
        } else if self.stream_out().input_ended() {
            ReceiverState::FinReceived
        } else {
            ReceiverState::SynReceived
        }
    }
}
