use std::collections::VecDeque;

use crate::storage::ByteStream;
use crate::time::Duration;
use crate::wire::TcpSegment;

use super::config::Config;
use super::receiver::Receiver;
use super::sender::Sender;
use super::state::{ReceiverState, SenderState, State};

/// A full-duplex connection, composed of a [`Sender`] and a [`Receiver`].
///
/// Incoming segments are handed in through [`segment_received`], outgoing segments are collected
/// from [`segments_out`]. All segments going out carry the current acknowledgment number and
/// window of the receiving half as soon as the remote's SYN has arrived. Time advances only through
/// [`tick`].
///
/// A connection opens either actively through [`connect`] or passively by receiving a SYN. It is
/// active until both streams finished cleanly, a reset arrived, the retransmission limit was
/// exceeded or it is [`shutdown`].
///
/// [`Sender`]: struct.Sender.html
/// [`Receiver`]: struct.Receiver.html
/// [`segment_received`]: #method.segment_received
/// [`segments_out`]: #method.segments_out
/// [`tick`]: #method.tick
/// [`connect`]: #method.connect
/// [`shutdown`]: #method.shutdown
#[derive(Debug)]
pub struct Connection {
    config: Config,
    sender: Sender,
    receiver: Receiver,
    segments_out: VecDeque<TcpSegment>,
    active: bool,
    /// Wait after both streams finished, in case our last ACK was lost.
    linger_after_streams_finish: bool,
    time_since_last_segment_received: Duration,
}

impl Connection {
    /// Create a connection that is listening.
    pub fn new(config: Config) -> Self {
        Connection {
            sender: Sender::new(&config),
            receiver: Receiver::new(config.recv_capacity),
            config,
            segments_out: VecDeque::new(),
            active: true,
            linger_after_streams_finish: true,
            time_since_last_segment_received: Duration::from_millis(0),
        }
    }

    /// Open the connection by sending a SYN.
    pub fn connect(&mut self) {
        if !self.active {
            return;
        }

        self.sender.fill_window();
        self.collect_segments();
    }

    /// Process a segment from the remote.
    pub fn segment_received(&mut self, segment: &TcpSegment) {
        if !self.active {
            return;
        }

        self.time_since_last_segment_received = Duration::from_millis(0);
        let header = &segment.header;

        if header.flags.rst() {
            net_debug!("tcp: reset by remote in {:?}", self.state());
            self.set_error();
            return;
        }

        self.receiver.segment_received(segment);
        if let Some(ackno) = header.ack_number {
            self.sender.ack_received(ackno, header.window_len);
        }

        let receiver = self.receiver.state();
        let sender = self.sender.state();

        if receiver == ReceiverState::SynReceived && sender == SenderState::Closed {
            // Passive open, answer with our SYN.
            self.connect();
            return;
        }

        if receiver == ReceiverState::FinReceived && sender == SenderState::SynAcked {
            // The remote finished first, it will not need our final ACK retransmitted.
            self.linger_after_streams_finish = false;
        }

        if receiver == ReceiverState::FinReceived
            && sender == SenderState::FinAcked
            && !self.linger_after_streams_finish
        {
            self.active = false;
            return;
        }

        let keep_alive = segment.length_in_sequence_space() == 0
            && self.receiver.ackno().map_or(false, |ackno| header.seq_number == ackno - 1);
        let needs_ack = segment.length_in_sequence_space() > 0 || keep_alive;

        if needs_ack && self.sender.next_seqno_absolute() > 0 {
            self.sender.fill_window();
            if self.sender.segments_out().is_empty() {
                self.sender.send_empty_segment();
            }
        }

        self.flush();
    }

    /// Write octets to the outbound stream, returning how many were accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let written = self.sender.stream_in_mut().write(data);
        self.flush();
        written
    }

    /// Close the outbound stream, a FIN follows its last octet.
    pub fn end_input_stream(&mut self) {
        self.sender.stream_in_mut().end_input();
        self.flush();
    }

    /// Advance the clock.
    ///
    /// Drives retransmission and aborts the connection with a reset once the remote failed to
    /// acknowledge too many consecutive retransmissions. Ends the connection cleanly once both
    /// streams are finished and, unless the remote closed first, the connection lingered for ten
    /// times the initial retransmission timeout since the last received segment.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.active {
            return;
        }

        self.time_since_last_segment_received += elapsed;
        self.sender.tick(elapsed);

        if self.sender.consecutive_retransmissions() > self.config.max_retx_attempts {
            net_debug!("tcp: giving up after {} retransmissions",
                self.sender.consecutive_retransmissions());
            self.send_reset();
            return;
        }

        self.flush();

        let lingered = self.time_since_last_segment_received >= self.config.rt_timeout * 10;
        if self.receiver.stream_out().input_ended()
            && self.sender.state() == SenderState::FinAcked
            && (!self.linger_after_streams_finish || lingered)
        {
            self.active = false;
        }
    }

    /// Abort the connection and queue a reset for the remote.
    ///
    /// Both streams are errored. Calling this on an inactive connection does nothing, in
    /// particular no second reset is queued. A connection that is dropped without calling this
    /// while still active sends no reset at all.
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }

        net_debug!("tcp: shutdown in {:?}", self.state());
        self.send_reset();
    }

    fn send_reset(&mut self) {
        self.set_error();
        // Anything still queued is obsolete.
        self.sender.segments_out().clear();
        self.sender.send_reset();
        self.collect_segments();
    }

    fn set_error(&mut self) {
        self.sender.stream_in_mut().set_error();
        self.receiver.stream_out_mut().set_error();
        self.active = false;
    }

    /// Send what the window permits, unless the connection was not opened yet.
    fn flush(&mut self) {
        if !self.active || self.sender.next_seqno_absolute() == 0 {
            return;
        }

        self.sender.fill_window();
        self.collect_segments();
    }

    /// Move all segments of the sender to our queue, adding acknowledgment and window.
    fn collect_segments(&mut self) {
        let ackno = self.receiver.ackno();
        let window = self.receiver.window_size().min(usize::from(u16::max_value())) as u16;

        while let Some(mut segment) = self.sender.segments_out().pop_front() {
            if let Some(ackno) = ackno {
                segment.header.ack_number = Some(ackno);
                segment.header.window_len = window;
            }
            self.segments_out.push_back(segment);
        }
    }

    /// Segments ready for transmission.
    pub fn segments_out(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.segments_out
    }

    /// Whether the connection is still alive.
    pub fn active(&self) -> bool {
        self.active
    }

    /// The state of the connection, if it has a name.
    pub fn state(&self) -> Option<State> {
        State::from_parts(
            self.sender.state(),
            self.receiver.state(),
            self.active,
            self.linger_after_streams_finish)
    }

    /// How many more octets the outbound stream accepts.
    pub fn remaining_outbound_capacity(&self) -> usize {
        self.sender.stream_in().remaining_capacity()
    }

    /// Sequence numbers sent but not yet acknowledged.
    pub fn bytes_in_flight(&self) -> u64 {
        self.sender.bytes_in_flight()
    }

    /// Octets received out of order.
    pub fn unassembled_bytes(&self) -> u64 {
        self.receiver.unassembled_bytes()
    }

    /// Time since the last segment arrived.
    pub fn time_since_last_segment_received(&self) -> Duration {
        self.time_since_last_segment_received
    }

    /// The outbound stream.
    pub fn outbound_stream(&self) -> &ByteStream {
        self.sender.stream_in()
    }

    /// The inbound stream.
    pub fn inbound_stream(&self) -> &ByteStream {
        self.receiver.stream_out()
    }

    /// The inbound stream, for reading.
    pub fn inbound_stream_mut(&mut self) -> &mut ByteStream {
        self.receiver.stream_out_mut()
    }

    /// The configuration the connection was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.active {
            net_warn!("tcp: dropping active connection in {:?} without reset", self.state());
        }
    }
}
