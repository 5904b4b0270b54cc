use std::collections::VecDeque;

use crate::storage::ByteStream;
use crate::time::{Duration, Instant};
use crate::wire::{TcpFlags, TcpRepr, TcpSegment, TcpSeqNumber};

use super::config::{Config, PAYLOAD_SIZE_LIMIT};
use super::siphash::IsnGenerator;
use super::state::SenderState;

/// The sending half of a connection.
///
/// Reads octets from its outbound [`ByteStream`] and turns them into segments that fit the window
/// the remote advertised. Every segment occupying sequence space is kept until it has been fully
/// acknowledged and the oldest one is retransmitted whenever the retransmission timer expires.
///
/// Produced segments carry neither ports nor an acknowledgment. These are the responsibility of
/// the [`Connection`] and the adapter below it.
///
/// [`ByteStream`]: ../../storage/struct.ByteStream.html
/// [`Connection`]: struct.Connection.html
#[derive(Debug)]
pub struct Sender {
    isn: TcpSeqNumber,
    stream: ByteStream,
    segments_out: VecDeque<TcpSegment>,
    /// Segments in flight and their absolute sequence number, in sending order.
    outstanding: VecDeque<(u64, TcpSegment)>,
    next_seqno: u64,
    /// The absolute sequence number of the first unacknowledged octet.
    acked: u64,
    window_size: u16,
    fin_sent: bool,
    max_payload_size: usize,
    initial_rto: Duration,
    rto: Duration,
    consecutive_retransmissions: u32,
    now: Instant,
    timer_start: Instant,
}

impl Sender {
    /// Create a sender with the capacity, timeout and payload size of the configuration.
    ///
    /// When no fixed initial sequence number is configured one is generated from the tuple and
    /// clock of the configuration.
    pub fn new(config: &Config) -> Self {
        let isn = config.initial_seq_number(&IsnGenerator::from_std_hash());

        Sender {
            isn,
            stream: ByteStream::new(config.send_capacity),
            segments_out: VecDeque::new(),
            outstanding: VecDeque::new(),
            next_seqno: 0,
            acked: 0,
            // Until the remote tells us otherwise, there is room for the SYN.
            window_size: 1,
            fin_sent: false,
            max_payload_size: config.max_payload_size.max(1).min(PAYLOAD_SIZE_LIMIT),
            initial_rto: config.rt_timeout,
            rto: config.rt_timeout,
            consecutive_retransmissions: 0,
            now: Instant::ZERO,
            timer_start: Instant::ZERO,
        }
    }

    /// Send as much as the remote window permits.
    ///
    /// The very first segment is a bare SYN. A window of zero is treated as a window of one so
    /// that the remote is probed for a window update. The FIN is folded into the last data segment
    /// when it fits, otherwise it is sent on its own once all data has been sequenced.
    pub fn fill_window(&mut self) {
        let window = u64::from(self.window_size.max(1));
        let mut remaining = window.saturating_sub(self.bytes_in_flight());
        if remaining == 0 {
            return;
        }

        if self.next_seqno == 0 {
            let mut flags = TcpFlags::default();
            flags.set_syn(true);
            self.send_segment(flags, Vec::new());
            return;
        }

        if self.stream.eof() && !self.fin_sent {
            let mut flags = TcpFlags::default();
            flags.set_fin(true);
            self.send_segment(flags, Vec::new());
            return;
        }

        while !self.stream.buffer_empty() && remaining > 0 {
            let len = (self.max_payload_size as u64)
                .min(self.stream.buffer_size() as u64)
                .min(remaining);
            let payload = self.stream.read(len as usize);
            remaining -= len;

            let mut flags = TcpFlags::default();
            if remaining > 0 && self.stream.eof() {
                flags.set_fin(true);
            }

            self.send_segment(flags, payload);
        }
    }

    /// Process an acknowledgment and window advertisement from the remote.
    ///
    /// Acknowledgments of sequence numbers that were never sent are ignored. A repeated
    /// acknowledgment can only grow the known window. A new acknowledgment removes all fully
    /// acknowledged segments, resets the retransmission timer and backoff, and sends whatever the
    /// new window allows.
    pub fn ack_received(&mut self, ackno: TcpSeqNumber, window_size: u16) {
        let absolute = ackno.unwrap(self.isn, self.next_seqno);
        if absolute > self.next_seqno {
            return;
        }

        if absolute == self.acked {
            self.window_size = self.window_size.max(window_size);
        }

        let mut removed = false;
        while let Some((start, segment)) = self.outstanding.front() {
            if start + segment.length_in_sequence_space() > absolute {
                break;
            }
            self.outstanding.pop_front();
            removed = true;
        }

        if !removed {
            return;
        }

        self.acked = absolute;
        self.rto = self.initial_rto;
        self.consecutive_retransmissions = 0;
        self.window_size = window_size;
        self.timer_start = self.now;
        self.fill_window();
    }

    /// Advance the clock, retransmitting the oldest outstanding segment if its timer expired.
    pub fn tick(&mut self, elapsed: Duration) {
        self.now += elapsed;

        if self.outstanding.is_empty() {
            self.timer_start = self.now;
            return;
        }

        if self.now - self.timer_start < self.rto {
            return;
        }

        if let Some((_, oldest)) = self.outstanding.front() {
            net_trace!("tcp: retransmitting {} after {:?}", oldest, self.rto);
            self.segments_out.push_back(oldest.clone());
        }
        // A closed window is probed, that does not indicate congestion.
        if self.window_size != 0 {
            self.consecutive_retransmissions += 1;
            self.rto *= 2;
        }
        self.timer_start = self.now;
    }

    /// Queue a segment that occupies no sequence space, as a pure acknowledgment.
    ///
    /// The segment is not tracked for retransmission.
    pub fn send_empty_segment(&mut self) {
        self.send_untracked(TcpFlags::default());
    }

    /// Queue a segment with the RST flag.
    ///
    /// The segment is not tracked for retransmission.
    pub fn send_reset(&mut self) {
        let mut flags = TcpFlags::default();
        flags.set_rst(true);
        self.send_untracked(flags);
    }

    fn send_untracked(&mut self, flags: TcpFlags) {
        self.segments_out.push_back(TcpSegment {
            header: TcpRepr {
                flags,
                seq_number: self.next_seqno(),
                ..TcpRepr::default()
            },
            payload: Vec::new(),
        });
    }

    fn send_segment(&mut self, flags: TcpFlags, payload: Vec<u8>) {
        let segment = TcpSegment {
            header: TcpRepr {
                flags,
                seq_number: self.next_seqno(),
                ..TcpRepr::default()
            },
            payload,
        };

        if flags.fin() {
            self.fin_sent = true;
        }

        // The timer only runs while something is outstanding.
        if self.outstanding.is_empty() {
            self.timer_start = self.now;
        }

        let start = self.next_seqno;
        self.next_seqno += segment.length_in_sequence_space();
        self.outstanding.push_back((start, segment.clone()));
        self.segments_out.push_back(segment);
    }

    /// The number of sequence numbers sent but not yet acknowledged.
    pub fn bytes_in_flight(&self) -> u64 {
        self.next_seqno - self.acked
    }

    /// The number of retransmissions since the last new acknowledgment.
    pub fn consecutive_retransmissions(&self) -> u32 {
        self.consecutive_retransmissions
    }

    /// The absolute sequence number of the next octet to be sent.
    pub fn next_seqno_absolute(&self) -> u64 {
        self.next_seqno
    }

    /// The sequence number of the next octet to be sent.
    pub fn next_seqno(&self) -> TcpSeqNumber {
        TcpSeqNumber::wrap(self.next_seqno, self.isn)
    }

    /// The initial sequence number of this half of the connection.
    pub fn isn(&self) -> TcpSeqNumber {
        self.isn
    }

    /// The window last advertised by the remote.
    pub fn window_size(&self) -> u16 {
        self.window_size
    }

    /// The current retransmission timeout.
    pub fn rto(&self) -> Duration {
        self.rto
    }

    /// The outbound stream.
    pub fn stream_in(&self) -> &ByteStream {
        &self.stream
    }

    /// The outbound stream, for writing.
    pub fn stream_in_mut(&mut self) -> &mut ByteStream {
        &mut self.stream
    }

    /// Segments ready for transmission.
    pub fn segments_out(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.segments_out
    }

    /// Summarize the state of the sending half.
    pub fn state(&self) -> SenderState {
        if self.stream.error() {
            SenderState::Error
        } else if self.next_seqno == 0 {
            SenderState::Closed
        } else if self.next_seqno == self.bytes_in_flight() {
            SenderState::SynSent
        } else if !self.fin_sent {
            SenderState::SynAcked
        } else if self.bytes_in_flight() > 0 {
            SenderState::FinSent
        } else {
            SenderState::FinAcked
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::layer::tcp::Ipv4Adapter;

    const ISN: TcpSeqNumber = TcpSeqNumber(0x1000_0000);

    fn config() -> Config {
        Config {
            fixed_isn: Some(ISN),
            ..Config::default()
        }
    }

    /// Create a sender whose SYN has been sent and acknowledged with the given window.
    fn established(window: u16) -> Sender {
        let mut sender = Sender::new(&config());
        sender.fill_window();
        sender.segments_out().clear();
        sender.ack_received(ISN + 1, window);
        sender
    }

    #[test]
    fn syn_first() {
        let mut sender = Sender::new(&config());
        assert_eq!(sender.state(), SenderState::Closed);
        sender.fill_window();

        let syn = sender.segments_out().pop_front().expect("a SYN segment");
        assert!(syn.header.flags.syn());
        assert_eq!(syn.header.seq_number, ISN);
        assert!(syn.payload.is_empty());
        assert_eq!(sender.bytes_in_flight(), 1);
        assert_eq!(sender.state(), SenderState::SynSent);

        // The SYN fills the initial window.
        sender.stream_in_mut().write(b"data");
        sender.fill_window();
        assert!(sender.segments_out().is_empty());
    }

    #[test]
    fn data_respects_window() {
        let mut sender = established(3);
        assert_eq!(sender.state(), SenderState::SynAcked);
        sender.stream_in_mut().write(b"abcdef");
        sender.fill_window();

        let segment = sender.segments_out().pop_front().expect("a data segment");
        assert_eq!(segment.payload, b"abc");
        assert_eq!(segment.header.seq_number, ISN + 1);
        assert!(sender.segments_out().is_empty());
        assert_eq!(sender.bytes_in_flight(), 3);

        sender.ack_received(ISN + 4, 10);
        let segment = sender.segments_out().pop_front().expect("the rest");
        assert_eq!(segment.payload, b"def");
        assert_eq!(sender.bytes_in_flight(), 3);
    }

    #[test]
    fn payload_is_split() {
        let mut sender = Sender::new(&Config {
            max_payload_size: 4,
            ..config()
        });
        sender.fill_window();
        sender.segments_out().clear();
        sender.ack_received(ISN + 1, 100);

        sender.stream_in_mut().write(b"0123456789");
        sender.fill_window();
        let payloads: Vec<_> = sender.segments_out().drain(..).map(|seg| seg.payload).collect();
        assert_eq!(payloads, vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]);
    }

    #[test]
    fn fin_is_folded() {
        let mut sender = established(100);
        sender.stream_in_mut().write(b"hi");
        sender.stream_in_mut().end_input();
        sender.fill_window();

        let segment = sender.segments_out().pop_front().expect("data with FIN");
        assert_eq!(segment.payload, b"hi");
        assert!(segment.header.flags.fin());
        assert!(sender.segments_out().is_empty());
        assert_eq!(sender.bytes_in_flight(), 3);
        assert_eq!(sender.state(), SenderState::FinSent);

        sender.ack_received(ISN + 4, 100);
        assert_eq!(sender.state(), SenderState::FinAcked);
    }

    #[test]
    fn fin_waits_for_window() {
        let mut sender = established(2);
        sender.stream_in_mut().write(b"hi");
        sender.stream_in_mut().end_input();
        sender.fill_window();

        let segment = sender.segments_out().pop_front().expect("data");
        assert!(!segment.header.flags.fin());
        assert!(sender.segments_out().is_empty());

        sender.ack_received(ISN + 3, 2);
        let fin = sender.segments_out().pop_front().expect("a bare FIN");
        assert!(fin.header.flags.fin());
        assert!(fin.payload.is_empty());
        assert_eq!(fin.header.seq_number, ISN + 3);
    }

    #[test]
    fn retransmission_backoff() {
        let mut sender = Sender::new(&config());
        sender.fill_window();
        sender.segments_out().clear();

        sender.tick(Duration::from_millis(999));
        assert!(sender.segments_out().is_empty());
        sender.tick(Duration::from_millis(1));
        let retx = sender.segments_out().pop_front().expect("a retransmission");
        assert!(retx.header.flags.syn());
        assert_eq!(sender.consecutive_retransmissions(), 1);
        assert_eq!(sender.rto(), Duration::from_millis(2000));

        sender.tick(Duration::from_millis(1999));
        assert!(sender.segments_out().is_empty());
        sender.tick(Duration::from_millis(1));
        assert_eq!(sender.segments_out().len(), 1);
        sender.tick(Duration::from_millis(4000));
        assert_eq!(sender.segments_out().len(), 2);
        assert_eq!(sender.consecutive_retransmissions(), 3);

        sender.ack_received(ISN + 1, 100);
        assert_eq!(sender.consecutive_retransmissions(), 0);
        assert_eq!(sender.rto(), Duration::from_millis(1000));
    }

    #[test]
    fn sub_millisecond_ticks() {
        let mut sender = Sender::new(&config());
        sender.fill_window();
        sender.segments_out().clear();

        for _ in 0..1999 {
            sender.tick(Duration::from_micros(500));
        }
        assert!(sender.segments_out().is_empty());
        sender.tick(Duration::from_micros(500));
        assert_eq!(sender.segments_out().len(), 1);
        assert_eq!(sender.consecutive_retransmissions(), 1);
    }

    #[test]
    fn payload_size_is_clamped() {
        let mut sender = Sender::new(&Config {
            max_payload_size: usize::MAX,
            send_capacity: 70_000,
            ..config()
        });
        sender.fill_window();
        sender.segments_out().clear();
        sender.ack_received(ISN + 1, u16::max_value());

        assert_eq!(sender.stream_in_mut().write(&[0x5a; 70_000]), 70_000);
        sender.fill_window();
        let largest = sender.segments_out().pop_front().expect("a data segment");
        assert_eq!(largest.payload.len(), PAYLOAD_SIZE_LIMIT);

        let mut adapter = Ipv4Adapter::new(Default::default());
        let bytes = adapter.wrap(largest).serialize();
        assert_eq!(bytes.len(), usize::from(u16::max_value()));

        let mut sender = Sender::new(&Config { max_payload_size: 0, ..config() });
        sender.fill_window();
        sender.segments_out().clear();
        sender.ack_received(ISN + 1, 100);
        sender.stream_in_mut().write(b"xy");
        sender.fill_window();
        let payloads: Vec<_> = sender.segments_out().drain(..).map(|seg| seg.payload).collect();
        assert_eq!(payloads, vec![b"x".to_vec(), b"y".to_vec()]);
    }

    #[test]
    fn zero_window_probe() {
        let mut sender = established(0);
        assert_eq!(sender.window_size(), 0);
        sender.stream_in_mut().write(b"abc");
        sender.fill_window();

        let probe = sender.segments_out().pop_front().expect("a one octet probe");
        assert_eq!(probe.payload, b"a");
        assert!(sender.segments_out().is_empty());

        sender.tick(Duration::from_millis(1000));
        assert_eq!(sender.segments_out().len(), 1);
        // Probing does not back off.
        assert_eq!(sender.consecutive_retransmissions(), 0);
        assert_eq!(sender.rto(), Duration::from_millis(1000));
    }

    #[test]
    fn impossible_ack_ignored() {
        let mut sender = Sender::new(&config());
        sender.fill_window();
        sender.ack_received(ISN + 2, 100);
        assert_eq!(sender.bytes_in_flight(), 1);
        assert_eq!(sender.window_size(), 1);
    }

    #[test]
    fn duplicate_ack_raises_window() {
        let mut sender = established(5);
        sender.ack_received(ISN + 1, 3);
        assert_eq!(sender.window_size(), 5);
        sender.ack_received(ISN + 1, 8);
        assert_eq!(sender.window_size(), 8);
    }

    #[test]
    fn empty_segment_untracked() {
        let mut sender = established(10);
        sender.send_empty_segment();
        let segment = sender.segments_out().pop_front().expect("an empty segment");
        assert_eq!(segment.header.seq_number, ISN + 1);
        assert_eq!(segment.length_in_sequence_space(), 0);
        assert_eq!(sender.bytes_in_flight(), 0);
        assert_eq!(sender.next_seqno_absolute(), 1);
    }
}
