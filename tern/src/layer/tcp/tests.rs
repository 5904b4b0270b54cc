//! Tcp layer tests.
//!
//! Two connections talk to each other directly, segments are carried between them by hand. That
//! way every test controls exactly which segment is delivered, dropped or delayed.
use super::*;
use crate::time::Duration;
use crate::wire::{TcpFlags, TcpRepr, TcpSegment, TcpSeqNumber};

const ISN_A: TcpSeqNumber = TcpSeqNumber(1000);
const ISN_B: TcpSeqNumber = TcpSeqNumber(0xffff_fffe);

fn connection(isn: TcpSeqNumber) -> Connection {
    Connection::new(Config {
        fixed_isn: Some(isn),
        ..Config::default()
    })
}

/// Deliver all queued segments of `from` to `to`, returning how many there were.
fn transfer(from: &mut Connection, to: &mut Connection) -> usize {
    let mut count = 0;
    while let Some(segment) = from.segments_out().pop_front() {
        to.segment_received(&segment);
        count += 1;
    }
    count
}

/// Two connections after the three way handshake.
fn established() -> (Connection, Connection) {
    let mut a = connection(ISN_A);
    let mut b = connection(ISN_B);

    a.connect();
    assert_eq!(a.state(), Some(State::SynSent));
    assert_eq!(transfer(&mut a, &mut b), 1);
    assert_eq!(b.state(), Some(State::SynReceived));
    assert_eq!(transfer(&mut b, &mut a), 1);
    assert_eq!(a.state(), Some(State::Established));
    assert_eq!(transfer(&mut a, &mut b), 1);
    assert_eq!(b.state(), Some(State::Established));

    assert!(a.segments_out().is_empty());
    assert!(b.segments_out().is_empty());
    (a, b)
}

#[test]
fn listen() {
    let a = connection(ISN_A);
    assert!(a.active());
    assert_eq!(a.state(), Some(State::Listen));
}

#[test]
fn handshake_segments() {
    let mut a = connection(ISN_A);
    let mut b = connection(ISN_B);

    a.connect();
    let syn = a.segments_out().front().cloned().expect("a SYN");
    assert!(syn.header.flags.syn());
    assert_eq!(syn.header.seq_number, ISN_A);
    assert_eq!(syn.header.ack_number, None);
    transfer(&mut a, &mut b);

    let syn_ack = b.segments_out().front().cloned().expect("a SYN/ACK");
    assert!(syn_ack.header.flags.syn());
    assert_eq!(syn_ack.header.seq_number, ISN_B);
    assert_eq!(syn_ack.header.ack_number, Some(ISN_A + 1));
    assert_eq!(syn_ack.header.window_len, DEFAULT_CAPACITY as u16);
    transfer(&mut b, &mut a);

    let ack = a.segments_out().front().cloned().expect("an ACK");
    assert_eq!(ack.length_in_sequence_space(), 0);
    assert_eq!(ack.header.seq_number, ISN_A + 1);
    assert_eq!(ack.header.ack_number, Some(ISN_B + 1));
}

#[test]
fn full_lifecycle() {
    let (mut a, mut b) = established();

    assert_eq!(a.write(b"hello"), 5);
    assert_eq!(a.bytes_in_flight(), 5);
    assert_eq!(transfer(&mut a, &mut b), 1);
    assert_eq!(transfer(&mut b, &mut a), 1);
    assert_eq!(a.bytes_in_flight(), 0);
    assert_eq!(b.inbound_stream_mut().read(10), b"hello");

    // The side closing first lingers.
    a.end_input_stream();
    assert_eq!(a.state(), Some(State::FinWait1));
    transfer(&mut a, &mut b);
    assert_eq!(b.state(), Some(State::CloseWait));
    transfer(&mut b, &mut a);
    assert_eq!(a.state(), Some(State::FinWait2));

    b.end_input_stream();
    assert_eq!(b.state(), Some(State::LastAck));
    transfer(&mut b, &mut a);
    assert_eq!(a.state(), Some(State::TimeWait));
    transfer(&mut a, &mut b);

    // The side closing last is done as soon as its FIN is acknowledged.
    assert!(!b.active());
    assert_eq!(b.state(), Some(State::Closed));

    a.tick(Duration::from_millis(9_999));
    assert!(a.active());
    a.tick(Duration::from_millis(1));
    assert!(!a.active());
    assert_eq!(a.state(), Some(State::Closed));

    for conn in [&a, &b].iter() {
        assert!(!conn.inbound_stream().error());
        assert!(!conn.outbound_stream().error());
        assert!(conn.inbound_stream().input_ended());
    }
}

#[test]
fn lost_data_is_retransmitted() {
    let (mut a, mut b) = established();

    a.write(b"lost");
    let lost = a.segments_out().pop_front().expect("a data segment");
    assert_eq!(lost.payload, b"lost");

    a.tick(Duration::from_millis(999));
    assert!(a.segments_out().is_empty());
    a.tick(Duration::from_millis(1));
    assert_eq!(transfer(&mut a, &mut b), 1);
    assert_eq!(b.inbound_stream_mut().read(4), b"lost");

    transfer(&mut b, &mut a);
    assert_eq!(a.bytes_in_flight(), 0);
}

#[test]
fn reordered_data() {
    let (mut a, mut b) = established();

    // Every write is flushed on its own.
    a.write(b"ab");
    a.write(b"cd");
    let first = a.segments_out().pop_front().expect("first");
    let second = a.segments_out().pop_front().expect("second");

    b.segment_received(&second);
    assert_eq!(b.unassembled_bytes(), 2);
    let dup_ack = b.segments_out().pop_front().expect("an ACK for the gap");
    assert_eq!(dup_ack.header.ack_number, Some(ISN_A + 1));

    b.segment_received(&first);
    assert_eq!(b.unassembled_bytes(), 0);
    assert_eq!(b.inbound_stream_mut().read(4), b"abcd");
}

#[test]
fn window_is_advertised() {
    let mut a = Connection::new(Config {
        fixed_isn: Some(ISN_A),
        ..Config::default()
    });
    let mut b = Connection::new(Config {
        fixed_isn: Some(ISN_B),
        recv_capacity: 4,
        ..Config::default()
    });

    a.connect();
    transfer(&mut a, &mut b);
    transfer(&mut b, &mut a);
    transfer(&mut a, &mut b);

    assert_eq!(a.write(b"abcdef"), 6);
    let segment = a.segments_out().pop_front().expect("data");
    assert_eq!(segment.payload, b"abcd");
    assert!(a.segments_out().is_empty());

    b.segment_received(&segment);
    let ack = b.segments_out().pop_front().expect("an ACK");
    assert_eq!(ack.header.window_len, 0);
    a.segment_received(&ack);

    // A closed window is probed with a single octet.
    let probe = a.segments_out().pop_front().expect("a probe");
    assert_eq!(probe.payload, b"e");
    assert!(a.segments_out().is_empty());

    a.tick(Duration::from_millis(1000));
    let probe = a.segments_out().pop_front().expect("a repeated probe");
    assert_eq!(probe.payload, b"e");
    assert_eq!(a.bytes_in_flight(), 1);
}

#[test]
fn reset_aborts() {
    let (mut a, _b) = established();

    let mut flags = TcpFlags::default();
    flags.set_rst(true);
    a.segment_received(&TcpSegment {
        header: TcpRepr {
            src_port: 1,
            dst_port: 2,
            flags,
            seq_number: ISN_B + 1,
            ..TcpRepr::default()
        },
        payload: Vec::new(),
    });

    assert!(!a.active());
    assert!(a.inbound_stream().error());
    assert!(a.outbound_stream().error());
    assert_eq!(a.state(), Some(State::Reset));
    assert!(a.segments_out().is_empty());
}

#[test]
fn reset_while_listening() {
    let mut a = connection(ISN_A);
    let mut flags = TcpFlags::default();
    flags.set_rst(true);
    a.segment_received(&TcpSegment {
        header: TcpRepr {
            flags,
            ..TcpRepr::default()
        },
        payload: Vec::new(),
    });
    assert!(!a.active());
    assert_eq!(a.state(), Some(State::Reset));
}

#[test]
fn retransmission_limit() {
    let mut a = connection(ISN_A);
    a.connect();
    a.segments_out().clear();

    for attempt in 1..=MAX_RETX_ATTEMPTS {
        a.tick(Duration::from_secs(1000));
        assert!(a.active(), "aborted early, attempt {}", attempt);
        let retx = a.segments_out().pop_front().expect("a retransmission");
        assert!(retx.header.flags.syn());
    }

    a.tick(Duration::from_secs(1000));
    assert!(!a.active());
    assert!(a.outbound_stream().error());
    let reset = a.segments_out().pop_front().expect("a reset");
    assert!(reset.header.flags.rst());
    assert_eq!(reset.header.seq_number, ISN_A + 1);
    assert!(a.segments_out().is_empty());
}

#[test]
fn shutdown_sends_single_reset() {
    let (mut a, mut b) = established();

    a.shutdown();
    assert!(!a.active());
    assert_eq!(a.segments_out().len(), 1);
    a.shutdown();
    assert_eq!(a.segments_out().len(), 1);

    transfer(&mut a, &mut b);
    assert!(!b.active());
    assert!(b.inbound_stream().error());
}

#[test]
fn keep_alive_is_answered() {
    let (mut a, _b) = established();

    a.segment_received(&TcpSegment {
        header: TcpRepr {
            src_port: 1,
            dst_port: 2,
            seq_number: ISN_B,
            ack_number: Some(ISN_A + 1),
            window_len: 1000,
            ..TcpRepr::default()
        },
        payload: Vec::new(),
    });

    let ack = a.segments_out().pop_front().expect("an ACK");
    assert_eq!(ack.length_in_sequence_space(), 0);
    assert_eq!(ack.header.ack_number, Some(ISN_B + 1));
}

#[test]
fn inactive_ignores_input() {
    let (mut a, mut b) = established();
    a.shutdown();
    a.segments_out().clear();

    b.write(b"late");
    transfer(&mut b, &mut a);
    assert!(a.segments_out().is_empty());
    assert_eq!(a.inbound_stream().bytes_written(), 0);
}

#[test]
fn bidirectional() {
    let (mut a, mut b) = established();

    a.write(b"ping");
    b.write(b"pong");
    transfer(&mut a, &mut b);
    transfer(&mut b, &mut a);
    transfer(&mut a, &mut b);

    assert_eq!(a.inbound_stream_mut().read(4), b"pong");
    assert_eq!(b.inbound_stream_mut().read(4), b"ping");
    assert_eq!(a.bytes_in_flight(), 0);
    assert_eq!(b.bytes_in_flight(), 0);
    assert_eq!(a.remaining_outbound_capacity(), DEFAULT_CAPACITY);
}
