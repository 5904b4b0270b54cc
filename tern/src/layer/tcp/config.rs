use crate::time::{Duration, Instant};
use crate::wire::TcpSeqNumber;

use super::adapter::FourTuple;
use super::siphash::IsnGenerator;

/// Default capacity of both the inbound and the outbound byte stream.
pub const DEFAULT_CAPACITY: usize = 64000;

/// Default upper bound on the payload of a single segment.
pub const MAX_PAYLOAD_SIZE: usize = 1000;

/// The largest payload a segment can carry in an IPv4 datagram without options.
pub const PAYLOAD_SIZE_LIMIT: usize = 65535 - 20 - 20;

/// Default initial retransmission timeout.
pub const TIMEOUT_DEFAULT: Duration = Duration::from_millis(1000);

/// Default number of consecutive retransmissions before a connection is aborted.
pub const MAX_RETX_ATTEMPTS: u32 = 8;

/// Parameters of a single connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the inbound stream, this bounds the advertised window.
    pub recv_capacity: usize,
    /// Capacity of the outbound stream.
    pub send_capacity: usize,
    /// The initial retransmission timeout.
    pub rt_timeout: Duration,
    /// Use this initial sequence number instead of generating one.
    pub fixed_isn: Option<TcpSeqNumber>,
    /// The endpoints of the connection, hashed into a generated initial sequence number.
    pub tuple: Option<FourTuple>,
    /// Reading of the host clock when the connection is created.
    ///
    /// Added to a generated initial sequence number, such that a reused tuple starts elsewhere in
    /// the sequence space.
    pub isn_clock: Instant,
    /// Upper bound on the payload carried by a single segment.
    ///
    /// Clamped to between one octet and [`PAYLOAD_SIZE_LIMIT`].
    ///
    /// [`PAYLOAD_SIZE_LIMIT`]: constant.PAYLOAD_SIZE_LIMIT.html
    pub max_payload_size: usize,
    /// Abort after more than this many consecutive retransmissions.
    pub max_retx_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            recv_capacity: DEFAULT_CAPACITY,
            send_capacity: DEFAULT_CAPACITY,
            rt_timeout: TIMEOUT_DEFAULT,
            fixed_isn: None,
            tuple: None,
            isn_clock: Instant::ZERO,
            max_payload_size: MAX_PAYLOAD_SIZE,
            max_retx_attempts: MAX_RETX_ATTEMPTS,
        }
    }
}

impl Config {
    /// The initial sequence number of a connection with this configuration.
    ///
    /// This is the fixed one, if any, or else the one `generator` assigns to the tuple at the
    /// configured clock reading.
    pub fn initial_seq_number(&self, generator: &IsnGenerator) -> TcpSeqNumber {
        match self.fixed_isn {
            Some(isn) => isn,
            None => generator.get_isn(self.tuple, self.isn_clock),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::Ipv4Address;

    fn tuple() -> FourTuple {
        FourTuple {
            local_address: Ipv4Address::new(10, 0, 0, 2),
            local_port: 40_000,
            remote_address: Ipv4Address::new(192, 168, 1, 2),
            remote_port: 80,
        }
    }

    #[test]
    fn generated_isn() {
        let generator = IsnGenerator::from_secret_key_bytes(*b"fedcba9876543210");
        let config = Config {
            tuple: Some(tuple()),
            isn_clock: Instant::from_millis(40),
            ..Config::default()
        };

        let isn = config.initial_seq_number(&generator);
        assert_eq!(isn, generator.get_isn(Some(tuple()), Instant::from_millis(40)));
        assert_ne!(isn, Config::default().initial_seq_number(&generator));

        let earlier = Config { isn_clock: Instant::ZERO, ..config };
        assert_eq!(isn - earlier.initial_seq_number(&generator), 10_000);
    }

    #[test]
    fn fixed_isn_wins() {
        let generator = IsnGenerator::from_secret_key_bytes(*b"fedcba9876543210");
        let config = Config {
            fixed_isn: Some(TcpSeqNumber(7)),
            tuple: Some(tuple()),
            ..Config::default()
        };
        assert_eq!(config.initial_seq_number(&generator), TcpSeqNumber(7));
    }
}
