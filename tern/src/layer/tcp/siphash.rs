//! Initial sequence number generation, as recommended by rfc6528.
//!
//! Uses a keyed cryptographic hash function (SipHash-2-4) instead of appending the secret key to
//! the four tuple for hashing. Hash function SipHash-2-4 from:
//!
//! > SipHash: a fast short-input PRF, Jean-Philippe Aumasson and Daniel J. Bernstein
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

use byteorder::{ByteOrder, LittleEndian};

use super::adapter::FourTuple;
use crate::time::Instant;
use crate::wire::TcpSeqNumber;

/// An initial sequence number generator based on SipHash-2-4.
///
/// > ISN = M + SipHash-2-4(secretkey, localip, localport, remoteip, remoteport)
///
/// where `M` is a timer that ticks every 4 microseconds on the clock of the caller. Connections
/// whose endpoints are not known yet, such as a connection created before its adapter learned the
/// remote, hash an all zero tuple.
#[derive(Clone, Debug)]
pub struct IsnGenerator {
    keys: (u64, u64),
}

// The initial values, as ASCII text.
const IV: [&[u8; 8]; 4] = [
    b"somepseu",
    b"dorandom",
    b"lygenera",
    b"tedbytes"];

struct State {
    v0: u64,
    v1: u64,
    v2: u64,
    v3: u64,
}

impl IsnGenerator {
    /// Create a generator by deriving a key from the standard `RandomState`.
    ///
    /// This is done by individually hashing the numbers `0u64` and `1u64` each with the same
    /// hasher created from a new instance of `RandomState`. The two output tags are then used as
    /// the internal key state.
    pub fn from_std_hash() -> Self {
        let hash = RandomState::new().build_hasher();
        let x0 = {
            let mut hash = hash.clone();
            hash.write_u64(0);
            hash.finish()
        };
        let x1 = {
            let mut hash = hash.clone();
            hash.write_u64(1);
            hash.finish()
        };

        IsnGenerator {
            keys: (x0, x1),
        }
    }

    /// Create a generator with some pre-defined secret key.
    ///
    /// Really, create the key with some cryptographic random means or derive them from some other
    /// key with a key derivation function.
    pub fn from_secret_key_bytes(bytes: [u8; 16]) -> Self {
        let a = LittleEndian::read_u64(&bytes[..8]);
        let b = LittleEndian::read_u64(&bytes[8..]);
        IsnGenerator { keys: (a, b), }
    }

    /// Get the initial sequence number for a connection at some time.
    pub fn get_isn(&self, connection: Option<FourTuple>, time: Instant) -> TcpSeqNumber {
        let connection = connection.unwrap_or_default();
        let mut state = State::init(self.keys.0, self.keys.1);

        let m = u64::from(connection.local_address.to_network_integer())
            | u64::from(connection.remote_address.to_network_integer()) << 32;
        let p = u64::from(connection.local_port)
            | u64::from(connection.remote_port) << 16
            // Message length = 12
            | 12_u64 << 56;
        state.absorb(m);
        state.absorb(p);
        let hash = state.finalize();

        // The clock component ticks every 4 microseconds.
        let timer = (time.total_micros() / 4) as u32;
        TcpSeqNumber(hash as u32) + timer
    }
}

impl State {
    const SIP_C: usize = 2;
    const SIP_D: usize = 4;

    fn init(k0: u64, k1: u64) -> Self {
        State {
            v0: u64::from_be_bytes(*IV[0]) ^ k0,
            v1: u64::from_be_bytes(*IV[1]) ^ k1,
            v2: u64::from_be_bytes(*IV[2]) ^ k0,
            v3: u64::from_be_bytes(*IV[3]) ^ k1,
        }
    }

    fn round(&mut self) {
        self.v0 = self.v0.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(13);
        self.v1 ^= self.v0;
        self.v0 = self.v0.rotate_left(32);
        self.v2 = self.v2.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(16);
        self.v3 ^= self.v2;
        self.v0 = self.v0.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(21);
        self.v3 ^= self.v0;
        self.v2 = self.v2.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(17);
        self.v1 ^= self.v2;
        self.v2 = self.v2.rotate_left(32);
    }

    /// Process a single 8-byte block of the message.
    ///
    /// The length block is absorbed by the caller, as the last block.
    fn absorb(&mut self, m: u64) {
        self.v3 ^= m;
        (0..Self::SIP_C).for_each(|_| self.round());
        self.v0 ^= m;
    }

    fn finalize(mut self) -> u64 {
        self.v2 ^= 0xff;
        (0..Self::SIP_D).for_each(|_| self.round());
        self.v0 ^ self.v1 ^ self.v2 ^ self.v3
    }
}
