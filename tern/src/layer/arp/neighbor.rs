// Heads up! Before working on this file you should read, at least,
// the parts of RFC 1122 that discuss ARP.
use std::collections::BTreeMap;

use crate::time::{Duration, Expiration, Instant};
use crate::wire::{EthernetAddress, Ipv4Address};

/// How long a learned mapping stays valid.
pub const ENTRY_LIFETIME: Duration = Duration::from_secs(30);

/// Minimum delay between requests for the same address.
pub const SILENT_TIME: Duration = Duration::from_secs(5);

/// A cached neighbor.
///
/// A neighbor mapping translates from a protocol address to a hardware address, and contains the
/// timestamp past which the mapping should be considered invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Neighbor {
    protocol_addr: Ipv4Address,
    hardware_addr: EthernetAddress,
    expires_at:    Expiration,
}

/// An answer to a neighbor cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// The neighbor address is in the cache and not expired.
    Found(EthernetAddress),
    /// The neighbor address is not in the cache, or has expired.
    NotFound,
    /// The neighbor address is not in the cache, or has expired,
    /// and a lookup has been made recently.
    RateLimited,
}

/// A neighbor cache.
///
/// Holds the learned mappings and remembers when each address was last requested, such that the
/// link is not flooded with requests for an unresponsive neighbor.
///
/// # Examples
///
/// ```rust
/// use tern::layer::arp::{NeighborAnswer, NeighborCache};
/// use tern::time::{Duration, Instant};
/// use tern::wire::{EthernetAddress, Ipv4Address};
///
/// let mut cache = NeighborCache::new();
/// let peer = Ipv4Address::new(10, 0, 0, 2);
/// let now = Instant::ZERO;
///
/// assert_eq!(cache.lookup(peer, now), NeighborAnswer::NotFound);
/// cache.requested(peer, now);
/// assert_eq!(cache.lookup(peer, now), NeighborAnswer::RateLimited);
///
/// let hardware = EthernetAddress([0x02, 0, 0, 0, 0, 2]);
/// cache.fill(peer, hardware, now + Duration::from_millis(10));
/// assert_eq!(cache.lookup(peer, now), NeighborAnswer::Found(hardware));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Cache {
    entries: BTreeMap<Ipv4Address, Neighbor>,
    requests: BTreeMap<Ipv4Address, Instant>,
}

impl Neighbor {
    /// The protocol address of the neighbor.
    pub fn protocol_addr(&self) -> Ipv4Address {
        self.protocol_addr
    }

    /// The hardware address of the neighbor.
    pub fn hardware_addr(&self) -> EthernetAddress {
        self.hardware_addr
    }

    /// When the mapping becomes invalid.
    pub fn expires_at(&self) -> Expiration {
        self.expires_at
    }
}

impl Cache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Cache::default()
    }

    /// Learn or refresh a mapping.
    pub fn fill(
        &mut self,
        protocol_addr: Ipv4Address,
        hardware_addr: EthernetAddress,
        timestamp: Instant,
    ) {
        let neighbor = Neighbor {
            protocol_addr,
            hardware_addr,
            expires_at: Expiration::When(timestamp + ENTRY_LIFETIME),
        };

        if let Some(old) = self.entries.insert(protocol_addr, neighbor) {
            if old.hardware_addr != hardware_addr {
                net_debug!("arp: neighbor {} moved from {} to {}",
                    protocol_addr, old.hardware_addr, hardware_addr);
            }
        }
    }

    /// Look up the hardware address of a neighbor.
    pub fn lookup(&self, protocol_addr: Ipv4Address, timestamp: Instant) -> Answer {
        match self.entries.get(&protocol_addr) {
            Some(neighbor) if !neighbor.expires_at.has_passed(timestamp) => {
                return Answer::Found(neighbor.hardware_addr);
            },
            _ => (),
        }

        match self.requests.get(&protocol_addr) {
            Some(&at) if timestamp - at <= SILENT_TIME => Answer::RateLimited,
            _ => Answer::NotFound,
        }
    }

    /// Remember that a request for the address was sent.
    pub fn requested(&mut self, protocol_addr: Ipv4Address, timestamp: Instant) {
        self.requests.insert(protocol_addr, timestamp);
    }

    /// Remove all mappings that expired, and requests that no longer silence new ones.
    pub fn expire(&mut self, timestamp: Instant) {
        self.entries.retain(|addr, neighbor| {
            let keep = !neighbor.expires_at.has_passed(timestamp);
            if !keep {
                net_trace!("arp: neighbor {} expired", addr);
            }
            keep
        });
        self.requests.retain(|_, &mut at| timestamp - at <= SILENT_TIME);
    }

    /// The number of addresses with a request inside the silent time.
    ///
    /// Only accurate after [`expire`] ran for the current time.
    ///
    /// [`expire`]: #method.expire
    pub fn recent_requests(&self) -> usize {
        self.requests.len()
    }

    /// Iterate over all cached mappings, ordered by protocol address.
    pub fn iter(&self) -> impl Iterator<Item=&Neighbor> + '_ {
        self.entries.values()
    }

    /// The number of cached mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no mapping is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
