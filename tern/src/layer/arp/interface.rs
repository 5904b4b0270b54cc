use std::collections::{BTreeMap, VecDeque};

use crate::time::{Duration, Instant};
use crate::wire::{ArpOperation, ArpRepr, Checksum};
use crate::wire::{EthernetAddress, EthernetFrame, EthernetProtocol, EthernetRepr};
use crate::wire::{Ipv4Address, Ipv4Datagram};

use super::neighbor::{Answer, Cache};

/// A network interface that connects IPv4 to an Ethernet link.
///
/// Datagrams are sent to a next hop whose hardware address is resolved with ARP. Datagrams for a
/// next hop that is not resolved yet wait in a queue per address and are sent in their original
/// order once a reply arrives. Requests for the same address are broadcast at most once within
/// [`SILENT_TIME`], and learned mappings expire after [`ENTRY_LIFETIME`].
///
/// [`SILENT_TIME`]: constant.SILENT_TIME.html
/// [`ENTRY_LIFETIME`]: constant.ENTRY_LIFETIME.html
#[derive(Debug)]
pub struct Interface {
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Address,
    neighbors: Cache,
    pending: BTreeMap<Ipv4Address, Vec<Ipv4Datagram>>,
    frames_out: VecDeque<EthernetFrame>,
    now: Instant,
}

/// An interface that queues received datagrams instead of returning them.
///
/// This is the form a [`Router`] drives its interfaces in.
///
/// [`Router`]: ../ip/struct.Router.html
#[derive(Debug)]
pub struct BufferedInterface {
    inner: Interface,
    datagrams_in: VecDeque<Ipv4Datagram>,
}

impl Interface {
    /// Create an interface with its hardware and protocol address.
    pub fn new(ethernet_address: EthernetAddress, ip_address: Ipv4Address) -> Self {
        net_debug!("arp: interface {} with address {}", ethernet_address, ip_address);
        Interface {
            ethernet_address,
            ip_address,
            neighbors: Cache::new(),
            pending: BTreeMap::new(),
            frames_out: VecDeque::new(),
            now: Instant::ZERO,
        }
    }

    /// Send a datagram to the given next hop.
    ///
    /// The next hop is usually a router or the destination of the datagram itself.
    pub fn send_datagram(&mut self, datagram: Ipv4Datagram, next_hop: Ipv4Address) {
        match self.neighbors.lookup(next_hop, self.now) {
            Answer::Found(hardware_addr) => {
                self.send_frame(hardware_addr, EthernetProtocol::Ipv4, datagram.serialize());
                return;
            },
            Answer::NotFound => {
                net_trace!("arp: requesting {} for {}", next_hop, datagram.header);
                self.send_request(next_hop);
                self.neighbors.requested(next_hop, self.now);
            },
            Answer::RateLimited => (),
        }

        self.pending.entry(next_hop)
            .or_insert_with(Vec::new)
            .push(datagram);
    }

    /// Process a received frame.
    ///
    /// Returns the datagram it carried, if any. ARP messages are answered and learned from
    /// internally. Frames for other hosts and malformed content are dropped.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        let header = &frame.header;
        if header.dst_addr != self.ethernet_address && !header.dst_addr.is_broadcast() {
            net_trace!("arp: dropping frame for {}", header.dst_addr);
            return None;
        }

        match header.ethertype {
            EthernetProtocol::Ipv4 => match Ipv4Datagram::parse(&frame.payload, Checksum::Manual) {
                Ok(datagram) => Some(datagram),
                Err(err) => {
                    net_trace!("arp: dropping datagram from {}: {}", header.src_addr, err);
                    None
                },
            },
            EthernetProtocol::Arp => {
                match ArpRepr::parse_bytes(&frame.payload) {
                    Ok(repr) => self.recv_arp(repr),
                    Err(err) => net_trace!("arp: dropping message from {}: {}", header.src_addr, err),
                }
                None
            },
            other => {
                net_trace!("arp: dropping frame of type {}", other);
                None
            },
        }
    }

    fn recv_arp(&mut self, repr: ArpRepr) {
        // Replies from an address we wait for are taken even when addressed to another host.
        let awaited = repr.operation == ArpOperation::Reply
            && self.pending.contains_key(&repr.source_protocol_addr);
        if repr.target_protocol_addr != self.ip_address && !awaited {
            return;
        }

        self.neighbors.fill(repr.source_protocol_addr, repr.source_hardware_addr, self.now);

        match repr.operation {
            ArpOperation::Request => {
                net_trace!("arp: answering {} at {}",
                    repr.source_protocol_addr, repr.source_hardware_addr);
                let reply = ArpRepr {
                    operation: ArpOperation::Reply,
                    source_hardware_addr: self.ethernet_address,
                    source_protocol_addr: self.ip_address,
                    target_hardware_addr: repr.source_hardware_addr,
                    target_protocol_addr: repr.source_protocol_addr,
                };
                self.send_frame(repr.source_hardware_addr, EthernetProtocol::Arp, reply.serialize());
            },
            ArpOperation::Reply => {
                let waiting = self.pending.remove(&repr.source_protocol_addr).unwrap_or_default();
                net_trace!("arp: {} resolved to {}, sending {} datagrams",
                    repr.source_protocol_addr, repr.source_hardware_addr, waiting.len());
                for datagram in waiting {
                    self.send_frame(
                        repr.source_hardware_addr,
                        EthernetProtocol::Ipv4,
                        datagram.serialize());
                }
            },
            ArpOperation::Unknown(_) => (),
        }
    }

    /// Advance the clock, forgetting mappings that expired.
    pub fn tick(&mut self, elapsed: Duration) {
        self.now += elapsed;
        self.neighbors.expire(self.now);
    }

    fn send_request(&mut self, target: Ipv4Address) {
        let request = ArpRepr {
            operation: ArpOperation::Request,
            source_hardware_addr: self.ethernet_address,
            source_protocol_addr: self.ip_address,
            target_hardware_addr: EthernetAddress::default(),
            target_protocol_addr: target,
        };
        self.send_frame(EthernetAddress::BROADCAST, EthernetProtocol::Arp, request.serialize());
    }

    fn send_frame(&mut self, dst_addr: EthernetAddress, ethertype: EthernetProtocol, payload: Vec<u8>) {
        self.frames_out.push_back(EthernetFrame {
            header: EthernetRepr {
                dst_addr,
                src_addr: self.ethernet_address,
                ethertype,
            },
            payload,
        });
    }

    /// Frames ready for transmission.
    pub fn frames_out(&mut self) -> &mut VecDeque<EthernetFrame> {
        &mut self.frames_out
    }

    /// The hardware address of the interface.
    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    /// The protocol address of the interface.
    pub fn ip_address(&self) -> Ipv4Address {
        self.ip_address
    }

    /// The mappings learned so far.
    pub fn neighbors(&self) -> &Cache {
        &self.neighbors
    }

    /// The number of datagrams waiting for the address of their next hop.
    pub fn pending_len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }
}

impl BufferedInterface {
    /// Wrap an interface.
    pub fn new(inner: Interface) -> Self {
        BufferedInterface {
            inner,
            datagrams_in: VecDeque::new(),
        }
    }

    /// Send a datagram to the given next hop.
    pub fn send_datagram(&mut self, datagram: Ipv4Datagram, next_hop: Ipv4Address) {
        self.inner.send_datagram(datagram, next_hop)
    }

    /// Process a received frame, queueing the datagram it carried.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) {
        if let Some(datagram) = self.inner.recv_frame(frame) {
            self.datagrams_in.push_back(datagram);
        }
    }

    /// Advance the clock.
    pub fn tick(&mut self, elapsed: Duration) {
        self.inner.tick(elapsed)
    }

    /// Frames ready for transmission.
    pub fn frames_out(&mut self) -> &mut VecDeque<EthernetFrame> {
        self.inner.frames_out()
    }

    /// Received datagrams, in order of arrival.
    pub fn datagrams_in(&mut self) -> &mut VecDeque<Ipv4Datagram> {
        &mut self.datagrams_in
    }

    /// The wrapped interface.
    pub fn interface(&self) -> &Interface {
        &self.inner
    }

    /// The wrapped interface, mutably.
    pub fn interface_mut(&mut self) -> &mut Interface {
        &mut self.inner
    }
}
