//! Carrying segments in IPv4 datagrams.
use crate::wire::{Checksum, IpProtocol, Ipv4Address, Ipv4Datagram, Ipv4Repr, TcpSegment};

/// The hop limit of datagrams carrying our segments.
pub const DEFAULT_HOP_LIMIT: u8 = 64;

/// Identifies a connection by both its endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FourTuple {
    /// The address of this host.
    pub local_address: Ipv4Address,
    /// The port on this host.
    pub local_port: u16,
    /// The address of the remote host.
    pub remote_address: Ipv4Address,
    /// The port on the remote host.
    pub remote_port: u16,
}

/// Translates between segments of one connection and the datagrams carrying them.
///
/// Outgoing segments get the ports of the tuple stamped into them and are wrapped into a datagram
/// with a correct checksum. Incoming datagrams are only unwrapped if they carry TCP for exactly this
/// tuple. A listening adapter instead accepts a SYN from any remote for its local endpoint, and
/// adopts that remote for the rest of the connection.
#[derive(Clone, Debug)]
pub struct Ipv4Adapter {
    tuple: FourTuple,
    listening: bool,
    next_ident: u16,
}

impl Ipv4Adapter {
    /// An adapter for an actively opened connection.
    pub fn new(tuple: FourTuple) -> Self {
        Ipv4Adapter {
            tuple,
            listening: false,
            next_ident: 0,
        }
    }

    /// An adapter waiting for a SYN to its local address and port.
    pub fn listen(local_address: Ipv4Address, local_port: u16) -> Self {
        Ipv4Adapter {
            tuple: FourTuple {
                local_address,
                local_port,
                ..FourTuple::default()
            },
            listening: true,
            next_ident: 0,
        }
    }

    /// The endpoints of the connection.
    ///
    /// The remote half is unspecified while the adapter is listening.
    pub fn tuple(&self) -> FourTuple {
        self.tuple
    }

    /// Whether the adapter still waits for the remote to appear.
    pub fn listening(&self) -> bool {
        self.listening
    }

    /// Wrap a segment of this connection into a datagram.
    pub fn wrap(&mut self, mut segment: TcpSegment) -> Ipv4Datagram {
        segment.header.src_port = self.tuple.local_port;
        segment.header.dst_port = self.tuple.remote_port;

        let ident = self.next_ident;
        self.next_ident = self.next_ident.wrapping_add(1);

        Ipv4Datagram {
            header: Ipv4Repr {
                src_addr: self.tuple.local_address,
                dst_addr: self.tuple.remote_address,
                protocol: IpProtocol::Tcp,
                hop_limit: DEFAULT_HOP_LIMIT,
                ident,
            },
            payload: segment.serialize(self.tuple.local_address, self.tuple.remote_address),
        }
    }

    /// Extract the segment for this connection from a datagram.
    ///
    /// Returns `None` if the datagram belongs to a different protocol or connection, or if the
    /// segment does not parse.
    pub fn unwrap(&mut self, datagram: &Ipv4Datagram) -> Option<TcpSegment> {
        let header = &datagram.header;
        if header.protocol != IpProtocol::Tcp {
            return None;
        }

        if header.dst_addr != self.tuple.local_address {
            return None;
        }

        if !self.listening && header.src_addr != self.tuple.remote_address {
            return None;
        }

        let segment = match TcpSegment::parse(
            &datagram.payload,
            header.src_addr,
            header.dst_addr,
            Checksum::Manual,
        ) {
            Ok(segment) => segment,
            Err(err) => {
                net_trace!("tcp: dropping segment from {}: {}", header.src_addr, err);
                return None;
            },
        };

        if segment.header.dst_port != self.tuple.local_port {
            return None;
        }

        if self.listening {
            let flags = segment.header.flags;
            if !flags.syn() || flags.rst() {
                return None;
            }

            net_debug!("tcp: accepting {}:{} on port {}",
                header.src_addr, segment.header.src_port, self.tuple.local_port);
            self.tuple.remote_address = header.src_addr;
            self.tuple.remote_port = segment.header.src_port;
            self.listening = false;
        } else if segment.header.src_port != self.tuple.remote_port {
            return None;
        }

        Some(segment)
    }
}
