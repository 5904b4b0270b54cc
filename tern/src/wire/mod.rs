/*! Packet representations and their octet encodings.

# An overview over packet representations

The `wire` module deals with the packet *representation*. It provides three levels of
functionality.

 * First, it provides functions to extract fields from sequences of octets, and to insert fields
   into sequences of octets. This happens in the lowercase structures e.g. [`ethernet_frame`] or
   [`tcp_packet`].
 * Second, it provides a compact, high-level representation of header data that can be created from
   parsing and emitted into a sequence of octets. This happens through the `Repr` family of structs,
   e.g. [`ArpRepr`] or [`Ipv4Repr`].
 * Third, it provides owned messages that pair such a header with an opaque payload buffer, e.g.
   [`EthernetFrame`], [`Ipv4Datagram`] or [`TcpSegment`]. These are what the layers exchange: the
   protocol logic only ever reads and writes already parsed headers and hands payloads through
   untouched.

[`ethernet_frame`]: struct.ethernet_frame.html
[`tcp_packet`]: struct.tcp_packet.html
[`ArpRepr`]: struct.ArpRepr.html
[`Ipv4Repr`]: struct.Ipv4Repr.html
[`EthernetFrame`]: struct.EthernetFrame.html
[`Ipv4Datagram`]: struct.Ipv4Datagram.html
[`TcpSegment`]: struct.TcpSegment.html

The `packet` family of data structures guarantees that, if the `packet::check_len()` method
returned `Ok(())`, then no field accessor or setter method will panic.

In the `Repr` family of data structures, the `Repr::parse()` method never panics and the
`Repr::emit()` method never panics as long as the underlying buffer is at least
`Repr::buffer_len()` octets long.

# Examples

To serialize an IP datagram into an octet buffer, and then parse it back:

```rust
use tern::wire::*;

let datagram = Ipv4Datagram {
    header: Ipv4Repr {
        src_addr:  Ipv4Address::new(10, 0, 0, 1),
        dst_addr:  Ipv4Address::new(10, 0, 0, 2),
        protocol:  IpProtocol::Tcp,
        hop_limit: 64,
        ident:     0,
    },
    payload: b"payload".to_vec(),
};

let bytes = datagram.serialize();
let parsed = Ipv4Datagram::parse(&bytes, Checksum::Manual)
    .expect("well-formed datagram");
assert_eq!(parsed, datagram);
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

mod arp;
mod checksum;
mod error;
mod ethernet;
mod ipv4;
mod tcp;

/// Describes how to handle checksums.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checksum {
    /// Checksum must be computed or checked manually.
    Manual,

    /// The checksum field is filled or checked by someone else (e.g. the NIC).
    Ignored,
}

impl Checksum {
    pub(crate) fn manual(self) -> bool {
        self == Checksum::Manual
    }
}

pub use self::ethernet::{
    ethernet as ethernet_frame,
    EtherType as EthernetProtocol,
    Address as EthernetAddress,
    Frame as EthernetFrame,
    Repr as EthernetRepr};

pub use self::error::{
    Error,
    Result};

pub use self::arp::{
    arp as arp_packet,
    Hardware as ArpHardware,
    Operation as ArpOperation,
    Repr as ArpRepr};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Datagram as Ipv4Datagram,
    Protocol as IpProtocol,
    Repr as Ipv4Repr,
    Subnet as Ipv4Subnet};

pub use self::tcp::{
    tcp as tcp_packet,
    Flags as TcpFlags,
    Repr as TcpRepr,
    Segment as TcpSegment,
    SeqNumber as TcpSeqNumber};
