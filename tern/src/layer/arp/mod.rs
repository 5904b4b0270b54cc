//! Receiving and sending ARP messages.
//!
//! Restricted to what a single IPv4 interface on an Ethernet link requires: resolving the
//! hardware address of a next hop, answering requests for our own address and learning from
//! messages addressed to us. There is no proxying and no gratuitous announcement.
mod interface;
mod neighbor;

pub use interface::{BufferedInterface, Interface};

pub use neighbor::{
    Neighbor,
    Answer as NeighborAnswer,
    Cache as NeighborCache,
    ENTRY_LIFETIME,
    SILENT_TIME,
};
