//! The TCP layer.
//!
//! Offers a reliable, ordered and full-duplex byte stream on top of a datagram service that may
//! lose, duplicate or reorder what it carries. The layer is split the same way the protocol is:
//!
//! * The [`Sender`] reads from the outbound [`ByteStream`], cuts it into segments that fit the
//!   window of the remote and retransmits the oldest unacknowledged one whenever the
//!   retransmission timer expires. The timeout doubles on every consecutive retransmission and is
//!   reset by any new acknowledgment.
//! * The [`Receiver`] feeds incoming payload into a [`Reassembler`] and computes the
//!   acknowledgment number and window to advertise.
//! * The [`Connection`] drives both, stamps acknowledgments onto all outgoing segments, and
//!   implements opening, closing and resets.
//!
//! All positions inside a stream are tracked as absolute 64-bit sequence numbers where index 0 is
//! the SYN. Only at the boundary to the wire are they converted into the wrapping 32-bit
//! [`TcpSeqNumber`], relative to the initial sequence number of their direction.
//!
//! Segments are exchanged without ports, addresses or checksums. An [`Ipv4Adapter`] stamps these
//! when wrapping segments into IPv4 datagrams and filters received datagrams for its connection.
//!
//! ## Opening a connection
//!
//! A fresh [`Connection`] is listening. Calling [`connect`] sends a SYN, while receiving a SYN
//! answers with a SYN that acknowledges it. There is no separate listening socket.
//!
//! ## Closing a connection
//!
//! Calling [`end_input_stream`] sends a FIN after the last octet of the outbound stream. If the
//! remote closed its own stream first then the connection ends as soon as our FIN is acknowledged.
//! Otherwise it lingers for ten times the initial retransmission timeout after the last segment
//! from the remote, in case our final acknowledgment was lost and the remote retransmits its FIN.
//!
//! There is no automatic reset when a connection is dropped. Call [`shutdown`] to abort a
//! connection and notify the remote.
//!
//! ## Deviations
//!
//! There is no congestion control, the window advertised by the remote is used as is. A window of
//! zero is probed with one octet at a time and those probes do not back off the retransmission
//! timer. Options are neither sent nor interpreted.
//!
//! [`Sender`]: struct.Sender.html
//! [`Receiver`]: struct.Receiver.html
//! [`Connection`]: struct.Connection.html
//! [`ByteStream`]: ../../storage/struct.ByteStream.html
//! [`Reassembler`]: ../../storage/struct.Reassembler.html
//! [`TcpSeqNumber`]: ../../wire/struct.TcpSeqNumber.html
//! [`Ipv4Adapter`]: struct.Ipv4Adapter.html
//! [`connect`]: struct.Connection.html#method.connect
//! [`end_input_stream`]: struct.Connection.html#method.end_input_stream
//! [`shutdown`]: struct.Connection.html#method.shutdown
mod adapter;
mod config;
mod connection;
mod receiver;
mod sender;
mod state;
#[cfg(test)]
mod tests;

mod siphash;

pub use adapter::{
    DEFAULT_HOP_LIMIT,
    FourTuple,
    Ipv4Adapter};

pub use config::{
    Config,
    DEFAULT_CAPACITY,
    MAX_PAYLOAD_SIZE,
    MAX_RETX_ATTEMPTS,
    PAYLOAD_SIZE_LIMIT,
    TIMEOUT_DEFAULT};

pub use connection::Connection;
pub use receiver::Receiver;
pub use sender::Sender;

pub use state::{
    ReceiverState,
    SenderState,
    State};

// publically exposed for initialization.
pub use siphash::IsnGenerator;
