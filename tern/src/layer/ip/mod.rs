//! The IP layer.
//!
//! Forwards IPv4 datagrams between several [`BufferedInterface`]s. This is the job of a router
//! and not of a host: datagrams are never delivered locally, every decoded datagram is either sent
//! out again or dropped.
//!
//! ## Structure
//!
//! The [`Router`] owns its interfaces and a [`Routes`] table. Routes match a CIDR block of
//! destination addresses and name the outgoing interface by the index [`Router::add_interface`]
//! returned, optionally with a next hop router. The most specific route wins, that is the one
//! with the longest prefix; among equally specific routes the one installed first. A route with a
//! prefix length of zero matches everything and can serve as the default route.
//!
//! ## Forwarding
//!
//! [`Router::route`] drains the datagrams every interface received. For each, the time-to-live is
//! checked and decremented, then the datagram is handed to the send path of the outgoing
//! interface. That interface resolves the next hop (or the destination itself, for directly
//! attached networks) and queues the frame. There is no ICMP, so dropped datagrams are silently
//! lost.
//!
//! [`BufferedInterface`]: ../arp/struct.BufferedInterface.html
//! [`Router`]: struct.Router.html
//! [`Routes`]: struct.Routes.html
//! [`Router::add_interface`]: struct.Router.html#method.add_interface
//! [`Router::route`]: struct.Router.html#method.route
mod route;
mod router;
#[cfg(test)]
mod tests;

pub use route::{Route, Routes};
pub use router::Router;
