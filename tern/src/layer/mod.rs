//! The protocol layers.
//!
//! Each layer is a plain value driven from the outside. Inbound traffic is pushed into it, outbound
//! traffic is taken from a queue it owns, and time only advances through explicit `tick` calls with
//! the elapsed [`Duration`]. No layer owns a thread, a socket or a clock.
//!
//! * [`tcp`] composes a reliable [`Sender`] and [`Receiver`] into a full-duplex [`Connection`].
//! * [`arp`] resolves next hop addresses and frames datagrams for a single link in an
//!   [`Interface`].
//! * [`ip`] forwards datagrams between several interfaces with a [`Router`].
//!
//! None of the operations here return errors. Unparseable input is dropped (and traced when the
//! `log` feature is enabled), protocol violations are ignored and fatal conditions are exposed as
//! state, for example an errored stream or an inactive connection.
//!
//! [`Duration`]: ../time/struct.Duration.html
//! [`tcp`]: tcp/index.html
//! [`arp`]: arp/index.html
//! [`ip`]: ip/index.html
//! [`Sender`]: tcp/struct.Sender.html
//! [`Receiver`]: tcp/struct.Receiver.html
//! [`Connection`]: tcp/struct.Connection.html
//! [`Interface`]: arp/struct.Interface.html
//! [`Router`]: ip/struct.Router.html
pub mod arp;
pub mod ip;
pub mod tcp;
