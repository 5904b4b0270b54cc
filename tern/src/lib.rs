//! A small, layered network stack for user-space experiments.
//!
//! ## Table of contents
//!
//! This is also a recommended reading order but feel free to skip ahead, each chapter tries to be
//! somewhat self-contained.
//!
//! 1. [Design](#design-and-relevant-core-concepts)
//! 2. [The wire module](wire/index.html)
//! 3. [The storage module](storage/index.html)
//! 4. [The layers](layer/index.html)
//!    1. [Tcp](layer/tcp/index.html)
//!    1. [Arp and the network interface](layer/arp/index.html)
//!    1. [Ip routing](layer/ip/index.html)
//!
//! ## Design and relevant core concepts
//!
//! Two hosts exchange an ordered, reliable and bidirectional byte stream over a substrate that
//! only offers unreliable, unordered and best-effort delivery of frames. The stack is split into
//! the same layers a kernel would use:
//!
//! * a reliable transport, composed of a [`Sender`], a [`Receiver`] and the [`Connection`] state
//!   machine driving both,
//! * a link-resolution layer, the ARP-backed [`Interface`],
//! * and a forwarding layer, the [`Router`] with its longest-prefix route table.
//!
//! Nothing in here owns a thread, a socket or a clock. Every component is a plain value that is
//! driven from the outside: the caller pushes inbound segments or frames, pops outbound queues and
//! reports the passage of time through explicit `tick` calls. All operations run to completion and
//! never block. Failure is never reported as an error from these operations: malformed input is
//! dropped, protocol violations are ignored and fatal conditions (a reset, exhausted
//! retransmissions) become observable state of the component instead.
//!
//! [`Sender`]: layer/tcp/struct.Sender.html
//! [`Receiver`]: layer/tcp/struct.Receiver.html
//! [`Connection`]: layer/tcp/struct.Connection.html
//! [`Interface`]: layer/arp/struct.Interface.html
//! [`Router`]: layer/ip/struct.Router.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use] mod macros;

pub mod layer;
pub mod storage;
pub mod time;
pub mod wire;
