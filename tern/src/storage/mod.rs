//! Byte buffers shared by the transport layer.
//!
//! A [`ByteStream`] is a bounded, in-order pipe of octets with an end marker and an error flag. A
//! [`Reassembler`] accepts substrings at arbitrary absolute stream positions and writes the
//! contiguous prefix it has gathered into its output `ByteStream`. Which parts of its window are
//! already present is tracked by an [`Assembler`].
//!
//! [`ByteStream`]: struct.ByteStream.html
//! [`Reassembler`]: struct.Reassembler.html
//! [`Assembler`]: struct.Assembler.html
mod assembler;
mod reassembler;
mod stream;

pub use self::assembler::{Assembler, AssemblerIter, Contig};
pub use self::reassembler::Reassembler;
pub use self::stream::ByteStream;
