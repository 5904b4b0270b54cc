use core::{fmt, ops};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Checksum, Error, IpProtocol, Ipv4Address, Result};
use super::checksum;

/// A TCP sequence number.
///
/// A sequence number is a monotonically advancing integer modulo 2<sup>32</sup>. On the wire each
/// stream counts from its initial sequence number (ISN), while the endpoints track an *absolute*
/// 64-bit position where index 0 is the SYN. [`wrap`] and [`unwrap`] convert between the two.
///
/// [`wrap`]: #method.wrap
/// [`unwrap`]: #method.unwrap
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SeqNumber(pub u32);

impl SeqNumber {
    /// Wrap an absolute sequence number into the sequence space starting at `isn`.
    pub fn wrap(absolute: u64, isn: SeqNumber) -> SeqNumber {
        SeqNumber((absolute as u32).wrapping_add(isn.0))
    }

    /// Recover the absolute sequence number that wraps to `self` and is closest to `checkpoint`.
    ///
    /// All absolute values congruent to `self - isn` modulo 2<sup>32</sup> are candidates. When
    /// two candidates are exactly equally far from the checkpoint the smaller one is chosen.
    ///
    /// ```rust
    /// # use tern::wire::TcpSeqNumber as SeqNumber;
    /// let isn = SeqNumber(u32::max_value());
    /// let wrapped = SeqNumber::wrap(3 << 32 | 17, isn);
    /// assert_eq!(wrapped.unwrap(isn, 3 << 32), 3 << 32 | 17);
    /// assert_eq!(wrapped.unwrap(isn, 0), 17);
    /// ```
    pub fn unwrap(self, isn: SeqNumber, checkpoint: u64) -> u64 {
        const CYCLE: u64 = 1 << 32;
        let offset = u64::from(self.0.wrapping_sub(isn.0));
        let candidate = (checkpoint & !(CYCLE - 1)) | offset;
        let distance = |value: &u64| if *value > checkpoint {
            value - checkpoint
        } else {
            checkpoint - value
        };

        // Ascending order, the first minimum wins ties.
        [candidate.checked_sub(CYCLE), Some(candidate), candidate.checked_add(CYCLE)]
            .iter()
            .filter_map(|value| *value)
            .min_by_key(distance)
            .unwrap_or(candidate)
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ops::Add<u32> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: u32) -> SeqNumber {
        SeqNumber(self.0.wrapping_add(rhs))
    }
}

impl ops::Sub<u32> for SeqNumber {
    type Output = SeqNumber;

    fn sub(self, rhs: u32) -> SeqNumber {
        SeqNumber(self.0.wrapping_sub(rhs))
    }
}

impl ops::AddAssign<u32> for SeqNumber {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

impl ops::Sub for SeqNumber {
    type Output = u32;

    /// The forward distance from `rhs` to `self`, modulo 2<sup>32</sup>.
    fn sub(self, rhs: SeqNumber) -> u32 {
        self.0.wrapping_sub(rhs.0)
    }
}

/// A set of tcp flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags(pub u16);

byte_wrapper! {
    /// A byte sequence representing a TCP segment.
    #[derive(Debug, PartialEq, Eq)]
    pub struct tcp([u8]);
}

mod field {
    #![allow(non_snake_case)]

    use crate::wire::field::Field;

    pub(crate) const SRC_PORT: Field = 0..2;
    pub(crate) const DST_PORT: Field = 2..4;
    pub(crate) const SEQ_NUM:  Field = 4..8;
    pub(crate) const ACK_NUM:  Field = 8..12;
    pub(crate) const FLAGS:    Field = 12..14;
    pub(crate) const WIN_SIZE: Field = 14..16;
    pub(crate) const CHECKSUM: Field = 16..18;
    pub(crate) const URGENT:   Field = 18..20;

    pub(crate) const FLG_FIN: u16 = 0x001;
    pub(crate) const FLG_SYN: u16 = 0x002;
    pub(crate) const FLG_RST: u16 = 0x004;
    pub(crate) const FLG_PSH: u16 = 0x008;
    pub(crate) const FLG_ACK: u16 = 0x010;
}

impl tcp {
    /// Imbue a raw octet buffer with TCP packet structure.
    pub fn new_unchecked(data: &[u8]) -> &tcp {
        Self::__from_macro_new_unchecked(data)
    }

    /// Imbue a mutable octet buffer with TCP packet structure.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut tcp {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&tcp> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Unwrap the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that no header accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    /// Returns `Err(Error::Malformed)` if the header length field has a value smaller
    /// than the minimal header length.
    ///
    /// The result of this check is invalidated by calling [set_header_len_and_flags].
    ///
    /// [set_header_len_and_flags]: #method.set_header_len_and_flags
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < field::URGENT.end {
            Err(Error::Truncated)
        } else {
            let header_len = self.header_len() as usize;
            if len < header_len {
                Err(Error::Truncated)
            } else if header_len < field::URGENT.end {
                Err(Error::Malformed)
            } else {
                Ok(())
            }
        }
    }

    /// Return the source port field.
    #[inline]
    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::SRC_PORT])
    }

    /// Return the destination port field.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::DST_PORT])
    }

    /// Return the sequence number field.
    #[inline]
    pub fn seq_number(&self) -> SeqNumber {
        SeqNumber(NetworkEndian::read_u32(&self.0[field::SEQ_NUM]))
    }

    /// Return the acknowledgement number field.
    #[inline]
    pub fn ack_number(&self) -> SeqNumber {
        SeqNumber(NetworkEndian::read_u32(&self.0[field::ACK_NUM]))
    }

    /// Read all flags at once.
    pub fn flags(&self) -> Flags {
        Flags(NetworkEndian::read_u16(&self.0[field::FLAGS]) & 0x1ff)
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        ((raw >> 12) * 4) as u8
    }

    /// Return the window size field.
    #[inline]
    pub fn window_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::WIN_SIZE])
    }

    /// Return the checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Validate the packet checksum against the IPv4 pseudo header.
    pub fn verify_checksum(&self, src_addr: Ipv4Address, dst_addr: Ipv4Address) -> bool {
        checksum::combine(&[
            checksum::pseudo_header(src_addr, dst_addr, IpProtocol::Tcp, self.0.len() as u32),
            checksum::data(&self.0),
        ]) == !0
    }

    /// Return the payload after the header and options.
    pub fn payload_slice(&self) -> &[u8] {
        let header_len = self.header_len() as usize;
        &self.0[header_len..]
    }

    /// Set the source port field.
    #[inline]
    pub fn set_src_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::SRC_PORT], value)
    }

    /// Set the destination port field.
    #[inline]
    pub fn set_dst_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::DST_PORT], value)
    }

    /// Set the sequence number field.
    #[inline]
    pub fn set_seq_number(&mut self, value: SeqNumber) {
        NetworkEndian::write_u32(&mut self.0[field::SEQ_NUM], value.0)
    }

    /// Set the acknowledgement number field.
    #[inline]
    pub fn set_ack_number(&mut self, value: SeqNumber) {
        NetworkEndian::write_u32(&mut self.0[field::ACK_NUM], value.0)
    }

    /// Set the header length and flags at once, they share a field.
    pub fn set_header_len_and_flags(&mut self, header_len: u8, flags: Flags) {
        let raw = (u16::from(header_len / 4) << 12) | (flags.0 & 0x1ff);
        NetworkEndian::write_u16(&mut self.0[field::FLAGS], raw)
    }

    /// Set the window size field.
    #[inline]
    pub fn set_window_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::WIN_SIZE], value)
    }

    /// Set the checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Set the urgent pointer field.
    #[inline]
    pub fn set_urgent_at(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::URGENT], value)
    }

    /// Compute and fill in the checksum over the whole segment.
    pub fn fill_checksum(&mut self, src_addr: Ipv4Address, dst_addr: Ipv4Address) {
        self.set_checksum(0);
        let checksum = !checksum::combine(&[
            checksum::pseudo_header(src_addr, dst_addr, IpProtocol::Tcp, self.0.len() as u32),
            checksum::data(&self.0),
        ]);
        self.set_checksum(checksum)
    }

    /// Return the payload as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let header_len = self.header_len() as usize;
        &mut self.0[header_len..]
    }
}

impl AsRef<[u8]> for tcp {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Flags {
    /// Return the FIN flag.
    #[inline]
    pub fn fin(&self) -> bool {
        self.0 & field::FLG_FIN != 0
    }

    /// Return the SYN flag.
    #[inline]
    pub fn syn(&self) -> bool {
        self.0 & field::FLG_SYN != 0
    }

    /// Return the RST flag.
    #[inline]
    pub fn rst(&self) -> bool {
        self.0 & field::FLG_RST != 0
    }

    /// Return the PSH flag.
    #[inline]
    pub fn psh(&self) -> bool {
        self.0 & field::FLG_PSH != 0
    }

    /// Return the ACK flag.
    #[inline]
    pub fn ack(&self) -> bool {
        self.0 & field::FLG_ACK != 0
    }

    /// Set the FIN flag.
    #[inline]
    pub fn set_fin(&mut self, value: bool) {
        self.set(field::FLG_FIN, value)
    }

    /// Set the SYN flag.
    #[inline]
    pub fn set_syn(&mut self, value: bool) {
        self.set(field::FLG_SYN, value)
    }

    /// Set the RST flag.
    #[inline]
    pub fn set_rst(&mut self, value: bool) {
        self.set(field::FLG_RST, value)
    }

    /// Set the PSH flag.
    #[inline]
    pub fn set_psh(&mut self, value: bool) {
        self.set(field::FLG_PSH, value)
    }

    /// Set the ACK flag.
    #[inline]
    pub fn set_ack(&mut self, value: bool) {
        self.set(field::FLG_ACK, value)
    }

    /// The length of the control flags in sequence space.
    pub fn sequence_len(self) -> u32 {
        u32::from(self.syn()) + u32::from(self.fin())
    }

    fn set(&mut self, mask: u16, value: bool) {
        let flag = if value { mask } else { 0 };
        let without = self.0 & !mask;
        self.0 = without | flag;
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (self.syn(), "SYN"), (self.fin(), "FIN"), (self.rst(), "RST"),
            (self.psh(), "PSH"), (self.ack(), "ACK"),
        ];
        let mut first = true;
        for (set, name) in names.iter() {
            if !*set {
                continue;
            }
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// A high-level representation of a Transmission Control Protocol header.
///
/// The ACK flag is not part of `flags`. It is set exactly when `ack_number` is present.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Repr {
    /// The source port.
    pub src_port:     u16,
    /// The destination port.
    pub dst_port:     u16,
    /// The control flags other than ACK.
    pub flags:        Flags,
    /// The sequence number of the first octet in sequence space.
    pub seq_number:   SeqNumber,
    /// The acknowledged sequence number, if the ACK flag is set.
    pub ack_number:   Option<SeqNumber>,
    /// The advertised receive window.
    pub window_len:   u16,
}

impl Repr {
    /// Parse a Transmission Control Protocol packet and return a high-level representation.
    ///
    /// Options are skipped. The checksum is validated against the pseudo header built from the
    /// given addresses unless `checksum` is `Ignored`.
    pub fn parse(
        packet: &tcp,
        src_addr: Ipv4Address,
        dst_addr: Ipv4Address,
        checksum: Checksum,
    ) -> Result<Repr> {
        packet.check_len()?;
        // Source and destination ports must be present.
        if packet.src_port() == 0 { return Err(Error::Malformed) }
        if packet.dst_port() == 0 { return Err(Error::Malformed) }
        // Valid checksum is expected.
        if checksum.manual() && !packet.verify_checksum(src_addr, dst_addr) {
            return Err(Error::WrongChecksum)
        }

        let mut flags = packet.flags();
        let ack_number = if flags.ack() {
            Some(packet.ack_number())
        } else {
            None
        };
        flags.set_ack(false);

        Ok(Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            flags,
            seq_number: packet.seq_number(),
            ack_number,
            window_len: packet.window_len(),
        })
    }

    /// Return the length of a header that will be emitted from this high-level representation.
    pub fn header_len(&self) -> usize {
        // We never emit any options.
        field::URGENT.end
    }

    /// Emit a high-level representation into a Transmission Control Protocol packet.
    ///
    /// The checksum is not filled, the payload must be written first.
    pub fn emit(&self, packet: &mut tcp) {
        let mut flags = self.flags;
        flags.set_ack(self.ack_number.is_some());
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_seq_number(self.seq_number);
        packet.set_ack_number(self.ack_number.unwrap_or_default());
        packet.set_header_len_and_flags(self.header_len() as u8, flags);
        packet.set_window_len(self.window_len);
        packet.set_checksum(0);
        packet.set_urgent_at(0);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TCP src={} dst={} seq={}",
               self.src_port, self.dst_port, self.seq_number)?;
        if let Some(ack_number) = self.ack_number {
            write!(f, " ack={}", ack_number)?;
        }
        write!(f, " win={} [{}]", self.window_len, self.flags)
    }
}

/// An owned TCP segment: a parsed header and its payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// The segment header.
    pub header: Repr,
    /// The data carried by the segment.
    pub payload: Vec<u8>,
}

impl Segment {
    /// The number of sequence numbers the segment occupies.
    ///
    /// That is the payload length plus one for each of SYN and FIN.
    pub fn length_in_sequence_space(&self) -> u64 {
        self.payload.len() as u64 + u64::from(self.header.flags.sequence_len())
    }

    /// Parse a segment that was carried from `src_addr` to `dst_addr`.
    pub fn parse(
        data: &[u8],
        src_addr: Ipv4Address,
        dst_addr: Ipv4Address,
        checksum: Checksum,
    ) -> Result<Self> {
        let packet = tcp::new_checked(data)?;
        let header = Repr::parse(packet, src_addr, dst_addr, checksum)?;
        Ok(Segment {
            header,
            payload: packet.payload_slice().to_vec(),
        })
    }

    /// Serialize the segment, with a checksum for the given addresses.
    ///
    /// # Panics
    /// This function panics if the segment exceeds the 65535 octets the length of the checksum
    /// pseudo header can describe.
    pub fn serialize(&self, src_addr: Ipv4Address, dst_addr: Ipv4Address) -> Vec<u8> {
        let header_len = self.header.header_len();
        assert!(header_len + self.payload.len() <= usize::from(u16::max_value()),
            "segment of {} octets exceeds the pseudo header length", header_len + self.payload.len());
        let mut buffer = vec![0; header_len + self.payload.len()];
        let packet = tcp::new_unchecked_mut(&mut buffer);
        self.header.emit(packet);
        packet.payload_mut_slice().copy_from_slice(&self.payload);
        packet.fill_checksum(src_addr, dst_addr);
        buffer
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} len={}", self.header, self.payload.len())
    }
}
