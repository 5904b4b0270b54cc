//! Summaries of the connection state.
//!
//! Neither half of a connection keeps an explicit state variable. Instead, the state is derived
//! from the streams and counters on demand. This makes the summary impossible to get out of sync
//! with the data it describes.

/// The state of the sending half.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SenderState {
    /// The outbound stream errored.
    Error,
    /// Nothing was sent yet, not even the SYN.
    Closed,
    /// The SYN is the only thing in flight.
    SynSent,
    /// The SYN was acknowledged and the stream is still open for sending.
    SynAcked,
    /// The FIN was sent but is not yet acknowledged.
    FinSent,
    /// Everything including the FIN was acknowledged.
    FinAcked,
}

/// The state of the receiving half.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReceiverState {
    /// The inbound stream errored.
    Error,
    /// Waiting for a SYN.
    Listen,
    /// The SYN arrived, the stream is still open.
    SynReceived,
    /// Every octet up to and including the FIN has been assembled.
    FinReceived,
}

/// The well known states of a TCP connection.
///
/// See RFC 793, section 3.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Waiting for a connection request.
    Listen,
    /// Received a SYN and answered it with our own.
    SynReceived,
    /// Sent a SYN and waiting for the answer.
    SynSent,
    /// Both SYNs were exchanged.
    Established,
    /// The remote closed its stream, ours is still open.
    CloseWait,
    /// Both closed, the remote first, and our FIN is not yet acknowledged.
    LastAck,
    /// We closed our stream first and our FIN is not yet acknowledged.
    FinWait1,
    /// We closed our stream first and our FIN was acknowledged.
    FinWait2,
    /// Both sides closed simultaneously.
    Closing,
    /// Both closed and acknowledged, lingering for any late retransmission of the remote.
    TimeWait,
    /// The connection ended cleanly.
    Closed,
    /// The connection was aborted.
    Reset,
}

impl State {
    /// Derive the connection state from its parts.
    ///
    /// Returns `None` for combinations that have no name in the standard state diagram, which may
    /// occur transiently while a segment is being processed.
    pub fn from_parts(
        sender: SenderState,
        receiver: ReceiverState,
        active: bool,
        linger: bool,
    ) -> Option<State> {
        use self::ReceiverState as R;
        use self::SenderState as S;

        Some(match (receiver, sender) {
            (R::Error, S::Error) if !active => State::Reset,
            (R::Listen, S::Closed) if active => State::Listen,
            (R::SynReceived, S::SynSent) => State::SynReceived,
            (R::Listen, S::SynSent) => State::SynSent,
            (R::SynReceived, S::SynAcked) => State::Established,
            (R::FinReceived, S::SynAcked) if !linger => State::CloseWait,
            (R::FinReceived, S::FinSent) if !linger => State::LastAck,
            (R::FinReceived, S::FinSent) => State::Closing,
            (R::SynReceived, S::FinSent) => State::FinWait1,
            (R::SynReceived, S::FinAcked) => State::FinWait2,
            (R::FinReceived, S::FinAcked) if !active => State::Closed,
            (R::FinReceived, S::FinAcked) if linger => State::TimeWait,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handshake_states() {
        assert_eq!(
            State::from_parts(SenderState::Closed, ReceiverState::Listen, true, true),
            Some(State::Listen));
        assert_eq!(
            State::from_parts(SenderState::SynSent, ReceiverState::Listen, true, true),
            Some(State::SynSent));
        assert_eq!(
            State::from_parts(SenderState::SynAcked, ReceiverState::SynReceived, true, true),
            Some(State::Established));
    }

    #[test]
    fn closing_states() {
        assert_eq!(
            State::from_parts(SenderState::SynAcked, ReceiverState::FinReceived, true, false),
            Some(State::CloseWait));
        assert_eq!(
            State::from_parts(SenderState::FinSent, ReceiverState::FinReceived, true, false),
            Some(State::LastAck));
        assert_eq!(
            State::from_parts(SenderState::FinSent, ReceiverState::FinReceived, true, true),
            Some(State::Closing));
        assert_eq!(
            State::from_parts(SenderState::FinAcked, ReceiverState::FinReceived, true, true),
            Some(State::TimeWait));
        assert_eq!(
            State::from_parts(SenderState::FinAcked, ReceiverState::FinReceived, false, false),
            Some(State::Closed));
        assert_eq!(
            State::from_parts(SenderState::Error, ReceiverState::Error, false, false),
            Some(State::Reset));
    }

    #[test]
    fn unnamed_combination() {
        assert_eq!(
            State::from_parts(SenderState::FinAcked, ReceiverState::Listen, true, true),
            None);
    }
}
