/// Connection lifecycle.
///
/// The handshake phases map onto the initiator's sends: C0+C1 out moves
/// to HandshakeSent, C2 out to HandshakeAckSent, S2 in to HandshakeDone.
/// Logical "connected" (NetConnection.Connect.Success observed) is
/// tracked separately since it is an application-level fact, not a wire
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    HandshakeSent,
    HandshakeAckSent,
    HandshakeDone,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ConnectionState::Closing | ConnectionState::Closed)
    }

    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        match (*self, next) {
            (ConnectionState::Uninitialized, ConnectionState::HandshakeSent) => true,
            (ConnectionState::HandshakeSent, ConnectionState::HandshakeAckSent) => true,
            (ConnectionState::HandshakeSent, ConnectionState::HandshakeDone) => true,
            (ConnectionState::HandshakeAckSent, ConnectionState::HandshakeDone) => true,
            (_, ConnectionState::Closing) => true,
            (_, ConnectionState::Closed) => true,
            _ => false,
        }
    }
}
