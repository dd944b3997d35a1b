use crate::{Error, Result};

/// Progress of the three-step exchange, shared by both roles.
///
/// The initiator moves VersionSent on C0+C1 out, AckSent on C2 out, Done
/// once S2 is read. The responder moves VersionSent on S0+S1+S2 out,
/// AckSent is skipped (its ack rides with S2), Done once C2 validates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandshakeState {
    Uninitialized,
    VersionSent,
    AckSent,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub enum HandshakeEvent {
    SentVersion,
    SentAck,
    PeerAckValidated,
    Error,
}

impl HandshakeState {
    pub fn new() -> Self {
        HandshakeState::Uninitialized
    }

    pub fn is_done(&self) -> bool {
        *self == HandshakeState::Done
    }

    pub fn transition(&mut self, event: HandshakeEvent) -> Result<()> {
        match (*self, event) {
            (HandshakeState::Uninitialized, HandshakeEvent::SentVersion) => {
                *self = HandshakeState::VersionSent;
                Ok(())
            }
            (HandshakeState::VersionSent, HandshakeEvent::SentAck) => {
                *self = HandshakeState::AckSent;
                Ok(())
            }
            (HandshakeState::VersionSent, HandshakeEvent::PeerAckValidated)
            | (HandshakeState::AckSent, HandshakeEvent::PeerAckValidated) => {
                *self = HandshakeState::Done;
                Ok(())
            }
            (_, HandshakeEvent::Error) => {
                *self = HandshakeState::Failed;
                Err(Error::handshake("Handshake failed"))
            }
            _ => Err(Error::handshake(format!(
                "Invalid handshake transition from {:?} on {:?}",
                self, event
            ))),
        }
    }
}

impl Default for HandshakeState {
    fn default() -> Self {
        Self::new()
    }
}
