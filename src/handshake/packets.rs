use crate::utils::{current_timestamp, generate_random_bytes};
use crate::{ByteBuffer, Error, Result};

/// RTMP version byte exchanged as C0/S0
pub const RTMP_VERSION: u8 = 3;

/// Size of C1/S1/C2/S2
pub const HANDSHAKE_SIZE: usize = 1536;

/// Random payload size (packet minus the two leading u32 fields)
pub const RANDOM_SIZE: usize = HANDSHAKE_SIZE - 8;

/// One 1536-byte handshake packet.
///
/// C1/S1 carry a fresh timestamp and random payload; C2/S2 echo the
/// peer's packet with the read time in the second field.
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub timestamp: u32,
    pub time2: u32,
    pub random: Vec<u8>,
}

impl HandshakePacket {
    /// Fresh C1/S1 packet stamped with the sender's epoch
    pub fn fresh(epoch: u32) -> Self {
        HandshakePacket {
            timestamp: epoch,
            time2: 0,
            random: generate_random_bytes(RANDOM_SIZE),
        }
    }

    /// C2/S2 echo of a received packet
    pub fn echo(&self) -> Self {
        HandshakePacket {
            timestamp: self.timestamp,
            time2: current_timestamp(),
            random: self.random.clone(),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HANDSHAKE_SIZE {
            return Err(Error::handshake(format!(
                "Handshake packet too short: {} bytes, expected {}",
                data.len(),
                HANDSHAKE_SIZE
            )));
        }

        let mut buffer = ByteBuffer::new(data[..HANDSHAKE_SIZE].to_vec());
        let timestamp = buffer.read_u32_be()?;
        let time2 = buffer.read_u32_be()?;
        let random = buffer.read_bytes(RANDOM_SIZE)?;

        Ok(HandshakePacket {
            timestamp,
            time2,
            random,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(HANDSHAKE_SIZE);
        buffer.write_u32_be(self.timestamp);
        buffer.write_u32_be(self.time2);
        buffer.write_bytes(&self.random);
        buffer.into_vec()
    }

    /// Whether `other` echoes this packet's timestamp and random payload
    pub fn matches_echo(&self, other: &HandshakePacket) -> bool {
        self.timestamp == other.timestamp && self.random == other.random
    }
}
