use crate::protocol::constants::*;
use crate::{ByteBuffer, Error, Result};
use log::warn;

/// SetPeerBandwidth limit discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthLimit {
    Hard,
    Soft,
    Dynamic,
}

impl BandwidthLimit {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => BandwidthLimit::Hard,
            1 => BandwidthLimit::Soft,
            2 => BandwidthLimit::Dynamic,
            other => {
                warn!("Unknown bandwidth limit type {}, treating as dynamic", other);
                BandwidthLimit::Dynamic
            }
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            BandwidthLimit::Hard => 0,
            BandwidthLimit::Soft => 1,
            BandwidthLimit::Dynamic => 2,
        }
    }
}

/// Protocol control messages: fixed 4-5 byte big-endian payloads on
/// chunk lane 2, message stream 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    SetChunkSize(u32),
    Abort(u32),
    Acknowledgement(u32),
    WindowAckSize(u32),
    SetPeerBandwidth(u32, BandwidthLimit),
}

impl ControlMessage {
    pub fn message_type(&self) -> u8 {
        match self {
            ControlMessage::SetChunkSize(_) => MSG_TYPE_SET_CHUNK_SIZE,
            ControlMessage::Abort(_) => MSG_TYPE_ABORT,
            ControlMessage::Acknowledgement(_) => MSG_TYPE_ACK,
            ControlMessage::WindowAckSize(_) => MSG_TYPE_WINDOW_ACK,
            ControlMessage::SetPeerBandwidth(_, _) => MSG_TYPE_SET_PEER_BW,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(5);
        match self {
            ControlMessage::SetChunkSize(size) => {
                // Top bit must be zero on the wire
                buffer.write_u32_be(size & 0x7FFF_FFFF);
            }
            ControlMessage::Abort(cs_id) => buffer.write_u32_be(*cs_id),
            ControlMessage::Acknowledgement(sequence) => buffer.write_u32_be(*sequence),
            ControlMessage::WindowAckSize(window) => buffer.write_u32_be(*window),
            ControlMessage::SetPeerBandwidth(window, limit) => {
                buffer.write_u32_be(*window);
                buffer.write_u8(limit.as_byte());
            }
        }
        buffer.into_vec()
    }

    pub fn decode(message_type: u8, payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        match message_type {
            MSG_TYPE_SET_CHUNK_SIZE => {
                let size = buffer.read_u32_be()? & 0x7FFF_FFFF;
                if size == 0 {
                    return Err(Error::protocol("SetChunkSize of 0"));
                }
                Ok(ControlMessage::SetChunkSize(size))
            }
            MSG_TYPE_ABORT => Ok(ControlMessage::Abort(buffer.read_u32_be()?)),
            MSG_TYPE_ACK => Ok(ControlMessage::Acknowledgement(buffer.read_u32_be()?)),
            MSG_TYPE_WINDOW_ACK => Ok(ControlMessage::WindowAckSize(buffer.read_u32_be()?)),
            MSG_TYPE_SET_PEER_BW => {
                let window = buffer.read_u32_be()?;
                let limit = BandwidthLimit::from_byte(buffer.read_u8()?);
                Ok(ControlMessage::SetPeerBandwidth(window, limit))
            }
            other => Err(Error::protocol(format!(
                "Not a control message type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips() {
        for message in [
            ControlMessage::SetChunkSize(4096),
            ControlMessage::Abort(4),
            ControlMessage::Acknowledgement(123456),
            ControlMessage::WindowAckSize(DEFAULT_WINDOW_SIZE),
            ControlMessage::SetPeerBandwidth(DEFAULT_WINDOW_SIZE, BandwidthLimit::Soft),
        ] {
            let bytes = message.encode();
            let decoded = ControlMessage::decode(message.message_type(), &bytes).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_set_peer_bandwidth_is_five_bytes() {
        let bytes = ControlMessage::SetPeerBandwidth(2_500_000, BandwidthLimit::Hard).encode();
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[4], 0);
    }

    #[test]
    fn test_zero_chunk_size_is_protocol_error() {
        let result = ControlMessage::decode(MSG_TYPE_SET_CHUNK_SIZE, &[0, 0, 0, 0]);
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_chunk_size_top_bit_masked() {
        let decoded =
            ControlMessage::decode(MSG_TYPE_SET_CHUNK_SIZE, &[0x80, 0x00, 0x10, 0x00]).unwrap();
        assert_eq!(decoded, ControlMessage::SetChunkSize(0x1000));
    }

    #[test]
    fn test_unknown_bandwidth_limit_degrades_to_dynamic() {
        let decoded =
            ControlMessage::decode(MSG_TYPE_SET_PEER_BW, &[0, 0, 0, 1, 9]).unwrap();
        assert_eq!(
            decoded,
            ControlMessage::SetPeerBandwidth(1, BandwidthLimit::Dynamic)
        );
    }

    #[test]
    fn test_truncated_payload_is_error() {
        assert!(ControlMessage::decode(MSG_TYPE_WINDOW_ACK, &[0, 0]).is_err());
    }
}
