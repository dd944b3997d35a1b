mod aggregate;
mod control;
mod types;
mod user_control;

pub use aggregate::*;
pub use control::*;
pub use types::*;
pub use user_control::*;

use crate::amf::ObjectEncoding;
use crate::protocol::*;
use crate::{Error, Result};

/// Typed view of a reassembled packet: every variant owns symmetric
/// encode/decode
#[derive(Debug, Clone)]
pub enum RtmpMessage {
    Control(ControlMessage),
    UserControl(UserControl),
    Command(RtmpCommand),
    Data(RtmpData),
    /// Opaque audio payload; the leading codec tag is left to the media
    /// collaborator
    Audio(Vec<u8>),
    /// Opaque video payload
    Video(Vec<u8>),
    /// Sub-messages of an aggregate, already re-based
    Aggregate(Vec<RtmpPacket>),
    /// Shared object and unrecognized types pass through untyped
    Unknown(RtmpPacket),
}

impl RtmpMessage {
    pub fn decode(packet: &RtmpPacket) -> Result<RtmpMessage> {
        match MessageType::from_id(packet.message_type()) {
            MessageType::Control(_) => Ok(RtmpMessage::Control(ControlMessage::decode(
                packet.message_type(),
                &packet.payload,
            )?)),
            MessageType::UserControl => {
                Ok(RtmpMessage::UserControl(UserControl::decode(&packet.payload)?))
            }
            MessageType::Command => Ok(RtmpMessage::Command(RtmpCommand::decode(
                &packet.payload,
                packet.message_type(),
            )?)),
            MessageType::Data => Ok(RtmpMessage::Data(RtmpData::decode(
                &packet.payload,
                packet.message_type(),
            )?)),
            MessageType::Audio => Ok(RtmpMessage::Audio(packet.payload.clone())),
            MessageType::Video => Ok(RtmpMessage::Video(packet.payload.clone())),
            MessageType::Aggregate => Ok(RtmpMessage::Aggregate(split_aggregate(packet)?)),
            MessageType::SharedObject | MessageType::Unknown(_) => {
                Ok(RtmpMessage::Unknown(packet.clone()))
            }
        }
    }

    /// Build the wire packet for this message.
    ///
    /// Control and user-control messages always ride lane 2 / stream 0
    /// with timestamp 0; the other variants use the given timestamp and
    /// message stream id.
    pub fn into_packet(
        self,
        encoding: ObjectEncoding,
        timestamp: u32,
        message_stream_id: u32,
    ) -> Result<RtmpPacket> {
        match self {
            RtmpMessage::Control(control) => {
                let payload = control.encode();
                let header =
                    RtmpHeader::protocol_control(control.message_type(), payload.len() as u32);
                Ok(RtmpPacket::new(header, payload))
            }
            RtmpMessage::UserControl(event) => {
                let payload = event.encode();
                let header =
                    RtmpHeader::protocol_control(MSG_TYPE_USER_CONTROL, payload.len() as u32);
                Ok(RtmpPacket::new(header, payload))
            }
            RtmpMessage::Command(command) => {
                let payload = command.encode(encoding)?;
                let header = RtmpHeader::new(
                    timestamp,
                    payload.len() as u32,
                    RtmpCommand::message_type(encoding),
                    message_stream_id,
                    CHUNK_STREAM_COMMAND,
                );
                Ok(RtmpPacket::new(header, payload))
            }
            RtmpMessage::Data(data) => {
                let payload = data.encode(encoding)?;
                let header = RtmpHeader::new(
                    timestamp,
                    payload.len() as u32,
                    RtmpData::message_type(encoding),
                    message_stream_id,
                    CHUNK_STREAM_DATA,
                );
                Ok(RtmpPacket::new(header, payload))
            }
            RtmpMessage::Audio(payload) => {
                let header =
                    RtmpHeader::audio(timestamp, payload.len() as u32, message_stream_id);
                Ok(RtmpPacket::new(header, payload))
            }
            RtmpMessage::Video(payload) => {
                let header =
                    RtmpHeader::video(timestamp, payload.len() as u32, message_stream_id);
                Ok(RtmpPacket::new(header, payload))
            }
            RtmpMessage::Aggregate(_) => {
                Err(Error::protocol("Aggregate messages are receive-only"))
            }
            RtmpMessage::Unknown(packet) => Ok(packet),
        }
    }
}

/// Key frames tag the high nibble of the first video payload byte with 1
pub fn is_video_keyframe(payload: &[u8]) -> bool {
    payload.first().map(|byte| byte >> 4 == 1).unwrap_or(false)
}
