use crate::protocol::constants::*;

/// Full message header as carried by a type-0 chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtmpHeader {
    pub timestamp: u32,
    pub message_length: u32,
    pub message_type: u8,
    pub message_stream_id: u32,
    pub chunk_stream_id: u32,
}

impl RtmpHeader {
    pub fn new(
        timestamp: u32,
        message_length: u32,
        message_type: u8,
        message_stream_id: u32,
        chunk_stream_id: u32,
    ) -> Self {
        RtmpHeader {
            timestamp,
            message_length,
            message_type,
            message_stream_id,
            chunk_stream_id,
        }
    }

    /// Header for a protocol control message (chunk lane 2, stream 0)
    pub fn protocol_control(message_type: u8, length: u32) -> Self {
        RtmpHeader::new(0, length, message_type, 0, CHUNK_STREAM_PROTOCOL)
    }

    pub fn command(timestamp: u32, length: u32, stream_id: u32) -> Self {
        RtmpHeader::new(
            timestamp,
            length,
            MSG_TYPE_COMMAND_AMF0,
            stream_id,
            CHUNK_STREAM_COMMAND,
        )
    }

    pub fn data(timestamp: u32, length: u32, stream_id: u32) -> Self {
        RtmpHeader::new(
            timestamp,
            length,
            MSG_TYPE_DATA_AMF0,
            stream_id,
            CHUNK_STREAM_DATA,
        )
    }

    pub fn audio(timestamp: u32, length: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, length, MSG_TYPE_AUDIO, stream_id, CHUNK_STREAM_AUDIO)
    }

    pub fn video(timestamp: u32, length: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, length, MSG_TYPE_VIDEO, stream_id, CHUNK_STREAM_VIDEO)
    }

    /// Whether the timestamp overflows the 3-byte wire field
    pub fn has_extended_timestamp(&self) -> bool {
        self.timestamp >= EXTENDED_TIMESTAMP_SENTINEL
    }

    /// Value of the 3-byte wire field
    pub fn wire_timestamp(&self) -> u32 {
        if self.has_extended_timestamp() {
            EXTENDED_TIMESTAMP_SENTINEL
        } else {
            self.timestamp
        }
    }
}

/// One logical message: header plus fully reassembled payload
#[derive(Debug, Clone)]
pub struct RtmpPacket {
    pub header: RtmpHeader,
    pub payload: Vec<u8>,
}

impl RtmpPacket {
    pub fn new(header: RtmpHeader, payload: Vec<u8>) -> Self {
        RtmpPacket { header, payload }
    }

    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }

    pub fn message_stream_id(&self) -> u32 {
        self.header.message_stream_id
    }

    pub fn timestamp(&self) -> u32 {
        self.header.timestamp
    }

    pub fn is_audio(&self) -> bool {
        self.header.message_type == MSG_TYPE_AUDIO
    }

    pub fn is_video(&self) -> bool {
        self.header.message_type == MSG_TYPE_VIDEO
    }

    pub fn is_command(&self) -> bool {
        matches!(
            self.header.message_type,
            MSG_TYPE_COMMAND_AMF0 | MSG_TYPE_COMMAND_AMF3
        )
    }

    pub fn is_data(&self) -> bool {
        matches!(
            self.header.message_type,
            MSG_TYPE_DATA_AMF0 | MSG_TYPE_DATA_AMF3
        )
    }

    pub fn is_control(&self) -> bool {
        matches!(
            self.header.message_type,
            MSG_TYPE_SET_CHUNK_SIZE
                | MSG_TYPE_ABORT
                | MSG_TYPE_ACK
                | MSG_TYPE_WINDOW_ACK
                | MSG_TYPE_SET_PEER_BW
        )
    }
}
