use crate::{ByteBuffer, Error, Result};

/// User control events (message type 4): 2-byte event code + 4-byte
/// big-endian argument.
///
/// Ping (6) is the protocol heartbeat; the connection answers it with a
/// Pong (7) echoing the same argument, no application involvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserControl {
    StreamBegin(u32),
    StreamEof(u32),
    StreamDry(u32),
    SetBuffer { stream_id: u32, buffer_ms: u32 },
    StreamIsRecorded(u32),
    Ping(u32),
    Pong(u32),
    BufferEmpty(u32),
    BufferFull(u32),
    Unknown { event: u16, data: u32 },
}

mod events {
    pub const STREAM_BEGIN: u16 = 0;
    pub const STREAM_EOF: u16 = 1;
    pub const STREAM_DRY: u16 = 2;
    pub const SET_BUFFER: u16 = 3;
    pub const STREAM_IS_RECORDED: u16 = 4;
    pub const PING: u16 = 6;
    pub const PONG: u16 = 7;
    pub const BUFFER_EMPTY: u16 = 0x1F;
    pub const BUFFER_FULL: u16 = 0x20;
}

impl UserControl {
    pub fn event_code(&self) -> u16 {
        match self {
            UserControl::StreamBegin(_) => events::STREAM_BEGIN,
            UserControl::StreamEof(_) => events::STREAM_EOF,
            UserControl::StreamDry(_) => events::STREAM_DRY,
            UserControl::SetBuffer { .. } => events::SET_BUFFER,
            UserControl::StreamIsRecorded(_) => events::STREAM_IS_RECORDED,
            UserControl::Ping(_) => events::PING,
            UserControl::Pong(_) => events::PONG,
            UserControl::BufferEmpty(_) => events::BUFFER_EMPTY,
            UserControl::BufferFull(_) => events::BUFFER_FULL,
            UserControl::Unknown { event, .. } => *event,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(10);
        buffer.write_u16_be(self.event_code());
        match self {
            UserControl::StreamBegin(v)
            | UserControl::StreamEof(v)
            | UserControl::StreamDry(v)
            | UserControl::StreamIsRecorded(v)
            | UserControl::Ping(v)
            | UserControl::Pong(v)
            | UserControl::BufferEmpty(v)
            | UserControl::BufferFull(v)
            | UserControl::Unknown { data: v, .. } => buffer.write_u32_be(*v),
            UserControl::SetBuffer {
                stream_id,
                buffer_ms,
            } => {
                buffer.write_u32_be(*stream_id);
                buffer.write_u32_be(*buffer_ms);
            }
        }
        buffer.into_vec()
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        let event = buffer.read_u16_be()?;
        let data = buffer.read_u32_be()?;

        Ok(match event {
            events::STREAM_BEGIN => UserControl::StreamBegin(data),
            events::STREAM_EOF => UserControl::StreamEof(data),
            events::STREAM_DRY => UserControl::StreamDry(data),
            events::SET_BUFFER => UserControl::SetBuffer {
                stream_id: data,
                buffer_ms: buffer
                    .read_u32_be()
                    .map_err(|_| Error::protocol("SetBuffer missing buffer length"))?,
            },
            events::STREAM_IS_RECORDED => UserControl::StreamIsRecorded(data),
            events::PING => UserControl::Ping(data),
            events::PONG => UserControl::Pong(data),
            events::BUFFER_EMPTY => UserControl::BufferEmpty(data),
            events::BUFFER_FULL => UserControl::BufferFull(data),
            event => UserControl::Unknown { event, data },
        })
    }
}
