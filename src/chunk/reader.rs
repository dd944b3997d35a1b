use crate::chunk::stream::ChunkStreamContext;
use crate::chunk::{parse_basic_header, BasicHeader};
use crate::protocol::{RtmpHeader, RtmpPacket, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP_SENTINEL};
use crate::{Error, Result};
use log::trace;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Inbound half of the multiplexer: reassembles interleaved chunk
/// lanes back into logical messages.
pub struct ChunkReader {
    lanes: HashMap<u32, ChunkStreamContext>,
    chunk_size_in: usize,
}

impl ChunkReader {
    pub fn new() -> Self {
        ChunkReader {
            lanes: HashMap::new(),
            chunk_size_in: DEFAULT_CHUNK_SIZE as usize,
        }
    }

    /// Apply a received SetChunkSize; values below 1 never occur on the
    /// wire (0 is rejected upstream as a protocol error)
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size_in = size.max(1);
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_in
    }

    /// Apply a received Abort: drop the lane's partial message
    pub fn abort(&mut self, cs_id: u32) {
        if let Some(lane) = self.lanes.get_mut(&cs_id) {
            lane.abort();
        }
    }

    /// Read exactly one chunk; returns a packet when it completes a
    /// message
    pub async fn read_chunk<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<RtmpPacket>> {
        let mut head = [0u8; 3];
        reader
            .read_exact(&mut head[..1])
            .await
            .map_err(|e| Error::chunk(format!("Failed to read basic header: {}", e)))?;
        // Selectors 0 and 1 pull in the extended forms
        let len = match head[0] & 0x3F {
            0 => 2,
            1 => 3,
            _ => 1,
        };
        reader.read_exact(&mut head[1..len]).await?;
        let (BasicHeader { fmt, cs_id }, _) = parse_basic_header(&head[..len])?;

        trace!("chunk fmt={} cs_id={}", fmt, cs_id);

        let prev_header = self.lanes.get(&cs_id).and_then(|lane| lane.prev_header);
        if fmt != 0 && prev_header.is_none() {
            // No resynchronization after a corrupted lane
            return Err(Error::chunk(format!(
                "Type-{} chunk on lane {} with no type-0 history",
                fmt, cs_id
            )));
        }

        match fmt {
            0 => {
                let mut bytes = [0u8; 11];
                reader.read_exact(&mut bytes).await?;

                let wire_ts = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
                let message_length = u32::from_be_bytes([0, bytes[3], bytes[4], bytes[5]]);
                let message_type = bytes[6];
                // The one little-endian field in the protocol
                let message_stream_id =
                    u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]);

                let extended = wire_ts == EXTENDED_TIMESTAMP_SENTINEL;
                let timestamp = if extended {
                    self.read_extended_timestamp(reader).await?
                } else {
                    wire_ts
                };

                let header = RtmpHeader::new(
                    timestamp,
                    message_length,
                    message_type,
                    message_stream_id,
                    cs_id,
                );
                // An absolute timestamp doubles as the delta a
                // header-less repeat applies
                self.lane(cs_id).start_message(header, timestamp, extended);
            }
            1 => {
                let mut bytes = [0u8; 7];
                reader.read_exact(&mut bytes).await?;

                let wire_delta = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
                let message_length = u32::from_be_bytes([0, bytes[3], bytes[4], bytes[5]]);
                let message_type = bytes[6];

                let extended = wire_delta == EXTENDED_TIMESTAMP_SENTINEL;
                let delta = if extended {
                    self.read_extended_timestamp(reader).await?
                } else {
                    wire_delta
                };

                let prev = prev_header.ok_or_else(|| Error::chunk("Missing previous header"))?;
                let header = RtmpHeader::new(
                    prev.timestamp.wrapping_add(delta),
                    message_length,
                    message_type,
                    prev.message_stream_id,
                    cs_id,
                );
                self.lane(cs_id).start_message(header, delta, extended);
            }
            2 => {
                let mut bytes = [0u8; 3];
                reader.read_exact(&mut bytes).await?;

                let wire_delta = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
                let extended = wire_delta == EXTENDED_TIMESTAMP_SENTINEL;
                let delta = if extended {
                    self.read_extended_timestamp(reader).await?
                } else {
                    wire_delta
                };

                let prev = prev_header.ok_or_else(|| Error::chunk("Missing previous header"))?;
                let header = RtmpHeader::new(
                    prev.timestamp.wrapping_add(delta),
                    prev.message_length,
                    prev.message_type,
                    prev.message_stream_id,
                    cs_id,
                );
                self.lane(cs_id).start_message(header, delta, extended);
            }
            3 => {
                let extended = self
                    .lanes
                    .get(&cs_id)
                    .map(|lane| lane.extended)
                    .unwrap_or(false);
                // The sentinel commits every following header-less
                // chunk on the lane to carrying the 4 extra bytes
                if extended {
                    self.read_extended_timestamp(reader).await?;
                }

                let lane = self.lane(cs_id);
                if !lane.is_assembling() {
                    let prev =
                        prev_header.ok_or_else(|| Error::chunk("Missing previous header"))?;
                    let delta = lane.last_delta;
                    let header = RtmpHeader::new(
                        prev.timestamp.wrapping_add(delta),
                        prev.message_length,
                        prev.message_type,
                        prev.message_stream_id,
                        cs_id,
                    );
                    lane.start_message(header, delta, extended);
                }
            }
            _ => unreachable!("fmt is two bits"),
        }

        let lane = self.lane(cs_id);
        let take = lane.bytes_remaining.min(self.chunk_size_in);
        let mut data = vec![0u8; take];
        reader
            .read_exact(&mut data)
            .await
            .map_err(|e| Error::chunk(format!("Failed to read chunk payload: {}", e)))?;

        Ok(self.lane(cs_id).append(&data))
    }

    async fn read_extended_timestamp<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<u32> {
        let mut bytes = [0u8; 4];
        reader
            .read_exact(&mut bytes)
            .await
            .map_err(|e| Error::chunk(format!("Failed to read extended timestamp: {}", e)))?;
        Ok(u32::from_be_bytes(bytes))
    }

    fn lane(&mut self, cs_id: u32) -> &mut ChunkStreamContext {
        self.lanes.entry(cs_id).or_default()
    }
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MSG_TYPE_AUDIO, MSG_TYPE_COMMAND_AMF0, MSG_TYPE_VIDEO};

    fn type0_chunk(cs_id: u8, timestamp: u32, msg_type: u8, stream_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![cs_id];
        bytes.extend_from_slice(&timestamp.to_be_bytes()[1..]);
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        bytes.push(msg_type);
        bytes.extend_from_slice(&stream_id.to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[tokio::test]
    async fn test_single_chunk_message() {
        let bytes = type0_chunk(3, 1000, MSG_TYPE_COMMAND_AMF0, 0, &[1, 2, 3, 4]);
        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];

        let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(packet.header.timestamp, 1000);
        assert_eq!(packet.header.message_stream_id, 0);
        assert_eq!(packet.payload, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_message_split_across_type3_chunks() {
        let payload: Vec<u8> = (0..200).map(|i| i as u8).collect();
        let mut bytes = Vec::new();
        // First 128 bytes under the full header
        let mut header = type0_chunk(4, 0, MSG_TYPE_AUDIO, 1, &[]);
        // Fix up declared length to the full 200
        header[4..7].copy_from_slice(&(200u32.to_be_bytes())[1..]);
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&payload[..128]);
        // Continuation: type-3 basic header then the rest
        bytes.push((3 << 6) | 4);
        bytes.extend_from_slice(&payload[128..]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];

        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());
        let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(packet.payload, payload);
    }

    #[tokio::test]
    async fn test_orphan_continuation_is_fatal() {
        let bytes = [(3u8 << 6) | 5];
        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        assert!(matches!(
            reader.read_chunk(&mut input).await,
            Err(Error::Chunk(_))
        ));
    }

    #[tokio::test]
    async fn test_extended_timestamp_on_full_header() {
        let timestamp: u32 = 0x0100_0000;
        let mut bytes = vec![3u8];
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        bytes.extend_from_slice(&2u32.to_be_bytes()[1..]);
        bytes.push(MSG_TYPE_AUDIO);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&[9, 9]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(packet.header.timestamp, timestamp);
        assert_eq!(packet.payload, vec![9, 9]);
    }

    #[tokio::test]
    async fn test_type3_repeat_advances_by_last_delta() {
        let mut bytes = type0_chunk(3, 100, MSG_TYPE_AUDIO, 1, &[7]);
        // Type-2 header: delta 50, everything else reused
        bytes.push((2 << 6) | 3);
        bytes.extend_from_slice(&50u32.to_be_bytes()[1..]);
        bytes.push(7);
        // Header-less repeat applies the same delta again
        bytes.push((3 << 6) | 3);
        bytes.push(7);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        let first = reader.read_chunk(&mut input).await.unwrap().unwrap();
        let second = reader.read_chunk(&mut input).await.unwrap().unwrap();
        let third = reader.read_chunk(&mut input).await.unwrap().unwrap();

        assert_eq!(first.header.timestamp, 100);
        assert_eq!(second.header.timestamp, 150);
        assert_eq!(third.header.timestamp, 200);
    }

    #[tokio::test]
    async fn test_interleaved_lanes_assemble_independently() {
        let mut audio = type0_chunk(4, 0, MSG_TYPE_AUDIO, 1, &[]);
        audio[4..7].copy_from_slice(&130u32.to_be_bytes()[1..]);
        let mut bytes = audio;
        bytes.extend_from_slice(&[0xAA; 128]);
        // A command on another lane lands between the audio chunks
        bytes.extend_from_slice(&type0_chunk(3, 0, MSG_TYPE_COMMAND_AMF0, 0, &[1]));
        bytes.push((3 << 6) | 4);
        bytes.extend_from_slice(&[0xBB; 2]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];

        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());
        let command = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(command.header.message_type, MSG_TYPE_COMMAND_AMF0);
        let audio = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(audio.payload.len(), 130);
        assert_eq!(audio.payload[129], 0xBB);
    }

    #[tokio::test]
    async fn test_mid_stream_chunk_size_governs_all_lanes() {
        let audio: Vec<u8> = (0..300).map(|i| i as u8).collect();
        let video: Vec<u8> = (0..300).map(|i| (i as u8).wrapping_mul(3)).collect();

        // Both lanes open under the 128-byte default
        let mut bytes = Vec::new();
        let mut header = type0_chunk(4, 0, MSG_TYPE_AUDIO, 1, &[]);
        header[4..7].copy_from_slice(&300u32.to_be_bytes()[1..]);
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&audio[..128]);
        let mut header = type0_chunk(5, 0, MSG_TYPE_VIDEO, 1, &[]);
        header[4..7].copy_from_slice(&300u32.to_be_bytes()[1..]);
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&video[..128]);
        // After renegotiation a single continuation finishes each lane
        bytes.push((3 << 6) | 4);
        bytes.extend_from_slice(&audio[128..]);
        bytes.push((3 << 6) | 5);
        bytes.extend_from_slice(&video[128..]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());
        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());

        reader.set_chunk_size(4096);
        let first = reader.read_chunk(&mut input).await.unwrap().unwrap();
        let second = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(first.payload, audio);
        assert_eq!(second.payload, video);
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn test_abort_discards_partial_message() {
        let mut header = type0_chunk(4, 0, MSG_TYPE_AUDIO, 1, &[]);
        header[4..7].copy_from_slice(&200u32.to_be_bytes()[1..]);
        let mut bytes = header;
        bytes.extend_from_slice(&[1; 128]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());

        reader.abort(4);
        assert!(!reader.lanes.get(&4).unwrap().is_assembling());
    }
}
