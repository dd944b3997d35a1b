use crate::chunk::encode_basic_header;
use crate::protocol::{RtmpHeader, RtmpPacket, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP_SENTINEL};
use crate::{ByteBuffer, Error, Result};
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// What the peer will assume about the next chunk on a lane
#[derive(Debug, Clone, Copy)]
struct LaneMemory {
    header: RtmpHeader,
    delta: u32,
}

/// Outbound half of the multiplexer: splits logical messages into
/// chunks, compressing headers against per-lane memory.
pub struct ChunkWriter {
    lanes: HashMap<u32, LaneMemory>,
    chunk_size_out: usize,
}

impl ChunkWriter {
    pub fn new() -> Self {
        ChunkWriter {
            lanes: HashMap::new(),
            chunk_size_out: DEFAULT_CHUNK_SIZE as usize,
        }
    }

    /// Apply a sent SetChunkSize to the outbound direction
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size_out = size.max(1);
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_out
    }

    pub async fn write_packet<W: AsyncWrite + Unpin>(
        &mut self,
        packet: &RtmpPacket,
        writer: &mut W,
    ) -> Result<()> {
        let chunks = self.create_chunks(packet)?;
        writer
            .write_all(&chunks)
            .await
            .map_err(|e| Error::chunk(format!("Failed to write chunks: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::chunk(format!("Failed to flush chunks: {}", e)))?;
        Ok(())
    }

    /// Serialize one message into its chunk sequence
    pub fn create_chunks(&mut self, packet: &RtmpPacket) -> Result<Vec<u8>> {
        let cs_id = packet.header.chunk_stream_id;
        let (fmt, header_bytes, ext_value, delta) = self.message_header(packet);

        let payload = &packet.payload;
        let mut result = Vec::with_capacity(header_bytes.len() + payload.len() + 16);

        result.extend_from_slice(&encode_basic_header(fmt, cs_id)?);
        result.extend_from_slice(&header_bytes);

        let first = payload.len().min(self.chunk_size_out);
        result.extend_from_slice(&payload[..first]);

        let mut offset = first;
        while offset < payload.len() {
            result.extend_from_slice(&encode_basic_header(3, cs_id)?);
            // The sentinel commits continuation headers to repeating
            // the 4-byte timestamp field
            if let Some(value) = ext_value {
                result.extend_from_slice(&value.to_be_bytes());
            }
            let end = (offset + self.chunk_size_out).min(payload.len());
            result.extend_from_slice(&payload[offset..end]);
            offset = end;
        }

        self.lanes.insert(
            cs_id,
            LaneMemory {
                header: packet.header,
                delta,
            },
        );
        Ok(result)
    }

    /// Pick the cheapest header format the lane's memory permits.
    ///
    /// Returns (fmt, message header bytes, extended timestamp value if
    /// the sentinel is in effect, delta the peer will remember).
    fn message_header(&self, packet: &RtmpPacket) -> (u8, Vec<u8>, Option<u32>, u32) {
        let header = &packet.header;

        if let Some(memory) = self.lanes.get(&header.chunk_stream_id) {
            let prev = &memory.header;
            // Timestamps only move forward within a lane; anything else
            // needs an absolute header
            if header.message_stream_id == prev.message_stream_id
                && header.timestamp >= prev.timestamp
            {
                let delta = header.timestamp - prev.timestamp;
                let same_shape = header.message_type == prev.message_type
                    && header.message_length == prev.message_length;

                // A header-less chunk makes the peer re-apply the
                // lane's remembered delta, so it only fits when the
                // delta repeats exactly
                if same_shape && delta == memory.delta && delta < EXTENDED_TIMESTAMP_SENTINEL {
                    return (3, Vec::new(), None, delta);
                }
                if same_shape {
                    let (bytes, ext) = encode_type2_header(delta);
                    return (2, bytes, ext, delta);
                }
                let (bytes, ext) = encode_type1_header(delta, header);
                return (1, bytes, ext, delta);
            }
        }

        let (bytes, ext) = encode_type0_header(header);
        // An absolute timestamp doubles as the remembered delta
        (0, bytes, ext, header.timestamp)
    }
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_u24_or_sentinel(buffer: &mut ByteBuffer, value: u32) -> Option<u32> {
    if value >= EXTENDED_TIMESTAMP_SENTINEL {
        buffer.write_u24_be(EXTENDED_TIMESTAMP_SENTINEL);
        Some(value)
    } else {
        buffer.write_u24_be(value);
        None
    }
}

fn encode_type0_header(header: &RtmpHeader) -> (Vec<u8>, Option<u32>) {
    let mut buffer = ByteBuffer::with_capacity(15);
    let ext = write_u24_or_sentinel(&mut buffer, header.timestamp);
    buffer.write_u24_be(header.message_length);
    buffer.write_u8(header.message_type);
    buffer.write_u32_le(header.message_stream_id);
    if let Some(value) = ext {
        buffer.write_u32_be(value);
    }
    (buffer.into_vec(), ext)
}

fn encode_type1_header(delta: u32, header: &RtmpHeader) -> (Vec<u8>, Option<u32>) {
    let mut buffer = ByteBuffer::with_capacity(11);
    let ext = write_u24_or_sentinel(&mut buffer, delta);
    buffer.write_u24_be(header.message_length);
    buffer.write_u8(header.message_type);
    if let Some(value) = ext {
        buffer.write_u32_be(value);
    }
    (buffer.into_vec(), ext)
}

fn encode_type2_header(delta: u32) -> (Vec<u8>, Option<u32>) {
    let mut buffer = ByteBuffer::with_capacity(7);
    let ext = write_u24_or_sentinel(&mut buffer, delta);
    if let Some(value) = ext {
        buffer.write_u32_be(value);
    }
    (buffer.into_vec(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkReader;

    fn audio_packet(timestamp: u32, payload: Vec<u8>) -> RtmpPacket {
        RtmpPacket::new(
            RtmpHeader::audio(timestamp, payload.len() as u32, 1),
            payload,
        )
    }

    #[test]
    fn test_first_use_of_lane_is_type0() {
        let mut writer = ChunkWriter::new();
        let chunks = writer.create_chunks(&audio_packet(0, vec![1, 2, 3])).unwrap();
        assert_eq!(chunks[0] >> 6, 0);
        // Basic(1) + message header(11) + payload(3)
        assert_eq!(chunks.len(), 15);
    }

    #[test]
    fn test_header_compression_progression() {
        let mut writer = ChunkWriter::new();
        writer.create_chunks(&audio_packet(0, vec![1, 2, 3])).unwrap();

        // Same shape, new delta: type 2
        let chunks = writer.create_chunks(&audio_packet(40, vec![4, 5, 6])).unwrap();
        assert_eq!(chunks[0] >> 6, 2);
        assert_eq!(chunks.len(), 1 + 3 + 3);

        // Delta repeats: type 3
        let chunks = writer.create_chunks(&audio_packet(80, vec![7, 8, 9])).unwrap();
        assert_eq!(chunks[0] >> 6, 3);
        assert_eq!(chunks.len(), 1 + 3);

        // Length changed: type 1
        let chunks = writer.create_chunks(&audio_packet(120, vec![1])).unwrap();
        assert_eq!(chunks[0] >> 6, 1);

        // Different message stream id: back to type 0
        let packet = RtmpPacket::new(RtmpHeader::audio(160, 1, 2), vec![1]);
        let chunks = writer.create_chunks(&packet).unwrap();
        assert_eq!(chunks[0] >> 6, 0);
    }

    #[test]
    fn test_payload_split_count() {
        let mut writer = ChunkWriter::new();
        let payload = vec![0u8; 300];
        let chunks = writer.create_chunks(&audio_packet(0, payload)).unwrap();

        // ceil(300/128) = 3 pieces: 12-byte first chunk header + 2
        // type-3 basic headers
        assert_eq!(chunks.len(), 12 + 300 + 2);
    }

    #[tokio::test]
    async fn test_round_trip_through_reader() {
        let mut writer = ChunkWriter::new();
        let mut reader = ChunkReader::new();

        let payload: Vec<u8> = (0..=255).collect();
        let original = audio_packet(1234, payload.clone());
        let bytes = writer.create_chunks(&original).unwrap();
        let mut input = &bytes[..];

        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());
        let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(packet.header, original.header);
        assert_eq!(packet.payload, payload);
    }

    #[tokio::test]
    async fn test_compressed_sequence_round_trip() {
        let mut writer = ChunkWriter::new();
        let mut reader = ChunkReader::new();

        let mut bytes = Vec::new();
        for timestamp in [0u32, 40, 80, 120] {
            bytes.extend(writer.create_chunks(&audio_packet(timestamp, vec![1, 2])).unwrap());
        }

        let mut input = &bytes[..];
        for expected in [0u32, 40, 80, 120] {
            let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
            assert_eq!(packet.header.timestamp, expected);
            assert_eq!(packet.payload, vec![1, 2]);
        }
    }

    #[tokio::test]
    async fn test_extended_timestamp_round_trip_with_continuation() {
        let mut writer = ChunkWriter::new();
        let mut reader = ChunkReader::new();

        let timestamp = 0x0200_0000;
        let payload = vec![0x55u8; 200];
        let original = audio_packet(timestamp, payload.clone());
        let bytes = writer.create_chunks(&original).unwrap();
        let mut input = &bytes[..];

        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());
        let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(packet.header.timestamp, timestamp);
        assert_eq!(packet.payload, payload);
    }

    #[tokio::test]
    async fn test_renegotiated_chunk_size_round_trip() {
        let mut writer = ChunkWriter::new();
        let mut reader = ChunkReader::new();
        writer.set_chunk_size(4096);
        reader.set_chunk_size(4096);

        let payload = vec![7u8; 2000];
        let bytes = writer.create_chunks(&audio_packet(0, payload.clone())).unwrap();
        // One piece: no continuation headers
        assert_eq!(bytes.len(), 12 + 2000);

        let mut input = &bytes[..];
        let packet = reader.read_chunk(&mut input).await.unwrap().unwrap();
        assert_eq!(packet.payload, payload);
    }

    #[tokio::test]
    async fn test_round_trip_across_chunk_sizes() {
        let payload = vec![0xA5u8; 300];
        // Boundary cases: exact fit and one byte over
        for chunk_size in [1usize, 128, 4096, 300, 301] {
            let mut writer = ChunkWriter::new();
            let mut reader = ChunkReader::new();
            writer.set_chunk_size(chunk_size);
            reader.set_chunk_size(chunk_size);

            let bytes = writer.create_chunks(&audio_packet(10, payload.clone())).unwrap();
            let mut input = &bytes[..];
            let mut packet = None;
            while packet.is_none() {
                packet = reader.read_chunk(&mut input).await.unwrap();
            }
            let packet = packet.unwrap();
            assert_eq!(packet.payload, payload, "chunk size {}", chunk_size);
            assert_eq!(packet.header.timestamp, 10);
            assert!(input.is_empty(), "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_lanes_do_not_share_header_memory() {
        let mut writer = ChunkWriter::new();
        writer.create_chunks(&audio_packet(0, vec![1])).unwrap();

        let video = RtmpPacket::new(RtmpHeader::video(0, 1, 1), vec![1]);
        let chunks = writer.create_chunks(&video).unwrap();
        assert_eq!(chunks[0] >> 6, 0);
    }
}
