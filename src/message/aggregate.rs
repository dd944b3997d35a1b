use crate::protocol::{RtmpHeader, RtmpPacket};
use crate::{ByteBuffer, Error, Result};

/// Split an aggregate message (type 22) into its sub-messages.
///
/// The payload is a run of FLV-shaped tags: type byte, u24 length,
/// u24+u8 timestamp (fourth byte carries the upper bits), u24 stream id,
/// body, then a u32 back-pointer covering tag header + body. The first
/// tag's timestamp re-bases the whole batch onto the aggregate's own
/// timestamp, and every sub-message inherits the aggregate's message
/// stream id.
pub fn split_aggregate(packet: &RtmpPacket) -> Result<Vec<RtmpPacket>> {
    let mut buffer = ByteBuffer::new(packet.payload.clone());
    let mut sub_messages = Vec::new();
    let mut base_offset: Option<u32> = None;

    while buffer.remaining() > 0 {
        if buffer.remaining() < 11 {
            return Err(Error::protocol("Truncated aggregate sub-message header"));
        }

        let message_type = buffer.read_u8()?;
        let length = buffer.read_u24_be()?;
        let timestamp_low = buffer.read_u24_be()?;
        let timestamp_ext = buffer.read_u8()?;
        let _tag_stream_id = buffer.read_u24_be()?;

        let tag_timestamp = ((timestamp_ext as u32) << 24) | timestamp_low;

        if buffer.remaining() < length as usize + 4 {
            return Err(Error::protocol("Truncated aggregate sub-message body"));
        }
        let body = buffer.read_bytes(length as usize)?;

        let back_pointer = buffer.read_u32_be()?;
        if back_pointer != length + 11 {
            return Err(Error::protocol(format!(
                "Aggregate back-pointer {} does not match tag size {}",
                back_pointer,
                length + 11
            )));
        }

        let offset = *base_offset
            .get_or_insert_with(|| packet.header.timestamp.wrapping_sub(tag_timestamp));
        let timestamp = tag_timestamp.wrapping_add(offset);

        let header = RtmpHeader::new(
            timestamp,
            length,
            message_type,
            packet.header.message_stream_id,
            packet.header.chunk_stream_id,
        );
        sub_messages.push(RtmpPacket::new(header, body));
    }

    Ok(sub_messages)
}
