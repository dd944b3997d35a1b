use crate::protocol::{RtmpHeader, RtmpPacket};

/// Per-lane reassembly state.
///
/// One context per chunk stream id. The last full header is kept across
/// messages so type-1/2/3 headers can fill in what they omit.
#[derive(Debug, Clone, Default)]
pub struct ChunkStreamContext {
    /// Header of the last message started on this lane
    pub prev_header: Option<RtmpHeader>,

    /// Header of the message currently being assembled
    pub current_header: Option<RtmpHeader>,

    /// Accumulated payload bytes
    pub message_buffer: Vec<u8>,

    /// Bytes still owed for the current message
    pub bytes_remaining: usize,

    /// Timestamp delta a header-less repeat applies
    pub last_delta: u32,

    /// Whether the lane's last wire timestamp field was the 0xFFFFFF
    /// sentinel; type-3 chunks then carry 4 extra timestamp bytes
    pub extended: bool,
}

impl ChunkStreamContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_assembling(&self) -> bool {
        self.current_header.is_some()
    }

    /// Begin a new message, discarding any partial accumulation
    pub fn start_message(&mut self, header: RtmpHeader, delta: u32, extended: bool) {
        self.bytes_remaining = header.message_length as usize;
        self.message_buffer.clear();
        self.message_buffer.reserve(self.bytes_remaining);
        self.current_header = Some(header);
        self.prev_header = Some(header);
        self.last_delta = delta;
        self.extended = extended;
    }

    /// Append one chunk's worth of payload; returns the finished packet
    /// once accumulated bytes reach the declared length
    pub fn append(&mut self, data: &[u8]) -> Option<RtmpPacket> {
        self.message_buffer.extend_from_slice(data);
        self.bytes_remaining = self.bytes_remaining.saturating_sub(data.len());

        if self.bytes_remaining > 0 {
            return None;
        }

        let header = self.current_header.take()?;
        let payload = std::mem::take(&mut self.message_buffer);
        Some(RtmpPacket::new(header, payload))
    }

    /// Drop the partial message (Abort control message)
    pub fn abort(&mut self) {
        self.current_header = None;
        self.message_buffer.clear();
        self.bytes_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MSG_TYPE_AUDIO;

    fn header(length: u32) -> RtmpHeader {
        RtmpHeader::new(100, length, MSG_TYPE_AUDIO, 1, 4)
    }

    #[test]
    fn test_assembly_across_chunks() {
        let mut lane = ChunkStreamContext::new();
        lane.start_message(header(5), 0, false);
        assert!(lane.is_assembling());

        assert!(lane.append(&[1, 2, 3]).is_none());
        let packet = lane.append(&[4, 5]).unwrap();
        assert_eq!(packet.payload, vec![1, 2, 3, 4, 5]);
        assert!(!lane.is_assembling());
        assert!(lane.prev_header.is_some());
    }

    #[test]
    fn test_zero_length_message_completes_immediately() {
        let mut lane = ChunkStreamContext::new();
        lane.start_message(header(0), 0, false);
        let packet = lane.append(&[]).unwrap();
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_abort_clears_partial_message() {
        let mut lane = ChunkStreamContext::new();
        lane.start_message(header(10), 0, false);
        lane.append(&[1, 2, 3]);
        lane.abort();

        assert!(!lane.is_assembling());
        assert!(lane.message_buffer.is_empty());
        // Header memory survives an abort
        assert!(lane.prev_header.is_some());
    }
}
