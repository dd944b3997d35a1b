// Message types
pub const MSG_TYPE_SET_CHUNK_SIZE: u8 = 1;
pub const MSG_TYPE_ABORT: u8 = 2;
pub const MSG_TYPE_ACK: u8 = 3;
pub const MSG_TYPE_USER_CONTROL: u8 = 4;
pub const MSG_TYPE_WINDOW_ACK: u8 = 5;
pub const MSG_TYPE_SET_PEER_BW: u8 = 6;
pub const MSG_TYPE_AUDIO: u8 = 8;
pub const MSG_TYPE_VIDEO: u8 = 9;
pub const MSG_TYPE_DATA_AMF3: u8 = 15;
pub const MSG_TYPE_SHARED_OBJECT_AMF3: u8 = 16;
pub const MSG_TYPE_COMMAND_AMF3: u8 = 17;
pub const MSG_TYPE_DATA_AMF0: u8 = 18;
pub const MSG_TYPE_SHARED_OBJECT_AMF0: u8 = 19;
pub const MSG_TYPE_COMMAND_AMF0: u8 = 20;
pub const MSG_TYPE_AGGREGATE: u8 = 22;

// Chunk stream lanes
pub const CHUNK_STREAM_PROTOCOL: u32 = 2;
pub const CHUNK_STREAM_COMMAND: u32 = 3;
pub const CHUNK_STREAM_AUDIO: u32 = 4;
pub const CHUNK_STREAM_VIDEO: u32 = 6;
pub const CHUNK_STREAM_DATA: u32 = 8;

// Defaults
pub const DEFAULT_CHUNK_SIZE: u32 = 128;
pub const DEFAULT_WINDOW_SIZE: u32 = 2_500_000;

// Three-byte timestamp fields carry this sentinel when the real value
// needs four extra bytes
pub const EXTENDED_TIMESTAMP_SENTINEL: u32 = 0xFF_FFFF;

// connect command object defaults
pub const DEFAULT_FLASH_VER: &str = "FMLE/3.0 (compatible; FMSc/1.0)";
pub const DEFAULT_CAPABILITIES: f64 = 239.0;
pub const SUPPORTED_AUDIO_CODECS: f64 = 0x0400 as f64;
pub const SUPPORTED_VIDEO_CODECS: f64 = 0x0080 as f64;
pub const DEFAULT_VIDEO_FUNCTION: f64 = 1.0;

// Status levels
pub const LEVEL_STATUS: &str = "status";
pub const LEVEL_ERROR: &str = "error";
pub const LEVEL_WARNING: &str = "warning";

// NetConnection status codes
pub const CODE_CONNECT_SUCCESS: &str = "NetConnection.Connect.Success";
pub const CODE_CONNECT_REJECTED: &str = "NetConnection.Connect.Rejected";
pub const CODE_CONNECT_CLOSED: &str = "NetConnection.Connect.Closed";
pub const CODE_CONNECT_FAILED: &str = "NetConnection.Connect.Failed";

// NetStream status codes
pub const CODE_PUBLISH_START: &str = "NetStream.Publish.Start";
pub const CODE_PUBLISH_BAD_NAME: &str = "NetStream.Publish.BadName";
pub const CODE_PLAY_START: &str = "NetStream.Play.Start";
pub const CODE_PLAY_STOP: &str = "NetStream.Play.Stop";
pub const CODE_PLAY_RESET: &str = "NetStream.Play.Reset";
pub const CODE_PAUSE_NOTIFY: &str = "NetStream.Pause.Notify";
pub const CODE_UNPAUSE_NOTIFY: &str = "NetStream.Unpause.Notify";
pub const CODE_SEEK_NOTIFY: &str = "NetStream.Seek.Notify";
pub const CODE_UNPUBLISH_SUCCESS: &str = "NetStream.Unpublish.Success";
