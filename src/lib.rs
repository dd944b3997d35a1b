//! RTMP protocol engine: handshake, chunk multiplexing, AMF
//! serialization and the NetConnection/NetStream session layer.
//!
//! The crate is transport-agnostic; `Connection::connect` takes any
//! `AsyncRead + AsyncWrite` transport that has already been opened.
//!
//! ```no_run
//! use rtmpkit::{Connection, ConnectionOptions, PublishType};
//!
//! # async fn example() -> rtmpkit::Result<()> {
//! let socket = tokio::net::TcpStream::connect("media.example.com:1935").await?;
//! let (connection, _events) = Connection::connect(
//!     "rtmp://media.example.com/live",
//!     socket,
//!     ConnectionOptions::default(),
//! )
//! .await?;
//!
//! let stream = connection.create_stream().await?;
//! stream.publish("stream-key", PublishType::Live).await?;
//! stream.send_video(0, vec![0x17, 0x00])?;
//! # Ok(())
//! # }
//! ```

pub mod amf;
pub mod chunk;
pub mod connection;
pub mod handshake;
pub mod message;
pub mod protocol;
pub mod stream;
pub mod utils;

pub use amf::{Amf0Decoder, Amf0Encoder, Amf3Decoder, Amf3Encoder, AmfValue, ObjectEncoding};
pub use connection::{Connection, ConnectionOptions, ConnectionState, StatusEvent};
pub use message::{ControlMessage, RtmpMessage, UserControl};
pub use protocol::{ConnectOptions, RtmpCommand, RtmpData, RtmpHeader, RtmpPacket};
pub use stream::{MediaSink, PublishType, Stream, StreamState};
pub use utils::{ByteBuffer, Error, Result};
