use crate::amf::{AmfValue, ObjectEncoding, Properties};
use crate::message::RtmpMessage;
use crate::protocol::{
    RtmpCommand, RtmpData, RtmpPacket, CODE_PLAY_START, CODE_PLAY_STOP, CODE_PUBLISH_START,
    CODE_UNPUBLISH_SUCCESS, LEVEL_ERROR,
};
use crate::stream::TimestampTracker;
use crate::{Error, Result};
use async_trait::async_trait;
use log::{debug, trace, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};

/// Receiver for media arriving on a playing stream
#[async_trait]
pub trait MediaSink: Send {
    async fn on_audio(&mut self, timestamp: u32, payload: Vec<u8>);
    async fn on_video(&mut self, timestamp: u32, payload: Vec<u8>);
    async fn on_data(&mut self, data: RtmpData);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Publishing,
    Playing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishType {
    Live,
    Record,
    Append,
}

impl PublishType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishType::Live => "live",
            PublishType::Record => "record",
            PublishType::Append => "append",
        }
    }
}

/// An in-flight publish/play request waiting for its onStatus verdict
struct PendingRequest {
    success_code: &'static str,
    target: StreamState,
    notify: oneshot::Sender<Result<()>>,
}

/// State shared between the `Stream` handle and the connection's read
/// path, which routes onStatus and media here by message stream id.
pub(crate) struct StreamShared {
    id: u32,
    encoding: ObjectEncoding,
    state: Mutex<StreamState>,
    outgoing: mpsc::UnboundedSender<RtmpPacket>,
    sink: AsyncMutex<Option<Box<dyn MediaSink>>>,
    pending: Mutex<Option<PendingRequest>>,
    timestamps: Mutex<TimestampTracker>,
}

impl StreamShared {
    pub(crate) fn new(
        id: u32,
        encoding: ObjectEncoding,
        outgoing: mpsc::UnboundedSender<RtmpPacket>,
    ) -> Self {
        StreamShared {
            id,
            encoding,
            state: Mutex::new(StreamState::Idle),
            outgoing,
            sink: AsyncMutex::new(None),
            pending: Mutex::new(None),
            timestamps: Mutex::new(TimestampTracker::new()),
        }
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn state(&self) -> StreamState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(StreamState::Closed)
    }

    fn set_state(&self, next: StreamState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    fn send_packet(&self, packet: RtmpPacket) -> Result<()> {
        self.outgoing
            .send(packet)
            .map_err(|_| Error::connection("Connection writer is gone"))
    }

    /// Send a stream-scoped command (publish, play, pause, ...)
    fn send_command(&self, command: RtmpCommand) -> Result<()> {
        let packet = RtmpMessage::Command(command).into_packet(self.encoding, 0, self.id)?;
        self.send_packet(packet)
    }

    /// Send a connection-scoped command (deleteStream rides stream 0)
    fn send_connection_command(&self, command: RtmpCommand) -> Result<()> {
        let packet = RtmpMessage::Command(command).into_packet(self.encoding, 0, 0)?;
        self.send_packet(packet)
    }

    fn begin_request(
        &self,
        success_code: &'static str,
        target: StreamState,
    ) -> Result<oneshot::Receiver<Result<()>>> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| Error::stream("Stream request state poisoned"))?;
        if pending.is_some() {
            return Err(Error::stream("Another stream request is still in flight"));
        }
        let (notify, receiver) = oneshot::channel();
        *pending = Some(PendingRequest {
            success_code,
            target,
            notify,
        });
        Ok(receiver)
    }

    /// Settle (or keep waiting) the in-flight request from an onStatus
    /// command. Intermediate codes like NetStream.Play.Reset leave the
    /// request pending.
    pub(crate) fn handle_status(&self, command: &RtmpCommand) {
        let Some(code) = command.status_code() else {
            return;
        };
        let level = command
            .info_object()
            .and_then(|info| info.get_property("level"))
            .and_then(|level| level.as_str())
            .unwrap_or("status");
        debug!("stream {} onStatus {} ({})", self.id, code, level);

        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        if let Some(request) = pending.take() {
            if code == request.success_code {
                self.set_state(request.target);
                let _ = request.notify.send(Ok(()));
                return;
            }
            if level == LEVEL_ERROR {
                let description = command
                    .info_object()
                    .and_then(|info| info.get_property("description"))
                    .and_then(|desc| desc.as_str())
                    .unwrap_or(code);
                let _ = request.notify.send(Err(Error::stream(description)));
                return;
            }
            // Not the verdict yet, keep waiting
            *pending = Some(request);
            return;
        }
        drop(pending);

        match code {
            CODE_UNPUBLISH_SUCCESS | CODE_PLAY_STOP => self.set_state(StreamState::Idle),
            _ => {}
        }
    }

    pub(crate) async fn deliver_audio(&self, timestamp: u32, payload: Vec<u8>) {
        if self.state() != StreamState::Playing {
            trace!("stream {} dropping audio while not playing", self.id);
            return;
        }
        if let Some(sink) = self.sink.lock().await.as_mut() {
            sink.on_audio(timestamp, payload).await;
        }
    }

    pub(crate) async fn deliver_video(&self, timestamp: u32, payload: Vec<u8>) {
        if self.state() != StreamState::Playing {
            trace!("stream {} dropping video while not playing", self.id);
            return;
        }
        if let Some(sink) = self.sink.lock().await.as_mut() {
            sink.on_video(timestamp, payload).await;
        }
    }

    pub(crate) async fn deliver_data(&self, data: RtmpData) {
        if self.state() != StreamState::Playing {
            trace!("stream {} dropping {} while not playing", self.id, data.handler);
            return;
        }
        if let Some(sink) = self.sink.lock().await.as_mut() {
            sink.on_data(data).await;
        }
    }

    /// Connection teardown: fail any in-flight request and stop
    /// accepting media
    pub(crate) fn force_close(&self) {
        self.set_state(StreamState::Closed);
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(request) = pending.take() {
                let _ = request.notify.send(Err(Error::stream("Stream closed")));
            }
        }
    }
}

/// A logical media stream multiplexed over one connection.
///
/// Obtained from `Connection::create_stream`; the server assigns the
/// message stream id. Publish and play resolve once the server's
/// onStatus verdict arrives.
pub struct Stream {
    shared: Arc<StreamShared>,
}

impl Stream {
    pub(crate) fn new(shared: Arc<StreamShared>) -> Self {
        Stream { shared }
    }

    pub fn id(&self) -> u32 {
        self.shared.id()
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    pub async fn set_sink(&self, sink: impl MediaSink + 'static) {
        *self.shared.sink.lock().await = Some(Box::new(sink));
    }

    /// Start publishing under the given stream key. Resolves on
    /// NetStream.Publish.Start, fails on an error-level onStatus.
    pub async fn publish(&self, name: &str, publish_type: PublishType) -> Result<()> {
        self.ensure_idle()?;
        let verdict = self
            .shared
            .begin_request(CODE_PUBLISH_START, StreamState::Publishing)?;
        self.shared
            .send_command(RtmpCommand::publish(name, publish_type.as_str()))?;
        verdict
            .await
            .map_err(|_| Error::stream("Connection closed before publish completed"))?
    }

    /// Start playback of the named stream. Resolves on
    /// NetStream.Play.Start.
    pub async fn play(&self, name: &str) -> Result<()> {
        self.ensure_idle()?;
        let verdict = self
            .shared
            .begin_request(CODE_PLAY_START, StreamState::Playing)?;
        self.shared
            .send_command(RtmpCommand::play(name, -2.0, -1.0, true))?;
        verdict
            .await
            .map_err(|_| Error::stream("Connection closed before play completed"))?
    }

    /// Toggle playback pause. Fire-and-forget; the server acknowledges
    /// with NetStream.Pause.Notify / NetStream.Unpause.Notify.
    pub fn pause(&self, paused: bool, milliseconds: f64) -> Result<()> {
        if self.state() != StreamState::Playing {
            return Err(Error::invalid_state("pause requires a playing stream"));
        }
        self.shared
            .send_command(RtmpCommand::pause(paused, milliseconds))
    }

    /// Seek playback to an offset in milliseconds. Fire-and-forget.
    pub fn seek(&self, milliseconds: f64) -> Result<()> {
        if self.state() != StreamState::Playing {
            return Err(Error::invalid_state("seek requires a playing stream"));
        }
        self.shared.send_command(RtmpCommand::seek(milliseconds))
    }

    /// Send one audio message. Dropped with a warning unless publishing.
    pub fn send_audio(&self, timestamp: u32, payload: Vec<u8>) -> Result<()> {
        if self.state() != StreamState::Publishing {
            warn!("stream {} dropping audio while not publishing", self.id());
            return Ok(());
        }
        let timestamp = self.clamp(|t| t.clamp_audio(timestamp))?;
        let packet =
            RtmpMessage::Audio(payload).into_packet(self.shared.encoding, timestamp, self.id())?;
        self.shared.send_packet(packet)
    }

    /// Send one video message. Dropped with a warning unless publishing.
    pub fn send_video(&self, timestamp: u32, payload: Vec<u8>) -> Result<()> {
        if self.state() != StreamState::Publishing {
            warn!("stream {} dropping video while not publishing", self.id());
            return Ok(());
        }
        let timestamp = self.clamp(|t| t.clamp_video(timestamp))?;
        let packet =
            RtmpMessage::Video(payload).into_packet(self.shared.encoding, timestamp, self.id())?;
        self.shared.send_packet(packet)
    }

    /// Send an arbitrary data message (type 18/15) on this stream
    pub fn send_data(&self, handler: &str, values: Vec<AmfValue>) -> Result<()> {
        if self.state() != StreamState::Publishing {
            return Err(Error::invalid_state("data requires a publishing stream"));
        }
        let timestamp = self.clamp(|t| t.clamp_data(0))?;
        let mut data = RtmpData::new(handler);
        data.values = values;
        let packet =
            RtmpMessage::Data(data).into_packet(self.shared.encoding, timestamp, self.id())?;
        self.shared.send_packet(packet)
    }

    /// Announce stream metadata via @setDataFrame
    pub fn send_metadata(&self, metadata: Properties) -> Result<()> {
        if self.state() != StreamState::Publishing {
            return Err(Error::invalid_state("metadata requires a publishing stream"));
        }
        let timestamp = self.clamp(|t| t.clamp_data(0))?;
        let data = RtmpData::set_data_frame("onMetaData", AmfValue::EcmaArray(metadata));
        let packet =
            RtmpMessage::Data(data).into_packet(self.shared.encoding, timestamp, self.id())?;
        self.shared.send_packet(packet)
    }

    /// Stop publishing or playing and release the server-side stream
    pub fn close(&self) -> Result<()> {
        if self.state() == StreamState::Closed {
            return Ok(());
        }
        self.shared.send_command(RtmpCommand::close_stream())?;
        self.shared
            .send_connection_command(RtmpCommand::delete_stream(self.id() as f64))?;
        self.shared.force_close();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state() {
            StreamState::Idle => Ok(()),
            other => Err(Error::invalid_state(format!(
                "Stream must be idle, currently {:?}",
                other
            ))),
        }
    }

    fn clamp(&self, apply: impl FnOnce(&mut TimestampTracker) -> u32) -> Result<u32> {
        self.shared
            .timestamps
            .lock()
            .map(|mut tracker| apply(&mut tracker))
            .map_err(|_| Error::stream("Timestamp state poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LEVEL_STATUS, MSG_TYPE_AUDIO};

    fn stream() -> (Stream, mpsc::UnboundedReceiver<RtmpPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(StreamShared::new(1, ObjectEncoding::Amf0, tx));
        (Stream::new(shared), rx)
    }

    fn decode_command(packet: &RtmpPacket) -> RtmpCommand {
        RtmpCommand::decode(&packet.payload, packet.header.message_type).unwrap()
    }

    #[tokio::test]
    async fn test_publish_resolves_on_status() {
        let (stream, mut rx) = stream();
        let shared = stream.shared.clone();

        let task = tokio::spawn(async move { stream.publish("key", PublishType::Live).await });

        let packet = rx.recv().await.unwrap();
        let command = decode_command(&packet);
        assert_eq!(command.name, "publish");
        assert_eq!(packet.header.message_stream_id, 1);
        assert_eq!(
            command.arguments[0],
            AmfValue::from("key"),
        );

        shared.handle_status(&RtmpCommand::on_status(
            LEVEL_STATUS,
            CODE_PUBLISH_START,
            "Publishing key.",
        ));

        task.await.unwrap().unwrap();
        assert_eq!(shared.state(), StreamState::Publishing);
    }

    #[tokio::test]
    async fn test_publish_rejected_by_error_status() {
        let (stream, mut rx) = stream();
        let shared = stream.shared.clone();

        let task = tokio::spawn(async move { stream.publish("key", PublishType::Live).await });
        rx.recv().await.unwrap();

        shared.handle_status(&RtmpCommand::on_status(
            LEVEL_ERROR,
            "NetStream.Publish.BadName",
            "Already publishing.",
        ));

        assert!(task.await.unwrap().is_err());
        assert_eq!(shared.state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn test_play_waits_through_reset() {
        let (stream, mut rx) = stream();
        let shared = stream.shared.clone();

        let task = tokio::spawn(async move { stream.play("movie").await });
        rx.recv().await.unwrap();

        // Play.Reset precedes Play.Start and must not settle the request
        shared.handle_status(&RtmpCommand::on_status(
            LEVEL_STATUS,
            "NetStream.Play.Reset",
            "Resetting movie.",
        ));
        assert_eq!(shared.state(), StreamState::Idle);

        shared.handle_status(&RtmpCommand::on_status(
            LEVEL_STATUS,
            CODE_PLAY_START,
            "Started playing movie.",
        ));
        task.await.unwrap().unwrap();
        assert_eq!(shared.state(), StreamState::Playing);
    }

    #[tokio::test]
    async fn test_media_dropped_unless_publishing() {
        let (stream, mut rx) = stream();
        stream.send_audio(0, vec![0xAF, 0x01]).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_published_audio_has_clamped_timestamps() {
        let (stream, mut rx) = stream();
        let shared = stream.shared.clone();

        let task = tokio::spawn(async move { stream.publish("key", PublishType::Live).await });
        rx.recv().await.unwrap();
        shared.handle_status(&RtmpCommand::on_status(
            LEVEL_STATUS,
            CODE_PUBLISH_START,
            "ok",
        ));
        task.await.unwrap().unwrap();

        let stream = Stream::new(shared);
        stream.send_audio(100, vec![0xAF]).unwrap();
        stream.send_audio(40, vec![0xAF]).unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.header.message_type, MSG_TYPE_AUDIO);
        assert_eq!(first.header.timestamp, 100);
        // Regressing sample rides the last timestamp instead
        assert_eq!(second.header.timestamp, 100);
    }

    #[tokio::test]
    async fn test_close_sends_close_and_delete() {
        let (stream, mut rx) = stream();
        // close is legal from idle
        stream.close().unwrap();

        let close = decode_command(&rx.recv().await.unwrap());
        assert_eq!(close.name, "closeStream");
        let delete = rx.recv().await.unwrap();
        let delete_cmd = decode_command(&delete);
        assert_eq!(delete_cmd.name, "deleteStream");
        assert_eq!(delete.header.message_stream_id, 0);
        assert_eq!(delete_cmd.arguments[0], AmfValue::from(1.0));
        assert_eq!(stream.state(), StreamState::Closed);
    }

    #[tokio::test]
    async fn test_sink_receives_media_only_while_playing() {
        struct Counter(Arc<std::sync::atomic::AtomicU32>);

        #[async_trait]
        impl MediaSink for Counter {
            async fn on_audio(&mut self, _timestamp: u32, _payload: Vec<u8>) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            async fn on_video(&mut self, _timestamp: u32, _payload: Vec<u8>) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            async fn on_data(&mut self, _data: RtmpData) {}
        }

        let (stream, _rx) = stream();
        let hits = Arc::new(std::sync::atomic::AtomicU32::new(0));
        stream.set_sink(Counter(hits.clone())).await;

        let shared = stream.shared.clone();
        shared.deliver_audio(0, vec![0xAF]).await;
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 0);

        shared.set_state(StreamState::Playing);
        shared.deliver_audio(20, vec![0xAF]).await;
        shared.deliver_video(20, vec![0x17]).await;
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
