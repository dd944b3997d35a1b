mod stream;
mod timestamp;

pub use stream::{MediaSink, PublishType, Stream, StreamState};
pub use timestamp::TimestampTracker;

pub(crate) use stream::StreamShared;
