use crate::amf::{Amf0Decoder, Amf0Encoder, AmfValue, ObjectEncoding};
use crate::protocol::constants::*;
use crate::{ByteBuffer, Error, Result};

/// Connect-time parameters carried in the connect command object
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub app: String,
    pub tc_url: String,
    pub swf_url: Option<String>,
    pub page_url: Option<String>,
    pub flash_ver: Option<String>,
    pub object_encoding: ObjectEncoding,
}

/// RPC-style command message (connect, createStream, publish, ...).
///
/// A transaction id of 0 marks a notification that expects no response.
#[derive(Debug, Clone)]
pub struct RtmpCommand {
    pub name: String,
    pub transaction_id: f64,
    pub command_object: Option<AmfValue>,
    pub arguments: Vec<AmfValue>,
}

impl RtmpCommand {
    pub fn new(name: impl Into<String>, transaction_id: f64) -> Self {
        RtmpCommand {
            name: name.into(),
            transaction_id,
            command_object: None,
            arguments: Vec::new(),
        }
    }

    /// connect command with the standard command object
    pub fn connect(transaction_id: f64, options: &ConnectOptions) -> Self {
        let mut cmd = RtmpCommand::new("connect", transaction_id);

        let flash_ver = options
            .flash_ver
            .clone()
            .unwrap_or_else(|| DEFAULT_FLASH_VER.to_string());

        cmd.command_object = Some(AmfValue::object(vec![
            ("app".to_string(), AmfValue::from(options.app.clone())),
            ("flashVer".to_string(), AmfValue::from(flash_ver)),
            (
                "swfUrl".to_string(),
                options
                    .swf_url
                    .clone()
                    .map(AmfValue::from)
                    .unwrap_or(AmfValue::Null),
            ),
            ("tcUrl".to_string(), AmfValue::from(options.tc_url.clone())),
            ("fpad".to_string(), AmfValue::from(false)),
            (
                "capabilities".to_string(),
                AmfValue::from(DEFAULT_CAPABILITIES),
            ),
            (
                "audioCodecs".to_string(),
                AmfValue::from(SUPPORTED_AUDIO_CODECS),
            ),
            (
                "videoCodecs".to_string(),
                AmfValue::from(SUPPORTED_VIDEO_CODECS),
            ),
            (
                "videoFunction".to_string(),
                AmfValue::from(DEFAULT_VIDEO_FUNCTION),
            ),
            (
                "pageUrl".to_string(),
                options
                    .page_url
                    .clone()
                    .map(AmfValue::from)
                    .unwrap_or(AmfValue::Null),
            ),
            (
                "objectEncoding".to_string(),
                AmfValue::from(options.object_encoding.as_value()),
            ),
        ]));
        cmd
    }

    pub fn create_stream(transaction_id: f64) -> Self {
        let mut cmd = RtmpCommand::new("createStream", transaction_id);
        cmd.command_object = Some(AmfValue::Null);
        cmd
    }

    pub fn publish(stream_name: &str, publish_type: &str) -> Self {
        let mut cmd = RtmpCommand::new("publish", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(AmfValue::from(stream_name));
        cmd.arguments.push(AmfValue::from(publish_type));
        cmd
    }

    pub fn play(stream_name: &str, start: f64, duration: f64, reset: bool) -> Self {
        let mut cmd = RtmpCommand::new("play", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(AmfValue::from(stream_name));
        cmd.arguments.push(AmfValue::from(start));
        cmd.arguments.push(AmfValue::from(duration));
        cmd.arguments.push(AmfValue::from(reset));
        cmd
    }

    pub fn pause(paused: bool, milliseconds: f64) -> Self {
        let mut cmd = RtmpCommand::new("pause", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(AmfValue::from(paused));
        cmd.arguments.push(AmfValue::from(milliseconds));
        cmd
    }

    pub fn seek(milliseconds: f64) -> Self {
        let mut cmd = RtmpCommand::new("seek", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(AmfValue::from(milliseconds));
        cmd
    }

    pub fn close_stream() -> Self {
        let mut cmd = RtmpCommand::new("closeStream", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd
    }

    pub fn delete_stream(stream_id: f64) -> Self {
        let mut cmd = RtmpCommand::new("deleteStream", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(AmfValue::from(stream_id));
        cmd
    }

    pub fn result(transaction_id: f64, value: AmfValue) -> Self {
        let mut cmd = RtmpCommand::new("_result", transaction_id);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(value);
        cmd
    }

    pub fn error(transaction_id: f64, info: AmfValue) -> Self {
        let mut cmd = RtmpCommand::new("_error", transaction_id);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(info);
        cmd
    }

    pub fn on_status(level: &str, code: &str, description: &str) -> Self {
        let mut cmd = RtmpCommand::new("onStatus", 0.0);
        cmd.command_object = Some(AmfValue::Null);
        cmd.arguments.push(AmfValue::object(vec![
            ("level".to_string(), AmfValue::from(level)),
            ("code".to_string(), AmfValue::from(code)),
            ("description".to_string(), AmfValue::from(description)),
        ]));
        cmd
    }

    /// Message type byte for the negotiated encoding
    pub fn message_type(encoding: ObjectEncoding) -> u8 {
        match encoding {
            ObjectEncoding::Amf0 => MSG_TYPE_COMMAND_AMF0,
            ObjectEncoding::Amf3 => MSG_TYPE_COMMAND_AMF3,
        }
    }

    /// Encode the command payload.
    ///
    /// Type-17 messages carry a one-byte format prefix (0 = the body
    /// that follows is AMF0) ahead of the same AMF0 sequence.
    pub fn encode(&self, encoding: ObjectEncoding) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&AmfValue::from(self.name.clone()))?;
        encoder.encode(&AmfValue::from(self.transaction_id))?;
        match &self.command_object {
            Some(obj) => encoder.encode(obj)?,
            None => encoder.encode(&AmfValue::Null)?,
        }
        for arg in &self.arguments {
            encoder.encode(arg)?;
        }

        let body = encoder.into_bytes();
        match encoding {
            ObjectEncoding::Amf0 => Ok(body),
            ObjectEncoding::Amf3 => {
                let mut prefixed = Vec::with_capacity(body.len() + 1);
                prefixed.push(0x00);
                prefixed.extend_from_slice(&body);
                Ok(prefixed)
            }
        }
    }

    /// Decode a command payload of the given message type
    pub fn decode(data: &[u8], message_type: u8) -> Result<Self> {
        let body = if message_type == MSG_TYPE_COMMAND_AMF3 {
            if data.is_empty() {
                return Err(Error::amf_decode("Empty AMF3 command payload"));
            }
            &data[1..]
        } else {
            data
        };

        let mut buffer = ByteBuffer::new(body.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);

        let name = decoder
            .decode()?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::amf_decode("Command name must be a string"))?;

        let transaction_id = decoder
            .decode()?
            .as_number()
            .ok_or_else(|| Error::amf_decode("Transaction id must be a number"))?;

        let command_object = if decoder.has_remaining() {
            Some(decoder.decode()?)
        } else {
            None
        };

        let mut arguments = Vec::new();
        while decoder.has_remaining() {
            arguments.push(decoder.decode()?);
        }

        Ok(RtmpCommand {
            name,
            transaction_id,
            command_object,
            arguments,
        })
    }

    /// Status info object from a _result/_error/onStatus argument
    pub fn info_object(&self) -> Option<&AmfValue> {
        self.arguments.first()
    }

    /// Status code from the info object, if present
    pub fn status_code(&self) -> Option<&str> {
        self.info_object()
            .and_then(|info| info.get_property("code"))
            .and_then(|code| code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConnectOptions {
        ConnectOptions {
            app: "live".to_string(),
            tc_url: "rtmp://localhost/live".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_connect_command_object() {
        let cmd = RtmpCommand::connect(1.0, &options());
        assert_eq!(cmd.name, "connect");
        assert_eq!(cmd.transaction_id, 1.0);

        let obj = cmd.command_object.unwrap();
        assert_eq!(obj.get_property("app").and_then(|v| v.as_str()), Some("live"));
        assert_eq!(
            obj.get_property("flashVer").and_then(|v| v.as_str()),
            Some(DEFAULT_FLASH_VER)
        );
        assert_eq!(
            obj.get_property("objectEncoding").and_then(|v| v.as_number()),
            Some(0.0)
        );

        // Property order is part of the wire contract
        let keys: Vec<&str> = obj
            .properties()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys[0], "app");
        assert_eq!(keys[3], "tcUrl");
    }

    #[test]
    fn test_round_trip_amf0() {
        let original = RtmpCommand::connect(1.0, &options());
        let bytes = original.encode(ObjectEncoding::Amf0).unwrap();
        let decoded = RtmpCommand::decode(&bytes, MSG_TYPE_COMMAND_AMF0).unwrap();

        assert_eq!(decoded.name, "connect");
        assert_eq!(decoded.transaction_id, 1.0);
        assert_eq!(decoded.command_object, original.command_object);
    }

    #[test]
    fn test_amf3_command_carries_format_prefix() {
        let cmd = RtmpCommand::create_stream(2.0);
        let amf0 = cmd.encode(ObjectEncoding::Amf0).unwrap();
        let amf3 = cmd.encode(ObjectEncoding::Amf3).unwrap();

        assert_eq!(amf3[0], 0x00);
        assert_eq!(&amf3[1..], &amf0[..]);

        let decoded = RtmpCommand::decode(&amf3, MSG_TYPE_COMMAND_AMF3).unwrap();
        assert_eq!(decoded.name, "createStream");
        assert_eq!(decoded.transaction_id, 2.0);
    }

    #[test]
    fn test_status_code_accessor() {
        let cmd = RtmpCommand::on_status(LEVEL_STATUS, CODE_PUBLISH_START, "Started");
        assert_eq!(cmd.status_code(), Some(CODE_PUBLISH_START));
        assert_eq!(RtmpCommand::create_stream(3.0).status_code(), None);
    }

    #[test]
    fn test_notification_transaction_id_zero() {
        assert_eq!(RtmpCommand::publish("key", "live").transaction_id, 0.0);
        assert_eq!(RtmpCommand::play("key", -2.0, -1.0, true).transaction_id, 0.0);
    }
}
