use crate::amf::{Amf0Decoder, Amf0Encoder, AmfValue, ObjectEncoding, Properties};
use crate::protocol::constants::{MSG_TYPE_DATA_AMF0, MSG_TYPE_DATA_AMF3};
use crate::{ByteBuffer, Error, Result};

/// Notification message (onMetaData, @setDataFrame, ...): a handler
/// name followed by AMF values, no transaction id
#[derive(Debug, Clone)]
pub struct RtmpData {
    pub handler: String,
    pub values: Vec<AmfValue>,
}

impl RtmpData {
    pub fn new(handler: impl Into<String>) -> Self {
        RtmpData {
            handler: handler.into(),
            values: Vec::new(),
        }
    }

    pub fn on_metadata(metadata: Properties) -> Self {
        let mut data = RtmpData::new("onMetaData");
        data.values.push(AmfValue::EcmaArray(metadata));
        data
    }

    pub fn set_data_frame(key: &str, value: AmfValue) -> Self {
        let mut data = RtmpData::new("@setDataFrame");
        data.values.push(AmfValue::from(key));
        data.values.push(value);
        data
    }

    pub fn message_type(encoding: ObjectEncoding) -> u8 {
        match encoding {
            ObjectEncoding::Amf0 => MSG_TYPE_DATA_AMF0,
            ObjectEncoding::Amf3 => MSG_TYPE_DATA_AMF3,
        }
    }

    /// Encode the payload; type-15 messages get the one-byte format
    /// prefix like type-17 commands
    pub fn encode(&self, encoding: ObjectEncoding) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&AmfValue::from(self.handler.clone()))?;
        for value in &self.values {
            encoder.encode(value)?;
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

    pub fn decode(data: &[u8], message_type: u8) -> Result<Self> {
        let body = if message_type == MSG_TYPE_DATA_AMF3 {
            if data.is_empty() {
                return Err(Error::amf_decode("Empty AMF3 data payload"));
            }
            &data[1..]
        } else {
            data
        };

        let mut buffer = ByteBuffer::new(body.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);

        let handler = decoder
            .decode()?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::amf_decode("Data handler name must be a string"))?;

        let mut values = Vec::new();
        while decoder.has_remaining() {
            values.push(decoder.decode()?);
        }

        Ok(RtmpData { handler, values })
    }

    /// Metadata properties when this is an onMetaData notification
    pub fn metadata(&self) -> Option<&Properties> {
        if self.handler == "onMetaData" {
            self.values.first().and_then(|v| v.properties())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_round_trip() {
        let original = RtmpData::on_metadata(vec![
            ("width".to_string(), AmfValue::from(1920.0)),
            ("height".to_string(), AmfValue::from(1080.0)),
            ("framerate".to_string(), AmfValue::from(30.0)),
        ]);

        let bytes = original.encode(ObjectEncoding::Amf0).unwrap();
        let decoded = RtmpData::decode(&bytes, MSG_TYPE_DATA_AMF0).unwrap();

        assert_eq!(decoded.handler, "onMetaData");
        let metadata = decoded.metadata().unwrap();
        assert_eq!(metadata[0].0, "width");
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn test_set_data_frame_shape() {
        let data = RtmpData::set_data_frame(
            "onMetaData",
            AmfValue::EcmaArray(vec![("duration".to_string(), AmfValue::from(0.0))]),
        );
        assert_eq!(data.handler, "@setDataFrame");
        assert_eq!(data.values.len(), 2);
        assert_eq!(data.metadata(), None);
    }

    #[test]
    fn test_amf3_data_prefix() {
        let data = RtmpData::new("onStatus");
        let bytes = data.encode(ObjectEncoding::Amf3).unwrap();
        assert_eq!(bytes[0], 0x00);
        let decoded = RtmpData::decode(&bytes, MSG_TYPE_DATA_AMF3).unwrap();
        assert_eq!(decoded.handler, "onStatus");
    }
}
