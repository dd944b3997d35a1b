mod value;

pub mod amf0;
pub mod amf3;

pub use amf0::{Amf0Decoder, Amf0Encoder};
pub use amf3::{Amf3Decoder, Amf3Encoder};
pub use value::{AmfValue, Properties};

use crate::{Error, Result};

/// Serialization format negotiated by the connect command's
/// objectEncoding member.
///
/// Commands and data on an AMF3 connection travel as message types 17
/// and 15 and carry a one-byte format prefix ahead of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectEncoding {
    #[default]
    Amf0 = 0,
    Amf3 = 3,
}

impl ObjectEncoding {
    pub fn from_value(value: f64) -> Result<Self> {
        match value as u8 {
            0 => Ok(ObjectEncoding::Amf0),
            3 => Ok(ObjectEncoding::Amf3),
            other => Err(Error::protocol(format!(
                "Unsupported objectEncoding: {}",
                other
            ))),
        }
    }

    pub fn as_value(&self) -> f64 {
        *self as u8 as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_encoding_values() {
        assert_eq!(ObjectEncoding::from_value(0.0).unwrap(), ObjectEncoding::Amf0);
        assert_eq!(ObjectEncoding::from_value(3.0).unwrap(), ObjectEncoding::Amf3);
        assert!(ObjectEncoding::from_value(6.0).is_err());
        assert_eq!(ObjectEncoding::Amf3.as_value(), 3.0);
    }
}
