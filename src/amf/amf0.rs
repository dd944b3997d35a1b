use crate::amf::value::{AmfValue, Properties};
use crate::{ByteBuffer, Error, Result};

/// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
    pub const UNSUPPORTED: u8 = 0x0D;
    pub const XML_DOCUMENT: u8 = 0x0F;
    pub const TYPED_OBJECT: u8 = 0x10;
    pub const AVMPLUS_OBJECT: u8 = 0x11;
}

pub struct Amf0Encoder {
    buffer: ByteBuffer,
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: ByteBuffer::with_capacity(1024),
        }
    }

    pub fn encode(&mut self, value: &AmfValue) -> Result<()> {
        match value {
            AmfValue::Number(n) => self.encode_number(*n),
            AmfValue::Integer(i) => self.encode_number(*i as f64),
            AmfValue::Boolean(b) => self.encode_boolean(*b),
            AmfValue::String(s) => self.encode_string(s),
            AmfValue::Null => self.buffer.write_u8(markers::NULL),
            AmfValue::Undefined => self.buffer.write_u8(markers::UNDEFINED),
            AmfValue::EcmaArray(props) => self.encode_ecma_array(props)?,
            AmfValue::StrictArray(arr) => self.encode_strict_array(arr)?,
            AmfValue::Date(timestamp) => self.encode_date(*timestamp),
            AmfValue::Xml(xml) => self.encode_xml(xml),
            AmfValue::Object {
                class_name,
                properties,
            } => self.encode_object(class_name.as_deref(), properties)?,
            AmfValue::ByteArray(_) => {
                return Err(Error::amf_encode("ByteArray has no AMF0 representation"));
            }
        }
        Ok(())
    }

    fn encode_number(&mut self, value: f64) {
        self.buffer.write_u8(markers::NUMBER);
        self.buffer.write_f64_be(value);
    }

    fn encode_boolean(&mut self, value: bool) {
        self.buffer.write_u8(markers::BOOLEAN);
        self.buffer.write_u8(if value { 1 } else { 0 });
    }

    fn encode_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        if bytes.len() > u16::MAX as usize {
            self.buffer.write_u8(markers::LONG_STRING);
            self.buffer.write_u32_be(bytes.len() as u32);
        } else {
            self.buffer.write_u8(markers::STRING);
            self.buffer.write_u16_be(bytes.len() as u16);
        }
        self.buffer.write_bytes(bytes);
    }

    fn encode_object(&mut self, class_name: Option<&str>, props: &Properties) -> Result<()> {
        match class_name {
            Some(name) => {
                self.buffer.write_u8(markers::TYPED_OBJECT);
                let bytes = name.as_bytes();
                self.buffer.write_u16_be(bytes.len() as u16);
                self.buffer.write_bytes(bytes);
            }
            None => self.buffer.write_u8(markers::OBJECT),
        }
        self.write_properties(props)
    }

    fn encode_ecma_array(&mut self, props: &Properties) -> Result<()> {
        self.buffer.write_u8(markers::ECMA_ARRAY);
        // Declared count is advisory; readers scan to the end marker
        self.buffer.write_u32_be(props.len() as u32);
        self.write_properties(props)
    }

    fn encode_strict_array(&mut self, arr: &[AmfValue]) -> Result<()> {
        self.buffer.write_u8(markers::STRICT_ARRAY);
        self.buffer.write_u32_be(arr.len() as u32);
        for value in arr {
            self.encode(value)?;
        }
        Ok(())
    }

    fn encode_date(&mut self, timestamp: f64) {
        self.buffer.write_u8(markers::DATE);
        self.buffer.write_f64_be(timestamp);
        // Timezone field is reserved, always written as 0
        self.buffer.write_i16_be(0);
    }

    fn encode_xml(&mut self, xml: &str) {
        self.buffer.write_u8(markers::XML_DOCUMENT);
        let bytes = xml.as_bytes();
        self.buffer.write_u32_be(bytes.len() as u32);
        self.buffer.write_bytes(bytes);
    }

    fn write_properties(&mut self, props: &Properties) -> Result<()> {
        for (key, value) in props {
            self.write_key(key);
            self.encode(value)?;
        }
        // Empty key + end marker terminates the object
        self.buffer.write_u16_be(0);
        self.buffer.write_u8(markers::OBJECT_END);
        Ok(())
    }

    fn write_key(&mut self, key: &str) {
        let bytes = key.as_bytes();
        self.buffer.write_u16_be(bytes.len() as u16);
        self.buffer.write_bytes(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Amf0Decoder<'a> {
    buffer: &'a mut ByteBuffer,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf0Decoder { buffer }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    pub fn decode(&mut self) -> Result<AmfValue> {
        let marker = self.buffer.read_u8()?;
        match marker {
            markers::NUMBER => Ok(AmfValue::Number(self.buffer.read_f64_be()?)),
            markers::BOOLEAN => Ok(AmfValue::Boolean(self.buffer.read_u8()? != 0)),
            markers::STRING => {
                let len = self.buffer.read_u16_be()? as usize;
                Ok(AmfValue::String(self.read_utf8(len)?))
            }
            markers::OBJECT => {
                let props = self.read_properties()?;
                Ok(AmfValue::object(props))
            }
            markers::NULL => Ok(AmfValue::Null),
            markers::UNDEFINED | markers::UNSUPPORTED => Ok(AmfValue::Undefined),
            markers::ECMA_ARRAY => self.decode_ecma_array(),
            markers::STRICT_ARRAY => self.decode_strict_array(),
            markers::DATE => {
                let timestamp = self.buffer.read_f64_be()?;
                let _timezone = self.buffer.read_i16_be()?;
                Ok(AmfValue::Date(timestamp))
            }
            markers::LONG_STRING => {
                let len = self.buffer.read_u32_be()? as usize;
                Ok(AmfValue::String(self.read_utf8(len)?))
            }
            markers::XML_DOCUMENT => {
                let len = self.buffer.read_u32_be()? as usize;
                Ok(AmfValue::Xml(self.read_utf8(len)?))
            }
            markers::TYPED_OBJECT => {
                let name_len = self.buffer.read_u16_be()? as usize;
                let class_name = self.read_utf8(name_len)?;
                let props = self.read_properties()?;
                Ok(AmfValue::typed_object(class_name, props))
            }
            _ => Err(Error::amf_decode(format!(
                "Unknown AMF0 marker: 0x{:02x}",
                marker
            ))),
        }
    }

    fn decode_ecma_array(&mut self) -> Result<AmfValue> {
        // Count prefix is not authoritative, scan for the end marker
        let _count = self.buffer.read_u32_be()?;
        let props = self.read_properties()?;
        Ok(AmfValue::EcmaArray(props))
    }

    fn decode_strict_array(&mut self) -> Result<AmfValue> {
        let count = self.buffer.read_u32_be()? as usize;
        let mut array = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            array.push(self.decode()?);
        }
        Ok(AmfValue::StrictArray(array))
    }

    fn read_properties(&mut self) -> Result<Properties> {
        let mut props = Properties::new();
        loop {
            let key_len = self.buffer.read_u16_be()? as usize;
            if key_len == 0 {
                let end = self.buffer.read_u8()?;
                if end != markers::OBJECT_END {
                    return Err(Error::amf_decode(format!(
                        "Expected object end marker, got 0x{:02x}",
                        end
                    )));
                }
                break;
            }
            let key = self.read_utf8(key_len)?;
            let value = self.decode()?;
            props.push((key, value));
        }
        Ok(props)
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.buffer.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::amf_decode(format!("Invalid UTF-8: {}", e)))
    }
}
