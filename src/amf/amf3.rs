use crate::amf::value::{AmfValue, Properties};
use crate::{ByteBuffer, Error, Result};

/// AMF3 type markers
pub mod markers {
    pub const UNDEFINED: u8 = 0x00;
    pub const NULL: u8 = 0x01;
    pub const FALSE: u8 = 0x02;
    pub const TRUE: u8 = 0x03;
    pub const INTEGER: u8 = 0x04;
    pub const DOUBLE: u8 = 0x05;
    pub const STRING: u8 = 0x06;
    pub const XML_DOC: u8 = 0x07;
    pub const DATE: u8 = 0x08;
    pub const ARRAY: u8 = 0x09;
    pub const OBJECT: u8 = 0x0A;
    pub const XML: u8 = 0x0B;
    pub const BYTE_ARRAY: u8 = 0x0C;
}

/// Bounds of the 29-bit signed integer type; values outside degrade to
/// doubles
pub const INT_MAX: i32 = 0x0FFF_FFFF;
pub const INT_MIN: i32 = -0x1000_0000;

const MAX_NESTING_DEPTH: usize = 64;

/// Class definition shared between objects of the same shape
#[derive(Clone, Debug)]
struct TraitDef {
    class_name: String,
    is_dynamic: bool,
    sealed_properties: Vec<String>,
}

/// AMF3 encoder.
///
/// Reference tables live on the instance: strings and complex values
/// (objects, arrays, dates, XML, byte arrays) are written inline and
/// registered on first sight, and as a table index thereafter. One
/// instance covers one top-level serialization; tables are never shared
/// with a decoder or across independent serializations.
pub struct Amf3Encoder {
    buffer: ByteBuffer,
    string_refs: Vec<String>,
    complex_refs: Vec<AmfValue>,
}

impl Amf3Encoder {
    pub fn new() -> Self {
        Amf3Encoder {
            buffer: ByteBuffer::with_capacity(1024),
            string_refs: Vec::new(),
            complex_refs: Vec::new(),
        }
    }

    pub fn encode(&mut self, value: &AmfValue) -> Result<()> {
        match value {
            AmfValue::Undefined => self.buffer.write_u8(markers::UNDEFINED),
            AmfValue::Null => self.buffer.write_u8(markers::NULL),
            AmfValue::Boolean(false) => self.buffer.write_u8(markers::FALSE),
            AmfValue::Boolean(true) => self.buffer.write_u8(markers::TRUE),
            AmfValue::Integer(i) if (INT_MIN..=INT_MAX).contains(i) => {
                self.buffer.write_u8(markers::INTEGER);
                self.write_u29(*i as u32 & 0x1FFF_FFFF);
            }
            AmfValue::Integer(i) => {
                self.buffer.write_u8(markers::DOUBLE);
                self.buffer.write_f64_be(*i as f64);
            }
            AmfValue::Number(n) => {
                self.buffer.write_u8(markers::DOUBLE);
                self.buffer.write_f64_be(*n);
            }
            AmfValue::String(s) => {
                self.buffer.write_u8(markers::STRING);
                self.write_string(s);
            }
            AmfValue::Date(timestamp) => {
                self.buffer.write_u8(markers::DATE);
                if !self.write_complex_ref(value) {
                    self.write_u29(1);
                    self.buffer.write_f64_be(*timestamp);
                }
            }
            AmfValue::StrictArray(elements) => {
                self.buffer.write_u8(markers::ARRAY);
                if !self.write_complex_ref(value) {
                    self.write_u29(((elements.len() as u32) << 1) | 1);
                    // Empty associative portion
                    self.write_u29(1);
                    for element in elements {
                        self.encode(element)?;
                    }
                }
            }
            AmfValue::EcmaArray(props) => {
                self.buffer.write_u8(markers::ARRAY);
                if !self.write_complex_ref(value) {
                    // No dense portion, all entries are associative
                    self.write_u29(1);
                    self.write_pairs(props)?;
                }
            }
            AmfValue::Object {
                class_name,
                properties,
            } => {
                self.buffer.write_u8(markers::OBJECT);
                if !self.write_complex_ref(value) {
                    // Inline object, inline dynamic trait, zero sealed members
                    self.write_u29(0x0B);
                    self.write_string(class_name.as_deref().unwrap_or(""));
                    self.write_pairs(properties)?;
                }
            }
            AmfValue::Xml(s) => {
                self.buffer.write_u8(markers::XML);
                if !self.write_complex_ref(value) {
                    let bytes = s.as_bytes();
                    self.write_u29(((bytes.len() as u32) << 1) | 1);
                    self.buffer.write_bytes(bytes);
                }
            }
            AmfValue::ByteArray(data) => {
                self.buffer.write_u8(markers::BYTE_ARRAY);
                if !self.write_complex_ref(value) {
                    self.write_u29(((data.len() as u32) << 1) | 1);
                    self.buffer.write_bytes(data);
                }
            }
        }
        Ok(())
    }

    /// Emit a back-reference if the value was seen before; otherwise
    /// claim the next table slot (first-seen order) and report inline
    fn write_complex_ref(&mut self, value: &AmfValue) -> bool {
        if let Some(idx) = self.complex_refs.iter().position(|v| v == value) {
            self.write_u29((idx as u32) << 1);
            return true;
        }
        self.complex_refs.push(value.clone());
        false
    }

    fn write_pairs(&mut self, props: &Properties) -> Result<()> {
        for (key, value) in props {
            self.write_string(key);
            self.encode(value)?;
        }
        // Empty key terminates the dynamic portion
        self.write_string("");
        Ok(())
    }

    fn write_string(&mut self, s: &str) {
        if s.is_empty() {
            // The empty string is never tabled
            self.write_u29(1);
            return;
        }
        if let Some(idx) = self.string_refs.iter().position(|v| v == s) {
            self.write_u29((idx as u32) << 1);
            return;
        }
        self.string_refs.push(s.to_string());
        let bytes = s.as_bytes();
        self.write_u29(((bytes.len() as u32) << 1) | 1);
        self.buffer.write_bytes(bytes);
    }

    /// Variable-length 29-bit integer, 1-4 bytes, high bit continues
    fn write_u29(&mut self, value: u32) {
        let value = value & 0x1FFF_FFFF;
        if value < 0x80 {
            self.buffer.write_u8(value as u8);
        } else if value < 0x4000 {
            self.buffer.write_u8(((value >> 7) | 0x80) as u8);
            self.buffer.write_u8((value & 0x7F) as u8);
        } else if value < 0x20_0000 {
            self.buffer.write_u8(((value >> 14) | 0x80) as u8);
            self.buffer.write_u8((((value >> 7) & 0x7F) | 0x80) as u8);
            self.buffer.write_u8((value & 0x7F) as u8);
        } else {
            self.buffer.write_u8(((value >> 22) | 0x80) as u8);
            self.buffer.write_u8((((value >> 15) & 0x7F) | 0x80) as u8);
            self.buffer.write_u8((((value >> 8) & 0x7F) | 0x80) as u8);
            self.buffer.write_u8((value & 0xFF) as u8);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl Default for Amf3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// AMF3 decoder with its own reference tables, independent of any
/// encoder's
pub struct Amf3Decoder<'a> {
    buffer: &'a mut ByteBuffer,
    string_refs: Vec<String>,
    complex_refs: Vec<AmfValue>,
    trait_refs: Vec<TraitDef>,
    depth: usize,
}

impl<'a> Amf3Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf3Decoder {
            buffer,
            string_refs: Vec::new(),
            complex_refs: Vec::new(),
            trait_refs: Vec::new(),
            depth: 0,
        }
    }

    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    pub fn decode(&mut self) -> Result<AmfValue> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::amf_decode("AMF3 nesting too deep"));
        }
        let marker = self.buffer.read_u8()?;
        let result = self.decode_marked(marker);
        self.depth -= 1;
        result
    }

    fn decode_marked(&mut self, marker: u8) -> Result<AmfValue> {
        match marker {
            markers::UNDEFINED => Ok(AmfValue::Undefined),
            markers::NULL => Ok(AmfValue::Null),
            markers::FALSE => Ok(AmfValue::Boolean(false)),
            markers::TRUE => Ok(AmfValue::Boolean(true)),
            markers::INTEGER => self.decode_integer(),
            markers::DOUBLE => Ok(AmfValue::Number(self.buffer.read_f64_be()?)),
            markers::STRING => Ok(AmfValue::String(self.read_string()?)),
            markers::DATE => self.decode_date(),
            markers::ARRAY => self.decode_array(),
            markers::OBJECT => self.decode_object(),
            markers::XML | markers::XML_DOC => self.decode_xml(),
            markers::BYTE_ARRAY => self.decode_byte_array(),
            _ => Err(Error::amf_decode(format!(
                "Unknown AMF3 marker: 0x{:02x}",
                marker
            ))),
        }
    }

    fn decode_integer(&mut self) -> Result<AmfValue> {
        let raw = self.read_u29()?;
        // Sign-extend from 29 bits
        let signed = if raw & 0x1000_0000 != 0 {
            (raw as i32) | !0x1FFF_FFFF
        } else {
            raw as i32
        };
        Ok(AmfValue::Integer(signed))
    }

    fn decode_date(&mut self) -> Result<AmfValue> {
        let header = self.read_u29()?;
        if header & 1 == 0 {
            return self.complex_ref((header >> 1) as usize);
        }
        let value = AmfValue::Date(self.buffer.read_f64_be()?);
        self.complex_refs.push(value.clone());
        Ok(value)
    }

    fn decode_array(&mut self) -> Result<AmfValue> {
        let header = self.read_u29()?;
        if header & 1 == 0 {
            return self.complex_ref((header >> 1) as usize);
        }
        let dense_count = (header >> 1) as usize;

        // Claim the table slot before children so nested references
        // resolve in first-seen order
        let slot = self.complex_refs.len();
        self.complex_refs.push(AmfValue::Null);

        let mut assoc = Properties::new();
        loop {
            let key = self.read_string()?;
            if key.is_empty() {
                break;
            }
            let value = self.decode()?;
            assoc.push((key, value));
        }

        let mut dense = Vec::with_capacity(dense_count.min(1024));
        for _ in 0..dense_count {
            dense.push(self.decode()?);
        }

        let value = if assoc.is_empty() {
            AmfValue::StrictArray(dense)
        } else {
            // Mixed arrays fold the dense portion in under index keys
            for (i, v) in dense.into_iter().enumerate() {
                assoc.push((i.to_string(), v));
            }
            AmfValue::EcmaArray(assoc)
        };
        self.complex_refs[slot] = value.clone();
        Ok(value)
    }

    fn decode_object(&mut self) -> Result<AmfValue> {
        let header = self.read_u29()?;
        if header & 1 == 0 {
            return self.complex_ref((header >> 1) as usize);
        }

        let slot = self.complex_refs.len();
        self.complex_refs.push(AmfValue::Null);

        let trait_def = if header & 2 == 0 {
            let idx = (header >> 2) as usize;
            self.trait_refs
                .get(idx)
                .cloned()
                .ok_or_else(|| {
                    Error::amf_decode(format!("Trait reference {} out of range", idx))
                })?
        } else {
            let is_dynamic = header & 8 != 0;
            let sealed_count = (header >> 4) as usize;
            let class_name = self.read_string()?;

            let mut sealed_properties = Vec::with_capacity(sealed_count);
            for _ in 0..sealed_count {
                sealed_properties.push(self.read_string()?);
            }

            let trait_def = TraitDef {
                class_name,
                is_dynamic,
                sealed_properties,
            };
            self.trait_refs.push(trait_def.clone());
            trait_def
        };

        let mut properties = Properties::new();
        for name in &trait_def.sealed_properties {
            let value = self.decode()?;
            properties.push((name.clone(), value));
        }
        if trait_def.is_dynamic {
            loop {
                let key = self.read_string()?;
                if key.is_empty() {
                    break;
                }
                let value = self.decode()?;
                properties.push((key, value));
            }
        }

        let class_name = if trait_def.class_name.is_empty() {
            None
        } else {
            Some(trait_def.class_name)
        };
        let value = AmfValue::Object {
            class_name,
            properties,
        };
        self.complex_refs[slot] = value.clone();
        Ok(value)
    }

    fn decode_xml(&mut self) -> Result<AmfValue> {
        let header = self.read_u29()?;
        if header & 1 == 0 {
            return self.complex_ref((header >> 1) as usize);
        }
        let len = (header >> 1) as usize;
        let bytes = self.buffer.read_bytes(len)?;
        let s = String::from_utf8(bytes)
            .map_err(|e| Error::amf_decode(format!("Invalid UTF-8 in XML: {}", e)))?;
        let value = AmfValue::Xml(s);
        self.complex_refs.push(value.clone());
        Ok(value)
    }

    fn decode_byte_array(&mut self) -> Result<AmfValue> {
        let header = self.read_u29()?;
        if header & 1 == 0 {
            return self.complex_ref((header >> 1) as usize);
        }
        let len = (header >> 1) as usize;
        let value = AmfValue::ByteArray(self.buffer.read_bytes(len)?);
        self.complex_refs.push(value.clone());
        Ok(value)
    }

    fn complex_ref(&self, idx: usize) -> Result<AmfValue> {
        self.complex_refs
            .get(idx)
            .cloned()
            .ok_or_else(|| Error::amf_decode(format!("Reference index {} out of range", idx)))
    }

    fn read_string(&mut self) -> Result<String> {
        let header = self.read_u29()?;
        if header & 1 == 0 {
            let idx = (header >> 1) as usize;
            return self
                .string_refs
                .get(idx)
                .cloned()
                .ok_or_else(|| {
                    Error::amf_decode(format!("String reference {} out of range", idx))
                });
        }
        let len = (header >> 1) as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.buffer.read_bytes(len)?;
        let s = String::from_utf8(bytes)
            .map_err(|e| Error::amf_decode(format!("Invalid UTF-8 in string: {}", e)))?;
        self.string_refs.push(s.clone());
        Ok(s)
    }

    fn read_u29(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for i in 0..4 {
            let byte = self.buffer.read_u8()?;
            if i < 3 {
                value = (value << 7) | (byte & 0x7F) as u32;
                if byte & 0x80 == 0 {
                    return Ok(value);
                }
            } else {
                // Fourth byte contributes all 8 bits
                value = (value << 8) | byte as u32;
            }
        }
        Ok(value)
    }
}
