/// Ordered key/value pairs for AMF objects and ECMA arrays.
///
/// AMF3 reference tables are assigned in first-seen order, so property
/// order has to survive a round trip; a plain HashMap would scramble it.
pub type Properties = Vec<(String, AmfValue)>;

/// Dynamically-typed AMF value, shared by the AMF0 and AMF3 serializers.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    /// AMF0 0x05, AMF3 0x01
    Null,

    /// AMF0 0x06, AMF3 0x00
    Undefined,

    /// AMF0 0x01, AMF3 0x02/0x03
    Boolean(bool),

    /// IEEE 754 double (AMF0 0x00, AMF3 0x05)
    Number(f64),

    /// 29-bit signed integer, AMF3 only (0x04); encodes as Number in AMF0
    Integer(i32),

    /// UTF-8 string (AMF0 0x02/0x0C, AMF3 0x06)
    String(String),

    /// Milliseconds since the Unix epoch (AMF0 0x0B, AMF3 0x08)
    Date(f64),

    /// Dense indexed array (AMF0 0x0A, AMF3 0x09)
    StrictArray(Vec<AmfValue>),

    /// Associative array (AMF0 0x08, AMF3 0x09 associative portion)
    EcmaArray(Properties),

    /// Anonymous or typed object (AMF0 0x03/0x10, AMF3 0x0A)
    Object {
        class_name: Option<String>,
        properties: Properties,
    },

    /// XML document (AMF0 0x0F, AMF3 0x07/0x0B)
    Xml(String),

    /// Raw bytes, AMF3 only (0x0C)
    ByteArray(Vec<u8>),
}

impl AmfValue {
    /// Anonymous object from ordered pairs
    pub fn object(properties: Properties) -> Self {
        AmfValue::Object {
            class_name: None,
            properties,
        }
    }

    /// Typed object from a class name and ordered pairs
    pub fn typed_object(class_name: impl Into<String>, properties: Properties) -> Self {
        AmfValue::Object {
            class_name: Some(class_name.into()),
            properties,
        }
    }

    /// Extract number value; integers widen to f64
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AmfValue::Number(n) => Some(*n),
            AmfValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmfValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AmfValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Ordered properties of an object or ECMA array
    pub fn properties(&self) -> Option<&Properties> {
        match self {
            AmfValue::Object { properties, .. } => Some(properties),
            AmfValue::EcmaArray(properties) => Some(properties),
            _ => None,
        }
    }

    /// Extract strict array elements
    pub fn as_array(&self) -> Option<&Vec<AmfValue>> {
        match self {
            AmfValue::StrictArray(arr) => Some(arr),
            _ => None,
        }
    }

    /// Look up a property by key on an object or ECMA array
    pub fn get_property(&self, key: &str) -> Option<&AmfValue> {
        self.properties()
            .and_then(|props| props.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Check if null or undefined
    pub fn is_null(&self) -> bool {
        matches!(self, AmfValue::Null | AmfValue::Undefined)
    }
}

impl From<&str> for AmfValue {
    fn from(s: &str) -> Self {
        AmfValue::String(s.to_string())
    }
}

impl From<String> for AmfValue {
    fn from(s: String) -> Self {
        AmfValue::String(s)
    }
}

impl From<f64> for AmfValue {
    fn from(n: f64) -> Self {
        AmfValue::Number(n)
    }
}

impl From<bool> for AmfValue {
    fn from(b: bool) -> Self {
        AmfValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_lookup() {
        let obj = AmfValue::object(vec![
            ("app".to_string(), AmfValue::from("live")),
            ("fpad".to_string(), AmfValue::from(false)),
        ]);

        assert_eq!(obj.get_property("app").and_then(|v| v.as_str()), Some("live"));
        assert_eq!(obj.get_property("fpad").and_then(|v| v.as_bool()), Some(false));
        assert!(obj.get_property("missing").is_none());
    }

    #[test]
    fn test_property_order_preserved() {
        let obj = AmfValue::object(vec![
            ("b".to_string(), AmfValue::Number(2.0)),
            ("a".to_string(), AmfValue::Number(1.0)),
        ]);

        let keys: Vec<&str> = obj
            .properties()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_integer_widens_to_number() {
        assert_eq!(AmfValue::Integer(3).as_number(), Some(3.0));
    }
}
