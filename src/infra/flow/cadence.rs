//! JSON-Cadence encoding for script/transaction arguments and decoding for
//! script results.
//!
//! The access node ships both directions as base64 of the JSON-Cadence
//! document, e.g. `{"type":"UFix64","value":"1.50000000"}`.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::domain::{Address, ChainError, DomainInfo};

/// A decoded Cadence value.
///
/// Integer and fixed-point values keep their decimal string form; callers
/// convert at the point of use.
#[derive(Debug, Clone, PartialEq)]
pub enum CadenceValue {
    Void,
    Bool(bool),
    String(String),
    Address(String),
    UFix64(String),
    Fix64(String),
    /// Any of the `Int*`, `UInt*` and `Word*` types
    Integer(String),
    Optional(Option<Box<CadenceValue>>),
    Array(Vec<CadenceValue>),
    Composite {
        id: String,
        fields: Vec<(String, CadenceValue)>,
    },
    /// A type this client never reads (paths, capabilities, ...)
    Other(String),
}

const INTEGER_TYPES: &[&str] = &[
    "Int", "Int8", "Int16", "Int32", "Int64", "Int128", "Int256", "UInt", "UInt8", "UInt16",
    "UInt32", "UInt64", "UInt128", "UInt256", "Word8", "Word16", "Word32", "Word64",
];

const COMPOSITE_TYPES: &[&str] = &["Struct", "Resource", "Event", "Contract", "Enum"];

impl CadenceValue {
    /// Decode a JSON-Cadence document
    pub fn from_json(value: &Value) -> Result<Self, ChainError> {
        let type_name = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Decode(format!("missing type in {}", value)))?;
        let inner = value.get("value").unwrap_or(&Value::Null);

        match type_name {
            "Void" => Ok(Self::Void),
            "Bool" => inner
                .as_bool()
                .map(Self::Bool)
                .ok_or_else(|| decode_error(type_name, inner)),
            "String" | "Character" => Ok(Self::String(expect_str(type_name, inner)?)),
            "Address" => Ok(Self::Address(expect_str(type_name, inner)?)),
            "UFix64" => Ok(Self::UFix64(expect_str(type_name, inner)?)),
            "Fix64" => Ok(Self::Fix64(expect_str(type_name, inner)?)),
            t if INTEGER_TYPES.contains(&t) => Ok(Self::Integer(expect_str(type_name, inner)?)),
            "Optional" => {
                if inner.is_null() {
                    Ok(Self::Optional(None))
                } else {
                    Ok(Self::Optional(Some(Box::new(Self::from_json(inner)?))))
                }
            }
            "Array" => {
                let items = inner
                    .as_array()
                    .ok_or_else(|| decode_error(type_name, inner))?;
                let decoded = items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Array(decoded))
            }
            t if COMPOSITE_TYPES.contains(&t) => {
                let id = inner
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let raw_fields = inner
                    .get("fields")
                    .and_then(Value::as_array)
                    .ok_or_else(|| decode_error(type_name, inner))?;

                let mut fields = Vec::with_capacity(raw_fields.len());
                for field in raw_fields {
                    let name = field
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| decode_error(type_name, field))?;
                    let value = field
                        .get("value")
                        .ok_or_else(|| decode_error(type_name, field))?;
                    fields.push((name.to_string(), Self::from_json(value)?));
                }
                Ok(Self::Composite { id, fields })
            }
            other => Ok(Self::Other(other.to_string())),
        }
    }

    /// Decode the base64 payload returned by `POST /v1/scripts`
    pub fn from_base64(payload: &str) -> Result<Self, ChainError> {
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ChainError::Decode(format!("invalid base64: {}", e)))?;
        let json: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ChainError::Decode(format!("invalid JSON-Cadence: {}", e)))?;
        Self::from_json(&json)
    }

    /// Unwrap one level of `Optional`; non-optional values pass through
    pub fn into_inner(self) -> Option<Self> {
        match self {
            Self::Optional(inner) => inner.map(|v| *v),
            other => Some(other),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ChainError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(mismatch("Bool", other)),
        }
    }

    pub fn as_ufix64(&self) -> Result<f64, ChainError> {
        match self {
            Self::UFix64(s) | Self::Fix64(s) => s
                .parse::<f64>()
                .map_err(|e| ChainError::Decode(format!("invalid fixed-point {}: {}", s, e))),
            other => Err(mismatch("UFix64", other)),
        }
    }

    /// Whole seconds of a UFix64 timestamp, e.g. `"1660000000.00000000"`
    pub fn as_unix_seconds(&self) -> Result<i64, ChainError> {
        match self {
            Self::UFix64(s) | Self::Fix64(s) | Self::Integer(s) => {
                let whole = s.split('.').next().unwrap_or_default();
                whole
                    .parse::<i64>()
                    .map_err(|e| ChainError::Decode(format!("invalid timestamp {}: {}", s, e)))
            }
            other => Err(mismatch("UFix64", other)),
        }
    }

    pub fn as_u64(&self) -> Result<u64, ChainError> {
        match self {
            Self::Integer(s) => s
                .parse::<u64>()
                .map_err(|e| ChainError::Decode(format!("invalid integer {}: {}", s, e))),
            other => Err(mismatch("UInt64", other)),
        }
    }

    pub fn as_string(&self) -> Result<String, ChainError> {
        match self {
            Self::String(s) => Ok(s.clone()),
            other => Err(mismatch("String", other)),
        }
    }

    pub fn as_address(&self) -> Result<Address, ChainError> {
        match self {
            Self::Address(s) => s
                .parse()
                .map_err(|e| ChainError::Decode(format!("{}", e))),
            other => Err(mismatch("Address", other)),
        }
    }

    /// Look up a composite field by name
    pub fn field(&self, name: &str) -> Result<&CadenceValue, ChainError> {
        match self {
            Self::Composite { fields, id } => fields
                .iter()
                .find(|(field_name, _)| field_name == name)
                .map(|(_, value)| value)
                .ok_or_else(|| ChainError::Decode(format!("{} has no field {}", id, name))),
            other => Err(mismatch("Struct", other)),
        }
    }
}

fn expect_str(type_name: &str, value: &Value) -> Result<String, ChainError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| decode_error(type_name, value))
}

fn decode_error(type_name: &str, value: &Value) -> ChainError {
    ChainError::Decode(format!("malformed {} value: {}", type_name, value))
}

fn mismatch(expected: &str, actual: &CadenceValue) -> ChainError {
    ChainError::Decode(format!("expected {}, got {:?}", expected, actual))
}

/// Map a `Domains.DomainInfo` struct onto [`DomainInfo`].
///
/// The contract stores an unset bio as an empty string and an unset address
/// as `nil`; both become `None`.
pub fn domain_info_from_cadence(value: &CadenceValue) -> Result<DomainInfo, ChainError> {
    let bio = match value.field("bio")? {
        CadenceValue::Optional(None) => None,
        CadenceValue::Optional(Some(inner)) => Some(inner.as_string()?),
        other => Some(other.as_string()?),
    }
    .filter(|bio| !bio.is_empty());

    let address = match value.field("address")? {
        CadenceValue::Optional(None) => None,
        CadenceValue::Optional(Some(inner)) => Some(inner.as_address()?),
        other => Some(other.as_address()?),
    };

    Ok(DomainInfo {
        id: value.field("id")?.as_u64()?,
        owner: value.field("owner")?.as_address()?,
        name: value.field("name")?.as_string()?,
        name_hash: value.field("nameHash")?.as_string()?,
        created_at: value.field("createdAt")?.as_unix_seconds()?,
        expires_at: value.field("expiresAt")?.as_unix_seconds()?,
        bio,
        address,
    })
}

/// `String` argument
#[must_use]
pub fn string_arg(value: &str) -> Value {
    json!({ "type": "String", "value": value })
}

/// `UFix64` argument for a whole number of seconds, written with one decimal
#[must_use]
pub fn ufix64_seconds_arg(secs: u64) -> Value {
    json!({ "type": "UFix64", "value": format!("{}.0", secs) })
}

/// `Address` argument
#[must_use]
pub fn address_arg(addr: &Address) -> Value {
    json!({ "type": "Address", "value": addr.as_str() })
}

/// Base64 of the JSON text, the form the access node expects
#[must_use]
pub fn encode_base64(value: &Value) -> String {
    STANDARD.encode(value.to_string())
}

/// Base64 of a Cadence source, sent as raw text
#[must_use]
pub fn encode_script(source: &str) -> String {
    STANDARD.encode(source)
}
