use serde_json::{Map, Value};

use crate::codec::TextCodec;
use crate::error::CodecError;

/// `application/x-www-form-urlencoded` bodies as flat objects.
///
/// Decoding yields an object of strings; a repeated name becomes an array of its values in
/// order. Encoding accepts objects whose members are scalars or arrays of scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl TextCodec for FormCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let Value::Object(members) = value else {
            return Err("form bodies must be objects".into());
        };

        let mut pairs = Vec::with_capacity(members.len());
        for (name, member) in members {
            match member {
                Value::Array(items) => {
                    for item in items {
                        pairs.push((name.as_str(), scalar_to_string(item)?));
                    }
                }
                scalar => pairs.push((name.as_str(), scalar_to_string(scalar)?)),
            }
        }
        Ok(serde_urlencoded::to_string(pairs)?)
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(text)?;

        let mut members = Map::new();
        for (name, value) in pairs {
            match members.get_mut(&name) {
                None => {
                    members.insert(name, Value::String(value));
                }
                Some(Value::Array(values)) => values.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
            }
        }
        Ok(Value::Object(members))
    }
}

fn scalar_to_string(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err("form values must be scalars".into()),
    }
}
