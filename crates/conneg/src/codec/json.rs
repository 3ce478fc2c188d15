use serde_json::Value;

use crate::codec::TextCodec;
use crate::error::CodecError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl TextCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}
