use serde_json::Value;

use crate::codec::TextCodec;
use crate::error::CodecError;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl TextCodec for YamlCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_yaml::to_string(value)?)
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_yaml::from_str(text)?)
    }
}
