use serde_json::Value;

use crate::codec::BinaryCodec;
use crate::error::CodecError;

#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl BinaryCodec for CborCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(value, &mut buffer)?;
        Ok(buffer)
    }

    fn decode(&self, raw: &[u8]) -> Result<Value, CodecError> {
        Ok(ciborium::de::from_reader(raw)?)
    }
}
