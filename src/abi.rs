//! Contract ABI model and message-body codec
//!
//! An ABI describes the functions a contract exposes and the events it can
//! emit. Message bodies start with a 32-bit function id derived from the
//! signature hash; the id's top bit distinguishes calls from answers:
//! - input id: `sha256("name(in,..)(out,..)v2")[..4] & 0x7FFF_FFFF`
//! - output id: the same hash with the top bit set
//! - event id: input-form id of the event signature
//!
//! All decode entry points are tolerant: a body that matches no known
//! selector, or whose payload cannot be parsed, yields `None` rather than an
//! error. Encoding helpers exist for the in-process proxy transport and for
//! tests.

use crate::errors::TraceError;
use crate::types::DecodedMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// ABI version suffix mixed into every signature hash
const ABI_VERSION: &str = "v2";

/// Named, typed parameter of a function or event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl AbiParam {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }
}

/// Callable function entry of a contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
}

/// Event entry of a contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

/// Published interface of a contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbi {
    #[serde(default)]
    pub functions: Vec<AbiFunction>,
    #[serde(default)]
    pub events: Vec<AbiEvent>,
}

impl ContractAbi {
    /// Parses an ABI from its JSON artifact representation
    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        serde_json::from_str(json).map_err(|e| TraceError::Abi(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.events.is_empty()
    }
}

fn type_list(params: &[AbiParam]) -> String {
    params
        .iter()
        .map(|p| p.ty.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Raw 32-bit signature hash before the call/answer bit is applied
fn signature_hash(name: &str, inputs: &[AbiParam], outputs: &[AbiParam]) -> u32 {
    let signature = format!(
        "{}({})({}){}",
        name,
        type_list(inputs),
        type_list(outputs),
        ABI_VERSION
    );
    let digest = Sha256::digest(signature.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Function id expected at the head of a call body
pub fn input_id(function: &AbiFunction) -> u32 {
    signature_hash(&function.name, &function.inputs, &function.outputs) & 0x7FFF_FFFF
}

/// Function id expected at the head of an answer body
pub fn output_id(function: &AbiFunction) -> u32 {
    signature_hash(&function.name, &function.inputs, &function.outputs) | 0x8000_0000
}

/// Event id expected at the head of an emitted event body
pub fn event_id(event: &AbiEvent) -> u32 {
    signature_hash(&event.name, &event.inputs, &[]) & 0x7FFF_FFFF
}

/// Splits a body into its leading function id and the params payload
fn split_body(body: &[u8]) -> Option<(u32, &[u8])> {
    if body.len() < 4 {
        return None;
    }
    let id = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
    Some((id, &body[4..]))
}

/// Parses the params payload and checks it carries every declared name.
///
/// The name check is what makes decoding selective: a body whose id happens
/// to collide with another ABI entry still fails here.
fn parse_params(payload: &[u8], declared: &[AbiParam]) -> Option<Value> {
    let value: Value = if payload.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(payload).ok()?
    };
    let object = value.as_object()?;
    if declared.iter().all(|p| object.contains_key(&p.name)) {
        Some(value)
    } else {
        None
    }
}

/// Attempts to decode a body as a function call input.
///
/// `internal` is accepted for interface completeness: internal and
/// external-in call bodies share the same layout here, external-in bodies
/// simply arrive with their signature already stripped by the data source.
pub fn decode_input(abi: &ContractAbi, body: &[u8], internal: bool) -> Option<DecodedMessage> {
    let _ = internal;
    let (id, payload) = split_body(body)?;
    for function in &abi.functions {
        if input_id(function) == id {
            if let Some(params) = parse_params(payload, &function.inputs) {
                return Some(DecodedMessage {
                    method: function.name.clone(),
                    params,
                });
            }
        }
    }
    None
}

/// Attempts to decode a body as a function's return value
pub fn decode_output(abi: &ContractAbi, body: &[u8]) -> Option<DecodedMessage> {
    let (id, payload) = split_body(body)?;
    for function in &abi.functions {
        if output_id(function) == id {
            if let Some(params) = parse_params(payload, &function.outputs) {
                return Some(DecodedMessage {
                    method: function.name.clone(),
                    params,
                });
            }
        }
    }
    None
}

/// Attempts to decode a body as an emitted event
pub fn decode_event(abi: &ContractAbi, body: &[u8]) -> Option<DecodedMessage> {
    let (id, payload) = split_body(body)?;
    for event in &abi.events {
        if event_id(event) == id {
            if let Some(params) = parse_params(payload, &event.inputs) {
                return Some(DecodedMessage {
                    method: event.name.clone(),
                    params,
                });
            }
        }
    }
    None
}

fn encode_body(id: u32, params: &Value) -> Vec<u8> {
    let mut body = id.to_be_bytes().to_vec();
    // Keep empty param sets as an empty payload so they round-trip
    if params.as_object().is_some_and(|o| !o.is_empty()) {
        body.extend(serde_json::to_vec(params).unwrap_or_default());
    }
    body
}

/// Encodes a function call body for the named function
pub fn encode_input(abi: &ContractAbi, name: &str, params: &Value) -> Result<Vec<u8>, TraceError> {
    let function = abi
        .functions
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| TraceError::Abi(format!("unknown function: {name}")))?;
    Ok(encode_body(input_id(function), params))
}

/// Encodes a function answer body for the named function
pub fn encode_output(abi: &ContractAbi, name: &str, params: &Value) -> Result<Vec<u8>, TraceError> {
    let function = abi
        .functions
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| TraceError::Abi(format!("unknown function: {name}")))?;
    Ok(encode_body(output_id(function), params))
}

/// Encodes an event body for the named event
pub fn encode_event(abi: &ContractAbi, name: &str, params: &Value) -> Result<Vec<u8>, TraceError> {
    let event = abi
        .events
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| TraceError::Abi(format!("unknown event: {name}")))?;
    Ok(encode_body(event_id(event), params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_abi() -> ContractAbi {
        ContractAbi {
            functions: vec![AbiFunction {
                name: "transfer".into(),
                inputs: vec![
                    AbiParam::new("to", "address"),
                    AbiParam::new("amount", "uint128"),
                ],
                outputs: vec![AbiParam::new("success", "bool")],
            }],
            events: vec![AbiEvent {
                name: "Transferred".into(),
                inputs: vec![AbiParam::new("amount", "uint128")],
            }],
        }
    }

    #[test]
    fn input_and_output_ids_differ_in_top_bit() {
        let abi = sample_abi();
        let f = &abi.functions[0];
        assert_eq!(input_id(f) & 0x8000_0000, 0);
        assert_eq!(output_id(f) & 0x8000_0000, 0x8000_0000);
        assert_eq!(input_id(f), output_id(f) & 0x7FFF_FFFF);
    }

    #[test]
    fn input_round_trip() {
        let abi = sample_abi();
        let params = json!({ "to": "0:ab", "amount": "100" });
        let body = encode_input(&abi, "transfer", &params).unwrap();
        let decoded = decode_input(&abi, &body, true).unwrap();
        assert_eq!(decoded.method, "transfer");
        assert_eq!(decoded.params, params);
    }

    #[test]
    fn output_round_trip_does_not_decode_as_input() {
        let abi = sample_abi();
        let params = json!({ "success": true });
        let body = encode_output(&abi, "transfer", &params).unwrap();
        assert!(decode_input(&abi, &body, false).is_none());
        let decoded = decode_output(&abi, &body).unwrap();
        assert_eq!(decoded.method, "transfer");
        assert_eq!(decoded.params, params);
    }

    #[test]
    fn event_round_trip() {
        let abi = sample_abi();
        let params = json!({ "amount": "7" });
        let body = encode_event(&abi, "Transferred", &params).unwrap();
        let decoded = decode_event(&abi, &body).unwrap();
        assert_eq!(decoded.method, "Transferred");
        assert_eq!(decoded.params, params);
    }

    #[test]
    fn unknown_selector_yields_none() {
        let abi = sample_abi();
        assert!(decode_input(&abi, &[0xde, 0xad, 0xbe, 0xef], true).is_none());
        assert!(decode_output(&abi, &[0xde, 0xad, 0xbe, 0xef]).is_none());
        assert!(decode_event(&abi, &[0xde, 0xad, 0xbe, 0xef]).is_none());
    }

    #[test]
    fn short_or_garbled_body_yields_none() {
        let abi = sample_abi();
        assert!(decode_input(&abi, &[], true).is_none());
        assert!(decode_input(&abi, &[0x01, 0x02], true).is_none());
        // Valid selector but payload that is not JSON
        let f = &abi.functions[0];
        let mut body = input_id(f).to_be_bytes().to_vec();
        body.extend(b"not json");
        assert!(decode_input(&abi, &body, true).is_none());
    }

    #[test]
    fn missing_declared_params_fail_decode() {
        let abi = sample_abi();
        let f = &abi.functions[0];
        let mut body = input_id(f).to_be_bytes().to_vec();
        body.extend(serde_json::to_vec(&json!({ "to": "0:ab" })).unwrap());
        assert!(decode_input(&abi, &body, true).is_none());
    }

    #[test]
    fn abi_json_round_trip() {
        let abi = sample_abi();
        let json = serde_json::to_string(&abi).unwrap();
        let parsed = ContractAbi::from_json(&json).unwrap();
        assert_eq!(parsed, abi);
    }

    #[test]
    fn empty_params_encode_to_bare_selector() {
        let abi = ContractAbi {
            functions: vec![AbiFunction {
                name: "constructor".into(),
                inputs: vec![],
                outputs: vec![],
            }],
            events: vec![],
        };
        let body = encode_input(&abi, "constructor", &json!({})).unwrap();
        assert_eq!(body.len(), 4);
        let decoded = decode_input(&abi, &body, false).unwrap();
        assert_eq!(decoded.method, "constructor");
    }
}
