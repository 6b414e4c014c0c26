// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured reply output: the schema the model answers in and its
//! validation into [`ProposedAction`]s.

use draftline_core::types::{ActionKind, Address, JsonSchemaFormat, ProposedAction};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

/// Payload fields accepted across every action type.
const PAYLOAD_FIELDS: [&str; 11] = [
    "name", "address1", "address2", "city", "province", "zip", "country", "phone", "reason",
    "note", "tag",
];

/// Strict output schema: the reply text plus a list of proposed actions.
pub fn reply_schema() -> JsonSchemaFormat {
    let payload_properties: serde_json::Map<String, Value> = PAYLOAD_FIELDS
        .iter()
        .map(|field| ((*field).to_string(), json!({"type": ["string", "null"]})))
        .collect();

    JsonSchemaFormat {
        name: "support_reply".into(),
        schema: json!({
            "type": "object",
            "properties": {
                "reply": {"type": "string"},
                "actions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {
                                "type": "string",
                                "enum": ["update_shipping_address", "cancel_order", "add_note", "add_tag"]
                            },
                            "orderId": {"type": "integer"},
                            "payload": {
                                "type": "object",
                                "properties": payload_properties,
                                "required": PAYLOAD_FIELDS,
                                "additionalProperties": false
                            }
                        },
                        "required": ["type", "orderId", "payload"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["reply", "actions"],
            "additionalProperties": false
        }),
    }
}

/// Parsed model output. `reply` is `None` when the output was unusable or blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub reply: Option<String>,
    pub actions: Vec<ProposedAction>,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    actions: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPayload {
    name: Option<String>,
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    province: Option<String>,
    zip: Option<String>,
    country: Option<String>,
    phone: Option<String>,
    reason: Option<String>,
    note: Option<String>,
    tag: Option<String>,
}

/// Parses raw model output. Malformed JSON yields an empty [`ModelReply`];
/// malformed individual actions become [`ProposedAction::Rejected`].
pub fn parse_model_reply(content: &str) -> ModelReply {
    let raw: RawReply = match serde_json::from_str(content.trim()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "reply output is not valid JSON");
            return ModelReply::default();
        }
    };
    ModelReply {
        reply: raw
            .reply
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        actions: raw.actions.iter().map(parse_action).collect(),
    }
}

fn parse_action(value: &Value) -> ProposedAction {
    let type_name = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let action = validate(&type_name, value);
    if let ProposedAction::Rejected { reason, .. } = &action {
        warn!(action = %type_name, reason = %reason, "dropping malformed action proposal");
    }
    action
}

fn rejected(kind: &str, reason: &str) -> ProposedAction {
    ProposedAction::Rejected {
        kind: kind.to_string(),
        reason: reason.to_string(),
    }
}

fn validate(type_name: &str, value: &Value) -> ProposedAction {
    let Ok(kind) = type_name.parse::<ActionKind>() else {
        return rejected(type_name, "unknown action type");
    };
    let Some(order_id) = value.get("orderId").and_then(order_id) else {
        return rejected(type_name, "invalid orderId");
    };
    let payload: RawPayload = match value.get("payload") {
        None | Some(Value::Null) => RawPayload::default(),
        Some(payload) => match serde_json::from_value(payload.clone()) {
            Ok(p) => p,
            Err(_) => return rejected(type_name, "invalid payload"),
        },
    };

    match kind {
        ActionKind::UpdateShippingAddress => {
            let address = Address {
                name: non_blank(payload.name),
                address1: non_blank(payload.address1),
                address2: non_blank(payload.address2),
                city: non_blank(payload.city),
                province: non_blank(payload.province),
                zip: non_blank(payload.zip),
                country: non_blank(payload.country),
                phone: non_blank(payload.phone),
            };
            if address.is_empty() && address.phone.is_none() {
                return rejected(type_name, "empty address");
            }
            ProposedAction::UpdateShippingAddress { order_id, address }
        }
        ActionKind::CancelOrder => ProposedAction::CancelOrder {
            order_id,
            reason: non_blank(payload.reason),
        },
        ActionKind::AddNote => match non_blank(payload.note) {
            Some(note) => ProposedAction::AddNote { order_id, note },
            None => rejected(type_name, "missing note"),
        },
        ActionKind::AddTag => match non_blank(payload.tag) {
            // Tags are stored comma-separated; a comma would split one proposal into two tags.
            Some(tag) if tag.contains(',') => rejected(type_name, "invalid tag"),
            Some(tag) => ProposedAction::AddTag { order_id, tag },
            None => rejected(type_name, "missing tag"),
        },
    }
}

/// Accepts integer ids, integral floats and digit strings.
fn order_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
