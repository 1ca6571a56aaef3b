use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Raw webhook envelope: every event carries an id, a type discriminator
/// and a type-specific payload.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: Value,
}

/// Pre-authorization payload: funds have not moved yet
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationRequestData {
    pub pending_amount: i64,
    pub currency: String,
}

/// Realized spend payload for a shared virtual card
#[derive(Debug, Clone, Deserialize)]
pub struct CardSpendData {
    pub card_reference: String,
    pub amount: i64,
    pub currency: String,
}

/// Inbound events as a tagged variant over the known type discriminators.
/// Unknown types are acknowledged as no-ops, not errors.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// `issuing_authorization.request`: answered synchronously, no charges
    AuthorizationRequest {
        event_id: String,
        data: AuthorizationRequestData,
    },
    /// `issuing_authorization.created`: authorization hold on the card
    AuthorizationCreated {
        event_id: String,
        data: CardSpendData,
    },
    /// `issuing_transaction.created`: settled spend on the card
    TransactionCreated {
        event_id: String,
        data: CardSpendData,
    },
    Unknown {
        event_id: String,
        event_type: String,
    },
}

impl InboundEvent {
    pub fn event_id(&self) -> &str {
        match self {
            InboundEvent::AuthorizationRequest { event_id, .. }
            | InboundEvent::AuthorizationCreated { event_id, .. }
            | InboundEvent::TransactionCreated { event_id, .. }
            | InboundEvent::Unknown { event_id, .. } => event_id,
        }
    }
}

/// Parse a verified raw payload into a typed event.
pub fn parse_event(payload: &[u8]) -> AppResult<InboundEvent> {
    let envelope: EventEnvelope = serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let event = match envelope.event_type.as_str() {
        "issuing_authorization.request" => InboundEvent::AuthorizationRequest {
            event_id: envelope.id,
            data: parse_data(envelope.data)?,
        },
        "issuing_authorization.created" => InboundEvent::AuthorizationCreated {
            event_id: envelope.id,
            data: parse_data(envelope.data)?,
        },
        "issuing_transaction.created" => InboundEvent::TransactionCreated {
            event_id: envelope.id,
            data: parse_data(envelope.data)?,
        },
        other => {
            debug!("Unrecognized webhook event type: {}", other);
            InboundEvent::Unknown {
                event_id: envelope.id,
                event_type: other.to_string(),
            }
        }
    };

    Ok(event)
}

fn parse_data<T: serde::de::DeserializeOwned>(data: Value) -> AppResult<T> {
    serde_json::from_value(data)
        .map_err(|e| AppError::BadRequest(format!("Invalid event data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authorization_request() {
        let payload = br#"{
            "id": "evt_auth_req_1",
            "type": "issuing_authorization.request",
            "data": { "pending_amount": 1299, "currency": "eur" }
        }"#;

        match parse_event(payload).unwrap() {
            InboundEvent::AuthorizationRequest { event_id, data } => {
                assert_eq!(event_id, "evt_auth_req_1");
                assert_eq!(data.pending_amount, 1299);
                assert_eq!(data.currency, "eur");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_transaction_created() {
        let payload = br#"{
            "id": "evt_txn_1",
            "type": "issuing_transaction.created",
            "data": { "card_reference": "ic_123", "amount": 1599, "currency": "eur" }
        }"#;

        match parse_event(payload).unwrap() {
            InboundEvent::TransactionCreated { data, .. } => {
                assert_eq!(data.card_reference, "ic_123");
                assert_eq!(data.amount, 1599);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_is_preserved_not_rejected() {
        let payload = br#"{
            "id": "evt_x",
            "type": "cardholder.updated",
            "data": { "whatever": true }
        }"#;

        match parse_event(payload).unwrap() {
            InboundEvent::Unknown { event_type, .. } => {
                assert_eq!(event_type, "cardholder.updated");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn malformed_payload_is_a_bad_request() {
        let result = parse_event(b"not json");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn missing_required_field_is_a_bad_request() {
        let payload = br#"{
            "id": "evt_y",
            "type": "issuing_transaction.created",
            "data": { "amount": 100, "currency": "eur" }
        }"#;

        let result = parse_event(payload);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
