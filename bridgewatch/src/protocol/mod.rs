//! Wire messages exchanged with the pub/sub transport.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//! Outbound frames carry the token address as `data`; inbound frames carry
//! the status or gas payloads below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{PipelineState, Step, StepStatus};
use crate::errors::DecodeError;
use crate::state::GasStatus;

/// Event name for subscription requests.
pub const SUBSCRIBE_EVENT: &str = "subscribeToBridgeStatus";
/// Event name for unsubscription requests.
pub const UNSUBSCRIBE_EVENT: &str = "unsubscribeFromBridgeStatus";
/// Event name for pipeline status snapshots.
pub const STATUS_UPDATE_EVENT: &str = "bridgeStatusUpdate";
/// Event name for gas telemetry.
pub const GAS_UPDATE_EVENT: &str = "gasStatusUpdate";

/// A message sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Start receiving updates for a token address.
    #[serde(rename = "subscribeToBridgeStatus")]
    Subscribe(String),
    /// Stop receiving updates for a token address.
    #[serde(rename = "unsubscribeFromBridgeStatus")]
    Unsubscribe(String),
}

impl ClientMessage {
    /// Encodes the message as a JSON frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns the token address the message refers to.
    #[must_use]
    pub fn token_address(&self) -> &str {
        match self {
            Self::Subscribe(address) | Self::Unsubscribe(address) => address,
        }
    }
}

/// Full pipeline snapshot for one token address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Address the snapshot belongs to.
    pub token_address: String,
    /// Status of every step.
    pub status: PipelineState,
}

/// Gas telemetry for one step of one token address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasUpdate {
    /// Address the reading belongs to.
    pub token_address: String,
    /// The reading itself.
    #[serde(flatten)]
    pub gas: GasStatus,
}

/// An event received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// `bridgeStatusUpdate`
    Status(StatusUpdate),
    /// `gasStatusUpdate`
    Gas(GasUpdate),
}

impl ServerEvent {
    /// Returns the token address the event refers to.
    #[must_use]
    pub fn token_address(&self) -> &str {
        match self {
            Self::Status(update) => &update.token_address,
            Self::Gas(update) => &update.token_address,
        }
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Status(_) => STATUS_UPDATE_EVENT,
            Self::Gas(_) => GAS_UPDATE_EVENT,
        }
    }

    /// Encodes the event as a JSON frame, as the server would send it.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let data = match self {
            Self::Status(update) => serde_json::to_value(update)?,
            Self::Gas(update) => serde_json::to_value(update)?,
        };
        serde_json::to_string(&Envelope {
            event: self.name().to_string(),
            data,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatusUpdate {
    token_address: String,
    status: BTreeMap<Step, StepStatus>,
}

/// Decodes one inbound frame.
///
/// Status snapshots must restate all four steps; a partial snapshot is
/// rejected with [`DecodeError::MissingSteps`] rather than defaulted.
pub fn decode_event(frame: &str) -> Result<ServerEvent, DecodeError> {
    let envelope: Envelope =
        serde_json::from_str(frame).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    // Read the address first so rejections can still be attributed.
    let token_address = envelope
        .data
        .get("tokenAddress")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    match envelope.event.as_str() {
        STATUS_UPDATE_EVENT => {
            let raw: RawStatusUpdate = serde_json::from_value(envelope.data)
                .map_err(|e| invalid_payload(STATUS_UPDATE_EVENT, token_address, &e))?;
            let status = PipelineState::try_from(raw.status).map_err(|e| {
                DecodeError::MissingSteps {
                    token_address: raw.token_address.clone(),
                    missing: e.missing,
                }
            })?;
            Ok(ServerEvent::Status(StatusUpdate {
                token_address: raw.token_address,
                status,
            }))
        }
        GAS_UPDATE_EVENT => {
            let update: GasUpdate = serde_json::from_value(envelope.data)
                .map_err(|e| invalid_payload(GAS_UPDATE_EVENT, token_address, &e))?;
            Ok(ServerEvent::Gas(update))
        }
        other => Err(DecodeError::UnknownEvent(other.to_string())),
    }
}

fn invalid_payload(
    event: &str,
    token_address: Option<String>,
    err: &serde_json::Error,
) -> DecodeError {
    DecodeError::InvalidPayload {
        event: event.to_string(),
        token_address,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn frame(event: &str, data: serde_json::Value) -> String {
        json!({ "event": event, "data": data }).to_string()
    }

    #[test]
    fn test_client_message_encoding() {
        let subscribe = ClientMessage::Subscribe("0xabc".to_string());
        assert_eq!(
            subscribe.encode().unwrap(),
            r#"{"event":"subscribeToBridgeStatus","data":"0xabc"}"#
        );

        let unsubscribe = ClientMessage::Unsubscribe("0xabc".to_string());
        assert_eq!(
            unsubscribe.encode().unwrap(),
            r#"{"event":"unsubscribeFromBridgeStatus","data":"0xabc"}"#
        );
        assert_eq!(unsubscribe.token_address(), "0xabc");
    }

    #[test]
    fn test_decode_status_update() {
        let event = decode_event(&frame(
            STATUS_UPDATE_EVENT,
            json!({
                "tokenAddress": "0xabc",
                "status": {
                    "TOKEN_CREATION_1_2": "completed",
                    "TOKEN_CREATION_2_2": "completed",
                    "LIQUIDITY_BRIDGE": "waitingForGas",
                    "LIQUIDITY_DEPOSIT": "pending",
                }
            }),
        ))
        .unwrap();

        let expected = PipelineState::pending()
            .with(Step::TokenCreationPart1, StepStatus::Completed)
            .with(Step::TokenCreationPart2, StepStatus::Completed)
            .with(Step::LiquidityBridge, StepStatus::WaitingForGas);

        assert_eq!(
            event,
            ServerEvent::Status(StatusUpdate {
                token_address: "0xabc".to_string(),
                status: expected,
            })
        );
        assert_eq!(event.token_address(), "0xabc");
    }

    #[test]
    fn test_decode_status_update_missing_step() {
        let err = decode_event(&frame(
            STATUS_UPDATE_EVENT,
            json!({
                "tokenAddress": "0xabc",
                "status": { "TOKEN_CREATION_1_2": "completed" }
            }),
        ))
        .unwrap_err();

        assert_eq!(
            err,
            DecodeError::MissingSteps {
                token_address: "0xabc".to_string(),
                missing: vec![
                    Step::TokenCreationPart2,
                    Step::LiquidityBridge,
                    Step::LiquidityDeposit
                ],
            }
        );
    }

    #[test]
    fn test_decode_status_update_unknown_status() {
        let err = decode_event(&frame(
            STATUS_UPDATE_EVENT,
            json!({
                "tokenAddress": "0xabc",
                "status": {
                    "TOKEN_CREATION_1_2": "completed",
                    "TOKEN_CREATION_2_2": "exploded",
                    "LIQUIDITY_BRIDGE": "pending",
                    "LIQUIDITY_DEPOSIT": "pending",
                }
            }),
        ))
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPayload { ref event, .. } if event == STATUS_UPDATE_EVENT));
        assert_eq!(err.token_address(), Some("0xabc"));
    }

    #[test]
    fn test_decode_gas_update() {
        let event = decode_event(&frame(
            GAS_UPDATE_EVENT,
            json!({
                "tokenAddress": "0xabc",
                "step": "LIQUIDITY_BRIDGE",
                "currentGas": 40,
                "threshold": 50.5,
                "status": "waitingForGas",
            }),
        ))
        .unwrap();

        let ServerEvent::Gas(update) = event else {
            panic!("expected gas update");
        };
        assert_eq!(update.token_address, "0xabc");
        assert_eq!(update.gas.step, Step::LiquidityBridge);
        assert_eq!(update.gas.current_gas, 40.0);
        assert_eq!(update.gas.threshold, 50.5);
        assert_eq!(update.gas.status, StepStatus::WaitingForGas);
    }

    #[test]
    fn test_decode_gas_update_missing_field() {
        let err = decode_event(&frame(
            GAS_UPDATE_EVENT,
            json!({ "tokenAddress": "0xabc", "step": "LIQUIDITY_BRIDGE", "currentGas": 40 }),
        ))
        .unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.token_address(), Some("0xabc"));

        let anonymous = decode_event(&frame(GAS_UPDATE_EVENT, json!({ "step": 7 }))).unwrap_err();
        assert_eq!(anonymous.token_address(), None);
    }

    #[test]
    fn test_decode_unknown_event_and_garbage() {
        assert_eq!(
            decode_event(&frame("pong", json!(null))).unwrap_err(),
            DecodeError::UnknownEvent("pong".to_string())
        );
        assert!(matches!(
            decode_event("not json").unwrap_err(),
            DecodeError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_server_event_encode_decodes_back() {
        let event = ServerEvent::Gas(GasUpdate {
            token_address: "0xabc".to_string(),
            gas: GasStatus::new(Step::LiquidityDeposit, 1.5, 2.0, StepStatus::WaitingForGas),
        });
        let decoded = decode_event(&event.encode().unwrap()).unwrap();
        assert_eq!(decoded, event);
    }
}
