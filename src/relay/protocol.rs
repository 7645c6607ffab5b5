//! Wire format shared by clients and the relay.
//!
//! Every frame in either direction is a JSON [`Envelope`]. Nested payloads
//! (profiles, chat messages) travel as JSON-encoded strings inside `data` or
//! `dataArray`, so they are encoded twice on the wire.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

pub const REGISTER: &str = "register";
pub const MESSAGE: &str = "message";
pub const USERS: &str = "users";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_array: Option<Vec<String>>,
}

/// Public identity a client registers with. All fields are opaque to the
/// server; only `name` has to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: String,
    pub message: String,
    /// Milliseconds since the unix epoch, stamped by the server.
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Register(UserProfile),
    Message(String),
    /// Any other tag, or none at all. Never acted on.
    Unknown(Option<String>),
}

impl InboundEvent {
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| ProtocolError::InvalidEnvelope(e.to_string()))?;

        match envelope.message_type.as_deref() {
            Some(REGISTER) => {
                let data = envelope.data.ok_or(ProtocolError::MissingPayload(REGISTER))?;
                let profile = serde_json::from_str(&data)
                    .map_err(|e| ProtocolError::InvalidProfile(e.to_string()))?;
                Ok(InboundEvent::Register(profile))
            }
            Some(MESSAGE) => {
                let text = envelope.data.ok_or(ProtocolError::MissingPayload(MESSAGE))?;
                Ok(InboundEvent::Message(text))
            }
            _ => Ok(InboundEvent::Unknown(envelope.message_type)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Full profiles, sent after a registration.
    Roster(Vec<UserProfile>),
    /// Names only, sent after the sweeper evicts sessions. Shares the
    /// `users` tag with [`OutboundEvent::Roster`] but not its element shape.
    RosterNames(Vec<String>),
    Message(ChatMessage),
}

impl OutboundEvent {
    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let envelope = match self {
            OutboundEvent::Roster(profiles) => Envelope {
                message_type: Some(USERS.to_string()),
                data: None,
                data_array: Some(
                    profiles
                        .iter()
                        .map(serde_json::to_string)
                        .collect::<Result<_, _>>()?,
                ),
            },
            OutboundEvent::RosterNames(names) => Envelope {
                message_type: Some(USERS.to_string()),
                data: None,
                data_array: Some(names.clone()),
            },
            OutboundEvent::Message(message) => Envelope {
                message_type: Some(MESSAGE.to_string()),
                data: Some(serde_json::to_string(message)?),
                data_array: None,
            },
        };
        Ok(envelope)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_envelope()?)
    }
}
