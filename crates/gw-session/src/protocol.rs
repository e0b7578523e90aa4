//! Wire messages exchanged over the broadcast channel.
//!
//! Every frame is a JSON envelope `{"sessionId", "type", "payload"}`.
//! Four message types exist:
//! - `DISPATCH`: a new session descriptor, sent once by the coordinator.
//! - `TOGGLE`: advisory "someone is rolling for this entrant" marker.
//! - `RESULT`: one entrant's finished roll.
//! - `END`: conclude (or abort) the session.
//!
//! Receivers must tolerate duplicates and cross-sender reordering; the
//! replica's write-once results and `ended` latch make every apply
//! idempotent, so nothing here carries sequence numbers.

use serde::{Deserialize, Serialize};

use gw_core::{EntrantId, SessionDescriptor, SessionId};
use gw_mechanics::{RawRoll, RollMode};

use crate::error::SessionResult;

/// A frame on the broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The session this message belongs to.
    pub session_id: SessionId,
    /// The message itself, flattened into `type` and `payload`.
    #[serde(flatten)]
    pub message: Message,
}

/// The message vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Start a session on every client, replacing any current one.
    Dispatch(SessionDescriptor),
    /// A client started or stopped rolling for an entrant.
    Toggle(TogglePayload),
    /// An entrant's roll result.
    Result(ResultPayload),
    /// End the session.
    End(EndPayload),
}

impl Message {
    /// Short uppercase name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dispatch(_) => "DISPATCH",
            Self::Toggle(_) => "TOGGLE",
            Self::Result(_) => "RESULT",
            Self::End(_) => "END",
        }
    }
}

/// Payload of `TOGGLE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePayload {
    /// The entrant whose roll control changes.
    pub entrant_id: EntrantId,
    /// Whether a roll is in flight.
    pub rolling: bool,
}

/// Payload of `RESULT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    /// Who rolled.
    pub entrant_id: EntrantId,
    /// Kept faces plus modifier.
    pub total: i32,
    /// The modifier included in `total`.
    pub modifier: i32,
    /// The kept face was the die's maximum.
    pub is_crit: bool,
    /// The kept face was a 1.
    pub is_fumble: bool,
    /// Normal, advantage or disadvantage.
    pub roll_mode: RollMode,
    /// Every face rolled, including a dropped one.
    pub dice_faces: Vec<u32>,
}

impl ResultPayload {
    /// Build a payload from a finished roll.
    pub fn from_roll(entrant_id: EntrantId, roll: &RawRoll) -> Self {
        let flags = roll.flags();
        Self {
            entrant_id,
            total: roll.total,
            modifier: roll.formula.modifier,
            is_crit: flags.crit,
            is_fumble: flags.fumble,
            roll_mode: roll.formula.mode(),
            dice_faces: roll.faces.clone(),
        }
    }
}

/// Payload of `END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndPayload {
    /// Cancel the session without a verdict.
    pub abort: bool,
    /// Ended by an explicit "force complete" rather than by the last result.
    pub button: bool,
}

impl EndPayload {
    /// The END every replica triggers for itself once all results are in.
    pub fn completed() -> Self {
        Self::default()
    }

    /// A privileged "force complete".
    pub fn forced() -> Self {
        Self {
            abort: false,
            button: true,
        }
    }

    /// A privileged abort.
    pub fn aborted() -> Self {
        Self {
            abort: true,
            button: false,
        }
    }
}

impl Envelope {
    /// Wrap a message for a session.
    pub fn new(session_id: SessionId, message: Message) -> Self {
        Self {
            session_id,
            message,
        }
    }

    /// The `DISPATCH` frame for a descriptor.
    pub fn dispatch(descriptor: SessionDescriptor) -> Self {
        Self::new(descriptor.session_id, Message::Dispatch(descriptor))
    }

    /// Serialize to a JSON frame.
    pub fn encode(&self) -> SessionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON frame.
    pub fn decode(frame: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_mechanics::build_roll_formula;

    #[test]
    fn envelope_wire_shape() {
        let session_id = SessionId::new();
        let env = Envelope::new(
            session_id,
            Message::Toggle(TogglePayload {
                entrant_id: EntrantId::from("Actor.kael"),
                rolling: true,
            }),
        );
        let json: serde_json::Value = serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(json["sessionId"], session_id.0.to_string());
        assert_eq!(json["type"], "TOGGLE");
        assert_eq!(json["payload"]["entrantId"], "Actor.kael");
        assert_eq!(json["payload"]["rolling"], true);
    }

    #[test]
    fn result_frame_decodes() {
        let session_id = SessionId::new();
        let frame = format!(
            r#"{{"sessionId":"{}","type":"RESULT","payload":{{"entrantId":"Actor.mira","total":17,"modifier":3,"isCrit":false,"isFumble":false,"rollMode":"advantage","diceFaces":[6,14]}}}}"#,
            session_id.0
        );
        let env = Envelope::decode(&frame).unwrap();
        assert_eq!(env.session_id, session_id);
        match env.message {
            Message::Result(r) => {
                assert_eq!(r.total, 17);
                assert_eq!(r.roll_mode, RollMode::Advantage);
                assert_eq!(r.dice_faces, vec![6, 14]);
            }
            other => panic!("expected RESULT, got {}", other.kind()),
        }
    }

    #[test]
    fn end_and_dispatch_survive_the_wire() {
        let descriptor = SessionDescriptor::new([EntrantId::from("a")]).with_dc(10);
        for env in [
            Envelope::dispatch(descriptor.clone()),
            Envelope::new(descriptor.session_id, Message::End(EndPayload::aborted())),
        ] {
            let back = Envelope::decode(&env.encode().unwrap()).unwrap();
            assert_eq!(back, env);
        }
    }

    #[test]
    fn garbage_frames_are_codec_errors() {
        assert!(Envelope::decode("{\"type\":\"RESULT\"}").is_err());
        assert!(Envelope::decode("not json").is_err());
    }

    #[test]
    fn payload_from_roll_uses_kept_face() {
        let roll = RawRoll::from_faces(build_roll_formula(RollMode::Disadvantage, Some(4)), vec![20, 1]);
        let payload = ResultPayload::from_roll(EntrantId::from("a"), &roll);
        assert_eq!(payload.total, 5);
        assert_eq!(payload.modifier, 4);
        assert!(!payload.is_crit);
        assert!(payload.is_fumble);
        assert_eq!(payload.roll_mode, RollMode::Disadvantage);
    }
}
