use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::Fault;

/// The five profile fields the game reports for an agent
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub account_id: String,
    pub symbol: String,
    pub headquarters: String,
    pub credits: i64,
    pub starting_faction: String,
}

/// The two shapes an agent arrives in: bare from `GET /my/agent`,
/// or nested next to the new token from `POST /register`
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEnvelope {
    Profile(AgentProfile),
    Registration {
        agent: AgentProfile,
        token: Option<String>,
    },
}

impl AgentEnvelope {
    /// Decodes the unwrapped `data` value. The `agent` key is the discriminant.
    /// A missing token is left for the caller to judge; profile reads do not need one.
    pub fn decode(data: &Value) -> Result<Self, serde_json::Error> {
        match data.get("agent") {
            Some(agent) => Ok(AgentEnvelope::Registration {
                agent: AgentProfile::deserialize(agent)?,
                token: data.get("token").and_then(Value::as_str).map(str::to_string),
            }),
            None => Ok(AgentEnvelope::Profile(AgentProfile::deserialize(data)?)),
        }
    }

    pub fn into_agent(self) -> AgentProfile {
        match self {
            AgentEnvelope::Profile(agent) => agent,
            AgentEnvelope::Registration { agent, .. } => agent,
        }
    }
}

#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Unauthenticated,
    Populated,
    PopulatedWithError,
}

/// The authenticated agent as last seen. Profile fields keep their previous values
/// when a refresh fails; check `last_error` before trusting them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentRecord {
    pub profile: AgentProfile,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<Fault>,
}

impl AgentRecord {
    pub fn phase(&self) -> AgentPhase {
        match (self.last_updated, &self.last_error) {
            (None, _) => AgentPhase::Unauthenticated,
            (Some(_), None) => AgentPhase::Populated,
            (Some(_), Some(_)) => AgentPhase::PopulatedWithError,
        }
    }

    pub(super) fn populate(&mut self, profile: AgentProfile) {
        self.profile = profile;
        self.last_updated = Some(Utc::now());
        self.last_error = None;
    }

    pub(super) fn record_fault(&mut self, fault: Fault) {
        self.last_error = Some(fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_json() -> Value {
        json!({
            "accountId": "test-account1234",
            "symbol": "TEST-SYMBOL",
            "headquarters": "TEST-1234-5678",
            "credits": 123456,
            "startingFaction": "COSMIC",
        })
    }

    #[test]
    fn bare_profile_decodes() {
        match AgentEnvelope::decode(&profile_json()).unwrap() {
            AgentEnvelope::Profile(agent) => {
                assert_eq!(agent.account_id, "test-account1234");
                assert_eq!(agent.credits, 123456);
                assert_eq!(agent.starting_faction, "COSMIC");
            }
            other => panic!("expected a bare profile, got {:?}", other),
        }
    }

    #[test]
    fn nested_registration_decodes() {
        let data = json!({"agent": profile_json(), "token": "new-token", "ship": {}});
        match AgentEnvelope::decode(&data).unwrap() {
            AgentEnvelope::Registration { agent, token } => {
                assert_eq!(token.as_deref(), Some("new-token"));
                assert_eq!(agent.symbol, "TEST-SYMBOL");
            }
            other => panic!("expected a registration, got {:?}", other),
        }
    }

    #[test]
    fn extra_profile_fields_are_ignored() {
        let mut data = profile_json();
        data["shipCount"] = json!(2);
        assert!(AgentEnvelope::decode(&data).is_ok());
    }

    #[test]
    fn nested_agent_without_token_still_decodes() {
        match AgentEnvelope::decode(&json!({"agent": profile_json(), "token": 42})).unwrap() {
            AgentEnvelope::Registration { agent, token } => {
                assert_eq!(token, None);
                assert_eq!(agent.account_id, "test-account1234");
            }
            other => panic!("expected a registration, got {:?}", other),
        }
    }

    #[test]
    fn malformed_agents_are_rejected() {
        assert!(AgentEnvelope::decode(&json!({"symbol": "X"})).is_err());
        assert!(AgentEnvelope::decode(&json!({"agent": {"symbol": "X"}, "token": "t"})).is_err());
        let mut data = profile_json();
        data["credits"] = json!("lots");
        assert!(AgentEnvelope::decode(&data).is_err());
    }

    #[test]
    fn phases() {
        let mut record = AgentRecord::default();
        assert_eq!(record.phase(), AgentPhase::Unauthenticated);
        record.record_fault(Fault::Unrecognized {
            status: 500,
            body: String::new(),
        });
        assert_eq!(record.phase(), AgentPhase::Unauthenticated);
        record.populate(AgentProfile::default());
        assert_eq!(record.phase(), AgentPhase::Populated);
        record.record_fault(Fault::Unrecognized {
            status: 500,
            body: String::new(),
        });
        assert_eq!(record.phase(), AgentPhase::PopulatedWithError);
    }
}
