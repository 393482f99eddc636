pub mod profile;

use reqwest::Method;
use serde_json::json;

use crate::endpoints::Endpoint;
use crate::envelope::{self, Fault};
use crate::signaller::{RawResponse, Signaller};
pub use profile::{AgentEnvelope, AgentPhase, AgentProfile, AgentRecord};

/// Tracks the single authenticated agent: fetches its profile, registers new agents,
/// and records the last error in place of the profile when a call fails.
pub struct CaptainsLog {
    signaller: Signaller,
    record: AgentRecord,
}

impl CaptainsLog {
    pub fn new(signaller: Signaller) -> Self {
        Self {
            signaller,
            record: AgentRecord::default(),
        }
    }

    pub fn record(&self) -> &AgentRecord {
        &self.record
    }

    pub fn signaller(&self) -> &Signaller {
        &self.signaller
    }

    /// Updates the record from `response`, or from a fresh `GET /my/agent` when none is given
    pub async fn refresh(&mut self, response: Option<RawResponse>) {
        let response = match response {
            Some(response) => response,
            None => match self.signaller.get(Endpoint::Agent.path()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Agent refresh failed: {}", e);
                    self.record.record_fault(e.into());
                    return;
                }
            },
        };
        match decode_agent(&response) {
            Ok(envelope) => self.populate(envelope.into_agent()),
            Err(fault) => {
                tracing::warn!("Agent refresh returned an error: {}", fault);
                self.record.record_fault(fault);
            }
        }
    }

    /// Registers a new agent. On success the returned token becomes the session token
    /// and the record is populated from the same response.
    pub async fn register(&mut self, symbol: &str, faction: &str) {
        let payload = json!({
            "symbol": symbol,
            "faction": faction.to_uppercase(),
        });
        tracing::info!("Registering agent {} with faction {}", symbol, payload["faction"]);
        let response = match self
            .signaller
            .request_anonymous(Method::POST, Endpoint::Register.path(), Some(payload))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Registration of {} failed: {}", symbol, e);
                self.record.record_fault(e.into());
                return;
            }
        };
        match decode_agent(&response) {
            Ok(AgentEnvelope::Registration {
                agent,
                token: Some(token),
            }) => {
                self.signaller.set_token(token);
                tracing::info!("Registered agent {}", agent.symbol);
                self.populate(agent);
            }
            Ok(AgentEnvelope::Profile(_) | AgentEnvelope::Registration { token: None, .. }) => {
                let fault = Fault::unrecognized(&response);
                tracing::warn!("Registration response carried no token: {}", fault);
                self.record.record_fault(fault);
            }
            Err(fault) => {
                tracing::warn!("Registration of {} rejected: {}", symbol, fault);
                self.record.record_fault(fault);
            }
        }
    }

    fn populate(&mut self, agent: AgentProfile) {
        tracing::debug!("Agent {} refreshed, {} credits", agent.symbol, agent.credits);
        self.record.populate(agent);
    }
}

fn decode_agent(response: &RawResponse) -> Result<AgentEnvelope, Fault> {
    let data = envelope::classify(response)?;
    AgentEnvelope::decode(data).map_err(|e| {
        tracing::debug!("Could not decode agent: {}", e);
        Fault::unrecognized(response)
    })
}
