use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::astronomicon::{self, TreeNode};
use crate::endpoints::Endpoint;
use crate::envelope::{self, Fault};
use crate::signaller::Signaller;

const FACTION_PAGE_LIMIT: u64 = 20;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub reset_date: String,
    pub description: String,
    pub stats: ServerStats,
    pub server_resets: ServerResets,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ServerStats {
    pub agents: i64,
    pub ships: i64,
    pub systems: i64,
    pub waypoints: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ServerResets {
    pub next: String,
    pub frequency: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub headquarters: String,
    #[serde(default)]
    pub is_recruiting: bool,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
struct PageMeta {
    total: u64,
    page: u64,
    limit: u64,
}

/// `GET /`, which answers without the data envelope
pub async fn fetch_status(signaller: &Signaller) -> Result<ServerStatus, Fault> {
    let response = signaller.get_anonymous(Endpoint::Status.path()).await?;
    let body = envelope::classify_bare(&response)?;
    ServerStatus::deserialize(body).map_err(|e| {
        tracing::debug!("Could not decode server status: {}", e);
        Fault::unrecognized(&response)
    })
}

/// Every faction currently accepting new agents, across all pages
pub async fn fetch_factions(signaller: &Signaller) -> Result<Vec<Faction>, Fault> {
    let mut recruiting = Vec::new();
    let mut page = 1;
    loop {
        let path = format!(
            "{}?page={}&limit={}",
            Endpoint::Factions.path(),
            page,
            FACTION_PAGE_LIMIT
        );
        let response = signaller.get_anonymous(&path).await?;
        let data = envelope::classify(&response)?;
        let factions: Vec<Faction> = Vec::deserialize(data).map_err(|e| {
            tracing::debug!("Could not decode factions page {}: {}", page, e);
            Fault::unrecognized(&response)
        })?;
        let fetched = factions.len();
        recruiting.extend(factions.into_iter().filter(|f| f.is_recruiting));

        let meta = response
            .body
            .get("meta")
            .and_then(|meta| PageMeta::deserialize(meta).ok());
        match meta {
            Some(meta)
                if fetched > 0
                    && meta.page >= page
                    && meta.page.saturating_mul(meta.limit) < meta.total =>
            {
                page = meta.page.saturating_add(1)
            }
            _ => break,
        }
    }
    tracing::debug!("{} recruiting factions", recruiting.len());
    Ok(recruiting)
}

pub async fn fetch_ships(signaller: &Signaller) -> Result<TreeNode, Fault> {
    fetch_tree(signaller, Endpoint::Ships, "Ships").await
}

pub async fn fetch_contracts(signaller: &Signaller) -> Result<TreeNode, Fault> {
    fetch_tree(signaller, Endpoint::Contracts, "Contracts").await
}

async fn fetch_tree(
    signaller: &Signaller,
    endpoint: Endpoint,
    root_label: &str,
) -> Result<TreeNode, Fault> {
    tracing::debug!("Fetching {} tree", endpoint);
    let response = signaller.get(endpoint.path()).await?;
    let data: &Value = envelope::classify(&response)?;
    Ok(astronomicon::render(root_label, data))
}
