/// Paths on the game server, relative to the configured base url
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Agent,
    Register,
    Factions,
    Ships,
    Contracts,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Status => "/",
            Endpoint::Agent => "/my/agent",
            Endpoint::Register => "/register",
            Endpoint::Factions => "/factions",
            Endpoint::Ships => "/my/ships",
            Endpoint::Contracts => "/my/contracts",
        }
    }
}
