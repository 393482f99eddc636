//! Interactive application state. Everything here reads the core's results;
//! the only mutations of session state go through `CaptainsLog`.

use crate::captains_log::CaptainsLog;
use crate::duties::{self, Faction, ServerStatus};
use crate::envelope::Fault;
use crate::identity_manager::IdentityManager;
use crate::ui::tree_view::TreeView;

#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Status,
    Agent,
    Ships,
    Contracts,
    Factions,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Status,
        Tab::Agent,
        Tab::Ships,
        Tab::Contracts,
        Tab::Factions,
    ];

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn previous(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Symbol,
    Faction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Login {
        input: String,
    },
    Register {
        symbol: String,
        faction: String,
        field: RegisterField,
        error: Option<String>,
    },
    Registered {
        token: String,
    },
}

impl Overlay {
    pub fn register() -> Self {
        Overlay::Register {
            symbol: String::new(),
            faction: "COSMIC".to_string(),
            field: RegisterField::Symbol,
            error: None,
        }
    }
}

/// Network work requested by a key press, run by the main loop between frames
#[derive(strum_macros::Display, Debug, Clone, PartialEq)]
pub enum Pending {
    Refresh(Tab),
    Login(String),
    Register { symbol: String, faction: String },
    SaveToken,
}

pub struct App {
    pub captains_log: CaptainsLog,
    identity: IdentityManager,
    pub tab: Tab,
    pub server_status: Option<Result<ServerStatus, Fault>>,
    pub factions: Option<Result<Vec<Faction>, Fault>>,
    pub ships: Option<Result<TreeView, Fault>>,
    pub contracts: Option<Result<TreeView, Fault>>,
    pub overlay: Option<Overlay>,
    pub pending: Option<Pending>,
    /// Text for the main loop to hand to the terminal clipboard
    pub clipboard: Option<String>,
    status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(captains_log: CaptainsLog, identity: IdentityManager) -> Self {
        let overlay = if captains_log.signaller().token().is_none() {
            Some(Overlay::Login {
                input: String::new(),
            })
        } else {
            None
        };
        Self {
            captains_log,
            identity,
            tab: Tab::default(),
            server_status: None,
            factions: None,
            ships: None,
            contracts: None,
            overlay,
            pending: Some(Pending::Refresh(Tab::Status)),
            clipboard: None,
            status_message: None,
            should_quit: false,
        }
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Switches tab, fetching its content the first time it is shown
    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        let loaded = match tab {
            Tab::Status => self.server_status.is_some(),
            Tab::Agent => self.captains_log.record().last_updated.is_some(),
            Tab::Ships => self.ships.is_some(),
            Tab::Contracts => self.contracts.is_some(),
            Tab::Factions => self.factions.is_some(),
        };
        if !loaded {
            self.pending = Some(Pending::Refresh(tab));
        }
    }

    pub fn tree_view_mut(&mut self) -> Option<&mut TreeView> {
        let slot = match self.tab {
            Tab::Ships => &mut self.ships,
            Tab::Contracts => &mut self.contracts,
            _ => return None,
        };
        slot.as_mut().and_then(|result| result.as_mut().ok())
    }

    pub async fn perform(&mut self, pending: Pending) {
        match pending {
            Pending::Refresh(tab) => self.refresh(tab).await,
            Pending::Login(token) => {
                self.captains_log.signaller().set_token(token);
                self.tab = Tab::Agent;
                self.refresh(Tab::Agent).await;
                self.ships = None;
                self.contracts = None;
            }
            Pending::Register { symbol, faction } => {
                self.captains_log.register(&symbol, &faction).await;
                let outcome = match &self.captains_log.record().last_error {
                    Some(fault) => Err(Some(fault.to_string())),
                    None => self.captains_log.signaller().token().ok_or(None),
                };
                match outcome {
                    Ok(token) => {
                        self.overlay = Some(Overlay::Registered { token });
                        self.tab = Tab::Agent;
                        self.ships = None;
                        self.contracts = None;
                        let message =
                            format!("Registered {}", self.captains_log.record().profile.symbol);
                        self.set_status(message);
                    }
                    Err(Some(message)) => {
                        self.overlay = Some(Overlay::Register {
                            symbol,
                            faction,
                            field: RegisterField::Symbol,
                            error: Some(message),
                        });
                    }
                    Err(None) => self.set_status("Registration returned no token"),
                }
            }
            Pending::SaveToken => {
                let token = self.captains_log.signaller().token();
                match self.identity.save_token(token.as_deref()) {
                    Ok(()) => {
                        let message = format!("Token saved to {}", self.identity.path().display());
                        self.set_status(message);
                    }
                    Err(e) => self.set_status(format!("Could not save token: {}", e)),
                }
            }
        }
    }

    async fn refresh(&mut self, tab: Tab) {
        let signaller = self.captains_log.signaller().clone();
        match tab {
            Tab::Status => self.server_status = Some(duties::fetch_status(&signaller).await),
            Tab::Agent => self.captains_log.refresh(None).await,
            Tab::Ships => {
                self.ships = Some(duties::fetch_ships(&signaller).await.map(TreeView::new))
            }
            Tab::Contracts => {
                self.contracts = Some(duties::fetch_contracts(&signaller).await.map(TreeView::new))
            }
            Tab::Factions => self.factions = Some(duties::fetch_factions(&signaller).await),
        }
        self.set_status(format!("{} refreshed", tab));
    }
}
