//! Bot identity and listener registry entries

use serde::{Deserialize, Serialize};

/// Connection identity of the IRC bot, read from the wiki configuration page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotData {
    pub name: String,
    pub server: String,
    /// Empty when the server needs no password
    pub password: String,
    pub channel: String,
    pub auto_connect: bool,
}

impl BotData {
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

/// A notification listener declared by a wiki page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotListenerData {
    /// Compact identifier of the declaring document
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_wiki_defined: bool,
}

impl BotListenerData {
    pub fn wiki_defined(id: String, name: String, description: String) -> Self {
        Self {
            id,
            name,
            description,
            is_wiki_defined: true,
        }
    }
}
