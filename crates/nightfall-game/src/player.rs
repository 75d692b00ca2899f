use nightfall_protocol::PlayerId;

use crate::Role;

/// One seat at the table.
///
/// `id` is the connection currently bound to the seat; `name` is what
/// survives a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>,
    pub is_alive: bool,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id,
            name: name.into(),
            role: None,
            is_alive: true,
            is_host,
        }
    }

    /// Display names match without regard to case.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

pub(crate) fn find(roster: &[Player], id: PlayerId) -> Option<&Player> {
    roster.iter().find(|p| p.id == id)
}

pub(crate) fn find_mut(roster: &mut [Player], id: PlayerId) -> Option<&mut Player> {
    roster.iter_mut().find(|p| p.id == id)
}
