use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::matrix::Competitor;

/// Character select order of the observed game; indices are stable.
pub const MELEE_CHARACTERS: [&str; 26] = [
    "CAPTAIN_FALCON",
    "DONKEY_KONG",
    "FOX",
    "GAME_AND_WATCH",
    "KIRBY",
    "BOWSER",
    "LINK",
    "LUIGI",
    "MARIO",
    "MARTH",
    "MEWTWO",
    "NESS",
    "PEACH",
    "PIKACHU",
    "ICE_CLIMBERS",
    "JIGGLYPUFF",
    "SAMUS",
    "YOSHI",
    "ZELDA",
    "SHEIK",
    "FALCO",
    "YOUNG_LINK",
    "DR_MARIO",
    "ROY",
    "PICHU",
    "GANONDORF",
];

static MELEE_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    MELEE_CHARACTERS
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect()
});

/// Names for competitor indices. The engine itself never needs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn melee() -> Self {
        Self::new(MELEE_CHARACTERS.iter().map(|s| s.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, competitor: Competitor) -> Option<&str> {
        self.names.get(competitor.index()).map(String::as_str)
    }

    /// Name, or `#index` for competitors past the end of the roster.
    pub fn label(&self, competitor: Competitor) -> String {
        self.name(competitor)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", competitor.index()))
    }

    pub fn find(&self, name: &str) -> Option<Competitor> {
        let wanted = name.trim();
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(wanted))
            .map(Competitor)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::melee()
    }
}

/// Index of a built-in character by its exact constant name.
pub fn melee_character(name: &str) -> Option<Competitor> {
    MELEE_INDEX.get(name).copied().map(Competitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn melee_roster_round_trips_names() {
        let roster = Roster::melee();
        assert_eq!(roster.len(), 26);
        assert_eq!(roster.name(Competitor(2)), Some("FOX"));
        assert_eq!(roster.find("marth"), Some(Competitor(9)));
        assert_eq!(melee_character("GANONDORF"), Some(Competitor(25)));
        assert_eq!(melee_character("ganondorf"), None);
        assert_eq!(roster.label(Competitor(40)), "#40");
    }
}
