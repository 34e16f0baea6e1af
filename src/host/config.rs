//! Host and duel configuration.
//!
//! - `HostConfig`: Where the engine module, card data and scripts live
//! - `DuelOptions`: Everything needed to set up one duel
//! - `DeckList`: One player's main and extra deck

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::seed::SeedStream;

/// Configuration for building a `DuelHost` in one step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Path to the engine shared library.
    pub engine_path: PathBuf,

    /// JSON card database dump. Ignored when `card_snapshot` is set.
    #[serde(default)]
    pub card_database: Option<PathBuf>,

    /// Bincode card snapshot written by `CardStore::to_snapshot`.
    #[serde(default)]
    pub card_snapshot: Option<PathBuf>,

    /// Directory of scripts, keyed by path relative to it.
    #[serde(default)]
    pub script_root: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new(libloading::library_filename("ocgcore"))
    }
}

impl HostConfig {
    /// Create a config for the engine at `engine_path` with no data sources.
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            card_database: None,
            card_snapshot: None,
            script_root: None,
        }
    }

    #[must_use]
    pub fn with_card_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.card_database = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_card_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.card_snapshot = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_script_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_root = Some(path.into());
        self
    }
}

/// One player's deck, as card codes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub main: Vec<u32>,
    #[serde(default)]
    pub extra: Vec<u32>,
}

impl DeckList {
    pub fn new(main: impl Into<Vec<u32>>, extra: impl Into<Vec<u32>>) -> Self {
        Self {
            main: main.into(),
            extra: extra.into(),
        }
    }
}

/// Parameters for `DuelHost::setup_duel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelOptions {
    /// Seed passed to `create_duel`.
    pub seed: u32,

    /// Starting life points for every player.
    pub life_points: i32,

    /// Cards drawn into the opening hand.
    pub starting_hand: i32,

    /// Cards drawn per draw phase.
    pub draw_count: i32,

    /// Rule-variant bitmask passed to `start_duel`.
    pub engine_options: i32,

    /// Decks, indexed by player.
    pub players: Vec<DeckList>,
}

impl Default for DuelOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            life_points: 8000,
            starting_hand: 5,
            draw_count: 1,
            engine_options: 0,
            players: Vec::new(),
        }
    }
}

impl DuelOptions {
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Take the seed from a `SeedStream`.
    #[must_use]
    pub fn with_seed_from(self, seeds: &mut SeedStream) -> Self {
        self.with_seed(seeds.next_seed())
    }

    #[must_use]
    pub fn with_life_points(mut self, life_points: i32) -> Self {
        self.life_points = life_points;
        self
    }

    #[must_use]
    pub fn with_starting_hand(mut self, cards: i32) -> Self {
        self.starting_hand = cards;
        self
    }

    #[must_use]
    pub fn with_draw_count(mut self, cards: i32) -> Self {
        self.draw_count = cards;
        self
    }

    #[must_use]
    pub fn with_engine_options(mut self, options: i32) -> Self {
        self.engine_options = options;
        self
    }

    /// Append a player with the given deck.
    #[must_use]
    pub fn with_player(mut self, deck: DeckList) -> Self {
        self.players.push(deck);
        self
    }
}
