//! Argument bundles for facade calls with many small integer parameters.

use serde::{Deserialize, Serialize};

/// Per-player setup passed to `set_player_info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player: i32,
    pub life_points: i32,
    pub starting_hand: i32,
    pub draw_count: i32,
}

/// A card to place with `new_card`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub code: u32,
    pub owner: u8,
    pub player: u8,
    pub location: u8,
    pub sequence: u8,
    pub position: u8,
}

/// Target of a single-card `query_card`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardQuery {
    pub player: u8,
    pub location: u8,
    pub sequence: u8,
    /// Which properties to include.
    pub flags: i32,
    /// Let the engine omit properties unchanged since the last cached query.
    pub cache: bool,
}

/// Target of a whole-location `query_field_card`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldQuery {
    pub player: u8,
    pub location: u8,
    pub flags: i32,
    pub cache: bool,
}
