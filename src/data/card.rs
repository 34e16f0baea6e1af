//! Card records as the engine sees them.

use serde::{Deserialize, Serialize};

/// Type bit marking link monsters.
pub const TYPE_LINK: u32 = 0x0400_0000;

/// Static data for one card, laid out exactly like the engine's `card_data`.
///
/// The card reader copies this struct by value into memory the engine owns,
/// so field order and widths are part of the ABI.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRecord {
    pub code: u32,
    pub alias: u32,
    /// Archetype membership, four 16-bit set codes packed together.
    pub setcode: u64,
    #[serde(rename = "type")]
    pub card_type: u32,
    pub level: u32,
    pub attribute: u32,
    pub race: u32,
    pub attack: i32,
    pub defense: i32,
    pub lscale: u32,
    pub rscale: u32,
    pub link_marker: u32,
}

impl CardRecord {
    /// Create a record with only its code set.
    #[must_use]
    pub fn new(code: u32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Decode a row of the card database's `datas` table.
    ///
    /// The database packs pendulum scales into the level column and stores
    /// link markers in the defense column of link monsters.
    ///
    /// ```
    /// use ocg_host::data::{CardRecord, CdbRow, TYPE_LINK};
    ///
    /// let row = CdbRow {
    ///     id: 1861629,
    ///     card_type: (0x1 | TYPE_LINK) as i64,
    ///     level: 3,
    ///     attack: 2300,
    ///     defense: 0x1 | 0x4 | 0x40,
    ///     ..CdbRow::default()
    /// };
    /// let card = CardRecord::from_cdb(&row);
    /// assert_eq!(card.defense, 0);
    /// assert_eq!(card.link_marker, 0x45);
    /// ```
    #[must_use]
    pub fn from_cdb(row: &CdbRow) -> Self {
        let card_type = row.card_type as u32;
        let level = row.level as u32;
        let is_link = card_type & TYPE_LINK != 0;

        Self {
            code: row.id,
            alias: row.alias,
            setcode: row.setcode as u64,
            card_type,
            level: level & 0xFF,
            attribute: row.attribute,
            race: row.race,
            attack: row.attack,
            defense: if is_link { 0 } else { row.defense },
            lscale: (level >> 24) & 0xFF,
            rscale: (level >> 16) & 0xFF,
            link_marker: if is_link { row.defense as u32 } else { 0 },
        }
    }

    /// Is this a link monster?
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.card_type & TYPE_LINK != 0
    }
}

/// One raw row of the card database, before unpacking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdbRow {
    pub id: u32,
    pub alias: u32,
    pub setcode: i64,
    #[serde(rename = "type")]
    pub card_type: i64,
    pub attack: i32,
    pub defense: i32,
    pub level: i64,
    pub race: u32,
    pub attribute: u32,
}
