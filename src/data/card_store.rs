//! In-memory card database.
//!
//! `CardStore` is the default `DataSource`. It can be filled record by
//! record, from the JSON database dump, or from a bincode snapshot.

use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};

use super::card::CardRecord;
use super::source::DataSource;
use crate::error::HostError;

/// Card records keyed by code.
///
/// ## Example
///
/// ```
/// use ocg_host::data::{CardRecord, CardStore, DataSource};
///
/// let mut store = CardStore::new();
/// assert!(store.add(CardRecord { attack: 3000, ..CardRecord::new(89631139) }));
///
/// assert_eq!(store.card(89631139).map(|c| c.attack), Some(3000));
/// assert!(store.card(1).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardStore {
    by_code: FxHashMap<u32, CardRecord>,
}

impl CardStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record unless one with the same code exists.
    ///
    /// Returns `true` if the record was inserted. Stored records are never
    /// replaced.
    pub fn add(&mut self, record: CardRecord) -> bool {
        match self.by_code.entry(record.code) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Get a record by code.
    #[must_use]
    pub fn get(&self, code: u32) -> Option<&CardRecord> {
        self.by_code.get(&code)
    }

    /// Check if a code is stored.
    #[must_use]
    pub fn contains(&self, code: u32) -> bool {
        self.by_code.contains_key(&code)
    }

    /// All stored codes, ascending.
    #[must_use]
    pub fn keys(&self) -> Vec<u32> {
        let mut keys: Vec<u32> = self.by_code.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Iterate over all records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &CardRecord> {
        self.by_code.values()
    }

    /// Read the JSON database dump: an array of card objects.
    ///
    /// `setcode` may be a number or a decimal string, since the dump writes
    /// it as a string to keep all 64 bits. Unrelated fields such as names
    /// and card text are ignored.
    pub fn from_json(reader: impl Read) -> Result<Self, serde_json::Error> {
        let dumped: Vec<DumpedCard> = serde_json::from_reader(reader)?;
        Ok(dumped.into_iter().map(CardRecord::from).collect())
    }

    /// Load the JSON database dump from a file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| HostError::io(path, e))?;
        Ok(Self::from_json(std::io::BufReader::new(file))?)
    }

    /// Encode every record as a compact bincode snapshot.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, bincode::Error> {
        let mut records: Vec<&CardRecord> = self.by_code.values().collect();
        records.sort_unstable_by_key(|record| record.code);
        bincode::serialize(&records)
    }

    /// Decode a snapshot produced by `to_snapshot`.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, bincode::Error> {
        let records: Vec<CardRecord> = bincode::deserialize(bytes)?;
        Ok(records.into_iter().collect())
    }

    /// Load a snapshot file.
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| HostError::io(path, e))?;
        Ok(Self::from_snapshot(&bytes)?)
    }
}

impl DataSource for CardStore {
    fn card(&self, code: u32) -> Option<CardRecord> {
        self.get(code).copied()
    }
}

impl FromIterator<CardRecord> for CardStore {
    fn from_iter<I: IntoIterator<Item = CardRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl Extend<CardRecord> for CardStore {
    fn extend<I: IntoIterator<Item = CardRecord>>(&mut self, iter: I) {
        for record in iter {
            self.add(record);
        }
    }
}

/// A card as it appears in the JSON dump.
#[derive(Deserialize)]
struct DumpedCard {
    code: u32,
    #[serde(default)]
    alias: u32,
    #[serde(default, deserialize_with = "setcode_from_dump")]
    setcode: u64,
    #[serde(rename = "type")]
    card_type: u32,
    #[serde(default)]
    level: u32,
    #[serde(default)]
    attribute: u32,
    #[serde(default)]
    race: u32,
    #[serde(default)]
    attack: i32,
    #[serde(default)]
    defense: i32,
    #[serde(default)]
    lscale: u32,
    #[serde(default)]
    rscale: u32,
    #[serde(default)]
    link_marker: u32,
}

impl From<DumpedCard> for CardRecord {
    fn from(card: DumpedCard) -> Self {
        Self {
            code: card.code,
            alias: card.alias,
            setcode: card.setcode,
            card_type: card.card_type,
            level: card.level,
            attribute: card.attribute,
            race: card.race,
            attack: card.attack,
            defense: card.defense,
            lscale: card.lscale,
            rscale: card.rscale,
            link_marker: card.link_marker,
        }
    }
}

fn setcode_from_dump<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Setcode {
        Number(u64),
        Text(String),
    }

    match Setcode::deserialize(deserializer)? {
        Setcode::Number(value) => Ok(value),
        Setcode::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
