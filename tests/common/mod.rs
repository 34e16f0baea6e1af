//! In-process fake engine shared by the integration tests.
//!
//! Implements the engine ABI with plain Rust functions so the host can be
//! exercised without a native module. Behaviour:
//!
//! - Handles are slot indices and get recycled after `end_duel`
//! - `new_card` pulls card data through the installed card reader
//! - `preload_script` pulls the script through the installed script reader
//!   and keeps its text as the duel's log line
//! - `process` emits `[step, card_count, response_tag]`, waits for a
//!   response until step 3, then reports the end of the duel

#![allow(dead_code)]

use std::ffi::{c_char, c_int, c_void};
use std::ptr;
use std::sync::Arc;

use parking_lot::{const_mutex, Mutex};

use ocg_host::abi::{
    CardReaderFn, DuelPtr, EngineApi, EngineModule, ScriptReaderFn, CARD_FOUND, LOG_CAPACITY,
    QUERY_CAPACITY, RESPONSE_SIZE,
};
use ocg_host::{CardRecord, CardStore, DuelHost, ScriptStore};

/// Seed whose duels report a message length larger than any buffer.
pub const OVERSIZED_SEED: u32 = 0xDEAD;

/// Query flags that make `query_card` over-report its length.
pub const OVERSIZED_QUERY: i32 = -1;

struct PlacedCard {
    code: u32,
    owner: u8,
    player: u8,
    location: u8,
    position: u8,
    attack: i32,
}

struct FakeDuel {
    seed: u32,
    life_points: Vec<i32>,
    started: Option<i32>,
    cards: Vec<PlacedCard>,
    steps: u8,
    response: Option<Vec<u8>>,
    pending: Vec<u8>,
    log: String,
}

impl FakeDuel {
    fn new(seed: u32) -> Self {
        Self {
            seed,
            life_points: Vec::new(),
            started: None,
            cards: Vec::new(),
            steps: 0,
            response: None,
            pending: Vec::new(),
            log: String::new(),
        }
    }

    fn at(&self, player: u8, location: u8) -> impl Iterator<Item = &PlacedCard> {
        self.cards
            .iter()
            .filter(move |card| card.player == player && card.location == location)
    }
}

static DUELS: Mutex<Vec<Option<FakeDuel>>> = const_mutex(Vec::new());
static CARD_READER: Mutex<Option<CardReaderFn>> = const_mutex(None);
static SCRIPT_READER: Mutex<Option<ScriptReaderFn>> = const_mutex(None);
static ENDED_SEEDS: Mutex<Vec<u32>> = const_mutex(Vec::new());

fn with_duel<R>(duel: DuelPtr, f: impl FnOnce(&mut FakeDuel) -> R) -> R {
    let mut duels = DUELS.lock();
    let slot = duels
        .get_mut(duel as usize - 1)
        .and_then(Option::as_mut)
        .expect("fake engine called with a dead handle");
    f(slot)
}

unsafe fn write_out(out: *mut u8, bytes: &[u8]) -> i32 {
    ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
    bytes.len() as i32
}

fn load_card(code: u32) -> Option<CardRecord> {
    let reader = (*CARD_READER.lock())?;
    let mut record = CardRecord::default();
    let status = unsafe { reader(code, (&mut record as *mut CardRecord).cast()) };
    (status == CARD_FOUND).then_some(record)
}

unsafe extern "C" fn create_duel(seed: u32) -> DuelPtr {
    let mut duels = DUELS.lock();
    let index = match duels.iter().position(Option::is_none) {
        Some(index) => {
            duels[index] = Some(FakeDuel::new(seed));
            index
        }
        None => {
            duels.push(Some(FakeDuel::new(seed)));
            duels.len() - 1
        }
    };
    (index + 1) as DuelPtr
}

unsafe extern "C" fn start_duel(duel: DuelPtr, options: i32) {
    with_duel(duel, |d| d.started = Some(options));
}

unsafe extern "C" fn end_duel(duel: DuelPtr) {
    let ended = DUELS.lock().get_mut(duel as usize - 1).and_then(Option::take);
    if let Some(ended) = ended {
        ENDED_SEEDS.lock().push(ended.seed);
    }
}

unsafe extern "C" fn set_player_info(
    duel: DuelPtr,
    player: i32,
    life_points: i32,
    _hand: i32,
    _draw: i32,
) {
    with_duel(duel, |d| {
        let index = player as usize;
        if d.life_points.len() <= index {
            d.life_points.resize(index + 1, 0);
        }
        d.life_points[index] = life_points;
    });
}

unsafe extern "C" fn get_log_message(duel: DuelPtr, out: *mut u8) {
    with_duel(duel, |d| {
        let bytes = d.log.as_bytes();
        let length = bytes.len().min(LOG_CAPACITY - 1);
        write_out(out, &bytes[..length]);
        *out.add(length) = 0;
    });
}

unsafe extern "C" fn get_message(duel: DuelPtr, out: *mut u8) -> i32 {
    with_duel(duel, |d| write_out(out, &d.pending))
}

unsafe extern "C" fn process(duel: DuelPtr) -> i32 {
    with_duel(duel, |d| {
        d.steps += 1;
        let tag = d
            .response
            .take()
            .and_then(|response| response.first().copied())
            .unwrap_or(0xFF);
        d.pending = vec![d.steps, d.cards.len() as u8, tag];

        let flags = if d.steps >= 3 { 0x2 } else { 0x1 };
        let length = if d.seed == OVERSIZED_SEED {
            0xFFFF
        } else {
            d.pending.len() as i32
        };
        (flags << 16) | length
    })
}

unsafe extern "C" fn new_card(
    duel: DuelPtr,
    code: u32,
    owner: u8,
    player: u8,
    location: u8,
    _sequence: u8,
    position: u8,
) {
    let attack = load_card(code).map_or(-1, |record| record.attack);
    with_duel(duel, |d| {
        d.cards.push(PlacedCard {
            code,
            owner,
            player,
            location,
            position,
            attack,
        })
    });
}

unsafe extern "C" fn new_tag_card(duel: DuelPtr, code: u32, owner: u8, location: u8) {
    new_card(duel, code, owner, owner, location, 0, 0);
}

/// Writes `code, position, owner, cache` for the `sequence`-th card at
/// `(player, location)`.
unsafe extern "C" fn query_card(
    duel: DuelPtr,
    player: u8,
    location: u8,
    sequence: u8,
    flags: i32,
    out: *mut u8,
    use_cache: i32,
) -> i32 {
    with_duel(duel, |d| {
        if flags == OVERSIZED_QUERY {
            return QUERY_CAPACITY as i32 + 100;
        }
        let Some(card) = d.at(player, location).nth(usize::from(sequence)) else {
            return 0;
        };
        let mut bytes = card.code.to_le_bytes().to_vec();
        bytes.extend([card.position, card.owner, use_cache as u8]);
        write_out(out, &bytes)
    })
}

unsafe extern "C" fn query_field_count(duel: DuelPtr, player: u8, location: u8) -> i32 {
    with_duel(duel, |d| d.at(player, location).count() as i32)
}

/// Writes `code, attack` for every card at `(player, location)`.
unsafe extern "C" fn query_field_card(
    duel: DuelPtr,
    player: u8,
    location: u8,
    _flags: i32,
    out: *mut u8,
    _use_cache: i32,
) -> i32 {
    with_duel(duel, |d| {
        let bytes: Vec<u8> = d
            .at(player, location)
            .flat_map(|card| card.code.to_le_bytes().into_iter().chain(card.attack.to_le_bytes()))
            .collect();
        write_out(out, &bytes)
    })
}

/// Writes the start options followed by each player's life points.
unsafe extern "C" fn query_field_info(duel: DuelPtr, out: *mut u8) -> i32 {
    with_duel(duel, |d| {
        let mut bytes = d.started.unwrap_or(-1).to_le_bytes().to_vec();
        for life_points in &d.life_points {
            bytes.extend(life_points.to_le_bytes());
        }
        write_out(out, &bytes)
    })
}

unsafe extern "C" fn set_responsei(duel: DuelPtr, value: i32) {
    with_duel(duel, |d| d.response = Some(value.to_le_bytes().to_vec()));
}

unsafe extern "C" fn set_responseb(duel: DuelPtr, response: *mut u8) {
    let bytes = std::slice::from_raw_parts(response, RESPONSE_SIZE).to_vec();
    with_duel(duel, |d| d.response = Some(bytes));
}

unsafe extern "C" fn preload_script(duel: DuelPtr, name: *const c_char, _length: i32) -> i32 {
    let Some(reader) = *SCRIPT_READER.lock() else {
        return 0;
    };
    let mut length: c_int = 0;
    let content = reader(name, &mut length);
    if content.is_null() {
        return 0;
    }
    let bytes = std::slice::from_raw_parts(content, length as usize);
    let text = String::from_utf8_lossy(bytes).into_owned();
    with_duel(duel, |d| d.log = text);
    i32::from(length > 0)
}

unsafe extern "C" fn set_script_reader(reader: ScriptReaderFn) {
    *SCRIPT_READER.lock() = Some(reader);
}

unsafe extern "C" fn set_card_reader(reader: CardReaderFn) {
    *CARD_READER.lock() = Some(reader);
}

/// The fake engine's entry points.
pub fn fake_api() -> EngineApi {
    EngineApi {
        create_duel,
        start_duel,
        end_duel,
        set_player_info,
        get_log_message,
        get_message,
        process,
        new_card,
        new_tag_card,
        query_card,
        query_field_count,
        query_field_card,
        query_field_info,
        set_responsei,
        set_responseb,
        preload_script,
        set_script_reader,
        set_card_reader,
    }
}

/// The fake engine's entry points as named addresses.
pub fn fake_symbols() -> Vec<(&'static str, *const c_void)> {
    vec![
        ("create_duel", create_duel as *const c_void),
        ("start_duel", start_duel as *const c_void),
        ("end_duel", end_duel as *const c_void),
        ("set_player_info", set_player_info as *const c_void),
        ("get_log_message", get_log_message as *const c_void),
        ("get_message", get_message as *const c_void),
        ("process", process as *const c_void),
        ("new_card", new_card as *const c_void),
        ("new_tag_card", new_tag_card as *const c_void),
        ("query_card", query_card as *const c_void),
        ("query_field_count", query_field_count as *const c_void),
        ("query_field_card", query_field_card as *const c_void),
        ("query_field_info", query_field_info as *const c_void),
        ("set_responsei", set_responsei as *const c_void),
        ("set_responseb", set_responseb as *const c_void),
        ("preload_script", preload_script as *const c_void),
        ("set_script_reader", set_script_reader as *const c_void),
        ("set_card_reader", set_card_reader as *const c_void),
    ]
}

pub fn fake_module() -> EngineModule {
    unsafe { EngineModule::from_api(fake_api()) }
}

/// Card store where each `(code, attack)` pair becomes a record.
pub fn cards(entries: &[(u32, i32)]) -> CardStore {
    entries
        .iter()
        .map(|&(code, attack)| CardRecord {
            attack,
            ..CardRecord::new(code)
        })
        .collect()
}

pub fn scripts(entries: &[(&str, &str)]) -> ScriptStore {
    let mut store = ScriptStore::new();
    for (name, content) in entries {
        store.add(*name, *content);
    }
    store
}

/// A host over the fake engine with both sources bound.
pub fn fake_host(card_entries: &[(u32, i32)], script_entries: &[(&str, &str)]) -> DuelHost {
    let mut host = DuelHost::new(fake_module());
    host.bind_data(Arc::new(cards(card_entries))).expect("no duels open");
    host.bind_scripts(Arc::new(scripts(script_entries))).expect("no duels open");
    host
}

/// Seeds of every fake duel ended so far.
pub fn ended_seeds() -> Vec<u32> {
    ENDED_SEEDS.lock().clone()
}

/// Decode `query_field_card` output into `(code, attack)` pairs.
pub fn field_cards(bytes: &[u8]) -> Vec<(u32, i32)> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let code = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let attack = i32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            (code, attack)
        })
        .collect()
}
