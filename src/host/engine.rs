//! The duel host facade.
//!
//! `DuelHost` owns one engine module, one set of data sources and every duel
//! created through it. Callers only ever see `DuelId`s; engine handles never
//! leave this module.
//!
//! Every call follows the same order:
//!
//! 1. Resolve the `DuelId` through the registry
//! 2. Check the module has not been released
//! 3. Enter the engine critical section, routing callbacks to this host
//! 4. Call the engine

use std::ffi::CString;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use super::config::{DuelOptions, HostConfig};
use super::request::{CardQuery, FieldQuery, NewCard, PlayerInfo};
use crate::abi::{
    location, position, DuelPtr, EngineApi, EngineModule, LOG_CAPACITY, MESSAGE_CAPACITY,
    QUERY_CAPACITY,
};
use crate::data::{CardStore, DataSource, ScriptSource, ScriptStore};
use crate::error::{HostError, LoadError, UsageError};
use crate::session::buffer::{c_text, output_buffer, trim_to_reported};
use crate::session::router::{self, SessionOwner, SessionSources};
use crate::session::{DuelId, PackedProcess, ProcessOutput, ResponseBuffer, SessionRegistry};

/// Host for duels running inside one engine module.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ocg_host::{CardStore, DuelHost, ScriptStore};
///
/// let mut host = DuelHost::load("./libocgcore.so")?;
/// host.bind_data(Arc::new(CardStore::load_json("cards.json")?))?;
/// host.bind_scripts(Arc::new(ScriptStore::load_dir("script")?))?;
///
/// let duel = host.create_duel(1234)?;
/// let output = host.process(duel)?;
/// if output.flags.is_waiting() {
///     host.set_response_int(duel, 0)?;
/// }
/// host.end_duel(duel)?;
/// # Ok::<(), ocg_host::HostError>(())
/// ```
pub struct DuelHost {
    module: EngineModule,
    registry: SessionRegistry,
    sources: Arc<SessionSources>,
}

impl DuelHost {
    /// Wrap an already loaded module. No data sources are bound yet.
    pub fn new(module: EngineModule) -> Self {
        Self {
            module,
            registry: SessionRegistry::new(),
            sources: Arc::new(SessionSources::new(SessionOwner::next())),
        }
    }

    /// Load the engine at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        EngineModule::load(path).map(Self::new)
    }

    /// Load the engine and bind the data sources named in `config`.
    ///
    /// A card snapshot takes precedence over a JSON card database. Missing
    /// sources are bound as empty stores.
    pub fn from_config(config: &HostConfig) -> Result<Self, HostError> {
        let mut host = Self::load(&config.engine_path)?;

        let cards = match (&config.card_snapshot, &config.card_database) {
            (Some(snapshot), _) => CardStore::load_snapshot(snapshot)?,
            (None, Some(database)) => CardStore::load_json(database)?,
            (None, None) => CardStore::new(),
        };
        let scripts = match &config.script_root {
            Some(root) => ScriptStore::load_dir(root)?,
            None => ScriptStore::new(),
        };
        debug!(cards = cards.len(), scripts = scripts.len(), "host data loaded");

        host.bind_data(Arc::new(cards))?;
        host.bind_scripts(Arc::new(scripts))?;
        Ok(host)
    }

    /// Routing identity of this host.
    #[must_use]
    pub fn owner(&self) -> SessionOwner {
        self.sources.owner()
    }

    #[must_use]
    pub fn module(&self) -> &EngineModule {
        &self.module
    }

    /// Bind the card data source. Rejected while any duel is open.
    pub fn bind_data(&mut self, data: Arc<dyn DataSource>) -> Result<(), UsageError> {
        self.ensure_no_duels()?;
        self.sources = Arc::new(self.sources.with_data(data));
        Ok(())
    }

    /// Bind the script source. Rejected while any duel is open.
    pub fn bind_scripts(&mut self, scripts: Arc<dyn ScriptSource>) -> Result<(), UsageError> {
        self.ensure_no_duels()?;
        self.sources = Arc::new(self.sources.with_scripts(scripts));
        Ok(())
    }

    fn ensure_no_duels(&self) -> Result<(), UsageError> {
        if self.registry.is_empty() {
            Ok(())
        } else {
            Err(UsageError::DuelsOpen {
                open: self.registry.len(),
            })
        }
    }

    fn api(&self) -> Result<EngineApi, UsageError> {
        self.module.api().copied().ok_or(UsageError::ModuleReleased)
    }

    /// Resolve `id`, route callbacks to this host and run `f` with the
    /// engine handle.
    fn call<R>(
        &self,
        id: DuelId,
        f: impl FnOnce(&EngineApi, DuelPtr) -> R,
    ) -> Result<R, UsageError> {
        let duel = self.registry.lookup(id)?;
        let api = self.api()?;
        let _call = router::enter(&self.sources);
        Ok(f(&api, duel))
    }

    /// Is `id` a live duel of this host?
    #[must_use]
    pub fn contains(&self, id: DuelId) -> bool {
        self.registry.contains(id)
    }

    /// Live duel ids in creation order.
    #[must_use]
    pub fn live_duels(&self) -> Vec<DuelId> {
        self.registry.ids()
    }

    /// Create a duel seeded with `seed`.
    ///
    /// Both data sources must be bound first, since the engine may start
    /// reading cards and scripts during creation.
    pub fn create_duel(&mut self, seed: u32) -> Result<DuelId, UsageError> {
        let api = self.api()?;
        if !self.sources.has_data() {
            return Err(UsageError::SourcesNotBound("data"));
        }
        if !self.sources.has_scripts() {
            return Err(UsageError::SourcesNotBound("script"));
        }

        let duel = {
            let _call = router::enter(&self.sources);
            // SAFETY: `api` belongs to a module that is still loaded.
            unsafe { (api.create_duel)(seed) }
        };
        let id = self.registry.acquire(duel);
        debug!(%id, seed, "duel created");
        Ok(id)
    }

    /// Create a duel, register its players and decks, and start it.
    ///
    /// Player `n` in `options.players` owns and controls its own cards. Main
    /// deck cards go to the deck and extra deck cards to the extra deck, all
    /// face-down.
    ///
    /// More players than a byte can index are rejected before the duel is
    /// created.
    pub fn setup_duel(&mut self, options: &DuelOptions) -> Result<DuelId, UsageError> {
        let players = options
            .players
            .iter()
            .enumerate()
            .map(|(index, deck)| u8::try_from(index).map(|player| (player, deck)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| UsageError::TooManyPlayers {
                players: options.players.len(),
            })?;

        let id = self.create_duel(options.seed)?;

        for (player, deck) in players {
            self.set_player_info(
                id,
                PlayerInfo {
                    player: i32::from(player),
                    life_points: options.life_points,
                    starting_hand: options.starting_hand,
                    draw_count: options.draw_count,
                },
            )?;

            let placed = deck
                .main
                .iter()
                .map(|&code| (code, location::DECK))
                .chain(deck.extra.iter().map(|&code| (code, location::EXTRA)));
            for (code, zone) in placed {
                self.new_card(
                    id,
                    NewCard {
                        code,
                        owner: player,
                        player,
                        location: zone,
                        sequence: 0,
                        position: position::FACEDOWN,
                    },
                )?;
            }
        }

        self.start_duel(id, options.engine_options)?;
        debug!(%id, players = options.players.len(), "duel set up");
        Ok(id)
    }

    pub fn start_duel(&self, id: DuelId, options: i32) -> Result<(), UsageError> {
        // SAFETY: `duel` is live and `api` belongs to a loaded module.
        self.call(id, |api, duel| unsafe { (api.start_duel)(duel, options) })
    }

    /// End a duel. Its id is never valid again.
    pub fn end_duel(&mut self, id: DuelId) -> Result<(), UsageError> {
        self.call(id, |api, duel| {
            // SAFETY: `duel` is live and is removed from the registry below.
            unsafe { (api.end_duel)(duel) }
        })?;
        self.registry.release(id);
        debug!(%id, "duel ended");
        Ok(())
    }

    pub fn set_player_info(&self, id: DuelId, info: PlayerInfo) -> Result<(), UsageError> {
        // SAFETY: `duel` is live and `api` belongs to a loaded module.
        self.call(id, |api, duel| unsafe {
            (api.set_player_info)(
                duel,
                info.player,
                info.life_points,
                info.starting_hand,
                info.draw_count,
            )
        })
    }

    pub fn new_card(&self, id: DuelId, card: NewCard) -> Result<(), UsageError> {
        // SAFETY: `duel` is live and `api` belongs to a loaded module.
        self.call(id, |api, duel| unsafe {
            (api.new_card)(
                duel,
                card.code,
                card.owner,
                card.player,
                card.location,
                card.sequence,
                card.position,
            )
        })
    }

    /// Add a card to the tag-duel partner deck.
    pub fn new_tag_card(
        &self,
        id: DuelId,
        code: u32,
        owner: u8,
        location: u8,
    ) -> Result<(), UsageError> {
        // SAFETY: `duel` is live and `api` belongs to a loaded module.
        self.call(id, |api, duel| unsafe { (api.new_tag_card)(duel, code, owner, location) })
    }

    /// Advance the duel and collect the messages it produced.
    pub fn process(&self, id: DuelId) -> Result<ProcessOutput, UsageError> {
        self.call(id, |api, duel| {
            let mut buffer = output_buffer(MESSAGE_CAPACITY);
            // SAFETY: `buffer` holds `MESSAGE_CAPACITY` bytes, the most the
            // engine writes for one step.
            let packed = unsafe {
                let packed = PackedProcess::decode((api.process)(duel));
                (api.get_message)(duel, buffer.as_mut_ptr());
                packed
            };
            trace!(%id, length = packed.length, flags = packed.flags.bits(), "processed");
            ProcessOutput {
                messages: trim_to_reported(buffer, packed.length as i64, "process"),
                flags: packed.flags,
            }
        })
    }

    /// The engine's most recent log line for this duel.
    pub fn get_log_message(&self, id: DuelId) -> Result<String, UsageError> {
        self.call(id, |api, duel| {
            let mut buffer = [0u8; LOG_CAPACITY];
            // SAFETY: the engine writes at most `LOG_CAPACITY` bytes.
            unsafe { (api.get_log_message)(duel, buffer.as_mut_ptr()) };
            c_text(&buffer)
        })
    }

    /// Serialized properties of one card.
    pub fn query_card(&self, id: DuelId, query: CardQuery) -> Result<Vec<u8>, UsageError> {
        self.call(id, |api, duel| {
            let mut buffer = output_buffer(QUERY_CAPACITY);
            // SAFETY: `buffer` holds `QUERY_CAPACITY` bytes.
            let length = unsafe {
                (api.query_card)(
                    duel,
                    query.player,
                    query.location,
                    query.sequence,
                    query.flags,
                    buffer.as_mut_ptr(),
                    i32::from(query.cache),
                )
            };
            trace!(%id, length, "card queried");
            trim_to_reported(buffer, i64::from(length), "query_card")
        })
    }

    /// Number of cards in one location.
    pub fn query_field_count(
        &self,
        id: DuelId,
        player: u8,
        location: u8,
    ) -> Result<i32, UsageError> {
        // SAFETY: `duel` is live and `api` belongs to a loaded module.
        self.call(id, |api, duel| unsafe { (api.query_field_count)(duel, player, location) })
    }

    /// Serialized properties of every card in one location.
    pub fn query_field_card(&self, id: DuelId, query: FieldQuery) -> Result<Vec<u8>, UsageError> {
        self.call(id, |api, duel| {
            let mut buffer = output_buffer(QUERY_CAPACITY);
            // SAFETY: `buffer` holds `QUERY_CAPACITY` bytes.
            let length = unsafe {
                (api.query_field_card)(
                    duel,
                    query.player,
                    query.location,
                    query.flags,
                    buffer.as_mut_ptr(),
                    i32::from(query.cache),
                )
            };
            trace!(%id, length, "field queried");
            trim_to_reported(buffer, i64::from(length), "query_field_card")
        })
    }

    /// Snapshot of the whole field: life points, zones and chain.
    pub fn query_field_info(&self, id: DuelId) -> Result<Vec<u8>, UsageError> {
        self.call(id, |api, duel| {
            let mut buffer = output_buffer(QUERY_CAPACITY);
            // SAFETY: `buffer` holds `QUERY_CAPACITY` bytes.
            let length = unsafe { (api.query_field_info)(duel, buffer.as_mut_ptr()) };
            trim_to_reported(buffer, i64::from(length), "query_field_info")
        })
    }

    /// Answer a selection prompt with a full response buffer.
    ///
    /// `response` must be exactly `RESPONSE_SIZE` bytes; anything else is
    /// rejected before the engine is touched.
    pub fn set_response(&self, id: DuelId, response: &[u8]) -> Result<(), UsageError> {
        self.registry.lookup(id)?;
        let mut response = ResponseBuffer::try_from(response)?;
        // SAFETY: the engine reads exactly `RESPONSE_SIZE` bytes.
        self.call(id, |api, duel| unsafe { (api.set_responseb)(duel, response.as_mut_ptr()) })
    }

    /// Answer a selection prompt with a single integer.
    pub fn set_response_int(&self, id: DuelId, value: i32) -> Result<(), UsageError> {
        // SAFETY: `duel` is live and `api` belongs to a loaded module.
        self.call(id, |api, duel| unsafe { (api.set_responsei)(duel, value) })
    }

    /// Ask the engine to load a script before it is needed.
    ///
    /// The script is read back through this host's script source. Returns
    /// whether the engine accepted it.
    pub fn preload_script(&self, id: DuelId, name: &str) -> Result<bool, UsageError> {
        self.registry.lookup(id)?;
        let invalid = || UsageError::InvalidScriptName(name.to_owned());
        let c_name = CString::new(name).map_err(|_| invalid())?;
        let length = i32::try_from(name.len()).map_err(|_| invalid())?;
        // SAFETY: `c_name` outlives the call and `length` is its byte length.
        let loaded = self.call(id, |api, duel| unsafe {
            (api.preload_script)(duel, c_name.as_ptr(), length)
        })?;
        trace!(%id, script = name, loaded, "script preloaded");
        Ok(loaded != 0)
    }

    /// End every live duel and close the module. Idempotent.
    ///
    /// Afterwards every call fails: old ids are unknown and new duels cannot
    /// be created.
    pub fn release(&mut self) {
        let live = self.registry.drain();
        if let Some(api) = self.module.api().copied() {
            if !live.is_empty() {
                let _call = router::enter(&self.sources);
                for (id, duel) in &live {
                    // SAFETY: each handle was live until drained above.
                    unsafe { (api.end_duel)(*duel) };
                    debug!(%id, "duel ended on host release");
                }
            }
        }
        self.module.release();
        router::release_owner(self.sources.owner());
    }
}

impl Drop for DuelHost {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DuelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuelHost")
            .field("owner", &self.owner())
            .field("module", &self.module)
            .field("live_duels", &self.registry.len())
            .finish()
    }
}
