// ============================================================================
// Application State - AlphaCards Betting Engine
// ============================================================================
//
// Shared state handed to every handler. There is deliberately no global
// mutex: the card store locks per card and the ledger has its own lock.
// Where a handler needs both, it takes the card lock first, then the ledger
// lock. One ordering everywhere, so the two can never deadlock.
//
// ============================================================================

use std::sync::{Arc, Mutex};

use crate::cards::store::CardStore;
use crate::config::EngineConfig;
use crate::ledger::Ledger;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: CardStore,
    pub ledger: Mutex<Ledger>,
    pub config: EngineConfig,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: CardStore::new(),
            ledger: Mutex::new(Ledger::new(config.starting_balance)),
            config,
        }
    }

    pub fn shared(config: EngineConfig) -> SharedState {
        Arc::new(Self::new(config))
    }
}
