//! Application state shared by every route and session.

use crate::session::SessionContext;
use crate::structure::{StructureConverter, StructureStore};
use protmap_core::config::Config;
use protmap_core::loader::Dataset;
use protmap_core::search::{NameSearchIndex, SearchCache, SearchLimits};
use protmap_core::terms::{TermCatalog, TermMembershipCache, TermStore};
use protmap_core::{PointTable, QueryEngine};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cheap-to-clone handle passed to axum as router state.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionContext>,
    search: Arc<NameSearchIndex>,
    catalog: Arc<TermCatalog>,
    structures: StructureStore,
    session_ids: Arc<AtomicU64>,
}

impl AppState {
    /// Wire the startup dataset to fresh caches.
    pub fn new(
        dataset: &Dataset,
        config: &Config,
        converter: Arc<dyn StructureConverter>,
    ) -> Self {
        let terms = Arc::new(TermMembershipCache::new(TermStore::new(&config.data.terms_dir)));
        let engine = QueryEngine::new(Arc::clone(&dataset.table), terms);
        let search = NameSearchIndex::new(
            Arc::clone(&dataset.table),
            Arc::clone(&dataset.clusters),
            Arc::clone(&dataset.reverse),
            Arc::new(SearchCache::new(config.search.cache_capacity)),
            SearchLimits {
                match_limit: config.search.match_limit,
                result_limit: config.search.result_limit,
            },
        );
        Self {
            sessions: Arc::new(SessionContext::new(engine, &config.stream)),
            search: Arc::new(search),
            catalog: Arc::clone(&dataset.catalog),
            structures: StructureStore::new(&config.data.structures_dir, converter),
            session_ids: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn sessions(&self) -> Arc<SessionContext> {
        Arc::clone(&self.sessions)
    }

    pub fn table(&self) -> &PointTable {
        self.sessions.engine().table()
    }

    pub fn search(&self) -> &NameSearchIndex {
        &self.search
    }

    pub fn catalog(&self) -> &TermCatalog {
        &self.catalog
    }

    pub fn structures(&self) -> &StructureStore {
        &self.structures
    }

    pub fn next_session_id(&self) -> u64 {
        self.session_ids.fetch_add(1, Ordering::Relaxed)
    }
}
