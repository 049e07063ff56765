use epg_cache_core::QueryService;

/// Shared application state
pub struct AppState {
    query: QueryService,
}

impl AppState {
    pub fn new(query: QueryService) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &QueryService {
        &self.query
    }
}
