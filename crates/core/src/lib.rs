//! Core of the EPG cache: upstream loading, local storage, search, picon
//! lookup, the refresh scheduler and the read-side query service.

pub mod config;
pub mod metrics;
pub mod picon;
pub mod query;
pub mod scheduler;
pub mod search;
pub mod store;
pub mod testing;
pub mod upstream;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, DatabaseConfig, PiconConfig, RefreshConfig, ServerConfig, TvheadendConfig,
};
pub use picon::{normalize_snp, PiconError, PiconFile, PiconIndex, PiconStats, PiconVariant};
pub use query::{
    ApiResponse, CacheHealthMeta, HealthReport, HealthStatus, PiconAsset, PiconParams,
    QueryError, QueryService, RefreshAccepted, SearchParams, SearchResult, TimerangeParams,
};
pub use scheduler::{RefreshControl, RefreshError, RefreshOutcome, RefreshScheduler};
pub use search::{ScoredEventId, SearchIndex, DEFAULT_SEARCH_LIMIT};
pub use store::{
    CachedChannel, EpgStore, SqliteEpgStore, StoreError, SyncMeta, SyncStatus, TimerangeFilter,
};
pub use upstream::{Channel, EpgEvent, EpgSource, TvheadendClient, UpstreamError};
