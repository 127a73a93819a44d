//! Stateful collaborators around the calculation core.

pub mod cache;
pub mod providers;

pub use cache::{load_rate_snapshot, save_rate_snapshot, snapshot_path, RateSnapshot, TtlCache};
pub use providers::{
    parse_date, resolve_rates, CachedRates, ExchangeRateProvider, HsCode, ProviderError,
    StaticRateBook, TariffRateProvider,
};
