//! Exchange-rate and tariff-rate collaborators.
//!
//! The core never fetches anything; these traits describe what a caller has
//! to resolve first. [`StaticRateBook`] answers both from a JSON file so the
//! CLI and batch jobs run offline.

use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    path::Path,
    str::FromStr,
    sync::Mutex,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use time::{macros::format_description, Date};
use tracing::{debug, warn};

use crate::domain::{CurrencyCode, ResolvedRates, TariffCandidate};
use crate::infra::cache::TtlCache;

const DEFAULT_RATE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no exchange rate for {currency} on or before {date}")]
    RateUnavailable { currency: String, date: Date },
    #[error("no tariff schedule for HS code {0}")]
    TariffUnavailable(HsCode),
    #[error("invalid HS code {0:?}: expected 10 digits")]
    InvalidHsCode(String),
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("rate book error: {0}")]
    Book(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Ten-digit Harmonized System code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HsCode(String);

impl HsCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for HsCode {
    type Err = ProviderError;

    /// Accepts `8471.30-0000` style punctuation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .collect();
        if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(digits))
        } else {
            Err(ProviderError::InvalidHsCode(s.to_string()))
        }
    }
}

impl fmt::Display for HsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_date(input: &str) -> Result<Date, ProviderError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ProviderError::InvalidDate(input.to_string()))
}

pub trait ExchangeRateProvider {
    /// KRW per one unit of `currency` in force on `date`.
    fn krw_rate(&self, currency: &CurrencyCode, date: Date) -> Result<f64, ProviderError>;
}

pub trait TariffRateProvider {
    /// Basic, WTO and per-agreement candidates for `hs_code`.
    fn candidates(&self, hs_code: &HsCode, date: Date) -> Result<Vec<TariffCandidate>, ProviderError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateBookFile {
    #[serde(default)]
    exchange_rates: HashMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    tariffs: HashMap<String, Vec<TariffCandidate>>,
}

/// Date-stamped exchange rates and per-HS-code tariff schedules from a file.
///
/// ```json
/// {
///   "exchangeRates": { "USD": { "2026-10-01": 1350.0, "2026-10-08": 1362.5 } },
///   "tariffs": { "8471300000": [ { "rateType": "wto", "ratePercent": 8.0, "label": "WTO" } ] }
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticRateBook {
    rates: HashMap<CurrencyCode, BTreeMap<Date, f64>>,
    tariffs: HashMap<HsCode, Vec<TariffCandidate>>,
}

impl StaticRateBook {
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let file: RateBookFile = serde_json::from_str(json)?;

        let mut rates = HashMap::new();
        for (currency, quotes) in file.exchange_rates {
            let currency: CurrencyCode = currency.parse().map_err(ProviderError::Book)?;
            let mut dated = BTreeMap::new();
            for (date, rate) in quotes {
                dated.insert(parse_date(&date)?, rate);
            }
            rates.insert(currency, dated);
        }

        let mut tariffs = HashMap::new();
        for (code, candidates) in file.tariffs {
            tariffs.insert(code.parse::<HsCode>()?, candidates);
        }

        debug!(currencies = rates.len(), schedules = tariffs.len(), "rate book loaded");
        Ok(Self { rates, tariffs })
    }

    pub fn with_rate(mut self, currency: CurrencyCode, date: Date, rate: f64) -> Self {
        self.rates.entry(currency).or_default().insert(date, rate);
        self
    }
}

impl ExchangeRateProvider for StaticRateBook {
    /// Latest quote on or before `date`.
    fn krw_rate(&self, currency: &CurrencyCode, date: Date) -> Result<f64, ProviderError> {
        if currency.is_krw() {
            return Ok(1.0);
        }
        self.rates
            .get(currency)
            .and_then(|quotes| quotes.range(..=date).next_back())
            .map(|(_, rate)| *rate)
            .ok_or_else(|| ProviderError::RateUnavailable {
                currency: currency.to_string(),
                date,
            })
    }
}

impl TariffRateProvider for StaticRateBook {
    /// Static books carry one schedule per HS code; the date is not consulted.
    fn candidates(&self, hs_code: &HsCode, _date: Date) -> Result<Vec<TariffCandidate>, ProviderError> {
        self.tariffs
            .get(hs_code)
            .cloned()
            .ok_or_else(|| ProviderError::TariffUnavailable(hs_code.clone()))
    }
}

/// Wraps a provider with a [`TtlCache`], falling back to an expired value
/// when the provider fails.
pub struct CachedRates<P> {
    inner: P,
    cache: Mutex<TtlCache<(CurrencyCode, Date), f64>>,
    ttl: Duration,
}

impl<P: ExchangeRateProvider> CachedRates<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(TtlCache::new()),
            ttl: DEFAULT_RATE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, TtlCache<(CurrencyCode, Date), f64>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: ExchangeRateProvider> ExchangeRateProvider for CachedRates<P> {
    fn krw_rate(&self, currency: &CurrencyCode, date: Date) -> Result<f64, ProviderError> {
        let key = (currency.clone(), date);
        if let Some(rate) = self.cache().get(&key) {
            debug!(%currency, %date, "serving cached exchange rate");
            return Ok(rate);
        }

        match self.inner.krw_rate(currency, date) {
            Ok(rate) => {
                self.cache().put(key, rate, self.ttl);
                Ok(rate)
            }
            Err(error) => {
                if let Some(stale) = self.cache().get_stale(&key) {
                    warn!(%currency, %date, "provider failed ({error}); using stale rate");
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }
}

/// Resolves every non-KRW currency in `currencies` into a [`ResolvedRates`].
pub fn resolve_rates<'c, P, I>(
    provider: &P,
    currencies: I,
    date: Date,
) -> Result<ResolvedRates, ProviderError>
where
    P: ExchangeRateProvider + ?Sized,
    I: IntoIterator<Item = &'c CurrencyCode>,
{
    let mut resolved = ResolvedRates::new();
    for currency in currencies {
        if currency.is_krw() || resolved.contains(currency) {
            continue;
        }
        let rate = provider.krw_rate(currency, date)?;
        resolved.insert(currency.clone(), rate);
    }
    Ok(resolved)
}
