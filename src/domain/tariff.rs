//! Duty-rate selection between basic, WTO and FTA schedules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::entities::{RateType, SelectedTariff, TariffCandidate};

/// Country (ISO-3166 alpha-2) to the FTA codes that cover imports from it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FtaTable {
    codes: HashMap<String, Vec<String>>,
}

impl FtaTable {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(raw))
    }

    pub fn from_pairs<I, C, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = pairs
            .into_iter()
            .map(|(country, codes)| {
                (
                    normalise(country.as_ref()),
                    codes
                        .into_iter()
                        .map(|code| normalise(code.as_ref()))
                        .collect(),
                )
            })
            .collect();
        Self { codes }
    }

    /// Agreement codes for `country`, in table order. Unknown countries have none.
    pub fn codes_for(&self, country: &str) -> &[String] {
        self.codes
            .get(&normalise(country))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

fn normalise(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub struct TariffSelector<'a> {
    fta_table: &'a FtaTable,
}

impl<'a> TariffSelector<'a> {
    pub fn new(fta_table: &'a FtaTable) -> Self {
        Self { fta_table }
    }

    /// Picks the lowest applicable duty rate.
    ///
    /// The baseline is the first WTO candidate, else the first basic one, else
    /// `default_rate_percent`. An FTA candidate applies only when its code is
    /// mapped to `country`; the lowest such rate (first one on ties) wins when
    /// it is strictly below the baseline and then requires a certificate of origin.
    pub fn select_best(
        &self,
        candidates: &[TariffCandidate],
        country: Option<&str>,
        default_rate_percent: f64,
    ) -> SelectedTariff {
        let usable = |candidate: &&TariffCandidate| {
            let ok = candidate.rate_percent.is_finite() && candidate.rate_percent >= 0.0;
            if !ok {
                warn!(label = %candidate.label, rate = candidate.rate_percent, "ignoring unusable tariff rate");
            }
            ok
        };
        let first_of = |rate_type: RateType| {
            candidates
                .iter()
                .filter(|c| c.rate_type == rate_type)
                .find(usable)
        };

        let country_code = country.map(normalise);
        let mut selected = match first_of(RateType::Wto).or_else(|| first_of(RateType::Basic)) {
            Some(baseline) => SelectedTariff {
                rate_percent: baseline.rate_percent,
                rate_type: baseline.rate_type,
                label: baseline.label.clone(),
                needs_certificate_of_origin: false,
                country_code: country_code.clone(),
                fta_code: None,
            },
            None => {
                debug!(default_rate_percent, "no baseline tariff candidate; using default rate");
                SelectedTariff {
                    country_code: country_code.clone(),
                    ..SelectedTariff::flat(default_rate_percent)
                }
            }
        };

        let Some(country) = country_code.as_deref() else {
            return selected;
        };
        let codes = self.fta_table.codes_for(country);

        let mut best_fta: Option<&TariffCandidate> = None;
        for candidate in candidates.iter().filter(|c| c.rate_type == RateType::Fta).filter(usable) {
            let Some(code) = candidate.fta_code.as_deref() else {
                continue;
            };
            if !codes.iter().any(|mapped| mapped.eq_ignore_ascii_case(code)) {
                continue;
            }
            if best_fta.map_or(true, |best| candidate.rate_percent < best.rate_percent) {
                best_fta = Some(candidate);
            }
        }

        if let Some(fta) = best_fta {
            if fta.rate_percent < selected.rate_percent {
                debug!(code = ?fta.fta_code, rate = fta.rate_percent, "FTA rate beats baseline");
                selected = SelectedTariff {
                    rate_percent: fta.rate_percent,
                    rate_type: RateType::Fta,
                    label: fta.label.clone(),
                    needs_certificate_of_origin: true,
                    country_code: Some(country.to_string()),
                    fta_code: fta.fta_code.clone(),
                };
            }
        }

        selected
    }
}
