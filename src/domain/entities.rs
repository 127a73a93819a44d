use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::catalog::ContainerType;
use super::error::EstimateError;

/// Carton dimensions in centimetres and gross weight in kilograms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

/// Pallet footprint and deck height in centimetres plus the requested layer count.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PalletSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub layers: u32,
}

/// Everything the packing pipeline needs for one calculation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    #[serde(rename = "box")]
    pub box_spec: BoxSpec,
    #[serde(default)]
    pub pallet: Option<PalletSpec>,
    pub quantity: u64,
}

impl ShipmentInput {
    pub fn direct(box_spec: BoxSpec, quantity: u64) -> Self {
        Self {
            box_spec,
            pallet: None,
            quantity,
        }
    }

    pub fn palletized(box_spec: BoxSpec, pallet: PalletSpec, quantity: u64) -> Self {
        Self {
            box_spec,
            pallet: Some(pallet),
            quantity,
        }
    }
}

/// Outer length, width and height in centimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// One of the two axis-aligned footprints tried for a layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Orientation {
    /// Box edge laid along the length of the area being filled.
    pub placed_length_axis: f64,
    /// Box edge laid along the width of the area being filled.
    pub placed_width_axis: f64,
    pub rotated: bool,
    pub count_along_length: u64,
    pub count_along_width: u64,
}

impl Orientation {
    /// Saturates instead of overflowing for microscopic boxes.
    pub fn per_layer(&self) -> u64 {
        self.count_along_length.saturating_mul(self.count_along_width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PalletLayout {
    pub orientation: Orientation,
    pub boxes_per_layer: u64,
    pub layers: u32,
    pub boxes_per_pallet: u64,
    pub outer_dimensions: Dimensions,
}

/// Units placed along each container axis. In pallet mode these count pallets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutCounts {
    pub x: u64,
    pub y: u64,
    pub z: u64,
    pub rotated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResult {
    pub container_type: ContainerType,
    pub boxes_per_container: u64,
    pub containers_needed: u64,
    pub remaining_boxes: u64,
    pub efficiency_percent: f64,
    pub layout_counts: LayoutCounts,
    pub weight_limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pallets_per_container: Option<u64>,
}

/// Per-envelope evaluation: either a usable capacity or the reason there is none.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ContainerOutcome {
    Loaded(ContainerResult),
    #[serde(rename_all = "camelCase")]
    Infeasible {
        container_type: ContainerType,
        reason: String,
    },
}

impl ContainerOutcome {
    pub fn container_type(&self) -> ContainerType {
        match self {
            Self::Loaded(result) => result.container_type,
            Self::Infeasible { container_type, .. } => *container_type,
        }
    }

    pub fn loaded(&self) -> Option<&ContainerResult> {
        match self {
            Self::Loaded(result) => Some(result),
            Self::Infeasible { .. } => None,
        }
    }

    /// Boxes per container, or 0 when the envelope cannot take the box.
    pub fn capacity(&self) -> u64 {
        self.loaded().map(|r| r.boxes_per_container).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "containerType", rename_all = "camelCase")]
pub enum RemainderShipping {
    Fcl(ContainerType),
    Lcl,
}

/// How the boxes left over after the full containers travel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainderPlan {
    pub quantity: u64,
    pub cbm: f64,
    pub shipping: RemainderShipping,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// `None` when the cargo ships consolidated.
    pub container_type: Option<ContainerType>,
    pub shipping_method: String,
    pub reason: String,
    pub efficiency_percent: f64,
    pub containers_needed: u64,
    pub boxes_per_container: u64,
    pub remaining_boxes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remainder: Option<RemainderPlan>,
}

impl Recommendation {
    pub fn is_lcl(&self) -> bool {
        self.container_type.is_none()
    }
}

/// Pallet guidance that does not block a calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Advisory {
    #[serde(rename_all = "camelCase")]
    PalletOverweight { gross_weight_kg: f64, limit_kg: f64 },
    #[serde(rename_all = "camelCase")]
    PalletTooTall { stack_height_cm: f64, limit_cm: f64 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PalletOverweight {
                gross_weight_kg,
                limit_kg,
            } => write!(
                f,
                "pallet gross weight {gross_weight_kg:.1} kg exceeds the {limit_kg:.0} kg guideline"
            ),
            Self::PalletTooTall {
                stack_height_cm,
                limit_cm,
            } => write!(
                f,
                "pallet stack height {stack_height_cm:.1} cm exceeds the {limit_cm:.0} cm guideline"
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Basic,
    Wto,
    Fta,
    /// Caller-supplied rate used when no candidate is available.
    Default,
}

impl RateType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Wto => "WTO",
            Self::Fta => "FTA",
            Self::Default => "Default",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffCandidate {
    pub rate_type: RateType,
    pub rate_percent: f64,
    pub label: String,
    /// Agreement code such as `FVN1`; only set on FTA candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fta_code: Option<String>,
}

impl TariffCandidate {
    pub fn basic(rate_percent: f64) -> Self {
        Self {
            rate_type: RateType::Basic,
            rate_percent,
            label: "Basic".to_string(),
            fta_code: None,
        }
    }

    pub fn wto(rate_percent: f64) -> Self {
        Self {
            rate_type: RateType::Wto,
            rate_percent,
            label: "WTO".to_string(),
            fta_code: None,
        }
    }

    pub fn fta(code: &str, rate_percent: f64) -> Self {
        let code = code.trim().to_ascii_uppercase();
        Self {
            rate_type: RateType::Fta,
            rate_percent,
            label: format!("FTA ({code})"),
            fta_code: Some(code),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTariff {
    pub rate_percent: f64,
    pub rate_type: RateType,
    pub label: String,
    pub needs_certificate_of_origin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fta_code: Option<String>,
}

impl SelectedTariff {
    /// A plain rate with no preferential treatment.
    pub fn flat(rate_percent: f64) -> Self {
        Self {
            rate_percent,
            rate_type: RateType::Default,
            label: RateType::Default.label().to_string(),
            needs_certificate_of_origin: false,
            country_code: None,
            fta_code: None,
        }
    }
}

/// ISO-4217 code, stored upper-case.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub const KRW: &'static str = "KRW";

    pub fn krw() -> Self {
        Self(Self::KRW.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_krw(&self) -> bool {
        self.0 == Self::KRW
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(format!("invalid currency code: {s:?}"))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostInput {
    pub unit_price: f64,
    pub quantity: u64,
    pub product_currency: CurrencyCode,
    #[serde(default)]
    pub shipping_cost: f64,
    pub shipping_currency: CurrencyCode,
    #[serde(default, rename = "otherCostsKRW")]
    pub other_costs_krw: f64,
}

/// KRW-per-unit rates already resolved by an exchange-rate provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRates {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl ResolvedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: CurrencyCode, rate: f64) -> Self {
        self.insert(currency, rate);
        self
    }

    pub fn insert(&mut self, currency: CurrencyCode, rate: f64) {
        self.rates.insert(currency, rate);
    }

    pub fn contains(&self, currency: &CurrencyCode) -> bool {
        currency.is_krw() || self.rates.contains_key(currency)
    }

    /// KRW per one unit of `currency`. KRW is always 1; anything else must be
    /// present, finite and positive.
    pub fn rate_for(&self, currency: &CurrencyCode) -> Result<f64, EstimateError> {
        if currency.is_krw() {
            return Ok(1.0);
        }
        self.rates
            .get(currency)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| EstimateError::InvalidCurrencyRate {
                currency: currency.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &f64)> {
        self.rates.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub product_value_foreign: f64,
    #[serde(rename = "productValueKRW")]
    pub product_value_krw: f64,
    #[serde(rename = "shippingCostKRW")]
    pub shipping_cost_krw: f64,
    #[serde(rename = "cifKRW")]
    pub cif_krw: f64,
    #[serde(rename = "tariffAmountKRW")]
    pub tariff_amount_krw: f64,
    #[serde(rename = "certificateOfOriginCostKRW")]
    pub certificate_of_origin_cost_krw: f64,
    #[serde(rename = "vatBaseKRW")]
    pub vat_base_krw: f64,
    #[serde(rename = "vatAmountKRW")]
    pub vat_amount_krw: f64,
    #[serde(rename = "otherCostsKRW")]
    pub other_costs_krw: f64,
    #[serde(rename = "totalCostKRW")]
    pub total_cost_krw: f64,
    #[serde(rename = "costPerUnitKRW")]
    pub cost_per_unit_krw: f64,
}

impl CostBreakdown {
    /// Whole-won view for display; the unrounded figures stay authoritative.
    pub fn round_krw(&self) -> Self {
        Self {
            product_value_foreign: self.product_value_foreign,
            product_value_krw: self.product_value_krw.round(),
            shipping_cost_krw: self.shipping_cost_krw.round(),
            cif_krw: self.cif_krw.round(),
            tariff_amount_krw: self.tariff_amount_krw.round(),
            certificate_of_origin_cost_krw: self.certificate_of_origin_cost_krw.round(),
            vat_base_krw: self.vat_base_krw.round(),
            vat_amount_krw: self.vat_amount_krw.round(),
            other_costs_krw: self.other_costs_krw.round(),
            total_cost_krw: self.total_cost_krw.round(),
            cost_per_unit_krw: self.cost_per_unit_krw.round(),
        }
    }
}
