//! End-to-end entry points for the packing and cost pipelines.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use super::catalog::ContainerCatalog;
use super::entities::{
    Advisory, ContainerOutcome, CostBreakdown, CostInput, PalletLayout, Recommendation,
    ResolvedRates, SelectedTariff, ShipmentInput, TariffCandidate,
};
use super::error::EstimateError;
use super::evaluation::evaluate_all;
use super::landed_cost::{CostPolicy, LandedCostCalculator};
use super::packing::{compute_box_cbm, optimize_direct_layout, optimize_pallet_layer};
use super::recommendation::{RecommendationEngine, RecommendationPolicy};
use super::tariff::{FtaTable, TariffSelector};
use super::validation::{pallet_advisories, validate_cost_input, validate_shipment};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentEstimate {
    pub total_quantity: u64,
    #[serde(rename = "boxCBM")]
    pub box_cbm: f64,
    #[serde(rename = "totalCBM")]
    pub total_cbm: f64,
    pub total_weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pallet_layout: Option<PalletLayout>,
    pub results: Vec<ContainerOutcome>,
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Advisory>,
}

pub fn estimate_shipment(
    input: &ShipmentInput,
    catalog: &ContainerCatalog,
    policy: &RecommendationPolicy,
) -> Result<ShipmentEstimate, EstimateError> {
    let _span = info_span!("estimate_shipment", quantity = input.quantity).entered();
    validate_shipment(input)?;

    let layout = match &input.pallet {
        Some(pallet) => optimize_pallet_layer(&input.box_spec, pallet),
        None => optimize_direct_layout(&input.box_spec),
    };
    let results = evaluate_all(input, catalog, &layout);
    let recommendation = RecommendationEngine::new(catalog, *policy).recommend(input, &results)?;

    let box_cbm = compute_box_cbm(&input.box_spec);
    let advisories = pallet_advisories(input, layout.boxes_per_pallet);
    debug!(advisories = advisories.len(), "shipment estimated");

    Ok(ShipmentEstimate {
        total_quantity: input.quantity,
        box_cbm,
        total_cbm: box_cbm * input.quantity as f64,
        total_weight_kg: input.box_spec.weight * input.quantity as f64,
        pallet_layout: input.pallet.map(|_| layout),
        results,
        recommendation,
        advisories,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandedCostEstimate {
    pub selected_tariff: SelectedTariff,
    pub breakdown: CostBreakdown,
}

/// Tariff inputs for one landed-cost run.
#[derive(Clone, Copy, Debug)]
pub struct TariffContext<'a> {
    pub candidates: &'a [TariffCandidate],
    pub country: Option<&'a str>,
    pub fta_table: &'a FtaTable,
    pub default_rate_percent: f64,
}

pub fn estimate_landed_cost(
    input: &CostInput,
    rates: &ResolvedRates,
    tariff: TariffContext<'_>,
    policy: &CostPolicy,
) -> Result<LandedCostEstimate, EstimateError> {
    let _span = info_span!("estimate_landed_cost", quantity = input.quantity).entered();
    validate_cost_input(input)?;

    let selected_tariff = TariffSelector::new(tariff.fta_table).select_best(
        tariff.candidates,
        tariff.country,
        tariff.default_rate_percent,
    );
    let breakdown = LandedCostCalculator::new(*policy).compute(input, rates, &selected_tariff)?;

    Ok(LandedCostEstimate {
        selected_tariff,
        breakdown,
    })
}
