use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entities::{CostBreakdown, CostInput, ResolvedRates, SelectedTariff};
use super::error::EstimateError;

/// Korean import-tax parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostPolicy {
    /// VAT as a fraction, levied on CIF + duty + C/O fee + other costs.
    pub vat_rate: f64,
    /// Flat KRW fee for a certificate of origin, independent of the invoice currency.
    #[serde(rename = "certificateOfOriginFeeKRW")]
    pub certificate_of_origin_fee_krw: f64,
}

impl CostPolicy {
    pub const DEFAULT_VAT_RATE: f64 = 0.10;
    pub const DEFAULT_CERTIFICATE_OF_ORIGIN_FEE_KRW: f64 = 50_000.0;
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            vat_rate: Self::DEFAULT_VAT_RATE,
            certificate_of_origin_fee_krw: Self::DEFAULT_CERTIFICATE_OF_ORIGIN_FEE_KRW,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LandedCostCalculator {
    policy: CostPolicy,
}

impl LandedCostCalculator {
    pub fn new(policy: CostPolicy) -> Self {
        Self { policy }
    }

    /// Landed cost in KRW. Fails only when a non-KRW currency has no usable rate.
    pub fn compute(
        &self,
        input: &CostInput,
        rates: &ResolvedRates,
        tariff: &SelectedTariff,
    ) -> Result<CostBreakdown, EstimateError> {
        let product_rate = rates.rate_for(&input.product_currency)?;
        let shipping_rate = rates.rate_for(&input.shipping_currency)?;
        let quantity = input.quantity as f64;

        let product_value_foreign = input.unit_price * quantity;
        let product_value_krw = product_value_foreign * product_rate;
        let shipping_cost_krw = input.shipping_cost * shipping_rate;
        let cif_krw = product_value_krw + shipping_cost_krw;
        let tariff_amount_krw = cif_krw * tariff.rate_percent / 100.0;
        let certificate_of_origin_cost_krw = if tariff.needs_certificate_of_origin {
            self.policy.certificate_of_origin_fee_krw
        } else {
            0.0
        };
        let other_costs_krw = input.other_costs_krw;

        // Korean VAT is charged on the duty-paid value, not on CIF alone.
        let vat_base_krw =
            cif_krw + tariff_amount_krw + certificate_of_origin_cost_krw + other_costs_krw;
        let vat_amount_krw = vat_base_krw * self.policy.vat_rate;
        let total_cost_krw = cif_krw
            + tariff_amount_krw
            + certificate_of_origin_cost_krw
            + vat_amount_krw
            + other_costs_krw;

        debug!(cif_krw, tariff_amount_krw, vat_amount_krw, total_cost_krw, "landed cost computed");

        Ok(CostBreakdown {
            product_value_foreign,
            product_value_krw,
            shipping_cost_krw,
            cif_krw,
            tariff_amount_krw,
            certificate_of_origin_cost_krw,
            vat_base_krw,
            vat_amount_krw,
            other_costs_krw,
            total_cost_krw,
            cost_per_unit_krw: total_cost_krw / quantity,
        })
    }
}
