//! Input checks that run before any packing or cost arithmetic.

use super::entities::{Advisory, CostInput, PalletSpec, ShipmentInput};
use super::error::EstimateError;

pub const PALLET_WEIGHT_GUIDELINE_KG: f64 = 1000.0;
pub const PALLET_HEIGHT_GUIDELINE_CM: f64 = 240.0;

fn positive(field: &'static str, value: f64) -> Result<(), EstimateError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EstimateError::InvalidDimension { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), EstimateError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EstimateError::InvalidAmount { field, value })
    }
}

pub fn validate_shipment(input: &ShipmentInput) -> Result<(), EstimateError> {
    let b = &input.box_spec;
    positive("box length", b.length)?;
    positive("box width", b.width)?;
    positive("box height", b.height)?;
    positive("box weight", b.weight)?;

    if let Some(pallet) = &input.pallet {
        positive("pallet length", pallet.length)?;
        positive("pallet width", pallet.width)?;
        positive("pallet height", pallet.height)?;
        if pallet.layers == 0 {
            return Err(EstimateError::InvalidDimension {
                field: "pallet layers",
                value: 0.0,
            });
        }
    }

    if input.quantity == 0 {
        return Err(EstimateError::InvalidQuantity);
    }
    Ok(())
}

pub fn validate_cost_input(input: &CostInput) -> Result<(), EstimateError> {
    positive("unit price", input.unit_price)?;
    if input.quantity == 0 {
        return Err(EstimateError::InvalidQuantity);
    }
    non_negative("shipping cost", input.shipping_cost)?;
    non_negative("other costs", input.other_costs_krw)?;
    Ok(())
}

/// Handling guidance for a loaded pallet. These never block a calculation.
pub fn pallet_advisories(input: &ShipmentInput, boxes_per_pallet: u64) -> Vec<Advisory> {
    let Some(pallet) = &input.pallet else {
        return Vec::new();
    };
    let mut advisories = Vec::new();

    let gross_weight_kg = boxes_per_pallet as f64 * input.box_spec.weight;
    if gross_weight_kg > PALLET_WEIGHT_GUIDELINE_KG {
        advisories.push(Advisory::PalletOverweight {
            gross_weight_kg,
            limit_kg: PALLET_WEIGHT_GUIDELINE_KG,
        });
    }

    let stack_height_cm = stack_height(pallet, input.box_spec.height);
    if stack_height_cm > PALLET_HEIGHT_GUIDELINE_CM {
        advisories.push(Advisory::PalletTooTall {
            stack_height_cm,
            limit_cm: PALLET_HEIGHT_GUIDELINE_CM,
        });
    }
    advisories
}

fn stack_height(pallet: &PalletSpec, box_height: f64) -> f64 {
    pallet.height + f64::from(pallet.layers) * box_height
}
