use tracing::{debug, warn};

use super::catalog::{ContainerCatalog, ContainerEnvelope, ContainerType};
use super::entities::{
    BoxSpec, ContainerOutcome, ContainerResult, LayoutCounts, PalletLayout, PalletSpec,
    ShipmentInput,
};
use super::packing::{candidate_orientations, compute_box_cbm, fit_count};

/// Raw capacity of one envelope before the quantity is applied.
struct Capacity {
    boxes: u64,
    counts: LayoutCounts,
    pallets: Option<u64>,
}

/// Evaluates one envelope for the given shipment and pallet layout.
///
/// Inputs are assumed validated; a zero capacity comes back as
/// [`ContainerOutcome::Infeasible`] instead of a division by zero.
pub fn evaluate(
    input: &ShipmentInput,
    envelope: &ContainerEnvelope,
    layout: &PalletLayout,
    container_type: ContainerType,
) -> ContainerOutcome {
    let box_spec = &input.box_spec;
    let capacity = match &input.pallet {
        Some(pallet) => pallet_capacity(box_spec, pallet, layout, envelope),
        None => direct_capacity(box_spec, envelope),
    };

    if capacity.boxes == 0 {
        let reason = match &input.pallet {
            Some(_) if layout.boxes_per_layer == 0 => "box does not fit the pallet footprint",
            Some(_) => "pallet stack does not fit the container",
            None => "box does not fit the container interior",
        };
        debug!(%container_type, reason, "envelope infeasible");
        return ContainerOutcome::Infeasible {
            container_type,
            reason: reason.to_string(),
        };
    }

    let mut boxes_per_container = capacity.boxes;
    let mut weight_limited = false;
    // Counts past u64::MAX saturate; the payload clip below brings them back.
    if boxes_per_container as f64 * box_spec.weight > envelope.max_payload_kg {
        let clipped = (envelope.max_payload_kg / box_spec.weight).floor() as u64;
        warn!(
            %container_type,
            geometric = boxes_per_container,
            clipped,
            "payload limit reached before the container is full"
        );
        boxes_per_container = clipped;
        weight_limited = true;
    }

    if boxes_per_container == 0 {
        return ContainerOutcome::Infeasible {
            container_type,
            reason: format!(
                "a single box ({} kg) exceeds the {} kg payload",
                box_spec.weight, envelope.max_payload_kg
            ),
        };
    }

    let quantity = input.quantity;
    let loaded = quantity.min(boxes_per_container);
    let used_volume = loaded as f64 * compute_box_cbm(box_spec);
    // Quoted volumes can sit slightly under the interior product of a custom envelope.
    let efficiency_percent = (used_volume / envelope.volume_cbm * 100.0).clamp(0.0, 100.0);

    // Leftover only exists once the shipment spills past one container.
    let remaining_boxes = if quantity > boxes_per_container {
        quantity % boxes_per_container
    } else {
        0
    };

    ContainerOutcome::Loaded(ContainerResult {
        container_type,
        boxes_per_container,
        containers_needed: quantity.div_ceil(boxes_per_container),
        remaining_boxes,
        efficiency_percent,
        layout_counts: capacity.counts,
        weight_limited,
        pallets_per_container: capacity.pallets,
    })
}

/// Runs [`evaluate`] for every envelope in the catalog, smallest first.
pub fn evaluate_all(
    input: &ShipmentInput,
    catalog: &ContainerCatalog,
    layout: &PalletLayout,
) -> Vec<ContainerOutcome> {
    catalog
        .iter()
        .map(|(container_type, envelope)| evaluate(input, envelope, layout, container_type))
        .collect()
}

fn pallet_capacity(
    box_spec: &BoxSpec,
    pallet: &PalletSpec,
    layout: &PalletLayout,
    envelope: &ContainerEnvelope,
) -> Capacity {
    // The container height may cut layers below the request, never add to them.
    let headroom = envelope.interior_height - pallet.height;
    let height_layers = if headroom > 0.0 {
        fit_count(headroom, box_spec.height)
    } else {
        0
    };
    let layers = u64::from(pallet.layers).min(height_layers);
    if layers == 0 || layout.boxes_per_layer == 0 {
        return Capacity {
            boxes: 0,
            counts: LayoutCounts::default(),
            pallets: None,
        };
    }

    let stack_height = pallet.height + layers as f64 * box_spec.height;
    let counts = LayoutCounts {
        x: fit_count(envelope.interior_length, pallet.length),
        y: fit_count(envelope.interior_width, pallet.width),
        z: fit_count(envelope.interior_height, stack_height),
        rotated: layout.orientation.rotated,
    };
    let pallets = counts.x.saturating_mul(counts.y).saturating_mul(counts.z);

    Capacity {
        boxes: pallets
            .saturating_mul(layout.boxes_per_layer)
            .saturating_mul(layers),
        counts,
        pallets: Some(pallets),
    }
}

fn direct_capacity(box_spec: &BoxSpec, envelope: &ContainerEnvelope) -> Capacity {
    let z = fit_count(envelope.interior_height, box_spec.height);
    let [normal, rotated] =
        candidate_orientations(envelope.interior_length, envelope.interior_width, box_spec);

    // z does not depend on the footprint, so compare totals; normal wins ties.
    let best = if rotated.per_layer().saturating_mul(z) > normal.per_layer().saturating_mul(z) {
        rotated
    } else {
        normal
    };

    Capacity {
        boxes: best.per_layer().saturating_mul(z),
        counts: LayoutCounts {
            x: best.count_along_length,
            y: best.count_along_width,
            z,
            rotated: best.rotated,
        },
        pallets: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::packing::{optimize_direct_layout, optimize_pallet_layer};
    use proptest::prelude::*;

    fn scenario_box() -> BoxSpec {
        BoxSpec {
            length: 30.0,
            width: 20.0,
            height: 15.0,
            weight: 2.5,
        }
    }

    fn run(input: &ShipmentInput, container_type: ContainerType) -> ContainerOutcome {
        let catalog = ContainerCatalog::standard();
        let layout = match &input.pallet {
            Some(pallet) => optimize_pallet_layer(&input.box_spec, pallet),
            None => optimize_direct_layout(&input.box_spec),
        };
        evaluate(input, catalog.envelope(container_type), &layout, container_type)
    }

    #[test]
    fn direct_loading_fills_twenty_foot() {
        let input = ShipmentInput::direct(scenario_box(), 1000);
        let outcome = run(&input, ContainerType::Twenty);
        let result = outcome.loaded().expect("box fits");

        // normal: 19 x 11 x 15 = 3135, rotated: 29 x 7 x 15 = 3045
        assert_eq!(result.boxes_per_container, 3135);
        assert_eq!(result.layout_counts.x, 19);
        assert_eq!(result.layout_counts.y, 11);
        assert_eq!(result.layout_counts.z, 15);
        assert!(!result.layout_counts.rotated);
        assert_eq!(result.containers_needed, 1);
        assert_eq!(result.remaining_boxes, 0);
        assert!(!result.weight_limited);

        let expected = 1000.0 * 0.009 / 33.2 * 100.0;
        assert!((result.efficiency_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn pallet_layers_are_cut_by_container_height() {
        let pallet = PalletSpec {
            length: 110.0,
            width: 110.0,
            height: 15.0,
            layers: 20,
        };
        let input = ShipmentInput::palletized(scenario_box(), pallet, 500);
        let outcome = run(&input, ContainerType::Twenty);
        let result = outcome.loaded().expect("pallet fits");

        // (239 - 15) / 15 = 14 layers, stack 225 cm; 5 x 2 x 1 pallets of 15 x 14 boxes.
        assert_eq!(result.pallets_per_container, Some(10));
        assert_eq!(result.boxes_per_container, 10 * 15 * 14);
        assert_eq!(result.layout_counts.z, 1);
    }

    #[test]
    fn short_stacks_double_up_in_height() {
        let pallet = PalletSpec {
            length: 110.0,
            width: 110.0,
            height: 15.0,
            layers: 6,
        };
        let input = ShipmentInput::palletized(scenario_box(), pallet, 100);
        let result = run(&input, ContainerType::Twenty);
        let result = result.loaded().unwrap();
        // stack 105 cm -> two pallets high.
        assert_eq!(result.layout_counts.z, 2);
        assert_eq!(result.pallets_per_container, Some(20));
        assert_eq!(result.boxes_per_container, 20 * 15 * 6);
    }

    #[test]
    fn heavy_boxes_are_clipped_to_payload() {
        let heavy = BoxSpec {
            weight: 40.0,
            ..scenario_box()
        };
        let input = ShipmentInput::direct(heavy, 5000);
        let result = run(&input, ContainerType::Twenty);
        let result = result.loaded().unwrap();

        assert!(result.weight_limited);
        assert_eq!(result.boxes_per_container, 702);
        assert_eq!(result.containers_needed, 8);
        assert_eq!(result.remaining_boxes, 5000 - 702 * 7);
        let expected = 702.0 * 0.009 / 33.2 * 100.0;
        assert!((result.efficiency_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn oversize_box_is_infeasible_not_a_panic() {
        let tall = BoxSpec {
            height: 250.0,
            ..scenario_box()
        };
        let input = ShipmentInput::direct(tall, 10);
        assert!(matches!(
            run(&input, ContainerType::Twenty),
            ContainerOutcome::Infeasible { .. }
        ));
        assert!(run(&input, ContainerType::FortyHighCube).loaded().is_some());
    }

    #[test]
    fn box_heavier_than_payload_is_infeasible() {
        let anvil = BoxSpec {
            weight: 30_000.0,
            ..scenario_box()
        };
        let outcome = run(&ShipmentInput::direct(anvil, 1), ContainerType::Twenty);
        match outcome {
            ContainerOutcome::Infeasible { reason, .. } => assert!(reason.contains("payload")),
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn pallet_wider_than_container_is_infeasible() {
        let pallet = PalletSpec {
            length: 110.0,
            width: 240.0,
            height: 15.0,
            layers: 2,
        };
        let input = ShipmentInput::palletized(scenario_box(), pallet, 10);
        assert_eq!(run(&input, ContainerType::Forty).capacity(), 0);
    }

    #[test]
    fn evaluate_all_covers_every_envelope() {
        let input = ShipmentInput::direct(scenario_box(), 1000);
        let outcomes = evaluate_all(
            &input,
            &ContainerCatalog::standard(),
            &optimize_direct_layout(&input.box_spec),
        );
        let types: Vec<_> = outcomes.iter().map(ContainerOutcome::container_type).collect();
        assert_eq!(types, ContainerType::ALL.to_vec());
    }

    #[test]
    fn microscopic_boxes_saturate_then_clip_to_payload() {
        let dust = BoxSpec {
            length: 0.0001,
            width: 0.0001,
            height: 0.0001,
            weight: 1e-6,
        };
        let input = ShipmentInput::direct(dust, 10);
        let result = run(&input, ContainerType::Twenty).loaded().cloned().unwrap();

        assert!(result.weight_limited);
        assert_eq!(result.boxes_per_container, (28_080.0f64 / 1e-6).floor() as u64);
        assert_eq!(result.containers_needed, 1);
        assert_eq!(result.remaining_boxes, 0);
    }

    #[test]
    fn microscopic_boxes_on_pallets_do_not_overflow() {
        let dust = BoxSpec {
            length: 0.0001,
            width: 0.0001,
            height: 0.0001,
            weight: 1e-9,
        };
        // ~1.2e12 per layer x 100k layers x 200 pallets is past u64::MAX.
        let pallet = PalletSpec {
            length: 110.0,
            width: 110.0,
            height: 15.0,
            layers: 100_000,
        };
        let input = ShipmentInput::palletized(dust, pallet, 10);
        let result = run(&input, ContainerType::FortyHighCube).loaded().cloned().unwrap();
        assert!(result.weight_limited);
        assert_eq!(result.boxes_per_container, (26_460.0f64 / 1e-9).floor() as u64);
    }

    proptest! {
        #[test]
        fn results_cover_quantity_and_stay_in_range(
            l in 5.0f64..150.0,
            w in 5.0f64..150.0,
            h in 5.0f64..150.0,
            weight in 0.5f64..400.0,
            quantity in 1u64..50_000,
        ) {
            let input = ShipmentInput::direct(BoxSpec { length: l, width: w, height: h, weight }, quantity);
            let catalog = ContainerCatalog::standard();
            let layout = optimize_direct_layout(&input.box_spec);
            for outcome in evaluate_all(&input, &catalog, &layout) {
                let Some(result) = outcome.loaded() else { continue };
                let envelope = catalog.envelope(result.container_type);

                prop_assert!(result.boxes_per_container * result.containers_needed >= quantity);
                if result.containers_needed == 1 {
                    prop_assert_eq!(result.remaining_boxes, 0);
                } else if result.remaining_boxes == 0 {
                    prop_assert_eq!(result.boxes_per_container * result.containers_needed, quantity);
                } else {
                    prop_assert_eq!(
                        result.remaining_boxes,
                        quantity - result.boxes_per_container * (result.containers_needed - 1)
                    );
                }
                prop_assert!(result.efficiency_percent >= 0.0 && result.efficiency_percent <= 100.0);
                prop_assert!(result.boxes_per_container as f64 * weight <= envelope.max_payload_kg * (1.0 + 1e-9));
            }
        }
    }
}
