//! Two-orientation layer search for pallets and container floors.
//!
//! Only the box's own footprint is turned (length/width swapped); the box is
//! never laid on its side and layers are never mixed.

use tracing::debug;

use super::entities::{BoxSpec, Dimensions, Orientation, PalletLayout, PalletSpec};

/// Volume of one box in cubic metres.
pub fn compute_box_cbm(box_spec: &BoxSpec) -> f64 {
    box_spec.length * box_spec.width * box_spec.height / 1_000_000.0
}

/// Whole items of `item` that fit along `space`.
pub(crate) fn fit_count(space: f64, item: f64) -> u64 {
    if item <= 0.0 || space < item {
        return 0;
    }
    (space / item).floor() as u64
}

/// Both footprints of `box_spec` on a `length` x `width` area, normal first.
pub fn candidate_orientations(length: f64, width: f64, box_spec: &BoxSpec) -> [Orientation; 2] {
    let normal = Orientation {
        placed_length_axis: box_spec.length,
        placed_width_axis: box_spec.width,
        rotated: false,
        count_along_length: fit_count(length, box_spec.length),
        count_along_width: fit_count(width, box_spec.width),
    };
    let rotated = Orientation {
        placed_length_axis: box_spec.width,
        placed_width_axis: box_spec.length,
        rotated: true,
        count_along_length: fit_count(length, box_spec.width),
        count_along_width: fit_count(width, box_spec.length),
    };
    [normal, rotated]
}

/// The footprint with the larger per-layer count; the normal one wins ties.
pub fn best_orientation(length: f64, width: f64, box_spec: &BoxSpec) -> Orientation {
    let [normal, rotated] = candidate_orientations(length, width, box_spec);
    if rotated.per_layer() > normal.per_layer() {
        rotated
    } else {
        normal
    }
}

/// Lays out one pallet layer. The layer count is the caller's, not derived here.
pub fn optimize_pallet_layer(box_spec: &BoxSpec, pallet: &PalletSpec) -> PalletLayout {
    let orientation = best_orientation(pallet.length, pallet.width, box_spec);
    let boxes_per_layer = orientation.per_layer();
    let layers = pallet.layers;

    debug!(
        rotated = orientation.rotated,
        boxes_per_layer, layers, "pallet layer laid out"
    );

    PalletLayout {
        orientation,
        boxes_per_layer,
        layers,
        boxes_per_pallet: boxes_per_layer.saturating_mul(u64::from(layers)),
        outer_dimensions: Dimensions {
            length: pallet.length,
            width: pallet.width,
            height: pallet.height + f64::from(layers) * box_spec.height,
        },
    }
}

/// Placeholder layout for direct loading: one box, one layer. The container
/// evaluator runs its own search against the container floor.
pub fn optimize_direct_layout(box_spec: &BoxSpec) -> PalletLayout {
    PalletLayout {
        orientation: Orientation {
            placed_length_axis: box_spec.length,
            placed_width_axis: box_spec.width,
            rotated: false,
            count_along_length: 1,
            count_along_width: 1,
        },
        boxes_per_layer: 1,
        layers: 1,
        boxes_per_pallet: 1,
        outer_dimensions: Dimensions {
            length: box_spec.length,
            width: box_spec.width,
            height: box_spec.height,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn carton(length: f64, width: f64, height: f64) -> BoxSpec {
        BoxSpec {
            length,
            width,
            height,
            weight: 1.0,
        }
    }

    #[test]
    fn box_cbm_converts_cubic_centimetres() {
        let cbm = compute_box_cbm(&carton(30.0, 20.0, 15.0));
        assert!((cbm - 0.009).abs() < 1e-12);
    }

    #[test]
    fn fit_count_floors_and_rejects_oversize() {
        assert_eq!(fit_count(110.0, 30.0), 3);
        assert_eq!(fit_count(120.0, 30.0), 4);
        assert_eq!(fit_count(20.0, 30.0), 0);
    }

    #[test]
    fn rotation_wins_when_it_packs_more() {
        // 110x110 pallet, 40x25 box: normal 2x4 = 8, rotated 4x2 = 8 -> tie, normal kept.
        let tie = best_orientation(110.0, 110.0, &carton(40.0, 25.0, 10.0));
        assert!(!tie.rotated);
        assert_eq!(tie.per_layer(), 8);

        // 120x80 pallet, 30x40 box: normal 4x2 = 8, rotated 3x2 = 6.
        let normal = best_orientation(120.0, 80.0, &carton(30.0, 40.0, 10.0));
        assert!(!normal.rotated);
        assert_eq!(normal.per_layer(), 8);

        // 120x80 pallet, 40x30 box: normal 3x2 = 6, rotated 4x2 = 8.
        let rotated = best_orientation(120.0, 80.0, &carton(40.0, 30.0, 10.0));
        assert!(rotated.rotated);
        assert_eq!(rotated.placed_length_axis, 30.0);
        assert_eq!(rotated.per_layer(), 8);
    }

    #[test]
    fn pallet_layout_uses_requested_layers() {
        let pallet = PalletSpec {
            length: 110.0,
            width: 110.0,
            height: 15.0,
            layers: 4,
        };
        let layout = optimize_pallet_layer(&carton(30.0, 20.0, 15.0), &pallet);
        // normal 3x5 = 15, rotated 5x3 = 15 -> normal.
        assert_eq!(layout.boxes_per_layer, 15);
        assert_eq!(layout.layers, 4);
        assert_eq!(layout.boxes_per_pallet, 60);
        assert_eq!(layout.outer_dimensions.height, 75.0);
        assert_eq!(layout.outer_dimensions.length, 110.0);
    }

    #[test]
    fn direct_layout_is_a_single_box() {
        let layout = optimize_direct_layout(&carton(30.0, 20.0, 15.0));
        assert_eq!(layout.boxes_per_pallet, 1);
        assert_eq!(layout.outer_dimensions.height, 15.0);
    }

    proptest! {
        #[test]
        fn box_cbm_is_positive_and_linear(
            l in 0.1f64..500.0,
            w in 0.1f64..500.0,
            h in 0.1f64..500.0,
            k in 1.0f64..10.0,
        ) {
            let base = compute_box_cbm(&carton(l, w, h));
            prop_assert!(base > 0.0);
            let scaled = compute_box_cbm(&carton(l * k, w, h));
            prop_assert!((scaled - base * k).abs() <= base * k * 1e-9);
        }

        #[test]
        fn chosen_orientation_is_never_worse(
            area_l in 10.0f64..300.0,
            area_w in 10.0f64..300.0,
            l in 1.0f64..120.0,
            w in 1.0f64..120.0,
        ) {
            let b = carton(l, w, 10.0);
            let [normal, rotated] = candidate_orientations(area_l, area_w, &b);
            let best = best_orientation(area_l, area_w, &b);
            prop_assert_eq!(best.per_layer(), normal.per_layer().max(rotated.per_layer()));
        }
    }
}
