//! FCL / LCL decision and multi-container mix.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::ContainerCatalog;
use super::entities::{
    ContainerOutcome, ContainerResult, Recommendation, RemainderPlan, RemainderShipping,
    ShipmentInput,
};
use super::error::EstimateError;
use super::packing::compute_box_cbm;

/// Business thresholds behind the FCL / LCL decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationPolicy {
    /// Below this share of the smallest container's capacity the cargo ships LCL.
    pub lcl_capacity_ratio: f64,
    /// Volume (m³) at or above which a container is worth booking.
    pub fcl_cbm_threshold: f64,
    /// Volumetric fill (0..1) at or above which a container is worth booking.
    pub fcl_capacity_ratio: f64,
}

impl RecommendationPolicy {
    pub const DEFAULT_LCL_CAPACITY_RATIO: f64 = 0.6;
    pub const DEFAULT_FCL_CBM_THRESHOLD: f64 = 15.0;
    pub const DEFAULT_FCL_CAPACITY_RATIO: f64 = 0.70;

    pub fn with_lcl_capacity_ratio(mut self, ratio: f64) -> Self {
        self.lcl_capacity_ratio = ratio;
        self
    }

    pub fn with_fcl_cbm_threshold(mut self, cbm: f64) -> Self {
        self.fcl_cbm_threshold = cbm;
        self
    }

    pub fn with_fcl_capacity_ratio(mut self, ratio: f64) -> Self {
        self.fcl_capacity_ratio = ratio;
        self
    }
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            lcl_capacity_ratio: Self::DEFAULT_LCL_CAPACITY_RATIO,
            fcl_cbm_threshold: Self::DEFAULT_FCL_CBM_THRESHOLD,
            fcl_capacity_ratio: Self::DEFAULT_FCL_CAPACITY_RATIO,
        }
    }
}

pub struct RecommendationEngine<'a> {
    catalog: &'a ContainerCatalog,
    policy: RecommendationPolicy,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(catalog: &'a ContainerCatalog, policy: RecommendationPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Picks the shipping method for `input` from the per-envelope outcomes.
    ///
    /// Rules, first match wins:
    /// 1. below `lcl_capacity_ratio` of the smallest usable container: LCL;
    /// 2. fits that container: FCL if the volume or fill threshold is met, else LCL;
    /// 3. fits a larger single container: the smallest such one;
    /// 4. otherwise the type needing the fewest containers (higher fill breaks
    ///    ties), with any remainder placed in the smallest container that holds
    ///    it, or LCL when it is under the volume threshold.
    pub fn recommend(
        &self,
        input: &ShipmentInput,
        outcomes: &[ContainerOutcome],
    ) -> Result<Recommendation, EstimateError> {
        let mut loaded: Vec<&ContainerResult> =
            outcomes.iter().filter_map(ContainerOutcome::loaded).collect();
        if loaded.is_empty() {
            let reasons = outcomes
                .iter()
                .filter_map(|outcome| match outcome {
                    ContainerOutcome::Infeasible {
                        container_type,
                        reason,
                    } => Some(format!("{container_type}: {reason}")),
                    ContainerOutcome::Loaded(_) => None,
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(EstimateError::InfeasibleGeometry(reasons));
        }
        loaded.sort_by(|a, b| self.volume_of(a).total_cmp(&self.volume_of(b)));

        let quantity = input.quantity;
        let box_cbm = compute_box_cbm(&input.box_spec);
        let total_cbm = quantity as f64 * box_cbm;
        let reference = loaded[0];
        let reference_name = reference.container_type.display_name();

        let recommendation = if (quantity as f64)
            < self.policy.lcl_capacity_ratio * reference.boxes_per_container as f64
        {
            lcl(
                reference,
                format!(
                    "{total_cbm:.2} CBM is under {:.0}% of a {reference_name}; consolidated cargo is cheaper",
                    self.policy.lcl_capacity_ratio * 100.0
                ),
            )
        } else if quantity <= reference.boxes_per_container {
            let fill_threshold = self.policy.fcl_capacity_ratio * 100.0;
            if total_cbm >= self.policy.fcl_cbm_threshold
                || reference.efficiency_percent >= fill_threshold
            {
                single(
                    reference,
                    format!(
                        "{quantity} boxes ({total_cbm:.2} CBM) fill one {reference_name} to {:.1}%",
                        reference.efficiency_percent
                    ),
                )
            } else {
                lcl(
                    reference,
                    format!(
                        "{total_cbm:.2} CBM fills only {:.1}% of a {reference_name}; below {:.0} CBM and {fill_threshold:.0}% an FCL booking does not pay off",
                        reference.efficiency_percent, self.policy.fcl_cbm_threshold
                    ),
                )
            }
        } else if let Some(larger) = loaded[1..]
            .iter()
            .find(|result| quantity <= result.boxes_per_container)
        {
            single(
                larger,
                format!(
                    "{quantity} boxes exceed a {reference_name} but fit one {} at {:.1}%",
                    larger.container_type.display_name(),
                    larger.efficiency_percent
                ),
            )
        } else {
            self.multi_container(&loaded, quantity, box_cbm)
        };

        info!(
            method = %recommendation.shipping_method,
            quantity,
            total_cbm,
            "shipping method recommended"
        );
        Ok(recommendation)
    }

    fn multi_container(
        &self,
        loaded: &[&ContainerResult],
        quantity: u64,
        box_cbm: f64,
    ) -> Recommendation {
        let mut best = loaded[0];
        for &candidate in &loaded[1..] {
            let fewer = candidate.containers_needed < best.containers_needed;
            let fuller = candidate.containers_needed == best.containers_needed
                && candidate.efficiency_percent > best.efficiency_percent;
            if fewer || fuller {
                best = candidate;
            }
        }

        let name = best.container_type.display_name();
        let remainder = self.remainder_plan(loaded, best, box_cbm);
        let full_containers = if remainder.is_some() {
            best.containers_needed - 1
        } else {
            best.containers_needed
        };

        let mut shipping_method = format!("{full_containers} × {name} FCL");
        let mut containers_needed = full_containers;
        let mut reason = format!(
            "{quantity} boxes need {} × {name} at {} boxes each",
            best.containers_needed, best.boxes_per_container
        );
        match remainder.map(|plan| plan.shipping) {
            Some(RemainderShipping::Fcl(remainder_type)) => {
                shipping_method.push_str(&format!(" + 1 × {} FCL", remainder_type.display_name()));
                containers_needed += 1;
                reason.push_str(&format!(
                    "; the last {} boxes go in a {}",
                    best.remaining_boxes,
                    remainder_type.display_name()
                ));
            }
            Some(RemainderShipping::Lcl) => {
                shipping_method.push_str(" + LCL");
                reason.push_str(&format!(
                    "; the last {} boxes ({:.2} CBM) ship LCL",
                    best.remaining_boxes,
                    best.remaining_boxes as f64 * box_cbm
                ));
            }
            None => {}
        }

        Recommendation {
            container_type: Some(best.container_type),
            shipping_method,
            reason,
            efficiency_percent: best.efficiency_percent,
            containers_needed,
            boxes_per_container: best.boxes_per_container,
            remaining_boxes: best.remaining_boxes,
            remainder,
        }
    }

    /// One level only: the remainder is matched against container capacities
    /// and never split again.
    fn remainder_plan(
        &self,
        loaded: &[&ContainerResult],
        best: &ContainerResult,
        box_cbm: f64,
    ) -> Option<RemainderPlan> {
        let quantity = best.remaining_boxes;
        if quantity == 0 {
            return None;
        }
        let cbm = quantity as f64 * box_cbm;
        let shipping = if cbm < self.policy.fcl_cbm_threshold {
            RemainderShipping::Lcl
        } else {
            let fits = loaded
                .iter()
                .find(|result| quantity <= result.boxes_per_container)
                .map(|result| result.container_type)
                .unwrap_or(best.container_type);
            RemainderShipping::Fcl(fits)
        };
        Some(RemainderPlan {
            quantity,
            cbm,
            shipping,
        })
    }

    fn volume_of(&self, result: &ContainerResult) -> f64 {
        self.catalog.envelope(result.container_type).volume_cbm
    }
}

fn single(result: &ContainerResult, reason: String) -> Recommendation {
    Recommendation {
        container_type: Some(result.container_type),
        shipping_method: format!("{} × 1 FCL", result.container_type.display_name()),
        reason,
        efficiency_percent: result.efficiency_percent,
        containers_needed: 1,
        boxes_per_container: result.boxes_per_container,
        remaining_boxes: 0,
        remainder: None,
    }
}

fn lcl(reference: &ContainerResult, reason: String) -> Recommendation {
    Recommendation {
        container_type: None,
        shipping_method: "LCL".to_string(),
        reason,
        efficiency_percent: reference.efficiency_percent,
        containers_needed: 0,
        boxes_per_container: 0,
        remaining_boxes: 0,
        remainder: None,
    }
}
