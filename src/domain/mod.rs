//! Pure packing and landed-cost logic. Nothing in here touches the network,
//! the filesystem or shared mutable state.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod estimate;
pub mod evaluation;
pub mod landed_cost;
pub mod packing;
pub mod recommendation;
pub mod tariff;
pub mod validation;

pub use catalog::{ContainerCatalog, ContainerEnvelope, ContainerType, DEFAULT_PALLET};
pub use entities::{
    Advisory, BoxSpec, ContainerOutcome, ContainerResult, CostBreakdown, CostInput, CurrencyCode,
    Dimensions, LayoutCounts, Orientation, PalletLayout, PalletSpec, RateType, Recommendation,
    RemainderPlan, RemainderShipping, ResolvedRates, SelectedTariff, ShipmentInput,
    TariffCandidate,
};
pub use error::EstimateError;
pub use estimate::{
    estimate_landed_cost, estimate_shipment, LandedCostEstimate, ShipmentEstimate, TariffContext,
};
pub use evaluation::{evaluate, evaluate_all};
pub use landed_cost::{CostPolicy, LandedCostCalculator};
pub use packing::{compute_box_cbm, optimize_direct_layout, optimize_pallet_layer};
pub use recommendation::{RecommendationEngine, RecommendationPolicy};
pub use tariff::{FtaTable, TariffSelector};
