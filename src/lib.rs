//! Container packing and landed-cost estimation for import shipments.
//!
//! [`domain`] holds the deterministic calculation core. [`infra`] holds the
//! collaborators that resolve its inputs (rate providers, caches) and
//! [`util`] the configuration, embedded reference data and version info.

pub mod domain;
pub mod infra;
pub mod util;
