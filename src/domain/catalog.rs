//! Container envelopes and default pallet dimensions.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::entities::PalletSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainerType {
    #[serde(rename = "20ft")]
    Twenty,
    #[serde(rename = "40ft")]
    Forty,
    #[serde(rename = "40hc")]
    FortyHighCube,
}

impl ContainerType {
    pub const ALL: [ContainerType; 3] = [Self::Twenty, Self::Forty, Self::FortyHighCube];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Twenty => "20ft",
            Self::Forty => "40ft",
            Self::FortyHighCube => "40hc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Twenty => "20ft GP",
            Self::Forty => "40ft GP",
            Self::FortyHighCube => "40ft HC",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Twenty => 0,
            Self::Forty => 1,
            Self::FortyHighCube => 2,
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContainerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "20ft" | "20gp" | "20" => Ok(Self::Twenty),
            "40ft" | "40gp" | "40" => Ok(Self::Forty),
            "40hc" | "40hq" => Ok(Self::FortyHighCube),
            other => Err(format!("unknown container type: {other}")),
        }
    }
}

/// Interior geometry and payload limit of one container type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEnvelope {
    pub interior_length: f64,
    pub interior_width: f64,
    pub interior_height: f64,
    #[serde(rename = "volumeCBM")]
    pub volume_cbm: f64,
    pub max_payload_kg: f64,
}

/// Default pallet: 110 x 110 cm footprint on a 15 cm deck, one layer.
pub const DEFAULT_PALLET: PalletSpec = PalletSpec {
    length: 110.0,
    width: 110.0,
    height: 15.0,
    layers: 1,
};

/// Immutable envelope table indexed by [`ContainerType`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerCatalog {
    envelopes: [ContainerEnvelope; 3],
}

impl ContainerCatalog {
    pub fn standard() -> Self {
        Self {
            envelopes: [
                ContainerEnvelope {
                    interior_length: 589.0,
                    interior_width: 235.0,
                    interior_height: 239.0,
                    volume_cbm: 33.2,
                    max_payload_kg: 28_080.0,
                },
                ContainerEnvelope {
                    interior_length: 1203.0,
                    interior_width: 235.0,
                    interior_height: 239.0,
                    volume_cbm: 67.7,
                    max_payload_kg: 26_680.0,
                },
                ContainerEnvelope {
                    interior_length: 1203.0,
                    interior_width: 235.0,
                    interior_height: 269.0,
                    volume_cbm: 76.3,
                    max_payload_kg: 26_460.0,
                },
            ],
        }
    }

    /// Replaces the listed envelopes and keeps the rest.
    pub fn with_overrides(mut self, overrides: &BTreeMap<ContainerType, ContainerEnvelope>) -> Self {
        for (container_type, envelope) in overrides {
            self.envelopes[container_type.index()] = *envelope;
        }
        self
    }

    pub fn envelope(&self, container_type: ContainerType) -> &ContainerEnvelope {
        &self.envelopes[container_type.index()]
    }

    /// Envelopes from smallest to largest volume.
    pub fn iter(&self) -> impl Iterator<Item = (ContainerType, &ContainerEnvelope)> {
        let mut entries: Vec<_> = ContainerType::ALL
            .iter()
            .map(|t| (*t, self.envelope(*t)))
            .collect();
        entries.sort_by(|a, b| a.1.volume_cbm.total_cmp(&b.1.volume_cbm));
        entries.into_iter()
    }
}

impl Default for ContainerCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_twenty_foot_matches_published_interior() {
        let catalog = ContainerCatalog::standard();
        let twenty = catalog.envelope(ContainerType::Twenty);
        assert_eq!(twenty.interior_length, 589.0);
        assert_eq!(twenty.interior_width, 235.0);
        assert_eq!(twenty.interior_height, 239.0);
        assert_eq!(twenty.max_payload_kg, 28_080.0);
    }

    #[test]
    fn quoted_volume_covers_interior_product() {
        let catalog = ContainerCatalog::standard();
        for (_, envelope) in catalog.iter() {
            let interior = envelope.interior_length
                * envelope.interior_width
                * envelope.interior_height
                / 1_000_000.0;
            assert!(interior <= envelope.volume_cbm);
        }
    }

    #[test]
    fn iteration_runs_smallest_first() {
        let order: Vec<_> = ContainerCatalog::standard().iter().map(|(t, _)| t).collect();
        assert_eq!(order, ContainerType::ALL.to_vec());
    }

    #[test]
    fn overrides_replace_only_named_envelopes() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            ContainerType::Forty,
            ContainerEnvelope {
                interior_length: 1200.0,
                interior_width: 230.0,
                interior_height: 230.0,
                volume_cbm: 63.5,
                max_payload_kg: 20_000.0,
            },
        );
        let catalog = ContainerCatalog::standard().with_overrides(&overrides);
        assert_eq!(catalog.envelope(ContainerType::Forty).max_payload_kg, 20_000.0);
        assert_eq!(
            catalog.envelope(ContainerType::Twenty),
            ContainerCatalog::standard().envelope(ContainerType::Twenty)
        );
    }

    #[test]
    fn container_type_parses_keys_and_aliases() {
        assert_eq!("20ft".parse::<ContainerType>(), Ok(ContainerType::Twenty));
        assert_eq!("40HQ".parse::<ContainerType>(), Ok(ContainerType::FortyHighCube));
        assert!("45ft".parse::<ContainerType>().is_err());
        assert_eq!(
            serde_json::to_string(&ContainerType::FortyHighCube).unwrap(),
            "\"40hc\""
        );
    }
}
