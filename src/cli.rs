//! Subcommand arguments and handlers for the `import-estimator` binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

use import_estimator::domain::{
    estimate_landed_cost, estimate_shipment, BoxSpec, ContainerOutcome, CostInput, CurrencyCode,
    LandedCostEstimate, PalletSpec, RemainderShipping, ResolvedRates, ShipmentEstimate,
    ShipmentInput, TariffCandidate, TariffContext, DEFAULT_PALLET,
};
use import_estimator::infra::{
    load_rate_snapshot, parse_date, resolve_rates, save_rate_snapshot, snapshot_path, HsCode,
    RateSnapshot, StaticRateBook, TariffRateProvider,
};
use import_estimator::util::assets::fta_table;
use import_estimator::util::config::{save_config, EstimatorConfig};

/// Arguments for `import-estimator containers`.
#[derive(Args, Debug)]
pub struct ContainersArgs {
    /// Box length in cm.
    #[arg(long)]
    pub length: f64,
    /// Box width in cm.
    #[arg(long)]
    pub width: f64,
    /// Box height in cm.
    #[arg(long)]
    pub height: f64,
    /// Gross weight per box in kg.
    #[arg(long)]
    pub weight: f64,
    /// Number of boxes.
    #[arg(long)]
    pub quantity: u64,
    /// Load on pallets of this size, as LxWxH in cm (e.g. 110x110x15).
    #[arg(long, value_parser = parse_pallet_dims)]
    pub pallet: Option<PalletDims>,
    /// Box layers per pallet. Implies the default 110x110x15 pallet when --pallet is absent.
    #[arg(long)]
    pub layers: Option<u32>,
    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PalletDims {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainersArgs {
    fn shipment(&self) -> ShipmentInput {
        let box_spec = BoxSpec {
            length: self.length,
            width: self.width,
            height: self.height,
            weight: self.weight,
        };
        let pallet = match (self.pallet, self.layers) {
            (None, None) => None,
            (dims, layers) => {
                let dims = dims.unwrap_or(PalletDims {
                    length: DEFAULT_PALLET.length,
                    width: DEFAULT_PALLET.width,
                    height: DEFAULT_PALLET.height,
                });
                Some(PalletSpec {
                    length: dims.length,
                    width: dims.width,
                    height: dims.height,
                    layers: layers.unwrap_or(DEFAULT_PALLET.layers),
                })
            }
        };
        ShipmentInput {
            box_spec,
            pallet,
            quantity: self.quantity,
        }
    }
}

/// Arguments for `import-estimator cost`.
#[derive(Args, Debug)]
pub struct CostArgs {
    /// Price per unit in the product currency.
    #[arg(long)]
    pub unit_price: f64,
    /// Number of units.
    #[arg(long)]
    pub quantity: u64,
    /// Product currency (ISO 4217).
    #[arg(long, value_parser = parse_currency)]
    pub currency: CurrencyCode,
    /// KRW per unit of the product currency.
    #[arg(long)]
    pub rate: Option<f64>,
    /// Freight and insurance cost, in the shipping currency.
    #[arg(long, default_value_t = 0.0)]
    pub shipping: f64,
    /// Currency of --shipping. Defaults to KRW.
    #[arg(long, value_parser = parse_currency)]
    pub shipping_currency: Option<CurrencyCode>,
    /// KRW per unit of the shipping currency.
    #[arg(long)]
    pub shipping_rate: Option<f64>,
    /// Other KRW costs (brokerage, inland freight).
    #[arg(long, default_value_t = 0.0)]
    pub other_costs: f64,
    /// Basic duty rate in percent.
    #[arg(long)]
    pub basic: Option<f64>,
    /// WTO concession rate in percent.
    #[arg(long)]
    pub wto: Option<f64>,
    /// FTA rate as CODE=PERCENT (e.g. FVN1=0). Repeatable.
    #[arg(long = "fta", value_parser = parse_fta_rate)]
    pub fta: Vec<(String, f64)>,
    /// Country of origin (ISO 3166 alpha-2).
    #[arg(long)]
    pub country: Option<String>,
    /// JSON rate book with exchange rates and tariff schedules.
    #[arg(long)]
    pub rates: Option<PathBuf>,
    /// HS code to look up in the rate book.
    #[arg(long, requires = "rates")]
    pub hs_code: Option<String>,
    /// Quote date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<String>,
    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl CostArgs {
    fn shipping_currency(&self) -> CurrencyCode {
        self.shipping_currency.clone().unwrap_or_else(CurrencyCode::krw)
    }

    fn cost_input(&self) -> CostInput {
        CostInput {
            unit_price: self.unit_price,
            quantity: self.quantity,
            product_currency: self.currency.clone(),
            shipping_cost: self.shipping,
            shipping_currency: self.shipping_currency(),
            other_costs_krw: self.other_costs,
        }
    }

    fn quote_date(&self) -> Result<Date> {
        match &self.date {
            Some(raw) => Ok(parse_date(raw)?),
            None => Ok(OffsetDateTime::now_utc().date()),
        }
    }

    fn flag_candidates(&self) -> Vec<TariffCandidate> {
        let mut candidates = Vec::new();
        if let Some(rate) = self.basic {
            candidates.push(TariffCandidate::basic(rate));
        }
        if let Some(rate) = self.wto {
            candidates.push(TariffCandidate::wto(rate));
        }
        candidates.extend(
            self.fta
                .iter()
                .map(|(code, rate)| TariffCandidate::fta(code, *rate)),
        );
        candidates
    }

    fn explicit_rates(&self) -> ResolvedRates {
        let mut rates = ResolvedRates::new();
        if let Some(rate) = self.rate {
            rates.insert(self.currency.clone(), rate);
        }
        if let Some(rate) = self.shipping_rate {
            rates.insert(self.shipping_currency(), rate);
        }
        rates
    }
}

/// Arguments for `import-estimator catalog`.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Print the envelopes as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `import-estimator config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the default configuration to the config path.
    #[arg(long)]
    pub init: bool,
}

pub fn parse_pallet_dims(raw: &str) -> Result<PalletDims, String> {
    let parts: Vec<&str> = raw.split(['x', 'X', '*']).map(str::trim).collect();
    let [length, width, height] = parts.as_slice() else {
        return Err(format!("expected LxWxH, got {raw:?}"));
    };
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| format!("invalid pallet dimension {value:?}"))
    };
    Ok(PalletDims {
        length: parse(*length)?,
        width: parse(*width)?,
        height: parse(*height)?,
    })
}

pub fn parse_currency(raw: &str) -> Result<CurrencyCode, String> {
    raw.parse()
}

pub fn parse_fta_rate(raw: &str) -> Result<(String, f64), String> {
    let (code, rate) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=RATE, got {raw:?}"))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("missing FTA code in {raw:?}"));
    }
    let rate = rate
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid FTA rate in {raw:?}"))?;
    Ok((code.to_ascii_uppercase(), rate))
}

pub fn run_containers(args: &ContainersArgs, config: &EstimatorConfig) -> Result<()> {
    let input = args.shipment();
    let estimate = estimate_shipment(&input, &config.catalog(), &config.recommendation)
        .context("container estimate failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        print!("{}", render_shipment(&estimate));
    }
    Ok(())
}

/// Rates come from explicit flags first, then the rate book, then a fresh
/// on-disk snapshot.
pub fn run_cost(args: &CostArgs, config: &EstimatorConfig) -> Result<()> {
    let input = args.cost_input();
    let date = args.quote_date()?;
    let table = fta_table()?;

    let mut candidates = args.flag_candidates();
    let mut rates = args.explicit_rates();
    let needed = [input.product_currency.clone(), input.shipping_currency.clone()];

    if let Some(path) = &args.rates {
        let book = StaticRateBook::load(path)
            .with_context(|| format!("failed to load rate book {}", path.display()))?;

        if let Some(raw) = &args.hs_code {
            let hs_code: HsCode = raw.parse()?;
            let scheduled = book.candidates(&hs_code, date)?;
            debug!(%hs_code, count = scheduled.len(), "tariff candidates from rate book");
            candidates.extend(scheduled);
        }

        let missing: Vec<CurrencyCode> = needed
            .iter()
            .filter(|currency| !rates.contains(currency))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let resolved = resolve_rates(&book, missing.iter(), date)?;
            for (currency, rate) in resolved.iter() {
                rates.insert(currency.clone(), *rate);
            }
            remember_rates(&resolved, date);
        }
    } else {
        fill_from_snapshot(&mut rates, &needed, &snapshot_path());
    }

    if let Some(currency) = needed.iter().find(|currency| !rates.contains(currency)) {
        bail!("no exchange rate for {currency}; pass --rate/--shipping-rate or --rates FILE");
    }

    let estimate = estimate_landed_cost(
        &input,
        &rates,
        TariffContext {
            candidates: &candidates,
            country: args.country.as_deref(),
            fta_table: &table,
            default_rate_percent: config.default_tariff_percent,
        },
        &config.cost,
    )
    .context("landed cost estimate failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        print!("{}", render_landed_cost(&estimate, &input));
    }
    Ok(())
}

pub fn run_catalog(args: &CatalogArgs, config: &EstimatorConfig) -> Result<()> {
    let catalog = config.catalog();
    if args.json {
        let envelopes: BTreeMap<_, _> = catalog.iter().map(|(t, e)| (t, *e)).collect();
        println!("{}", serde_json::to_string_pretty(&envelopes)?);
        return Ok(());
    }

    println!(
        "{:<9} {:>20} {:>9} {:>12}",
        "Type", "Interior (cm)", "CBM", "Payload kg"
    );
    for (container_type, envelope) in catalog.iter() {
        println!(
            "{:<9} {:>20} {:>9.1} {:>12.0}",
            container_type.display_name(),
            format!(
                "{} x {} x {}",
                envelope.interior_length, envelope.interior_width, envelope.interior_height
            ),
            envelope.volume_cbm,
            envelope.max_payload_kg
        );
    }
    Ok(())
}

pub fn run_config(args: &ConfigArgs, config: &EstimatorConfig, path: Option<&Path>) -> Result<()> {
    if args.init {
        let written = save_config(&EstimatorConfig::default(), path)?;
        info!(path = %written.display(), "wrote default config");
        println!("{}", written.display());
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn fill_from_snapshot(rates: &mut ResolvedRates, needed: &[CurrencyCode], path: &Path) {
    if needed.iter().all(|currency| rates.contains(currency)) {
        return;
    }
    let Some(snapshot) = load_rate_snapshot(path) else {
        return;
    };
    for currency in needed {
        if rates.contains(currency) {
            continue;
        }
        if let Some(rate) = snapshot.rates.get(currency.as_str()) {
            debug!(%currency, rate, age = %snapshot.age_string(), "rate from snapshot");
            rates.insert(currency.clone(), *rate);
        }
    }
}

fn remember_rates(resolved: &ResolvedRates, date: Date) {
    let path = snapshot_path();
    let mut merged = load_rate_snapshot(&path)
        .map(|snapshot| snapshot.rates)
        .unwrap_or_default();
    for (currency, rate) in resolved.iter() {
        merged.insert(currency.to_string(), *rate);
    }
    let snapshot = RateSnapshot::new(date.to_string(), merged);
    if let Err(e) = save_rate_snapshot(&path, &snapshot) {
        warn!("failed to save rate snapshot: {e}");
    }
}

fn render_shipment(estimate: &ShipmentEstimate) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} boxes, {:.3} CBM each, {:.2} CBM and {:.1} kg in total\n",
        estimate.total_quantity, estimate.box_cbm, estimate.total_cbm, estimate.total_weight_kg
    ));
    if let Some(layout) = &estimate.pallet_layout {
        out.push_str(&format!(
            "Pallet: {} per layer x {} layers = {} boxes, {} x {} x {} cm loaded\n",
            layout.boxes_per_layer,
            layout.layers,
            layout.boxes_per_pallet,
            layout.outer_dimensions.length,
            layout.outer_dimensions.width,
            layout.outer_dimensions.height
        ));
    }

    out.push_str(&format!(
        "\n{:<9} {:>10} {:>7} {:>10} {:>7}  {}\n",
        "Type", "Capacity", "Needed", "Remainder", "Fill %", "Layout"
    ));
    for outcome in &estimate.results {
        match outcome {
            ContainerOutcome::Loaded(result) => {
                let counts = result.layout_counts;
                let mut layout = format!("{} x {} x {}", counts.x, counts.y, counts.z);
                if counts.rotated {
                    layout.push_str(" rotated");
                }
                if result.weight_limited {
                    layout.push_str(" (weight limited)");
                }
                out.push_str(&format!(
                    "{:<9} {:>10} {:>7} {:>10} {:>7.1}  {}\n",
                    result.container_type.display_name(),
                    result.boxes_per_container,
                    result.containers_needed,
                    result.remaining_boxes,
                    result.efficiency_percent,
                    layout
                ));
            }
            ContainerOutcome::Infeasible {
                container_type,
                reason,
            } => {
                out.push_str(&format!(
                    "{:<9} {:>10}  {}\n",
                    container_type.display_name(),
                    "-",
                    reason
                ));
            }
        }
    }

    let recommendation = &estimate.recommendation;
    out.push_str(&format!(
        "\nRecommendation: {}\n  {}\n",
        recommendation.shipping_method, recommendation.reason
    ));
    if let Some(remainder) = &recommendation.remainder {
        let shipping = match remainder.shipping {
            RemainderShipping::Fcl(container_type) => container_type.display_name().to_string(),
            RemainderShipping::Lcl => "LCL".to_string(),
        };
        out.push_str(&format!(
            "  remainder: {} boxes ({:.2} CBM) via {}\n",
            remainder.quantity, remainder.cbm, shipping
        ));
    }
    for advisory in &estimate.advisories {
        out.push_str(&format!("note: {advisory}\n"));
    }
    out
}

fn render_landed_cost(estimate: &LandedCostEstimate, input: &CostInput) -> String {
    let tariff = &estimate.selected_tariff;
    let b = estimate.breakdown.round_krw();
    let mut out = String::new();

    out.push_str(&format!(
        "Tariff: {} at {}%{}\n\n",
        tariff.label,
        tariff.rate_percent,
        if tariff.needs_certificate_of_origin {
            " (certificate of origin required)"
        } else {
            ""
        }
    ));

    let rows = [
        (
            format!("Product value ({})", input.product_currency),
            b.product_value_foreign,
        ),
        ("Product value (KRW)".to_string(), b.product_value_krw),
        ("Shipping (KRW)".to_string(), b.shipping_cost_krw),
        ("CIF".to_string(), b.cif_krw),
        ("Duty".to_string(), b.tariff_amount_krw),
        ("Certificate of origin".to_string(), b.certificate_of_origin_cost_krw),
        ("Other costs".to_string(), b.other_costs_krw),
        ("VAT base".to_string(), b.vat_base_krw),
        ("VAT".to_string(), b.vat_amount_krw),
        ("Total landed cost".to_string(), b.total_cost_krw),
        ("Cost per unit".to_string(), b.cost_per_unit_krw),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{label:<24} {:>18}\n", group_thousands(value)));
    }
    out
}

/// Rounds to cents and groups thousands with `,`. Whole amounts print without a fraction.
fn group_thousands(value: f64) -> String {
    let total_cents = (value.abs() * 100.0).round() as u64;
    let whole = total_cents / 100;
    let cents = total_cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if value < 0.0 && total_cents > 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if cents > 0 {
        grouped.push_str(&format!(".{cents:02}"));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pallet_dimensions_parse() {
        assert_eq!(
            parse_pallet_dims("110x110x15").unwrap(),
            PalletDims {
                length: 110.0,
                width: 110.0,
                height: 15.0
            }
        );
        assert_eq!(parse_pallet_dims("120 X 100 X 14.5").unwrap().height, 14.5);
        assert!(parse_pallet_dims("110x110").is_err());
        assert!(parse_pallet_dims("axbxc").is_err());
    }

    #[test]
    fn fta_rates_parse() {
        assert_eq!(parse_fta_rate("fvn1=0").unwrap(), ("FVN1".to_string(), 0.0));
        assert_eq!(parse_fta_rate("FAS1 = 3.5").unwrap().1, 3.5);
        assert!(parse_fta_rate("FVN1").is_err());
        assert!(parse_fta_rate("=2").is_err());
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(67_500_000.0), "67,500,000");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_000.0), "1,000");
        assert_eq!(group_thousands(50_000.25), "50,000.25");
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(0.05), "0.05");
        assert_eq!(group_thousands(-1_234.5), "-1,234.50");
    }

    #[test]
    fn fractions_that_round_up_carry_into_the_whole_part() {
        assert_eq!(group_thousands(0.999), "1");
        assert_eq!(group_thousands(1_234.996), "1,235");
        assert_eq!(group_thousands(-0.001), "0");
    }

    #[test]
    fn layers_alone_use_default_pallet() {
        let args = ContainersArgs {
            length: 30.0,
            width: 20.0,
            height: 15.0,
            weight: 2.5,
            quantity: 100,
            pallet: None,
            layers: Some(6),
            json: false,
        };
        let pallet = args.shipment().pallet.unwrap();
        assert_eq!(pallet.length, 110.0);
        assert_eq!(pallet.layers, 6);
    }

    #[test]
    fn snapshot_fills_only_missing_rates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rate_snapshot.json");
        let mut stored = BTreeMap::new();
        stored.insert("USD".to_string(), 1300.0);
        stored.insert("EUR".to_string(), 1450.0);
        save_rate_snapshot(&path, &RateSnapshot::new("2026-10-19".to_string(), stored)).unwrap();

        let usd: CurrencyCode = "USD".parse().unwrap();
        let eur: CurrencyCode = "EUR".parse().unwrap();
        let mut rates = ResolvedRates::new().with_rate(usd.clone(), 1350.0);
        fill_from_snapshot(&mut rates, &[usd.clone(), eur.clone()], &path);

        assert_eq!(rates.rate_for(&usd).unwrap(), 1350.0);
        assert_eq!(rates.rate_for(&eur).unwrap(), 1450.0);
    }
}
