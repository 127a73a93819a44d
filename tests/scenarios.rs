use import_estimator::domain::{
    estimate_landed_cost, estimate_shipment, BoxSpec, ContainerCatalog, ContainerType, CostInput,
    CostPolicy, CurrencyCode, RateType, RecommendationPolicy, ResolvedRates, ShipmentInput,
    TariffCandidate, TariffContext,
};
use import_estimator::infra::{
    resolve_rates, ExchangeRateProvider, HsCode, StaticRateBook, TariffRateProvider,
};
use import_estimator::util::assets::fta_table;
use import_estimator::util::config::EstimatorConfig;
use time::macros::date;

fn carton() -> BoxSpec {
    BoxSpec {
        length: 30.0,
        width: 20.0,
        height: 15.0,
        weight: 2.5,
    }
}

fn usd() -> CurrencyCode {
    "USD".parse().unwrap()
}

fn krw_input(unit_price: f64, quantity: u64) -> CostInput {
    CostInput {
        unit_price,
        quantity,
        product_currency: CurrencyCode::krw(),
        shipping_cost: 0.0,
        shipping_currency: CurrencyCode::krw(),
        other_costs_krw: 0.0,
    }
}

#[test]
fn thousand_cartons_fit_one_twenty_foot() {
    let estimate = estimate_shipment(
        &ShipmentInput::direct(carton(), 1000),
        &ContainerCatalog::standard(),
        &RecommendationPolicy::default(),
    )
    .unwrap();

    let twenty = estimate
        .results
        .iter()
        .find(|outcome| outcome.container_type() == ContainerType::Twenty)
        .and_then(|outcome| outcome.loaded())
        .unwrap();
    assert!(twenty.boxes_per_container > 1000);
    assert_eq!(twenty.containers_needed, 1);
    assert_eq!(twenty.remaining_boxes, 0);
    assert!(!twenty.weight_limited);
}

#[test]
fn product_value_converts_dollars_to_won() {
    let input = CostInput {
        product_currency: usd(),
        ..krw_input(50.0, 1000)
    };
    let table = fta_table().unwrap();
    let estimate = estimate_landed_cost(
        &input,
        &ResolvedRates::new().with_rate(usd(), 1350.0),
        TariffContext {
            candidates: &[],
            country: None,
            fta_table: &table,
            default_rate_percent: 8.0,
        },
        &CostPolicy::default(),
    )
    .unwrap();

    assert_eq!(estimate.breakdown.product_value_krw, 67_500_000.0);
    assert_eq!(estimate.selected_tariff.rate_type, RateType::Default);
}

#[test]
fn eight_percent_duty_on_seventy_million_cif() {
    let table = fta_table().unwrap();
    let candidates = [TariffCandidate::wto(8.0)];
    let estimate = estimate_landed_cost(
        &krw_input(70_000.0, 1000),
        &ResolvedRates::new(),
        TariffContext {
            candidates: &candidates,
            country: Some("US"),
            fta_table: &table,
            default_rate_percent: 8.0,
        },
        &CostPolicy::default(),
    )
    .unwrap();

    let b = estimate.breakdown;
    assert_eq!(b.cif_krw, 70_000_000.0);
    assert_eq!(b.tariff_amount_krw, 5_600_000.0);
    assert_eq!(b.certificate_of_origin_cost_krw, 0.0);
    assert_eq!(b.vat_base_krw, 75_600_000.0);
    assert!((b.vat_amount_krw - 7_560_000.0).abs() < 1e-6);
    assert!((b.total_cost_krw - 83_160_000.0).abs() < 1e-6);
    assert_eq!(b.round_krw().total_cost_krw, 83_160_000.0);
}

#[test]
fn fifty_nine_percent_of_a_twenty_foot_ships_lcl() {
    let catalog = ContainerCatalog::standard();
    let policy = RecommendationPolicy::default();

    let single = estimate_shipment(&ShipmentInput::direct(carton(), 1), &catalog, &policy).unwrap();
    let capacity = single.results[0].capacity();
    let quantity = capacity * 59 / 100;

    let estimate =
        estimate_shipment(&ShipmentInput::direct(carton(), quantity), &catalog, &policy).unwrap();
    assert!(estimate.recommendation.is_lcl());
    assert_eq!(estimate.recommendation.shipping_method, "LCL");
}

#[test]
fn zero_rate_agreement_beats_wto_and_needs_certificate() {
    let table = fta_table().unwrap();
    let candidates = [
        TariffCandidate::basic(8.0),
        TariffCandidate::wto(8.0),
        TariffCandidate::fta("FVN1", 0.0),
    ];
    let estimate = estimate_landed_cost(
        &krw_input(70_000.0, 1000),
        &ResolvedRates::new(),
        TariffContext {
            candidates: &candidates,
            country: Some("VN"),
            fta_table: &table,
            default_rate_percent: 8.0,
        },
        &CostPolicy::default(),
    )
    .unwrap();

    let tariff = &estimate.selected_tariff;
    assert_eq!(tariff.rate_percent, 0.0);
    assert_eq!(tariff.rate_type, RateType::Fta);
    assert!(tariff.needs_certificate_of_origin);
    assert_eq!(estimate.breakdown.certificate_of_origin_cost_krw, 50_000.0);
}

#[test]
fn agreement_for_another_country_is_ignored() {
    let table = fta_table().unwrap();
    let candidates = [TariffCandidate::wto(8.0), TariffCandidate::fta("FVN1", 0.0)];
    let estimate = estimate_landed_cost(
        &krw_input(10_000.0, 10),
        &ResolvedRates::new(),
        TariffContext {
            candidates: &candidates,
            country: Some("US"),
            fta_table: &table,
            default_rate_percent: 8.0,
        },
        &CostPolicy::default(),
    )
    .unwrap();
    assert_eq!(estimate.selected_tariff.rate_percent, 8.0);
    assert!(!estimate.selected_tariff.needs_certificate_of_origin);
}

#[test]
fn rate_book_feeds_the_cost_pipeline() {
    let book = StaticRateBook::from_json(
        r#"{
            "exchangeRates": { "USD": { "2026-10-01": 1350.0 } },
            "tariffs": {
                "8471300000": [
                    { "rateType": "wto", "ratePercent": 8.0, "label": "WTO" },
                    { "rateType": "fta", "ratePercent": 0.0, "label": "FTA (FVN1)", "ftaCode": "FVN1" }
                ]
            }
        }"#,
    )
    .unwrap();
    let day = date!(2026 - 10 - 19);
    let hs_code: HsCode = "8471.30-0000".parse().unwrap();

    let input = CostInput {
        product_currency: usd(),
        ..krw_input(50.0, 1000)
    };
    let rates = resolve_rates(&book, [input.product_currency.clone()].iter(), day).unwrap();
    let candidates = book.candidates(&hs_code, day).unwrap();
    assert_eq!(book.krw_rate(&usd(), day).unwrap(), 1350.0);

    let config = EstimatorConfig::default();
    let table = fta_table().unwrap();
    let estimate = estimate_landed_cost(
        &input,
        &rates,
        TariffContext {
            candidates: &candidates,
            country: Some("vn"),
            fta_table: &table,
            default_rate_percent: config.default_tariff_percent,
        },
        &config.cost,
    )
    .unwrap();

    assert_eq!(estimate.breakdown.product_value_krw, 67_500_000.0);
    assert_eq!(estimate.selected_tariff.fta_code.as_deref(), Some("FVN1"));
}

#[test]
fn configured_envelopes_change_capacity() {
    let mut config = EstimatorConfig::default();
    let mut short = *ContainerCatalog::standard().envelope(ContainerType::Twenty);
    short.interior_length = 300.0;
    config.containers.insert(ContainerType::Twenty, short);

    let standard = estimate_shipment(
        &ShipmentInput::direct(carton(), 1000),
        &ContainerCatalog::standard(),
        &config.recommendation,
    )
    .unwrap();
    let custom = estimate_shipment(
        &ShipmentInput::direct(carton(), 1000),
        &config.catalog(),
        &config.recommendation,
    )
    .unwrap();

    assert!(custom.results[0].capacity() < standard.results[0].capacity());
}

#[test]
fn estimates_serialise_with_krw_field_names() {
    let table = fta_table().unwrap();
    let estimate = estimate_landed_cost(
        &krw_input(1_000.0, 1),
        &ResolvedRates::new(),
        TariffContext {
            candidates: &[],
            country: None,
            fta_table: &table,
            default_rate_percent: 0.0,
        },
        &CostPolicy::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&estimate).unwrap();
    assert!(json["breakdown"]["totalCostKRW"].is_number());
    assert!(json["selectedTariff"]["needsCertificateOfOrigin"].is_boolean());
}
