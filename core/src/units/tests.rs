//! Tests for the unit algebra and the unit catalog.

use super::*;

fn unit(catalog: &UnitCatalog, id: &str) -> FundamentalUnit {
    catalog.get(id).unwrap()
}

fn composite(catalog: &UnitCatalog, factors: &[(&str, f64)]) -> CompositeUnit {
    CompositeUnit::from_units(
        factors
            .iter()
            .map(|&(id, exponent)| UnitExponent::new(unit(catalog, id), exponent))
            .collect(),
    )
}

#[test]
fn test_composite_unit_string() {
    let catalog = UnitCatalog::standard();

    let speed = composite(&catalog, &[("meter", 2.0), ("second", -1.0)]);
    assert_eq!(speed.to_string(), "m^2 / s");

    let area = composite(&catalog, &[("centimeter", 2.0)]);
    assert_eq!(area.to_string(), "cm^2");

    let price = composite(&catalog, &[("eur", 1.0), ("meter", -2.0)]);
    assert_eq!(price.to_string(), "€ / m^2");
}

#[test]
fn test_string_is_insertion_order_independent() {
    let catalog = UnitCatalog::standard();

    let a = composite(&catalog, &[("second", -1.0), ("meter", 2.0)]);
    let b = composite(&catalog, &[("meter", 2.0), ("second", -1.0)]);
    assert_eq!(a.to_string(), "m^2 / s");
    assert_eq!(a.to_string(), b.to_string());

    // sorted by symbol bytes
    let mixed = composite(&catalog, &[("meter", 1.0), ("eur", 1.0), ("usd", 1.0)]);
    assert_eq!(mixed.to_string(), "$ m €");
}

#[test]
fn test_string_of_reciprocal_and_fractional_units() {
    let catalog = UnitCatalog::standard();

    let frequency = composite(&catalog, &[("second", -1.0)]);
    assert_eq!(frequency.to_string(), "1 / s");

    let force_ish = composite(&catalog, &[("kilogram", 1.0), ("meter", 1.0), ("second", -2.0), ("ampere", -1.0)]);
    assert_eq!(force_ish.to_string(), "kg m / A s^2");

    let root = composite(&catalog, &[("meter", 0.5)]);
    assert_eq!(root.to_string(), "m^0.5");

    assert_eq!(CompositeUnit::new().to_string(), "");
}

#[test]
fn test_fundamental_unit_conversion() {
    let catalog = UnitCatalog::standard();

    let got = convert_fundamental(5.0, &unit(&catalog, "celsius"), &unit(&catalog, "fahrenheit"), 1.0);
    assert_eq!(got, 41.0);

    let got = convert_fundamental(5.0, &unit(&catalog, "kilometer"), &unit(&catalog, "millimeter"), 1.0);
    assert_eq!(got, 5_000_000.0);

    let got = convert_fundamental(1.0, &unit(&catalog, "month"), &unit(&catalog, "hour"), 1.0);
    assert_eq!(got, 720.0);

    let got = convert_fundamental(1.0, &unit(&catalog, "meter"), &unit(&catalog, "centimeter"), 2.0);
    assert_eq!(got, 10_000.0);
}

#[test]
fn test_conversion_to_same_unit_is_identity() {
    let catalog = UnitCatalog::standard();

    for id in ["meter", "fahrenheit", "kelvin", "usd", "degrees", "gibibyte"] {
        let u = unit(&catalog, id);
        for value in [0.0, 1.0, -3.25, 1234.5678] {
            assert_eq!(convert_fundamental(value, &u, &u, 1.0), value);
            assert_eq!(convert_fundamental(value, &u, &u, -2.0), value);
        }
    }

    let speed = composite(&catalog, &[("kilometer", 1.0), ("hour", -1.0)]);
    assert_eq!(speed.convert(88.0, &speed).unwrap(), 88.0);
}

#[test]
fn test_to_base_and_back() {
    let catalog = UnitCatalog::standard();

    let inch = unit(&catalog, "inch");
    assert!((inch.to_base(1.0) - 0.0254).abs() < 1e-12);
    assert!((inch.from_base(0.0254) - 1.0).abs() < 1e-12);

    let kelvin = unit(&catalog, "kelvin");
    assert!((kelvin.to_base(273.15)).abs() < 1e-9);
    assert!((kelvin.from_base(0.0) - 273.15).abs() < 1e-9);
}

#[test]
fn test_composite_conversion() {
    let catalog = UnitCatalog::standard();

    let kmh = composite(&catalog, &[("kilometer", 1.0), ("hour", -1.0)]);
    let ms = composite(&catalog, &[("second", -1.0), ("meter", 1.0)]);

    let got = kmh.convert(36.0, &ms).unwrap();
    assert!((got - 10.0).abs() < 1e-10);

    let square_meters = composite(&catalog, &[("meter", 2.0)]);
    let square_cm = composite(&catalog, &[("centimeter", 2.0)]);
    assert_eq!(square_meters.convert(1.0, &square_cm).unwrap(), 10_000.0);
}

#[test]
fn test_compatibility_pairs_entries_in_canonical_order() {
    let catalog = UnitCatalog::standard();

    // "in" < "kg" but "g" < "m": inch pairs with gram
    let a = composite(&catalog, &[("inch", 1.0), ("kilogram", 1.0)]);
    let b = composite(&catalog, &[("meter", 1.0), ("gram", 1.0)]);
    assert!(!a.is_compatible(&b));
    assert_eq!(
        a.convert(1.0, &b).unwrap_err(),
        UnitError::Incompatible {
            from: "in kg".to_string(),
            to: "g m".to_string()
        }
    );

    // same order on both sides
    let c = composite(&catalog, &[("inch", 1.0), ("second", -1.0)]);
    let d = composite(&catalog, &[("meter", 1.0), ("minute", -1.0)]);
    assert!(c.is_compatible(&d));
    let got = c.convert(1.0, &d).unwrap();
    assert!((got - 0.0254 * 60.0).abs() < 1e-9);
}

#[test]
fn test_incompatible_units() {
    let catalog = UnitCatalog::standard();

    let meters = composite(&catalog, &[("meter", 1.0)]);
    let seconds = composite(&catalog, &[("second", 1.0)]);
    let square_meters = composite(&catalog, &[("meter", 2.0)]);

    assert!(!meters.is_compatible(&seconds));
    assert!(!meters.is_compatible(&square_meters));
    assert!(!meters.is_compatible(&CompositeUnit::new()));
    assert!(CompositeUnit::new().is_compatible(&CompositeUnit::new()));

    let err = meters.convert(1.0, &seconds).unwrap_err();
    assert_eq!(
        err,
        UnitError::Incompatible {
            from: "m".to_string(),
            to: "s".to_string()
        }
    );
}

#[test]
fn test_product_merges_same_family() {
    let catalog = UnitCatalog::standard();
    let meters = composite(&catalog, &[("meter", 1.0)]);

    let (value, unit) = CompositeUnit::product(3.0, &meters, 4.0, &meters);
    assert_eq!(value, 12.0);
    assert_eq!(unit.len(), 1);
    assert_eq!(unit.exponent_of("meter"), Some(2.0));
    assert_eq!(unit.to_string(), "m^2");
}

#[test]
fn test_product_converts_into_first_operand_scale() {
    let catalog = UnitCatalog::standard();
    let meters = composite(&catalog, &[("meter", 1.0)]);
    let centimeters = composite(&catalog, &[("centimeter", 1.0)]);

    let (value, unit) = CompositeUnit::product(1.0, &meters, 50.0, &centimeters);
    assert!((value - 0.5).abs() < 1e-12);
    assert_eq!(unit.to_string(), "m^2");
}

#[test]
fn test_product_keeps_other_families() {
    let catalog = UnitCatalog::standard();
    let newtons_ish = composite(&catalog, &[("kilogram", 1.0)]);
    let accel = composite(&catalog, &[("meter", 1.0), ("second", -2.0)]);

    let (value, unit) = CompositeUnit::product(2.0, &newtons_ish, 9.81, &accel);
    assert!((value - 19.62).abs() < 1e-12);
    assert_eq!(unit.to_string(), "kg m / s^2");
}

#[test]
fn test_division_cancels_units() {
    let catalog = UnitCatalog::standard();
    let km = composite(&catalog, &[("kilometer", 1.0)]);
    let m = composite(&catalog, &[("meter", 1.0)]);

    let (value, unit) = CompositeUnit::division(5.0, &km, 2.0, &m);
    assert!((value - 2500.0).abs() < 1e-9);
    assert!(unit.is_empty());

    let h = composite(&catalog, &[("hour", 1.0)]);
    let (value, unit) = CompositeUnit::division(10.0, &km, 2.0, &h);
    assert_eq!(value, 5.0);
    assert_eq!(unit.to_string(), "km / hours");
}

#[test]
fn test_exponentiation() {
    let catalog = UnitCatalog::standard();
    let speed = composite(&catalog, &[("meter", 1.0), ("second", -1.0)]);

    assert_eq!(speed.powf(2.0).to_string(), "m^2 / s^2");
    assert_eq!(speed.powf(-1.0).to_string(), "s / m");
    assert!(speed.powf(0.0).is_empty());

    let area = composite(&catalog, &[("meter", 2.0)]);
    assert_eq!(area.powf(0.5).single_unit().map(|u| u.id.as_str()), Some("meter"));
}

#[test]
fn test_from_factors_merges_and_rejects() {
    let catalog = UnitCatalog::standard();

    let merged = CompositeUnit::from_factors(vec![
        UnitExponent::new(unit(&catalog, "meter"), 1.0),
        UnitExponent::new(unit(&catalog, "second"), -1.0),
        UnitExponent::new(unit(&catalog, "meter"), 1.0),
    ])
    .unwrap();
    assert_eq!(merged.to_string(), "m^2 / s");

    let cancelled = CompositeUnit::from_factors(vec![
        UnitExponent::new(unit(&catalog, "meter"), 1.0),
        UnitExponent::new(unit(&catalog, "meter"), -1.0),
    ])
    .unwrap();
    assert!(cancelled.is_empty());

    let mixed = CompositeUnit::from_factors(vec![
        UnitExponent::new(unit(&catalog, "kilometer"), 1.0),
        UnitExponent::new(unit(&catalog, "meter"), -1.0),
    ]);
    assert_eq!(
        mixed,
        Err(UnitError::MixedFamily("km".to_string(), "m".to_string()))
    );
}

#[test]
fn test_custom_units_only_match_themselves() {
    let apples = CompositeUnit::from_fundamental(FundamentalUnit::custom("apples"));
    let pears = CompositeUnit::from_fundamental(FundamentalUnit::custom("pears"));

    assert!(apples.is_compatible(&apples.clone()));
    assert!(!apples.is_compatible(&pears));
    assert_eq!(apples.convert(3.0, &apples).unwrap(), 3.0);
    assert_eq!(apples.to_string(), "apples");
}

#[test]
fn test_catalog_aliases() {
    let catalog = UnitCatalog::standard();

    assert_eq!(catalog.resolve_alias("km").unwrap().id, "kilometer");
    assert_eq!(catalog.resolve_alias("metre").unwrap().id, "meter");
    assert_eq!(catalog.resolve_alias("μm").unwrap().id, "micrometer");
    assert_eq!(catalog.resolve_alias("EUR").unwrap().id, "eur");
    assert_eq!(catalog.resolve_alias("deg").unwrap().family, RADIANS);
    assert!(catalog.resolve_alias("apples").is_none());
    assert!(!catalog.is_empty());
}

#[test]
fn test_catalog_families_have_a_base_unit() {
    let catalog = UnitCatalog::standard();

    for &(_, _, _, family, _, _) in catalog::STANDARD_UNITS {
        let base = catalog.get(family).expect("family base unit exists");
        assert_eq!(base.factor, 1.0);
        assert_eq!(base.shift, 0.0);
    }
}

#[test]
fn test_set_currency_rates() {
    let mut catalog = UnitCatalog::standard();
    assert_eq!(catalog.get("usd").unwrap().factor, 0.84);

    catalog
        .set_currency_rates(&CurrencyRates::new().with("USD", 1.25).with("gbp", 0.8))
        .unwrap();

    assert_eq!(catalog.get("usd").unwrap().factor, 0.8);
    assert_eq!(catalog.resolve_alias("$").unwrap().factor, 0.8);
    assert_eq!(catalog.get("gbp").unwrap().factor, 1.25);
    // untouched currencies keep their defaults
    assert_eq!(catalog.get("cad").unwrap().factor, 0.67);
}

#[test]
fn test_set_currency_rates_is_all_or_nothing() {
    let mut catalog = UnitCatalog::standard();

    let err = catalog
        .set_currency_rates(&CurrencyRates::new().with("usd", 2.0).with("meter", 3.0))
        .unwrap_err();
    assert_eq!(err, UnitError::UnknownCurrency("meter".to_string()));
    assert_eq!(catalog.get("usd").unwrap().factor, 0.84);

    let err = catalog
        .set_currency_rates(&CurrencyRates::new().with("cny", 0.0))
        .unwrap_err();
    assert!(matches!(err, UnitError::InvalidRate { .. }));

    let err = catalog
        .set_currency_rates(&CurrencyRates::new().with("EUR", 1.0))
        .unwrap_err();
    assert_eq!(err, UnitError::ReferenceCurrency("EUR".to_string()));
}

#[test]
fn test_set_currency_rates_rejects_ids_differing_only_in_case() {
    let mut catalog = UnitCatalog::standard();

    let err = catalog
        .set_currency_rates(&CurrencyRates::new().with("usd", 2.0).with("USD", 3.0))
        .unwrap_err();
    assert_eq!(err, UnitError::DuplicateCurrency("usd".to_string()));
    assert_eq!(catalog.get("usd").unwrap().factor, 0.84);
}

#[test]
fn test_currency_rates_deserialize_from_json() {
    let rates: CurrencyRates = serde_json::from_str(r#"{"USD": 1.18, "CAD": 1.5}"#).unwrap();
    assert_eq!(rates.0.len(), 2);
    assert_eq!(rates.0["USD"], 1.18);
}
