use calc_core::document::LineOutcome;
use calc_core::{evaluate_source, render_html, CurrencyRates, UnitCatalog};

fn results(source: &str) -> String {
    evaluate_source(source, &UnitCatalog::standard())
        .unwrap()
        .execution_result()
}

#[test]
fn test_travel_budget() {
    let source = "\
# road trip
distance: 420 [km]
consumption: 6,5 [l / km]
fuel: distance * consumption / 100
fuel_price: 1,8 [eur / l]
fuel * fuel_price";

    let document = evaluate_source(source, &UnitCatalog::standard()).unwrap();
    let outcomes = document.outcomes();

    assert_eq!(outcomes[0], LineOutcome::Empty);
    match &outcomes[3] {
        LineOutcome::Value { value, unit } => {
            assert!((value - 27.3).abs() < 1e-10);
            assert_eq!(unit, "l");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    match &outcomes[5] {
        LineOutcome::Value { value, unit } => {
            assert!((value - 49.14).abs() < 1e-10);
            assert_eq!(unit, "€");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_mixed_units_and_conversions() {
    let source = "\
(5 [C]) [F]
(1 [month]) [h]
(1 [m^2]) [cm^2]
(1 [GiB]) [MiB]
(2 [ft]) + (6 [in])";

    assert_eq!(results(source), "41 °F\n720 hours\n10000 cm^2\n1024 MiB\n2.5 ft");
}

#[test]
fn test_incompatible_conversion_is_a_line_error() {
    assert_eq!(
        results("(5 [m]) [s]\n3"),
        "Error: Units are not compatible: 'm' cannot be converted to 's'\n3"
    );
    assert_eq!(
        results("(1 [in kg]) [m g]"),
        "Error: Units are not compatible: 'in kg' cannot be converted to 'g m'"
    );
}

#[test]
fn test_currency_rates_update_between_runs() {
    let mut catalog = UnitCatalog::standard();
    let source = "price: 100 [usd]\nprice [eur]";

    let before = evaluate_source(source, &catalog).unwrap().execution_result();
    assert_eq!(before, "100 $\n84 €");

    let rates: CurrencyRates = serde_json::from_str(r#"{"USD": 2}"#).unwrap();
    catalog.set_currency_rates(&rates).unwrap();

    let after = evaluate_source(source, &catalog).unwrap().execution_result();
    assert_eq!(after, "100 $\n50 €");
}

#[test]
fn test_custom_units() {
    assert_eq!(
        results("basket: 3 [apples]\nbasket * 2\nbasket + (1 [pears])"),
        "3 apples\n6 apples\nError: Units are not compatible: 'pears' cannot be converted to 'apples'"
    );
}

#[test]
fn test_colorized_document() {
    let html = render_html("x: 2 [m]\nsqrt x");

    assert!(html.contains("<br/>"));
    assert!(html.contains(r#"<span class="calc-token-literal-unit">m</span>"#));
    assert!(html.contains(r#"<span class="calc-token-function">sqrt</span>"#));
}
