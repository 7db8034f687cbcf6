use calc_core::document::{Document, DocumentError};
use calc_core::{evaluate_source, UnitCatalog};

fn compile(source: &str) -> Result<Document, DocumentError> {
    Document::parse(source, &UnitCatalog::standard())
}

#[test]
fn test_mutual_reference_is_rejected() {
    let result = compile("a: b * 2\nb: a + 1");
    assert!(matches!(result, Err(DocumentError::CyclicDependency { .. })));
}

#[test]
fn test_long_cycle_is_rejected() {
    // a -> b -> c -> a, with an unrelated line in front
    let source = "1 + 1\na: c\nb: a\nc: b";
    let err = compile(source).unwrap_err();

    let DocumentError::CyclicDependency { line, depends_on } = err;
    assert!((1..=3).contains(&line));
    assert!((1..=3).contains(&depends_on));
}

#[test]
fn test_cycle_through_unparseable_line_is_still_rejected() {
    // the graph is built from tokens, before any parsing
    let result = compile("a: b +\nb: a");
    assert!(result.is_err());
}

#[test]
fn test_schedule_respects_every_dependency() {
    let source = "\
total: subtotal + tax
tax: subtotal * rate
rate: 21%
subtotal: price * count
price: 12,5 [eur]
count: 4";
    let document = evaluate_source(source, &UnitCatalog::standard()).unwrap();

    let position = |line: usize| {
        document
            .execution_order
            .iter()
            .position(|&l| l == line)
            .unwrap()
    };

    for (index, line) in document.lines.iter().enumerate() {
        for &dependency in &line.dependencies {
            assert!(
                position(dependency) < position(index),
                "line {} must run before line {}",
                dependency,
                index
            );
        }
    }

    let total = document.line_by_name("total").unwrap();
    assert!((total.value - 60.5).abs() < 1e-10);
    assert_eq!(total.unit.to_string(), "€");
}

#[test]
fn test_names_inside_unit_brackets_count_as_references() {
    let result = compile("apples: 3 [apples]");
    assert_eq!(
        result.unwrap_err(),
        DocumentError::CyclicDependency {
            line: 0,
            depends_on: 0
        }
    );
}

#[test]
fn test_names_that_are_not_declared_add_no_edges() {
    let document = compile("x + 1\ny: 2").unwrap();
    assert!(document.lines[0].dependencies.is_empty());
}
