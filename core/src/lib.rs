pub mod document;
pub mod units;

pub use document::{evaluate_source, render_html, Document, DocumentError, LineOutcome};
pub use units::{CurrencyRates, UnitCatalog};

