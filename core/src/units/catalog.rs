//! The unit catalog: every fundamental unit the language knows about, the
//! alias table used to resolve names written inside unit brackets, and the
//! currency rates that callers may update between evaluation runs.

use super::{FundamentalUnit, UnitError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Family shared by all currencies; its base unit is the euro.
pub const CURRENCY_FAMILY: &str = "eur";

pub const RADIANS: &str = "radians";
pub const DEGREES: &str = "degrees";

const KIBI: f64 = (1u64 << 10) as f64;
const MEBI: f64 = (1u64 << 20) as f64;
const GIBI: f64 = (1u64 << 30) as f64;
const TEBI: f64 = (1u64 << 40) as f64;
const PEBI: f64 = (1u64 << 50) as f64;

/// (id, symbol, aliases, family, factor, shift)
pub(super) type Entry = (&'static str, &'static str, &'static [&'static str], &'static str, f64, f64);

pub(super) const STANDARD_UNITS: &[Entry] = &[
    // metric lengths
    ("meter", "m", &["m", "meter", "metre"], "meter", 1.0, 0.0),
    ("decimeter", "dm", &["dm", "decimetre", "decimeter"], "meter", 1e-1, 0.0),
    ("centimeter", "cm", &["cm", "centimetre", "centimeter"], "meter", 1e-2, 0.0),
    ("millimeter", "mm", &["mm", "millimetre", "millimeter"], "meter", 1e-3, 0.0),
    ("micrometer", "μm", &["μm", "um", "micrometre", "micrometer"], "meter", 1e-6, 0.0),
    ("nanometer", "nm", &["nm", "nanometre", "nanometer"], "meter", 1e-9, 0.0),
    ("picometer", "pm", &["pm", "picometre", "picometer"], "meter", 1e-12, 0.0),
    ("femtometer", "fm", &["fm", "femtometre", "femtometer"], "meter", 1e-15, 0.0),
    ("decameter", "dam", &["dam", "decametre", "decameter"], "meter", 1e1, 0.0),
    ("hectometer", "hm", &["hm", "hectometre", "hectometer"], "meter", 1e2, 0.0),
    ("kilometer", "km", &["km", "kilometre", "kilometer"], "meter", 1e3, 0.0),
    ("megameter", "Mm", &["Mm", "megametre", "megameter"], "meter", 1e6, 0.0),
    ("gigameter", "Gm", &["Gm", "gigametre", "gigameter"], "meter", 1e9, 0.0),
    // imperial lengths
    ("inch", "in", &["in", "inch", "inches"], "meter", 0.0254, 0.0),
    ("foot", "ft", &["ft", "foot", "feet"], "meter", 0.3048, 0.0),
    ("yard", "yd", &["yd", "yard", "yards"], "meter", 0.9144, 0.0),
    ("mile", "mi", &["mi", "mile", "miles"], "meter", 1609.344, 0.0),
    ("nautical_mile", "nmi", &["nmi", "nautical_mile", "nautical_miles"], "meter", 1852.0, 0.0),
    // astronomical lengths
    ("lunar_distance", "ld", &["ld", "lunar_distance", "lunar_distances"], "meter", 384_402_000.0, 0.0),
    ("astronomical_unit", "au", &["au", "astronomical_unit", "astronomical_units"], "meter", 149_597_870_700.0, 0.0),
    ("light_year", "ly", &["ly", "light_year", "light_years"], "meter", 9_460_730_472_580_800.0, 0.0),
    // metric mass
    ("kilogram", "kg", &["kg", "kilogram", "kilograms"], "kilogram", 1.0, 0.0),
    ("hectogram", "hg", &["hg", "hectogram", "hectograms"], "kilogram", 1e-1, 0.0),
    ("decagram", "dag", &["dag", "decagram", "decagrams"], "kilogram", 1e-2, 0.0),
    ("gram", "g", &["g", "gram", "grams"], "kilogram", 1e-3, 0.0),
    ("decigram", "dg", &["dg", "decigram", "decigrams"], "kilogram", 1e-4, 0.0),
    ("centigram", "cg", &["cg", "centigram", "centigrams"], "kilogram", 1e-5, 0.0),
    ("milligram", "mg", &["mg", "milligram", "milligrams"], "kilogram", 1e-6, 0.0),
    ("microgram", "µg", &["µg", "ug", "microgram", "micrograms"], "kilogram", 1e-9, 0.0),
    ("tonne", "ton", &["t", "MG", "megagram", "tonne", "tonnes", "ton"], "kilogram", 1e3, 0.0),
    // imperial mass
    ("pound", "lbs", &["lbs", "lb", "pound", "pounds"], "kilogram", 0.453_592_37, 0.0),
    ("ounce", "oz", &["oz", "ounce", "ounces"], "kilogram", 0.028_349_523_125, 0.0),
    // time
    ("second", "s", &["s", "second", "seconds"], "second", 1.0, 0.0),
    ("millisecond", "ms", &["ms", "millisecond", "milliseconds"], "second", 1e-3, 0.0),
    ("minute", "min", &["min", "minute", "minutes"], "second", 60.0, 0.0),
    ("hour", "hours", &["h", "hour", "hours"], "second", 3600.0, 0.0),
    ("day", "days", &["d", "day", "days"], "second", 86_400.0, 0.0),
    ("month", "month", &["month", "months"], "second", 2_592_000.0, 0.0),
    ("year", "year", &["year", "years"], "second", 31_556_952.0, 0.0),
    // temperature
    ("celsius", "°C", &["C", "°C", "celsius"], "celsius", 1.0, 0.0),
    ("fahrenheit", "°F", &["F", "°F", "fahrenheit"], "celsius", 5.0 / 9.0, -32.0),
    ("kelvin", "K", &["K", "kelvin"], "celsius", 1.0, -273.15),
    // electric current
    ("ampere", "A", &["A", "ampere", "amperes"], "ampere", 1.0, 0.0),
    // currencies, factors are overridden at runtime
    ("eur", "€", &["€", "eur", "EUR"], CURRENCY_FAMILY, 1.0, 0.0),
    ("usd", "$", &["$", "usd", "USD"], CURRENCY_FAMILY, 0.84, 0.0),
    ("gbp", "£", &["£", "gbp", "GBP"], CURRENCY_FAMILY, 1.17, 0.0),
    ("cny", "¥", &["¥", "cny", "CNY"], CURRENCY_FAMILY, 0.13, 0.0),
    ("cad", "CAD", &["cad", "CAD"], CURRENCY_FAMILY, 0.67, 0.0),
    // angles
    (RADIANS, "rad", &["rad", "radians"], RADIANS, 1.0, 0.0),
    (DEGREES, "deg", &["deg", "degrees"], RADIANS, PI / 180.0, 0.0),
    // pressure
    ("pascal", "Pa", &["Pa", "pascal"], "pascal", 1.0, 0.0),
    ("bar", "bar", &["bar"], "pascal", 100_000.0, 0.0),
    ("atmosphere", "atm", &["atm", "atmosphere"], "pascal", 101_325.0, 0.0),
    ("millimeter_of_mercury", "mmHg", &["mmHg", "millimeter_of_mercury"], "pascal", 101_325.0 / 760.0, 0.0),
    // data
    ("bit", "bit", &["b", "bit", "bits"], "bit", 1.0, 0.0),
    ("byte", "B", &["B", "byte", "bytes"], "bit", 8.0, 0.0),
    ("kilobit", "kbit", &["kbit", "kb", "kilobit"], "bit", 1e3, 0.0),
    ("kibibit", "Kibit", &["Kib", "Kibit", "kibibit"], "bit", KIBI, 0.0),
    ("kilobyte", "kB", &["kB", "kilobyte"], "bit", 8.0 * 1e3, 0.0),
    ("kibibyte", "KiB", &["KiB", "kibibyte"], "bit", 8.0 * KIBI, 0.0),
    ("megabit", "Mbit", &["Mbit", "megabit"], "bit", 1e6, 0.0),
    ("mebibit", "Mibit", &["Mibit", "mebibit"], "bit", MEBI, 0.0),
    ("megabyte", "MB", &["MB", "megabyte"], "bit", 8.0 * 1e6, 0.0),
    ("mebibyte", "MiB", &["MiB", "mebibyte"], "bit", 8.0 * MEBI, 0.0),
    ("gigabit", "Gbit", &["Gbit", "gigabit"], "bit", 1e9, 0.0),
    ("gibibit", "Gibit", &["Gibit", "gibibit"], "bit", GIBI, 0.0),
    ("gigabyte", "GB", &["GB", "gigabyte"], "bit", 8.0 * 1e9, 0.0),
    ("gibibyte", "GiB", &["GiB", "gibibyte"], "bit", 8.0 * GIBI, 0.0),
    ("terabit", "Tbit", &["Tbit", "terabit"], "bit", 1e12, 0.0),
    ("tebibit", "Tibit", &["Tibit", "tebibit"], "bit", TEBI, 0.0),
    ("terabyte", "TB", &["TB", "terabyte"], "bit", 8.0 * 1e12, 0.0),
    ("tebibyte", "TiB", &["TiB", "tebibyte"], "bit", 8.0 * TEBI, 0.0),
    ("petabit", "Pbit", &["Pbit", "petabit"], "bit", 1e15, 0.0),
    ("pebibit", "Pibit", &["Pibit", "pebibit"], "bit", PEBI, 0.0),
    ("petabyte", "PB", &["PB", "petabyte"], "bit", 8.0 * 1e15, 0.0),
    ("pebibyte", "PiB", &["PiB", "pebibyte"], "bit", 8.0 * PEBI, 0.0),
];

/// Currency conversion rates, keyed by currency id (case insensitive) and
/// expressed as units of that currency per one euro.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyRates(pub HashMap<String, f64>);

impl CurrencyRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, rate: f64) -> Self {
        self.0.insert(id.to_string(), rate);
        self
    }
}

/// All known fundamental units plus the alias lookup built from them.
///
/// The table itself never changes once built; currency factors set through
/// [`UnitCatalog::set_currency_rates`] live in a separate override map that is
/// consulted on every lookup.
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    units: HashMap<String, FundamentalUnit>,
    aliases: HashMap<String, String>,
    currency_overrides: HashMap<String, f64>,
}

impl UnitCatalog {
    /// The built-in catalog.
    pub fn standard() -> Self {
        Self::from_units(
            STANDARD_UNITS
                .iter()
                .map(|&(id, symbol, aliases, family, factor, shift)| {
                    FundamentalUnit::new(id, symbol, aliases, family, factor, shift)
                }),
        )
    }

    /// Build a catalog and its alias table. When two units claim the same
    /// alias, the later one wins.
    pub fn from_units(units: impl IntoIterator<Item = FundamentalUnit>) -> Self {
        let mut catalog = Self {
            units: HashMap::new(),
            aliases: HashMap::new(),
            currency_overrides: HashMap::new(),
        };

        for unit in units {
            for alias in &unit.aliases {
                catalog.aliases.insert(alias.clone(), unit.id.clone());
            }
            catalog.units.insert(unit.id.clone(), unit);
        }

        debug!(
            units = catalog.units.len(),
            aliases = catalog.aliases.len(),
            "unit catalog loaded"
        );
        catalog
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Look up a unit by id, with any currency override applied.
    pub fn get(&self, id: &str) -> Option<FundamentalUnit> {
        let mut unit = self.units.get(id)?.clone();
        if let Some(&factor) = self.currency_overrides.get(id) {
            unit.factor = factor;
        }
        Some(unit)
    }

    /// Resolve a name written inside a unit bracket.
    pub fn resolve_alias(&self, alias: &str) -> Option<FundamentalUnit> {
        self.aliases.get(alias).and_then(|id| self.get(id))
    }

    pub fn is_currency(&self, id: &str) -> bool {
        self.units
            .get(id)
            .is_some_and(|unit| unit.family == CURRENCY_FAMILY)
    }

    /// Apply new exchange rates. A rate `r` for `usd` means one euro buys `r`
    /// dollars, so the dollar's factor becomes `1 / r`.
    ///
    /// The update is all-or-nothing: if any entry is rejected, no rate
    /// changes. Ids are compared case-insensitively, so `usd` and `USD` in
    /// the same update are a duplicate.
    pub fn set_currency_rates(&mut self, rates: &CurrencyRates) -> Result<(), UnitError> {
        let mut factors: HashMap<String, f64> = HashMap::with_capacity(rates.0.len());

        for (key, &rate) in &rates.0 {
            let id = key.to_lowercase();

            if !self.is_currency(&id) {
                warn!("rejected rate for unknown currency {}", key);
                return Err(UnitError::UnknownCurrency(key.clone()));
            }
            if id == CURRENCY_FAMILY {
                return Err(UnitError::ReferenceCurrency(key.clone()));
            }
            if !rate.is_finite() || rate <= 0.0 {
                warn!("rejected rate {} for {}", rate, key);
                return Err(UnitError::InvalidRate { id: key.clone(), rate });
            }

            if factors.insert(id, 1.0 / rate).is_some() {
                warn!("rejected duplicate rate for {}", key);
                return Err(UnitError::DuplicateCurrency(key.to_lowercase()));
            }
        }

        for (id, factor) in factors {
            debug!(currency = %id, factor, "currency factor updated");
            self.currency_overrides.insert(id, factor);
        }
        Ok(())
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
