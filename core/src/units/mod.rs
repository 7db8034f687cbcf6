//! Unit algebra.
//!
//! A [`FundamentalUnit`] is an atomic unit with an affine conversion to the
//! base unit of its family (meter for lengths, celsius for temperatures, ...).
//! A [`CompositeUnit`] is a product of fundamental units raised to real
//! exponents, and carries values through arithmetic:
//! - conversion between compatible composite units
//! - product and division, merging entries of the same family
//! - exponentiation

pub mod catalog;

#[cfg(test)]
mod tests;

pub use catalog::{CurrencyRates, UnitCatalog, CURRENCY_FAMILY, DEGREES, RADIANS};

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors raised by unit conversion and by catalog updates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("Units are not compatible: '{from}' cannot be converted to '{to}'")]
    Incompatible { from: String, to: String },
    #[error("Units '{0}' and '{1}' measure the same quantity and cannot be mixed in one annotation")]
    MixedFamily(String, String),
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("'{0}' is the reference currency and has a fixed rate")]
    ReferenceCurrency(String),
    #[error("Invalid conversion rate for {id}: {rate}")]
    InvalidRate { id: String, rate: f64 },
    #[error("Currency {0} is given more than one rate")]
    DuplicateCurrency(String),
}

/// Catalog entry: an atomic unit with a linear (and optionally affine)
/// conversion to the base unit of its family.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalUnit {
    pub id: String,
    /// Symbol used when rendering values, e.g. "km"
    pub symbol: String,
    /// Names accepted inside unit brackets
    pub aliases: Vec<String>,
    /// Base-unit family; units convert only within the same family
    pub family: String,
    /// Multiplier taking a value (after shifting) to the family's base unit
    pub factor: f64,
    /// Added to a value before scaling, for affine units like temperatures
    pub shift: f64,
}

impl FundamentalUnit {
    pub fn new(
        id: &str,
        symbol: &str,
        aliases: &[&str],
        family: &str,
        factor: f64,
        shift: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            family: family.to_string(),
            factor,
            shift,
        }
    }

    /// An ad-hoc unit that is only convertible to itself.
    pub fn custom(name: &str) -> Self {
        Self {
            id: name.to_string(),
            symbol: name.to_string(),
            aliases: vec![name.to_string()],
            family: format!("custom:{}", name),
            factor: 1.0,
            shift: 0.0,
        }
    }

    pub fn is_compatible(&self, other: &Self) -> bool {
        self.family == other.family
    }

    /// Convert a value in this unit to the family's base unit
    pub fn to_base(&self, value: f64) -> f64 {
        (value + self.shift) * self.factor
    }

    /// Convert a value in the family's base unit to this unit
    pub fn from_base(&self, base_value: f64) -> f64 {
        base_value / self.factor - self.shift
    }
}

impl fmt::Display for FundamentalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Convert `value` from one unit to another compatible unit, both raised to
/// `exponent`.
pub fn convert_fundamental(
    value: f64,
    from: &FundamentalUnit,
    to: &FundamentalUnit,
    exponent: f64,
) -> f64 {
    debug_assert!(from.is_compatible(to), "converting across unit families");

    if from.id == to.id {
        return value;
    }

    let value = (value + from.shift) * from.factor.powf(exponent);
    value / to.factor.powf(exponent) - to.shift
}

/// A fundamental unit raised to a power.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitExponent {
    pub unit: FundamentalUnit,
    pub exponent: f64,
}

impl UnitExponent {
    pub fn new(unit: FundamentalUnit, exponent: f64) -> Self {
        Self { unit, exponent }
    }
}

/// Product of unit powers, e.g. `m^2 / s` is `{meter: 2, second: -1}`.
/// An empty composite unit is dimensionless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeUnit {
    units: Vec<UnitExponent>,
}

impl CompositeUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a list of factors as-is, in the given order.
    pub fn from_units(units: Vec<UnitExponent>) -> Self {
        Self { units }
    }

    /// Build a well-formed unit from the factors of a unit annotation.
    ///
    /// Repeated units are merged by summing exponents and zero exponents are
    /// dropped. Two different units of the same family (`[km / m]`) are
    /// rejected.
    pub fn from_factors(factors: Vec<UnitExponent>) -> Result<Self, UnitError> {
        let mut units: Vec<UnitExponent> = Vec::with_capacity(factors.len());

        for factor in factors {
            match units.iter_mut().find(|u| u.unit.is_compatible(&factor.unit)) {
                Some(existing) if existing.unit.id == factor.unit.id => {
                    existing.exponent += factor.exponent;
                }
                Some(existing) => {
                    return Err(UnitError::MixedFamily(
                        existing.unit.symbol.clone(),
                        factor.unit.symbol.clone(),
                    ));
                }
                None => units.push(factor),
            }
        }

        units.retain(|u| u.exponent != 0.0);
        let mut unit = Self { units };
        unit.sort();
        Ok(unit)
    }

    /// A single fundamental unit with exponent 1.
    pub fn from_fundamental(unit: FundamentalUnit) -> Self {
        Self {
            units: vec![UnitExponent::new(unit, 1.0)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> &[UnitExponent] {
        &self.units
    }

    /// The exponent of the entry belonging to `family`, if any.
    pub fn exponent_of(&self, family: &str) -> Option<f64> {
        self.units
            .iter()
            .find(|u| u.unit.family == family)
            .map(|u| u.exponent)
    }

    /// The fundamental unit when this is exactly one unit to the first power.
    pub fn single_unit(&self) -> Option<&FundamentalUnit> {
        match self.units.as_slice() {
            [only] if only.exponent == 1.0 => Some(&only.unit),
            _ => None,
        }
    }

    /// Canonical order: positive exponents first, then by symbol.
    pub fn sort(&mut self) {
        self.units.sort_by(canonical_order);
    }

    /// Entries ordered by family, used to pair up the entries of two units.
    fn by_family(&self) -> Vec<&UnitExponent> {
        let mut units: Vec<&UnitExponent> = self.units.iter().collect();
        units.sort_by(|a, b| family_order(a, b));
        units
    }

    /// Entries in canonical order, used to pair up the entries of two units
    /// for compatibility and conversion.
    fn canonical(&self) -> Vec<&UnitExponent> {
        let mut units: Vec<&UnitExponent> = self.units.iter().collect();
        units.sort_by(|a, b| canonical_order(a, b));
        units
    }

    /// Whether both units measure the same quantity. Entries are paired in
    /// canonical order and each pair must share family and exponent, so
    /// `in kg` and `m g` do not match.
    pub fn is_compatible(&self, other: &Self) -> bool {
        if self.units.len() != other.units.len() {
            return false;
        }

        self.canonical()
            .iter()
            .zip(other.canonical())
            .all(|(a, b)| a.exponent == b.exponent && a.unit.is_compatible(&b.unit))
    }

    /// Convert `value` expressed in this unit into `to`.
    ///
    /// Each axis is converted on its own, one after the other. Affine units
    /// (temperatures) combined with other axes therefore convert incorrectly.
    pub fn convert(&self, value: f64, to: &Self) -> Result<f64, UnitError> {
        if !self.is_compatible(to) {
            return Err(UnitError::Incompatible {
                from: self.to_string(),
                to: to.to_string(),
            });
        }

        let converted = self
            .canonical()
            .into_iter()
            .zip(to.canonical())
            .fold(value, |value, (from, to)| {
                convert_fundamental(value, &from.unit, &to.unit, from.exponent)
            });

        Ok(converted)
    }

    /// Raise every entry to `power`.
    pub fn powf(&self, power: f64) -> Self {
        let units = self
            .units
            .iter()
            .map(|u| UnitExponent::new(u.unit.clone(), u.exponent * power))
            .filter(|u| u.exponent != 0.0)
            .collect();

        Self { units }
    }

    /// Multiply two values carrying units.
    ///
    /// Entries of the same family are merged into the first operand's unit,
    /// rescaling the value along the way. Returns the product value and unit.
    pub fn product(value_a: f64, a: &Self, value_b: f64, b: &Self) -> (f64, Self) {
        let a = a.by_family();
        let b = b.by_family();

        let mut value = value_a * value_b;
        let mut units: Vec<UnitExponent> = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);

        while i < a.len() || j < b.len() {
            if i == a.len() {
                units.push(b[j].clone());
                j += 1;
                continue;
            }
            if j == b.len() {
                units.push(a[i].clone());
                i += 1;
                continue;
            }

            match a[i].unit.family.cmp(&b[j].unit.family) {
                Ordering::Equal => {
                    value = convert_fundamental(value, &b[j].unit, &a[i].unit, b[j].exponent);

                    let exponent = a[i].exponent + b[j].exponent;
                    if exponent != 0.0 {
                        units.push(UnitExponent::new(a[i].unit.clone(), exponent));
                    }
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    units.push(a[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    units.push(b[j].clone());
                    j += 1;
                }
            }
        }

        let mut product = Self { units };
        product.sort();
        (value, product)
    }

    /// Divide two values carrying units.
    pub fn division(value_a: f64, a: &Self, value_b: f64, b: &Self) -> (f64, Self) {
        Self::product(value_a, a, 1.0 / value_b, &b.powf(-1.0))
    }
}

fn canonical_order(a: &UnitExponent, b: &UnitExponent) -> Ordering {
    let a_negative = a.exponent < 0.0;
    let b_negative = b.exponent < 0.0;

    a_negative
        .cmp(&b_negative)
        .then_with(|| a.unit.symbol.cmp(&b.unit.symbol))
}

fn family_order(a: &UnitExponent, b: &UnitExponent) -> Ordering {
    a.unit
        .family
        .cmp(&b.unit.family)
        .then_with(|| a.exponent.total_cmp(&b.exponent))
}

impl fmt::Display for CompositeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted = self.clone();
        sorted.sort();

        let mut out = String::new();
        let mut in_denominator = false;

        for factor in &sorted.units {
            if factor.exponent < 0.0 && !in_denominator {
                in_denominator = true;
                if out.is_empty() {
                    out.push('1');
                }
                out.push_str(" /");
            }

            if !out.is_empty() {
                out.push(' ');
            }

            let magnitude = factor.exponent.abs();
            if magnitude == 1.0 {
                out.push_str(&factor.unit.symbol);
            } else {
                // shortest single-precision rendering, e.g. "2" or "0.5"
                out.push_str(&format!("{}^{}", factor.unit.symbol, magnitude as f32));
            }
        }

        f.write_str(&out)
    }
}
