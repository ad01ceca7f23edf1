//! Human-readable byte sizes.
//!
//! Two scales are supported: metric (powers of 1000, `KB`, `MB`, ...) and
//! binary (powers of 1024, `KiB`, `MiB`, ...). A unit is addressed by its
//! index into the scale, `0` being plain bytes.
//!
//! Listings pick one unit for a whole column with [`find_best_unit_for_sizes`]
//! and then format every value with that fixed unit through [`pretty_bytes`],
//! so the numbers line up.

use serde::{Deserialize, Serialize};

const METRIC_LABELS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BINARY_LABELS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Index of the largest unit in either scale (`YB` / `YiB`).
pub const MAX_UNIT: usize = METRIC_LABELS.len() - 1;

/// Unit scale used when selecting and labelling units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitScale {
    /// Base 1000
    Metric,
    /// Base 1024
    Binary,
}

impl UnitScale {
    pub fn from_metric(metric: bool) -> Self {
        if metric {
            UnitScale::Metric
        } else {
            UnitScale::Binary
        }
    }

    pub fn base(self) -> u128 {
        match self {
            UnitScale::Metric => 1000,
            UnitScale::Binary => 1024,
        }
    }

    fn labels(self) -> &'static [&'static str; 9] {
        match self {
            UnitScale::Metric => &METRIC_LABELS,
            UnitScale::Binary => &BINARY_LABELS,
        }
    }

    /// Resolve a unit index, clamping it to the largest defined unit
    pub fn unit(self, index: usize) -> SizeUnit {
        let index = index.min(MAX_UNIT);
        SizeUnit {
            index,
            label: self.labels()[index],
            multiplier: self.base().pow(index as u32),
        }
    }
}

/// A single entry of a [`UnitScale`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeUnit {
    pub index: usize,
    pub label: &'static str,
    pub multiplier: u128,
}

/// Pick the coarsest unit in which the smallest of `sizes` still shows a
/// non-zero value with `precision` decimals.
///
/// Returns `0` (bytes) for an empty collection.
pub fn find_best_unit_for_sizes<I>(sizes: I, metric: bool, precision: usize) -> usize
where
    I: IntoIterator,
    I::Item: Into<u128>,
{
    match sizes.into_iter().map(Into::into).min() {
        Some(min) => find_best_unit_for_size(min, metric, precision),
        None => 0,
    }
}

/// Single-value form of [`find_best_unit_for_sizes`].
///
/// The result is the largest `n` with `size * 10^precision >= base^n`,
/// clamped to [`MAX_UNIT`].
pub fn find_best_unit_for_size(size: impl Into<u128>, metric: bool, precision: usize) -> usize {
    let size = size.into();
    if size == 0 {
        return 0;
    }

    let base = UnitScale::from_metric(metric).base();
    let scaled = u32::try_from(precision)
        .ok()
        .and_then(|p| 10u128.checked_pow(p))
        .and_then(|factor| size.checked_mul(factor))
        .unwrap_or(u128::MAX);

    let mut unit = 0;
    let mut threshold = base;
    while unit < MAX_UNIT && scaled >= threshold {
        unit += 1;
        threshold = match threshold.checked_mul(base) {
            Some(next) => next,
            None => break,
        };
    }
    unit
}

/// Format `size` bytes as `"<value> <unit>"`.
///
/// With `fixed_unit` set the value is expressed in that unit, otherwise the
/// unit is chosen by [`find_best_unit_for_size`]. Values beyond the largest
/// unit stay in `YB`/`YiB` with a large number.
pub fn pretty_bytes(
    size: impl Into<u128>,
    metric: bool,
    precision: usize,
    fixed_unit: Option<usize>,
) -> String {
    let size = size.into();
    let unit = fixed_unit.unwrap_or_else(|| find_best_unit_for_size(size, metric, precision));
    let unit = UnitScale::from_metric(metric).unit(unit);
    format!("{} {}", format_scaled(size, unit.multiplier, precision), unit.label)
}

/// Like [`pretty_bytes`] for a signed difference, e.g. growth between two
/// archives. Positive deltas carry a leading `+`.
pub fn pretty_bytes_signed(
    delta: i128,
    metric: bool,
    precision: usize,
    fixed_unit: Option<usize>,
) -> String {
    let formatted = pretty_bytes(delta.unsigned_abs(), metric, precision, fixed_unit);
    match delta.signum() {
        1 => format!("+{formatted}"),
        -1 => format!("-{formatted}"),
        _ => formatted,
    }
}

fn format_scaled(size: u128, multiplier: u128, precision: usize) -> String {
    let factor = u32::try_from(precision).ok().and_then(|p| 10u128.checked_pow(p));
    let scaled = factor.and_then(|factor| size.checked_mul(factor));
    let Some(scaled) = scaled else {
        let value = size as f64 / multiplier as f64;
        return format!("{value:.precision$}");
    };

    // Round half away from zero on the exact integer quotient.
    let mut digits = scaled / multiplier;
    if (scaled % multiplier) * 2 >= multiplier {
        digits += 1;
    }

    if precision == 0 {
        return digits.to_string();
    }
    let digits = format!("{digits:0>width$}", width = precision + 1);
    let (whole, fraction) = digits.split_at(digits.len() - precision);
    format!("{whole}.{fraction}")
}
