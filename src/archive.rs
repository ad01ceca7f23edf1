//! Size column of the archive listing.

use crate::config::Settings;
use crate::units::{find_best_unit_for_sizes, pretty_bytes};
use serde::{Deserialize, Serialize};

/// Decimal digits shown in the size column
pub const SIZE_DECIMAL_DIGITS: usize = 1;

/// One row of the archive table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRow {
    pub name: String,
    pub time: String,
    pub size: u64,
}

/// Format the size of every archive.
///
/// With `fixed_units` enabled all rows share the unit that suits the
/// smallest archive, otherwise each row picks its own.
pub fn size_column(archives: &[ArchiveRow], settings: &Settings) -> Vec<String> {
    let metric = settings.metric_units;
    let fixed_unit = settings.fixed_units.then(|| {
        find_best_unit_for_sizes(
            archives.iter().map(|a| a.size),
            metric,
            SIZE_DECIMAL_DIGITS,
        )
    });

    archives
        .iter()
        .map(|archive| pretty_bytes(archive.size, metric, SIZE_DECIMAL_DIGITS, fixed_unit))
        .collect()
}
