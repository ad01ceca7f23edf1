//! Format command implementation.

use crate::units::{find_best_unit_for_sizes, pretty_bytes};
use anyhow::Result;
use clap::Args;

/// Arguments for the format command
#[derive(Args)]
pub struct FormatArgs {
    /// Byte counts to format
    #[arg(required = true)]
    pub sizes: Vec<u128>,

    /// Use powers of 1024 (KiB, MiB, ...)
    #[arg(long)]
    pub binary: bool,

    /// Decimal digits to show
    #[arg(short, long, default_value = "1")]
    pub precision: usize,

    /// Unit index to use for every value (0 = bytes, 1 = KB, ...)
    #[arg(long, conflicts_with = "shared")]
    pub fixed_unit: Option<usize>,

    /// Express all values in the unit that suits the smallest one
    #[arg(long)]
    pub shared: bool,
}

/// Render each size on its own line
pub fn render(args: &FormatArgs) -> Vec<String> {
    let metric = !args.binary;
    let fixed_unit = if args.shared {
        Some(find_best_unit_for_sizes(args.sizes.iter().copied(), metric, args.precision))
    } else {
        args.fixed_unit
    };

    args.sizes
        .iter()
        .map(|size| pretty_bytes(*size, metric, args.precision, fixed_unit))
        .collect()
}

/// Run the format command
pub fn run(args: FormatArgs) -> Result<()> {
    for line in render(&args) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(sizes: Vec<u128>) -> FormatArgs {
        FormatArgs {
            sizes,
            binary: false,
            precision: 1,
            fixed_unit: None,
            shared: false,
        }
    }

    #[test]
    fn test_render_each_value() {
        assert_eq!(render(&args(vec![1_000_000, 2_000_000_000])), ["1.0 MB", "2.0 GB"]);
    }

    #[test]
    fn test_render_shared_unit() {
        let mut a = args(vec![100_000, 2_000_000_000]);
        a.shared = true;
        assert_eq!(render(&a), ["0.1 MB", "2000.0 MB"]);
    }

    #[test]
    fn test_render_fixed_binary() {
        let mut a = args(vec![1024 * 1024]);
        a.binary = true;
        a.fixed_unit = Some(2);
        assert_eq!(render(&a), ["1.0 MiB"]);
    }
}
