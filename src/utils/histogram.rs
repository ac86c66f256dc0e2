//! Histogram used as the basis for the depth statistics of the alignment QC.
//!
//! # Overview
//!
//! Per-base depth files list one line per reference position, which for a
//! bacterial genome means millions of lines. Rather than holding every depth
//! in memory, we count how many positions were observed at each depth. The
//! histogram follows these rules:
//!
//! 1. Only discrete, non-negative values are considered as bins. In other
//!    words, bins represent values in the range of `[0, 1, 2, 3, ..., n]`.
//! 2. The histogram grows as needed: incrementing a bin past the current end
//!    extends the range up to that bin.
//!
//! # Usage
//!
//! ```
//! use prpr::utils::histogram::Histogram;
//! let mut hist = Histogram::default();
//!
//! // Increments the zero bin by one.
//! hist.increment(0);
//!
//! // Increments the one bin by fourty-two.
//! hist.increment_by(1, 42);
//!
//! assert_eq!(hist.get(0), 1);
//! assert_eq!(hist.get(1), 42);
//! assert_eq!(hist.get(1000), 0);
//! ```
//!
//! Statistics are computed over the observations, not over the bins:
//!
//! - The mean of the distribution ([`mean`][Histogram::mean]).
//! - An arbitrary percentile of the distribution ([`percentile`][Histogram::percentile]),
//!   interpolated linearly between the two closest observations.
//! - The quartiles ([`first_quartile`][Histogram::first_quartile],
//!   [`median`][Histogram::median], [`third_quartile`][Histogram::third_quartile])
//!   and the [`interquartile_range`][Histogram::interquartile_range].
//! - The number of observations at or above a value
//!   ([`count_from_top_until`][Histogram::count_from_top_until]).
//!
//! ```
//! use prpr::utils::histogram::Histogram;
//! let mut hist = Histogram::default();
//!
//! hist.increment_by(10, 2);
//! hist.increment_by(20, 2);
//!
//! assert_eq!(hist.mean(), Some(15.0));
//! assert_eq!(hist.median(), Some(15.0));
//! assert_eq!(hist.count_from_top_until(20), 2);
//! ```

use anyhow::bail;

/// Histogram used as the basis for the depth statistics. For more in depth
/// information, please see the [module-level documentation].
///
/// [module-level documentation]: self
#[derive(Clone, Debug, Default)]
pub struct Histogram {
    // Vec-backed value store for the histogram, indexed by bin.
    values: Vec<u64>,
}

impl Histogram {
    //=================================//
    // Getting and incrementing values //
    //=================================//

    /// Increments a particular bin in the histogram by one.
    pub fn increment(&mut self, bin: usize) {
        self.increment_by(bin, 1)
    }

    /// Increments a particular bin in the histogram by the specified value,
    /// growing the histogram if needed.
    pub fn increment_by(&mut self, bin: usize, value: u64) {
        if bin >= self.values.len() {
            self.values.resize(bin + 1, 0);
        }

        self.values[bin] += value;
    }

    /// Gets a value for a bin within a histogram. Bins past the end are empty.
    pub fn get(&self, bin: usize) -> u64 {
        self.values.get(bin).copied().unwrap_or(0)
    }

    /// Simply returns the values in the distribution by ref.
    pub fn values(&self) -> &[u64] {
        self.values.as_ref()
    }

    //========================//
    // Numerical computations //
    //========================//

    /// Computes the number of observations within the distribution.
    pub fn sum(&self) -> u64 {
        self.values.iter().sum()
    }

    /// Computes the mean of all observations within the histogram.
    pub fn mean(&self) -> Option<f64> {
        let total = self.sum();
        if total == 0 {
            return None;
        }

        let weighted: f64 = self
            .values
            .iter()
            .enumerate()
            .map(|(bin, count)| bin as f64 * *count as f64)
            .sum();

        Some(weighted / total as f64)
    }

    /// The bin holding the observation at `rank` (zero-based) in sorted order.
    fn bin_at_rank(&self, rank: u64) -> Option<usize> {
        let mut collected = 0u64;

        for (bin, count) in self.values.iter().enumerate() {
            collected += count;
            if collected > rank {
                return Some(bin);
            }
        }

        None
    }

    /// Computes the value of the nth percentile, interpolating linearly
    /// between the two observations that surround it.
    pub fn percentile(&self, percentile: f64) -> anyhow::Result<Option<f64>> {
        // (1) Bounds check on the input data
        if !(0.0..=1.0).contains(&percentile) {
            bail!("Provided percentile was not within a valid range.");
        }

        // (2) If the number of items is zero, then there is no percentile.
        let num_items = self.sum();
        if num_items == 0 {
            return Ok(None);
        }

        // (3) Find the fractional rank of the percentile and the observations
        // on either side of it.
        let position = percentile * (num_items - 1) as f64;
        let lower_rank = position.floor();
        let upper_rank = position.ceil();

        let (lower, upper) = match (
            self.bin_at_rank(lower_rank as u64),
            self.bin_at_rank(upper_rank as u64),
        ) {
            (Some(lower), Some(upper)) => (lower as f64, upper as f64),
            _ => bail!("Unknown error!"),
        };

        Ok(Some(lower + (position - lower_rank) * (upper - lower)))
    }

    /// Computes the first quartile of the distribution.
    pub fn first_quartile(&self) -> Option<f64> {
        self.percentile(0.25).unwrap()
    }

    /// Computes the median of the distribution.
    pub fn median(&self) -> Option<f64> {
        self.percentile(0.5).unwrap()
    }

    /// Computes the third quartile of the distribution.
    pub fn third_quartile(&self) -> Option<f64> {
        self.percentile(0.75).unwrap()
    }

    /// Computes the interquartile range for this distribution.
    pub fn interquartile_range(&self) -> Option<f64> {
        match (self.first_quartile(), self.third_quartile()) {
            (Some(first), Some(third)) => Some(third - first),
            _ => None,
        }
    }

    /// Counts the observations in the specified bin and every bin above it.
    pub fn count_from_top_until(&self, bin: usize) -> u64 {
        self.values.iter().skip(bin).sum()
    }
}
