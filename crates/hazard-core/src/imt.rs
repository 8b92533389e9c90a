//! Intensity measure types and levels.

use std::collections::BTreeMap;
use std::ops::Range;

/// An intensity measure type, e.g. `PGA` or `SA(0.2)`. Kept as an opaque
/// string key (hashlib-style "Imt" objects are a GSIM-bank concern out of
/// scope here) ordered by first insertion into an [`ImtlSet`].
pub type Imt = String;

/// Ordered mapping from IMT to its intensity measure levels, with the
/// concatenated flattening pre-addressable as a single `array` of length
/// `L`, and log-levels precomputed once at construction (an IML of exactly
/// zero yields `-inf`, which downstream GSIM evaluators treat as "always
/// exceeded" rather than a special case).
#[derive(Debug, Clone, Default)]
pub struct ImtlSet {
    order: Vec<Imt>,
    levels: BTreeMap<Imt, Vec<f64>>,
    loglevels: BTreeMap<Imt, Vec<f64>>,
    ranges: BTreeMap<Imt, Range<usize>>,
    total_len: usize,
}

impl ImtlSet {
    pub fn new(entries: Vec<(Imt, Vec<f64>)>) -> Self {
        let mut order = Vec::with_capacity(entries.len());
        let mut levels = BTreeMap::new();
        let mut loglevels = BTreeMap::new();
        let mut ranges = BTreeMap::new();
        let mut offset = 0usize;
        for (imt, imls) in entries {
            let log: Vec<f64> = imls.iter().map(|&v| v.ln()).collect();
            let len = imls.len();
            ranges.insert(imt.clone(), offset..offset + len);
            offset += len;
            order.push(imt.clone());
            levels.insert(imt.clone(), imls);
            loglevels.insert(imt, log);
        }
        Self { order, levels, loglevels, ranges, total_len: offset }
    }

    pub fn imts(&self) -> &[Imt] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.total_len
    }

    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    pub fn levels(&self, imt: &str) -> &[f64] {
        &self.levels[imt]
    }

    pub fn loglevels(&self, imt: &str) -> &[f64] {
        &self.loglevels[imt]
    }

    /// The slice of the flattened `array` (length `L`) occupied by `imt`.
    pub fn range_for(&self, imt: &str) -> Range<usize> {
        self.ranges[imt].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous_and_ordered() {
        let set = ImtlSet::new(vec![
            ("PGA".to_string(), vec![0.01, 0.1, 1.0]),
            ("SA(0.2)".to_string(), vec![0.05, 0.5]),
        ]);
        assert_eq!(set.len(), 5);
        assert_eq!(set.range_for("PGA"), 0..3);
        assert_eq!(set.range_for("SA(0.2)"), 3..5);
    }

    #[test]
    fn loglevels_zero_iml_is_neg_infinity_not_a_panic() {
        let set = ImtlSet::new(vec![("PGA".to_string(), vec![0.0, 1.0])]);
        assert!(set.loglevels("PGA")[0].is_infinite());
        assert_eq!(set.loglevels("PGA")[1], 0.0);
    }
}
