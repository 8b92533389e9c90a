//! Context objects (C2): flat per-rupture predictor records consumed by
//! GSIMs, populated on demand from the union of their requirements.
//!
//! The original injects these as dynamic attributes on a bare object. Here
//! the distance slice of that context is the only part materialised as a
//! standalone record (`DistancesContext`, since distances are computed
//! fresh per rupture and cached); site and rupture parameters are read
//! directly off the `SiteCollection`/`Rupture` the GSIM is already handed,
//! which already carry every field a GSIM batch can require.
use std::collections::HashMap;

use crate::distances::DistanceMetric;

/// Per-distance-metric arrays aligned with sids. One array per metric
/// actually required by the GSIM batch; never mutated in place once
/// built.
#[derive(Debug, Clone, Default)]
pub struct DistancesContext {
    distances: HashMap<DistanceMetric, Vec<f64>>,
}

impl DistancesContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: DistanceMetric, values: Vec<f64>) -> Self {
        self.distances.insert(metric, values);
        self
    }

    pub fn set(&mut self, metric: DistanceMetric, values: Vec<f64>) {
        self.distances.insert(metric, values);
    }

    pub fn get(&self, metric: DistanceMetric) -> Option<&[f64]> {
        self.distances.get(&metric).map(Vec::as_slice)
    }

    pub fn metrics(&self) -> impl Iterator<Item = &DistanceMetric> {
        self.distances.keys()
    }

    /// If `minimum_distance` is nonzero, returns a copy with distances
    /// below it clamped up to it. Otherwise returns an unchanged clone
    /// (matching the original's "return self" fast path, but an owned
    /// clone rather than aliasing, since Rust has no shared-mutable
    /// default here).
    pub fn roundup(&self, minimum_distance: f64) -> DistancesContext {
        if minimum_distance == 0.0 {
            return self.clone();
        }
        let mut out = DistancesContext::new();
        for (metric, values) in &self.distances {
            let clamped: Vec<f64> = values.iter().map(|&v| v.max(minimum_distance)).collect();
            out.distances.insert(*metric, clamped);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundup_zero_minimum_returns_unchanged_copy() {
        let ctx = DistancesContext::new().with(DistanceMetric::Rjb, vec![0.5, 5.0]);
        let out = ctx.roundup(0.0);
        assert_eq!(out.get(DistanceMetric::Rjb).unwrap(), &[0.5, 5.0]);
    }

    #[test]
    fn roundup_clamps_small_distances() {
        let ctx = DistancesContext::new().with(DistanceMetric::Rjb, vec![0.5, 5.0]);
        let out = ctx.roundup(2.0);
        assert_eq!(out.get(DistanceMetric::Rjb).unwrap(), &[2.0, 5.0]);
        // original untouched
        assert_eq!(ctx.get(DistanceMetric::Rjb).unwrap(), &[0.5, 5.0]);
    }
}
