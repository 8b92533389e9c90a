//! Probability map (C5): a sparse sid -> dense (L, G) array, with the
//! independent/mutex combination algebra from §3.
//!
//! The regime (product vs. weighted-sum) is fixed the first time a sid is
//! inserted and checked on every later combine, rather than toggled by
//! mutating operators in place.

use std::collections::BTreeMap;

use crate::rupdata::RupData;

/// Which combination algebra a sid's array is using. Set at first insert,
/// immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Running product of non-exceedance probabilities; identity = 1.
    Independent,
    /// Running sum of weighted exceedance probabilities; identity = 0.
    Mutex,
}

#[derive(Debug, Clone)]
pub struct PoeArray {
    pub regime: Regime,
    /// Row-major (L, G): `array[l * g_count + g]`.
    pub array: Vec<f64>,
}

/// Diagnostics attached to a pmap produced by
/// [`crate::contextmaker::ContextMaker::get_pmap`].
#[derive(Debug, Clone, Default)]
pub struct PmapStats {
    pub nrups: usize,
    pub nsites: usize,
    pub maxdist: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ProbabilityMap {
    pub l: usize,
    pub g: usize,
    entries: BTreeMap<u32, PoeArray>,
    pub stats: PmapStats,
    /// Per-rupture diagnostic rows, populated by
    /// [`crate::contextmaker::ContextMaker::get_pmap`] only when `fewsites`
    /// holds.
    pub data: RupData,
}

impl ProbabilityMap {
    pub fn new(l: usize, g: usize) -> Self {
        Self { l, g, entries: BTreeMap::new(), stats: PmapStats::default(), data: RupData::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, sid: u32) -> Option<&PoeArray> {
        self.entries.get(&sid)
    }

    pub fn sids(&self) -> impl Iterator<Item = &u32> {
        self.entries.keys()
    }

    /// Returns the entry for `sid`, creating it with the regime identity
    /// array if absent. Panics (via `debug_assert!` in debug builds, and a
    /// hard check always) if `sid` already exists under a different
    /// regime — that would silently corrupt the running product/sum.
    pub fn entry(&mut self, sid: u32, regime: Regime) -> &mut PoeArray {
        let l = self.l;
        let g = self.g;
        let slot = self.entries.entry(sid).or_insert_with(|| {
            let identity = match regime {
                Regime::Independent => 1.0,
                Regime::Mutex => 0.0,
            };
            PoeArray { regime, array: vec![identity; l * g] }
        });
        assert_eq!(
            slot.regime, regime,
            "sid {sid} was first inserted under {:?}, cannot combine under {regime:?}",
            slot.regime
        );
        slot
    }

    /// Independent-union: per-sid `a <- 1 - (1-a)(1-b)`.
    pub fn union_indep(&mut self, other: &ProbabilityMap) {
        for (&sid, other_arr) in &other.entries {
            let slot = self.entry(sid, Regime::Independent);
            for (a, &b) in slot.array.iter_mut().zip(&other_arr.array) {
                *a = 1.0 - (1.0 - *a) * (1.0 - b);
            }
        }
    }

    /// Mutex-sum: per-sid `a <- a + b`.
    pub fn add_mutex(&mut self, other: &ProbabilityMap) {
        for (&sid, other_arr) in &other.entries {
            let slot = self.entry(sid, Regime::Mutex);
            for (a, &b) in slot.array.iter_mut().zip(&other_arr.array) {
                *a += b;
            }
        }
    }

    /// Mutex-weight: scale every array by a scalar.
    pub fn scale(&mut self, weight: f64) {
        for arr in self.entries.values_mut() {
            for v in arr.array.iter_mut() {
                *v *= weight;
            }
        }
    }

    /// Complement: `a <- 1 - a`, converting non-exceedance storage to
    /// exceedance storage (and vice-versa).
    pub fn complement(&self) -> ProbabilityMap {
        let mut out = self.clone();
        for arr in out.entries.values_mut() {
            for v in arr.array.iter_mut() {
                *v = 1.0 - *v;
            }
        }
        out
    }

    pub fn all_in_unit_interval(&self) -> bool {
        self.entries
            .values()
            .all(|arr| arr.array.iter().all(|&v| (-1e-9..=1.0 + 1e-9).contains(&v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_sid_map(l: usize, g: usize, sid: u32, regime: Regime, value: f64) -> ProbabilityMap {
        let mut pm = ProbabilityMap::new(l, g);
        let slot = pm.entry(sid, regime);
        slot.array = vec![value; l * g];
        pm
    }

    #[test]
    fn complement_is_involutive() {
        let pm = single_sid_map(1, 1, 0, Regime::Independent, 0.3);
        let twice = pm.complement().complement();
        assert!((twice.get(0).unwrap().array[0] - 0.3).abs() < 1e-15);
    }

    #[test]
    fn independent_union_matches_worked_scenario() {
        // two independent ruptures with pne 0.9 and 0.8 -> product 0.72
        let mut pm = ProbabilityMap::new(1, 1);
        {
            let slot = pm.entry(0, Regime::Independent);
            slot.array[0] *= 0.9;
            slot.array[0] *= 0.8;
        }
        assert!((pm.get(0).unwrap().array[0] - 0.72).abs() < 1e-12);
        // after complement, exceedance = 1 - 0.9*0.8 = 0.28
        let comp = pm.complement();
        assert!((comp.get(0).unwrap().array[0] - 0.28).abs() < 1e-12);
    }

    #[test]
    fn mutex_sum_matches_worked_scenario() {
        // weights 0.3/0.7, exceedance 0.2/0.4 -> 0.3*0.2 + 0.7*0.4 = 0.34
        let mut pm = ProbabilityMap::new(1, 1);
        {
            let slot = pm.entry(0, Regime::Mutex);
            slot.array[0] += 0.3 * 0.2;
            slot.array[0] += 0.7 * 0.4;
        }
        assert!((pm.get(0).unwrap().array[0] - 0.34).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "cannot combine under")]
    fn mismatched_regime_panics() {
        let mut pm = ProbabilityMap::new(1, 1);
        pm.entry(0, Regime::Independent);
        pm.entry(0, Regime::Mutex);
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut pm = ProbabilityMap::new(2, 1);
        pm.entry(5, Regime::Independent);
        pm.entry(7, Regime::Mutex);
        assert!(pm.all_in_unit_interval());
    }
}
