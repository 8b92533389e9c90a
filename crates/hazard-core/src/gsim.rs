//! Ground-shaking intensity model bank (C7, ambient). GSIMs themselves are
//! a black-box capability per the Non-goals; this module defines the
//! trait seam and ships one reference implementation (a truncated
//! lognormal evaluator) used by the harness and the worked scenarios.

use std::sync::Arc;

use crate::context::DistancesContext;
use crate::distances::DistanceMetric;
use crate::imt::ImtlSet;
use crate::mesh::SiteCollection;
use crate::source::Rupture;

/// A ground-shaking intensity model: declares what it needs and, given a
/// single rupture's surviving sites and distances, predicts the mean and
/// standard deviation of `ln(IML)` per site for one IMT.
pub trait Gsim: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn requires_distances(&self) -> &[DistanceMetric];
    fn requires_sites_parameters(&self) -> &[String];
    fn requires_rupture_parameters(&self) -> &[String];

    /// Per-IMT logic-tree weight; `Some(0.0)` masks this GSIM/IMT column
    /// out of the result in [`crate::contextmaker::ContextMaker::get_pmap`].
    /// `None` means "no weight configured", which is never treated as
    /// zero.
    fn weight(&self, _imt: &str) -> Option<f64> {
        None
    }

    /// Mean and standard deviation of `ln(IML)` for `imt`, one pair per
    /// surviving site in `sites`, given `rupture` and its distances.
    fn mean_and_stddev(
        &self,
        rupture: &Rupture,
        sites: &SiteCollection,
        distances: &DistancesContext,
        imt: &str,
    ) -> (Vec<f64>, Vec<f64>);
}

/// One rupture's contribution to a `get_pmap` batch: its surviving sites
/// and the distances computed for them.
pub struct RuptureBatchItem<'a> {
    pub rupture: &'a Rupture,
    pub sites: &'a SiteCollection,
    pub distances: &'a DistancesContext,
}

/// Mean/stddev tensor, conceptually `(2, N, L, G)`; stored as two flat
/// row-major `(N, L, G)` arrays to avoid an intermediate 4-D allocation.
pub struct MeanStd {
    pub n: usize,
    pub l: usize,
    pub g: usize,
    pub mean: Vec<f64>,
    pub stddev: Vec<f64>,
}

impl MeanStd {
    fn index(&self, row: usize, l: usize, g: usize) -> usize {
        (row * self.l + l) * self.g + g
    }
}

/// Evaluate every GSIM over every rupture's batch, producing the `(N, L,
/// G)` mean/stddev tensor `N` is the sum of surviving-site counts across
/// all ruptures in the batch.
pub fn get_mean_std(batch: &[RuptureBatchItem], imtls: &ImtlSet, gsims: &[Arc<dyn Gsim>]) -> MeanStd {
    let n: usize = batch.iter().map(|item| item.sites.len()).sum();
    let l = imtls.len();
    let g = gsims.len();
    let mut ms = MeanStd { n, l, g, mean: vec![0.0; n * l * g], stddev: vec![1.0; n * l * g] };

    let mut row_offset = 0usize;
    for item in batch {
        let rows = item.sites.len();
        for (gi, gsim) in gsims.iter().enumerate() {
            for imt in imtls.imts() {
                let (mean, stddev) = gsim.mean_and_stddev(item.rupture, item.sites, item.distances, imt);
                debug_assert_eq!(mean.len(), rows);
                let range = imtls.range_for(imt);
                for (local_row, (&m, &s)) in mean.iter().zip(&stddev).enumerate() {
                    for li in range.clone() {
                        let idx = ms.index(row_offset + local_row, li, gi);
                        ms.mean[idx] = m;
                        ms.stddev[idx] = s;
                    }
                }
            }
        }
        row_offset += rows;
    }
    ms
}

/// Standard normal CDF via the Abramowitz & Stegun erf approximation
/// (max error ~1.5e-7), avoiding a dependency on a stats crate for a
/// single well-known function.
fn std_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Convert a mean/stddev tensor into exceedance probabilities against the
/// precomputed `loglevels`, using each GSIM's (optionally truncated)
/// lognormal distribution: `poe = P(ln(IML) > ln(level))`, i.e. the upper
/// tail of a normal distribution with the given mean/stddev, clipped to
/// `truncation_level` standard deviations when one is configured.
pub fn get_poes(mean_std: &MeanStd, imtls: &ImtlSet, truncation_level: Option<f64>, gsims: &[Arc<dyn Gsim>]) -> Vec<f64> {
    let MeanStd { n, l, g, mean, stddev } = mean_std;
    let mut poes = vec![0.0; n * l * g];
    for row in 0..*n {
        for imt in imtls.imts() {
            for li in imtls.range_for(imt) {
                let loglevel = imtls.loglevels(imt)[li - imtls.range_for(imt).start];
                for gi in 0..*g {
                    let idx = (row * l + li) * g + gi;
                    let m = mean[idx];
                    let s = stddev[idx];
                    let z = if s > 0.0 { (loglevel - m) / s } else if loglevel > m { f64::INFINITY } else { f64::NEG_INFINITY };
                    let poe = match truncation_level {
                        Some(t) if z >= t => 0.0,
                        Some(t) if z <= -t => 1.0,
                        _ => 1.0 - std_normal_cdf(z),
                    };
                    poes[idx] = poe.clamp(0.0, 1.0);
                }
            }
        }
    }
    apply_zero_weight_mask(&mut poes, *n, *l, *g, imtls, gsims);
    poes
}

/// Zero-weight GSIM masking (§4.3e): for every (GSIM, IMT) with
/// `weight(imt) == Some(0.0)`, force that column to zero across every row.
fn apply_zero_weight_mask(poes: &mut [f64], n: usize, l: usize, g: usize, imtls: &ImtlSet, gsims: &[Arc<dyn Gsim>]) {
    for (gi, gsim) in gsims.iter().enumerate() {
        for imt in imtls.imts() {
            if gsim.weight(imt) == Some(0.0) {
                for li in imtls.range_for(imt) {
                    for row in 0..n {
                        poes[(row * l + li) * g + gi] = 0.0;
                    }
                }
            }
        }
    }
}

/// A reference truncated-lognormal GSIM used by the harness and tests: a
/// constant mean/stddev in log space regardless of distance, useful for
/// exercising the pipeline without pulling in a real attenuation model.
#[derive(Debug, Clone)]
pub struct ConstantGsim {
    pub label: String,
    pub ln_mean: f64,
    pub ln_stddev: f64,
    pub distances: Vec<DistanceMetric>,
    pub site_params: Vec<String>,
    pub rupture_params: Vec<String>,
    pub weights: std::collections::HashMap<String, f64>,
}

impl ConstantGsim {
    pub fn new(label: &str, ln_mean: f64, ln_stddev: f64) -> Self {
        Self {
            label: label.to_string(),
            ln_mean,
            ln_stddev,
            distances: vec![DistanceMetric::Rrup],
            site_params: Vec::new(),
            rupture_params: vec!["mag".to_string()],
            weights: std::collections::HashMap::new(),
        }
    }

    pub fn with_weight(mut self, imt: &str, weight: f64) -> Self {
        self.weights.insert(imt.to_string(), weight);
        self
    }
}

impl Gsim for ConstantGsim {
    fn name(&self) -> &str {
        &self.label
    }

    fn requires_distances(&self) -> &[DistanceMetric] {
        &self.distances
    }

    fn requires_sites_parameters(&self) -> &[String] {
        &self.site_params
    }

    fn requires_rupture_parameters(&self) -> &[String] {
        &self.rupture_params
    }

    fn weight(&self, imt: &str) -> Option<f64> {
        self.weights.get(imt).copied()
    }

    fn mean_and_stddev(
        &self,
        _rupture: &Rupture,
        sites: &SiteCollection,
        _distances: &DistancesContext,
        _imt: &str,
    ) -> (Vec<f64>, Vec<f64>) {
        (vec![self.ln_mean; sites.len()], vec![self.ln_stddev; sites.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Site;
    use crate::occurrence::Occurrence;
    use crate::source::RuptureSurface;
    use std::sync::Arc;

    #[derive(Debug)]
    struct StubSurface;
    impl RuptureSurface for StubSurface {
        fn min_distance(&self, mesh: &SiteCollection) -> Vec<f64> { vec![10.0; mesh.len()] }
        fn joyner_boore(&self, mesh: &SiteCollection) -> Vec<f64> { vec![10.0; mesh.len()] }
        fn rx(&self, mesh: &SiteCollection) -> Vec<f64> { vec![0.0; mesh.len()] }
        fn ry0(&self, mesh: &SiteCollection) -> Vec<f64> { vec![0.0; mesh.len()] }
        fn strike(&self) -> f64 { 0.0 }
        fn dip(&self) -> f64 { 90.0 }
        fn top_edge_depth(&self) -> f64 { 0.0 }
        fn width(&self) -> f64 { 10.0 }
        fn azimuth(&self, mesh: &SiteCollection) -> Vec<f64> { vec![0.0; mesh.len()] }
        fn azimuth_of_closest_point(&self, mesh: &SiteCollection) -> Vec<f64> { vec![0.0; mesh.len()] }
        fn closest_points(&self, mesh: &SiteCollection) -> (Vec<f64>, Vec<f64>) {
            (vec![0.0; mesh.len()], vec![0.0; mesh.len()])
        }
    }

    fn rupture() -> Rupture {
        Rupture {
            rup_id: 1,
            mag: 6.0,
            rake: 0.0,
            hypo_lon: 0.0,
            hypo_lat: 0.0,
            hypo_depth: 10.0,
            surface: Arc::new(StubSurface),
            occurrence: Occurrence::Parametric { rate: 0.01 },
            weight: None,
            tectonic_region_type: "Active Shallow Crust".to_string(),
            cdpp: 0.0,
        }
    }

    #[test]
    fn median_gsim_gives_poe_one_half_at_median_level() {
        let sites = SiteCollection::new(vec![Site::new(0, 0.0, 0.0)]);
        let dctx = DistancesContext::new();
        let imtls = ImtlSet::new(vec![("PGA".to_string(), vec![1.0])]); // ln(1.0) == 0
        let gsims: Vec<Arc<dyn Gsim>> = vec![Arc::new(ConstantGsim::new("Toy", 0.0, 1.0))];
        let rup = rupture();
        let batch = [RuptureBatchItem { rupture: &rup, sites: &sites, distances: &dctx }];
        let ms = get_mean_std(&batch, &imtls, &gsims);
        let poes = get_poes(&ms, &imtls, None, &gsims);
        assert!((poes[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_weight_masks_entire_column() {
        let sites = SiteCollection::new(vec![Site::new(0, 0.0, 0.0), Site::new(1, 1.0, 0.0)]);
        let dctx = DistancesContext::new();
        let imtls = ImtlSet::new(vec![("PGA".to_string(), vec![0.1, 1.0])]);
        let gsims: Vec<Arc<dyn Gsim>> =
            vec![Arc::new(ConstantGsim::new("Toy", 0.0, 1.0).with_weight("PGA", 0.0))];
        let rup = rupture();
        let batch = [RuptureBatchItem { rupture: &rup, sites: &sites, distances: &dctx }];
        let ms = get_mean_std(&batch, &imtls, &gsims);
        let poes = get_poes(&ms, &imtls, None, &gsims);
        assert!(poes.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn truncation_clips_tail_probabilities() {
        let sites = SiteCollection::new(vec![Site::new(0, 0.0, 0.0)]);
        let dctx = DistancesContext::new();
        // loglevel far below mean -> z very negative -> poe should clip to 1 at truncation.
        let imtls = ImtlSet::new(vec![("PGA".to_string(), vec![(-100.0_f64).exp()])]);
        let gsims: Vec<Arc<dyn Gsim>> = vec![Arc::new(ConstantGsim::new("Toy", 0.0, 1.0))];
        let rup = rupture();
        let batch = [RuptureBatchItem { rupture: &rup, sites: &sites, distances: &dctx }];
        let ms = get_mean_std(&batch, &imtls, &gsims);
        let poes = get_poes(&ms, &imtls, Some(3.0), &gsims);
        assert_eq!(poes[0], 1.0);
    }
}
