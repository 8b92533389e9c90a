//! ContextMaker (C4): the orchestrator that ties the distance oracle,
//! context objects, GSIM bank, occurrence model and probability combiner
//! into `get_pmap` / `get_pmap_by_grp`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::distances::DistanceMetric;
use crate::error::{ContextError, FarAwayRupture, SourceContext};
use crate::gsim::{get_mean_std, get_poes, Gsim, RuptureBatchItem};
use crate::imt::ImtlSet;
use crate::mesh::SiteCollection;
use crate::occurrence::{probability_no_exceedance, Occurrence, TemporalOccurrenceModel};
use crate::pmap::{ProbabilityMap, Regime};
use crate::rupdata::RupData;
use crate::source::{EquivalentDistances, IntegrationDistance, Rupture, Source};

const KNOWN_RUP_PARAMS: &[&str] =
    &["mag", "strike", "dip", "rake", "ztor", "hypo_lon", "hypo_lat", "hypo_depth", "width"];

/// Construction-time options for [`ContextMaker`], per §4.2/§4.9.
pub struct ContextMakerConfig {
    pub maximum_distance: Arc<dyn IntegrationDistance>,
    pub truncation_level: Option<f64>,
    /// Threshold below which `RupData` is collected and collapse disabled.
    pub max_sites_disagg: usize,
    pub collapse_factor: f64,
    pub pointsource_distance: Option<f64>,
    pub max_radius: Option<f64>,
    pub filter_distance: DistanceMetric,
    pub imtls: ImtlSet,
    pub reqv: Option<Arc<dyn EquivalentDistances>>,
    pub tom: Arc<dyn TemporalOccurrenceModel>,
}

impl ContextMakerConfig {
    /// Defaults matching the original: `max_sites_disagg = 10`,
    /// `collapse_factor = 3.0`, `pointsource_distance`/`max_radius` unset,
    /// `filter_distance = rrup`, no equivalent-distance table.
    pub fn new(
        maximum_distance: Arc<dyn IntegrationDistance>,
        imtls: ImtlSet,
        tom: Arc<dyn TemporalOccurrenceModel>,
    ) -> Self {
        Self {
            maximum_distance,
            truncation_level: None,
            max_sites_disagg: 10,
            collapse_factor: 3.0,
            pointsource_distance: None,
            max_radius: None,
            filter_distance: DistanceMetric::Rrup,
            imtls,
            reqv: None,
            tom,
        }
    }
}

/// Filters sites, builds contexts, iterates ruptures (with point-source
/// collapse) and drives the GSIM bank for one tectonic region type.
pub struct ContextMaker {
    trt: String,
    gsims: Vec<Arc<dyn Gsim>>,
    config: ContextMakerConfig,
    required_distances: Vec<DistanceMetric>,
    required_rup_params: Vec<String>,
}

impl ContextMaker {
    pub fn new(
        trt: impl Into<String>,
        gsims: Vec<Arc<dyn Gsim>>,
        config: ContextMakerConfig,
    ) -> Result<Self, ContextError> {
        let mut required_distances: Vec<DistanceMetric> = Vec::new();
        let mut required_rup_params: Vec<String> = Vec::new();
        for gsim in &gsims {
            for &d in gsim.requires_distances() {
                if !required_distances.contains(&d) {
                    required_distances.push(d);
                }
            }
            for p in gsim.requires_rupture_parameters() {
                if !required_rup_params.contains(p) {
                    required_rup_params.push(p.clone());
                }
            }
        }
        if !required_distances.contains(&config.filter_distance) {
            required_distances.push(config.filter_distance);
        }
        if config.reqv.is_some() && !required_distances.contains(&DistanceMetric::Repi) {
            required_distances.push(DistanceMetric::Repi);
        }
        for name in &required_rup_params {
            if !KNOWN_RUP_PARAMS.contains(&name.as_str()) {
                return Err(ContextError::UnknownRuptureParameter {
                    requiring: "ContextMaker",
                    param: name.clone(),
                });
            }
        }
        Ok(Self { trt: trt.into(), gsims, config, required_distances, required_rup_params })
    }

    pub fn tectonic_region_type(&self) -> &str {
        &self.trt
    }

    /// §4.2 step 1-4: filter `sites` against `rupture` by `filter_distance`,
    /// failing with [`FarAwayRupture`] if every site is beyond
    /// `maximum_distance`.
    pub fn filter(
        &self,
        sites: &SiteCollection,
        rupture: &Rupture,
        mdist: Option<f64>,
    ) -> Result<(SiteCollection, crate::context::DistancesContext), FarAwayRupture> {
        let d = crate::distances::get_distances(rupture, sites, self.config.filter_distance);
        let mdist = mdist.unwrap_or_else(|| {
            self.config.maximum_distance.get(&rupture.tectonic_region_type, rupture.mag)
        });
        let mask: Vec<bool> = d.iter().map(|&v| v <= mdist).collect();
        if !mask.iter().any(|&keep| keep) {
            let min_distance_km = d.iter().cloned().fold(f64::INFINITY, f64::min);
            return Err(FarAwayRupture { rup_id: rupture.rup_id, min_distance_km });
        }
        let filtered = sites.filter(&mask);
        let kept: Vec<f64> = d.into_iter().zip(&mask).filter_map(|(v, &keep)| keep.then_some(v)).collect();
        let dctx = crate::context::DistancesContext::new().with(self.config.filter_distance, kept);
        Ok((filtered, dctx))
    }

    /// §4.2: `filter`, then attach every other required distance, then
    /// apply the equivalent-distance substitution for planar surfaces.
    pub fn make_contexts(
        &self,
        sites: &SiteCollection,
        rupture: &Rupture,
        mdist: Option<f64>,
    ) -> Result<(SiteCollection, crate::context::DistancesContext), FarAwayRupture> {
        let (filtered, mut dctx) = self.filter(sites, rupture, mdist)?;
        for &metric in &self.required_distances {
            if metric == self.config.filter_distance {
                continue;
            }
            let values = crate::distances::get_distances(rupture, &filtered, metric);
            dctx.set(metric, values);
        }
        self.apply_equivalent_distance(rupture, &filtered, &mut dctx);
        Ok((filtered, dctx))
    }

    /// Equivalent-distance substitution (§4.2 step 3): for planar surfaces
    /// with a `reqv` table configured for this trt, replace `rjb`/`rrup`
    /// with a single representative distance derived from `repi`.
    ///
    /// `rrup` is recomputed as `sqrt(reqv^2 + hypo_depth^2)`. The original
    /// implementation combines the equivalent distance with `hypo_depth`
    /// rather than the surface's top-edge depth (`ztor`), which is the
    /// more common choice in the ground-motion literature; this follows
    /// the original literally rather than correcting it.
    fn apply_equivalent_distance(
        &self,
        rupture: &Rupture,
        filtered: &SiteCollection,
        dctx: &mut crate::context::DistancesContext,
    ) {
        let Some(reqv) = &self.config.reqv else { return };
        if !rupture.surface.is_planar() {
            return;
        }
        let repi = dctx
            .get(DistanceMetric::Repi)
            .map(|s| s.to_vec())
            .unwrap_or_else(|| crate::distances::get_distances(rupture, filtered, DistanceMetric::Repi));
        let resolved: Option<Vec<f64>> = repi
            .iter()
            .map(|&r| reqv.get(&rupture.tectonic_region_type, r, rupture.mag))
            .collect();
        let Some(reqv_vals) = resolved else { return };
        if self.required_distances.contains(&DistanceMetric::Rjb) {
            dctx.set(DistanceMetric::Rjb, reqv_vals.clone());
        }
        if self.required_distances.contains(&DistanceMetric::Rrup) {
            let rrup: Vec<f64> = reqv_vals
                .iter()
                .map(|&e| (e * e + rupture.hypo_depth * rupture.hypo_depth).sqrt())
                .collect();
            dctx.set(DistanceMetric::Rrup, rrup);
        }
    }

    /// §4.2.1: materialise exactly the subset of rupture parameters this
    /// context maker's GSIM batch requires, or fail if a GSIM asked for one
    /// outside the known vocabulary (checked again here defensively, even
    /// though [`ContextMaker::new`] already rejects it at construction).
    pub fn add_rup_params(&self, rupture: &Rupture) -> Result<HashMap<String, f64>, ContextError> {
        let mut params = HashMap::with_capacity(self.required_rup_params.len());
        for name in &self.required_rup_params {
            let value = match name.as_str() {
                "mag" => rupture.mag,
                "strike" => rupture.surface.strike(),
                "dip" => rupture.surface.dip(),
                "rake" => rupture.rake,
                "ztor" => rupture.surface.top_edge_depth(),
                "hypo_lon" => rupture.hypo_lon,
                "hypo_lat" => rupture.hypo_lat,
                "hypo_depth" => rupture.hypo_depth,
                "width" => rupture.surface.width(),
                other => {
                    return Err(ContextError::UnknownRuptureParameter {
                        requiring: "ContextMaker",
                        param: other.to_string(),
                    })
                }
            };
            params.insert(name.clone(), value);
        }
        Ok(params)
    }

    /// §4.2.1: yields `(ruptures, sites, mdist)` triples, applying the
    /// point-source collapse optimisation when the source is point-shaped
    /// and there are more sites than `max_sites_disagg`.
    pub fn gen_rups_sites(
        &self,
        source: &dyn Source,
        sites: &SiteCollection,
    ) -> Vec<(Vec<Rupture>, SiteCollection, Option<f64>)> {
        let Some(mut location) = source.location() else {
            return vec![(source.iter_ruptures(), sites.clone(), None)];
        };
        if sites.len() <= self.config.max_sites_disagg {
            return vec![(source.iter_ruptures(), sites.clone(), None)];
        }

        let mut out = Vec::new();
        for (mag, rups) in source.gen_mag_ruptures() {
            if source.count_nphc() > 1 {
                location.depth = source.hypocenter_distribution().weighted_average_depth();
            }
            let mut mdist = self.config.maximum_distance.get(source.tectonic_region_type(), mag);
            let radius = source.max_rupture_projection_radius(mag);
            if let Some(max_radius) = self.config.max_radius {
                mdist = mdist.min(max_radius * radius);
            }
            if source.count_nphc() == 1 {
                out.push((rups, sites.clone(), Some(mdist)));
                continue;
            }
            let cdist = self
                .config
                .pointsource_distance
                .unwrap_or_else(|| (self.config.collapse_factor * radius).min(mdist));
            let (close, far) = sites.split(location.lon, location.lat, cdist);
            match (close, far) {
                (None, Some(far)) => out.push((vec![Self::collapse(&rups)], far, Some(mdist))),
                (Some(close), None) => out.push((rups, close, Some(mdist))),
                (Some(close), Some(far)) => {
                    out.push((vec![Self::collapse(&rups)], far, Some(mdist)));
                    out.push((rups, close, Some(mdist)));
                }
                (None, None) => {}
            }
        }
        out
    }

    /// Collapses a magnitude-group of ruptures into a single representative
    /// carrying `rate(rups[0]) * len(rups)`. Only defined for parametric
    /// ruptures, matching the original's unconditional `rate *= len(rups)`.
    fn collapse(rups: &[Rupture]) -> Rupture {
        assert!(!rups.is_empty(), "collapse requires at least one rupture");
        let first_rate = match &rups[0].occurrence {
            Occurrence::Parametric { rate } => *rate,
            Occurrence::Nonparametric { .. } => {
                panic!("point-source collapse is only defined for parametric ruptures")
            }
        };
        let mut representative = rups[0].clone();
        representative.occurrence = Occurrence::Parametric { rate: first_rate * rups.len() as f64 };
        representative
    }

    /// §4.3: assembles a single source's contribution into a
    /// [`ProbabilityMap`]. `rup_indep=true` composes ruptures as an
    /// independent-regime running product of non-exceedance; `false`
    /// composes them as a weighted-exceedance-sum (mutex regime).
    pub fn get_pmap(
        &self,
        source: &dyn Source,
        sites: &SiteCollection,
        rup_indep: bool,
    ) -> Result<ProbabilityMap, ContextError> {
        let l = self.config.imtls.len();
        let g = self.gsims.len();
        let fewsites = sites.complete().len() <= self.config.max_sites_disagg;

        let mut pmap = ProbabilityMap::new(l, g);
        let mut rupdata = RupData::new();
        let mut mdists_seen: Vec<f64> = Vec::new();
        let mut nrups = 0usize;
        let mut nsites = 0usize;

        for (ruptures, group_sites, mdist) in self.gen_rups_sites(source, sites) {
            if let Some(m) = mdist {
                mdists_seen.push(m);
            }
            let candidate_count = ruptures.len();
            let mut survivors: Vec<(Rupture, SiteCollection, crate::context::DistancesContext)> = Vec::new();
            {
                let _ctx_span = tracing::debug_span!("ctx", source_id = source.source_id()).entered();
                for rup in ruptures {
                    if let Ok((filtered, dctx)) = self.make_contexts(&group_sites, &rup, mdist) {
                        survivors.push((rup, filtered, dctx));
                    }
                }
            }
            if survivors.is_empty() {
                continue;
            }

            let batch: Vec<RuptureBatchItem<'_>> = survivors
                .iter()
                .map(|(rup, sites, dctx)| RuptureBatchItem { rupture: rup, sites, distances: dctx })
                .collect();

            let mean_std = {
                let _gmf_span = tracing::debug_span!("gmf").entered();
                get_mean_std(&batch, &self.config.imtls, &self.gsims)
            };
            let poes = {
                let _poe_span = tracing::debug_span!("poe").entered();
                get_poes(&mean_std, &self.config.imtls, self.config.truncation_level, &self.gsims)
            };

            {
                let _pne_span = tracing::debug_span!("pne").entered();
                let mut row_offset = 0usize;
                for (rup, filtered, dctx) in &survivors {
                    let rows = filtered.len();
                    let row_poes = &poes[row_offset * l * g..(row_offset + rows) * l * g];
                    let pne = probability_no_exceedance(&rup.occurrence, row_poes, self.config.tom.as_ref());
                    for (local_row, sid) in filtered.sids().into_iter().enumerate() {
                        let pne_row = &pne[local_row * l * g..(local_row + 1) * l * g];
                        if rup_indep {
                            let slot = pmap.entry(sid, Regime::Independent);
                            for (a, &p) in slot.array.iter_mut().zip(pne_row) {
                                *a *= p;
                            }
                        } else {
                            let weight = rup.weight.unwrap_or(1.0);
                            let slot = pmap.entry(sid, Regime::Mutex);
                            for (a, &p) in slot.array.iter_mut().zip(pne_row) {
                                *a += (1.0 - p) * weight;
                            }
                        }
                    }
                    nsites += rows;
                    if fewsites {
                        let required_rup_params = self.add_rup_params(rup)?;
                        rupdata.add(rup, source.id(), filtered, dctx, &required_rup_params, &self.required_distances);
                    }
                    row_offset += rows;
                }
            }
            nrups += candidate_count;
        }

        pmap.stats.nrups = nrups;
        pmap.stats.nsites = nsites;
        pmap.stats.maxdist = if mdists_seen.is_empty() {
            None
        } else {
            Some(mdists_seen.iter().sum::<f64>() / mdists_seen.len() as f64)
        };
        pmap.data = rupdata;
        Ok(pmap)
    }

    /// §4.4: folds `get_pmap` over every `(source, sites)` pair into
    /// per-source-group probability maps, wrapping any per-source failure
    /// with [`SourceContext`]. See Open Question 1 in the design notes for
    /// the exact complement/merge interaction between `rup_mutex` and
    /// `src_mutex`.
    pub fn get_pmap_by_grp(
        &self,
        source_sites: &[(&dyn Source, SiteCollection)],
        rup_mutex: bool,
        src_mutex: bool,
    ) -> Result<HashMap<u32, ProbabilityMap>, SourceContext> {
        let l = self.config.imtls.len();
        let g = self.gsims.len();
        let mut by_group: HashMap<u32, ProbabilityMap> = HashMap::new();

        for (source, sites) in source_sites {
            let started = std::time::Instant::now();
            let mut pm = self
                .get_pmap(*source, sites, !rup_mutex)
                .map_err(|e| SourceContext::new(source.source_id().to_string(), e))?;
            let elapsed = started.elapsed();
            tracing::debug!(
                source_id = source.source_id(),
                nrups = pm.stats.nrups,
                nsites = pm.stats.nsites,
                elapsed_secs = elapsed.as_secs_f64(),
                "source processed"
            );

            if !rup_mutex {
                pm = pm.complement();
            }

            if src_mutex {
                let weight = source.mutex_weight().unwrap_or(1.0);
                pm.scale(weight);
                for &grp in source.src_group_ids() {
                    by_group.entry(grp).or_insert_with(|| ProbabilityMap::new(l, g)).add_mutex(&pm);
                }
            } else {
                for &grp in source.src_group_ids() {
                    by_group.entry(grp).or_insert_with(|| ProbabilityMap::new(l, g)).union_indep(&pm);
                }
            }
        }
        Ok(by_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsim::ConstantGsim;
    use crate::mesh::Site;
    use crate::occurrence::PoissonTom;
    use crate::source::{HypocenterDistribution, RuptureSurface, SourceLocation};

    #[derive(Debug)]
    struct StubSurface {
        planar: bool,
    }
    impl RuptureSurface for StubSurface {
        fn min_distance(&self, mesh: &SiteCollection) -> Vec<f64> {
            mesh.iter().map(|s| crate::geo::epicentral_distance_km(0.0, 0.0, s.lon, s.lat)).collect()
        }
        fn joyner_boore(&self, mesh: &SiteCollection) -> Vec<f64> {
            self.min_distance(mesh)
        }
        fn rx(&self, mesh: &SiteCollection) -> Vec<f64> {
            vec![0.0; mesh.len()]
        }
        fn ry0(&self, mesh: &SiteCollection) -> Vec<f64> {
            vec![0.0; mesh.len()]
        }
        fn strike(&self) -> f64 {
            0.0
        }
        fn dip(&self) -> f64 {
            90.0
        }
        fn top_edge_depth(&self) -> f64 {
            0.0
        }
        fn width(&self) -> f64 {
            10.0
        }
        fn azimuth(&self, mesh: &SiteCollection) -> Vec<f64> {
            vec![0.0; mesh.len()]
        }
        fn azimuth_of_closest_point(&self, mesh: &SiteCollection) -> Vec<f64> {
            vec![0.0; mesh.len()]
        }
        fn closest_points(&self, mesh: &SiteCollection) -> (Vec<f64>, Vec<f64>) {
            (vec![0.0; mesh.len()], vec![0.0; mesh.len()])
        }
        fn is_planar(&self) -> bool {
            self.planar
        }
    }

    #[derive(Debug)]
    struct ConstantMaxDist(f64);
    impl IntegrationDistance for ConstantMaxDist {
        fn get(&self, _trt: &str, _mag: f64) -> f64 {
            self.0
        }
    }

    #[derive(Debug)]
    struct SingleRuptureSource {
        rup: Rupture,
    }
    impl Source for SingleRuptureSource {
        fn id(&self) -> u32 {
            1
        }
        fn source_id(&self) -> &str {
            "src-1"
        }
        fn tectonic_region_type(&self) -> &str {
            "Active Shallow Crust"
        }
        fn src_group_ids(&self) -> &[u32] {
            &[0]
        }
        fn mutex_weight(&self) -> Option<f64> {
            None
        }
        fn location(&self) -> Option<SourceLocation> {
            None
        }
        fn count_nphc(&self) -> usize {
            1
        }
        fn hypocenter_distribution(&self) -> &HypocenterDistribution {
            static EMPTY: HypocenterDistribution = HypocenterDistribution { data: Vec::new() };
            &EMPTY
        }
        fn max_rupture_projection_radius(&self, _mag: f64) -> f64 {
            10.0
        }
        fn iter_ruptures(&self) -> Vec<Rupture> {
            vec![self.rup.clone()]
        }
    }

    fn maker(gsims: Vec<Arc<dyn Gsim>>, maxdist: f64) -> ContextMaker {
        let imtls = ImtlSet::new(vec![("PGA".to_string(), vec![1.0])]);
        let tom = Arc::new(PoissonTom::new(1.0));
        let config = ContextMakerConfig::new(Arc::new(ConstantMaxDist(maxdist)), imtls, tom);
        ContextMaker::new("Active Shallow Crust", gsims, config).unwrap()
    }

    fn rupture_at_origin(rate: f64) -> Rupture {
        Rupture {
            rup_id: 1,
            mag: 6.0,
            rake: 0.0,
            hypo_lon: 0.0,
            hypo_lat: 0.0,
            hypo_depth: 5.0,
            surface: Arc::new(StubSurface { planar: false }),
            occurrence: Occurrence::Parametric { rate },
            weight: Some(1.0),
            tectonic_region_type: "Active Shallow Crust".to_string(),
            cdpp: 0.0,
        }
    }

    #[test]
    fn worked_scenario_one_poisson_single_site() {
        let gsims: Vec<Arc<dyn Gsim>> = vec![Arc::new(ConstantGsim::new("Toy", 0.0, 1.0))];
        let cm = maker(gsims, 1000.0);
        let source = SingleRuptureSource { rup: rupture_at_origin(0.01) };
        let sites = SiteCollection::new(vec![Site::new(0, 0.0, 0.0)]);
        let pmap = cm.get_pmap(&source, &sites, true).unwrap();
        // PGA loglevel ln(1.0)=0 equals the GSIM's mean exactly -> poe=0.5.
        let poe = pmap.get(0).unwrap().array[0];
        let expected = (-0.01_f64 * 1.0 * 0.5).exp();
        assert!((poe - expected).abs() < 1e-9);
        assert!((expected - 0.995012479).abs() < 1e-9);
    }

    #[test]
    fn far_away_rupture_yields_empty_pmap() {
        let gsims: Vec<Arc<dyn Gsim>> = vec![Arc::new(ConstantGsim::new("Toy", 0.0, 1.0))];
        let cm = maker(gsims, 200.0);
        let source = SingleRuptureSource { rup: rupture_at_origin(0.01) };
        // ~1000 km away in longitude at the equator.
        let sites = SiteCollection::new(vec![Site::new(0, 9.0, 0.0)]);
        let pmap = cm.get_pmap(&source, &sites, true).unwrap();
        assert!(pmap.is_empty());
        assert_eq!(pmap.stats.nrups, 0);
        assert_eq!(pmap.stats.nsites, 0);
    }

    #[test]
    fn mutex_ruptures_independent_sources_skip_complement() {
        // Two sources, each contributing a single mutex rupture with its
        // own weight; sources combine independently (src_mutex=false).
        // get_pmap(rup_indep=false) already stores weighted exceedance, so
        // get_pmap_by_grp must merge via union_indep without complementing
        // first (Open Question 1).
        let gsims: Vec<Arc<dyn Gsim>> = vec![Arc::new(ConstantGsim::new("Toy", 0.0, 1.0))];
        let cm = maker(gsims, 1000.0);
        let mut rup_a = rupture_at_origin(0.1);
        rup_a.weight = Some(0.3);
        let mut rup_b = rupture_at_origin(0.1);
        rup_b.weight = Some(0.7);
        let source_a = SingleRuptureSource { rup: rup_a };
        let source_b = SingleRuptureSource { rup: rup_b };
        let sites = SiteCollection::new(vec![Site::new(0, 0.0, 0.0)]);

        let pairs: Vec<(&dyn Source, SiteCollection)> =
            vec![(&source_a, sites.clone()), (&source_b, sites.clone())];
        let groups = cm.get_pmap_by_grp(&pairs, true, false).unwrap();
        let combined = groups.get(&0).unwrap().get(0).unwrap().array[0];
        // median GSIM gives per-occurrence poe=0.5; pne = exp(-0.1*1*0.5),
        // both sources carry the same exceedance so weights (0.3+0.7=1)
        // fold to the unweighted exceedance.
        let expected = 1.0 - (-0.1_f64 * 0.5).exp();
        assert!((combined - expected).abs() < 1e-9);
    }
}
