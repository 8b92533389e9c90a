//! RupData accumulator (C3): column-oriented diagnostic rows, one per
//! surviving rupture, collected only when `fewsites` holds (bounding its
//! memory footprint per §5).

use std::collections::HashMap;

use crate::context::DistancesContext;
use crate::distances::DistanceMetric;
use crate::mesh::SiteCollection;
use crate::occurrence::Occurrence;
use crate::source::Rupture;

/// One accumulated row before it is folded into the column store.
#[derive(Debug, Clone)]
struct Row {
    srcidx: u32,
    occurrence_rate: f64,
    weight: f64,
    probs_occur: Vec<f64>,
    rup_params: HashMap<String, f64>,
    sids: Vec<u32>,
    distances: HashMap<DistanceMetric, Vec<f64>>,
    lons: Vec<f64>,
    lats: Vec<f64>,
}

/// Column-oriented store: scalar-per-rupture columns become contiguous
/// arrays on finalisation, while per-rupture variable-length columns
/// (sids, distances, closest-point coordinates) stay ragged.
#[derive(Debug, Clone, Default)]
pub struct RupData {
    rows: Vec<Row>,
}

impl RupData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a snapshot of `rup`'s contribution, with `sctx`/`dctx`
    /// holding the surviving-sites mesh and already-computed distances for
    /// this rupture. `required_rup_params` and `required_distances` name
    /// exactly the slots this `ContextMaker`'s GSIM batch needs.
    pub fn add(
        &mut self,
        rup: &Rupture,
        src_id: u32,
        sctx: &SiteCollection,
        dctx: &DistancesContext,
        required_rup_params: &HashMap<String, f64>,
        required_distances: &[DistanceMetric],
    ) {
        let (rate, probs_occur) = match &rup.occurrence {
            Occurrence::Parametric { rate } => (*rate, Vec::new()),
            Occurrence::Nonparametric { probs_occur } => (f64::NAN, probs_occur.clone()),
        };
        let mut distances = HashMap::new();
        for &metric in required_distances {
            let values = dctx
                .get(metric)
                .map(|s| s.to_vec())
                .unwrap_or_else(|| crate::distances::get_distances(rup, sctx, metric));
            distances.insert(metric, values);
        }
        let (lons, lats) = rup.surface.closest_points(sctx);
        self.rows.push(Row {
            srcidx: src_id,
            occurrence_rate: rate,
            weight: rup.weight.unwrap_or(f64::NAN),
            probs_occur,
            rup_params: required_rup_params.clone(),
            sids: sctx.sids(),
            distances,
            lons,
            lats,
        });
    }

    pub fn extend(&mut self, other: RupData) {
        self.rows.extend(other.rows);
    }

    /// Contiguous `srcidx` column.
    pub fn srcidx_column(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.srcidx).collect()
    }

    pub fn occurrence_rate_column(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.occurrence_rate).collect()
    }

    pub fn weight_column(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.weight).collect()
    }

    pub fn probs_occur_column(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.probs_occur.clone()).collect()
    }

    pub fn rup_param_column(&self, name: &str) -> Vec<f64> {
        self.rows.iter().map(|r| r.rup_params.get(name).copied().unwrap_or(f64::NAN)).collect()
    }

    pub fn sid_column(&self) -> Vec<Vec<u32>> {
        self.rows.iter().map(|r| r.sids.clone()).collect()
    }

    pub fn distance_column(&self, metric: DistanceMetric) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.distances.get(&metric).cloned().unwrap_or_default()).collect()
    }

    pub fn lon_column(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.lons.clone()).collect()
    }

    pub fn lat_column(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.lats.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Site;
    use crate::source::RuptureSurface;
    use std::sync::Arc;

    #[derive(Debug)]
    struct StubSurface;
    impl RuptureSurface for StubSurface {
        fn min_distance(&self, mesh: &SiteCollection) -> Vec<f64> { vec![1.0; mesh.len()] }
        fn joyner_boore(&self, mesh: &SiteCollection) -> Vec<f64> { vec![1.0; mesh.len()] }
        fn rx(&self, mesh: &SiteCollection) -> Vec<f64> { vec![1.0; mesh.len()] }
        fn ry0(&self, mesh: &SiteCollection) -> Vec<f64> { vec![1.0; mesh.len()] }
        fn strike(&self) -> f64 { 0.0 }
        fn dip(&self) -> f64 { 90.0 }
        fn top_edge_depth(&self) -> f64 { 0.0 }
        fn width(&self) -> f64 { 10.0 }
        fn azimuth(&self, mesh: &SiteCollection) -> Vec<f64> { vec![0.0; mesh.len()] }
        fn azimuth_of_closest_point(&self, mesh: &SiteCollection) -> Vec<f64> { vec![0.0; mesh.len()] }
        fn closest_points(&self, mesh: &SiteCollection) -> (Vec<f64>, Vec<f64>) {
            (vec![1.0; mesh.len()], vec![2.0; mesh.len()])
        }
    }

    #[test]
    fn add_records_nan_rate_for_nonparametric() {
        let rup = Rupture {
            rup_id: 1,
            mag: 6.0,
            rake: 0.0,
            hypo_lon: 0.0,
            hypo_lat: 0.0,
            hypo_depth: 5.0,
            surface: Arc::new(StubSurface),
            occurrence: Occurrence::Nonparametric { probs_occur: vec![0.5, 0.5] },
            weight: Some(1.0),
            tectonic_region_type: "Active Shallow Crust".to_string(),
            cdpp: 0.0,
        };
        let sites = SiteCollection::new(vec![Site::new(0, 0.0, 0.0)]);
        let dctx = DistancesContext::new();
        let mut rd = RupData::new();
        rd.add(&rup, 7, &sites, &dctx, &HashMap::new(), &[]);
        assert!(rd.occurrence_rate_column()[0].is_nan());
        assert_eq!(rd.srcidx_column(), vec![7]);
        assert_eq!(rd.probs_occur_column()[0], vec![0.5, 0.5]);
    }
}
