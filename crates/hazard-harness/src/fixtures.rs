//! Toy fixtures: a minimal point surface, a constant-magnitude source, and
//! helpers to build the scenarios enumerated in the worked examples. Not a
//! realistic rupture-surface geometry library, just enough to exercise
//! `hazard-core`'s pipeline end to end.

use std::sync::Arc;

use hazard_core::{
    EquivalentDistances, HypocenterDistribution, IntegrationDistance, Occurrence, Rupture,
    RuptureSurface, Site, SiteCollection, Source, SourceLocation,
};

/// A surface located at the origin whose `rrup`/`rjb` are simply the
/// epicentral distance from each mesh point. Enough to drive the distance
/// oracle without a real 3-D mesh.
#[derive(Debug)]
pub struct FlatSurface {
    pub planar: bool,
}

impl RuptureSurface for FlatSurface {
    fn min_distance(&self, mesh: &SiteCollection) -> Vec<f64> {
        mesh.iter().map(|s| hazard_core::geo::epicentral_distance_km(0.0, 0.0, s.lon, s.lat)).collect()
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

/// A `maximum_distance` table that returns the same value for any trt/mag.
#[derive(Debug)]
pub struct ConstantMaxDist(pub f64);

impl IntegrationDistance for ConstantMaxDist {
    fn get(&self, _trt: &str, _mag: f64) -> f64 {
        self.0
    }
}

/// Never substitutes an equivalent distance.
#[derive(Debug)]
pub struct NoEquivalentDistances;

impl EquivalentDistances for NoEquivalentDistances {
    fn get(&self, _trt: &str, _repi: f64, _mag: f64) -> Option<f64> {
        None
    }
}

/// A source producing a fixed list of ruptures, optionally point-shaped
/// (for exercising the collapse optimisation).
#[derive(Debug)]
pub struct FixtureSource {
    pub id: u32,
    pub source_id: String,
    pub trt: String,
    pub group_ids: Vec<u32>,
    pub mutex_weight: Option<f64>,
    pub location: Option<SourceLocation>,
    pub nphc: usize,
    pub hypocenters: HypocenterDistribution,
    pub ruptures: Vec<Rupture>,
}

impl Source for FixtureSource {
    fn id(&self) -> u32 {
        self.id
    }
    fn source_id(&self) -> &str {
        &self.source_id
    }
    fn tectonic_region_type(&self) -> &str {
        &self.trt
    }
    fn src_group_ids(&self) -> &[u32] {
        &self.group_ids
    }
    fn mutex_weight(&self) -> Option<f64> {
        self.mutex_weight
    }
    fn location(&self) -> Option<SourceLocation> {
        self.location
    }
    fn count_nphc(&self) -> usize {
        self.nphc
    }
    fn hypocenter_distribution(&self) -> &HypocenterDistribution {
        &self.hypocenters
    }
    fn max_rupture_projection_radius(&self, _mag: f64) -> f64 {
        15.0
    }
    fn iter_ruptures(&self) -> Vec<Rupture> {
        self.ruptures.clone()
    }
}

pub fn single_rupture(rup_id: u32, mag: f64, occurrence: Occurrence, weight: Option<f64>) -> Rupture {
    Rupture {
        rup_id,
        mag,
        rake: 0.0,
        hypo_lon: 0.0,
        hypo_lat: 0.0,
        hypo_depth: 10.0,
        surface: Arc::new(FlatSurface { planar: false }),
        occurrence,
        weight,
        tectonic_region_type: "Active Shallow Crust".to_string(),
        cdpp: 0.0,
    }
}

pub fn single_site(lon: f64, lat: f64) -> SiteCollection {
    SiteCollection::new(vec![Site::new(0, lon, lat)])
}
