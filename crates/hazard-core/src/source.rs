//! Rupture and source data model, plus the black-box capabilities
//! (rupture-surface geometry, integration distance, equivalent distances)
//! that the context maker consumes without knowing their internals.

use std::sync::Arc;

use crate::mesh::SiteCollection;
use crate::occurrence::Occurrence;

/// Rupture-surface geometry queries. Treated as an external black-box
/// capability per the Non-goals: this crate never computes a 3-D surface
/// distance itself, it only dispatches to this trait.
pub trait RuptureSurface: std::fmt::Debug + Send + Sync {
    /// Closest distance (km) from each mesh point to the surface (`rrup`).
    fn min_distance(&self, mesh: &SiteCollection) -> Vec<f64>;
    /// Horizontal distance to the surface projection (km) (`rjb`).
    fn joyner_boore(&self, mesh: &SiteCollection) -> Vec<f64>;
    /// Signed perpendicular distance to the top edge (km) (`rx`).
    fn rx(&self, mesh: &SiteCollection) -> Vec<f64>;
    /// Along-strike distance past the surface ends (km) (`ry0`).
    fn ry0(&self, mesh: &SiteCollection) -> Vec<f64>;
    fn strike(&self) -> f64;
    fn dip(&self) -> f64;
    fn top_edge_depth(&self) -> f64;
    fn width(&self) -> f64;
    fn azimuth(&self, mesh: &SiteCollection) -> Vec<f64>;
    fn azimuth_of_closest_point(&self, mesh: &SiteCollection) -> Vec<f64>;
    /// Closest point on the surface to each mesh point, as (lon, lat) pairs.
    fn closest_points(&self, mesh: &SiteCollection) -> (Vec<f64>, Vec<f64>);
    /// Whether this surface is planar, gating the equivalent-distance
    /// substitution in [`crate::contextmaker::ContextMaker::make_contexts`].
    fn is_planar(&self) -> bool {
        false
    }
}

/// A single earthquake scenario.
#[derive(Debug, Clone)]
pub struct Rupture {
    pub rup_id: u32,
    pub mag: f64,
    pub rake: f64,
    pub hypo_lon: f64,
    pub hypo_lat: f64,
    pub hypo_depth: f64,
    pub surface: Arc<dyn RuptureSurface>,
    pub occurrence: Occurrence,
    pub weight: Option<f64>,
    pub tectonic_region_type: String,
    /// Directivity predictor (`rcdpp`); zero when the source does not
    /// compute one.
    pub cdpp: f64,
}

impl Rupture {
    /// Directivity-predictor distance array for this rupture: constant
    /// across the mesh (the original computes one scalar per rupture and
    /// broadcasts it).
    pub fn cdpp_array(&self, mesh: &SiteCollection) -> Vec<f64> {
        vec![self.cdpp; mesh.len()]
    }
}

/// Weighted depth distribution over nodal-plane/hypocenter combinations.
#[derive(Debug, Clone, Default)]
pub struct HypocenterDistribution {
    /// (weight, depth_km) pairs.
    pub data: Vec<(f64, f64)>,
}

impl HypocenterDistribution {
    pub fn weighted_average_depth(&self) -> f64 {
        let total_weight: f64 = self.data.iter().map(|(w, _)| w).sum();
        if total_weight == 0.0 {
            return 0.0;
        }
        self.data.iter().map(|(w, d)| w * d).sum::<f64>() / total_weight
    }
}

/// A point-source location, used only by the collapse optimisation.
#[derive(Debug, Clone, Copy)]
pub struct SourceLocation {
    pub lon: f64,
    pub lat: f64,
    pub depth: f64,
}

/// A seismic source: lazily produces ruptures, grouped by magnitude for
/// the collapse optimisation.
pub trait Source: std::fmt::Debug {
    fn id(&self) -> u32;
    fn source_id(&self) -> &str;
    fn tectonic_region_type(&self) -> &str;
    fn src_group_ids(&self) -> &[u32];
    fn mutex_weight(&self) -> Option<f64>;
    /// `None` for non-point sources; point sources enable the collapse
    /// optimisation in [`crate::contextmaker::ContextMaker::gen_rups_sites`].
    fn location(&self) -> Option<SourceLocation>;
    /// Number of nodal-plane × hypocenter combinations. A value of 1 means
    /// there is nothing to collapse over ("simple" source).
    fn count_nphc(&self) -> usize;
    fn hypocenter_distribution(&self) -> &HypocenterDistribution;
    fn max_rupture_projection_radius(&self, mag: f64) -> f64;

    /// All ruptures produced by this source, in no particular grouping.
    fn iter_ruptures(&self) -> Vec<Rupture>;

    /// Ruptures grouped by magnitude, each group carrying its magnitude
    /// value for maximum-distance and radius lookups.
    fn gen_mag_ruptures(&self) -> Vec<(f64, Vec<Rupture>)> {
        use std::collections::BTreeMap;
        let mut groups: BTreeMap<u64, (f64, Vec<Rupture>)> = BTreeMap::new();
        for rup in self.iter_ruptures() {
            // Magnitudes are grouped by exact bit pattern: ruptures sharing
            // a magnitude are expected to come from the same discretised
            // value, not merely a close one.
            let key = rup.mag.to_bits();
            groups.entry(key).or_insert_with(|| (rup.mag, Vec::new())).1.push(rup);
        }
        groups.into_values().collect()
    }
}

/// `(trt, mag) -> maximum distance in km`; returns `+inf` outside
/// configured regions.
pub trait IntegrationDistance: std::fmt::Debug + Send + Sync {
    fn get(&self, trt: &str, mag: f64) -> f64;
}

/// Equivalent-distance table for planar surfaces, keyed by tectonic region
/// type; used to replace `rjb`/`rrup` with a single representative
/// distance for large, simplified ruptures.
pub trait EquivalentDistances: std::fmt::Debug + Send + Sync {
    /// Returns `None` if no equivalent-distance substitution applies for
    /// this trt.
    fn get(&self, trt: &str, repi: f64, mag: f64) -> Option<f64>;
}
