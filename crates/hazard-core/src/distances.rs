//! Distance oracle (C1): dispatches to the rupture surface / hypocenter to
//! compute one of a fixed catalogue of distance metrics against a mesh.

use std::str::FromStr;

use crate::error::ContextError;
use crate::geo::hypocentral_distance_km;
use crate::mesh::SiteCollection;
use crate::source::Rupture;

/// The fixed catalogue of distance/geometry metrics the engine knows how
/// to compute. `Rvolc` is an all-zero placeholder (volcanic distance is
/// not modeled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceMetric {
    Rrup,
    Rx,
    Ry0,
    Rjb,
    Rhypo,
    Repi,
    Rcdpp,
    Azimuth,
    AzimuthCp,
    Rvolc,
}

impl DistanceMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Rrup => "rrup",
            DistanceMetric::Rx => "rx",
            DistanceMetric::Ry0 => "ry0",
            DistanceMetric::Rjb => "rjb",
            DistanceMetric::Rhypo => "rhypo",
            DistanceMetric::Repi => "repi",
            DistanceMetric::Rcdpp => "rcdpp",
            DistanceMetric::Azimuth => "azimuth",
            DistanceMetric::AzimuthCp => "azimuth_cp",
            DistanceMetric::Rvolc => "rvolc",
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "rrup" => DistanceMetric::Rrup,
            "rx" => DistanceMetric::Rx,
            "ry0" => DistanceMetric::Ry0,
            "rjb" => DistanceMetric::Rjb,
            "rhypo" => DistanceMetric::Rhypo,
            "repi" => DistanceMetric::Repi,
            "rcdpp" => DistanceMetric::Rcdpp,
            "azimuth" => DistanceMetric::Azimuth,
            "azimuth_cp" => DistanceMetric::AzimuthCp,
            "rvolc" => DistanceMetric::Rvolc,
            other => {
                return Err(ContextError::InvalidDistanceMetric(other.to_string()));
            }
        })
    }
}

/// Compute the requested distance metric between `rupture` and `mesh`.
/// The returned array must be treated as immutable by the caller (never
/// mutated downstream; [`crate::context::DistancesContext::roundup`]
/// always makes a copy before writing).
pub fn get_distances(rupture: &Rupture, mesh: &SiteCollection, metric: DistanceMetric) -> Vec<f64> {
    match metric {
        DistanceMetric::Rrup => rupture.surface.min_distance(mesh),
        DistanceMetric::Rjb => rupture.surface.joyner_boore(mesh),
        DistanceMetric::Rx => rupture.surface.rx(mesh),
        DistanceMetric::Ry0 => rupture.surface.ry0(mesh),
        DistanceMetric::Rhypo => mesh
            .iter()
            .map(|s| {
                hypocentral_distance_km(
                    rupture.hypo_lon,
                    rupture.hypo_lat,
                    rupture.hypo_depth,
                    s.lon,
                    s.lat,
                    0.0,
                )
            })
            .collect(),
        DistanceMetric::Repi => mesh
            .iter()
            .map(|s| crate::geo::epicentral_distance_km(rupture.hypo_lon, rupture.hypo_lat, s.lon, s.lat))
            .collect(),
        DistanceMetric::Rcdpp => rupture.cdpp_array(mesh),
        DistanceMetric::Azimuth => rupture.surface.azimuth(mesh),
        DistanceMetric::AzimuthCp => rupture.surface.azimuth_of_closest_point(mesh),
        DistanceMetric::Rvolc => vec![0.0; mesh.len()],
    }
}
