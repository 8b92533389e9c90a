//! Spherical geometry primitives used for hypocenter-to-mesh distances.
//! All operations on the unit sphere use f64 precision; the rupture
//! surface itself (rrup/rjb/rx/ry0/strike/dip/...) is a black-box
//! capability supplied by the caller and lives in [`crate::source`].

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the unit sphere in Cartesian coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_lonlat(lon_deg: f64, lat_deg: f64) -> Self {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        Self {
            x: lat.cos() * lon.cos(),
            y: lat.cos() * lon.sin(),
            z: lat.sin(),
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

/// Great-circle distance between two points, in radians.
pub fn great_circle_distance_rad(a: Vec3, b: Vec3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Great-circle (epicentral) distance in km between two lon/lat points.
pub fn epicentral_distance_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let a = Vec3::from_lonlat(lon1, lat1);
    let b = Vec3::from_lonlat(lon2, lat2);
    great_circle_distance_rad(a, b) * EARTH_RADIUS_KM
}

/// Hypocentral (3-D) distance in km: great-circle surface distance combined
/// with the depth difference as a second leg of a right triangle. This
/// matches the convention used throughout the hazard literature (and by
/// the original `distance_to_mesh` routine) rather than a literal
/// chord-through-the-earth distance.
pub fn hypocentral_distance_km(
    lon1: f64,
    lat1: f64,
    depth1_km: f64,
    lon2: f64,
    lat2: f64,
    depth2_km: f64,
) -> f64 {
    let epi = epicentral_distance_km(lon1, lat1, lon2, lat2);
    let dz = depth1_km - depth2_km;
    (epi * epi + dz * dz).sqrt()
}
