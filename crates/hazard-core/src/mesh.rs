//! Site collection: an ordered mesh of points carrying per-site parameters,
//! plus the filtering and geometric-split operations the context maker
//! needs during rupture iteration.

use std::collections::HashMap;
use std::sync::Arc;

/// A single site: a stable id, a location, and named scalar parameters
/// (e.g. `vs30`) consumed by GSIMs that require them.
#[derive(Debug, Clone)]
pub struct Site {
    pub sid: u32,
    pub lon: f64,
    pub lat: f64,
    pub params: HashMap<String, f64>,
}

impl Site {
    pub fn new(sid: u32, lon: f64, lat: f64) -> Self {
        Self { sid, lon, lat, params: HashMap::new() }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }
}

/// An ordered collection of sites. `filter`/`split` return narrower views
/// that preserve sids and parameter values; `complete` always points back
/// to the unfiltered backing collection, so `max_sites_disagg` comparisons
/// see the original site count regardless of how many filter steps ran.
#[derive(Debug, Clone)]
pub struct SiteCollection {
    sites: Arc<Vec<Site>>,
    /// Indices into `sites` that are part of this (possibly filtered) view.
    indices: Vec<usize>,
}

impl SiteCollection {
    pub fn new(sites: Vec<Site>) -> Self {
        let indices = (0..sites.len()).collect();
        Self { sites: Arc::new(sites), indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn sids(&self) -> Vec<u32> {
        self.indices.iter().map(|&i| self.sites[i].sid).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.indices.iter().map(move |&i| &self.sites[i])
    }

    /// The full backing collection this view was filtered down from.
    pub fn complete(&self) -> SiteCollection {
        SiteCollection {
            sites: Arc::clone(&self.sites),
            indices: (0..self.sites.len()).collect(),
        }
    }

    /// Narrow the collection to the sites for which `mask[i]` is true,
    /// `i` indexing into the current (already-filtered) view.
    pub fn filter(&self, mask: &[bool]) -> SiteCollection {
        debug_assert_eq!(mask.len(), self.indices.len());
        let indices = self
            .indices
            .iter()
            .zip(mask)
            .filter_map(|(&i, &keep)| keep.then_some(i))
            .collect();
        SiteCollection { sites: Arc::clone(&self.sites), indices }
    }

    /// Split the collection into sites within `cdist` km of `(lon, lat)`
    /// ("close") and sites beyond it ("far"). Either side is `None` when
    /// empty, matching the point-source collapse branch structure in
    /// [`crate::contextmaker::ContextMaker::gen_rups_sites`].
    pub fn split(&self, lon: f64, lat: f64, cdist: f64) -> (Option<SiteCollection>, Option<SiteCollection>) {
        let mut close_mask = Vec::with_capacity(self.indices.len());
        for site in self.iter() {
            let d = crate::geo::epicentral_distance_km(lon, lat, site.lon, site.lat);
            close_mask.push(d <= cdist);
        }
        let far_mask: Vec<bool> = close_mask.iter().map(|&b| !b).collect();
        let close = self.filter(&close_mask);
        let far = self.filter(&far_mask);
        (
            (!close.is_empty()).then_some(close),
            (!far.is_empty()).then_some(far),
        )
    }
}
