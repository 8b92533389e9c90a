//! Error handling (C10, ambient). `FarAwayRupture` is an expected
//! control-flow signal, recovered locally inside the rupture-iteration
//! loop and never part of the public error surface. `ContextError` covers
//! configuration bugs that are fatal and propagate unchanged.
//! `SourceContext` decorates a downstream failure with the id of the
//! source being processed when it happened.

use std::fmt;

/// Raised by [`crate::contextmaker::ContextMaker::filter`] when a rupture
/// is beyond `maximum_distance` for every site in the candidate set. Not a
/// `std::error::Error` impl deliberately: it is always matched and
/// discarded inside [`crate::contextmaker::ContextMaker::get_pmap`], never
/// surfaced to a caller.
#[derive(Debug, Clone)]
pub struct FarAwayRupture {
    pub rup_id: u32,
    pub min_distance_km: f64,
}

impl fmt::Display for FarAwayRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1} km", self.rup_id, self.min_distance_km)
    }
}

/// Configuration-bug errors: fatal, surfaced unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("unknown distance measure {0:?}")]
    InvalidDistanceMetric(String),

    #[error("{requiring} requires unknown rupture parameter {param:?}")]
    UnknownRuptureParameter { requiring: &'static str, param: String },
}

/// Decorates any error surfacing from a single source's processing in
/// [`crate::contextmaker::ContextMaker::get_pmap_by_grp`] with the source
/// id, while preserving the original error as `source()`.
#[derive(Debug, thiserror::Error)]
#[error("{inner} (source id={source_id})")]
pub struct SourceContext {
    pub source_id: String,
    #[source]
    pub inner: Box<dyn std::error::Error + Send + Sync>,
}

impl SourceContext {
    pub fn new(source_id: impl Into<String>, inner: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self { source_id: source_id.into(), inner: Box::new(inner) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_context_preserves_original_message() {
        let original = ContextError::InvalidDistanceMetric("bogus".to_string());
        let wrapped = SourceContext::new("src-42", original);
        let msg = wrapped.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("source id=src-42"));
    }
}
