//! Context maker and probability-map engine for probabilistic seismic
//! hazard analysis: filters sites by distance against each rupture,
//! materialises the predictor contexts a bank of ground-shaking intensity
//! models needs, folds their output into exceedance probabilities, and
//! combines those into a sparse [`pmap::ProbabilityMap`] under independent
//! or mutually-exclusive source/rupture semantics.

pub mod context;
pub mod contextmaker;
pub mod distances;
pub mod error;
pub mod geo;
pub mod gsim;
pub mod imt;
pub mod mesh;
pub mod occurrence;
pub mod pmap;
pub mod rupdata;
pub mod source;

pub use context::DistancesContext;
pub use contextmaker::{ContextMaker, ContextMakerConfig};
pub use distances::{get_distances, DistanceMetric};
pub use error::{ContextError, FarAwayRupture, SourceContext};
pub use gsim::{get_mean_std, get_poes, ConstantGsim, Gsim, MeanStd, RuptureBatchItem};
pub use imt::{Imt, ImtlSet};
pub use mesh::{Site, SiteCollection};
pub use occurrence::{probability_no_exceedance, Occurrence, PoissonTom, TemporalOccurrenceModel};
pub use pmap::{PoeArray, PmapStats, ProbabilityMap, Regime};
pub use rupdata::RupData;
pub use source::{
    EquivalentDistances, HypocenterDistribution, IntegrationDistance, Rupture, RuptureSurface, Source,
    SourceLocation,
};
