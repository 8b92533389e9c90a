//! Rupture occurrence model (C6): turns a rupture's occurrence semantics
//! plus per-(site, IMT, GSIM) exceedance probabilities into non-exceedance
//! probabilities.
//!
//! The original implementation discriminates parametric vs. nonparametric
//! ruptures by testing whether `occurrence_rate` is NaN. Here that is an
//! explicit sum type instead.

/// How a rupture's occurrence is characterised.
#[derive(Debug, Clone, PartialEq)]
pub enum Occurrence {
    /// Occurrence rate in events/year, delegated to a temporal occurrence
    /// model (e.g. Poisson) to turn into a probability over a time span.
    Parametric { rate: f64 },
    /// Explicit probability of the rupture occurring exactly `k` times in
    /// the reference time span, for `k = 0, 1, 2, ...`; must sum to 1.
    Nonparametric { probs_occur: Vec<f64> },
}

impl Occurrence {
    pub fn rate(&self) -> Option<f64> {
        match self {
            Occurrence::Parametric { rate } => Some(*rate),
            Occurrence::Nonparametric { .. } => None,
        }
    }
}

/// Translates an occurrence rate and a time span into a probability of one
/// or more occurrences producing an exceedance, for a given per-occurrence
/// exceedance probability `poe`.
pub trait TemporalOccurrenceModel: std::fmt::Debug + Send + Sync {
    /// `poes` holds the conditional probability, for each (site, IMT, GSIM)
    /// triple flattened row-major, that a single rupture occurrence causes
    /// an exceedance. Returns the probability of non-exceedance over the
    /// model's time span, same shape.
    fn probability_no_exceedance(&self, rate: f64, poes: &[f64]) -> Vec<f64>;

    fn time_span_years(&self) -> f64;
}

/// The standard Poisson temporal occurrence model: `pne = exp(-rate * T * poe)`.
#[derive(Debug, Clone, Copy)]
pub struct PoissonTom {
    pub time_span_years: f64,
}

impl PoissonTom {
    pub fn new(time_span_years: f64) -> Self {
        Self { time_span_years }
    }
}

impl TemporalOccurrenceModel for PoissonTom {
    fn probability_no_exceedance(&self, rate: f64, poes: &[f64]) -> Vec<f64> {
        poes.iter()
            .map(|&p| (-rate * self.time_span_years * p).exp())
            .collect()
    }

    fn time_span_years(&self) -> f64 {
        self.time_span_years
    }
}

/// Compute the probability of non-exceedance for a single rupture, per
/// §4.5. `poes` are the conditional per-occurrence exceedance
/// probabilities, flattened row-major over (site, IMT, GSIM); `tom` is
/// ignored for nonparametric ruptures since they carry their own
/// occurrence-count distribution.
pub fn probability_no_exceedance(
    occurrence: &Occurrence,
    poes: &[f64],
    tom: &dyn TemporalOccurrenceModel,
) -> Vec<f64> {
    match occurrence {
        Occurrence::Parametric { rate } => tom.probability_no_exceedance(*rate, poes),
        Occurrence::Nonparametric { probs_occur } => {
            let mut pne = vec![0.0; poes.len()];
            for (k, &p_k) in probs_occur.iter().enumerate() {
                for (i, &poe) in poes.iter().enumerate() {
                    pne[i] += p_k * (1.0 - poe).powi(k as i32);
                }
            }
            for (i, &poe) in poes.iter().enumerate() {
                if pne[i] > 1.0 {
                    pne[i] = 1.0; // sanity check against rounding
                }
                if poe == 0.0 {
                    pne[i] = 1.0; // avoid 0^0 noise propagating
                }
            }
            pne
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parametric_matches_poisson_formula() {
        let tom = PoissonTom::new(1.0);
        let occ = Occurrence::Parametric { rate: 0.01 };
        let pne = probability_no_exceedance(&occ, &[0.5], &tom);
        assert!((pne[0] - (-0.005_f64).exp()).abs() < 1e-12);
        assert!((pne[0] - 0.995012479).abs() < 1e-9);
    }

    #[test]
    fn nonparametric_k0_certain_ignores_poes() {
        let occ = Occurrence::Nonparametric { probs_occur: vec![1.0, 0.0, 0.0] };
        let tom = PoissonTom::new(1.0);
        for poe in [0.0, 0.3, 0.9, 1.0] {
            let pne = probability_no_exceedance(&occ, &[poe], &tom);
            assert!((pne[0] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn nonparametric_single_occurrence_is_one_minus_poe() {
        let occ = Occurrence::Nonparametric { probs_occur: vec![0.0, 1.0] };
        let tom = PoissonTom::new(1.0);
        let pne = probability_no_exceedance(&occ, &[0.3], &tom);
        assert!((pne[0] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn nonparametric_matches_worked_scenario() {
        // probs_occur=[0.5, 0.3, 0.2], poes=0.1 -> 0.932
        let occ = Occurrence::Nonparametric { probs_occur: vec![0.5, 0.3, 0.2] };
        let tom = PoissonTom::new(1.0);
        let pne = probability_no_exceedance(&occ, &[0.1], &tom);
        assert!((pne[0] - 0.932).abs() < 1e-9);
    }

    #[test]
    fn nonparametric_zero_poe_forced_to_one() {
        let occ = Occurrence::Nonparametric { probs_occur: vec![0.2, 0.3, 0.5] };
        let tom = PoissonTom::new(1.0);
        let pne = probability_no_exceedance(&occ, &[0.0], &tom);
        assert_eq!(pne[0], 1.0);
    }
}
