//! Weighted random cluster selection.

use std::sync::Arc;

use crate::domain::service::Cluster;
use crate::domain::weights::WeightPair;
use crate::history::{DecisionHistory, DecisionRecord};
use crate::load_balancer::entropy::{EntropySource, OsEntropy};

/// Picks a cluster for each request in proportion to its weight pair and
/// records every decision in the shared [`DecisionHistory`].
pub struct WeightedSelector {
    entropy: Box<dyn EntropySource>,
    history: Arc<DecisionHistory>,
}

impl WeightedSelector {
    /// Create a selector drawing from the operating system CSPRNG.
    pub fn new(history: Arc<DecisionHistory>) -> Self {
        Self::with_entropy(history, OsEntropy)
    }

    /// Create a selector drawing from a custom entropy source.
    pub fn with_entropy(
        history: Arc<DecisionHistory>,
        entropy: impl EntropySource + 'static,
    ) -> Self {
        Self {
            entropy: Box::new(entropy),
            history,
        }
    }

    /// The history this selector records into.
    pub fn history(&self) -> &Arc<DecisionHistory> {
        &self.history
    }

    /// Choose a cluster for `pair` and record the decision.
    ///
    /// Draws `r` uniformly from `[0, primary + secondary)` and picks the
    /// primary cluster iff `r < primary`, so a draw equal to the primary
    /// weight goes to the secondary cluster. A zero total, or a failed draw,
    /// resolves to the primary cluster.
    pub fn choose(&self, pair: &WeightPair) -> Cluster {
        let total = pair.total();
        let cluster = if total == 0 {
            Cluster::Primary
        } else {
            match self.entropy.draw_below(total) {
                Ok(r) if r < u64::from(pair.primary) => Cluster::Primary,
                Ok(_) => Cluster::Secondary,
                Err(err) => {
                    tracing::warn!(
                        service = %pair.service,
                        %err,
                        "random draw failed, degrading to ctx1"
                    );
                    Cluster::Primary
                }
            }
        };

        tracing::debug!(
            service = %pair.service,
            cluster = %cluster,
            weight = pair.weight(cluster),
            total,
            "selected cluster"
        );
        self.history.record(DecisionRecord {
            service: pair.service,
            cluster,
        });
        cluster
    }

    /// Choose between two targets according to `pair`.
    pub fn select<'a, T: ?Sized>(
        &self,
        pair: &WeightPair,
        primary: &'a T,
        secondary: &'a T,
    ) -> &'a T {
        match self.choose(pair) {
            Cluster::Primary => primary,
            Cluster::Secondary => secondary,
        }
    }
}

impl std::fmt::Debug for WeightedSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedSelector")
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::ServiceId;
    use crate::load_balancer::entropy::EntropyError;
    use proptest::prelude::*;

    /// Always draws the same value, clamped into range.
    struct FixedDraw(u64);

    impl EntropySource for FixedDraw {
        fn draw_below(&self, bound: u64) -> Result<u64, EntropyError> {
            Ok(self.0.min(bound - 1))
        }
    }

    struct Broken;

    impl EntropySource for Broken {
        fn draw_below(&self, _bound: u64) -> Result<u64, EntropyError> {
            Err(EntropyError::EmptyRange)
        }
    }

    fn selector_with(entropy: impl EntropySource + 'static) -> WeightedSelector {
        WeightedSelector::with_entropy(Arc::new(DecisionHistory::new()), entropy)
    }

    /// Pearson chi-square statistic for a two-bucket outcome.
    fn chi_square(observed_primary: u64, trials: u64, primary: u32, secondary: u32) -> f64 {
        let total = f64::from(primary) + f64::from(secondary);
        let expected = [
            trials as f64 * f64::from(primary) / total,
            trials as f64 * f64::from(secondary) / total,
        ];
        let observed = [observed_primary as f64, (trials - observed_primary) as f64];
        observed
            .iter()
            .zip(expected)
            .filter(|(_, e)| *e > 0.0)
            .map(|(o, e)| (o - e).powi(2) / e)
            .sum()
    }

    #[test]
    fn zero_total_always_picks_primary() {
        let selector = WeightedSelector::new(Arc::new(DecisionHistory::new()));
        let pair = WeightPair::new(ServiceId::Booking, 0, 0);
        for _ in 0..100 {
            assert_eq!(selector.select(&pair, "ctx1-addr", "ctx2-addr"), "ctx1-addr");
        }
    }

    #[test]
    fn draw_equal_to_primary_weight_goes_secondary() {
        let selector = selector_with(FixedDraw(70));
        let pair = WeightPair::new(ServiceId::User, 70, 30);
        assert_eq!(selector.choose(&pair), Cluster::Secondary);

        let selector = selector_with(FixedDraw(69));
        assert_eq!(selector.choose(&pair), Cluster::Primary);
    }

    #[test]
    fn entropy_failure_degrades_to_primary() {
        let selector = selector_with(Broken);
        let pair = WeightPair::new(ServiceId::Movie, 0, 100);
        assert_eq!(selector.choose(&pair), Cluster::Primary);
        assert_eq!(selector.history().snapshot(ServiceId::Movie), vec![Cluster::Primary]);
    }

    #[test]
    fn every_selection_is_recorded() {
        let selector = WeightedSelector::new(Arc::new(DecisionHistory::new()));
        let pair = WeightPair::new(ServiceId::User, 70, 30);
        let mut chosen = Vec::new();
        for _ in 0..25 {
            chosen.push(selector.choose(&pair));
        }
        assert_eq!(selector.history().snapshot(ServiceId::User), chosen[15..].to_vec());
        assert!(selector.history().snapshot(ServiceId::Movie).is_empty());
    }

    #[test]
    fn full_weight_on_secondary_always_picks_secondary() {
        let selector = WeightedSelector::new(Arc::new(DecisionHistory::new()));
        let pair = WeightPair::new(ServiceId::User, 0, 100);
        for _ in 0..1_000 {
            assert_eq!(selector.select(&pair, "primary", "secondary"), "secondary");
        }
    }

    #[test]
    fn selection_converges_to_weight_ratio() {
        // 95% critical value of the chi-square distribution with one degree of freedom.
        const CRITICAL: f64 = 3.841;
        const TRIALS: u64 = 20_000;

        let selector = WeightedSelector::new(Arc::new(DecisionHistory::new()));
        for (primary, secondary) in [(70, 30), (30, 70), (50, 50), (1, 9)] {
            let pair = WeightPair::new(ServiceId::Movie, primary, secondary);
            let sample = || {
                let hits = (0..TRIALS)
                    .filter(|_| selector.choose(&pair) == Cluster::Primary)
                    .count() as u64;
                (hits, chi_square(hits, TRIALS, primary, secondary))
            };
            // A fair selector fails a single 95% test one time in twenty;
            // two independent failures in a row are a real skew.
            let (hits, stat) = sample();
            if stat >= CRITICAL {
                let (retry_hits, retry_stat) = sample();
                assert!(
                    retry_stat < CRITICAL,
                    "{primary}:{secondary} gave {hits} then {retry_hits} of {TRIALS} primary \
                     (chi2 = {stat:.3}, {retry_stat:.3})"
                );
            }
        }
    }

    proptest! {
        #[test]
        fn fixed_draw_matches_strict_less_than(
            primary in 0u32..=100,
            secondary in 0u32..=100,
            draw in 0u64..200,
        ) {
            prop_assume!(primary + secondary > 0);
            let selector = selector_with(FixedDraw(draw));
            let pair = WeightPair::new(ServiceId::Booking, primary, secondary);
            let effective = draw.min(pair.total() - 1);
            let expected = if effective < u64::from(primary) {
                Cluster::Primary
            } else {
                Cluster::Secondary
            };
            prop_assert_eq!(selector.choose(&pair), expected);
        }

        #[test]
        fn one_sided_weights_are_deterministic(weight in 1u32..=100) {
            let selector = WeightedSelector::new(Arc::new(DecisionHistory::new()));
            let primary_only = WeightPair::new(ServiceId::User, weight, 0);
            let secondary_only = WeightPair::new(ServiceId::User, 0, weight);
            prop_assert_eq!(selector.choose(&primary_only), Cluster::Primary);
            prop_assert_eq!(selector.choose(&secondary_only), Cluster::Secondary);
        }
    }
}
