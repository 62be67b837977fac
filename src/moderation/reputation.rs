use serde::Serialize;

use crate::config::ModerationConfig;

/// Whether a user may comment and follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReputationState {
    Trusted,
    Restricted,
}

impl ReputationState {
    #[must_use]
    pub const fn is_restricted(self) -> bool {
        matches!(self, Self::Restricted)
    }
}

/// Result of applying one comment's bullying score to its author.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationOutcome {
    pub new_score: f64,
    pub loss: f64,
    pub bullying_detected: bool,
    /// Set only when this comment moved the author from trusted to restricted.
    pub restricted: bool,
}

/// Thresholds for decay and restriction.
///
/// Reputation only ever moves down through comments. Every comment
/// scoring above the detection threshold subtracts its own score,
/// floored at zero.
#[derive(Debug, Clone, Copy)]
pub struct ReputationPolicy {
    pub initial: f64,
    pub restriction_threshold: f64,
    pub detection_threshold: f64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self::from_config(&ModerationConfig::default())
    }
}

impl ReputationPolicy {
    #[must_use]
    pub const fn from_config(config: &ModerationConfig) -> Self {
        Self {
            initial: config.initial_reputation,
            restriction_threshold: config.restriction_threshold,
            detection_threshold: config.detection_threshold,
        }
    }

    #[must_use]
    pub fn state(&self, score: f64) -> ReputationState {
        if score < self.restriction_threshold {
            ReputationState::Restricted
        } else {
            ReputationState::Trusted
        }
    }

    #[must_use]
    pub fn is_bullying(&self, bullying_score: f64) -> bool {
        bullying_score > self.detection_threshold
    }

    /// Amount to subtract for a comment with this score. Zero unless the
    /// comment counts as bullying.
    #[must_use]
    pub fn penalty(&self, bullying_score: f64) -> f64 {
        if self.is_bullying(bullying_score) {
            bullying_score
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn apply(&self, old_score: f64, bullying_score: f64) -> ReputationOutcome {
        let bullying_detected = self.is_bullying(bullying_score);
        let new_score = (old_score - self.penalty(bullying_score)).max(0.0);

        self.outcome(old_score, new_score, bullying_detected)
    }

    /// Builds the outcome from a score already persisted by the store.
    #[must_use]
    pub fn outcome(&self, old_score: f64, new_score: f64, bullying_detected: bool) -> ReputationOutcome {
        ReputationOutcome {
            new_score,
            loss: old_score - new_score,
            bullying_detected,
            restricted: !self.state(old_score).is_restricted()
                && self.state(new_score).is_restricted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn policy() -> ReputationPolicy {
        ReputationPolicy::default()
    }

    #[test]
    fn test_state_boundaries() {
        let p = policy();
        assert_eq!(p.state(10.0), ReputationState::Trusted);
        assert_eq!(p.state(5.0), ReputationState::Trusted);
        assert_eq!(p.state(4.999), ReputationState::Restricted);
        assert_eq!(p.state(0.0), ReputationState::Restricted);
    }

    #[test]
    fn test_bullying_comment_decays_score() {
        let outcome = policy().apply(10.0, 0.6);
        assert!(outcome.bullying_detected);
        assert!((outcome.new_score - 9.4).abs() < EPS);
        assert!((outcome.loss - 0.6).abs() < EPS);
        assert!(!outcome.restricted);
    }

    #[test]
    fn test_crossing_threshold_restricts() {
        let outcome = policy().apply(5.2, 0.9);
        assert!((outcome.new_score - 4.3).abs() < EPS);
        assert!(outcome.restricted);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let outcome = policy().apply(7.0, 0.4);
        assert!(!outcome.bullying_detected);
        assert!((outcome.new_score - 7.0).abs() < EPS);
        assert!(outcome.loss.abs() < EPS);

        assert!(policy().is_bullying(0.400_001));
    }

    #[test]
    fn test_score_never_negative() {
        let outcome = policy().apply(0.5, 0.95);
        assert!(outcome.new_score.abs() < EPS);
        assert!((outcome.loss - 0.5).abs() < EPS);
        // Already restricted before this comment.
        assert!(!outcome.restricted);

        let outcome = policy().apply(0.0, 1.0);
        assert!(outcome.new_score.abs() < EPS);
        assert!(outcome.loss.abs() < EPS);
    }

    #[test]
    fn test_restricted_flags_only_the_transition() {
        let p = policy();

        let outcome = p.apply(4.8, 0.1);
        assert!((outcome.new_score - 4.8).abs() < EPS);
        assert!(!outcome.restricted);

        let outcome = p.apply(4.8, 0.9);
        assert!(!outcome.restricted);

        let outcome = p.apply(5.0, 0.41);
        assert!(outcome.restricted);

        let outcome = p.apply(5.9, 0.9);
        assert!(!outcome.restricted);
    }

    #[test]
    fn test_score_is_monotone() {
        let p = policy();
        let mut score = p.initial;
        for s in [0.1, 0.41, 0.9, 0.0, 0.55, 1.0, 0.3] {
            let next = p.apply(score, s).new_score;
            assert!(next <= score);
            assert!(next >= 0.0);
            score = next;
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let config = ModerationConfig {
            initial_reputation: 3.0,
            restriction_threshold: 2.0,
            detection_threshold: 0.7,
            ..ModerationConfig::default()
        };
        let p = ReputationPolicy::from_config(&config);
        assert!(!p.apply(3.0, 0.6).bullying_detected);
        assert!(p.apply(2.5, 0.8).restricted);
    }
}
