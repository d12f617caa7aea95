//! Core trait definitions for weighting schemes.

use ballast_traits::{Insight, TargetWeights};

/// Extracts the value an insight contributes to its target weight.
///
/// A selector decides whether an insight takes part at all ([`includes`]) and,
/// if it does, how large its unsigned allocation is ([`value`]). The direction
/// of the insight supplies the sign.
///
/// [`includes`]: ValueSelector::includes
/// [`value`]: ValueSelector::value
///
/// # Examples
///
/// ```rust
/// use ballast_traits::Insight;
/// use ballast_weight::ValueSelector;
///
/// /// Weights insights by their predicted magnitude.
/// #[derive(Debug, Clone, Copy, Default)]
/// struct ByMagnitude;
///
/// impl ValueSelector for ByMagnitude {
///     fn includes(&self, insight: &Insight) -> bool {
///         insight.magnitude.is_some()
///     }
///
///     fn value(&self, insight: &Insight) -> f64 {
///         insight.magnitude.map_or(0.0, f64::abs)
///     }
/// }
/// ```
pub trait ValueSelector: Send + Sync {
    /// Returns whether the insight should receive a target.
    fn includes(&self, insight: &Insight) -> bool;

    /// Unsigned allocation for an included insight.
    fn value(&self, insight: &Insight) -> f64;

    /// Name reported by schemes built on this selector.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Turns a set of active insights into target weights.
///
/// All implementations must be thread-safe (Send + Sync) so that independent
/// books can be weighted in parallel.
pub trait WeightingScheme: Send + Sync {
    /// Compute target weights for the given active insights.
    ///
    /// Implementations keep at most one insight per symbol (the most recently
    /// generated one) and always return weights whose gross exposure does not
    /// exceed one. Symbols absent from the result have no target.
    fn compute_weights(&self, insights: &[Insight]) -> TargetWeights;

    /// Name of this weighting scheme.
    ///
    /// Used for logging and identification.
    fn name(&self) -> &str;
}
