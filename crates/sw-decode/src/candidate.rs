use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// Probabilities are clamped to this before taking a logarithm.
pub const PROB_EPSILON: f32 = 1e-12;

/// Decoded token sequence with its accumulated negative log-probability.
///
/// `tokens` starts with `<sos>` and ends with `<eos>` when the sequence
/// terminated on its own; lower scores are better.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub score: f32,
    pub tokens: Vec<u32>,
}

impl Candidate {
    pub fn new(tokens: Vec<u32>, score: f32) -> Self {
        Self { score, tokens }
    }

    /// Probability of the full sequence, `exp(-score)`.
    pub fn probability(&self) -> f32 {
        (-self.score).exp()
    }
}

/// Score contribution of a token with log-probability `log_prob`.
///
/// The probability is clamped into `[PROB_EPSILON, 1]`, so the result is
/// always finite and non-negative; NaN is reported as a numeric fault.
pub fn added_score(log_prob: f32, step: usize, token: u32) -> Result<f32> {
    if log_prob.is_nan() {
        return Err(DecodeError::NumericFault {
            step,
            detail: format!("log-probability of token {} is NaN", token),
        });
    }
    Ok(-log_prob.clamp(PROB_EPSILON.ln(), 0.0))
}

/// The `k` cheapest next tokens as `(token, added_score)`, ordered by
/// ascending added score, then ascending token id.
pub fn ranked_tokens(log_probs: &[f32], k: usize, step: usize) -> Result<Vec<(u32, f32)>> {
    let mut ranked = Vec::with_capacity(log_probs.len());
    for (i, &lp) in log_probs.iter().enumerate() {
        ranked.push((i as u32, added_score(lp, step, i as u32)?));
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    Ok(ranked)
}

/// One ranked `(score, word)` pair of a prediction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "(f32, String)", from = "(f32, String)")]
pub struct Prediction {
    pub score: f32,
    pub word: String,
}

impl From<Prediction> for (f32, String) {
    fn from(p: Prediction) -> Self {
        (p.score, p.word)
    }
}

impl From<(f32, String)> for Prediction {
    fn from((score, word): (f32, String)) -> Self {
        Prediction { score, word }
    }
}

/// Predictions for one trajectory, ascending by score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionList(Vec<Prediction>);

impl PredictionList {
    /// Sorts `predictions` ascending by score; equal scores keep their order.
    pub fn new(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| a.score.total_cmp(&b.score));
        PredictionList(predictions)
    }

    /// The list recorded for a trajectory whose decode failed.
    pub fn empty() -> Self {
        PredictionList(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn best(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn words(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.word.as_str()).collect()
    }

    pub fn into_inner(self) -> Vec<Prediction> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PredictionList {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_score_clamps() {
        assert_eq!(added_score(0.0, 0, 0).unwrap(), 0.0);
        // log-probabilities above zero would make scores decrease
        assert_eq!(added_score(0.5, 0, 0).unwrap(), 0.0);
        let floor = added_score(f32::NEG_INFINITY, 0, 0).unwrap();
        assert!(floor.is_finite());
        assert!((floor - 27.631).abs() < 1e-2);
        assert!(matches!(
            added_score(f32::NAN, 3, 7),
            Err(DecodeError::NumericFault { step: 3, .. })
        ));
    }

    #[test]
    fn test_ranked_tokens_breaks_ties_by_id() {
        let lp = [-1.0, -0.5, -0.5, -2.0];
        let ranked = ranked_tokens(&lp, 3, 0).unwrap();
        let ids: Vec<u32> = ranked.iter().map(|r| r.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn test_prediction_list_serializes_as_pairs() {
        let list = PredictionList::new(vec![
            Prediction { score: 2.0, word: "б".into() },
            Prediction { score: 0.5, word: "а".into() },
        ]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"[[0.5,"а"],[2.0,"б"]]"#);
        let back: PredictionList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }
}
