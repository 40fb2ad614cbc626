//! Response verdicts

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Outcome of one scanned prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Good,
    Bad,
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Good => "good",
            Verdict::Bad => "bad",
            Verdict::Error => "error",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a reply as good or bad
pub trait Analyzer: Send {
    /// Returns the verdict and a confidence in `[0, 1]`
    fn analyze(&mut self, prompt: &str, response: &str) -> (Verdict, f64);
}

/// Random verdicts with a fixed distribution.
///
/// 70% good with high confidence, 25% bad, 5% good with low confidence.
pub struct MockAnalyzer {
    rng: StdRng,
}

impl MockAnalyzer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Analyzer for MockAnalyzer {
    fn analyze(&mut self, _prompt: &str, _response: &str) -> (Verdict, f64) {
        let roll: f64 = self.rng.gen();
        if roll < 0.70 {
            (Verdict::Good, self.rng.gen_range(0.7..0.99))
        } else if roll < 0.95 {
            (Verdict::Bad, self.rng.gen_range(0.6..0.95))
        } else {
            (Verdict::Good, self.rng.gen_range(0.4..0.6))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_analyzer_is_reproducible() {
        let mut a = MockAnalyzer::new(Some(42));
        let mut b = MockAnalyzer::new(Some(42));

        for _ in 0..20 {
            assert_eq!(a.analyze("p", "r"), b.analyze("p", "r"));
        }
    }

    #[test]
    fn test_confidence_ranges() {
        let mut analyzer = MockAnalyzer::new(Some(7));
        let mut bad = 0;

        for _ in 0..1000 {
            let (verdict, confidence) = analyzer.analyze("p", "r");
            assert_ne!(verdict, Verdict::Error);
            assert!((0.4..0.99).contains(&confidence));
            if verdict == Verdict::Bad {
                bad += 1;
                assert!(confidence >= 0.6 && confidence < 0.95);
            }
        }

        // Roughly a quarter of replies are judged bad
        assert!((150..350).contains(&bad), "bad = {}", bad);
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::Good).unwrap(), "\"good\"");
        assert_eq!(Verdict::Error.to_string(), "error");
    }
}
