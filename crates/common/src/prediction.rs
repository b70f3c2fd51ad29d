use std::fmt;

/// A single (label, confidence) pair produced by a classifier.
///
/// `confidence` is whatever score the producing classifier reports; for the
/// custom model that is a raw network output, not a probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps a fractional digit for whole scores ("1.0", not "1")
        write!(f, "{} (Confidence: {:?})", self.label, self.confidence)
    }
}
