//! Prediction result types.

use serde::{Deserialize, Serialize};

/// Binary survival outcome predicted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurvivalLabel {
    #[serde(rename = "SURVIVED")]
    Survived,
    #[serde(rename = "NOT SURVIVED")]
    NotSurvived,
}

impl SurvivalLabel {
    /// Map a model class index (1 = survived) to a label.
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::Survived
        } else {
            Self::NotSurvived
        }
    }

    /// Text stored in the `result` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Survived => "SURVIVED",
            Self::NotSurvived => "NOT SURVIVED",
        }
    }

    /// One-line verdict shown to the user.
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Survived => "The model predicts a HIGH chance of survival!",
            Self::NotSurvived => "The model predicts a LOW chance of survival.",
        }
    }
}

impl std::fmt::Display for SurvivalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SurvivalLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SURVIVED" => Ok(Self::Survived),
            "NOT SURVIVED" => Ok(Self::NotSurvived),
            other => Err(format!("unknown survival label '{other}'")),
        }
    }
}

/// Model output for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: SurvivalLabel,

    /// Probability of the survived class, when the model exposes one
    pub probability: Option<f64>,
}

impl PredictionResult {
    #[must_use]
    pub fn new(label: SurvivalLabel, probability: Option<f64>) -> Self {
        Self {
            label,
            probability: probability.map(|p| p.clamp(0.0, 1.0)),
        }
    }

    /// Probability as a two-decimal percentage, e.g. `73.25%`.
    #[must_use]
    pub fn probability_percent(&self) -> Option<String> {
        self.probability.map(|p| format!("{:.2}%", p * 100.0))
    }

    /// Full probability sentence, when a probability is available.
    #[must_use]
    pub fn probability_line(&self) -> Option<String> {
        self.probability_percent()
            .map(|pct| format!("Predicted probability of survival (class=1): {pct}"))
    }
}
