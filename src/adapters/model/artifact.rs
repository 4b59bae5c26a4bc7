//! Serialized model formats and their evaluation.
//!
//! `model.json` carries one of two families, tagged by `kind`:
//!
//! - `tree_ensemble`: averaged binary decision trees (random forest / extra
//!   trees export). Nodes are stored in a flat array; children always have a
//!   larger index than their parent, which rules out cycles.
//! - `linear`: a linear decision function over optionally standardized
//!   inputs, with or without a logistic link.

use serde::{Deserialize, Serialize};

use crate::domain::SurvivalLabel;
use crate::ports::PredictionError;

/// Top-level artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    TreeEnsemble(TreeEnsemble),
    Linear(LinearModel),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class weights `[not_survived, survived]` (counts or fractions).
    Leaf { value: [f64; 2] },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
    /// Expose `sigmoid(decision)` as the survival probability.
    #[serde(default)]
    pub probability: bool,
}

impl ModelArtifact {
    /// Short family name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TreeEnsemble(_) => "tree_ensemble",
            Self::Linear(_) => "linear",
        }
    }

    /// Number of estimators (trees), 1 for linear models.
    #[must_use]
    pub fn estimators(&self) -> usize {
        match self {
            Self::TreeEnsemble(e) => e.trees.len(),
            Self::Linear(_) => 1,
        }
    }

    /// Structural checks against the expected input width.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            Self::TreeEnsemble(e) => e.validate(n_features),
            Self::Linear(m) => m.validate(n_features),
        }
    }

    /// Survival probability, if this artifact has one.
    ///
    /// # Errors
    /// Returns `PredictionError` on malformed input or a corrupt tree.
    pub fn positive_probability(&self, x: &[f64]) -> Result<Option<f64>, PredictionError> {
        match self {
            Self::TreeEnsemble(e) => e.positive_probability(x).map(Some),
            Self::Linear(m) if m.probability => Ok(Some(sigmoid(m.decision(x)?))),
            Self::Linear(_) => Ok(None),
        }
    }

    /// Predicted label.
    ///
    /// # Errors
    /// Returns `PredictionError` on malformed input or a corrupt tree.
    pub fn label(&self, x: &[f64]) -> Result<SurvivalLabel, PredictionError> {
        let class = match self {
            // Ties go to class 0, like an argmax over [neg, pos].
            Self::TreeEnsemble(e) => u8::from(e.positive_probability(x)? > 0.5),
            Self::Linear(m) => u8::from(m.decision(x)? > 0.0),
        };
        Ok(SurvivalLabel::from_class(class))
    }
}

impl TreeEnsemble {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".into());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }

    /// Mean of the per-tree positive-class probabilities.
    fn positive_probability(&self, x: &[f64]) -> Result<f64, PredictionError> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.positive_probability(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {i} splits on feature {feature}, model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= n {
                            return Err(format!("node {i} has invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!("leaf {i} has negative or non-finite weights"));
                    }
                    if value[0] + value[1] <= 0.0 {
                        return Err(format!("leaf {i} has zero total weight"));
                    }
                }
            }
        }
        Ok(())
    }

    fn positive_probability(&self, x: &[f64]) -> Result<f64, PredictionError> {
        let mut idx = 0;
        loop {
            let node = self.nodes.get(idx).ok_or_else(|| {
                PredictionError::Evaluation(format!("tree node {idx} out of bounds"))
            })?;
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).ok_or_else(|| {
                        PredictionError::Evaluation(format!("feature {feature} out of bounds"))
                    })?;
                    let next = if *value <= *threshold { *left } else { *right };
                    if next <= idx {
                        return Err(PredictionError::Evaluation(format!(
                            "tree node {idx} points backwards to {next}"
                        )));
                    }
                    idx = next;
                }
                TreeNode::Leaf { value } => return Ok(value[1] / (value[0] + value[1])),
            }
        }
    }
}

impl LinearModel {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.coefficients.len() != n_features {
            return Err(format!(
                "linear model has {} coefficients, expected {n_features}",
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear model has non-finite parameters".into());
        }
        if let Some(mean) = &self.scaler_mean {
            if mean.len() != n_features || mean.iter().any(|v| !v.is_finite()) {
                return Err("scaler_mean must hold one finite value per feature".into());
            }
        }
        if let Some(scale) = &self.scaler_scale {
            if scale.len() != n_features || scale.iter().any(|v| !v.is_finite() || *v == 0.0) {
                return Err("scaler_scale must hold one finite non-zero value per feature".into());
            }
        }
        Ok(())
    }

    fn decision(&self, x: &[f64]) -> Result<f64, PredictionError> {
        if x.len() != self.coefficients.len() {
            return Err(PredictionError::FeatureCount {
                got: x.len(),
                expected: self.coefficients.len(),
            });
        }
        let mut z = self.intercept;
        for (i, (value, coef)) in x.iter().zip(&self.coefficients).enumerate() {
            let mean = self.scaler_mean.as_ref().map_or(0.0, |m| m[i]);
            let scale = self.scaler_scale.as_ref().map_or(1.0, |s| s[i]);
            z += coef * (value - mean) / scale;
        }
        Ok(z)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
