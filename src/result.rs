use serde::Serialize;

use crate::advisory::AdvisoryRecord;

/// One ranked class probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub probability: f32,
}

/// A runner-up diagnosis.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Alternative {
    pub name: String,
    /// Percentage, rounded to two decimals.
    pub confidence: f64,
}

/// Where an [`AnalysisResult`] came from.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Model,
    Demo,
}

/// Outcome of one analysis, ready to be rendered.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub crop: String,
    pub disease: String,
    /// Percentage, rounded to two decimals.
    pub confidence: f64,
    /// Second and third ranked predictions, most probable first.
    pub alternatives: Vec<Alternative>,
    pub details: &'static AdvisoryRecord,
    pub source: AnalysisSource,
}
