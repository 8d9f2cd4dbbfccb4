//! Ranking of class probabilities and mapping of the best label to an advisory.

use core::{cmp::Ordering, time::Duration};
use std::sync::Arc;

use burn::tensor::{backend::Backend, Device};
use image::RgbImage;
use rand::Rng;

use crate::{
    advisory::resolve_advisory,
    config::DetectorConfig,
    error::{InferenceError, Result},
    labels::{disease_name, label_at, split_label},
    ledger::BufferLedger,
    model::{Classifier, SharedModel},
    preprocess::preprocess,
    result::{Alternative, AnalysisResult, AnalysisSource, Prediction},
};

/// Runner-up predictions reported next to the primary one.
pub const MAX_ALTERNATIVES: usize = 2;

/// Diseases the demo fallback picks from.
pub const DEMO_DISEASES: [&str; 5] = [
    "Early blight",
    "Late blight",
    "Leaf Mold",
    "Bacterial spot",
    "healthy",
];
pub const DEMO_CROP: &str = "Tomato";

/// The `k` most probable classes, most probable first.
///
/// Equal probabilities keep their index order. `NaN` ranks below everything else.
pub fn top_k(probs: &[f32], k: usize) -> Vec<Prediction> {
    let rank = |p: f32| if p.is_nan() { f32::NEG_INFINITY } else { p };

    let mut ranked = probs
        .iter()
        .enumerate()
        .map(|(index, &probability)| Prediction { index, probability })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        rank(b.probability)
            .partial_cmp(&rank(a.probability))
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(k);
    ranked
}

/// Probability as a percentage rounded to two decimals.
pub fn round_percent(probability: f32) -> f64 {
    (probability as f64 * 100.0 * 100.0).round() / 100.0
}

/// Build the result for ranked predictions over `labels`.
pub fn build_result(predictions: &[Prediction], labels: &[&str]) -> Result<AnalysisResult> {
    let (primary, rest) = predictions
        .split_first()
        .ok_or(InferenceError::EmptyOutput)?;

    let (crop, disease) = split_label(label_at(labels, primary.index));
    let alternatives = rest
        .iter()
        .take(MAX_ALTERNATIVES)
        .map(|prediction| Alternative {
            name: disease_name(label_at(labels, prediction.index)),
            confidence: round_percent(prediction.probability),
        })
        .collect();

    Ok(AnalysisResult {
        details: resolve_advisory(&disease),
        crop,
        disease,
        confidence: round_percent(primary.probability),
        alternatives,
        source: AnalysisSource::Model,
    })
}

/// Randomized placeholder used when no model is available.
pub fn demo_result<R: Rng>(rng: &mut R) -> AnalysisResult {
    let disease = DEMO_DISEASES[rng.gen_range(0..DEMO_DISEASES.len())];
    let confidence = rng.gen_range(85..=99) as f64;

    AnalysisResult {
        crop: DEMO_CROP.to_string(),
        disease: disease.to_string(),
        confidence,
        alternatives: vec![
            Alternative {
                name: "Septoria leaf spot".to_string(),
                confidence: 8.0,
            },
            Alternative {
                name: "Early blight".to_string(),
                confidence: 5.0,
            },
        ],
        details: resolve_advisory(disease),
        source: AnalysisSource::Demo,
    }
}

/// Runs one analysis at a time against an optional model.
#[derive(Debug, Clone)]
pub struct Analyzer<B: Backend> {
    labels: &'static [&'static str],
    device: Device<B>,
    ledger: Arc<BufferLedger>,
    input_size: usize,
    top_k: usize,
    demo_delay: Duration,
}

impl<B: Backend> Analyzer<B> {
    /// Analyzer with the default [`DetectorConfig`] settings.
    pub fn new(labels: &'static [&'static str], device: Device<B>) -> Self {
        Self::from_config(&DetectorConfig::mobilenet_v2(), labels, device)
    }

    pub fn from_config(
        config: &DetectorConfig,
        labels: &'static [&'static str],
        device: Device<B>,
    ) -> Self {
        Self {
            labels,
            device,
            ledger: BufferLedger::new(),
            input_size: config.input_size,
            top_k: config.top_k,
            demo_delay: config.demo_delay(),
        }
    }

    /// Ledger of the tensors allocated by this analyzer.
    pub fn ledger(&self) -> &Arc<BufferLedger> {
        &self.ledger
    }

    /// Preprocess `image`, run `model` and map the best class to its advisory.
    ///
    /// Runs on the calling thread; [`analyze`](Self::analyze) moves it off the runtime.
    pub fn infer<M: Classifier<B>>(&self, image: &RgbImage, model: &M) -> Result<AnalysisResult> {
        let input = preprocess::<B>(image, self.input_size, &self.ledger, &self.device)?;
        let output = input.try_map(|x| model.predict(x))?;
        let probs = output.into_vec::<f32>()?;

        build_result(&top_k(&probs, self.top_k), self.labels)
    }

    /// Analyze `image`. Always resolves to a result.
    ///
    /// Inference runs on the blocking thread pool. Without a model, or when inference
    /// fails or panics, the result comes from [`simulate`](Self::simulate).
    pub async fn analyze<M, R>(
        &self,
        image: &RgbImage,
        model: Option<&SharedModel<M>>,
        rng: &mut R,
    ) -> AnalysisResult
    where
        M: Classifier<B> + Send + 'static,
        R: Rng,
    {
        let Some(model) = model else {
            tracing::debug!("No model loaded, simulating analysis");
            return self.simulate(rng).await;
        };

        let analyzer = self.clone();
        let model = Arc::clone(model);
        let image = image.clone();
        let outcome =
            tokio::task::spawn_blocking(move || analyzer.infer(&image, &*model.blocking_lock()))
                .await;

        match outcome {
            Ok(Ok(result)) => return result,
            Ok(Err(err)) => tracing::error!(%err, "Prediction error"),
            Err(err) => tracing::error!(%err, "Prediction task failed"),
        }
        self.simulate(rng).await
    }

    /// Demo fallback, with the same latency profile as a real analysis.
    pub async fn simulate<R: Rng>(&self, rng: &mut R) -> AnalysisResult {
        tokio::time::sleep(self.demo_delay).await;
        demo_result(rng)
    }
}
