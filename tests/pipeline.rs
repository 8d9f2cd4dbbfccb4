//! End-to-end analysis on the NdArray backend with stand-in classifiers.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use burn::backend::ndarray::NdArray;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use crop_disease_burn::{
    error::{InferenceError, Result},
    inference::Analyzer,
    labels::CLASS_LABELS,
    model::{Classifier, LeafNet, LeafNetConfig, ModelLoader, ModelStatus, SharedModel},
    AnalysisSource, DetectorConfig,
};
use image::{Rgb, RgbImage};
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::Mutex;

type B = NdArray<f32>;

const LABELS: &[&str] = &[
    "Apple_healthy",
    "Apple_scab",
    "Tomato_Early_blight",
    "Tomato_Late_blight",
    "Corn_Common_rust",
];

/// Returns the same probability vector for every image.
struct FixedClassifier(Vec<f32>);

impl<Bk: Backend> Classifier<Bk> for FixedClassifier {
    fn predict(&self, input: Tensor<Bk, 4>) -> Result<Tensor<Bk, 2>> {
        let [batch, height, width, channels] = input.dims();
        assert_eq!([height, width, channels], [224, 224, 3]);

        let probs = self.0.repeat(batch);
        Ok(Tensor::from_data(
            TensorData::new(probs, [batch, self.0.len()]),
            &input.device(),
        ))
    }
}

struct FailingClassifier;

impl<Bk: Backend> Classifier<Bk> for FailingClassifier {
    fn predict(&self, _input: Tensor<Bk, 4>) -> Result<Tensor<Bk, 2>> {
        Err(InferenceError::Prediction("backend lost".to_string()))
    }
}

struct PanickingClassifier;

impl<Bk: Backend> Classifier<Bk> for PanickingClassifier {
    fn predict(&self, _input: Tensor<Bk, 4>) -> Result<Tensor<Bk, 2>> {
        panic!("shape mismatch")
    }
}

/// Holds the thread for a while before answering, like a slow forward pass.
struct SlowClassifier(Duration);

impl<Bk: Backend> Classifier<Bk> for SlowClassifier {
    fn predict(&self, input: Tensor<Bk, 4>) -> Result<Tensor<Bk, 2>> {
        std::thread::sleep(self.0);
        FixedClassifier(vec![0.0, 0.0, 0.0, 0.0, 1.0]).predict(input)
    }
}

fn shared<M>(model: M) -> SharedModel<M> {
    Arc::new(Mutex::new(model))
}

fn black_image() -> RgbImage {
    RgbImage::new(224, 224)
}

#[tokio::test]
async fn ranks_model_output() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let model = FixedClassifier(vec![0.7, 0.2, 0.1, 0.0, 0.0]);
    let mut rng = StdRng::seed_from_u64(0);

    let result = analyzer
        .analyze(&black_image(), Some(&shared(model)), &mut rng)
        .await;

    assert_eq!(result.source, AnalysisSource::Model);
    assert_eq!(result.crop, "Apple");
    assert_eq!(result.disease, "healthy");
    assert_eq!(result.confidence, 70.0);
    let alternatives = result
        .alternatives
        .iter()
        .map(|a| (a.name.as_str(), a.confidence))
        .collect::<Vec<_>>();
    assert_eq!(alternatives, [("scab", 20.0), ("Early blight", 10.0)]);
    assert_eq!(result.details.keyword, "healthy");

    assert_eq!(analyzer.ledger().live(), 0);
    assert!(analyzer.ledger().allocated() >= 3);
}

#[tokio::test]
async fn resizes_arbitrary_images() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let model = FixedClassifier(vec![0.1, 0.1, 0.1, 0.6, 0.1]);
    let image = RgbImage::from_pixel(300, 120, Rgb([34, 139, 34]));

    let result = analyzer
        .analyze(&image, Some(&shared(model)), &mut StdRng::seed_from_u64(0))
        .await;

    assert_eq!(result.crop, "Tomato");
    assert_eq!(result.disease, "Late blight");
    assert_eq!(result.details.keyword, "blight");
    assert_eq!(analyzer.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn prediction_error_falls_back_to_demo() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let mut rng = StdRng::seed_from_u64(11);

    let result = analyzer
        .analyze(&black_image(), Some(&shared(FailingClassifier)), &mut rng)
        .await;

    assert_eq!(result.source, AnalysisSource::Demo);
    assert_eq!(result.crop, "Tomato");
    assert!((85.0..=99.0).contains(&result.confidence));
    assert_eq!(analyzer.ledger().live(), 0);
    assert!(analyzer.ledger().allocated() > 0);
}

#[tokio::test(start_paused = true)]
async fn panicking_model_falls_back_to_demo() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let mut rng = StdRng::seed_from_u64(12);

    let result = analyzer
        .analyze(&black_image(), Some(&shared(PanickingClassifier)), &mut rng)
        .await;

    assert_eq!(result.source, AnalysisSource::Demo);
    assert_eq!(analyzer.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn empty_image_falls_back_to_demo() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let model = FixedClassifier(vec![1.0, 0.0, 0.0, 0.0, 0.0]);

    let result = analyzer
        .analyze(&RgbImage::new(0, 0), Some(&shared(model)), &mut StdRng::seed_from_u64(4))
        .await;

    assert_eq!(result.source, AnalysisSource::Demo);
    assert_eq!(analyzer.ledger().allocated(), 0);
}

#[tokio::test(start_paused = true)]
async fn demo_mode_without_model() {
    let analyzer = Analyzer::<B>::new(CLASS_LABELS, Default::default());
    let demo_delay = DetectorConfig::mobilenet_v2().demo_delay();
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..10 {
        let start = tokio::time::Instant::now();
        let result = analyzer
            .analyze(&black_image(), None::<&SharedModel<LeafNet<B>>>, &mut rng)
            .await;

        assert!(start.elapsed() >= demo_delay);
        assert_eq!(result.crop, "Tomato");
        assert!((85.0..=99.0).contains(&result.confidence));
        assert_eq!(result.alternatives.len(), 2);
    }
    assert_eq!(analyzer.ledger().allocated(), 0);
}

#[tokio::test]
async fn untrained_leafnet_end_to_end() {
    let device = Default::default();
    let model = LeafNetConfig::new()
        .with_num_classes(CLASS_LABELS.len())
        .with_width_mult(0.25)
        .init::<B>(&device);
    let analyzer = Analyzer::<B>::new(CLASS_LABELS, device);
    let image = RgbImage::from_fn(256, 256, |x, y| Rgb([x as u8, y as u8, 96]));

    let result = analyzer
        .analyze(&image, Some(&shared(model)), &mut StdRng::seed_from_u64(0))
        .await;

    assert_eq!(result.source, AnalysisSource::Model);
    assert!(["Apple", "Tomato", "Potato", "Corn"].contains(&result.crop.as_str()));
    assert!((0.0..=100.0).contains(&result.confidence));
    assert_eq!(result.alternatives.len(), 2);
    assert!(result.confidence >= result.alternatives[0].confidence);
    assert!(result.alternatives[0].confidence >= result.alternatives[1].confidence);
    assert_eq!(analyzer.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_detector_in_demo_mode() {
    let config = DetectorConfig::mobilenet_v2()
        .with_checkpoint(Some("no/such/leafnet.pth".to_string()))
        .with_demo_delay_ms(50);
    let mut loader = ModelLoader::<LeafNet<B>>::leafnet(&config, Default::default());
    let analyzer = Analyzer::<B>::from_config(&config, CLASS_LABELS, Default::default());

    assert!(matches!(loader.settled().await, ModelStatus::Error(_)));

    let model = loader.model();
    let result = analyzer
        .analyze(&black_image(), model.as_ref(), &mut StdRng::seed_from_u64(9))
        .await;
    assert_eq!(result.source, AnalysisSource::Demo);
}

#[tokio::test]
async fn loaded_leafnet_drives_analysis() {
    let device: <B as Backend>::Device = Default::default();
    let load_device = device.clone();
    let mut loader = ModelLoader::spawn(move || {
        Ok(LeafNetConfig::new()
            .with_num_classes(CLASS_LABELS.len())
            .with_width_mult(0.25)
            .init::<B>(&load_device))
    });
    let analyzer = Analyzer::<B>::new(CLASS_LABELS, device);

    let status = loader.settled().await;
    assert!(matches!(status, ModelStatus::Ready(_)));

    let result = analyzer
        .analyze(&black_image(), status.model(), &mut StdRng::seed_from_u64(0))
        .await;
    assert_eq!(result.source, AnalysisSource::Model);
    assert_eq!(result.alternatives.len(), 2);
    assert_eq!(analyzer.ledger().live(), 0);
}

#[tokio::test]
async fn slow_inference_leaves_runtime_responsive() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let model = shared(SlowClassifier(Duration::from_millis(300)));

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = tokio::spawn({
        let ticks = Arc::clone(&ticks);
        async move {
            let mut interval = tokio::time::interval(Duration::from_millis(5));
            loop {
                interval.tick().await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let result = analyzer
        .analyze(&black_image(), Some(&model), &mut StdRng::seed_from_u64(0))
        .await;
    ticker.abort();

    assert_eq!(result.source, AnalysisSource::Model);
    assert_eq!(result.crop, "Corn");
    assert!(ticks.load(Ordering::Relaxed) > 10);
}

#[tokio::test]
async fn result_serializes_for_rendering() {
    let analyzer = Analyzer::<B>::new(LABELS, Default::default());
    let model = FixedClassifier(vec![0.05, 0.05, 0.1, 0.1, 0.7]);
    let result = analyzer
        .analyze(&black_image(), Some(&shared(model)), &mut StdRng::seed_from_u64(0))
        .await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["crop"], "Corn");
    assert_eq!(json["disease"], "Common rust");
    assert_eq!(json["details"]["keyword"], "rust");
    assert_eq!(json["details"]["severity"], "Moderate");
    assert_eq!(json["details"]["color"], "yellow");
    assert_eq!(json["source"], "model");
}
