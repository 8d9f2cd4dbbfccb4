use crop_disease_burn::{
    inference::Analyzer,
    labels::CLASS_LABELS,
    model::{LeafNet, ModelLoader, ModelStatus},
    session::Session,
    DetectorConfig,
};

use burn::{backend::NdArray, config::Config, tensor::Device};
use tracing_subscriber::EnvFilter;

type B = NdArray<f32>;

#[tokio::main]
pub async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Parse arguments
    let img_path = std::env::args().nth(1).expect("No image path provided");
    let config = match std::env::args().nth(2) {
        Some(path) => DetectorConfig::load(&path)
            .map_err(|err| format!("Failed to load config {path}.\nError: {err}"))
            .unwrap(),
        None => DetectorConfig::mobilenet_v2(),
    };

    // Start loading the classifier in the background
    let device: Device<B> = Default::default();
    let mut loader = ModelLoader::<LeafNet<B>>::leafnet(&config, device.clone());
    let analyzer = Analyzer::<B>::from_config(&config, CLASS_LABELS, device);

    // Load image
    let img = image::open(&img_path)
        .map_err(|err| format!("Failed to load image {img_path}.\nError: {err}"))
        .unwrap();
    let mut session = Session::new();
    session.set_image(img.into_rgb8());

    let status = loader.settled().await;
    match &status {
        ModelStatus::Ready(_) => println!("AI Model Ready"),
        ModelStatus::Error(message) => println!("Demo Mode: {message}"),
        ModelStatus::Loading => unreachable!(),
    }

    let image = session.begin(&status).unwrap();
    let mut rng = rand::thread_rng();
    let result = analyzer.analyze(&image, status.model(), &mut rng).await;
    session.finish(result);

    let result = session.result().unwrap();
    println!(
        "Crop: {}\nDisease: {}\nConfidence: {:.2}%",
        result.crop, result.disease, result.confidence
    );
    for alternative in &result.alternatives {
        println!("  or {} ({:.2}%)", alternative.name, alternative.confidence);
    }
    println!(
        "Severity: {:?}\nTreatment: {}\nPrevention: {}",
        result.details.severity, result.details.treatment, result.details.prevention
    );
}
