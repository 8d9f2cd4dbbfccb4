//! Background model loading with an observable status.

use std::sync::Arc;

use burn::tensor::{backend::Backend, Device};
use tokio::sync::{watch, Mutex};

use super::leafnet::{LeafNet, LeafNetConfig};
use crate::{
    config::DetectorConfig,
    error::{LoadResult, ModelLoadError},
};

/// Status message shown when the detector runs without a model.
pub const DEMO_MODE_MESSAGE: &str = "Failed to load AI model. Using demo mode.";

/// A loaded model shared between the loader and analyses.
///
/// Burn modules are `Send` but not `Sync`, so access goes through a lock.
pub type SharedModel<M> = Arc<Mutex<M>>;

/// Loading state of a model.
#[derive(Debug)]
pub enum ModelStatus<M> {
    Loading,
    Ready(SharedModel<M>),
    Error(String),
}

impl<M> Clone for ModelStatus<M> {
    fn clone(&self) -> Self {
        match self {
            ModelStatus::Loading => ModelStatus::Loading,
            ModelStatus::Ready(model) => ModelStatus::Ready(Arc::clone(model)),
            ModelStatus::Error(message) => ModelStatus::Error(message.clone()),
        }
    }
}

impl<M> ModelStatus<M> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ModelStatus::Loading)
    }

    pub fn model(&self) -> Option<&SharedModel<M>> {
        match self {
            ModelStatus::Ready(model) => Some(model),
            _ => None,
        }
    }
}

/// Loads a model once, off the async runtime, and publishes its status.
///
/// A failed load is not retried; consumers keep working in demo mode.
#[derive(Debug)]
pub struct ModelLoader<M> {
    status: watch::Receiver<ModelStatus<M>>,
}

impl<M: Send + 'static> ModelLoader<M> {
    /// Start loading with `load` on the blocking thread pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(load: F) -> Self
    where
        F: FnOnce() -> LoadResult<M> + Send + 'static,
    {
        let (sender, status) = watch::channel(ModelStatus::Loading);

        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(load)
                .await
                .map_err(|err| ModelLoadError::Task(err.to_string()))
                .and_then(|loaded| loaded);

            let status = match outcome {
                Ok(model) => {
                    tracing::info!("Model loaded successfully");
                    ModelStatus::Ready(Arc::new(Mutex::new(model)))
                }
                Err(err) => {
                    tracing::error!(%err, "Error loading model");
                    ModelStatus::Error(DEMO_MODE_MESSAGE.to_string())
                }
            };
            // Nobody listening anymore is fine
            let _ = sender.send(status);
        });

        Self { status }
    }

    /// Current status, without waiting.
    pub fn status(&self) -> ModelStatus<M> {
        self.status.borrow().clone()
    }

    /// The model, once ready.
    pub fn model(&self) -> Option<SharedModel<M>> {
        self.status.borrow().model().cloned()
    }

    /// Wait until loading either succeeded or failed.
    pub async fn settled(&mut self) -> ModelStatus<M> {
        if let Ok(status) = self.status.wait_for(|status| !status.is_loading()).await {
            return status.clone();
        }
        self.status()
    }

    /// A receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<ModelStatus<M>> {
        self.status.clone()
    }
}

impl<B: Backend> ModelLoader<LeafNet<B>> {
    /// Load the [`LeafNet`] described by `config`.
    ///
    /// A local checkpoint takes precedence over `model_url`. Downloading needs the
    /// `pretrained` feature; without it and without a checkpoint the load fails and
    /// the detector stays in demo mode.
    pub fn leafnet(config: &DetectorConfig, device: Device<B>) -> Self {
        let config = config.clone();
        Self::spawn(move || {
            let net = LeafNetConfig::new().with_num_classes(config.num_classes);
            let path = match &config.checkpoint {
                Some(path) => path.into(),
                None => fetch(&config.model_url)?,
            };
            tracing::info!(path = %path.display(), "Loading checkpoint");
            LeafNet::from_checkpoint(path, &net, &device)
        })
    }
}

#[cfg(feature = "pretrained")]
fn fetch(url: &str) -> LoadResult<std::path::PathBuf> {
    super::weights::download(url)
}

#[cfg(not(feature = "pretrained"))]
fn fetch(url: &str) -> LoadResult<std::path::PathBuf> {
    Err(ModelLoadError::Download(format!(
        "cannot fetch {url}: built without the `pretrained` feature"
    )))
}
