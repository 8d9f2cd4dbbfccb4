//! Crop leaf disease detection on top of Burn.
//!
//! The pipeline is split in three stages:
//! - [`model::ModelLoader`] fetches a MobileNetV2 classifier once, in the background.
//! - [`preprocess`] turns a decoded RGB image into a `[1, 224, 224, 3]` tensor in `[-1, 1]`.
//! - [`inference::Analyzer`] ranks the class probabilities and maps the best label to an
//!   [`advisory::AdvisoryRecord`], falling back to a randomized demo result when no model
//!   is available.
//!
//! # Example
//!
//! ```ignore
//! use burn::backend::NdArray;
//! use crop_disease_burn::{
//!     inference::Analyzer,
//!     labels::CLASS_LABELS,
//!     model::{LeafNet, SharedModel},
//! };
//!
//! let analyzer = Analyzer::<NdArray>::new(CLASS_LABELS, Default::default());
//! let result = analyzer.analyze(&image, None::<&SharedModel<LeafNet<NdArray>>>, &mut rng).await;
//! println!("{} ({}%)", result.disease, result.confidence);
//! ```

pub mod advisory;
pub mod config;
pub mod error;
pub mod inference;
pub mod labels;
pub mod ledger;
pub mod model;
pub mod preprocess;
pub mod result;
pub mod session;

pub use advisory::{AdvisoryRecord, ColorTag, Severity};
pub use config::DetectorConfig;
pub use error::{InferenceError, ModelLoadError};
pub use result::{AnalysisResult, AnalysisSource, Alternative, Prediction};
