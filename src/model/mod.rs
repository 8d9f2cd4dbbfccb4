mod blocks;
pub mod leafnet;
pub mod loader;
pub mod weights;

pub use leafnet::{Classifier, LeafNet, LeafNetConfig};
pub use loader::{ModelLoader, ModelStatus, SharedModel};
