//! Interaction state of a detector front end: the uploaded image, the latest result and
//! whether an analysis is outstanding.

use image::RgbImage;
use thiserror::Error;

use crate::{model::ModelStatus, result::AnalysisResult};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("An analysis is already in progress")]
    Busy,

    #[error("No image to analyze")]
    NoImage,

    #[error("The model is still loading")]
    ModelLoading,
}

#[derive(Debug, Default)]
pub struct Session {
    image: Option<RgbImage>,
    result: Option<AnalysisResult>,
    analyzing: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current image. Any previous result no longer applies.
    pub fn set_image(&mut self, image: RgbImage) {
        self.image = Some(image);
        self.result = None;
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Mark an analysis as started and hand out the image to analyze.
    ///
    /// Refused while another analysis is outstanding or while `model` is still loading.
    pub fn begin<M>(&mut self, model: &ModelStatus<M>) -> Result<RgbImage, SessionError> {
        if self.analyzing {
            return Err(SessionError::Busy);
        }
        if model.is_loading() {
            return Err(SessionError::ModelLoading);
        }
        let image = self.image.clone().ok_or(SessionError::NoImage)?;
        self.analyzing = true;
        self.result = None;
        Ok(image)
    }

    /// Store the outcome of the analysis started with [`begin`](Self::begin).
    pub fn finish(&mut self, result: AnalysisResult) {
        self.analyzing = false;
        self.result = Some(result);
    }

    /// Forget the image and the result.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
