//! Crop/disease class labels of the form `<Crop>_<Disease_Tokens>`.

/// Name used when a label, or one of its halves, is missing.
pub const UNKNOWN: &str = "Unknown";

/// Fixed label set, indexed by the classifier output position.
pub const CLASS_LABELS: &[&str] = &[
    "Apple_Apple_scab",
    "Apple_Black_rot",
    "Apple_Cedar_apple_rust",
    "Apple_healthy",
    "Tomato_Bacterial_spot",
    "Tomato_Early_blight",
    "Tomato_Late_blight",
    "Tomato_Leaf_Mold",
    "Tomato_Septoria_leaf_spot",
    "Tomato_healthy",
    "Potato_Early_blight",
    "Potato_Late_blight",
    "Potato_healthy",
    "Corn_Common_rust",
    "Corn_Gray_leaf_spot",
    "Corn_healthy",
];

/// Label at `idx`, or [`UNKNOWN`] when the model emits more classes than there are labels.
pub fn label_at<'a>(labels: &[&'a str], idx: usize) -> &'a str {
    labels.get(idx).copied().unwrap_or(UNKNOWN)
}

/// Split a label into `(crop, disease)`.
///
/// The crop is the first `_` token; the remaining tokens joined by spaces form the
/// disease phrase. A label without any separator is its own disease phrase.
pub fn split_label(label: &str) -> (String, String) {
    let mut parts = label.split('_');
    let crop = match parts.next() {
        Some(crop) if !crop.is_empty() => crop.to_string(),
        _ => UNKNOWN.to_string(),
    };
    let disease = parts.collect::<Vec<_>>().join(" ");
    let disease = if disease.is_empty() {
        label.to_string()
    } else {
        disease
    };

    (crop, disease)
}

/// Disease half of a label, used for the ranked alternatives.
pub fn disease_name(label: &str) -> String {
    let disease = label.split('_').skip(1).collect::<Vec<_>>().join(" ");
    if disease.is_empty() {
        UNKNOWN.to_string()
    } else {
        disease
    }
}
