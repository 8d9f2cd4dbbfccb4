//! Static treatment and prevention advice, keyed by disease keyword.

use serde::Serialize;

/// How urgently a detected condition needs attention.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
}

impl Severity {
    /// Display color associated with this severity.
    pub const fn color(self) -> ColorTag {
        match self {
            Severity::None => ColorTag::Green,
            Severity::Low => ColorTag::Blue,
            Severity::Moderate => ColorTag::Yellow,
            Severity::High => ColorTag::Red,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Green,
    Blue,
    Yellow,
    Red,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryRecord {
    pub keyword: &'static str,
    pub treatment: &'static str,
    pub prevention: &'static str,
    pub severity: Severity,
    pub color: ColorTag,
}

/// Keyword used when a disease phrase matches nothing.
pub const DEFAULT_KEYWORD: &str = "spot";

/// Advisory table, in matching order.
pub static ADVISORIES: [AdvisoryRecord; 7] = [
    AdvisoryRecord {
        keyword: "healthy",
        treatment: "No treatment needed. Continue good agricultural practices.",
        prevention: "Maintain proper watering, fertilization, and pest management.",
        severity: Severity::None,
        color: Severity::None.color(),
    },
    AdvisoryRecord {
        keyword: "scab",
        treatment: "Apply fungicides during bud break. Remove infected leaves and fruit.",
        prevention: "Plant resistant varieties, ensure good air circulation.",
        severity: Severity::Moderate,
        color: Severity::Moderate.color(),
    },
    AdvisoryRecord {
        keyword: "rot",
        treatment: "Prune infected branches, apply copper-based fungicides.",
        prevention: "Remove mummified fruits, avoid tree wounds.",
        severity: Severity::High,
        color: Severity::High.color(),
    },
    AdvisoryRecord {
        keyword: "rust",
        treatment: "Apply fungicides, remove alternate host plants nearby.",
        prevention: "Plant resistant varieties, space plants properly.",
        severity: Severity::Moderate,
        color: Severity::Moderate.color(),
    },
    AdvisoryRecord {
        keyword: "blight",
        treatment: "Apply fungicides immediately. Remove and destroy infected plants.",
        prevention:
            "Use resistant varieties, ensure good air circulation, avoid overhead watering.",
        severity: Severity::High,
        color: Severity::High.color(),
    },
    AdvisoryRecord {
        keyword: "spot",
        treatment: "Apply copper-based bactericides or fungicides. Remove infected leaves.",
        prevention: "Practice crop rotation, avoid working with wet plants, use drip irrigation.",
        severity: Severity::Moderate,
        color: Severity::Moderate.color(),
    },
    AdvisoryRecord {
        keyword: "mold",
        treatment: "Improve ventilation, reduce humidity, apply appropriate fungicides.",
        prevention: "Maintain proper spacing, avoid overhead irrigation.",
        severity: Severity::Moderate,
        color: Severity::Moderate.color(),
    },
];

/// Record for an exact keyword.
pub fn lookup(keyword: &str) -> Option<&'static AdvisoryRecord> {
    ADVISORIES.iter().find(|record| record.keyword == keyword)
}

/// Resolve a disease phrase to its advisory record.
///
/// Words are scanned in order; the first word containing one of the keywords selects
/// that keyword's record. Phrases matching no keyword get the `spot` record.
pub fn resolve_advisory(phrase: &str) -> &'static AdvisoryRecord {
    let phrase = phrase.to_lowercase();
    phrase
        .split_whitespace()
        .find_map(|word| ADVISORIES.iter().find(|record| word.contains(record.keyword)))
        .unwrap_or_else(default_advisory)
}

fn default_advisory() -> &'static AdvisoryRecord {
    lookup(DEFAULT_KEYWORD).unwrap_or(&ADVISORIES[0])
}
