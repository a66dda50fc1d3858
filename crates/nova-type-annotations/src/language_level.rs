//! Java language level model for annotation checking.
//!
//! Type annotations (JSR 308) and explicit receiver parameters both arrived in
//! Java 8. Below that level the engine reports the syntax itself as unavailable
//! and skips every secondary check on the gated occurrence.

use serde::{Deserialize, Serialize};

/// The Java feature release (7, 8, 21, …) sources are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JavaLanguageLevel {
    pub major: u16,
}

impl JavaLanguageLevel {
    pub const JAVA_7: Self = Self { major: 7 };
    pub const JAVA_8: Self = Self { major: 8 };
    pub const JAVA_21: Self = Self { major: 21 };

    #[inline]
    pub const fn new(major: u16) -> Self {
        Self { major }
    }

    pub fn is_enabled(self, feature: JavaFeature) -> bool {
        self.major >= feature.since()
    }

    #[inline]
    pub fn supports_type_annotations(self) -> bool {
        self.is_enabled(JavaFeature::TypeAnnotations)
    }

    #[inline]
    pub fn supports_receiver_parameters(self) -> bool {
        self.is_enabled(JavaFeature::ReceiverParameters)
    }

    /// Human-readable reason a feature can't be used at this level.
    pub fn feature_message(self, feature: JavaFeature) -> String {
        format!("{} requires Java {}+", feature.display_name(), feature.since())
    }
}

impl Default for JavaLanguageLevel {
    fn default() -> Self {
        JavaLanguageLevel::JAVA_21
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaFeature {
    TypeAnnotations,
    ReceiverParameters,
}

impl JavaFeature {
    pub const fn diagnostic_code(self) -> &'static str {
        match self {
            JavaFeature::TypeAnnotations => "JAVA_FEATURE_TYPE_ANNOTATIONS",
            JavaFeature::ReceiverParameters => "JAVA_FEATURE_RECEIVER_PARAMETERS",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            JavaFeature::TypeAnnotations => "type annotations",
            JavaFeature::ReceiverParameters => "explicit receiver parameters",
        }
    }

    /// First release in which the feature is available.
    pub const fn since(self) -> u16 {
        match self {
            JavaFeature::TypeAnnotations | JavaFeature::ReceiverParameters => 8,
        }
    }
}
