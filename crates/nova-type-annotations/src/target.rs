//! `@Target` / `@Retention` metadata of annotation declarations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::QualifiedAnnotationName;

/// One constant of `java.lang.annotation.ElementType` that the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetaTarget {
    Type,
    Field,
    Method,
    Parameter,
    Constructor,
    LocalVariable,
    AnnotationType,
    Package,
    TypeParameter,
    TypeUse,
}

impl MetaTarget {
    pub const ALL: [MetaTarget; 10] = [
        MetaTarget::Type,
        MetaTarget::Field,
        MetaTarget::Method,
        MetaTarget::Parameter,
        MetaTarget::Constructor,
        MetaTarget::LocalVariable,
        MetaTarget::AnnotationType,
        MetaTarget::Package,
        MetaTarget::TypeParameter,
        MetaTarget::TypeUse,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// The `ElementType` constant name, as written in source.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetaTarget::Type => "TYPE",
            MetaTarget::Field => "FIELD",
            MetaTarget::Method => "METHOD",
            MetaTarget::Parameter => "PARAMETER",
            MetaTarget::Constructor => "CONSTRUCTOR",
            MetaTarget::LocalVariable => "LOCAL_VARIABLE",
            MetaTarget::AnnotationType => "ANNOTATION_TYPE",
            MetaTarget::Package => "PACKAGE",
            MetaTarget::TypeParameter => "TYPE_PARAMETER",
            MetaTarget::TypeUse => "TYPE_USE",
        }
    }
}

impl fmt::Display for MetaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The explicit element types listed in an `@Target`.
///
/// An annotation without `@Target` is represented by `None` at the
/// [`TargetRegistry`] level, never by an empty set: `@Target({})` is a legal
/// declaration that applies nowhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<MetaTarget>", from = "Vec<MetaTarget>")]
pub struct MetaTargetSet(u16);

impl MetaTargetSet {
    pub const EMPTY: Self = Self(0);

    pub const fn of(target: MetaTarget) -> Self {
        Self(target.bit())
    }

    #[must_use]
    pub const fn with(self, target: MetaTarget) -> Self {
        Self(self.0 | target.bit())
    }

    #[must_use]
    pub const fn without(self, target: MetaTarget) -> Self {
        Self(self.0 & !target.bit())
    }

    pub const fn contains(self, target: MetaTarget) -> bool {
        self.0 & target.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = MetaTarget> {
        MetaTarget::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<MetaTarget> for MetaTargetSet {
    fn from_iter<I: IntoIterator<Item = MetaTarget>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl From<Vec<MetaTarget>> for MetaTargetSet {
    fn from(targets: Vec<MetaTarget>) -> Self {
        targets.into_iter().collect()
    }
}

impl From<MetaTargetSet> for Vec<MetaTarget> {
    fn from(set: MetaTargetSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for MetaTargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// `java.lang.annotation.RetentionPolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetentionPolicy {
    Source,
    /// Default when no `@Retention` is present.
    #[default]
    Class,
    Runtime,
}

/// Lookup of annotation declarations by their resolved name.
///
/// Name resolution happens before the engine runs; the registry only answers
/// questions about already-resolved annotation types.
pub trait TargetRegistry: Sync {
    /// `None` when the annotation type has no `@Target` meta-annotation.
    fn targets(&self, name: &QualifiedAnnotationName) -> Option<MetaTargetSet>;

    fn retention(&self, _name: &QualifiedAnnotationName) -> RetentionPolicy {
        RetentionPolicy::Class
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotationTypeInfo {
    pub targets: Option<MetaTargetSet>,
    pub retention: RetentionPolicy,
}

/// In-memory [`TargetRegistry`] keyed by qualified annotation name.
///
/// Unknown names answer like an annotation type without `@Target`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTypeTable {
    types: HashMap<QualifiedAnnotationName, AnnotationTypeInfo>,
}

impl AnnotationTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<QualifiedAnnotationName>, info: AnnotationTypeInfo) {
        self.types.insert(name.into(), info);
    }

    /// Declares `name` with the given `@Target` elements.
    #[must_use]
    pub fn with_targets(
        mut self,
        name: impl Into<QualifiedAnnotationName>,
        targets: impl IntoIterator<Item = MetaTarget>,
    ) -> Self {
        self.insert(
            name,
            AnnotationTypeInfo {
                targets: Some(targets.into_iter().collect()),
                retention: RetentionPolicy::default(),
            },
        );
        self
    }

    /// Declares `name` without an `@Target` meta-annotation.
    #[must_use]
    pub fn without_target(mut self, name: impl Into<QualifiedAnnotationName>) -> Self {
        self.insert(name, AnnotationTypeInfo::default());
        self
    }

    #[must_use]
    pub fn with_retention(
        mut self,
        name: impl Into<QualifiedAnnotationName>,
        retention: RetentionPolicy,
    ) -> Self {
        self.types.entry(name.into()).or_default().retention = retention;
        self
    }

    pub fn get(&self, name: &QualifiedAnnotationName) -> Option<&AnnotationTypeInfo> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TargetRegistry for AnnotationTypeTable {
    fn targets(&self, name: &QualifiedAnnotationName) -> Option<MetaTargetSet> {
        self.types.get(name).and_then(|info| info.targets)
    }

    fn retention(&self, name: &QualifiedAnnotationName) -> RetentionPolicy {
        self.types
            .get(name)
            .map(|info| info.retention)
            .unwrap_or_default()
    }
}
