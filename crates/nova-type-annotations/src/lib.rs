//! Placement, `@Target` validation and binding of Java type annotations.
//!
//! The parser hands over one [`Declaration`] at a time, with every annotation
//! name already resolved (or marked unresolved). For each occurrence the
//! engine decides whether the grammar allows a type annotation there, whether
//! the annotation's `@Target` allows this use, and which node of the type it
//! annotates. Violations are collected as [`Diagnostic`]s; only input the
//! parser could never produce is an [`EngineError`].
//!
//! ```text
//! Declaration ──▶ sites ──▶ placement ──▶ target_check ──▶ binder ──▶ CheckedDeclaration
//!                                                          receiver ─┘
//! ```

mod attribute;
mod binder;
mod config;
mod diagnostics;
mod engine;
mod error;
mod language_level;
mod model;
mod placement;
mod position;
mod receiver;
mod sites;
mod target;
mod target_check;
mod type_path;

pub use attribute::{
    type_annotation_attributes, AnnotationAttributes, DeclarationAnnotationEntry, TargetInfo,
    TypeAnnotationEntry,
};
pub use binder::{AnnotationBinding, BindingRole, TypeSlot, TypeTarget};
pub use config::{
    json_schema, ConfigDiagnostics, ConfigError, ConfigWarning, ParallelConfig,
    TypeAnnotationConfig,
};
pub use diagnostics::{Diagnostic, DiagnosticAccumulator, DiagnosticKind, ReceiverMisuse};
pub use engine::{AnnotationEngine, CheckedDeclaration, CheckedUnit, Disposition, OccurrenceOutcome};
pub use error::EngineError;
pub use language_level::{JavaFeature, JavaLanguageLevel};
pub use model::*;
pub use position::{DeclarationContext, GrammarPosition, Placement, PositionCategory, QualifierSegment};
pub use target::{
    AnnotationTypeInfo, AnnotationTypeTable, MetaTarget, MetaTargetSet, RetentionPolicy,
    TargetRegistry,
};
pub use target_check::{DeclaredType, TargetDecision};
pub use type_path::{NodePath, NodeStep, TypePath, TypePathEntry, TypePathKind};

/// Tracing target for everything this crate logs.
pub const TRACE_TARGET: &str = "nova.type_annotations";

/// Structural legality of a grammar position, independent of any annotation.
pub fn validate_placement(position: GrammarPosition) -> Result<(), DiagnosticKind> {
    placement::validate(position)
}

/// `@Target` applicability of one occurrence at a position of `category`.
pub fn check_target(
    targets: Option<MetaTargetSet>,
    category: PositionCategory,
    declared: DeclaredType,
) -> Result<TargetDecision, DiagnosticKind> {
    target_check::check(targets, category, declared)
}
