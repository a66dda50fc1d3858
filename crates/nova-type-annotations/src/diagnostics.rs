//! Violation records and the per-declaration accumulator.

use nova_types::{Severity, Span};
use serde::Serialize;

use crate::language_level::JavaFeature;

/// Detail of a [`DiagnosticKind::ReceiverParameterMisuse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReceiverMisuse {
    /// `this` written as a later formal parameter.
    NotFirstParameter,
    /// Static method, anonymous class method, or constructor of a class that
    /// has no enclosing instance.
    IllegalContext,
    /// `args[0]` is the expected type.
    DeclaredTypeMismatch,
    /// `args[0]` is the expected simple name.
    QualifierMismatch,
    /// `Name.this` on a method.
    MethodQualifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    SyntaxIllegalPosition,
    MissingExplicitTarget,
    TargetMismatch,
    VoidReturnAnnotated,
    StaticMemberQualifierAnnotated,
    MisplacedQualifierAnnotation,
    ReceiverParameterMisuse(ReceiverMisuse),
    UnresolvedAnnotationType,
    GenericAnnotationAttribute,
    FeatureUnavailable(JavaFeature),
}

impl DiagnosticKind {
    pub const fn code(self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxIllegalPosition => "TYPE_ANNOTATION_ILLEGAL_POSITION",
            DiagnosticKind::MissingExplicitTarget => "TYPE_ANNOTATION_MISSING_TARGET",
            DiagnosticKind::TargetMismatch => "TYPE_ANNOTATION_TARGET_MISMATCH",
            DiagnosticKind::VoidReturnAnnotated => "TYPE_ANNOTATION_ON_VOID",
            DiagnosticKind::StaticMemberQualifierAnnotated => "TYPE_ANNOTATION_STATIC_QUALIFIER",
            DiagnosticKind::MisplacedQualifierAnnotation => "TYPE_ANNOTATION_MISPLACED",
            DiagnosticKind::ReceiverParameterMisuse(_) => "RECEIVER_PARAMETER_MISUSE",
            DiagnosticKind::UnresolvedAnnotationType => "UNRESOLVED_TYPE",
            DiagnosticKind::GenericAnnotationAttribute => "GENERIC_ANNOTATION_ATTRIBUTE",
            DiagnosticKind::FeatureUnavailable(feature) => feature.diagnostic_code(),
        }
    }
}

/// One violation, with the message arguments needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub kind: DiagnosticKind,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            span,
            kind,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn arg(&self, idx: usize) -> &str {
        self.args.get(idx).map(String::as_str).unwrap_or("")
    }

    /// English message text.
    pub fn message(&self) -> String {
        match self.kind {
            DiagnosticKind::SyntaxIllegalPosition => match self.args.first() {
                Some(what) => format!("Syntax error, {what} are not allowed here"),
                None => "Syntax error, type annotations are illegal here".to_string(),
            },
            DiagnosticKind::MissingExplicitTarget => {
                "Annotation types that do not specify explicit target element types cannot be applied here"
                    .to_string()
            }
            DiagnosticKind::TargetMismatch => {
                format!("The annotation @{} is disallowed for this location", self.arg(0))
            }
            DiagnosticKind::VoidReturnAnnotated => {
                "Type annotation is illegal for a method that returns void".to_string()
            }
            DiagnosticKind::StaticMemberQualifierAnnotated => {
                "Type annotations are not allowed on type names used to access static members"
                    .to_string()
            }
            DiagnosticKind::MisplacedQualifierAnnotation => {
                "Illegally placed annotation: type annotations must directly precede the simple name of the type they are meant to affect (or the [] for arrays)"
                    .to_string()
            }
            DiagnosticKind::ReceiverParameterMisuse(misuse) => match misuse {
                ReceiverMisuse::NotFirstParameter => {
                    "Only the first formal parameter may be declared explicitly as 'this'".to_string()
                }
                ReceiverMisuse::IllegalContext => {
                    "Explicit 'this' parameter is allowed only in instance methods of non-anonymous classes and inner class constructors"
                        .to_string()
                }
                ReceiverMisuse::DeclaredTypeMismatch => format!(
                    "The declared type of the explicit 'this' parameter is expected to be {}",
                    self.arg(0)
                ),
                ReceiverMisuse::QualifierMismatch => format!(
                    "The explicit 'this' parameter is expected to be qualified with {}",
                    self.arg(0)
                ),
                ReceiverMisuse::MethodQualifier => {
                    "The explicit 'this' parameter for a method cannot have a qualifying name"
                        .to_string()
                }
            },
            DiagnosticKind::UnresolvedAnnotationType => {
                format!("{} cannot be resolved to a type", self.arg(0))
            }
            DiagnosticKind::GenericAnnotationAttribute => {
                "Annotation attributes cannot be generic".to_string()
            }
            DiagnosticKind::FeatureUnavailable(_) => self.arg(0).to_string(),
        }
    }

    /// Converts into the workspace-wide diagnostic type.
    pub fn to_nova(&self) -> nova_types::Diagnostic {
        let mut diag =
            nova_types::Diagnostic::error(self.kind.code(), self.message(), Some(self.span));
        diag.severity = self.severity;
        diag
    }
}

/// Append-only collection of diagnostics for one declaration.
///
/// Rejections that share a group key (the name segment they were written on)
/// and are reported one after another with the same kind collapse into one
/// diagnostic spanning the whole run, so `java. @A @B lang.Object` is
/// reported once.
#[derive(Debug, Default)]
pub struct DiagnosticAccumulator {
    diagnostics: Vec<Diagnostic>,
    open_group: Option<OpenGroup>,
}

#[derive(Debug, Clone, Copy)]
struct OpenGroup {
    key: Span,
    kind: DiagnosticKind,
    index: usize,
}

impl DiagnosticAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic that is not part of a run.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.open_group = None;
        self.diagnostics.push(diagnostic);
    }

    /// Records a rejection, merging it into the previous one when both carry
    /// the same `group` key and kind.
    pub fn reject(&mut self, diagnostic: Diagnostic, group: Option<Span>) {
        let Some(key) = group else {
            self.push(diagnostic);
            return;
        };

        if let Some(open) = self.open_group {
            if open.key == key && open.kind == diagnostic.kind {
                let merged = &mut self.diagnostics[open.index];
                merged.span = merged.span.cover(diagnostic.span);
                return;
            }
        }

        self.open_group = Some(OpenGroup {
            key,
            kind: diagnostic.kind,
            index: self.diagnostics.len(),
        });
        self.diagnostics.push(diagnostic);
    }

    /// Something between two rejections was accepted; they are no longer adjacent.
    pub fn break_run(&mut self) {
        self.open_group = None;
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics in source order. The sort is stable, so two diagnostics on
    /// the same span keep the order they were reported in.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics;
        sort_in_source_order(&mut diagnostics);
        diagnostics
    }
}

pub(crate) fn sort_in_source_order(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| d.span);
}
