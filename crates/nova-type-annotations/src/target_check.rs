//! `@Target` applicability.

use crate::diagnostics::{Diagnostic, DiagnosticAccumulator, DiagnosticKind};
use crate::model::TypeDeclaration;
use crate::position::{DeclarationContext, PositionCategory};
use crate::target::{MetaTarget, MetaTargetSet};

/// What follows a modifier list, as far as type annotations are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    /// Nothing to annotate (class header, package).
    Absent,
    Void,
    /// `var`, whose type is inferred.
    Var,
    Present,
}

/// How an accepted occurrence applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDecision {
    Declaration,
    TypeUse,
    /// A modifier annotation that applies to the declaration and its type.
    Both,
}

/// Compares the declared targets against the position.
///
/// `targets` is `None` when the annotation type has no `@Target`.
pub fn check(
    targets: Option<MetaTargetSet>,
    category: PositionCategory,
    declared: DeclaredType,
) -> Result<TargetDecision, DiagnosticKind> {
    match category {
        PositionCategory::TypeUse => {
            // There is no type node behind `void`.
            if declared == DeclaredType::Void {
                return Err(DiagnosticKind::VoidReturnAnnotated);
            }
            match targets {
                None => Err(DiagnosticKind::MissingExplicitTarget),
                Some(set) if set.contains(MetaTarget::TypeUse) => Ok(TargetDecision::TypeUse),
                Some(_) => Err(DiagnosticKind::TargetMismatch),
            }
        }
        PositionCategory::TypeParameter => match targets {
            None => Ok(TargetDecision::TypeUse),
            Some(set)
                if set.contains(MetaTarget::TypeParameter) || set.contains(MetaTarget::TypeUse) =>
            {
                Ok(TargetDecision::TypeUse)
            }
            Some(_) => Err(DiagnosticKind::TargetMismatch),
        },
        PositionCategory::Declaration(context) => {
            let Some(set) = targets else {
                return Ok(TargetDecision::Declaration);
            };
            check_declaration(set, context, declared)
        }
    }
}

fn check_declaration(
    set: MetaTargetSet,
    context: DeclarationContext,
    declared: DeclaredType,
) -> Result<TargetDecision, DiagnosticKind> {
    let declaration = set.contains(context.meta_target())
        || (context == DeclarationContext::AnnotationType && set.contains(MetaTarget::Type));
    let type_use = set.contains(MetaTarget::TypeUse);

    match context {
        // TYPE_USE also covers type declarations themselves.
        DeclarationContext::Type | DeclarationContext::AnnotationType => {
            if declaration || type_use {
                Ok(TargetDecision::Declaration)
            } else {
                Err(DiagnosticKind::TargetMismatch)
            }
        }
        DeclarationContext::Package => {
            if declaration {
                Ok(TargetDecision::Declaration)
            } else {
                Err(DiagnosticKind::TargetMismatch)
            }
        }
        DeclarationContext::Constructor => match (declaration, type_use) {
            (true, true) => Ok(TargetDecision::Both),
            (true, false) => Ok(TargetDecision::Declaration),
            (false, true) => Ok(TargetDecision::TypeUse),
            (false, false) => Err(DiagnosticKind::TargetMismatch),
        },
        DeclarationContext::Method
        | DeclarationContext::AnnotationAttribute
        | DeclarationContext::Field
        | DeclarationContext::Parameter
        | DeclarationContext::LocalVariable => match (declaration, type_use, declared) {
            (true, true, DeclaredType::Present) => Ok(TargetDecision::Both),
            (true, _, _) => Ok(TargetDecision::Declaration),
            (false, true, DeclaredType::Void) => Err(DiagnosticKind::VoidReturnAnnotated),
            (false, true, DeclaredType::Var) => Err(DiagnosticKind::TargetMismatch),
            (false, true, _) => Ok(TargetDecision::TypeUse),
            (false, false, _) => Err(DiagnosticKind::TargetMismatch),
        },
    }
}

/// Below Java 8 `TYPE_USE` and `TYPE_PARAMETER` name nothing.
pub fn without_type_annotation_targets(targets: Option<MetaTargetSet>) -> Option<MetaTargetSet> {
    targets.map(|set| {
        set.without(MetaTarget::TypeUse)
            .without(MetaTarget::TypeParameter)
    })
}

/// Annotation type elements cannot declare type parameters. Reported once per
/// element, at its name.
pub fn check_generic_attributes(decl: &TypeDeclaration, acc: &mut DiagnosticAccumulator) {
    for attribute in decl.attributes.iter().filter(|a| a.is_generic()) {
        acc.push(Diagnostic::error(
            DiagnosticKind::GenericAnnotationAttribute,
            attribute.name.span,
        ));
    }
}
