//! Attaching accepted annotations to declarations and type nodes.

use nova_types::Span;
use serde::Serialize;

use crate::diagnostics::DiagnosticKind;
use crate::model::{AnnotationOccurrence, QualifiedAnnotationName};
use crate::target_check::TargetDecision;
use crate::type_path::{NodePath, TypePath};

/// Which type of a declaration a type annotation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeSlot {
    Superclass,
    Superinterface(u16),
    TypeParameter(u8),
    TypeParameterBound { param: u8, bound: u8 },
    Field,
    /// Method return type, or the constructed type for constructors.
    Return,
    /// Return type of the n-th element of an annotation type.
    AttributeReturn(u16),
    Receiver,
    /// Index among formal parameters, not counting the receiver.
    Parameter(u8),
    Throws(u16),
    LocalVariable,
    /// Cast target; `member` indexes intersection members.
    Cast { member: u8 },
    New,
    /// Explicit type argument of an invocation.
    TypeArgument(u8),
    ClassLiteral,
}

/// A node inside one slot's type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeTarget {
    pub slot: TypeSlot,
    pub node: NodePath,
    pub type_path: TypePath,
}

impl TypeTarget {
    pub fn root(slot: TypeSlot) -> Self {
        Self {
            slot,
            node: NodePath::root(),
            type_path: TypePath::root(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingRole {
    Declaration,
    TypeUse,
    Both,
}

/// Where one accepted occurrence ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationBinding {
    pub span: Span,
    pub annotation: QualifiedAnnotationName,
    pub role: BindingRole,
    /// `None` for pure declaration annotations.
    pub target: Option<TypeTarget>,
}

/// Role of the name segment an annotation precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentRole {
    Type,
    /// Leftmost segment of a package-qualified name.
    LeadingPackage,
    StaticMember,
}

/// Binding context recorded for each occurrence while walking a declaration.
#[derive(Debug, Clone)]
pub(crate) enum Locus {
    /// Written directly on a type node.
    Node { target: TypeTarget, role: SegmentRole },
    /// Among modifiers; `ty` is the leftmost segment of the declared type,
    /// when there is one.
    Modifier {
        ty: Option<(TypeTarget, SegmentRole)>,
    },
    /// Among modifiers of a declaration without a type (class header, package).
    Declaration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rejection {
    pub kind: DiagnosticKind,
    /// Merge with adjacent rejections on the same segment.
    pub grouped: bool,
}

pub(crate) fn bind(
    name: &QualifiedAnnotationName,
    occurrence: &AnnotationOccurrence,
    decision: TargetDecision,
    locus: &Locus,
) -> Result<AnnotationBinding, Rejection> {
    let binding = |role, target| AnnotationBinding {
        span: occurrence.span,
        annotation: name.clone(),
        role,
        target,
    };

    match locus {
        Locus::Declaration => Ok(binding(BindingRole::Declaration, None)),
        Locus::Node { target, role } => {
            check_segment(*role, true)?;
            Ok(binding(BindingRole::TypeUse, Some(target.clone())))
        }
        Locus::Modifier { ty } => match (decision, ty) {
            (TargetDecision::Declaration, _) => Ok(binding(BindingRole::Declaration, None)),
            // The type half is dropped silently when the type can't take it.
            (TargetDecision::Both, Some((target, SegmentRole::Type))) => {
                Ok(binding(BindingRole::Both, Some(target.clone())))
            }
            (TargetDecision::Both, _) => Ok(binding(BindingRole::Declaration, None)),
            (TargetDecision::TypeUse, Some((target, role))) => {
                check_segment(*role, false)?;
                Ok(binding(BindingRole::TypeUse, Some(target.clone())))
            }
            (TargetDecision::TypeUse, None) => Ok(binding(BindingRole::Declaration, None)),
        },
    }
}

fn check_segment(role: SegmentRole, in_type: bool) -> Result<(), Rejection> {
    match role {
        SegmentRole::Type => Ok(()),
        SegmentRole::LeadingPackage => Err(Rejection {
            kind: DiagnosticKind::MisplacedQualifierAnnotation,
            grouped: false,
        }),
        SegmentRole::StaticMember => Err(Rejection {
            kind: DiagnosticKind::StaticMemberQualifierAnnotated,
            grouped: in_type,
        }),
    }
}
