//! Class-file view of a checked declaration (JVMS 4.7.16 - 4.7.20).
//!
//! Bytecode offsets and local variable ranges are only known to the class file
//! writer, so targets that need them carry no payload here.

use nova_types::Span;
use serde::Serialize;

use crate::binder::{AnnotationBinding, BindingRole, TypeSlot, TypeTarget};
use crate::engine::CheckedDeclaration;
use crate::model::{Declaration, ExpressionSite, InvocationKind, QualifiedAnnotationName};
use crate::target::{RetentionPolicy, TargetRegistry};
use crate::type_path::TypePath;

/// `target_info` of a type annotation, tagged by its `target_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetInfo {
    ClassTypeParameter { index: u8 },
    MethodTypeParameter { index: u8 },
    /// `65535` denotes the superclass.
    ClassExtends { index: u16 },
    ClassTypeParameterBound { param: u8, bound: u8 },
    MethodTypeParameterBound { param: u8, bound: u8 },
    Field,
    /// Also used for the type constructed by a constructor.
    MethodReturn,
    MethodReceiver,
    MethodFormalParameter { index: u8 },
    Throws { index: u16 },
    LocalVariable,
    New,
    Cast { type_argument_index: u8 },
    ConstructorInvocationTypeArgument { index: u8 },
    MethodInvocationTypeArgument { index: u8 },
}

impl TargetInfo {
    pub const SUPERCLASS_INDEX: u16 = u16::MAX;

    /// The `target_type` byte (JVMS table 4.7.20-A/B).
    pub const fn target_type(self) -> u8 {
        match self {
            TargetInfo::ClassTypeParameter { .. } => 0x00,
            TargetInfo::MethodTypeParameter { .. } => 0x01,
            TargetInfo::ClassExtends { .. } => 0x10,
            TargetInfo::ClassTypeParameterBound { .. } => 0x11,
            TargetInfo::MethodTypeParameterBound { .. } => 0x12,
            TargetInfo::Field => 0x13,
            TargetInfo::MethodReturn => 0x14,
            TargetInfo::MethodReceiver => 0x15,
            TargetInfo::MethodFormalParameter { .. } => 0x16,
            TargetInfo::Throws { .. } => 0x17,
            TargetInfo::LocalVariable => 0x40,
            TargetInfo::New => 0x44,
            TargetInfo::Cast { .. } => 0x47,
            TargetInfo::ConstructorInvocationTypeArgument { .. } => 0x48,
            TargetInfo::MethodInvocationTypeArgument { .. } => 0x49,
        }
    }
}

/// One `type_annotation` structure, minus element-value pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeAnnotationEntry {
    pub target: TargetInfo,
    pub type_path: TypePath,
    pub annotation: QualifiedAnnotationName,
    /// Source occurrence, for error reporting by the writer.
    pub span: Span,
}

impl TypeAnnotationEntry {
    pub fn target_type(&self) -> u8 {
        self.target.target_type()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationAnnotationEntry {
    pub annotation: QualifiedAnnotationName,
    pub span: Span,
}

/// Annotation attributes for one declaration, split by retention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationAttributes {
    pub runtime_visible_annotations: Vec<DeclarationAnnotationEntry>,
    pub runtime_invisible_annotations: Vec<DeclarationAnnotationEntry>,
    pub runtime_visible_type_annotations: Vec<TypeAnnotationEntry>,
    pub runtime_invisible_type_annotations: Vec<TypeAnnotationEntry>,
}

impl AnnotationAttributes {
    pub fn is_empty(&self) -> bool {
        self.runtime_visible_annotations.is_empty()
            && self.runtime_invisible_annotations.is_empty()
            && self.runtime_visible_type_annotations.is_empty()
            && self.runtime_invisible_type_annotations.is_empty()
    }
}

/// Projects the bindings of `checked` (the result of checking `decl`) onto
/// class-file annotation attributes.
///
/// `SOURCE` annotations are dropped, `CLASS` ones land in the invisible
/// tables and `RUNTIME` ones in the visible tables.
pub fn type_annotation_attributes(
    decl: &Declaration,
    checked: &CheckedDeclaration,
    registry: &dyn TargetRegistry,
) -> AnnotationAttributes {
    let mut out = AnnotationAttributes::default();

    for binding in &checked.bindings {
        let visible = match registry.retention(&binding.annotation) {
            RetentionPolicy::Source => continue,
            RetentionPolicy::Class => false,
            RetentionPolicy::Runtime => true,
        };

        if matches!(binding.role, BindingRole::Declaration | BindingRole::Both) {
            let entry = DeclarationAnnotationEntry {
                annotation: binding.annotation.clone(),
                span: binding.span,
            };
            if visible {
                out.runtime_visible_annotations.push(entry);
            } else {
                out.runtime_invisible_annotations.push(entry);
            }
        }

        if let Some(entry) = type_annotation_entry(decl, binding) {
            if visible {
                out.runtime_visible_type_annotations.push(entry);
            } else {
                out.runtime_invisible_type_annotations.push(entry);
            }
        }
    }

    out
}

fn type_annotation_entry(decl: &Declaration, binding: &AnnotationBinding) -> Option<TypeAnnotationEntry> {
    if binding.role == BindingRole::Declaration {
        return None;
    }
    let TypeTarget {
        slot, type_path, ..
    } = binding.target.as_ref()?;
    Some(TypeAnnotationEntry {
        target: target_info(decl, *slot)?,
        type_path: type_path.clone(),
        annotation: binding.annotation.clone(),
        span: binding.span,
    })
}

fn target_info(decl: &Declaration, slot: TypeSlot) -> Option<TargetInfo> {
    let on_method = matches!(decl, Declaration::Method(_));
    Some(match slot {
        TypeSlot::TypeParameter(index) if on_method => TargetInfo::MethodTypeParameter { index },
        TypeSlot::TypeParameter(index) => TargetInfo::ClassTypeParameter { index },
        TypeSlot::TypeParameterBound { param, bound } if on_method => {
            TargetInfo::MethodTypeParameterBound { param, bound }
        }
        TypeSlot::TypeParameterBound { param, bound } => {
            TargetInfo::ClassTypeParameterBound { param, bound }
        }
        TypeSlot::Superclass => TargetInfo::ClassExtends {
            index: TargetInfo::SUPERCLASS_INDEX,
        },
        TypeSlot::Superinterface(index) => TargetInfo::ClassExtends { index },
        TypeSlot::Field => TargetInfo::Field,
        TypeSlot::Return | TypeSlot::AttributeReturn(_) => TargetInfo::MethodReturn,
        TypeSlot::Receiver => TargetInfo::MethodReceiver,
        TypeSlot::Parameter(index) => TargetInfo::MethodFormalParameter { index },
        TypeSlot::Throws(index) => TargetInfo::Throws { index },
        TypeSlot::LocalVariable => TargetInfo::LocalVariable,
        TypeSlot::New => TargetInfo::New,
        TypeSlot::Cast { member } => TargetInfo::Cast {
            type_argument_index: member,
        },
        TypeSlot::TypeArgument(index) => match decl {
            Declaration::Expression(ExpressionSite::TypeArguments {
                invocation: InvocationKind::Constructor,
                ..
            }) => TargetInfo::ConstructorInvocationTypeArgument { index },
            _ => TargetInfo::MethodInvocationTypeArgument { index },
        },
        // Class literals never carry type annotations.
        TypeSlot::ClassLiteral => return None,
    })
}
