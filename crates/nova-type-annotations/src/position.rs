//! Grammar positions and the static placement table.

use serde::{Deserialize, Serialize};

use crate::target::MetaTarget;

/// Which kind of non-type qualifier segment an annotation sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualifierSegment {
    Package,
    StaticMember,
}

/// The declaration an annotation in modifier position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationContext {
    Type,
    AnnotationType,
    Field,
    Method,
    Constructor,
    Parameter,
    LocalVariable,
    Package,
    AnnotationAttribute,
}

impl DeclarationContext {
    /// The `ElementType` that names this declaration context.
    pub const fn meta_target(self) -> MetaTarget {
        match self {
            DeclarationContext::Type => MetaTarget::Type,
            DeclarationContext::AnnotationType => MetaTarget::AnnotationType,
            DeclarationContext::Field => MetaTarget::Field,
            DeclarationContext::Method | DeclarationContext::AnnotationAttribute => {
                MetaTarget::Method
            }
            DeclarationContext::Constructor => MetaTarget::Constructor,
            DeclarationContext::Parameter => MetaTarget::Parameter,
            DeclarationContext::LocalVariable => MetaTarget::LocalVariable,
            DeclarationContext::Package => MetaTarget::Package,
        }
    }
}

/// Every syntactic slot an annotation can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrammarPosition {
    ClassSuperclass,
    ClassSuperinterface,
    /// On a type parameter declaration (`class X<@A T>`).
    TypeParameterUse,
    TypeParameterBound,
    FieldType,
    MethodReturnType,
    ParameterType,
    ReceiverType,
    ThrowsType,
    LocalVariableType,
    ArrayDimension,
    CastType,
    InstanceCreationType,
    MethodOrCtorTypeArgument,
    WildcardBound,
    /// Argument of a parameterized type (`List<@A String>`).
    TypeArgument,
    /// A qualifier segment to the right of the leftmost one.
    QualifiedNameSegment(QualifierSegment),
    PackageOrImportName,
    AnnotationValueQualifier,
    PostfixQualifiedAccess,
    BinaryOperandQualifier,
    QualifiedThisOrSuperQualifier,
    /// Anywhere in the type of a class literal (`int @A [].class`).
    ClassLiteral,
    /// In a cast, not followed by a type name.
    DanglingCastAnnotation,
    /// Inside the type parameters or return type of a generic annotation
    /// attribute, which the language rejects as a whole.
    GenericAnnotationAttribute,
    /// Among a declaration's modifiers.
    DeclarationModifier(DeclarationContext),
}

/// Result of the placement table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Legal,
    SyntaxIllegal,
}

/// The semantic category a position implies for `@Target` checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionCategory {
    TypeUse,
    TypeParameter,
    Declaration(DeclarationContext),
}

impl GrammarPosition {
    /// Static legality; needs no knowledge of the annotation itself.
    pub const fn placement(self) -> Placement {
        use GrammarPosition::*;

        match self {
            PackageOrImportName
            | BinaryOperandQualifier
            | QualifiedThisOrSuperQualifier
            | AnnotationValueQualifier
            | PostfixQualifiedAccess
            | ClassLiteral
            | DanglingCastAnnotation
            | GenericAnnotationAttribute
            | QualifiedNameSegment(QualifierSegment::Package) => Placement::SyntaxIllegal,

            // Static-member qualifiers are a binding problem, not a syntax one.
            QualifiedNameSegment(QualifierSegment::StaticMember) => Placement::Legal,

            ClassSuperclass
            | ClassSuperinterface
            | TypeParameterUse
            | TypeParameterBound
            | FieldType
            | MethodReturnType
            | ParameterType
            | ReceiverType
            | ThrowsType
            | LocalVariableType
            | ArrayDimension
            | CastType
            | InstanceCreationType
            | MethodOrCtorTypeArgument
            | WildcardBound
            | TypeArgument
            | DeclarationModifier(_) => Placement::Legal,
        }
    }

    pub const fn category(self) -> PositionCategory {
        match self {
            GrammarPosition::TypeParameterUse => PositionCategory::TypeParameter,
            GrammarPosition::DeclarationModifier(context) => PositionCategory::Declaration(context),
            _ => PositionCategory::TypeUse,
        }
    }

    /// Is writing an annotation here JSR 308 syntax (as opposed to a plain
    /// declaration annotation that predates Java 8)?
    pub const fn is_type_annotation_syntax(self) -> bool {
        !matches!(self, GrammarPosition::DeclarationModifier(_))
    }
}
