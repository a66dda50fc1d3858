//! Annotated type references and the declarations that carry them.
//!
//! The model is produced by the parser after name resolution and is never
//! mutated by the engine. Spans are byte offsets into the compilation unit; an
//! [`AnnotationOccurrence`]'s span is its identity within the unit.

use std::fmt;

use nova_types::Span;
use serde::{Deserialize, Serialize};

/// Fully qualified name of an annotation type, e.g. `java.lang.Deprecated`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedAnnotationName(String);

impl QualifiedAnnotationName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last dotted segment, used in messages.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl From<&str> for QualifiedAnnotationName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QualifiedAnnotationName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for QualifiedAnnotationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for QualifiedAnnotationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of resolving the name written after `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationRef {
    Resolved(QualifiedAnnotationName),
    /// The resolver found no annotation type; carries the name as written.
    Unresolved(String),
}

/// One syntactic `@Name(...)` instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationOccurrence {
    pub annotation: AnnotationRef,
    /// Covers `@Name(args)`.
    pub span: Span,
    /// Covers `Name` only.
    pub name_span: Span,
}

impl AnnotationOccurrence {
    pub fn resolved(name: impl Into<QualifiedAnnotationName>, span: Span, name_span: Span) -> Self {
        Self {
            annotation: AnnotationRef::Resolved(name.into()),
            span,
            name_span,
        }
    }

    pub fn unresolved(name: impl Into<String>, span: Span, name_span: Span) -> Self {
        Self {
            annotation: AnnotationRef::Unresolved(name.into()),
            span,
            name_span,
        }
    }

    /// Name as it should appear in messages.
    pub fn display_name(&self) -> &str {
        match &self.annotation {
            AnnotationRef::Resolved(name) => name.simple_name(),
            AnnotationRef::Unresolved(name) => name,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.text, self.span)
    }
}

/// A dotted name that cannot carry annotations (e.g. `Outer.Inner` in
/// `Outer.Inner.this`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChain {
    pub segments: Vec<Ident>,
}

impl NameChain {
    pub fn new(segments: Vec<Ident>) -> Self {
        Self { segments }
    }

    pub fn span(&self) -> Option<Span> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some(first.span.cover(last.span))
    }

    pub fn render(&self) -> String {
        let parts: Vec<&str> = self.segments.iter().map(|s| s.text.as_str()).collect();
        parts.join(".")
    }
}

/// One segment of a package, import or expression name, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSegment {
    pub annotations: Vec<AnnotationOccurrence>,
    pub name: Ident,
}

/// A dotted name whose segments the parser allowed annotations on, even though
/// the language never does (package and import names, expression qualifiers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedName {
    pub segments: Vec<NameSegment>,
}

/// What the qualifier of a [`QualifiedType`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualifierKind {
    /// The qualifier names a package (`java.lang` in `java.lang.String`).
    Package,
    /// The qualifier is a type used only to reach a static member type.
    StaticMember,
    /// The qualifier is an enclosing instance type (`Outer` in `Outer.Inner`
    /// when `Inner` is an inner class).
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match text {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "char" => PrimitiveKind::Char,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveType {
    pub kind: PrimitiveKind,
    pub annotations: Vec<AnnotationOccurrence>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleType {
    pub name: Ident,
    pub annotations: Vec<AnnotationOccurrence>,
}

/// `outer.@annotations name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedType {
    pub outer: Box<TypeRef>,
    pub name: Ident,
    /// Annotations written directly before `name`.
    pub annotations: Vec<AnnotationOccurrence>,
    /// What `outer` denotes.
    pub qualifier_kind: QualifierKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedType {
    pub base: Box<TypeRef>,
    pub arguments: Vec<TypeRef>,
    /// From the start of `base` through the closing `>`.
    pub span: Span,
}

/// One `[]` (or `...` for varargs) with the annotations written before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDimension {
    pub annotations: Vec<AnnotationOccurrence>,
    pub span: Span,
}

impl ArrayDimension {
    pub fn new(annotations: Vec<AnnotationOccurrence>, span: Span) -> Self {
        Self { annotations, span }
    }
}

/// `element dimensions[0] dimensions[1] ...`, outermost dimension first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub element: Box<TypeRef>,
    pub dimensions: Vec<ArrayDimension>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardType {
    pub annotations: Vec<AnnotationOccurrence>,
    pub bound: Option<(BoundKind, Box<TypeRef>)>,
    pub span: Span,
}

/// `A & B & C`, in source order. Only valid as a cast target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionType {
    pub members: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Simple(SimpleType),
    Qualified(QualifiedType),
    Parameterized(ParameterizedType),
    Array(ArrayType),
    Wildcard(WildcardType),
    Intersection(IntersectionType),
}

impl TypeRef {
    pub fn simple(name: Ident, annotations: Vec<AnnotationOccurrence>) -> Self {
        TypeRef::Simple(SimpleType { name, annotations })
    }

    pub fn qualified(
        outer: TypeRef,
        name: Ident,
        annotations: Vec<AnnotationOccurrence>,
        qualifier_kind: QualifierKind,
    ) -> Self {
        TypeRef::Qualified(QualifiedType {
            outer: Box::new(outer),
            name,
            annotations,
            qualifier_kind,
        })
    }

    pub fn parameterized(base: TypeRef, arguments: Vec<TypeRef>, span: Span) -> Self {
        TypeRef::Parameterized(ParameterizedType {
            base: Box::new(base),
            arguments,
            span,
        })
    }

    pub fn primitive(kind: PrimitiveKind, annotations: Vec<AnnotationOccurrence>, span: Span) -> Self {
        TypeRef::Primitive(PrimitiveType {
            kind,
            annotations,
            span,
        })
    }

    pub fn array(element: TypeRef, dimensions: Vec<ArrayDimension>) -> Self {
        TypeRef::Array(ArrayType {
            element: Box::new(element),
            dimensions,
        })
    }

    /// Adds brackets written after a declarator name (`int @A [] x @B []`).
    ///
    /// Declarator brackets denote the outer dimensions, so they go in front of
    /// the dimensions written on the type. The result is the same tree the
    /// all-prefix spelling (`int @B [] @A [] x`) produces.
    #[must_use]
    pub fn with_declarator_dims(self, declarator: Vec<ArrayDimension>) -> TypeRef {
        if declarator.is_empty() {
            return self;
        }
        match self {
            TypeRef::Array(ArrayType {
                element,
                dimensions,
            }) => {
                let mut merged = declarator;
                merged.extend(dimensions);
                TypeRef::Array(ArrayType {
                    element,
                    dimensions: merged,
                })
            }
            other => TypeRef::array(other, declarator),
        }
    }

    /// Source span of the written type, excluding leading annotations.
    pub fn span(&self) -> Span {
        match self {
            TypeRef::Primitive(p) => p.span,
            TypeRef::Simple(s) => s.name.span,
            TypeRef::Qualified(q) => q.outer.span().cover(q.name.span),
            TypeRef::Parameterized(p) => p.span,
            TypeRef::Array(a) => match a.dimensions.iter().map(|d| d.span).max() {
                Some(last) => a.element.span().cover(last),
                None => a.element.span(),
            },
            TypeRef::Wildcard(w) => w.span,
            TypeRef::Intersection(i) => {
                let mut spans = i.members.iter().map(TypeRef::span);
                match spans.next() {
                    Some(first) => spans.fold(first, Span::cover),
                    None => Span::new(0, 0),
                }
            }
        }
    }

    /// Every annotation written anywhere inside this type, in tree order.
    pub fn occurrences(&self) -> Vec<&AnnotationOccurrence> {
        let mut out = Vec::new();
        collect_occurrences(self, &mut out);
        out
    }
}

fn collect_occurrences<'a>(ty: &'a TypeRef, out: &mut Vec<&'a AnnotationOccurrence>) {
    match ty {
        TypeRef::Primitive(p) => out.extend(&p.annotations),
        TypeRef::Simple(s) => out.extend(&s.annotations),
        TypeRef::Qualified(q) => {
            collect_occurrences(&q.outer, out);
            out.extend(&q.annotations);
        }
        TypeRef::Parameterized(p) => {
            collect_occurrences(&p.base, out);
            for arg in &p.arguments {
                collect_occurrences(arg, out);
            }
        }
        TypeRef::Array(a) => {
            collect_occurrences(&a.element, out);
            for dim in &a.dimensions {
                out.extend(&dim.annotations);
            }
        }
        TypeRef::Wildcard(w) => {
            out.extend(&w.annotations);
            if let Some((_, bound)) = &w.bound {
                collect_occurrences(bound, out);
            }
        }
        TypeRef::Intersection(i) => {
            for member in &i.members {
                collect_occurrences(member, out);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKeyword {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Default,
    Synchronized,
    Native,
    Strictfp,
    Transient,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub keyword: ModifierKeyword,
    pub span: Span,
}

impl Modifier {
    pub fn new(keyword: ModifierKeyword, span: Span) -> Self {
        Self { keyword, span }
    }
}

fn has_modifier(modifiers: &[Modifier], keyword: ModifierKeyword) -> bool {
    modifiers.iter().any(|m| m.keyword == keyword)
}

/// `@annotations Name extends bounds[0] & bounds[1] ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub annotations: Vec<AnnotationOccurrence>,
    pub name: Ident,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDeclarationKind {
    Class,
    Interface,
    Enum,
    Record,
    AnnotationType,
}

/// An element declared inside an `@interface` body, e.g. `String value();`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationAttribute {
    pub annotations: Vec<AnnotationOccurrence>,
    /// Always illegal, but the parser keeps them for reporting.
    pub type_params: Vec<TypeParameter>,
    pub return_type: TypeRef,
    pub name: Ident,
}

impl AnnotationAttribute {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// Class, interface, enum, record or annotation type header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub kind: TypeDeclarationKind,
    pub annotations: Vec<AnnotationOccurrence>,
    pub name: Ident,
    pub type_params: Vec<TypeParameter>,
    pub superclass: Option<TypeRef>,
    pub superinterfaces: Vec<TypeRef>,
    /// Elements of an annotation type; empty for other kinds.
    pub attributes: Vec<AnnotationAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub annotations: Vec<AnnotationOccurrence>,
    pub modifiers: Vec<Modifier>,
    /// Declarator brackets already merged, see [`TypeRef::with_declarator_dims`].
    pub ty: TypeRef,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// `void`, with any annotations written between type parameters and `void`.
    Void {
        annotations: Vec<AnnotationOccurrence>,
        span: Span,
    },
    Type(TypeRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub annotations: Vec<AnnotationOccurrence>,
    pub modifiers: Vec<Modifier>,
    /// For varargs the `...` is the outermost dimension of this type.
    pub ty: TypeRef,
    /// Set for `T... name`; `ty` must then be an array type.
    pub varargs: bool,
    pub name: Ident,
}

/// `Type Qualifier.this` written as a formal parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverParameter {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub qualifier: Option<NameChain>,
    pub this_span: Span,
}

impl ReceiverParameter {
    /// `Qualifier.this`, or just `this`.
    pub fn name_span(&self) -> Span {
        match self.qualifier.as_ref().and_then(NameChain::span) {
            Some(q) => q.cover(self.this_span),
            None => self.this_span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormalParameter {
    Regular(Parameter),
    Receiver(ReceiverParameter),
}

/// How a type in the enclosing chain was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeScopeKind {
    TopLevel,
    Member { is_static: bool },
    Local,
    Anonymous,
}

/// One lexically enclosing type of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeScope {
    pub name: String,
    pub type_params: Vec<String>,
    pub kind: TypeScopeKind,
}

impl TypeScope {
    pub fn new(name: impl Into<String>, kind: TypeScopeKind) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            kind,
        }
    }

    #[must_use]
    pub fn with_type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Does this scope start a new qualification chain?
    pub(crate) fn is_chain_root(&self) -> bool {
        !matches!(self.kind, TypeScopeKind::Member { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    pub kind: MethodKind,
    pub annotations: Vec<AnnotationOccurrence>,
    pub modifiers: Vec<Modifier>,
    pub type_params: Vec<TypeParameter>,
    /// `None` for constructors.
    pub return_type: Option<ReturnType>,
    pub name: Ident,
    pub params: Vec<FormalParameter>,
    pub throws: Vec<TypeRef>,
    /// Enclosing types, outermost first; the last one declares this member.
    pub enclosing: Vec<TypeScope>,
}

impl MethodDeclaration {
    pub fn is_static(&self) -> bool {
        has_modifier(&self.modifiers, ModifierKeyword::Static)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalType {
    Explicit(TypeRef),
    /// `var`, with the span of the keyword.
    Var(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableDeclaration {
    pub annotations: Vec<AnnotationOccurrence>,
    pub modifiers: Vec<Modifier>,
    pub ty: LocalType,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDeclaration {
    pub annotations: Vec<AnnotationOccurrence>,
    pub name: AnnotatedName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    pub is_static: bool,
    pub name: AnnotatedName,
}

/// Expression-level name qualifiers that can never be annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameQualifier {
    /// `@A java.lang.Math.PI + 1`
    BinaryOperand,
    /// `Outer.@A Inner.this` / `Outer.@A Inner.super`
    QualifiedThisOrSuper,
    /// `@Ann(@A X.CONST)`
    AnnotationValue,
    /// `@A X.field++`
    PostfixAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    Method,
    Constructor,
}

/// Types and stray annotations appearing inside a method body expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionSite {
    /// `(ty) expr`; `dangling` are annotations the parser found with no type
    /// name following them.
    Cast {
        ty: TypeRef,
        dangling: Vec<AnnotationOccurrence>,
    },
    /// `new ty(...)` or `new ty[...]`.
    InstanceCreation { ty: TypeRef },
    /// Explicit `<...>` on a method or constructor invocation.
    TypeArguments {
        invocation: InvocationKind,
        arguments: Vec<TypeRef>,
    },
    /// `ty.class`
    ClassLiteral { ty: TypeRef },
    QualifiedName {
        qualifier: NameQualifier,
        name: AnnotatedName,
    },
}

/// One unit of work for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Type(TypeDeclaration),
    Field(FieldDeclaration),
    Method(MethodDeclaration),
    Local(LocalVariableDeclaration),
    Package(PackageDeclaration),
    Import(ImportDeclaration),
    Expression(ExpressionSite),
}

impl Declaration {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Declaration::Type(_) => "type",
            Declaration::Field(_) => "field",
            Declaration::Method(m) => match m.kind {
                MethodKind::Method => "method",
                MethodKind::Constructor => "constructor",
            },
            Declaration::Local(_) => "local",
            Declaration::Package(_) => "package",
            Declaration::Import(_) => "import",
            Declaration::Expression(_) => "expression",
        }
    }
}
