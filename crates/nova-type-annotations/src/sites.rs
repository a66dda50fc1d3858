//! Collects every annotation occurrence of a declaration together with its
//! grammar position and binding context.
//!
//! This is also where the input contract is enforced: shapes the parser can
//! never produce for valid or invalid Java are reported as
//! [`EngineError::MalformedInput`].

use nova_types::Span;

use crate::binder::{Locus, SegmentRole, TypeSlot, TypeTarget};
use crate::error::EngineError;
use crate::model::{
    AnnotatedName, AnnotationOccurrence, Declaration, ExpressionSite, FormalParameter, Ident,
    LocalType, MethodDeclaration, MethodKind, NameQualifier, QualifierKind, ReturnType,
    TypeDeclaration, TypeDeclarationKind, TypeParameter, TypeRef,
};
use crate::position::{DeclarationContext, GrammarPosition, QualifierSegment};
use crate::target_check::DeclaredType;
use crate::type_path::{NodePath, NodeStep, TypePath, TypePathEntry};

#[derive(Debug, Clone)]
pub(crate) struct Site<'a> {
    pub occurrence: &'a AnnotationOccurrence,
    pub position: GrammarPosition,
    pub declared: DeclaredType,
    pub locus: Locus,
    /// Key for merging adjacent rejections (the segment written on).
    pub group: Option<Span>,
}

pub(crate) fn collect(decl: &Declaration) -> Result<Vec<Site<'_>>, EngineError> {
    let mut collector = Collector { sites: Vec::new() };
    collector.declaration(decl)?;
    Ok(collector.sites)
}

#[derive(Debug, Clone)]
struct WalkCx {
    slot: TypeSlot,
    position: GrammarPosition,
    /// Overrides every position inside the walked type.
    force: Option<GrammarPosition>,
    node: NodePath,
    type_path: TypePath,
    in_argument: bool,
}

impl WalkCx {
    fn new(slot: TypeSlot, position: GrammarPosition, force: Option<GrammarPosition>) -> Self {
        Self {
            slot,
            position,
            force,
            node: NodePath::root(),
            type_path: TypePath::root(),
            in_argument: false,
        }
    }

    fn position(&self, position: GrammarPosition) -> GrammarPosition {
        self.force.unwrap_or(position)
    }

    fn target(
        &self,
        node: NodePath,
        type_path: TypePath,
        span: Span,
    ) -> Result<TypeTarget, EngineError> {
        if type_path.len() > TypePath::MAX_LEN {
            return Err(EngineError::malformed("type path exceeds class file limits", span));
        }
        Ok(TypeTarget {
            slot: self.slot,
            node,
            type_path,
        })
    }
}

/// One name segment of a class type, leftmost first.
struct Segment<'a> {
    ident: &'a Ident,
    annotations: &'a [AnnotationOccurrence],
    node: NodePath,
    /// What this segment denotes.
    role: QualifierKind,
    args: Option<(&'a [TypeRef], NodePath)>,
}

struct Collector<'a> {
    sites: Vec<Site<'a>>,
}

impl<'a> Collector<'a> {
    fn declaration(&mut self, decl: &'a Declaration) -> Result<(), EngineError> {
        match decl {
            Declaration::Type(t) => self.type_declaration(t),
            Declaration::Field(f) => {
                check_ident(&f.name)?;
                let ty = leading_target(&f.ty, TypeSlot::Field);
                self.modifiers(
                    &f.annotations,
                    DeclarationContext::Field,
                    DeclaredType::Present,
                    Locus::Modifier { ty },
                );
                self.type_ref(&f.ty, TypeSlot::Field, GrammarPosition::FieldType, None)
            }
            Declaration::Method(m) => self.method(m),
            Declaration::Local(l) => {
                check_ident(&l.name)?;
                match &l.ty {
                    LocalType::Var(_) => {
                        self.modifiers(
                            &l.annotations,
                            DeclarationContext::LocalVariable,
                            DeclaredType::Var,
                            Locus::Modifier { ty: None },
                        );
                        Ok(())
                    }
                    LocalType::Explicit(ty) => {
                        let target = leading_target(ty, TypeSlot::LocalVariable);
                        self.modifiers(
                            &l.annotations,
                            DeclarationContext::LocalVariable,
                            DeclaredType::Present,
                            Locus::Modifier { ty: target },
                        );
                        self.type_ref(
                            ty,
                            TypeSlot::LocalVariable,
                            GrammarPosition::LocalVariableType,
                            None,
                        )
                    }
                }
            }
            Declaration::Package(p) => {
                self.modifiers(
                    &p.annotations,
                    DeclarationContext::Package,
                    DeclaredType::Absent,
                    Locus::Declaration,
                );
                self.annotated_name(&p.name, GrammarPosition::PackageOrImportName)
            }
            Declaration::Import(i) => {
                self.annotated_name(&i.name, GrammarPosition::PackageOrImportName)
            }
            Declaration::Expression(e) => self.expression(e),
        }
    }

    fn type_declaration(&mut self, t: &'a TypeDeclaration) -> Result<(), EngineError> {
        check_ident(&t.name)?;
        let context = match t.kind {
            TypeDeclarationKind::AnnotationType => DeclarationContext::AnnotationType,
            _ => DeclarationContext::Type,
        };
        self.modifiers(&t.annotations, context, DeclaredType::Absent, Locus::Declaration);
        self.type_parameters(&t.type_params, None)?;

        if let Some(superclass) = &t.superclass {
            self.type_ref(
                superclass,
                TypeSlot::Superclass,
                GrammarPosition::ClassSuperclass,
                None,
            )?;
        }
        for (idx, interface) in t.superinterfaces.iter().enumerate() {
            let idx = index_u16(idx, interface.span())?;
            self.type_ref(
                interface,
                TypeSlot::Superinterface(idx),
                GrammarPosition::ClassSuperinterface,
                None,
            )?;
        }

        for (idx, attribute) in t.attributes.iter().enumerate() {
            check_ident(&attribute.name)?;
            let slot = TypeSlot::AttributeReturn(index_u16(idx, attribute.name.span)?);
            let ty = leading_target(&attribute.return_type, slot);
            self.modifiers(
                &attribute.annotations,
                DeclarationContext::AnnotationAttribute,
                DeclaredType::Present,
                Locus::Modifier { ty },
            );
            let force = attribute
                .is_generic()
                .then_some(GrammarPosition::GenericAnnotationAttribute);
            self.type_parameters(&attribute.type_params, force)?;
            self.type_ref(
                &attribute.return_type,
                slot,
                GrammarPosition::MethodReturnType,
                force,
            )?;
        }
        Ok(())
    }

    fn method(&mut self, m: &'a MethodDeclaration) -> Result<(), EngineError> {
        check_ident(&m.name)?;
        match (m.kind, &m.return_type) {
            (MethodKind::Constructor, None) => {
                let ty = Some((TypeTarget::root(TypeSlot::Return), SegmentRole::Type));
                self.modifiers(
                    &m.annotations,
                    DeclarationContext::Constructor,
                    DeclaredType::Present,
                    Locus::Modifier { ty },
                );
                self.type_parameters(&m.type_params, None)?;
            }
            (MethodKind::Method, Some(ReturnType::Void { annotations, .. })) => {
                self.modifiers(
                    &m.annotations,
                    DeclarationContext::Method,
                    DeclaredType::Void,
                    Locus::Modifier { ty: None },
                );
                self.type_parameters(&m.type_params, None)?;
                let locus = Locus::Node {
                    target: TypeTarget::root(TypeSlot::Return),
                    role: SegmentRole::Type,
                };
                for occurrence in annotations {
                    self.sites.push(Site {
                        occurrence,
                        position: GrammarPosition::MethodReturnType,
                        declared: DeclaredType::Void,
                        locus: locus.clone(),
                        group: None,
                    });
                }
            }
            (MethodKind::Method, Some(ReturnType::Type(ty))) => {
                let target = leading_target(ty, TypeSlot::Return);
                self.modifiers(
                    &m.annotations,
                    DeclarationContext::Method,
                    DeclaredType::Present,
                    Locus::Modifier { ty: target },
                );
                self.type_parameters(&m.type_params, None)?;
                self.type_ref(ty, TypeSlot::Return, GrammarPosition::MethodReturnType, None)?;
            }
            (MethodKind::Method, None) => {
                return Err(EngineError::malformed("method without a return type", m.name.span));
            }
            (MethodKind::Constructor, Some(_)) => {
                return Err(EngineError::malformed("constructor with a return type", m.name.span));
            }
        }

        let mut regular = 0usize;
        for param in &m.params {
            match param {
                FormalParameter::Regular(p) => {
                    check_ident(&p.name)?;
                    if p.varargs && !matches!(p.ty, TypeRef::Array(_)) {
                        return Err(EngineError::malformed(
                            "varargs parameter without an array type",
                            p.ty.span(),
                        ));
                    }
                    let slot = TypeSlot::Parameter(index_u8(regular, p.name.span)?);
                    let ty = leading_target(&p.ty, slot);
                    self.modifiers(
                        &p.annotations,
                        DeclarationContext::Parameter,
                        DeclaredType::Present,
                        Locus::Modifier { ty },
                    );
                    self.type_ref(&p.ty, slot, GrammarPosition::ParameterType, None)?;
                    regular += 1;
                }
                FormalParameter::Receiver(r) => {
                    if let Some(qualifier) = &r.qualifier {
                        if qualifier.segments.is_empty() {
                            return Err(EngineError::malformed("empty receiver qualifier", r.this_span));
                        }
                    }
                    self.type_ref(&r.ty, TypeSlot::Receiver, GrammarPosition::ReceiverType, None)?;
                }
            }
        }

        for (idx, thrown) in m.throws.iter().enumerate() {
            let idx = index_u16(idx, thrown.span())?;
            self.type_ref(thrown, TypeSlot::Throws(idx), GrammarPosition::ThrowsType, None)?;
        }
        Ok(())
    }

    fn expression(&mut self, e: &'a ExpressionSite) -> Result<(), EngineError> {
        match e {
            ExpressionSite::Cast { ty, dangling } => {
                match ty {
                    TypeRef::Intersection(intersection) => {
                        if intersection.members.is_empty() {
                            return Err(EngineError::malformed("empty intersection type", ty.span()));
                        }
                        for (idx, member) in intersection.members.iter().enumerate() {
                            let member_idx = index_u8(idx, member.span())?;
                            self.type_ref(
                                member,
                                TypeSlot::Cast { member: member_idx },
                                GrammarPosition::CastType,
                                None,
                            )?;
                        }
                    }
                    other => {
                        self.type_ref(
                            other,
                            TypeSlot::Cast { member: 0 },
                            GrammarPosition::CastType,
                            None,
                        )?;
                    }
                }

                let group = dangling
                    .iter()
                    .map(|occ| occ.span)
                    .reduce(Span::cover);
                let locus = Locus::Node {
                    target: TypeTarget::root(TypeSlot::Cast { member: 0 }),
                    role: SegmentRole::Type,
                };
                for occurrence in dangling {
                    self.sites.push(Site {
                        occurrence,
                        position: GrammarPosition::DanglingCastAnnotation,
                        declared: DeclaredType::Present,
                        locus: locus.clone(),
                        group,
                    });
                }
                Ok(())
            }
            ExpressionSite::InstanceCreation { ty } => self.type_ref(
                ty,
                TypeSlot::New,
                GrammarPosition::InstanceCreationType,
                None,
            ),
            ExpressionSite::TypeArguments { arguments, .. } => {
                for (idx, argument) in arguments.iter().enumerate() {
                    let idx = index_u8(idx, argument.span())?;
                    self.type_ref(
                        argument,
                        TypeSlot::TypeArgument(idx),
                        GrammarPosition::MethodOrCtorTypeArgument,
                        None,
                    )?;
                }
                Ok(())
            }
            ExpressionSite::ClassLiteral { ty } => self.type_ref(
                ty,
                TypeSlot::ClassLiteral,
                GrammarPosition::ClassLiteral,
                Some(GrammarPosition::ClassLiteral),
            ),
            ExpressionSite::QualifiedName { qualifier, name } => {
                let position = match qualifier {
                    NameQualifier::BinaryOperand => GrammarPosition::BinaryOperandQualifier,
                    NameQualifier::QualifiedThisOrSuper => {
                        GrammarPosition::QualifiedThisOrSuperQualifier
                    }
                    NameQualifier::AnnotationValue => GrammarPosition::AnnotationValueQualifier,
                    NameQualifier::PostfixAccess => GrammarPosition::PostfixQualifiedAccess,
                };
                self.annotated_name(name, position)
            }
        }
    }

    fn modifiers(
        &mut self,
        annotations: &'a [AnnotationOccurrence],
        context: DeclarationContext,
        declared: DeclaredType,
        locus: Locus,
    ) {
        for occurrence in annotations {
            self.sites.push(Site {
                occurrence,
                position: GrammarPosition::DeclarationModifier(context),
                declared,
                locus: locus.clone(),
                group: None,
            });
        }
    }

    fn type_parameters(
        &mut self,
        params: &'a [TypeParameter],
        force: Option<GrammarPosition>,
    ) -> Result<(), EngineError> {
        for (idx, param) in params.iter().enumerate() {
            check_ident(&param.name)?;
            let param_idx = index_u8(idx, param.name.span)?;
            let locus = Locus::Node {
                target: TypeTarget::root(TypeSlot::TypeParameter(param_idx)),
                role: SegmentRole::Type,
            };
            let position = force.unwrap_or(GrammarPosition::TypeParameterUse);
            for occurrence in &param.annotations {
                self.sites.push(Site {
                    occurrence,
                    position,
                    declared: DeclaredType::Present,
                    locus: locus.clone(),
                    group: Some(param.name.span),
                });
            }

            for (bound_idx, bound) in param.bounds.iter().enumerate() {
                let slot = TypeSlot::TypeParameterBound {
                    param: param_idx,
                    bound: index_u8(bound_idx, bound.span())?,
                };
                self.type_ref(bound, slot, GrammarPosition::TypeParameterBound, force)?;
            }
        }
        Ok(())
    }

    fn annotated_name(
        &mut self,
        name: &'a AnnotatedName,
        position: GrammarPosition,
    ) -> Result<(), EngineError> {
        if name.segments.is_empty() {
            return Err(EngineError::malformed("empty name", Span::new(0, 0)));
        }
        for segment in &name.segments {
            check_ident(&segment.name)?;
            for occurrence in &segment.annotations {
                self.sites.push(Site {
                    occurrence,
                    position,
                    declared: DeclaredType::Present,
                    locus: Locus::Declaration,
                    group: Some(segment.name.span),
                });
            }
        }
        Ok(())
    }

    fn type_ref(
        &mut self,
        ty: &'a TypeRef,
        slot: TypeSlot,
        position: GrammarPosition,
        force: Option<GrammarPosition>,
    ) -> Result<(), EngineError> {
        self.walk(ty, &WalkCx::new(slot, position, force))
    }

    fn walk(&mut self, ty: &'a TypeRef, cx: &WalkCx) -> Result<(), EngineError> {
        match ty {
            TypeRef::Primitive(p) => {
                let target = cx.target(cx.node.clone(), cx.type_path.clone(), p.span)?;
                self.node_annotations(
                    &p.annotations,
                    cx.position(cx.position),
                    target,
                    SegmentRole::Type,
                    Some(p.span),
                );
                Ok(())
            }
            TypeRef::Array(array) => {
                let count = array.dimensions.len();
                if count == 0 {
                    return Err(EngineError::malformed(
                        "array type without dimensions",
                        array.element.span(),
                    ));
                }

                let element = WalkCx {
                    node: cx.node.child(NodeStep::Element),
                    type_path: cx.type_path.then_n(TypePathEntry::ARRAY, count),
                    in_argument: false,
                    ..cx.clone()
                };
                self.walk(&array.element, &element)?;

                for (idx, dimension) in array.dimensions.iter().enumerate() {
                    let node = cx.node.child(NodeStep::Dimension(index_u8(idx, dimension.span)?));
                    let target =
                        cx.target(node, cx.type_path.then_n(TypePathEntry::ARRAY, idx), dimension.span)?;
                    self.node_annotations(
                        &dimension.annotations,
                        cx.position(GrammarPosition::ArrayDimension),
                        target,
                        SegmentRole::Type,
                        Some(dimension.span),
                    );
                }
                Ok(())
            }
            TypeRef::Wildcard(wildcard) => {
                if !cx.in_argument {
                    return Err(EngineError::malformed(
                        "wildcard outside a type argument list",
                        wildcard.span,
                    ));
                }
                let target = cx.target(cx.node.clone(), cx.type_path.clone(), wildcard.span)?;
                self.node_annotations(
                    &wildcard.annotations,
                    cx.position(GrammarPosition::WildcardBound),
                    target,
                    SegmentRole::Type,
                    Some(wildcard.span),
                );
                if let Some((_, bound)) = &wildcard.bound {
                    let bound_cx = WalkCx {
                        position: GrammarPosition::WildcardBound,
                        node: cx.node.child(NodeStep::Bound),
                        type_path: cx.type_path.then(TypePathEntry::WILDCARD_BOUND),
                        in_argument: false,
                        ..cx.clone()
                    };
                    self.walk(bound, &bound_cx)?;
                }
                Ok(())
            }
            TypeRef::Intersection(_) => Err(EngineError::malformed(
                "intersection type outside a cast",
                ty.span(),
            )),
            TypeRef::Simple(_) | TypeRef::Qualified(_) | TypeRef::Parameterized(_) => {
                self.class_type(ty, cx)
            }
        }
    }

    fn class_type(&mut self, ty: &'a TypeRef, cx: &WalkCx) -> Result<(), EngineError> {
        let mut segments = Vec::new();
        flatten(ty, cx.node.clone(), QualifierKind::Type, &mut segments)?;

        let mut seen_type = false;
        for segment in &segments {
            if segment.role == QualifierKind::Package {
                if seen_type {
                    return Err(EngineError::malformed(
                        "package qualifier to the right of a type",
                        segment.ident.span,
                    ));
                }
                if segment.args.is_some() {
                    return Err(EngineError::malformed(
                        "type arguments on a package name",
                        segment.ident.span,
                    ));
                }
            } else {
                seen_type = true;
            }
        }

        // Only enclosing instance types contribute INNER_TYPE steps.
        let mut depth = 0usize;
        for (idx, segment) in segments.iter().enumerate() {
            let type_path = cx.type_path.then_n(TypePathEntry::INNER_TYPE, depth);
            let (position, role) = match segment.role {
                QualifierKind::Package if idx == 0 => (cx.position, SegmentRole::LeadingPackage),
                QualifierKind::Package => (
                    GrammarPosition::QualifiedNameSegment(QualifierSegment::Package),
                    SegmentRole::LeadingPackage,
                ),
                QualifierKind::StaticMember => (
                    GrammarPosition::QualifiedNameSegment(QualifierSegment::StaticMember),
                    SegmentRole::StaticMember,
                ),
                QualifierKind::Type => (cx.position, SegmentRole::Type),
            };
            let target = cx.target(segment.node.clone(), type_path.clone(), segment.ident.span)?;
            self.node_annotations(
                segment.annotations,
                cx.position(position),
                target,
                role,
                Some(segment.ident.span),
            );

            if let Some((args, args_node)) = segment.args.clone() {
                for (arg_idx, arg) in args.iter().enumerate() {
                    let arg_idx = index_u8(arg_idx, arg.span())?;
                    let arg_cx = WalkCx {
                        position: GrammarPosition::TypeArgument,
                        node: args_node.child(NodeStep::Argument(arg_idx)),
                        type_path: type_path.then(TypePathEntry::type_argument(arg_idx)),
                        in_argument: true,
                        ..cx.clone()
                    };
                    self.walk(arg, &arg_cx)?;
                }
            }

            if segment.role == QualifierKind::Type {
                depth += 1;
            }
        }
        Ok(())
    }

    fn node_annotations(
        &mut self,
        annotations: &'a [AnnotationOccurrence],
        position: GrammarPosition,
        target: TypeTarget,
        role: SegmentRole,
        group: Option<Span>,
    ) {
        for occurrence in annotations {
            self.sites.push(Site {
                occurrence,
                position,
                declared: DeclaredType::Present,
                locus: Locus::Node {
                    target: target.clone(),
                    role,
                },
                group,
            });
        }
    }
}

fn flatten<'a>(
    ty: &'a TypeRef,
    node: NodePath,
    role: QualifierKind,
    out: &mut Vec<Segment<'a>>,
) -> Result<(), EngineError> {
    match ty {
        TypeRef::Simple(simple) => {
            check_ident(&simple.name)?;
            out.push(Segment {
                ident: &simple.name,
                annotations: &simple.annotations,
                node,
                role,
                args: None,
            });
            Ok(())
        }
        TypeRef::Qualified(qualified) => {
            check_ident(&qualified.name)?;
            flatten(
                &qualified.outer,
                node.child(NodeStep::Outer),
                qualified.qualifier_kind,
                out,
            )?;
            out.push(Segment {
                ident: &qualified.name,
                annotations: &qualified.annotations,
                node,
                role,
                args: None,
            });
            Ok(())
        }
        TypeRef::Parameterized(parameterized) => {
            if !matches!(
                parameterized.base.as_ref(),
                TypeRef::Simple(_) | TypeRef::Qualified(_)
            ) {
                return Err(EngineError::malformed(
                    "type arguments on a non-class type",
                    parameterized.span,
                ));
            }
            flatten(&parameterized.base, node.child(NodeStep::Base), role, out)?;
            match out.last_mut() {
                Some(last) if last.args.is_none() => {
                    last.args = Some((parameterized.arguments.as_slice(), node));
                    Ok(())
                }
                _ => Err(EngineError::malformed(
                    "repeated type argument list",
                    parameterized.span,
                )),
            }
        }
        other => Err(EngineError::malformed(
            "array, primitive or wildcard used as a type qualifier",
            other.span(),
        )),
    }
}

/// The node a modifier annotation would annotate as a type annotation: the
/// leftmost name of the innermost element type.
fn leading_target(ty: &TypeRef, slot: TypeSlot) -> Option<(TypeTarget, SegmentRole)> {
    let mut node = NodePath::root();
    let mut type_path = TypePath::root();
    let mut role = QualifierKind::Type;
    let mut current = ty;

    loop {
        match current {
            TypeRef::Array(array) => {
                node = node.child(NodeStep::Element);
                type_path = type_path.then_n(TypePathEntry::ARRAY, array.dimensions.len());
                current = &array.element;
            }
            TypeRef::Parameterized(parameterized) => {
                node = node.child(NodeStep::Base);
                current = &parameterized.base;
            }
            TypeRef::Qualified(qualified) => {
                node = node.child(NodeStep::Outer);
                role = qualified.qualifier_kind;
                current = &qualified.outer;
            }
            TypeRef::Simple(_) | TypeRef::Primitive(_) => break,
            TypeRef::Wildcard(_) | TypeRef::Intersection(_) => return None,
        }
    }

    let role = match role {
        QualifierKind::Package => SegmentRole::LeadingPackage,
        QualifierKind::StaticMember => SegmentRole::StaticMember,
        QualifierKind::Type => SegmentRole::Type,
    };
    Some((
        TypeTarget {
            slot,
            node,
            type_path,
        },
        role,
    ))
}

fn check_ident(ident: &Ident) -> Result<(), EngineError> {
    if ident.text.is_empty() {
        return Err(EngineError::malformed("empty name", ident.span));
    }
    Ok(())
}

fn index_u8(idx: usize, span: Span) -> Result<u8, EngineError> {
    u8::try_from(idx).map_err(|_| EngineError::malformed("index exceeds class file limits", span))
}

fn index_u16(idx: usize, span: Span) -> Result<u16, EngineError> {
    u16::try_from(idx).map_err(|_| EngineError::malformed("index exceeds class file limits", span))
}
