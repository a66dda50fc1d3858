//! Explicit receiver parameters (`Outer.this`).

use crate::diagnostics::{Diagnostic, DiagnosticAccumulator, DiagnosticKind, ReceiverMisuse};
use crate::language_level::{JavaFeature, JavaLanguageLevel};
use crate::model::{
    FormalParameter, MethodDeclaration, MethodKind, QualifierKind, ReceiverParameter, TypeRef,
    TypeScope, TypeScopeKind,
};
use crate::placement;

/// Checks every receiver parameter of `method`.
pub fn check(method: &MethodDeclaration, level: JavaLanguageLevel, acc: &mut DiagnosticAccumulator) {
    for (idx, param) in method.params.iter().enumerate() {
        let FormalParameter::Receiver(receiver) = param else {
            continue;
        };

        if !level.supports_receiver_parameters() {
            acc.push(
                Diagnostic::error(
                    DiagnosticKind::FeatureUnavailable(JavaFeature::ReceiverParameters),
                    receiver.this_span,
                )
                .with_arg(level.feature_message(JavaFeature::ReceiverParameters)),
            );
            continue;
        }

        placement::check_receiver_modifiers(receiver, acc);

        if idx != 0 {
            acc.push(misuse(ReceiverMisuse::NotFirstParameter, receiver.this_span));
            continue;
        }

        let Some(target) = receiver_target(method) else {
            acc.push(misuse(ReceiverMisuse::IllegalContext, receiver.this_span));
            continue;
        };

        let expected = expected_chain(&method.enclosing[..=target]);
        if !declared_type_matches(&receiver.ty, expected) {
            acc.push(
                misuse(ReceiverMisuse::DeclaredTypeMismatch, receiver.ty.span())
                    .with_arg(render(expected)),
            );
        }

        check_qualifier(method, receiver, &method.enclosing[target], acc);
    }
}

fn misuse(kind: ReceiverMisuse, span: nova_types::Span) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::ReceiverParameterMisuse(kind), span)
}

/// Index into `method.enclosing` of the type the receiver denotes, or `None`
/// when a receiver is not allowed at all.
///
/// Methods receive the declaring type. Constructors receive the immediately
/// enclosing instance, which only inner classes have.
fn receiver_target(method: &MethodDeclaration) -> Option<usize> {
    let declaring = method.enclosing.last()?;
    match method.kind {
        MethodKind::Method => {
            if method.is_static() || declaring.kind == TypeScopeKind::Anonymous {
                return None;
            }
            Some(method.enclosing.len() - 1)
        }
        MethodKind::Constructor => match declaring.kind {
            TypeScopeKind::TopLevel
            | TypeScopeKind::Anonymous
            | TypeScopeKind::Member { is_static: true } => None,
            TypeScopeKind::Member { is_static: false } | TypeScopeKind::Local => {
                method.enclosing.len().checked_sub(2)
            }
        },
    }
}

/// The scopes a fully qualified reference to the last one spells out: from
/// the nearest top-level, local or anonymous type through the last scope.
fn expected_chain(scopes: &[TypeScope]) -> &[TypeScope] {
    let root = scopes
        .iter()
        .rposition(TypeScope::is_chain_root)
        .unwrap_or(0);
    &scopes[root..]
}

/// Type arguments are only part of the name when the next type is inner.
fn carries_arguments(chain: &[TypeScope], idx: usize) -> bool {
    match chain.get(idx + 1) {
        Some(next) => next.kind != (TypeScopeKind::Member { is_static: true }),
        None => true,
    }
}

/// `Outer<K,V>.Inner<T>`, the way the expected type appears in messages.
fn render(chain: &[TypeScope]) -> String {
    let parts: Vec<String> = chain
        .iter()
        .enumerate()
        .map(|(idx, scope)| {
            if scope.type_params.is_empty() || !carries_arguments(chain, idx) {
                scope.name.clone()
            } else {
                format!("{}<{}>", scope.name, scope.type_params.join(","))
            }
        })
        .collect();
    parts.join(".")
}

struct WrittenSegment<'a> {
    name: &'a str,
    args: Option<&'a [TypeRef]>,
    /// How the segment to the right refers to this one.
    qualifies: QualifierKind,
}

/// Segments of a class type, leftmost first, dropping the package prefix.
fn written_chain(ty: &TypeRef) -> Option<Vec<WrittenSegment<'_>>> {
    fn go<'a>(ty: &'a TypeRef, qualifies: QualifierKind, out: &mut Vec<WrittenSegment<'a>>) -> Option<()> {
        match ty {
            TypeRef::Simple(simple) => {
                out.push(WrittenSegment {
                    name: &simple.name.text,
                    args: None,
                    qualifies,
                });
                Some(())
            }
            TypeRef::Qualified(qualified) => {
                if qualified.qualifier_kind != QualifierKind::Package {
                    go(&qualified.outer, qualified.qualifier_kind, out)?;
                }
                out.push(WrittenSegment {
                    name: &qualified.name.text,
                    args: None,
                    qualifies,
                });
                Some(())
            }
            TypeRef::Parameterized(parameterized) => {
                go(&parameterized.base, qualifies, out)?;
                let last = out.last_mut()?;
                last.args = Some(parameterized.arguments.as_slice());
                Some(())
            }
            _ => None,
        }
    }

    let mut out = Vec::new();
    go(ty, QualifierKind::Type, &mut out)?;
    Some(out)
}

/// The written type must name the expected type with each generic level
/// parameterized by exactly its own type parameters. Leading levels may be
/// left out; a level written raw is a mismatch.
fn declared_type_matches(ty: &TypeRef, expected: &[TypeScope]) -> bool {
    let Some(written) = written_chain(ty) else {
        return false;
    };
    if written.is_empty() || written.len() > expected.len() {
        return false;
    }

    let offset = expected.len() - written.len();
    written.iter().enumerate().all(|(idx, segment)| {
        let scope_idx = offset + idx;
        let scope = &expected[scope_idx];
        if segment.name != scope.name {
            return false;
        }
        if segment.qualifies == QualifierKind::StaticMember || !carries_arguments(expected, scope_idx) {
            return segment.args.map_or(true, <[TypeRef]>::is_empty);
        }
        arguments_match(segment.args, &scope.type_params)
    })
}

fn arguments_match(args: Option<&[TypeRef]>, params: &[String]) -> bool {
    let args = args.unwrap_or(&[]);
    args.len() == params.len()
        && args.iter().zip(params).all(|(arg, param)| match arg {
            TypeRef::Simple(simple) => simple.name.text == *param,
            _ => false,
        })
}

fn check_qualifier(
    method: &MethodDeclaration,
    receiver: &ReceiverParameter,
    target: &TypeScope,
    acc: &mut DiagnosticAccumulator,
) {
    match method.kind {
        MethodKind::Method => {
            if receiver.qualifier.is_some() {
                acc.push(misuse(ReceiverMisuse::MethodQualifier, receiver.name_span()));
            }
        }
        MethodKind::Constructor => {
            let mismatch = match &receiver.qualifier {
                None => Some(receiver.this_span),
                Some(qualifier) => match qualifier.segments.as_slice() {
                    [single] if single.text == target.name => None,
                    _ => Some(receiver.name_span()),
                },
            };
            if let Some(span) = mismatch {
                acc.push(misuse(ReceiverMisuse::QualifierMismatch, span).with_arg(&target.name));
            }
        }
    }
}
