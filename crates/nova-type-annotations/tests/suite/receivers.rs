use nova_type_annotations::{
    AnnotationTypeTable, Declaration, DiagnosticKind, FormalParameter, JavaFeature,
    JavaLanguageLevel, MetaTarget, Modifier, ModifierKeyword, ReceiverMisuse, ReceiverParameter,
    TypePathEntry, TypeScope, TypeScopeKind, TypeSlot,
};
use pretty_assertions::assert_eq;

use super::support::{constructor, kinds_and_spans, method, void, Fixture};

const INNER: TypeScopeKind = TypeScopeKind::Member { is_static: false };

fn misuse(kind: ReceiverMisuse) -> DiagnosticKind {
    DiagnosticKind::ReceiverParameterMisuse(kind)
}

/// `Outer.Inner<K,V>.InnerMost<T>`
fn nested_generics() -> Vec<TypeScope> {
    vec![
        TypeScope::new("Outer", TypeScopeKind::TopLevel),
        TypeScope::new("Inner", INNER).with_type_params(["K", "V"]),
        TypeScope::new("InnerMost", INNER).with_type_params(["T"]),
    ]
}

/// `ty qualifier.this` (or `ty this`), the first occurrence of `ty` in the text.
fn receiver(f: &Fixture, ty: &str, qualifier: Option<&str>) -> FormalParameter {
    FormalParameter::Receiver(ReceiverParameter {
        modifiers: Vec::new(),
        ty: f.ty(ty),
        qualifier: qualifier.map(|q| f.chain_at(f.after(ty, q))),
        this_span: f.span("this"),
    })
}

fn method_with_receiver(f: &Fixture, ty: &str, enclosing: Vec<TypeScope>) -> Declaration {
    let mut decl = method(f.ident("m"), void(f.span("void")), enclosing);
    decl.params = vec![receiver(f, ty, None)];
    Declaration::Method(decl)
}

#[test]
fn declared_type_may_drop_leading_levels() {
    for ty in [
        "InnerMost<T>",
        "Inner<K,V>.InnerMost<T>",
        "Outer.Inner<K,V>.InnerMost<T>",
    ] {
        let f = Fixture::new(&format!("void m({ty} this) {{}}"), AnnotationTypeTable::new());
        let checked = f.check(&method_with_receiver(&f, ty, nested_generics()));
        assert!(checked.diagnostics.is_empty(), "{ty}: {:?}", checked.diagnostics);
    }
}

#[test]
fn raw_enclosing_level_is_a_mismatch() {
    let ty = "Inner.InnerMost<T>";
    let f = Fixture::new(&format!("void m({ty} this) {{}}"), AnnotationTypeTable::new());
    let checked = f.check(&method_with_receiver(&f, ty, nested_generics()));

    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(misuse(ReceiverMisuse::DeclaredTypeMismatch), f.span(ty))]
    );
    assert_eq!(
        checked.diagnostics[0].message(),
        "The declared type of the explicit 'this' parameter is expected to be Outer.Inner<K,V>.InnerMost<T>"
    );
}

#[test]
fn raw_declaring_type_is_a_mismatch() {
    let f = Fixture::new("void m(InnerMost this) {}", AnnotationTypeTable::new());
    let checked = f.check(&method_with_receiver(&f, "InnerMost", nested_generics()));
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(misuse(ReceiverMisuse::DeclaredTypeMismatch), f.span("InnerMost"))]
    );
}

#[test]
fn static_member_levels_take_no_arguments() {
    let enclosing = vec![
        TypeScope::new("Outer", TypeScopeKind::TopLevel).with_type_params(["K"]),
        TypeScope::new("Nested", TypeScopeKind::Member { is_static: true }),
    ];

    let f = Fixture::new("void m(Outer.Nested this) {}", AnnotationTypeTable::new())
        .static_qualifiers(&["Outer"]);
    let checked = f.check(&method_with_receiver(&f, "Outer.Nested", enclosing.clone()));
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);

    let f = Fixture::new("void m(Outer<K>.Nested this) {}", AnnotationTypeTable::new())
        .static_qualifiers(&["Outer"]);
    let checked = f.check(&method_with_receiver(&f, "Outer<K>.Nested", enclosing));
    assert_eq!(checked.diagnostics.len(), 1);
    assert_eq!(checked.diagnostics[0].args, vec!["Outer.Nested".to_string()]);
}

#[test]
fn receiver_type_annotations_bind_to_the_receiver_slot() {
    let ty = "Outer.@A Inner<K,V>.InnerMost<T>";
    let table = AnnotationTypeTable::new().with_targets("A", [MetaTarget::TypeUse]);
    let f = Fixture::new(&format!("void m({ty} this) {{}}"), table);
    let checked = f.check(&method_with_receiver(&f, ty, nested_generics()));

    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
    let target = checked
        .binding_for(f.span("@A"))
        .and_then(|b| b.target.as_ref())
        .expect("receiver binding");
    assert_eq!(target.slot, TypeSlot::Receiver);
    assert_eq!(target.type_path.entries(), &[TypePathEntry::INNER_TYPE]);
}

#[test]
fn static_method_cannot_declare_a_receiver() {
    let f = Fixture::new("static void m(X this) {}", AnnotationTypeTable::new());
    let mut decl = method(
        f.ident("m"),
        void(f.span("void")),
        vec![TypeScope::new("X", TypeScopeKind::TopLevel)],
    );
    decl.modifiers = vec![Modifier::new(ModifierKeyword::Static, f.span("static"))];
    decl.params = vec![receiver(&f, "X", None)];

    let checked = f.check(&Declaration::Method(decl));
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(misuse(ReceiverMisuse::IllegalContext), f.span("this"))]
    );
}

#[test]
fn anonymous_class_method_cannot_declare_a_receiver() {
    let f = Fixture::new("void m(Object this) {}", AnnotationTypeTable::new());
    let enclosing = vec![
        TypeScope::new("Outer", TypeScopeKind::TopLevel),
        TypeScope::new("", TypeScopeKind::Anonymous),
    ];
    let checked = f.check(&method_with_receiver(&f, "Object", enclosing));
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(misuse(ReceiverMisuse::IllegalContext), f.span("this"))]
    );
}

#[test]
fn top_level_constructor_has_no_enclosing_instance() {
    let f = Fixture::new("Outer(X this) {}", AnnotationTypeTable::new());
    let mut decl = constructor(
        f.ident("Outer"),
        vec![TypeScope::new("Outer", TypeScopeKind::TopLevel)],
    );
    decl.params = vec![receiver(&f, "X", None)];

    let checked = f.check(&Declaration::Method(decl));
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(misuse(ReceiverMisuse::IllegalContext), f.span("this"))]
    );
}

fn inner_constructor(text: &str, qualifier: Option<&str>) -> (Fixture, Declaration) {
    let f = Fixture::new(text, AnnotationTypeTable::new());
    let mut decl = constructor(
        f.ident("Inner"),
        vec![
            TypeScope::new("Outer", TypeScopeKind::TopLevel),
            TypeScope::new("Inner", INNER),
        ],
    );
    decl.params = vec![receiver(&f, "Outer", qualifier)];
    (f, Declaration::Method(decl))
}

#[test]
fn inner_constructor_receives_the_enclosing_instance() {
    let (f, decl) = inner_constructor("Inner(Outer Outer.this) {}", Some("Outer"));
    let checked = f.check(&decl);
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
}

#[test]
fn inner_constructor_receiver_must_be_qualified() {
    let (f, decl) = inner_constructor("Inner(Outer this) {}", None);
    let checked = f.check(&decl);
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(misuse(ReceiverMisuse::QualifierMismatch), f.span("this"))]
    );
    assert_eq!(
        checked.diagnostics[0].message(),
        "The explicit 'this' parameter is expected to be qualified with Outer"
    );
}

#[test]
fn inner_constructor_receiver_qualified_with_the_wrong_name() {
    let (f, decl) = inner_constructor("Inner(Outer Inner.this) {}", Some("Inner"));
    let checked = f.check(&decl);
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(
            misuse(ReceiverMisuse::QualifierMismatch),
            f.after("Outer", "Inner.this")
        )]
    );
}

#[test]
fn local_class_constructor_receives_the_enclosing_instance() {
    let f = Fixture::new("Local(Outer Outer.this) {}", AnnotationTypeTable::new());
    let mut decl = constructor(
        f.ident("Local"),
        vec![
            TypeScope::new("Outer", TypeScopeKind::TopLevel),
            TypeScope::new("Local", TypeScopeKind::Local),
        ],
    );
    decl.params = vec![receiver(&f, "Outer", Some("Outer"))];
    let checked = f.check(&Declaration::Method(decl));
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
}

#[test]
fn method_receiver_cannot_be_qualified() {
    let f = Fixture::new("void m(Inner Inner.this) {}", AnnotationTypeTable::new());
    let mut decl = method(
        f.ident("m"),
        void(f.span("void")),
        vec![
            TypeScope::new("Outer", TypeScopeKind::TopLevel),
            TypeScope::new("Inner", INNER),
        ],
    );
    decl.params = vec![receiver(&f, "Inner", Some("Inner"))];

    let checked = f.check(&Declaration::Method(decl));
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(
            misuse(ReceiverMisuse::MethodQualifier),
            f.after("Inner", "Inner.this")
        )]
    );
}

#[test]
fn receiver_modifiers_are_a_syntax_error() {
    let f = Fixture::new("void m(final X this) {}", AnnotationTypeTable::new());
    let mut decl = method(
        f.ident("m"),
        void(f.span("void")),
        vec![TypeScope::new("X", TypeScopeKind::TopLevel)],
    );
    decl.params = vec![FormalParameter::Receiver(ReceiverParameter {
        modifiers: vec![Modifier::new(ModifierKeyword::Final, f.span("final"))],
        ty: f.ty("X"),
        qualifier: None,
        this_span: f.span("this"),
    })];

    let checked = f.check(&Declaration::Method(decl));
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(DiagnosticKind::SyntaxIllegalPosition, f.span("final"))]
    );
    assert_eq!(
        checked.diagnostics[0].message(),
        "Syntax error, modifiers are not allowed here"
    );
}

#[test]
fn receivers_need_java_8() {
    let f = Fixture::new("void m(X this) {}", AnnotationTypeTable::new());
    let decl = method_with_receiver(&f, "X", vec![TypeScope::new("X", TypeScopeKind::TopLevel)]);

    let checked = f.check_at(&decl, JavaLanguageLevel::JAVA_7);
    assert_eq!(
        kinds_and_spans(&checked.diagnostics),
        vec![(
            DiagnosticKind::FeatureUnavailable(JavaFeature::ReceiverParameters),
            f.span("this")
        )]
    );
    assert_eq!(
        checked.diagnostics[0].message(),
        "explicit receiver parameters requires Java 8+"
    );

    assert!(f.check_at(&decl, JavaLanguageLevel::JAVA_8).diagnostics.is_empty());
}
