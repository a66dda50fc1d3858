//! Builds model fragments from Java snippets.
//!
//! Tests write the whole declaration as Java text and then parse the pieces
//! they need (a type, a modifier list, a type parameter) at the span of a
//! needle, so every span in the model points into the real snippet.

#![allow(dead_code)]

use nova_test_utils::{nth_span_of, span_after};
use nova_type_annotations::{
    AnnotatedName, AnnotationEngine, AnnotationOccurrence, AnnotationTypeTable, ArrayDimension,
    BoundKind, CheckedDeclaration, Declaration, Diagnostic, DiagnosticKind, Ident,
    IntersectionType, JavaLanguageLevel, MethodDeclaration, MethodKind, NameChain, NameSegment,
    PrimitiveKind, QualifiedAnnotationName, QualifierKind, ReturnType, TypeDeclaration,
    TypeDeclarationKind, TypeParameter, TypeRef, TypeScope, WildcardType,
};
use nova_types::Span;

pub struct Fixture {
    pub text: String,
    pub table: AnnotationTypeTable,
    packages: Vec<String>,
    static_qualifiers: Vec<String>,
}

impl Fixture {
    pub fn new(text: &str, table: AnnotationTypeTable) -> Self {
        Self {
            text: text.to_string(),
            table,
            packages: Vec::new(),
            static_qualifiers: Vec::new(),
        }
    }

    /// Names that denote packages when they qualify a type.
    pub fn packages(mut self, names: &[&str]) -> Self {
        self.packages = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Types that are only used to reach a static member type.
    pub fn static_qualifiers(mut self, names: &[&str]) -> Self {
        self.static_qualifiers = names.iter().map(|n| n.to_string()).collect();
        self
    }

    #[track_caller]
    pub fn span(&self, needle: &str) -> Span {
        nth_span_of(&self.text, needle, 0)
    }

    #[track_caller]
    pub fn nth(&self, needle: &str, n: usize) -> Span {
        nth_span_of(&self.text, needle, n)
    }

    #[track_caller]
    pub fn after(&self, anchor: &str, needle: &str) -> Span {
        span_after(&self.text, anchor, needle)
    }

    #[track_caller]
    pub fn ident(&self, needle: &str) -> Ident {
        self.ident_at(self.span(needle))
    }

    pub fn ident_at(&self, span: Span) -> Ident {
        Ident::new(&self.text[span.start..span.end], span)
    }

    #[track_caller]
    pub fn ty(&self, needle: &str) -> TypeRef {
        self.ty_at(self.span(needle))
    }

    #[track_caller]
    pub fn ty_at(&self, span: Span) -> TypeRef {
        let mut parser = self.parser(span);
        let ty = parser.ty();
        parser.finish();
        ty
    }

    /// `A & B & C`, as written in a cast.
    #[track_caller]
    pub fn intersection_at(&self, span: Span) -> TypeRef {
        let mut parser = self.parser(span);
        let mut members = vec![parser.ty()];
        while parser.eat("&") {
            members.push(parser.ty());
        }
        parser.finish();
        TypeRef::Intersection(IntersectionType { members })
    }

    /// Annotations written as modifiers (the needle holds only annotations).
    #[track_caller]
    pub fn annos(&self, needle: &str) -> Vec<AnnotationOccurrence> {
        self.annos_at(self.span(needle))
    }

    #[track_caller]
    pub fn annos_at(&self, span: Span) -> Vec<AnnotationOccurrence> {
        let mut parser = self.parser(span);
        let annos = parser.annotations();
        parser.finish();
        annos
    }

    #[track_caller]
    pub fn type_param(&self, needle: &str) -> TypeParameter {
        self.type_param_at(self.span(needle))
    }

    #[track_caller]
    pub fn type_param_at(&self, span: Span) -> TypeParameter {
        let mut parser = self.parser(span);
        let annotations = parser.annotations();
        let name = parser.ident();
        let mut bounds = Vec::new();
        if parser.eat_keyword("extends") {
            bounds.push(parser.ty());
            while parser.eat("&") {
                bounds.push(parser.ty());
            }
        }
        parser.finish();
        TypeParameter {
            annotations,
            name,
            bounds,
        }
    }

    /// Brackets written after a declarator name.
    #[track_caller]
    pub fn dims_at(&self, span: Span) -> Vec<ArrayDimension> {
        let mut parser = self.parser(span);
        let mut dims = Vec::new();
        loop {
            let annotations = parser.annotations();
            if parser.at_end() {
                assert!(annotations.is_empty(), "dangling annotations in {span:?}");
                break;
            }
            parser.skip_ws();
            let start = parser.pos;
            parser.expect("[");
            parser.expect("]");
            dims.push(ArrayDimension::new(annotations, Span::new(start, parser.pos)));
        }
        dims
    }

    /// A dotted name whose segments may carry annotations.
    #[track_caller]
    pub fn name_at(&self, span: Span) -> AnnotatedName {
        let mut parser = self.parser(span);
        let mut segments = Vec::new();
        loop {
            let annotations = parser.annotations();
            let name = parser.ident();
            segments.push(NameSegment { annotations, name });
            if !parser.eat(".") {
                break;
            }
        }
        parser.finish();
        AnnotatedName { segments }
    }

    /// `A.B`, without annotations.
    #[track_caller]
    pub fn chain_at(&self, span: Span) -> NameChain {
        let mut parser = self.parser(span);
        let mut segments = vec![parser.ident()];
        while parser.eat(".") {
            segments.push(parser.ident());
        }
        parser.finish();
        NameChain::new(segments)
    }

    pub fn check(&self, decl: &Declaration) -> CheckedDeclaration {
        self.check_at(decl, JavaLanguageLevel::JAVA_21)
    }

    pub fn check_at(&self, decl: &Declaration, level: JavaLanguageLevel) -> CheckedDeclaration {
        AnnotationEngine::with_level(&self.table, level)
            .check_declaration(decl)
            .expect("fixture declarations are well formed")
    }

    fn parser(&self, span: Span) -> Parser<'_> {
        Parser {
            fixture: self,
            pos: span.start,
            limit: span.end,
        }
    }

    fn qualifier_kind(&self, qualifier: &str, all_packages: bool) -> QualifierKind {
        if all_packages && self.packages.iter().any(|p| p == qualifier) {
            QualifierKind::Package
        } else if self.static_qualifiers.iter().any(|s| s == qualifier) {
            QualifierKind::StaticMember
        } else {
            QualifierKind::Type
        }
    }
}

pub fn class(name: Ident) -> TypeDeclaration {
    TypeDeclaration {
        kind: TypeDeclarationKind::Class,
        annotations: Vec::new(),
        name,
        type_params: Vec::new(),
        superclass: None,
        superinterfaces: Vec::new(),
        attributes: Vec::new(),
    }
}

pub fn method(name: Ident, return_type: ReturnType, enclosing: Vec<TypeScope>) -> MethodDeclaration {
    MethodDeclaration {
        kind: MethodKind::Method,
        annotations: Vec::new(),
        modifiers: Vec::new(),
        type_params: Vec::new(),
        return_type: Some(return_type),
        name,
        params: Vec::new(),
        throws: Vec::new(),
        enclosing,
    }
}

pub fn constructor(name: Ident, enclosing: Vec<TypeScope>) -> MethodDeclaration {
    MethodDeclaration {
        kind: MethodKind::Constructor,
        annotations: Vec::new(),
        modifiers: Vec::new(),
        type_params: Vec::new(),
        return_type: None,
        name,
        params: Vec::new(),
        throws: Vec::new(),
        enclosing,
    }
}

pub fn void(span: Span) -> ReturnType {
    ReturnType::Void {
        annotations: Vec::new(),
        span,
    }
}

/// `(kind, span)` pairs, the usual shape of an expectation.
pub fn kinds_and_spans(diagnostics: &[Diagnostic]) -> Vec<(DiagnosticKind, Span)> {
    diagnostics.iter().map(|d| (d.kind, d.span)).collect()
}

pub fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

struct Parser<'f> {
    fixture: &'f Fixture,
    pos: usize,
    limit: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.fixture.text[self.pos..self.limit]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.limit - trimmed.len();
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.limit
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        let boundary = rest[keyword.len().min(rest.len())..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c));
        if rest.starts_with(keyword) && boundary {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    #[track_caller]
    fn expect(&mut self, token: &str) {
        assert!(self.eat(token), "expected {token:?} at {:?}", self.rest());
    }

    #[track_caller]
    fn finish(&mut self) {
        assert!(self.at_end(), "unparsed fixture text {:?}", self.rest());
    }

    #[track_caller]
    fn ident(&mut self) -> Ident {
        self.skip_ws();
        let len: usize = self
            .rest()
            .chars()
            .take_while(|c| is_ident_char(*c))
            .map(char::len_utf8)
            .sum();
        assert!(len > 0, "expected identifier at {:?}", self.rest());
        let span = Span::new(self.pos, self.pos + len);
        self.pos += len;
        self.fixture.ident_at(span)
    }

    fn annotations(&mut self) -> Vec<AnnotationOccurrence> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if !self.rest().starts_with('@') || self.rest().starts_with("@interface") {
                return out;
            }
            let start = self.pos;
            self.pos += 1;

            // `@p.q.Name`; a dot followed by whitespace ends the name.
            let name_start = self.pos;
            loop {
                let len: usize = self
                    .rest()
                    .chars()
                    .take_while(|c| is_ident_char(*c))
                    .map(char::len_utf8)
                    .sum();
                self.pos += len;
                let rest = self.rest();
                if rest.starts_with('.') && rest[1..].starts_with(is_ident_char) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let name_span = Span::new(name_start, self.pos);
            let name = &self.fixture.text[name_span.start..name_span.end];

            if self.rest().starts_with('(') {
                let mut depth = 0usize;
                for (idx, c) in self.rest().char_indices() {
                    match c {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                self.pos += idx + 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }

            let span = Span::new(start, self.pos);
            let qualified = QualifiedAnnotationName::new(name);
            out.push(if self.fixture.table.get(&qualified).is_some() {
                AnnotationOccurrence::resolved(qualified, span, name_span)
            } else {
                AnnotationOccurrence::unresolved(name, span, name_span)
            });
        }
    }

    fn ty(&mut self) -> TypeRef {
        let annotations = self.annotations();
        self.ty_with(annotations)
    }

    fn ty_with(&mut self, annotations: Vec<AnnotationOccurrence>) -> TypeRef {
        self.skip_ws();
        let start = self.pos;
        let first = self.ident();
        let base = match PrimitiveKind::from_keyword(&first.text) {
            Some(kind) => TypeRef::primitive(kind, annotations, first.span),
            None => self.class_type(first, annotations, start),
        };
        self.dims(base)
    }

    fn class_type(
        &mut self,
        first: Ident,
        annotations: Vec<AnnotationOccurrence>,
        start: usize,
    ) -> TypeRef {
        let mut qualifier = first.text.clone();
        let mut all_packages = true;
        let mut ty = self.type_args(TypeRef::simple(first, annotations), start);

        loop {
            let save = self.pos;
            if !self.eat(".") {
                break;
            }
            // `.class` / `.this` end the type.
            if self.eat_keyword("class") || self.eat_keyword("this") {
                self.pos = save;
                break;
            }
            let annotations = self.annotations();
            let name = self.ident();
            let kind = self.fixture.qualifier_kind(&qualifier, all_packages);
            all_packages &= kind == QualifierKind::Package;
            qualifier = name.text.clone();
            ty = TypeRef::qualified(ty, name, annotations, kind);
            ty = self.type_args(ty, start);
        }
        ty
    }

    fn type_args(&mut self, base: TypeRef, start: usize) -> TypeRef {
        let save = self.pos;
        if !self.eat("<") {
            self.pos = save;
            return base;
        }
        let mut arguments = vec![self.type_arg()];
        while self.eat(",") {
            arguments.push(self.type_arg());
        }
        self.expect(">");
        TypeRef::parameterized(base, arguments, Span::new(start, self.pos))
    }

    fn type_arg(&mut self) -> TypeRef {
        let annotations = self.annotations();
        self.skip_ws();
        if !self.rest().starts_with('?') {
            return self.ty_with(annotations);
        }
        let start = self.pos;
        self.pos += 1;
        let bound = if self.eat_keyword("extends") {
            Some((BoundKind::Extends, Box::new(self.ty())))
        } else if self.eat_keyword("super") {
            Some((BoundKind::Super, Box::new(self.ty())))
        } else {
            None
        };
        TypeRef::Wildcard(WildcardType {
            annotations,
            bound,
            span: Span::new(start, self.pos),
        })
    }

    fn dims(&mut self, element: TypeRef) -> TypeRef {
        let mut dims = Vec::new();
        let mut varargs = None;
        loop {
            let save = self.pos;
            let annotations = self.annotations();
            self.skip_ws();
            let start = self.pos;
            if self.eat("[") {
                self.expect("]");
                dims.push(ArrayDimension::new(annotations, Span::new(start, self.pos)));
            } else if self.eat("...") {
                varargs = Some(ArrayDimension::new(annotations, Span::new(start, self.pos)));
                break;
            } else {
                self.pos = save;
                break;
            }
        }
        // `...` is the outermost dimension.
        if let Some(varargs) = varargs {
            dims.insert(0, varargs);
        }
        if dims.is_empty() {
            element
        } else {
            TypeRef::array(element, dims)
        }
    }
}
