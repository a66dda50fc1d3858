//! Per-declaration driver: unresolved relay, placement, target check and
//! binding for every occurrence, then the receiver rules.

use nova_types::Span;
use rayon::prelude::*;
use serde::Serialize;

use crate::binder::{self, AnnotationBinding};
use crate::config::TypeAnnotationConfig;
use crate::diagnostics::{sort_in_source_order, Diagnostic, DiagnosticAccumulator, DiagnosticKind};
use crate::error::EngineError;
use crate::language_level::{JavaFeature, JavaLanguageLevel};
use crate::model::{AnnotationRef, Declaration};
use crate::placement;
use crate::receiver;
use crate::sites::{self, Site};
use crate::target::TargetRegistry;
use crate::target_check::{self, check_generic_attributes, without_type_annotation_targets};
use crate::TRACE_TARGET;

/// What happened to one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    Bound,
    Rejected(DiagnosticKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccurrenceOutcome {
    pub span: Span,
    pub disposition: Disposition,
}

/// Result of checking one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedDeclaration {
    /// Accepted occurrences, in source order.
    pub bindings: Vec<AnnotationBinding>,
    /// One entry per occurrence, in source order.
    pub outcomes: Vec<OccurrenceOutcome>,
    /// In source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckedDeclaration {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == nova_types::Severity::Error)
    }

    pub fn binding_for(&self, span: Span) -> Option<&AnnotationBinding> {
        self.bindings.iter().find(|b| b.span == span)
    }

    pub fn outcome_for(&self, span: Span) -> Option<Disposition> {
        self.outcomes
            .iter()
            .find(|o| o.span == span)
            .map(|o| o.disposition)
    }
}

/// Result of checking a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedUnit {
    /// Same order as the input declarations.
    pub declarations: Vec<CheckedDeclaration>,
    /// Every diagnostic of the unit, merged in source order.
    pub diagnostics: Vec<Diagnostic>,
}

enum Execution {
    Inline,
    GlobalPool,
    Pool(rayon::ThreadPool),
}

impl std::fmt::Debug for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Execution::Inline => f.write_str("Inline"),
            Execution::GlobalPool => f.write_str("GlobalPool"),
            Execution::Pool(pool) => write!(f, "Pool({})", pool.current_num_threads()),
        }
    }
}

fn build_pool(threads: usize) -> Execution {
    let mut threads = threads.max(1);
    loop {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("nova-type-annotations-{idx}"))
            .build()
        {
            Ok(pool) => return Execution::Pool(pool),
            // Thread creation can fail under low process limits; retry smaller.
            Err(err) if threads > 1 => {
                tracing::debug!(target: TRACE_TARGET, threads, error = %err, "shrinking annotation pool");
                threads = (threads / 2).max(1);
            }
            Err(err) => {
                tracing::debug!(target: TRACE_TARGET, error = %err, "checking declarations inline");
                return Execution::Inline;
            }
        }
    }
}

/// Checks declarations against one [`TargetRegistry`] at one language level.
pub struct AnnotationEngine<'r> {
    registry: &'r dyn TargetRegistry,
    level: JavaLanguageLevel,
    execution: Execution,
}

impl std::fmt::Debug for AnnotationEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationEngine")
            .field("level", &self.level)
            .field("execution", &self.execution)
            .finish_non_exhaustive()
    }
}

impl<'r> AnnotationEngine<'r> {
    pub fn new(registry: &'r dyn TargetRegistry, config: &TypeAnnotationConfig) -> Self {
        let execution = match (config.parallel.enabled, config.parallel.threads) {
            (false, _) => Execution::Inline,
            (true, Some(threads)) if threads > 0 => build_pool(threads),
            (true, _) => Execution::GlobalPool,
        };
        Self {
            registry,
            level: config.language_level(),
            execution,
        }
    }

    /// Single-threaded engine at `level`.
    pub fn with_level(registry: &'r dyn TargetRegistry, level: JavaLanguageLevel) -> Self {
        Self {
            registry,
            level,
            execution: Execution::Inline,
        }
    }

    pub fn language_level(&self) -> JavaLanguageLevel {
        self.level
    }

    pub fn check_declaration(&self, decl: &Declaration) -> Result<CheckedDeclaration, EngineError> {
        let sites = sites::collect(decl)?;
        let mut acc = DiagnosticAccumulator::new();
        let mut bindings = Vec::new();
        let mut outcomes = Vec::with_capacity(sites.len());

        for site in &sites {
            let disposition = match self.check_site(site, &mut acc) {
                Ok(binding) => {
                    bindings.push(binding);
                    Disposition::Bound
                }
                Err(kind) => Disposition::Rejected(kind),
            };
            tracing::trace!(
                target: TRACE_TARGET,
                span = ?site.occurrence.span,
                annotation = site.occurrence.display_name(),
                position = ?site.position,
                ?disposition,
                "annotation occurrence"
            );
            outcomes.push(OccurrenceOutcome {
                span: site.occurrence.span,
                disposition,
            });
        }

        match decl {
            Declaration::Method(method) => {
                acc.break_run();
                receiver::check(method, self.level, &mut acc);
            }
            Declaration::Type(ty) => {
                acc.break_run();
                check_generic_attributes(ty, &mut acc);
            }
            _ => {}
        }

        bindings.sort_by_key(|b| b.span);
        outcomes.sort_by_key(|o| o.span);
        let diagnostics = acc.finish();

        tracing::debug!(
            target: TRACE_TARGET,
            kind = decl.kind_name(),
            occurrences = outcomes.len(),
            bound = bindings.len(),
            diagnostics = diagnostics.len(),
            "checked declaration"
        );

        Ok(CheckedDeclaration {
            bindings,
            outcomes,
            diagnostics,
        })
    }

    /// Runs the stages for one occurrence. Every `Err` has already been
    /// reported to `acc`.
    fn check_site(
        &self,
        site: &Site<'_>,
        acc: &mut DiagnosticAccumulator,
    ) -> Result<AnnotationBinding, DiagnosticKind> {
        let occurrence = site.occurrence;
        let name = match &occurrence.annotation {
            AnnotationRef::Resolved(name) => name,
            AnnotationRef::Unresolved(written) => {
                let kind = DiagnosticKind::UnresolvedAnnotationType;
                acc.push(Diagnostic::error(kind, occurrence.name_span).with_arg(written.as_str()));
                return Err(kind);
            }
        };

        if let Err(kind) = placement::validate(site.position) {
            acc.reject(Diagnostic::error(kind, occurrence.span), site.group);
            return Err(kind);
        }

        let type_annotations = self.level.supports_type_annotations();
        if !type_annotations && site.position.is_type_annotation_syntax() {
            let kind = DiagnosticKind::FeatureUnavailable(JavaFeature::TypeAnnotations);
            acc.push(
                Diagnostic::error(kind, occurrence.span)
                    .with_arg(self.level.feature_message(JavaFeature::TypeAnnotations)),
            );
            return Err(kind);
        }

        let mut targets = self.registry.targets(name);
        if !type_annotations {
            targets = without_type_annotation_targets(targets);
        }

        let decision = match target_check::check(targets, site.position.category(), site.declared) {
            Ok(decision) => decision,
            Err(kind) => {
                let mut diagnostic = Diagnostic::error(kind, occurrence.span);
                if kind == DiagnosticKind::TargetMismatch {
                    diagnostic = diagnostic.with_arg(name.simple_name());
                }
                acc.push(diagnostic);
                return Err(kind);
            }
        };

        match binder::bind(name, occurrence, decision, &site.locus) {
            Ok(binding) => {
                acc.break_run();
                Ok(binding)
            }
            Err(rejection) => {
                let group = if rejection.grouped { site.group } else { None };
                acc.reject(Diagnostic::error(rejection.kind, occurrence.span), group);
                Err(rejection.kind)
            }
        }
    }

    /// Checks every declaration of a compilation unit.
    ///
    /// Declarations are independent, so they may be checked on the engine's
    /// pool; the result does not depend on how they were scheduled.
    pub fn check_unit(&self, decls: &[Declaration]) -> Result<CheckedUnit, EngineError> {
        let declarations: Vec<CheckedDeclaration> = match &self.execution {
            Execution::Pool(pool) if decls.len() > 1 => pool.install(|| {
                decls
                    .par_iter()
                    .map(|decl| self.check_declaration(decl))
                    .collect::<Result<Vec<_>, _>>()
            })?,
            Execution::GlobalPool if decls.len() > 1 => decls
                .par_iter()
                .map(|decl| self.check_declaration(decl))
                .collect::<Result<Vec<_>, _>>()?,
            _ => decls
                .iter()
                .map(|decl| self.check_declaration(decl))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let mut diagnostics: Vec<Diagnostic> = declarations
            .iter()
            .flat_map(|checked| checked.diagnostics.iter().cloned())
            .collect();
        sort_in_source_order(&mut diagnostics);

        tracing::debug!(
            target: TRACE_TARGET,
            declarations = declarations.len(),
            diagnostics = diagnostics.len(),
            execution = ?self.execution,
            "checked compilation unit"
        );

        Ok(CheckedUnit {
            declarations,
            diagnostics,
        })
    }
}
