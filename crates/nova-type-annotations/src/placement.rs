//! Structural legality of annotation positions.
//!
//! Nothing here looks at the annotation itself: the answer depends only on
//! where it was written.

use crate::diagnostics::{Diagnostic, DiagnosticAccumulator, DiagnosticKind};
use crate::model::ReceiverParameter;
use crate::position::{GrammarPosition, Placement};

/// `Err` carries the terminal diagnostic kind for the occurrence.
pub fn validate(position: GrammarPosition) -> Result<(), DiagnosticKind> {
    match position.placement() {
        Placement::Legal => Ok(()),
        Placement::SyntaxIllegal => Err(DiagnosticKind::SyntaxIllegalPosition),
    }
}

/// A receiver parameter accepts no modifiers at all; `final` and `static` are
/// the ones people write.
pub fn check_receiver_modifiers(receiver: &ReceiverParameter, acc: &mut DiagnosticAccumulator) {
    for modifier in &receiver.modifiers {
        acc.push(
            Diagnostic::error(DiagnosticKind::SyntaxIllegalPosition, modifier.span)
                .with_arg("modifiers"),
        );
    }
}
