//! Locations inside a type reference.
//!
//! A bound annotation is located twice: by [`NodePath`], the steps through the
//! model tree, and by [`TypePath`], the JVMS 4.7.20.2 `type_path` the class
//! file writer needs. They differ for qualified names, where the model nests
//! outward (`Outer` is reached from `Inner`) but the class file counts inner
//! steps from the outermost type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step from a model node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStep {
    /// Array element type.
    Element,
    /// The n-th dimension of an array, outermost first.
    Dimension(u8),
    /// Qualifier of a qualified type.
    Outer,
    /// Base of a parameterized type.
    Base,
    /// The n-th type argument.
    Argument(u8),
    /// Bound of a wildcard.
    Bound,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodePath(Vec<NodeStep>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn child(&self, step: NodeStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }

    pub fn steps(&self) -> &[NodeStep] {
        &self.0
    }
}

impl From<Vec<NodeStep>> for NodePath {
    fn from(steps: Vec<NodeStep>) -> Self {
        Self(steps)
    }
}

/// `type_path_kind` from JVMS table 4.7.20.2-A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypePathKind {
    Array = 0,
    InnerType = 1,
    WildcardBound = 2,
    TypeArgument = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypePathEntry {
    pub kind: TypePathKind,
    pub argument_index: u8,
}

impl TypePathEntry {
    pub const ARRAY: Self = Self {
        kind: TypePathKind::Array,
        argument_index: 0,
    };
    pub const INNER_TYPE: Self = Self {
        kind: TypePathKind::InnerType,
        argument_index: 0,
    };
    pub const WILDCARD_BOUND: Self = Self {
        kind: TypePathKind::WildcardBound,
        argument_index: 0,
    };

    pub const fn type_argument(index: u8) -> Self {
        Self {
            kind: TypePathKind::TypeArgument,
            argument_index: index,
        }
    }

    /// `[type_path_kind, type_argument_index]` as stored in the class file.
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.kind as u8, self.argument_index]
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TypePath(Vec<TypePathEntry>);

impl TypePath {
    /// `path_length` is a `u1`.
    pub const MAX_LEN: usize = u8::MAX as usize;

    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(&self, entry: TypePathEntry) -> Self {
        self.then_n(entry, 1)
    }

    #[must_use]
    pub fn then_n(&self, entry: TypePathEntry, count: usize) -> Self {
        let mut entries = self.0.clone();
        entries.extend(std::iter::repeat(entry).take(count));
        Self(entries)
    }

    pub fn entries(&self) -> &[TypePathEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `u1 path_length` followed by the entries, or `None` when the path is
    /// longer than a class file can record.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let len = u8::try_from(self.0.len()).ok()?;
        let mut out = Vec::with_capacity(1 + self.0.len() * 2);
        out.push(len);
        for entry in &self.0 {
            out.extend(entry.to_bytes());
        }
        Some(out)
    }
}

impl From<Vec<TypePathEntry>> for TypePath {
    fn from(entries: Vec<TypePathEntry>) -> Self {
        Self(entries)
    }
}

impl fmt::Debug for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypePath(")?;
        for entry in &self.0 {
            let [kind, index] = entry.to_bytes();
            write!(f, "[{kind},{index}]")?;
        }
        write!(f, ")")
    }
}
