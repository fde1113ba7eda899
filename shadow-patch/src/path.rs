//! Breadcrumb paths from the patched root to the value an error came from.

use std::fmt;

use smallvec::SmallVec;

/// Type alias for the segment storage; most patches fail within a few levels.
type PathVec = SmallVec<[PathSegment; 4]>;

/// A segment in a path through a nested value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Named struct field (tuple fields are named `0`, `1`, ...).
    Field(&'static str),
    /// Position in an array or list.
    Index(usize),
}

/// A path into a nested value.
///
/// Paths are built while an error unwinds, so segments are pushed innermost
/// first and stored in that order; accessors present them root-first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path(PathVec);

impl Path {
    /// Create an empty path (the root).
    pub fn root() -> Self {
        Self(PathVec::new())
    }

    /// Create a path from root-first segments.
    pub fn from_segments(segments: &[PathSegment]) -> Self {
        Self(segments.iter().rev().cloned().collect())
    }

    /// Prepend the segment of an enclosing level.
    pub(crate) fn push_outer(&mut self, seg: PathSegment) {
        self.0.push(seg);
    }

    /// Segments from the root down to the failing value.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &PathSegment> + '_ {
        self.0.iter().rev()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments().enumerate() {
            match seg {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
