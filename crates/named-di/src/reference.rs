//! Dependency declarations for constructors.
//!
//! A [`Refs`] list maps one-to-one onto a constructor's parameters. Sequential
//! items take a single slot each; a [`parallel`] group takes a contiguous run of
//! slots, one per member, in the order the members were given.

use std::slice;

/// One item of a reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A dependency resolved before anything that follows it.
    Single(String),
    /// Dependencies that may be resolved concurrently with each other.
    Parallel(Vec<String>),
}

impl Reference {
    /// Number of constructor slots this item fills.
    pub fn len(&self) -> usize {
        match self {
            Reference::Single(_) => 1,
            Reference::Parallel(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Reference {
    fn from(name: &str) -> Self {
        Reference::Single(name.to_owned())
    }
}

impl From<String> for Reference {
    fn from(name: String) -> Self {
        Reference::Single(name)
    }
}

/// Builds a group of dependencies that are resolved concurrently.
///
/// Completion order among the members is unspecified; their values are still
/// passed to the constructor in the order given here.
pub fn parallel<I, S>(names: I) -> Reference
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Reference::Parallel(names.into_iter().map(Into::into).collect())
}

/// Ordered dependency list of a constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refs(Vec<Reference>);

impl Refs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reference: impl Into<Reference>) -> &mut Self {
        self.0.push(reference.into());
        self
    }

    /// Total number of dependency names, counting every parallel member.
    pub fn len(&self) -> usize {
        self.0.iter().map(Reference::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> slice::Iter<'_, Reference> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Refs {
    type Item = &'a Reference;
    type IntoIter = slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R> FromIterator<R> for Refs
where
    R: Into<Reference>,
{
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Refs(iter.into_iter().map(Into::into).collect())
    }
}

impl<R, const N: usize> From<[R; N]> for Refs
where
    R: Into<Reference>,
{
    fn from(items: [R; N]) -> Self {
        items.into_iter().collect()
    }
}

impl From<Vec<Reference>> for Refs {
    fn from(items: Vec<Reference>) -> Self {
        Refs(items)
    }
}

/// Builds a [`Refs`] list from names and [`parallel`] groups.
///
/// ```
/// use named_di::{parallel, refs};
///
/// let refs = refs!["config", parallel(["db", "cache"]), "clock"];
/// assert_eq!(refs.len(), 4);
/// ```
#[macro_export]
macro_rules! refs {
    () => {
        $crate::Refs::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::Refs::from(::std::vec![$($crate::Reference::from($item)),+])
    };
}
