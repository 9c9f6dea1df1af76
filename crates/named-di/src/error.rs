use thiserror::Error;
use std::fmt;
use std::sync::Arc;

#[derive(Error, Debug, Clone)]
pub enum Error {
  #[error("service name is empty")]
  EmptyName,
  #[error("invalid constructor for `{name}`: {reason}")]
  InvalidConstructor { name: String, reason: &'static str },
  #[error("constructor for `{name}` has {actual} {kind}, expected {expected}")]
  ArityMismatch {
    name: String,
    kind: Arity,
    expected: usize,
    actual: usize,
  },
  #[error("second output of constructor for `{name}` must be an error, found `{found}`")]
  ReturnTypeMismatch { name: String, found: &'static str },
  #[error("service not found: {0}")]
  NotFound(String),
  #[error("service `{name}` is not a `{expected}`")]
  TypeMismatch { name: String, expected: &'static str },
  #[error("argument {slot} is not a `{expected}`")]
  ArgumentType { slot: usize, expected: &'static str },
  #[error("service: {0}")]
  Service(Arc<anyhow::Error>),
}

impl Error {
  /// Converts an error returned by a constructor. Errors raised by the
  /// container itself (e.g. a nested lookup) pass through unchanged.
  pub(crate) fn from_service(err: anyhow::Error) -> Self {
    match err.downcast::<Error>() {
      Ok(err) => err,
      Err(err) => Error::Service(Arc::new(err)),
    }
  }
}

/// Which side of a constructor signature an [`Error::ArityMismatch`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  Inputs,
  Outputs,
}

impl fmt::Display for Arity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Arity::Inputs => f.write_str("inputs"),
      Arity::Outputs => f.write_str("outputs"),
    }
  }
}
