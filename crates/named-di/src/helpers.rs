use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A resolved service value with its concrete type erased.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Name of a parameter or return type in a constructor signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeName(&'static str);

impl TypeName {
  pub fn of<T: ?Sized + 'static>() -> Self {
    TypeName(type_name::<T>())
  }

  pub fn as_str(&self) -> &'static str {
    self.0
  }
}

impl fmt::Display for TypeName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0)
  }
}

pub(crate) fn downcast<T>(instance: Instance) -> Option<Arc<T>>
  where T: Send + Sync + 'static
{
  instance.downcast::<T>().ok()
}
