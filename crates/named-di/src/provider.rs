use std::fmt;
use std::sync::Arc;
use crate::error::{Arity, Error};
use crate::helpers::{downcast, Instance, TypeName};
use crate::reference::Refs;

type Invoke = dyn Fn(Vec<Instance>) -> Result<Instance, Error> + Send + Sync;

/// Declared shape of a constructor, fixed when the constructor is created.
#[derive(Debug, Clone)]
pub struct Signature {
  params: Vec<TypeName>,
  returns: Vec<Return>,
}

impl Signature {
  pub fn new(params: Vec<TypeName>, returns: Vec<Return>) -> Self {
    Signature { params, returns }
  }

  pub fn params(&self) -> &[TypeName] {
    &self.params
  }

  pub fn returns(&self) -> &[Return] {
    &self.returns
  }

  fn check(&self, name: &str, refs: &Refs) -> Result<(), Error> {
    if refs.len() != self.params.len() {
      return Err(Error::ArityMismatch {
        name: name.to_owned(),
        kind: Arity::Inputs,
        expected: refs.len(),
        actual: self.params.len(),
      });
    }
    if self.returns.len() != 2 {
      return Err(Error::ArityMismatch {
        name: name.to_owned(),
        kind: Arity::Outputs,
        expected: 2,
        actual: self.returns.len(),
      });
    }
    match &self.returns[1] {
      Return::Error(_) => Ok(()),
      Return::Value(found) => Err(Error::ReturnTypeMismatch {
        name: name.to_owned(),
        found: found.as_str(),
      }),
    }
  }
}

/// One output of a constructor.
#[derive(Debug, Clone)]
pub enum Return {
  Value(TypeName),
  Error(TypeName),
}

impl Return {
  pub fn value<T: ?Sized + 'static>() -> Self {
    Return::Value(TypeName::of::<T>())
  }

  pub fn error<E: ?Sized + 'static>() -> Self {
    Return::Error(TypeName::of::<E>())
  }
}

/// A type-erased constructor together with its [`Signature`].
#[derive(Clone)]
pub struct Constructor {
  signature: Signature,
  invoke: Arc<Invoke>,
}

impl Constructor {
  pub fn new<Args, C>(constructor: C) -> Self
  where
    C: IntoConstructor<Args>,
  {
    constructor.into_constructor()
  }

  /// Wraps a constructor whose shape is only known at runtime.
  ///
  /// `invoke` receives one instance per declared parameter, in slot order.
  pub fn from_raw<F>(signature: Signature, invoke: F) -> Self
  where
    F: Fn(Vec<Instance>) -> Result<Instance, Error> + Send + Sync + 'static,
  {
    Constructor {
      signature,
      invoke: Arc::new(invoke),
    }
  }

  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  /// Invokes the constructor for service `name` with one instance per parameter.
  pub(crate) fn invoke(&self, name: &str, args: Vec<Instance>) -> Result<Instance, Error> {
    if args.len() != self.signature.params.len() {
      return Err(Error::ArityMismatch {
        name: name.to_owned(),
        kind: Arity::Inputs,
        expected: self.signature.params.len(),
        actual: args.len(),
      });
    }
    (self.invoke)(args)
  }
}

impl fmt::Debug for Constructor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Constructor")
      .field("signature", &self.signature)
      .finish()
  }
}

/// Conversion of typed closures into [`Constructor`]s.
///
/// Implemented for `Fn(Arc<A1>, .., Arc<An>) -> Result<T, E>` with up to eight
/// parameters, where `E: Into<anyhow::Error>`.
pub trait IntoConstructor<Args>: Send + Sync + 'static {
  fn into_constructor(self) -> Constructor;
}

impl IntoConstructor<Constructor> for Constructor {
  fn into_constructor(self) -> Constructor {
    self
  }
}

/// Takes the next argument. `Constructor::invoke` checks the argument count
/// before the typed closure runs, so running out here only happens when a
/// typed constructor's erased function is called directly.
fn next_arg<A>(
  args: &mut impl Iterator<Item = (usize, Instance)>,
  expected: usize,
  supplied: usize,
) -> Result<Arc<A>, Error>
where
  A: Send + Sync + 'static,
{
  let (slot, instance) = args.next().ok_or_else(|| Error::ArityMismatch {
    name: ANONYMOUS.to_owned(),
    kind: Arity::Inputs,
    expected,
    actual: supplied,
  })?;
  downcast::<A>(instance).ok_or_else(|| Error::ArgumentType {
    slot,
    expected: std::any::type_name::<A>(),
  })
}

macro_rules! impl_into_constructor {
  ($($arg:ident $var:ident),*) => {
    impl<F, T, E, $($arg,)*> IntoConstructor<($($arg,)*)> for F
    where
      F: Fn($(Arc<$arg>),*) -> Result<T, E> + Send + Sync + 'static,
      T: Send + Sync + 'static,
      E: Into<anyhow::Error> + 'static,
      $($arg: Send + Sync + 'static,)*
    {
      #[allow(unused_mut, unused_variables)]
      fn into_constructor(self) -> Constructor {
        let signature = Signature::new(
          vec![$(TypeName::of::<$arg>(),)*],
          vec![Return::value::<T>(), Return::error::<E>()],
        );
        let arity = signature.params().len();
        Constructor::from_raw(signature, move |args| {
          let supplied = args.len();
          let mut args = args.into_iter().enumerate();
          $(let $var = next_arg::<$arg>(&mut args, arity, supplied)?;)*
          (self)($($var),*)
            .map(|value| Arc::new(value) as Instance)
            .map_err(|err| Error::from_service(err.into()))
        })
      }
    }
  };
}

impl_into_constructor!();
impl_into_constructor!(A1 a1);
impl_into_constructor!(A1 a1, A2 a2);
impl_into_constructor!(A1 a1, A2 a2, A3 a3);
impl_into_constructor!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_into_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_into_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_into_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_into_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

enum Provide {
  Value(Instance),
  Constructor(Constructor),
}

/// Registration input for a named service.
pub struct Definition {
  name: String,
  provide: Vec<Provide>,
  refs: Refs,
  singleton: bool,
  eager: bool,
}

impl Definition {
  pub fn new(name: impl Into<String>) -> Self {
    Definition {
      name: name.into(),
      provide: Vec::new(),
      refs: Refs::new(),
      singleton: false,
      eager: false,
    }
  }

  /// Provides a ready-made value. The same instance is returned on every lookup.
  pub fn value<T>(mut self, value: T) -> Self
  where
    T: Send + Sync + 'static,
  {
    self.provide.push(Provide::Value(Arc::new(value)));
    self
  }

  /// Provides an already type-erased value.
  pub fn instance(mut self, instance: Instance) -> Self {
    self.provide.push(Provide::Value(instance));
    self
  }

  pub fn constructor<Args, C>(mut self, constructor: C) -> Self
  where
    C: IntoConstructor<Args>,
  {
    self.provide.push(Provide::Constructor(constructor.into_constructor()));
    self
  }

  /// Names of the services passed to the constructor, in parameter order.
  pub fn refs(mut self, refs: impl Into<Refs>) -> Self {
    self.refs = refs.into();
    self
  }

  /// Construct at most once and reuse the outcome, failures included.
  pub fn singleton(mut self) -> Self {
    self.singleton = true;
    self
  }

  /// Resolve as part of registration instead of on first lookup.
  pub fn eager(mut self) -> Self {
    self.eager = true;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn is_eager(&self) -> bool {
    self.eager
  }

  pub(crate) fn into_service(self) -> Result<Service, Error> {
    if self.name.trim().is_empty() {
      return Err(Error::EmptyName);
    }
    let name = self.name;
    let mut provide = self.provide;
    if provide.len() > 1 {
      return Err(Error::InvalidConstructor {
        name,
        reason: "both a value and a constructor were provided",
      });
    }
    let kind = match provide.pop() {
      None => {
        return Err(Error::InvalidConstructor {
          name,
          reason: "neither a value nor a constructor was provided",
        })
      }
      Some(Provide::Value(instance)) => ServiceKind::Value(instance),
      Some(Provide::Constructor(constructor)) => {
        constructor.signature().check(&name, &self.refs)?;
        ServiceKind::Constructor(constructor)
      }
    };
    Ok(Service {
      name,
      kind,
      refs: self.refs,
      singleton: self.singleton,
    })
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Definition")
      .field("name", &self.name)
      .field("refs", &self.refs)
      .field("singleton", &self.singleton)
      .field("eager", &self.eager)
      .finish()
  }
}

#[derive(Debug)]
pub(crate) enum ServiceKind {
  Value(Instance),
  Constructor(Constructor),
}

/// Validated, immutable form of a [`Definition`].
#[derive(Debug)]
pub(crate) struct Service {
  pub(crate) name: String,
  pub(crate) kind: ServiceKind,
  pub(crate) refs: Refs,
  pub(crate) singleton: bool,
}

impl Service {
  /// Builds a one-shot service for `Container::call`.
  pub(crate) fn anonymous(constructor: Constructor, refs: Refs) -> Result<Service, Error> {
    Definition::new(ANONYMOUS)
      .constructor(constructor)
      .refs(refs)
      .into_service()
  }
}

pub(crate) const ANONYMOUS: &str = "<call>";
