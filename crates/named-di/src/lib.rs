//! Name-keyed dependency injection container.
//!
//! Services are registered under a name, either as a ready-made value or as a
//! constructor plus the names of the services it takes as arguments. Looking a
//! name up resolves its dependencies recursively and invokes the constructor.
//!
//! ```
//! use named_di::{refs, Container, Definition};
//! use std::sync::Arc;
//!
//! let container = Container::build()
//!     .register(Definition::new("name").value("world".to_string()))
//!     .register(
//!         Definition::new("greeting")
//!             .constructor(|name: Arc<String>| -> anyhow::Result<String> {
//!                 Ok(format!("Hello, {}", name))
//!             })
//!             .refs(refs!["name"])
//!             .singleton(),
//!     )
//!     .finalize()
//!     .unwrap();
//!
//! let greeting: Arc<String> = container.get("greeting").unwrap();
//! assert_eq!(*greeting, "Hello, world");
//! ```
//!
//! Singletons are constructed at most once per container; concurrent first
//! lookups share one construction. A failed singleton keeps returning its error.
//! Members of a [`parallel`] group are resolved on separate threads.
//!
//! There is no cycle detection: a service that depends on itself, directly or
//! through other services, never resolves.

mod cache;
mod error;
pub use error::{Arity, Error};
mod flight;
mod helpers;
pub use helpers::{Instance, TypeName};
mod inject;
pub use inject::Bindings;
mod provider;
pub use provider::{Constructor, Definition, IntoConstructor, Return, Signature};
mod reference;
pub use reference::{parallel, Reference, Refs};
mod registry;
mod resolver;

use provider::Service;
use resolver::{expect, Resolver};
use std::fmt;
use std::sync::Arc;

pub type Ref<T> = Arc<T>;

pub struct Container {
    resolver: Resolver,
}

impl Container {
    pub fn new() -> Self {
        Self {
            resolver: Resolver::default(),
        }
    }

    pub fn build() -> ContainerBuilder {
        ContainerBuilder {
            definitions: Vec::new(),
        }
    }

    /// Validates and installs `definition`, replacing any service of the same name.
    ///
    /// A cached singleton outcome for that name is kept; see [`Container::clear_cache`].
    /// Eager definitions are resolved before returning, and a resolution failure
    /// is returned as the registration error.
    pub fn register(&self, definition: Definition) -> Result<(), Error> {
        let eager = definition.is_eager();
        let service = definition.into_service()?;
        let name = service.name.clone();
        self.resolver.register(service);
        if eager {
            self.resolver.invoke(&name)?;
        }
        Ok(())
    }

    /// Registers `definitions` in order, stopping at the first failure.
    pub fn register_all<I>(&self, definitions: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Definition>,
    {
        definitions
            .into_iter()
            .try_for_each(|definition| self.register(definition))
    }

    /// Like [`Container::register_all`], but panics on the first failure.
    pub fn must_register_all<I>(&self, definitions: I)
    where
        I: IntoIterator<Item = Definition>,
    {
        if let Err(err) = self.register_all(definitions) {
            panic!("failed to register services: {}", err);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolver.registry.contains(name)
    }

    pub fn get<T>(&self, name: &str) -> Result<Ref<T>, Error>
    where
        T: Send + Sync + 'static,
    {
        expect(name, self.get_any(name)?)
    }

    pub fn get_any(&self, name: &str) -> Result<Instance, Error> {
        self.resolver.invoke(name)
    }

    /// Resolves `refs` and invokes `constructor` once, without naming or caching
    /// the result.
    pub fn call<T, Args, C>(&self, constructor: C, refs: impl Into<Refs>) -> Result<Ref<T>, Error>
    where
        T: Send + Sync + 'static,
        C: IntoConstructor<Args>,
    {
        expect(provider::ANONYMOUS, self.call_any(constructor, refs)?)
    }

    pub fn call_any<Args, C>(&self, constructor: C, refs: impl Into<Refs>) -> Result<Instance, Error>
    where
        C: IntoConstructor<Args>,
    {
        let service = Service::anonymous(constructor.into_constructor(), refs.into())?;
        self.resolver.evaluate(&service)
    }

    /// Like [`Container::call`], but panics on failure.
    pub fn must_call<T, Args, C>(&self, constructor: C, refs: impl Into<Refs>) -> Ref<T>
    where
        T: Send + Sync + 'static,
        C: IntoConstructor<Args>,
    {
        match self.call(constructor, refs) {
            Ok(value) => value,
            Err(err) => panic!("call failed: {}", err),
        }
    }

    /// Resolves every binding and assigns it to `target`, in binding order.
    pub fn inject<T>(&self, target: &mut T, bindings: &Bindings<T>) -> Result<(), Error> {
        bindings.apply(target, |name| self.get_any(name))
    }

    /// Forgets every memoized singleton outcome, so the next lookup constructs
    /// the singleton again from its current registration.
    pub fn clear_cache(&self) {
        self.resolver.cache.clear();
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ContainerBuilder {
    definitions: Vec<Definition>,
}

impl ContainerBuilder {
    pub fn register(mut self, definition: Definition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn register_all<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = Definition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Registers the queued definitions in order and returns the container.
    pub fn finalize(self) -> Result<Container, Error> {
        let container = Container::new();
        container.register_all(self.definitions)?;
        Ok(container)
    }
}
