use crate::error::Error;
use crate::helpers::Instance;
use crate::resolver::expect;
use std::fmt;
use std::sync::Arc;

type Assign<T> = dyn Fn(&mut T, Instance) -> Result<(), Error> + Send + Sync;

struct Binding<T> {
    field: &'static str,
    dependency: String,
    assign: Box<Assign<T>>,
}

/// Field-to-service bindings for [`Container::inject`](crate::Container::inject).
///
/// ```
/// use named_di::{Bindings, Container, Definition};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Handler {
///     greeting: Option<Arc<String>>,
/// }
///
/// let container = Container::new();
/// container.register(Definition::new("greeting").value("hello".to_string())).unwrap();
///
/// let bindings = Bindings::new()
///     .bind("greeting", "greeting", |h: &mut Handler, v: Arc<String>| h.greeting = Some(v));
/// let mut handler = Handler::default();
/// container.inject(&mut handler, &bindings).unwrap();
/// assert_eq!(handler.greeting.as_deref().map(String::as_str), Some("hello"));
/// ```
pub struct Bindings<T> {
    bindings: Vec<Binding<T>>,
}

impl<T> Bindings<T> {
    pub fn new() -> Self {
        Bindings {
            bindings: Vec::new(),
        }
    }

    /// Assigns the service named `dependency` to `field` through `set`.
    pub fn bind<V, F>(mut self, field: &'static str, dependency: impl Into<String>, set: F) -> Self
    where
        T: 'static,
        V: Send + Sync + 'static,
        F: Fn(&mut T, Arc<V>) + Send + Sync + 'static,
    {
        let dependency = dependency.into();
        let name = dependency.clone();
        self.bindings.push(Binding {
            field,
            dependency,
            assign: Box::new(move |target: &mut T, instance: Instance| {
                set(target, expect::<V>(&name, instance)?);
                Ok(())
            }),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn apply<R>(&self, target: &mut T, mut resolve: R) -> Result<(), Error>
    where
        R: FnMut(&str) -> Result<Instance, Error>,
    {
        for binding in &self.bindings {
            tracing::trace!(field = binding.field, dependency = %binding.dependency, "inject field");
            let instance = resolve(&binding.dependency)?;
            (binding.assign)(target, instance)?;
        }
        Ok(())
    }
}

impl<T> Default for Bindings<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Bindings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.bindings.iter().map(|b| (b.field, &b.dependency)))
            .finish()
    }
}
