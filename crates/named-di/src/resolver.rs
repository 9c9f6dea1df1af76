use crate::cache::{Cache, Record};
use crate::error::Error;
use crate::flight::Flights;
use crate::helpers::Instance;
use crate::provider::{Service, ServiceKind};
use crate::reference::{Reference, Refs};
use crate::registry::Registry;
use std::panic;
use std::sync::Arc;
use std::thread;

/// Resolution engine: registered services, memoized singletons and the
/// single-flight group guarding their construction.
#[derive(Default)]
pub(crate) struct Resolver {
    pub(crate) registry: Registry,
    pub(crate) cache: Cache,
    flights: Flights<Record>,
}

impl Resolver {
    pub(crate) fn register(&self, service: Service) {
        let name = service.name.clone();
        tracing::debug!(
            name = %service.name,
            singleton = service.singleton,
            refs = service.refs.len(),
            "register service"
        );
        if self.registry.insert(service).is_some() {
            tracing::debug!(%name, "replaced previous registration");
        }
    }

    pub(crate) fn invoke(&self, name: &str) -> Record {
        let service = self
            .registry
            .lookup(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;

        if let ServiceKind::Value(ref instance) = service.kind {
            return Ok(instance.clone());
        }

        if !service.singleton {
            return self.evaluate(&service);
        }

        if let Some(record) = self.cache.get(name) {
            tracing::trace!(name, "singleton cache hit");
            return record;
        }

        self.flights.work(name, || {
            // A previous leader may have published while we were queuing up.
            if let Some(record) = self.cache.get(name) {
                return record;
            }
            tracing::debug!(name, "constructing singleton");
            // Dependency failures reach the waiting callers but are not cached;
            // only an outcome of the constructor itself is memoized.
            let args = self.resolve(&service.refs)?;
            let record = self.construct(&service, args);
            if let Err(ref err) = record {
                tracing::debug!(name, error = %err, "singleton construction failed, caching error");
            }
            self.cache.put(name, record.clone());
            record
        })
    }

    pub(crate) fn evaluate(&self, service: &Service) -> Record {
        let args = self.resolve(&service.refs)?;
        self.construct(service, args)
    }

    fn construct(&self, service: &Service, args: Vec<Instance>) -> Record {
        match service.kind {
            ServiceKind::Value(ref instance) => Ok(instance.clone()),
            ServiceKind::Constructor(ref constructor) => {
                tracing::debug!(name = %service.name, args = args.len(), "invoke constructor");
                constructor.invoke(&service.name, args)
            }
        }
    }

    /// Resolves `refs` into constructor arguments, in slot order.
    fn resolve(&self, refs: &Refs) -> Result<Vec<Instance>, Error> {
        let mut args = Vec::with_capacity(refs.len());
        for reference in refs {
            match reference {
                Reference::Single(name) => args.push(self.invoke(name)?),
                Reference::Parallel(names) => args.extend(self.resolve_parallel(names)?),
            }
        }
        Ok(args)
    }

    /// Resolves every member of a parallel group on its own thread and waits for
    /// all of them. Results are inspected in declared order, so the reported
    /// error is the first failing member's, not the first to finish.
    fn resolve_parallel(&self, names: &[String]) -> Result<Vec<Instance>, Error> {
        tracing::debug!(members = names.len(), "resolve parallel group");
        let records: Vec<Record> = thread::scope(|scope| {
            let handles: Vec<_> = names
                .iter()
                .map(|name| scope.spawn(move || self.invoke(name)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect()
        });
        records.into_iter().collect()
    }
}

/// Type-checks a resolved instance against the caller's expected type.
pub(crate) fn expect<T>(name: &str, instance: Instance) -> Result<Arc<T>, Error>
where
    T: Send + Sync + 'static,
{
    crate::helpers::downcast::<T>(instance).ok_or_else(|| Error::TypeMismatch {
        name: name.to_owned(),
        expected: std::any::type_name::<T>(),
    })
}
