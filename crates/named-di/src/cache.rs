use crate::error::Error;
use crate::helpers::Instance;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Memoized outcome of a singleton constructor. Failures are kept as well.
pub(crate) type Record = Result<Instance, Error>;

/// Singleton results by service name. Entries are never evicted.
#[derive(Default)]
pub(crate) struct Cache {
    data: RwLock<HashMap<String, Record>>,
}

impl Cache {
    pub(crate) fn get(&self, name: &str) -> Option<Record> {
        self.data.read().get(name).cloned()
    }

    pub(crate) fn put(&self, name: &str, record: Record) {
        self.data.write().insert(name.to_owned(), record);
    }

    pub(crate) fn clear(&self) {
        self.data.write().clear();
    }
}
