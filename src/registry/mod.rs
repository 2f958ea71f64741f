use crate::core::{Result, Value, WidgetError};
use crate::dsl::WidgetDescriptor;
use crate::web::{self, ApiError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

type Entries = HashMap<String, Arc<WidgetDescriptor>>;

/// Compiled widgets by ID.
///
/// Readers take a short read lock to clone an `Arc` out of the current map.
/// Publishing swaps a single entry, copy-on-write: a snapshot handed out
/// earlier keeps seeing the map it was taken from. Load passes are serialized
/// through a separate lock so reads never wait on a whole pass.
pub struct WidgetRegistry {
    entries: RwLock<Arc<Entries>>,
    loads: Mutex<()>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(HashMap::new())),
            loads: Mutex::new(()),
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<WidgetDescriptor>> {
        self.entries
            .read()?
            .get(id)
            .cloned()
            .ok_or_else(|| WidgetError::NotFound(id.to_string()))
    }

    /// Like [`get`](Self::get), for request handlers: a missing widget is the
    /// caller's mistake and comes back as a 400.
    pub fn must_get(&self, id: &str) -> web::Result<Arc<WidgetDescriptor>> {
        self.get(id).map_err(ApiError::from)
    }

    /// Look up the widget named by the first argument of a process call.
    pub fn get_from_args(&self, args: &[Value]) -> Result<Arc<WidgetDescriptor>> {
        match args.first() {
            Some(Value::Text(id)) => self.get(id),
            Some(other) => Err(WidgetError::NotFound(other.to_string())),
            None => Err(WidgetError::NotFound(String::new())),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    /// Registered IDs, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = match self.entries.read() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole map as of now; unaffected by later publications.
    pub fn snapshot(&self) -> Result<Arc<Entries>> {
        Ok(Arc::clone(&*self.entries.read()?))
    }

    /// Install a compiled widget, replacing any previous one with the same ID.
    pub(crate) fn publish(&self, widget: WidgetDescriptor) -> Result<()> {
        if !widget.is_merged() {
            return Err(WidgetError::Validation {
                id: widget.id().to_string(),
                violations: vec!["widget was not compiled".to_string()],
            });
        }

        let widget = Arc::new(widget);
        let mut entries = self.entries.write()?;
        Arc::make_mut(&mut *entries).insert(widget.id().to_string(), widget);
        Ok(())
    }

    pub(crate) fn lock_loads(&self) -> Result<MutexGuard<'_, ()>> {
        Ok(self.loads.lock()?)
    }

    /// Drop every entry. Waits for a running load pass to finish first.
    pub fn clear(&self) -> Result<()> {
        let _pass = self.lock_loads()?;
        *self.entries.write()? = Arc::new(HashMap::new());
        Ok(())
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
