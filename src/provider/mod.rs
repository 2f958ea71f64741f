//! Contracts of the collaborators the compiler consults: the data-access
//! layer (models and stores), the process/scripting layer and the active
//! language pack. In-memory implementations are provided for embedding and
//! tests; a host application plugs in its own.

pub mod data;
pub mod process;

pub use data::{DataSource, DataSources, MemorySource, MemorySources, SchemaColumn, SourceKind};
pub use process::{FnProcess, Process, ProcessError, ProcessTable, Processes};

use crate::compiler::localize::{LocaleOverlay, Locales};
use std::sync::Arc;

/// Everything the per-file pipeline needs from the outside world.
#[derive(Clone)]
pub struct Providers {
    pub sources: Arc<dyn DataSources>,
    pub processes: Arc<dyn Processes>,
    pub locales: Option<Arc<dyn Locales>>,
}

impl Providers {
    pub fn new(sources: Arc<dyn DataSources>, processes: Arc<dyn Processes>) -> Self {
        Self {
            sources,
            processes,
            locales: None,
        }
    }

    pub fn with_locales(mut self, locales: Arc<dyn Locales>) -> Self {
        self.locales = Some(locales);
        self
    }

    /// Language pack to apply, if one is active.
    pub fn active_locale(&self) -> Option<Arc<LocaleOverlay>> {
        self.locales.as_ref().and_then(|locales| locales.active_locale())
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new(Arc::new(MemorySources::new()), Arc::new(ProcessTable::new()))
    }
}
