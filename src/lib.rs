// ============================================================================
// widgetc: widget definition compiler
// ============================================================================

pub mod core;
pub mod dsl;
pub mod provider;
pub mod compiler;
pub mod loader;
pub mod registry;
pub mod engine;
pub mod web;

// Re-export main types for convenience
pub use core::{BatchError, Result, Value, WidgetError};
pub use dsl::{Operation, Route, WidgetDescriptor, WidgetKind};
pub use compiler::{Compiler, LocaleOverlay, Locales, StaticLocale};
pub use loader::{LoadReport, Loader};
pub use registry::WidgetRegistry;
pub use engine::{EngineConfig, WidgetEngine};
pub use web::ApiError;

// Re-export collaborator contracts
pub use provider::{
    DataSource, DataSources, MemorySources, Process, ProcessTable, Processes, Providers,
    SchemaColumn, SourceKind,
};
