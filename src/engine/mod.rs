//! Engine lifecycle: build the pipeline from configuration, load definitions
//! into a registry at startup, reload on demand and tear down.

pub mod config;

pub use config::EngineConfig;

use crate::compiler::{Compiler, LocaleOverlay, StaticLocale};
use crate::core::{Result, WidgetError};
use crate::dsl::WidgetDescriptor;
use crate::loader::{LoadReport, Loader};
use crate::provider::Providers;
use crate::registry::WidgetRegistry;
use crate::web;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, event};

pub struct WidgetEngine {
    config: EngineConfig,
    loader: Loader,
    registry: Arc<WidgetRegistry>,
    initialized: AtomicBool,
}

impl WidgetEngine {
    /// Build an engine with an empty registry.
    ///
    /// When the configuration names a locale and the providers carry no
    /// language pack, the pack is read from `<root>/langs/<locale>`.
    pub fn new(config: EngineConfig, providers: Providers) -> Result<Self> {
        config.validate()?;

        let has_locales = providers.locales.is_some();
        let providers = match &config.locale {
            Some(locale) if !has_locales => {
                let overlay = LocaleOverlay::load(
                    &config.langs_dir(),
                    locale,
                    config.kind,
                    &config.id_prefix,
                )?;
                providers.with_locales(Arc::new(StaticLocale::new(overlay)))
            }
            _ => providers,
        };

        let compiler = Compiler::new(config.kind, &config.api_namespace, providers);
        let loader = Loader::new(compiler, config.extensions.clone(), config.parallel);

        Ok(Self {
            config,
            loader,
            registry: Arc::new(WidgetRegistry::new()),
            initialized: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle for request handlers.
    pub fn registry(&self) -> Arc<WidgetRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// First load of the configured directory.
    pub fn init(&self) -> Result<LoadReport> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(WidgetError::Config("engine already initialized".to_string()));
        }
        event!(Level::INFO, root = %self.config.root.display(), kind = %self.config.kind, "engine init");
        self.reload()
    }

    /// Load the configured directory again.
    ///
    /// Entries are replaced one ID at a time; IDs whose files disappeared stay
    /// registered until [`teardown`](Self::teardown).
    pub fn reload(&self) -> Result<LoadReport> {
        self.load_from(&self.config.widget_dir(), &self.config.id_prefix)
    }

    /// Load an extra directory, e.g. a plugin's definitions under its own prefix.
    pub fn load_from(&self, dir: &Path, prefix: &str) -> Result<LoadReport> {
        self.loader.load(dir, prefix, &self.registry).into_result()
    }

    /// [`reload`](Self::reload) on the blocking pool, for async hosts.
    pub async fn reload_async(self: Arc<Self>) -> Result<LoadReport> {
        tokio::task::spawn_blocking(move || self.reload())
            .await
            .map_err(|e| WidgetError::Io(format!("reload task failed: {}", e)))?
    }

    pub fn teardown(&self) -> Result<()> {
        self.registry.clear()?;
        self.initialized.store(false, Ordering::SeqCst);
        event!(Level::INFO, "engine teardown");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Arc<WidgetDescriptor>> {
        self.registry.get(id)
    }

    pub fn must_get(&self, id: &str) -> web::Result<Arc<WidgetDescriptor>> {
        self.registry.must_get(id)
    }
}
