//! Batch loading: discover definition files, compile each one independently
//! and publish the survivors into a registry.

pub mod discovery;
pub mod report;

pub use discovery::{DefinitionFile, Discovery, derive_id, discover};
pub use report::LoadReport;

use crate::compiler::{Compiler, IdClaims};
use crate::core::{Result, WidgetError};
use crate::dsl::WidgetDescriptor;
use crate::registry::WidgetRegistry;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{Level, event, info_span};

pub struct Loader {
    compiler: Compiler,
    extensions: Vec<String>,
    parallel: bool,
}

impl Loader {
    pub fn new(compiler: Compiler, extensions: Vec<String>, parallel: bool) -> Self {
        Self {
            compiler,
            extensions,
            parallel,
        }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Load every definition under `dir` into `registry`.
    ///
    /// Files compile in isolation, in parallel when enabled. IDs are checked
    /// for uniqueness once all pipelines are done, then valid widgets are
    /// published one at a time. A failing file is recorded in the report and
    /// never published; it does not stop the pass.
    pub fn load(&self, dir: &Path, prefix: &str, registry: &WidgetRegistry) -> LoadReport {
        let span = info_span!("widget.load", root = %dir.display(), kind = %self.compiler.kind());
        let _enter = span.enter();

        let mut report = LoadReport::start(dir.to_path_buf());

        let _pass = match registry.lock_loads() {
            Ok(guard) => guard,
            Err(err) => {
                report.failures.push(err);
                return report.finish();
            }
        };

        let found = discover(dir, &self.extensions, prefix);
        report.failures.extend(found.errors);
        event!(Level::DEBUG, files = found.files.len(), "definitions discovered");

        let compiled = self.compile_all(&found.files);

        let mut claims = IdClaims::new();
        for file in &found.files {
            claims.claim(&file.id, &file.relative);
        }
        report.failures.extend(claims.duplicates());

        for (file, result) in found.files.iter().zip(compiled) {
            if claims.is_duplicate(&file.id) {
                event!(Level::DEBUG, id = %file.id, file = %file.relative, "skipped duplicate id");
                continue;
            }

            match result.and_then(|widget| registry.publish(widget)) {
                Ok(()) => {
                    event!(Level::DEBUG, id = %file.id, "widget published");
                    report.loaded.push(file.id.clone());
                }
                Err(err) => {
                    event!(Level::WARN, id = %file.id, error = %err, "widget rejected");
                    report.failures.push(err);
                }
            }
        }

        let report = report.finish();
        event!(
            Level::INFO,
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            elapsed_ms = report.elapsed_ms(),
            "load finished"
        );
        report
    }

    fn compile_all(&self, files: &[DefinitionFile]) -> Vec<Result<WidgetDescriptor>> {
        if self.parallel {
            files.par_iter().map(|file| self.compile_file(file)).collect()
        } else {
            files.iter().map(|file| self.compile_file(file)).collect()
        }
    }

    fn compile_file(&self, file: &DefinitionFile) -> Result<WidgetDescriptor> {
        let data = fs::read(&file.path).map_err(|e| WidgetError::MalformedDefinition {
            id: file.id.clone(),
            message: format!("cannot read {}: {}", file.relative, e),
        })?;
        self.compiler.compile(&file.id, &data)
    }
}
