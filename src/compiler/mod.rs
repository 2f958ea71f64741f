//! Per-file compile pipeline: parse, bind, merge, validate, localize.
//!
//! Each stage either returns the widget ready for the next one or the first
//! error tagged with the widget ID. Nothing here touches the registry, so
//! pipelines for different files run independently.

pub mod bind;
pub mod localize;
pub mod merge;
pub mod validate;

pub use bind::Binder;
pub use localize::{LocaleOverlay, Locales, StaticLocale};
pub use merge::Merger;
pub use validate::{IdClaims, Validator};

use crate::core::Result;
use crate::dsl::{WidgetDescriptor, WidgetKind};
use crate::provider::Providers;
use tracing::{Level, event, info_span};

pub struct Compiler {
    kind: WidgetKind,
    namespace: String,
    providers: Providers,
}

impl Compiler {
    pub fn new(kind: WidgetKind, namespace: &str, providers: Providers) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            providers,
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Compile one definition document into a publishable descriptor.
    pub fn compile(&self, id: &str, data: &[u8]) -> Result<WidgetDescriptor> {
        let span = info_span!("widget.compile", id = %id, kind = %self.kind);
        let _enter = span.enter();

        let mut widget = WidgetDescriptor::parse(id, self.kind, data)?;

        Binder::new(self.providers.sources.as_ref(), self.providers.processes.as_ref())
            .bind(&mut widget)?;

        let mut widget = Merger::new(&self.namespace).merge(&widget)?;

        Validator::new(self.providers.processes.as_ref()).validate(&widget)?;

        if let Some(locale) = self.providers.active_locale() {
            locale.apply(&mut widget);
            event!(Level::DEBUG, locale = %locale.name, "localized");
        }

        event!(
            Level::DEBUG,
            fields = widget.fields.filter.len() + widget.fields.table.len(),
            cprops = widget.cprops.len(),
            "compiled"
        );
        Ok(widget)
    }
}
