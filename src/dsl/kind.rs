use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of widget kinds served by the engine.
///
/// The kind decides the definition directory (`tables/`), the default process
/// names (`yao.table.Search`) and the API path segment (`/api/__yao/table/...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    #[default]
    Table,
    Form,
    List,
    Chart,
    Dashboard,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 5] = [
        WidgetKind::Table,
        WidgetKind::Form,
        WidgetKind::List,
        WidgetKind::Chart,
        WidgetKind::Dashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Form => "form",
            Self::List => "list",
            Self::Chart => "chart",
            Self::Dashboard => "dashboard",
        }
    }

    /// Directory under the application root holding this kind's definitions.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Table => "tables",
            Self::Form => "forms",
            Self::List => "lists",
            Self::Chart => "charts",
            Self::Dashboard => "dashboards",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WidgetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        WidgetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower || kind.dir_name() == lower)
            .ok_or_else(|| format!("Unknown widget kind '{}'", s))
    }
}
