use crate::core::{Result, WidgetError};
use crate::dsl::WidgetKind;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Engine configuration
///
/// Where definitions live, which widget kind they are and how their endpoints
/// are named.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Application root; definitions are read from `<root>/<kind dir>`
    pub root: PathBuf,

    /// Widget kind loaded by this engine
    pub kind: WidgetKind,

    /// API namespace used in synthesized paths (`/api/<namespace>/...`)
    pub api_namespace: String,

    /// Prepended to every derived widget ID
    pub id_prefix: String,

    /// Definition file extensions, with the leading dot
    pub extensions: Vec<String>,

    /// Compile files on the rayon pool
    pub parallel: bool,

    /// Language pack to apply, read from `<root>/langs/<locale>`
    pub locale: Option<String>,
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: WidgetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn api_namespace(mut self, namespace: &str) -> Self {
        self.api_namespace = namespace.to_string();
        self
    }

    pub fn id_prefix(mut self, prefix: &str) -> Self {
        self.id_prefix = prefix.to_string();
        self
    }

    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|ext| ext.to_string()).collect();
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    /// Directory holding this kind's definitions.
    pub fn widget_dir(&self) -> PathBuf {
        self.root.join(self.kind.dir_name())
    }

    pub fn langs_dir(&self) -> PathBuf {
        self.root.join("langs")
    }

    /// Read overrides from `WIDGETC_ROOT`, `WIDGETC_KIND`, `WIDGETC_NAMESPACE`,
    /// `WIDGETC_PREFIX`, `WIDGETC_LOCALE` and `WIDGETC_PARALLEL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup("WIDGETC_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(kind) = lookup("WIDGETC_KIND") {
            config.kind = WidgetKind::from_str(&kind).map_err(WidgetError::Config)?;
        }
        if let Some(namespace) = lookup("WIDGETC_NAMESPACE") {
            config.api_namespace = namespace;
        }
        if let Some(prefix) = lookup("WIDGETC_PREFIX") {
            config.id_prefix = prefix;
        }
        if let Some(locale) = lookup("WIDGETC_LOCALE").filter(|l| !l.is_empty()) {
            config.locale = Some(locale);
        }
        if let Some(parallel) = lookup("WIDGETC_PARALLEL") {
            config.parallel = match parallel.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(WidgetError::Config(format!(
                        "WIDGETC_PARALLEL must be a boolean, got '{}'",
                        other
                    )));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(WidgetError::Config("root must not be empty".to_string()));
        }
        if self.api_namespace.is_empty() || self.api_namespace.contains('/') {
            return Err(WidgetError::Config(format!(
                "invalid api namespace '{}'",
                self.api_namespace
            )));
        }
        if self.extensions.is_empty() {
            return Err(WidgetError::Config(
                "at least one definition extension is required".to_string(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|ext| !ext.starts_with('.') || ext.len() < 2) {
            return Err(WidgetError::Config(format!(
                "extension '{}' must start with '.'",
                ext
            )));
        }
        if let Some(locale) = &self.locale {
            if locale.contains(['/', '\\']) || Path::new(locale).components().count() != 1 {
                return Err(WidgetError::Config(format!("invalid locale '{}'", locale)));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            kind: WidgetKind::Table,
            api_namespace: "__yao".to_string(),
            id_prefix: String::new(),
            extensions: vec![".json".to_string(), ".yao".to_string()],
            parallel: true,
            locale: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.api_namespace, "__yao");
        assert_eq!(config.widget_dir(), PathBuf::from(".").join("tables"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new("/app")
            .kind(WidgetKind::Form)
            .id_prefix("plugin.")
            .extensions(&[".json"])
            .parallel(false)
            .locale("zh-cn");

        assert_eq!(config.widget_dir(), PathBuf::from("/app/forms"));
        assert_eq!(config.langs_dir(), PathBuf::from("/app/langs"));
        assert_eq!(config.id_prefix, "plugin.");
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(EngineConfig::default().api_namespace("").validate().is_err());
        assert!(EngineConfig::default().api_namespace("a/b").validate().is_err());
        assert!(EngineConfig::default().extensions(&[]).validate().is_err());
        assert!(EngineConfig::default().extensions(&["json"]).validate().is_err());
        assert!(EngineConfig::default().locale("../etc").validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("WIDGETC_ROOT", "/srv/app"),
            ("WIDGETC_KIND", "forms"),
            ("WIDGETC_PARALLEL", "off"),
            ("WIDGETC_LOCALE", "en-us"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/app"));
        assert_eq!(config.kind, WidgetKind::Form);
        assert!(!config.parallel);
        assert_eq!(config.locale.as_deref(), Some("en-us"));

        let err = EngineConfig::from_lookup(|key| {
            (key == "WIDGETC_PARALLEL").then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, WidgetError::Config(_)));
    }
}
