use crate::core::WidgetError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A definition file found under the load root.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionFile {
    pub path: PathBuf,
    /// Path relative to the load root, `/`-separated.
    pub relative: String,
    pub id: String,
}

/// Files found by a walk, plus the entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DefinitionFile>,
    pub errors: Vec<WidgetError>,
}

/// Walk `root` recursively for files ending in one of `extensions`.
///
/// Results are sorted by path so IDs and error order are stable across runs.
pub fn discover(root: &Path, extensions: &[String], prefix: &str) -> Discovery {
    let mut discovery = Discovery::default();

    if !root.is_dir() {
        discovery
            .errors
            .push(WidgetError::Io(format!("{} does not exist", root.display())));
        return discovery;
    }

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                discovery.errors.push(WidgetError::Io(err.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(relative) = relative_path(root, path) else {
            continue;
        };
        let Some(id) = derive_id(&relative, extensions, prefix) else {
            continue;
        };

        discovery.files.push(DefinitionFile {
            path: path.to_path_buf(),
            relative,
            id,
        });
    }

    discovery
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Widget ID of a definition file: the relative path without its extension,
/// separators turned into `.`, lower-cased and prefixed.
///
/// Returns `None` when the file carries none of the extensions.
pub fn derive_id(relative: &str, extensions: &[String], prefix: &str) -> Option<String> {
    let lower = relative.to_lowercase();
    let extension = extensions
        .iter()
        .filter(|ext| lower.ends_with(&ext.to_lowercase()))
        .max_by_key(|ext| ext.len())?;

    let stem = &lower[..lower.len() - extension.len()];
    let id = stem.replace(['/', '\\'], ".");
    Some(format!("{}{}", prefix, id))
}
