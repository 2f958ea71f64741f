use crate::core::{Result, WidgetError};
use crate::dsl::{FieldCollection, Operation, WidgetDescriptor};
use crate::provider::Processes;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    static ref FILTER_BIND: Regex =
        Regex::new(r"^where\.([A-Za-z_][A-Za-z0-9_]*)\.([a-z]+)$").unwrap();
}

const FILTER_OPERATORS: [&str; 11] = [
    "eq", "ne", "gt", "ge", "lt", "le", "like", "match", "in", "null", "notnull",
];

/// Structural checks run on a bound and merged widget.
///
/// Every violation is collected, so a single error lists all the problems of
/// the definition.
pub struct Validator<'a> {
    processes: &'a dyn Processes,
}

impl<'a> Validator<'a> {
    pub fn new(processes: &'a dyn Processes) -> Self {
        Self { processes }
    }

    pub fn validate(&self, widget: &WidgetDescriptor) -> Result<()> {
        let mut violations = Vec::new();

        if widget.id().trim().is_empty() {
            violations.push("widget id is empty".to_string());
        }

        self.check_actions(widget, &mut violations);
        check_field_names(widget, &mut violations);
        check_layout(widget, &mut violations);
        check_compute_targets(widget, &mut violations);
        check_filter_binds(widget, &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(WidgetError::Validation {
                id: widget.id().to_string(),
                violations,
            })
        }
    }

    fn check_actions(&self, widget: &WidgetDescriptor, violations: &mut Vec<String>) {
        let kind = widget.kind();
        for op in Operation::ALL {
            match widget.action.binding(op) {
                None => violations.push(format!("action {} has no process", op.key())),
                Some(binding) if binding.process.trim().is_empty() => {
                    violations.push(format!("action {} has no process", op.key()))
                }
                Some(binding) if binding.is_defaulted() => {}
                Some(binding) => {
                    let builtin = Operation::ALL
                        .iter()
                        .any(|candidate| candidate.default_process(kind) == binding.process);
                    if !builtin && !self.processes.exists(&binding.process) {
                        violations.push(format!(
                            "action {}: process '{}' does not exist",
                            op.key(),
                            binding.process
                        ));
                    }
                }
            }
        }

        for (hook, process) in widget.action.hooks() {
            if !self.processes.exists(process) {
                violations.push(format!("hook {}: process '{}' does not exist", hook, process));
            }
        }
    }
}

fn check_field_names(widget: &WidgetDescriptor, violations: &mut Vec<String>) {
    for (collection, name, _) in widget.fields.iter() {
        if name.trim().is_empty() {
            violations.push(format!("fields.{} has a field without a name", collection));
        } else if name.contains('.') {
            violations.push(format!("fields.{}.{}: field names must not contain '.'", collection, name));
        }
    }
}

fn check_layout(widget: &WidgetDescriptor, violations: &mut Vec<String>) {
    for (collection, name) in widget.layout.referenced_fields() {
        if !widget.fields.collection(collection).contains_key(name) {
            violations.push(format!("layout.{}: field '{}' is not declared", collection, name));
        }
    }
}

fn check_compute_targets(widget: &WidgetDescriptor, violations: &mut Vec<String>) {
    let overlays = [("in", widget.computes_in()), ("out", widget.computes_out())];
    for (direction, computes) in overlays {
        for name in computes.keys() {
            if !widget.fields.contains(name) {
                violations.push(format!("computes.{}: field '{}' is not declared", direction, name));
            }
        }
    }
}

/// Filters bind to `where.<column>.<op>`; the column must be one a table field
/// binds or, for bound widgets, one of the source schema.
fn check_filter_binds(widget: &WidgetDescriptor, violations: &mut Vec<String>) {
    let filters = widget.fields.collection(FieldCollection::Filter);
    if filters.is_empty() {
        return;
    }

    let bound: BTreeSet<&str> = widget
        .fields
        .table
        .values()
        .filter_map(|field| field.bind.as_deref())
        .collect();
    let known = |column: &str| {
        bound.contains(column)
            || widget
                .source()
                .is_some_and(|source| source.column(column).is_some())
    };

    for (name, field) in filters {
        let Some(bind) = field.bind.as_deref() else {
            continue;
        };
        let Some(captures) = FILTER_BIND.captures(bind) else {
            violations.push(format!(
                "fields.filter.{}: bind '{}' is not of the form where.<column>.<op>",
                name, bind
            ));
            continue;
        };

        let column = &captures[1];
        let op = &captures[2];
        if !FILTER_OPERATORS.contains(&op) {
            violations.push(format!("fields.filter.{}: unknown operator '{}'", name, op));
        }
        if !known(column) {
            violations.push(format!("fields.filter.{}: unknown column '{}'", name, column));
        }
    }
}

// ============================================================================
// Batch uniqueness
// ============================================================================

/// Widget IDs claimed during one load pass, with the files claiming them.
#[derive(Debug, Default)]
pub struct IdClaims {
    claims: BTreeMap<String, Vec<String>>,
}

impl IdClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, id: &str, file: &str) {
        self.claims.entry(id.to_string()).or_default().push(file.to_string());
    }

    pub fn is_duplicate(&self, id: &str) -> bool {
        self.claims.get(id).is_some_and(|files| files.len() > 1)
    }

    /// One `DuplicateId` error per ID claimed by more than one file.
    pub fn duplicates(&self) -> Vec<WidgetError> {
        self.claims
            .iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(id, files)| WidgetError::DuplicateId {
                id: id.clone(),
                files: files.clone(),
            })
            .collect()
    }
}
