//! Mapping definitions and the filename → mapping selector

use crate::error::{DgwError, DgwResult};
use crate::mapping::alias::{resolve_column, AliasTable};
use std::collections::HashMap;
use std::fmt;

/// Record-type category a legacy file is mapped with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Hire,
    Contact,
    Worker,
    Absence,
    Compensation,
    Generic,
}

impl MappingKind {
    /// Selector priority order; `Generic` is the fallback
    pub const ALL: [MappingKind; 6] = [
        MappingKind::Hire,
        MappingKind::Contact,
        MappingKind::Worker,
        MappingKind::Absence,
        MappingKind::Compensation,
        MappingKind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MappingKind::Hire => "hire",
            MappingKind::Contact => "contact",
            MappingKind::Worker => "worker",
            MappingKind::Absence => "absence",
            MappingKind::Compensation => "compensation",
            MappingKind::Generic => "generic",
        }
    }

    /// Configuration file holding this kind's mapping
    pub fn file_name(&self) -> String {
        format!("mapping_{}.yaml", self.as_str())
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the mapping for a legacy filename (first trigger substring wins)
pub fn select_mapping(filename: &str) -> MappingKind {
    let name = filename.to_lowercase();
    MappingKind::ALL
        .into_iter()
        .find(|kind| *kind != MappingKind::Generic && name.contains(kind.as_str()))
        .unwrap_or(MappingKind::Generic)
}

/// One target column fed by the first present of several source columns
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub target: String,
    pub sources: Vec<String>,
}

impl MappingEntry {
    pub fn new(target: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            target: target.into(),
            sources,
        }
    }

    /// First declared source present in the sheet, each candidate also
    /// trying its shared aliases
    pub fn resolve_source<'a, S: AsRef<str>>(
        &self,
        present: &'a [S],
        aliases: &AliasTable,
    ) -> Option<&'a str> {
        self.sources
            .iter()
            .find_map(|source| resolve_column(present, source, aliases))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingDefinition {
    pub kind: MappingKind,
    pub entries: Vec<MappingEntry>,
}

impl MappingDefinition {
    pub fn new(kind: MappingKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Add sources for a target; repeated targets extend the candidate list
    pub fn add_sources(&mut self, target: &str, sources: Vec<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.target == target) {
            for source in sources {
                if !entry.sources.contains(&source) {
                    entry.sources.push(source);
                }
            }
        } else {
            self.entries.push(MappingEntry::new(target, sources));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loaded mapping definitions keyed by kind
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    definitions: HashMap<MappingKind, MappingDefinition>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: MappingDefinition) {
        self.definitions.insert(definition.kind, definition);
    }

    pub fn get(&self, kind: MappingKind) -> DgwResult<&MappingDefinition> {
        self.definitions
            .get(&kind)
            .ok_or_else(|| DgwError::ConfigurationMissing(kind.file_name()))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
