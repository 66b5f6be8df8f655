//! Project settings and the YAML configuration files consumed by the engines
//!
//! Nothing here is global: callers load values once and hand them to
//! [`crate::core::TransformEngine`] and [`crate::core::RuleEngine`].

use crate::core::header::{HeaderMode, DEFAULT_MAX_SCAN};
use crate::core::rules::{Rule, RuleRegistry};
use crate::error::{DgwError, DgwResult};
use crate::layout::LayoutConvention;
use crate::mapping::{AliasTable, MappingDefinition, MappingKind, MappingRegistry};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings file looked up in the working directory when `--config` is absent
pub const DEFAULT_SETTINGS_FILE: &str = "dgw.yaml";

//==============================================================================
// Settings
//==============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub incoming: PathBuf,
    pub templates: PathBuf,
    pub curated: PathBuf,
    pub outputs: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            incoming: PathBuf::from("data/incoming"),
            templates: PathBuf::from("data/templates_dgw"),
            curated: PathBuf::from("data/curated"),
            outputs: PathBuf::from("outputs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigFiles {
    pub mappings_dir: PathBuf,
    pub rules_file: PathBuf,
    pub aliases_file: PathBuf,
}

impl Default for ConfigFiles {
    fn default() -> Self {
        Self {
            mappings_dir: PathBuf::from("config/mappings"),
            rules_file: PathBuf::from("config/rules_global.yaml"),
            aliases_file: PathBuf::from("config/field_mappings.yaml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub failures_csv: bool,
    pub previews: bool,
    pub preview_rows: usize,
    pub summary_json: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            failures_csv: true,
            previews: false,
            preview_rows: 20,
            summary_json: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub config: ConfigFiles,
    pub layout: LayoutConvention,
    pub source_header: HeaderMode,
    pub header_scan_rows: usize,
    pub reports: ReportSettings,
    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            config: ConfigFiles::default(),
            layout: LayoutConvention::default(),
            source_header: HeaderMode::default(),
            header_scan_rows: DEFAULT_MAX_SCAN,
            reports: ReportSettings::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `dgw.yaml` when it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> DgwResult<Self> {
        let path = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(DgwError::ConfigurationMissing(explicit.display().to_string()));
                }
                explicit.to_path_buf()
            }
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !default.exists() {
                    debug!("no {} found, using defaults", DEFAULT_SETTINGS_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)?;
        let mut settings = Self::parse(&content)?;
        settings.base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        info!(settings = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parse settings YAML; an empty document means all defaults
    pub fn parse(content: &str) -> DgwResult<Self> {
        let settings: Settings = if content.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(content)?
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> DgwResult<()> {
        self.layout.validate()?;
        if self.header_scan_rows == 0 {
            return Err(DgwError::InvalidConfiguration(
                "header_scan_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a configured path against [`Settings::base_dir`]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn incoming_dir(&self) -> PathBuf {
        self.resolve(&self.paths.incoming)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve(&self.paths.templates)
    }

    pub fn curated_dir(&self) -> PathBuf {
        self.resolve(&self.paths.curated)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.resolve(&self.paths.outputs)
    }

    pub fn mappings_dir(&self) -> PathBuf {
        self.resolve(&self.config.mappings_dir)
    }

    pub fn rules_file(&self) -> PathBuf {
        self.resolve(&self.config.rules_file)
    }

    pub fn aliases_file(&self) -> PathBuf {
        self.resolve(&self.config.aliases_file)
    }
}

//==============================================================================
// Mapping files
//==============================================================================

/// Load every `mapping_<kind>.yaml` present in `dir`.
///
/// Absent files are not an error here; selecting that kind later is.
pub fn load_mapping_registry(dir: &Path) -> DgwResult<MappingRegistry> {
    let mut registry = MappingRegistry::new();

    for kind in MappingKind::ALL {
        let path = dir.join(kind.file_name());
        if !path.exists() {
            debug!(mapping = %path.display(), "mapping file absent");
            continue;
        }
        let content = fs::read_to_string(&path)?;
        let definition = parse_mapping(kind, &content).map_err(|e| with_file(e, &path))?;
        debug!(mapping = %kind, entries = definition.len(), "mapping loaded");
        registry.insert(definition);
    }

    if registry.is_empty() {
        warn!(dir = %dir.display(), "no mapping files found");
    }
    Ok(registry)
}

/// Parse one mapping file.
///
/// Accepted shapes: `mappings: {target: source | [source, ...]}` with an
/// optional `aliases: {target: [source, ...]}` section, or a bare
/// `{target: source}` document.
pub fn parse_mapping(kind: MappingKind, content: &str) -> DgwResult<MappingDefinition> {
    let yaml: Value = serde_yaml::from_str(content)?;
    let mut definition = MappingDefinition::new(kind);

    let Some(root) = as_mapping(&yaml, "mapping file")? else {
        return Ok(definition);
    };

    let explicit = root.contains_key("mappings") || root.contains_key("aliases");
    if explicit {
        for section in ["mappings", "aliases"] {
            let Some(value) = root.get(section) else {
                continue;
            };
            if let Some(section_map) = as_mapping(value, section)? {
                add_mapping_entries(&mut definition, section_map.iter())?;
            }
        }
    } else {
        add_mapping_entries(&mut definition, root.iter())?;
    }

    Ok(definition)
}

fn add_mapping_entries<'a>(
    definition: &mut MappingDefinition,
    entries: impl Iterator<Item = (&'a Value, &'a Value)>,
) -> DgwResult<()> {
    for (key, value) in entries {
        let target = key_string(key)?;
        let sources = string_list(value, &target)?;
        if sources.is_empty() {
            continue;
        }
        definition.add_sources(&target, sources);
    }
    Ok(())
}

//==============================================================================
// Alias file
//==============================================================================

/// Load the shared alias table; a missing file means no aliases
pub fn load_alias_table(path: &Path) -> DgwResult<AliasTable> {
    if !path.exists() {
        warn!(aliases = %path.display(), "no alias file found, proceeding without aliases");
        return Ok(AliasTable::new());
    }
    let content = fs::read_to_string(path)?;
    let table = parse_alias_table(&content).map_err(|e| with_file(e, path))?;
    debug!(aliases = table.len(), "aliases loaded");
    Ok(table)
}

/// Parse `aliases: {logical: [physical, ...]}` (a bare mapping is accepted)
pub fn parse_alias_table(content: &str) -> DgwResult<AliasTable> {
    let yaml: Value = serde_yaml::from_str(content)?;
    let mut table = AliasTable::new();

    let Some(root) = as_mapping(&yaml, "alias file")? else {
        return Ok(table);
    };
    let entries = match root.get("aliases") {
        Some(section) => match as_mapping(section, "aliases")? {
            Some(map) => map,
            None => return Ok(table),
        },
        None => root,
    };

    for (key, value) in entries {
        let logical = key_string(key)?;
        table.insert(logical.clone(), string_list(value, &logical)?);
    }
    Ok(table)
}

//==============================================================================
// Rule file
//==============================================================================

/// Load the shared rule registry; the file is required
pub fn load_rule_registry(path: &Path) -> DgwResult<RuleRegistry> {
    if !path.exists() {
        return Err(DgwError::ConfigurationMissing(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let registry = parse_rule_registry(&content).map_err(|e| with_file(e, path))?;
    info!(
        fields = registry.fields().len(),
        expectations = registry.expectation_count(),
        "rules loaded"
    );
    Ok(registry)
}

/// Parse `{field: {expectations: [...], pattern?: str, allowed_values?: [...]}}`
pub fn parse_rule_registry(content: &str) -> DgwResult<RuleRegistry> {
    let yaml: Value = serde_yaml::from_str(content)?;
    let mut registry = RuleRegistry::new();

    let Some(root) = as_mapping(&yaml, "rule file")? else {
        return Ok(registry);
    };

    for (key, value) in root {
        let field = key_string(key)?;
        let definition = as_mapping(value, &field)?.ok_or_else(|| {
            DgwError::InvalidConfiguration(format!("Field '{}' has no rule definition", field))
        })?;

        let tags = match definition.get("expectations") {
            Some(value) => string_list(value, &field)?,
            None => {
                return Err(DgwError::InvalidConfiguration(format!(
                    "Field '{}' is missing 'expectations'",
                    field
                )))
            }
        };

        for tag in tags {
            registry.add_rule(&field, parse_rule(&field, &tag, definition)?);
        }
    }

    Ok(registry)
}

fn parse_rule(field: &str, tag: &str, definition: &Mapping) -> DgwResult<Rule> {
    match tag {
        "not_null" | "expect_column_values_to_not_be_null" => Ok(Rule::NotNull),
        "regex" | "expect_column_values_to_match_regex" => {
            let pattern = definition
                .get("pattern")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    DgwError::InvalidConfiguration(format!(
                        "Field '{}': regex rule requires a string 'pattern'",
                        field
                    ))
                })?;
            Ok(Rule::regex(pattern))
        }
        "allowed_set" | "in_set" | "expect_column_values_to_be_in_set" => {
            let values = definition.get("allowed_values").ok_or_else(|| {
                DgwError::InvalidConfiguration(format!(
                    "Field '{}': allowed-set rule requires 'allowed_values'",
                    field
                ))
            })?;
            Ok(Rule::allowed_set(string_list(values, field)?))
        }
        other => Err(DgwError::InvalidConfiguration(format!(
            "Field '{}': unknown expectation '{}'",
            field, other
        ))),
    }
}

//==============================================================================
// YAML helpers
//==============================================================================

/// A mapping node, `None` for null/empty documents
fn as_mapping<'a>(value: &'a Value, context: &str) -> DgwResult<Option<&'a Mapping>> {
    match value {
        Value::Mapping(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => Err(DgwError::InvalidConfiguration(format!(
            "'{}' must be a mapping, found {}",
            context,
            type_name(other)
        ))),
    }
}

fn key_string(key: &Value) -> DgwResult<String> {
    scalar_string(key).ok_or_else(|| {
        DgwError::InvalidConfiguration(format!("Keys must be strings, found {}", type_name(key)))
    })
}

/// A scalar or a sequence of scalars as strings
fn string_list(value: &Value, context: &str) -> DgwResult<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_string(item).ok_or_else(|| {
                    DgwError::InvalidConfiguration(format!(
                        "'{}' list items must be scalars, found {}",
                        context,
                        type_name(item)
                    ))
                })
            })
            .collect(),
        other => scalar_string(other).map(|s| vec![s]).ok_or_else(|| {
            DgwError::InvalidConfiguration(format!(
                "'{}' must be a string or a list, found {}",
                context,
                type_name(other)
            ))
        }),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Prefix configuration errors with the offending file
fn with_file(err: DgwError, path: &Path) -> DgwError {
    match err {
        DgwError::InvalidConfiguration(msg) => {
            DgwError::InvalidConfiguration(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}
