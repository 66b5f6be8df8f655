use thiserror::Error;

pub type DgwResult<T> = Result<T, DgwError>;

#[derive(Error, Debug)]
pub enum DgwError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Workbook read error: {0}")]
    WorkbookRead(String),

    #[error("Workbook write error: {0}")]
    WorkbookWrite(String),

    #[error("Rule evaluation error: {0}")]
    RuleEvaluation(String),

    #[error("Output directory error: {0}")]
    OutputDirectory(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl DgwError {
    /// Errors that must stop a whole run instead of being captured per file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DgwError::OutputDirectory(_))
    }
}
