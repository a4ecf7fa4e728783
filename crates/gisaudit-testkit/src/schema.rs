//! JSON schema validators for gisaudit DTOs.
//!
//! Schemas are generated from the schemars derives at call time, so they
//! always match the compiled types.

use jsonschema::JSONSchema;
use schemars::schema_for;

use gisaudit_types::{AuditReport, ConfigFile};

/// Error type for schema validation failures.
#[derive(Debug)]
pub struct SchemaValidationError {
    /// The validation errors.
    pub errors: Vec<String>,
}

impl std::fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Schema validation failed: {}", self.errors.join("; "))
    }
}

impl std::error::Error for SchemaValidationError {}

fn compile(schema: schemars::schema::RootSchema) -> JSONSchema {
    let value = serde_json::to_value(schema).expect("schema should serialize to JSON");
    JSONSchema::compile(&value).expect("schema should compile")
}

/// Validate an AuditReport against its JSON schema.
pub fn validate_audit_report(report: &AuditReport) -> Result<(), SchemaValidationError> {
    let schema = compile(schema_for!(AuditReport));
    let json_value = serde_json::to_value(report).expect("AuditReport should serialize to JSON");
    validate_with_schema(&schema, &json_value)
}

/// Validate a ConfigFile against its JSON schema.
pub fn validate_config_file(config: &ConfigFile) -> Result<(), SchemaValidationError> {
    let schema = compile(schema_for!(ConfigFile));
    let json_value = serde_json::to_value(config).expect("ConfigFile should serialize to JSON");
    validate_with_schema(&schema, &json_value)
}

/// Validate any JSON value against the AuditReport schema.
pub fn validate_report_json(json: &serde_json::Value) -> Result<(), SchemaValidationError> {
    let schema = compile(schema_for!(AuditReport));
    validate_with_schema(&schema, json)
}

fn validate_with_schema(
    schema: &JSONSchema,
    json: &serde_json::Value,
) -> Result<(), SchemaValidationError> {
    match schema.validate(json) {
        Ok(()) => Ok(()),
        Err(errors) => Err(SchemaValidationError {
            errors: errors.map(|e| e.to_string()).collect(),
        }),
    }
}
