// Core data models for apilens
// Immutable value types for a parsed API description and the artifacts
// derived from it (classifications and call flows)

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A parsed OpenAPI description. Built once by the converter; the classifier
/// returns a new copy with derived fields filled in rather than mutating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiSpec {
    pub version: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub servers: Vec<String>,
    pub endpoints: Vec<ApiEndpoint>,
    pub schemas: BTreeMap<String, SchemaDefinition>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

/// A single endpoint (path + method). Uniqueness of `(path, method)` is not
/// enforced; a malformed source document may yield duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub path: String,
    /// Upper-cased HTTP verb.
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<ApiParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyDefinition>,
    pub responses: BTreeMap<String, ResponseDefinition>,
    /// OR of AND-groups, standard OpenAPI security-requirement semantics.
    /// Non-empty means the endpoint is protected.
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Derived by the classifier; LOW until classification runs.
    pub data_sensitivity: SensitivityLevel,
    /// Derived by the classifier; empty until classification runs.
    pub classification: Vec<DataClassification>,
}

/// A parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: SchemaDefinition,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<DataClassification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Cookie,
}

/// A request body with its media-type map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBodyDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub content: BTreeMap<String, MediaTypeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: BTreeMap<String, MediaTypeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTypeDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDefinition>,
}

/// A schema tree. `ref` is a pointer into `OpenApiSpec.schemas` by name,
/// never an in-memory reference: component schemas may be mutually
/// referential, and resolution happens by name lookup at traversal time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaDefinition>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub schema_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
}

/// A security scheme from the components section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    pub scopes: BTreeMap<String, String>,
}

/// Classification attached to one field path. Created once by the
/// classifier, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataClassification {
    /// Dot-separated path from the endpoint root, e.g. `user.profile.email`.
    pub field_path: String,
    pub category: DataCategory,
    pub sensitivity: SensitivityLevel,
    pub reason: String,
}

/// Taxonomic class of a data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataCategory {
    Pii,
    Auth,
    Financial,
    Admin,
    Identifier,
    Public,
    Unknown,
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCategory::Pii => write!(f, "PII"),
            DataCategory::Auth => write!(f, "AUTH"),
            DataCategory::Financial => write!(f, "FINANCIAL"),
            DataCategory::Admin => write!(f, "ADMIN"),
            DataCategory::Identifier => write!(f, "IDENTIFIER"),
            DataCategory::Public => write!(f, "PUBLIC"),
            DataCategory::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Ordinal severity of data exposure risk. Variant order gives the total
/// order used for max-aggregation: CRITICAL > HIGH > MEDIUM > LOW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensitivityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitivityLevel::Low => write!(f, "LOW"),
            SensitivityLevel::Medium => write!(f, "MEDIUM"),
            SensitivityLevel::High => write!(f, "HIGH"),
            SensitivityLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// An inferred, ordered sequence of endpoint calls. Flow identity is the
/// `name` string: the analyzer keeps the first flow per name and drops
/// later ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFlow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<FlowStep>,
    /// Union of security-scheme names across all steps; scopes are dropped.
    pub required_roles: BTreeSet<String>,
}

/// Single step in a flow, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub endpoint: ApiEndpoint,
    pub step_number: u32,
}
