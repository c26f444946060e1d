// Data classification for API fields
// Deterministic, rule-based taxonomy: ordered name-pattern tables, schema
// format overrides, and content-signature regexes over declared patterns

use crate::models::{
    ApiEndpoint, ApiParameter, DataCategory, DataClassification, OpenApiSpec, SchemaDefinition,
    SensitivityLevel,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Nesting deeper than this stops contributing classifications. Silent
/// truncation, not an error.
const MAX_SCHEMA_DEPTH: u32 = 5;

// Field-name pattern sets, matched by substring over the lower-cased name.
const AUTH_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "token",
    "jwt",
    "bearer",
    "secret",
    "api_key",
    "apikey",
    "api-key",
    "authorization",
    "auth",
    "credential",
    "session",
    "cookie",
];

const PII_PATTERNS: &[&str] = &[
    "email",
    "mail",
    "phone",
    "mobile",
    "tel",
    "telephone",
    "address",
    "street",
    "city",
    "zip",
    "postal",
    "ssn",
    "social_security",
    "dob",
    "birthdate",
    "birth_date",
    "dateofbirth",
    "name",
    "firstname",
    "lastname",
    "fullname",
    "passport",
    "license",
    "driver",
];

const FINANCIAL_PATTERNS: &[&str] = &[
    "card",
    "credit",
    "debit",
    "cvv",
    "cvc",
    "security_code",
    "account",
    "iban",
    "routing",
    "payment",
    "billing",
    "price",
    "amount",
    "balance",
];

const ADMIN_PATTERNS: &[&str] = &[
    "admin",
    "administrator",
    "role",
    "permission",
    "scope",
    "privilege",
    "access_level",
    "sudo",
    "root",
];

const IDENTIFIER_PATTERNS: &[&str] = &[
    "id",
    "uuid",
    "guid",
    "identifier",
    "key",
    "reference",
    "ref",
];

// Name rules checked after AUTH and the format overrides, in this order.
const NAME_RULES: &[(&[&str], DataCategory)] = &[
    (PII_PATTERNS, DataCategory::Pii),
    (FINANCIAL_PATTERNS, DataCategory::Financial),
    (ADMIN_PATTERNS, DataCategory::Admin),
    (IDENTIFIER_PATTERNS, DataCategory::Identifier),
];

lazy_static! {
    // Content signatures tested against a declared schema `pattern` string
    // (not sample data), first match wins.
    static ref CONTENT_RULES: Vec<(Regex, DataCategory)> = vec![
        (
            Regex::new(r"(?i)[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            DataCategory::Pii,
        ),
        (
            Regex::new(r"\d{3}[-.]?\d{3}[-.]?\d{4}").unwrap(),
            DataCategory::Pii,
        ),
        (
            Regex::new(r"\d{3}-\d{2}-\d{4}").unwrap(),
            DataCategory::Pii,
        ),
        (
            Regex::new(r"\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}").unwrap(),
            DataCategory::Financial,
        ),
    ];
}

pub struct DataClassifier;

impl DataClassifier {
    /// Classify every endpoint of a spec. Returns a new spec; the input is
    /// never mutated.
    pub fn classify_spec(spec: &OpenApiSpec) -> OpenApiSpec {
        let endpoints = spec.endpoints.iter().map(Self::classify_endpoint).collect();
        OpenApiSpec {
            endpoints,
            ..spec.clone()
        }
    }

    /// Classify a single endpoint: parameters, then request-body schemas.
    /// `dataSensitivity` is the maximum over everything found (LOW if empty).
    pub fn classify_endpoint(endpoint: &ApiEndpoint) -> ApiEndpoint {
        let parameters: Vec<ApiParameter> = endpoint
            .parameters
            .iter()
            .map(|param| ApiParameter {
                classification: Self::classify_parameter(param),
                ..param.clone()
            })
            .collect();

        let mut classification: Vec<DataClassification> = parameters
            .iter()
            .filter_map(|param| param.classification.clone())
            .collect();

        if let Some(body) = &endpoint.request_body {
            for media in body.content.values() {
                if let Some(schema) = &media.schema {
                    classification.extend(Self::classify_schema(schema, "", 0));
                }
            }
        }

        let data_sensitivity = classification
            .iter()
            .map(|c| c.sensitivity)
            .max()
            .unwrap_or(SensitivityLevel::Low);

        debug!(
            method = %endpoint.method,
            path = %endpoint.path,
            fields = classification.len(),
            sensitivity = %data_sensitivity,
            "classified endpoint"
        );

        ApiEndpoint {
            parameters,
            data_sensitivity,
            classification,
            ..endpoint.clone()
        }
    }

    /// Classify one parameter. A name matching no rule yields `None`, not a
    /// classification tagged UNKNOWN.
    pub fn classify_parameter(param: &ApiParameter) -> Option<DataClassification> {
        let category = determine_category(&param.name, &param.schema);
        if category == DataCategory::Unknown {
            return None;
        }
        Some(DataClassification {
            field_path: param.name.clone(),
            category,
            sensitivity: sensitivity_for(category),
            reason: build_reason(&param.name, &param.schema, category),
        })
    }

    /// Walk a schema tree collecting classifications for every property that
    /// matches a rule. Only object-typed properties with nested `properties`
    /// are recursed into; arrays are not. Depth is capped.
    pub fn classify_schema(
        schema: &SchemaDefinition,
        base_path: &str,
        depth: u32,
    ) -> Vec<DataClassification> {
        if depth > MAX_SCHEMA_DEPTH {
            return Vec::new();
        }

        let mut classifications = Vec::new();
        let properties = match &schema.properties {
            Some(props) => props,
            None => return classifications,
        };

        for (prop_name, prop_schema) in properties {
            let field_path = if base_path.is_empty() {
                prop_name.clone()
            } else {
                format!("{}.{}", base_path, prop_name)
            };

            let category = determine_category(prop_name, prop_schema);
            if category != DataCategory::Unknown {
                classifications.push(DataClassification {
                    field_path: field_path.clone(),
                    category,
                    sensitivity: sensitivity_for(category),
                    reason: build_reason(prop_name, prop_schema, category),
                });
            }

            if prop_schema.schema_type.as_deref() == Some("object")
                && prop_schema.properties.is_some()
            {
                classifications.extend(Self::classify_schema(prop_schema, &field_path, depth + 1));
            }
        }

        classifications
    }
}

/// Ordered category dispatch. AUTH names outrank format hints; format hints
/// outrank the remaining name sets; declared-pattern signatures come last.
fn determine_category(field_name: &str, schema: &SchemaDefinition) -> DataCategory {
    let name = field_name.to_lowercase();

    if matches_any(&name, AUTH_PATTERNS) {
        return DataCategory::Auth;
    }

    if let Some(format) = &schema.format {
        match format.to_lowercase().as_str() {
            "password" => return DataCategory::Auth,
            "email" => return DataCategory::Pii,
            "uuid" | "uri" => return DataCategory::Identifier,
            _ => {}
        }
    }

    for (patterns, category) in NAME_RULES {
        if matches_any(&name, patterns) {
            return *category;
        }
    }

    if let Some(pattern) = &schema.pattern {
        for (signature, category) in CONTENT_RULES.iter() {
            if signature.is_match(pattern) {
                return *category;
            }
        }
    }

    DataCategory::Unknown
}

fn matches_any(name: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| name.contains(p))
}

/// Sensitivity is a pure function of category.
fn sensitivity_for(category: DataCategory) -> SensitivityLevel {
    match category {
        DataCategory::Auth | DataCategory::Financial => SensitivityLevel::Critical,
        DataCategory::Pii | DataCategory::Admin => SensitivityLevel::High,
        DataCategory::Identifier => SensitivityLevel::Medium,
        DataCategory::Public | DataCategory::Unknown => SensitivityLevel::Low,
    }
}

fn build_reason(field_name: &str, schema: &SchemaDefinition, category: DataCategory) -> String {
    let mut reasons: Vec<String> = Vec::new();

    match category {
        DataCategory::Auth => reasons.push("Authentication field pattern".to_string()),
        DataCategory::Pii => {
            if schema.format.as_deref() == Some("email") {
                reasons.push("Email format".to_string());
            } else {
                reasons.push("PII field pattern".to_string());
            }
        }
        DataCategory::Financial => reasons.push("Financial data pattern".to_string()),
        DataCategory::Admin => reasons.push("Administrative field pattern".to_string()),
        DataCategory::Identifier => reasons.push("Identifier pattern".to_string()),
        _ => {}
    }

    if let Some(format) = &schema.format {
        reasons.push(format!("format: {}", format));
    }

    if reasons.is_empty() {
        format!("Matched field name pattern: {}", field_name)
    } else {
        reasons.join(", ")
    }
}
