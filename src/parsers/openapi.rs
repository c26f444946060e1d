// OpenAPI document source and converter
// Loads a JSON or YAML document from a file path or URL and converts the
// already-parsed object graph into the internal spec model

use crate::models::{
    ApiEndpoint, ApiParameter, MediaTypeDefinition, OAuthFlow, OAuthFlows, OpenApiSpec,
    ParameterLocation, RequestBodyDefinition, ResponseDefinition, SchemaDefinition,
    SecurityScheme, SensitivityLevel,
};
use crate::parsers::SpecError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

// Iteration order decides endpoint order within a path item.
const HTTP_METHODS: [(&str, &str); 8] = [
    ("get", "GET"),
    ("post", "POST"),
    ("put", "PUT"),
    ("delete", "DELETE"),
    ("patch", "PATCH"),
    ("head", "HEAD"),
    ("options", "OPTIONS"),
    ("trace", "TRACE"),
];

pub struct OpenApiParser;

impl OpenApiParser {
    /// Parse a document from a URL (http/https prefix) or a local file path.
    pub fn parse_location(input: &str) -> Result<OpenApiSpec, SpecError> {
        if input.starts_with("http://") || input.starts_with("https://") {
            Self::parse_url(input)
        } else {
            Self::parse_file(input)
        }
    }

    /// Parse an OpenAPI document from a local file path.
    pub fn parse_file(path: &str) -> Result<OpenApiSpec, SpecError> {
        let file = Path::new(path);
        if !file.exists() {
            return Err(SpecError::NotFound(path.to_string()));
        }
        let raw = std::fs::read_to_string(file)
            .map_err(|e| SpecError::NotFound(format!("{}: {}", path, e)))?;
        Self::parse_str(&raw)
    }

    /// Parse an OpenAPI document fetched from a URL.
    pub fn parse_url(url: &str) -> Result<OpenApiSpec, SpecError> {
        let response = reqwest::blocking::get(url)
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| SpecError::Unreachable(format!("{}: {}", url, e)))?;
        let raw = response
            .text()
            .map_err(|e| SpecError::Unreachable(format!("{}: {}", url, e)))?;
        Self::parse_str(&raw)
    }

    /// Parse an OpenAPI document from raw JSON or YAML text. All-or-nothing:
    /// either a complete spec comes back or an error, never a partial spec.
    pub fn parse_str(raw: &str) -> Result<OpenApiSpec, SpecError> {
        let doc = parse_document(raw)?;
        convert_document(&doc)
    }
}

/// Run the document grammar: JSON first, YAML as the fallback.
fn parse_document(raw: &str) -> Result<Value, SpecError> {
    if let Ok(doc) = serde_json::from_str::<Value>(raw) {
        return Ok(doc);
    }
    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(doc) => Ok(yaml_to_json(doc)),
        Err(e) => Err(SpecError::Grammar(format!("not valid JSON or YAML: {}", e))),
    }
}

/// Bridge a YAML value into the JSON object graph the converter consumes.
/// Non-string mapping keys (unquoted status codes like `200:`) are
/// stringified; keys that have no string form are dropped.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = serde_json::Map::new();
            for (key, val) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                obj.insert(key, yaml_to_json(val));
            }
            Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn convert_document(doc: &Value) -> Result<OpenApiSpec, SpecError> {
    let root = doc
        .as_object()
        .ok_or_else(|| SpecError::Conversion("document root is not an object".to_string()))?;

    let info = root.get("info");
    let version = root
        .get("openapi")
        .and_then(Value::as_str)
        .unwrap_or("3.0.0")
        .to_string();
    let title = info
        .and_then(|i| i.get("title"))
        .and_then(Value::as_str)
        .unwrap_or("Untitled API")
        .to_string();
    let description = info
        .and_then(|i| i.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let servers = root
        .get("servers")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(server_with_vars).collect())
        .unwrap_or_default();

    let endpoints = extract_endpoints(doc);
    let schemas = extract_component_map(doc, "schemas", convert_schema);
    let security_schemes = extract_component_map(doc, "securitySchemes", convert_security_scheme);

    debug!(
        endpoints = endpoints.len(),
        schemas = schemas.len(),
        "converted OpenAPI document"
    );

    Ok(OpenApiSpec {
        version,
        title,
        description,
        servers,
        endpoints,
        schemas,
        security_schemes,
    })
}

// Substitute server variable defaults into the URL, e.g. {env} -> "api".
fn server_with_vars(server: &Value) -> Option<String> {
    let url = server.get("url")?.as_str()?;
    let mut result = url.to_string();
    if let Some(vars) = server.get("variables").and_then(Value::as_object) {
        for (name, var) in vars {
            if let Some(default) = var.get("default").and_then(Value::as_str) {
                result = result.replace(&format!("{{{}}}", name), default);
            }
        }
    }
    Some(result)
}

fn extract_endpoints(root: &Value) -> Vec<ApiEndpoint> {
    let mut endpoints = Vec::new();
    let paths = match root.get("paths").and_then(Value::as_object) {
        Some(paths) => paths,
        None => return endpoints,
    };

    for (path, item) in paths {
        let path_params = item.get("parameters").and_then(Value::as_array);
        for (key, verb) in HTTP_METHODS {
            if let Some(op) = item.get(key) {
                if op.is_object() {
                    endpoints.push(convert_operation(root, path, verb, op, path_params));
                }
            }
        }
    }

    endpoints
}

fn convert_operation(
    root: &Value,
    path: &str,
    method: &str,
    op: &Value,
    path_params: Option<&Vec<Value>>,
) -> ApiEndpoint {
    // Path-item parameters first, then operation parameters. Deliberately no
    // de-duplication by name: if both levels define the same name, both appear.
    let mut entries: Vec<&Value> = Vec::new();
    if let Some(arr) = path_params {
        entries.extend(arr.iter());
    }
    if let Some(arr) = op.get("parameters").and_then(Value::as_array) {
        entries.extend(arr.iter());
    }
    let parameters = entries
        .into_iter()
        .map(|entry| convert_parameter(deref_entry(root, entry)))
        .collect();

    let request_body = op
        .get("requestBody")
        .map(|rb| convert_request_body(deref_entry(root, rb)));

    let responses = op
        .get("responses")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(code, resp)| {
                    let definition = ResponseDefinition {
                        description: str_field(resp, "description"),
                        content: convert_content(resp.get("content")),
                    };
                    (code.clone(), definition)
                })
                .collect()
        })
        .unwrap_or_default();

    // Copied structurally, without semantic interpretation.
    let security = op
        .get("security")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_object)
                .map(|requirement| {
                    requirement
                        .iter()
                        .map(|(scheme, scopes)| {
                            let scopes = scopes
                                .as_array()
                                .map(|a| {
                                    a.iter()
                                        .filter_map(Value::as_str)
                                        .map(str::to_string)
                                        .collect()
                                })
                                .unwrap_or_default();
                            (scheme.clone(), scopes)
                        })
                        .collect::<BTreeMap<String, Vec<String>>>()
                })
                .collect()
        })
        .unwrap_or_default();

    let tags = op
        .get("tags")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ApiEndpoint {
        path: path.to_string(),
        method: method.to_string(),
        operation_id: str_field(op, "operationId"),
        summary: str_field(op, "summary"),
        description: str_field(op, "description"),
        parameters,
        request_body,
        responses,
        security,
        tags,
        deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
        data_sensitivity: SensitivityLevel::Low,
        classification: Vec::new(),
    }
}

fn convert_parameter(param: &Value) -> ApiParameter {
    // Location strings map case-sensitively; anything else defaults to QUERY.
    let location = match param.get("in").and_then(Value::as_str) {
        Some("query") => ParameterLocation::Query,
        Some("path") => ParameterLocation::Path,
        Some("header") => ParameterLocation::Header,
        Some("cookie") => ParameterLocation::Cookie,
        _ => ParameterLocation::Query,
    };

    ApiParameter {
        name: param
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        location,
        required: param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        description: str_field(param, "description"),
        schema: param
            .get("schema")
            .map(convert_schema)
            .unwrap_or_else(|| SchemaDefinition {
                schema_type: Some("string".to_string()),
                ..Default::default()
            }),
        deprecated: param
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        classification: None,
    }
}

fn convert_request_body(rb: &Value) -> RequestBodyDefinition {
    RequestBodyDefinition {
        description: str_field(rb, "description"),
        required: rb.get("required").and_then(Value::as_bool).unwrap_or(false),
        content: convert_content(rb.get("content")),
    }
}

fn convert_content(content: Option<&Value>) -> BTreeMap<String, MediaTypeDefinition> {
    content
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(media_type, definition)| {
                    let media = MediaTypeDefinition {
                        schema: definition.get("schema").map(convert_schema),
                    };
                    (media_type.clone(), media)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn convert_schema(schema: &Value) -> SchemaDefinition {
    SchemaDefinition {
        schema_type: str_field(schema, "type"),
        format: str_field(schema, "format"),
        description: str_field(schema, "description"),
        properties: schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), convert_schema(prop)))
                    .collect()
            }),
        required: schema.get("required").and_then(Value::as_array).map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
        items: schema.get("items").map(|items| Box::new(convert_schema(items))),
        enum_values: schema.get("enum").and_then(Value::as_array).cloned(),
        pattern: str_field(schema, "pattern"),
        min_length: schema.get("minLength").and_then(Value::as_u64),
        max_length: schema.get("maxLength").and_then(Value::as_u64),
        minimum: schema.get("minimum").and_then(Value::as_f64),
        maximum: schema.get("maximum").and_then(Value::as_f64),
        schema_ref: str_field(schema, "$ref"),
        nullable: schema.get("nullable").and_then(Value::as_bool),
        read_only: schema.get("readOnly").and_then(Value::as_bool),
        write_only: schema.get("writeOnly").and_then(Value::as_bool),
    }
}

fn convert_security_scheme(scheme: &Value) -> SecurityScheme {
    SecurityScheme {
        scheme_type: str_field(scheme, "type").unwrap_or_else(|| "unknown".to_string()),
        scheme: str_field(scheme, "scheme"),
        bearer_format: str_field(scheme, "bearerFormat"),
        flows: scheme.get("flows").map(convert_oauth_flows),
        open_id_connect_url: str_field(scheme, "openIdConnectUrl"),
        name: str_field(scheme, "name"),
        location: str_field(scheme, "in"),
    }
}

fn convert_oauth_flows(flows: &Value) -> OAuthFlows {
    OAuthFlows {
        implicit: flows.get("implicit").map(convert_oauth_flow),
        password: flows.get("password").map(convert_oauth_flow),
        client_credentials: flows.get("clientCredentials").map(convert_oauth_flow),
        authorization_code: flows.get("authorizationCode").map(convert_oauth_flow),
    }
}

fn convert_oauth_flow(flow: &Value) -> OAuthFlow {
    OAuthFlow {
        authorization_url: str_field(flow, "authorizationUrl"),
        token_url: str_field(flow, "tokenUrl"),
        refresh_url: str_field(flow, "refreshUrl"),
        scopes: flow
            .get("scopes")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(scope, desc)| {
                        (scope.clone(), desc.as_str().unwrap_or_default().to_string())
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn extract_component_map<T>(
    root: &Value,
    section: &str,
    convert: fn(&Value) -> T,
) -> BTreeMap<String, T> {
    root.get("components")
        .and_then(|c| c.get(section))
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(name, value)| (name.clone(), convert(value)))
                .collect()
        })
        .unwrap_or_default()
}

/// Follow a local `$ref` on a parameter or request-body entry. Schema-level
/// `$ref`s are not followed here; they stay in the model and are resolved by
/// name at traversal time.
fn deref_entry<'a>(root: &'a Value, entry: &'a Value) -> &'a Value {
    if let Some(ref_str) = entry.get("$ref").and_then(Value::as_str) {
        if let Some(resolved) = resolve_local_ref(root, ref_str) {
            return resolved;
        }
        warn!("unresolved $ref: {}", ref_str);
    }
    entry
}

// Resolve local JSON Pointer refs like "#/components/parameters/Foo"
fn resolve_local_ref<'a>(root: &'a Value, ref_str: &str) -> Option<&'a Value> {
    let pointer = ref_str.strip_prefix('#')?;
    if !pointer.starts_with('/') {
        return None;
    }
    let mut current = root;
    for part in pointer[1..].split('/') {
        let key = part.replace("~1", "/").replace("~0", "~");
        current = current.get(&key)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_local_ref_walks_pointer() {
        let doc = json!({"components": {"parameters": {"Foo": {"name": "foo"}}}});
        let resolved = resolve_local_ref(&doc, "#/components/parameters/Foo");
        assert_eq!(resolved.unwrap().get("name").unwrap(), "foo");
    }

    #[test]
    fn resolve_local_ref_unescapes_pointer_tokens() {
        let doc = json!({"a/b": {"~c": 1}});
        let resolved = resolve_local_ref(&doc, "#/a~1b/~0c");
        assert_eq!(resolved.unwrap(), &json!(1));
    }

    #[test]
    fn resolve_local_ref_rejects_external_refs() {
        let doc = json!({});
        assert!(resolve_local_ref(&doc, "other.json#/a").is_none());
        assert!(resolve_local_ref(&doc, "#no-slash").is_none());
    }

    #[test]
    fn yaml_numeric_keys_become_strings() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("200:\n  description: ok\n").unwrap();
        let json = yaml_to_json(yaml);
        assert!(json.get("200").is_some(), "numeric key should stringify");
    }

    #[test]
    fn server_variables_substitute_defaults() {
        let server = json!({
            "url": "https://{env}.example.com/v{version}",
            "variables": {
                "env": {"default": "api", "enum": ["api", "staging"]},
                "version": {"default": "1"}
            }
        });
        assert_eq!(
            server_with_vars(&server).unwrap(),
            "https://api.example.com/v1"
        );
    }
}
