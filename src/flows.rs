// Call-flow inference over a parsed API spec
// Three detectors run over the endpoint list: auth endpoints, CRUD
// lifecycles, and identifier producer->consumer links

use crate::models::{ApiEndpoint, ApiFlow, FlowStep, OpenApiSpec};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

lazy_static! {
    static ref PATH_PARAM: Regex = Regex::new(r"\{([^}]+)\}").unwrap();
}

pub struct FlowAnalyzer;

impl FlowAnalyzer {
    /// Derive flows from a spec. Single pass, stateless: detectors run in a
    /// fixed order (auth, CRUD, linked) and the concatenated result is
    /// de-duplicated by flow name, first occurrence wins.
    pub fn analyze(spec: &OpenApiSpec) -> Vec<ApiFlow> {
        let mut flows = Vec::new();

        detect_auth_flows(spec, &mut flows);
        detect_crud_flows(spec, &mut flows);
        detect_linked_flows(spec, &mut flows);

        let deduped = dedupe_by_name(flows);
        debug!(flows = deduped.len(), "flow analysis complete");
        deduped
    }
}

/// An endpoint is auth-related if its path mentions "auth", it carries an
/// "auth" tag, or it declares any security requirement.
fn is_auth_endpoint(endpoint: &ApiEndpoint) -> bool {
    endpoint.path.to_lowercase().contains("auth")
        || endpoint.tags.iter().any(|t| t.eq_ignore_ascii_case("auth"))
        || !endpoint.security.is_empty()
}

fn detect_auth_flows(spec: &OpenApiSpec, flows: &mut Vec<ApiFlow>) {
    for endpoint in &spec.endpoints {
        if !is_auth_endpoint(endpoint) {
            continue;
        }
        flows.push(ApiFlow {
            name: format!("Auth flow: {} {}", endpoint.method, endpoint.path),
            description: Some("Authentication endpoint detected".to_string()),
            steps: vec![FlowStep {
                endpoint: endpoint.clone(),
                step_number: 1,
            }],
            required_roles: scheme_names([endpoint]),
        });
    }
}

fn detect_crud_flows(spec: &OpenApiSpec, flows: &mut Vec<ApiFlow>) {
    for post in spec
        .endpoints
        .iter()
        .filter(|e| e.method.eq_ignore_ascii_case("POST"))
    {
        let base = base_path(&post.path);
        if base.is_empty() {
            continue;
        }

        let details: Vec<&ApiEndpoint> = spec
            .endpoints
            .iter()
            .filter(|ep| {
                ep.path.starts_with(&base) && ep.path.contains('{') && ep.path != post.path
            })
            .collect();
        if details.is_empty() {
            continue;
        }

        let mut steps = vec![FlowStep {
            endpoint: post.clone(),
            step_number: 1,
        }];
        for (idx, detail) in details.iter().enumerate() {
            steps.push(FlowStep {
                endpoint: (*detail).clone(),
                step_number: idx as u32 + 2,
            });
        }

        let required_roles = scheme_names(std::iter::once(post).chain(details.iter().copied()));

        flows.push(ApiFlow {
            name: format!("CRUD flow: {}", base),
            description: Some("Create operation followed by detail operations".to_string()),
            steps,
            required_roles,
        });
    }
}

fn detect_linked_flows(spec: &OpenApiSpec, flows: &mut Vec<ApiFlow>) {
    let producers = index_id_producers(spec);

    for consumer in &spec.endpoints {
        for capture in PATH_PARAM.captures_iter(&consumer.path) {
            let param_name = &capture[1];

            // Producers indexed under the parameter name itself or under
            // "<name>Id", de-duplicated structurally.
            let mut matched: Vec<&ApiEndpoint> = Vec::new();
            for key in [param_name.to_string(), format!("{}Id", param_name)] {
                if let Some(list) = producers.get(&key) {
                    for producer in list.iter().copied() {
                        if !matched.iter().any(|m| *m == producer) {
                            matched.push(producer);
                        }
                    }
                }
            }

            for producer in matched {
                flows.push(ApiFlow {
                    name: format!("Linked flow: {} -> {}", producer.path, consumer.path),
                    description: Some(format!(
                        "Producer and consumer linked by parameter '{}'",
                        param_name
                    )),
                    steps: vec![
                        FlowStep {
                            endpoint: producer.clone(),
                            step_number: 1,
                        },
                        FlowStep {
                            endpoint: consumer.clone(),
                            step_number: 2,
                        },
                    ],
                    required_roles: scheme_names([producer, consumer]),
                });
            }
        }
    }
}

/// Index endpoints by the identifier-like property names their response
/// bodies expose. Schema `$ref`s are resolved by trailing-segment name into
/// the spec's component schemas before inspecting properties. The same
/// endpoint may appear more than once under a name; link detection
/// de-duplicates.
fn index_id_producers(spec: &OpenApiSpec) -> HashMap<String, Vec<&ApiEndpoint>> {
    let mut producers: HashMap<String, Vec<&ApiEndpoint>> = HashMap::new();

    for endpoint in &spec.endpoints {
        for response in endpoint.responses.values() {
            for media in response.content.values() {
                let schema = match &media.schema {
                    Some(schema) => schema,
                    None => continue,
                };

                if let Some(props) = &schema.properties {
                    for prop_name in props.keys() {
                        if is_likely_identifier(prop_name) {
                            producers.entry(prop_name.clone()).or_default().push(endpoint);
                        }
                    }
                }

                if let Some(ref_str) = &schema.schema_ref {
                    let ref_name = ref_str.rsplit('/').next().unwrap_or(ref_str);
                    if let Some(props) = spec
                        .schemas
                        .get(ref_name)
                        .and_then(|resolved| resolved.properties.as_ref())
                    {
                        for prop_name in props.keys() {
                            if is_likely_identifier(prop_name) {
                                producers.entry(prop_name.clone()).or_default().push(endpoint);
                            }
                        }
                    }
                }
            }
        }
    }

    producers
}

fn is_likely_identifier(name: &str) -> bool {
    let n = name.to_lowercase();
    n == "id" || n.ends_with("id") || n.contains("identifier") || n.contains("uuid")
}

/// Path prefix up to (but excluding) the first path-parameter segment,
/// trimmed of trailing slashes. Empty when the path starts with a parameter.
fn base_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.find("/{") {
        Some(idx) => trimmed[..idx].to_string(),
        None => trimmed.to_string(),
    }
}

fn scheme_names<'a, I>(endpoints: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a ApiEndpoint>,
{
    endpoints
        .into_iter()
        .flat_map(|ep| ep.security.iter())
        .flat_map(|requirement| requirement.keys().cloned())
        .collect()
}

fn dedupe_by_name(flows: Vec<ApiFlow>) -> Vec<ApiFlow> {
    let mut seen = HashSet::new();
    flows
        .into_iter()
        .filter(|flow| seen.insert(flow.name.clone()))
        .collect()
}
