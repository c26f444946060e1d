/// Integration tests for call-flow inference
/// Auth, CRUD, and producer-consumer detection over parsed documents
use apilens::flows::FlowAnalyzer;
use apilens::parsers::OpenApiParser;

#[test]
fn test_crud_flow_detection() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "Items", "version": "1"},
        "paths": {
            "/items": {
                "post": {
                    "responses": {
                        "201": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"id": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/items/{id}": {
                "get": {},
                "put": {}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);

    let crud = flows
        .iter()
        .find(|f| f.name == "CRUD flow: /items")
        .expect("CRUD flow should be detected");
    assert_eq!(crud.steps.len(), 3);
    assert_eq!(crud.steps[0].step_number, 1);
    assert_eq!(crud.steps[0].endpoint.method, "POST");
    assert_eq!(crud.steps[1].endpoint.path, "/items/{id}");
    assert_eq!(crud.steps[2].endpoint.path, "/items/{id}");
    assert_eq!(
        crud.steps.iter().map(|s| s.step_number).collect::<Vec<_>>(),
        vec![1, 2, 3],
        "step numbers are 1-based and increasing"
    );
}

#[test]
fn test_auth_flow_detection() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "Auth", "version": "1"},
        "paths": {
            "/auth/login": {
                "post": {}
            },
            "/secure/resource": {
                "get": {
                    "security": [{"bearerAuth": []}]
                }
            },
            "/public/info": {
                "get": {}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);

    let auth_flows: Vec<_> = flows
        .iter()
        .filter(|f| f.name.contains("Auth flow"))
        .collect();
    assert_eq!(auth_flows.len(), 2, "flows: {:?}", flow_names(&flows));

    let login = flows
        .iter()
        .find(|f| f.name == "Auth flow: POST /auth/login")
        .expect("path-based auth detection");
    assert!(login.required_roles.is_empty());
    assert_eq!(login.steps.len(), 1);

    let secured = flows
        .iter()
        .find(|f| f.name == "Auth flow: GET /secure/resource")
        .expect("security-requirement-based auth detection");
    assert!(secured.required_roles.contains("bearerAuth"));
}

#[test]
fn test_auth_tag_detection() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/session/new": {
                "post": {"tags": ["Auth"]}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);
    assert!(
        flows.iter().any(|f| f.name == "Auth flow: POST /session/new"),
        "tag match is case-insensitive: {:?}",
        flow_names(&flows)
    );
}

#[test]
fn test_linked_flow_via_inline_schema() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/lookup": {
                "get": {
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"id": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/orders/{id}": {
                "get": {}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);

    let linked = flows
        .iter()
        .find(|f| f.name == "Linked flow: /lookup -> /orders/{id}")
        .expect("producer-consumer link");
    assert_eq!(linked.steps.len(), 2);
    assert_eq!(linked.steps[0].endpoint.path, "/lookup");
    assert_eq!(linked.steps[1].endpoint.path, "/orders/{id}");
}

#[test]
fn test_linked_flow_resolves_schema_refs() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/orders": {
                "get": {
                    "security": [{"apiKey": []}],
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Order"}
                                }
                            }
                        }
                    }
                }
            },
            "/orders/{orderId}": {
                "get": {
                    "security": [{"bearerAuth": []}]
                }
            }
        },
        "components": {
            "schemas": {
                "Order": {
                    "type": "object",
                    "properties": {
                        "orderId": {"type": "string"},
                        "total": {"type": "number"}
                    }
                }
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);

    let linked = flows
        .iter()
        .find(|f| f.name == "Linked flow: /orders -> /orders/{orderId}")
        .expect("ref-resolved producer link should be detected");
    // roles union both endpoints' scheme names
    assert!(linked.required_roles.contains("apiKey"));
    assert!(linked.required_roles.contains("bearerAuth"));
}

#[test]
fn test_consumer_param_matches_property_with_id_suffix() {
    // path param "user" matches a producer property "userId"
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/whoami": {
                "get": {
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"userId": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/profiles/{user}": {
                "get": {}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);
    assert!(
        flows
            .iter()
            .any(|f| f.name == "Linked flow: /whoami -> /profiles/{user}"),
        "flows: {:?}",
        flow_names(&flows)
    );
}

#[test]
fn test_flows_deduplicate_by_name() {
    // Two POST endpoints with the same base path generate the same CRUD flow
    // name; only the first survives
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/items": {
                "post": {}
            },
            "/items/": {
                "post": {}
            },
            "/items/{id}": {
                "get": {}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);

    let crud: Vec<_> = flows
        .iter()
        .filter(|f| f.name == "CRUD flow: /items")
        .collect();
    assert_eq!(crud.len(), 1, "duplicate names collapse to the first");
    assert_eq!(crud[0].steps[0].endpoint.path, "/items", "first occurrence wins");
}

#[test]
fn test_detector_ordering() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/auth/token": {
                "post": {}
            },
            "/notes": {
                "post": {
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"id": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/notes/{id}": {
                "get": {}
            }
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let flows = FlowAnalyzer::analyze(&spec);
    let names = flow_names(&flows);

    let auth_pos = names.iter().position(|n| n.starts_with("Auth flow")).unwrap();
    let crud_pos = names.iter().position(|n| n.starts_with("CRUD flow")).unwrap();
    let linked_pos = names.iter().position(|n| n.starts_with("Linked flow")).unwrap();
    assert!(auth_pos < crud_pos, "auth before CRUD: {:?}", names);
    assert!(crud_pos < linked_pos, "CRUD before linked: {:?}", names);
}

#[test]
fn test_spec_without_candidates_yields_no_flows() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/health": {"get": {}}
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    assert!(FlowAnalyzer::analyze(&spec).is_empty());
}

#[test]
fn test_analysis_is_deterministic() {
    let spec = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/auth/login": {"post": {}},
            "/items": {
                "post": {
                    "responses": {
                        "201": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"id": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/items/{id}": {"get": {}, "delete": {}}
        }
    }"##;

    let spec = OpenApiParser::parse_str(spec).expect("should parse");
    let first = FlowAnalyzer::analyze(&spec);
    let second = FlowAnalyzer::analyze(&spec);
    assert_eq!(first, second);
}

fn flow_names(flows: &[apilens::models::ApiFlow]) -> Vec<String> {
    flows.iter().map(|f| f.name.clone()).collect()
}
