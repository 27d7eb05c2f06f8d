// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-node configuration validation against the knowledge index.

use serde_json::Value;

use crate::catalog::{Catalog, NodeSchema, PropertySchema};
use crate::model::LiteNode;

use super::ValidationIssue;

/// Property-location hints need a schema exhaustive enough to list every legal
/// top-level parameter per type; until then the layer stays off or it flags
/// correctly-placed parameters on virtually every real workflow.
const PROPERTY_LOCATION_HINTS: bool = false;

pub fn validate_node_config(
    node: &LiteNode,
    catalog: &Catalog,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(schema) = catalog.get_node(&node.node_type) else {
        issues.push(ValidationIssue::warning(
            "unknown_node_type",
            &node.name,
            None,
            &format!("type '{}' is not in the node index; config checks skipped", node.node_type),
            Some("verify the type with search_nodes"),
        ));
        return;
    };

    let params = node.parameters.as_ref().unwrap_or(&Value::Null);

    for property in &schema.properties {
        check_property(node, params, property, issues);
    }
    check_resource_operation(node, params, schema, issues);
    check_node_specifics(node, params, issues);

    if PROPERTY_LOCATION_HINTS {
        check_property_locations(node, params, schema, issues);
    }
}

fn param<'a>(params: &'a Value, name: &str) -> Option<&'a Value> {
    params.get(name)
}

fn is_expression(value: &Value) -> bool {
    value.as_str().is_some_and(|text| text.starts_with('='))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// A `show` condition holds when every referenced property currently carries
/// one of its permitted values.
fn show_satisfied(params: &Value, property: &PropertySchema) -> bool {
    property.show.iter().all(|(other, permitted)| {
        param(params, other).is_some_and(|current| permitted.contains(current))
    })
}

fn check_property(
    node: &LiteNode,
    params: &Value,
    property: &PropertySchema,
    issues: &mut Vec<ValidationIssue>,
) {
    let visible = show_satisfied(params, property);
    let value = param(params, &property.name);

    if property.required && visible {
        let missing = value.map_or(true, is_empty);
        if missing {
            issues.push(ValidationIssue::error(
                "missing_required",
                &node.name,
                Some(&property.name),
                &format!("required property '{}' is missing or empty", property.name),
                Some(&format!("set '{}' on this node", property.name)),
            ));
            return;
        }
    }

    let Some(value) = value else { return };
    if is_expression(value) {
        return;
    }

    if !property.options.is_empty() {
        if let Some(text) = value.as_str() {
            if !property.options.iter().any(|option| option == text) {
                issues.push(ValidationIssue::error(
                    "invalid_option",
                    &node.name,
                    Some(&property.name),
                    &format!(
                        "'{text}' is not one of the declared options [{}]",
                        property.options.join(", ")
                    ),
                    Some("pick one of the declared options"),
                ));
            }
        }
    }

    if let Some(warning) = type_mismatch(&property.kind, value) {
        issues.push(ValidationIssue::warning(
            "type_mismatch",
            &node.name,
            Some(&property.name),
            &format!("expected {} but found {warning}", property.kind),
            None,
        ));
    }
}

fn type_mismatch(declared: &str, value: &Value) -> Option<&'static str> {
    let found = match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => return None,
    };
    let matches = match declared {
        "string" | "options" => found == "string",
        "number" => found == "number",
        "boolean" => found == "boolean",
        // json properties legitimately take any shape.
        _ => true,
    };
    (!matches).then_some(found)
}

fn check_resource_operation(
    node: &LiteNode,
    params: &Value,
    schema: &NodeSchema,
    issues: &mut Vec<ValidationIssue>,
) {
    if schema.resources.is_empty() {
        return;
    }

    let resource = match param(params, "resource") {
        Some(value) if !is_expression(value) => value.as_str(),
        _ => None,
    };
    let Some(resource) = resource else { return };

    if !schema.resources.iter().any(|known| known == resource) {
        issues.push(ValidationIssue::error(
            "invalid_resource",
            &node.name,
            Some("resource"),
            &format!(
                "resource '{resource}' is not declared for this node (known: {})",
                schema.resources.join(", ")
            ),
            Some("use one of the declared resources"),
        ));
        return;
    }

    let operation = match param(params, "operation") {
        Some(value) if !is_expression(value) => value.as_str(),
        _ => None,
    };
    let Some(operation) = operation else { return };

    let declared = schema.operations.get(resource);
    let known = declared.is_some_and(|ops| ops.iter().any(|op| op == operation));
    if declared.is_some() && !known {
        issues.push(ValidationIssue::error(
            "invalid_operation",
            &node.name,
            Some("operation"),
            &format!("operation '{operation}' is not declared for resource '{resource}'"),
            Some("use one of the operations declared for this resource"),
        ));
    }
}

fn check_node_specifics(node: &LiteNode, params: &Value, issues: &mut Vec<ValidationIssue>) {
    match node.node_type.as_str() {
        "httpRequest" => {
            if let Some(url) = param(params, "url").and_then(Value::as_str) {
                if !url.starts_with('=') && !url.contains("://") {
                    issues.push(ValidationIssue::warning(
                        "best_practice",
                        &node.name,
                        Some("url"),
                        "URL has no protocol",
                        Some("start the URL with https://"),
                    ));
                }
            }
            let method = param(params, "method").and_then(Value::as_str).unwrap_or("GET");
            let has_body = ["sendBody", "jsonBody", "body", "bodyParameters"]
                .iter()
                .any(|key| param(params, key).is_some());
            if matches!(method, "POST" | "PUT" | "PATCH") && !has_body {
                issues.push(ValidationIssue::warning(
                    "best_practice",
                    &node.name,
                    Some("method"),
                    &format!("{method} request with no body configuration"),
                    Some("enable sendBody or switch to GET"),
                ));
            }
        }
        "postgres" | "mysql" | "microsoftSql" => {
            if let Some(query) = param(params, "query").and_then(Value::as_str) {
                let lowered = query.to_lowercase();
                if query.contains("{{") {
                    issues.push(ValidationIssue::warning(
                        "sql_injection_risk",
                        &node.name,
                        Some("query"),
                        "template expression interpolated into SQL",
                        Some("use query parameters instead of string interpolation"),
                    ));
                }
                if lowered.contains("delete") && !lowered.contains("where") {
                    issues.push(ValidationIssue::warning(
                        "sql_delete_without_where",
                        &node.name,
                        Some("query"),
                        "DELETE without a WHERE clause",
                        Some("add a WHERE clause or use a transaction"),
                    ));
                }
                if lowered.contains("drop ") {
                    issues.push(ValidationIssue::warning(
                        "sql_drop",
                        &node.name,
                        Some("query"),
                        "DROP statement in workflow SQL",
                        None,
                    ));
                }
            }
        }
        "code" | "function" | "functionItem" => {
            for key in ["jsCode", "pythonCode", "functionCode"] {
                if let Some(code) = param(params, key).and_then(Value::as_str) {
                    if code.contains("eval(") || code.contains("exec(") {
                        issues.push(ValidationIssue::warning(
                            "dynamic_code_execution",
                            &node.name,
                            Some(key),
                            "eval/exec on workflow data",
                            Some("avoid dynamic evaluation of item content"),
                        ));
                    }
                }
            }
        }
        _ => {}
    }
}

fn check_property_locations(
    node: &LiteNode,
    params: &Value,
    schema: &NodeSchema,
    issues: &mut Vec<ValidationIssue>,
) {
    let Value::Object(fields) = params else { return };
    for key in fields.keys() {
        let declared = schema.properties.iter().any(|property| &property.name == key);
        if !declared {
            issues.push(ValidationIssue::warning(
                "property_location",
                &node.name,
                Some(key),
                &format!("'{key}' is not a declared top-level parameter for this type"),
                None,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lite(node_type: &str, params: Value) -> LiteNode {
        let mut node = LiteNode::new("Node", node_type);
        node.parameters = Some(params);
        node
    }

    fn run(node: &LiteNode) -> Vec<ValidationIssue> {
        let catalog = Catalog::load();
        let mut issues = Vec::new();
        validate_node_config(node, &catalog, &mut issues);
        issues
    }

    #[test]
    fn unknown_type_is_one_advisory_warning() {
        let issues = run(&lite("totallyCustomThing", json!({})));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "unknown_node_type");
        assert!(!issues[0].blocking);
        assert!(issues[0].suggestion.as_deref().is_some_and(|s| s.contains("search_nodes")));
    }

    #[test]
    fn missing_required_url_blocks() {
        let issues = run(&lite("httpRequest", json!({"method": "GET"})));
        assert!(issues
            .iter()
            .any(|issue| issue.kind == "missing_required" && issue.field.as_deref() == Some("url")));
    }

    #[test]
    fn show_condition_gates_required_checks() {
        // jsCode is required only while language is javaScript.
        let python = run(&lite(
            "code",
            json!({"language": "python", "pythonCode": "return []"}),
        ));
        assert!(python.iter().all(|issue| issue.kind != "missing_required"));

        let js = run(&lite("code", json!({"language": "javaScript"})));
        assert!(js
            .iter()
            .any(|issue| issue.kind == "missing_required" && issue.field.as_deref() == Some("jsCode")));
    }

    #[test]
    fn option_sets_reject_unknown_literals_but_skip_expressions() {
        let bad = run(&lite(
            "httpRequest",
            json!({"method": "YEET", "url": "https://x.example"}),
        ));
        assert!(bad.iter().any(|issue| issue.kind == "invalid_option"));

        let expr = run(&lite(
            "httpRequest",
            json!({"method": "={{$json.verb}}", "url": "https://x.example"}),
        ));
        assert!(expr.iter().all(|issue| issue.kind != "invalid_option"));
    }

    #[test]
    fn resource_operation_pairs_are_checked() {
        let bad_resource = run(&lite("slack", json!({"resource": "rocket", "operation": "post"})));
        assert!(bad_resource.iter().any(|issue| issue.kind == "invalid_resource"));

        let bad_operation = run(&lite(
            "slack",
            json!({"resource": "user", "operation": "post"}),
        ));
        assert!(bad_operation.iter().any(|issue| issue.kind == "invalid_operation"));

        let fine = run(&lite(
            "slack",
            json!({"resource": "message", "operation": "post", "channel": "#ops", "text": "hi"}),
        ));
        assert!(fine.iter().all(|issue| !issue.blocking));
    }

    #[test]
    fn http_post_without_body_warns() {
        let issues = run(&lite(
            "httpRequest",
            json!({"method": "POST", "url": "api.example.com"}),
        ));
        assert!(issues.iter().filter(|issue| issue.kind == "best_practice").count() >= 2);
    }

    #[test]
    fn sql_checks_warn_but_never_block() {
        let issues = run(&lite(
            "postgres",
            json!({"operation": "executeQuery", "query": "DELETE FROM leads"}),
        ));
        assert!(issues.iter().any(|issue| issue.kind == "sql_delete_without_where"));
        assert!(issues
            .iter()
            .filter(|issue| issue.kind.starts_with("sql_"))
            .all(|issue| !issue.blocking));
    }

    #[test]
    fn type_mismatch_is_advisory() {
        let issues = run(&lite(
            "httpRequest",
            json!({"method": "GET", "url": 42}),
        ));
        assert!(issues
            .iter()
            .any(|issue| issue.kind == "type_mismatch" && !issue.blocking));
    }
}
