//! The workflow parser and validator (C2): turns raw JSON into a
//! classified [`Step`] tree, checks it against the registry and the state
//! path grammar, then hands the tree to [`crate::plan::build_plan`] to
//! resolve every edge into a [`crate::plan::Plan`].

use serde_json::{Map, Value};
use strsim::levenshtein;

use crate::error::{ValidationError, ValidationWarning};
use crate::model::{EdgeTarget, Step, WorkflowDefinition};
use crate::plan::{build_plan, Plan};
use nodes::Registry;

const DEFAULT_LOOP_CAP: u32 = 1000;
const MAX_SUGGESTION_DISTANCE: usize = 3;
const MAX_SUGGESTIONS: usize = 3;

/// Parse, validate, and resolve a raw workflow document into an executable
/// [`Plan`], the declared initial state (if any), and any non-fatal
/// warnings the validator surfaced.
#[allow(clippy::type_complexity)]
pub fn parse_workflow(
    raw: &Value,
    registry: &Registry,
) -> Result<(Plan, Option<Map<String, Value>>, Vec<ValidationWarning>), ValidationError> {
    let def: WorkflowDefinition =
        serde_json::from_value(raw.clone()).map_err(|e| ValidationError::Schema(e.to_string()))?;

    validate_id(&def.id)?;
    validate_version(&def.version)?;
    if def.workflow.is_empty() {
        return Err(ValidationError::EmptyWorkflow);
    }

    let mut warnings = Vec::new();
    let steps: Vec<Step> = def
        .workflow
        .iter()
        .enumerate()
        .map(|(i, v)| classify_step(v, &format!("$.workflow[{i}]"), registry, &mut warnings))
        .collect::<Result<_, _>>()?;

    check_depth(&steps, 0, &mut warnings);

    let loop_cap = def.loop_cap.unwrap_or(DEFAULT_LOOP_CAP);
    let plan = build_plan(&steps, loop_cap, registry)?;

    Ok((plan, def.initial_state, warnings))
}

fn validate_id(id: &str) -> Result<(), ValidationError> {
    let ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}

fn validate_version(version: &str) -> Result<(), ValidationError> {
    let parts: Vec<&str> = version.split('.').collect();
    let ok = parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidVersion(version.to_string()))
    }
}

/// Validate a dotted state path: one or more `identifier` segments (numeric
/// segments address array indices and are also accepted), separated by `.`.
fn validate_state_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    path.split('.').all(|seg| {
        !seg.is_empty()
            && (seg.chars().all(|c| c.is_ascii_digit())
                || (seg.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false)
                    && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')))
    })
}

fn classify_step(
    value: &Value,
    path: &str,
    registry: &Registry,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<Step, ValidationError> {
    match value {
        Value::String(node_type) => {
            check_node_type(node_type, path, registry)?;
            Ok(Step::Bare { node_type: node_type.clone() })
        }
        Value::Object(map) if map.len() == 1 => {
            let (key, body) = map.iter().next().expect("len == 1");

            if let Some(state_path) = key.strip_prefix("$.") {
                if !validate_state_path(state_path) {
                    return Err(ValidationError::InvalidStatePath { path: state_path.to_string() });
                }
                return Ok(Step::StateSet { path: state_path.to_string(), value: body.clone() });
            }

            let (candidate_type, is_loop) =
                match key.strip_suffix("...") { Some(base) => (base, true), None => (key.as_str(), false) };

            let body_map = body.as_object().ok_or_else(|| ValidationError::UnrecognisedStep { path: path.to_string() })?;

            if registry.contains(candidate_type) {
                let (config, edges) = split_config_and_edges(body_map, path, registry, warnings)?;
                check_missing_error_edge(candidate_type, &edges, path, registry, warnings);
                check_ai_hint(candidate_type, path, registry, warnings);
                return Ok(Step::Node { node_type: candidate_type.to_string(), is_loop, config, edges });
            }

            // Not a known node type. If every key in the body is an edge
            // entry, treat this as a label-only block; otherwise the author
            // most likely mistyped a node type.
            if body_map.keys().all(|k| k.ends_with('?')) && !body_map.is_empty() {
                let (_, edges) = split_config_and_edges(body_map, path, registry, warnings)?;
                return Ok(Step::Block { label: key.clone(), edges });
            }

            Err(ValidationError::UnknownNodeType {
                node_type: candidate_type.to_string(),
                path: path.to_string(),
                suggestions: suggest(candidate_type, registry),
            })
        }
        _ => Err(ValidationError::UnrecognisedStep { path: path.to_string() }),
    }
}

fn check_node_type(node_type: &str, path: &str, registry: &Registry) -> Result<(), ValidationError> {
    if registry.contains(node_type) {
        Ok(())
    } else {
        Err(ValidationError::UnknownNodeType {
            node_type: node_type.to_string(),
            path: path.to_string(),
            suggestions: suggest(node_type, registry),
        })
    }
}

fn suggest(node_type: &str, registry: &Registry) -> Vec<String> {
    let mut scored: Vec<(usize, String)> =
        registry.type_names().into_iter().map(|name| (levenshtein(node_type, &name), name)).collect();
    scored.retain(|(d, _)| *d <= MAX_SUGGESTION_DISTANCE);
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, name)| name).collect()
}

fn split_config_and_edges(
    body: &Map<String, Value>,
    path: &str,
    registry: &Registry,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<(Map<String, Value>, Vec<(String, EdgeTarget)>), ValidationError> {
    let mut config = Map::new();
    let mut edges = Vec::new();
    for (k, v) in body {
        if let Some(edge_name) = k.strip_suffix('?') {
            let target = classify_edge_target(v, path, registry, warnings)?;
            edges.push((edge_name.to_string(), target));
        } else {
            config.insert(k.clone(), v.clone());
        }
    }
    Ok((config, edges))
}

fn classify_edge_target(
    value: &Value,
    path: &str,
    registry: &Registry,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<EdgeTarget, ValidationError> {
    match value {
        Value::String(label) => Ok(EdgeTarget::Ref(label.clone())),
        Value::Array(items) => {
            let steps = items
                .iter()
                .enumerate()
                .map(|(i, item)| classify_step(item, &format!("{path}[{i}]"), registry, warnings))
                .collect::<Result<_, _>>()?;
            Ok(EdgeTarget::Inline(steps))
        }
        Value::Object(_) => Ok(EdgeTarget::Inline(vec![classify_step(value, path, registry, warnings)?])),
        _ => Err(ValidationError::UnrecognisedStep { path: path.to_string() }),
    }
}

fn check_missing_error_edge(
    node_type: &str,
    edges: &[(String, EdgeTarget)],
    path: &str,
    registry: &Registry,
    warnings: &mut Vec<ValidationWarning>,
) {
    let Some(meta) = registry.metadata(node_type) else { return };
    if meta.expected_edges.iter().any(|e| e == "error") && !edges.iter().any(|(name, _)| name == "error") {
        warnings.push(ValidationWarning {
            path: path.to_string(),
            message: format!("node '{node_type}' may emit an 'error' edge with no handler declared"),
        });
    }
}

fn check_ai_hint(node_type: &str, path: &str, registry: &Registry, warnings: &mut Vec<ValidationWarning>) {
    let Some(meta) = registry.metadata(node_type) else { return };
    let is_ai = meta.ai_hints.as_ref().and_then(|h| h.get("responseKind")).and_then(|v| v.as_str()) == Some("ai");
    if is_ai {
        warnings.push(ValidationWarning {
            path: path.to_string(),
            message: format!("AI node '{node_type}' output should be validated before downstream use"),
        });
    }
}

fn check_depth(steps: &[Step], depth: usize, warnings: &mut Vec<ValidationWarning>) {
    const MAX_RECOMMENDED_DEPTH: usize = 6;
    if depth > MAX_RECOMMENDED_DEPTH {
        warnings.push(ValidationWarning {
            path: "$.workflow".to_string(),
            message: format!("nesting depth {depth} exceeds the recommended maximum of {MAX_RECOMMENDED_DEPTH}"),
        });
    }
    for step in steps {
        let edges = match step {
            Step::Node { edges, .. } | Step::Block { edges, .. } => edges,
            _ => continue,
        };
        for (_, target) in edges {
            if let EdgeTarget::Inline(inner) = target {
                check_depth(inner, depth + 1, warnings);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::with_builtins()
    }

    #[test]
    fn parses_a_minimal_linear_workflow() {
        let reg = registry();
        let raw = json!({
            "id": "wf1",
            "name": "test",
            "version": "1.0.0",
            "workflow": ["empty", "empty"]
        });
        let (plan, initial_state, warnings) = parse_workflow(&raw, &reg).unwrap();
        assert_eq!(plan.nodes.len(), 2);
        assert!(warnings.is_empty());
        assert!(initial_state.is_none());
    }

    #[test]
    fn rejects_empty_workflow() {
        let reg = registry();
        let raw = json!({ "id": "wf1", "name": "t", "version": "1.0.0", "workflow": [] });
        assert!(matches!(parse_workflow(&raw, &reg), Err(ValidationError::EmptyWorkflow)));
    }

    #[test]
    fn unknown_node_type_suggests_closest_match() {
        let reg = registry();
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [{"mathh": {"operation": "add", "values": [1,2]}}]
        });
        match parse_workflow(&raw, &reg) {
            Err(ValidationError::UnknownNodeType { suggestions, .. }) => {
                assert!(suggestions.iter().any(|s| s == "math"));
            }
            other => panic!("expected UnknownNodeType, got {other:?}"),
        }
    }

    #[test]
    fn resolves_named_edge_target_within_scope() {
        let reg = registry();
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [
                {"math": {"operation": "add", "values": [1,2], "success?": "finish"}},
                {"finish": {"done?": "empty"}},
                "empty"
            ]
        });
        let (plan, _initial_state, _warnings) = parse_workflow(&raw, &reg).unwrap();
        assert_eq!(plan.nodes.len(), 3);
    }

    #[test]
    fn rejects_invalid_state_path() {
        let reg = registry();
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [{"$.1bad": "x"}]
        });
        assert!(matches!(parse_workflow(&raw, &reg), Err(ValidationError::InvalidStatePath { .. })));
    }

    #[test]
    fn unresolved_edge_target_is_an_error() {
        let reg = registry();
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [{"math": {"operation": "add", "values": [1,2], "success?": "nowhere"}}]
        });
        assert!(matches!(parse_workflow(&raw, &reg), Err(ValidationError::UnresolvedEdgeTarget { .. })));
    }
}
