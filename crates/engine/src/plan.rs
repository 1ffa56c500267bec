//! The frozen, resolved form of a workflow definition (C2's output): an
//! arena of steps referenced by stable indices, with every edge already
//! resolved to an index pair. Built once by [`crate::parser`]; the engine
//! only ever walks this, never the raw JSON or the classified [`crate::model::Step`]
//! tree.
//!
//! Representing the plan as an arena — rather than owning back-references
//! between steps — is what lets a workflow's edges form a cyclic graph (a
//! loop jumping back to an earlier label) without fighting the borrow
//! checker: every edge is just a `usize`.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ValidationError;
use crate::model::{EdgeTarget, Step};
use nodes::Registry;

/// A step after edge resolution: identical in shape to [`Step`], except
/// every edge target is now a plan index instead of a name or nested tree.
#[derive(Debug, Clone)]
pub enum ResolvedStep {
    Bare { node_type: String },
    Node { node_type: String, is_loop: bool, config: Map<String, Value>, edges: Vec<(String, usize)> },
    StateSet { path: String, value: Value },
    Block { label: String, edges: Vec<(String, usize)> },
}

#[derive(Debug, Clone)]
pub struct PlanNode {
    pub step: ResolvedStep,
    /// Index of the next step in this node's own originating list, or
    /// `None` if it's the last step in that list — reaching it without a
    /// node producing a declared edge ends the execution successfully.
    pub fallthrough: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub nodes: Vec<PlanNode>,
    pub entry: usize,
    pub loop_cap: u32,
}

impl Plan {
    pub fn node(&self, idx: usize) -> &PlanNode {
        &self.nodes[idx]
    }
}

// ---------------------------------------------------------------------------
// Construction (two passes: flatten + register labels, then resolve refs)
// ---------------------------------------------------------------------------

enum EdgeTargetRaw {
    Ref(String),
    Resolved(usize),
}

struct RawNode {
    step: ResolvedStepSkeleton,
    raw_edges: Vec<(String, EdgeTargetRaw)>,
    fallthrough: Option<usize>,
    scope_id: usize,
}

enum ResolvedStepSkeleton {
    Bare { node_type: String },
    Node { node_type: String, is_loop: bool, config: Map<String, Value> },
    StateSet { path: String, value: Value },
    Block { label: String },
}

struct ScopeTable {
    parent: Option<usize>,
    labels: HashMap<String, usize>,
}

struct Builder {
    arena: Vec<RawNode>,
    scopes: Vec<ScopeTable>,
}

impl Builder {
    fn build_scope(&mut self, steps: &[Step], scope_id: usize, base_path: &str) -> Result<Option<usize>, ValidationError> {
        let mut first_index = None;
        let mut prev_index: Option<usize> = None;

        for (pos, step) in steps.iter().enumerate() {
            let idx = self.arena.len();
            self.arena.push(RawNode {
                step: ResolvedStepSkeleton::Bare { node_type: String::new() },
                raw_edges: Vec::new(),
                fallthrough: None,
                scope_id,
            });

            if first_index.is_none() {
                first_index = Some(idx);
            }
            if let Some(prev) = prev_index {
                self.arena[prev].fallthrough = Some(idx);
            }

            // Blocks are always addressable by their label. Node/Bare steps
            // are also addressable by their bare node type, first
            // declaration wins, so a step can target an earlier or later
            // occurrence of the same node type in scope — this is what
            // lets a loop node's own edge reference itself by name.
            let implicit_label = match step {
                Step::Block { label, .. } => Some(label.clone()),
                Step::Node { node_type, .. } | Step::Bare { node_type } => Some(node_type.clone()),
                Step::StateSet { .. } => None,
            };
            if let Some(label) = implicit_label {
                self.scopes[scope_id].labels.entry(label).or_insert(idx);
            }

            let step_path = format!("{base_path}[{pos}]");
            let (skeleton, raw_edges) = match step {
                Step::Bare { node_type } => (ResolvedStepSkeleton::Bare { node_type: node_type.clone() }, Vec::new()),
                Step::StateSet { path, value } => {
                    (ResolvedStepSkeleton::StateSet { path: path.clone(), value: value.clone() }, Vec::new())
                }
                Step::Node { node_type, is_loop, config, edges } => {
                    let raw = self.resolve_edge_list(edges, scope_id, &step_path)?;
                    (
                        ResolvedStepSkeleton::Node {
                            node_type: node_type.clone(),
                            is_loop: *is_loop,
                            config: config.clone(),
                        },
                        raw,
                    )
                }
                Step::Block { label, edges } => {
                    let raw = self.resolve_edge_list(edges, scope_id, &step_path)?;
                    (ResolvedStepSkeleton::Block { label: label.clone() }, raw)
                }
            };

            self.arena[idx].step = skeleton;
            self.arena[idx].raw_edges = raw_edges;
            prev_index = Some(idx);
        }

        Ok(first_index)
    }

    fn resolve_edge_list(
        &mut self,
        edges: &[(String, EdgeTarget)],
        scope_id: usize,
        step_path: &str,
    ) -> Result<Vec<(String, EdgeTargetRaw)>, ValidationError> {
        let mut out = Vec::with_capacity(edges.len());
        for (name, target) in edges {
            let raw_target = match target {
                EdgeTarget::Ref(label) => EdgeTargetRaw::Ref(label.clone()),
                EdgeTarget::Inline(inner) => {
                    let child_scope = self.scopes.len();
                    self.scopes.push(ScopeTable { parent: Some(scope_id), labels: HashMap::new() });
                    let entry = self.build_scope(inner, child_scope, step_path)?;
                    match entry {
                        Some(idx) => EdgeTargetRaw::Resolved(idx),
                        None => {
                            return Err(ValidationError::UnresolvedEdgeTarget {
                                path: step_path.to_string(),
                                edge: name.clone(),
                                target: "<empty inline sub-workflow>".to_string(),
                            })
                        }
                    }
                }
            };
            out.push((name.clone(), raw_target));
        }
        Ok(out)
    }

    fn resolve_label(&self, scope_id: usize, label: &str) -> Option<usize> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            if let Some(&idx) = self.scopes[id].labels.get(label) {
                return Some(idx);
            }
            current = self.scopes[id].parent;
        }
        None
    }
}

/// Build a [`Plan`] from an already-classified root step list.
pub fn build_plan(
    root_steps: &[Step],
    loop_cap: u32,
    _registry: &Registry,
) -> Result<Plan, ValidationError> {
    let mut builder = Builder { arena: Vec::new(), scopes: vec![ScopeTable { parent: None, labels: HashMap::new() }] };

    let entry = builder.build_scope(root_steps, 0, "$.workflow")?.ok_or(ValidationError::EmptyWorkflow)?;

    let mut nodes = Vec::with_capacity(builder.arena.len());
    for raw in &builder.arena {
        let mut edges = Vec::with_capacity(raw.raw_edges.len());
        for (name, target) in &raw.raw_edges {
            let idx = match target {
                EdgeTargetRaw::Resolved(idx) => *idx,
                EdgeTargetRaw::Ref(label) => builder.resolve_label(raw.scope_id, label).ok_or_else(|| {
                    ValidationError::UnresolvedEdgeTarget {
                        path: "$.workflow".to_string(),
                        edge: name.clone(),
                        target: label.clone(),
                    }
                })?,
            };
            edges.push((name.clone(), idx));
        }

        let step = match &raw.step {
            ResolvedStepSkeleton::Bare { node_type } => ResolvedStep::Bare { node_type: node_type.clone() },
            ResolvedStepSkeleton::StateSet { path, value } => {
                ResolvedStep::StateSet { path: path.clone(), value: value.clone() }
            }
            ResolvedStepSkeleton::Block { label } => ResolvedStep::Block { label: label.clone(), edges },
            ResolvedStepSkeleton::Node { node_type, is_loop, config } => {
                ResolvedStep::Node { node_type: node_type.clone(), is_loop: *is_loop, config: config.clone(), edges }
            }
        };

        nodes.push(PlanNode { step, fallthrough: raw.fallthrough });
    }

    Ok(Plan { nodes, entry, loop_cap })
}
