//! The NodeRecord side-table (spec §3, §9): per-AST-node annotations Sema computes
//! and Codegen reads, keyed by [`NodeId`] rather than by AST-node identity, since the
//! lowered tree is an owned value type and not a pointer graph.

use std::collections::HashMap;

use crate::ast::{ExprNode, NodeId};
use crate::value::Value;

/// One case arm's label, in visit order, for a `switch` (spec §4.4.5). `None` for the
/// default arm's slot in sequencing, `Some(i)` for `case i:`.
#[derive(Debug, Clone)]
pub struct CaseLabel {
    pub value: Option<i64>,
    pub label: String,
}

/// Everything Sema may attach to one AST node.
#[derive(Debug, Clone, Default)]
pub struct NodeRecord {
    pub value: Option<Value>,
    /// A replacement subtree Sema constructed in place of the original (spec §4.4.4);
    /// Codegen dispatches on this when present.
    pub translated: Option<Box<ExprNode>>,
    /// Monotone flag preventing re-emission of a declaration Codegen has already
    /// visited.
    pub visited: bool,
    /// Labels this control-flow node owns (spec §4.4.5): e.g. an `If` owns
    /// `["if.false", "if.end"]`.
    pub labels: Vec<String>,
    /// For `Switch` nodes: the ordered list of case labels planted as cases are
    /// visited.
    pub cases: Vec<CaseLabel>,
    /// Set on a function body's top-level `Compound` node: the frame size Codegen
    /// subtracts from `sp` in the prologue (invariant 6).
    pub max_frame_size: Option<usize>,
}

/// Side-table associating each [`NodeId`] with its [`NodeRecord`]. Backed by a `Vec`
/// since ids are dense and assigned sequentially by [`crate::ast::NodeIdGen`].
#[derive(Debug, Default)]
pub struct NodeRecordStore {
    records: Vec<NodeRecord>,
    /// Labels reserved by a `goto`/`label` pair use names, not ids; kept alongside as
    /// a convenience index for §4.2's "the set of labels referenced by goto" check.
    label_names: HashMap<String, NodeId>,
}

impl NodeRecordStore {
    pub fn with_capacity(n: usize) -> Self {
        NodeRecordStore {
            records: (0..n).map(|_| NodeRecord::default()).collect(),
            label_names: HashMap::new(),
        }
    }

    fn ensure(&mut self, id: NodeId) {
        let idx = id.0 as usize;
        if idx >= self.records.len() {
            self.records.resize_with(idx + 1, NodeRecord::default);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeRecord> {
        self.records.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        self.ensure(id);
        &mut self.records[id.0 as usize]
    }

    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.get_mut(id).value = Some(value);
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.get(id).and_then(|r| r.value.as_ref())
    }

    pub fn mark_visited(&mut self, id: NodeId) -> bool {
        let rec = self.get_mut(id);
        let was = rec.visited;
        rec.visited = true;
        !was
    }

    pub fn register_label(&mut self, name: String, owner: NodeId) {
        self.label_names.insert(name, owner);
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_names.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin;
    use crate::value::Value;

    #[test]
    fn set_then_get_round_trips() {
        let mut store = NodeRecordStore::with_capacity(4);
        let id = NodeId(2);
        store.set_value(id, Value::IntConstant { value: 1, ty: builtin::int() });
        assert!(store.value(id).is_some());
    }

    #[test]
    fn mark_visited_is_monotone() {
        let mut store = NodeRecordStore::with_capacity(1);
        let id = NodeId(0);
        assert!(store.mark_visited(id));
        assert!(!store.mark_visited(id));
    }
}
