//! The search graph.
//!
//! Every applied action adds a node holding the equation it produced plus the
//! undo record needed to get back to its parent. A cursor marks the current
//! node; backtracking pops nodes off the current path (the nodes stay in the
//! graph, marked dead, so the whole search can be exported afterwards).
//!
//! Each node also remembers which child actions were already tried from it,
//! and the graph keeps a table of every equation reached so far. Reaching a
//! known equation along another path is never useful: the action is recorded
//! as *ignored* instead. The one exception is a full traversal, which may
//! re-enter an equation when the substitution accumulated so far is shorter
//! than on the first visit.
//!
//! A node and the table share one copy of each equation.

use crate::actions::{Action, Undo};
use crate::equation::Equation;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::rc::Rc;

pub type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    /// On the current path, or not yet popped.
    Open,
    /// Popped while backtracking.
    Dead,
    /// Reached by the cleanup that completes a solution.
    Solution,
}

#[derive(Debug)]
pub struct HistoryNode {
    equation: Rc<Equation>,
    action: Option<Action>,
    undo: Option<Undo>,
    parent: Option<NodeId>,
    tried: HashSet<Action>,
    status: NodeStatus,
}

impl HistoryNode {
    fn new(
        equation: Rc<Equation>,
        action: Option<Action>,
        undo: Option<Undo>,
        parent: Option<NodeId>,
    ) -> Self {
        Self { equation, action, undo, parent, tried: HashSet::new(), status: NodeStatus::Open }
    }

    #[must_use]
    pub fn equation(&self) -> &Equation {
        &self.equation
    }

    /// The action that produced this node (`None` for the root).
    #[must_use]
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Number of distinct child actions attempted from this node.
    #[must_use]
    pub fn tried_count(&self) -> usize {
        self.tried.len()
    }
}

/// An action whose result was already known when it was tried.
#[derive(Clone, Debug)]
pub struct IgnoredEdge {
    pub from: NodeId,
    pub to: Option<NodeId>,
    pub action: Action,
}

#[derive(Clone, Copy, Debug)]
struct Reached {
    node: NodeId,
    /// Letters in the substitution when the equation was reached.
    weight: usize,
}

#[derive(Debug)]
pub struct History {
    nodes: Vec<HistoryNode>,
    cursor: NodeId,
    store: bool,
    store_equations: bool,
    revisit_cheaper: bool,
    known: HashMap<Rc<Equation>, Reached>,
    ignored: Vec<IgnoredEdge>,
    depth: usize,
    branch_depth: usize,
}

impl History {
    /// Start a graph at `root`.
    ///
    /// With `store` off only counters are kept and backtracking is impossible.
    /// With `store_equations` off no reached equation is ever considered known.
    #[must_use]
    pub fn new(root: Equation, store: bool, store_equations: bool) -> Self {
        let root = Rc::new(root);
        let mut known = HashMap::new();
        if store_equations {
            known.insert(Rc::clone(&root), Reached { node: 0, weight: 0 });
        }
        Self {
            nodes: vec![HistoryNode::new(root, None, None, None)],
            cursor: 0,
            store,
            store_equations,
            revisit_cheaper: false,
            known,
            ignored: Vec::new(),
            depth: 0,
            branch_depth: 0,
        }
    }

    /// Let a known equation be reached again with a lighter substitution.
    pub fn revisit_when_cheaper(&mut self) {
        self.revisit_cheaper = true;
    }

    #[must_use]
    pub fn is_storing(&self) -> bool {
        self.store
    }

    #[must_use]
    pub fn current(&self) -> NodeId {
        self.cursor
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &HistoryNode {
        &self.nodes[id]
    }

    #[must_use]
    pub fn nodes(&self) -> &[HistoryNode] {
        &self.nodes
    }

    #[must_use]
    pub fn ignored(&self) -> &[IgnoredEdge] {
        &self.ignored
    }

    /// Actions applied along the current path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Branch points along the current path.
    #[must_use]
    pub fn branch_depth(&self) -> usize {
        self.branch_depth
    }

    /// Number of distinct equations reached.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_tried(&self, action: &Action) -> bool {
        self.store && self.nodes[self.cursor].tried.contains(action)
    }

    /// Whether reaching `equation` with a substitution of `weight` letters adds nothing.
    #[must_use]
    pub fn is_known(&self, equation: &Equation, weight: usize) -> bool {
        self.store_equations
            && self
                .known
                .get(equation)
                .is_some_and(|reached| !self.revisit_cheaper || reached.weight <= weight)
    }

    pub(crate) fn record_applied(&mut self, action: Action, undo: Undo, equation: &Equation, weight: usize) {
        self.depth += 1;
        if action.is_branch() {
            self.branch_depth += 1;
        }
        if !self.store && !self.store_equations {
            return;
        }
        let shared = Rc::new(equation.clone());
        if self.store {
            self.nodes[self.cursor].tried.insert(action.clone());
            let node = HistoryNode::new(Rc::clone(&shared), Some(action), Some(undo), Some(self.cursor));
            self.nodes.push(node);
            self.cursor = self.nodes.len() - 1;
        }
        if self.store_equations {
            self.known.insert(shared, Reached { node: self.cursor, weight });
        }
    }

    pub(crate) fn record_ignored(&mut self, action: Action, equation: &Equation) {
        if !self.store {
            return;
        }
        self.nodes[self.cursor].tried.insert(action.clone());
        let to = self.known.get(equation).map(|reached| reached.node);
        self.ignored.push(IgnoredEdge { from: self.cursor, to, action });
    }

    /// Take the most recent action off the current path, moving the cursor to its parent.
    pub(crate) fn pop(&mut self) -> Option<(Action, Undo)> {
        if !self.store {
            return None;
        }
        let node = &mut self.nodes[self.cursor];
        let parent = node.parent?;
        let action = node.action.clone()?;
        let Some(undo) = node.undo.take() else {
            panic!("node {} on the current path lost its undo record", self.cursor);
        };
        if node.status == NodeStatus::Open {
            node.status = NodeStatus::Dead;
        }
        self.cursor = parent;
        self.depth -= 1;
        if action.is_branch() {
            self.branch_depth -= 1;
        }
        Some((action, undo))
    }

    pub fn mark_solution(&mut self) {
        if !self.store {
            return;
        }
        self.nodes[self.cursor].status = NodeStatus::Solution;
    }

    /// Equation at the cursor (the root when nothing is stored).
    #[must_use]
    pub fn current_equation(&self) -> &Equation {
        &self.nodes[self.cursor].equation
    }

    /// Ids of the nodes on the current path, root first.
    #[must_use]
    pub fn current_path(&self) -> Vec<NodeId> {
        let mut path = vec![self.cursor];
        let mut id = self.cursor;
        while let Some(parent) = self.nodes[id].parent {
            path.push(parent);
            id = parent;
        }
        path.reverse();
        path
    }

    /// Render the graph in Graphviz DOT format.
    ///
    /// Edges on the current path are bold, edges into solutions green, edges
    /// into dead nodes red, and ignored revisits dashed gray.
    #[must_use]
    pub fn to_dot(&self, include_ignored: bool) -> String {
        let on_path: HashSet<NodeId> = self.current_path().into_iter().collect();
        let mut dot = String::new();
        dot.push_str("digraph History {\n");
        dot.push_str("  rankdir=TB;\n");
        dot.push_str("  node [shape=box, style=\"rounded,filled\", fillcolor=white];\n");
        dot.push_str("  edge [fontsize=10];\n\n");

        for (id, node) in self.nodes.iter().enumerate() {
            let fill = match node.status {
                NodeStatus::Solution => "palegreen",
                NodeStatus::Dead => "mistyrose",
                NodeStatus::Open => "white",
            };
            let _ = writeln!(
                dot,
                "  n{id} [label=\"{}\", fillcolor={fill}{}];",
                escape_dot(&node.equation.render_collapsed()),
                if id == self.cursor { ", penwidth=2" } else { "" }
            );
        }
        dot.push('\n');

        for (id, node) in self.nodes.iter().enumerate() {
            let (Some(parent), Some(action)) = (node.parent, node.action.as_ref()) else {
                continue;
            };
            let style = match node.status {
                NodeStatus::Solution => "color=darkgreen",
                NodeStatus::Dead => "color=red",
                NodeStatus::Open if on_path.contains(&id) => "color=black, style=bold",
                NodeStatus::Open => "color=black",
            };
            let _ = writeln!(dot, "  n{parent} -> n{id} [label=\"{}\", {style}];", escape_dot(&action.to_string()));
        }

        if include_ignored {
            for (i, edge) in self.ignored.iter().enumerate() {
                let label = escape_dot(&edge.action.to_string());
                match edge.to {
                    Some(to) => {
                        let _ = writeln!(
                            dot,
                            "  n{} -> n{to} [label=\"{label}\", color=gray, style=dashed];",
                            edge.from
                        );
                    }
                    None => {
                        let _ = writeln!(dot, "  ignored{i} [label=\"?\", shape=point];");
                        let _ = writeln!(
                            dot,
                            "  n{} -> ignored{i} [label=\"{label}\", color=gray, style=dashed];",
                            edge.from
                        );
                    }
                }
            }
        }

        dot.push_str("}\n");
        dot
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Crop;
    use crate::symbol::Symbol;

    fn eq(lhs: &str, rhs: &str) -> Equation {
        let syms = |t: &str| -> Vec<Symbol> { t.chars().map(|c| Symbol::letter(&c.to_string())).collect() };
        Equation::new(syms(lhs), syms(rhs))
    }

    fn crop_action(prefix: &str) -> Action {
        let prefix = prefix.chars().map(|c| Symbol::letter(&c.to_string())).collect();
        Action::Crop(Crop::new(prefix, Vec::new()))
    }

    #[test]
    fn test_record_and_pop() {
        let mut history = History::new(eq("AB", "AB"), true, true);
        let next = eq("B", "B");
        history.record_applied(crop_action("A"), Undo::for_test(), &next, 0);
        assert_eq!(history.current(), 1);
        assert_eq!(history.depth(), 1);
        assert_eq!(history.branch_depth(), 0);
        assert!(history.is_known(&next, 0));

        let (action, _) = history.pop().unwrap();
        assert_eq!(action, crop_action("A"));
        assert_eq!(history.current(), 0);
        assert!(history.is_tried(&crop_action("A")));
        assert_eq!(history.node(1).status(), NodeStatus::Dead);
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_ignored_edges() {
        let root = eq("AB", "AB");
        let mut history = History::new(root.clone(), true, true);
        history.record_ignored(crop_action("AB"), &root);
        assert!(history.is_tried(&crop_action("AB")));
        assert_eq!(history.ignored().len(), 1);
        assert_eq!(history.ignored()[0].to, Some(0));
    }

    #[test]
    fn test_to_dot() {
        let mut history = History::new(eq("AB", "AB"), true, true);
        history.record_applied(crop_action("A"), Undo::for_test(), &eq("B", "B"), 0);
        history.mark_solution();
        history.record_ignored(crop_action("B"), &eq("AB", "AB"));

        let dot = history.to_dot(true);
        assert!(dot.starts_with("digraph History {"));
        assert!(dot.contains("n0 -> n1"));
        assert!(dot.contains("fillcolor=palegreen"));
        assert!(dot.contains("style=dashed"));
        assert!(!history.to_dot(false).contains("style=dashed"));
    }

    #[test]
    fn test_node_and_known_table_share_one_equation() {
        let mut history = History::new(eq("AB", "AB"), true, true);
        history.record_applied(crop_action("A"), Undo::for_test(), &eq("B", "B"), 0);
        for node in history.nodes() {
            assert_eq!(Rc::strong_count(&node.equation), 2);
        }
        let (stored, _) = history.known.get_key_value(&eq("B", "B")).unwrap();
        assert!(Rc::ptr_eq(stored, &history.node(1).equation));
    }

    #[test]
    fn test_cheaper_revisits() {
        let mut history = History::new(eq("AB", "AB"), true, true);
        history.record_applied(crop_action("A"), Undo::for_test(), &eq("B", "B"), 3);
        assert!(history.is_known(&eq("B", "B"), 1));

        history.revisit_when_cheaper();
        assert!(history.is_known(&eq("B", "B"), 3));
        assert!(history.is_known(&eq("B", "B"), 5));
        assert!(!history.is_known(&eq("B", "B"), 2));
        assert!(history.is_known(&eq("AB", "AB"), 0));
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_without_storage_nothing_is_tried_or_popped() {
            let mut history = History::new(eq("AB", "AB"), false, true);
            history.record_applied(crop_action("A"), Undo::for_test(), &eq("B", "B"), 0);
            assert_eq!(history.depth(), 1);
            assert_eq!(history.nodes().len(), 1);
            assert!(!history.is_tried(&crop_action("A")));
            assert!(history.is_known(&eq("B", "B"), 0));
            assert!(history.pop().is_none());
        }

        #[test]
        fn test_without_equation_store_nothing_is_known() {
            let history = History::new(eq("AB", "AB"), true, false);
            assert!(!history.is_known(&eq("AB", "AB"), 0));
        }

        #[test]
        fn test_escape_dot() {
            assert_eq!(escape_dot("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
        }
    }
}
