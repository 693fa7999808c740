//! The search tree: an append-only arena of nodes, each holding one code
//! item plus its UCB bookkeeping. Grounded on `MctsNode.py`'s parent/child
//! object graph, re-expressed as indices into a `Vec` rather than Python
//! object references/garbage collection — per the design notes' "arena
//! allocator keyed by node index" guidance (§9), since Rust has no ambient
//! GC to lean on for a tree that only ever grows during one search.

use crate::config::SearchConfig;
use crate::fragment::CodeItem;
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

pub type NodeId = u32;

/// The tree always has a root at index 0, created empty by `MctsTree::new`.
pub const ROOT: NodeId = 0;

/// One tree node: a code item to run from its parent's stack state (`None`
/// only for the root), its UCB prior, and its accumulated reward/visits.
#[derive(Debug, Clone)]
pub struct MctsNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub code: Option<CodeItem>,
    pub prior: f64,
    pub reward: f64,
    pub visits: u32,
}

/// An append-only arena tree. Nodes are never removed mid-search; a finished
/// search's tree is simply dropped.
#[derive(Debug, Clone)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl Default for MctsTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MctsTree {
    pub fn new() -> Self {
        MctsTree { nodes: vec![MctsNode { parent: None, children: Vec::new(), code: None, prior: 0.0, reward: 0.0, visits: 0 }] }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id as usize]
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes[id as usize].parent.is_none()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id as usize].children.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id as usize].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id as usize].children
    }

    /// Adds a child under `parent` with its own one-shot reward already
    /// counted (`visits = 1`, mirroring the original constructor: a freshly
    /// expanded move already carries the evaluation that produced it).
    pub fn add_child(&mut self, parent: NodeId, code: CodeItem, prior: f64, reward: f64) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(MctsNode { parent: Some(parent), children: Vec::new(), code: Some(code), prior, reward, visits: 1 });
        self.nodes[parent as usize].children.push(id);
        id
    }

    /// `MctsNode.ucb_score`: PUCT-style score combining the prior (scaled by
    /// a visit-count-dependent exploration coefficient) with a discounted
    /// mean reward.
    pub fn ucb_score(&self, parent: NodeId, child: NodeId, cfg: &SearchConfig) -> f64 {
        let p = &self.nodes[parent as usize];
        let c = &self.nodes[child as usize];
        let mut pb_c = ((p.visits as f64 + cfg.ucb_c_base + 1.0) / cfg.ucb_c_base).ln() + cfg.ucb_c_init;
        pb_c *= (p.visits as f64).sqrt() / (c.visits as f64 + 1.0);
        let prior_score = pb_c * c.prior;
        let value_score = cfg.ucb_discount * (c.reward / (c.visits as f64 + 1.0));
        prior_score + value_score
    }

    /// The highest-scoring child, ties broken by insertion (creation) order
    /// — the same tie-break `max()` over a generator gives in the original.
    pub fn select_child(&self, parent: NodeId, cfg: &SearchConfig) -> NodeId {
        let children = &self.nodes[parent as usize].children;
        let mut best = children[0];
        let mut best_score = self.ucb_score(parent, best, cfg);
        for &c in &children[1..] {
            let score = self.ucb_score(parent, c, cfg);
            if score > best_score {
                best_score = score;
                best = c;
            }
        }
        best
    }

    /// Walks from the root down through `select_child` until a leaf.
    pub fn select_leaf(&self, cfg: &SearchConfig) -> NodeId {
        let mut node = self.root();
        while !self.is_leaf(node) {
            node = self.select_child(node, cfg);
        }
        node
    }

    /// The chain of ancestors from (but not including) the root down to and
    /// including `node`, in root-to-node order.
    pub fn path_to_node(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cur = node;
        while let Some(parent) = self.nodes[cur as usize].parent {
            path.push(cur);
            cur = parent;
        }
        path.reverse();
        path
    }

    /// The concatenation of every ancestor's code item, root to `node`
    /// inclusive — the program a fresh VM state must replay to reach the
    /// stack frame `node` represents.
    pub fn code_in_path(&self, node: NodeId) -> CodeItem {
        self.path_to_node(node)
            .into_iter()
            .flat_map(|id| self.nodes[id as usize].code.clone().unwrap_or_default())
            .collect()
    }

    /// Dirichlet exploration noise blended into `node`'s children's priors.
    /// A no-op when `node` has no children yet (the original's root call
    /// only ever fires once the root has been expanded at least once).
    pub fn add_exploration_noise(&mut self, node: NodeId, cfg: &SearchConfig, rng: &mut impl Rng) {
        let children = self.nodes[node as usize].children.clone();
        let n = children.len();
        if n == 0 {
            return;
        }
        let dirichlet = Dirichlet::new(vec![cfg.dirichlet_alpha; n]).expect("positive alpha, nonempty support");
        let noise: Vec<f64> = dirichlet.sample(rng);
        for (&child, n) in children.iter().zip(noise) {
            let c = &mut self.nodes[child as usize];
            c.prior = c.prior * (1.0 - cfg.exploration_frac) + n * cfg.exploration_frac;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_synth_runtime::Value;
    use rand::SeedableRng;

    #[test]
    fn root_starts_as_its_own_leaf() {
        let tree = MctsTree::new();
        assert!(tree.is_leaf(tree.root()));
        assert!(tree.is_root(tree.root()));
    }

    #[test]
    fn select_child_picks_the_highest_ucb_score() {
        let cfg = SearchConfig::default();
        let mut tree = MctsTree::new();
        let a = tree.add_child(tree.root(), vec![], 0.1, 0.0);
        let b = tree.add_child(tree.root(), vec![], 0.9, 0.0);
        assert_eq!(tree.select_child(tree.root(), &cfg), b);
        let _ = a;
    }

    #[test]
    fn code_in_path_concatenates_ancestors_root_to_node() {
        let mut tree = MctsTree::new();
        let a = tree.add_child(tree.root(), vec![Value::Integer(1)], 0.5, 0.0);
        let b = tree.add_child(a, vec![Value::Integer(2)], 0.5, 0.0);
        assert_eq!(tree.code_in_path(b), vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn exploration_noise_changes_priors_but_preserves_their_sum_roughly() {
        let cfg = SearchConfig::default();
        let mut tree = MctsTree::new();
        tree.add_child(tree.root(), vec![], 0.5, 0.0);
        tree.add_child(tree.root(), vec![], 0.5, 0.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        tree.add_exploration_noise(tree.root(), &cfg, &mut rng);
        let priors: Vec<f64> = tree.children(tree.root()).iter().map(|&id| tree.node(id).prior).collect();
        assert!(priors.iter().all(|&p| p.is_finite() && p >= 0.0));
    }
}
