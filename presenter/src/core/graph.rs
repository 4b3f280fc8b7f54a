//! Revision bookkeeping for a static graph of derived values.
//!
//! The graph does not own values. It answers two questions for the owner of the
//! values: in which order derived keys must be evaluated, and which of them are
//! stale. Every key carries a revision counter. A derived key remembers the
//! revisions of its inputs at the time it was last computed (its stamp); it is
//! stale when any input revision moved since. Settling a key whose value did not
//! change leaves its own revision alone, so dependents stay fresh.
//!
//! Acyclicity is checked once, in [`DependencyGraph::build`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError<K: Debug> {
    #[error("key {0:?} declared more than once")]
    Duplicate(K),
    #[error("derived key {0:?} reads itself")]
    SelfDependency(K),
    #[error("derived key {key:?} reads undeclared key {input:?}")]
    UnknownInput { key: K, input: K },
    #[error("dependency cycle through {0:?}")]
    Cycle(K),
}

#[derive(Debug, Clone)]
pub struct DependencyGraph<K> {
    inputs: BTreeMap<K, Vec<K>>,
    plan: Vec<K>,
    revisions: BTreeMap<K, u64>,
    stamps: BTreeMap<K, Vec<u64>>,
}

impl<K: Copy + Ord + Debug> DependencyGraph<K> {
    /// Declare base keys and derived keys with the keys they read.
    ///
    /// Fails on duplicate keys, self reads, reads of undeclared keys and cycles.
    /// Every derived key starts stale.
    pub fn build(bases: &[K], derived: &[(K, &[K])]) -> Result<Self, GraphError<K>> {
        let mut graph: DiGraph<K, ()> = DiGraph::new();
        let mut index: BTreeMap<K, NodeIndex> = BTreeMap::new();

        for key in bases.iter().copied().chain(derived.iter().map(|(key, _)| *key)) {
            if index.insert(key, graph.add_node(key)).is_some() {
                return Err(GraphError::Duplicate(key));
            }
        }

        for &(key, reads) in derived {
            let to = index[&key];
            for &input in reads {
                if input == key {
                    return Err(GraphError::SelfDependency(key));
                }
                let from = *index
                    .get(&input)
                    .ok_or(GraphError::UnknownInput { key, input })?;
                graph.add_edge(from, to, ());
            }
        }

        let order =
            toposort(&graph, None).map_err(|cycle| GraphError::Cycle(graph[cycle.node_id()]))?;
        let derived_keys: BTreeSet<K> = derived.iter().map(|(key, _)| *key).collect();
        let plan = order
            .into_iter()
            .map(|node| graph[node])
            .filter(|key| derived_keys.contains(key))
            .collect();

        Ok(Self {
            inputs: derived
                .iter()
                .map(|(key, reads)| (*key, reads.to_vec()))
                .collect(),
            plan,
            revisions: index.keys().map(|key| (*key, 0)).collect(),
            stamps: BTreeMap::new(),
        })
    }

    /// Derived keys, each after everything it reads.
    pub fn plan(&self) -> &[K] {
        &self.plan
    }

    /// Declared inputs of a derived key (empty for base keys).
    pub fn inputs(&self, key: K) -> &[K] {
        self.inputs.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn revision(&self, key: K) -> u64 {
        self.revisions.get(&key).copied().unwrap_or(0)
    }

    /// Record that a base input changed.
    pub fn touch(&mut self, key: K) {
        *self.revisions.entry(key).or_insert(0) += 1;
    }

    /// True if `key` was never computed or an input moved since it was.
    pub fn is_stale(&self, key: K) -> bool {
        self.stamps.get(&key) != Some(&self.input_revisions(key))
    }

    /// Record that `key` was just computed. Bumps its revision only if `changed`.
    pub fn settle(&mut self, key: K, changed: bool) {
        let stamp = self.input_revisions(key);
        self.stamps.insert(key, stamp);
        if changed {
            self.touch(key);
        }
    }

    fn input_revisions(&self, key: K) -> Vec<u64> {
        self.inputs(key)
            .iter()
            .map(|input| self.revision(*input))
            .collect()
    }
}
