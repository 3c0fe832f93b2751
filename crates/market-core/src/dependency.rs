//! Dependency graph over installed extensions.
//!
//! Nodes are installed extension ids; edges point from an extension to the
//! ids it recorded as `linked_dependencies` at install time. A candidate that
//! is not installed yet is checked against this graph before anything is
//! downloaded.
//!
//! # Example
//!
//! ```
//! use market_core::dependency::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("b", ["a"]);
//!
//! // Installing `a` with a dependency on `b` would close the loop.
//! let err = graph.check_candidate("a", &["b".to_string()], 32).unwrap_err();
//! assert_eq!(err.to_string(), "circular dependency detected: a -> b -> a");
//! ```

use std::collections::{BTreeMap, HashSet};

use market_meta::LocalExtensionRecord;

use crate::error::{Error, Result};

/// Installed extensions and the dependencies each one declared.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Adjacency list: key depends on each value.
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a LocalExtensionRecord>) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.add_node(&record.extension_id, record.linked_dependencies.iter());
        }
        graph
    }

    /// Add (or replace) an installed node and its outgoing edges.
    pub fn add_node<I, S>(&mut self, id: &str, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edges.insert(
            id.to_string(),
            dependencies.into_iter().map(Into::into).collect(),
        );
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Installed extensions that list `id` as a dependency, sorted.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(node, deps)| node.as_str() != id && deps.iter().any(|d| d == id))
            .map(|(node, _)| node.as_str())
            .collect()
    }

    /// Validate a not-yet-installed candidate against the installed graph.
    ///
    /// The cycle walk runs first: it follows each declared dependency that
    /// is installed, then recurses through installed `linked_dependencies`.
    /// Any id that reappears in the active chain is a cycle. Only after that
    /// are declared dependencies checked for presence, so a self-dependency
    /// is reported as missing rather than circular.
    ///
    /// Chains longer than `max_depth` fail closed.
    pub fn check_candidate(
        &self,
        candidate: &str,
        declared: &[String],
        max_depth: usize,
    ) -> Result<()> {
        let mut walk = Walk {
            graph: self,
            chain: vec![candidate],
            finished: HashSet::new(),
            max_depth,
        };
        for dep in declared {
            if self.contains(dep) {
                walk.visit(dep)?;
            }
        }

        if let Some(missing) = declared.iter().find(|d| !self.contains(d)) {
            return Err(Error::MissingDependency {
                id: missing.clone(),
            });
        }
        Ok(())
    }
}

/// Depth-first walk state. `chain` holds the active path; `finished` holds
/// nodes whose subtrees are known to be acyclic.
struct Walk<'a> {
    graph: &'a DependencyGraph,
    chain: Vec<&'a str>,
    finished: HashSet<&'a str>,
    max_depth: usize,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, node: &'a str) -> Result<()> {
        if let Some(start) = self.chain.iter().position(|c| *c == node) {
            let mut cycle = self.chain[start..].to_vec();
            cycle.push(node);
            return Err(Error::CircularDependency {
                chain: cycle.join(" -> "),
            });
        }
        if self.finished.contains(node) {
            return Ok(());
        }
        if self.chain.len() >= self.max_depth {
            return Err(Error::DependencyTooDeep {
                limit: self.max_depth,
            });
        }

        self.chain.push(node);
        let graph = self.graph;
        for dep in graph.dependencies_of(node) {
            if self.chain.contains(&dep.as_str()) || graph.contains(dep) {
                self.visit(dep)?;
            }
        }
        self.chain.pop();
        self.finished.insert(node);
        Ok(())
    }
}
