//! Job dependency graph built from `JobSpec::needs` + petgraph
//!
//! - **Edges**: `A → B` means "B needs A" (A must succeed before B starts)
//! - **Phases**: topological layers; jobs in one layer have no ordering among them
//! - **Dependents**: everything transitively blocked when a job fails

use crate::core::error::{ShipError, ShipResult, ValidationError};
use crate::pipeline::plan::JobSpec;
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::HashMap;

pub struct JobGraph {
  graph: DiGraph<String, ()>,
  index: HashMap<String, NodeIndex>,
}

impl JobGraph {
  /// Build and validate the graph: duplicate ids, unknown needs and cycles are errors
  pub fn from_jobs(jobs: &[JobSpec]) -> ShipResult<Self> {
    let invalid = |reason: String| ShipError::Validation(ValidationError::GraphInvalid { reason });

    let mut graph = DiGraph::new();
    let mut index = HashMap::new();
    for job in jobs {
      if index.contains_key(&job.id) {
        return Err(invalid(format!("duplicate job id '{}'", job.id)));
      }
      let node = graph.add_node(job.id.clone());
      index.insert(job.id.clone(), node);
    }

    for job in jobs {
      let to = index[&job.id];
      for need in &job.needs {
        let from = index
          .get(need)
          .copied()
          .ok_or_else(|| invalid(format!("job '{}' needs unknown job '{}'", job.id, need)))?;
        graph.add_edge(from, to, ());
      }
    }

    if let Err(cycle) = algo::toposort(&graph, None) {
      return Err(invalid(format!("dependency cycle through '{}'", graph[cycle.node_id()])));
    }

    Ok(Self { graph, index })
  }

  /// Topological layers. Jobs inside a layer keep declaration order.
  pub fn phases(&self) -> Vec<Vec<String>> {
    // Validated acyclic in from_jobs
    let order = algo::toposort(&self.graph, None).unwrap_or_default();

    let mut level: HashMap<NodeIndex, usize> = HashMap::new();
    for node in &order {
      let depth = self
        .graph
        .neighbors_directed(*node, Direction::Incoming)
        .filter_map(|pred| level.get(&pred))
        .map(|d| d + 1)
        .max()
        .unwrap_or(0);
      level.insert(*node, depth);
    }

    let depth = level.values().copied().max().map_or(0, |d| d + 1);
    let mut phases: Vec<Vec<NodeIndex>> = vec![Vec::new(); depth];
    for (node, d) in &level {
      phases[*d].push(*node);
    }

    phases
      .into_iter()
      .map(|mut nodes| {
        nodes.sort();
        nodes.into_iter().map(|n| self.graph[n].clone()).collect()
      })
      .collect()
  }

  /// Direct prerequisites of a job
  pub fn needs(&self, id: &str) -> Vec<String> {
    self.neighbors(id, Direction::Incoming)
  }

  /// Every job transitively blocked by `id`
  pub fn dependents(&self, id: &str) -> Vec<String> {
    let Some(&start) = self.index.get(id) else {
      return Vec::new();
    };
    let mut found = Vec::new();
    let mut dfs = Dfs::new(&self.graph, start);
    while let Some(node) = dfs.next(&self.graph) {
      if node != start {
        found.push(node);
      }
    }
    found.sort();
    found.into_iter().map(|n| self.graph[n].clone()).collect()
  }

  fn neighbors(&self, id: &str, dir: Direction) -> Vec<String> {
    let Some(&node) = self.index.get(id) else {
      return Vec::new();
    };
    let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(node, dir).collect();
    nodes.sort();
    nodes.into_iter().map(|n| self.graph[n].clone()).collect()
  }
}
