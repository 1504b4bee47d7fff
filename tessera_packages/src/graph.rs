use crate::{Package, PackageError};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Directed graph over a candidate set of package ids
///
/// Edges point from a package to each of its required dependencies, dependencies outside of the
/// candidate set are ignored for ordering.
///
/// # Ordering
/// Packages which become ready at the same time are emitted in FIFO order: candidates with no
/// dependencies in insertion order first, then every package in the order it became ready.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    /// Declared required dependencies of every node
    dependencies: Vec<Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate, adding the same id twice merges the dependency lists
    pub fn add_package<I, S>(&mut self, package_id: impl Into<String>, required: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let package_id = package_id.into();
        let node = match self.index.get(&package_id) {
            Some(node) => *node,
            None => {
                self.nodes.push(package_id.clone());
                self.dependencies.push(Vec::new());
                self.index.insert(package_id, self.nodes.len() - 1);
                self.nodes.len() - 1
            }
        };
        self.dependencies[node].extend(required.into_iter().map(Into::into));
    }

    /// Graph over `packages` using their required dependencies
    pub fn from_packages<'a>(packages: impl IntoIterator<Item = &'a Package>) -> Self {
        let mut graph = Self::new();
        for package in packages {
            graph.add_package(package.id(), package.required_dependencies());
        }
        graph
    }

    pub fn contains(&self, package_id: &str) -> bool {
        self.index.contains_key(package_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// node -> dependency nodes inside of the candidate set, without duplicates
    fn edges(&self) -> Vec<Vec<usize>> {
        self.dependencies
            .iter()
            .map(|dependencies| {
                let mut edges: Vec<usize> = Vec::with_capacity(dependencies.len());
                for dependency in dependencies {
                    if let Some(node) = self.index.get(dependency) {
                        if !edges.contains(node) {
                            edges.push(*node);
                        }
                    }
                }
                edges
            })
            .collect()
    }

    /// Depth first search with three colors, returns the first cycle found as
    /// `[a, b, .., a]` following dependency edges
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let edges = self.edges();
        let mut states = vec![VisitState::Unvisited; self.nodes.len()];
        let mut stack = Vec::new();
        (0..self.nodes.len()).find_map(|node| {
            if states[node] == VisitState::Unvisited {
                self.visit(node, &edges, &mut states, &mut stack)
            } else {
                None
            }
        })
    }

    fn visit(
        &self,
        node: usize,
        edges: &[Vec<usize>],
        states: &mut [VisitState],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<String>> {
        states[node] = VisitState::InProgress;
        stack.push(node);
        for &dependency in edges[node].iter() {
            match states[dependency] {
                VisitState::InProgress => {
                    let start = stack.iter().position(|n| *n == dependency).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .map(|n| self.nodes[*n].clone())
                        .collect();
                    cycle.push(self.nodes[dependency].clone());
                    return Some(cycle);
                }
                VisitState::Unvisited => {
                    if let Some(cycle) = self.visit(dependency, edges, states, stack) {
                        return Some(cycle);
                    }
                }
                VisitState::Done => {}
            }
        }
        stack.pop();
        states[node] = VisitState::Done;
        None
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Kahn's algorithm, returns the ordered ids and every id which could not be ordered
    ///
    /// Ids left over either sit on a cycle or depend on one.
    pub fn partial_order(&self) -> (Vec<String>, Vec<String>) {
        let edges = self.edges();
        let mut in_degree: Vec<usize> = edges.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (node, node_edges) in edges.iter().enumerate() {
            for dependency in node_edges {
                dependents[*dependency].push(node);
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|node| in_degree[*node] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(self.nodes[node].clone());
            for dependent in dependents[node].iter() {
                in_degree[*dependent] -= 1;
                if in_degree[*dependent] == 0 {
                    queue.push_back(*dependent);
                }
            }
        }

        let unresolved = (0..self.nodes.len())
            .filter(|node| in_degree[*node] > 0)
            .map(|node| self.nodes[node].clone())
            .collect();
        (order, unresolved)
    }

    /// Order every candidate after all of its dependencies, fails on a cycle
    pub fn resolve(&self) -> Result<Vec<String>, PackageError> {
        if let Some(cycle) = self.find_cycle() {
            return Err(PackageError::DependencyCycle(cycle));
        }
        Ok(self.partial_order().0)
    }

    /// Same as [`Self::resolve`], but signals a cycle with an empty order
    pub fn load_order(&self) -> Vec<String> {
        match self.resolve() {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!("{e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(packages: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (id, deps) in packages {
            graph.add_package(*id, deps.iter().copied());
        }
        graph
    }

    fn assert_dependencies_first(graph_def: &[(&str, &[&str])], order: &[String]) {
        let position = |id: &str| order.iter().position(|o| o == id);
        for (id, deps) in graph_def {
            for dep in deps.iter() {
                if let (Some(p), Some(d)) = (position(*id), position(*dep)) {
                    assert!(d < p, "{dep} must come before {id} in {order:?}");
                }
            }
        }
    }

    #[test]
    fn test_simple_chain() {
        let g = graph(&[("b", &["a"]), ("a", &[])]);
        assert_eq!(g.load_order(), vec!["a", "b"]);
    }

    #[test]
    fn test_fifo_tie_break() {
        // c and a are both ready from the start, insertion order wins over alphabetical
        let g = graph(&[("c", &[]), ("a", &[]), ("b", &["c", "a"])]);
        assert_eq!(g.load_order(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_diamond() {
        let def: &[(&str, &[&str])] = &[
            ("app", &["render", "audio"]),
            ("render", &["core"]),
            ("audio", &["core"]),
            ("core", &[]),
        ];
        let order = graph(def).load_order();
        assert_eq!(order, vec!["core", "render", "audio", "app"]);
        assert_dependencies_first(def, &order);
    }

    #[test]
    fn test_dependency_outside_candidates_ignored() {
        let g = graph(&[("b", &["a", "external"]), ("a", &["base"])]);
        assert_eq!(g.load_order(), vec!["a", "b"]);
    }

    #[test]
    fn test_cycle_returns_empty() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"]), ("d", &[])]);
        assert!(g.load_order().is_empty());
        match g.resolve() {
            Err(PackageError::DependencyCycle(cycle)) => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("Expected DependencyCycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let g = graph(&[("a", &["a"])]);
        assert!(g.has_cycle());
        assert!(g.load_order().is_empty());
    }

    #[test]
    fn test_partial_order_skips_cycle_members() {
        let g = graph(&[
            ("a", &["b"]),
            ("b", &["a"]),
            ("c", &[]),
            ("d", &["a"]),
            ("e", &["c"]),
        ]);
        let (order, unresolved) = g.partial_order();
        assert_eq!(order, vec!["c", "e"]);
        assert_eq!(unresolved, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_duplicate_edges_and_nodes() {
        let mut g = graph(&[("b", &["a", "a"]), ("a", &[])]);
        g.add_package("b", ["a"]);
        assert_eq!(g.len(), 2);
        assert_eq!(g.load_order(), vec!["a", "b"]);
    }

    #[test]
    fn test_from_packages_ignores_optional() {
        use crate::model::tests::package;
        let packages = [package("b", &["a"], &["c"]), package("c", &["b"], &[]), package("a", &[], &[])];
        let g = DependencyGraph::from_packages(packages.iter());
        assert_eq!(g.load_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_generated_acyclic_graphs() {
        // every package depends on a subset of the packages declared before it
        for seed in 0u64..32 {
            let mut g = DependencyGraph::new();
            let ids: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();
            let mut def: Vec<(String, Vec<String>)> = Vec::new();
            for (i, id) in ids.iter().enumerate().rev() {
                let deps: Vec<String> = (0..i)
                    .filter(|j| (seed.wrapping_mul(31) ^ (*j as u64 * 7 + i as u64)) % 3 == 0)
                    .map(|j| ids[j].clone())
                    .collect();
                def.push((id.clone(), deps.clone()));
                g.add_package(id.clone(), deps);
            }
            let order = g.load_order();
            assert_eq!(order.len(), ids.len());
            let borrowed: Vec<(&str, Vec<&str>)> = def
                .iter()
                .map(|(id, deps)| (id.as_str(), deps.iter().map(String::as_str).collect()))
                .collect();
            let def_refs: Vec<(&str, &[&str])> = borrowed
                .iter()
                .map(|(id, deps)| (*id, deps.as_slice()))
                .collect();
            assert_dependencies_first(&def_refs, &order);
        }
    }
}
