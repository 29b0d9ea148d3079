use crate::error::{MigenError, Result};
use crate::generators::ColumnModelBuilder;
use crate::model::TableFields;
use crate::schema::SchemaIntrospector;
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// How table dependencies are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DependencyMode {
    /// Guess referenced tables from `_id` column suffixes. Best-effort.
    #[default]
    #[serde(rename = "naming")]
    NamingConvention,
    /// Follow the foreign keys the schema actually declares
    #[serde(rename = "foreign-keys")]
    ForeignKeys,
}

impl FromStr for DependencyMode {
    type Err = MigenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "naming" | "naming-convention" => Ok(DependencyMode::NamingConvention),
            "foreign-keys" | "foreign_keys" | "fk" => Ok(DependencyMode::ForeignKeys),
            other => Err(MigenError::Configuration(format!(
                "unknown dependency mode '{}', expected 'naming' or 'foreign-keys'",
                other
            ))),
        }
    }
}

impl fmt::Display for DependencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyMode::NamingConvention => f.write_str("naming"),
            DependencyMode::ForeignKeys => f.write_str("foreign-keys"),
        }
    }
}

/// Directed graph of tables; an edge `a -> b` means `b` must be created after `a`
#[derive(Debug, Default)]
pub struct TableGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl TableGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: &str) -> NodeIndex {
        if let Some(&node) = self.node_map.get(table) {
            return node;
        }
        let node = self.graph.add_node(table.to_string());
        self.node_map.insert(table.to_string(), node);
        node
    }

    /// Record that `table` depends on `depends_on`. Self references are ignored.
    pub fn add_dependency(&mut self, table: &str, depends_on: &str) {
        if table == depends_on {
            return;
        }
        let from = self.add_table(depends_on);
        let to = self.add_table(table);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.node_map.contains_key(table)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Tables `table` directly depends on
    pub fn dependencies_of(&self, table: &str) -> Vec<String> {
        match self.node_map.get(table) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|dep| self.graph[dep].clone())
                .collect(),
            None => vec![],
        }
    }

    /// Tables in creation order (dependencies first).
    ///
    /// Kahn's algorithm, always taking the earliest-added ready table, so tables that do not
    /// depend on each other keep the order they were added in.
    pub fn creation_order(&self) -> Result<Vec<String>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|node| {
                let degree = self.graph.neighbors_directed(node, Direction::Incoming).count();
                (node, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&node, _)| Reverse(node))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(self.graph[node].clone());
            for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(dependent));
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return Err(MigenError::CircularDependency(self.find_cycle()));
        }
        Ok(order)
    }

    /// Members of the first strongly connected component with more than one table,
    /// closed back onto the first member
    fn find_cycle(&self) -> Vec<String> {
        let mut components = petgraph::algo::tarjan_scc(&self.graph);
        components.retain(|component| component.len() > 1);

        let Some(component) = components.into_iter().next() else {
            return vec![];
        };

        let mut cycle: Vec<String> = component
            .iter()
            .rev()
            .map(|&node| self.graph[node].clone())
            .collect();
        if let Some(first) = cycle.first().cloned() {
            cycle.push(first);
        }
        cycle
    }

    /// Graphviz DOT rendering of the table graph
    pub fn to_graphviz(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph table_dependencies {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fillcolor=lightcyan];\n\n");

        for node in self.graph.node_indices() {
            output.push_str(&format!("  \"{}\";\n", self.graph[node]));
        }

        output.push('\n');

        for edge in self.graph.edge_indices() {
            if let Some((source, target)) = self.graph.edge_endpoints(edge) {
                output.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    self.graph[source], self.graph[target]
                ));
            }
        }

        output.push_str("}\n");
        output
    }
}

/// Orders tables so that every table is created after the tables it references
pub struct DependencyResolver<'a> {
    introspector: &'a dyn SchemaIntrospector,
    builder: &'a ColumnModelBuilder<'a>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector, builder: &'a ColumnModelBuilder<'a>) -> Self {
        Self {
            introspector,
            builder,
        }
    }

    /// Field sets of the requested tables and the tables they depend on, in creation order.
    ///
    /// Tables without columns are left out. Only foreign-key mode can fail, and only on a cycle.
    pub fn resolve(
        &self,
        tables: &[String],
        mode: DependencyMode,
    ) -> Result<IndexMap<String, TableFields>> {
        match mode {
            DependencyMode::NamingConvention => Ok(self.resolve_by_naming(tables)),
            DependencyMode::ForeignKeys => self.resolve_by_foreign_keys(tables),
        }
    }

    /// Depth-first, post-order walk over `_id` column guesses.
    ///
    /// A true cycle between two tables resolves in traversal order rather than failing.
    pub fn resolve_by_naming(&self, tables: &[String]) -> IndexMap<String, TableFields> {
        let mut visited = HashSet::new();
        let mut resolved = IndexMap::new();

        for table in tables {
            self.visit(table, &mut visited, &mut resolved);
        }

        resolved
    }

    fn visit(
        &self,
        table: &str,
        visited: &mut HashSet<String>,
        resolved: &mut IndexMap<String, TableFields>,
    ) {
        if !visited.insert(table.to_string()) {
            return;
        }

        let Some(fields) = self.builder.build(table) else {
            trace!(table, "Guessed dependency has no columns, ignoring");
            return;
        };

        for candidate in referenced_by_naming(&fields) {
            debug!(table, depends_on = %candidate, "Naming convention dependency");
            self.visit(&candidate, visited, resolved);
        }

        resolved.insert(table.to_string(), fields);
    }

    /// Topological order over declared foreign keys, pulling in referenced tables transitively
    pub fn resolve_by_foreign_keys(
        &self,
        tables: &[String],
    ) -> Result<IndexMap<String, TableFields>> {
        let order = self.foreign_key_graph(tables).creation_order()?;

        Ok(order
            .into_iter()
            .filter_map(|table| self.builder.build(&table).map(|fields| (table, fields)))
            .collect())
    }

    /// Dependency graph of the requested tables under `mode`
    pub fn graph(&self, tables: &[String], mode: DependencyMode) -> TableGraph {
        match mode {
            DependencyMode::ForeignKeys => self.foreign_key_graph(tables),
            DependencyMode::NamingConvention => {
                let resolved = self.resolve_by_naming(tables);
                let mut graph = TableGraph::new();
                for (table, fields) in &resolved {
                    graph.add_table(table);
                    for candidate in referenced_by_naming(fields) {
                        if resolved.contains_key(&candidate) {
                            graph.add_dependency(table, &candidate);
                        }
                    }
                }
                graph
            }
        }
    }

    fn foreign_key_graph(&self, tables: &[String]) -> TableGraph {
        let mut graph = TableGraph::new();
        let mut queue: VecDeque<String> = tables.iter().cloned().collect();
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(table) = queue.pop_front() {
            if !seen.insert(table.clone()) {
                continue;
            }
            if self.introspector.list_columns(&table).is_empty() {
                trace!(table = %table, "Referenced table has no columns, ignoring");
                continue;
            }

            graph.add_table(&table);
            for foreign_key in self.introspector.list_foreign_keys(&table) {
                let referenced = foreign_key.referenced_table;
                if referenced == table || self.introspector.list_columns(&referenced).is_empty() {
                    continue;
                }
                debug!(table = %table, depends_on = %referenced, "Foreign key dependency");
                graph.add_dependency(&table, &referenced);
                queue.push_back(referenced);
            }
        }

        graph
    }
}

/// Tables a field set points at by naming convention: `author_id` -> `authors`
fn referenced_by_naming(fields: &TableFields) -> Vec<String> {
    fields
        .keys()
        .filter_map(|key| key.strip_suffix("_id"))
        .filter(|stem| !stem.is_empty())
        .map(|stem| pluralizer::pluralize(stem, 2, false))
        .collect()
}
