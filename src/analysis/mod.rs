pub mod graph;

pub use graph::{DependencyMode, DependencyResolver, TableGraph};
