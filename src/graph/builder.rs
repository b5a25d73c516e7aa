//! Builds the four graphs of an analysis from its collected results.

use std::collections::{BTreeMap, BTreeSet};

use super::resolve::{dir_of, Resolver};
use super::{CodeGraph, GraphKind, Graphs};
use crate::analysis::{Analysis, CodeResult};

/// Resolve every import and parent reference of the analysis' results.
///
/// Edges are only added between results present in the analysis; references
/// that match nothing are dropped and counted.
pub fn build_graphs(analysis: &Analysis) -> Graphs {
    let policy = analysis.settings().resolution;

    let mut file_resolver = Resolver::new(policy);
    for name in analysis.file_results().keys() {
        file_resolver.add_file(name);
    }

    let mut entity_resolver = Resolver::new(policy);
    let mut entities_by_file: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, entity) in analysis.entity_results() {
        entity_resolver.add_entity(name, entity.display_name(), entity.file_unique_name());
        entities_by_file
            .entry(entity.file_unique_name())
            .or_default()
            .push(name.as_str());
    }

    let mut unresolved_dependencies = 0;
    let mut unresolved_inheritance = 0;

    let mut file_edges = BTreeSet::new();
    for (name, file) in analysis.file_results() {
        let separator = file.language().rules().module_separator;
        let from_dir = dir_of(name);
        for reference in file.imports() {
            match file_resolver.resolve(reference, separator, &from_dir, name) {
                Some(target) => {
                    file_edges.insert((name.clone(), target.to_string()));
                }
                None => {
                    tracing::trace!(from = %name, reference = %reference, "unresolved import");
                    unresolved_dependencies += 1;
                }
            }
        }
    }

    let mut dependency_edges = BTreeSet::new();
    let mut inheritance_edges = BTreeSet::new();
    for (name, entity) in analysis.entity_results() {
        let separator = entity.language().rules().module_separator;
        let from_dir = dir_of(entity.file_unique_name());

        for reference in entity.imports() {
            if let Some(target) = entity_resolver.resolve(reference, separator, &from_dir, name) {
                dependency_edges.insert((name.clone(), target.to_string()));
                continue;
            }

            // An import of a file links to every entity that file declares.
            let file_target = file_resolver.resolve(reference, separator, &from_dir, entity.file_unique_name());
            match file_target.and_then(|f| entities_by_file.get(f)) {
                Some(targets) => {
                    for target in targets {
                        dependency_edges.insert((name.clone(), target.to_string()));
                    }
                }
                None => unresolved_dependencies += 1,
            }
        }

        for parent in entity.parents() {
            match entity_resolver.resolve(parent, separator, &from_dir, name) {
                Some(target) => {
                    inheritance_edges.insert((name.clone(), target.to_string()));
                }
                None => {
                    tracing::trace!(from = %name, parent = %parent, "unresolved parent");
                    unresolved_inheritance += 1;
                }
            }
        }
    }

    let file_nodes: BTreeSet<String> = analysis.file_results().keys().cloned().collect();
    let entity_nodes: BTreeSet<String> = analysis.entity_results().keys().cloned().collect();

    let file_dependency = CodeGraph::from_parts(GraphKind::FileDependency, file_nodes, &file_edges);
    let entity_dependency =
        CodeGraph::from_parts(GraphKind::EntityDependency, entity_nodes.clone(), &dependency_edges);
    let entity_inheritance =
        CodeGraph::from_parts(GraphKind::EntityInheritance, entity_nodes, &inheritance_edges);
    let entity_complete =
        CodeGraph::union(GraphKind::EntityComplete, &entity_dependency, &entity_inheritance);

    tracing::debug!(
        file_edges = file_dependency.edge_count(),
        dependency_edges = entity_dependency.edge_count(),
        inheritance_edges = entity_inheritance.edge_count(),
        unresolved_dependencies,
        unresolved_inheritance,
        "graphs built"
    );

    let mut graphs = BTreeMap::new();
    for graph in [file_dependency, entity_dependency, entity_inheritance, entity_complete] {
        graphs.insert(graph.kind(), graph);
    }

    Graphs {
        graphs,
        unresolved_dependencies,
        unresolved_inheritance,
    }
}
