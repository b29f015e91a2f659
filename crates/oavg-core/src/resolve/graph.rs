use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;

use crate::parse::ref_resolve::parse_ref_name;
use crate::parse::schema::{AdditionalProperties, SchemaOrRef};

use super::registry::NameRegistry;

const UNVISITED: usize = usize::MAX;

/// Reference graph over component schemas.
///
/// Nodes live in an arena indexed by declaration position; edges are schema
/// references. Strongly connected components mark the schemas that refer
/// back to themselves, directly or through others.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
    component: Vec<usize>,
    recursive: Vec<bool>,
}

impl SchemaGraph {
    /// Build the graph from rewritten component schemas.
    pub fn build(schemas: &IndexMap<String, SchemaOrRef>, registry: &NameRegistry) -> Self {
        let nodes: Vec<String> = schemas
            .keys()
            .map(|key| registry.identifier(key).unwrap_or(key).to_string())
            .collect();
        let positions: HashMap<&str, usize> = schemas
            .keys()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i))
            .collect();

        let edges = schemas
            .values()
            .map(|schema| {
                let mut targets = Vec::new();
                collect_refs(schema, &mut |name| {
                    if let Some(&pos) = positions.get(name) {
                        if !targets.contains(&pos) {
                            targets.push(pos);
                        }
                    }
                });
                targets
            })
            .collect();

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        let mut graph = Self {
            nodes,
            index,
            edges,
            component: Vec::new(),
            recursive: Vec::new(),
        };
        graph.strongly_connected();
        graph
    }

    /// Iterative Tarjan; an explicit work stack keeps deep chains off the call stack.
    fn strongly_connected(&mut self) {
        let n = self.nodes.len();
        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut component = vec![UNVISITED; n];
        let mut sizes: Vec<usize> = Vec::new();
        let mut next = 0;

        for root in 0..n {
            if index[root] != UNVISITED {
                continue;
            }
            index[root] = next;
            lowlink[root] = next;
            next += 1;
            stack.push(root);
            on_stack[root] = true;
            let mut work: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = work.last_mut() {
                let v = frame.0;
                if frame.1 < self.edges[v].len() {
                    let w = self.edges[v][frame.1];
                    frame.1 += 1;
                    if index[w] == UNVISITED {
                        index[w] = next;
                        lowlink[w] = next;
                        next += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        work.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                    continue;
                }

                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    let id = sizes.len();
                    let mut size = 0;
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component[w] = id;
                        size += 1;
                        if w == v {
                            break;
                        }
                    }
                    sizes.push(size);
                }
            }
        }

        self.recursive = (0..n)
            .map(|v| sizes[component[v]] > 1 || self.edges[v].contains(&v))
            .collect();
        self.component = component;
    }

    pub fn is_recursive(&self, identifier: &str) -> bool {
        self.index
            .get(identifier)
            .is_some_and(|&i| self.recursive[i])
    }

    /// Cycle group of a recursive schema; `None` for acyclic schemas.
    pub fn cycle_of(&self, identifier: &str) -> Option<usize> {
        let &i = self.index.get(identifier)?;
        self.recursive[i].then(|| self.component[i])
    }

    /// Every recursive schema mapped to its cycle group.
    pub fn recursive(&self) -> BTreeMap<String, usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.recursive[*i])
            .map(|(i, name)| (name.clone(), self.component[i]))
            .collect()
    }

    /// Identifiers referenced by `identifier`, in declaration order of the references.
    pub fn dependencies(&self, identifier: &str) -> Vec<&str> {
        self.index
            .get(identifier)
            .map(|&i| self.edges[i].iter().map(|&j| self.nodes[j].as_str()).collect())
            .unwrap_or_default()
    }
}

/// First chain of schemas that are nothing but a `$ref` and lead back to
/// themselves, such as `A: $ref B` with `B: $ref A`. Such a schema has no
/// shape to generate or validate.
pub(crate) fn alias_cycle(schemas: &IndexMap<String, SchemaOrRef>) -> Option<Vec<String>> {
    let alias_target = |key: &str| match schemas.get(key) {
        Some(SchemaOrRef::Ref { ref_path }) => parse_ref_name(ref_path, "schemas").ok(),
        _ => None,
    };

    let mut cleared: HashSet<&str> = HashSet::new();
    for start in schemas.keys() {
        let mut chain: Vec<&str> = Vec::new();
        let mut current = Some(start.as_str());
        while let Some(key) = current {
            if cleared.contains(key) {
                break;
            }
            if let Some(pos) = chain.iter().position(|k| *k == key) {
                let mut cycle: Vec<String> = chain[pos..].iter().map(|k| k.to_string()).collect();
                cycle.push(key.to_string());
                return Some(cycle);
            }
            chain.push(key);
            current = alias_target(key).and_then(|next| schemas.get_key_value(next).map(|(k, _)| k.as_str()));
        }
        cleared.extend(chain);
    }
    None
}

/// Call `f` with the schema key of every reference reachable from `schema`
/// without crossing into other named schemas.
pub(crate) fn collect_refs(schema: &SchemaOrRef, f: &mut dyn FnMut(&str)) {
    match schema {
        SchemaOrRef::Ref { ref_path } => {
            if let Ok(name) = parse_ref_name(ref_path, "schemas") {
                f(name);
            }
        }
        SchemaOrRef::Schema(s) => {
            for prop in s.properties.values() {
                collect_refs(prop, f);
            }
            if let Some(AdditionalProperties::Schema(inner)) = &s.additional_properties {
                collect_refs(inner, f);
            }
            if let Some(items) = &s.items {
                collect_refs(items, f);
            }
            for sub in s.all_of.iter().chain(&s.one_of).chain(&s.any_of) {
                collect_refs(sub, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_for(yaml: &str) -> SchemaGraph {
        let schemas: IndexMap<String, SchemaOrRef> = serde_yaml_ng::from_str(yaml).unwrap();
        let identifiers = schemas.keys().map(|k| (k.clone(), k.clone())).collect();
        let registry = NameRegistry::new(identifiers, IndexMap::new());
        SchemaGraph::build(&schemas, &registry)
    }

    #[test]
    fn flags_self_reference() {
        let graph = graph_for(
            r##"
Node:
  type: object
  properties:
    children: { type: array, items: { $ref: "#/components/schemas/Node" } }
Leaf: { type: string }
"##,
        );
        assert!(graph.is_recursive("Node"));
        assert!(!graph.is_recursive("Leaf"));
    }

    #[test]
    fn groups_mutual_recursion() {
        let graph = graph_for(
            r##"
A: { type: object, properties: { b: { $ref: "#/components/schemas/B" } } }
B: { type: object, properties: { a: { $ref: "#/components/schemas/A" } } }
C: { type: object, properties: { a: { $ref: "#/components/schemas/A" } } }
"##,
        );
        assert!(graph.is_recursive("A"));
        assert!(graph.is_recursive("B"));
        assert!(!graph.is_recursive("C"));
        assert_eq!(graph.cycle_of("A"), graph.cycle_of("B"));
        assert_eq!(graph.cycle_of("C"), None);
        assert_eq!(graph.dependencies("C"), vec!["A"]);
        assert_eq!(graph.recursive().len(), 2);
    }

    #[test]
    fn finds_pure_alias_cycles() {
        let schemas: IndexMap<String, SchemaOrRef> = serde_yaml_ng::from_str(
            r##"
Name: { type: string }
Alias: { $ref: "#/components/schemas/Name" }
A: { $ref: "#/components/schemas/B" }
B: { $ref: "#/components/schemas/A" }
"##,
        )
        .unwrap();
        assert_eq!(alias_cycle(&schemas), Some(vec!["A".into(), "B".into(), "A".into()]));

        let acyclic: IndexMap<String, SchemaOrRef> = serde_yaml_ng::from_str(
            r##"
Name: { type: string }
Alias: { $ref: "#/components/schemas/Name" }
Node: { type: object, properties: { next: { $ref: "#/components/schemas/Node" } } }
"##,
        )
        .unwrap();
        assert_eq!(alias_cycle(&acyclic), None);
    }

    #[test]
    fn long_chains_do_not_overflow() {
        let mut yaml = String::new();
        for i in 0..5000 {
            yaml.push_str(&format!(
                "S{i}: {{ type: object, properties: {{ next: {{ $ref: \"#/components/schemas/S{}\" }} }} }}\n",
                i + 1
            ));
        }
        yaml.push_str("S5000: { type: object, properties: { first: { $ref: \"#/components/schemas/S0\" } } }\n");
        let graph = graph_for(&yaml);
        assert!(graph.is_recursive("S0"));
        assert_eq!(graph.cycle_of("S0"), graph.cycle_of("S4999"));
    }
}
