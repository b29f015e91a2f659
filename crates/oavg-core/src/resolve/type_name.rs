use std::collections::{BTreeSet, HashSet};

use crate::error::ResolveError;
use crate::ir::IrType;
use crate::parse::ref_resolve::parse_ref_name;
use crate::parse::schema::SchemaOrRef;
use crate::transform::name_normalizer::{normalize_name, sanitize_type_name};
use crate::transform::schema_resolver::SchemaResolver;
use crate::union::Flavor;

use super::registry::NameRegistry;
use super::reserved::RESERVED_NAMES;
use super::strict_name;

/// A schema as seen from one operation: either a shared named schema or an
/// inline schema that only this operation file declares.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaReference {
    Named {
        /// Schema key in the resolved document.
        logical: String,
        identifier: String,
    },
    Inline {
        identifier: String,
        schema: IrType,
    },
}

impl SchemaReference {
    /// Identifier of the loose variant.
    pub fn base_identifier(&self) -> &str {
        match self {
            SchemaReference::Named { identifier, .. } | SchemaReference::Inline { identifier, .. } => {
                identifier
            }
        }
    }

    pub fn identifier(&self, flavor: Flavor) -> String {
        match flavor {
            Flavor::Loose => self.base_identifier().to_string(),
            Flavor::Strict => strict_name(self.base_identifier()),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, SchemaReference::Inline { .. })
    }
}

/// Names an operation file exports for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationNames {
    pub camel: String,
    pub pascal: String,
}

impl OperationNames {
    pub fn new(operation_id: &str) -> Self {
        let normalized = normalize_name(operation_id);
        let pascal = sanitize_type_name(&normalized.pascal_case);
        let camel = if normalized.camel_case.starts_with(|c: char| c.is_ascii_digit()) {
            format!("_{}", normalized.camel_case)
        } else {
            normalized.camel_case
        };
        Self { camel, pascal }
    }

    pub fn path_params(&self) -> String {
        format!("{}PathParams", self.pascal)
    }

    pub fn query_params(&self) -> String {
        format!("{}QueryParams", self.pascal)
    }

    pub fn header_params(&self) -> String {
        format!("{}HeaderParams", self.pascal)
    }

    pub fn request_bodies(&self) -> String {
        format!("{}RequestBodies", self.camel)
    }

    pub fn request_body_map(&self) -> String {
        format!("{}RequestBodyMap", self.pascal)
    }

    pub fn responses(&self) -> String {
        format!("{}Responses", self.camel)
    }

    pub fn responses_strict(&self) -> String {
        format!("{}ResponsesStrict", self.camel)
    }

    pub fn statuses(&self) -> String {
        format!("{}Statuses", self.camel)
    }

    pub fn parsing(&self) -> String {
        format!("{}Parsing", self.camel)
    }

    pub fn response_map(&self) -> String {
        format!("{}ResponseMap", self.pascal)
    }

    pub fn response_map_strict(&self) -> String {
        format!("{}ResponseMapStrict", self.pascal)
    }

    pub fn response_type(&self) -> String {
        format!("{}Response", self.pascal)
    }

    pub fn response_type_strict(&self) -> String {
        format!("{}ResponseStrict", self.pascal)
    }

    pub fn exports(&self) -> Vec<String> {
        vec![
            self.camel.clone(),
            self.path_params(),
            self.query_params(),
            self.header_params(),
            self.request_bodies(),
            self.request_body_map(),
            self.responses(),
            self.responses_strict(),
            self.statuses(),
            self.parsing(),
            self.response_map(),
            self.response_map_strict(),
            self.response_type(),
            self.response_type_strict(),
        ]
    }
}

/// Per-operation naming state: the import set and every identifier visible
/// in the operation file.
#[derive(Debug)]
pub struct OperationContext<'a> {
    registry: &'a NameRegistry,
    operation_id: String,
    names: OperationNames,
    imports: BTreeSet<String>,
    taken: HashSet<String>,
}

impl<'a> OperationContext<'a> {
    pub fn new(registry: &'a NameRegistry, operation_id: &str) -> Self {
        let names = OperationNames::new(operation_id);
        let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(|s| s.to_string()).collect();
        for (_, identifier) in registry.iter() {
            taken.insert(identifier.to_string());
            taken.insert(strict_name(identifier));
        }
        taken.extend(names.exports());

        Self {
            registry,
            operation_id: operation_id.to_string(),
            names,
            imports: BTreeSet::new(),
            taken,
        }
    }

    pub fn registry(&self) -> &'a NameRegistry {
        self.registry
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn names(&self) -> &OperationNames {
        &self.names
    }

    /// Record a named schema used by this operation. Repeats are no-ops.
    pub fn import(&mut self, identifier: &str) {
        if !self.imports.contains(identifier) {
            self.imports.insert(identifier.to_string());
        }
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    pub fn into_imports(self) -> BTreeSet<String> {
        self.imports
    }

    /// Claim `<OperationIdPascal><suffix>` (and its strict twin), adding a
    /// numeric suffix when something visible already uses it.
    pub fn allocate(&mut self, suffix: &str) -> String {
        let base = format!("{}{}", self.names.pascal, suffix);
        let mut candidate = base.clone();
        let mut attempt = 2usize;
        while self.taken.contains(&candidate) || self.taken.contains(&strict_name(&candidate)) {
            candidate = format!("{base}{attempt}");
            attempt += 1;
        }
        self.taken.insert(strict_name(&candidate));
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Resolve the identifier used for `schema` inside an operation file.
///
/// Named references map through the registry and land in the import set.
/// Inline schemas get a synthesized `<OperationId><Suffix>` name; the named
/// schemas they mention are imported too.
pub fn resolve_type_name(
    schema: &SchemaOrRef,
    ctx: &mut OperationContext<'_>,
    suffix: &str,
) -> Result<SchemaReference, ResolveError> {
    match schema {
        SchemaOrRef::Ref { ref_path } => {
            let logical = parse_ref_name(ref_path, "schemas")?;
            let identifier = ctx
                .registry()
                .identifier(logical)
                .ok_or_else(|| ResolveError::UnresolvedRef(ref_path.clone()))?
                .to_string();
            ctx.import(&identifier);
            Ok(SchemaReference::Named {
                logical: logical.to_string(),
                identifier,
            })
        }
        SchemaOrRef::Schema(_) => {
            let ir = SchemaResolver::new(ctx.registry()).schema_or_ref_to_ir_type(schema)?;
            for name in ir.refs() {
                ctx.import(name);
            }
            let identifier = ctx.allocate(suffix);
            Ok(SchemaReference::Inline {
                identifier,
                schema: ir,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    fn registry() -> NameRegistry {
        let mut identifiers = IndexMap::new();
        identifiers.insert("Pet".to_string(), "Pet".to_string());
        identifiers.insert("pet-list".to_string(), "PetList".to_string());
        identifiers.insert("Error".to_string(), "ErrorSchema".to_string());
        NameRegistry::new(identifiers, IndexMap::new())
    }

    fn reference(name: &str) -> SchemaOrRef {
        SchemaOrRef::Ref {
            ref_path: format!("#/components/schemas/{name}"),
        }
    }

    #[test]
    fn named_refs_are_imported_once() {
        let registry = registry();
        let mut ctx = OperationContext::new(&registry, "listPets");
        for _ in 0..3 {
            let resolved = resolve_type_name(&reference("pet-list"), &mut ctx, "Response200").unwrap();
            assert_eq!(resolved.base_identifier(), "PetList");
        }
        assert_eq!(ctx.imports().iter().collect::<Vec<_>>(), vec!["PetList"]);
    }

    #[test]
    fn strict_flavor_appends_suffix() {
        let registry = registry();
        let mut ctx = OperationContext::new(&registry, "getPet");
        let resolved = resolve_type_name(&reference("Pet"), &mut ctx, "Response200").unwrap();
        assert_eq!(resolved.identifier(Flavor::Loose), "Pet");
        assert_eq!(resolved.identifier(Flavor::Strict), "PetStrict");
    }

    #[test]
    fn inline_names_are_deduplicated() {
        let registry = registry();
        let mut ctx = OperationContext::new(&registry, "get-pet");
        let inline: SchemaOrRef = serde_yaml_ng::from_str(
            "{ type: object, properties: { pet: { $ref: '#/components/schemas/Pet' } } }",
        )
        .unwrap();
        let first = resolve_type_name(&inline, &mut ctx, "Body").unwrap();
        let second = resolve_type_name(&inline, &mut ctx, "Body").unwrap();
        assert_eq!(first.base_identifier(), "GetPetBody");
        assert_eq!(second.base_identifier(), "GetPetBody2");
        assert!(first.is_inline());
        assert!(ctx.imports().contains("Pet"));
    }

    #[test]
    fn inline_names_avoid_operation_exports() {
        let registry = registry();
        let mut ctx = OperationContext::new(&registry, "getPet");
        assert_eq!(ctx.allocate("ResponseMap"), "GetPetResponseMap2");
    }

    #[test]
    fn unknown_refs_fail() {
        let registry = registry();
        let mut ctx = OperationContext::new(&registry, "getPet");
        let err = resolve_type_name(&reference("Ghost"), &mut ctx, "Response200").unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedRef(_)));
    }
}
