use indexmap::IndexMap;
use log::warn;

use crate::error::ResolveError;
use crate::ir::{
    IrAliasSchema, IrDiscriminator, IrEnumSchema, IrField, IrObjectSchema, IrSchema, IrType,
    IrUnionSchema, NormalizedName,
};
use crate::parse::ref_resolve::parse_ref_name;
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};
use crate::resolve::NameRegistry;

use super::name_normalizer::normalize_name;

/// Converts parsed schemas into IR types, mapping every reference through
/// the name registry.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    registry: &'a NameRegistry,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(registry: &'a NameRegistry) -> Self {
        Self { registry }
    }

    fn reference(&self, ref_path: &str) -> Result<IrType, ResolveError> {
        let logical = parse_ref_name(ref_path, "schemas")?;
        self.registry
            .identifier(logical)
            .map(|id| IrType::Ref(id.to_string()))
            .ok_or_else(|| ResolveError::UnresolvedRef(ref_path.to_string()))
    }

    /// Convert a parsed `SchemaOrRef` to an `IrType`.
    pub fn schema_or_ref_to_ir_type(&self, schema_or_ref: &SchemaOrRef) -> Result<IrType, ResolveError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => self.reference(ref_path),
            SchemaOrRef::Schema(schema) => self.schema_to_ir_type(schema),
        }
    }

    fn all(&self, schemas: &[SchemaOrRef]) -> Result<Vec<IrType>, ResolveError> {
        schemas
            .iter()
            .map(|s| self.schema_or_ref_to_ir_type(s))
            .collect()
    }

    /// Convert a parsed `Schema` to an `IrType`, honouring OpenAPI 3.0 `nullable`.
    pub fn schema_to_ir_type(&self, schema: &Schema) -> Result<IrType, ResolveError> {
        let base = self.base_type(schema)?;
        if schema.nullable == Some(true) && !base.is_nullable() {
            return Ok(IrType::Union(vec![base, IrType::Null]));
        }
        Ok(base)
    }

    fn base_type(&self, schema: &Schema) -> Result<IrType, ResolveError> {
        if !schema.one_of.is_empty() {
            return Ok(IrType::Union(self.all(&schema.one_of)?));
        }
        if !schema.any_of.is_empty() {
            return Ok(IrType::Union(self.all(&schema.any_of)?));
        }
        if !schema.all_of.is_empty() {
            if schema.all_of.len() == 1 && schema.properties.is_empty() {
                return self.schema_or_ref_to_ir_type(&schema.all_of[0]);
            }
            return Ok(IrType::Intersection(self.intersection_parts(schema)?));
        }

        if !schema.enum_values.is_empty() {
            let mut literals: Vec<IrType> = schema
                .enum_values
                .iter()
                .filter_map(|v| v.as_str().map(|s| IrType::StringLiteral(s.to_string())))
                .collect();
            return Ok(match literals.len() {
                0 => self.primitive(schema)?,
                1 => literals.remove(0),
                _ => IrType::Union(literals),
            });
        }

        if let Some(ref val) = schema.const_value {
            return Ok(match val.as_str() {
                Some(s) => IrType::StringLiteral(s.to_string()),
                None => self.primitive(schema)?,
            });
        }

        self.primitive(schema)
    }

    fn primitive(&self, schema: &Schema) -> Result<IrType, ResolveError> {
        match &schema.schema_type {
            Some(TypeSet::Single(t)) => self.single_type(t, schema),
            Some(TypeSet::Multiple(types)) => {
                let has_null = types.contains(&SchemaType::Null);
                let mut variants = types
                    .iter()
                    .filter(|t| **t != SchemaType::Null)
                    .map(|t| self.single_type(t, schema))
                    .collect::<Result<Vec<_>, _>>()?;
                match (variants.len(), has_null) {
                    (0, true) => Ok(IrType::Null),
                    (0, false) => Ok(IrType::Any),
                    (1, false) => Ok(variants.remove(0)),
                    _ => {
                        if has_null {
                            variants.push(IrType::Null);
                        }
                        Ok(IrType::Union(variants))
                    }
                }
            }
            None if !schema.properties.is_empty() || schema.additional_properties.is_some() => {
                self.object_type(schema)
            }
            None => match &schema.items {
                Some(items) => Ok(IrType::Array(Box::new(self.schema_or_ref_to_ir_type(items)?))),
                None => Ok(IrType::Any),
            },
        }
    }

    fn single_type(&self, t: &SchemaType, schema: &Schema) -> Result<IrType, ResolveError> {
        Ok(match t {
            SchemaType::String => match schema.format.as_deref() {
                Some("date-time" | "date") => IrType::DateTime,
                Some("binary") => IrType::Binary,
                _ => IrType::String,
            },
            SchemaType::Number => IrType::Number,
            SchemaType::Integer => IrType::Integer,
            SchemaType::Boolean => IrType::Boolean,
            SchemaType::Null => IrType::Null,
            SchemaType::Array => match &schema.items {
                Some(items) => IrType::Array(Box::new(self.schema_or_ref_to_ir_type(items)?)),
                None => IrType::Array(Box::new(IrType::Any)),
            },
            SchemaType::Object => self.object_type(schema)?,
        })
    }

    fn object_type(&self, schema: &Schema) -> Result<IrType, ResolveError> {
        if schema.properties.is_empty() {
            return Ok(match &schema.additional_properties {
                Some(AdditionalProperties::Schema(s)) => {
                    IrType::Map(Box::new(self.schema_or_ref_to_ir_type(s)?))
                }
                Some(AdditionalProperties::Bool(true)) | None => IrType::Map(Box::new(IrType::Any)),
                Some(AdditionalProperties::Bool(false)) => IrType::Object(Vec::new()),
            });
        }
        Ok(IrType::Object(self.inline_fields(&schema.properties, &schema.required)?))
    }

    fn inline_fields(
        &self,
        properties: &IndexMap<String, SchemaOrRef>,
        required: &[String],
    ) -> Result<Vec<(String, IrType, bool)>, ResolveError> {
        properties
            .iter()
            .map(|(name, prop)| {
                Ok((
                    name.clone(),
                    self.schema_or_ref_to_ir_type(prop)?,
                    required.contains(name),
                ))
            })
            .collect()
    }

    /// `allOf` parts: references stay references, inline parts become objects,
    /// and sibling properties on the parent form one more part.
    fn intersection_parts(&self, schema: &Schema) -> Result<Vec<IrType>, ResolveError> {
        let mut parts = schema
            .all_of
            .iter()
            .map(|sub| match sub {
                SchemaOrRef::Ref { ref_path } => self.reference(ref_path),
                SchemaOrRef::Schema(s) if !s.properties.is_empty() => {
                    Ok(IrType::Object(self.inline_fields(&s.properties, &s.required)?))
                }
                SchemaOrRef::Schema(s) => self.schema_to_ir_type(s),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if !schema.properties.is_empty() {
            parts.push(IrType::Object(
                self.inline_fields(&schema.properties, &schema.required)?,
            ));
        }
        Ok(parts)
    }

    /// Convert a named component schema to an `IrSchema`.
    pub fn schema_or_ref_to_ir_schema(
        &self,
        key: &str,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<IrSchema, ResolveError> {
        let name = self.schema_name(key);
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => Ok(IrSchema::Alias(IrAliasSchema {
                name,
                description: None,
                target: self.reference(ref_path)?,
            })),
            SchemaOrRef::Schema(schema) => self.schema_to_ir_schema(name, schema),
        }
    }

    /// The schema's name variants, with `pascal_case` pinned to its registry identifier.
    fn schema_name(&self, key: &str) -> NormalizedName {
        let mut name = normalize_name(key);
        if let Some(id) = self.registry.identifier(key) {
            name.pascal_case = id.to_string();
        }
        name
    }

    fn schema_to_ir_schema(
        &self,
        name: NormalizedName,
        schema: &Schema,
    ) -> Result<IrSchema, ResolveError> {
        let description = schema.description.clone();

        if !schema.enum_values.is_empty() {
            let variants: Vec<String> = schema
                .enum_values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            if variants.len() == schema.enum_values.len() {
                return Ok(IrSchema::Enum(IrEnumSchema {
                    name,
                    description,
                    variants,
                }));
            }
            warn!(
                "schema `{}` has non-string enum values; emitting its base type instead",
                name.original
            );
            return Ok(IrSchema::Alias(IrAliasSchema {
                name,
                description,
                target: self.primitive(schema)?,
            }));
        }

        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            let variants_src = if !schema.one_of.is_empty() {
                &schema.one_of
            } else {
                &schema.any_of
            };
            let discriminator = schema.discriminator.as_ref().map(|d| IrDiscriminator {
                property_name: d.property_name.clone(),
                mapping: d
                    .mapping
                    .iter()
                    .map(|(value, target)| {
                        let key = target.rsplit('/').next().unwrap_or(target);
                        let id = self.registry.identifier(key).unwrap_or(key);
                        (value.clone(), id.to_string())
                    })
                    .collect(),
            });
            return Ok(IrSchema::Union(IrUnionSchema {
                name,
                description,
                variants: self.all(variants_src)?,
                discriminator,
            }));
        }

        if !schema.all_of.is_empty() {
            let has_refs = schema
                .all_of
                .iter()
                .any(|s| matches!(s, SchemaOrRef::Ref { .. }));
            if has_refs {
                return Ok(IrSchema::Alias(IrAliasSchema {
                    name,
                    description,
                    target: IrType::Intersection(self.intersection_parts(schema)?),
                }));
            }
            return Ok(IrSchema::Object(IrObjectSchema {
                name,
                description,
                fields: self.merge_all_of(&schema.all_of, &schema.properties, &schema.required)?,
                additional_properties: None,
            }));
        }

        match &schema.schema_type {
            Some(TypeSet::Single(SchemaType::Object)) | None if !schema.properties.is_empty() => {
                let additional_properties = match &schema.additional_properties {
                    Some(AdditionalProperties::Schema(s)) => Some(self.schema_or_ref_to_ir_type(s)?),
                    Some(AdditionalProperties::Bool(true)) => Some(IrType::Any),
                    _ => None,
                };
                Ok(IrSchema::Object(IrObjectSchema {
                    name,
                    description,
                    fields: self.build_fields(&schema.properties, &schema.required)?,
                    additional_properties,
                }))
            }
            _ => Ok(IrSchema::Alias(IrAliasSchema {
                name,
                description,
                target: self.schema_to_ir_type(schema)?,
            })),
        }
    }

    fn build_fields(
        &self,
        properties: &IndexMap<String, SchemaOrRef>,
        required: &[String],
    ) -> Result<Vec<IrField>, ResolveError> {
        properties
            .iter()
            .map(|(name, prop)| {
                let (description, read_only, write_only) = match prop {
                    SchemaOrRef::Schema(s) => (
                        s.description.clone(),
                        s.read_only.unwrap_or(false),
                        s.write_only.unwrap_or(false),
                    ),
                    SchemaOrRef::Ref { .. } => (None, false, false),
                };
                Ok(IrField {
                    name: normalize_name(name),
                    original_name: name.clone(),
                    field_type: self.schema_or_ref_to_ir_type(prop)?,
                    required: required.contains(name),
                    description,
                    read_only,
                    write_only,
                })
            })
            .collect()
    }

    fn merge_all_of(
        &self,
        all_of: &[SchemaOrRef],
        extra_properties: &IndexMap<String, SchemaOrRef>,
        extra_required: &[String],
    ) -> Result<Vec<IrField>, ResolveError> {
        let mut fields = Vec::new();
        for item in all_of {
            if let SchemaOrRef::Schema(schema) = item {
                fields.extend(self.build_fields(&schema.properties, &schema.required)?);
                if !schema.all_of.is_empty() {
                    fields.extend(self.merge_all_of(&schema.all_of, &IndexMap::new(), &[])?);
                }
            }
        }
        fields.extend(self.build_fields(extra_properties, extra_required)?);
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NameRegistry {
        let mut ids = IndexMap::new();
        ids.insert("Pet".to_string(), "Pet".to_string());
        ids.insert("ErrorSchema".to_string(), "ErrorSchema".to_string());
        NameRegistry::new(ids, IndexMap::new())
    }

    fn ir_type(yaml: &str) -> IrType {
        let registry = registry();
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        SchemaResolver::new(&registry)
            .schema_or_ref_to_ir_type(&schema)
            .unwrap()
    }

    #[test]
    fn nullable_wraps_in_union() {
        assert_eq!(
            ir_type("{ type: string, nullable: true }"),
            IrType::Union(vec![IrType::String, IrType::Null])
        );
        assert_eq!(
            ir_type("{ type: [integer, 'null'] }"),
            IrType::Union(vec![IrType::Integer, IrType::Null])
        );
    }

    #[test]
    fn refs_map_to_identifiers() {
        assert_eq!(
            ir_type("{ type: array, items: { $ref: '#/components/schemas/Pet' } }"),
            IrType::Array(Box::new(IrType::Ref("Pet".into())))
        );
    }

    #[test]
    fn unknown_ref_is_an_error() {
        let registry = registry();
        let schema: SchemaOrRef =
            serde_yaml_ng::from_str("{ $ref: '#/components/schemas/Nope' }").unwrap();
        assert!(
            SchemaResolver::new(&registry)
                .schema_or_ref_to_ir_type(&schema)
                .is_err()
        );
    }

    #[test]
    fn all_of_with_refs_is_an_intersection() {
        let registry = registry();
        let schema: SchemaOrRef = serde_yaml_ng::from_str(
            r#"
allOf:
  - $ref: '#/components/schemas/Pet'
  - { type: object, required: [tag], properties: { tag: { type: string } } }
"#,
        )
        .unwrap();
        let ir = SchemaResolver::new(&registry)
            .schema_or_ref_to_ir_schema("Tagged", &schema)
            .unwrap();
        let IrSchema::Alias(alias) = ir else {
            panic!("expected alias");
        };
        assert_eq!(
            alias.target,
            IrType::Intersection(vec![
                IrType::Ref("Pet".into()),
                IrType::Object(vec![("tag".into(), IrType::String, true)]),
            ])
        );
    }

    #[test]
    fn integer_enum_becomes_alias() {
        let registry = registry();
        let schema: SchemaOrRef = serde_yaml_ng::from_str("{ type: integer, enum: [1, 2] }").unwrap();
        let ir = SchemaResolver::new(&registry)
            .schema_or_ref_to_ir_schema("Level", &schema)
            .unwrap();
        assert!(matches!(ir, IrSchema::Alias(a) if a.target == IrType::Integer));
    }
}
