use std::collections::HashSet;

use indexmap::IndexMap;
use log::info;
use serde_json::Value;

use crate::error::ResolveError;
use crate::parse::media_type::MediaType;
use crate::parse::operation::Operation;
use crate::parse::parameter::{Parameter, ParameterOrRef};
use crate::parse::ref_resolve::parse_ref_name;
use crate::parse::request_body::{RequestBody, RequestBodyOrRef};
use crate::parse::response::{Response, ResponseOrRef};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef};
use crate::parse::spec::OpenApiSpec;
use crate::transform::name_normalizer::sanitize_type_name;

use super::reserved::is_reserved;
use super::{SCHEMA_REF_PREFIX, strict_name};

/// Identifier assignment for every component schema.
#[derive(Debug, Default)]
pub(crate) struct Allocation {
    /// Original schema key → final identifier, in declaration order.
    pub identifiers: IndexMap<String, String>,
    /// Original schema key → replacement key, only for keys that collided.
    pub renames: IndexMap<String, String>,
}

/// Assign identifiers in declaration order.
///
/// `taken` holds names already spoken for, such as the exports of operation
/// files. An identifier and its strict twin are both claimed, so a later
/// schema can take neither. Collisions become `<Name>Schema`, then
/// `<Name>Schema2`, ...
pub(crate) fn allocate_identifiers<'a, I>(names: I, taken: &HashSet<String>) -> Allocation
where
    I: IntoIterator<Item = &'a String>,
{
    let mut claimed: HashSet<String> = taken.clone();
    let mut allocation = Allocation::default();

    for name in names {
        let base = sanitize_type_name(name);
        let identifier = if is_free(&base, &claimed) {
            base.clone()
        } else {
            let mut attempt = 1usize;
            loop {
                let candidate = if attempt == 1 {
                    format!("{base}Schema")
                } else {
                    format!("{base}Schema{attempt}")
                };
                if is_free(&candidate, &claimed) {
                    break candidate;
                }
                attempt += 1;
            }
        };

        if identifier != base {
            info!("renamed schema `{name}` to `{identifier}` to avoid a name collision");
            allocation.renames.insert(name.clone(), identifier.clone());
        }
        claimed.insert(strict_name(&identifier));
        claimed.insert(identifier.clone());
        allocation.identifiers.insert(name.clone(), identifier);
    }

    allocation
}

fn is_free(candidate: &str, claimed: &HashSet<String>) -> bool {
    let twin = strict_name(candidate);
    !is_reserved(candidate)
        && !is_reserved(&twin)
        && !claimed.contains(candidate)
        && !claimed.contains(&twin)
}

/// Rename collided component keys, then rewrite every schema reference in the
/// document so it points at the final key.
///
/// Every schema reference is also checked: it must use the
/// `#/components/schemas/<Name>` form and name a schema that exists.
pub(crate) fn apply_renames(
    spec: &mut OpenApiSpec,
    renames: &IndexMap<String, String>,
) -> Result<(), ResolveError> {
    let original: HashSet<String> = spec
        .components
        .as_ref()
        .map(|c| c.schemas.keys().cloned().collect())
        .unwrap_or_default();

    if let Some(components) = spec.components.as_mut() {
        if !renames.is_empty() {
            let schemas = std::mem::take(&mut components.schemas);
            components.schemas = schemas
                .into_iter()
                .map(|(key, schema)| match renames.get(&key) {
                    Some(new_key) => (new_key.clone(), schema),
                    None => (key, schema),
                })
                .collect();
        }
    }

    let rewriter = RefRewriter {
        renames,
        known: &original,
    };
    rewriter.document(spec)
}

struct RefRewriter<'a> {
    renames: &'a IndexMap<String, String>,
    known: &'a HashSet<String>,
}

impl RefRewriter<'_> {
    fn document(&self, spec: &mut OpenApiSpec) -> Result<(), ResolveError> {
        if let Some(components) = spec.components.as_mut() {
            for schema in components.schemas.values_mut() {
                self.schema_or_ref(schema)?;
            }
            for response in components.responses.values_mut() {
                if let ResponseOrRef::Response(r) = response {
                    self.response(r)?;
                }
            }
            for param in components.parameters.values_mut() {
                if let ParameterOrRef::Parameter(p) = param {
                    self.parameter(p)?;
                }
            }
            for body in components.request_bodies.values_mut() {
                if let RequestBodyOrRef::RequestBody(rb) = body {
                    self.request_body(rb)?;
                }
            }
            for header in components.headers.values_mut() {
                self.value(header)?;
            }
        }

        for item in spec.paths.values_mut() {
            for param in &mut item.parameters {
                if let ParameterOrRef::Parameter(p) = param {
                    self.parameter(p)?;
                }
            }
            for (_method, op) in item.operations_mut() {
                self.operation(op)?;
            }
        }
        Ok(())
    }

    fn operation(&self, op: &mut Operation) -> Result<(), ResolveError> {
        for param in &mut op.parameters {
            if let ParameterOrRef::Parameter(p) = param {
                self.parameter(p)?;
            }
        }
        if let Some(RequestBodyOrRef::RequestBody(rb)) = op.request_body.as_mut() {
            self.request_body(rb)?;
        }
        for response in op.responses.values_mut() {
            if let ResponseOrRef::Response(r) = response {
                self.response(r)?;
            }
        }
        Ok(())
    }

    fn parameter(&self, param: &mut Parameter) -> Result<(), ResolveError> {
        match param.schema.as_mut() {
            Some(schema) => self.schema_or_ref(schema),
            None => Ok(()),
        }
    }

    fn request_body(&self, body: &mut RequestBody) -> Result<(), ResolveError> {
        for media in body.content.values_mut() {
            self.media_type(media)?;
        }
        Ok(())
    }

    fn response(&self, response: &mut Response) -> Result<(), ResolveError> {
        for media in response.content.values_mut() {
            self.media_type(media)?;
        }
        for header in response.headers.values_mut() {
            self.value(header)?;
        }
        Ok(())
    }

    fn media_type(&self, media: &mut MediaType) -> Result<(), ResolveError> {
        if let Some(schema) = media.schema.as_mut() {
            self.schema_or_ref(schema)?;
        }
        for encoding in media.encoding.values_mut() {
            for header in encoding.headers.values_mut() {
                self.value(header)?;
            }
        }
        Ok(())
    }

    fn schema_or_ref(&self, schema: &mut SchemaOrRef) -> Result<(), ResolveError> {
        match schema {
            SchemaOrRef::Ref { ref_path } => self.schema_ref(ref_path),
            SchemaOrRef::Schema(s) => self.schema(s),
        }
    }

    fn schema(&self, schema: &mut Schema) -> Result<(), ResolveError> {
        for prop in schema.properties.values_mut() {
            self.schema_or_ref(prop)?;
        }
        if let Some(AdditionalProperties::Schema(inner)) = schema.additional_properties.as_mut() {
            self.schema_or_ref(inner)?;
        }
        if let Some(items) = schema.items.as_mut() {
            self.schema_or_ref(items)?;
        }
        for sub in schema
            .all_of
            .iter_mut()
            .chain(schema.one_of.iter_mut())
            .chain(schema.any_of.iter_mut())
        {
            self.schema_or_ref(sub)?;
        }
        if let Some(discriminator) = schema.discriminator.as_mut() {
            for target in discriminator.mapping.values_mut() {
                if target.starts_with("#/") {
                    self.schema_ref(target)?;
                } else if let Some(new_name) = self.renames.get(target.as_str()) {
                    *target = new_name.clone();
                }
            }
        }
        Ok(())
    }

    /// Headers are untyped; only `$ref` strings that point at schemas are touched.
    fn value(&self, value: &mut Value) -> Result<(), ResolveError> {
        match value {
            Value::Object(map) => {
                for (key, inner) in map.iter_mut() {
                    match inner {
                        Value::String(target)
                            if key == "$ref" && target.starts_with(SCHEMA_REF_PREFIX) =>
                        {
                            self.schema_ref(target)?;
                        }
                        other => self.value(other)?,
                    }
                }
                Ok(())
            }
            Value::Array(items) => items.iter_mut().try_for_each(|v| self.value(v)),
            _ => Ok(()),
        }
    }

    fn schema_ref(&self, ref_path: &mut String) -> Result<(), ResolveError> {
        let name = parse_ref_name(ref_path, "schemas")?;
        if !self.known.contains(name) {
            return Err(ResolveError::UnresolvedRef(ref_path.clone()));
        }
        if let Some(new_name) = self.renames.get(name) {
            *ref_path = format!("{SCHEMA_REF_PREFIX}{new_name}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reserved_names_get_schema_suffix() {
        let keys = names(&["Error", "Pet", "Response"]);
        let allocation = allocate_identifiers(&keys, &HashSet::new());
        assert_eq!(allocation.identifiers["Error"], "ErrorSchema");
        assert_eq!(allocation.identifiers["Pet"], "Pet");
        assert_eq!(allocation.identifiers["Response"], "ResponseSchema");
        assert_eq!(allocation.renames.len(), 2);
    }

    #[test]
    fn repeated_collisions_count_upwards() {
        let keys = names(&["ErrorSchema", "Error", "error"]);
        let allocation = allocate_identifiers(&keys, &HashSet::new());
        assert_eq!(allocation.identifiers["ErrorSchema"], "ErrorSchema");
        assert_eq!(allocation.identifiers["Error"], "ErrorSchema2");
        assert_eq!(allocation.identifiers["error"], "ErrorSchema3");
    }

    #[test]
    fn strict_twins_are_claimed() {
        let keys = names(&["Pet", "PetStrict"]);
        let allocation = allocate_identifiers(&keys, &HashSet::new());
        assert_eq!(allocation.identifiers["Pet"], "Pet");
        assert_eq!(allocation.identifiers["PetStrict"], "PetStrictSchema");
    }

    #[test]
    fn operation_exports_are_claimed() {
        let keys = names(&["GetPetResponse", "GetPetPathParams", "Pet"]);
        let taken: HashSet<String> = ["GetPetResponse", "GetPetResponseStrict", "GetPetPathParams"]
            .into_iter()
            .map(String::from)
            .collect();
        let allocation = allocate_identifiers(&keys, &taken);
        assert_eq!(allocation.identifiers["GetPetResponse"], "GetPetResponseSchema");
        assert_eq!(allocation.identifiers["GetPetPathParams"], "GetPetPathParamsSchema");
        assert_eq!(allocation.identifiers["Pet"], "Pet");
    }

    #[test]
    fn sanitized_names_do_not_count_as_renames() {
        let keys = names(&["pet-store"]);
        let allocation = allocate_identifiers(&keys, &HashSet::new());
        assert_eq!(allocation.identifiers["pet-store"], "PetStore");
        assert!(allocation.renames.is_empty());
    }

    #[test]
    fn header_refs_are_rewritten() {
        let mut header = serde_json::json!({
            "schema": { "$ref": "#/components/schemas/Error" },
            "examples": [{ "$ref": "#/components/examples/E" }]
        });
        let mut renames = IndexMap::new();
        renames.insert("Error".to_string(), "ErrorSchema".to_string());
        let known: HashSet<String> = ["Error".to_string()].into_iter().collect();
        let rewriter = RefRewriter {
            renames: &renames,
            known: &known,
        };
        rewriter.value(&mut header).unwrap();
        assert_eq!(header["schema"]["$ref"], "#/components/schemas/ErrorSchema");
        assert_eq!(header["examples"][0]["$ref"], "#/components/examples/E");
    }

    #[test]
    fn unknown_schema_refs_are_fatal() {
        let renames = IndexMap::new();
        let known = HashSet::new();
        let rewriter = RefRewriter {
            renames: &renames,
            known: &known,
        };
        let mut path = "#/components/schemas/Ghost".to_string();
        assert!(matches!(
            rewriter.schema_ref(&mut path),
            Err(ResolveError::UnresolvedRef(_))
        ));
        let mut remote = "other.yaml#/Pet".to_string();
        assert!(matches!(
            rewriter.schema_ref(&mut remote),
            Err(ResolveError::InvalidRefFormat(_))
        ));
    }
}
