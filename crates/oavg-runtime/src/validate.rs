use std::cell::RefCell;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use oavg_core::ir::{IrObjectSchema, IrSchema, IrSpec, IrType};
use oavg_core::union::Flavor;

use crate::error::ValidationError;

const ROOT: &str = "$";

/// Named schemas by identifier, with a structural validator for both flavors.
///
/// Loose validation tolerates unknown object fields; strict validation
/// rejects them unless the schema declares `additionalProperties`.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: IndexMap<String, IrSchema>,
}

impl SchemaSet {
    pub fn new(schemas: impl IntoIterator<Item = IrSchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|s| (s.name().pascal_case.clone(), s))
                .collect(),
        }
    }

    pub fn from_ir(ir: &IrSpec) -> Self {
        Self::new(ir.schemas.iter().cloned())
    }

    pub fn get(&self, identifier: &str) -> Option<&IrSchema> {
        self.schemas.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn validate(&self, ty: &IrType, value: &Value, flavor: Flavor) -> Result<(), ValidationError> {
        let active = RefCell::default();
        Validator {
            schemas: self,
            flavor,
            active: &active,
        }
        .check_type(ty, value, ROOT)
    }

    pub fn validate_named(
        &self,
        identifier: &str,
        value: &Value,
        flavor: Flavor,
    ) -> Result<(), ValidationError> {
        let active = RefCell::default();
        Validator {
            schemas: self,
            flavor,
            active: &active,
        }
        .check_named(identifier, value, ROOT)
    }
}

/// A named schema being checked against one value node in one flavor.
type Visit = (String, *const Value, bool);

struct Validator<'a> {
    schemas: &'a SchemaSet,
    flavor: Flavor,
    /// Named checks in progress. Meeting one again means a reference cycle
    /// that consumes no input, which can never match.
    active: &'a RefCell<Vec<Visit>>,
}

impl Validator<'_> {
    fn check_type(&self, ty: &IrType, value: &Value, path: &str) -> Result<(), ValidationError> {
        match ty {
            IrType::String | IrType::DateTime => expect(value.is_string(), path, "expected string"),
            IrType::StringLiteral(literal) => expect(
                value.as_str() == Some(literal.as_str()),
                path,
                format!("expected \"{literal}\""),
            ),
            IrType::Number => expect(value.is_number(), path, "expected number"),
            IrType::Integer => expect(is_integer(value), path, "expected integer"),
            IrType::Boolean => expect(value.is_boolean(), path, "expected boolean"),
            IrType::Null => expect(value.is_null(), path, "expected null"),
            IrType::Void => expect(value.is_null(), path, "expected no content"),
            IrType::Any | IrType::Binary => Ok(()),
            IrType::Array(inner) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| ValidationError::new(path, "expected array"))?;
                for (i, item) in items.iter().enumerate() {
                    self.check_type(inner, item, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            IrType::Object(fields) => {
                let map = as_object(value, path)?;
                for (name, field_type, required) in fields {
                    self.check_field(map, name, field_type, *required, path)?;
                }
                if self.flavor.is_strict() {
                    if let Some(unknown) = map.keys().find(|k| !fields.iter().any(|(n, ..)| n == *k)) {
                        return Err(ValidationError::new(
                            &child(path, unknown),
                            "unknown field",
                        ));
                    }
                }
                Ok(())
            }
            IrType::Map(inner) => {
                for (key, item) in as_object(value, path)? {
                    self.check_type(inner, item, &child(path, key))?;
                }
                Ok(())
            }
            IrType::Ref(identifier) => self.check_named(identifier, value, path),
            IrType::Union(variants) => self.check_any(variants, value, path),
            IrType::Intersection(parts) => {
                // Each part only knows its own fields, so parts never run strict.
                let loose = Validator {
                    schemas: self.schemas,
                    flavor: Flavor::Loose,
                    active: self.active,
                };
                parts
                    .iter()
                    .try_for_each(|part| loose.check_type(part, value, path))
            }
        }
    }

    fn check_named(&self, identifier: &str, value: &Value, path: &str) -> Result<(), ValidationError> {
        let schema = self
            .schemas
            .get(identifier)
            .ok_or_else(|| ValidationError::new(path, format!("unknown schema `{identifier}`")))?;

        let visit: Visit = (identifier.to_string(), value as *const Value, self.flavor.is_strict());
        if self.active.borrow().contains(&visit) {
            return Err(ValidationError::new(
                path,
                format!("schema `{identifier}` refers back to itself without consuming input"),
            ));
        }
        self.active.borrow_mut().push(visit);
        let result = self.check_schema(schema, value, path);
        self.active.borrow_mut().pop();
        result
    }

    fn check_schema(&self, schema: &IrSchema, value: &Value, path: &str) -> Result<(), ValidationError> {
        match schema {
            IrSchema::Object(object) => self.check_object(object, value, path),
            IrSchema::Enum(e) => match value.as_str() {
                Some(s) if e.variants.iter().any(|v| v == s) => Ok(()),
                _ => Err(ValidationError::new(
                    path,
                    format!("expected one of {}", e.variants.join(", ")),
                )),
            },
            IrSchema::Alias(alias) => self.check_type(&alias.target, value, path),
            IrSchema::Union(union) => self.check_any(&union.variants, value, path),
        }
    }

    fn check_object(
        &self,
        object: &IrObjectSchema,
        value: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        let map = as_object(value, path)?;
        for field in &object.fields {
            self.check_field(map, &field.original_name, &field.field_type, field.required, path)?;
        }
        for (key, item) in map {
            if object.fields.iter().any(|f| f.original_name == *key) {
                continue;
            }
            match &object.additional_properties {
                Some(extra) => self.check_type(extra, item, &child(path, key))?,
                None if self.flavor.is_strict() => {
                    return Err(ValidationError::new(&child(path, key), "unknown field"));
                }
                None => {}
            }
        }
        Ok(())
    }

    fn check_field(
        &self,
        map: &Map<String, Value>,
        name: &str,
        field_type: &IrType,
        required: bool,
        path: &str,
    ) -> Result<(), ValidationError> {
        match map.get(name) {
            Some(item) => self.check_type(field_type, item, &child(path, name)),
            None if required => Err(ValidationError::new(&child(path, name), "required")),
            None => Ok(()),
        }
    }

    fn check_any(&self, variants: &[IrType], value: &Value, path: &str) -> Result<(), ValidationError> {
        let mut first_error = None;
        for variant in variants {
            match self.check_type(variant, value, path) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        Err(match first_error {
            Some(err) => ValidationError::new(path, format!("no union variant matched ({err})")),
            None => ValidationError::new(path, "empty union"),
        })
    }
}

fn expect(ok: bool, path: &str, message: impl Into<String>) -> Result<(), ValidationError> {
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(path, message))
    }
}

fn as_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(path, "expected object"))
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn child(path: &str, key: &str) -> String {
    format!("{path}.{key}")
}
