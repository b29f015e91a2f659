use std::collections::HashSet;

use indexmap::IndexMap;

use super::components::Components;
use super::operation::{Operation, PathItem};
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::response::{Response, ResponseOrRef};
use super::spec::OpenApiSpec;
use crate::error::ResolveError;

/// Inlines references to reusable parameters, request bodies and responses.
///
/// Schema references are left untouched: they are named types and keep their
/// identity through the rest of the pipeline.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    visiting: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
            visiting: HashSet::new(),
        }
    }

    /// Resolve the entire spec, returning a copy where every parameter,
    /// request body and response is inline.
    pub fn resolve_spec(&mut self, spec: &OpenApiSpec) -> Result<OpenApiSpec, ResolveError> {
        let mut resolved = spec.clone();

        for item in resolved.paths.values_mut() {
            self.resolve_path_item(item)?;
        }

        Ok(resolved)
    }

    fn resolve_path_item(&mut self, item: &mut PathItem) -> Result<(), ResolveError> {
        item.parameters = self.resolve_parameters(&item.parameters)?;
        for (_method, op) in item.operations_mut() {
            self.resolve_operation(op)?;
        }
        Ok(())
    }

    fn resolve_operation(&mut self, op: &mut Operation) -> Result<(), ResolveError> {
        op.parameters = self.resolve_parameters(&op.parameters)?;

        if let Some(ref body) = op.request_body {
            let resolved = self.resolve_request_body_or_ref(body)?;
            op.request_body = Some(RequestBodyOrRef::RequestBody(resolved));
        }

        let mut resolved_responses = IndexMap::new();
        for (status, resp) in &op.responses {
            let resolved = self.resolve_response_or_ref(resp)?;
            resolved_responses.insert(status.clone(), ResponseOrRef::Response(resolved));
        }
        op.responses = resolved_responses;

        Ok(())
    }

    fn resolve_parameters(
        &mut self,
        params: &[ParameterOrRef],
    ) -> Result<Vec<ParameterOrRef>, ResolveError> {
        params
            .iter()
            .map(|p| self.resolve_parameter_or_ref(p).map(ParameterOrRef::Parameter))
            .collect()
    }

    pub fn resolve_parameter_or_ref(
        &mut self,
        param: &ParameterOrRef,
    ) -> Result<Parameter, ResolveError> {
        match param {
            ParameterOrRef::Parameter(p) => Ok(p.clone()),
            ParameterOrRef::Ref { ref_path } => {
                self.enter(ref_path)?;
                let name = parse_ref_name(ref_path, "parameters")?;
                let target = self
                    .components
                    .and_then(|c| c.parameters.get(name))
                    .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                let resolved = self.resolve_parameter_or_ref(target);
                self.visiting.remove(ref_path);
                resolved
            }
        }
    }

    pub fn resolve_request_body_or_ref(
        &mut self,
        body: &RequestBodyOrRef,
    ) -> Result<RequestBody, ResolveError> {
        match body {
            RequestBodyOrRef::RequestBody(rb) => Ok(rb.clone()),
            RequestBodyOrRef::Ref { ref_path } => {
                self.enter(ref_path)?;
                let name = parse_ref_name(ref_path, "requestBodies")?;
                let target = self
                    .components
                    .and_then(|c| c.request_bodies.get(name))
                    .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                let resolved = self.resolve_request_body_or_ref(target);
                self.visiting.remove(ref_path);
                resolved
            }
        }
    }

    pub fn resolve_response_or_ref(
        &mut self,
        resp: &ResponseOrRef,
    ) -> Result<Response, ResolveError> {
        match resp {
            ResponseOrRef::Response(r) => Ok(r.clone()),
            ResponseOrRef::Ref { ref_path } => {
                self.enter(ref_path)?;
                let name = parse_ref_name(ref_path, "responses")?;
                let target = self
                    .components
                    .and_then(|c| c.responses.get(name))
                    .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                let resolved = self.resolve_response_or_ref(target);
                self.visiting.remove(ref_path);
                resolved
            }
        }
    }

    /// Track a reference chain; a reference seen twice on the same chain can never resolve.
    fn enter(&mut self, ref_path: &str) -> Result<(), ResolveError> {
        if !self.visiting.insert(ref_path.to_string()) {
            return Err(ResolveError::CircularRef(ref_path.to_string()));
        }
        Ok(())
    }
}

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the name.
pub fn parse_ref_name<'a>(
    ref_path: &'a str,
    expected_section: &str,
) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section || name.is_empty() || name.contains('/') {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_component_names() {
        assert_eq!(
            parse_ref_name("#/components/schemas/Pet", "schemas").unwrap(),
            "Pet"
        );
        assert!(parse_ref_name("#/components/responses/Pet", "schemas").is_err());
        assert!(parse_ref_name("#/components/schemas/Pet/properties/id", "schemas").is_err());
        assert!(parse_ref_name("other.yaml#/Pet", "schemas").is_err());
    }

    #[test]
    fn detects_response_ref_cycles() {
        let spec = crate::parse::from_yaml(
            r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /a:
    get:
      operationId: a
      responses:
        "200": { $ref: "#/components/responses/A" }
components:
  responses:
    A: { $ref: "#/components/responses/B" }
    B: { $ref: "#/components/responses/A" }
"##,
        )
        .unwrap();
        let result = RefResolver::new(&spec).resolve_spec(&spec);
        assert!(matches!(result, Err(ResolveError::CircularRef(_))));
    }

    #[test]
    fn inlines_response_refs_but_keeps_schema_refs() {
        let spec = crate::parse::from_yaml(
            r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /a:
    get:
      operationId: a
      responses:
        "404": { $ref: "#/components/responses/NotFound" }
components:
  schemas:
    Problem: { type: object, properties: { detail: { type: string } } }
  responses:
    NotFound:
      description: missing
      content:
        application/json:
          schema: { $ref: "#/components/schemas/Problem" }
"##,
        )
        .unwrap();
        let resolved = RefResolver::new(&spec).resolve_spec(&spec).unwrap();
        let op = resolved.paths["/a"].get.as_ref().unwrap();
        let ResponseOrRef::Response(resp) = &op.responses["404"] else {
            panic!("response should be inlined");
        };
        assert!(matches!(
            resp.content["application/json"].schema,
            Some(crate::parse::schema::SchemaOrRef::Ref { ref ref_path }) if ref_path == "#/components/schemas/Problem"
        ));
    }
}
