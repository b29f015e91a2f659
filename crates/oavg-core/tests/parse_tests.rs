use oavg_core::parse;
use oavg_core::parse::ref_resolve::RefResolver;
use oavg_core::parse::request_body::RequestBodyOrRef;
use oavg_core::parse::response::ResponseOrRef;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const RECURSIVE: &str = include_str!("fixtures/recursive.yaml");
const MULTI: &str = include_str!("fixtures/multi-content.yaml");

#[test]
fn parse_petstore_yaml() {
    let spec = parse::from_yaml(PETSTORE).expect("should parse petstore");
    assert_eq!(spec.openapi, "3.0.3");
    assert_eq!(spec.info.title, "Petstore");
    assert_eq!(spec.paths.len(), 2);

    let components = spec.components.as_ref().expect("should have components");
    assert_eq!(components.schemas.len(), 4);
    assert_eq!(
        components.schemas.keys().collect::<Vec<_>>(),
        vec!["Pet", "NewPet", "PetStatus", "Error"]
    );
}

#[test]
fn parse_recursive_31_yaml() {
    let spec = parse::from_yaml(RECURSIVE).expect("should parse 3.1 spec");
    assert_eq!(spec.openapi, "3.1.0");
    assert_eq!(spec.paths.len(), 1);
}

#[test]
fn content_types_keep_declaration_order() {
    let spec = parse::from_yaml(MULTI).unwrap();
    let post = spec.paths["/reports"].post.as_ref().unwrap();
    let Some(RequestBodyOrRef::RequestBody(body)) = &post.request_body else {
        panic!("expected inline request body");
    };
    assert_eq!(
        body.content.keys().collect::<Vec<_>>(),
        vec!["application/json", "text/csv", "application/octet-stream"]
    );
    assert!(body.content["application/octet-stream"].schema.is_none());

    let statuses: Vec<_> = post.responses.keys().collect();
    assert_eq!(statuses, vec!["200", "202", "2XX", "404", "500", "default"]);
}

#[test]
fn reusable_components_are_inlined() {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let resolved = RefResolver::new(&spec).resolve_spec(&spec).unwrap();

    let pets = &resolved.paths["/pets"];
    let post = pets.post.as_ref().unwrap();
    assert!(matches!(post.request_body, Some(RequestBodyOrRef::RequestBody(_))));

    let list = pets.get.as_ref().unwrap();
    match &list.responses["default"] {
        ResponseOrRef::Response(r) => assert_eq!(r.description, "Unexpected error"),
        ResponseOrRef::Ref { .. } => panic!("default response should be inlined"),
    }
}

#[test]
fn parse_json_spec() {
    let json = r#"{
        "openapi": "3.1.0",
        "info": { "title": "Json", "version": "0.1.0" },
        "paths": {}
    }"#;
    let spec = parse::from_json(json).unwrap();
    assert_eq!(spec.info.title, "Json");
    assert!(spec.components.is_none());
}

#[test]
fn parse_invalid_version() {
    let yaml = r#"
openapi: "2.0.0"
info:
  title: Test
  version: "1.0"
paths: {}
"#;
    let result = parse::from_yaml(yaml);
    assert!(result.is_err());
}
