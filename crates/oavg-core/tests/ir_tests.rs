use oavg_core::analysis::{BodyStrategy, StatusKey};
use oavg_core::ir::{HttpMethod, IrSchema, IrType};
use oavg_core::parse;
use oavg_core::transform::{self, TransformOptions};
use oavg_core::union::{Flavor, UnionMember, build_response_map};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const MULTI: &str = include_str!("fixtures/multi-content.yaml");
const RECURSIVE: &str = include_str!("fixtures/recursive.yaml");

fn ir(input: &str) -> oavg_core::ir::IrSpec {
    let spec = parse::from_yaml(input).unwrap();
    transform::transform(&spec).unwrap()
}

#[test]
fn transform_petstore_schemas() {
    let ir = ir(PETSTORE);
    assert_eq!(ir.info.title, "Petstore");

    let pet = ir.schema("Pet").expect("should have Pet schema");
    let IrSchema::Object(obj) = pet else {
        panic!("Pet should be an object schema");
    };
    assert_eq!(obj.fields.len(), 5);
    let tag = obj.fields.iter().find(|f| f.original_name == "tag").unwrap();
    assert_eq!(tag.field_type, IrType::Union(vec![IrType::String, IrType::Null]));
    let status = obj.fields.iter().find(|f| f.original_name == "status").unwrap();
    assert_eq!(status.field_type, IrType::Ref("PetStatus".into()));

    match ir.schema("PetStatus") {
        Some(IrSchema::Enum(e)) => assert_eq!(e.variants, vec!["available", "pending", "sold"]),
        other => panic!("PetStatus should be an enum, got {other:?}"),
    }

    // `Error` is a reserved name
    assert!(ir.schema("Error").is_none());
    assert!(ir.schema("ErrorSchema").is_some());
    assert_eq!(ir.renames["Error"], "ErrorSchema");
}

#[test]
fn transform_petstore_operations() {
    let ir = ir(PETSTORE);
    let ids: Vec<_> = ir.operations.iter().map(|o| o.operation_id.as_str()).collect();
    assert_eq!(ids, vec!["listPets", "createPet", "getPetById", "deletePet"]);

    let list = &ir.operations[0];
    assert_eq!(list.method, HttpMethod::Get);
    assert_eq!(list.parameters.query.len(), 1);
    assert_eq!(list.parameters.header.len(), 1);
    assert!(list.parameters.path.is_empty(), "cookie parameters are dropped");
    assert_eq!(
        list.inline_schemas.iter().map(|s| s.identifier.as_str()).collect::<Vec<_>>(),
        vec!["ListPetsResponse200"]
    );
    assert_eq!(
        list.imports.iter().collect::<Vec<_>>(),
        vec!["ErrorSchema", "Pet"]
    );

    let get = &ir.operations[2];
    assert_eq!(get.parameters.path[0].original_name, "petId");
    assert!(get.parameters.path[0].required);

    let delete = &ir.operations[3];
    assert!(delete.deprecated);
    assert!(delete.body.map_type_name.is_none());
}

#[test]
fn request_body_default_content_type() {
    let ir = ir(PETSTORE);
    let create = &ir.operations[1];
    assert!(create.body.is_required());
    assert_eq!(
        create.body.default_content_type.as_deref(),
        Some("application/json")
    );
    assert_eq!(create.body.map_type_name.as_deref(), Some("CreatePetRequestBodyMap"));
    let second = create.body.content_types()[1].schema.as_ref().unwrap();
    assert_eq!(
        second.base_identifier(),
        "CreatePetBodyApplicationXWwwFormUrlencoded"
    );
}

#[test]
fn statuses_are_sorted_with_ranges_and_default_last() {
    let ir = ir(MULTI);
    let report = &ir.operations[0];
    let order: Vec<String> = report.responses.statuses().map(|s| s.to_string()).collect();
    assert_eq!(order, vec!["200", "202", "2XX", "404", "500", "default"]);

    let ok = report.responses.get(StatusKey::Code(200)).unwrap();
    assert!(ok.parsing_strategy.requires_runtime_content_type_check);
    assert_eq!(ok.parsing_strategy.body_strategy(), BodyStrategy::Runtime);

    let failure = report.responses.get(StatusKey::Code(500)).unwrap();
    assert_eq!(failure.parsing_strategy.body_strategy(), BodyStrategy::Text);
    assert!(failure.has_schema);

    let fallback = report.responses.get(StatusKey::Default).unwrap();
    assert!(!fallback.has_schema);
    assert!(fallback.parsing_strategy.is_json_like);
}

#[test]
fn multi_content_union() {
    let ir = ir(MULTI);
    let model = build_response_map(&ir.operations[0], Flavor::Loose);
    let rendered: Vec<String> = model.union.members.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "SuccessWithReport@200",
            "SuccessWithCreateReportResponse200TextCsv@200",
            "Void@202",
            "SuccessWithCreateReportResponse2XX@2XX",
            "Void@404",
            "SuccessWithCreateReportResponse500@500",
            "Void@default",
            "Error",
        ]
    );
    assert_eq!(
        model
            .union
            .members
            .iter()
            .filter(|m| **m == UnionMember::Error)
            .count(),
        1
    );
}

#[test]
fn all_of_with_ref_is_intersection() {
    let ir = ir(MULTI);
    match ir.schema("Report") {
        Some(IrSchema::Alias(alias)) => match &alias.target {
            IrType::Intersection(parts) => {
                assert_eq!(parts[0], IrType::Ref("ReportRequest".into()));
                assert_eq!(parts.len(), 2);
            }
            other => panic!("expected intersection, got {other:?}"),
        },
        other => panic!("expected alias, got {other:?}"),
    }
}

#[test]
fn recursive_schemas_are_flagged() {
    let ir = ir(RECURSIVE);
    assert!(ir.is_recursive("TreeNode"));
    assert!(ir.is_recursive("Person"));
    assert!(ir.is_recursive("Company"));
    assert!(!ir.is_recursive("Label"));
    assert!(ir.same_cycle("Person", "Company"));
    assert!(!ir.same_cycle("TreeNode", "Person"));
}

#[test]
fn parallel_and_sequential_analysis_agree() {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let sequential = transform::transform_with_options(
        &spec,
        &TransformOptions {
            concurrency: 1,
            ..TransformOptions::default()
        },
    )
    .unwrap();
    let parallel = transform::transform_with_options(
        &spec,
        &TransformOptions {
            concurrency: 4,
            ..TransformOptions::default()
        },
    )
    .unwrap();
    assert_eq!(format!("{sequential:?}"), format!("{parallel:?}"));
}
