use oavg_core::transform::name_normalizer::{normalize_name, route_to_name, sanitize_type_name};

#[test]
fn test_camel_case_input() {
    let n = normalize_name("getPetById");
    assert_eq!(n.pascal_case, "GetPetById");
    assert_eq!(n.camel_case, "getPetById");
}

#[test]
fn test_snake_case_input() {
    let n = normalize_name("list_pets");
    assert_eq!(n.pascal_case, "ListPets");
    assert_eq!(n.camel_case, "listPets");
}

#[test]
fn test_content_type_input() {
    assert_eq!(normalize_name("application/problem+json").pascal_case, "ApplicationProblemJson");
    assert_eq!(normalize_name("text/csv").pascal_case, "TextCsv");
}

#[test]
fn test_sanitized_type_names_are_stable() {
    for name in ["Pet", "PetStatus", "ErrorSchema2", "_Private"] {
        assert_eq!(sanitize_type_name(name), name);
        assert_eq!(sanitize_type_name(&sanitize_type_name(name)), name);
    }
    assert_eq!(sanitize_type_name("pet.store"), "PetStore");
    assert_eq!(sanitize_type_name("v1 user profile"), "V1UserProfile");
}

#[test]
fn test_route_names() {
    assert_eq!(route_to_name("GET", "/reports/{id}"), "getReport");
    assert_eq!(route_to_name("DELETE", "/categories/{id}"), "deleteCategory");
}
