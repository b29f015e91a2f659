use std::fs;
use std::process::Command;

use oavg_core::{CodeGenerator, GeneratedFile, parse, transform};
use oavg_zod::{ZodGenerator, ZodOptions};

const PETSTORE: &str = include_str!("../../oavg-core/tests/fixtures/petstore.yaml");
const RECURSIVE: &str = include_str!("../../oavg-core/tests/fixtures/recursive.yaml");
const COLLISIONS: &str = include_str!("../../oavg-core/tests/fixtures/collisions.yaml");
const MULTI_CONTENT: &str = include_str!("../../oavg-core/tests/fixtures/multi-content.yaml");

fn generate(yaml: &str, options: &ZodOptions) -> Vec<GeneratedFile> {
    let spec = parse::from_yaml(yaml).unwrap();
    let ir = transform::transform(&spec).unwrap();
    ZodGenerator.generate(&ir, options).unwrap()
}

fn file<'a>(files: &'a [GeneratedFile], path: &str) -> &'a str {
    files
        .iter()
        .find(|f| f.path == path)
        .map(|f| f.content.as_str())
        .unwrap_or_else(|| panic!("no file `{path}` in output"))
}

#[test]
fn petstore_file_layout() {
    let files = generate(PETSTORE, &ZodOptions::default());
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "schemas/Pet.ts",
            "schemas/NewPet.ts",
            "schemas/PetStatus.ts",
            "schemas/ErrorSchema.ts",
            "operations/listPets.ts",
            "operations/createPet.ts",
            "operations/getPetById.ts",
            "operations/deletePet.ts",
            "operations/index.ts",
            "support.ts",
            "index.ts",
        ]
    );
}

#[test]
fn index_barrel_is_optional() {
    let options = ZodOptions {
        index: false,
        ..ZodOptions::default()
    };
    let files = generate(PETSTORE, &options);
    assert!(files.iter().all(|f| f.path != "index.ts"));
    assert!(files.iter().any(|f| f.path == "operations/index.ts"));
}

#[test]
fn operations_index_reexports_in_declaration_order() {
    let files = generate(PETSTORE, &ZodOptions::default());
    insta::assert_snapshot!(file(&files, "operations/index.ts"), @r#"
    // Generated by oavg. Do not edit.
    export * from "./listPets";
    export * from "./createPet";
    export * from "./getPetById";
    export * from "./deletePet";
    "#);
}

#[test]
fn enum_schema_has_both_flavors() {
    let files = generate(PETSTORE, &ZodOptions::default());
    insta::assert_snapshot!(file(&files, "schemas/PetStatus.ts"), @r#"
    // Generated by oavg. Do not edit.
    import { z } from "zod";

    export const PetStatus = z.enum(["available", "pending", "sold"]);
    export type PetStatus = z.infer<typeof PetStatus>;

    export const PetStatusStrict = z.enum(["available", "pending", "sold"]);
    export type PetStatusStrict = z.infer<typeof PetStatusStrict>;
    "#);
}

#[test]
fn object_schema_flavors_differ_on_unknown_fields() {
    let files = generate(PETSTORE, &ZodOptions::default());
    let pet = file(&files, "schemas/Pet.ts");
    assert!(pet.contains(r#"import { PetStatus, PetStatusStrict } from "./PetStatus";"#));
    assert!(pet.contains("export const Pet = z.object({ id: z.number().int(), name: z.string(), "));
    assert!(pet.contains("tag: z.string().nullable().optional()"));
    assert!(pet.contains("status: PetStatus.optional()"));
    assert!(pet.contains("status: PetStatusStrict.optional()"));
    assert!(pet.contains("}).passthrough();"));
    assert!(pet.contains("}).strict();"));
}

#[test]
fn response_union_follows_status_order() {
    let files = generate(PETSTORE, &ZodOptions::default());
    let op = file(&files, "operations/getPetById.ts");

    assert!(op.contains(r#"import { Pet, PetStrict } from "../schemas/Pet";"#));
    assert!(
        op.contains("export const GetPetByIdPathParams = z.object({ petId: z.number().int() }).passthrough();")
    );
    assert!(op.contains(
        "export type GetPetByIdResponse<F extends boolean = false> =\n  | SuccessMember<F, \"200\", \"application/json\", Pet>\n  | VoidSuccess<F, \"404\">\n  | ApiError;\n"
    ));
    assert!(op.contains(
        "export type GetPetByIdResponseStrict<F extends boolean = false> =\n  | SuccessMember<F, \"200\", \"application/json\", PetStrict>\n  | VoidSuccess<F, \"404\">\n  | ApiError;\n"
    ));
    assert!(op.contains(
        "export type GetPetByIdResponseMap = {\n  \"200\": { \"application/json\": Pet },\n};"
    ));
    assert!(op.contains(
        "export type GetPetByIdResponseMapStrict = {\n  \"200\": { \"application/json\": PetStrict },\n};"
    ));
    assert!(op.contains(r#"export const getPetByIdStatuses = ["200", "404"] as const;"#));
    assert!(op.contains("  \"404\": {},\n"));
    assert!(op.contains("  \"200\": { \"application/json\": PetStrict },\n"));
    assert!(op.contains("  { path: GetPetByIdPathParams },\n"));
    assert!(op.contains("  path: \"/pets/{petId}\",\n"));
}

#[test]
fn request_bodies_follow_declared_content_types() {
    let files = generate(PETSTORE, &ZodOptions::default());
    let op = file(&files, "operations/createPet.ts");

    assert!(op.contains("export const CreatePetBodyApplicationXWwwFormUrlencoded = z.object({ name: z.string() }).passthrough();"));
    assert!(op.contains("export const createPetRequestBodies = {\n  \"application/json\": NewPet,\n"));
    assert!(op.contains("  \"application/x-www-form-urlencoded\": CreatePetBodyApplicationXWwwFormUrlencoded,\n"));
    assert!(op.contains(
        "body: CreatePetRequestBodyMap[keyof CreatePetRequestBodyMap]; contentType?: keyof CreatePetRequestBodyMap"
    ));
    assert!(op.contains("  defaultContentType: \"application/json\",\n"));
    assert!(op.contains("SuccessMember<F, \"422\", \"application/problem+json\", ErrorSchema>"));
}

#[test]
fn default_status_and_optional_parameters() {
    let files = generate(PETSTORE, &ZodOptions::default());
    let op = file(&files, "operations/listPets.ts");

    assert!(op.contains("query?: ListPetsQueryParams; headers?: ListPetsHeaderParams"));
    assert!(op.contains("export const ListPetsQueryParams = z.object({ limit: z.number().int().optional() }).passthrough();"));
    assert!(op.contains("SuccessMember<F, \"default\", \"application/json\", ErrorSchema>"));
    assert!(!op.contains("session"));
}

#[test]
fn path_level_parameters_are_inherited() {
    let files = generate(PETSTORE, &ZodOptions::default());
    let op = file(&files, "operations/deletePet.ts");
    assert!(op.contains("  { path: DeletePetPathParams },\n"));
    assert!(op.contains(" * @deprecated\n"));
    assert!(op.contains("VoidSuccess<F, \"204\">"));
}

#[test]
fn jsdoc_can_be_disabled() {
    let options = ZodOptions {
        jsdoc: false,
        ..ZodOptions::default()
    };
    let files = generate(PETSTORE, &options);
    assert!(files.iter().filter(|f| f.path != "support.ts").all(|f| !f.content.contains("/**")));
}

#[test]
fn recursive_schemas_are_deferred() {
    let files = generate(RECURSIVE, &ZodOptions::default());

    let tree = file(&files, "schemas/TreeNode.ts");
    assert!(tree.contains("export type TreeNode = { value: string; children?: TreeNode[]; owner?: Person };"));
    assert!(tree.contains("export const TreeNode: z.ZodType<TreeNode, z.ZodTypeDef, unknown> = "));
    assert!(tree.contains("children: z.array(z.lazy(() => TreeNode)).optional()"));
    assert!(tree.contains("owner: Person.optional()"));
    assert!(tree.contains(r#"import { Person, PersonStrict } from "./Person";"#));

    let person = file(&files, "schemas/Person.ts");
    assert!(person.contains("employer: z.lazy(() => Company).optional()"));
    assert!(person.contains("employer: z.lazy(() => CompanyStrict).optional()"));

    let label = file(&files, "schemas/Label.ts");
    assert!(label.contains("export const Label = z.string();"));
    assert!(!label.contains("z.lazy"));
}

#[test]
fn renamed_schemas_keep_their_files_apart() {
    let files = generate(COLLISIONS, &ZodOptions::default());
    for path in [
        "schemas/ResponseSchema.ts",
        "schemas/ResponseSchemaSchema.ts",
        "schemas/RecordSchema.ts",
        "schemas/ErrorSchema.ts",
        "schemas/PetStore.ts",
        "schemas/PetStoreSchema.ts",
    ] {
        file(&files, path);
    }

    let op = file(&files, "operations/getThing.ts");
    assert!(op.contains(r#"from "../schemas/ResponseSchema";"#));
    assert!(op.contains(r#"from "../schemas/ErrorSchema";"#));

    let record = file(&files, "schemas/RecordSchema.ts");
    assert!(record.contains("export const RecordSchema = z.record(z.string(), z.string());"));

    let shape = file(&files, "schemas/Shape.ts");
    assert!(shape.contains("z.union([Circle, Square])"));
    assert!(shape.contains("z.union([CircleStrict, SquareStrict])"));
}

const EXPORT_NAMED_SCHEMA: &str = r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /pets/{id}:
    get:
      operationId: getPet
      parameters:
        - { name: id, in: path, required: true, schema: { type: string } }
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: "#/components/schemas/GetPetResponse" }
components:
  schemas:
    GetPetResponse:
      type: object
      properties:
        name: { type: string }
"##;

#[test]
fn schema_named_like_an_operation_export_is_renamed() {
    let files = generate(EXPORT_NAMED_SCHEMA, &ZodOptions::default());
    assert!(files.iter().all(|f| f.path != "schemas/GetPetResponse.ts"));
    file(&files, "schemas/GetPetResponseSchema.ts");

    let op = file(&files, "operations/getPet.ts");
    assert!(op.contains(
        r#"import { GetPetResponseSchema, GetPetResponseSchemaStrict } from "../schemas/GetPetResponseSchema";"#
    ));
    assert!(op.contains(
        "export type GetPetResponse<F extends boolean = false> =\n  | SuccessMember<F, \"200\", \"application/json\", GetPetResponseSchema>\n"
    ));
    assert!(op.contains("SuccessMember<F, \"200\", \"application/json\", GetPetResponseSchemaStrict>"));
}

#[test]
fn operations_that_normalize_alike_are_rejected() {
    let yaml = r#"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /pets:
    get:
      operationId: getPet
      responses: { "204": { description: none } }
  /pet:
    get:
      operationId: get_pet
      responses: { "204": { description: none } }
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    assert!(transform::transform(&spec).is_err());
}

#[test]
fn output_is_deterministic() {
    for yaml in [PETSTORE, RECURSIVE, COLLISIONS, MULTI_CONTENT] {
        let serial = ZodOptions {
            concurrency: 1,
            ..ZodOptions::default()
        };
        assert_eq!(generate(yaml, &ZodOptions::default()), generate(yaml, &serial));
    }
}

const PACKAGE_JSON: &str = r#"{
  "name": "oavg-compile-check",
  "private": true,
  "type": "module",
  "dependencies": { "zod": "^3.23.0" },
  "devDependencies": { "typescript": "^5.4.0" }
}
"#;

const TSCONFIG: &str = r#"{
  "compilerOptions": {
    "target": "ES2022",
    "module": "ESNext",
    "moduleResolution": "Bundler",
    "lib": ["ES2022", "DOM"],
    "strict": true,
    "noEmit": true,
    "skipLibCheck": true
  },
  "include": ["src"]
}
"#;

fn compile(yaml: &str) {
    let files = generate(yaml, &ZodOptions::default());

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("package.json"), PACKAGE_JSON).unwrap();
    fs::write(dir.join("tsconfig.json"), TSCONFIG).unwrap();
    for file in &files {
        let dest = dir.join("src").join(&file.path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&dest, &file.content).unwrap();
    }

    let install = Command::new("npm")
        .args(["install", "--no-audit", "--no-fund"])
        .current_dir(dir)
        .output()
        .expect("failed to run npm install");
    if !install.status.success() {
        panic!("npm install failed:\n{}", String::from_utf8_lossy(&install.stderr));
    }

    let tsc = Command::new("npx")
        .args(["tsc", "--noEmit"])
        .current_dir(dir)
        .output()
        .expect("failed to run tsc");
    if !tsc.status.success() {
        panic!(
            "tsc failed:\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&tsc.stdout),
            String::from_utf8_lossy(&tsc.stderr),
        );
    }
}

#[test]
#[ignore] // Requires Node.js
fn generated_petstore_compiles() {
    compile(PETSTORE);
}

#[test]
#[ignore] // Requires Node.js
fn generated_recursive_compiles() {
    compile(RECURSIVE);
}

#[test]
#[ignore] // Requires Node.js
fn generated_collisions_compile() {
    compile(COLLISIONS);
}
