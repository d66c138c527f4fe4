use std::path::Path;
use std::sync::Arc;

use docshape_core::scalar::StringParser;
use docshape_core::{DocumentFormat, ScalarType};
use docshape_mapper::parse;
use docshape_registry::{
    CategoryDefinition, FieldDefinition, RegistryError, ScalarDefinition, SchemaBundle,
    SchemaDefinition, SchemaRegistry, ValidatorConfig,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ORDER_YAML: &str = r#"
name: Order
format: json
fields:
  - name: id
    optional: false
    category:
      scalar:
        type: int64
  - name: customer
    nullable: false
    category:
      scalar:
        type: string
        constraint:
          string: { min_length: 1, max_length: 20 }
  - name: lines
    category:
      array:
        items:
          object: Line
        directive: { min_length: 1 }
"#;

const LINE_JSON: &str = r#"{
  "name": "Line",
  "format": "json",
  "fields": [
    { "name": "sku", "optional": false, "category": { "scalar": { "type": "string" } } },
    {
      "name": "qty",
      "optional": false,
      "category": { "scalar": { "type": "int32", "constraint": { "integer": { "min": 1 } } } }
    }
  ]
}"#;

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn order_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "order.yaml", ORDER_YAML);
    write(dir.path(), "line.json", LINE_JSON);
    write(dir.path(), "README.md", "not a definition");
    dir
}

// ---------------------------------------------------------------------------
// Directory loading
// ---------------------------------------------------------------------------

#[test]
fn test_directory_loading_mixes_yaml_and_json() {
    let dir = order_dir();
    let registry = SchemaRegistry::from_dir(dir.path()).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), vec!["Line", "Order"]);
    assert!(!registry.contains("README"));
}

#[test]
fn test_loaded_schema_validates_documents() {
    let dir = order_dir();
    let registry = SchemaRegistry::from_dir(dir.path()).unwrap();
    let order = registry.get("Order").unwrap();

    let ok = parse(order, r#"{"id": 7, "customer": "Ada", "lines": [{"sku": "A1", "qty": 2}]}"#);
    assert!(ok.is_valid(), "{:?}", ok.errors);
    let record = ok.record().unwrap();
    assert_eq!(record.get("id").as_i64(), Some(7));
    let lines = record.get("lines").as_array().unwrap();
    assert_eq!(lines[0].as_record().unwrap().get("qty").as_i32(), Some(2));

    let bad = parse(order, r#"{"id": "x", "customer": "", "lines": [{"sku": "A1", "qty": 0}]}"#);
    let found: Vec<(&str, &str)> = bad.errors.iter().map(|e| (e.id(), e.path())).collect();
    assert_eq!(
        found,
        vec![
            ("InvalidInt64", "id"),
            ("StringTooShort", "customer"),
            ("NumericTooSmall", "lines[0].qty"),
        ]
    );
    assert!(bad.record().unwrap().get("lines").is_absent());
}

#[test]
fn test_missing_reference_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "order.yaml", ORDER_YAML);

    let err = SchemaRegistry::from_dir(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::UnknownSchema { ref reference, .. } if reference == "Line"
    ));
}

#[test]
fn test_missing_directory() {
    let err = SchemaRegistry::from_dir("/nonexistent/docshape/schemas").unwrap_err();
    assert!(matches!(err, RegistryError::IoError(_)));
}

#[test]
fn test_malformed_definition() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.yaml", "name: [unterminated");

    let err = SchemaRegistry::from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, RegistryError::YamlError(_)));
}

// ---------------------------------------------------------------------------
// Bundles and builder
// ---------------------------------------------------------------------------

#[test]
fn test_bundle_loading() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = SchemaBundle {
        version: Some("1.0".into()),
        schemas: vec![
            serde_yaml::from_str(ORDER_YAML).unwrap(),
            serde_json::from_str(LINE_JSON).unwrap(),
        ],
    };
    let path = dir.path().join("bundle.json");
    std::fs::write(&path, serde_json::to_string_pretty(&bundle).unwrap()).unwrap();

    let registry = SchemaRegistry::from_bundle(&path).unwrap();
    assert_eq!(registry.names(), vec!["Line", "Order"]);
}

#[test]
fn test_builder_combines_files_and_definitions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "line.json", LINE_JSON);

    let wrapper = SchemaDefinition::new("Wrapper", DocumentFormat::Json).with_field(
        FieldDefinition::new("line", CategoryDefinition::embedded("Line")).optional(false),
    );

    let registry = SchemaRegistry::builder()
        .from_file(dir.path().join("line.json"))
        .with_definition(wrapper)
        .build()
        .unwrap();

    let result = parse(
        registry.get("Wrapper").unwrap(),
        r#"{"line": "{\"sku\": \"B2\", \"qty\": -1}"}"#,
    );
    let found: Vec<(&str, &str)> = result.errors.iter().map(|e| (e.id(), e.path())).collect();
    assert_eq!(found, vec![("NumericTooSmall", "line.qty")]);
}

#[test]
fn test_duplicate_across_sources() {
    let dir = order_dir();
    let err = SchemaRegistry::builder()
        .from_dir(dir.path())
        .from_file(dir.path().join("line.json"))
        .build()
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateSchema(ref name) if name == "Line"));
}

#[test]
fn test_named_parser() {
    let coded = SchemaDefinition::new("Coded", DocumentFormat::Json).with_field(
        FieldDefinition::new(
            "code",
            CategoryDefinition::Scalar(
                ScalarDefinition::new(ScalarType::Custom("Code".into())).with_parser("three"),
            ),
        )
        .optional(false),
    );
    let registry = SchemaRegistry::builder()
        .with_definition(coded)
        .with_parser(
            "three",
            Arc::new(StringParser::new("code", Some(3), Some(3)).unwrap()),
        )
        .build()
        .unwrap();

    let schema = registry.get("Coded").unwrap();
    assert!(parse(schema, r#"{"code": "ABC"}"#).is_valid());
    let result = parse(schema, r#"{"code": "ABCD"}"#);
    assert_eq!(result.errors[0].id(), "StringTooLong");
}

// ---------------------------------------------------------------------------
// XML definitions
// ---------------------------------------------------------------------------

#[test]
fn test_xml_definition_with_attribute() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "item.yml",
        r#"
name: Item
format: xml
fields:
  - name: id
    placement: attribute
    optional: false
    category:
      scalar:
        type: guid
  - name: label
    optional: true
    category:
      scalar:
        type: string
"#,
    );
    let registry = SchemaRegistry::from_dir(dir.path()).unwrap();
    let item = registry.get("Item").unwrap();

    let result = parse(
        item,
        r#"<Item id="b5f1c3de-6a8f-4c1e-9d2a-0e4b7f3a9c21"><label>Lamp</label></Item>"#,
    );
    assert!(result.is_valid(), "{:?}", result.errors);

    let result = parse(item, r#"<Item id="nope"/>"#);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].id(), "InvalidLooseGuid");
    assert_eq!(result.errors[0].path(), "id");
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_builds_registry_from_relative_paths() {
    let dir = order_dir();
    let config_path = dir.path().join("docshape.yml");
    std::fs::write(&config_path, "schemas:\n  - order.yaml\n  - line.json\njobs: 2\n").unwrap();

    let config = ValidatorConfig::load(&config_path).unwrap();
    assert_eq!(config.jobs, 2);

    let registry = config.registry().build().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("Order"));
}
