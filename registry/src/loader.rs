//! Schema registry loading with a builder and dependency-ordered compilation.
//!
//! Provides [`SchemaRegistry`] for lookup of compiled schemas by name and
//! [`RegistryBuilder`] for assembling one from several sources plus named
//! custom parsers.
//!
//! # Loading patterns
//!
//! ```no_run
//! use docshape_registry::SchemaRegistry;
//!
//! // Every *.json, *.yaml, and *.yml file in a directory
//! let registry = SchemaRegistry::from_dir("schemas/").unwrap();
//! assert!(registry.get("Order").is_some());
//!
//! // A single bundle file with a `schemas` list
//! let registry = SchemaRegistry::from_bundle("schemas.yaml").unwrap();
//!
//! // Several sources at once
//! let registry = SchemaRegistry::builder()
//!     .from_dir("schemas/")
//!     .from_bundle("extra.yaml")
//!     .build()
//!     .unwrap();
//! ```
//!
//! Definitions may refer to each other by name in any order; they are
//! compiled dependencies first.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use docshape_core::{ArrayDirective, FieldSpec, ObjectDirective, ScalarParser, SchemaType};
use tracing::debug;

use crate::definition::{
    ArrayDefinition, CategoryDefinition, FieldDefinition, ItemDefinition, ObjectDefinition,
    ScalarDefinition, SchemaBundle, SchemaDefinition, read_document,
};
use crate::error::{RegistryError, Result};

/// Where a [`RegistryBuilder`] reads definitions from.
#[derive(Debug, Clone)]
pub enum RegistrySource {
    /// Every definition file in a directory.
    Directory(PathBuf),
    /// One file holding a [`SchemaBundle`].
    Bundle(PathBuf),
    /// One file holding a single [`SchemaDefinition`].
    File(PathBuf),
}

impl RegistrySource {
    /// Picks [`Directory`](Self::Directory) for directories and
    /// [`File`](Self::File) otherwise.
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::File(path)
        }
    }

    fn read(&self) -> Result<Vec<SchemaDefinition>> {
        match self {
            Self::Directory(dir) => {
                let mut paths = Vec::new();
                for entry in std::fs::read_dir(dir)? {
                    let path = entry?.path();
                    let is_definition = matches!(
                        path.extension().and_then(|e| e.to_str()),
                        Some("json" | "yaml" | "yml")
                    );
                    if is_definition && path.is_file() {
                        paths.push(path);
                    }
                }
                paths.sort();
                debug!(dir = %dir.display(), files = paths.len(), "Reading schema directory");
                paths.iter().map(|p| read_document(p)).collect()
            }
            Self::Bundle(path) => {
                let bundle: SchemaBundle = read_document(path)?;
                debug!(
                    path = %path.display(),
                    schemas = bundle.schemas.len(),
                    "Read schema bundle"
                );
                Ok(bundle.schemas)
            }
            Self::File(path) => Ok(vec![read_document(path)?]),
        }
    }
}

/// Compiled schemas, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<SchemaType>>,
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Compiles every definition file in `path`.
    ///
    /// # Errors
    ///
    /// I/O and parse errors, then any compilation error (see
    /// [`from_definitions`](Self::from_definitions)).
    pub fn from_dir(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().from_dir(path).build()
    }

    /// Compiles the definitions of a bundle file.
    pub fn from_bundle(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().from_bundle(path).build()
    }

    /// Compiles in-memory definitions without custom parsers.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateSchema`], [`RegistryError::UnknownSchema`],
    /// [`RegistryError::CyclicReference`], [`RegistryError::UnknownParser`],
    /// or [`RegistryError::Definition`] for a definition that does not
    /// resolve.
    pub fn from_definitions(definitions: Vec<SchemaDefinition>) -> Result<Self> {
        Compiler::new(definitions, &HashMap::new())?.run()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<SchemaType>> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Builder for a [`SchemaRegistry`].
///
/// Unlike a fallback chain, every source is read and all definitions are
/// compiled together, so a schema in one file may refer to a schema in
/// another.
///
/// ```
/// use std::sync::Arc;
///
/// use docshape_core::scalar::StringParser;
/// use docshape_core::{DocumentFormat, ScalarType};
/// use docshape_registry::{
///     CategoryDefinition, FieldDefinition, ScalarDefinition, SchemaDefinition, SchemaRegistry,
/// };
///
/// let code = SchemaDefinition::new("Code", DocumentFormat::Json).with_field(
///     FieldDefinition::new(
///         "value",
///         CategoryDefinition::Scalar(
///             ScalarDefinition::new(ScalarType::Custom("Code".into())).with_parser("code"),
///         ),
///     )
///     .optional(false),
/// );
///
/// let registry = SchemaRegistry::builder()
///     .with_definition(code)
///     .with_parser("code", Arc::new(StringParser::new("value", Some(3), Some(3)).unwrap()))
///     .build()
///     .unwrap();
/// assert!(registry.contains("Code"));
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    sources: Vec<RegistrySource>,
    definitions: Vec<SchemaDefinition>,
    parsers: HashMap<String, Arc<dyn ScalarParser>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::Directory(path.into()));
        self
    }

    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::Bundle(path.into()));
        self
    }

    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::File(path.into()));
        self
    }

    pub fn with_source(mut self, source: RegistrySource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_definition(mut self, definition: SchemaDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Registers a parser that definitions select with `parser: <name>`.
    pub fn with_parser(mut self, name: &str, parser: Arc<dyn ScalarParser>) -> Self {
        self.parsers.insert(name.to_string(), parser);
        self
    }

    /// Reads every source and compiles all definitions.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoSources`] when nothing was added, otherwise the
    /// first read or compilation error.
    pub fn build(self) -> Result<SchemaRegistry> {
        if self.sources.is_empty() && self.definitions.is_empty() {
            return Err(RegistryError::NoSources);
        }

        let mut definitions = Vec::new();
        for source in &self.sources {
            definitions.extend(source.read()?);
        }
        definitions.extend(self.definitions);

        Compiler::new(definitions, &self.parsers)?.run()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first compilation of definitions, dependencies first.
struct Compiler<'p> {
    definitions: BTreeMap<String, SchemaDefinition>,
    parsers: &'p HashMap<String, Arc<dyn ScalarParser>>,
    marks: HashMap<String, Mark>,
    compiled: HashMap<String, Arc<SchemaType>>,
}

impl<'p> Compiler<'p> {
    fn new(
        list: Vec<SchemaDefinition>,
        parsers: &'p HashMap<String, Arc<dyn ScalarParser>>,
    ) -> Result<Self> {
        let mut definitions = BTreeMap::new();
        for definition in list {
            if definitions.contains_key(&definition.name) {
                return Err(RegistryError::DuplicateSchema(definition.name));
            }
            definitions.insert(definition.name.clone(), definition);
        }
        Ok(Self {
            definitions,
            parsers,
            marks: HashMap::new(),
            compiled: HashMap::new(),
        })
    }

    fn run(mut self) -> Result<SchemaRegistry> {
        let names: Vec<String> = self.definitions.keys().cloned().collect();
        let mut stack = Vec::new();
        for name in &names {
            self.visit(name, &mut stack)?;
        }
        debug!(schemas = self.compiled.len(), "Compiled schema registry");
        Ok(SchemaRegistry {
            schemas: self.compiled,
        })
    }

    fn visit(&mut self, name: &str, stack: &mut Vec<String>) -> Result<()> {
        match self.marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(name.to_string());
                return Err(RegistryError::CyclicReference(cycle));
            }
            None => {}
        }

        let Some(definition) = self.definitions.get(name).cloned() else {
            return Ok(());
        };
        self.marks.insert(name.to_string(), Mark::Visiting);
        stack.push(name.to_string());

        for reference in definition.references() {
            if !self.definitions.contains_key(reference) {
                return Err(RegistryError::UnknownSchema {
                    schema: definition.name.clone(),
                    reference: reference.to_string(),
                });
            }
            self.visit(reference, stack)?;
        }

        let schema = self.compile(&definition)?;
        stack.pop();
        self.marks.insert(name.to_string(), Mark::Done);
        self.compiled.insert(name.to_string(), Arc::new(schema));
        Ok(())
    }

    fn compile(&self, definition: &SchemaDefinition) -> Result<SchemaType> {
        let mut builder = SchemaType::builder(&definition.name, definition.format);
        for field in &definition.fields {
            builder = builder.field(self.field_spec(definition, field)?);
        }
        builder.build().map_err(|source| RegistryError::Definition {
            schema: definition.name.clone(),
            source,
        })
    }

    fn field_spec(
        &self,
        definition: &SchemaDefinition,
        field: &FieldDefinition,
    ) -> Result<FieldSpec> {
        let name = field.name.as_str();
        let mut spec = match &field.category {
            CategoryDefinition::Scalar(scalar) => {
                let spec = FieldSpec::scalar(name, scalar.target.clone());
                self.apply_scalar(spec, scalar, definition, field)?
            }
            CategoryDefinition::Object(object) => {
                let spec = FieldSpec::object(name, self.schema(definition, &object.schema)?);
                apply_object_directive(spec, object, field)
            }
            CategoryDefinition::Embedded(object) => {
                let spec = FieldSpec::embedded(name, self.schema(definition, &object.schema)?);
                apply_object_directive(spec, object, field)
            }
            CategoryDefinition::Array(array) => {
                let spec = match &array.items {
                    ItemDefinition::Scalar(scalar) => {
                        let spec = FieldSpec::array_of_scalars(name, scalar.target.clone());
                        self.apply_scalar(spec, scalar, definition, field)?
                    }
                    ItemDefinition::Object(schema) => {
                        FieldSpec::array_of_objects(name, self.schema(definition, schema)?)
                    }
                };
                apply_array_directive(spec, array, field)
            }
        };

        if let Some(external) = &field.rename {
            spec = spec.rename(external);
        }
        spec = spec.placement(field.placement);
        spec = match field.optional {
            Some(true) => spec.optional(),
            Some(false) => spec.required(),
            None => spec,
        };
        spec = match field.nullable {
            Some(true) => spec.nullable(),
            Some(false) => spec.non_null(),
            None => spec,
        };
        Ok(spec)
    }

    fn apply_scalar(
        &self,
        mut spec: FieldSpec,
        scalar: &ScalarDefinition,
        definition: &SchemaDefinition,
        field: &FieldDefinition,
    ) -> Result<FieldSpec> {
        if let Some(constraint) = &scalar.constraint {
            spec = spec.constraint(constraint.clone());
        }
        if let Some(parser_name) = &scalar.parser {
            let parser = self.parsers.get(parser_name).ok_or_else(|| {
                RegistryError::UnknownParser {
                    schema: definition.name.clone(),
                    field: field.name.clone(),
                    parser: parser_name.clone(),
                }
            })?;
            spec = spec.parser(Arc::clone(parser));
        }
        Ok(spec)
    }

    /// Compiled dependency. `visit` compiles references first.
    fn schema(&self, definition: &SchemaDefinition, name: &str) -> Result<Arc<SchemaType>> {
        self.compiled
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSchema {
                schema: definition.name.clone(),
                reference: name.to_string(),
            })
    }
}

fn apply_object_directive(
    spec: FieldSpec,
    object: &ObjectDefinition,
    field: &FieldDefinition,
) -> FieldSpec {
    let directive = object
        .directive
        .or_else(|| field.optional.map(|optional| ObjectDirective { optional }));
    match directive {
        Some(directive) => spec.directive(directive),
        None => spec,
    }
}

fn apply_array_directive(
    spec: FieldSpec,
    array: &ArrayDefinition,
    field: &FieldDefinition,
) -> FieldSpec {
    let directive = array.directive.or_else(|| {
        field.optional.map(|optional| ArrayDirective {
            optional,
            ..ArrayDirective::default()
        })
    });
    match directive {
        Some(directive) => spec.array_directive(directive),
        None => spec,
    }
}
