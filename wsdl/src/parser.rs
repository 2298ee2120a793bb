use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::{HashMap, HashSet},
    io::BufRead,
};
use url::Url;

use super::{
    error,
    types::{
        Binding, BindingOperation, Definition, Field, FieldKind, Message, Method, Operation, Part,
        Port, PortDecl, PortType, QName, Schema, SchemaImport, Service, ServiceDecl, Style,
        TypeKind, XSD_NAMESPACE,
    },
    ParseOptions,
};

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], error::Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(attribute.unescape_and_decode_value(reader)?);
                break;
            }
        }
    }

    Ok(result)
}

fn required(
    value: Option<String>,
    element: &str,
    attribute: &'static str,
) -> Result<String, error::Error> {
    value.ok_or_else(|| error::Error::MissingAttribute {
        element: element.to_owned(),
        attribute,
    })
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, prefixed_name),
    }
}

const SOAP_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";

fn xsd(name: &str) -> QName {
    QName::new(XSD_NAMESPACE, name)
}

fn fetch(url: &Url) -> Result<Vec<u8>, error::Error> {
    match url.scheme() {
        "file" => std::fs::read(
            url.to_file_path()
                .map_err(|()| error::Error::PathConversionError(None))?,
        )
        .map_err(error::Error::FileOpenError),

        "http" | "https" => Ok(reqwest::blocking::get(url.clone())?
            .error_for_status()?
            .bytes()?
            .to_vec()),

        other => Err(error::Error::UnsupportedScheme(other.into())),
    }
}

#[derive(Default)]
struct Scope {
    prefixes: HashMap<Option<String>, String>,
    target: Option<String>,
}

#[derive(Default)]
struct CurrentNamespaces {
    scopes: Vec<Scope>,
}

impl CurrentNamespaces {
    fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn prefix(&self, prefix: Option<&str>) -> Option<&str> {
        let key = prefix.map(ToOwned::to_owned);
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.prefixes.get(&key))
            .map(String::as_str)
    }

    fn target(&self) -> &str {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.target.as_deref())
            .unwrap_or_default()
    }

    fn target_namespaced(&self, name: String) -> QName {
        QName::new(self.target(), name)
    }

    fn resolve(&self, prefixed_name: &str) -> Result<QName, error::Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name);

        let namespace = match prefix {
            Some(prefix) => self
                .prefix(Some(prefix))
                .ok_or_else(|| error::Error::UnknownPrefix(prefix.to_owned()))?,
            None => self.prefix(None).unwrap_or_else(|| self.target()),
        };

        Ok(QName::new(namespace, local_name))
    }
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema {
        index: usize,
    },
    Element {
        name: String,
        ty: Option<QName>,
        kind: Option<TypeKind>,
    },
    ComplexType {
        name: Option<String>,
        kind: Option<TypeKind>,
    },
    Content {
        simple: bool,
        kind: Option<TypeKind>,
    },
    Derivation {
        base: QName,
        extension: bool,
        fields: Vec<Field>,
    },
    Sequence(Vec<Field>),
    SequenceElement {
        name: String,
        kind: Option<FieldKind>,
    },
    SimpleType {
        name: Option<String>,
        base: Option<QName>,
    },

    Message {
        name: QName,
        parts: Vec<Part>,
    },

    PortType {
        name: QName,
        operations: Vec<Operation>,
    },
    Operation {
        name: String,
        documentation: Option<String>,
        input: Option<QName>,
        output: Option<QName>,
    },
    Documentation(String),

    Binding {
        name: QName,
        ty: QName,
        transport: Option<String>,
        style: Option<Style>,
        operations: Vec<BindingOperation>,
    },
    BindingOperation {
        name: String,
        action: String,
        style: Option<Style>,
        namespace: Option<String>,
    },
    BindingInput {
        namespace: Option<String>,
    },

    Service {
        name: String,
        ports: Vec<PortDecl>,
    },
    Port {
        name: String,
        binding: QName,
        location: Option<String>,
    },

    Other,
}

struct Pending {
    url: Url,
    namespace: Option<String>,
}

/// Parse state of a single document (the WSDL itself or an imported schema).
struct Document {
    url: Url,
    include_namespace: Option<String>,
    stack: Vec<ParseState>,
    namespaces: CurrentNamespaces,
    pending: Vec<Pending>,
}

struct Parser<'a> {
    options: &'a ParseOptions<'a>,
    definition: Definition,
    visited: HashSet<Url>,
}

pub fn parse(url: Url, options: &ParseOptions<'_>) -> Result<Definition, error::Error> {
    let mut parser = Parser {
        options,
        definition: Definition::new(url.clone()),
        visited: HashSet::new(),
    };

    parser.parse_document(url, None)?;

    if options.autoblend {
        parser.autoblend();
    }

    parser.resolve_imports()?;
    parser.check_references()?;
    parser.build_services()?;

    Ok(parser.definition)
}

impl Parser<'_> {
    fn parse_document(&mut self, url: Url, namespace: Option<String>) -> Result<(), error::Error> {
        if !self.visited.insert(url.clone()) {
            return Ok(());
        }

        tracing::debug!(%url, "Parsing document");

        let content = fetch(&url)?;
        let mut reader = Reader::from_reader(content.as_slice());
        reader.trim_text(true);

        let mut document = Document {
            url,
            include_namespace: namespace,
            stack: Vec::new(),
            namespaces: CurrentNamespaces::default(),
            pending: Vec::new(),
        };
        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) => self.handle_start(&mut document, &reader, &start)?,
                Event::End(..) => self.handle_end(&mut document)?,

                Event::Empty(start) => {
                    self.handle_start(&mut document, &reader, &start)?;
                    self.handle_end(&mut document)?;
                }

                Event::Text(text) => handle_text(&mut document, &reader, &text)?,
                Event::Eof => break,
                _ => (),
            }

            buffer.clear();
        }

        for pending in std::mem::take(&mut document.pending) {
            self.parse_document(pending.url, pending.namespace)?;
        }

        Ok(())
    }

    fn start_schema(&mut self, document: &Document) -> usize {
        let schema = Schema::new(
            document.namespaces.target().to_owned(),
            document.url.clone(),
        );
        self.definition.schemas.push(schema);
        self.definition.schemas.len() - 1
    }

    fn handle_start<B: BufRead>(
        &mut self,
        document: &mut Document,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<(), error::Error> {
        let (prefix, local_name) = split_namespaced_name(reader.decode(start.name())?);
        let (prefix, local_name) = (prefix.map(ToOwned::to_owned), local_name.to_owned());

        let mut scope = Scope::default();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;

            match split_namespaced_name(key) {
                (None, "xmlns") => {
                    scope
                        .prefixes
                        .insert(None, attribute.unescape_and_decode_value(reader)?);
                }
                (Some("xmlns"), prefix) => {
                    scope.prefixes.insert(
                        Some(prefix.to_owned()),
                        attribute.unescape_and_decode_value(reader)?,
                    );
                }
                _ => (),
            }
        }

        if local_name == "definitions" || local_name == "schema" {
            let [namespace] = get_attributes(reader, start.attributes(), ["targetNamespace"])?;
            scope.target = Some(
                namespace
                    .or_else(|| document.include_namespace.clone())
                    .unwrap_or_default(),
            );
        }

        document.namespaces.push(scope);

        let element_namespace = document
            .namespaces
            .prefix(prefix.as_deref())
            .map(ToOwned::to_owned);
        let mut state = document.stack.pop();
        let mut new_state = ParseState::Other;
        let namespaces = &document.namespaces;

        match (&mut state, local_name.as_str()) {
            (None, "definitions") => {
                if self.definition.target_namespace.is_empty() {
                    self.definition.target_namespace = namespaces.target().to_owned();
                }

                new_state = ParseState::Definitions;
            }

            (None | Some(ParseState::Types), "schema") => {
                new_state = ParseState::Schema {
                    index: self.start_schema(document),
                };
            }

            (None, other) => return Err(error::Error::UnexpectedRoot(other.to_owned())),

            (Some(ParseState::Definitions), "import") => {
                let [location] = get_attributes(reader, start.attributes(), ["location"])?;

                if let Some(location) = location {
                    document.pending.push(Pending {
                        url: document.url.join(&location)?,
                        namespace: None,
                    });
                }
            }

            (Some(ParseState::Definitions), "types") => new_state = ParseState::Types,

            (Some(ParseState::Definitions), "message") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::Message {
                    name: namespaces.target_namespaced(required(name, "message", "name")?),
                    parts: Vec::new(),
                };
            }

            (Some(ParseState::Definitions), "portType") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::PortType {
                    name: namespaces.target_namespaced(required(name, "portType", "name")?),
                    operations: Vec::new(),
                };
            }

            (Some(ParseState::Definitions), "binding") => {
                let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                new_state = ParseState::Binding {
                    name: namespaces.target_namespaced(required(name, "binding", "name")?),
                    ty: namespaces.resolve(&required(ty, "binding", "type")?)?,
                    transport: None,
                    style: None,
                    operations: Vec::new(),
                };
            }

            (Some(ParseState::Definitions), "service") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::Service {
                    name: required(name, "service", "name")?,
                    ports: Vec::new(),
                };
            }

            (Some(ParseState::Schema { index }), "import") => {
                let [namespace, location] = get_attributes(
                    reader,
                    start.attributes(),
                    ["namespace", "schemaLocation"],
                )?;

                if let Some(namespace) = namespace {
                    if let Some(location) = &location {
                        document.pending.push(Pending {
                            url: document.url.join(location)?,
                            namespace: None,
                        });
                    }

                    self.definition.schemas[*index]
                        .imports
                        .push(SchemaImport { namespace, location });
                }
            }

            (Some(ParseState::Schema { .. }), "include") => {
                let [location] = get_attributes(reader, start.attributes(), ["schemaLocation"])?;

                document.pending.push(Pending {
                    url: document
                        .url
                        .join(&required(location, "include", "schemaLocation")?)?,
                    namespace: Some(namespaces.target().to_owned()),
                });
            }

            (Some(ParseState::Schema { .. }), "element") => {
                let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                new_state = ParseState::Element {
                    name: required(name, "element", "name")?,
                    ty: ty.map(|ty| namespaces.resolve(&ty)).transpose()?,
                    kind: None,
                };
            }

            (Some(ParseState::Schema { .. }), "complexType") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::ComplexType {
                    name: Some(required(name, "complexType", "name")?),
                    kind: None,
                };
            }

            (Some(ParseState::Schema { .. }), "simpleType") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::SimpleType {
                    name: Some(required(name, "simpleType", "name")?),
                    base: None,
                };
            }

            (
                Some(ParseState::Element { .. } | ParseState::SequenceElement { .. }),
                "complexType",
            ) => {
                new_state = ParseState::ComplexType {
                    name: None,
                    kind: None,
                }
            }

            (
                Some(ParseState::Element { .. } | ParseState::SequenceElement { .. }),
                "simpleType",
            ) => {
                new_state = ParseState::SimpleType {
                    name: None,
                    base: None,
                }
            }

            (
                Some(
                    ParseState::ComplexType { .. }
                    | ParseState::Derivation { .. }
                    | ParseState::Sequence(..),
                ),
                "sequence" | "all" | "choice",
            ) => new_state = ParseState::Sequence(Vec::new()),

            (Some(ParseState::ComplexType { .. }), "complexContent" | "simpleContent") => {
                new_state = ParseState::Content {
                    simple: local_name == "simpleContent",
                    kind: None,
                }
            }

            (Some(ParseState::Content { .. }), "extension" | "restriction") => {
                let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                new_state = ParseState::Derivation {
                    base: namespaces.resolve(&required(base, &local_name, "base")?)?,
                    extension: local_name == "extension",
                    fields: Vec::new(),
                };
            }

            (Some(ParseState::Sequence(..)), "element") => {
                let [name, ty, reference] =
                    get_attributes(reader, start.attributes(), ["name", "type", "ref"])?;

                new_state = if let Some(reference) = reference {
                    let reference = namespaces.resolve(&reference)?;
                    ParseState::SequenceElement {
                        name: reference.name.clone(),
                        kind: Some(FieldKind::Ref(reference)),
                    }
                } else {
                    ParseState::SequenceElement {
                        name: required(name, "element", "name")?,
                        kind: ty
                            .map(|ty| namespaces.resolve(&ty).map(FieldKind::Type))
                            .transpose()?,
                    }
                };
            }

            (Some(ParseState::SimpleType { base, .. }), "restriction") => {
                let [restriction_base] = get_attributes(reader, start.attributes(), ["base"])?;

                if let Some(restriction_base) = restriction_base {
                    *base = Some(namespaces.resolve(&restriction_base)?);
                }
            }

            (Some(ParseState::Message { parts, .. }), "part") => {
                let [name, element, ty] =
                    get_attributes(reader, start.attributes(), ["name", "element", "type"])?;

                parts.push(Part {
                    name: required(name, "part", "name")?,
                    element: element.map(|name| namespaces.resolve(&name)).transpose()?,
                    ty: ty.map(|name| namespaces.resolve(&name)).transpose()?,
                });
            }

            (Some(ParseState::PortType { .. }), "operation") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::Operation {
                    name: required(name, "operation", "name")?,
                    documentation: None,
                    input: None,
                    output: None,
                }
            }

            (Some(ParseState::Operation { .. }), "documentation") => {
                new_state = ParseState::Documentation(String::new())
            }

            (Some(ParseState::Operation { input, output, .. }), "input" | "output") => {
                let [message] = get_attributes(reader, start.attributes(), ["message"])?;
                let message = namespaces.resolve(&required(message, &local_name, "message")?)?;

                if local_name == "input" {
                    *input = Some(message);
                } else {
                    *output = Some(message);
                }
            }

            (Some(ParseState::Binding { transport, style, .. }), "binding")
                if element_namespace.as_deref() == Some(SOAP_BINDING_NAMESPACE) =>
            {
                let [binding_transport, binding_style] =
                    get_attributes(reader, start.attributes(), ["transport", "style"])?;

                *transport = binding_transport.or_else(|| Some(String::new()));
                *style = binding_style.as_deref().and_then(Style::parse);
            }

            (Some(ParseState::Binding { .. }), "operation") => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                new_state = ParseState::BindingOperation {
                    name: required(name, "operation", "name")?,
                    action: String::new(),
                    style: None,
                    namespace: None,
                }
            }

            (Some(ParseState::BindingOperation { action, style, .. }), "operation") => {
                let [soap_action, operation_style] =
                    get_attributes(reader, start.attributes(), ["soapAction", "style"])?;

                *action = soap_action.unwrap_or_default();
                *style = operation_style.as_deref().and_then(Style::parse);
            }

            (Some(ParseState::BindingOperation { .. }), "input") => {
                new_state = ParseState::BindingInput { namespace: None }
            }

            (Some(ParseState::BindingInput { namespace }), "body") => {
                let [body_namespace] = get_attributes(reader, start.attributes(), ["namespace"])?;
                *namespace = body_namespace;
            }

            (Some(ParseState::Service { .. }), "port") => {
                let [name, binding] =
                    get_attributes(reader, start.attributes(), ["name", "binding"])?;

                new_state = ParseState::Port {
                    name: required(name, "port", "name")?,
                    binding: namespaces.resolve(&required(binding, "port", "binding")?)?,
                    location: None,
                };
            }

            (Some(ParseState::Port { location, .. }), "address") => {
                let [address] = get_attributes(reader, start.attributes(), ["location"])?;
                *location = Some(required(address, "address", "location")?);
            }

            (_, other) => tracing::trace!(element = other, "Skipping element"),
        }

        document.stack.extend(state);
        document.stack.push(new_state);
        Ok(())
    }

    fn handle_end(&mut self, document: &mut Document) -> Result<(), error::Error> {
        document.namespaces.pop();

        let finished_state = document.stack.pop();
        let next_state = document.stack.last_mut();
        let namespaces = &document.namespaces;

        match (finished_state, next_state) {
            (Some(ParseState::Element { name, ty, kind }), Some(ParseState::Schema { index })) => {
                let kind = kind
                    .or_else(|| ty.map(TypeKind::Alias))
                    .unwrap_or_else(|| TypeKind::Struct(Vec::new()));

                self.definition.schemas[*index]
                    .elements
                    .push(super::types::Type {
                        name: namespaces.target_namespaced(name),
                        kind,
                    });
            }

            (Some(ParseState::ComplexType { name, kind }), next_state) => {
                let kind = kind.unwrap_or_else(|| TypeKind::Struct(Vec::new()));

                match next_state {
                    Some(ParseState::Schema { index }) => {
                        if let Some(name) = name {
                            self.definition.schemas[*index]
                                .types
                                .push(super::types::Type {
                                    name: namespaces.target_namespaced(name),
                                    kind,
                                });
                        }
                    }
                    Some(ParseState::Element { kind: element, .. }) => *element = Some(kind),
                    Some(ParseState::SequenceElement { kind: field, .. }) => {
                        *field = Some(FieldKind::Inline(kind))
                    }
                    _ => (),
                }
            }

            (Some(ParseState::SimpleType { name, base }), next_state) => {
                let base = base.unwrap_or_else(|| xsd("string"));

                match next_state {
                    Some(ParseState::Schema { index }) => {
                        if let Some(name) = name {
                            self.definition.schemas[*index]
                                .types
                                .push(super::types::Type {
                                    name: namespaces.target_namespaced(name),
                                    kind: TypeKind::Alias(base),
                                });
                        }
                    }
                    Some(ParseState::Element { ty, .. }) => *ty = Some(base),
                    Some(ParseState::SequenceElement { kind, .. }) => {
                        *kind = Some(FieldKind::Type(base))
                    }
                    _ => (),
                }
            }

            (Some(ParseState::Sequence(fields)), next_state) => match next_state {
                Some(ParseState::ComplexType { kind, .. }) => {
                    *kind = Some(TypeKind::Struct(fields))
                }
                Some(
                    ParseState::Derivation {
                        fields: outer, ..
                    }
                    | ParseState::Sequence(outer),
                ) => outer.extend(fields),
                _ => (),
            },

            (
                Some(ParseState::SequenceElement { name, kind }),
                Some(ParseState::Sequence(fields)),
            ) => fields.push(Field {
                name,
                kind: kind.unwrap_or_else(|| FieldKind::Type(xsd("anyType"))),
            }),

            (
                Some(ParseState::Derivation {
                    base,
                    extension,
                    fields,
                }),
                Some(ParseState::Content { simple, kind }),
            ) => {
                *kind = Some(if *simple {
                    TypeKind::Alias(base)
                } else if extension {
                    TypeKind::Extension { base, fields }
                } else {
                    TypeKind::Struct(fields)
                });
            }

            (
                Some(ParseState::Content { kind, .. }),
                Some(ParseState::ComplexType {
                    kind: complex_kind, ..
                }),
            ) => {
                if kind.is_some() {
                    *complex_kind = kind;
                }
            }

            (Some(ParseState::Message { name, parts }), _) => {
                self.definition.messages.push(Message { name, parts })
            }

            (
                Some(ParseState::Operation {
                    name,
                    documentation,
                    input,
                    output,
                }),
                Some(ParseState::PortType { operations, .. }),
            ) => operations.push(Operation {
                name,
                documentation,
                input,
                output,
            }),

            (Some(ParseState::PortType { name, operations }), _) => {
                self.definition
                    .port_types
                    .push(PortType { name, operations })
            }

            (
                Some(ParseState::Documentation(text)),
                Some(ParseState::Operation { documentation, .. }),
            ) => *documentation = Some(text.trim().to_owned()),

            (
                Some(ParseState::BindingInput { namespace }),
                Some(ParseState::BindingOperation {
                    namespace: operation_namespace,
                    ..
                }),
            ) => *operation_namespace = namespace,

            (
                Some(ParseState::BindingOperation {
                    name,
                    action,
                    style,
                    namespace,
                }),
                Some(ParseState::Binding { operations, .. }),
            ) => operations.push(BindingOperation {
                name,
                action,
                style,
                namespace,
            }),

            (
                Some(ParseState::Binding {
                    name,
                    ty,
                    transport,
                    style,
                    operations,
                }),
                _,
            ) => self.definition.bindings.push(Binding {
                name,
                ty,
                transport,
                style,
                operations,
            }),

            (
                Some(ParseState::Port {
                    name,
                    binding,
                    location,
                }),
                Some(ParseState::Service { ports, .. }),
            ) => ports.push(PortDecl {
                name,
                binding,
                location,
            }),

            (Some(ParseState::Service { name, ports }), _) => self
                .definition
                .service_decls
                .push(ServiceDecl { name, ports }),

            _ => (),
        }

        Ok(())
    }

    /// Makes every schema of the WSDL document import every other one.
    fn autoblend(&mut self) {
        let root = self.definition.url.clone();
        let namespaces: Vec<String> = self
            .definition
            .schemas
            .iter()
            .filter(|schema| schema.location == root)
            .map(|schema| schema.target_namespace.clone())
            .collect();

        for schema in self
            .definition
            .schemas
            .iter_mut()
            .filter(|schema| schema.location == root)
        {
            for namespace in &namespaces {
                if *namespace != schema.target_namespace && !schema.imports_namespace(namespace) {
                    schema.imports.push(SchemaImport {
                        namespace: namespace.clone(),
                        location: None,
                    });
                }
            }
        }
    }

    /// Applies the doctor and loads imported namespaces that are not yet
    /// present, until nothing new can be loaded.
    fn resolve_imports(&mut self) -> Result<(), error::Error> {
        loop {
            if let Some(doctor) = self.options.doctor {
                for schema in &mut self.definition.schemas {
                    doctor.examine(schema);
                }
            }

            let missing: Vec<(String, Option<String>, Url)> = self
                .definition
                .schemas
                .iter()
                .flat_map(|schema| {
                    schema
                        .imports
                        .iter()
                        .map(move |import| (import, &schema.location))
                })
                .filter(|(import, _)| !self.definition.has_namespace(&import.namespace))
                .map(|(import, base)| {
                    (
                        import.namespace.clone(),
                        import.location.clone(),
                        base.clone(),
                    )
                })
                .collect();

            let mut loaded = false;
            for (namespace, location, base) in missing {
                let location = match location.or_else(|| self.options.locations.location(&namespace))
                {
                    Some(location) => location,
                    None => {
                        tracing::debug!(%namespace, "No location known for imported namespace");
                        continue;
                    }
                };

                let url = base.join(&location)?;
                if !self.visited.contains(&url) {
                    self.parse_document(url, None)?;
                    loaded = true;
                }
            }

            if !loaded {
                return Ok(());
            }
        }
    }

    fn check_references(&self) -> Result<(), error::Error> {
        for schema in &self.definition.schemas {
            for component in schema.elements.iter().chain(&schema.types) {
                self.check_kind(schema, &component.kind)?;
            }
        }

        for message in &self.definition.messages {
            for part in &message.parts {
                if let Some(element) = &part.element {
                    if self.definition.element(element).is_none() {
                        return Err(error::Error::TypeNotFound(element.clone()));
                    }
                }

                if let Some(ty) = &part.ty {
                    if ty.namespace != XSD_NAMESPACE && self.definition.named_type(ty).is_none() {
                        return Err(error::Error::TypeNotFound(ty.clone()));
                    }
                }
            }
        }

        Ok(())
    }

    fn check_kind(&self, schema: &Schema, kind: &TypeKind) -> Result<(), error::Error> {
        match kind {
            TypeKind::Struct(fields) => self.check_fields(schema, fields),
            TypeKind::Extension { base, fields } => {
                self.check_type(schema, base)?;
                self.check_fields(schema, fields)
            }
            TypeKind::Alias(name) => self.check_type(schema, name),
        }
    }

    fn check_fields(&self, schema: &Schema, fields: &[Field]) -> Result<(), error::Error> {
        for field in fields {
            match &field.kind {
                FieldKind::Type(name) => self.check_type(schema, name)?,
                FieldKind::Ref(name) => {
                    if !schema.sees(&name.namespace) || self.definition.element(name).is_none() {
                        return Err(error::Error::TypeNotFound(name.clone()));
                    }
                }
                FieldKind::Inline(kind) => self.check_kind(schema, kind)?,
            }
        }

        Ok(())
    }

    fn check_type(&self, schema: &Schema, name: &QName) -> Result<(), error::Error> {
        if name.namespace == XSD_NAMESPACE {
            return Ok(());
        }

        if schema.sees(&name.namespace) && self.definition.named_type(name).is_some() {
            Ok(())
        } else {
            Err(error::Error::TypeNotFound(name.clone()))
        }
    }

    fn build_services(&mut self) -> Result<(), error::Error> {
        let mut services = Vec::new();

        for service in &self.definition.service_decls {
            let mut ports = Vec::new();

            for port in &service.ports {
                let binding = self
                    .definition
                    .bindings
                    .iter()
                    .find(|binding| binding.name == port.binding)
                    .ok_or_else(|| error::Error::UnknownReference {
                        kind: "binding",
                        name: port.binding.clone(),
                    })?;

                if binding.transport.is_none() {
                    tracing::debug!(port = %port.name, "Skipping port without a SOAP binding");
                    continue;
                }

                ports.push(Port {
                    name: port.name.clone(),
                    methods: self.methods(binding, port.location.as_deref())?,
                });
            }

            services.push(Service {
                name: service.name.clone(),
                ports,
            });
        }

        self.definition.services = services;
        Ok(())
    }

    fn methods(&self, binding: &Binding, location: Option<&str>) -> Result<Vec<Method>, error::Error> {
        let port_type = self
            .definition
            .port_types
            .iter()
            .find(|port_type| port_type.name == binding.ty)
            .ok_or_else(|| error::Error::UnknownReference {
                kind: "portType",
                name: binding.ty.clone(),
            })?;

        let mut methods = Vec::new();

        for operation in &binding.operations {
            let abstract_operation = port_type
                .operations
                .iter()
                .find(|candidate| candidate.name == operation.name)
                .ok_or_else(|| error::Error::UnknownReference {
                    kind: "operation",
                    name: QName::new(port_type.name.namespace.clone(), operation.name.clone()),
                })?;

            let message = abstract_operation
                .input
                .as_ref()
                .map(|name| {
                    self.definition
                        .message(name)
                        .ok_or_else(|| error::Error::UnknownReference {
                            kind: "message",
                            name: name.clone(),
                        })
                })
                .transpose()?;

            let style = operation
                .style
                .or(binding.style)
                .unwrap_or(Style::Document);

            let (input, parameters) = match style {
                Style::Rpc => (
                    None,
                    message
                        .map(|message| message.parts.iter().map(|part| part.name.clone()).collect())
                        .unwrap_or_default(),
                ),
                Style::Document => {
                    let input = message
                        .and_then(|message| message.parts.first())
                        .and_then(|part| part.element.clone());
                    let parameters = input
                        .as_ref()
                        .and_then(|name| self.definition.element(name))
                        .map(|element| self.definition.field_names(&element.kind))
                        .unwrap_or_default();
                    (input, parameters)
                }
            };

            methods.push(Method {
                name: operation.name.clone(),
                soap_action: operation.action.clone(),
                style,
                input,
                namespace: operation
                    .namespace
                    .clone()
                    .unwrap_or_else(|| self.definition.target_namespace.clone()),
                parameters,
                location: location.map(ToOwned::to_owned),
            });
        }

        Ok(methods)
    }
}

fn handle_text<B: BufRead>(
    document: &mut Document,
    reader: &Reader<B>,
    text: &BytesText<'_>,
) -> Result<(), error::Error> {
    if let Some(ParseState::Documentation(content)) = document.stack.last_mut() {
        content.push_str(&text.unescape_and_decode(reader)?);
    }

    Ok(())
}
