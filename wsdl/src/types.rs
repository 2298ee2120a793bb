use std::fmt;
use url::Url;

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const SOAP_ENCODING_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// A name qualified by the namespace it was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Struct(Vec<Field>),
    Extension { base: QName, fields: Vec<Field> },
    Alias(QName),
}

/// A named schema component: either a top-level `element` or a named type.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub name: QName,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Type(QName),
    Ref(QName),
    Inline(TypeKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaImport {
    pub namespace: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub target_namespace: String,
    pub location: Url,
    pub imports: Vec<SchemaImport>,
    pub elements: Vec<Type>,
    pub types: Vec<Type>,
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub element: Option<QName>,
    pub ty: Option<QName>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: QName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<QName>,
    pub output: Option<QName>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: QName,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub action: String,
    pub style: Option<Style>,
    /// `namespace` of the input `soap:body`, used by rpc-style operations.
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: QName,
    pub ty: QName,
    pub transport: Option<String>,
    pub style: Option<Style>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct PortDecl {
    pub name: String,
    pub binding: QName,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceDecl {
    pub name: String,
    pub ports: Vec<PortDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Document,
    Rpc,
}

/// A callable operation on a port, with its own endpoint location.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub soap_action: String,
    pub style: Style,
    /// Body element of a document-style request.
    pub input: Option<QName>,
    /// Namespace of the wrapper element of an rpc-style request.
    pub namespace: String,
    /// Ordered argument names.
    pub parameters: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub url: Url,
    pub target_namespace: String,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub service_decls: Vec<ServiceDecl>,
    pub services: Vec<Service>,
}

impl QName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

impl Style {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(Self::Document),
            "rpc" => Some(Self::Rpc),
            _ => None,
        }
    }
}

impl Schema {
    pub fn new(target_namespace: String, location: Url) -> Self {
        Self {
            target_namespace,
            location,
            imports: Vec::new(),
            elements: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn imports_namespace(&self, namespace: &str) -> bool {
        self.imports.iter().any(|import| import.namespace == namespace)
    }

    /// True when components of `namespace` may be referenced from this schema.
    pub fn sees(&self, namespace: &str) -> bool {
        namespace == XSD_NAMESPACE
            || namespace == self.target_namespace
            || self.imports_namespace(namespace)
    }
}

impl Service {
    /// Overrides the endpoint of every method of every port, or only of the
    /// methods named in `names`.
    pub fn set_location(&mut self, url: &str, names: Option<&[String]>) {
        for port in &mut self.ports {
            for method in &mut port.methods {
                if names.map_or(true, |names| names.contains(&method.name)) {
                    method.location = Some(url.to_owned());
                }
            }
        }
    }
}

impl Port {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }
}

impl Definition {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            target_namespace: String::new(),
            schemas: Vec::new(),
            messages: Vec::new(),
            port_types: Vec::new(),
            bindings: Vec::new(),
            service_decls: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        namespace == XSD_NAMESPACE
            || self
                .schemas
                .iter()
                .any(|schema| schema.target_namespace == namespace)
    }

    pub fn element(&self, name: &QName) -> Option<&Type> {
        self.schemas
            .iter()
            .flat_map(|schema| schema.elements.iter())
            .find(|element| &element.name == name)
    }

    pub fn named_type(&self, name: &QName) -> Option<&Type> {
        self.schemas
            .iter()
            .flat_map(|schema| schema.types.iter())
            .find(|ty| &ty.name == name)
    }

    pub fn message(&self, name: &QName) -> Option<&Message> {
        self.messages.iter().find(|message| &message.name == name)
    }

    /// Names of the child elements of `kind`, following aliases and
    /// extension bases.
    pub fn field_names(&self, kind: &TypeKind) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_field_names(kind, &mut names, 0);
        names
    }

    fn collect_field_names(&self, kind: &TypeKind, names: &mut Vec<String>, depth: usize) {
        // Guards against self-referencing type chains.
        if depth > 32 {
            return;
        }

        match kind {
            TypeKind::Struct(fields) => names.extend(fields.iter().map(|field| field.name.clone())),
            TypeKind::Extension { base, fields } => {
                if let Some(base) = self.named_type(base) {
                    self.collect_field_names(&base.kind, names, depth + 1);
                }
                names.extend(fields.iter().map(|field| field.name.clone()));
            }
            TypeKind::Alias(name) => {
                if let Some(ty) = self.named_type(name) {
                    self.collect_field_names(&ty.kind, names, depth + 1);
                }
            }
        }
    }
}
