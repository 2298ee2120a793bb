use indexmap::IndexMap;
use std::fmt;
use sudslib_soap::Element;

/// A keyword argument or return value as a table sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    None,
    Str(String),
    Dict(IndexMap<String, String>),
    Xml(Element),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<IndexMap<String, String>> for Value {
    fn from(value: IndexMap<String, String>) -> Self {
        Self::Dict(value)
    }
}

impl From<Element> for Value {
    fn from(value: Element) -> Self {
        Self::Xml(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Str(value) => f.write_str(value),
            Self::Dict(entries) => {
                f.write_str("{")?;
                for (position, (key, value)) in entries.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Self::Xml(element) => write!(f, "{}", element),
        }
    }
}
