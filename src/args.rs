//! Normalisation of string-typed keyword arguments.

use crate::{error::KeywordError, value::Value};

use indexmap::IndexMap;
use std::str::FromStr;
use sudslib_soap::Selector;

/// Parses a boolean written in a table cell.
///
/// `true`, `yes`, `on` and `1` are true; `false`, `no`, `off`, `0` and the
/// empty string are false. Case is ignored. Anything else is rejected.
pub fn to_bool(value: &str) -> Result<bool, KeywordError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(KeywordError::Argument(format!(
            "Can't convert '{}' to a boolean value.",
            value
        ))),
    }
}

/// Decimal digits select by position, anything else by name.
pub fn parse_selector(value: &str) -> Result<Selector, KeywordError> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Ok(Selector::Name(value.to_owned()));
    }

    value.parse().map(Selector::Index).map_err(|_| {
        KeywordError::Argument(format!("Index '{}' is too large.", value))
    })
}

/// Builds a mapping from a flat `key, value, key, value` list. Later keys
/// overwrite earlier ones.
pub fn to_pairs<S: AsRef<str>>(
    items: &[S],
    what: &str,
) -> Result<IndexMap<String, String>, KeywordError> {
    if items.len() % 2 != 0 {
        return Err(KeywordError::Argument(format!(
            "There should be an even number of {} pairs.",
            what
        )));
    }

    Ok(items
        .chunks(2)
        .map(|pair| (pair[0].as_ref().to_owned(), pair[1].as_ref().to_owned()))
        .collect())
}

/// The two shapes `Set Headers` accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderArgs {
    Mapping(IndexMap<String, String>),
    Pairs(IndexMap<String, String>),
}

impl HeaderArgs {
    pub fn parse(args: &[Value]) -> Result<Self, KeywordError> {
        if let [Value::Dict(mapping)] = args {
            return Ok(Self::Mapping(mapping.clone()));
        }

        if args.len() % 2 != 0 {
            return Err(KeywordError::argument(
                "There should be an even number of name-value pairs.",
            ));
        }

        let strings = args
            .iter()
            .map(|arg| {
                arg.as_str().ok_or_else(|| {
                    KeywordError::Argument(format!("Header name or value '{}' is not a string.", arg))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        to_pairs(&strings, "name-value").map(Self::Pairs)
    }

    pub fn into_headers(self) -> IndexMap<String, String> {
        match self {
            Self::Mapping(headers) | Self::Pairs(headers) => headers,
        }
    }
}

/// HTTP authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// Credentials are sent after a `401` challenge.
    Standard,
    AlwaysSend,
    Ntlm,
}

impl FromStr for AuthType {
    type Err = KeywordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "ALWAYS_SEND" => Ok(Self::AlwaysSend),
            "NTLM" => Ok(Self::Ntlm),
            _ => Err(KeywordError::Argument(format!(
                "'{}' is not a supported type.",
                value
            ))),
        }
    }
}

/// Parses a signed service index.
pub fn parse_index(value: &str) -> Result<i64, KeywordError> {
    value.trim().parse().map_err(|_| {
        KeywordError::Argument(format!("'{}' is not a valid service index.", value))
    })
}
