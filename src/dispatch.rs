//! Runs keywords by name with table-style arguments.

use crate::{backend::SoapBackend, error::KeywordError, value::Value, SudsLibrary};

/// Every keyword [`SudsLibrary::run_keyword`] knows.
pub const KEYWORDS: &[&str] = &[
    "Create Client",
    "Switch Client",
    "Set Service",
    "Set Port",
    "Set Proxies",
    "Set Headers",
    "Set Soap Headers",
    "Set Return Xml",
    "Set Http Authentication",
    "Set Location",
    "Add Doctor Import",
    "Bind Schema To Location",
    "Call Soap Method",
    "Specific Soap Call",
    "Call Soap Method Expecting Fault",
    "Set Soap Logging",
    "Get Last Sent",
    "Get Last Received",
];

/// Keyword names match ignoring case, spaces and underscores.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Typed access to the arguments of one keyword call.
struct Args<'a> {
    keyword: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn new(
        keyword: &'static str,
        values: &'a [Value],
        min: usize,
        max: Option<usize>,
    ) -> Result<Self, KeywordError> {
        let count = values.len();
        let expected = match max {
            Some(max) if min == max => min.to_string(),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };

        if count < min || max.map_or(false, |max| count > max) {
            return Err(KeywordError::Argument(format!(
                "Keyword '{}' expected {} arguments, got {}.",
                keyword, expected, count
            )));
        }

        Ok(Self { keyword, values })
    }

    fn string(&self, index: usize) -> Result<&'a str, KeywordError> {
        match self.values.get(index) {
            Some(Value::Str(value)) => Ok(value),
            Some(other) => Err(KeywordError::Argument(format!(
                "Keyword '{}' expected a string as argument {}, got '{}'.",
                self.keyword,
                index + 1,
                other
            ))),
            None => Err(KeywordError::Argument(format!(
                "Keyword '{}' is missing argument {}.",
                self.keyword,
                index + 1
            ))),
        }
    }

    /// A string argument that may be left out or given as `None`.
    fn optional(&self, index: usize) -> Result<Option<&'a str>, KeywordError> {
        match self.values.get(index) {
            None | Some(Value::None) => Ok(None),
            Some(_) => self.string(index).map(Some),
        }
    }

    fn or(&self, index: usize, default: &'a str) -> Result<&'a str, KeywordError> {
        Ok(self.optional(index)?.unwrap_or(default))
    }

    fn strings_from(&self, index: usize) -> Result<Vec<&'a str>, KeywordError> {
        (index..self.values.len())
            .map(|index| self.string(index))
            .collect()
    }

    fn values_from(&self, index: usize) -> &'a [Value] {
        self.values.get(index..).unwrap_or_default()
    }
}

impl<B: SoapBackend> SudsLibrary<B> {
    /// Runs the keyword called `name`. Keywords that return something give
    /// back a value.
    pub fn run_keyword(
        &mut self,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, KeywordError> {
        let keyword = KEYWORDS
            .iter()
            .copied()
            .find(|keyword| normalize(keyword) == normalize(name))
            .ok_or_else(|| {
                KeywordError::NotFound(format!("No keyword with name '{}' found.", name))
            })?;

        tracing::debug!(keyword, arguments = args.len(), "Running keyword");

        let args = |min, max| Args::new(keyword, args, min, max);

        match keyword {
            "Create Client" => {
                let args = args(1, Some(3))?;
                let index =
                    self.create_client(args.string(0)?, args.optional(1)?, args.or(2, "False")?)?;
                Ok(Some(Value::Str(index.to_string())))
            }
            "Switch Client" => {
                let args = args(1, Some(1))?;
                self.switch_client(args.string(0)?).map(|()| None)
            }
            "Set Service" => {
                let args = args(1, Some(1))?;
                self.set_service(args.string(0)?).map(|()| None)
            }
            "Set Port" => {
                let args = args(1, Some(1))?;
                self.set_port(args.string(0)?).map(|()| None)
            }
            "Set Proxies" => {
                let args = args(0, None)?;
                self.set_proxies(&args.strings_from(0)?).map(|()| None)
            }
            "Set Headers" => {
                let args = args(0, None)?;
                self.set_headers(args.values_from(0)).map(|()| None)
            }
            "Set Soap Headers" => {
                let args = args(0, None)?;
                self.set_soap_headers(args.values_from(0)).map(|()| None)
            }
            "Set Return Xml" => {
                let args = args(1, Some(1))?;
                self.set_return_xml(args.string(0)?).map(|()| None)
            }
            "Set Http Authentication" => {
                let args = args(2, Some(3))?;
                self.set_http_authentication(
                    args.string(0)?,
                    args.string(1)?,
                    args.or(2, "STANDARD")?,
                )
                .map(|()| None)
            }
            "Set Location" => {
                let args = args(1, None)?;
                self.set_location(
                    args.string(0)?,
                    args.or(1, "-1")?,
                    &args.strings_from(2)?,
                )
                .map(|()| None)
            }
            "Add Doctor Import" => {
                let args = args(1, None)?;
                self.add_doctor_import(
                    args.string(0)?,
                    args.optional(1)?,
                    &args.strings_from(2)?,
                );
                Ok(None)
            }
            "Bind Schema To Location" => {
                let args = args(2, Some(2))?;
                self.bind_schema_to_location(args.string(0)?, args.string(1)?);
                Ok(None)
            }
            "Call Soap Method" => {
                let args = args(1, None)?;
                self.call_soap_method(args.string(0)?, &args.strings_from(1)?)
            }
            "Specific Soap Call" => {
                let args = args(3, None)?;
                self.specific_soap_call(
                    args.optional(0)?,
                    args.optional(1)?,
                    args.string(2)?,
                    &args.strings_from(3)?,
                )
            }
            "Call Soap Method Expecting Fault" => {
                let args = args(1, None)?;
                self.call_soap_method_expecting_fault(args.string(0)?, &args.strings_from(1)?)
                    .map(Some)
            }
            "Set Soap Logging" => {
                let args = args(1, Some(1))?;
                self.set_soap_logging(args.string(0)?).map(|()| None)
            }
            "Get Last Sent" => {
                args(0, Some(0))?;
                self.get_last_sent().map(|xml| Some(Value::Str(xml)))
            }
            "Get Last Received" => {
                args(0, Some(0))?;
                self.get_last_received().map(|xml| Some(Value::Str(xml)))
            }
            _ => Err(KeywordError::NotFound(format!(
                "No keyword with name '{}' found.",
                name
            ))),
        }
    }
}
