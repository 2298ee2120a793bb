//! Pipe-separated keyword tables.
//!
//! ```text
//! | Create Client      | ${CURDIR}/billing.wsdl |
//! | ${reply} =         | Call Soap Method       | SendInvoice | ACME | 12 |
//! | Should Be Equal    | ${reply}               | INV-7       | # a comment |
//! ```

use indexmap::IndexMap;
use sudslib::Value;

use crate::Error;

/// One keyword row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub line: usize,
    /// Variable the keyword result is stored in.
    pub assign: Option<String>,
    pub keyword: String,
    pub args: Vec<String>,
}

/// Name of `cell` when it is exactly `${name}`.
fn variable_name(cell: &str) -> Option<&str> {
    cell.strip_prefix("${")?.strip_suffix('}')
}

fn assignment(cell: &str) -> Option<String> {
    let target = cell.strip_suffix('=')?.trim_end();
    variable_name(target).map(str::to_owned)
}

/// Reads every keyword row of `source`. Lines not starting with `|`, rows
/// whose first cell starts with `*` and empty rows are ignored.
pub fn parse(source: &str) -> Result<Vec<Step>, Error> {
    let mut steps = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let line_number = number + 1;
        let line = line.trim();
        let row = match line.strip_prefix('|') {
            Some(row) => row,
            None => continue,
        };

        let mut cells: Vec<&str> = row
            .split('|')
            .map(str::trim)
            .take_while(|cell| !cell.starts_with('#'))
            .collect();

        while cells.last().map_or(false, |cell| cell.is_empty()) {
            cells.pop();
        }

        let first = match cells.first() {
            Some(first) if !first.starts_with('*') => *first,
            _ => continue,
        };

        let (assign, rest) = match assignment(first) {
            Some(name) => (Some(name), &cells[1..]),
            None => (None, &cells[..]),
        };

        let (keyword, args) = rest.split_first().ok_or_else(|| Error::Table {
            line: line_number,
            message: "Assignment without a keyword".to_owned(),
        })?;

        steps.push(Step {
            line: line_number,
            assign,
            keyword: (*keyword).to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        });
    }

    Ok(steps)
}

/// Values stored by earlier rows, plus the built-in ones.
#[derive(Debug)]
pub struct Variables {
    values: IndexMap<String, Value>,
}

impl Variables {
    pub fn new(curdir: &str) -> Self {
        let mut values = IndexMap::new();
        values.insert("None".to_owned(), Value::None);
        values.insert("EMPTY".to_owned(), Value::Str(String::new()));
        values.insert("CURDIR".to_owned(), Value::Str(curdir.to_owned()));

        Self { values }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Replaces variables in `cell`. A cell holding a single variable keeps
    /// the variable's value as is, anything else becomes a string.
    pub fn resolve(&self, cell: &str, line: usize) -> Result<Value, Error> {
        let unknown = |name: &str| Error::UnknownVariable {
            line,
            name: name.to_owned(),
        };

        if let Some(name) = variable_name(cell).filter(|name| !name.contains("${")) {
            return self.get(name).cloned().ok_or_else(|| unknown(name));
        }

        let mut resolved = String::new();
        let mut rest = cell;

        while let Some(start) = rest.find("${") {
            let end = rest[start..]
                .find('}')
                .map(|end| start + end)
                .ok_or_else(|| Error::Table {
                    line,
                    message: format!("Unterminated variable in '{}'", cell),
                })?;

            let name = &rest[start + 2..end];
            let value = self.get(name).ok_or_else(|| unknown(name))?;

            resolved.push_str(&rest[..start]);
            if !value.is_none() {
                resolved.push_str(&value.to_string());
            }
            rest = &rest[end + 1..];
        }

        resolved.push_str(rest);
        Ok(Value::Str(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_keywords_assignments_and_comments() {
        let steps = parse(
            "*** Test Cases ***\n\
             plain text is ignored\n\
             | Create Client | billing.wsdl | | |\n\
             |  ${reply} =  | Call Soap Method | Ping | # trailing | comment |\n\
             | # commented out row |\n",
        )
        .unwrap();

        assert_eq!(
            steps,
            vec![
                Step {
                    line: 3,
                    assign: None,
                    keyword: "Create Client".to_owned(),
                    args: vec!["billing.wsdl".to_owned()],
                },
                Step {
                    line: 4,
                    assign: Some("reply".to_owned()),
                    keyword: "Call Soap Method".to_owned(),
                    args: vec!["Ping".to_owned()],
                },
            ]
        );
    }

    #[test]
    fn assignment_needs_a_keyword() {
        assert!(matches!(
            parse("| ${x} = |"),
            Err(Error::Table { line: 1, .. })
        ));
    }

    #[test]
    fn empty_cells_inside_a_row_are_kept() {
        let steps = parse("| Add Doctor Import | urn:a | | urn:b |").unwrap();
        assert_eq!(steps[0].args, vec!["urn:a", "", "urn:b"]);
    }

    #[test]
    fn substitutes_variables() {
        let mut variables = Variables::new("/suite");
        let mut fields = IndexMap::new();
        fields.insert("UserName".to_owned(), "ann".to_owned());
        variables.set("auth", Value::Dict(fields.clone()));
        variables.set("id", Value::from("7"));

        assert_eq!(variables.resolve("${auth}", 1).unwrap(), Value::Dict(fields));
        assert_eq!(variables.resolve("${None}", 1).unwrap(), Value::None);
        assert_eq!(variables.resolve("${EMPTY}", 1).unwrap(), Value::from(""));
        assert_eq!(
            variables.resolve("${CURDIR}/billing.wsdl", 1).unwrap(),
            Value::from("/suite/billing.wsdl")
        );
        assert_eq!(
            variables.resolve("INV-${id}${None}", 1).unwrap(),
            Value::from("INV-7")
        );
        assert_eq!(variables.resolve("plain", 1).unwrap(), Value::from("plain"));
    }

    #[test]
    fn unknown_and_unterminated_variables_fail() {
        let variables = Variables::new(".");

        assert!(matches!(
            variables.resolve("${missing}", 3),
            Err(Error::UnknownVariable { line: 3, ref name }) if name == "missing"
        ));
        assert!(matches!(
            variables.resolve("a ${b", 3),
            Err(Error::Table { line: 3, .. })
        ));
    }
}
