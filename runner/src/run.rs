use indexmap::IndexMap;
use sudslib::{dispatch::normalize, SoapBackend, SudsLibrary, Value};

use crate::{
    table::{Step, Variables},
    Error,
};

/// Executes table rows against a library, keeping variables between rows.
pub struct Runner<B: SoapBackend> {
    library: SudsLibrary<B>,
    variables: Variables,
}

impl<B: SoapBackend> Runner<B> {
    pub fn new(library: SudsLibrary<B>, curdir: &str) -> Self {
        Self {
            library,
            variables: Variables::new(curdir),
        }
    }

    pub fn library(&self) -> &SudsLibrary<B> {
        &self.library
    }

    /// Runs `steps` in order, stopping at the first failure.
    pub fn run_all(&mut self, steps: &[Step]) -> Result<(), Error> {
        for step in steps {
            self.run(step)?;
        }

        Ok(())
    }

    pub fn run(&mut self, step: &Step) -> Result<(), Error> {
        let args = step
            .args
            .iter()
            .map(|arg| self.variables.resolve(arg, step.line))
            .collect::<Result<Vec<_>, _>>()?;

        let span = tracing::info_span!("step", line = step.line, keyword = %step.keyword);
        let _entered = span.enter();

        let result = match self.builtin(step, &args)? {
            Some(result) => result,
            None => self
                .library
                .run_keyword(&step.keyword, &args)
                .map_err(|source| Error::Keyword {
                    line: step.line,
                    keyword: step.keyword.clone(),
                    source,
                })?,
        };

        if let Some(name) = &step.assign {
            let value = result.unwrap_or(Value::None);
            tracing::debug!(variable = %name, value = %value, "Assigned");
            self.variables.set(name.clone(), value);
        }

        Ok(())
    }

    /// Keywords the runner handles itself. `None` when `step` names a
    /// library keyword.
    fn builtin(&self, step: &Step, args: &[Value]) -> Result<Option<Option<Value>>, Error> {
        let fail = |message: String| Error::Assertion {
            line: step.line,
            message,
        };

        let result = match normalize(&step.keyword).as_str() {
            "createdictionary" => {
                let mut entries = IndexMap::new();
                for arg in args {
                    let arg = arg.to_string();
                    let (key, value) = arg.split_once('=').ok_or_else(|| Error::Table {
                        line: step.line,
                        message: format!("Dictionary item '{}' is not in key=value form", arg),
                    })?;
                    entries.insert(key.to_owned(), value.to_owned());
                }
                Some(Value::Dict(entries))
            }
            "log" => {
                for arg in args {
                    tracing::info!("{}", arg);
                }
                None
            }
            "shouldbeequal" => {
                let (first, second) = two(step, args)?;
                if first.to_string() != second.to_string() {
                    return Err(fail(format!("{} != {}", first, second)));
                }
                None
            }
            "shouldcontain" => {
                let (container, item) = two(step, args)?;
                if !container.to_string().contains(&item.to_string()) {
                    return Err(fail(format!("'{}' does not contain '{}'", container, item)));
                }
                None
            }
            _ => return Ok(None),
        };

        Ok(Some(result))
    }
}

fn two<'a>(step: &Step, args: &'a [Value]) -> Result<(&'a Value, &'a Value), Error> {
    match args {
        [first, second] => Ok((first, second)),
        _ => Err(Error::Table {
            line: step.line,
            message: format!(
                "Keyword '{}' expected 2 arguments, got {}",
                step.keyword,
                args.len()
            ),
        }),
    }
}
