use std::{
    collections::BTreeMap,
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::adapter::AdapterError;

/// The type of a declared input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    File,
    Bool,
    Integer,
    Float,
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::File => f.pad("file"),
            Kind::Bool => f.pad("bool"),
            Kind::Integer => f.pad("integer"),
            Kind::Float => f.pad("float"),
        }
    }
}

/// A default that can live in a `const` parameter table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    File(&'static str),
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::File(path) => f.write_str(path),
            Literal::Bool(flag) => write!(f, "{}", flag),
            Literal::Integer(number) => write!(f, "{}", number),
            Literal::Float(number) => write!(f, "{}", number),
        }
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        match value {
            Literal::File(path) => Value::Path(PathBuf::from(path)),
            Literal::Bool(flag) => Value::Bool(flag),
            Literal::Integer(number) => Value::Integer(number),
            Literal::Float(number) => Value::Float(number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    /// Must be supplied by the caller
    Mandatory,
    /// May be left unset, in which case the script sees an empty string
    Optional,
    /// Filled in when the caller does not supply a value
    Default(Literal),
}

/// Declaration of one adapter input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: Kind,
    pub requirement: Requirement,
    /// Only meaningful for [`Kind::File`]: the path must exist when the
    /// inputs are checked.
    pub must_exist: bool,
}

impl ParameterSpec {
    pub const fn file(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::File,
            requirement: Requirement::Optional,
            must_exist: false,
        }
    }

    pub const fn flag(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: Kind::Bool,
            requirement: Requirement::Default(Literal::Bool(default)),
            must_exist: false,
        }
    }

    pub const fn integer(name: &'static str, default: i64) -> Self {
        Self {
            name,
            kind: Kind::Integer,
            requirement: Requirement::Default(Literal::Integer(default)),
            must_exist: false,
        }
    }

    pub const fn float(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: Kind::Float,
            requirement: Requirement::Default(Literal::Float(default)),
            must_exist: false,
        }
    }

    pub const fn mandatory(self) -> Self {
        Self {
            requirement: Requirement::Mandatory,
            ..self
        }
    }

    pub const fn existing(self) -> Self {
        Self {
            must_exist: true,
            ..self
        }
    }

    /// Default path of an output file
    pub const fn defaults_to(self, path: &'static str) -> Self {
        Self {
            requirement: Requirement::Default(Literal::File(path)),
            ..self
        }
    }

    pub fn default_value(&self) -> Option<Value> {
        match self.requirement {
            Requirement::Default(literal) => Some(literal.into()),
            Requirement::Mandatory | Requirement::Optional => None,
        }
    }
}

/// Declaration of one adapter output. Its path is carried by the file
/// parameter with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSpec {
    pub name: &'static str,
    /// Absence after a successful run is a failure
    pub must_exist: bool,
}

impl ResultSpec {
    pub const fn file(name: &'static str) -> Self {
        Self {
            name,
            must_exist: false,
        }
    }

    pub const fn existing(self) -> Self {
        Self {
            must_exist: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Path(PathBuf),
    Bool(bool),
    Integer(i64),
    Float(f64),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("\"{text}\" is not a valid {kind}")]
pub struct ParseValueError {
    pub kind: Kind,
    pub text: String,
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Path(_) => Kind::File,
            Value::Bool(_) => Kind::Bool,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
        }
    }

    /// Parse text given on a command line into a value of `kind`.
    pub fn parse(kind: Kind, text: &str) -> Result<Self, ParseValueError> {
        let invalid = || ParseValueError {
            kind,
            text: text.to_owned(),
        };

        match kind {
            Kind::File if text.is_empty() => Err(invalid()),
            Kind::File => Ok(Value::Path(PathBuf::from(text))),
            Kind::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "f" | "no" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            Kind::Integer => text.parse().map(Value::Integer).map_err(|_| invalid()),
            Kind::Float => match text.parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(Value::Float(number)),
                _ => Err(invalid()),
            },
        }
    }

    /// The text substituted into a script. Booleans use R's `T`/`F`.
    pub(crate) fn render(&self) -> String {
        match self {
            Value::Path(path) => path.display().to_string(),
            Value::Bool(true) => "T".to_owned(),
            Value::Bool(false) => "F".to_owned(),
            Value::Integer(number) => number.to_string(),
            Value::Float(number) => number.to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Path(PathBuf::from(value))
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Value::Path(value)
    }
}

impl From<&Path> for Value {
    fn from(value: &Path) -> Self {
        Value::Path(value.to_path_buf())
    }
}

/// Raw, unchecked inputs as a caller supplies them
pub type Values = BTreeMap<String, Value>;

/// Checked and fully defaulted inputs of one adapter. Optional parameters
/// that were not supplied are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    adapter: &'static str,
    values: BTreeMap<&'static str, Value>,
}

impl Inputs {
    pub fn adapter(&self) -> &'static str {
        self.adapter
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    /// Turn the checked inputs back into raw values, e.g. to configure a
    /// second adapter the same way.
    pub fn to_values(&self) -> Values {
        self.values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect()
    }

    pub fn path(&self, name: &'static str) -> Result<PathBuf, AdapterError> {
        self.optional_path(name)?
            .ok_or(AdapterError::MissingRequiredInput {
                adapter: self.adapter,
                name,
            })
    }

    pub fn optional_path(&self, name: &'static str) -> Result<Option<PathBuf>, AdapterError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Value::Path(path)) => Ok(Some(path.clone())),
            Some(other) => Err(self.mismatch(name, Kind::File, other)),
        }
    }

    pub fn flag(&self, name: &'static str) -> Result<bool, AdapterError> {
        match self.require(name)? {
            Value::Bool(flag) => Ok(*flag),
            other => Err(self.mismatch(name, Kind::Bool, other)),
        }
    }

    pub fn integer(&self, name: &'static str) -> Result<i64, AdapterError> {
        match self.require(name)? {
            Value::Integer(number) => Ok(*number),
            other => Err(self.mismatch(name, Kind::Integer, other)),
        }
    }

    pub fn float(&self, name: &'static str) -> Result<f64, AdapterError> {
        match self.require(name)? {
            Value::Float(number) => Ok(*number),
            other => Err(self.mismatch(name, Kind::Float, other)),
        }
    }

    fn require(&self, name: &'static str) -> Result<&Value, AdapterError> {
        self.values
            .get(name)
            .ok_or(AdapterError::MissingRequiredInput {
                adapter: self.adapter,
                name,
            })
    }

    fn mismatch(&self, name: &str, expected: Kind, found: &Value) -> AdapterError {
        AdapterError::InvalidInput {
            adapter: self.adapter,
            name: name.to_owned(),
            reason: format!("expected a {}, got a {}", expected, found.kind()),
        }
    }
}

/// Absolute paths of the results of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs(BTreeMap<&'static str, PathBuf>);

impl Outputs {
    pub(crate) fn insert(&mut self, name: &'static str, path: PathBuf) {
        self.0.insert(name, path);
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.0.get(name).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        self.0.iter().map(|(name, path)| (*name, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The single check every configuration goes through: rejects unknown names
/// and kind mismatches, fills in defaults, reports missing mandatory inputs
/// and verifies existence-checked files relative to `working_directory`.
pub(crate) fn check_inputs(
    adapter: &'static str,
    parameters: &'static [ParameterSpec],
    mut supplied: Values,
    working_directory: &Path,
) -> Result<Inputs, AdapterError> {
    if let Some(unknown) = supplied
        .keys()
        .find(|name| !parameters.iter().any(|p| p.name == name.as_str()))
    {
        return Err(AdapterError::InvalidInput {
            adapter,
            name: unknown.clone(),
            reason: "no such parameter".to_owned(),
        });
    }

    let mut values = BTreeMap::new();

    for parameter in parameters {
        let value = match supplied.remove(parameter.name) {
            Some(value) => check_value(adapter, parameter, value, working_directory)?,
            None => match parameter.requirement {
                Requirement::Default(literal) => literal.into(),
                Requirement::Optional => continue,
                Requirement::Mandatory => {
                    return Err(AdapterError::MissingRequiredInput {
                        adapter,
                        name: parameter.name,
                    })
                }
            },
        };

        values.insert(parameter.name, value);
    }

    Ok(Inputs { adapter, values })
}

fn check_value(
    adapter: &'static str,
    parameter: &ParameterSpec,
    value: Value,
    working_directory: &Path,
) -> Result<Value, AdapterError> {
    let invalid = |reason: String| AdapterError::InvalidInput {
        adapter,
        name: parameter.name.to_owned(),
        reason,
    };

    match (parameter.kind, value) {
        (Kind::File, Value::Path(path)) => {
            if path.as_os_str().is_empty() {
                return Err(invalid("path is empty".to_owned()));
            }

            // paths end up inside single quoted R strings
            let Some(text) = path.to_str() else {
                return Err(invalid("path is not valid UTF-8".to_owned()));
            };
            if let Some(forbidden) = text
                .chars()
                .find(|c| matches!(c, '\'' | '\\' | '\n' | '\r'))
            {
                return Err(invalid(format!(
                    "path contains {:?}, which cannot appear in a script",
                    forbidden
                )));
            }

            if parameter.must_exist && !working_directory.join(&path).exists() {
                return Err(invalid(format!("{} does not exist", path.display())));
            }

            Ok(Value::Path(path))
        }
        (Kind::Bool, value @ Value::Bool(_)) => Ok(value),
        (Kind::Integer, value @ Value::Integer(_)) => Ok(value),
        (Kind::Float, Value::Float(number)) if !number.is_finite() => {
            Err(invalid(format!("{} is not a finite number", number)))
        }
        (Kind::Float, value @ Value::Float(_)) => Ok(value),
        (Kind::Float, Value::Integer(number)) => Ok(Value::Float(number as f64)),
        (expected, found) => Err(invalid(format!(
            "expected a {}, got a {}",
            expected,
            found.kind()
        ))),
    }
}
