//! Parameter schemas: arity checks, per-parameter validation and coercion of
//! raw string tokens into typed values.

use std::fmt;
use thiserror::Error;

/// Regla de tipo/validación de un parámetro.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Any string, no validation.
    Text,
    Integer { min: Option<i64>, max: Option<i64> },
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    /// One of the listed values (case-insensitive), coerced to its lowercase form.
    OneOf(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    pub optional: bool,
    pub variadic: bool,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ParamKind::Text,
            optional: false,
            variadic: false,
        }
    }

    pub fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Consume todos los tokens restantes como una lista.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Valor coercionado de un parámetro.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    List(Vec<ParamValue>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("only the last parameter may be variadic (`{0}` is not last)")]
    VariadicNotLast(String),

    #[error("required parameter `{0}` follows an optional one")]
    RequiredAfterOptional(String),

    #[error("minimum parameter amount {min} exceeds maximum {max}")]
    InvalidBounds { min: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Too few parameters (minimum `{min}` required)")]
    TooFewParameters { min: usize },

    #[error("Too many parameters (maximum `{max}` allowed)")]
    TooManyParameters { max: usize },

    #[error("*\"{value}\"* is not a valid value for `<{param}>`")]
    InvalidParameterValue { value: String, param: String },
}

/// Ordered parameter definitions of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    definition: Vec<ParamDef>,
    min_required: usize,
    max_allowed: Option<usize>,
}

impl ParamSchema {
    pub fn new(definition: Vec<ParamDef>) -> Result<Self, SchemaError> {
        let last = definition.len().saturating_sub(1);
        let mut seen_optional = false;
        let mut min_required = 0;

        for (i, def) in definition.iter().enumerate() {
            if def.variadic && i != last {
                return Err(SchemaError::VariadicNotLast(def.name.clone()));
            }
            if def.optional || def.variadic {
                seen_optional = true;
            } else if seen_optional {
                return Err(SchemaError::RequiredAfterOptional(def.name.clone()));
            } else {
                min_required += 1;
            }
        }

        let has_rest = definition.last().is_some_and(|def| def.variadic);
        let max_allowed = (!has_rest).then_some(definition.len());

        Ok(Self {
            definition,
            min_required,
            max_allowed,
        })
    }

    /// Sobrescribe la cantidad mínima de parámetros requeridos.
    pub fn with_min_required(mut self, min: usize) -> Result<Self, SchemaError> {
        if let Some(max) = self.max_allowed.filter(|max| min > *max) {
            return Err(SchemaError::InvalidBounds { min, max });
        }
        self.min_required = min;
        Ok(self)
    }

    /// Sobrescribe la cantidad máxima de parámetros permitidos.
    pub fn with_max_allowed(mut self, max: usize) -> Result<Self, SchemaError> {
        if self.min_required > max {
            return Err(SchemaError::InvalidBounds {
                min: self.min_required,
                max,
            });
        }
        self.max_allowed = Some(max);
        Ok(self)
    }

    pub fn definition(&self) -> &[ParamDef] {
        &self.definition
    }

    pub fn min_required(&self) -> usize {
        self.min_required
    }

    /// `None` when the last parameter is variadic and no maximum was set.
    pub fn max_allowed(&self) -> Option<usize> {
        self.max_allowed
    }

    /// Usage representation of a single parameter, e.g. `<name>`, `<name?>`,
    /// `<...tags?>`.
    pub fn param_usage(&self, index: usize) -> String {
        let def = &self.definition[index];
        let prefix = if def.variadic { "..." } else { "" };
        let suffix = if index >= self.min_required { "?" } else { "" };
        format!("<{}{}{}>", prefix, def.name, suffix)
    }

    pub fn usage(&self) -> String {
        (0..self.definition.len())
            .map(|i| self.param_usage(i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Checks arity, then validates and coerces each token positionally.
    pub fn validate(&self, tokens: &[String]) -> Result<Params, ParamError> {
        if tokens.len() < self.min_required {
            return Err(ParamError::TooFewParameters {
                min: self.min_required,
            });
        }
        if let Some(max) = self.max_allowed {
            if tokens.len() > max {
                return Err(ParamError::TooManyParameters { max });
            }
        }

        let mut values = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            // Un máximo sobrescrito puede superar la definición
            let Some(def) = self.definition.get(i) else {
                values.push(ParamValue::Text(token.clone()));
                continue;
            };
            if def.variadic {
                let rest = tokens[i..]
                    .iter()
                    .map(|t| coerce(t, def))
                    .collect::<Result<Vec<_>, _>>()?;
                values.push(ParamValue::List(rest));
                return Ok(Params(values));
            }
            values.push(coerce(token, def)?);
        }

        // Un parámetro variádico sin tokens queda como lista vacía
        if let Some(def) = self.definition.get(tokens.len()) {
            if def.variadic {
                values.push(ParamValue::List(Vec::new()));
            }
        }

        Ok(Params(values))
    }
}

fn coerce(token: &str, def: &ParamDef) -> Result<ParamValue, ParamError> {
    let invalid = || ParamError::InvalidParameterValue {
        value: token.to_string(),
        param: def.name.clone(),
    };

    match &def.kind {
        ParamKind::Text => Ok(ParamValue::Text(token.to_string())),
        ParamKind::Integer { min, max } => {
            let value: i64 = token.trim().parse().map_err(|_| invalid())?;
            if min.is_some_and(|min| value < min) || max.is_some_and(|max| value > max) {
                return Err(invalid());
            }
            Ok(ParamValue::Integer(value))
        }
        ParamKind::Number { min, max } => {
            let value: f64 = token.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite()
                || min.is_some_and(|min| value < min)
                || max.is_some_and(|max| value > max)
            {
                return Err(invalid());
            }
            Ok(ParamValue::Number(value))
        }
        ParamKind::Boolean => match token.to_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(ParamValue::Boolean(true)),
            "false" | "no" | "off" => Ok(ParamValue::Boolean(false)),
            _ => Err(invalid()),
        },
        ParamKind::OneOf(choices) => {
            let lowered = token.to_lowercase();
            if choices.iter().any(|choice| choice.to_lowercase() == lowered) {
                Ok(ParamValue::Text(lowered))
            } else {
                Err(invalid())
            }
        }
    }
}

/// Coerced parameters in schema order. Missing optional parameters are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<ParamValue>);

impl Params {
    pub fn new(values: Vec<ParamValue>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<&ParamValue> {
        self.0.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.0.get(index) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        match self.0.get(index) {
            Some(ParamValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        match self.0.get(index) {
            Some(ParamValue::Number(n)) => Some(*n),
            Some(ParamValue::Integer(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        match self.0.get(index) {
            Some(ParamValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn list(&self, index: usize) -> Option<&[ParamValue]> {
        match self.0.get(index) {
            Some(ParamValue::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ParamValue> {
        self.0
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::List(items) => {
                let joined = items.iter().map(|i| i.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}
