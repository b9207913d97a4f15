//! Hierarchical parameter keys and the interface
//! to whatever store holds their values.
mod errors;
pub mod names;

pub use errors::ParameterError;

use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::str::FromStr;

/// A dotted parameter key, e.g. `pop.subpop.0.species.min-gene.3`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Parameter(String);

impl Parameter {
    /// Creates a key from its dotted string form.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Parameter;
    ///
    /// let base = Parameter::new("pop.subpop.0.species");
    ///
    /// assert_eq!(base.to_string(), "pop.subpop.0.species");
    /// ```
    pub fn new(key: impl Into<String>) -> Parameter {
        Parameter(key.into())
    }

    /// Returns a new key with `segment` appended.
    /// Pushing an empty segment returns an unchanged copy.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Parameter;
    ///
    /// let base = Parameter::new("species");
    ///
    /// assert_eq!(base.push("min-gene").push(3).as_str(), "species.min-gene.3");
    /// assert_eq!(base.push("").as_str(), "species");
    /// ```
    pub fn push(&self, segment: impl fmt::Display) -> Parameter {
        let segment = segment.to_string();
        if segment.is_empty() {
            self.clone()
        } else if self.0.is_empty() {
            Parameter(segment)
        } else {
            Parameter(format!("{}.{}", self.0, segment))
        }
    }

    /// Returns the key's dotted string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Parameter {
    fn from(key: &str) -> Parameter {
        Parameter::new(key)
    }
}

impl From<String> for Parameter {
    fn from(key: String) -> Parameter {
        Parameter(key)
    }
}

/// An interface for key-value parameter stores.
///
/// Only [`get`] must be supplied; typed lookups are
/// derived from it. Typed lookups distinguish an absent
/// key (`Ok(None)`) from a present but malformed one (`Err`).
///
/// [`get`]: ParameterSource::get
pub trait ParameterSource {
    /// Returns the raw string value stored under `key`.
    fn get(&self, key: &Parameter) -> Option<&str>;

    /// Returns whether a value is stored under `key`.
    fn exists(&self, key: &Parameter) -> bool {
        self.get(key).is_some()
    }

    /// Returns the trimmed string value stored under `key`.
    fn get_string(&self, key: &Parameter) -> Option<String> {
        self.get(key).map(|v| v.trim().to_owned())
    }

    /// Parses the value under `key` as a real number.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{Parameter, ParameterSource};
    /// use std::collections::HashMap;
    ///
    /// let mut params = HashMap::new();
    /// params.insert("a".to_string(), " 2.5 ".to_string());
    /// params.insert("b".to_string(), "two".to_string());
    ///
    /// assert_eq!(params.get_f64(&Parameter::new("a")).unwrap(), Some(2.5));
    /// assert_eq!(params.get_f64(&Parameter::new("c")).unwrap(), None);
    /// assert!(params.get_f64(&Parameter::new("b")).is_err());
    /// ```
    fn get_f64(&self, key: &Parameter) -> Result<Option<f64>, ParameterError> {
        parse_value(self, key, "a real number")
    }

    /// Parses the value under `key` as a signed integer.
    fn get_i64(&self, key: &Parameter) -> Result<Option<i64>, ParameterError> {
        parse_value(self, key, "an integer")
    }

    /// Parses the value under `key` as a non-negative integer.
    fn get_usize(&self, key: &Parameter) -> Result<Option<usize>, ParameterError> {
        parse_value(self, key, "a non-negative integer")
    }

    /// Parses the value under `key` as a boolean.
    /// Accepts `true` and `false`, ignoring case.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{Parameter, ParameterSource};
    /// use std::collections::BTreeMap;
    ///
    /// let mut params = BTreeMap::new();
    /// params.insert("bounded".to_string(), "False".to_string());
    ///
    /// assert_eq!(params.get_bool(&Parameter::new("bounded")).unwrap(), Some(false));
    /// ```
    fn get_bool(&self, key: &Parameter) -> Result<Option<bool>, ParameterError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ParameterError::Malformed {
                    key: key.clone(),
                    value: raw.to_owned(),
                    expected: "a boolean",
                }),
            },
        }
    }
}

fn parse_value<P, V>(
    source: &P,
    key: &Parameter,
    expected: &'static str,
) -> Result<Option<V>, ParameterError>
where
    P: ParameterSource + ?Sized,
    V: FromStr,
{
    match source.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ParameterError::Malformed {
                key: key.clone(),
                value: raw.to_owned(),
                expected,
            }),
    }
}

impl<S: BuildHasher> ParameterSource for HashMap<String, String, S> {
    fn get(&self, key: &Parameter) -> Option<&str> {
        HashMap::get(self, key.as_str()).map(String::as_str)
    }
}

impl ParameterSource for BTreeMap<String, String> {
    fn get(&self, key: &Parameter) -> Option<&str> {
        BTreeMap::get(self, key.as_str()).map(String::as_str)
    }
}

impl<P: ParameterSource + ?Sized> ParameterSource for &P {
    fn get(&self, key: &Parameter) -> Option<&str> {
        (**self).get(key)
    }
}
