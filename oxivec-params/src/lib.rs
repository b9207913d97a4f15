//! # OxiVec-Params
//! A parameter database implementing the [`OxiVec` crate](https://crates.io/crates/oxivec)'s
//! `ParameterSource` trait.
//!
//! Parameters are dotted keys mapped to string values. They can be
//! set programmatically, read from `key = value` parameter files
//! (with `parent.<n>` includes), read from TOML files whose tables
//! flatten into dotted keys, or overridden from the command line.
//!
//! # Example usage
//! ```
//! use oxivec::{FloatVectorSpecies, Parameter, ParameterSource};
//! use oxivec_params::ParameterDatabase;
//!
//! let mut params = ParameterDatabase::from_toml_str(
//!     r#"
//!     [vector.species]
//!     genome-size = 4
//!     min-gene = -1.0
//!     max-gene = 1.0
//!     mutation-type = "polynomial"
//!     mutation-distribution-index = 20
//!     alternative-polynomial-version = true
//!     mutation-bounded = true
//!     "#,
//! )
//! .unwrap();
//! params.apply_override("vector.species.max-gene.3 = 2.0").unwrap();
//!
//! assert_eq!(params.get(&Parameter::new("vector.species.genome-size")), Some("4"));
//!
//! let species =
//!     FloatVectorSpecies::<f64>::setup(&params, &Parameter::new("vector.species")).unwrap();
//! assert_eq!(species.max_gene(3), 2.0);
//! assert_eq!(species.mutation_distribution_index(0), Some(20));
//! ```

use oxivec::{Parameter, ParameterSource};

use ahash::RandomState;
use log::debug;
use thiserror::Error;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key prefix of parent-file includes, as in `parent.0 = ../base.params`.
pub const PARENT: &str = "parent";

/// An error type indicating a parameter
/// file or override could not be read.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("could not read parameter file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected 'key = value', got '{text}'")]
    Syntax { line: usize, text: String },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("parameter file {} includes itself", .0.display())]
    IncludeCycle(PathBuf),
    #[error("malformed override '{0}', expected 'key=value'")]
    Override(String),
}

/// An in-memory key-value parameter store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterDatabase {
    entries: HashMap<String, String, RandomState>,
}

impl ParameterDatabase {
    /// Creates an empty database.
    pub fn new() -> ParameterDatabase {
        ParameterDatabase::default()
    }

    /// Parses `key = value` lines. Blank lines and lines starting
    /// with `#` are ignored; later lines override earlier ones.
    /// `parent.<n>` entries are resolved relative to the current
    /// directory.
    ///
    /// # Errors
    /// Returns an error if a line has no `=` or an empty key,
    /// or if a parent file cannot be read.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{Parameter, ParameterSource};
    /// use oxivec_params::ParameterDatabase;
    ///
    /// let params = ParameterDatabase::parse(
    ///     "
    ///     ## global bounds
    ///     species.min-gene = 0
    ///     species.max-gene = 1
    ///     species.max-gene = 2
    ///     ",
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(params.len(), 2);
    /// assert_eq!(params.get_f64(&Parameter::new("species.max-gene")).unwrap(), Some(2.0));
    /// ```
    pub fn parse(text: &str) -> Result<ParameterDatabase, DatabaseError> {
        Self::parse_in(text, Path::new("."), &mut Vec::new())
    }

    /// Reads a parameter file. Files with a `.toml` extension are
    /// read as TOML; anything else as `key = value` lines whose
    /// `parent.<n>` includes are resolved relative to the file.
    ///
    /// Parent values only fill keys the including file leaves
    /// unset, with `parent.0` taking precedence over `parent.1`
    /// and so on.
    ///
    /// # Errors
    /// Returns an error if a file cannot be read or parsed,
    /// or if files include each other in a cycle.
    pub fn load(path: impl AsRef<Path>) -> Result<ParameterDatabase, DatabaseError> {
        Self::load_in(path.as_ref(), &mut Vec::new())
    }

    fn load_in(path: &Path, including: &mut Vec<PathBuf>) -> Result<ParameterDatabase, DatabaseError> {
        let io_error = |source| DatabaseError::Io {
            path: path.to_owned(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_error)?;
        if including.contains(&canonical) {
            return Err(DatabaseError::IncludeCycle(canonical));
        }
        let text = fs::read_to_string(&canonical).map_err(io_error)?;

        let database = if canonical.extension().map_or(false, |e| e == "toml") {
            Self::from_toml_str(&text)?
        } else {
            including.push(canonical.clone());
            let dir = canonical.parent().unwrap_or_else(|| Path::new("."));
            let database = Self::parse_in(&text, dir, including)?;
            including.pop();
            database
        };
        debug!(
            "loaded {} parameters from {}",
            database.len(),
            canonical.display()
        );
        Ok(database)
    }

    fn parse_in(
        text: &str,
        dir: &Path,
        including: &mut Vec<PathBuf>,
    ) -> Result<ParameterDatabase, DatabaseError> {
        let mut database = ParameterDatabase::new();
        let mut parents = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = split_assignment(line).ok_or_else(|| DatabaseError::Syntax {
                line: number + 1,
                text: line.to_owned(),
            })?;
            match parent_index(key) {
                Some(n) => parents.push((n, value.to_owned())),
                None => database.set(key, value),
            }
        }

        parents.sort_by_key(|(n, _)| *n);
        for (_, file) in parents {
            let parent = Self::load_in(&dir.join(file), including)?;
            database.inherit(parent);
        }
        Ok(database)
    }

    /// Reads TOML, flattening nested tables into dotted keys
    /// and arrays into `<key>.<index>` entries.
    ///
    /// # Errors
    /// Returns an error if `text` is not valid TOML.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{Parameter, ParameterSource};
    /// use oxivec_params::ParameterDatabase;
    ///
    /// let params = ParameterDatabase::from_toml_str(
    ///     r#"
    ///     [species]
    ///     mutation-bounded = false
    ///     segment = [{ start = 0 }, { start = 5 }]
    ///     "#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(params.get(&Parameter::new("species.mutation-bounded")), Some("false"));
    /// assert_eq!(params.get(&Parameter::new("species.segment.1.start")), Some("5"));
    /// ```
    pub fn from_toml_str(text: &str) -> Result<ParameterDatabase, DatabaseError> {
        let table: toml::Table = text.parse()?;
        let mut database = ParameterDatabase::new();
        for (key, value) in table {
            flatten(&mut database, key, value);
        }
        Ok(database)
    }

    /// Sets a single `key=value` pair, as given on a command line.
    ///
    /// # Errors
    /// Returns an error if `assignment` has no `=` or an empty key.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), DatabaseError> {
        let (key, value) = split_assignment(assignment.trim())
            .ok_or_else(|| DatabaseError::Override(assignment.to_owned()))?;
        self.set(key, value);
        Ok(())
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Copies every entry of `parent` whose key is not yet set.
    fn inherit(&mut self, parent: ParameterDatabase) {
        for (key, value) in parent.entries {
            self.entries.entry(key).or_insert(value);
        }
    }
}

impl ParameterSource for ParameterDatabase {
    fn get(&self, key: &Parameter) -> Option<&str> {
        self.entries.get(key.as_str()).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterDatabase {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> ParameterDatabase {
        let mut database = ParameterDatabase::new();
        for (key, value) in iter {
            database.set(key, value);
        }
        database
    }
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some((key, value.trim()))
    }
}

fn parent_index(key: &str) -> Option<usize> {
    key.strip_prefix(PARENT)?.strip_prefix('.')?.parse().ok()
}

fn flatten(database: &mut ParameterDatabase, key: String, value: toml::Value) {
    use toml::Value;

    match value {
        Value::String(s) => database.set(key, s),
        Value::Table(table) => {
            for (sub, value) in table {
                flatten(database, format!("{}.{}", key, sub), value);
            }
        }
        Value::Array(values) => {
            for (i, value) in values.into_iter().enumerate() {
                flatten(database, format!("{}.{}", key, i), value);
            }
        }
        other => database.set(key, other.to_string()),
    }
}
