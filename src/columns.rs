//! Display column declarations.
//!
//! Every accepted shorthand is normalized into one [`ColumnSpecification`] at
//! construction time:
//!
//! ```rust,ignore
//! let columns: Vec<ColumnSpecification> = vec![
//!     "id".into(),                                   // name == source
//!     ("name", "full_name").into(),                  // (name, source path)
//!     ColumnSpecification::new("city")
//!         .source("address.city.name")
//!         .transform(|value| json!(value.as_str().unwrap_or("").to_uppercase())),
//! ];
//! ```

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::request::ParsedRequest;

/// Separator of relationship hops in a source path.
pub const PATH_SEPARATOR: char = '.';

/// Transport-safe replacement of [`PATH_SEPARATOR`] in output keys and request data keys.
pub const KEY_SEPARATOR: &str = "__";

pub type ValueTransform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// One display column of a grid.
#[derive(Clone)]
pub struct ColumnSpecification {
    name: String,
    source_path: Vec<String>,
    transform: Option<ValueTransform>,
}

impl ColumnSpecification {
    /// Column whose source path is its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let source_path = split_path(&name);
        Self {
            name,
            source_path,
            transform: None,
        }
    }

    /// Dotted source path, e.g. `address.city.name`.
    #[must_use]
    pub fn source(mut self, path: &str) -> Self {
        self.source_path = split_path(path);
        self
    }

    #[must_use]
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_path(&self) -> &[String] {
        &self.source_path
    }

    /// Output key, `address.description` becomes `address__description`
    #[must_use]
    pub fn output_key(&self) -> String {
        self.name.replace(PATH_SEPARATOR, KEY_SEPARATOR)
    }

    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        match &self.transform {
            Some(transform) => transform(value),
            None => value,
        }
    }

    /// Columns named after the request's `columns[i][data]` keys.
    ///
    /// Empty keys are skipped and `__` is read as a relationship hop, so a
    /// grid column `address__description` reads `address.description`.
    #[must_use]
    pub fn from_request(request: &ParsedRequest) -> Vec<Self> {
        request
            .columns
            .values()
            .filter(|column| !column.data.is_empty())
            .map(|column| {
                Self::new(column.data.clone()).source(&column.data.replace(KEY_SEPARATOR, "."))
            })
            .collect()
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split(PATH_SEPARATOR).map(str::to_string).collect()
}

impl fmt::Debug for ColumnSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpecification")
            .field("name", &self.name)
            .field("source_path", &self.source_path)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl From<&str> for ColumnSpecification {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ColumnSpecification {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<(&str, &str)> for ColumnSpecification {
    fn from((name, path): (&str, &str)) -> Self {
        Self::new(name).source(path)
    }
}
