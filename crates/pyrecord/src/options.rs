use serde::{Deserialize, Serialize};

use crate::{
    args::KwargsValues,
    exception::{ExcType, RunResult},
    field::expect_bool,
};

/// Order of a record's resolved field list.
///
/// `Declaration` keeps first-declaration positions across inheritance and
/// overrides. `Alphabetical` sorts all fields by name, which changes the
/// constructor parameter order as well as the repr and comparison tuples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrder {
    #[default]
    Declaration,
    Alphabetical,
}

/// Class-level options of a record transform.
///
/// Defaults match `@dataclass` with no arguments: `init`, `repr` and `eq` on,
/// everything else off.
///
/// Options can be built with chainable setters, parsed from host keyword
/// arguments with [`RecordOptions::from_kwargs`], or deserialized (missing keys
/// take their defaults):
///
/// ```ignore
/// let options: RecordOptions = serde_json::from_str(r#"{"frozen": true}"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[expect(clippy::struct_excessive_bools, reason = "mirrors the decorator's keyword flags")]
pub struct RecordOptions {
    pub init: bool,
    pub repr: bool,
    pub eq: bool,
    pub order: bool,
    pub unsafe_hash: bool,
    pub frozen: bool,
    pub field_order: FieldOrder,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            init: true,
            repr: true,
            eq: true,
            order: false,
            unsafe_hash: false,
            frozen: false,
            field_order: FieldOrder::Declaration,
        }
    }
}

impl RecordOptions {
    #[must_use]
    pub fn init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    #[must_use]
    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = repr;
        self
    }

    #[must_use]
    pub fn eq(mut self, eq: bool) -> Self {
        self.eq = eq;
        self
    }

    #[must_use]
    pub fn order(mut self, order: bool) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn unsafe_hash(mut self, unsafe_hash: bool) -> Self {
        self.unsafe_hash = unsafe_hash;
        self
    }

    #[must_use]
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    #[must_use]
    pub fn field_order(mut self, field_order: FieldOrder) -> Self {
        self.field_order = field_order;
        self
    }

    /// Parses `dataclass(...)` keyword arguments.
    ///
    /// Every flag must be a bool. `field_order` accepts `"declaration"` or
    /// `"alphabetical"`.
    pub fn from_kwargs(kwargs: KwargsValues) -> RunResult<Self> {
        let mut options = Self::default();
        for (key, value) in kwargs {
            match key.as_str() {
                "init" => options.init = expect_bool("dataclass", &key, &value)?,
                "repr" => options.repr = expect_bool("dataclass", &key, &value)?,
                "eq" => options.eq = expect_bool("dataclass", &key, &value)?,
                "order" => options.order = expect_bool("dataclass", &key, &value)?,
                "unsafe_hash" => options.unsafe_hash = expect_bool("dataclass", &key, &value)?,
                "frozen" => options.frozen = expect_bool("dataclass", &key, &value)?,
                "field_order" => {
                    options.field_order = match value.as_str() {
                        Some("declaration") => FieldOrder::Declaration,
                        Some("alphabetical") => FieldOrder::Alphabetical,
                        _ => {
                            return Err(ExcType::value_error(format!(
                                "field_order must be 'declaration' or 'alphabetical', not {}",
                                value.py_repr()?
                            )));
                        }
                    }
                }
                _ => return Err(ExcType::type_error_unexpected_keyword("dataclass", &key)),
            }
        }
        Ok(options)
    }
}
