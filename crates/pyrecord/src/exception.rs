use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can raise a Python-kind error.
pub type RunResult<T> = Result<T, RunError>;

/// Python exception kinds surfaced by the record engine and the host object model.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `ValueError` -> "ValueError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// Base class of every kind below.
    Exception,

    // --- AttributeError hierarchy ---
    AttributeError,
    /// Subclass of AttributeError, raised by writes to frozen records.
    FrozenInstanceError,

    // --- RuntimeError hierarchy ---
    RuntimeError,
    /// Subclass of RuntimeError.
    RecursionError,

    TypeError,
    ValueError,
}

impl ExcType {
    /// Checks if this exception type is a subclass of another exception type.
    ///
    /// Returns true if `self` would be caught by `except handler_type:`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::Exception => true,
            Self::AttributeError => matches!(self, Self::FrozenInstanceError),
            Self::RuntimeError => matches!(self, Self::RecursionError),
            _ => false,
        }
    }

    /// Creates an AttributeError for reading an attribute that does not exist.
    #[must_use]
    pub(crate) fn attribute_error(type_name: impl Display, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
        .into()
    }

    /// Creates an AttributeError for a property that has no setter or deleter.
    #[must_use]
    pub(crate) fn attribute_error_read_only(type_name: impl Display, attr: &str, action: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("property '{attr}' of '{type_name}' object has no {action}"),
        )
        .into()
    }

    /// Creates a FrozenInstanceError for assigning to a frozen record field.
    ///
    /// Message format: "cannot assign to field 'attr_name'"
    #[must_use]
    pub(crate) fn frozen_instance_error(attr_name: &str) -> RunError {
        SimpleException::new_msg(
            Self::FrozenInstanceError,
            format!("cannot assign to field '{attr_name}'"),
        )
        .into()
    }

    /// Creates a FrozenInstanceError for deleting a frozen record field.
    #[must_use]
    pub(crate) fn frozen_instance_delete_error(attr_name: &str) -> RunError {
        SimpleException::new_msg(Self::FrozenInstanceError, format!("cannot delete field '{attr_name}'")).into()
    }

    /// Creates a simple TypeError with a custom message.
    #[must_use]
    pub(crate) fn type_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, msg).into()
    }

    /// Creates a TypeError for unhashable types when calling `hash()`.
    ///
    /// Matches CPython's format: `TypeError: unhashable type: 'list'`
    #[must_use]
    pub(crate) fn type_error_unhashable(type_name: impl Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, format!("unhashable type: '{type_name}'")).into()
    }

    /// Creates a TypeError for calling a value that is not callable.
    #[must_use]
    pub(crate) fn type_error_not_callable(type_name: impl Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, format!("'{type_name}' object is not callable")).into()
    }

    /// Creates a TypeError for a wrong argument count.
    ///
    /// - For 1 expected arg: `{name}() takes exactly one argument ({actual} given)`
    /// - For N expected args: `{name} expected {expected} arguments, got {actual}`
    #[must_use]
    pub(crate) fn type_error_arg_count(name: &str, expected: usize, actual: usize) -> RunError {
        if expected == 1 {
            SimpleException::new_msg(
                Self::TypeError,
                format!("{name}() takes exactly one argument ({actual} given)"),
            )
            .into()
        } else {
            SimpleException::new_msg(
                Self::TypeError,
                format!("{name} expected {expected} arguments, got {actual}"),
            )
            .into()
        }
    }

    /// Creates a TypeError for too many positional arguments.
    ///
    /// `self` counts as a positional argument, matching CPython:
    /// `__init__() takes 1 positional argument but 3 were given`
    #[must_use]
    pub(crate) fn type_error_too_many_positional(name: &str, max: usize, given: usize) -> RunError {
        let noun = if max == 1 { "argument" } else { "arguments" };
        let verb = if given == 1 { "was" } else { "were" };
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() takes {max} positional {noun} but {given} {verb} given"),
        )
        .into()
    }

    /// Creates a TypeError for an unexpected keyword argument.
    ///
    /// Matches CPython's format: `{name}() got an unexpected keyword argument '{key}'`
    #[must_use]
    pub(crate) fn type_error_unexpected_keyword(name: &str, key: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() got an unexpected keyword argument '{key}'"),
        )
        .into()
    }

    /// Creates a TypeError for a keyword passed twice.
    ///
    /// Matches CPython's format: `{name}() got multiple values for keyword argument '{key}'`
    #[must_use]
    pub(crate) fn type_error_multiple_values(name: &str, key: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() got multiple values for keyword argument '{key}'"),
        )
        .into()
    }

    /// Creates a TypeError for missing keyword-only arguments.
    ///
    /// Matches CPython's formats:
    /// - `f() missing 1 required keyword-only argument: 'a'`
    /// - `f() missing 2 required keyword-only arguments: 'a' and 'b'`
    /// - `f() missing 3 required keyword-only arguments: 'a', 'b', and 'c'`
    #[must_use]
    pub(crate) fn type_error_missing_kwonly_with_names(name: &str, missing_names: &[&str]) -> RunError {
        let quoted: Vec<String> = missing_names.iter().map(|n| format!("'{n}'")).collect();
        let joined = match quoted.as_slice() {
            [] => String::new(),
            [one] => one.clone(),
            [first, second] => format!("{first} and {second}"),
            [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        };
        let noun = if missing_names.len() == 1 { "argument" } else { "arguments" };
        SimpleException::new_msg(
            Self::TypeError,
            format!(
                "{name}() missing {} required keyword-only {noun}: {joined}",
                missing_names.len()
            ),
        )
        .into()
    }

    /// Creates a TypeError for an ordering comparison between unorderable values.
    ///
    /// Matches CPython's format: `'<' not supported between instances of 'A' and 'B'`
    #[must_use]
    pub(crate) fn type_error_compare(op: &str, lhs_type: impl Display, rhs_type: impl Display) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("'{op}' not supported between instances of '{lhs_type}' and '{rhs_type}'"),
        )
        .into()
    }

    /// Creates a simple ValueError with a custom message.
    #[must_use]
    pub(crate) fn value_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::ValueError, msg).into()
    }

    /// Creates a RecursionError raised when nested data exceeds the data depth limit.
    #[must_use]
    pub(crate) fn recursion_error(context: &str) -> RunError {
        SimpleException::new_msg(
            Self::RecursionError,
            format!("maximum recursion depth exceeded {context}"),
        )
        .into()
    }
}

/// A raised exception: its kind plus an optional message argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    /// Creates an exception with an optional message.
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    /// Creates an exception carrying a message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, msg: impl Display) -> Self {
        Self {
            exc_type,
            arg: Some(msg.to_string()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    /// Python-style repr, e.g. `TypeError('bad value')`.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let type_str: &'static str = self.exc_type.into();
        match &self.arg {
            Some(arg) => format!("{type_str}({})", crate::value::string_repr(arg)),
            None => format!("{type_str}()"),
        }
    }
}

impl Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_str: &'static str = self.exc_type.into();
        match &self.arg {
            Some(arg) if !arg.is_empty() => write!(f, "{type_str}: {arg}"),
            _ => f.write_str(type_str),
        }
    }
}

/// Error produced by record and host operations: a raised exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError(Box<SimpleException>);

impl RunError {
    /// Returns the exception kind.
    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.0.exc_type()
    }

    /// Returns true if this error would be caught by `except handler_type:`.
    #[must_use]
    pub fn is(&self, handler_type: ExcType) -> bool {
        self.exc_type().is_subclass_of(handler_type)
    }

    /// Returns the message attached to the error, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.0.arg()
    }

    /// Returns the underlying exception.
    #[must_use]
    pub fn exception(&self) -> &SimpleException {
        &self.0
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RunError {}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self(Box::new(exc))
    }
}
