use crate::{
    exception::{ExcType, RunResult},
    value::Value,
};

/// Keyword arguments in call order.
pub type KwargsValues = Vec<(String, Value)>;

/// Arguments passed to a call.
///
/// Uses specific variants for common cases (0-2 positional arguments, no keywords).
/// Generated methods take a receiver plus at most one operand, so this avoids
/// allocating a `Vec` for the vast majority of calls.
#[derive(Debug, Clone, Default)]
pub enum ArgValues {
    #[default]
    Empty,
    One(Value),
    Two(Value, Value),
    Kwargs(KwargsValues),
    ArgsKargs { args: Vec<Value>, kwargs: KwargsValues },
}

impl ArgValues {
    /// Builds arguments from positional values and keywords, picking the smallest variant.
    #[must_use]
    pub fn new(args: Vec<Value>, kwargs: KwargsValues) -> Self {
        if !kwargs.is_empty() {
            return if args.is_empty() {
                Self::Kwargs(kwargs)
            } else {
                Self::ArgsKargs { args, kwargs }
            };
        }
        let mut iter = args.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (None, _, _) => Self::Empty,
            (Some(a), None, _) => Self::One(a),
            (Some(a), Some(b), None) => Self::Two(a, b),
            (Some(a), Some(b), Some(c)) => {
                let mut args = vec![a, b, c];
                args.extend(iter);
                Self::ArgsKargs {
                    args,
                    kwargs: KwargsValues::new(),
                }
            }
        }
    }

    /// Builds keyword-only arguments from `(name, value)` pairs.
    #[must_use]
    pub fn kwargs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::new(Vec::new(), pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Checks that zero arguments were passed.
    pub fn check_zero_args(self, name: &str) -> RunResult<()> {
        match self {
            Self::Empty => Ok(()),
            other => Err(ExcType::type_error(format!(
                "{name}() takes no arguments ({} given)",
                other.len()
            ))),
        }
    }

    /// Checks that exactly one positional argument was passed, returning it.
    pub fn get_one_arg(self, name: &str) -> RunResult<Value> {
        match self {
            Self::One(a) => Ok(a),
            other => Err(ExcType::type_error_arg_count(name, 1, other.len())),
        }
    }

    /// Checks that exactly two positional arguments were passed, returning them as a tuple.
    pub fn get_two_args(self, name: &str) -> RunResult<(Value, Value)> {
        match self {
            Self::Two(a1, a2) => Ok((a1, a2)),
            other => Err(ExcType::type_error_arg_count(name, 2, other.len())),
        }
    }

    /// Splits into positional arguments and keywords.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, KwargsValues) {
        match self {
            Self::Empty => (Vec::new(), KwargsValues::new()),
            Self::One(a) => (vec![a], KwargsValues::new()),
            Self::Two(a, b) => (vec![a, b], KwargsValues::new()),
            Self::Kwargs(kwargs) => (Vec::new(), kwargs),
            Self::ArgsKargs { args, kwargs } => (args, kwargs),
        }
    }

    /// Prepends a receiver (`self`) to the positional arguments.
    #[must_use]
    pub fn with_receiver(self, receiver: Value) -> Self {
        let (mut args, kwargs) = self.into_parts();
        args.insert(0, receiver);
        Self::new(args, kwargs)
    }

    /// Total number of arguments, positional and keyword.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(_, _) => 2,
            Self::Kwargs(kwargs) => kwargs.len(),
            Self::ArgsKargs { args, kwargs } => args.len() + kwargs.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_picks_smallest_variant() {
        assert!(matches!(ArgValues::new(vec![], vec![]), ArgValues::Empty));
        assert!(matches!(ArgValues::new(vec![Value::Int(1)], vec![]), ArgValues::One(_)));
        assert!(matches!(
            ArgValues::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)], vec![]),
            ArgValues::ArgsKargs { ref args, .. } if args.len() == 3
        ));
        assert!(matches!(ArgValues::kwargs([("a", Value::Int(1))]), ArgValues::Kwargs(_)));
    }

    #[test]
    fn receiver_is_prepended() {
        let args = ArgValues::kwargs([("a", Value::Int(1))]).with_receiver(Value::None);
        let (positional, kwargs) = args.into_parts();
        assert_eq!(positional.len(), 1);
        assert_eq!(kwargs.len(), 1);
    }
}
