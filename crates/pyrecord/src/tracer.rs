//! Record transform tracing infrastructure.
//!
//! Decoration is observable through the [`TransformTracer`] trait: hook points
//! fire as fields are collected, policy is resolved and methods are installed.
//! Concrete implementations decide what to do with them:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (default) |
//! | [`StderrTracer`] | Human-readable transform log to stderr |
//! | [`RecordingTracer`] | Full event recording for assertions and post-mortem |
//!
//! # Usage
//!
//! ```ignore
//! // Default (zero overhead):
//! let cls = dataclass_with(options).apply(&cls)?;
//!
//! // Debugging:
//! dataclass_with(options).apply_traced(&cls, &mut StderrTracer::new())?;
//!
//! // Assertions:
//! let mut tracer = RecordingTracer::new();
//! dataclass_with(options).apply_traced(&cls, &mut tracer)?;
//! assert!(tracer.events().iter().any(|e| matches!(e, TraceEvent::HashSuppressed { .. })));
//! ```

use crate::{
    field::FieldSpec,
    transform_spec::{HashMode, TransformSpec},
};

/// Trace event emitted while transforming a class.
///
/// Used by [`RecordingTracer`] to capture a full transform trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A field was added to the registry under construction.
    FieldCollected {
        class_name: String,
        field_name: String,
        /// True when the field came from a base class registry.
        inherited: bool,
    },
    /// A field redeclared by the class replaced an earlier entry in place.
    FieldOverridden { class_name: String, field_name: String },
    /// The class-level policy was resolved.
    PolicyResolved {
        class_name: String,
        hash_mode: HashMode,
        field_count: usize,
    },
    /// A generated attribute was written to the class namespace.
    MethodInstalled { class_name: String, method_name: String },
    /// `__hash__` was set to `None`, making instances unhashable.
    HashSuppressed { class_name: String },
    /// The field registry was stored on the class.
    RegistryStored { class_name: String, field_count: usize },
}

/// Trait for record transform tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code. Implementations only override the hooks they care about.
///
/// Transform entry points take the tracer as a type parameter
/// `Tr: TransformTracer`, so no-op calls are inlined away.
pub trait TransformTracer: std::fmt::Debug {
    /// Called for every field entering the registry, inherited fields first.
    ///
    /// # Arguments
    /// * `class_name` - Name of the class being transformed
    /// * `field` - The adopted field spec
    /// * `inherited` - Whether the field came from a base class registry
    #[inline(always)]
    fn on_field_collected(&mut self, _class_name: &str, _field: &FieldSpec, _inherited: bool) {}

    /// Called when a redeclared field replaces an existing entry (keeping its position).
    #[inline(always)]
    fn on_field_overridden(&mut self, _class_name: &str, _field: &FieldSpec) {}

    /// Called once the class-level flags and hash mode are known.
    #[inline(always)]
    fn on_policy_resolved(&mut self, _spec: &TransformSpec) {}

    /// Called for each attribute the installer writes to the class namespace.
    #[inline(always)]
    fn on_method_installed(&mut self, _class_name: &str, _method_name: &str) {}

    /// Called when `__hash__` is explicitly set to `None`.
    #[inline(always)]
    fn on_hash_suppressed(&mut self, _class_name: &str) {}

    /// Called after the registry is stored under `__dataclass_fields__`.
    #[inline(always)]
    fn on_registry_stored(&mut self, _class_name: &str, _field_count: usize) {}
}

// ============================================================================
// NoopTracer
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl TransformTracer for NoopTracer {}

// ============================================================================
// StderrTracer
// ============================================================================

/// Tracer that prints a human-readable transform log to stderr.
///
/// Output format:
/// ```text
/// [Point] field x (declared)
/// [Point] field y (inherited)
/// [Point] policy init=true repr=true eq=true order=false frozen=true hash=Generate fields=2
///   +++ __init__
///   +++ __hash__
/// [Point] registry stored (2 fields)
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Number of lines written so far.
    lines: usize,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of log lines written.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        eprintln!("{line}");
        self.lines += 1;
    }
}

impl TransformTracer for StderrTracer {
    fn on_field_collected(&mut self, class_name: &str, field: &FieldSpec, inherited: bool) {
        let origin = if inherited { "inherited" } else { "declared" };
        self.emit(format_args!("[{class_name}] field {} ({origin})", field.name()));
    }

    fn on_field_overridden(&mut self, class_name: &str, field: &FieldSpec) {
        self.emit(format_args!("[{class_name}] field {} overridden", field.name()));
    }

    fn on_policy_resolved(&mut self, spec: &TransformSpec) {
        self.emit(format_args!(
            "[{}] policy init={} repr={} eq={} order={} frozen={} hash={:?} fields={}",
            spec.class_name(),
            spec.init(),
            spec.repr(),
            spec.eq(),
            spec.order(),
            spec.frozen(),
            spec.hash_mode(),
            spec.fields().len()
        ));
    }

    fn on_method_installed(&mut self, _class_name: &str, method_name: &str) {
        self.emit(format_args!("  +++ {method_name}"));
    }

    fn on_hash_suppressed(&mut self, class_name: &str) {
        self.emit(format_args!("[{class_name}] __hash__ = None"));
    }

    fn on_registry_stored(&mut self, class_name: &str, field_count: usize) {
        self.emit(format_args!("[{class_name}] registry stored ({field_count} fields)"));
    }
}

// ============================================================================
// RecordingTracer
// ============================================================================

/// Tracer that records every event.
///
/// Retrieve the trace via [`RecordingTracer::events`] after the transform.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Names of the installed attributes, in installation order.
    #[must_use]
    pub fn installed_methods(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                TraceEvent::MethodInstalled { method_name, .. } => Some(method_name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl TransformTracer for RecordingTracer {
    fn on_field_collected(&mut self, class_name: &str, field: &FieldSpec, inherited: bool) {
        self.events.push(TraceEvent::FieldCollected {
            class_name: class_name.to_owned(),
            field_name: field.name().to_owned(),
            inherited,
        });
    }

    fn on_field_overridden(&mut self, class_name: &str, field: &FieldSpec) {
        self.events.push(TraceEvent::FieldOverridden {
            class_name: class_name.to_owned(),
            field_name: field.name().to_owned(),
        });
    }

    fn on_policy_resolved(&mut self, spec: &TransformSpec) {
        self.events.push(TraceEvent::PolicyResolved {
            class_name: spec.class_name().to_owned(),
            hash_mode: spec.hash_mode(),
            field_count: spec.fields().len(),
        });
    }

    fn on_method_installed(&mut self, class_name: &str, method_name: &str) {
        self.events.push(TraceEvent::MethodInstalled {
            class_name: class_name.to_owned(),
            method_name: method_name.to_owned(),
        });
    }

    fn on_hash_suppressed(&mut self, class_name: &str) {
        self.events.push(TraceEvent::HashSuppressed {
            class_name: class_name.to_owned(),
        });
    }

    fn on_registry_stored(&mut self, class_name: &str, field_count: usize) {
        self.events.push(TraceEvent::RegistryStored {
            class_name: class_name.to_owned(),
            field_count,
        });
    }
}
