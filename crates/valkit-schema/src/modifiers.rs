//! Wrappers that adjust how a schema treats nil and failure.
//!
//! None of these introduce a new node kind: they set flags and slots on a
//! fresh copy of the internals, which the engine consults during nil
//! normalisation and after the checks.

use std::sync::Arc;

use valkit_issue::ErrorOverride;
use valkit_value::Value;

use crate::output::Output;
use crate::registry::{global_registry, Metadata};
use crate::schema::{Catch, CatchContext, Fill, Schema};

impl<T: Output> Schema<T> {
    /// Accept nil and absence.
    pub fn optional(&self) -> Schema<Option<T::Base>> {
        self.derive(|i| {
            i.flags.optional = true;
            i.flags.non_optional = false;
        })
    }

    /// Accept absence only; a present nil is still rejected.
    pub fn exact_optional(&self) -> Schema<T> {
        self.derive(|i| {
            i.flags.exact_optional = true;
            i.flags.non_optional = false;
        })
    }

    /// Accept nil but not absence.
    pub fn nilable(&self) -> Schema<Option<T::Base>> {
        self.derive(|i| {
            i.flags.nilable = true;
            i.flags.non_optional = false;
        })
    }

    /// Accept both nil and absence.
    pub fn nullish(&self) -> Schema<Option<T::Base>> {
        self.derive(|i| {
            i.flags.optional = true;
            i.flags.nilable = true;
            i.flags.non_optional = false;
        })
    }

    /// Reject nil and absence with `non_optional`.
    pub fn non_optional(&self) -> Schema<T::Base> {
        self.derive(|i| {
            i.flags.optional = false;
            i.flags.nilable = false;
            i.flags.exact_optional = false;
            i.flags.non_optional = true;
        })
    }

    /// Return `value` for nil input without validating it.
    pub fn default(&self, value: impl Into<T::Base>) -> Schema<T::Base> {
        let value: Value = value.into().into();
        self.derive(|i| i.default = Some(Fill::Value(value)))
    }

    /// Like [`default`](Self::default), computing the value on each use.
    pub fn default_with<F>(&self, f: F) -> Schema<T::Base>
    where
        F: Fn() -> T::Base + Send + Sync + 'static,
    {
        self.derive(|i| i.default = Some(Fill::Func(Arc::new(move || f().into()))))
    }

    /// Replace nil input with `value` and validate it as usual.
    pub fn prefault(&self, value: impl Into<Value>) -> Schema<T> {
        let value = value.into();
        self.derive(|i| i.prefault = Some(Fill::Value(value)))
    }

    pub fn prefault_with<F>(&self, f: F) -> Schema<T>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.derive(|i| i.prefault = Some(Fill::Func(Arc::new(f))))
    }

    /// Marker only; parsing is unchanged.
    pub fn readonly(&self) -> Schema<T> {
        self.derive(|i| i.flags.readonly = true)
    }

    /// On any failure, succeed with `value` instead.
    pub fn catch(&self, value: impl Into<T::Base>) -> Schema<T> {
        let value: Value = value.into().into();
        self.derive(|i| i.catch = Some(Catch::Value(value)))
    }

    /// On any failure, succeed with the value `f` computes from the
    /// discarded issues and the original input.
    pub fn catch_with<F>(&self, f: F) -> Schema<T>
    where
        F: Fn(&CatchContext<'_>) -> T::Base + Send + Sync + 'static,
    {
        self.derive(|i| i.catch = Some(Catch::Func(Arc::new(move |ctx| f(ctx).into()))))
    }

    /// Convert the input to this schema's type before validating it.
    pub fn coerce(&self) -> Schema<T> {
        self.derive(|i| i.coerce = true)
    }

    /// Message override for issues this schema raises itself.
    pub fn error(&self, error: impl Into<ErrorOverride>) -> Schema<T> {
        let error = error.into();
        self.derive(|i| i.error = Some(error))
    }

    /// Register a description in the global metadata registry.
    pub fn describe(&self, description: impl Into<String>) -> Schema<T> {
        let mut metadata = self.metadata().unwrap_or_default();
        metadata.description = Some(description.into());
        self.meta(metadata)
    }

    /// Register `metadata` for a new copy of this schema.
    pub fn meta(&self, metadata: Metadata) -> Schema<T> {
        let next: Schema<T> = self.derive(|i| i.registered = true);
        global_registry().add(next.id(), metadata);
        next
    }
}
