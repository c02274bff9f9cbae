//! Projection of the nested store onto typed structures.
//!
//! A target declares its fields with [`bindable!`](crate::bindable): each field gets a
//! path tag (lower-cased, defaulting to the field name) that is appended to the enclosing
//! prefix with `.`. Nested structures declared the same way are bound recursively.
//!
//! ```
//! use nemo::{bindable, Binder, NestedStore};
//!
//! #[derive(Debug, Default)]
//! struct Http {
//!     host: String,
//!     port: u16,
//! }
//! bindable!(Http { host, port });
//!
//! #[derive(Debug, Default)]
//! struct Server {
//!     http: Http,
//!     workers: Option<usize>,
//! }
//! bindable!(Server { http => "HTTP", workers });
//!
//! let mut store = NestedStore::new();
//! store.set("server.http.host", "localhost");
//! store.set("server.http.port", "8080");
//!
//! let mut server = Server::default();
//! Binder::new().bind("server", &mut server, &store)?;
//! assert_eq!(server.http.port, 8080);
//! assert_eq!(server.workers, None);
//! # Ok::<(), nemo::BindError>(())
//! ```

mod coerce;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{NestedStore, Value};

pub use coerce::FromValue;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("value at '{path}' is a {found}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} at '{path}' is out of range for {target}")]
    OutOfRange {
        path: String,
        value: String,
        target: &'static str,
    },

    #[error("value '{value}' at '{path}' is not a valid {target}")]
    InvalidValue {
        path: String,
        value: String,
        target: &'static str,
    },

    #[error("failed to extract configuration: {0}")]
    Extract(#[from] toml::de::Error),
}

/// A structure whose fields can be bound from the store.
///
/// Implement with [`bindable!`](crate::bindable).
pub trait Bind {
    /// Binds every field; `prefix` is empty or ends with `.`.
    fn bind_fields(&mut self, prefix: &str, store: &NestedStore) -> Result<(), BindError>;
}

/// A single field bound from the value at `path`.
pub trait BindField {
    fn bind_field(&mut self, path: &str, store: &NestedStore) -> Result<(), BindError>;
}

/// Reads the value at `path`; absent or null leaves `target` untouched.
fn bind_scalar<T: FromValue>(
    target: &mut T,
    path: &str,
    store: &NestedStore,
) -> Result<(), BindError> {
    match store.get(path) {
        Some(value) if !value.is_null() => {
            *target = T::from_value(value, path)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

macro_rules! scalar_bind_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BindField for $ty {
                fn bind_field(&mut self, path: &str, store: &NestedStore) -> Result<(), BindError> {
                    bind_scalar(self, path, store)
                }
            }
        )*
    };
}

scalar_bind_field!(
    String, bool, char, PathBuf, Value, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32,
    f64,
);

impl<T: FromValue> BindField for Option<T> {
    fn bind_field(&mut self, path: &str, store: &NestedStore) -> Result<(), BindError> {
        bind_scalar(self, path, store)
    }
}

impl<T: FromValue> BindField for Vec<T> {
    fn bind_field(&mut self, path: &str, store: &NestedStore) -> Result<(), BindError> {
        bind_scalar(self, path, store)
    }
}

/// Full path of a field: the prefix followed by the lower-cased tag.
#[doc(hidden)]
pub fn field_path(prefix: &str, tag: &str) -> String {
    format!("{prefix}{}", tag.to_lowercase())
}

/// A non-blank prefix gets a trailing `.`; a blank one binds from the root.
pub fn nested_prefix(prefix: &str) -> String {
    if prefix.trim().is_empty() {
        String::new()
    } else if prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{prefix}.")
    }
}

/// Binds targets against a store, optionally with a default prefix.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    prefix: String,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Binds using the prefix this binder was built with.
    pub fn bind_default<T: Bind + ?Sized>(
        &self,
        target: &mut T,
        store: &NestedStore,
    ) -> Result<(), BindError> {
        self.bind(&self.prefix, target, store)
    }

    /// Fields bound before a coercion failure keep their new values.
    pub fn bind<T: Bind + ?Sized>(
        &self,
        prefix: &str,
        target: &mut T,
        store: &NestedStore,
    ) -> Result<(), BindError> {
        target.bind_fields(&nested_prefix(prefix), store)
    }
}

/// Declares the field table of a structure so it can be bound.
///
/// `bindable!(Type { field, other => "tag" })` implements [`Bind`] and [`BindField`] for
/// `Type`, which must implement `Default`. A field without `=> "tag"` uses its own name.
/// When bound as a nested field, a fresh `Type::default()` is bound and then assigned.
#[macro_export]
macro_rules! bindable {
    (@tag $field:ident) => {
        stringify!($field)
    };
    (@tag $field:ident $tag:literal) => {
        $tag
    };
    ($ty:ty { $($field:ident $(=> $tag:literal)?),* $(,)? }) => {
        impl $crate::binder::Bind for $ty {
            fn bind_fields(
                &mut self,
                prefix: &str,
                store: &$crate::NestedStore,
            ) -> ::std::result::Result<(), $crate::BindError> {
                $(
                    let path = $crate::binder::field_path(
                        prefix,
                        $crate::bindable!(@tag $field $($tag)?),
                    );
                    $crate::binder::BindField::bind_field(&mut self.$field, &path, store)?;
                )*
                let _ = (prefix, store);
                Ok(())
            }
        }

        impl $crate::binder::BindField for $ty {
            fn bind_field(
                &mut self,
                path: &str,
                store: &$crate::NestedStore,
            ) -> ::std::result::Result<(), $crate::BindError> {
                let mut nested = <$ty as ::std::default::Default>::default();
                $crate::binder::Bind::bind_fields(
                    &mut nested,
                    &$crate::binder::nested_prefix(path),
                    store,
                )?;
                *self = nested;
                Ok(())
            }
        }
    };
}
