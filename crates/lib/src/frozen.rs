//! Read-only snapshots of build configuration.
//!
//! Once a step starts, its configuration is frozen: the step body, the
//! executing build system and every template substitution read the same
//! values, even while the orchestrator keeps preparing the next step from the
//! mutable original.
//!
//! A [`Frozen`] value has no write path. [`Frozen::assign`] exists for callers
//! that write attributes by name and always reports the attempt as an error.

use std::any::type_name;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrozenError {
  #[error("cannot assign '{attr}' on frozen {object}")]
  Immutable { attr: String, object: String },
}

/// An immutable, cheaply clonable snapshot.
///
/// Plain fields are read through `Deref`. Nested values can be taken out as
/// their own snapshot with [`Frozen::view`]. Closures stored in the snapshot
/// stay callable.
pub struct Frozen<T> {
  inner: Arc<T>,
}

/// Freeze a value, taking ownership so no mutable handle to it remains.
pub fn freeze<T>(value: T) -> Frozen<T> {
  Frozen { inner: Arc::new(value) }
}

impl<T> Frozen<T> {
  /// Freeze a nested value.
  ///
  /// Each call produces a fresh snapshot: two views of the same field are
  /// equal in value but are not the same allocation.
  pub fn view<U: Clone>(&self, select: impl FnOnce(&T) -> &U) -> Frozen<U> {
    freeze(select(&self.inner).clone())
  }

  /// Reject a write to `attr`.
  pub fn assign(&self, attr: &str) -> Result<(), FrozenError> {
    Err(FrozenError::Immutable {
      attr: attr.to_string(),
      object: type_name::<T>().to_string(),
    })
  }

  /// Whether both handles share one snapshot.
  pub fn ptr_eq(a: &Self, b: &Self) -> bool {
    Arc::ptr_eq(&a.inner, &b.inner)
  }
}

impl<T> Deref for Frozen<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.inner
  }
}

impl<T> Clone for Frozen<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T: fmt::Debug> fmt::Debug for Frozen<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Frozen").field(&*self.inner).finish()
  }
}

impl<T: PartialEq> PartialEq for Frozen<T> {
  fn eq(&self, other: &Self) -> bool {
    *self.inner == *other.inner
  }
}
