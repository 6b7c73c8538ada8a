//! Polymorphic type registry.
//!
//! A polymorphic reference travels as `{"type": tag, "value": message}`.
//! The receiver turns the tag back into a fresh value through a factory
//! table built once at startup.

use crate::error::{MirrorError, MirrorResult};
use crate::node::{AnyMirrored, Mirrored};
use indexmap::IndexMap;
use std::fmt;

/// A type that can sit behind a [`MirroredRef`](crate::MirroredRef).
pub trait Tagged {
    /// Stable wire name of the type. Must be unique within a registry.
    const TYPE_TAG: &'static str;
}

/// Object-safe view of a registered type.
///
/// Implemented for every `Tagged + Mirrored + Clone + Send` type.
pub trait MirroredObject: AnyMirrored + Send {
    /// Wire name of the concrete type.
    fn type_tag(&self) -> &'static str;

    /// Clone behind a box.
    fn clone_object(&self) -> Box<dyn MirroredObject>;

    /// Content equality across the erased type. Values of different
    /// concrete types are never equal.
    fn content_equals_object(&self, other: &dyn MirroredObject) -> bool;
}

impl<T> MirroredObject for T
where
    T: Tagged + Mirrored + Clone + Send + 'static,
{
    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn clone_object(&self) -> Box<dyn MirroredObject> {
        Box::new(self.clone())
    }

    fn content_equals_object(&self, other: &dyn MirroredObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self.content_equals(other))
    }
}

/// Creates a default value of a registered type.
pub type Factory = fn() -> Box<dyn MirroredObject>;

fn make<T>() -> Box<dyn MirroredObject>
where
    T: Tagged + Mirrored + Clone + Send + Default + 'static,
{
    Box::new(T::default())
}

/// Tag to factory table.
pub struct TypeRegistry {
    factories: IndexMap<&'static str, Factory>,
}

impl TypeRegistry {
    /// Start building a registry.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Build a default value for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::UnregisteredType`] for an unknown tag.
    pub fn create(&self, tag: &str) -> MirrorResult<Box<dyn MirroredObject>> {
        self.factories
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| MirrorError::UnregisteredType {
                tag: tag.to_string(),
            })
    }

    /// True when `tag` has a factory.
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

/// Collects factories; duplicate tags surface from [`TypeRegistryBuilder::build`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    factories: IndexMap<&'static str, Factory>,
    duplicate: Option<&'static str>,
}

impl TypeRegistryBuilder {
    /// Register `T` under its [`Tagged::TYPE_TAG`].
    #[must_use]
    pub fn register<T>(self) -> Self
    where
        T: Tagged + Mirrored + Clone + Send + Default + 'static,
    {
        self.register_factory(T::TYPE_TAG, make::<T>)
    }

    /// Register a custom factory under `tag`.
    #[must_use]
    pub fn register_factory(mut self, tag: &'static str, factory: Factory) -> Self {
        if self.factories.insert(tag, factory).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(tag);
        }
        self
    }

    /// Finish the registry.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::DuplicateTypeTag`] if any tag was registered
    /// twice.
    pub fn build(self) -> MirrorResult<TypeRegistry> {
        if let Some(tag) = self.duplicate {
            return Err(MirrorError::DuplicateTypeTag { tag });
        }
        Ok(TypeRegistry {
            factories: self.factories,
        })
    }
}

/// A closed set of types that may appear behind one kind of reference.
///
/// Implement it on a marker type and return a registry built once, for
/// example from a `std::sync::OnceLock`.
pub trait TypeFamily: 'static {
    /// The family's registry.
    fn registry() -> &'static TypeRegistry;
}
