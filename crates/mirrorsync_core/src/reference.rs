//! Polymorphic references.

use crate::error::{MirrorError, MirrorResult};
use crate::node::{apply_child, follow, write_child, Baseline, Mirrored};
use crate::registry::{MirroredObject, TypeFamily};
use crate::wire::{expect_map, TYPE, VALUE};
use mirrorsync_codec::Value;
use std::fmt;
use std::marker::PhantomData;

/// An optional child whose concrete type is chosen at runtime from the
/// family `F`.
///
/// Written as `null` or `{"type": tag, "value": message}`. When the tag
/// matches the current target the value is applied in place; otherwise a
/// fresh target is built from `F`'s registry.
pub struct MirroredRef<F: TypeFamily> {
    target: Option<Box<dyn MirroredObject>>,
    replaced: bool,
    baseline: Baseline,
    recorded: Option<Baseline>,
    family: PhantomData<fn() -> F>,
}

impl<F: TypeFamily> Default for MirroredRef<F> {
    fn default() -> Self {
        Self {
            target: None,
            replaced: false,
            baseline: Baseline::fresh(),
            recorded: None,
            family: PhantomData,
        }
    }
}

impl<F: TypeFamily> Clone for MirroredRef<F> {
    fn clone(&self) -> Self {
        let target = self.target.as_ref().map(|t| t.clone_object());
        let recorded = target.as_ref().and_then(|t| t.baseline());
        Self {
            target,
            replaced: self.replaced || self.swapped(),
            baseline: Baseline::fresh(),
            recorded,
            family: PhantomData,
        }
    }
}

impl<F: TypeFamily> MirroredRef<F> {
    /// An empty, clean reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean reference to `value`.
    pub fn with_target<T: MirroredObject>(value: T) -> Self {
        let recorded = value.baseline();
        Self {
            target: Some(Box::new(value)),
            recorded,
            ..Self::default()
        }
    }

    /// True when the target was swapped through a mutable borrow since the
    /// last clean point.
    fn swapped(&self) -> bool {
        self.target.as_ref().and_then(|t| t.baseline()) != self.recorded
    }

    /// True when nothing is referenced.
    pub fn is_none(&self) -> bool {
        self.target.is_none()
    }

    /// Tag of the current target.
    pub fn type_tag(&self) -> Option<&'static str> {
        self.target.as_ref().map(|t| t.type_tag())
    }

    /// Borrow the target, type-erased.
    pub fn get(&self) -> Option<&dyn MirroredObject> {
        self.target.as_deref()
    }

    /// Borrow the target if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.target.as_ref()?.as_any().downcast_ref()
    }

    /// Mutably borrow the target if it is a `T`.
    ///
    /// Changes made through the borrow are found by the dirty check. A target
    /// that keeps no markers of its own marks the reference on access.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let target = self.target.as_mut()?;
        let untracked = target.baseline().is_none();
        let typed = target.as_any_mut().downcast_mut::<T>()?;
        if untracked {
            self.replaced = true;
        }
        Some(typed)
    }

    /// Point at `value`, marking the reference unless the content is
    /// unchanged.
    pub fn set<T: MirroredObject>(&mut self, value: T) {
        self.set_boxed(Box::new(value));
    }

    /// Point at an already boxed value.
    pub fn set_boxed(&mut self, value: Box<dyn MirroredObject>) {
        let same = self
            .target
            .as_ref()
            .is_some_and(|current| current.content_equals_object(value.as_ref()));
        if !same {
            self.target = Some(value);
            self.replaced = true;
        }
    }

    /// Drop the target and return it.
    pub fn take(&mut self) -> Option<Box<dyn MirroredObject>> {
        let taken = self.target.take();
        if taken.is_some() {
            self.replaced = true;
        }
        taken
    }

    /// Drop the target.
    pub fn clear(&mut self) {
        self.take();
    }
}

impl<F: TypeFamily> Mirrored for MirroredRef<F> {
    fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        let Some(target) = &self.target else {
            return Ok(Value::Null);
        };
        let value = write_child(target.as_ref(), dirty_only && !self.replaced && !self.swapped())?;
        Ok(Value::object([
            (TYPE, Value::from(target.type_tag())),
            (VALUE, value),
        ]))
    }

    fn read(&mut self, message: &Value) -> MirrorResult<()> {
        let before = self.target.as_ref().and_then(|t| t.baseline());
        if message.is_null() {
            self.target = None;
            follow(&mut self.recorded, before, None);
            return Ok(());
        }
        expect_map(message)?;
        let tag = message
            .get(TYPE)
            .and_then(Value::as_text)
            .ok_or_else(|| MirrorError::malformed("reference without a type tag"))?;
        let value = message.get(VALUE).unwrap_or(&Value::Null);

        if let Some(target) = self.target.as_mut().filter(|t| t.type_tag() == tag) {
            apply_child(target.as_mut(), value)?;
        } else {
            let mut fresh = F::registry().create(tag)?;
            fresh.reset_from(value)?;
            self.target = Some(fresh);
        }
        let after = self.target.as_ref().and_then(|t| t.baseline());
        follow(&mut self.recorded, before, after);
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.replaced || self.swapped() || self.target.as_ref().is_some_and(|t| t.is_dirty())
    }

    fn mark_clean(&mut self) {
        self.replaced = false;
        if let Some(target) = &mut self.target {
            target.mark_clean();
        }
        self.recorded = self.target.as_ref().and_then(|t| t.baseline());
    }

    fn baseline(&self) -> Option<Baseline> {
        Some(self.baseline)
    }

    fn content_equals(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (None, None) => true,
            (Some(a), Some(b)) => a.content_equals_object(b.as_ref()),
            _ => false,
        }
    }

    fn describe(&self, out: &mut String, indent: usize) {
        match &self.target {
            None => out.push_str("null"),
            Some(target) => {
                out.push('&');
                if self.replaced || self.swapped() {
                    out.push('*');
                }
                target.describe(out, indent);
            }
        }
    }
}

impl<F: TypeFamily> fmt::Debug for MirroredRef<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirroredRef")
            .field("type", &self.type_tag())
            .field("replaced", &self.replaced)
            .finish()
    }
}
