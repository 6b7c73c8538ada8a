//! Record types with named fields.
//!
//! A composite is declared with [`mirrored_composite!`](crate::mirrored_composite),
//! which generates the struct, its accessors and the [`Composite`] and
//! [`Mirrored`] impls. The functions in this module are the shared engine
//! those impls delegate to.

use crate::dirty::{DirtyBits, DirtyPolicy};
use crate::error::{MirrorError, MirrorResult};
use crate::node::{apply_child, follow, newline, write_child, Baseline, Mirrored};
use crate::wire::expect_map;
use mirrorsync_codec::Value;
use tracing::trace;

/// A record of named child nodes with a fixed dirty policy.
pub trait Composite: Mirrored + Default {
    /// How the fields' changes are tracked.
    const POLICY: DirtyPolicy;

    /// Field names in declaration order. These are the message keys.
    const FIELDS: &'static [&'static str];

    /// False when incoming messages must not change an existing value.
    const MUTABLE: bool;

    /// Borrow a field by declaration index.
    fn field(&self, index: usize) -> Option<&dyn Mirrored>;

    /// Mutably borrow a field by declaration index. Does not mark it.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Mirrored>;

    /// The record's own dirty markers.
    fn tracker(&self) -> &FieldTracker;

    /// Mutable access to the record's own dirty markers.
    fn tracker_mut(&mut self) -> &mut FieldTracker;
}

/// Dirty markers of one composite value, laid out for its policy, plus
/// the baselines its fields had at the last clean point.
pub struct FieldTracker {
    policy: DirtyPolicy,
    bits: DirtyBits,
    baseline: Baseline,
    children: Vec<Option<Baseline>>,
}

impl FieldTracker {
    /// Clear markers for a record with `fields` fields.
    pub fn new(policy: DirtyPolicy, fields: usize) -> Self {
        let len = match policy {
            DirtyPolicy::Never => 0,
            DirtyPolicy::Any => 1,
            DirtyPolicy::Complex => fields,
        };
        Self {
            policy,
            bits: DirtyBits::new(len),
            baseline: Baseline::fresh(),
            children: vec![None; fields],
        }
    }

    /// Record a change to the field at `index`.
    pub fn touch(&mut self, index: usize) {
        match self.policy {
            DirtyPolicy::Never => {}
            DirtyPolicy::Any => self.bits.set(0),
            DirtyPolicy::Complex => self.bits.set(index),
        }
    }

    /// True when the field at `index` was replaced since the last clean point.
    pub fn is_set(&self, index: usize) -> bool {
        match self.policy {
            DirtyPolicy::Never => false,
            DirtyPolicy::Any => self.bits.bit(0),
            DirtyPolicy::Complex => self.bits.bit(index),
        }
    }

    /// True when any marker is set.
    pub fn any(&self) -> bool {
        !self.bits.is_clear()
    }

    /// Clear every marker.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// The policy these markers follow.
    pub fn policy(&self) -> DirtyPolicy {
        self.policy
    }

    /// Baseline of the record owning these markers.
    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Baseline recorded for the field at `index`.
    pub fn recorded(&self, index: usize) -> Option<Baseline> {
        self.children.get(index).copied().flatten()
    }

    /// Remember the baseline of the field at `index`.
    pub fn record(&mut self, index: usize, baseline: Option<Baseline>) {
        if let Some(slot) = self.children.get_mut(index) {
            *slot = baseline;
        }
    }
}

/// A copy carries the same markers under a new baseline.
impl Clone for FieldTracker {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy,
            bits: self.bits.clone(),
            baseline: Baseline::fresh(),
            children: self.children.clone(),
        }
    }
}

impl std::fmt::Debug for FieldTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:?}", self.policy.as_str(), self.bits)
    }
}

/// Write a composite as a map of field name to field message.
///
/// A full write carries every field. A dirty-only write depends on the
/// policy: `Never` still carries every field, `Any` carries nothing or
/// everything, and `Complex` carries replaced fields in full plus in-place
/// changed fields as their own dirty-only messages.
pub fn write_fields<C: Composite>(node: &C, dirty_only: bool) -> MirrorResult<Value> {
    let everything = !dirty_only
        || match C::POLICY {
            DirtyPolicy::Never => true,
            DirtyPolicy::Any => is_dirty(node),
            DirtyPolicy::Complex => false,
        };

    let mut out = Vec::with_capacity(C::FIELDS.len());
    for (index, name) in C::FIELDS.iter().enumerate() {
        let Some(field) = node.field(index) else {
            continue;
        };
        let value = if everything || is_replaced(node, index) {
            write_child(field, false)?
        } else if field.is_dirty() {
            write_child(field, true)?
        } else {
            continue;
        };
        out.push((Value::Text((*name).to_string()), value));
    }
    Ok(Value::Map(out))
}

/// Apply a field map onto a composite. A no-op for immutable types.
pub fn read_fields<C: Composite>(node: &mut C, message: &Value) -> MirrorResult<()> {
    if !C::MUTABLE {
        trace!(
            ty = std::any::type_name::<C>(),
            "ignoring update for immutable value"
        );
        return Ok(());
    }
    apply_fields(node, message)
}

/// Replace a composite with a fresh default value and apply a field map
/// onto it, regardless of mutability.
pub fn reset_fields<C: Composite>(node: &mut C, message: &Value) -> MirrorResult<()> {
    let mut fresh = C::default();
    apply_fields(&mut fresh, message)?;
    *node = fresh;
    Ok(())
}

/// Build a new composite from a full field map.
pub fn construct<C: Composite>(message: &Value) -> MirrorResult<C> {
    let mut fresh = C::default();
    apply_fields(&mut fresh, message)?;
    Ok(fresh)
}

fn apply_fields<C: Composite>(node: &mut C, message: &Value) -> MirrorResult<()> {
    for (key, value) in expect_map(message)? {
        let name = key
            .as_text()
            .ok_or_else(|| MirrorError::type_mismatch("field name", key))?;
        match C::FIELDS.iter().position(|field| *field == name) {
            Some(index) => {
                let mut recorded = node.tracker().recorded(index);
                if let Some(field) = node.field_mut(index) {
                    let before = field.baseline();
                    apply_child(field, value)?;
                    follow(&mut recorded, before, field.baseline());
                }
                node.tracker_mut().record(index, recorded);
            }
            None => trace!(
                ty = std::any::type_name::<C>(),
                field = name,
                "skipping unknown field"
            ),
        }
    }
    Ok(())
}

/// True when the field at `index` must be written in full: it was set or
/// accessed as an untracked value, or a different node now sits in it.
pub fn is_replaced<C: Composite>(node: &C, index: usize) -> bool {
    node.tracker().is_set(index)
        || node
            .field(index)
            .is_some_and(|f| f.baseline() != node.tracker().recorded(index))
}

/// Own markers first, then each field. Always false under `Never`.
pub fn is_dirty<C: Composite>(node: &C) -> bool {
    match C::POLICY {
        DirtyPolicy::Never => false,
        DirtyPolicy::Any | DirtyPolicy::Complex => {
            node.tracker().any()
                || (0..C::FIELDS.len()).any(|i| {
                    is_replaced(node, i) || node.field(i).is_some_and(|f| f.is_dirty())
                })
        }
    }
}

/// Clear own markers and every field's, whatever the policy.
pub fn mark_clean<C: Composite>(node: &mut C) {
    node.tracker_mut().clear();
    for index in 0..C::FIELDS.len() {
        if let Some(field) = node.field_mut(index) {
            field.mark_clean();
        }
    }
    attach_fields(node);
}

/// Record every field's current baseline.
pub fn attach_fields<C: Composite>(node: &mut C) {
    for index in 0..C::FIELDS.len() {
        let baseline = node.field(index).and_then(|f| f.baseline());
        node.tracker_mut().record(index, baseline);
    }
}

/// Finish a clone: record the copied fields and carry over replacements
/// pending on the original as set markers.
pub fn clone_tracking<C: Composite>(original: &C, copy: &mut C) {
    attach_fields(copy);
    for index in 0..C::FIELDS.len() {
        if is_replaced(original, index) {
            copy.tracker_mut().touch(index);
        }
    }
}

/// `None` under `Never`, which keeps no markers a parent could rely on.
pub fn baseline<C: Composite>(node: &C) -> Option<Baseline> {
    match C::POLICY {
        DirtyPolicy::Never => None,
        DirtyPolicy::Any | DirtyPolicy::Complex => Some(node.tracker().baseline()),
    }
}

/// `Name<policy> { field: value ... }`, with `*` after changed fields.
pub fn describe<C: Composite>(node: &C, name: &str, out: &mut String, indent: usize) {
    out.push_str(name);
    out.push('<');
    out.push_str(C::POLICY.as_str());
    if !C::MUTABLE {
        out.push_str(", immutable");
    }
    out.push_str("> {");
    for (index, field_name) in C::FIELDS.iter().enumerate() {
        let Some(field) = node.field(index) else {
            continue;
        };
        newline(out, indent + 1);
        out.push_str(field_name);
        if is_replaced(node, index) || field.is_dirty() {
            out.push('*');
        }
        out.push_str(": ");
        field.describe(out, indent + 1);
    }
    newline(out, indent);
    out.push('}');
}

/// An optional child record. `None` travels as null.
///
/// The option takes the baseline of the value it holds, so a parent sees
/// `None` assigned over `Some`, or one value swapped for another, as a
/// replacement. Changes inside a present value are found by the usual dirty check.
impl<C: Composite> Mirrored for Option<C> {
    fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        match self {
            None => Ok(Value::Null),
            Some(inner) => write_child(inner, dirty_only),
        }
    }

    fn read(&mut self, message: &Value) -> MirrorResult<()> {
        if message.is_null() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => apply_child(inner, message),
            None => {
                *self = Some(construct(message)?);
                Ok(())
            }
        }
    }

    fn is_dirty(&self) -> bool {
        self.as_ref().is_some_and(Mirrored::is_dirty)
    }

    fn baseline(&self) -> Option<Baseline> {
        self.as_ref().and_then(Mirrored::baseline)
    }

    fn mark_clean(&mut self) {
        if let Some(inner) = self {
            inner.mark_clean();
        }
    }

    fn content_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.content_equals(b),
            _ => false,
        }
    }

    fn describe(&self, out: &mut String, indent: usize) {
        match self {
            None => out.push_str("null"),
            Some(inner) => inner.describe(out, indent),
        }
    }

    fn reset_from(&mut self, message: &Value) -> MirrorResult<()> {
        *self = if message.is_null() {
            None
        } else {
            Some(construct(message)?)
        };
        Ok(())
    }
}

/// Declares a replicated record type.
///
/// ```
/// mirrorsync_core::mirrored_composite! {
///     /// A position on the board.
///     pub struct Point: Complex {
///         x: i32 => set_x, x_mut;
///         y: i32 = 10 => set_y, y_mut;
///     }
/// }
///
/// use mirrorsync_core::Mirrored;
///
/// let mut p = Point::new();
/// assert_eq!(*p.y(), 10);
/// p.set_x(5);
/// assert!(p.is_dirty());
/// assert_eq!(p.write(true).unwrap().map_len(), 1);
/// ```
///
/// The header names the struct and its [`DirtyPolicy`] variant, optionally
/// followed by `, immutable`. Each field line gives the field name, its
/// [`Mirrored`] type, an optional default expression, then the names of the
/// generated setter and mutable accessor. A read accessor named after the
/// field is generated as well.
///
/// The setter marks the field only when the new value differs. The mutable
/// accessor marks the field when its value keeps no markers of its own (a
/// leaf, a `Never` record, an empty option). For any other node, changes
/// made in place are found by the parent's dirty check, and a value assigned
/// through the accessor is noticed by its new [`Baseline`](crate::Baseline)
/// and written in full.
///
/// The struct gets `Clone`, `Debug` and `Default` impls; do not derive them.
#[macro_export]
macro_rules! mirrored_composite {
    (@default) => {
        ::core::default::Default::default()
    };
    (@default $value:expr) => {
        $value
    };
    (@mutable) => {
        true
    };
    (@mutable immutable) => {
        false
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $policy:ident $(, $flag:ident)? {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty $(= $default:expr)? => $setter:ident, $muter:ident
            );* $(;)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$fmeta])* $field: $ty,)*
            __tracker: $crate::FieldTracker,
        }

        const _: () = {
            #[allow(non_camel_case_types, dead_code)]
            enum __Field {
                $($field),*
            }

            impl $name {
                /// A value with every field at its default and no dirty markers.
                pub fn new() -> Self {
                    <Self as ::core::default::Default>::default()
                }

                $(
                    #[doc = concat!("The `", stringify!($field), "` field.")]
                    pub fn $field(&self) -> &$ty {
                        &self.$field
                    }

                    #[doc = concat!("Replace `", stringify!($field), "`, marking it if the content changed.")]
                    pub fn $setter(&mut self, value: $ty) {
                        if !$crate::Mirrored::content_equals(&self.$field, &value) {
                            self.$field = value;
                            self.__tracker.touch(__Field::$field as usize);
                        }
                    }

                    #[doc = concat!("Mutable access to `", stringify!($field), "`.")]
                    pub fn $muter(&mut self) -> &mut $ty {
                        if $crate::Mirrored::baseline(&self.$field).is_none() {
                            self.__tracker.touch(__Field::$field as usize);
                        }
                        &mut self.$field
                    }
                )*
            }

            impl ::core::default::Default for $name {
                fn default() -> Self {
                    let mut this = Self {
                        $($field: $crate::mirrored_composite!(@default $($default)?),)*
                        __tracker: $crate::FieldTracker::new(
                            $crate::DirtyPolicy::$policy,
                            <Self as $crate::Composite>::FIELDS.len(),
                        ),
                    };
                    $crate::composite::attach_fields(&mut this);
                    this
                }
            }

            impl ::core::clone::Clone for $name {
                fn clone(&self) -> Self {
                    let mut copy = Self {
                        $($field: ::core::clone::Clone::clone(&self.$field),)*
                        __tracker: ::core::clone::Clone::clone(&self.__tracker),
                    };
                    $crate::composite::clone_tracking(self, &mut copy);
                    copy
                }
            }

            impl $crate::Composite for $name {
                const POLICY: $crate::DirtyPolicy = $crate::DirtyPolicy::$policy;
                const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
                const MUTABLE: bool = $crate::mirrored_composite!(@mutable $($flag)?);

                fn field(&self, index: usize) -> Option<&dyn $crate::Mirrored> {
                    $(
                        if index == __Field::$field as usize {
                            return Some(&self.$field);
                        }
                    )*
                    None
                }

                fn field_mut(&mut self, index: usize) -> Option<&mut dyn $crate::Mirrored> {
                    $(
                        if index == __Field::$field as usize {
                            return Some(&mut self.$field);
                        }
                    )*
                    None
                }

                fn tracker(&self) -> &$crate::FieldTracker {
                    &self.__tracker
                }

                fn tracker_mut(&mut self) -> &mut $crate::FieldTracker {
                    &mut self.__tracker
                }
            }

            impl $crate::Mirrored for $name {
                fn write(&self, dirty_only: bool) -> $crate::MirrorResult<$crate::Value> {
                    $crate::composite::write_fields(self, dirty_only)
                }

                fn read(&mut self, message: &$crate::Value) -> $crate::MirrorResult<()> {
                    $crate::composite::read_fields(self, message)
                }

                fn is_dirty(&self) -> bool {
                    $crate::composite::is_dirty(self)
                }

                fn mark_clean(&mut self) {
                    $crate::composite::mark_clean(self)
                }

                fn content_equals(&self, other: &Self) -> bool {
                    true $(&& $crate::Mirrored::content_equals(&self.$field, &other.$field))*
                }

                fn describe(&self, out: &mut String, indent: usize) {
                    $crate::composite::describe(self, stringify!($name), out, indent)
                }

                fn baseline(&self) -> ::core::option::Option<$crate::Baseline> {
                    $crate::composite::baseline(self)
                }

                fn is_mutable(&self) -> bool {
                    <Self as $crate::Composite>::MUTABLE
                }

                fn reset_from(&mut self, message: &$crate::Value) -> $crate::MirrorResult<()> {
                    $crate::composite::reset_fields(self, message)
                }
            }

            impl ::core::fmt::Debug for $name {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    f.debug_struct(stringify!($name))
                        $(.field(stringify!($field), &self.$field))*
                        .finish()
                }
            }
        };
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::describe_to_string;

    crate::mirrored_composite! {
        struct Point: Complex {
            x: i32 => set_x, x_mut;
            y: i32 => set_y, y_mut;
        }
    }

    crate::mirrored_composite! {
        struct Stats: Any {
            hp: u32 = 100 => set_hp, hp_mut;
            mana: u32 = 50 => set_mana, mana_mut;
        }
    }

    crate::mirrored_composite! {
        struct Color: Never, immutable {
            name: String => set_name, name_mut;
        }
    }

    crate::mirrored_composite! {
        struct Token: Complex {
            at: Point => set_at, at_mut;
            color: Color => set_color, color_mut;
            owner: Option<Point> => set_owner, owner_mut;
            label: String => set_label, label_mut;
        }
    }

    fn color(name: &str) -> Color {
        let mut c = Color::new();
        c.set_name(name.to_string());
        c
    }

    #[test]
    fn complex_writes_changed_fields_only() {
        let mut p = Point::new();
        assert!(!p.is_dirty());
        p.set_x(5);
        assert!(p.is_dirty());
        assert_eq!(
            p.write(true).unwrap(),
            Value::object([("x", Value::Integer(5))])
        );
        assert_eq!(
            p.write(false).unwrap(),
            Value::object([("x", Value::Integer(5)), ("y", Value::Integer(0))])
        );

        p.mark_clean();
        assert!(!p.is_dirty());
        assert_eq!(p.write(true).unwrap(), Value::empty_map());
    }

    #[test]
    fn setting_same_value_is_not_a_change() {
        let mut p = Point::new();
        p.set_y(0);
        assert!(!p.is_dirty());
    }

    #[test]
    fn leaf_accessor_marks_field() {
        let mut p = Point::new();
        *p.y_mut() += 2;
        assert_eq!(
            p.write(true).unwrap(),
            Value::object([("y", Value::Integer(2))])
        );
    }

    #[test]
    fn any_policy_writes_all_or_nothing() {
        let mut s = Stats::new();
        assert_eq!(*s.hp(), 100);
        assert_eq!(s.write(true).unwrap(), Value::empty_map());
        s.set_mana(10);
        assert_eq!(s.write(true).unwrap().map_len(), 2);
        s.mark_clean();
        assert_eq!(s.write(true).unwrap(), Value::empty_map());
    }

    #[test]
    fn never_policy_always_writes_everything() {
        let mut c = color("red");
        assert!(!c.is_dirty());
        assert_eq!(
            c.write(true).unwrap(),
            Value::object([("name", Value::from("red"))])
        );
        c.mark_clean();
        assert!(!c.is_dirty());
    }

    #[test]
    fn immutable_ignores_reads() {
        let mut shared = color("hello");
        let other = color("goodbye");
        shared.read(&other.write(false).unwrap()).unwrap();
        assert_eq!(shared.name(), "hello");

        shared.reset_from(&other.write(false).unwrap()).unwrap();
        assert_eq!(shared.name(), "goodbye");
    }

    #[test]
    fn reads_do_not_dirty() {
        let mut source = Point::new();
        source.set_x(7);
        let mut target = Point::new();
        target.read(&source.write(true).unwrap()).unwrap();
        assert_eq!(*target.x(), 7);
        assert!(!target.is_dirty());
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut p = Point::new();
        let msg = Value::object([("z", Value::Integer(1)), ("x", Value::Integer(4))]);
        p.read(&msg).unwrap();
        assert_eq!(*p.x(), 4);
    }

    #[test]
    fn non_text_field_name_is_rejected() {
        let mut p = Point::new();
        let msg = Value::Map(vec![(Value::Integer(0), Value::Integer(4))]);
        assert!(matches!(
            p.read(&msg),
            Err(MirrorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn nested_change_propagates() {
        let mut sender = Token::new();
        let mut receiver = Token::new();

        sender.at_mut().set_x(3);
        assert!(sender.is_dirty());
        let delta = sender.write(true).unwrap();
        assert_eq!(
            delta,
            Value::object([("at", Value::object([("x", Value::Integer(3))]))])
        );

        receiver.read(&delta).unwrap();
        assert!(receiver.content_equals(&sender));
        sender.mark_clean();
        assert!(!sender.is_dirty());
        assert!(!sender.at().is_dirty());
    }

    #[test]
    fn immutable_child_is_replaced_through_parent() {
        let mut sender = Token::new();
        let mut receiver = Token::new();
        receiver.read(&sender.write(false).unwrap()).unwrap();

        sender.set_color(color("blue"));
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert_eq!(receiver.color().name(), "blue");
    }

    #[test]
    fn optional_child_is_constructed_and_removed() {
        let mut sender = Token::new();
        let mut receiver = Token::new();

        let mut owner = Point::new();
        owner.set_y(9);
        owner.mark_clean();
        sender.set_owner(Some(owner));
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert_eq!(receiver.owner().as_ref().map(|p| *p.y()), Some(9));
        assert!(!receiver.is_dirty());
        sender.mark_clean();

        if let Some(owner) = sender.owner_mut() {
            owner.set_x(1);
        }
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert!(receiver.content_equals(&sender));
        sender.mark_clean();

        sender.set_owner(None);
        assert_eq!(
            sender.write(true).unwrap(),
            Value::object([("owner", Value::Null)])
        );
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert!(receiver.owner().is_none());
    }

    fn point(x: i32, y: i32) -> Point {
        let mut p = Point::new();
        p.set_x(x);
        p.set_y(y);
        p
    }

    #[test]
    fn child_assigned_through_accessor_is_sent_whole() {
        let mut sender = Token::new();
        let mut receiver = Token::new();
        sender.set_at(point(1, 2));
        receiver.read(&sender.write(true).unwrap()).unwrap();
        sender.mark_clean();

        *sender.at_mut() = {
            let mut p = Point::new();
            p.set_x(5);
            p
        };
        assert!(sender.is_dirty());
        let delta = sender.write(true).unwrap();
        assert_eq!(
            delta,
            Value::object([(
                "at",
                Value::object([("x", Value::Integer(5)), ("y", Value::Integer(0))])
            )])
        );
        receiver.read(&delta).unwrap();
        assert!(receiver.content_equals(&sender));
        assert!(!receiver.is_dirty());

        sender.mark_clean();
        assert!(!sender.is_dirty());
    }

    #[test]
    fn option_cleared_through_accessor_is_a_change() {
        let mut sender = Token::new();
        let mut receiver = Token::new();
        sender.set_owner(Some(point(3, 4)));
        receiver.read(&sender.write(true).unwrap()).unwrap();
        sender.mark_clean();

        *sender.owner_mut() = None;
        assert!(sender.is_dirty());
        assert_eq!(
            sender.write(true).unwrap(),
            Value::object([("owner", Value::Null)])
        );
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert!(receiver.owner().is_none());
        sender.mark_clean();

        *sender.owner_mut() = Some(point(0, 6));
        assert!(sender.is_dirty());
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert!(receiver.content_equals(&sender));
    }

    #[test]
    fn never_child_edited_in_place_marks_field() {
        let mut sender = Token::new();
        let mut receiver = Token::new();
        sender.set_color(color("red"));
        receiver.read(&sender.write(false).unwrap()).unwrap();
        sender.mark_clean();

        sender.color_mut().set_name("blue".to_string());
        assert!(sender.is_dirty());
        assert_eq!(
            sender.write(true).unwrap(),
            Value::object([("color", Value::object([("name", Value::from("blue"))]))])
        );
        receiver.read(&sender.write(true).unwrap()).unwrap();
        assert_eq!(receiver.color().name(), "blue");
    }

    #[test]
    fn clone_keeps_dirty_state() {
        let mut token = Token::new();
        token.set_at(point(1, 1));
        token.mark_clean();
        assert!(!token.clone().is_dirty());

        *token.at_mut() = point(2, 2);
        let copy = token.clone();
        assert!(copy.is_dirty());
        assert_eq!(copy.write(true).unwrap(), token.write(true).unwrap());
    }

    #[test]
    fn describe_marks_changed_fields() {
        let mut p = Point::new();
        p.set_x(1);
        assert_eq!(
            describe_to_string(&p),
            "Point<complex> {\n  x*: 1\n  y: 0\n}"
        );
        assert_eq!(
            describe_to_string(&color("red")),
            "Color<never, immutable> {\n  name: \"red\"\n}"
        );
    }

    #[test]
    fn tracker_layout_follows_policy() {
        let mut t = FieldTracker::new(DirtyPolicy::Any, 4);
        t.touch(3);
        assert!(t.is_set(0));
        assert!(t.is_set(3));

        let mut t = FieldTracker::new(DirtyPolicy::Never, 4);
        t.touch(1);
        assert!(!t.any());
    }
}
