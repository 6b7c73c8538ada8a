//! Named roots replicated together.
//!
//! A context batches every registered root into one message per tick:
//! `{root_name: root_message, ...}`. The sender calls [`SyncContext::flush`]
//! once per tick; the receiver calls [`SyncContext::apply`] with each
//! message, in order. A fresh receiver starts from [`SyncContext::snapshot`].

use crate::config::ContextConfig;
use crate::error::{MirrorError, MirrorResult};
use crate::node::{follow, newline, AnyMirrored, Baseline, Mirrored};
use crate::stats::{SyncStats, UpdateReport};
use crate::wire::expect_map;
use indexmap::IndexMap;
use mirrorsync_codec::{from_cbor, to_canonical_cbor, Value};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A type-erased root.
pub type BoxedRoot = Box<dyn AnyMirrored + Send>;

/// A context behind a mutex, for callers sharing it across threads.
pub type SharedContext = Arc<Mutex<SyncContext>>;

/// A registered root and what the context remembers about it.
struct Root {
    node: BoxedRoot,
    recorded: Option<Baseline>,
    touched: bool,
}

impl Root {
    fn new(node: BoxedRoot) -> Self {
        let recorded = node.baseline();
        Self {
            node,
            recorded,
            touched: false,
        }
    }

    /// Accessed as an untracked value, or swapped for another node.
    fn is_replaced(&self) -> bool {
        self.touched || self.node.baseline() != self.recorded
    }

    fn is_dirty(&self) -> bool {
        self.is_replaced() || self.node.is_dirty()
    }

    fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        self.node.write(dirty_only && !self.is_replaced())
    }

    fn mark_clean(&mut self) {
        self.touched = false;
        self.node.mark_clean();
        self.recorded = self.node.baseline();
    }
}

/// Registry of named roots plus the encode/apply loop around them.
pub struct SyncContext {
    roots: IndexMap<String, Root>,
    config: ContextConfig,
    stats: SyncStats,
}

impl SyncContext {
    /// Creates an empty context.
    pub fn new(config: ContextConfig) -> Self {
        Self {
            roots: IndexMap::new(),
            config,
            stats: SyncStats::default(),
        }
    }

    /// The context's configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Counters since creation or the last [`SyncContext::reset_stats`].
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Zero all counters.
    pub fn reset_stats(&mut self) {
        self.stats = SyncStats::default();
    }

    /// Register `root` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::DuplicateRoot`] if the name is taken.
    pub fn register<T>(&mut self, name: impl Into<String>, root: T) -> MirrorResult<()>
    where
        T: Mirrored + Send + 'static,
    {
        self.register_boxed(name, Box::new(root))
    }

    /// Register an already boxed root.
    pub fn register_boxed(&mut self, name: impl Into<String>, root: BoxedRoot) -> MirrorResult<()> {
        let name = name.into();
        if self.roots.contains_key(&name) {
            return Err(MirrorError::DuplicateRoot { name });
        }
        trace!(context = %self.config.label, root = %name, ty = root.type_name(), "registered root");
        self.roots.insert(name, Root::new(root));
        Ok(())
    }

    /// Remove and return the root under `name`.
    pub fn unregister(&mut self, name: &str) -> Option<BoxedRoot> {
        self.roots.shift_remove(name).map(|root| root.node)
    }

    /// Remove every root.
    pub fn clear(&mut self) {
        self.roots.clear();
    }

    /// True when a root is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.roots.contains_key(name)
    }

    /// Root names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// True when no root is registered.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Borrow a root by name and type.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.roots.get(name)?.node.as_any().downcast_ref()
    }

    /// Mutably borrow a root by name and type.
    ///
    /// A root that keeps no markers of its own is marked on access. A root
    /// assigned through the borrow is written in full on the next tick.
    pub fn get_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        let root = self.roots.get_mut(name)?;
        let untracked = root.node.baseline().is_none();
        let typed = root.node.as_any_mut().downcast_mut::<T>()?;
        if untracked {
            root.touched = true;
        }
        Some(typed)
    }

    /// Borrow a root by name, type-erased.
    pub fn root(&self, name: &str) -> Option<&(dyn AnyMirrored + Send)> {
        self.roots.get(name).map(|root| root.node.as_ref())
    }

    /// Write the aggregate message. A dirty-only write leaves out clean
    /// roots.
    pub fn write(&self, dirty_only: bool) -> MirrorResult<Value> {
        let mut out = Vec::with_capacity(self.roots.len());
        for (name, root) in &self.roots {
            if dirty_only && !root.is_dirty() {
                continue;
            }
            out.push((Value::Text(name.clone()), root.write(dirty_only)?));
        }
        Ok(Value::Map(out))
    }

    /// Apply an aggregate message to the named roots.
    ///
    /// Roots absent from the message are untouched. Unknown names are
    /// skipped and reported unless the configuration is strict.
    pub fn update(&mut self, message: &Value) -> MirrorResult<UpdateReport> {
        let mut report = UpdateReport::default();
        for (key, value) in expect_map(message)? {
            let name = key
                .as_text()
                .ok_or_else(|| MirrorError::type_mismatch("root name", key))?;
            match self.roots.get_mut(name) {
                Some(root) => {
                    let before = root.node.baseline();
                    root.node.read(value)?;
                    follow(&mut root.recorded, before, root.node.baseline());
                    report.applied += 1;
                }
                None if self.config.ignore_unknown_roots => {
                    trace!(context = %self.config.label, root = name, "skipping unknown root");
                    report.skipped.push(name.to_string());
                }
                None => {
                    return Err(MirrorError::UnknownRoot {
                        name: name.to_string(),
                    })
                }
            }
        }
        Ok(report)
    }

    /// True when any root changed since the last clean point.
    pub fn is_dirty(&self) -> bool {
        self.roots.values().any(|root| root.is_dirty())
    }

    /// Clean every root.
    pub fn mark_clean(&mut self) {
        for root in self.roots.values_mut() {
            root.mark_clean();
        }
    }

    /// Write and encode the aggregate message as canonical CBOR.
    pub fn encode(&mut self, dirty_only: bool) -> MirrorResult<Vec<u8>> {
        let message = self.write(dirty_only)?;
        let bytes = to_canonical_cbor(&message)?;
        self.check_size(bytes.len())?;
        self.stats.record_write(bytes.len(), message.map_len());
        debug!(
            context = %self.config.label,
            dirty_only,
            roots = message.map_len(),
            bytes = bytes.len(),
            "encoded sync message"
        );
        Ok(bytes)
    }

    /// Decode and apply an encoded aggregate message.
    pub fn apply(&mut self, bytes: &[u8]) -> MirrorResult<UpdateReport> {
        self.check_size(bytes.len())?;
        let message = from_cbor(bytes)?;
        let report = self.update(&message)?;
        self.stats.record_apply(bytes.len(), &report);
        debug!(
            context = %self.config.label,
            applied = report.applied,
            skipped = report.skipped.len(),
            bytes = bytes.len(),
            "applied sync message"
        );
        Ok(report)
    }

    /// One sender tick: encode what changed and mark everything clean.
    ///
    /// Returns `None`, and leaves the baseline alone, when nothing changed.
    pub fn flush(&mut self) -> MirrorResult<Option<Vec<u8>>> {
        if !self.is_dirty() {
            return Ok(None);
        }
        let bytes = self.encode(true)?;
        self.mark_clean();
        self.stats.ticks += 1;
        Ok(Some(bytes))
    }

    /// Encode the full state of every root, for a fresh receiver.
    ///
    /// Does not touch dirty markers.
    pub fn snapshot(&mut self) -> MirrorResult<Vec<u8>> {
        self.encode(false)
    }

    /// Human-readable dump of every root.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (index, (name, root)) in self.roots.iter().enumerate() {
            if index > 0 {
                newline(&mut out, 0);
            }
            out.push_str(name);
            out.push_str(" = ");
            root.node.describe(&mut out, 0);
        }
        out
    }

    /// Move the context behind a mutex.
    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    fn check_size(&self, size: usize) -> MirrorResult<()> {
        let limit = self.config.max_message_size;
        if size > limit {
            warn!(context = %self.config.label, size, limit, "rejected oversize sync message");
            return Err(MirrorError::MessageTooLarge { size, limit });
        }
        Ok(())
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("label", &self.config.label)
            .field("roots", &self.roots.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::list::MirroredList;

    crate::mirrored_composite! {
        struct Score: Complex {
            home: u32 => set_home, home_mut;
            away: u32 => set_away, away_mut;
        }
    }

    fn context(label: &str) -> SyncContext {
        let mut ctx = SyncContext::new(ContextConfig::new(label));
        ctx.register("score", Score::new()).unwrap();
        ctx.register("log", MirroredList::<String>::new()).unwrap();
        ctx
    }

    #[test]
    fn duplicate_root_is_rejected() {
        let mut ctx = context("a");
        assert_eq!(
            ctx.register("score", Score::new()),
            Err(MirrorError::DuplicateRoot {
                name: "score".into()
            })
        );
        assert_eq!(ctx.names().collect::<Vec<_>>(), vec!["score", "log"]);
    }

    #[test]
    fn dirty_only_write_skips_clean_roots() {
        let mut ctx = context("a");
        assert!(!ctx.is_dirty());
        assert_eq!(ctx.write(true).unwrap(), Value::empty_map());

        if let Some(score) = ctx.get_mut::<Score>("score") {
            score.set_home(2);
        }
        let msg = ctx.write(true).unwrap();
        assert_eq!(msg.map_len(), 1);
        assert!(msg.get("score").is_some());
        assert_eq!(ctx.write(false).unwrap().map_len(), 2);
    }

    #[test]
    fn unknown_roots_are_skipped_or_rejected() {
        let msg = Value::object([("ghost", Value::empty_map())]);

        let mut lenient = context("lenient");
        let report = lenient.update(&msg).unwrap();
        assert_eq!(report.skipped, vec!["ghost".to_string()]);

        let mut strict = SyncContext::new(ContextConfig::new("strict").strict());
        assert_eq!(
            strict.update(&msg),
            Err(MirrorError::UnknownRoot {
                name: "ghost".into()
            })
        );
    }

    #[test]
    fn flush_and_apply() {
        let mut sender = context("sender");
        let mut receiver = context("receiver");
        assert_eq!(sender.flush().unwrap(), None);

        if let Some(log) = sender.get_mut::<MirroredList<String>>("log") {
            log.push("kickoff".into());
        }
        let bytes = sender.flush().unwrap().unwrap();
        assert!(!sender.is_dirty());
        assert_eq!(sender.stats().ticks, 1);

        let report = receiver.apply(&bytes).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(
            receiver
                .get::<MirroredList<String>>("log")
                .map(|log| log.as_slice().to_vec()),
            Some(vec!["kickoff".to_string()])
        );
        assert_eq!(receiver.stats().bytes_applied, bytes.len() as u64);
    }

    #[test]
    fn root_assigned_through_get_mut_is_sent_whole() {
        let mut sender = context("sender");
        let mut receiver = context("receiver");
        if let Some(score) = sender.get_mut::<Score>("score") {
            score.set_home(1);
            score.set_away(2);
        }
        receiver.apply(&sender.flush().unwrap().unwrap()).unwrap();

        if let Some(score) = sender.get_mut::<Score>("score") {
            let mut fresh = Score::new();
            fresh.set_home(5);
            *score = fresh;
        }
        receiver.apply(&sender.flush().unwrap().unwrap()).unwrap();
        assert_eq!(
            receiver
                .get::<Score>("score")
                .map(|score| (*score.home(), *score.away())),
            Some((5, 0))
        );
        assert!(!receiver.is_dirty());
        assert!(!sender.is_dirty());
    }

    #[test]
    fn leaf_root_is_marked_on_access() {
        let mut sender = SyncContext::default();
        let mut receiver = SyncContext::default();
        sender.register("turn", 0u32).unwrap();
        receiver.register("turn", 0u32).unwrap();

        if let Some(turn) = sender.get_mut::<u32>("turn") {
            *turn = 3;
        }
        assert!(sender.is_dirty());
        receiver.apply(&sender.flush().unwrap().unwrap()).unwrap();
        assert_eq!(receiver.get::<u32>("turn"), Some(&3));
        assert_eq!(sender.flush().unwrap(), None);
    }

    #[test]
    fn oversize_messages_are_rejected() {
        let mut ctx = SyncContext::new(ContextConfig::new("tiny").with_max_message_size(4));
        ctx.register("log", MirroredList::from_vec(vec!["a long entry".to_string()]))
            .unwrap();
        assert!(matches!(
            ctx.snapshot(),
            Err(MirrorError::MessageTooLarge { limit: 4, .. })
        ));
        assert!(matches!(
            ctx.apply(&[0u8; 16]),
            Err(MirrorError::MessageTooLarge { size: 16, .. })
        ));
    }

    #[test]
    fn typed_access_checks_type() {
        let mut ctx = context("a");
        assert!(ctx.get::<Score>("score").is_some());
        assert!(ctx.get::<MirroredList<u8>>("score").is_none());
        assert!(ctx.unregister("score").is_some());
        assert!(!ctx.contains("score"));
        ctx.clear();
        assert!(ctx.is_empty());
    }

    #[test]
    fn shared_context_locks() {
        let shared = context("a").into_shared();
        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                if let Some(score) = shared.lock().get_mut::<Score>("score") {
                    score.set_away(1);
                }
            })
        };
        handle.join().unwrap();
        assert!(shared.lock().is_dirty());
    }

    #[test]
    fn describe_lists_roots() {
        let ctx = context("a");
        let text = ctx.describe();
        assert!(text.starts_with("score = Score<complex>"));
        assert!(text.contains("log = list[0]"));
    }
}
