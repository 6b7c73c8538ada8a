//! # MirrorSync Core
//!
//! Differential state replication: keep copies of a nested object graph in
//! sync by sending only what changed since the last tick.
//!
//! ## Design Principles
//!
//! - **One contract**: every replicated node implements [`Mirrored`]
//!   (write, read, dirty check, clean, content equality, describe).
//! - **Pure checks**: `is_dirty` never mutates; changes made in place deep
//!   inside the graph are found by asking children, and a child swapped
//!   out wholesale is found by its [`Baseline`].
//! - **Conservative deltas**: a node may over-report changes, never
//!   under-report them. Structural changes fall back to full writes.
//! - **Explicit registration**: polymorphic types are resolved through a
//!   [`TypeRegistry`] built at startup.
//!
//! ## Example
//!
//! ```
//! use mirrorsync_core::{mirrored_composite, ContextConfig, Mirrored, SyncContext};
//!
//! mirrored_composite! {
//!     /// A player's score card.
//!     pub struct Card: Complex {
//!         points: u32 => set_points, points_mut;
//!         name: String => set_name, name_mut;
//!     }
//! }
//!
//! let mut server = SyncContext::new(ContextConfig::new("server"));
//! let mut client = SyncContext::new(ContextConfig::new("client"));
//! server.register("card", Card::new()).unwrap();
//! client.register("card", Card::new()).unwrap();
//!
//! server.get_mut::<Card>("card").unwrap().set_points(3);
//! let bytes = server.flush().unwrap().expect("one change");
//! client.apply(&bytes).unwrap();
//!
//! assert_eq!(*client.get::<Card>("card").unwrap().points(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod collections;
pub mod composite;
mod config;
mod context;
mod dirty;
mod error;
pub mod leaf;
mod node;
mod reference;
mod registry;
mod stats;
pub mod wire;

pub use collections::array::MirroredArray;
pub use collections::list::MirroredList;
pub use collections::map::MirroredMap;
pub use composite::{Composite, FieldTracker};
pub use config::{ContextConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use context::{BoxedRoot, SharedContext, SyncContext};
pub use dirty::{DirtyBits, DirtyPolicy};
pub use error::{MirrorError, MirrorResult};
pub use leaf::Leaf;
pub use node::{apply_child, describe_to_string, write_child, AnyMirrored, Baseline, Mirrored};
pub use reference::MirroredRef;
pub use registry::{Factory, MirroredObject, Tagged, TypeFamily, TypeRegistry, TypeRegistryBuilder};
pub use stats::{SyncStats, UpdateReport};

pub use mirrorsync_codec::Value;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
