mod compositor;
mod config;
mod input;
mod node;
mod root;
mod scroll;
mod stacking;
mod surface;
mod transform;
mod tree;

pub use compositor::*;
pub use config::*;
pub use node::*;
pub use root::*;
pub use scroll::*;
pub use surface::*;
pub use tree::*;

slotmap::new_key_type! {
    /// Stable handle of a node for its whole lifetime.
    pub struct ViewId;
}

/// Backing-store handle, present only while a node is realized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(pub u32);
