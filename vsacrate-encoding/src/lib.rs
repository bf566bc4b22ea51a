//! Output encoding for vsacrate
//!
//! Turns per-part cluster results into host edits through the
//! [`MeshEditor`] trait:
//! - Polygon tags (material or part) carrying global cluster tags
//! - An edge selection set marking cluster boundaries
//! - Per-face-vertex colors from a caller-owned [`ProxyColorTable`]
//! - New geometry for simplified parts

pub mod colors;
pub mod editor;
pub mod encoder;

pub use colors::*;
pub use editor::*;
pub use encoder::*;
