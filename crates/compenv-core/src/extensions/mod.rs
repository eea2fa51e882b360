//! Extension registry
//!
//! Named, typed extension points holding ordered implementations, one
//! [`ExtensionArea`] per scope.

pub mod area;
pub mod descriptor;
pub mod point;

pub use area::{ExtensionArea, PointInfo};
pub use descriptor::ExtensionDescriptor;
pub use point::{ExtensionPointId, ExtensionScope};
