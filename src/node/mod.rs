//! Read-only views over profile call-tree nodes.
//!
//! The profiler owns every node record. This module only borrows them:
//! [`wrap`] turns a record reference into a [`ProfileNodeView`] whose fields
//! are re-read from the record on every access.

mod revision;
mod shape;
mod value;
mod view;

pub use revision::{Legacy, Revision, Sampled};
pub use shape::{FieldAccessor, GET_CHILD, MethodDescriptor, Shape};
pub use value::Value;
pub use view::{Children, ProfileNodeView, wrap};

/// Accessors every profile-tree node record provides, whatever the
/// profiler interface revision.
pub trait CpuProfileNode {
    /// Name of the function executing at this node. Empty when anonymous.
    fn function_name(&self) -> &str;

    /// Resource name of the script the function was defined in.
    fn script_resource_name(&self) -> &str;

    /// 1-based source line, `0` when unknown.
    fn line_number(&self) -> i32;

    /// Call-site identity, stable for the lifetime of the capture.
    fn call_uid(&self) -> u32;

    /// Number of direct children.
    fn children_count(&self) -> i32;
}

/// Node record of the old profiler interface, which still reports
/// per-node timing and sample totals.
pub trait LegacyProfileNode: CpuProfileNode {
    /// Child at `index`, `None` when out of range.
    fn child(&self, index: i32) -> Option<&(dyn LegacyProfileNode + 'static)>;

    /// Milliseconds spent in this node and its descendants.
    fn total_time(&self) -> f64;

    /// Milliseconds spent in this node alone.
    fn self_time(&self) -> f64;

    fn total_samples_count(&self) -> f64;

    fn self_samples_count(&self) -> f64;
}

/// Node record of the newer, sampling-only profiler interface.
pub trait SampledProfileNode: CpuProfileNode {
    /// Child at `index`, `None` when out of range.
    fn child(&self, index: i32) -> Option<&(dyn SampledProfileNode + 'static)>;

    /// Samples attributed directly to this node.
    fn hit_count(&self) -> u32;
}
