use super::shape::Shape;
use super::{CpuProfileNode, LegacyProfileNode, SampledProfileNode};
use std::sync::OnceLock;

/// One revision of the native profiler interface.
///
/// The revision decides which record type nodes have and how the
/// version-gated fields are read. `None` from a metric means the field is
/// not available on this revision.
pub trait Revision: Sized + 'static {
    /// Record type handed out by the profiler for this revision.
    type Node: ?Sized + CpuProfileNode;

    const NAME: &'static str;

    fn child(node: &Self::Node, index: i32) -> Option<&Self::Node>;

    fn total_time(node: &Self::Node) -> Option<f64>;

    fn self_time(node: &Self::Node) -> Option<f64>;

    fn total_samples_count(node: &Self::Node) -> Option<f64>;

    fn self_samples_count(node: &Self::Node) -> f64;

    /// Process-wide shape for this revision, built on first use.
    fn shape() -> &'static Shape<Self>;
}

/// Old interface: timing and sample totals are read from the record.
#[derive(Debug, Clone, Copy)]
pub struct Legacy;

/// New interface: only hit counts survive, timing fields yield no value.
#[derive(Debug, Clone, Copy)]
pub struct Sampled;

impl Revision for Legacy {
    type Node = dyn LegacyProfileNode;

    const NAME: &'static str = "legacy";

    fn child(node: &Self::Node, index: i32) -> Option<&Self::Node> {
        LegacyProfileNode::child(node, index)
    }

    fn total_time(node: &Self::Node) -> Option<f64> {
        Some(node.total_time())
    }

    fn self_time(node: &Self::Node) -> Option<f64> {
        Some(node.self_time())
    }

    fn total_samples_count(node: &Self::Node) -> Option<f64> {
        Some(node.total_samples_count())
    }

    fn self_samples_count(node: &Self::Node) -> f64 {
        node.self_samples_count()
    }

    fn shape() -> &'static Shape<Self> {
        static SHAPE: OnceLock<Shape<Legacy>> = OnceLock::new();
        SHAPE.get_or_init(Shape::build)
    }
}

impl Revision for Sampled {
    type Node = dyn SampledProfileNode;

    const NAME: &'static str = "sampled";

    fn child(node: &Self::Node, index: i32) -> Option<&Self::Node> {
        SampledProfileNode::child(node, index)
    }

    fn total_time(_node: &Self::Node) -> Option<f64> {
        None
    }

    fn self_time(_node: &Self::Node) -> Option<f64> {
        None
    }

    fn total_samples_count(_node: &Self::Node) -> Option<f64> {
        None
    }

    fn self_samples_count(node: &Self::Node) -> f64 {
        f64::from(node.hit_count())
    }

    fn shape() -> &'static Shape<Self> {
        static SHAPE: OnceLock<Shape<Sampled>> = OnceLock::new();
        SHAPE.get_or_init(Shape::build)
    }
}
