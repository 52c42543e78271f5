//! Loaded CPU profile captures.
//!
//! A [`CpuProfile`] owns every node of its call tree. Views handed out by
//! [`CpuProfile::root_view`] borrow from it.

mod format;

use crate::error::Result;
use crate::node::{
    CpuProfileNode, Legacy, LegacyProfileNode, ProfileNodeView, Revision, Sampled,
    SampledProfileNode,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Duration;

/// On-disk layout a capture was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    /// `nodes` array with child ids, 0-based lines, microsecond timestamps.
    Flat,
    /// Recursive `head` node, 1-based lines, timestamps in seconds.
    Nested,
}

/// One node of a loaded call tree.
///
/// `total_hits` always equals the node's own hits plus its children's
/// totals, so subtree counts never need a walk.
#[derive(Debug)]
pub struct CapturedNode {
    function_name: String,
    script_name: String,
    line_number: i32,
    column_number: i32,
    call_uid: Option<u32>,
    hit_count: u32,
    total_hits: u64,
    self_time: f64,
    total_time: f64,
    children: Vec<CapturedNode>,
}

impl CapturedNode {
    pub fn new(
        function_name: impl Into<String>,
        script_name: impl Into<String>,
        line: i32,
    ) -> Self {
        CapturedNode {
            function_name: function_name.into(),
            script_name: script_name.into(),
            line_number: line,
            column_number: 0,
            call_uid: None,
            hit_count: 0,
            total_hits: 0,
            self_time: 0.0,
            total_time: 0.0,
            children: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: i32) -> Self {
        self.column_number = column;
        self
    }

    pub fn with_hits(mut self, hits: u32) -> Self {
        self.total_hits = self.total_hits - u64::from(self.hit_count) + u64::from(hits);
        self.hit_count = hits;
        self
    }

    /// Use an explicit call-site id instead of one derived from the location.
    pub fn with_call_uid(mut self, uid: u32) -> Self {
        self.call_uid = Some(uid);
        self
    }

    pub fn with_child(mut self, child: CapturedNode) -> Self {
        self.push_child(child);
        self
    }

    fn push_child(&mut self, child: CapturedNode) {
        self.total_hits += child.total_hits;
        self.children.push(child);
    }

    pub fn children(&self) -> &[CapturedNode] {
        &self.children
    }

    /// Fill in timings and call-site ids over the whole subtree. Returns
    /// the number of nodes visited.
    fn finalize(&mut self, interval_ms: f64) -> usize {
        let mut nodes = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.call_uid.is_none() {
                node.call_uid = Some(location_uid(
                    &node.function_name,
                    &node.script_name,
                    node.line_number,
                    node.column_number,
                ));
            }
            node.self_time = f64::from(node.hit_count) * interval_ms;
            node.total_time = node.total_hits as f64 * interval_ms;
            nodes += 1;
            stack.extend(&mut node.children);
        }
        nodes
    }
}

impl Drop for CapturedNode {
    fn drop(&mut self) {
        // Unlink descendants one level at a time so deep chains do not
        // recurse through the default drop glue.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Call-site identity from a source location. Identical locations share an
/// id within one capture.
fn location_uid(function_name: &str, script_name: &str, line: i32, column: i32) -> u32 {
    let mut hasher = DefaultHasher::new();
    function_name.hash(&mut hasher);
    script_name.hash(&mut hasher);
    line.hash(&mut hasher);
    column.hash(&mut hasher);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}

impl CpuProfileNode for CapturedNode {
    fn function_name(&self) -> &str {
        &self.function_name
    }

    fn script_resource_name(&self) -> &str {
        &self.script_name
    }

    fn line_number(&self) -> i32 {
        self.line_number
    }

    fn call_uid(&self) -> u32 {
        self.call_uid.unwrap_or_else(|| {
            location_uid(
                &self.function_name,
                &self.script_name,
                self.line_number,
                self.column_number,
            )
        })
    }

    fn children_count(&self) -> i32 {
        i32::try_from(self.children.len()).unwrap_or(i32::MAX)
    }
}

fn child_at(children: &[CapturedNode], index: i32) -> Option<&CapturedNode> {
    usize::try_from(index).ok().and_then(|i| children.get(i))
}

impl LegacyProfileNode for CapturedNode {
    fn child(&self, index: i32) -> Option<&(dyn LegacyProfileNode + 'static)> {
        child_at(&self.children, index).map(|c| c as &(dyn LegacyProfileNode + 'static))
    }

    fn total_time(&self) -> f64 {
        self.total_time
    }

    fn self_time(&self) -> f64 {
        self.self_time
    }

    fn total_samples_count(&self) -> f64 {
        self.total_hits as f64
    }

    fn self_samples_count(&self) -> f64 {
        f64::from(self.hit_count)
    }
}

impl SampledProfileNode for CapturedNode {
    fn child(&self, index: i32) -> Option<&(dyn SampledProfileNode + 'static)> {
        child_at(&self.children, index).map(|c| c as &(dyn SampledProfileNode + 'static))
    }

    fn hit_count(&self) -> u32 {
        self.hit_count
    }
}

/// Revisions a captured node can be presented under.
pub trait FromCapture: Revision {
    fn record(node: &CapturedNode) -> &Self::Node;
}

impl FromCapture for Legacy {
    fn record(node: &CapturedNode) -> &Self::Node {
        node
    }
}

impl FromCapture for Sampled {
    fn record(node: &CapturedNode) -> &Self::Node {
        node
    }
}

/// A complete call-tree capture.
#[derive(Debug)]
pub struct CpuProfile {
    root: CapturedNode,
    format: ProfileFormat,
    start_time_us: f64,
    end_time_us: f64,
    sample_count: u64,
    node_count: usize,
    interval_ms: f64,
}

impl CpuProfile {
    /// Build a capture around an already assembled tree.
    ///
    /// Timestamps are in microseconds. The sampling interval is spread
    /// evenly over all hits in the tree.
    pub fn from_root(root: CapturedNode, start_time_us: f64, end_time_us: f64) -> Self {
        Self::assemble(root, ProfileFormat::Flat, start_time_us, end_time_us)
    }

    fn assemble(
        mut root: CapturedNode,
        format: ProfileFormat,
        start_time_us: f64,
        end_time_us: f64,
    ) -> Self {
        let sample_count = root.total_hits;
        let duration_us = (end_time_us - start_time_us).max(0.0);
        let interval_ms = if sample_count > 0 {
            duration_us / sample_count as f64 / 1000.0
        } else {
            0.0
        };
        let node_count = root.finalize(interval_ms);

        log::debug!(
            "Assembled {:?} profile: {} nodes, {} samples, {:.3}ms interval",
            format,
            node_count,
            sample_count,
            interval_ms
        );

        CpuProfile {
            root,
            format,
            start_time_us,
            end_time_us,
            sample_count,
            node_count,
            interval_ms,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let (root, format, start, end) = format::RawProfile::parse(json)?.into_tree()?;
        Ok(Self::assemble(root, format, start, end))
    }

    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading profile {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn root(&self) -> &CapturedNode {
        &self.root
    }

    /// View of the root node under revision `R`.
    pub fn root_view<R: FromCapture>(&self) -> ProfileNodeView<'_, R> {
        ProfileNodeView::new(R::record(&self.root))
    }

    pub fn format(&self) -> ProfileFormat {
        self.format
    }

    pub fn duration(&self) -> Duration {
        let micros = (self.end_time_us - self.start_time_us).max(0.0);
        Duration::from_micros(micros as u64)
    }

    /// Total hits over the whole tree.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn sampling_interval_ms(&self) -> f64 {
        self.interval_ms
    }
}
