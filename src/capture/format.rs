use super::{CapturedNode, ProfileFormat};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::mem;

/// Top level of a `.cpuprofile` document, either layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawProfile {
    #[serde(default)]
    nodes: Option<Vec<RawFlatNode>>,
    #[serde(default)]
    head: Option<RawNestedNode>,
    #[serde(default)]
    start_time: f64,
    #[serde(default)]
    end_time: f64,
    #[serde(default)]
    samples: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFlatNode {
    id: u64,
    call_frame: RawCallFrame,
    #[serde(default)]
    hit_count: u32,
    #[serde(default)]
    children: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCallFrame {
    #[serde(default)]
    function_name: String,
    #[serde(default)]
    url: String,
    #[serde(default = "unknown_position")]
    line_number: i32,
    #[serde(default = "unknown_position")]
    column_number: i32,
}

fn unknown_position() -> i32 {
    -1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNestedNode {
    #[serde(default)]
    function_name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    line_number: i32,
    #[serde(default, rename = "callUID")]
    call_uid: Option<u32>,
    #[serde(default)]
    hit_count: u32,
    #[serde(default)]
    children: Vec<RawNestedNode>,
}

impl RawProfile {
    /// Parse a document of any nesting depth. Legacy captures nest one
    /// object per call frame, well past serde_json's default limit.
    pub(super) fn parse(json: &str) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let raw = RawProfile::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(raw)
    }

    /// Convert to an owned tree. Returns the root, the detected layout and
    /// start/end timestamps in microseconds.
    pub(super) fn into_tree(self) -> Result<(CapturedNode, ProfileFormat, f64, f64)> {
        match (self.nodes, self.head) {
            (Some(nodes), _) => {
                let root = build_flat(nodes, &self.samples)?;
                Ok((root, ProfileFormat::Flat, self.start_time, self.end_time))
            }
            (None, Some(head)) => {
                // Nested captures record timestamps in seconds.
                Ok((
                    build_nested(head),
                    ProfileFormat::Nested,
                    self.start_time * 1_000_000.0,
                    self.end_time * 1_000_000.0,
                ))
            }
            (None, None) => Err(Error::InvalidProfile(
                "expected a `nodes` array or a `head` node".to_string(),
            )),
        }
    }
}

impl Drop for RawNestedNode {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A node under construction plus the children still to convert.
struct NestedFrame {
    node: CapturedNode,
    pending: std::vec::IntoIter<RawNestedNode>,
}

impl NestedFrame {
    fn open(mut raw: RawNestedNode) -> Self {
        let mut node = CapturedNode::new(
            mem::take(&mut raw.function_name),
            mem::take(&mut raw.url),
            raw.line_number.max(0),
        )
        .with_hits(raw.hit_count);
        if let Some(uid) = raw.call_uid {
            node = node.with_call_uid(uid);
        }
        NestedFrame {
            node,
            pending: mem::take(&mut raw.children).into_iter(),
        }
    }
}

fn build_nested(head: RawNestedNode) -> CapturedNode {
    let mut root = NestedFrame::open(head);
    let mut stack: Vec<NestedFrame> = Vec::new();
    loop {
        let current = stack.last_mut().unwrap_or(&mut root);
        match current.pending.next() {
            Some(child) => stack.push(NestedFrame::open(child)),
            None => match stack.pop() {
                Some(done) => stack
                    .last_mut()
                    .unwrap_or(&mut root)
                    .node
                    .push_child(done.node),
                None => return root.node,
            },
        }
    }
}

fn build_flat(nodes: Vec<RawFlatNode>, samples: &[u64]) -> Result<CapturedNode> {
    if nodes.is_empty() {
        return Err(Error::InvalidProfile("profile has no nodes".to_string()));
    }

    let mut index_by_id = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        if index_by_id.insert(node.id, idx).is_some() {
            return Err(Error::InvalidProfile(format!("duplicate node id {}", node.id)));
        }
    }

    let mut referenced = HashSet::new();
    for node in &nodes {
        for child in &node.children {
            if !index_by_id.contains_key(child) {
                return Err(Error::InvalidProfile(format!(
                    "node {} references unknown child {}",
                    node.id, child
                )));
            }
            referenced.insert(*child);
        }
    }

    let roots: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| !referenced.contains(&n.id))
        .map(|(idx, _)| idx)
        .collect();
    let Some(&root_idx) = roots.first() else {
        return Err(Error::InvalidProfile("no root node".to_string()));
    };
    if roots.len() > 1 {
        log::warn!(
            "Profile has {} root nodes, using node {}",
            roots.len(),
            nodes[root_idx].id
        );
    }

    // Older exporters leave hitCount out and only list samples.
    let sampled_hits = if nodes.iter().all(|n| n.hit_count == 0) && !samples.is_empty() {
        let mut hits: HashMap<u64, u32> = HashMap::new();
        for id in samples {
            *hits.entry(*id).or_insert(0) += 1;
        }
        Some(hits)
    } else {
        None
    };

    let builder = FlatBuilder {
        nodes: &nodes,
        sampled_hits: sampled_hits.as_ref(),
    };
    builder.build(root_idx, &index_by_id)
}

struct FlatBuilder<'a> {
    nodes: &'a [RawFlatNode],
    sampled_hits: Option<&'a HashMap<u64, u32>>,
}

/// A node under construction plus the child ids still to visit.
struct FlatFrame<'a> {
    id: u64,
    node: CapturedNode,
    pending: std::slice::Iter<'a, u64>,
}

impl<'a> FlatBuilder<'a> {
    fn build(&self, root_idx: usize, index_by_id: &HashMap<u64, usize>) -> Result<CapturedNode> {
        // Ids on the path from the root to the current frame.
        let mut visiting = HashSet::new();
        let mut root = self.open(root_idx, &mut visiting)?;
        let mut stack: Vec<FlatFrame<'a>> = Vec::new();

        loop {
            let current = stack.last_mut().unwrap_or(&mut root);
            match current.pending.next() {
                Some(child_id) => {
                    let frame = self.open(index_by_id[child_id], &mut visiting)?;
                    stack.push(frame);
                }
                None => match stack.pop() {
                    Some(done) => {
                        visiting.remove(&done.id);
                        stack
                            .last_mut()
                            .unwrap_or(&mut root)
                            .node
                            .push_child(done.node);
                    }
                    None => return Ok(root.node),
                },
            }
        }
    }

    fn open(&self, idx: usize, visiting: &mut HashSet<u64>) -> Result<FlatFrame<'a>> {
        let nodes = self.nodes;
        let raw = &nodes[idx];
        if !visiting.insert(raw.id) {
            return Err(Error::InvalidProfile(format!(
                "node {} appears twice on one path",
                raw.id
            )));
        }

        let hits = match self.sampled_hits {
            Some(hits) => hits.get(&raw.id).copied().unwrap_or(0),
            None => raw.hit_count,
        };
        let frame = &raw.call_frame;
        // 0-based in the file; -1 (unknown) becomes the 0 sentinel.
        let node = CapturedNode::new(
            frame.function_name.clone(),
            frame.url.clone(),
            frame.line_number.max(-1).saturating_add(1),
        )
        .with_column(frame.column_number.max(-1).saturating_add(1))
        .with_hits(hits);

        Ok(FlatFrame {
            id: raw.id,
            node,
            pending: raw.children.iter(),
        })
    }
}
