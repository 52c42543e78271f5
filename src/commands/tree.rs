use super::{format_function, format_location, format_ms, load};
use crate::capture::{CpuProfile, FromCapture};
use crate::config::InterfaceRevision;
use crate::error::Result;
use crate::node::{Legacy, ProfileNodeView, Revision, Sampled};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

/// Limits applied while walking the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub min_samples: u64,
}

pub fn run(
    file: &Path,
    interface: Option<InterfaceRevision>,
    options: TreeOptions,
    json: bool,
) -> Result<()> {
    let (profile, revision) = load(file, interface)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match (revision, json) {
        (InterfaceRevision::Legacy, false) => {
            print_tree::<Legacy>(&mut out, file, &profile, options)
        }
        (InterfaceRevision::Sampled, false) => {
            print_tree::<Sampled>(&mut out, file, &profile, options)
        }
        (InterfaceRevision::Legacy, true) => print_json::<Legacy>(&mut out, &profile, options),
        (InterfaceRevision::Sampled, true) => print_json::<Sampled>(&mut out, &profile, options),
    }
}

fn print_tree<R: FromCapture>(
    out: &mut impl Write,
    file: &Path,
    profile: &CpuProfile,
    options: TreeOptions,
) -> Result<()> {
    writeln!(out, "# {}", file.display())?;
    writeln!(
        out,
        "# Duration: {} | Samples: {} | Nodes: {} | Interface: {}",
        humantime::format_duration(profile.duration()),
        profile.sample_count(),
        profile.node_count(),
        R::NAME
    )?;
    writeln!(out)?;
    writeln!(out, "{:>8}  {:>10}  FUNCTION", "SELF", "TOTAL")?;
    writeln!(out, "{}", "-".repeat(80))?;

    write_node(out, profile.root_view::<R>(), 0, options)
}

fn write_node<R: Revision>(
    out: &mut impl Write,
    root: ProfileNodeView<'_, R>,
    depth: usize,
    options: TreeOptions,
) -> Result<()> {
    let totals = options.sample_filter(root);
    let mut stack = vec![(root, depth)];

    while let Some((view, depth)) = stack.pop() {
        writeln!(
            out,
            "{:>8}  {:>10}  {}{}  {}",
            view.self_samples_count(),
            format_ms(view.total_time()),
            "  ".repeat(depth),
            format_function(view.function_name()),
            format_location(view.script_name(), view.line_number())
        )?;

        if options.max_depth.is_some_and(|max| depth + 1 >= max) {
            continue;
        }
        let children: Vec<_> = view
            .children()
            .filter(|child| options.keeps(totals.as_ref(), *child))
            .collect();
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(())
}

impl TreeOptions {
    /// Subtree totals, only when a sample threshold is in force.
    fn sample_filter<R: Revision>(&self, root: ProfileNodeView<'_, R>) -> Option<SubtreeTotals> {
        (self.min_samples > 0).then(|| SubtreeTotals::compute(root))
    }

    fn keeps<R: Revision>(
        &self,
        totals: Option<&SubtreeTotals>,
        view: ProfileNodeView<'_, R>,
    ) -> bool {
        totals.is_none_or(|totals| totals.get(view) >= self.min_samples as f64)
    }
}

/// Samples per subtree for every node under one root, summed in a single
/// pass. Revisions that report a total count are read directly.
#[derive(Debug, Default)]
pub struct SubtreeTotals {
    by_node: HashMap<*const (), f64>,
}

fn node_key<R: Revision>(view: ProfileNodeView<'_, R>) -> *const () {
    std::ptr::from_ref(view.node()).cast::<()>()
}

impl SubtreeTotals {
    pub fn compute<R: Revision>(root: ProfileNodeView<'_, R>) -> Self {
        let mut by_node = HashMap::new();
        if root.total_samples_count().is_some() {
            return SubtreeTotals { by_node };
        }

        // Post-order: a node is summed once all of its children are.
        let mut stack = vec![(root, false)];
        while let Some((view, children_done)) = stack.pop() {
            if children_done {
                let children: f64 = view
                    .children()
                    .map(|child| by_node.get(&node_key(child)).copied().unwrap_or(0.0))
                    .sum();
                by_node.insert(node_key(view), view.self_samples_count() + children);
            } else {
                stack.push((view, true));
                stack.extend(view.children().map(|child| (child, false)));
            }
        }
        SubtreeTotals { by_node }
    }

    pub fn get<R: Revision>(&self, view: ProfileNodeView<'_, R>) -> f64 {
        view.total_samples_count().unwrap_or_else(|| {
            self.by_node
                .get(&node_key(view))
                .copied()
                .unwrap_or_else(|| view.self_samples_count())
        })
    }
}

/// Samples in a subtree. Revisions without a total count are summed from
/// self samples.
pub fn subtree_samples<R: Revision>(view: ProfileNodeView<'_, R>) -> f64 {
    SubtreeTotals::compute(view).get(view)
}

fn print_json<R: FromCapture>(
    out: &mut impl Write,
    profile: &CpuProfile,
    options: TreeOptions,
) -> Result<()> {
    let tree = to_json(profile.root_view::<R>(), 0, options)?;
    serde_json::to_writer_pretty(&mut *out, &tree)?;
    writeln!(out)?;
    Ok(())
}

/// Nested JSON object with every exposed field plus `children`.
pub fn to_json<R: Revision>(
    view: ProfileNodeView<'_, R>,
    depth: usize,
    options: TreeOptions,
) -> Result<serde_json::Value> {
    let totals = options.sample_filter(view);
    json_node(view, depth, options, totals.as_ref())
}

fn json_node<R: Revision>(
    view: ProfileNodeView<'_, R>,
    depth: usize,
    options: TreeOptions,
    totals: Option<&SubtreeTotals>,
) -> Result<serde_json::Value> {
    let mut object = serde_json::Map::new();
    for (name, value) in view.fields() {
        object.insert(name.to_string(), serde_json::to_value(value)?);
    }

    let mut children = Vec::new();
    if !options.max_depth.is_some_and(|max| depth + 1 >= max) {
        for child in view.children() {
            if options.keeps(totals, child) {
                children.push(json_node(child, depth + 1, options, totals)?);
            }
        }
    }
    object.insert("children".to_string(), serde_json::Value::Array(children));

    Ok(serde_json::Value::Object(object))
}
