use super::load;
use crate::capture::{CpuProfile, FromCapture};
use crate::config::InterfaceRevision;
use crate::error::Result;
use crate::node::{GET_CHILD, Legacy, ProfileNodeView, Revision, Sampled, Value};
use comfy_table::{Table, presets::UTF8_FULL};
use std::path::Path;

pub fn run(file: &Path, interface: Option<InterfaceRevision>, path: &[String]) -> Result<()> {
    let (profile, revision) = load(file, interface)?;
    match revision {
        InterfaceRevision::Legacy => show::<Legacy>(&profile, path),
        InterfaceRevision::Sampled => show::<Sampled>(&profile, path),
    }
}

fn show<R: FromCapture>(profile: &CpuProfile, path: &[String]) -> Result<()> {
    let label = path_label(path);
    match follow(profile.root_view::<R>(), path)? {
        Some(view) => {
            println!("{}", label);
            println!("{}", field_table(view));
        }
        None => println!("{}: (no value)", label),
    }
    Ok(())
}

/// Walk `getChild` calls from `root`, one per path segment. Segments are
/// passed as loosely typed arguments, so a non-integer segment is an error
/// while an index past the last child yields `None`.
pub fn follow<'a, R: Revision>(
    root: ProfileNodeView<'a, R>,
    path: &[String],
) -> Result<Option<ProfileNodeView<'a, R>>> {
    let mut current = root;
    for segment in path {
        match current.invoke(GET_CHILD, &[Value::parse(segment)])? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn path_label(path: &[String]) -> String {
    let mut label = String::from("root");
    for segment in path {
        label.push('/');
        label.push_str(segment);
    }
    label
}

fn field_table<R: Revision>(view: ProfileNodeView<'_, R>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);
    for (name, value) in view.fields() {
        table.add_row(vec![name.to_string(), value.to_string()]);
    }
    table
}
