use super::load;
use crate::config::InterfaceRevision;
use crate::error::Result;
use crate::node::{Legacy, Sampled};
use crate::tui;
use std::path::Path;

/// Run the view command - opens a profile in the tree browser
pub fn run(file: &Path, interface: Option<InterfaceRevision>) -> Result<()> {
    let (profile, revision) = load(file, interface)?;
    let title = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string());

    match revision {
        InterfaceRevision::Legacy => tui::run::<Legacy>(&profile, title),
        InterfaceRevision::Sampled => tui::run::<Sampled>(&profile, title),
    }
}
