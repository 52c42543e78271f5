mod app;
mod ui;

use crate::capture::{CpuProfile, FromCapture};
use crate::error::Result;

pub use app::{App, NodePath, Row};

/// Browse a profile's call tree interactively
pub fn run<R: FromCapture>(profile: &CpuProfile, title: String) -> Result<()> {
    let mut app = App::new(profile.root_view::<R>(), title);
    app.run()
}
