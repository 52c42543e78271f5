pub mod node;
pub mod top;
pub mod tree;
pub mod view;

use crate::capture::CpuProfile;
use crate::config::InterfaceRevision;
use crate::error::Result;
use std::path::Path;

/// Load a profile and settle which interface revision to read it with.
pub fn load(
    file: &Path,
    interface: Option<InterfaceRevision>,
) -> Result<(CpuProfile, InterfaceRevision)> {
    let profile = CpuProfile::load(file)?;
    let revision = InterfaceRevision::resolve_from_env(interface, &profile)?;
    Ok((profile, revision))
}

/// Format a script location for display
pub(crate) fn format_location(script: &str, line: i32) -> String {
    let script = simplify_script(script);
    if line > 0 {
        format!("{}:{}", script, line)
    } else {
        script
    }
}

/// Keep the last two path segments of a script URL
fn simplify_script(script: &str) -> String {
    if script.is_empty() {
        return "[native]".to_string();
    }

    let path = script
        .strip_prefix("file://")
        .unwrap_or(script)
        .trim_end_matches('/');

    if path.starts_with("node:") {
        return path.to_string();
    }

    let parts: Vec<&str> = path.rsplit('/').take(2).collect();
    match parts.as_slice() {
        [file, dir] if !dir.is_empty() && path.contains('/') => format!("{}/{}", dir, file),
        [file, ..] => file.to_string(),
        [] => path.to_string(),
    }
}

/// Anonymous functions have an empty name
pub(crate) fn format_function(name: &str) -> &str {
    if name.is_empty() { "(anonymous)" } else { name }
}

/// Format an optional millisecond value, `-` when the revision has none
pub(crate) fn format_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{:.1}ms", ms),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_location() {
        assert_eq!(format_location("", 0), "[native]");
        assert_eq!(format_location("file:///home/me/app/src/main.js", 12), "src/main.js:12");
        assert_eq!(format_location("app.js", 3), "app.js:3");
        assert_eq!(format_location("node:internal/timers", 0), "node:internal/timers");
    }

    #[test]
    fn test_format_function_and_ms() {
        assert_eq!(format_function(""), "(anonymous)");
        assert_eq!(format_function("main"), "main");
        assert_eq!(format_ms(None), "-");
        assert_eq!(format_ms(Some(1.24)), "1.2ms");
    }
}
