use crate::config::InterfaceRevision;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jsprof")]
#[command(about = "Inspect JavaScript CPU profile call trees")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Profiler interface revision to read nodes with (default: from the profile format)
    #[arg(long, short = 'I', global = true, value_enum, conflicts_with = "module_version")]
    pub interface: Option<InterfaceRevision>,

    /// Pick the interface revision from a host module version (e.g. 11 or 0x0b)
    #[arg(long, global = true, value_parser = parse_module_version)]
    pub module_version: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the call tree
    Tree {
        /// Profile file (.cpuprofile)
        file: PathBuf,

        /// Maximum depth to print
        #[arg(long, short = 'd')]
        depth: Option<usize>,

        /// Hide subtrees with fewer total samples than this
        #[arg(long, short = 'm', default_value = "0")]
        min_samples: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank call sites by self samples
    Top {
        /// Profile file (.cpuprofile)
        file: PathBuf,

        /// Number of entries to display
        #[arg(long, short = 'n', default_value = "20")]
        top: usize,

        /// Minimum percentage to display
        #[arg(long, short = 't', default_value = "0")]
        threshold: f64,

        /// Output as JSON
        #[arg(long, conflicts_with = "csv")]
        json: bool,

        /// Output as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Show the fields of one node, reached by child indices from the root
    Node {
        /// Profile file (.cpuprofile)
        file: PathBuf,

        /// Child indices to follow, e.g. `0 2 1`
        #[arg(allow_hyphen_values = true)]
        path: Vec<String>,
    },

    /// Interactive call tree browser
    View {
        /// Profile file (.cpuprofile)
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn parse_module_version(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| format!("Invalid module version '{}'. Examples: 11, 0x0b", s))
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Top { threshold, .. } = &self.command
            && !(0.0..=100.0).contains(threshold)
        {
            return Err(format!(
                "Threshold must be between 0 and 100 percent, got {}",
                threshold
            ));
        }

        if let Command::Tree { depth: Some(0), .. } = &self.command {
            return Err("Depth must be at least 1".to_string());
        }

        Ok(())
    }

    /// Revision requested on the command line, if any.
    pub fn requested_interface(&self) -> Option<InterfaceRevision> {
        self.interface
            .or_else(|| self.module_version.map(InterfaceRevision::from_module_version))
    }
}
