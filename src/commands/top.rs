use super::{format_function, format_location, format_ms, load};
use crate::capture::{CpuProfile, FromCapture};
use crate::config::InterfaceRevision;
use crate::error::Result;
use crate::node::{Legacy, ProfileNodeView, Revision, Sampled};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Samples merged over every node sharing one call-site id.
#[derive(Debug, Clone, Serialize)]
pub struct CallSite {
    pub call_uid: u32,
    pub function: String,
    pub script: String,
    pub line: i32,
    pub self_samples: f64,
    /// Summed self time, absent on revisions without timing
    pub self_time_ms: Option<f64>,
    /// Number of tree nodes merged into this entry
    pub occurrences: usize,
    pub self_percent: f64,
}

pub fn run(
    file: &Path,
    interface: Option<InterfaceRevision>,
    limit: usize,
    threshold: f64,
    json: bool,
    csv: bool,
) -> Result<()> {
    let (profile, revision) = load(file, interface)?;

    let sites = match revision {
        InterfaceRevision::Legacy => rank::<Legacy>(&profile),
        InterfaceRevision::Sampled => rank::<Sampled>(&profile),
    };
    let total_samples: f64 = sites.iter().map(|s| s.self_samples).sum();
    let entries: Vec<CallSite> = sites
        .into_iter()
        .filter(|s| s.self_percent >= threshold)
        .take(limit)
        .collect();

    if json {
        print_json(file, &profile, total_samples, &entries)?;
    } else if csv {
        print_csv(&entries);
    } else {
        print_table(file, &profile, total_samples, &entries);
    }

    Ok(())
}

fn rank<R: FromCapture>(profile: &CpuProfile) -> Vec<CallSite> {
    collect_call_sites(profile.root_view::<R>())
}

/// Merge nodes by call-site id and rank by self samples, highest first.
/// Call sites that were never sampled are left out.
pub fn collect_call_sites<R: Revision>(root: ProfileNodeView<'_, R>) -> Vec<CallSite> {
    let mut by_uid: HashMap<u32, CallSite> = HashMap::new();
    let mut stack = vec![root];

    while let Some(view) = stack.pop() {
        stack.extend(view.children());

        let samples = view.self_samples_count();
        if samples <= 0.0 {
            continue;
        }

        let site = by_uid.entry(view.call_uid()).or_insert_with(|| CallSite {
            call_uid: view.call_uid(),
            function: view.function_name().to_string(),
            script: view.script_name().to_string(),
            line: view.line_number(),
            self_samples: 0.0,
            self_time_ms: view.self_time().map(|_| 0.0),
            occurrences: 0,
            self_percent: 0.0,
        });
        site.self_samples += samples;
        site.occurrences += 1;
        if let (Some(acc), Some(time)) = (site.self_time_ms.as_mut(), view.self_time()) {
            *acc += time;
        }
    }

    let total: f64 = by_uid.values().map(|s| s.self_samples).sum();
    let mut sites: Vec<CallSite> = by_uid.into_values().collect();
    for site in &mut sites {
        site.self_percent = if total > 0.0 {
            site.self_samples * 100.0 / total
        } else {
            0.0
        };
    }

    sites.sort_by(|a, b| {
        b.self_samples
            .total_cmp(&a.self_samples)
            .then_with(|| a.function.cmp(&b.function))
            .then_with(|| a.call_uid.cmp(&b.call_uid))
    });
    sites
}

fn print_table(file: &Path, profile: &CpuProfile, total_samples: f64, entries: &[CallSite]) {
    println!("# {}", file.display());
    println!(
        "# Duration: {} | Samples: {}",
        humantime::format_duration(profile.duration()),
        total_samples
    );
    println!();

    println!(
        "{:>6}  {:>8}  {:>10}  {:<30}  FUNCTION",
        "SELF%", "SAMPLES", "SELF TIME", "LOCATION"
    );
    println!("{}", "-".repeat(80));

    for entry in entries {
        println!(
            "{:>5.1}%  {:>8}  {:>10}  {:<30}  {}",
            entry.self_percent,
            entry.self_samples,
            format_ms(entry.self_time_ms),
            format_location(&entry.script, entry.line),
            format_function(&entry.function)
        );
    }
}

#[derive(Serialize)]
struct TopReport<'a> {
    file: String,
    duration_ms: u128,
    total_samples: f64,
    entries: &'a [CallSite],
}

fn print_json(
    file: &Path,
    profile: &CpuProfile,
    total_samples: f64,
    entries: &[CallSite],
) -> Result<()> {
    let report = TopReport {
        file: file.display().to_string(),
        duration_ms: profile.duration().as_millis(),
        total_samples,
        entries,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_csv(entries: &[CallSite]) {
    print!("{}", csv_rows(entries));
}

fn csv_rows(entries: &[CallSite]) -> String {
    let mut out = String::from("self_pct,samples,call_uid,file,line,function\n");
    for entry in entries {
        out.push_str(&format!(
            "{:.1},{},{},{},{},{}\n",
            entry.self_percent,
            entry.self_samples,
            entry.call_uid,
            csv_quote(&entry.script),
            entry.line,
            csv_quote(&entry.function)
        ));
    }
    out
}

fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
