use jsprof::commands::node::follow;
use jsprof::commands::top::collect_call_sites;
use jsprof::commands::tree::subtree_samples;
use jsprof::config::InterfaceRevision;
use jsprof::node::{Legacy, Sampled};
use jsprof::{CpuProfile, Error, ProfileFormat};
use std::io::Write;
use std::time::Duration;

const FLAT_PROFILE: &str = r#"{
  "nodes": [
    {"id": 1, "callFrame": {"functionName": "(root)", "scriptId": "0", "url": "", "lineNumber": -1, "columnNumber": -1}, "hitCount": 0, "children": [2, 5]},
    {"id": 2, "callFrame": {"functionName": "main", "scriptId": "3", "url": "file:///srv/app/index.js", "lineNumber": 0, "columnNumber": 0}, "hitCount": 1, "children": [3, 4]},
    {"id": 3, "callFrame": {"functionName": "parse", "scriptId": "3", "url": "file:///srv/app/index.js", "lineNumber": 11, "columnNumber": 2}, "hitCount": 6},
    {"id": 4, "callFrame": {"functionName": "", "scriptId": "3", "url": "file:///srv/app/index.js", "lineNumber": 30, "columnNumber": 8}, "hitCount": 1},
    {"id": 5, "callFrame": {"functionName": "(garbage collector)", "scriptId": "0", "url": "", "lineNumber": -1, "columnNumber": -1}, "hitCount": 2}
  ],
  "startTime": 1000,
  "endTime": 11000,
  "samples": [3, 3, 3, 3, 3, 3, 2, 4, 5, 5],
  "timeDeltas": [1000, 1000, 1000, 1000, 1000, 1000, 1000, 1000, 1000, 1000]
}"#;

const NESTED_PROFILE: &str = r#"{
  "head": {
    "functionName": "(root)", "url": "", "lineNumber": 0, "callUID": 100, "hitCount": 0,
    "children": [
      {"functionName": "main", "url": "app.js", "lineNumber": 1, "callUID": 101, "hitCount": 2,
       "children": [{"functionName": "work", "url": "app.js", "lineNumber": 9, "callUID": 102, "hitCount": 6}]},
      {"functionName": "(program)", "url": "", "lineNumber": 0, "callUID": 103, "hitCount": 2}
    ]
  },
  "startTime": 10.0,
  "endTime": 10.01
}"#;

fn write_profile(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".cpuprofile")
        .tempfile()
        .unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_load_flat_profile() {
    let file = write_profile(FLAT_PROFILE);
    let profile = CpuProfile::load(file.path()).unwrap();

    assert_eq!(profile.format(), ProfileFormat::Flat);
    assert_eq!(profile.sample_count(), 10);
    assert_eq!(profile.node_count(), 5);
    assert_eq!(profile.duration(), Duration::from_millis(10));

    let root = profile.root_view::<Sampled>();
    assert_eq!(root.function_name(), "(root)");
    assert_eq!(root.line_number(), 0);
    assert_eq!(root.children_count(), 2);

    let main = root.get_child(0).unwrap();
    assert_eq!(main.function_name(), "main");
    assert_eq!(main.line_number(), 1);
    assert_eq!(main.script_name(), "file:///srv/app/index.js");
    assert!(main.total_time().is_none());

    let parse = main.get_child(0).unwrap();
    assert_eq!(parse.line_number(), 12);
    assert_eq!(parse.self_samples_count(), 6.0);

    let anonymous = main.get_child(1).unwrap();
    assert_eq!(anonymous.function_name(), "");
}

#[test]
fn test_flat_profile_through_legacy_interface() {
    let profile = CpuProfile::from_json(FLAT_PROFILE).unwrap();
    let root = profile.root_view::<Legacy>();
    let main = root.get_child(0).unwrap();

    // 10ms over 10 samples
    assert_eq!(profile.sampling_interval_ms(), 1.0);
    assert_eq!(main.total_samples_count(), Some(8.0));
    assert_eq!(main.total_time(), Some(8.0));
    assert_eq!(main.self_time(), Some(1.0));
    assert_eq!(main.self_samples_count(), 1.0);
}

#[test]
fn test_load_nested_profile() {
    let file = write_profile(NESTED_PROFILE);
    let profile = CpuProfile::load(file.path()).unwrap();

    assert_eq!(profile.format(), ProfileFormat::Nested);
    assert_eq!(
        InterfaceRevision::resolve(None, None, &profile).unwrap(),
        InterfaceRevision::Legacy
    );

    let root = profile.root_view::<Legacy>();
    assert_eq!(root.call_uid(), 100);
    let work = follow(root, &path(&["0", "0"])).unwrap().unwrap();
    assert_eq!(work.function_name(), "work");
    assert_eq!(work.call_uid(), 102);
    assert_eq!(work.line_number(), 9);
    assert_eq!(work.self_samples_count(), 6.0);
    assert!((work.self_time().unwrap() - 6.0).abs() < 1e-6);
}

#[test]
fn test_identical_call_sites_share_uid() {
    let json = r#"{
      "nodes": [
        {"id": 1, "callFrame": {"functionName": "(root)"}, "children": [2, 3]},
        {"id": 2, "callFrame": {"functionName": "a", "url": "x.js", "lineNumber": 1}, "children": [4]},
        {"id": 3, "callFrame": {"functionName": "b", "url": "x.js", "lineNumber": 5}, "children": [5]},
        {"id": 4, "callFrame": {"functionName": "log", "url": "x.js", "lineNumber": 9, "columnNumber": 1}, "hitCount": 2},
        {"id": 5, "callFrame": {"functionName": "log", "url": "x.js", "lineNumber": 9, "columnNumber": 1}, "hitCount": 3}
      ]
    }"#;
    let profile = CpuProfile::from_json(json).unwrap();
    let root = profile.root_view::<Sampled>();
    let first = follow(root, &path(&["0", "0"])).unwrap().unwrap();
    let second = follow(root, &path(&["1", "0"])).unwrap().unwrap();
    assert_eq!(first.call_uid(), second.call_uid());

    let sites = collect_call_sites(root);
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].function, "log");
    assert_eq!(sites[0].self_samples, 5.0);
    assert_eq!(sites[0].occurrences, 2);
}

#[test]
fn test_load_errors() {
    let file = write_profile("{\"nodes\": [");
    assert!(matches!(CpuProfile::load(file.path()), Err(Error::Json(_))));

    let file = write_profile("{\"samples\": []}");
    assert!(matches!(
        CpuProfile::load(file.path()),
        Err(Error::InvalidProfile(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        CpuProfile::load(&dir.path().join("missing.cpuprofile")),
        Err(Error::Io(_))
    ));
}

fn flat_chain(depth: u64) -> String {
    let nodes: Vec<String> = (1..=depth)
        .map(|id| {
            let children = if id < depth {
                format!("[{}]", id + 1)
            } else {
                "[]".to_string()
            };
            format!(
                r#"{{"id": {id}, "callFrame": {{"functionName": "f{id}", "url": "deep.js", "lineNumber": {id}, "columnNumber": 0}}, "hitCount": 1, "children": {children}}}"#
            )
        })
        .collect();
    format!(
        r#"{{"nodes": [{}], "startTime": 0, "endTime": {}}}"#,
        nodes.join(","),
        depth * 1000
    )
}

#[test]
fn test_deep_flat_chain() {
    let depth = 20_000;
    let profile = CpuProfile::from_json(&flat_chain(depth)).unwrap();
    assert_eq!(profile.node_count(), depth as usize);
    assert_eq!(profile.sample_count(), depth);
    assert_eq!(profile.sampling_interval_ms(), 1.0);

    let root = profile.root_view::<Legacy>();
    assert_eq!(root.total_samples_count(), Some(depth as f64));
    assert_eq!(subtree_samples(profile.root_view::<Sampled>()), depth as f64);

    let mut view = profile.root_view::<Sampled>();
    let mut levels = 1;
    while let Some(child) = view.get_child(0) {
        view = child;
        levels += 1;
    }
    assert_eq!(levels, depth);
    assert_eq!(view.function_name(), format!("f{depth}"));
    let ranked: f64 = collect_call_sites(root).iter().map(|s| s.self_samples).sum();
    assert_eq!(ranked, depth as f64);
}

#[test]
fn test_deep_nested_profile() {
    let depth = 1_000;
    let mut json = String::from(r#"{"startTime": 0, "endTime": 1, "head": "#);
    for i in 0..depth {
        json.push_str(&format!(
            r#"{{"functionName": "f{i}", "url": "a.js", "lineNumber": {i}, "hitCount": 1, "children": ["#
        ));
    }
    json.push_str(&"]}".repeat(depth));
    json.push('}');

    let profile = CpuProfile::from_json(&json).unwrap();
    assert_eq!(profile.format(), ProfileFormat::Nested);
    assert_eq!(profile.node_count(), depth);
    assert_eq!(profile.sample_count(), depth as u64);
    assert_eq!(
        profile.root_view::<Legacy>().total_samples_count(),
        Some(depth as f64)
    );
}
