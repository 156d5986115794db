//! Fixture-driven walks
//!
//! Builds databases from YAML and JSON fixtures on disk and walks them end
//! to end with merged tests.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use covwalk::memory::{Fixture, MemoryDatabase};
use covwalk::{
    Handle, IntProperty, ObjectSite, RecordingVisitor, VisitEvent, Visitor, WalkConfig,
    WalkError, WalkSummary, Walker,
};
use std::fs;
use tempfile::TempDir;

const DESIGN_YAML: &str = r#"
design: soc.vdb
tests: [smoke, regress]
metrics: [line, tgl, assert, group]
instances:
  - name: top
    coverage:
      line:
        - type: container
          name: always_0
          children:
            - { type: block, name: "12", properties: { cov_count: 3 } }
            - { type: block, name: "13", properties: { cov_count: 0 } }
    children:
      - name: u_fifo
        coverage:
          tgl:
            - type: container
              name: wr_en
              children:
                - { type: block, name: "0->1" }
                - { type: block, name: "1->0" }
definitions:
  - name: fifo
    variants:
      tgl:
        - name: fifo_tgl
          objects:
            - { type: scalar_value, name: full }
covergroups:
  - name: cg_bus
    metric: group
    variants:
      - name: cg_bus
        objects:
          - type: container
            name: cp_addr
            children:
              - { type: value_set, name: low }
              - { type: value_set, name: high }
          - type: value_set
            name: addr_x_kind
            annotations: { is_cross: "1" }
        instances:
          - name: cg_bus_inst
            objects:
              - { type: value_set, name: inst_bin }
assertions:
  - name: a_req_ack
    metric: assert
    parent: top.u_fifo
    blocks: [attempts, realsuccesses, failures]
  - name: a_global
    metric: assert
    blocks: [allsuccesses]
"#;

const DESIGN_JSON: &str = r#"{
  "design": "small.vdb",
  "tests": ["only"],
  "metrics": ["tgl"],
  "instances": [
    {
      "name": "top",
      "coverage": {
        "tgl": [
          { "type": "block", "name": "clk" },
          { "type": 4242, "name": "vendor_private" },
          { "type": "block", "name": "rst" }
        ]
      }
    }
  ]
}"#;

fn write(dir: &TempDir, file: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, text).expect("fixture should be writable");
    path
}

fn walk_merged(db: &MemoryDatabase) -> (RecordingVisitor, WalkSummary) {
    let mut visitor = RecordingVisitor::new();
    let summary = {
        let design = db.load_design().unwrap();
        let walker = Walker::load_merged(design, &mut visitor, WalkConfig::default()).unwrap();
        walker.execute(&mut visitor, None).unwrap()
    };
    (visitor, summary)
}

fn assert_released(db: &MemoryDatabase) {
    let stats = db.stats();
    assert_eq!(stats.live, 0, "{stats:?}");
    assert_eq!(stats.invalid_releases, 0, "{stats:?}");
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_yaml_fixture_from_path() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "soc.yaml", DESIGN_YAML);
    let fixture = Fixture::from_path(&path).unwrap();
    assert_eq!(fixture.design, "soc.vdb");
    assert_eq!(fixture.instances[0].children[0].name, "u_fifo");
    assert_eq!(fixture.assertions[1].parent, None);
}

#[test]
fn test_json_fixture_from_path() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "small.json", DESIGN_JSON);
    let fixture = Fixture::from_path(&path).unwrap();
    assert_eq!(fixture.tests, vec!["only"]);
    assert_eq!(fixture.instances[0].coverage["tgl"].len(), 3);
}

#[test]
fn test_unknown_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "soc.toml", DESIGN_YAML);
    let err = Fixture::from_path(&path).unwrap_err();
    assert!(matches!(err, WalkError::Fixture { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Fixture::from_path(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, WalkError::Io(_)));
}

#[test]
fn test_fixture_survives_yaml_rewrite() {
    let fixture = Fixture::from_yaml_str(DESIGN_YAML).unwrap();
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "again.yml", &fixture.to_yaml_string().unwrap());
    assert_eq!(Fixture::from_path(path).unwrap(), fixture);
}

// ============================================================================
// Walking
// ============================================================================

#[test]
fn test_yaml_design_walk() {
    let db = Fixture::from_yaml_str(DESIGN_YAML).unwrap().build().unwrap();
    let (visitor, summary) = walk_merged(&db);

    assert_eq!(
        visitor.labels(),
        vec![
            "test_name(smoke)",
            "test_name(regress)",
            // instances, children first
            "start_instance(top)",
            "start_instance(u_fifo)",
            "start_qualified_instance(u_fifo)",
            "start_container(wr_en)",
            "leaf_object(0->1)",
            "cov_object(0->1)",
            "leaf_object(1->0)",
            "cov_object(1->0)",
            "finish_container(wr_en)",
            "finish_qualified_instance(u_fifo)",
            "finish_instance(u_fifo)",
            "start_qualified_instance(top)",
            "start_container(always_0)",
            "cov_object(always_0)",
            "leaf_object(12)",
            "leaf_object(13)",
            "finish_container(always_0)",
            "finish_qualified_instance(top)",
            "finish_instance(top)",
            // definitions
            "start_definition(fifo)",
            "start_variant(fifo_tgl)",
            "leaf_object(full)",
            "cov_object(full)",
            "finish_variant(fifo_tgl)",
            "finish_definition(fifo)",
            // assertions
            "cov_object(realsuccesses)",
            "cov_object(allsuccesses)",
            // covergroups
            "start_variant(cg_bus)",
            "start_container(cp_addr)",
            "leaf_object(low)",
            "cov_object(low)",
            "leaf_object(high)",
            "cov_object(high)",
            "finish_container(cp_addr)",
            "leaf_object(addr_x_kind)",
            "cov_object(addr_x_kind)",
            "finish_variant(cg_bus)",
            "start_qualified_instance(cg_bus_inst)",
            "leaf_object(inst_bin)",
            "cov_object(inst_bin)",
            "finish_qualified_instance(cg_bus_inst)",
        ]
    );
    assert_eq!(summary.instances, 2);
    assert_eq!(summary.definitions, 1);
    assert_eq!(summary.unrecognized, 0);
    assert_eq!(db.merged_tests(), vec!["smoke", "regress"]);
    assert_released(&db);
}

#[test]
fn test_assertion_sites_from_fixture() {
    let db = Fixture::from_yaml_str(DESIGN_YAML).unwrap().build().unwrap();
    let (visitor, _) = walk_merged(&db);

    let sites: Vec<_> = visitor
        .events()
        .iter()
        .filter_map(|event| match event {
            VisitEvent::CovObject { site, .. } if site.metric == "assert" => Some(site.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].region.as_deref(), Some("u_fifo"));
    assert_eq!(sites[0].parent.as_deref(), Some("a_req_ack"));
    assert_eq!(sites[1].region, None);
    assert_eq!(sites[1].parent.as_deref(), Some("a_global"));
}

#[test]
fn test_json_design_skips_unknown_type() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "small.json", DESIGN_JSON);
    let db = Fixture::from_path(path).unwrap().build().unwrap();
    let (visitor, summary) = walk_merged(&db);

    let leaves: Vec<&str> = visitor
        .events()
        .iter()
        .filter(|event| event.hook() == "leaf_object")
        .map(VisitEvent::name)
        .collect();
    assert_eq!(leaves, vec!["clk", "rst"]);
    assert_eq!(summary.unrecognized, 1);
    assert_released(&db);
}

#[test]
fn test_recorded_walk_dumps_as_json() {
    let db = Fixture::from_json_str(DESIGN_JSON).unwrap().build().unwrap();
    let (visitor, _) = walk_merged(&db);
    let json: serde_json::Value = serde_json::from_str(&visitor.to_json().unwrap()).unwrap();
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), visitor.len());
    assert_eq!(events[0]["hook"], "test_name");
    assert_eq!(events[0]["name"], "only");
}

/// Sums hit counts of line blocks, reading properties during the walk
#[derive(Default)]
struct HitCounter {
    hits: i64,
    missing: usize,
}

impl Visitor<MemoryDatabase> for HitCounter {
    fn visit_leaf_object(
        &mut self,
        object: &Handle<'_, MemoryDatabase>,
        site: ObjectSite<'_, '_, MemoryDatabase>,
    ) {
        if !site.metric.is_line() {
            return;
        }
        match object.int_property(site.region, None, IntProperty::CovCount) {
            Ok(count) => self.hits += count,
            Err(_) => self.missing += 1,
        }
    }
}

#[test]
fn test_visitor_reads_properties_from_fixture() {
    let db = Fixture::from_yaml_str(DESIGN_YAML).unwrap().build().unwrap();
    let mut counter = HitCounter::default();
    {
        let design = db.load_design().unwrap();
        let walker = Walker::load_merged(design, &mut counter, WalkConfig::default()).unwrap();
        walker.execute(&mut counter, None).unwrap();
    }
    assert_eq!(counter.hits, 3);
    assert_eq!(counter.missing, 0);
    assert_released(&db);
}
