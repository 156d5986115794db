#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::database::ErrorCode;
use crate::memory::{FaultSite, MemoryDatabase, MemoryDatabaseBuilder};
use crate::object::ObjectType;
use crate::recorder::{RecordingVisitor, SiteLabel, VisitEvent};
use crate::visitor::ObjectSite;
use std::cell::Cell;
use std::rc::Rc;

fn builder() -> MemoryDatabaseBuilder {
    let mut builder = MemoryDatabase::builder("sim.vdb");
    builder.test_name("t");
    builder
}

/// Walk with a single loaded test, returning the recorder and the result
fn walk(db: &MemoryDatabase, config: WalkConfig) -> (RecordingVisitor, WalkResult<WalkSummary>) {
    let mut visitor = RecordingVisitor::new();
    let result = {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        let walker = Walker::new(design, test, config);
        walker.execute(&mut visitor, None)
    };
    (visitor, result)
}

fn labels(visitor: &RecordingVisitor) -> Vec<String> {
    visitor.labels()
}

fn assert_balanced(db: &MemoryDatabase) {
    let stats = db.stats();
    assert_eq!(stats.live, 0, "leaked handles: {stats:?}");
    assert_eq!(stats.invalid_releases, 0, "bad releases: {stats:?}");
    assert_eq!(stats.acquired, stats.released);
}

fn abort() -> WalkConfig {
    WalkConfig::builder().fatal_action(FatalAction::Abort).build()
}

// =========================================================================
// Hook sequences
// =========================================================================

#[test]
fn test_single_instance_container_sequence() {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, tgl);
    let c = b.object(view, ObjectType::Container, "C");
    b.object(c, ObjectType::Block, "B1");
    b.object(c, ObjectType::Block, "B2");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_instance(I)",
            "start_qualified_instance(I)",
            "start_container(C)",
            "leaf_object(B1)",
            "cov_object(B1)",
            "leaf_object(B2)",
            "cov_object(B2)",
            "finish_container(C)",
            "finish_qualified_instance(I)",
            "finish_instance(I)",
        ]
    );
    assert_eq!(summary.instances, 1);
    assert_eq!(summary.containers, 1);
    assert_eq!(summary.leaf_objects, 2);
    assert_eq!(summary.cov_objects, 2);
    assert_eq!(visitor.count("start_metric"), 0);
    assert_eq!(visitor.count("finish_metric"), 0);
    assert_balanced(&db);
}

#[test]
fn test_object_sites_name_region_and_parent() {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, tgl);
    let c = b.object(view, ObjectType::Container, "C");
    b.object(c, ObjectType::ScalarValue, "s");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    let events = visitor.events();
    let container_site = events
        .iter()
        .find_map(|e| match e {
            VisitEvent::StartContainer { site, .. } => Some(site.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        container_site,
        SiteLabel {
            region: Some("I".to_string()),
            metric: "tgl".to_string(),
            parent: None,
        }
    );
    let leaf_site = events
        .iter()
        .find_map(|e| match e {
            VisitEvent::LeafObject { site, .. } => Some(site.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(leaf_site.parent.as_deref(), Some("C"));
    assert_eq!(leaf_site.region.as_deref(), Some("I"));
}

#[test]
fn test_children_finish_before_parent_views() {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let top = b.instance(None, "top");
    let u0 = b.instance(Some(top), "u0");
    let u00 = b.instance(Some(u0), "u00");
    let u1 = b.instance(Some(top), "u1");
    for inst in [top, u0, u00, u1] {
        b.qualify(inst, tgl);
    }
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_instance(top)",
            "start_instance(u0)",
            "start_instance(u00)",
            "start_qualified_instance(u00)",
            "finish_qualified_instance(u00)",
            "finish_instance(u00)",
            "start_qualified_instance(u0)",
            "finish_qualified_instance(u0)",
            "finish_instance(u0)",
            "start_instance(u1)",
            "start_qualified_instance(u1)",
            "finish_qualified_instance(u1)",
            "finish_instance(u1)",
            "start_qualified_instance(top)",
            "finish_qualified_instance(top)",
            "finish_instance(top)",
        ]
    );
    assert_balanced(&db);
}

#[test]
fn test_views_follow_metric_order() {
    let mut b = builder();
    let line = b.metric("line");
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    b.qualify(inst, line);
    b.qualify(inst, tgl);
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    let metrics: Vec<String> = visitor
        .events()
        .iter()
        .filter_map(|e| match e {
            VisitEvent::StartQualifiedInstance { metric, .. } => Some(metric.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(metrics, vec!["line", "tgl"]);
}

#[test]
fn test_missing_view_skips_region_hooks() {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let a = b.instance(None, "a");
    b.instance(None, "b");
    b.qualify(a, tgl);
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(visitor.count("start_qualified_instance"), 1);
    assert_eq!(visitor.count("start_instance"), 2);
    assert_eq!(summary.qualified_regions, 1);
}

#[test]
fn test_path_and_test_level_metrics_skip_regions() {
    let mut b = builder();
    let path = b.metric("path");
    let group = b.metric("group");
    let assert = b.metric("assert");
    let inst = b.instance(None, "I");
    for metric in [path, group, assert] {
        let view = b.qualify(inst, metric);
        b.object(view, ObjectType::Block, "b");
    }
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec!["start_instance(I)", "finish_instance(I)"]
    );
}

#[test]
fn test_definition_variants() {
    let mut b = builder();
    let line = b.metric("line");
    let tgl = b.metric("tgl");
    let def = b.definition("mod_a");
    let v_line = b.variant(def, line, "v_line");
    b.object(v_line, ObjectType::Block, "b");
    let v_tgl = b.variant(def, tgl, "v_tgl");
    b.object(v_tgl, ObjectType::ScalarValue, "s");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_definition(mod_a)",
            "start_variant(v_line)",
            "leaf_object(b)",
            "finish_variant(v_line)",
            "start_variant(v_tgl)",
            "leaf_object(s)",
            "cov_object(s)",
            "finish_variant(v_tgl)",
            "finish_definition(mod_a)",
        ]
    );
    assert_eq!(summary.definitions, 1);
    assert_eq!(summary.qualified_regions, 2);
    assert_balanced(&db);
}

#[test]
fn test_definitions_follow_instances() {
    let mut b = builder();
    b.metric("tgl");
    b.definition("mod_a");
    b.instance(None, "I");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_instance(I)",
            "finish_instance(I)",
            "start_definition(mod_a)",
            "finish_definition(mod_a)",
        ]
    );
}

// =========================================================================
// Line metric
// =========================================================================

#[test]
fn test_line_container_of_blocks_is_the_coverable_unit() {
    let mut b = builder();
    let line = b.metric("line");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, line);
    let c = b.object(view, ObjectType::Container, "C");
    b.object(c, ObjectType::Block, "B1");
    b.object(c, ObjectType::Block, "B2");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_instance(I)",
            "start_qualified_instance(I)",
            "start_container(C)",
            "cov_object(C)",
            "leaf_object(B1)",
            "leaf_object(B2)",
            "finish_container(C)",
            "finish_qualified_instance(I)",
            "finish_instance(I)",
        ]
    );
    assert_eq!(visitor.count("cov_object"), 1);
}

#[test]
fn test_line_first_child_decides_for_mixed_container() {
    let mut b = builder();
    let line = b.metric("line");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, line);
    let mixed = b.object(view, ObjectType::Container, "mixed");
    b.object(mixed, ObjectType::ScalarValue, "s");
    b.object(mixed, ObjectType::Block, "blk");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(visitor.count("cov_object"), 0);
    assert_eq!(visitor.count("leaf_object"), 2);
}

#[test]
fn test_line_nested_containers() {
    let mut b = builder();
    let line = b.metric("line");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, line);
    let outer = b.object(view, ObjectType::Container, "outer");
    let inner = b.object(outer, ObjectType::Container, "inner");
    b.object(inner, ObjectType::Block, "blk");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    let cov: Vec<&str> = visitor
        .events()
        .iter()
        .filter(|e| e.hook() == "cov_object")
        .map(VisitEvent::name)
        .collect();
    assert_eq!(cov, vec!["inner"]);
    assert_eq!(
        labels(&visitor)[2..7],
        [
            "start_container(outer)",
            "start_container(inner)",
            "cov_object(inner)",
            "leaf_object(blk)",
            "finish_container(inner)",
        ]
    );
}

// =========================================================================
// Unrecognized objects
// =========================================================================

#[test]
fn test_unrecognized_child_is_skipped() {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, tgl);
    let c = b.object(view, ObjectType::Container, "C");
    b.object(c, ObjectType::Block, "B1");
    let odd = b.object_with_code(c, 999, "odd");
    b.object(odd, ObjectType::Block, "hidden");
    b.object(c, ObjectType::Block, "B2");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(
        labels(&visitor)[2..8],
        [
            "start_container(C)",
            "leaf_object(B1)",
            "cov_object(B1)",
            "leaf_object(B2)",
            "cov_object(B2)",
            "finish_container(C)",
        ]
    );
    assert_eq!(summary.unrecognized, 1);
    assert!(!visitor.labels().iter().any(|l| l.contains("odd") || l.contains("hidden")));
    assert_balanced(&db);
}

#[test]
fn test_known_types_outside_the_walked_set_are_unrecognized() {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, tgl);
    b.object(view, ObjectType::VectorValue, "vec");
    b.object(view, ObjectType::IntegerValue, "int");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(summary.unrecognized, 1);
    assert_eq!(visitor.count("leaf_object"), 1);
}

// =========================================================================
// Assertions
// =========================================================================

fn assertion_db(blocks: &[&str], with_parent: bool) -> MemoryDatabase {
    let mut b = builder();
    let assert = b.metric("assert");
    let parent = b.instance(None, "P");
    let a = b.assertion(assert, with_parent.then_some(parent), "A");
    for name in blocks {
        b.object(a, ObjectType::Block, name);
    }
    b.build()
}

#[test]
fn test_assertion_visits_success_block() {
    let db = assertion_db(&["x", "allsuccesses", "y"], true);
    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_instance(P)",
            "finish_instance(P)",
            "cov_object(allsuccesses)",
        ]
    );
    let Some(VisitEvent::CovObject { site, .. }) = visitor.events().last() else {
        panic!("expected a cov visit");
    };
    assert_eq!(
        site,
        &SiteLabel {
            region: Some("P".to_string()),
            metric: "assert".to_string(),
            parent: Some("A".to_string()),
        }
    );
    assert_balanced(&db);
}

#[test]
fn test_assertion_first_success_block_wins() {
    let db = assertion_db(&["realsuccesses", "allsuccesses"], true);
    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(visitor.count("cov_object"), 1);
    assert_eq!(visitor.events().last().unwrap().name(), "realsuccesses");
    assert_balanced(&db);
}

#[test]
fn test_assertion_without_success_block_is_not_visited() {
    let db = assertion_db(&["attempts", "failures"], true);
    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(visitor.count("cov_object"), 0);
}

#[test]
fn test_root_scope_assertion_has_no_region() {
    let db = assertion_db(&["allsuccesses"], false);
    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    let Some(VisitEvent::CovObject { site, .. }) = visitor.events().last() else {
        panic!("expected a cov visit");
    };
    assert_eq!(site.region, None);
    assert_eq!(site.parent.as_deref(), Some("A"));
}

#[test]
fn test_assert_metric_never_descends_containers() {
    let mut b = builder();
    let assert = b.metric("assert");
    let group = b.metric("group");
    let cg = b.covergroup(group, "cg");
    let variant = b.variant(cg, group, "cg_v");
    let c = b.object(variant, ObjectType::Container, "C");
    b.object(c, ObjectType::Block, "b");
    b.assertion(assert, None, "A");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    // covergroup contents go through the testbench metric, never assert
    assert!(visitor.events().iter().all(|e| match e {
        VisitEvent::LeafObject { site, .. } | VisitEvent::StartContainer { site, .. } =>
            site.metric == "group",
        _ => true,
    }));
}

// =========================================================================
// Covergroups
// =========================================================================

#[test]
fn test_covergroup_variants_then_instances() {
    let mut b = builder();
    let group = b.metric("group");
    let cg = b.covergroup(group, "cg");
    let variant = b.variant(cg, group, "cg::v");
    let cp = b.object(variant, ObjectType::Container, "cp");
    b.object(cp, ObjectType::ValueSet, "bin0");
    b.object(cp, ObjectType::ValueSet, "bin1");
    let inst = b.variant_instance(variant, "cg_i");
    b.object(inst, ObjectType::Cross, "x");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec![
            "start_variant(cg::v)",
            "start_container(cp)",
            "leaf_object(bin0)",
            "cov_object(bin0)",
            "leaf_object(bin1)",
            "cov_object(bin1)",
            "finish_container(cp)",
            "finish_variant(cg::v)",
            "start_qualified_instance(cg_i)",
            "leaf_object(x)",
            "cov_object(x)",
            "finish_qualified_instance(cg_i)",
        ]
    );
    assert_eq!(summary.qualified_regions, 2);
    assert_eq!(db.live_persistent(), 0);
    assert_balanced(&db);
}

#[test]
fn test_last_testbench_metric_wins() {
    let mut b = builder();
    let first = b.metric("group");
    let second = b.metric("covergroup");
    let cg1 = b.covergroup(first, "cg1");
    b.variant(cg1, first, "v1");
    let cg2 = b.covergroup(second, "cg2");
    b.variant(cg2, second, "v2");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    result.unwrap();

    assert_eq!(
        labels(&visitor),
        vec!["start_variant(v2)", "finish_variant(v2)"]
    );
    assert_balanced(&db);
}

#[test]
fn test_visitor_reads_cross_annotation_during_hook() {
    struct CrossProbe {
        crosses: Vec<bool>,
    }

    impl Visitor<MemoryDatabase> for CrossProbe {
        fn visit_cov_object(
            &mut self,
            object: &Handle<'_, MemoryDatabase>,
            _site: ObjectSite<'_, '_, MemoryDatabase>,
        ) {
            self.crosses.push(object.is_cross().unwrap());
        }
    }

    let mut b = builder();
    let group = b.metric("group");
    let cg = b.covergroup(group, "cg");
    let variant = b.variant(cg, group, "v");
    let point = b.object(variant, ObjectType::ValueSet, "cp");
    let cross = b.object(variant, ObjectType::ValueSet, "cx");
    b.annotate(cross, "is_cross", "1");
    b.component(cross, point);
    let db = b.build();

    let mut probe = CrossProbe {
        crosses: Vec::new(),
    };
    {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        Walker::new(design, test, WalkConfig::default())
            .execute(&mut probe, None)
            .unwrap();
    }
    assert_eq!(probe.crosses, vec![false, true]);
    assert_balanced(&db);
}

// =========================================================================
// Errors
// =========================================================================

fn counting_callback(disposition: ErrorDisposition) -> (ErrorCallback, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let callback: ErrorCallback = Rc::new(move |_: &DatabaseError| {
        seen.set(seen.get() + 1);
        disposition
    });
    (callback, calls)
}

fn single_container_db() -> MemoryDatabase {
    let mut b = builder();
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    let view = b.qualify(inst, tgl);
    let c = b.object(view, ObjectType::Container, "C");
    b.object(c, ObjectType::Block, "B1");
    b.object(c, ObjectType::Block, "B2");
    b.build()
}

#[test]
fn test_benign_errors_never_reach_callback() {
    let db = single_container_db();
    db.inject(FaultSite::Property, DatabaseError::invalid_property());
    db.inject(FaultSite::Related, DatabaseError::invalid_relation());
    let (callback, calls) = counting_callback(ErrorDisposition::Fatal);
    let config = WalkConfig::builder()
        .fatal_action(FatalAction::Abort)
        .error_callback(callback)
        .build();

    let (visitor, result) = walk(&db, config);
    let summary = result.unwrap();

    assert_eq!(calls.get(), 0);
    assert!(summary.errors_absorbed > 0);
    // views are unreachable, so no region is walked
    assert_eq!(visitor.count("start_qualified_instance"), 0);
    assert_eq!(visitor.count("start_instance"), 1);
    assert_balanced(&db);
}

#[test]
fn test_unreadable_metric_name_walks_as_other() {
    let db = single_container_db();
    let mut visitor = RecordingVisitor::new();
    let result = {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        let walker = Walker::new(design, test, abort());
        // the first property read is the metric name
        db.inject_nth(FaultSite::Property, 0, DatabaseError::invalid_property());
        walker.execute(&mut visitor, None)
    };
    let summary = result.unwrap();

    assert_eq!(summary.errors_absorbed, 1);
    assert_eq!(visitor.count("start_qualified_instance"), 1);
    assert_eq!(visitor.count("cov_object"), 2);
    let metrics: Vec<&str> = visitor
        .events()
        .iter()
        .filter_map(|event| match event {
            VisitEvent::StartQualifiedInstance { metric, .. } => Some(metric.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(metrics, vec![""]);
    assert_balanced(&db);
}

#[test]
fn test_handled_error_ends_that_scan() {
    let db = single_container_db();
    let (callback, calls) = counting_callback(ErrorDisposition::Handled);
    let mut visitor = RecordingVisitor::new();
    let result = {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        let walker = Walker::new(design, test, abort());
        // scans: metric, metrics end, I, I's children end, C, B1 (peek), B2
        db.inject_nth(
            FaultSite::Scan,
            6,
            DatabaseError::new(ErrorCode::Other(7), "bin table unreadable"),
        );
        walker.execute(&mut visitor, Some(callback))
    };
    let summary = result.unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(summary.errors_absorbed, 1);
    assert_eq!(visitor.count("leaf_object"), 1);
    assert_eq!(visitor.count("finish_container"), 1);
    assert_balanced(&db);
}

#[test]
fn test_fatal_abort_releases_every_handle() {
    let db = single_container_db();
    let mut visitor = RecordingVisitor::new();
    let result = {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        let walker = Walker::new(design, test, abort());
        db.inject_nth(
            FaultSite::Scan,
            5,
            DatabaseError::new(ErrorCode::Other(99), "corrupt database"),
        );
        walker.execute(&mut visitor, None)
    };

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "Error occurred: corrupt database");
    assert_eq!(err.database_code(), Some(ErrorCode::Other(99)));
    assert_eq!(visitor.count("start_container"), 1);
    assert_eq!(visitor.count("finish_container"), 0);
    assert_balanced(&db);
}

#[test]
fn test_explicit_callback_overrides_configured() {
    let db = single_container_db();
    let (configured, configured_calls) = counting_callback(ErrorDisposition::Fatal);
    let (explicit, explicit_calls) = counting_callback(ErrorDisposition::Handled);
    let config = WalkConfig::builder()
        .fatal_action(FatalAction::Abort)
        .error_callback(configured)
        .build();

    let mut visitor = RecordingVisitor::new();
    let result = {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        let walker = Walker::new(design, test, config);
        db.inject_nth(
            FaultSite::Iterate,
            0,
            DatabaseError::new(ErrorCode::LoadFailed, "metrics unavailable"),
        );
        walker.execute(&mut visitor, Some(explicit))
    };

    result.unwrap();
    assert_eq!(explicit_calls.get(), 1);
    assert_eq!(configured_calls.get(), 0);
}

#[test]
fn test_configured_callback_used_without_explicit() {
    let db = single_container_db();
    let (configured, calls) = counting_callback(ErrorDisposition::Fatal);

    let result = {
        let design = db.load_design().unwrap();
        let test = db.load_test(&design, "t").unwrap();
        let mut walker = Walker::new(design, test, abort());
        walker.set_error_callback(Some(configured));
        db.inject(FaultSite::Iterate, DatabaseError::new(ErrorCode::Other(30), "boom"));
        walker.execute(&mut RecordingVisitor::new(), None)
    };

    assert!(result.unwrap_err().is_fatal());
    assert_eq!(calls.get(), 1);
    assert_balanced(&db);
}

#[test]
fn test_display_errors_configured_on_database() {
    let db = single_container_db();
    let (_, result) = walk(&db, WalkConfig::builder().display_errors(true).build());
    result.unwrap();
    assert!(db.displays_errors());

    let (_, result) = walk(&db, WalkConfig::default());
    result.unwrap();
    assert!(!db.displays_errors());
}

// =========================================================================
// Loading
// =========================================================================

#[test]
fn test_load_merged_visits_every_test_name() {
    let mut b = MemoryDatabase::builder("sim.vdb");
    for name in ["smoke", "regress", "nightly"] {
        b.test_name(name);
    }
    b.metric("tgl");
    let db = b.build();

    let mut visitor = RecordingVisitor::new();
    {
        let design = db.load_design().unwrap();
        let walker = Walker::load_merged(design, &mut visitor, WalkConfig::default()).unwrap();
        assert_eq!(db.stats().live, 2);
        walker.execute(&mut visitor, None).unwrap();
    }

    assert_eq!(
        labels(&visitor),
        vec!["test_name(smoke)", "test_name(regress)", "test_name(nightly)"]
    );
    assert_eq!(db.merged_tests(), vec!["smoke", "regress", "nightly"]);
    assert_balanced(&db);
}

#[test]
fn test_load_merged_without_tests_fails() {
    let db = MemoryDatabase::builder("sim.vdb").build();
    let mut visitor = RecordingVisitor::new();
    let err = {
        let design = db.load_design().unwrap();
        Walker::load_merged(design, &mut visitor, WalkConfig::default()).unwrap_err()
    };
    assert!(matches!(err, WalkError::NoTests));
    assert!(visitor.is_empty());
    assert_balanced(&db);
}

#[test]
fn test_walker_accessors() {
    let db = single_container_db();
    let design = db.load_design().unwrap();
    let test = db.load_test(&design, "t").unwrap();
    let mut walker = Walker::new(design, test, abort());
    assert_eq!(walker.config().fatal_action, FatalAction::Abort);
    assert!(walker.design().is_persistent());
    assert_eq!(walker.test().name().unwrap().as_deref(), Some("test"));
    assert!(walker.config().error_callback.is_none());
    walker.set_error_callback(Some(Rc::new(|_: &DatabaseError| ErrorDisposition::Handled)));
    assert!(walker.config().error_callback.is_some());
    assert!(format!("{walker:?}").contains("Walker"));
}

// =========================================================================
// Scale
// =========================================================================

#[test]
fn test_deep_instance_hierarchy() {
    const DEPTH: usize = 2_000;
    let mut b = builder();
    let tgl = b.metric("tgl");
    let mut parent = None;
    for _ in 0..DEPTH {
        let inst = b.instance(parent, "n");
        parent = Some(inst);
    }
    let leaf_view = b.qualify(parent.unwrap(), tgl);
    b.object(leaf_view, ObjectType::Block, "b");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(summary.instances, DEPTH);
    assert_eq!(summary.cov_objects, 1);
    assert_eq!(visitor.count("finish_instance"), DEPTH);
    assert_balanced(&db);
}

#[test]
fn test_deep_container_nesting() {
    const DEPTH: usize = 10_000;
    let mut b = builder();
    let tgl = b.metric("tgl");
    let inst = b.instance(None, "I");
    let mut parent = b.qualify(inst, tgl);
    for _ in 0..DEPTH {
        parent = b.object(parent, ObjectType::Container, "c");
    }
    b.object(parent, ObjectType::Block, "b");
    let db = b.build();

    let (visitor, result) = walk(&db, WalkConfig::default());
    let summary = result.unwrap();

    assert_eq!(summary.containers, DEPTH);
    assert_eq!(visitor.count("finish_container"), DEPTH);
    assert_eq!(summary.leaf_objects, 1);
    assert_balanced(&db);
}

#[test]
fn test_summary_serializes() {
    let db = single_container_db();
    let (_, result) = walk(&db, WalkConfig::default());
    let json = serde_json::to_value(result.unwrap()).unwrap();
    assert_eq!(json["cov_objects"], 2);
    assert_eq!(json["containers"], 1);
}
