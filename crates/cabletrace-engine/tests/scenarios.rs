//! Integration test: end-to-end route resolution on small hand-built
//! networks.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cabletrace_engine::{
    BoundingBox, EngineConfig, Equipment, NoClock, NoProgress, Point3, ReportInput, ResultRow,
    RouteRequest, RouteStatus, Segment, SegmentKind, run_report,
};

/// Straight run along the x axis with a connector at each end.
fn run(id: &str, kind: SegmentKind, x0: f64, x1: f64) -> Segment {
    let a = Point3::new(x0, 0.0, 0.0);
    let b = Point3::new(x1, 0.0, 0.0);
    Segment::new(
        id,
        kind,
        x1 - x0,
        BoundingBox::from_points(&[a, b]).unwrap(),
        vec![a, b],
    )
}

/// Straight run parallel to the x axis, offset to `y`.
fn offset_run(id: &str, kind: SegmentKind, x0: f64, x1: f64, y: f64) -> Segment {
    let mut seg = run(id, kind, x0, x1);
    let a = Point3::new(x0, y, 0.0);
    let b = Point3::new(x1, y, 0.0);
    seg.bbox = BoundingBox::from_points(&[a, b]).unwrap();
    seg.connection_points = vec![a, b];
    seg
}

fn equipment(id: &str, code: &str, x: f64) -> Equipment {
    Equipment {
        id: id.to_string(),
        structured_code: code.to_string(),
        display_name: String::new(),
        location: Point3::new(x, 0.0, 0.0),
    }
}

fn route(id: &str, from: &str, to: &str, assigned: &[&str]) -> RouteRequest {
    RouteRequest {
        route_id: id.to_string(),
        from_label: from.to_string(),
        to_label: to.to_string(),
        assigned_segment_ids: assigned.iter().map(ToString::to_string).collect(),
    }
}

fn rows(input: ReportInput) -> Vec<ResultRow> {
    let (results, diagnostics) =
        run_report(input, EngineConfig::default(), &mut NoProgress, &NoClock)
            .expect("input is well formed");
    assert!(!diagnostics.cancelled);
    results.iter().map(|r| r.to_row()).collect()
}

fn single(input: ReportInput) -> ResultRow {
    let mut out = rows(input);
    assert_eq!(out.len(), 1);
    out.remove(0)
}

#[test]
fn scenario_a_connected_chain() {
    let row = single(ReportInput {
        segments: vec![
            run("S1", SegmentKind::Tray, 0.0, 2.0),
            run("S2", SegmentKind::Tray, 2.0, 5.0),
            run("S3", SegmentKind::Tray, 5.0, 9.0),
        ],
        equipment: vec![equipment("E1", "SRC", -0.2), equipment("E2", "DST", 9.2)],
        routes: vec![route("R1", "SRC", "DST", &["S1", "S2", "S3"])],
    });
    assert_eq!(row.status, RouteStatus::Confirmed);
    assert_eq!(row.path_description, "S1,S2,S3");
}

#[test]
fn scenario_b_short_jump_between_pairs() {
    let row = single(ReportInput {
        segments: vec![
            run("S1", SegmentKind::Tray, 0.0, 1.0),
            run("S2", SegmentKind::Tray, 1.0, 2.0),
            run("S3", SegmentKind::Tray, 3.0, 4.0),
            run("S4", SegmentKind::Tray, 4.0, 5.0),
        ],
        equipment: vec![equipment("E1", "SRC", -0.2), equipment("E2", "DST", 5.2)],
        routes: vec![route("R1", "SRC", "DST", &["S1", "S2", "S3", "S4"])],
    });
    assert_eq!(row.status, RouteStatus::UnconfirmedVirtual);
    assert_eq!(row.path_description, "S1,S2 || S3,S4");
}

#[test]
fn scenario_c_no_assignment_is_pending() {
    let row = single(ReportInput {
        segments: vec![run("S1", SegmentKind::Tray, 0.0, 1.0)],
        equipment: vec![equipment("E1", "SRC", 0.0)],
        routes: vec![route("R1", "SRC", "DST", &[])],
    });
    assert_eq!(row.status, RouteStatus::Pending);
    assert!(row.path_description.is_empty());
    assert!(row.branch_summary.is_empty());
}

#[test]
fn scenario_d_tray_to_conduit() {
    let row = single(ReportInput {
        segments: vec![
            run("Tray1", SegmentKind::Tray, 0.0, 1.0),
            run("Conduit1", SegmentKind::Conduit, 1.0, 2.0),
        ],
        equipment: vec![equipment("E1", "SRC", -0.2), equipment("E2", "DST", 2.2)],
        routes: vec![route("R1", "SRC", "DST", &["Tray1", "Conduit1"])],
    });
    assert_eq!(row.status, RouteStatus::Confirmed);
    assert_eq!(row.path_description, "Tray1 + Conduit1");
}

#[test]
fn scenario_e_unmatched_labels_still_produce_path() {
    let row = single(ReportInput {
        segments: vec![
            run("S1", SegmentKind::Tray, 0.0, 1.0),
            run("S2", SegmentKind::Tray, 1.0, 2.0),
        ],
        equipment: vec![equipment("E1", "SRC", 0.0)],
        routes: vec![route("R1", "Nowhere", "Elsewhere", &["S1", "S2"])],
    });
    assert_eq!(row.status, RouteStatus::UnconfirmedVirtual);
    assert_eq!(row.path_description, "S1,S2");
    assert_eq!(row.from_label, "Nowhere");
    assert_eq!(row.to_label, "Elsewhere");
}

#[test]
fn faulty_route_does_not_abort_batch() {
    let out = rows(ReportInput {
        segments: vec![
            run("S1", SegmentKind::Tray, 0.0, 1.0),
            run("S2", SegmentKind::Tray, 1.0, 2.0),
        ],
        equipment: vec![equipment("E1", "SRC", -0.2), equipment("E2", "DST", 2.2)],
        routes: vec![
            route("R1", "SRC", "DST", &["S1", "GHOST"]),
            route("R2", "SRC", "DST", &["S1", "S2"]),
        ],
    });
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].status, RouteStatus::Error);
    assert!(out[0].path_description.contains("GHOST"));
    assert_eq!(out[1].status, RouteStatus::Confirmed);
}

/// A grid-ish network with equal-cost alternatives and a disconnected
/// tail, used for the determinism properties. C-1 sits off the axis so
/// island ordering never ties.
fn busy_input() -> ReportInput {
    let mut segments = vec![
        run("A-1", SegmentKind::Tray, 0.0, 1.0),
        run("A-2", SegmentKind::Tray, 1.0, 2.0),
        run("B-1", SegmentKind::Conduit, 2.0, 3.0),
        run("B-2", SegmentKind::Conduit, 3.0, 4.0),
        offset_run("C-1", SegmentKind::Tray, 4.5, 5.5, 1.0),
        run("D-1", SegmentKind::Tray, 9.0, 10.0),
    ];
    // Parallel bypass from A-2 to B-2 of the same cost as B-1.
    let mut bypass = run("A-3", SegmentKind::Tray, 2.0, 3.0);
    bypass.connected_to = vec!["A-2".to_string(), "B-2".to_string()];
    bypass.connection_points.clear();
    segments.push(bypass);

    ReportInput {
        segments,
        equipment: vec![
            equipment("E1", "SRC", -0.2),
            equipment("E2", "MID", 4.2),
            equipment("E3", "FAR", 10.2),
            equipment("E4", "FAR", 10.4),
        ],
        routes: vec![
            route("R1", "SRC", "MID", &["A-1", "A-2", "A-3", "B-1", "B-2"]),
            route("R2", "SRC", "FAR", &["A-1", "A-2", "B-1", "B-2", "C-1", "D-1"]),
            route("R3", "SRC", "?", &["A-1", "A-2", "C-1"]),
            route("R4", "?", "?", &["D-1", "C-1", "A-1"]),
            route("R5", "SRC", "FAR", &[]),
            route("R6", "?", "FAR", &["A-1", "A-2", "D-1"]),
        ],
    }
}

#[test]
fn equal_cost_paths_resolve_by_identifier() {
    let out = rows(busy_input());
    // A-3 sorts before B-1, so the bypass wins the tie.
    assert_eq!(out[0].path_description, "A-1,A-2,A-3 + B-2");
    assert_eq!(out[0].branch_summary, "1,2,3");
}

#[test]
fn idempotent_across_runs() {
    assert_eq!(rows(busy_input()), rows(busy_input()));
}

#[test]
fn independent_of_input_order() {
    let forward = rows(busy_input());

    let mut shuffled = busy_input();
    shuffled.segments.reverse();
    shuffled.equipment.reverse();
    shuffled.segments.rotate_left(2);
    assert_eq!(rows(shuffled), forward);
}

#[test]
fn one_row_per_route_in_order() {
    let out = rows(busy_input());
    let ids: Vec<&str> = out.iter().map(|r| r.route_id.as_str()).collect();
    assert_eq!(ids, ["R1", "R2", "R3", "R4", "R5", "R6"]);
    assert_eq!(out[4].status, RouteStatus::Pending);
}

#[test]
fn disconnected_routes_render_exact_paths() {
    let out = rows(busy_input());

    // The direct hop to D-1 is shorter than detouring via the raised C-1.
    assert_eq!(out[1].status, RouteStatus::UnconfirmedVirtual);
    assert_eq!(out[1].path_description, "A-1,A-2 + B-1,B-2 >> D-1");
    assert_eq!(out[1].branch_summary, "1,2");
    assert_eq!(out[1].to_label, "FAR");

    assert_eq!(out[2].status, RouteStatus::PartiallyConfirmed);
    assert_eq!(out[2].path_description, "A-1,A-2 >> C-1");
    assert_eq!(out[2].branch_summary, "1,2");
    assert_eq!(out[2].to_label, "?");

    // Neither side resolves: islands in identifier order.
    assert_eq!(out[3].status, RouteStatus::UnconfirmedVirtual);
    assert_eq!(out[3].path_description, "A-1 >> C-1 >> D-1");
    assert_eq!(out[3].branch_summary, "1");
}

#[test]
fn end_only_route_jumps_and_ends_at_destination() {
    let out = rows(busy_input());
    let row = &out[5];
    assert_eq!(row.status, RouteStatus::PartiallyConfirmed);
    assert_eq!(row.path_description, "A-1,A-2 >> D-1");
    assert_eq!(row.branch_summary, "1,2");
    assert_eq!(row.from_label, "?");
    assert_eq!(row.to_label, "FAR");
}
