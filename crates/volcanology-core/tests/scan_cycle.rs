//! End-to-end cycle behaviour: categorize → track → gate → reduce.

use chrono::{NaiveDate, NaiveDateTime};
use volcanology_core::{
    categorize, AggregateStatus, Aggregator, BusinessHoursGate, Category, DateSet, GateDecision,
    JobReport, NoHolidays, StatusCodeMap,
};

fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hour, 30, 0)
        .unwrap()
}

fn code_map() -> StatusCodeMap {
    StatusCodeMap::from_names([
        ("red", "Failing"),
        ("blue", "Success"),
        ("blue_anime", "Building"),
    ])
    .expect("valid code map")
}

fn reports(items: &[(&str, &str)]) -> Vec<JobReport> {
    items.iter().map(|(n, c)| JobReport::new(*n, *c)).collect()
}

fn weekday_aggregator(threshold: u32) -> Aggregator {
    Aggregator::new(
        code_map(),
        BusinessHoursGate::new(8, 18).unwrap(),
        Box::new(NoHolidays),
        threshold,
    )
}

/// Scenario A: a failure persists until the job reports success.
#[test]
fn test_failure_persists_then_clears_on_success() {
    let mut agg = weekday_aggregator(6);
    let now = at(2026, 10, 14, 10);

    let first = agg.apply(&reports(&[("jobA", "red")]), now);
    assert_eq!(first.status, AggregateStatus::Failure);
    assert!(first.persisted_failures.contains("jobA"));

    let building = agg.apply(&reports(&[("jobA", "blue_anime")]), now);
    assert_eq!(
        building.status,
        AggregateStatus::Failure,
        "a rebuild does not clear the failure"
    );

    let second = agg.apply(&reports(&[("jobA", "blue")]), now);
    assert!(second.persisted_failures.is_empty());
    assert_eq!(second.status, AggregateStatus::Success);
}

/// Scenario B: three Building → Success transitions with threshold 2.
#[test]
fn test_success_streak_fires_once_counter_exceeds_threshold() {
    let mut agg = weekday_aggregator(2);
    let now = at(2026, 10, 14, 10);

    let mut streak_cycles = Vec::new();
    for round in 0..3 {
        agg.apply(&reports(&[("X", "blue_anime")]), now);
        let report = agg.apply(&reports(&[("X", "blue")]), now);
        if report.status == AggregateStatus::SuccessStreak {
            streak_cycles.push(round);
            assert_eq!(report.streak_job.as_deref(), Some("X"));
        }
    }
    assert_eq!(streak_cycles, vec![2]);
    assert_eq!(agg.state().success_count("X"), Some(0));
}

/// Scenario C: a holiday turns indicators off regardless of job state.
#[test]
fn test_holiday_is_off_regardless_of_jobs() {
    let mut agg = Aggregator::new(
        code_map(),
        BusinessHoursGate::new(8, 18).unwrap(),
        Box::new(DateSet::parse(&["2026-10-14"]).unwrap()),
        6,
    );
    let now = at(2026, 10, 14, 10);
    for jobs in [&[("a", "red")][..], &[("a", "blue")][..], &[][..]] {
        let report = agg.apply(&reports(jobs), now);
        assert_eq!(report.status, AggregateStatus::Off);
        assert_eq!(report.gate, GateDecision::Holiday);
    }
}

/// Scenario D: the end hour is inclusive.
#[test]
fn test_end_hour_boundary() {
    let gate = BusinessHoursGate::new(8, 17).unwrap();
    assert!(gate.is_live(at(2026, 10, 14, 17), &NoHolidays));
    assert!(!gate.is_live(at(2026, 10, 14, 18), &NoHolidays));

    let mut agg = Aggregator::new(code_map(), gate, Box::new(NoHolidays), 6);
    let report = agg.apply(&reports(&[("a", "blue")]), at(2026, 10, 14, 17));
    assert_eq!(report.status, AggregateStatus::Success);
    let report = agg.apply(&reports(&[("a", "blue")]), at(2026, 10, 14, 18));
    assert_eq!(report.status, AggregateStatus::Off);
}

#[test]
fn test_weekend_is_off() {
    let mut agg = weekday_aggregator(6);
    let report = agg.apply(&reports(&[("a", "red")]), at(2026, 10, 17, 10));
    assert_eq!(report.status, AggregateStatus::Off);
    assert_eq!(report.gate, GateDecision::Weekend);
}

#[test]
fn test_every_job_lands_in_exactly_one_category() {
    let map = StatusCodeMap::jenkins_defaults();
    let input = reports(&[
        ("a", "red"),
        ("b", "blue"),
        ("c", "yellow_anime"),
        ("d", "notbuilt"),
        ("e", "unheard_of"),
        ("f", ""),
    ]);
    let set = categorize(&input, &map);
    for report in &input {
        let hits = [
            Category::Failing,
            Category::Success,
            Category::Building,
            Category::Other,
        ]
        .iter()
        .filter(|c| set.set(**c).contains(&report.name))
        .count();
        assert_eq!(hits, 1, "{} must be in exactly one set", report.name);
    }
    assert_eq!(set.total(), input.len());
}

#[test]
fn test_categorization_is_recomputed_each_cycle() {
    let mut agg = weekday_aggregator(6);
    let now = at(2026, 10, 14, 10);
    agg.apply(&reports(&[("a", "red"), ("b", "blue")]), now);
    let report = agg.apply(&reports(&[("b", "blue")]), now);
    assert!(!report.jobs.failing.contains("a"));
    assert_eq!(report.jobs.total(), 1);
}

#[test]
fn test_unmapped_codes_do_not_fail_the_cycle() {
    let mut agg = weekday_aggregator(6);
    let report = agg.apply(&reports(&[("a", "purple")]), at(2026, 10, 14, 10));
    assert!(report.jobs.other.contains("a"));
    assert_eq!(report.status, AggregateStatus::Success);
}
