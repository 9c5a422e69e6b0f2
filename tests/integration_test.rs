// Integration tests against a recorded track day export
//
// The sample holds four laps of ten points each, recorded at 10Hz with
// altitude and lean angle columns. The last lap was flagged invalid by the
// device.

use std::path::PathBuf;

use lapsight::{
    AnalysisConfig, CoachingInsight, FileSessionStore, Session, SessionStore, TheoreticalBest,
    analysis::{ConsistencyVerdict, LeanVerdict, TheoreticalBestMethod},
    coach_session, load_export,
    telemetry::ExportSchema,
};
use tempfile::TempDir;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("telemetry_samples")
        .join("track_day.csv")
}

fn sample_config() -> AnalysisConfig {
    AnalysisConfig {
        schema: ExportSchema::WITH_ALTITUDE_AND_LEAN,
        ..Default::default()
    }
}

fn load_sample() -> Session {
    load_export(&sample_path(), &sample_config()).expect("Sample export should load")
}

#[test]
fn test_sample_session_statistics() {
    let session = load_sample();
    let stats = session.stats();

    assert_eq!(session.points().len(), 40);
    assert_eq!(session.laps().len(), 4);
    assert!(session.warnings().is_empty());
    assert!(!session.start_time_substituted());
    assert_eq!(session.started_at().timestamp_millis(), 1_700_000_000_000);

    assert_eq!(stats.lap_count, 4);
    assert_eq!(stats.max_speed, 130.);
    assert!((stats.avg_speed - 109.625).abs() < 1e-9);
    assert_eq!(stats.max_rpm, 13200.);
    // 39 steps of roughly 0.556m each
    assert!(
        stats.total_distance_km > 0.021 && stats.total_distance_km < 0.022,
        "unexpected distance {}",
        stats.total_distance_km
    );
    // invalid 4th lap is ignored
    assert_eq!(stats.best_lap_s, 60.5);
}

#[test]
fn test_sample_lap_breakdown() {
    let session = load_sample();
    let laps = session.lap_stats(&sample_config());

    assert_eq!(laps.len(), 4);
    assert!(laps.iter().all(|lap| lap.point_count == 10));
    assert_eq!(laps[1].max_speed, 130.);
    assert!((laps[1].avg_speed - 108.5).abs() < 1e-9);
    assert!(laps[..3].iter().all(|lap| lap.valid));
    assert!(!laps[3].valid);
}

#[test]
fn test_sample_theoretical_best() {
    let session = load_sample();

    match session.theoretical_best(&sample_config()) {
        TheoreticalBest::Available {
            lap_time_s,
            sector_times_s,
        } => {
            assert_eq!(sector_times_s.len(), 3);
            assert!(lap_time_s > 0.);
            assert!(lap_time_s <= 60.5 + 1e-9);
        }
        other => panic!("Expected a sector based theoretical best, got {other:?}"),
    }

    let fixed_ratio = AnalysisConfig {
        theoretical_best_method: TheoreticalBestMethod::FixedRatio,
        ..sample_config()
    };
    let estimate = session.theoretical_best(&fixed_ratio).lap_time_s().unwrap();
    assert!((estimate - 60.5 * 0.95).abs() < 1e-9);
}

#[test]
fn test_sample_coaching_insights() {
    let session = load_sample();
    let insights = coach_session(&session, &sample_config());
    assert_eq!(insights.len(), 3);

    match &insights[0] {
        CoachingInsight::HardBraking { zones } => {
            assert_eq!(zones.len(), 5);
            assert_eq!(zones[0].point_index, 14);
            assert_eq!(zones[0].entry_speed, 75.);
            assert_eq!(zones[0].deceleration_magnitude, 35.);
            // equal drops keep their order in the session
            let rest: Vec<usize> = zones[1..].iter().map(|z| z.point_index).collect();
            assert_eq!(rest, vec![3, 4, 13, 23]);
        }
        other => panic!("Expected braking insight first, got {other:?}"),
    }

    match &insights[1] {
        CoachingInsight::Cornering(assessment) => {
            assert!((assessment.max_lean_deg - 38.2).abs() < 1e-9);
            assert_eq!(assessment.confidence_pct, 85);
            assert_eq!(assessment.verdict, LeanVerdict::Confident);
        }
        other => panic!("Expected cornering insight, got {other:?}"),
    }

    match &insights[2] {
        CoachingInsight::Consistency(assessment) => {
            assert_eq!(assessment.lap_count, 3);
            assert!((assessment.lap_time_range_s - 0.7).abs() < 1e-9);
            assert_eq!(assessment.verdict, ConsistencyVerdict::High);
        }
        other => panic!("Expected consistency insight, got {other:?}"),
    }
}

#[test]
fn test_sample_without_lean_schema_skips_cornering() {
    let session = load_export(&sample_path(), &AnalysisConfig::default()).unwrap();
    let insights = coach_session(&session, &AnalysisConfig::default());

    assert!(
        !insights
            .iter()
            .any(|insight| matches!(insight, CoachingInsight::Cornering(_)))
    );
    assert!(session.points().iter().all(|p| p.lean_angle.is_none()));
}

#[test]
fn test_session_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = FileSessionStore::new(temp_dir.path().join("sessions")).unwrap();
    let session = load_sample();

    let session_id = store.save_session(&session).unwrap();
    assert_eq!(store.list_sessions().unwrap(), vec![session_id.clone()]);

    let restored = store
        .load_session(&session_id)
        .unwrap()
        .expect("Saved session should be found");
    assert_eq!(restored, session);
    assert_eq!(
        coach_session(&restored, &sample_config()),
        coach_session(&session, &sample_config())
    );
}

#[test]
fn test_missing_export_is_an_error() {
    let result = load_export(
        &PathBuf::from("telemetry_samples/does_not_exist.csv"),
        &AnalysisConfig::default(),
    );
    assert!(result.is_err());
}
