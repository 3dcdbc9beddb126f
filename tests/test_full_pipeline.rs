//! End-to-end tests: CSV inputs on disk through scoring and reporting

use evidentia::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const EVIDENCE: &str = "\
timestamp,event_type,user_id,description,bytes,is_encrypted
2024-05-01 08:01:00,login,u1,user logged in,120,False
2024-05-01 08:15:00,login,u2,user logged in,118,False
2024-05-01 23:40:00,file_access,u1,suspicious access to private_file,9000,True
2024-05-02 09:00:00,login,u3,user logged in,121,False
2024-05-02 02:12:00,network,u2,suspicious outbound conn to 10.0.0.1:8080,15000,True
2024-05-02 10:30:00,login,u1,user logged in,119,False
2024-05-04 11:00:00,file_access,u3,read report.txt,130,False
2024-05-04 12:00:00,login,u2,user logged in,122,False
2024-05-04 03:33:00,network,u1,suspicious UNKNOWN process,12000,True
2024-05-04 13:00:00,login,u3,user logged in,117,False
";

const ENTITIES: &str = "\
entity,source_row
IP:10.0.0.1,4
FILE:private_file,2
IP:10.0.0.1,8
";

fn write_inputs(dir: &Path) -> PipelineConfig {
    let evidence = dir.join("feature_engineered_evidence.csv");
    let entities = dir.join("extracted_entities.csv");
    fs::write(&evidence, EVIDENCE).unwrap();
    fs::write(&entities, ENTITIES).unwrap();

    let mut config = PipelineConfig::default()
        .with_output_dir(dir.join("out"))
        .with_scoring(ScoringConfig::default().with_contamination(0.3));
    config.evidence_path = evidence;
    config.entities_path = entities;
    config
}

#[test]
fn test_run_writes_all_outputs() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());
    let renderer = ChartSpecRenderer::new(&config.artifact_dir);

    let (outcome, report) = evidentia::pipeline::run(&config, &renderer).unwrap();

    assert_eq!(outcome.scored.height(), 10);
    assert!(config.scored_path.is_file());
    assert!(config.report_path.is_file());
    assert!(config.artifact_dir.join(ChartSpecRenderer::EVENT_CHART).is_file());
    assert!(config.artifact_dir.join(ChartSpecRenderer::TIMELINE_CHART).is_file());

    let scored = DataLoader::new().load_csv(&config.scored_path).unwrap();
    assert_eq!(scored.height(), 10);
    assert!(scored.column("is_anomaly").is_ok());

    let md = fs::read_to_string(&config.report_path).unwrap();
    assert!(md.contains("- **IP:10.0.0.1**: 2 mentions"));
    assert!(md.contains("- anomalies_detected_evidence.csv (10 rows)"));
    assert_eq!(report.artifacts().len(), 2);
}

#[test]
fn test_report_reads_previous_scoring() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());
    evidentia::pipeline::run_scoring(&config).unwrap();

    let renderer = ChartSpecRenderer::new(&config.artifact_dir);
    let report = evidentia::pipeline::run_report(&config, &renderer).unwrap();

    // no severity column in this evidence, so the timeline moves up
    assert!(report.section("2) Timeline of Anomalous Events").is_some());
    assert!(report.sections().iter().all(|s| !s.title.contains("Severity")));
}

#[test]
fn test_missing_evidence_fails_before_writing() {
    let dir = tempdir().unwrap();
    let mut config = write_inputs(dir.path());
    config.evidence_path = dir.path().join("absent.csv");

    let renderer = ChartSpecRenderer::new(&config.artifact_dir);
    let result = evidentia::pipeline::run(&config, &renderer);

    assert!(matches!(result, Err(EvidentiaError::MissingInput { .. })));
    assert!(!config.scored_path.exists());
    assert!(!config.report_path.exists());
}

#[test]
fn test_missing_entities_fails_before_writing() {
    let dir = tempdir().unwrap();
    let mut config = write_inputs(dir.path());
    config.entities_path = dir.path().join("absent_entities.csv");

    let renderer = ChartSpecRenderer::new(&config.artifact_dir);
    let result = evidentia::pipeline::run(&config, &renderer);

    assert!(matches!(result, Err(EvidentiaError::MissingInput { .. })));
    assert!(!config.scored_path.exists());
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("case.json");
    fs::write(&path, r#"{"scoring": {"contamination": 0.1, "temporal_features": true}}"#).unwrap();

    let config = PipelineConfig::from_json_file(&path).unwrap();
    assert_eq!(config.scoring.contamination, 0.1);
    assert!(config.scoring.temporal_features);
    assert!(matches!(
        PipelineConfig::from_json_file(&dir.path().join("nope.json")),
        Err(EvidentiaError::MissingInput { .. })
    ));
}

#[test]
fn test_temporal_features_do_not_change_output_schema() {
    let dir = tempdir().unwrap();
    let mut config = write_inputs(dir.path());
    config.scoring = config.scoring.clone().with_temporal_features(true);

    let outcome = evidentia::pipeline::run_scoring(&config).unwrap();
    assert!(outcome.feature_names.contains(&"hour_of_day".to_string()));
    assert!(outcome.scored.column("hour_of_day").is_err());
}

#[test]
fn test_late_unparseable_severity_degrades() {
    let dir = tempdir().unwrap();
    let mut config = write_inputs(dir.path());

    let mut csv = String::from("event_type,severity,description\n");
    for i in 0..1100 {
        let severity = if i == 1050 { "x".to_string() } else { (i % 5 + 1).to_string() };
        csv.push_str(&format!("login,{},routine\n", severity));
    }
    fs::write(&config.evidence_path, csv).unwrap();
    config.scoring = config.scoring.clone().with_n_estimators(20);

    let renderer = ChartSpecRenderer::new(&config.artifact_dir);
    let (outcome, report) = evidentia::pipeline::run(&config, &renderer).unwrap();

    assert_eq!(outcome.scored.height(), 1100);
    let md = report.to_markdown();
    assert!(md.contains("count          1099"));
    assert!(report.section("Methodology").unwrap().body.contains("1 value(s) in `severity`"));
}
