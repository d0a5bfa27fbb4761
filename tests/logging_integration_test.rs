// Initializes the global subscriber, so this binary holds a single test.

use std::fs;

use tempfile::TempDir;
use tracing::{info, instrument};
use vectorcase::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};

#[instrument]
fn instrumented_lookup(index: &str) -> usize {
    info!(index, "looking up index");
    index.len()
}

#[test]
fn test_file_logging_writes_json() {
    let temp_dir = TempDir::new().unwrap();
    let config = LogConfig {
        level: "info".to_string(),
        format: LogFormat::Json,
        log_dir: Some(temp_dir.path().to_path_buf()),
        rotation: RotationPolicy::Never,
    };

    let logger = LoggerImpl::init(&config).unwrap();
    info!(fragments = 3, "stored fragments");
    assert_eq!(instrumented_lookup("iot-telemetry"), 13);

    // Dropping the guard flushes the non-blocking writer.
    drop(logger);

    let contents = fs::read_to_string(temp_dir.path().join("vectorcase.log")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(lines
        .iter()
        .any(|l| l["fields"]["message"] == "stored fragments" && l["fields"]["fragments"] == 3));
    assert!(lines.iter().any(|l| l["fields"]["index"] == "iot-telemetry"));

    // A second global subscriber is refused.
    assert!(LoggerImpl::init(&LogConfig::default()).is_err());
}
