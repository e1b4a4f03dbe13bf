//! Tests for loading the CSV tables from disk

use pulse_common::pulse_config::DataConfig;
use pulse_common::{DataStore, PulseError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REVIEWS: &str = "\
review_id,RC_ver,theme_label,score,content,final_weight,sentiment
r1,8.9.0,Playback Reliability,1,\"Crashes, then freezes \"\"every\"\" time\",3.5,neg
r2,8.10.0,Ads Frequency,4.0,Fine,0.2,pos
r3,,Search,2,No version,1.0,neg
";

const BACKLOG: &str = "\
theme,Priority_Score,Reach,Impact,Confidence,Effort,Is_Persistent,Is_Regression
Playback Reliability,6.25,0.4,2.0,0.9,3,True,False
Ads Frequency,1.5,0.1,1.0,0.5,2.0,0,1
";

const PERSISTENCE: &str = "\
theme,Is_Persistent,Releases_Flagged
Playback Reliability,True,4
Ads Frequency,False,1
";

const SIGNAL: &str = "\
theme,RC_ver,Normalized_Signal,Review_Count,Avg_Rating,Delta,Is_Regression
Playback Reliability,8.9.0,0.5,10,1.8,,False
Playback Reliability,8.10.0,0.62,12,1.6,0.12,True
";

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn full_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let files = DataConfig::default();
    write(dir.path(), &files.reviews_file, REVIEWS);
    write(dir.path(), &files.priority_file, BACKLOG);
    write(dir.path(), &files.persistence_file, PERSISTENCE);
    write(dir.path(), &files.version_signal_file, SIGNAL);
    dir
}

#[test]
fn test_load_all_tables() {
    let dir = full_dir();
    let store = DataStore::load(dir.path(), &DataConfig::default()).unwrap();

    assert_eq!(store.reviews().len(), 3);
    assert_eq!(store.priority().len(), 2);
    assert_eq!(store.persistence().len(), 2);
    assert_eq!(store.version_signal().len(), 2);

    let first = &store.reviews()[0];
    assert_eq!(first.content, "Crashes, then freezes \"every\" time");
    assert_eq!(first.star_score, 1);
    assert_eq!(store.reviews()[1].star_score, 4);
    assert_eq!(store.reviews()[2].version(), None);

    let ads = &store.priority()[1];
    assert_eq!(ads.effort, 2);
    assert!(!ads.is_persistent);
    assert!(ads.is_regression);

    assert!(store.is_persistent("Playback Reliability"));
    assert!(!store.is_persistent("Ads Frequency"));

    let signal = &store.version_signal()[0];
    assert_eq!(signal.delta, None);
    assert_eq!(store.latest_signal_version(), Some("8.10.0"));
}

#[test]
fn test_optional_tables_may_be_missing() {
    let dir = tempfile::tempdir().unwrap();
    let files = DataConfig::default();
    write(dir.path(), &files.reviews_file, REVIEWS);
    write(dir.path(), &files.priority_file, BACKLOG);

    let store = DataStore::load(dir.path(), &files).unwrap();
    assert!(store.persistence().is_empty());
    assert!(store.version_signal().is_empty());
    assert_eq!(store.reviews().len(), 3);
}

#[test]
fn test_missing_reviews_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = DataConfig::default();
    write(dir.path(), &files.priority_file, BACKLOG);

    let err = DataStore::load(dir.path(), &files).unwrap_err();
    match err {
        PulseError::DataLoad { path, .. } => assert!(path.ends_with(&files.reviews_file)),
        other => panic!("expected DataLoad, got {:?}", other),
    }
}

#[test]
fn test_bad_row_reports_line() {
    let dir = full_dir();
    let files = DataConfig::default();
    write(
        dir.path(),
        &files.priority_file,
        "theme,Priority_Score,Reach,Impact,Confidence,Effort,Is_Persistent,Is_Regression\n\
         Search,high,0.1,1.0,0.5,2,False,False\n",
    );

    let err = DataStore::load(dir.path(), &files).unwrap_err();
    assert_eq!(err.code(), -32010);
    assert!(err.to_string().contains("row 2"), "{}", err);
}

#[test]
fn test_reviews_with_blank_score_or_weight_are_skipped() {
    let dir = full_dir();
    let files = DataConfig::default();
    write(
        dir.path(),
        &files.reviews_file,
        "review_id,RC_ver,theme_label,score,content,final_weight\n\
         r1,8.9.0,Search,,No stars,1.0\n\
         r2,8.9.0,Search,2,Slow results,2.5\n\
         r3,8.9.0,Search,3,No weight,  \n",
    );

    let store = DataStore::load(dir.path(), &files).unwrap();
    assert_eq!(store.reviews().len(), 1);
    assert_eq!(store.reviews()[0].id, "r2");
}

#[test]
fn test_bad_review_score_is_still_an_error() {
    let dir = full_dir();
    let files = DataConfig::default();
    write(
        dir.path(),
        &files.reviews_file,
        "review_id,RC_ver,theme_label,score,content,final_weight\n\
         r1,8.9.0,Search,five,Great,1.0\n",
    );

    let err = DataStore::load(dir.path(), &files).unwrap_err();
    assert_eq!(err.code(), -32010);
    assert!(err.to_string().contains("row 2"), "{}", err);
}

#[test]
fn test_custom_file_names() {
    let dir = full_dir();
    let files = DataConfig {
        reviews_file: "reviews_v2.csv".to_string(),
        ..DataConfig::default()
    };
    fs::rename(
        dir.path().join(DataConfig::default().reviews_file),
        dir.path().join("reviews_v2.csv"),
    )
    .unwrap();

    let store = DataStore::load(dir.path(), &files).unwrap();
    assert_eq!(store.review_themes().len(), 3);
}
