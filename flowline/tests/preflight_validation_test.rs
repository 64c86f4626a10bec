// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pre-Flight Validation Integration Tests
//!
//! The pre-flight contract end to end: missing external files, level
//! overrides, the intermediate-outputs-are-never-inspected invariant, and
//! the shell's refusal to run an invalid pipeline.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test preflight_validation_test
//! ```

use flowline::application::{shell, PipelineRegistry};
use flowline::demo::pipelines::{enrich_pipeline, parse_ratings_pipeline};
use flowline::demo::ReviewsCatalog;
use flowline::infrastructure::config::AppSettings;
use flowline_bootstrap::ValidatedCommand;
use flowline_domain::entry::{InspectionLevel, ValidationErrorKind};
use flowline_domain::PipelineError;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_fixture(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().expect("fixture has a parent")).expect("mkdir");
    std::fs::write(path, contents).expect("fixture written");
}

/// A missing external CSV yields exactly one NotFound error naming the
/// path, and nothing else is reported for that entry.
#[tokio::test]
async fn test_missing_external_input_is_exactly_one_not_found() {
    let dir = TempDir::new().unwrap();
    let catalog = ReviewsCatalog::new(dir.path());

    let mut pipeline = parse_ratings_pipeline(&catalog).unwrap();
    pipeline.build().unwrap();

    let validation = pipeline.validate_external_inputs().await.unwrap();
    assert!(!validation.is_valid());
    assert_eq!(validation.errors().len(), 1);

    let error = &validation.errors()[0];
    assert_eq!(error.kind(), ValidationErrorKind::NotFound);
    assert_eq!(error.entry_key(), "raw_ratings");
    assert!(error.message().contains("ratings.csv"));
}

/// Outputs are never inspected: the enrich pipeline validates cleanly
/// even though its output JSON does not exist yet.
#[tokio::test]
async fn test_intermediate_outputs_are_not_inspected() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "raw/companies.csv", "id,name\na,Acme\n");
    write_fixture(dir.path(), "raw/reviews.csv", "id,score\na,4.2\n");

    let catalog = ReviewsCatalog::new(dir.path());
    let mut pipeline = enrich_pipeline(&catalog).unwrap();
    pipeline.build().unwrap();

    let validation = pipeline.validate_external_inputs().await.unwrap();
    assert!(validation.is_valid(), "outputs were inspected: {}", validation);
}

/// A `None` override skips an otherwise-failing entry entirely.
#[tokio::test]
async fn test_none_override_skips_the_entry() {
    let dir = TempDir::new().unwrap();
    let catalog = ReviewsCatalog::new(dir.path());

    let mut pipeline = parse_ratings_pipeline(&catalog).unwrap();
    pipeline.build().unwrap();
    pipeline.set_inspection_override("raw_ratings", InspectionLevel::None);

    let validation = pipeline.validate_external_inputs().await.unwrap();
    assert!(validation.is_valid());
    assert_eq!(pipeline.validated_input_count(), 0);
}

/// A `Deep` override surfaces bad rows beyond the shallow sample.
#[tokio::test]
async fn test_deep_override_reads_past_the_sample() {
    let dir = TempDir::new().unwrap();
    let mut contents = String::from("id,rating_pct\n");
    for row in 0..150 {
        contents.push_str(&format!("id{},{}%\n", row, row % 100));
    }
    contents.push_str("bad,not-a-csv-number%,extra-column\n");
    write_fixture(dir.path(), "raw/ratings.csv", &contents);

    let catalog = ReviewsCatalog::new(dir.path());
    let mut pipeline = parse_ratings_pipeline(&catalog).unwrap();
    pipeline.build().unwrap();

    // Shallow samples the first 100 rows and sees nothing wrong.
    let shallow = pipeline.validate_external_inputs().await.unwrap();
    assert!(shallow.is_valid());

    pipeline.set_inspection_override("raw_ratings", InspectionLevel::Deep);
    let deep = pipeline.validate_external_inputs().await.unwrap();
    assert!(!deep.is_valid());
}

/// The shell refuses to run an invalid pipeline: the pre-flight failure
/// comes back as `ValidationFailed` and no output is produced.
#[tokio::test]
async fn test_shell_does_not_run_on_preflight_failure() {
    let dir = TempDir::new().unwrap();
    let settings = AppSettings {
        catalog: flowline::infrastructure::config::CatalogSettings {
            data_dir: dir.path().to_path_buf(),
        },
        ..AppSettings::default()
    };

    let catalog = Arc::new(ReviewsCatalog::new(dir.path()));
    let mut registry = PipelineRegistry::new();
    flowline::demo::register_demo_pipelines(&mut registry, Arc::clone(&catalog), &settings).unwrap();

    let command = ValidatedCommand::Run {
        pipeline: Some("parse_ratings".to_string()),
        dry_run: false,
    };
    let outcome = shell::execute(&command, &registry, &settings).await;
    assert!(matches!(outcome, Err(PipelineError::ValidationFailed(_))));
    assert!(!dir.path().join("intermediate/parsed_ratings.csv").exists());
}

/// Unknown pipeline names fail with a descriptive error.
#[tokio::test]
async fn test_unknown_pipeline_name() {
    let dir = TempDir::new().unwrap();
    let settings = AppSettings::default();
    let catalog = Arc::new(ReviewsCatalog::new(dir.path()));
    let mut registry = PipelineRegistry::new();
    flowline::demo::register_demo_pipelines(&mut registry, catalog, &settings).unwrap();

    let command = ValidatedCommand::Run {
        pipeline: Some("does_not_exist".to_string()),
        dry_run: false,
    };
    let outcome = shell::execute(&command, &registry, &settings).await;
    let error = outcome.unwrap_err();
    assert!(matches!(error, PipelineError::PipelineNotFound(_)));
    assert!(error.to_string().contains("parse_ratings"));
}

/// Dry run: build, validate, report — and the output file never appears.
#[tokio::test]
async fn test_dry_run_executes_nothing() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "raw/ratings.csv", "id,rating_pct\na,85%\n");

    let settings = AppSettings {
        catalog: flowline::infrastructure::config::CatalogSettings {
            data_dir: dir.path().to_path_buf(),
        },
        ..AppSettings::default()
    };
    let catalog = Arc::new(ReviewsCatalog::new(dir.path()));
    let mut registry = PipelineRegistry::new();
    flowline::demo::register_demo_pipelines(&mut registry, Arc::clone(&catalog), &settings).unwrap();

    let command = ValidatedCommand::Run {
        pipeline: Some("parse_ratings".to_string()),
        dry_run: true,
    };
    let outcome = shell::execute(&command, &registry, &settings).await;
    assert!(outcome.is_ok());
    assert!(!dir.path().join("intermediate/parsed_ratings.csv").exists());
}

/// Configured validation overrides reach the built pipeline.
#[tokio::test]
async fn test_settings_overrides_apply_through_the_shell() {
    let dir = TempDir::new().unwrap();
    let mut settings = AppSettings {
        catalog: flowline::infrastructure::config::CatalogSettings {
            data_dir: dir.path().to_path_buf(),
        },
        ..AppSettings::default()
    };
    let mut section = flowline::infrastructure::config::PipelineSettings::default();
    section
        .validation
        .insert("raw_ratings".to_string(), InspectionLevel::None);
    settings.pipelines.insert("parse_ratings".to_string(), section);

    let catalog = Arc::new(ReviewsCatalog::new(dir.path()));
    let mut registry = PipelineRegistry::new();
    flowline::demo::register_demo_pipelines(&mut registry, Arc::clone(&catalog), &settings).unwrap();

    // The raw file is missing, but the configured None override skips the
    // inspection; the dry run therefore succeeds.
    let command = ValidatedCommand::Run {
        pipeline: Some("parse_ratings".to_string()),
        dry_run: true,
    };
    let outcome = shell::execute(&command, &registry, &settings).await;
    assert!(outcome.is_ok(), "unexpected: {:?}", outcome);
}
