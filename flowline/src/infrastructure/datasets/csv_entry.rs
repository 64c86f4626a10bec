// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CSV Dataset Entry
//!
//! File-backed dataset adapter using serde-mapped CSV. Header names come
//! from the record type's serde field names; the required-column check is
//! case-insensitive; deserialization failures annotate the offending row
//! number (header row is line 1, first data row is line 2).
//!
//! Saving rewrites the whole file. A read-only variant drops the
//! `writable` capability and rejects saves with a non-recoverable
//! unsupported-operation error.

use async_trait::async_trait;
use flowline_domain::entry::{
    DatasetEntry, Entry, EntryCapability, ErasedValue, InspectionLevel, ValidationError, ValidationErrorKind,
};
use flowline_domain::PipelineError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const READ_WRITE_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Writable,
    EntryCapability::Dataset,
    EntryCapability::ShallowInspectable,
    EntryCapability::DeepInspectable,
];

const READ_ONLY_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Dataset,
    EntryCapability::ShallowInspectable,
    EntryCapability::DeepInspectable,
];

/// CSV-file-backed dataset entry for serde-mapped record types.
pub struct CsvEntry<T> {
    key: String,
    path: PathBuf,
    read_only: bool,
    required_columns: Vec<String>,
    preferred_level: Option<InspectionLevel>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CsvEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            path: path.into(),
            read_only: false,
            required_columns: Vec::new(),
            preferred_level: None,
            _marker: PhantomData,
        })
    }

    /// Read-only variant: loads and inspects, never saves.
    pub fn read_only(key: impl Into<String>, path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            path: path.into(),
            read_only: true,
            required_columns: Vec::new(),
            preferred_level: None,
            _marker: PhantomData,
        })
    }

    /// Columns the shallow inspection requires to be present, compared
    /// case-insensitively against the file's header row.
    pub fn with_required_columns(self: Arc<Self>, columns: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            key: self.key.clone(),
            path: self.path.clone(),
            read_only: self.read_only,
            required_columns: columns.iter().map(|column| column.to_string()).collect(),
            preferred_level: self.preferred_level,
            _marker: PhantomData,
        })
    }

    /// Declares the inspection level this entry prefers when the pipeline
    /// does not override it.
    pub fn with_preferred_inspection(self: Arc<Self>, level: InspectionLevel) -> Arc<Self> {
        Arc::new(Self {
            key: self.key.clone(),
            path: self.path.clone(),
            read_only: self.read_only,
            required_columns: self.required_columns.clone(),
            preferred_level: Some(level),
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|error| PipelineError::io_error(format!("{}: {}", self.path.display(), error)))
    }

    fn classify_record_error(&self, row: usize, error: &csv::Error) -> ValidationError {
        let message = error.to_string();
        let kind = if message.contains("missing field") {
            ValidationErrorKind::SchemaMismatch
        } else {
            ValidationErrorKind::DeserializationError
        };
        ValidationError::new(&self.key, kind, message).with_details(format!("row {}", row))
    }

    async fn inspect_with_sample(&self, sample_n: usize) -> Result<Vec<ValidationError>, PipelineError> {
        let mut errors = Vec::new();

        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
        if !exists {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::NotFound,
                format!("file '{}' does not exist", self.path.display()),
            ));
            return Ok(errors);
        }

        let bytes = match self.read_bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                errors.push(ValidationError::new(
                    &self.key,
                    ValidationErrorKind::InspectionFailure,
                    error.to_string(),
                ));
                return Ok(errors);
            }
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(error) => {
                errors.push(ValidationError::new(
                    &self.key,
                    ValidationErrorKind::InvalidFormat,
                    format!("header row is not parseable: {}", error),
                ));
                return Ok(errors);
            }
        };

        // Case-insensitive required-column check against the header row.
        let lowered: Vec<String> = headers.iter().map(|header| header.to_lowercase()).collect();
        for column in &self.required_columns {
            if !lowered.contains(&column.to_lowercase()) {
                errors.push(ValidationError::new(
                    &self.key,
                    ValidationErrorKind::SchemaMismatch,
                    format!("required column '{}' is missing", column),
                ));
            }
        }
        if !errors.is_empty() {
            return Ok(errors);
        }

        let mut record_count = 0usize;
        for (index, record) in reader.deserialize::<T>().enumerate() {
            if index >= sample_n {
                record_count += 1;
                continue;
            }
            record_count += 1;
            if let Err(error) = record {
                errors.push(self.classify_record_error(index + 2, &error));
            }
        }

        if record_count == 0 {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::EmptyDataset,
                format!("'{}' contains a header but no records", self.path.display()),
            ));
        }

        Ok(errors)
    }
}

#[async_trait]
impl<T> Entry for CsvEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        &self.key
    }

    fn data_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn capabilities(&self) -> &'static [EntryCapability] {
        if self.read_only {
            READ_ONLY_CAPABILITIES
        } else {
            READ_WRITE_CAPABILITIES
        }
    }

    fn preferred_inspection_level(&self) -> Option<InspectionLevel> {
        self.preferred_level
    }

    async fn exists(&self) -> Result<bool, PipelineError> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|error| PipelineError::io_error(format!("{}: {}", self.path.display(), error)))
    }

    async fn count(&self) -> Result<u64, PipelineError> {
        let bytes = self.read_bytes().await?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut count = 0u64;
        for record in reader.records() {
            record.map_err(|error| PipelineError::io_error(format!("{}: {}", self.path.display(), error)))?;
            count += 1;
        }
        Ok(count)
    }

    async fn load_erased(&self) -> Result<ErasedValue, PipelineError> {
        Ok(Box::new(self.load().await?))
    }

    async fn save_erased(&self, value: ErasedValue) -> Result<(), PipelineError> {
        let items = value.downcast::<Vec<T>>().map_err(|_| {
            PipelineError::type_mismatch(format!(
                "entry '{}' expects {}",
                self.key,
                std::any::type_name::<Vec<T>>()
            ))
        })?;
        self.save(*items).await
    }

    async fn inspect_shallow(&self, sample_n: usize) -> Result<Vec<ValidationError>, PipelineError> {
        self.inspect_with_sample(sample_n).await
    }

    async fn inspect_deep(&self) -> Result<Vec<ValidationError>, PipelineError> {
        // Deep inspection deserializes every record; an unbounded sample
        // covers both phases in one pass over the file.
        self.inspect_with_sample(usize::MAX).await
    }
}

#[async_trait]
impl<T> DatasetEntry<T> for CsvEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, PipelineError> {
        let bytes = self.read_bytes().await?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut items = Vec::new();
        for (index, record) in reader.deserialize::<T>().enumerate() {
            let item = record.map_err(|error| {
                PipelineError::serialization_error(format!(
                    "{}: row {}: {}",
                    self.path.display(),
                    index + 2,
                    error
                ))
            })?;
            items.push(item);
        }
        Ok(items)
    }

    async fn save(&self, items: Vec<T>) -> Result<(), PipelineError> {
        if self.read_only {
            return Err(PipelineError::unsupported(format!(
                "entry '{}' is read-only; writes are not supported",
                self.key
            )));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for item in &items {
            writer
                .serialize(item)
                .map_err(|error| PipelineError::serialization_error(format!("{}: {}", self.path.display(), error)))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|error| PipelineError::serialization_error(format!("{}: {}", self.path.display(), error)))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| PipelineError::io_error(format!("{}: {}", parent.display(), error)))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|error| PipelineError::io_error(format!("{}: {}", self.path.display(), error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Review {
        id: String,
        score: f64,
    }

    fn temp_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("fixture written");
        path
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let entry = CsvEntry::<Review>::new("reviews", dir.path().join("reviews.csv"));

        let items = vec![
            Review {
                id: "a".into(),
                score: 4.2,
            },
            Review {
                id: "b".into(),
                score: 3.9,
            },
        ];
        entry.save(items.clone()).await.unwrap();
        assert_eq!(entry.load().await.unwrap(), items);
        assert_eq!(entry.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_load_annotates_row_number() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "bad.csv", "id,score\na,4.2\nb,not_a_number\n");
        let entry = CsvEntry::<Review>::new("reviews", path);

        let err = entry.load().await.unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }

    #[tokio::test]
    async fn test_missing_file_inspects_as_not_found() {
        let dir = TempDir::new().unwrap();
        let entry = CsvEntry::<Review>::new("reviews", dir.path().join("absent.csv"));

        let errors = entry.inspect_shallow(100).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ValidationErrorKind::NotFound);
        assert!(errors[0].message().contains("absent.csv"));
    }

    #[tokio::test]
    async fn test_required_columns_checked_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "caps.csv", "ID,SCORE\na,4.2\n");
        let entry =
            CsvEntry::<Review>::new("reviews", path).with_required_columns(&["id", "score"]);

        let errors = entry.inspect_shallow(100).await.unwrap();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[tokio::test]
    async fn test_missing_required_column_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "short.csv", "id\na\n");
        let entry = CsvEntry::<Review>::new("reviews", path).with_required_columns(&["id", "score"]);

        let errors = entry.inspect_shallow(100).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ValidationErrorKind::SchemaMismatch);
        assert!(errors[0].message().contains("score"));
    }

    #[tokio::test]
    async fn test_empty_dataset_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "empty.csv", "id,score\n");
        let entry = CsvEntry::<Review>::new("reviews", path);

        let errors = entry.inspect_shallow(100).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ValidationErrorKind::EmptyDataset);
    }

    #[tokio::test]
    async fn test_bad_row_annotated_in_shallow_inspection() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "bad.csv", "id,score\na,oops\n");
        let entry = CsvEntry::<Review>::new("reviews", path);

        let errors = entry.inspect_shallow(100).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ValidationErrorKind::DeserializationError);
        assert_eq!(errors[0].details(), Some("row 2"));
    }

    #[tokio::test]
    async fn test_shallow_sample_bounds_error_reporting() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "late.csv", "id,score\na,1.0\nb,oops\n");
        let entry = CsvEntry::<Review>::new("reviews", path);

        // Sample of one: the bad second row is out of inspection range.
        let shallow = entry.inspect_shallow(1).await.unwrap();
        assert!(shallow.is_empty());

        // Deep inspection deserializes everything and finds it.
        let deep = entry.inspect_deep().await.unwrap();
        assert_eq!(deep.len(), 1);
    }

    #[tokio::test]
    async fn test_inspection_does_not_mutate_state() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "stable.csv", "id,score\na,4.2\n");
        let entry = CsvEntry::<Review>::new("reviews", path);

        let before = entry.load().await.unwrap();
        entry.inspect_shallow(100).await.unwrap();
        entry.inspect_deep().await.unwrap();
        assert_eq!(entry.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_read_only_entry_rejects_saves() {
        let dir = TempDir::new().unwrap();
        let path = temp_csv(&dir, "frozen.csv", "id,score\na,4.2\n");
        let entry = CsvEntry::<Review>::read_only("reviews", path);

        let err = entry
            .save(vec![Review {
                id: "x".into(),
                score: 1.0,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedOperation(_)));
        assert!(!(entry.as_ref() as &dyn Entry).is_writable());
    }
}
