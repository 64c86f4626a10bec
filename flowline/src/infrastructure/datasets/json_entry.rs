// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # JSON Entries
//!
//! File-backed JSON adapters in two shapes:
//!
//! - [`JsonEntry<T>`] — a dataset whose file root must be an array. An
//!   empty array is a pre-flight error; shallow inspection is a syntactic
//!   parse plus a bounded sample of element deserializations; deep
//!   inspection deserializes every element.
//! - [`JsonValueEntry<T>`] — a singleton document holding one `T`.
//!
//! Saves are pretty-printed total overwrites.

use async_trait::async_trait;
use flowline_domain::entry::{
    DatasetEntry, Entry, EntryCapability, ErasedValue, InspectionLevel, ValidationError, ValidationErrorKind,
    ValueEntry,
};
use flowline_domain::PipelineError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DATASET_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Writable,
    EntryCapability::Dataset,
    EntryCapability::ShallowInspectable,
    EntryCapability::DeepInspectable,
];

const SINGLETON_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Writable,
    EntryCapability::Singleton,
    EntryCapability::ShallowInspectable,
];

async fn read_bytes(path: &Path) -> Result<Vec<u8>, PipelineError> {
    tokio::fs::read(path)
        .await
        .map_err(|error| PipelineError::io_error(format!("{}: {}", path.display(), error)))
}

async fn write_bytes(path: &Path, bytes: Vec<u8>) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|error| PipelineError::io_error(format!("{}: {}", parent.display(), error)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|error| PipelineError::io_error(format!("{}: {}", path.display(), error)))
}

/// JSON-file-backed dataset entry; the document root must be an array.
pub struct JsonEntry<T> {
    key: String,
    path: PathBuf,
    preferred_level: Option<InspectionLevel>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            path: path.into(),
            preferred_level: None,
            _marker: PhantomData,
        })
    }

    pub fn with_preferred_inspection(self: Arc<Self>, level: InspectionLevel) -> Arc<Self> {
        Arc::new(Self {
            key: self.key.clone(),
            path: self.path.clone(),
            preferred_level: Some(level),
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn inspect_with_sample(&self, sample_n: usize) -> Result<Vec<ValidationError>, PipelineError> {
        let mut errors = Vec::new();

        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::NotFound,
                format!("file '{}' does not exist", self.path.display()),
            ));
            return Ok(errors);
        }

        let bytes = match read_bytes(&self.path).await {
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

        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(error) => {
                errors.push(ValidationError::new(
                    &self.key,
                    ValidationErrorKind::InvalidFormat,
                    format!("document is not valid JSON: {}", error),
                ));
                return Ok(errors);
            }
        };

        let Some(elements) = value.as_array() else {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::TypeMismatch,
                "document root is not an array",
            ));
            return Ok(errors);
        };

        if elements.is_empty() {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::EmptyDataset,
                format!("'{}' contains an empty array", self.path.display()),
            ));
            return Ok(errors);
        }

        for (index, element) in elements.iter().take(sample_n).enumerate() {
            if let Err(error) = serde_json::from_value::<T>(element.clone()) {
                errors.push(
                    ValidationError::new(&self.key, ValidationErrorKind::DeserializationError, error.to_string())
                        .with_details(format!("element {}", index)),
                );
            }
        }

        Ok(errors)
    }
}

#[async_trait]
impl<T> Entry for JsonEntry<T>
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
        DATASET_CAPABILITIES
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
        let bytes = read_bytes(&self.path).await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        match value.as_array() {
            Some(elements) => Ok(elements.len() as u64),
            None => Err(PipelineError::type_mismatch(format!(
                "'{}' root is not an array",
                self.path.display()
            ))),
        }
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
        self.inspect_with_sample(usize::MAX).await
    }
}

#[async_trait]
impl<T> DatasetEntry<T> for JsonEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, PipelineError> {
        let bytes = read_bytes(&self.path).await?;
        let items = serde_json::from_slice(&bytes)
            .map_err(|error| PipelineError::serialization_error(format!("{}: {}", self.path.display(), error)))?;
        Ok(items)
    }

    async fn save(&self, items: Vec<T>) -> Result<(), PipelineError> {
        let bytes = serde_json::to_vec_pretty(&items)
            .map_err(|error| PipelineError::serialization_error(format!("{}: {}", self.path.display(), error)))?;
        write_bytes(&self.path, bytes).await
    }
}

/// JSON-file-backed singleton entry holding one document of type `T`.
pub struct JsonValueEntry<T> {
    key: String,
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonValueEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            path: path.into(),
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T> Entry for JsonValueEntry<T>
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
        SINGLETON_CAPABILITIES
    }

    async fn exists(&self) -> Result<bool, PipelineError> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|error| PipelineError::io_error(format!("{}: {}", self.path.display(), error)))
    }

    // count() == 1 iff exists() for singletons
    async fn count(&self) -> Result<u64, PipelineError> {
        Ok(u64::from(self.exists().await?))
    }

    async fn load_erased(&self) -> Result<ErasedValue, PipelineError> {
        Ok(Box::new(self.load_value().await?))
    }

    async fn save_erased(&self, value: ErasedValue) -> Result<(), PipelineError> {
        let value = value.downcast::<T>().map_err(|_| {
            PipelineError::type_mismatch(format!("entry '{}' expects {}", self.key, std::any::type_name::<T>()))
        })?;
        self.save_value(*value).await
    }

    async fn inspect_shallow(&self, _sample_n: usize) -> Result<Vec<ValidationError>, PipelineError> {
        let mut errors = Vec::new();
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::NotFound,
                format!("file '{}' does not exist", self.path.display()),
            ));
            return Ok(errors);
        }
        let bytes = match read_bytes(&self.path).await {
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
        if let Err(error) = serde_json::from_slice::<T>(&bytes) {
            errors.push(ValidationError::new(
                &self.key,
                ValidationErrorKind::DeserializationError,
                format!("document does not deserialize: {}", error),
            ));
        }
        Ok(errors)
    }
}

#[async_trait]
impl<T> ValueEntry<T> for JsonValueEntry<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load_value(&self) -> Result<T, PipelineError> {
        let bytes = read_bytes(&self.path).await?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|error| PipelineError::serialization_error(format!("{}: {}", self.path.display(), error)))?;
        Ok(value)
    }

    async fn save_value(&self, value: T) -> Result<(), PipelineError> {
        let bytes = serde_json::to_vec_pretty(&value)
            .map_err(|error| PipelineError::serialization_error(format!("{}: {}", self.path.display(), error)))?;
        write_bytes(&self.path, bytes).await
    }
}
