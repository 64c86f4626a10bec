// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Schema Objects and Catalog Maps
//!
//! Nodes are single-input / single-output. Multi-input and multi-output
//! wiring is absorbed by *schema objects*: plain structs whose fields are
//! populated from several entries (input side) or distributed to several
//! entries (output side). A [`CatalogMap`] is the binding from a schema
//! type `S` to those entries, plus optional constant parameters on the
//! input side.
//!
//! ## Field References
//!
//! Bindings address fields structurally, not by string, so renames
//! propagate through the compiler. A [`FieldRef`] packages a field's name
//! with getter and setter function pointers; the [`field_ref!`] macro
//! derives all three from the field path:
//!
//! ```
//! use flowline_domain::field_ref;
//! use flowline_domain::mapping::{FieldSpec, SchemaObject};
//!
//! #[derive(Default)]
//! struct SplitOutput {
//!     train: Vec<u32>,
//!     test: Vec<u32>,
//! }
//!
//! impl SchemaObject for SplitOutput {
//!     fn fields() -> &'static [FieldSpec] {
//!         const FIELDS: &[FieldSpec] = &[FieldSpec::required("train"), FieldSpec::required("test")];
//!         FIELDS
//!     }
//! }
//!
//! let train = field_ref!(SplitOutput, train);
//! assert_eq!(train.name(), "train");
//! ```
//!
//! ## Modes
//!
//! In *mapped* mode, building an input `S` at run time loads every bound
//! entry in binding order, assigns each value into `S::default()`, copies
//! constants, and feeds the node the resulting object as a singleton
//! sequence. On the output side the node returns a singleton `S` and each
//! bound field is saved to its entry. *Pass-through* wiring — a single
//! entry whose item type is the node's item type, flowing directly with no
//! synthesis — is expressed at the wire site with
//! [`NodeInput::dataset`](crate::pipeline::NodeInput::dataset) and friends.
//!
//! All required fields of `S` must be bound before use; optional fields
//! may be omitted. Completeness is checked at wire time, not at run time.

use crate::entry::{DatasetEntry, Entry, ErasedValue, ValueEntry};
use crate::PipelineError;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;

/// Typed descriptor of one field of a schema type `S`.
///
/// Carries the field name for diagnostics and metadata together with
/// getter/setter function pointers used by the binding machinery. Create
/// one with the [`field_ref!`](crate::field_ref) macro.
pub struct FieldRef<S, V> {
    name: &'static str,
    get: fn(&S) -> &V,
    set: fn(&mut S, V),
}

impl<S, V> FieldRef<S, V> {
    pub const fn new(name: &'static str, get: fn(&S) -> &V, set: fn(&mut S, V)) -> Self {
        Self { name, get, set }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<S, V> Clone for FieldRef<S, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, V> Copy for FieldRef<S, V> {}

/// Derives a [`FieldRef`] from a schema type and a field path, so the
/// binding follows the field through renames.
#[macro_export]
macro_rules! field_ref {
    ($schema:ty, $field:ident) => {
        $crate::mapping::FieldRef::<$schema, _>::new(
            stringify!($field),
            |schema: &$schema| &schema.$field,
            |schema: &mut $schema, value| schema.$field = value,
        )
    };
}

/// Declared shape of one schema field: its name and whether a binding is
/// mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    name: &'static str,
    required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str) -> Self {
        Self { name, required: true }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self { name, required: false }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// A plain struct whose fields are populated from multiple entries (input)
/// or distributed to multiple entries (output).
///
/// Implementations list their recognized fields; the default-constructed
/// value is the synthesis starting point on the input side.
pub trait SchemaObject: Default + Send + 'static {
    /// Recognized fields of this schema type, in declaration order.
    fn fields() -> &'static [FieldSpec];
}

/// Where one schema field gets its value from, or sends it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MappingTarget {
    /// Bound to a catalog entry by key.
    Entry { key: String },
    /// Bound to a constant parameter value (inputs only).
    Parameter,
}

/// Structural description of one field binding, for DAG metadata and
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    field: String,
    target: MappingTarget,
}

impl Mapping {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn target(&self) -> &MappingTarget {
        &self.target
    }
}

type LoadFn = Arc<dyn Fn() -> BoxFuture<'static, Result<ErasedValue, PipelineError>> + Send + Sync>;
type AssignFn<S> = Arc<dyn Fn(&mut S, ErasedValue) -> Result<(), PipelineError> + Send + Sync>;
type ExtractFn<S> = Arc<dyn Fn(&S) -> ErasedValue + Send + Sync>;
type StoreFn = Arc<dyn Fn(ErasedValue) -> BoxFuture<'static, Result<(), PipelineError>> + Send + Sync>;

struct FieldBinding<S> {
    field: &'static str,
    target: MappingTarget,
    entry: Option<Arc<dyn Entry>>,
    load: Option<LoadFn>,
    assign: Option<AssignFn<S>>,
    extract: Option<ExtractFn<S>>,
    store: Option<StoreFn>,
}

fn downcast<V: Send + 'static>(value: ErasedValue, field: &str) -> Result<Box<V>, PipelineError> {
    value.downcast::<V>().map_err(|_| {
        PipelineError::type_mismatch(format!(
            "schema field '{}' expects {}",
            field,
            std::any::type_name::<V>()
        ))
    })
}

/// Binding from a schema type `S` to a set of entries and constants.
///
/// Built fluently, validated for completeness at wire time, then driven by
/// the executor: [`build_input`](Self::build_input) on the input side,
/// [`write_output`](Self::write_output) on the output side.
pub struct CatalogMap<S: Send + 'static> {
    bindings: Vec<FieldBinding<S>>,
}

impl<S: SchemaObject> CatalogMap<S> {
    pub fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    /// Binds a dataset-valued field to a dataset entry.
    pub fn map<T, E>(mut self, field: FieldRef<S, Vec<T>>, entry: Arc<E>) -> Self
    where
        T: Clone + Send + Sync + 'static,
        E: DatasetEntry<T> + 'static,
    {
        let erased: Arc<dyn Entry> = entry.clone();
        let load_entry = Arc::clone(&entry);
        let load: LoadFn = Arc::new(move || {
            let entry = Arc::clone(&load_entry);
            Box::pin(async move { Ok(Box::new(entry.load().await?) as ErasedValue) })
        });
        let field_name = field.name;
        let set = field.set;
        let assign: AssignFn<S> = Arc::new(move |schema, value| {
            let items = downcast::<Vec<T>>(value, field_name)?;
            set(schema, *items);
            Ok(())
        });
        let get = field.get;
        let extract: ExtractFn<S> = Arc::new(move |schema| Box::new(get(schema).clone()) as ErasedValue);
        let store: StoreFn = Arc::new(move |value| {
            let entry = Arc::clone(&entry);
            Box::pin(async move {
                let items = downcast::<Vec<T>>(value, field_name)?;
                entry.save(*items).await
            })
        });

        self.bindings.push(FieldBinding {
            field: field.name,
            target: MappingTarget::Entry {
                key: erased.key().to_string(),
            },
            entry: Some(erased),
            load: Some(load),
            assign: Some(assign),
            extract: Some(extract),
            store: Some(store),
        });
        self
    }

    /// Binds a singleton-valued field to a singleton entry.
    pub fn map_value<T, E>(mut self, field: FieldRef<S, T>, entry: Arc<E>) -> Self
    where
        T: Clone + Send + Sync + 'static,
        E: ValueEntry<T> + 'static,
    {
        let erased: Arc<dyn Entry> = entry.clone();
        let load_entry = Arc::clone(&entry);
        let load: LoadFn = Arc::new(move || {
            let entry = Arc::clone(&load_entry);
            Box::pin(async move { Ok(Box::new(entry.load_value().await?) as ErasedValue) })
        });
        let field_name = field.name;
        let set = field.set;
        let assign: AssignFn<S> = Arc::new(move |schema, value| {
            let item = downcast::<T>(value, field_name)?;
            set(schema, *item);
            Ok(())
        });
        let get = field.get;
        let extract: ExtractFn<S> = Arc::new(move |schema| Box::new(get(schema).clone()) as ErasedValue);
        let store: StoreFn = Arc::new(move |value| {
            let entry = Arc::clone(&entry);
            Box::pin(async move {
                let item = downcast::<T>(value, field_name)?;
                entry.save_value(*item).await
            })
        });

        self.bindings.push(FieldBinding {
            field: field.name,
            target: MappingTarget::Entry {
                key: erased.key().to_string(),
            },
            entry: Some(erased),
            load: Some(load),
            assign: Some(assign),
            extract: Some(extract),
            store: Some(store),
        });
        self
    }

    /// Binds a field to a constant parameter value. Input side only.
    pub fn map_parameter<V>(mut self, field: FieldRef<S, V>, value: V) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let field_name = field.name;
        let load: LoadFn = Arc::new(move || {
            let value = value.clone();
            Box::pin(async move { Ok(Box::new(value) as ErasedValue) })
        });
        let set = field.set;
        let assign: AssignFn<S> = Arc::new(move |schema, value| {
            let item = downcast::<V>(value, field_name)?;
            set(schema, *item);
            Ok(())
        });

        self.bindings.push(FieldBinding {
            field: field.name,
            target: MappingTarget::Parameter,
            entry: None,
            load: Some(load),
            assign: Some(assign),
            extract: None,
            store: None,
        });
        self
    }

    /// Checks that every required field of `S` is bound exactly once and
    /// that every binding names a recognized field.
    pub fn validate_complete(&self) -> Result<(), PipelineError> {
        let specs = S::fields();
        for spec in specs {
            let bound = self.bindings.iter().filter(|binding| binding.field == spec.name()).count();
            if spec.is_required() && bound == 0 {
                return Err(PipelineError::missing_mapping(format!(
                    "required field '{}' of {} is not bound",
                    spec.name(),
                    std::any::type_name::<S>()
                )));
            }
            if bound > 1 {
                return Err(PipelineError::missing_mapping(format!(
                    "field '{}' of {} is bound {} times",
                    spec.name(),
                    std::any::type_name::<S>(),
                    bound
                )));
            }
        }
        for binding in &self.bindings {
            if !specs.iter().any(|spec| spec.name() == binding.field) {
                return Err(PipelineError::missing_mapping(format!(
                    "'{}' is not a recognized field of {}",
                    binding.field,
                    std::any::type_name::<S>()
                )));
            }
        }
        Ok(())
    }

    /// Additionally rejects parameter bindings, which have no meaning on
    /// the output side.
    pub fn validate_for_output(&self) -> Result<(), PipelineError> {
        self.validate_complete()?;
        for binding in &self.bindings {
            if binding.target == MappingTarget::Parameter {
                return Err(PipelineError::missing_mapping(format!(
                    "field '{}' of {} is bound to a parameter; constants are input-only",
                    binding.field,
                    std::any::type_name::<S>()
                )));
            }
        }
        Ok(())
    }

    /// The entries this map binds, in binding order.
    pub fn mapped_entries(&self) -> Vec<Arc<dyn Entry>> {
        self.bindings.iter().filter_map(|binding| binding.entry.clone()).collect()
    }

    /// Structural view of the bindings for DAG metadata.
    pub fn mappings(&self) -> Vec<Mapping> {
        self.bindings
            .iter()
            .map(|binding| Mapping {
                field: binding.field.to_string(),
                target: binding.target.clone(),
            })
            .collect()
    }

    /// Synthesizes an input object: loads each bound entry in binding
    /// order, copies constants, assigns everything into `S::default()`.
    pub async fn build_input(&self) -> Result<S, PipelineError> {
        let mut schema = S::default();
        for binding in &self.bindings {
            if let (Some(load), Some(assign)) = (binding.load.as_ref(), binding.assign.as_ref()) {
                let value = load().await?;
                assign(&mut schema, value)?;
            }
        }
        Ok(schema)
    }

    /// Unpacks an output object: each bound field's value is saved to its
    /// entry, in binding order.
    pub async fn write_output(&self, schema: &S) -> Result<(), PipelineError> {
        for binding in &self.bindings {
            if let (Some(extract), Some(store)) = (binding.extract.as_ref(), binding.store.as_ref()) {
                store(extract(schema)).await?;
            }
        }
        Ok(())
    }
}

impl<S: SchemaObject> Default for CatalogMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{MemoryEntry, MemoryValueEntry};

    #[derive(Default)]
    struct JoinInput {
        companies: Vec<String>,
        reviews: Vec<u32>,
        cutoff: u32,
    }

    impl SchemaObject for JoinInput {
        fn fields() -> &'static [FieldSpec] {
            const FIELDS: &[FieldSpec] = &[
                FieldSpec::required("companies"),
                FieldSpec::required("reviews"),
                FieldSpec::optional("cutoff"),
            ];
            FIELDS
        }
    }

    #[derive(Default)]
    struct SplitOutput {
        train: Vec<u32>,
        test: Vec<u32>,
    }

    impl SchemaObject for SplitOutput {
        fn fields() -> &'static [FieldSpec] {
            const FIELDS: &[FieldSpec] = &[FieldSpec::required("train"), FieldSpec::required("test")];
            FIELDS
        }
    }

    #[tokio::test]
    async fn test_build_input_loads_entries_and_copies_constants() {
        let companies = MemoryEntry::with_items("companies", vec!["acme".to_string()]);
        let reviews = MemoryEntry::with_items("reviews", vec![4u32, 5]);

        let map = CatalogMap::<JoinInput>::new()
            .map(field_ref!(JoinInput, companies), companies)
            .map(field_ref!(JoinInput, reviews), reviews)
            .map_parameter(field_ref!(JoinInput, cutoff), 3u32);

        map.validate_complete().unwrap();
        let input = map.build_input().await.unwrap();
        assert_eq!(input.companies, vec!["acme".to_string()]);
        assert_eq!(input.reviews, vec![4, 5]);
        assert_eq!(input.cutoff, 3);
    }

    #[tokio::test]
    async fn test_write_output_distributes_fields() {
        let train = MemoryEntry::<u32>::new("train");
        let test = MemoryEntry::<u32>::new("test");

        let map = CatalogMap::<SplitOutput>::new()
            .map(field_ref!(SplitOutput, train), Arc::clone(&train))
            .map(field_ref!(SplitOutput, test), Arc::clone(&test));

        map.validate_for_output().unwrap();
        let output = SplitOutput {
            train: vec![1, 2, 3],
            test: vec![4, 5],
        };
        map.write_output(&output).await.unwrap();

        assert_eq!(train.load().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(test.load().await.unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_missing_required_binding_is_rejected() {
        let companies = MemoryEntry::<String>::new("companies");
        let map = CatalogMap::<JoinInput>::new().map(field_ref!(JoinInput, companies), companies);

        let err = map.validate_complete().unwrap_err();
        assert!(matches!(err, PipelineError::MissingMapping(_)));
        assert!(err.to_string().contains("reviews"));
    }

    #[test]
    fn test_optional_binding_may_be_omitted() {
        let companies = MemoryEntry::<String>::new("companies");
        let reviews = MemoryEntry::<u32>::new("reviews");
        let map = CatalogMap::<JoinInput>::new()
            .map(field_ref!(JoinInput, companies), companies)
            .map(field_ref!(JoinInput, reviews), reviews);

        assert!(map.validate_complete().is_ok());
    }

    #[test]
    fn test_duplicate_binding_is_rejected() {
        let first = MemoryEntry::<u32>::new("train_a");
        let second = MemoryEntry::<u32>::new("train_b");
        let test = MemoryEntry::<u32>::new("test");
        let map = CatalogMap::<SplitOutput>::new()
            .map(field_ref!(SplitOutput, train), first)
            .map(field_ref!(SplitOutput, train), second)
            .map(field_ref!(SplitOutput, test), test);

        let err = map.validate_complete().unwrap_err();
        assert!(err.to_string().contains("train"));
    }

    #[test]
    fn test_parameter_binding_rejected_on_output_side() {
        let train = MemoryEntry::<u32>::new("train");
        let test = MemoryEntry::<u32>::new("test");
        let map = CatalogMap::<SplitOutput>::new()
            .map(field_ref!(SplitOutput, train), train)
            .map(field_ref!(SplitOutput, test), test)
            .map_parameter(field_ref!(SplitOutput, train), Vec::<u32>::new());

        assert!(map.validate_for_output().is_err());
    }

    #[tokio::test]
    async fn test_singleton_field_binding() {
        #[derive(Default)]
        struct WithThreshold {
            threshold: f64,
        }

        impl SchemaObject for WithThreshold {
            fn fields() -> &'static [FieldSpec] {
                const FIELDS: &[FieldSpec] = &[FieldSpec::required("threshold")];
                FIELDS
            }
        }

        let threshold = MemoryValueEntry::with_value("threshold", 0.75f64);
        let map = CatalogMap::<WithThreshold>::new().map_value(field_ref!(WithThreshold, threshold), threshold);

        let input = map.build_input().await.unwrap();
        assert!((input.threshold - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mapped_entries_preserve_binding_order() {
        let companies = MemoryEntry::<String>::new("companies");
        let reviews = MemoryEntry::<u32>::new("reviews");
        let map = CatalogMap::<JoinInput>::new()
            .map(field_ref!(JoinInput, companies), companies)
            .map(field_ref!(JoinInput, reviews), reviews)
            .map_parameter(field_ref!(JoinInput, cutoff), 1u32);

        let entries = map.mapped_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key(), "companies");
        assert_eq!(entries[1].key(), "reviews");

        let mappings = map.mappings();
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings[2].target(), &MappingTarget::Parameter);
    }
}
