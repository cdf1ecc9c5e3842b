//! Admin model handlers.
//!
//! `AdminEntity` is the typed description of one catalog entity;
//! `ModelAdmin<E>` erases the types behind `AdminModel` so handlers for
//! different entities can live in one registry and exchange JSON.

use crate::catalog_store::{CatalogError, ListingCatalogStore};
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type AdminResult<T> = Result<T, AdminError>;

/// Typed admin operations for one entity.
pub trait AdminEntity: Send + Sync + 'static {
    type Record: Serialize;
    /// Payload accepted by `create`.
    type Draft: DeserializeOwned;
    /// Payload accepted by `update`, deserialized from the current record
    /// with the patch applied over it.
    type Changes: DeserializeOwned;

    const NAME: &'static str;
    const VERBOSE_NAME_PLURAL: &'static str;

    fn list(store: &dyn ListingCatalogStore) -> Result<Vec<Self::Record>, CatalogError>;
    fn get(store: &dyn ListingCatalogStore, id: i64) -> Result<Self::Record, CatalogError>;
    fn create(
        store: &dyn ListingCatalogStore,
        draft: Self::Draft,
    ) -> Result<Self::Record, CatalogError>;
    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: Self::Changes,
    ) -> Result<Self::Record, CatalogError>;
    fn delete(store: &dyn ListingCatalogStore, id: i64) -> Result<(), CatalogError>;
}

/// Object-safe admin handler, values go in and out as JSON.
pub trait AdminModel: Send + Sync {
    fn name(&self) -> &'static str;
    fn verbose_name_plural(&self) -> &'static str;
    fn list(&self, store: &dyn ListingCatalogStore) -> AdminResult<Vec<Value>>;
    fn get(&self, store: &dyn ListingCatalogStore, id: i64) -> AdminResult<Value>;
    fn add(&self, store: &dyn ListingCatalogStore, payload: Value) -> AdminResult<Value>;
    fn change(&self, store: &dyn ListingCatalogStore, id: i64, patch: Value)
        -> AdminResult<Value>;
    fn delete(&self, store: &dyn ListingCatalogStore, id: i64) -> AdminResult<()>;
}

/// Generic `AdminModel` over any `AdminEntity`.
pub struct ModelAdmin<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E: AdminEntity> ModelAdmin<E> {
    pub fn new() -> Self {
        ModelAdmin {
            _entity: PhantomData,
        }
    }
}

impl<E: AdminEntity> Default for ModelAdmin<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlays the top-level keys of `patch` onto `record`.
fn merge_patch(record: &mut Value, patch: Value) -> AdminResult<()> {
    let Value::Object(patch) = patch else {
        return Err(serde_json::Error::custom("change payload must be a JSON object").into());
    };
    let Value::Object(fields) = record else {
        return Err(serde_json::Error::custom("record is not a JSON object").into());
    };
    for (key, value) in patch {
        fields.insert(key, value);
    }
    Ok(())
}

impl<E: AdminEntity> AdminModel for ModelAdmin<E> {
    fn name(&self) -> &'static str {
        E::NAME
    }

    fn verbose_name_plural(&self) -> &'static str {
        E::VERBOSE_NAME_PLURAL
    }

    fn list(&self, store: &dyn ListingCatalogStore) -> AdminResult<Vec<Value>> {
        E::list(store)?
            .iter()
            .map(|record| serde_json::to_value(record).map_err(AdminError::from))
            .collect()
    }

    fn get(&self, store: &dyn ListingCatalogStore, id: i64) -> AdminResult<Value> {
        Ok(serde_json::to_value(E::get(store, id)?)?)
    }

    fn add(&self, store: &dyn ListingCatalogStore, payload: Value) -> AdminResult<Value> {
        let draft: E::Draft = serde_json::from_value(payload)?;
        Ok(serde_json::to_value(E::create(store, draft)?)?)
    }

    fn change(
        &self,
        store: &dyn ListingCatalogStore,
        id: i64,
        patch: Value,
    ) -> AdminResult<Value> {
        let mut record = serde_json::to_value(E::get(store, id)?)?;
        merge_patch(&mut record, patch)?;
        let changes: E::Changes = serde_json::from_value(record)?;
        Ok(serde_json::to_value(E::update(store, id, changes)?)?)
    }

    fn delete(&self, store: &dyn ListingCatalogStore, id: i64) -> AdminResult<()> {
        Ok(E::delete(store, id)?)
    }
}
