//! Operations shared by the backends built on `object_store`.

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStore, ObjectStoreExt, PutOptions,
    PutPayload,
};
use staticpush_core::{ObjectProperties, RemoteObject};
use std::sync::Arc;
use std::time::Instant;

use crate::traits::{validate_key, StorageError, StorageResult, StoredObject};

pub(crate) async fn list(
    store: &Arc<dyn ObjectStore>,
    container: &str,
) -> StorageResult<Vec<RemoteObject>> {
    let start = Instant::now();

    let objects: Vec<RemoteObject> = store
        .list(None)
        .map_ok(|meta| RemoteObject::from(meta.location.to_string()))
        .try_collect()
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                container = %container,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object listing failed"
            );
            StorageError::ListFailed(e.to_string())
        })?;

    tracing::debug!(
        container = %container,
        count = objects.len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Object listing successful"
    );

    Ok(objects)
}

pub(crate) async fn delete(
    store: &Arc<dyn ObjectStore>,
    container: &str,
    key: &str,
) -> StorageResult<()> {
    validate_key(key)?;
    let start = Instant::now();
    let location = Path::from(key.to_string());

    match ObjectStoreExt::delete(store, &location).await {
        Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
        Err(e) => {
            tracing::error!(
                error = %e,
                container = %container,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object delete failed"
            );
            return Err(StorageError::DeleteFailed(e.to_string()));
        }
    }

    tracing::debug!(
        container = %container,
        key = %key,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Object delete successful"
    );

    Ok(())
}

pub(crate) async fn put(
    store: &Arc<dyn ObjectStore>,
    container: &str,
    key: &str,
    data: Bytes,
    properties: &ObjectProperties,
) -> StorageResult<()> {
    validate_key(key)?;
    let start = Instant::now();
    let size = data.len() as u64;
    let location = Path::from(key.to_string());
    let options = PutOptions {
        attributes: to_attributes(properties),
        ..Default::default()
    };

    store
        .put_opts(&location, PutPayload::from(data), options)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                container = %container,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

    tracing::debug!(
        container = %container,
        key = %key,
        size_bytes = size,
        content_type = %properties.content_type,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Object upload successful"
    );

    Ok(())
}

pub(crate) async fn get(store: &Arc<dyn ObjectStore>, key: &str) -> StorageResult<StoredObject> {
    validate_key(key)?;
    let location = Path::from(key.to_string());

    let result = ObjectStoreExt::get(store, &location)
        .await
        .map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

    let properties = from_attributes(&result.attributes);
    let body = result
        .bytes()
        .await
        .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

    Ok(StoredObject { body, properties })
}

fn to_attributes(properties: &ObjectProperties) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        properties.content_type.clone().into(),
    );
    attributes.insert(
        Attribute::CacheControl,
        properties.cache_control.clone().into(),
    );
    if let Some(ref encoding) = properties.content_encoding {
        attributes.insert(Attribute::ContentEncoding, encoding.clone().into());
    }
    attributes
}

fn from_attributes(attributes: &Attributes) -> ObjectProperties {
    let read = |attribute: &Attribute| {
        attributes.get(attribute).map(|value| {
            let value: &str = value.as_ref();
            value.to_string()
        })
    };

    ObjectProperties {
        content_type: read(&Attribute::ContentType).unwrap_or_default(),
        cache_control: read(&Attribute::CacheControl).unwrap_or_default(),
        content_encoding: read(&Attribute::ContentEncoding),
    }
}
