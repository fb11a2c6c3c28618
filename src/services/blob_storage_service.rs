//! Colaborador de blob storage
//!
//! Contrato de subida/firma/borrado por key, usado para imágenes de
//! vehículos y videos de verificación. Fuera del core no se especifica el
//! proveedor; la implementación en memoria sirve para tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Contrato del colaborador de blob storage
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Sube los bytes y devuelve la key asignada
    async fn upload(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
        folder: &str,
    ) -> AppResult<String>;

    /// URL firmada de lectura con vencimiento
    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<String>;

    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Blob storage en memoria para tests
#[derive(Default)]
pub struct InMemoryBlobStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload(
        &self,
        bytes: &[u8],
        name: &str,
        _mime_type: &str,
        folder: &str,
    ) -> AppResult<String> {
        let key = format!("{}/{}-{}", folder, Uuid::new_v4(), name);
        let mut objects = self.objects.lock().await;
        objects.insert(key.clone(), bytes.to_vec());
        Ok(key)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let objects = self.objects.lock().await;
        if !objects.contains_key(key) {
            return Err(AppError::NotFound(format!("blob '{}' not found", key)));
        }
        let expires = (Utc::now() + ttl).timestamp();
        let signature = hex::encode(Sha256::digest(format!("{}:{}", key, expires).as_bytes()));
        Ok(format!(
            "https://storage.local/{}?expires={}&sig={}",
            key, expires, signature
        ))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut objects = self.objects.lock().await;
        if objects.remove(key).is_none() {
            return Err(AppError::NotFound(format!("blob '{}' not found", key)));
        }
        Ok(())
    }
}
