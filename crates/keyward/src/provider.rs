//! The key provider seam.
//!
//! Keyward never derives or stores encryption keys itself. A successful
//! exchange asks an external provider for the key covering one
//! (subject, controller, data type) scope; everything behind that call is
//! out of this crate's hands.

use async_trait::async_trait;
use thiserror::Error;

use keyward_core::{ControllerId, EncryptionKey, SubjectId};
use keyward_policy::DataType;

/// The provider could not release a key.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct KeyProviderError(pub String);

/// Releases encryption keys for authorized exchanges.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Fetch the key for one (subject, controller, data type) scope.
    async fn request_key(
        &self,
        subject: &SubjectId,
        controller: &ControllerId,
        data_type: DataType,
    ) -> Result<EncryptionKey, KeyProviderError>;
}
