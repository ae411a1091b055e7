//! Conversions from external infrastructure errors into domain errors.

use kompete_domain::KompeteError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KompeteError);

impl From<InfraError> for KompeteError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KompeteError> for InfraError {
    fn from(value: KompeteError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoKompeteError {
    fn into_kompete(self) -> KompeteError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → KompeteError */
/* -------------------------------------------------------------------------- */

impl IntoKompeteError for HttpError {
    fn into_kompete(self) -> KompeteError {
        if self.is_timeout() {
            return KompeteError::Timeout("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return KompeteError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return KompeteError::Decode(self.to_string());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 => KompeteError::Auth(message),
                404 => KompeteError::NotFound(message),
                400..=499 => KompeteError::Backend(message),
                _ => KompeteError::Network(message),
            };
        }

        if self.is_builder() {
            return KompeteError::Config(self.to_string());
        }

        KompeteError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_kompete())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
