//! Contract with the external generative image service.
//!
//! The service itself lives outside this crate. The engine only builds
//! requests, runs one of them at a time on a worker thread, and turns the
//! returned bytes into a snapshot.

mod worker;

pub(crate) use worker::spawn_worker_action;

use thiserror::Error;

use crate::geometry::NaturalPoint;
use crate::snapshot::{ImageSnapshot, SnapshotError};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Service(#[from] anyhow::Error),
    #[error("generation worker stopped before returning a result")]
    WorkerDisconnected,
    #[error("generated image could not be decoded: {0}")]
    InvalidResult(#[from] SnapshotError),
}

impl GenerationError {
    /// Human-readable message including any context chain from the service.
    pub fn user_message(&self) -> String {
        match self {
            Self::Service(err) => format!("{err:#}"),
            other => other.to_string(),
        }
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Auxiliary reference image attached to a localized edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropAsset {
    pub image: ImageSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Retouch,
    Filter,
    Adjustment,
}

impl RequestKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Retouch => "retouch",
            Self::Filter => "filter",
            Self::Adjustment => "adjustment",
        }
    }
}

#[derive(Debug, Clone)]
pub enum GenerationRequest {
    /// Localized edit at a natural-pixel hotspot.
    Retouch {
        image: ImageSnapshot,
        directive: String,
        hotspot: NaturalPoint,
        references: Vec<PropAsset>,
    },
    /// Named stylistic filter applied to the whole image.
    Filter {
        image: ImageSnapshot,
        directive: String,
    },
    /// Free-text global tonal adjustment.
    Adjustment {
        image: ImageSnapshot,
        directive: String,
    },
}

impl GenerationRequest {
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Retouch { .. } => RequestKind::Retouch,
            Self::Filter { .. } => RequestKind::Filter,
            Self::Adjustment { .. } => RequestKind::Adjustment,
        }
    }

    pub fn image(&self) -> &ImageSnapshot {
        match self {
            Self::Retouch { image, .. }
            | Self::Filter { image, .. }
            | Self::Adjustment { image, .. } => image,
        }
    }

    pub fn directive(&self) -> &str {
        match self {
            Self::Retouch { directive, .. }
            | Self::Filter { directive, .. }
            | Self::Adjustment { directive, .. } => directive,
        }
    }
}

/// A blocking call into the generative service, run off the UI thread.
///
/// On success it returns the encoded bytes of the new image.
pub trait GenerativeService: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Vec<u8>>;
}

pub(crate) fn run_request(
    service: &dyn GenerativeService,
    request: &GenerationRequest,
) -> GenerationResult<ImageSnapshot> {
    tracing::info!(kind = request.kind().label(), "generation request started");
    let bytes = service.generate(request)?;
    Ok(ImageSnapshot::from_encoded(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::solid_snapshot;

    struct EchoService;

    impl GenerativeService for EchoService {
        fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Vec<u8>> {
            Ok(request.image().encoded().to_vec())
        }
    }

    struct FailingService;

    impl GenerativeService for FailingService {
        fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<Vec<u8>> {
            Err(anyhow::anyhow!("quota exceeded").context("service rejected request"))
        }
    }

    struct GarbageService;

    impl GenerativeService for GarbageService {
        fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<Vec<u8>> {
            Ok(b"not an image".to_vec())
        }
    }

    fn filter_request() -> GenerationRequest {
        GenerationRequest::Filter {
            image: solid_snapshot(2, 2, [9, 8, 7, 255]),
            directive: "film noir".to_string(),
        }
    }

    #[test]
    fn request_accessors_expose_shared_fields() {
        let request = GenerationRequest::Retouch {
            image: solid_snapshot(1, 1, [0, 0, 0, 255]),
            directive: "remove the cup".to_string(),
            hotspot: NaturalPoint::new(3, 4),
            references: Vec::new(),
        };
        assert_eq!(request.kind(), RequestKind::Retouch);
        assert_eq!(request.directive(), "remove the cup");
        assert_eq!(request.image().size().width, 1);
    }

    #[test]
    fn successful_generation_decodes_into_snapshot() {
        let request = filter_request();
        let snapshot = run_request(&EchoService, &request).expect("echo should succeed");
        assert_eq!(
            snapshot.decode().expect("decode"),
            request.image().decode().expect("decode")
        );
        assert_ne!(snapshot.id(), request.image().id());
    }

    #[test]
    fn service_failure_keeps_context_in_user_message() {
        let err = run_request(&FailingService, &filter_request()).expect_err("must fail");
        assert_eq!(err.user_message(), "service rejected request: quota exceeded");
    }

    #[test]
    fn undecodable_result_is_reported() {
        let err = run_request(&GarbageService, &filter_request()).expect_err("must fail");
        assert!(matches!(err, GenerationError::InvalidResult(_)));
    }
}
