/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Amazon S3 (and S3-compatible) storage backend
pub mod s3;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// A remote store for cached build artifacts.
///
/// Implementations hold no mutable state across calls; any number of
/// operations against distinct or identical keys may run concurrently. The
/// store itself is the sole source of truth for existence and content.
///
/// Every operation takes a [`CancellationToken`]. Backends impose no
/// timeouts and perform no retries of their own; when the token fires first
/// the operation returns [`ErrorKind::OperationCancelled`] without waiting
/// for in-flight transport work to wind down.
///
/// [`ErrorKind::OperationCancelled`]: crate::error::ErrorKind::OperationCancelled
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stream the full content stored under `key` into `sink`.
    async fn get(
        &self,
        ctx: &CancellationToken,
        key: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), Error>;

    /// Upload the full content of `source` under `key`, registering the
    /// configured expiration policy if one exists.
    async fn put(&self, ctx: &CancellationToken, key: &str, source: ByteStream)
        -> Result<(), Error>;

    /// Check whether an object is present at `key` without transferring its
    /// content. A missing object is `Ok(false)`, not an error.
    async fn exists(&self, ctx: &CancellationToken, key: &str) -> Result<bool, Error>;
}
