/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Object storage backends for a build-artifact cache.
//!
//! A [`Backend`](crate::backend::Backend) stores and retrieves opaque byte
//! streams under string keys in a remote object store and supports
//! time-limited retention of stored objects. Callers supply a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) with every
//! operation; no backend imposes timeouts or retries of its own, both belong
//! to the calling cache orchestrator.
//!
//! The only implementation today is [`backend::s3::S3Backend`], which works
//! against Amazon S3 and S3-compatible stores such as MinIO.
//!
//! # Examples
//!
//! ```no_run
//! use artifact_store::backend::s3::{Config, S3Backend};
//! use aws_sdk_s3::primitives::ByteStream;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn store_artifact(data: &'static [u8]) -> Result<(), artifact_store::error::Error> {
//!     let config = Config::builder()
//!         .endpoint("https://s3.eu-west-1.amazonaws.com")
//!         .region("eu-west-1")
//!         .bucket("build-cache")
//!         .ttl("24h")
//!         .build();
//!     let backend = S3Backend::new(config).await?;
//!
//!     let ctx = CancellationToken::new();
//!     backend.put(&ctx, "artifact/1.tar", ByteStream::from_static(data)).await
//! }
//! ```

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

/// Error types emitted by `artifact-store`
pub mod error;

/// Storage backend trait and implementations
pub mod backend;

pub use backend::Backend;
