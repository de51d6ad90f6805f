/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleFilter, ObjectCannedAcl, ServerSideEncryption,
};
use aws_smithy_types::DateTime;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{self, Error};

/// Configuration for an [`S3Backend`]
#[derive(Debug, Clone, Default)]
pub struct Config {
    endpoint: Option<String>,
    region: Option<String>,
    bucket: String,
    path_style: bool,
    access_key: Option<String>,
    secret_key: Option<String>,
    acl: String,
    encryption: Option<String>,
    ttl: Option<String>,
    debug: bool,
    client: Option<aws_sdk_s3::Client>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Custom endpoint URL for S3-compatible stores (e.g. MinIO). The URL
    /// scheme decides whether the transport uses TLS. When unset, requests
    /// go to Amazon S3 proper.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// AWS region of the target bucket. Defaults to `us-east-1`, which
    /// S3-compatible stores generally ignore.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = Some(region.into());
        self
    }

    /// Target bucket for every operation.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    /// Use path-style addressing (`endpoint/bucket/key`) instead of
    /// virtual-hosted-style. Required for most S3-compatible stores.
    pub fn path_style(mut self, path_style: bool) -> Self {
        self.config.path_style = path_style;
        self
    }

    /// Static credential pair. When either half is missing the backend
    /// falls back to anonymous access.
    pub fn credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.config.access_key = Some(access_key.into());
        self.config.secret_key = Some(secret_key.into());
        self
    }

    /// Canned ACL applied to every uploaded object. Defaults to `private`.
    pub fn acl(mut self, acl: impl Into<String>) -> Self {
        self.config.acl = acl.into();
        self
    }

    /// Server-side-encryption algorithm (e.g. `AES256`, `aws:kms`). When
    /// unset, no encryption header is sent.
    pub fn encryption(mut self, encryption: impl Into<String>) -> Self {
        self.config.encryption = Some(encryption.into());
        self
    }

    /// Retention window for stored objects, as a duration string such as
    /// `"24h"` or `"1h30m"`. Parsed once at construction into an absolute
    /// expiration instant. When unset, objects never expire.
    pub fn ttl(mut self, ttl: impl Into<String>) -> Self {
        self.config.ttl = Some(ttl.into());
        self
    }

    /// Log the resolved backend settings at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set an explicit S3 client to use, skipping endpoint/credential
    /// resolution entirely.
    pub fn client(mut self, client: aws_sdk_s3::Client) -> Self {
        self.config.client = Some(client);
        self
    }

    /// Consumes the builder and constructs a [`Config`]
    pub fn build(mut self) -> Config {
        if self.config.acl.is_empty() {
            self.config.acl = "private".to_owned();
        }
        self.config
    }
}

/// Storage backend for Amazon S3 and S3-compatible stores.
///
/// Holds no mutable state across calls; a single instance may serve any
/// number of concurrent operations.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    bucket: String,
    acl: ObjectCannedAcl,
    encryption: Option<ServerSideEncryption>,
    expires_at: Option<SystemTime>,
}

impl S3Backend {
    /// Create an S3 backend from `config`.
    ///
    /// Fails with [`ErrorKind::Configuration`] when the TTL string does not
    /// parse as a duration. The expiration instant is computed exactly once
    /// here; every object stored through this backend gets the same
    /// absolute expiration date, not a sliding window from its own store
    /// time.
    ///
    /// [`ErrorKind::Configuration`]: crate::error::ErrorKind::Configuration
    pub async fn new(config: Config) -> Result<S3Backend, Error> {
        let expires_at = match config.ttl.as_deref() {
            Some(ttl) if !ttl.is_empty() => {
                let duration = humantime::parse_duration(ttl).map_err(error::invalid_config)?;
                Some(SystemTime::now() + duration)
            }
            _ => None,
        };

        let client = match config.client {
            Some(client) => client,
            None => resolve_client(&config).await,
        };

        if config.debug {
            tracing::debug!(
                endpoint = config.endpoint.as_deref().unwrap_or_default(),
                region = config.region.as_deref().unwrap_or_default(),
                bucket = %config.bucket,
                path_style = config.path_style,
                acl = %config.acl,
                encryption = config.encryption.as_deref().unwrap_or_default(),
                ttl = config.ttl.as_deref().unwrap_or_default(),
                "s3 backend configured"
            );
        }

        Ok(S3Backend {
            client,
            bucket: config.bucket,
            acl: ObjectCannedAcl::from(config.acl.as_str()),
            encryption: config
                .encryption
                .as_deref()
                .filter(|enc| !enc.is_empty())
                .map(ServerSideEncryption::from),
            expires_at,
        })
    }

    /// The absolute instant at which stored objects expire, or `None` when
    /// no TTL was configured. Fixed at construction.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Stream the object stored under `key` into `sink`.
    ///
    /// The transfer races the caller's token: whichever resolves first is
    /// the single observed outcome, and losing transfer state (including
    /// the response body) is dropped without waiting for the transport to
    /// wind down.
    pub async fn get<W>(
        &self,
        ctx: &CancellationToken,
        key: &str,
        sink: &mut W,
    ) -> Result<(), Error>
    where
        W: AsyncWrite + Send + Unpin + ?Sized,
    {
        let transfer = async {
            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(error::retrieval_failed)?;

            let mut body = resp.body;
            while let Some(chunk) = body.try_next().await.map_err(error::copy_failed)? {
                sink.write_all(&chunk).await.map_err(error::copy_failed)?;
            }
            sink.flush().await.map_err(error::copy_failed)
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(error::operation_cancelled()),
            res = transfer => res,
        }
    }

    /// Upload the content of `source` under `key`.
    ///
    /// When a TTL was configured, every successful upload is followed by a
    /// rewrite of the bucket's lifecycle configuration with a rule scoped
    /// to `key` expiring at [`expires_at`](S3Backend::expires_at).
    /// Concurrent puts therefore overwrite each other's rules,
    /// last-writer-wins; callers that need every rule to stick must
    /// serialize their puts. A registration failure after a successful
    /// upload leaves the object stored without its expiration rule; it is
    /// surfaced as [`ErrorKind::LifecycleRegistration`] and the object is
    /// not rolled back.
    ///
    /// The upload phase honors the caller's token; the registration call,
    /// once started, runs to completion or failure on its own.
    ///
    /// [`ErrorKind::LifecycleRegistration`]: crate::error::ErrorKind::LifecycleRegistration
    pub async fn put(
        &self,
        ctx: &CancellationToken,
        key: &str,
        source: ByteStream,
    ) -> Result<(), Error> {
        let upload = async {
            let mut req = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .acl(self.acl.clone())
                .body(source);

            if let Some(encryption) = &self.encryption {
                req = req.server_side_encryption(encryption.clone());
            }

            req.send().await.map_err(error::upload_failed)?;
            Ok::<(), Error>(())
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(error::operation_cancelled()),
            res = upload => res?,
        }

        match self.expires_at {
            Some(expires_at) => self.register_expiration(key, expires_at).await,
            None => Ok(()),
        }
    }

    /// Check whether an object is present at `key` via a HEAD probe.
    ///
    /// A "not found" probe failure is the `Ok(false)` outcome, not an
    /// error. Some S3-compatible stores (MinIO among them) answer a HEAD
    /// for a missing object with a success status but no ETag; such a
    /// response is also classified as non-existence.
    pub async fn exists(&self, ctx: &CancellationToken, key: &str) -> Result<bool, Error> {
        let probe = self.client.head_object().bucket(&self.bucket).key(key).send();

        let resp = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(error::operation_cancelled()),
            resp = probe => resp,
        };

        match resp {
            Ok(out) => Ok(out.e_tag().is_some_and(|etag| !etag.is_empty())),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(error::exists_check_failed(err)),
        }
    }

    async fn register_expiration(&self, key: &str, expires_at: SystemTime) -> Result<(), Error> {
        let rule = LifecycleRule::builder()
            .filter(LifecycleRuleFilter::builder().prefix(key).build())
            .expiration(
                LifecycleExpiration::builder()
                    .date(DateTime::from(expires_at))
                    .build(),
            )
            .status(ExpirationStatus::Enabled)
            .build()
            .map_err(error::lifecycle_registration_failed)?;

        let lifecycle = BucketLifecycleConfiguration::builder()
            .rules(rule)
            .build()
            .map_err(error::lifecycle_registration_failed)?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(&self.bucket)
            .lifecycle_configuration(lifecycle)
            .send()
            .await
            .map_err(error::lifecycle_registration_failed)?;

        Ok(())
    }
}

#[async_trait]
impl crate::backend::Backend for S3Backend {
    async fn get(
        &self,
        ctx: &CancellationToken,
        key: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), Error> {
        S3Backend::get(self, ctx, key, sink).await
    }

    async fn put(
        &self,
        ctx: &CancellationToken,
        key: &str,
        source: ByteStream,
    ) -> Result<(), Error> {
        S3Backend::put(self, ctx, key, source).await
    }

    async fn exists(&self, ctx: &CancellationToken, key: &str) -> Result<bool, Error> {
        S3Backend::exists(self, ctx, key).await
    }
}

async fn resolve_client(config: &Config) -> aws_sdk_s3::Client {
    let region = config
        .region
        .clone()
        .unwrap_or_else(|| "us-east-1".to_owned());

    let mut loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(Region::new(region));

    if let Some(endpoint) = config.endpoint.as_deref().filter(|ep| !ep.is_empty()) {
        loader = loader.endpoint_url(endpoint);
    }

    loader = match (config.access_key.as_deref(), config.secret_key.as_deref()) {
        (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => loader
            .credentials_provider(Credentials::new(key, secret, None, None, "artifact-store")),
        _ => {
            tracing::warn!(
                "access key and/or secret key not provided, falling back to anonymous credentials"
            );
            loader.no_credentials()
        }
    };

    let shared_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .force_path_style(config.path_style)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

fn is_not_found(err: &SdkError<HeadObjectError>) -> bool {
    if err
        .as_service_error()
        .is_some_and(|service_err| service_err.is_not_found())
    {
        return true;
    }

    matches!(err.code(), Some("NotFound" | "NoSuchKey"))
}
