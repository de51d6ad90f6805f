/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `artifact-store`
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of storage backend errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Backend configuration is invalid (e.g. an unparsable TTL string);
    /// construction fails and no backend is produced
    Configuration,

    /// Fetching the object from the store failed
    Retrieval,

    /// Streaming the fetched object into the caller's sink failed
    /// (truncated transfer, sink write failure)
    Copy,

    /// Uploading the object to the store failed
    Upload,

    /// Registering the expiration lifecycle rule failed after a successful
    /// upload; the object remains stored but may never expire
    LifecycleRegistration,

    /// The existence probe failed for a reason other than "not found"
    /// (auth, network, server error)
    ExistsCheck,

    /// The caller's cancellation token fired before the operation completed
    OperationCancelled,
}

impl Error {
    /// Creates a new storage [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Configuration => write!(f, "invalid backend configuration"),
            ErrorKind::Retrieval => write!(f, "failed to get the object"),
            ErrorKind::Copy => write!(f, "failed to copy the object"),
            ErrorKind::Upload => write!(f, "failed to put the object"),
            ErrorKind::LifecycleRegistration => {
                write!(f, "failed to register the expiration rule")
            }
            ErrorKind::ExistsCheck => write!(f, "failed to head the object"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

pub(crate) fn invalid_config<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::Configuration, err)
}

pub(crate) fn retrieval_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::Retrieval, err)
}

pub(crate) fn copy_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::Copy, err)
}

pub(crate) fn upload_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::Upload, err)
}

pub(crate) fn lifecycle_registration_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::LifecycleRegistration, err)
}

pub(crate) fn exists_check_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ExistsCheck, err)
}

static CANCELLATION_ERROR: &str = "the operation was cancelled by the caller's token";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}
