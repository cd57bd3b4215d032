//! Remote call failures and their classification
//! <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-error-responses.html>

use std::fmt;

/// Remote operation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListVaults,
    InitiateMultipartUpload,
    UploadMultipartPart,
    CompleteMultipartUpload,
    AbortMultipartUpload,
    UploadArchive,
}

impl Operation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ListVaults => "ListVaults",
            Self::InitiateMultipartUpload => "InitiateMultipartUpload",
            Self::UploadMultipartPart => "UploadMultipartPart",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::UploadArchive => "UploadArchive",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether retrying the same call may succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Permanent,
    Transient,
}

// error codes the service documents as retryable
const TRANSIENT_CODES: [&str; 3] = [
    "RequestTimeoutException",
    "ServiceUnavailableException",
    "ThrottlingException",
];

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{operation} failed, HTTP {status}: {code}: {message}")]
    Service {
        operation: Operation,
        status: u16,
        code: String,
        message: String,
    },

    #[error("{operation} request failed: {source}")]
    Http {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: {message}")]
    Invalid {
        operation: Operation,
        message: String,
    },
}

impl RemoteError {
    pub fn service<C: Into<String>, M: Into<String>>(
        operation: Operation,
        status: u16,
        code: C,
        message: M,
    ) -> Self {
        Self::Service {
            operation,
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid<M: Into<String>>(operation: Operation, message: M) -> Self {
        Self::Invalid {
            operation,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Service { operation, .. }
            | Self::Http { operation, .. }
            | Self::Invalid { operation, .. } => *operation,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        let transient = match self {
            Self::Service { status, code, .. } => {
                TRANSIENT_CODES.contains(&code.as_str())
                    || *status == 408
                    || *status == 429
                    || *status >= 500
            }
            Self::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::Invalid { .. } => false,
        };

        if transient {
            ErrorKind::Transient
        } else {
            ErrorKind::Permanent
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
