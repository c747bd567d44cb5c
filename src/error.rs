//! Error types for certificate scanning.
//!
//! Host-scoped failures ([`ConnectionError`], [`ExtractionError`]) are turned
//! into [`ScanFailure`](crate::ScanFailure) values by the executor and never
//! stop a batch. [`BatchIOError`] is not tied to a host and aborts the run.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error raised while connecting to a host or completing the TLS handshake.
#[derive(Debug)]
pub enum ConnectionError {
    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection failed to every resolved address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// Network operation timeout
    Timeout {
        /// Description of which operation timed out
        operation: String,
    },

    /// TLS handshake failed
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// The peer completed the handshake without presenting a certificate
    MissingCertificate,

    /// The peer certificate could not be rendered
    Certificate {
        /// Description of what went wrong
        reason: String,
    },

    /// OpenSSL error occurred while preparing the session
    OpenSSL {
        /// The underlying OpenSSL error
        details: String,
    },
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { hostname, source } => {
                write!(f, "Failed to resolve hostname {}: {}", hostname, source)
            }
            Self::ConnectionFailed { address, source } => {
                write!(f, "Connection failed to {}: {}", address, source)
            }
            Self::Timeout { operation } => write!(f, "Operation timed out: {}", operation),
            Self::HandshakeFailed { details } => write!(f, "TLS handshake failed: {}", details),
            Self::MissingCertificate => write!(f, "Peer did not present a certificate"),
            Self::Certificate { reason } => write!(f, "Certificate error: {}", reason),
            Self::OpenSSL { details } => write!(f, "OpenSSL error: {}", details),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<openssl::error::ErrorStack> for ConnectionError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSL {
            details: e.to_string(),
        }
    }
}

impl<S> From<openssl::ssl::HandshakeError<S>> for ConnectionError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        use openssl::ssl::HandshakeError;

        match e {
            HandshakeError::SetupFailure(stack) => stack.into(),
            // A blocking socket with a read timeout surfaces an expired
            // deadline as WouldBlock.
            HandshakeError::WouldBlock(_) => Self::Timeout {
                operation: "TLS handshake".to_string(),
            },
            HandshakeError::Failure(mid) => {
                let err = mid.error();
                let timed_out = err.io_error().map_or(false, |io| {
                    matches!(
                        io.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    )
                });
                if timed_out {
                    Self::Timeout {
                        operation: "TLS handshake".to_string(),
                    }
                } else {
                    Self::HandshakeFailed {
                        details: err.to_string(),
                    }
                }
            }
        }
    }
}

/// Error raised when the certificate text cannot be used for field extraction.
#[derive(Debug, PartialEq, Eq)]
pub enum ExtractionError {
    /// The textual dump is empty or whitespace only
    UnreadableText,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableText => write!(f, "Certificate text is empty or unreadable"),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Any failure that can end a single host scan.
#[derive(Debug)]
pub enum ScanError {
    Connection(ConnectionError),
    Extraction(ExtractionError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "{}", e),
            Self::Extraction(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::Extraction(e) => Some(e),
        }
    }
}

impl From<ConnectionError> for ScanError {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

impl From<ExtractionError> for ScanError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

/// Failure to load or persist batch inputs and outputs.
#[derive(Debug)]
pub enum BatchIOError {
    /// The host list could not be read, parsed or rewritten
    HostList {
        /// Location of the host list
        path: PathBuf,
        /// Why it failed
        reason: String,
    },

    /// A report artifact could not be written
    Report {
        /// The artifact being written
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The log file could not be opened
    Log {
        /// Location of the log file
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },
}

impl fmt::Display for BatchIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostList { path, reason } => {
                write!(f, "Host list error ({}): {}", path.display(), reason)
            }
            Self::Report { path, source } => {
                write!(f, "Failed to write report {}: {}", path.display(), source)
            }
            Self::Log { path, source } => {
                write!(f, "Failed to open log file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for BatchIOError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Report { source, .. } => Some(source),
            Self::Log { source, .. } => Some(source),
            Self::HostList { .. } => None,
        }
    }
}
