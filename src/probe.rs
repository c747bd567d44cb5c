//! TCP connect plus TLS handshake against a single host.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use openssl::ssl::{SslConnector, SslMethod, SslRef, SslVerifyMode};
use openssl::x509::{X509NameRef, X509Ref};
use serde::Serialize;

use crate::error::ConnectionError;
use crate::logging::ScanLog;
use crate::Host;

/// What a completed handshake tells us about the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub ip_address: IpAddr,
    /// Negotiated protocol version, e.g. `TLSv1.3`
    pub protocol: String,
    /// Negotiated cipher suite name, e.g. `TLS_AES_256_GCM_SHA384`
    pub cipher_suite: String,
    /// `X509::to_text` rendering of the peer certificate
    pub certificate_text: String,
    pub summary: CertificateSummary,
}

/// Names and validity read from the structured certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
}

/// Opens a TLS session to a host and reports what was negotiated.
///
/// Implementations must release every socket they open before returning,
/// whether the probe succeeded or not.
pub trait ConnectionProber {
    fn probe(&self, host: &Host) -> Result<Session, ConnectionError>;
}

/// Blocking OpenSSL prober.
///
/// The peer certificate is not verified: the scanner records whatever the
/// host presents. SNI carries the hostname. Connect, read and write are all
/// bounded by `timeout` so a silent host cannot stall a batch.
pub struct TlsProber<'a> {
    timeout: Duration,
    log: &'a ScanLog,
}

impl<'a> TlsProber<'a> {
    pub fn new(timeout: Duration, log: &'a ScanLog) -> TlsProber<'a> {
        TlsProber { timeout, log }
    }

    fn connect(&self, host: &Host) -> Result<TcpStream, ConnectionError> {
        let addresses: Vec<SocketAddr> = (host.hostname.as_str(), host.port)
            .to_socket_addrs()
            .map_err(|source| ConnectionError::DnsResolution {
                hostname: host.hostname.clone(),
                source,
            })?
            .collect();

        if addresses.is_empty() {
            return Err(ConnectionError::DnsResolution {
                hostname: host.hostname.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            });
        }

        let mut last_error = None;
        for address in &addresses {
            match TcpStream::connect_timeout(address, self.timeout) {
                Ok(stream) => {
                    let set_timeouts = stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.timeout)));
                    return match set_timeouts {
                        Ok(()) => Ok(stream),
                        Err(source) => Err(ConnectionError::ConnectionFailed {
                            address: host.address(),
                            source,
                        }),
                    };
                }
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) if e.kind() == io::ErrorKind::TimedOut => Err(ConnectionError::Timeout {
                operation: format!("connect to {}", host.address()),
            }),
            Some(source) => Err(ConnectionError::ConnectionFailed {
                address: host.address(),
                source,
            }),
            None => Err(ConnectionError::ConnectionFailed {
                address: host.address(),
                source: io::Error::new(io::ErrorKind::NotFound, "no address to connect to"),
            }),
        }
    }
}

impl ConnectionProber for TlsProber<'_> {
    fn probe(&self, host: &Host) -> Result<Session, ConnectionError> {
        let tcp_stream = self.connect(host)?;
        let ip_address = tcp_stream
            .peer_addr()
            .map_err(|source| ConnectionError::ConnectionFailed {
                address: host.address(),
                source,
            })?
            .ip();

        let mut builder = SslConnector::builder(SslMethod::tls())?;
        builder.set_verify(SslVerifyMode::NONE);
        let connector = builder.build();
        let ssl = connector
            .configure()?
            .verify_hostname(false)
            .into_ssl(&host.hostname)?;

        // On failure the handshake error owns the TCP stream and drops it.
        let mut stream = ssl.connect(tcp_stream)?;
        let session = read_session(stream.ssl(), ip_address);
        // close_notify is a courtesy; the socket closes when `stream` drops
        // whether or not the peer acknowledges it.
        let _ = stream.shutdown();

        let session = session?;
        self.log.info(format!(
            "SSL/TLS scan results for {}: ip={} protocol={} cipher={}",
            host.address(),
            session.ip_address,
            session.protocol,
            session.cipher_suite
        ));
        self.log.info(format!(
            "  subject={} issuer={} valid_from={} valid_until={}",
            session.summary.subject,
            session.summary.issuer,
            session.summary.not_before,
            session.summary.not_after
        ));
        Ok(session)
    }
}

fn read_session(ssl: &SslRef, ip_address: IpAddr) -> Result<Session, ConnectionError> {
    let cipher_suite = ssl
        .current_cipher()
        .map(|cipher| cipher.name().to_string())
        .ok_or_else(|| ConnectionError::HandshakeFailed {
            details: "no cipher negotiated".to_string(),
        })?;
    let certificate = ssl
        .peer_certificate()
        .ok_or(ConnectionError::MissingCertificate)?;

    let text = certificate
        .to_text()
        .map_err(|e| ConnectionError::Certificate {
            reason: e.to_string(),
        })?;
    let certificate_text = render_text(&text);

    Ok(Session {
        ip_address,
        protocol: ssl.version_str().to_string(),
        cipher_suite,
        certificate_text,
        summary: summarize(&certificate),
    })
}

/// Decodes the text dump, replacing stray non-UTF-8 bytes (Latin-1 in an
/// extension, say) so the remaining fields can still be extracted.
fn render_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn summarize(certificate: &X509Ref) -> CertificateSummary {
    CertificateSummary {
        subject: format_name(certificate.subject_name()),
        issuer: format_name(certificate.issuer_name()),
        not_before: certificate.not_before().to_string(),
        not_after: certificate.not_after().to_string(),
    }
}

/// One-line `/C=US/O=Org/CN=name` rendering of an X.509 name.
fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("UNDEF");
            let value = entry.data().to_string().unwrap_or_default();
            format!("/{}={}", key, value)
        })
        .collect()
}
