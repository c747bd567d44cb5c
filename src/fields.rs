//! Best-effort field extraction from a certificate's text dump.
//!
//! The dump is the multi-line rendering produced by `X509::to_text`. Fields are
//! found by their literal label (`Serial Number:`, `Issuer:` ...) rather than by
//! walking the ASN.1 structure, so certificates with unusual or missing
//! extensions are tolerated: a label that never appears simply yields no entry.

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::error::ExtractionError;

/// Labels looked up in the certificate text, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum CertField {
    #[strum(serialize = "Serial Number")]
    SerialNumber,
    #[strum(serialize = "Signature Algorithm")]
    SignatureAlgorithm,
    #[strum(serialize = "Issuer")]
    Issuer,
    #[strum(serialize = "Not Before")]
    NotBefore,
    #[strum(serialize = "Not After")]
    NotAfter,
    #[strum(serialize = "Subject")]
    Subject,
    #[strum(serialize = "Subject Public Key Info")]
    SubjectPublicKeyInfo,
    #[strum(serialize = "Public Key Algorithm")]
    PublicKeyAlgorithm,
    #[strum(serialize = "RSA Public-Key")]
    RsaPublicKey,
    #[strum(serialize = "Modulus")]
    Modulus,
    #[strum(serialize = "Exponent")]
    Exponent,
    #[strum(serialize = "Authority Information Access")]
    AuthorityInformationAccess,
    #[strum(serialize = "CA Issuers - URI")]
    CaIssuersUri,
    #[strum(serialize = "X509v3 Subject Alternative Name")]
    SubjectAlternativeName,
    #[strum(serialize = "Signed Certificate Timestamp")]
    SignedCertificateTimestamp,
    #[strum(serialize = "Signature")]
    Signature,
}

impl CertField {
    /// The complete schema, in report order.
    pub fn schema() -> Vec<CertField> {
        CertField::iter().collect()
    }

    /// Label as it appears in the certificate text.
    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Report key: the label lower-cased with spaces replaced by underscores.
    pub fn key(self) -> String {
        field_key(self.label())
    }
}

/// Derives a report key from a field label.
pub fn field_key(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

/// Fields found in one certificate. Absent fields have no entry at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateFieldSet {
    entries: Vec<(CertField, String)>,
}

impl CertificateFieldSet {
    pub fn get(&self, field: CertField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, field: CertField) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CertificateFieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(&field.key(), value)?;
        }
        map.end()
    }
}

/// Compiled label patterns for a fixed list of fields.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    patterns: Vec<(CertField, Regex)>,
}

impl FieldExtractor {
    /// Builds an extractor for `fields`, keeping their order for output.
    pub fn new(fields: &[CertField]) -> Result<Self, regex::Error> {
        let patterns = fields
            .iter()
            .map(|field| {
                let pattern = format!(r"{}:\s*(.+)", regex::escape(field.label()));
                Regex::new(&pattern).map(|re| (*field, re))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldExtractor { patterns })
    }

    /// Extractor over the complete schema.
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(&CertField::schema())
    }

    /// Captures the first occurrence of each label in `text`.
    ///
    /// The value is whatever follows `<label>:` after skipping whitespace, up
    /// to the end of that line. When the label ends its line (as `Modulus:`
    /// does) the skip crosses the line break and the next line is captured.
    pub fn extract(&self, text: &str) -> Result<CertificateFieldSet, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::UnreadableText);
        }

        let entries = self
            .patterns
            .iter()
            .filter_map(|(field, re)| {
                re.captures(text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| (*field, m.as_str().trim_end().to_string()))
            })
            .collect();

        Ok(CertificateFieldSet { entries })
    }
}
