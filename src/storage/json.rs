use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    acu,
    domain::{Config, ParsedDocument},
    storage::PersistenceSink,
};

/// Fingerprint of a document: the SHA-256 of its canonical ACU text.
///
/// Two documents have the same fingerprint exactly when they serialize to the
/// same text with the default configuration.
#[must_use]
pub fn fingerprint(document: &ParsedDocument) -> String {
    let text = acu::to_string(document, &Config::default());
    let hash = Sha256::digest(text.as_bytes());
    format!("{hash:x}")
}

/// A document as persisted by a [`JsonStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Envelope", into = "Envelope")]
pub struct StoredDocument {
    /// Identifier assigned when the document was stored.
    pub id: Uuid,
    /// When the document was stored.
    pub created: DateTime<Utc>,
    /// [`fingerprint`] of the document at the time it was stored.
    pub fingerprint: String,
    /// The parsed document, verbatim.
    pub document: ParsedDocument,
}

/// Errors raised by a [`JsonStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document is stored under the id.
    #[error("no stored document with id {0}")]
    NotFound(Uuid),

    /// The store directory or a document file could not be accessed.
    #[error("failed to access document store: {0}")]
    Io(#[from] io::Error),

    /// A document file is not a valid envelope.
    #[error("failed to decode stored document: {0}")]
    Json(#[from] serde_json::Error),

    /// A document no longer matches the fingerprint it was stored with.
    #[error("stored document {id} has been altered: expected fingerprint {expected}, found {actual}")]
    FingerprintMismatch {
        /// Id of the document.
        id: Uuid,
        /// Fingerprint recorded when it was stored.
        expected: String,
        /// Fingerprint of the document as loaded.
        actual: String,
    },
}

/// A directory of JSON documents, one file per stored document.
///
/// Documents are stored verbatim, so a stored budget can be re-exported later
/// without reparsing its original text.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// A store rooted at the given directory. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the documents.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Loads a stored document and checks its fingerprint.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if nothing is stored under `id`.
    /// - [`StoreError::Io`] or [`StoreError::Json`] if the file cannot be read
    ///   or decoded.
    /// - [`StoreError::FingerprintMismatch`] if the document was changed after
    ///   it was stored.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn load(&self, id: Uuid) -> Result<StoredDocument, StoreError> {
        let file = File::open(self.path(id)).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id),
            _ => StoreError::Io(io_error),
        })?;
        let stored: StoredDocument = serde_json::from_reader(BufReader::new(file))?;

        let actual = fingerprint(&stored.document);
        if actual != stored.fingerprint {
            return Err(StoreError::FingerprintMismatch {
                id,
                expected: stored.fingerprint,
                actual,
            });
        }
        Ok(stored)
    }
}

impl PersistenceSink for JsonStore {
    type Receipt = Uuid;
    type Error = StoreError;

    #[instrument(level = "debug", skip_all, fields(root = %self.root.display()))]
    fn persist(&self, document: &ParsedDocument) -> Result<Uuid, StoreError> {
        let stored = StoredDocument {
            id: Uuid::new_v4(),
            created: Utc::now(),
            fingerprint: fingerprint(document),
            document: document.clone(),
        };

        // only complete documents are renamed into place
        std::fs::create_dir_all(&self.root)?;
        let mut file = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &stored)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        file.persist(self.path(stored.id)).map_err(|error| error.error)?;

        tracing::debug!(id = %stored.id, "stored document");
        Ok(stored.id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Envelope {
    #[serde(rename = "1")]
    V1 {
        id: Uuid,
        created: DateTime<Utc>,
        fingerprint: String,
        document: ParsedDocument,
    },
}

impl From<Envelope> for StoredDocument {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::V1 {
                id,
                created,
                fingerprint,
                document,
            } => Self {
                id,
                created,
                fingerprint,
                document,
            },
        }
    }
}

impl From<StoredDocument> for Envelope {
    fn from(stored: StoredDocument) -> Self {
        let StoredDocument {
            id,
            created,
            fingerprint,
            document,
        } = stored;
        Self::V1 {
            id,
            created,
            fingerprint,
            document,
        }
    }
}
