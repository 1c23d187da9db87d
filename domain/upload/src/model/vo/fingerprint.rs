use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exception::{UploadException, UploadResult};

const MAX_FINGERPRINT_LEN: usize = 255;

/// Content fingerprint of a whole uploaded file.
///
/// It names both the staging area and the finished artifact, so it is restricted
/// to characters that are safe as a single path component. A `.` is not allowed:
/// `<fingerprint><ext>` must map back to exactly one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileFingerprint(String);

impl FileFingerprint {
    pub fn new(raw: impl Into<String>) -> UploadResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(UploadException::invalid_request("File fingerprint is empty."));
        }
        if raw.len() > MAX_FINGERPRINT_LEN {
            return Err(UploadException::invalid_request(format!(
                "File fingerprint is longer than {MAX_FINGERPRINT_LEN} bytes."
            )));
        }
        if let Some(c) = raw.chars().find(|c| !is_fingerprint_char(*c)) {
            return Err(UploadException::invalid_request(format!(
                "File fingerprint: {raw} contains invalid character: {c:?}."
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the finished artifact: the fingerprint followed by the extension of
    /// `target_file_name`.
    pub fn artifact_file_name(&self, target_file_name: &str) -> UploadResult<String> {
        Ok(format!("{}{}", self.0, extract_extension(target_file_name)?))
    }
}

fn is_fingerprint_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

/// Extension of a file name including the leading dot, empty if there is none.
///
/// `archive.tar.gz` yields `.gz`.
pub fn extract_extension(file_name: &str) -> UploadResult<&str> {
    let Some(dot) = file_name.rfind('.') else {
        return Ok("");
    };
    let ext = &file_name[dot..];
    if !ext[1..].chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(UploadException::invalid_request(format!(
            "File name: {file_name} has an invalid extension: {ext}."
        )));
    }
    Ok(ext)
}

impl fmt::Display for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FileFingerprint {
    type Error = UploadException;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileFingerprint> for String {
    fn from(value: FileFingerprint) -> Self {
        value.0
    }
}
