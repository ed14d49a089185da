use crate::config::PrivacyPolicy;
use crate::constants::{HASH_LENGTH, ID_PREFIX};
use crate::types::{is_blank, Row};
use sha2::{Digest, Sha256};

/// Derive a pseudonymous participant id from a respondent key.
///
/// The key is trimmed and hashed with SHA-256; the first `hash_length` hex
/// characters are uppercased and prefixed. Blank keys map to an empty id.
pub fn derive_participant_id(key: &str, prefix: &str, hash_length: usize) -> String {
    let key = key.trim();
    if key.is_empty() {
        return String::new();
    }

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hex::encode_upper(hasher.finalize());
    let end = hash_length.min(digest.len());
    format!("{}{}", prefix, &digest[..end])
}

/// Participant id under the default prefix and digest length.
pub fn participant_id(key: &str) -> String {
    derive_participant_id(key, ID_PREFIX, HASH_LENGTH)
}

/// Applies a [`PrivacyPolicy`] to rows.
#[derive(Debug, Clone, Default)]
pub struct Anonymizer {
    policy: PrivacyPolicy,
}

impl Anonymizer {
    pub fn new(policy: PrivacyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PrivacyPolicy {
        &self.policy
    }

    pub fn participant_id(&self, key: &str) -> String {
        derive_participant_id(key, &self.policy.id_prefix, self.policy.hash_length)
    }

    /// Return a de-identified copy of `row`; the input is left untouched.
    pub fn anonymize(&self, row: &Row, key_column: &str) -> Row {
        let mut out = row.clone();

        let id = self.participant_id(row.get(key_column).unwrap_or(""));
        out.insert(self.policy.id_column.as_str(), id);

        for column in &self.policy.drop_columns {
            out.remove(column);
        }

        let redacted: Vec<String> = out
            .iter()
            .filter(|(field, value)| self.policy.is_redacted(field) && !is_blank(value))
            .map(|(field, _)| field.to_string())
            .collect();
        for field in redacted {
            out.insert(field, self.policy.redaction_marker.as_str());
        }

        out
    }

    pub fn anonymize_all(&self, rows: &[Row], key_column: &str) -> Vec<Row> {
        rows.iter().map(|r| self.anonymize(r, key_column)).collect()
    }
}
