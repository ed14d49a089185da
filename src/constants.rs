/// Default input/output names and privacy constants shared across the pipeline.
/// These are the values used when no config file overrides them.

// Input files (relative to the data directory)
pub const PRIMARY_FILE: &str = "sp25w5survey-and-mathscores.csv";
pub const ANXIETY_FILE: &str = "sp25mathanxietyw3survey.csv";
pub const LEGACY_FILE: &str = "sp25.csv";

// Output file (relative to the data directory)
pub const OUTPUT_FILE: &str = "combined_anonymized.csv";

// Join key shared by every survey wave
pub const KEY_COLUMN: &str = "rid";

// Reserved output column holding the pseudonymous id
pub const PARTICIPANT_ID_COLUMN: &str = "participant_id";

pub const ID_PREFIX: &str = "P";
pub const HASH_LENGTH: usize = 8;
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Direct identifiers removed from every row: IP address and exact timestamp.
pub const DROP_COLUMNS: &[&str] = &["w1ip", "w1timestamp"];

/// Free-text answers that can carry identifying content.
pub const REDACT_COLUMNS: &[&str] = &["newsthoughts", "newsevqual", "w1dogcolor"];
