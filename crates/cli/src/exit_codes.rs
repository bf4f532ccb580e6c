//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: provisioning pipelines branch on them.
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | Success                                                     |
//! | 1    | General error (unspecified)                                 |
//! | 2    | CLI usage error (bad args)                                  |
//! | 3    | Config file missing, unparseable or invalid                 |
//! | 4    | Input table could not be read or parsed                     |
//! | 5    | Artifact could not be written                               |
//! | 6    | `--strict` run produced notices that drop configured output |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. clap exits with this code on its own.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Config file missing, not valid TOML, or rejected by validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Users or priority table could not be loaded.
pub const EXIT_INPUT: u8 = 4;

/// Output directory or an artifact could not be written.
pub const EXIT_OUTPUT: u8 = 5;

/// `--strict` and the run recorded a degrading notice
/// (absent canonicalization attribute, priority table without a resource column).
pub const EXIT_DEGRADED: u8 = 6;
