//! CLI Exit Code Registry
//!
//! Single source of truth for `spcov` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, nothing to check)        |
//! | 3    | I/O error (cannot read or write a file)              |
//! | 60   | Invalid config or targets file                       |
//! | 61   | Input error (missing column, unparseable number)     |
//! | 62   | Missing targets found (only with `--fail-on-missing`)|

use spcov_coverage::CoverageError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, empty target plan, no input file.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or written.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Coverage (60-69)
// =============================================================================

/// Config TOML or targets text is malformed or fails validation.
pub const EXIT_COVERAGE_INVALID_CONFIG: u8 = 60;

/// Input table is missing a mapped column or holds an unparseable number.
pub const EXIT_COVERAGE_INPUT: u8 = 61;

/// At least one desired target is missing and `--fail-on-missing` is set.
pub const EXIT_COVERAGE_MISSING: u8 = 62;

/// Map an engine error to its exit code.
pub fn coverage_exit_code(err: &CoverageError) -> u8 {
    match err {
        CoverageError::ConfigParse(_)
        | CoverageError::ConfigValidation(_)
        | CoverageError::TargetsParse { .. } => EXIT_COVERAGE_INVALID_CONFIG,
        CoverageError::MissingColumn { .. } | CoverageError::InvalidNumber { .. } => EXIT_COVERAGE_INPUT,
        CoverageError::Io(_) => EXIT_IO,
    }
}
