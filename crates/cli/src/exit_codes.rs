//! CLI Exit Code Registry
//!
//! Single source of truth for `beantrack` exit codes. Scripts that schedule
//! exports rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                  |
//! |---------|-----------|----------------------------------------------|
//! | 0       | Universal | Success (including an empty export)          |
//! | 1       | Universal | General error (unspecified)                  |
//! | 2       | Universal | CLI usage error (bad flag value, no source)  |
//! | 3-9     | settings  | Settings file problems                       |
//! | 10-19   | data      | Entity data service failures                 |
//! | 20-29   | export    | Writing export files                         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed. An export with no rows is still a success.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown entity, unparsable filter, no data source.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Settings (3-9)
// =============================================================================

/// Settings file exists but cannot be read, parsed or validated.
pub const EXIT_SETTINGS: u8 = 3;

// =============================================================================
// Data (10-19)
// =============================================================================

/// The entity data service failed (network, HTTP status, missing data file, bad payload).
pub const EXIT_DATA_FETCH: u8 = 10;

// =============================================================================
// Export (20-29)
// =============================================================================

/// Writing the CSV or document file failed.
pub const EXIT_EXPORT: u8 = 20;

/// Writing to stdout failed (table/JSON output).
pub const EXIT_OUTPUT: u8 = 21;

/// Human-readable name for an exit code (for `--help` text and logs).
pub fn describe(code: u8) -> &'static str {
    match code {
        EXIT_SUCCESS => "success",
        EXIT_ERROR => "error",
        EXIT_USAGE => "usage error",
        EXIT_SETTINGS => "settings error",
        EXIT_DATA_FETCH => "data fetch failed",
        EXIT_EXPORT => "export failed",
        EXIT_OUTPUT => "output failed",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_SETTINGS, EXIT_DATA_FETCH, EXIT_EXPORT, EXIT_OUTPUT];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn codes_fall_in_their_ranges() {
        assert!((3..=9).contains(&EXIT_SETTINGS));
        assert!((10..=19).contains(&EXIT_DATA_FETCH));
        assert!((20..=29).contains(&EXIT_EXPORT));
        assert!((20..=29).contains(&EXIT_OUTPUT));
        assert_eq!(describe(EXIT_DATA_FETCH), "data fetch failed");
    }
}
