//! Exit codes for the `implindex` binary.
//! These codes are part of the public contract; scripts branch on them.

pub const SUCCESS: i32 = 0;
pub const CHECK_FAILED: i32 = 1; // Round trip differs or a file was skipped
pub const INPUT_ERROR: i32 = 2; // Unreadable input, bad arguments or config
pub const PARSE_ERROR: i32 = 3; // Input is not an implementor index file

/// Exit code for a library error.
pub fn for_error(err: &implindex_core::IndexError) -> i32 {
    match err.exit_code() {
        PARSE_ERROR => PARSE_ERROR,
        _ => INPUT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use implindex_core::IndexError;

    #[test]
    fn library_codes_match_cli_codes() {
        let parse = IndexError::Parse {
            line: 1,
            column: 1,
            message: "x".into(),
        };
        let sink = IndexError::Sink {
            trait_path: Some("core::ops::bit::Shl".into()),
            source: "consumer gone".into(),
        };
        let io = IndexError::Io {
            path: "a".into(),
            message: "missing".into(),
        };

        for err in [&parse, &sink, &io] {
            assert_eq!(for_error(err), err.exit_code(), "{err}");
        }
        assert_eq!(for_error(&sink), INPUT_ERROR);
        assert_eq!(for_error(&parse), PARSE_ERROR);
    }
}
