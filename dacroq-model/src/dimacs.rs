//! Syntax checks for DIMACS CNF problem files.
//!
//! Only the `p cnf <vars> <clauses>` header and the presence of at least one
//! clause line after it are checked. Clause contents are left to the solver.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    static ref HEADER: Regex = Regex::new(r"^\s*p\s+cnf\s+(\d+)\s+(\d+)\s*$").unwrap();
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnfHeader {
    pub variables: u32,
    pub clauses: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DimacsError {
    #[error("Invalid CNF format: missing `p cnf <variables> <clauses>` header")]
    MissingHeader,
    #[error("Invalid CNF format: header counts out of range")]
    CountOutOfRange,
    #[error("Invalid CNF format: no clauses after the header")]
    NoClauses,
}

/// Largest accepted variable or clause count. Counts are stored as signed
/// 32-bit integers.
pub const MAX_COUNT: u32 = i32::MAX as u32;

fn count(digits: &str) -> Result<u32, DimacsError> {
    digits
        .parse()
        .ok()
        .filter(|count| *count <= MAX_COUNT)
        .ok_or(DimacsError::CountOutOfRange)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('c')
}

/// Validates `text` as a DIMACS CNF file and returns its declared counts.
pub fn validate(text: &str) -> Result<CnfHeader, DimacsError> {
    let mut lines = text.lines();
    let header = lines
        .by_ref()
        .find_map(|line| HEADER.captures(line))
        .ok_or(DimacsError::MissingHeader)?;
    let variables = count(&header[1])?;
    let clauses = count(&header[2])?;
    let has_clause = lines
        .map(str::trim)
        .any(|line| !line.is_empty() && !is_comment(line) && !HEADER.is_match(line));
    if !has_clause {
        return Err(DimacsError::NoClauses);
    }
    Ok(CnfHeader { variables, clauses })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_problem() {
        let text = "c example\np cnf 3 2\n1 -3 0\n2 3 -1 0\n";
        assert_eq!(
            validate(text),
            Ok(CnfHeader {
                variables: 3,
                clauses: 2
            })
        );
    }

    #[test]
    fn tolerates_extra_whitespace_and_crlf() {
        let text = "  p  cnf   20   91  \r\n 1 2 0\r\n";
        assert_eq!(validate(text).unwrap().clauses, 91);
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(validate("1 2 0\n-1 0\n"), Err(DimacsError::MissingHeader));
        assert_eq!(validate(""), Err(DimacsError::MissingHeader));
        assert_eq!(
            validate("p cnf x 3\n1 0\n"),
            Err(DimacsError::MissingHeader)
        );
        assert_eq!(validate("p dnf 2 1\n1 0\n"), Err(DimacsError::MissingHeader));
    }

    #[test]
    fn rejects_header_without_clauses() {
        assert_eq!(validate("p cnf 2 1\n"), Err(DimacsError::NoClauses));
        assert_eq!(
            validate("p cnf 2 1\nc only comments\n\n"),
            Err(DimacsError::NoClauses)
        );
        assert_eq!(
            validate("p cnf 2 1\np cnf 2 1\n"),
            Err(DimacsError::NoClauses)
        );
    }

    #[test]
    fn clause_lines_before_header_do_not_count() {
        assert_eq!(
            validate("1 2 0\np cnf 2 1\nc trailing\n"),
            Err(DimacsError::NoClauses)
        );
    }

    #[test]
    fn rejects_oversized_counts() {
        assert_eq!(
            validate("p cnf 99999999999 1\n1 0\n"),
            Err(DimacsError::CountOutOfRange)
        );
        assert_eq!(
            validate("p cnf 3000000000 1\n1 0\n"),
            Err(DimacsError::CountOutOfRange)
        );
        assert_eq!(
            validate("p cnf 2 2147483648\n1 0\n"),
            Err(DimacsError::CountOutOfRange)
        );
        assert_eq!(
            validate("p cnf 2147483647 1\n1 0\n").unwrap().variables,
            MAX_COUNT
        );
    }
}
