//! Decoding of engine artifacts into numeric results.
//!
//! Both artifact shapes are UTF-8 text. Lines whose first character is
//! [`COMMENT_MARKER`] and blank lines are skipped. A marker after leading
//! whitespace does not make a comment.
//!
//! - Lengths: one integer per line.
//! - Points: one comma-separated row of integers per line, one column per
//!   dimension, starting with the origin.

use std::path::Path;

use lerw_common::{ContentHash, Mode, ParameterSet};
use serde::Serialize;

use crate::error::{CacheError, LineFault, ParseError, StorageError};

/// A line whose first character is this is a comment.
pub const COMMENT_MARKER: char = '#';

/// The shape an artifact is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactShape {
    /// One walk length per line.
    Lengths,
    /// One coordinate row of `dimension` columns per line.
    Points {
        /// Columns per row.
        dimension: usize,
    },
}

impl ArtifactShape {
    /// The shape the engine produces for `params`.
    pub fn for_params(params: &ParameterSet) -> Self {
        match params.mode() {
            Mode::Lengths => ArtifactShape::Lengths,
            Mode::Points => ArtifactShape::Points {
                dimension: params.dimension() as usize,
            },
        }
    }
}

/// A decoded artifact, in the order the artifact lists its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsedResult {
    /// Path length of each trial.
    Lengths(Vec<i64>),
    /// Coordinates of each visited site, the origin first.
    Points(Vec<Vec<i64>>),
}

impl ParsedResult {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ParsedResult::Lengths(v) => v.len(),
            ParsedResult::Points(rows) => rows.len(),
        }
    }

    /// Always `false` for a successfully parsed artifact.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lengths, if this is a lengths result.
    pub fn as_lengths(&self) -> Option<&[i64]> {
        match self {
            ParsedResult::Lengths(v) => Some(v),
            ParsedResult::Points(_) => None,
        }
    }

    /// The coordinate rows, if this is a points result.
    pub fn as_points(&self) -> Option<&[Vec<i64>]> {
        match self {
            ParsedResult::Points(rows) => Some(rows),
            ParsedResult::Lengths(_) => None,
        }
    }
}

/// Reads and decodes artifacts.
pub struct ResultParser;

impl ResultParser {
    /// Reads the artifact at `path` and decodes it as `shape`.
    pub fn parse(path: &Path, shape: ArtifactShape) -> Result<ParsedResult, CacheError> {
        Self::parse_with_checksum(path, shape).map(|(result, _)| result)
    }

    /// Like [`parse`](Self::parse), also returning the artifact's content hash.
    pub fn parse_with_checksum(
        path: &Path,
        shape: ArtifactShape,
    ) -> Result<(ParsedResult, ContentHash), CacheError> {
        let bytes = std::fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let checksum = ContentHash::from_bytes(&bytes);
        let text = std::str::from_utf8(&bytes).map_err(|_| ParseError::Encoding {
            path: path.to_path_buf(),
        })?;
        let result = Self::parse_str(text, shape, path)?;
        Ok((result, checksum))
    }

    /// Decodes artifact text. `path` is only used in error values.
    pub fn parse_str(
        text: &str,
        shape: ArtifactShape,
        path: &Path,
    ) -> Result<ParsedResult, ParseError> {
        let invalid = |line_number: usize, line: &str, fault: LineFault| ParseError::InvalidLine {
            path: path.to_path_buf(),
            line_number,
            line: line.to_string(),
            fault,
        };

        let data_lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with(COMMENT_MARKER));

        let result = match shape {
            ArtifactShape::Lengths => {
                let mut lengths = Vec::new();
                for (line_number, line) in data_lines {
                    let value =
                        parse_int(line.trim()).map_err(|f| invalid(line_number, line, f))?;
                    lengths.push(value);
                }
                ParsedResult::Lengths(lengths)
            }
            ArtifactShape::Points { dimension } => {
                let mut rows: Vec<Vec<i64>> = Vec::new();
                for (line_number, line) in data_lines {
                    let row =
                        parse_row(line, dimension).map_err(|f| invalid(line_number, line, f))?;
                    if rows.is_empty() && row.iter().any(|&c| c != 0) {
                        return Err(invalid(line_number, line, LineFault::NonZeroOrigin));
                    }
                    rows.push(row);
                }
                ParsedResult::Points(rows)
            }
        };

        if result.is_empty() {
            return Err(ParseError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(result)
    }
}

fn parse_int(token: &str) -> Result<i64, LineFault> {
    token.parse().map_err(|_| LineFault::NotAnInteger {
        token: token.to_string(),
    })
}

fn parse_row(line: &str, dimension: usize) -> Result<Vec<i64>, LineFault> {
    let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
    if tokens.len() != dimension {
        return Err(LineFault::ColumnCount {
            expected: dimension,
            found: tokens.len(),
        });
    }
    tokens.into_iter().map(parse_int).collect()
}
