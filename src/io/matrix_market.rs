//! Matrix Market coordinate reader

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::matrix::SparsityPattern;
use crate::utils::exclusive_scan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

/// Reads the sparsity pattern of a Matrix Market coordinate file
pub fn read_matrix_market<P: AsRef<Path>>(path: P) -> Result<SparsityPattern> {
    let file = File::open(path.as_ref())?;
    let pattern = parse_matrix_market(BufReader::new(file))?;
    info!(
        path = %path.as_ref().display(),
        rows = pattern.n_rows(),
        cols = pattern.n_cols(),
        nnz = pattern.nnz(),
        "loaded sparsity pattern"
    );
    Ok(pattern)
}

/// Parses Matrix Market coordinate data into a sparsity pattern
///
/// Supports `real`, `integer` and `pattern` fields with `general`,
/// `symmetric` or `skew-symmetric` symmetry. Symmetric files are expanded
/// with the mirrored off-diagonal entries. Entries are ordered by row, then
/// column; duplicates are kept.
pub fn parse_matrix_market<R: BufRead>(reader: R) -> Result<SparsityPattern> {
    let mut lines = reader.lines().enumerate();

    // Banner
    let (_, banner) = lines.next().ok_or(Error::Parse {
        line: 1,
        reason: "empty file".to_string(),
    })?;
    let symmetry = parse_banner(&banner?)?;

    // Size line, after comments
    let mut size = None;
    for (i, line) in lines.by_ref() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        size = Some((i + 1, parse_size(trimmed, i + 1)?));
        break;
    }
    let (size_line, (n_rows, n_cols, declared)) = size.ok_or(Error::Parse {
        line: 1,
        reason: "missing size line".to_string(),
    })?;
    if symmetry != Symmetry::General && n_rows != n_cols {
        return Err(Error::Parse {
            line: size_line,
            reason: format!("symmetric matrix must be square, got {n_rows}x{n_cols}"),
        });
    }

    let mut entries: Vec<(usize, usize)> = Vec::with_capacity(declared);
    let mut read = 0usize;

    for (i, line) in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }

        let (row, col) = parse_entry(trimmed, i + 1, n_rows, n_cols)?;
        read += 1;
        entries.push((row, col));

        if symmetry != Symmetry::General && row != col {
            entries.push((col, row));
        }
    }

    if read != declared {
        return Err(Error::Parse {
            line: size_line,
            reason: format!("header declares {declared} entries, file has {read}"),
        });
    }

    // Stable, so duplicates keep their file order
    entries.sort_by_key(|&(r, c)| (r, c));

    let mut counts = vec![0usize; n_rows];
    for &(r, _) in &entries {
        counts[r] += 1;
    }
    let row_ptr = exclusive_scan(&counts);
    let col_idx = entries.into_iter().map(|(_, c)| c).collect();

    SparsityPattern::new(n_rows, n_cols, row_ptr, col_idx)
}

fn parse_banner(banner: &str) -> Result<Symmetry> {
    let fields: Vec<String> = banner.split_whitespace().map(str::to_lowercase).collect();
    let bad = |reason: &str| Error::Parse {
        line: 1,
        reason: reason.to_string(),
    };

    if fields.len() < 5 || fields[0] != "%%matrixmarket" || fields[1] != "matrix" {
        return Err(bad("expected '%%MatrixMarket matrix <format> <field> <symmetry>'"));
    }
    if fields[2] != "coordinate" {
        return Err(bad("only coordinate format is supported"));
    }
    if !matches!(fields[3].as_str(), "real" | "integer" | "pattern" | "double") {
        return Err(bad("unsupported field type"));
    }

    match fields[4].as_str() {
        "general" => Ok(Symmetry::General),
        "symmetric" => Ok(Symmetry::Symmetric),
        "skew-symmetric" => Ok(Symmetry::SkewSymmetric),
        _ => Err(bad("unsupported symmetry")),
    }
}

fn parse_size(line: &str, line_no: usize) -> Result<(usize, usize, usize)> {
    let dims: Vec<usize> = line
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::Parse {
            line: line_no,
            reason: format!("invalid size line: {e}"),
        })?;

    match dims.as_slice() {
        &[rows, cols, nnz] => Ok((rows, cols, nnz)),
        _ => Err(Error::Parse {
            line: line_no,
            reason: "size line must have three integers".to_string(),
        }),
    }
}

fn parse_entry(line: &str, line_no: usize, n_rows: usize, n_cols: usize) -> Result<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let mut index = |name: &str, bound: usize| -> Result<usize> {
        let raw = parts
            .next()
            .ok_or(Error::Parse {
                line: line_no,
                reason: format!("missing {name} index"),
            })?
            .parse::<usize>()
            .map_err(|e| Error::Parse {
                line: line_no,
                reason: format!("invalid {name} index: {e}"),
            })?;
        // 1-indexed to 0-indexed
        if raw == 0 || raw > bound {
            return Err(Error::Parse {
                line: line_no,
                reason: format!("{name} index {raw} outside 1..={bound}"),
            });
        }
        Ok(raw - 1)
    };

    let row = index("row", n_rows)?;
    let col = index("column", n_cols)?;
    Ok((row, col))
}
