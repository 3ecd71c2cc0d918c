use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    error::{QuizreelError, Result},
    types::{Record, RecordId},
};

pub const COLUMNS: [&str; 7] = [
    "question",
    "option_a",
    "option_b",
    "option_c",
    "option_d",
    "answer",
    "additional_info",
];

/// Output names for `inputs`, unique within the run.
///
/// The first input with a given stem keeps it; later ones get `_2`, `_3`, ...
pub fn unique_source_names(inputs: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    inputs
        .iter()
        .map(|path| {
            let stem = source_name(path);
            let mut name = stem.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{stem}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Records read from one input file, plus the rows that had to be skipped.
#[derive(Debug)]
pub struct LoadedInput {
    pub path: PathBuf,
    pub records: Vec<Record>,
    pub rejected: Vec<(usize, QuizreelError)>,
}

/// Stem used to name everything produced from `path`.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "input".to_string())
}

pub fn load_records(path: &Path) -> Result<LoadedInput> {
    load_records_as(path, &source_name(path))
}

/// Like [`load_records`], but record ids carry `source` instead of the file stem.
pub fn load_records_as(path: &Path, source: &str) -> Result<LoadedInput> {
    let invalid = |reason: String| QuizreelError::InvalidInput {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| invalid(e.to_string()))?;

    let headers = reader.headers().map_err(|e| invalid(e.to_string()))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };
    let indexes: Vec<Option<usize>> = COLUMNS.iter().map(|c| column(c)).collect();
    if indexes[0].is_none() {
        return Err(invalid("missing required column \"question\"".to_string()));
    }

    let mut records = Vec::new();
    let mut rejected = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row_number = i + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                rejected.push((row_number, QuizreelError::from(e)));
                continue;
            }
        };
        let cell = |n: usize| -> Option<String> {
            indexes[n]
                .and_then(|idx| row.get(idx))
                .map(str::to_string)
        };

        let id = RecordId::new(source, row_number);
        match Record::new(
            id,
            cell(0).unwrap_or_default(),
            [cell(1), cell(2), cell(3), cell(4)],
            cell(5),
            cell(6),
        ) {
            Ok(record) => records.push(record),
            Err(e) => rejected.push((row_number, e)),
        }
    }

    Ok(LoadedInput {
        path: path.to_path_buf(),
        records,
        rejected,
    })
}

/// All `*.csv` files under `root`, sorted, skipping VCS/build directories and `exclude`.
pub fn discover_inputs(root: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    let exclude = exclude.map(|p| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf()));

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() && matches!(name.as_ref(), ".git" | "target") {
                return false;
            }
            match &exclude {
                Some(ex) => std::path::absolute(entry.path())
                    .map(|p| p != *ex)
                    .unwrap_or(true),
                None => true,
            }
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("csv"))
        })
        .collect();

    found.sort();
    found
}
