use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, trace};

use crate::categorizer::CategoryMap;
use crate::error::{Result, SpendsortError};
use crate::models::Transaction;
use crate::splitter::{LineSplitter, Record};

const BOM: char = '\u{feff}';

/// Category values banks print when they did not really categorize a row.
const INVALID_CATEGORIES: &[&str] = &[
    "Nezařazeno",
    "Nezařazené",
    "Odchozí nezatříděná",
    "Bankovní transakce",
    "Služby",
    "Příjem",
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Position of the first header field equal to `name`, ignoring case and
/// surrounding whitespace.
pub fn column_index<S: AsRef<str>>(header: &[S], name: &str) -> Result<usize> {
    let target = name.trim().to_lowercase();
    header
        .iter()
        .position(|field| field.as_ref().trim().to_lowercase() == target)
        .ok_or_else(|| SpendsortError::ColumnNotFound {
            column: name.to_string(),
        })
}

/// Parse a Czech formatted amount: `-1 234,56` → `-1234.56`.
///
/// Any whitespace (including no-break spaces) is a thousands separator.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SpendsortError::NumericFormat(raw.to_string()))
}

/// The category a bank printed itself, unless it is a placeholder.
fn direct_category(raw: &str) -> Option<&str> {
    let value = raw.trim().trim_matches(|c: char| c == '"' || c == ';').trim();
    if value.is_empty() || INVALID_CATEGORIES.contains(&value) {
        None
    } else {
        Some(value)
    }
}

fn cell(record: &Record, column: usize) -> Result<&str> {
    record
        .fields
        .get(column)
        .map(String::as_str)
        .ok_or(SpendsortError::ShortRow {
            line: record.line,
            column,
        })
}

// ---------------------------------------------------------------------------
// Bank kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    Csob,
    Raiffeisenbank,
    Creditas,
    Unicreditbank,
}

/// File-name prefixes, matched case-insensitively.
const PREFIXES: &[(&str, Bank)] = &[
    ("csob", Bank::Csob),
    ("raif", Bank::Raiffeisenbank),
    ("cred", Bank::Creditas),
    ("unic", Bank::Unicreditbank),
];

/// Where the columns of one bank's export live. Header names are the
/// literal strings from the bank's export.
struct Layout {
    /// 1-based physical line holding the column header.
    header_line: usize,
    amount: &'static str,
    category: Option<&'static str>,
    /// Resolver keys, highest priority first.
    keys: &'static [&'static str],
    /// First non-empty of these becomes `Transaction::info`.
    info: &'static [&'static str],
    info_trim: &'static [char],
    date: &'static str,
    /// Every row must have exactly as many fields as the header.
    strict_width: bool,
}

const CSOB: Layout = Layout {
    header_line: 3,
    amount: "Částka",
    category: Some("Kategorie"),
    keys: &["jméno protistrany", "vlastní poznámka", "zpráva", "číslo protiúčtu"],
    info: &["jméno protistrany", "číslo protiúčtu", "zpráva"],
    info_trim: &[],
    date: "datum zaúčtování",
    strict_width: false,
};

const RAIFFEISENBANK: Layout = Layout {
    header_line: 1,
    amount: "Zaúčtovaná částka",
    category: None,
    keys: &["Název obchodníka", "Poznámka", "Název protiúčtu", "Číslo protiúčtu"],
    info: &["Název protiúčtu", "Poznámka", "Číslo protiúčtu"],
    info_trim: &[],
    date: "Datum zaúčtování",
    strict_width: false,
};

const CREDITAS: Layout = Layout {
    header_line: 4,
    amount: "Částka",
    category: Some("Kategorie"),
    keys: &["Název protiúčtu", "Protiúčet", "Zpráva pro protistranu"],
    info: &["Název protiúčtu", "Protiúčet", "Zpráva pro protistranu"],
    info_trim: &[],
    date: "Datum zaúčtování",
    strict_width: false,
};

const UNICREDITBANK: Layout = Layout {
    header_line: 4,
    amount: "Částka",
    category: None,
    keys: &["Příjemce", "Detaily transakce 1"],
    info: &["Příjemce", "Detaily transakce 1"],
    info_trim: &['"', ',', ' '],
    date: "Datum rezervace",
    strict_width: true,
};

impl Bank {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csob => "csob",
            Self::Raiffeisenbank => "raiffeisenbank",
            Self::Creditas => "creditas",
            Self::Unicreditbank => "unicreditbank",
        }
    }

    fn layout(&self) -> &'static Layout {
        match self {
            Self::Csob => &CSOB,
            Self::Raiffeisenbank => &RAIFFEISENBANK,
            Self::Creditas => &CREDITAS,
            Self::Unicreditbank => &UNICREDITBANK,
        }
    }

    /// Pick the bank from a file name prefix.
    pub fn for_file(path: &Path) -> Option<Bank> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, bank)| *bank)
    }

    /// Read and parse one export file. Any failure fails the whole file.
    pub fn parse(&self, file_path: &Path, mapping: &CategoryMap) -> Result<Vec<Transaction>> {
        let content = std::fs::read_to_string(file_path)?;
        self.parse_str(&content, mapping)
    }

    pub fn parse_str(&self, content: &str, mapping: &CategoryMap) -> Result<Vec<Transaction>> {
        let layout = self.layout();
        let content = content.strip_prefix(BOM).unwrap_or(content);
        let mut records = LineSplitter::default()
            .records(content, layout.header_line)
            .into_iter();
        let header = records.next().ok_or(SpendsortError::MissingHeader {
            line: layout.header_line,
        })?;
        let columns = Columns::resolve(layout, &header.fields)?;

        records
            .map(|record| {
                if layout.strict_width && record.fields.len() != header.fields.len() {
                    return Err(SpendsortError::RowLength {
                        line: record.line,
                        expected: header.fields.len(),
                        found: record.fields.len(),
                    });
                }
                columns.transaction(*self, &record, mapping)
            })
            .collect()
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Column positions resolved from one file's header row.
struct Columns {
    amount: usize,
    category: Option<usize>,
    keys: Vec<usize>,
    info: Vec<usize>,
    info_trim: &'static [char],
    date: usize,
}

impl Columns {
    fn resolve(layout: &Layout, header: &[String]) -> Result<Self> {
        let all = |names: &[&str]| -> Result<Vec<usize>> {
            names.iter().map(|name| column_index(header, name)).collect()
        };
        Ok(Self {
            amount: column_index(header, layout.amount)?,
            category: layout
                .category
                .map(|name| column_index(header, name))
                .transpose()?,
            keys: all(layout.keys)?,
            info: all(layout.info)?,
            info_trim: layout.info_trim,
            date: column_index(header, layout.date)?,
        })
    }

    fn transaction(&self, bank: Bank, record: &Record, mapping: &CategoryMap) -> Result<Transaction> {
        let amount = parse_amount(cell(record, self.amount)?)?;

        let printed = match self.category {
            Some(col) => direct_category(cell(record, col)?),
            None => None,
        };
        let category = match printed {
            Some(category) => category.to_string(),
            None => {
                let keys = self
                    .keys
                    .iter()
                    .map(|&col| cell(record, col))
                    .collect::<Result<Vec<_>>>()?;
                mapping.resolve(keys)
            }
        };

        let mut info = String::new();
        for &col in &self.info {
            let value = cell(record, col)?.trim().trim_matches(self.info_trim);
            if !value.is_empty() {
                info = value.to_string();
                break;
            }
        }

        Ok(Transaction {
            bank,
            amount,
            category: mapping.rewrite(&category),
            info,
            date: cell(record, self.date)?.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Discovery and batch loading
// ---------------------------------------------------------------------------

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

/// Collect CSV exports from `data_dir` and its immediate subdirectories,
/// sorted by path. Every file must belong to a known bank.
pub fn discover(data_dir: &Path) -> Result<Vec<(Bank, PathBuf)>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            for inner in std::fs::read_dir(&path)? {
                let inner = inner?.path();
                if is_csv(&inner) {
                    paths.push(inner);
                }
            }
        } else if is_csv(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match Bank::for_file(&path) {
            Some(bank) => files.push((bank, path)),
            None => return Err(SpendsortError::UnrecognizedBankFile(path)),
        }
    }
    info!("Found {} bank files in {}", files.len(), data_dir.display());
    Ok(files)
}

/// A file that contributed nothing because it could not be parsed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub bank: Bank,
    pub error: SpendsortError,
}

#[derive(Debug, Default)]
pub struct Batch {
    pub transactions: Vec<Transaction>,
    pub failures: Vec<FileFailure>,
}

/// Parse every file. A failing file is logged and skipped; it never stops
/// the rest of the batch.
pub fn load_all(files: &[(Bank, PathBuf)], mapping: &CategoryMap) -> Batch {
    let mut batch = Batch::default();
    for (bank, path) in files {
        match bank.parse(path, mapping) {
            Ok(rows) => {
                debug!("{}: {} transactions", path.display(), rows.len());
                for txn in &rows {
                    trace!("{txn}");
                }
                batch.transactions.extend(rows);
            }
            Err(e) => {
                error!("Error reading {bank} data from {}: {e}", path.display());
                batch.failures.push(FileFailure {
                    path: path.clone(),
                    bank: *bank,
                    error: e,
                });
            }
        }
    }
    batch
}
