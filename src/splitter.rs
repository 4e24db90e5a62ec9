//! Tokenizer for the semicolon-separated bank exports.
//!
//! Some banks quote every field (`"a";"b"`), others quote nothing (`a;b`).
//! A quoted note may also run over several physical lines; such lines are
//! stitched back into a single logical record.

const QUOTE: char = '"';

/// One logical record together with the physical line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct LineSplitter {
    delimiter: char,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new(';')
    }
}

impl LineSplitter {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Split one physical line into fields.
    ///
    /// The quoted delimiter (`";"`) is tried first so that separators inside
    /// quoted values survive. A line that does not split that way is split
    /// on the bare delimiter instead. Surrounding whitespace and quotes are
    /// stripped from every field.
    pub fn split(&self, line: &str) -> Vec<String> {
        self.split_raw(line).0.into_iter().map(clean_field).collect()
    }

    /// Raw tokens plus whether the quoted delimiter was used. With the
    /// quoted delimiter, the quotes between fields belong to the separator.
    fn split_raw<'a>(&self, line: &'a str) -> (Vec<&'a str>, bool) {
        let quoted = format!("{QUOTE}{}{QUOTE}", self.delimiter);
        let parts: Vec<&str> = line.split(quoted.as_str()).collect();
        if parts.len() >= 2 {
            (parts, true)
        } else {
            (line.split(self.delimiter).collect(), false)
        }
    }

    /// Split `text` into records, starting at the 1-based physical line
    /// `first_line`. Blank lines are ignored.
    ///
    /// A line whose last field opens a quote without closing it continues
    /// on the next line: the next line's first field is appended to the
    /// open field (joined with `", "`) and its remaining fields become new
    /// fields of the same record. The record stays open until a line's
    /// first field carries the closing quote. A record still open at end
    /// of input is kept as it is. Quotes inside other fields never start a
    /// continuation.
    pub fn records(&self, text: &str, first_line: usize) -> Vec<Record> {
        let mut out = Vec::new();
        let mut open: Option<Record> = None;

        for (idx, raw) in text.lines().enumerate().skip(first_line.saturating_sub(1)) {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let (tokens, quoted) = self.split_raw(line);
            let last_opens = tokens
                .last()
                .map_or(false, |last| opens_quote(last, quoted));
            let fields: Vec<String> = tokens.iter().copied().map(clean_field).collect();

            match open.take() {
                Some(mut record) => {
                    let closes = quoted || tokens.first().map_or(false, |t| t.contains(QUOTE));
                    let still_open = if closes {
                        tokens.len() > 1 && last_opens
                    } else {
                        true
                    };
                    let mut rest = fields.into_iter();
                    if let Some(head) = rest.next() {
                        match record.fields.last_mut() {
                            Some(tail) => {
                                tail.push_str(", ");
                                tail.push_str(&head);
                            }
                            None => record.fields.push(head),
                        }
                    }
                    record.fields.extend(rest);
                    if still_open {
                        open = Some(record);
                    } else {
                        out.push(record);
                    }
                }
                None => {
                    let record = Record {
                        line: idx + 1,
                        fields,
                    };
                    if last_opens {
                        open = Some(record);
                    } else {
                        out.push(record);
                    }
                }
            }
        }

        if let Some(record) = open {
            out.push(record);
        }
        out
    }
}

fn clean_field(field: &str) -> String {
    field.trim().trim_matches(QUOTE).to_string()
}

/// Whether `token` is a quoted value missing its closing quote. When the
/// quoted delimiter produced the token, its opening quote was part of the
/// separator.
fn opens_quote(token: &str, opening_in_separator: bool) -> bool {
    let token = token.trim();
    let body = if opening_in_separator {
        token
    } else {
        match token.strip_prefix(QUOTE) {
            Some(rest) => rest,
            None => return false,
        }
    };
    !body.contains(QUOTE)
}
