//! Shared formula expansion
//!
//! A shared formula group stores its text once, on the anchor cell. The other
//! members only carry the group index; their effective formula is the anchor's
//! text with every relative reference moved by the member's offset.

use vsheet_core::{CellAddress, MAX_COLS, MAX_ROWS};

/// Move the relative references of `formula` by `row_delta` rows and
/// `col_delta` columns.
///
/// String literals and quoted sheet names are copied verbatim. References that
/// would leave the grid become `#REF!`.
pub fn shift_formula(formula: &str, row_delta: i64, col_delta: i64) -> String {
    if row_delta == 0 && col_delta == 0 {
        return formula.to_string();
    }

    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                let end = quoted_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            c if is_identifier_start(c) => {
                let end = identifier_end(&chars, i);
                let token: String = chars[i..end].iter().collect();
                let followed_by_call_or_sheet = matches!(chars.get(end), Some('(') | Some('!'));
                match parse_reference(&token) {
                    Some(reference) if !followed_by_call_or_sheet => {
                        out.push_str(&reference.shifted(row_delta, col_delta));
                    }
                    _ => out.push_str(&token),
                }
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$' || c == '_' || c == '\\'
}

fn identifier_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len()
        && (chars[end].is_alphanumeric() || matches!(chars[end], '$' | '_' | '.' | '\\'))
    {
        end += 1;
    }
    end
}

/// Index just past the closing quote; doubled quotes are escapes
fn quoted_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

struct Reference {
    col: u32,
    col_absolute: bool,
    row: u32,
    row_absolute: bool,
}

impl Reference {
    fn shifted(&self, row_delta: i64, col_delta: i64) -> String {
        let row = if self.row_absolute {
            self.row as i64
        } else {
            self.row as i64 + row_delta
        };
        let col = if self.col_absolute {
            self.col as i64
        } else {
            self.col as i64 + col_delta
        };
        if row < 1 || row > MAX_ROWS as i64 || col < 0 || col >= MAX_COLS as i64 {
            return "#REF!".to_string();
        }
        format!(
            "{}{}{}{}",
            if self.col_absolute { "$" } else { "" },
            CellAddress::column_to_letters(col as u16),
            if self.row_absolute { "$" } else { "" },
            row
        )
    }
}

/// Parse `$?LETTERS$?DIGITS` with at most three column letters
fn parse_reference(token: &str) -> Option<Reference> {
    let (col_absolute, rest) = match token.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let letters_len = rest.bytes().take_while(u8::is_ascii_uppercase).count();
    if letters_len == 0 || letters_len > 3 {
        return None;
    }
    let (letters, rest) = rest.split_at(letters_len);
    let (row_absolute, digits) = match rest.strip_prefix('$') {
        Some(digits) => (true, digits),
        None => (false, rest),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    let col = CellAddress::letters_to_column(letters).ok()? as u32;
    Some(Reference {
        col,
        col_absolute,
        row,
        row_absolute,
    })
}
