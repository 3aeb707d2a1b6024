//! A1-style addressing: column letters, cell references, merge ranges.
//!
//! All indices are 0-based internally; spreadsheet row numbers (1-based)
//! only appear in issue output.

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Parse column letters ("D", "aa") to a 0-based index.
pub fn letter_to_col(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut col = 0usize;
    for ch in letters.chars() {
        col = col
            .checked_mul(26)?
            .checked_add(ch.to_ascii_uppercase() as usize - 'A' as usize + 1)?;
    }
    col.checked_sub(1)
}

/// Parse A1-style cell reference (e.g. "A1" → (0, 0), "B2" → (1, 1)).
/// `$` anchors are accepted and ignored.
pub fn parse_a1(addr: &str) -> Option<(usize, usize)> {
    let addr: String = addr.trim().chars().filter(|c| *c != '$').collect();
    let split = addr.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = addr.split_at(split);
    let col = letter_to_col(letters)?;
    let row: usize = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col))
}

/// Rectangular merged region, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl MergeRange {
    /// Parse "D7:D8". Corners may be given in any order.
    pub fn parse(range: &str) -> Option<Self> {
        let (a, b) = range.split_once(':')?;
        let (r1, c1) = parse_a1(a)?;
        let (r2, c2) = parse_a1(b)?;
        Some(Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        })
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    pub fn anchor(&self) -> (usize, usize) {
        (self.start_row, self.start_col)
    }
}
