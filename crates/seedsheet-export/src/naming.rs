use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use seedsheet_core::MAX_SHEET_NAME_LEN;
use seedsheet_workbook::Document;

/// Characters kept from a long name before the `...N` suffix.
const TRUNCATED_PREFIX_LEN: usize = 24;
const ELLIPSIS: &str = "...";
const MAX_SUFFIX: u8 = 99;
const RANDOM_ATTEMPTS: usize = 200;
const FORBIDDEN_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Source of disambiguating suffixes for truncated sheet names.
pub trait SheetNamer {
    /// A suffix in `1..=99`.
    fn suffix(&mut self) -> u8;
}

/// Suffixes drawn from a ChaCha8 stream, reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct SeededSheetNamer {
    rng: ChaCha8Rng,
}

impl SeededSheetNamer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SheetNamer for SeededSheetNamer {
    fn suffix(&mut self) -> u8 {
        self.rng.random_range(1..=MAX_SUFFIX)
    }
}

/// Pick an unused sheet name for a table's full name.
///
/// Names that fit are used verbatim; others are cut to 24 characters and
/// given a `...N` suffix. When the namer keeps colliding, suffixes are
/// counted upward instead so the search always ends.
pub fn sheet_name<D: Document + ?Sized>(
    full_name: &str,
    document: &D,
    namer: &mut dyn SheetNamer,
) -> String {
    let sanitized = sanitize(full_name);
    if sanitized.chars().count() <= MAX_SHEET_NAME_LEN && !document.has_sheet(&sanitized) {
        return sanitized;
    }

    let prefix: String = sanitized.chars().take(TRUNCATED_PREFIX_LEN).collect();
    for _ in 0..RANDOM_ATTEMPTS {
        let candidate = format!("{prefix}{ELLIPSIS}{}", namer.suffix());
        if !document.has_sheet(&candidate) {
            return candidate;
        }
    }

    let mut counter: u32 = 1;
    loop {
        let suffix = counter.to_string();
        let room = MAX_SHEET_NAME_LEN - ELLIPSIS.len() - suffix.len();
        let head: String = prefix.chars().take(room).collect();
        let candidate = format!("{head}{ELLIPSIS}{suffix}");
        if !document.has_sheet(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Replace characters a sheet name cannot hold.
fn sanitize(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|ch| if FORBIDDEN_CHARS.contains(&ch) { '_' } else { ch })
        .collect();
    if sanitized.starts_with('\'') {
        sanitized.replace_range(..1, "_");
    }
    if sanitized.ends_with('\'') {
        let last = sanitized.len() - 1;
        sanitized.replace_range(last.., "_");
    }
    if sanitized.trim().is_empty() {
        sanitized = "_".to_string();
    }
    sanitized
}
