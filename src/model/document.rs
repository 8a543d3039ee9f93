//! Tolerant access to raw ERP document records.
//!
//! Documents arrive as untyped JSON whose field names drift across Orka
//! versions (`IOdurum` vs `IODurum`, header-level vs line-level placement).
//! Nothing here assumes a fixed schema: lookups go through prioritized
//! candidate keys and lowercased substring heuristics, and every accessor is
//! total over arbitrary input shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding a document's line items.
pub(crate) const LINES_FIELD: &str = "STK_STOKSATIR";
/// Field holding a document's header record.
pub(crate) const HEADER_FIELD: &str = "STK_STOKBASLIK";
/// Net line amount.
pub(crate) const NET_AMOUNT_FIELD: &str = "nettutar";
/// Gross line amount in local currency.
pub(crate) const GROSS_AMOUNT_FIELD: &str = "satirtltutar";
/// Direction code: `-1` sale, `1` purchase.
pub(crate) const DIRECTION_FIELD: &str = "IOdurum";
/// Stable document identity assigned by the backend.
const IDENTITY_FIELD: &str = "OrkaUQ";
const NUMBER_FIELD: &str = "belgeno";
const SERIES_FIELD: &str = "belgeserino";
const DATE_FIELD: &str = "belgetarihi";

/// Header direction candidates, tried in this order before the top-level
/// direction field. The list covers historical spellings; the order is part
/// of the observable behavior and must not be rearranged.
const HEADER_DIRECTION_FIELDS: &[&str] = &["IOdurum", "IODurum", "alisSatis", "AlisSatis"];

/// Key substrings that mark a field as a monetary total.
const AMOUNT_KEY_TOKENS: &[&str] = &["toplam", "tutar"];
/// Key substrings that disqualify a field: quantities, types, codes and
/// document numbers that happen to share characters with amount fields.
const AMOUNT_KEY_STOP_TOKENS: &[&str] = &["adet", "tip", "kod", "no"];

/// Domain vocabulary for string-encoded directions.
const PURCHASE_TOKEN: &str = "alis";
const SALE_TOKEN: &str = "satis";

/// Transaction direction of a document or line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Income; encoded upstream as `-1`.
    Sale,
    /// Expense; encoded upstream as `1`.
    Purchase,
}

serde_plain::derive_display_from_serialize!(Direction);
serde_plain::derive_fromstr_from_deserialize!(Direction);

impl Direction {
    /// The upstream integer encoding.
    pub fn code(self) -> i8 {
        match self {
            Direction::Sale => -1,
            Direction::Purchase => 1,
        }
    }
}

/// One financial document as returned by the ERP.
///
/// Wraps a raw record without copying it. Non-object records behave as empty
/// documents: no lines, no header, no fields.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    body: Option<&'a Map<String, Value>>,
}

impl<'a> Document<'a> {
    pub fn new(record: &'a Value) -> Self {
        Self {
            body: record.as_object(),
        }
    }

    /// The document's line items, skipping anything that is not an object.
    pub fn lines(&self) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
        self.body
            .and_then(|body| body.get(LINES_FIELD))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_object)
    }

    /// The document header, when present and an object.
    pub fn header(&self) -> Option<&'a Map<String, Value>> {
        self.body?.get(HEADER_FIELD)?.as_object()
    }

    /// Stable identity (`OrkaUQ`), when present.
    pub fn identity(&self) -> Option<&'a str> {
        self.body?.get(IDENTITY_FIELD)?.as_str()
    }

    /// Document number from the header.
    pub fn number(&self) -> Option<&'a str> {
        self.header_str(NUMBER_FIELD)
    }

    /// Document series from the header.
    pub fn series(&self) -> Option<&'a str> {
        self.header_str(SERIES_FIELD)
    }

    /// The raw document date from the header, un-normalized.
    pub fn raw_date(&self) -> Option<&'a Value> {
        self.header()?.get(DATE_FIELD)
    }

    fn header_str(&self, key: &str) -> Option<&'a str> {
        self.header()?.get(key)?.as_str()
    }

    fn top_level_direction(&self) -> Option<&'a Value> {
        self.body?.get(DIRECTION_FIELD)
    }
}

/// True when a field name looks like a monetary total: it contains one of
/// the amount tokens and none of the stop tokens (case-insensitive
/// substring match against the upstream naming conventions).
pub(crate) fn is_amount_key(key: &str) -> bool {
    let key = key.to_lowercase();
    AMOUNT_KEY_TOKENS.iter().any(|token| key.contains(token))
        && !AMOUNT_KEY_STOP_TOKENS.iter().any(|token| key.contains(token))
}

/// Resolves a document's transaction direction.
///
/// Header candidates are inspected first, in a fixed historical order, then
/// the top-level direction field, and as a last resort the first line's
/// numeric code. Numeric signals classify by sign (positive purchase,
/// negative sale, zero no signal); string signals are parsed as signed
/// integers, falling back to the `alis`/`satis` vocabulary.
pub fn resolve_direction(document: &Document) -> Option<Direction> {
    let header = document.header();
    let candidates = HEADER_DIRECTION_FIELDS
        .iter()
        .filter_map(|field| header.and_then(|h| h.get(*field)))
        .chain(document.top_level_direction());

    for candidate in candidates {
        if let Some(direction) = direction_signal(candidate) {
            return Some(direction);
        }
    }

    let first_line = document.lines().next()?;
    sign_of(first_line.get(DIRECTION_FIELD)?)
}

fn direction_signal(value: &Value) -> Option<Direction> {
    if value.is_number() {
        return sign_of(value);
    }
    let text = value.as_str()?;
    if let Ok(code) = text.trim().parse::<i64>() {
        if code > 0 {
            return Some(Direction::Purchase);
        }
        if code < 0 {
            return Some(Direction::Sale);
        }
        // A literal zero carries no signal, and no numeric string can
        // match the vocabulary below.
        return None;
    }
    let lower = text.to_lowercase();
    if lower == PURCHASE_TOKEN {
        return Some(Direction::Purchase);
    }
    if lower == SALE_TOKEN {
        return Some(Direction::Sale);
    }
    None
}

/// Classifies a numeric value by sign; non-numbers and zero yield nothing.
fn sign_of(value: &Value) -> Option<Direction> {
    let number = value.as_f64()?;
    if number > 0.0 {
        Some(Direction::Purchase)
    } else if number < 0.0 {
        Some(Direction::Sale)
    } else {
        None
    }
}

/// The direction a line routes its own amount by: the exact codes `-1` and
/// `1` only. Other magnitudes and string encodings carry no line-level
/// routing signal.
pub(crate) fn line_direction(line: &Map<String, Value>) -> Option<Direction> {
    match line.get(DIRECTION_FIELD)?.as_f64()? {
        code if code == -1.0 => Some(Direction::Sale),
        code if code == 1.0 => Some(Direction::Purchase),
        _ => None,
    }
}
