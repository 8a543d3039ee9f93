//! Collection-level financial summaries.
//!
//! Folds heterogeneous document records into exact-decimal totals. All
//! arithmetic stays in `Decimal` until the output boundary so that the
//! profit invariant (`profit == sales - purchases`) holds exactly after
//! rounding; binary floating point never touches an accumulator.

use crate::model::amount::resolve_amount;
use crate::model::document::{
    is_amount_key, line_direction, resolve_direction, Direction, Document, GROSS_AMOUNT_FIELD,
    NET_AMOUNT_FIELD,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

/// Aggregate financial metrics over a document collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardSummary {
    pub total_sales: Decimal,
    pub total_purchases: Decimal,
    pub profit: Decimal,
    pub transaction_count: u32,
}

/// Folds a document collection into dashboard metrics.
///
/// Per document, line amounts route to the sales or purchases bucket by the
/// line's own direction code. When no line contributes, or the buckets net
/// to exactly zero, a header-level amount plus a document-level direction
/// replace the line totals wholesale, so a document is never counted at
/// both levels. Documents with no resolvable contribution at either level
/// do not count as transactions.
///
/// Total over arbitrary input: malformed records degrade to zero
/// contribution, never to an error.
pub fn build_summary(documents: &[Value]) -> DashboardSummary {
    let mut total_sales = Decimal::ZERO;
    let mut total_purchases = Decimal::ZERO;
    let mut transaction_count = 0u32;

    for record in documents {
        let document = Document::new(record);
        let mut sales = Decimal::ZERO;
        let mut purchases = Decimal::ZERO;
        let mut has_transaction = false;

        for line in document.lines() {
            let Some(amount) = line_amount(line) else {
                continue;
            };
            let Some(direction) = line_direction(line) else {
                continue;
            };
            has_transaction = true;
            match direction {
                Direction::Sale => sales += amount,
                Direction::Purchase => purchases += amount,
            }
        }

        if !has_transaction || (sales.is_zero() && purchases.is_zero()) {
            let header = header_amount(&document);
            let direction = resolve_direction(&document);
            if let (Some(amount), Some(direction)) = (header, direction) {
                has_transaction = true;
                match direction {
                    Direction::Sale => {
                        sales = amount;
                        purchases = Decimal::ZERO;
                    }
                    Direction::Purchase => {
                        purchases = amount;
                        sales = Decimal::ZERO;
                    }
                }
            }
        }

        if has_transaction {
            transaction_count += 1;
            total_sales += sales;
            total_purchases += purchases;
        }
    }

    let profit = total_sales - total_purchases;
    DashboardSummary {
        total_sales: total_sales.round_dp(2),
        total_purchases: total_purchases.round_dp(2),
        profit: profit.round_dp(2),
        transaction_count,
    }
}

/// Derives a single monetary amount for one document: the rounded sum of
/// its line amounts (each rounded to 2 decimals first), falling back to a
/// header-level amount when no line yields a value.
pub fn document_amount(record: &Value) -> Option<Decimal> {
    let document = Document::new(record);
    let mut total = Decimal::ZERO;
    let mut has_line_amount = false;

    for line in document.lines() {
        let Some(amount) = line_amount(line) else {
            continue;
        };
        has_line_amount = true;
        total += amount.round_dp(2);
    }

    if has_line_amount {
        return Some(total.round_dp(2));
    }
    header_amount(&document).map(|amount| amount.round_dp(2))
}

/// Resolves a line's monetary amount: the canonical net/gross fields first,
/// then the first other amount-looking field that parses to a non-zero
/// value. The result, when present, is never zero.
fn line_amount(line: &Map<String, Value>) -> Option<Decimal> {
    let canonical = line
        .get(NET_AMOUNT_FIELD)
        .filter(|value| !value.is_null())
        .or_else(|| line.get(GROSS_AMOUNT_FIELD));
    if let Some(amount) = canonical.and_then(resolve_amount) {
        if !amount.is_zero() {
            return Some(amount);
        }
    }
    scan_amount(line)
}

/// First field whose name passes the amount-key heuristic and whose value
/// parses to a non-zero amount. Fields are visited in upstream payload
/// order.
fn scan_amount(fields: &Map<String, Value>) -> Option<Decimal> {
    fields.iter().find_map(|(key, value)| {
        if !is_amount_key(key) {
            return None;
        }
        resolve_amount(value).filter(|amount| !amount.is_zero())
    })
}

fn header_amount(document: &Document) -> Option<Decimal> {
    scan_amount(document.header()?)
}

/// Candidate fields for an accounting receipt's headline amount, tried in
/// order before the heuristic scan.
const RECEIPT_AMOUNT_FIELDS: &[&str] = &[
    "toplamBorc",
    "toplamAlacak",
    "genelToplam",
    "fisTutari",
    "borcToplam",
    "alacakToplam",
];
/// Receipts carry debit/credit vocabulary that invoices do not.
const RECEIPT_KEY_TOKENS: &[&str] = &["toplam", "tutar", "borc", "alacak"];
const RECEIPT_KEY_STOP_TOKENS: &[&str] = &["kod", "no", "tip"];

/// Headline amount of an accounting receipt record.
///
/// Receipts are flat objects rather than header-plus-lines documents: the
/// known total fields are tried in order, then the first top-level field
/// whose name matches the receipt amount vocabulary and parses to a
/// non-zero value.
pub fn receipt_amount(record: &Value) -> Option<Decimal> {
    let fields = record.as_object()?;

    for field in RECEIPT_AMOUNT_FIELDS {
        if let Some(amount) = fields.get(*field).and_then(resolve_amount) {
            if !amount.is_zero() {
                return Some(amount);
            }
        }
    }

    fields.iter().find_map(|(key, value)| {
        let key = key.to_lowercase();
        if !RECEIPT_KEY_TOKENS.iter().any(|token| key.contains(token)) {
            return None;
        }
        if RECEIPT_KEY_STOP_TOKENS.iter().any(|token| key.contains(token)) {
            return None;
        }
        resolve_amount(value).filter(|amount| !amount.is_zero())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_collection() {
        let summary = build_summary(&[]);
        assert_eq!(summary, DashboardSummary::default());
        assert_eq!(summary.profit, Decimal::ZERO);
    }

    #[test]
    fn test_single_sale_line() {
        let documents = vec![json!({
            "STK_STOKSATIR": [{"nettutar": 100, "IOdurum": -1}]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary.total_sales, dec("100"));
        assert_eq!(summary.total_purchases, Decimal::ZERO);
        assert_eq!(summary.profit, dec("100"));
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_minor_unit_lines_are_scaled() {
        let documents = vec![json!({
            "STK_STOKSATIR": [
                {"nettutar": 125000, "IOdurum": 1},
                {"nettutar": 75000, "IOdurum": 1}
            ]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary.total_purchases, dec("2000.00"));
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_header_fallback_when_lines_net_to_zero() {
        let documents = vec![json!({
            "STK_STOKBASLIK": {"toplamtutar": "500,00", "IOdurum": 1},
            "STK_STOKSATIR": [
                {"nettutar": 100, "IOdurum": -1},
                {"nettutar": -100, "IOdurum": -1}
            ]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary.total_purchases, dec("500.00"));
        assert_eq!(summary.total_sales, Decimal::ZERO);
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_header_fallback_when_lines_are_uninformative() {
        let documents = vec![json!({
            "STK_STOKBASLIK": {"geneltoplam": "1.500,00", "alisSatis": "satis"},
            "STK_STOKSATIR": [{"stokkodu": "KLM-1", "miktaradet": 3}]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary.total_sales, dec("1500.00"));
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_header_is_ignored_when_lines_contribute() {
        // No double counting across the two resolution levels.
        let documents = vec![json!({
            "STK_STOKBASLIK": {"toplamtutar": "9.999,99", "IOdurum": -1},
            "STK_STOKSATIR": [{"nettutar": 250, "IOdurum": -1}]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary.total_sales, dec("250"));
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_header_amount_without_direction_does_not_count() {
        let documents = vec![json!({
            "STK_STOKBASLIK": {"toplamtutar": "500,00"}
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary, DashboardSummary::default());
    }

    #[test]
    fn test_unresolvable_documents_are_not_transactions() {
        let documents = vec![
            json!({}),
            json!(null),
            json!("garbage"),
            json!({"STK_STOKBASLIK": {"belgeno": "1"}, "STK_STOKSATIR": [{"stokkodu": "A"}]}),
        ];
        let summary = build_summary(&documents);
        assert_eq!(summary, DashboardSummary::default());
    }

    #[test]
    fn test_lines_without_routing_direction_contribute_nothing() {
        let documents = vec![json!({
            "STK_STOKSATIR": [{"nettutar": 100, "IOdurum": 5}]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary, DashboardSummary::default());
    }

    #[test]
    fn test_mixed_directions_in_one_document() {
        let documents = vec![json!({
            "STK_STOKSATIR": [
                {"nettutar": "1.000,00", "IOdurum": -1},
                {"nettutar": "250,50", "IOdurum": 1}
            ]
        })];
        let summary = build_summary(&documents);
        assert_eq!(summary.total_sales, dec("1000.00"));
        assert_eq!(summary.total_purchases, dec("250.50"));
        assert_eq!(summary.profit, dec("749.50"));
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_profit_invariant_over_generated_documents() {
        // Deterministic pseudo-random mix of encodings and directions.
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut documents = Vec::new();
        for _ in 0..200 {
            let cents = (next() % 1_000_000) as i64 - 500_000;
            let direction = if next() % 2 == 0 { -1 } else { 1 };
            let amount = match next() % 3 {
                0 => json!(cents),
                1 => json!(cents as f64 / 100.0),
                _ => json!(format!("{},{:02}", cents / 100, (cents % 100).abs())),
            };
            documents.push(json!({
                "STK_STOKSATIR": [{"nettutar": amount, "IOdurum": direction}]
            }));
        }

        let summary = build_summary(&documents);
        assert_eq!(
            summary.profit,
            (summary.total_sales - summary.total_purchases).round_dp(2)
        );
    }

    #[test]
    fn test_document_amount_sums_lines() {
        let record = json!({
            "STK_STOKSATIR": [
                {"nettutar": "100,006", "IOdurum": -1},
                {"nettutar": "200,50", "IOdurum": -1}
            ]
        });
        // 100.006 rounds to 100.01 before the lines are summed.
        assert_eq!(document_amount(&record), Some(dec("300.51")));
    }

    #[test]
    fn test_document_amount_ignores_line_directions() {
        let record = json!({
            "STK_STOKSATIR": [{"nettutar": 75, "IOdurum": 5}, {"nettutar": 25}]
        });
        assert_eq!(document_amount(&record), Some(dec("100")));
    }

    #[test]
    fn test_document_amount_header_fallback() {
        let record = json!({
            "STK_STOKBASLIK": {"toplamtutar": "1.250,75"},
            "STK_STOKSATIR": []
        });
        assert_eq!(document_amount(&record), Some(dec("1250.75")));
    }

    #[test]
    fn test_document_amount_none() {
        assert_eq!(document_amount(&json!({})), None);
        assert_eq!(document_amount(&json!(null)), None);
        let record = json!({"STK_STOKBASLIK": {"belgeno": "7", "kdvtutar": 0}});
        assert_eq!(document_amount(&record), None);
    }

    #[test]
    fn test_receipt_amount_candidate_order() {
        let record = json!({
            "fisno": 101,
            "toplamAlacak": "250,00",
            "toplamBorc": "1.000,00"
        });
        assert_eq!(receipt_amount(&record), Some(dec("1000.00")));
    }

    #[test]
    fn test_receipt_amount_heuristic_scan() {
        let record = json!({
            "fisno": 101,
            "fistipkodu": 900,
            "borctoplam": "12.000,00"
        });
        assert_eq!(receipt_amount(&record), Some(dec("12000.00")));

        let record = json!({"fisno": 101, "alacaktoplam": 350000});
        assert_eq!(receipt_amount(&record), Some(dec("3500.00")));
    }

    #[test]
    fn test_receipt_amount_none() {
        assert_eq!(receipt_amount(&json!({"fisno": 101})), None);
        assert_eq!(receipt_amount(&json!(null)), None);
        assert_eq!(receipt_amount(&json!({"borctoplam": 0})), None);
    }

    #[test]
    fn test_line_scan_skips_excluded_and_zero_fields() {
        let record = json!({
            "STK_STOKSATIR": [{
                "nettutar": 0,
                "toplamadet": 9,
                "kdvtutar": 0,
                "stoktutar": "250,75",
                "IOdurum": -1
            }]
        });
        let summary = build_summary(std::slice::from_ref(&record));
        assert_eq!(summary.total_sales, dec("250.75"));
        assert_eq!(document_amount(&record), Some(dec("250.75")));
    }
}
