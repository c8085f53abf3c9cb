use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::store;

/// Store key holding the full question bank as one JSON array.
pub const BANK_KEY: &str = "bank.questions";

/// Explanation used when the pasted row carries none.
pub const DEFAULT_EXPLANATION: &str = "Answer verified.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqItem {
    pub question: String,
    pub options: [String; 4],
    pub correct_answer: usize,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub imported: usize,
    pub total: usize,
}

/// Typed access to the persisted bank. Reads the whole sequence, writes it
/// back wholesale; there is no incremental append at the storage layer.
pub struct BankRepo<'a> {
    conn: &'a Connection,
}

impl<'a> BankRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// A missing key reads as an empty bank.
    pub fn get(&self) -> anyhow::Result<Vec<McqItem>> {
        match store::store_get_json(self.conn, BANK_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn put(&self, items: &[McqItem]) -> anyhow::Result<()> {
        store::store_set_json(self.conn, BANK_KEY, &serde_json::to_value(items)?)
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        store::store_remove(self.conn, BANK_KEY)
    }
}

/// Parse an operator-pasted block of spreadsheet rows. Rows that do not reach
/// six columns are dropped without comment; each surviving row maps
/// positionally to question, options A-D, answer letter, optional explanation.
pub fn parse_pasted(pasted: &str) -> Vec<McqItem> {
    let mut items = Vec::new();
    for row in pasted.trim().lines() {
        if let Some(item) = parse_row(row) {
            items.push(item);
        }
    }
    items
}

fn parse_row(row: &str) -> Option<McqItem> {
    // Sheets paste as tab-separated; hand-typed rows tend to use commas.
    // The delimiter is sniffed per row.
    let cols: Vec<&str> = if row.contains('\t') {
        row.split('\t').collect()
    } else {
        row.split(',').collect()
    };
    if cols.len() < 6 {
        return None;
    }

    let explanation = match cols.get(6) {
        Some(c) if !c.is_empty() => c.trim().to_string(),
        _ => DEFAULT_EXPLANATION.to_string(),
    };

    Some(McqItem {
        question: cols[0].trim().to_string(),
        options: [
            cols[1].trim().to_string(),
            cols[2].trim().to_string(),
            cols[3].trim().to_string(),
            cols[4].trim().to_string(),
        ],
        correct_answer: answer_index(cols[5]),
        explanation,
    })
}

/// Accepts the letter or the 1-based position; anything else falls back to
/// the first option. The permissive default is deliberate.
fn answer_index(token: &str) -> usize {
    match token.trim().to_ascii_uppercase().as_str() {
        "A" | "1" => 0,
        "B" | "2" => 1,
        "C" | "3" => 2,
        "D" | "4" => 3,
        _ => 0,
    }
}

/// Append the parsed rows after the existing bank and persist the merged
/// sequence. Empty or whitespace-only input is a no-op: nothing is parsed and
/// nothing is written.
pub fn import_pasted(repo: &BankRepo, pasted: &str) -> anyhow::Result<ImportSummary> {
    if pasted.trim().is_empty() {
        let total = repo.get()?.len();
        return Ok(ImportSummary { imported: 0, total });
    }

    let new_items = parse_pasted(pasted);
    let mut bank = repo.get()?;
    let imported = new_items.len();
    bank.extend(new_items);
    repo.put(&bank)?;

    Ok(ImportSummary {
        imported,
        total: bank.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_row_maps_all_seven_columns() {
        let items = parse_pasted("What is 2+2?\t3\t4\t5\t6\tB\tBasic math");
        assert_eq!(items.len(), 1);
        let q = &items[0];
        assert_eq!(q.question, "What is 2+2?");
        assert_eq!(q.options, ["3", "4", "5", "6"]);
        assert_eq!(q.correct_answer, 1);
        assert_eq!(q.explanation, "Basic math");
    }

    #[test]
    fn comma_row_without_explanation_gets_default() {
        let items = parse_pasted("Capital of France?,Paris,Lyon,Nice,Lille,A");
        assert_eq!(items.len(), 1);
        let q = &items[0];
        assert_eq!(q.question, "Capital of France?");
        assert_eq!(q.options, ["Paris", "Lyon", "Nice", "Lille"]);
        assert_eq!(q.correct_answer, 0);
        assert_eq!(q.explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn short_rows_are_dropped_independently() {
        let block = "only,five,columns,in,here\nQ?,a,b,c,d,C\n\n";
        let items = parse_pasted(block);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "Q?");
        assert_eq!(items[0].correct_answer, 2);
    }

    #[test]
    fn empty_and_whitespace_blocks_parse_to_nothing() {
        assert!(parse_pasted("").is_empty());
        assert!(parse_pasted("   \n\t \n").is_empty());
    }

    #[test]
    fn answer_tokens_accept_letters_and_digits() {
        for (token, idx) in [
            ("A", 0),
            ("a", 0),
            ("1", 0),
            ("B", 1),
            ("b", 1),
            ("2", 1),
            (" C ", 2),
            ("3", 2),
            ("d", 3),
            ("4", 3),
        ] {
            assert_eq!(answer_index(token), idx, "token {:?}", token);
        }
    }

    #[test]
    fn unrecognized_answer_tokens_fall_back_to_first_option() {
        for token in ["E", "5", "", "  ", "AB", "correct"] {
            assert_eq!(answer_index(token), 0, "token {:?}", token);
        }
    }

    #[test]
    fn columns_are_trimmed() {
        let items = parse_pasted("  Q?  \t a \t b \t c \t d \t b \t  note  ");
        let q = &items[0];
        assert_eq!(q.question, "Q?");
        assert_eq!(q.options, ["a", "b", "c", "d"]);
        assert_eq!(q.correct_answer, 1);
        assert_eq!(q.explanation, "note");
    }

    #[test]
    fn empty_explanation_column_falls_back_whitespace_does_not() {
        // A second line keeps the block trim from eating the trailing tab.
        // Column 6 exists but is empty, so the default applies.
        let items = parse_pasted("Q?\ta\tb\tc\td\tA\t\nQ2?,e,f,g,h,B");
        assert_eq!(items[0].explanation, DEFAULT_EXPLANATION);

        // Whitespace-only column 6 survives the presence check and trims away.
        let items = parse_pasted("Q?\ta\tb\tc\td\tA\t \nQ2?,e,f,g,h,B");
        assert_eq!(items[0].explanation, "");
    }

    #[test]
    fn delimiter_is_sniffed_per_row() {
        let block = "Q1?\ta\tb\tc\td\tA\nQ2?,e,f,g,h,D";
        let items = parse_pasted(block);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].options, ["a", "b", "c", "d"]);
        assert_eq!(items[1].options, ["e", "f", "g", "h"]);
        assert_eq!(items[1].correct_answer, 3);
    }

    #[test]
    fn extra_columns_beyond_explanation_are_ignored() {
        let items = parse_pasted("Q?\ta\tb\tc\td\tA\tnote\textra\tmore");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].explanation, "note");
    }

    #[test]
    fn wire_format_is_camel_case() {
        let q = McqItem {
            question: "Q?".into(),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 2,
            explanation: "x".into(),
        };
        let v = serde_json::to_value(&q).unwrap();
        assert_eq!(v["correctAnswer"], 2);
        assert!(v.get("correct_answer").is_none());
    }
}
