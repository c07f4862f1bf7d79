use crate::domain::dataset::Record;

pub(crate) fn build_system_prompt() -> String {
    r#"You are a data integration assistant. You are given the column names of two tables and a few sample rows from each.
Decide which column of table 1 holds the same kind of information as a column of table 2.

Rules:
- Each column may appear in at most one mapping.
- Only map columns you believe describe the same attribute. Leave the rest unmatched.
- Pick a short, readable mergedName for each mapping. mergedName values must be unique and must not equal any column you leave unmatched.
- confidence is a number between 0 and 1.
- reason is one short sentence.

Return ONLY a JSON object with this exact shape and no other text:
{
  "mappings": [
    {"column1": "<table 1 column>", "column2": "<table 2 column>", "confidence": 0.0, "reason": "...", "mergedName": "..."}
  ],
  "unmatchedColumns1": ["<table 1 columns not mapped>"],
  "unmatchedColumns2": ["<table 2 columns not mapped>"]
}"#
    .to_string()
}

pub(crate) fn build_user_prompt(
    columns1: &[String],
    columns2: &[String],
    samples1: &[Record],
    samples2: &[Record],
) -> String {
    let mut prompt = String::new();
    prompt.push_str("Table 1 columns:\n");
    prompt.push_str(&to_json(columns1));
    prompt.push_str("\n\nTable 2 columns:\n");
    prompt.push_str(&to_json(columns2));

    if !samples1.is_empty() {
        prompt.push_str("\n\nTable 1 sample rows:\n");
        prompt.push_str(&to_json(samples1));
    }
    if !samples2.is_empty() {
        prompt.push_str("\n\nTable 2 sample rows:\n");
        prompt.push_str(&to_json(samples2));
    }

    prompt
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}
