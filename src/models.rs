use crate::error::{ErrorDetail, ModelOutputError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const OPTION_COUNT: usize = 5;
pub const ANSWER_LETTERS: [&str; OPTION_COUNT] = ["A", "B", "C", "D", "E"];

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").expect("code fence pattern"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

pub fn validate_quiz_item(index: usize, item: &QuizItem) -> Vec<ErrorDetail> {
    let mut issues = Vec::new();
    if item.question.trim().is_empty() {
        issues.push(ErrorDetail {
            field: format!("[{index}].question"),
            issue: "must not be empty".into(),
        });
    }
    if item.options.len() != OPTION_COUNT {
        issues.push(ErrorDetail {
            field: format!("[{index}].options"),
            issue: format!("must contain exactly {OPTION_COUNT} options"),
        });
    }
    let mut seen = HashSet::new();
    for (j, option) in item.options.iter().enumerate() {
        if option.trim().is_empty() {
            issues.push(ErrorDetail {
                field: format!("[{index}].options[{j}]"),
                issue: "must not be empty".into(),
            });
        }
        if !seen.insert(option.trim().to_lowercase()) {
            issues.push(ErrorDetail {
                field: format!("[{index}].options[{j}]"),
                issue: "must be unique".into(),
            });
        }
    }
    if !ANSWER_LETTERS.contains(&item.answer.as_str()) {
        issues.push(ErrorDetail {
            field: format!("[{index}].answer"),
            issue: "must be one of A-E".into(),
        });
    }
    issues
}

/// Cuts the JSON array out of a chat reply, checks it against `schema` and
/// decodes it into quiz items.
pub fn parse_quiz_items(raw: &str, schema: &serde_json::Value) -> Result<Vec<QuizItem>, ModelOutputError> {
    let cleaned = CODE_FENCE.replace_all(raw, "");
    let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) else {
        return Err(ModelOutputError::NoJsonArray);
    };
    if end < start {
        return Err(ModelOutputError::NoJsonArray);
    }

    let json_value: serde_json::Value = serde_json::from_str(&cleaned[start..=end])?;

    let compiled = jsonschema::draft202012::new(schema).map_err(|e| {
        ModelOutputError::SchemaMismatch(vec![ErrorDetail {
            field: "$schema".into(),
            issue: e.to_string(),
        }])
    })?;
    if compiled.validate(&json_value).is_err() {
        let details = compiled
            .iter_errors(&json_value)
            .map(|e| ErrorDetail {
                field: e.instance_path.to_string(),
                issue: e.to_string(),
            })
            .collect();
        return Err(ModelOutputError::SchemaMismatch(details));
    }

    let mut items: Vec<QuizItem> = serde_json::from_value(json_value)?;
    for item in &mut items {
        item.answer = item.answer.trim().to_uppercase();
    }

    let issues: Vec<ErrorDetail> = items
        .iter()
        .enumerate()
        .flat_map(|(i, item)| validate_quiz_item(i, item))
        .collect();
    if !issues.is_empty() {
        return Err(ModelOutputError::InvalidItems(issues));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> serde_json::Value {
        serde_json::from_str(include_str!("../contracts/quiz_items.schema.json")).unwrap()
    }

    fn item_json(answer: &str) -> serde_json::Value {
        serde_json::json!({
            "question": "Tarif umum PPN adalah?",
            "options": ["A. 10%", "B. 11%", "C. 12%", "D. 5%", "E. 0%"],
            "answer": answer
        })
    }

    #[test]
    fn parses_fenced_reply_with_prose() {
        let raw = format!(
            "Berikut soalnya:\n```json\n{}\n```\nSemoga membantu.",
            serde_json::json!([item_json("b")])
        );
        let items = parse_quiz_items(&raw, &schema()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].answer, "B");
        assert_eq!(items[0].options.len(), 5);
    }

    #[test]
    fn reply_without_array_is_rejected() {
        let err = parse_quiz_items("maaf, saya tidak bisa", &schema()).unwrap_err();
        assert!(matches!(err, ModelOutputError::NoJsonArray));
        let err = parse_quiz_items("] then [", &schema()).unwrap_err();
        assert!(matches!(err, ModelOutputError::NoJsonArray));
    }

    #[test]
    fn broken_json_is_rejected() {
        let err = parse_quiz_items("[{\"question\": ]", &schema()).unwrap_err();
        assert!(matches!(err, ModelOutputError::InvalidJson(_)));
    }

    #[test]
    fn schema_violations_carry_details() {
        let raw = serde_json::json!([{"question": "x", "options": ["a", "b"], "answer": "A"}]).to_string();
        let err = parse_quiz_items(&raw, &schema()).unwrap_err();
        assert!(matches!(err, ModelOutputError::SchemaMismatch(_)));
        assert!(!err.details().is_empty());
    }

    #[test]
    fn semantic_validation_catches_bad_items() {
        let mut item: QuizItem = serde_json::from_value(item_json("F")).unwrap();
        let issues = validate_quiz_item(0, &item);
        assert!(issues.iter().any(|i| i.field == "[0].answer"));

        item.answer = "A".into();
        item.options[1] = "A. 10%".into();
        let issues = validate_quiz_item(3, &item);
        assert!(issues.iter().any(|i| i.issue.contains("unique")));

        item.options = vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()];
        assert!(validate_quiz_item(0, &item).is_empty());
    }

    #[test]
    fn duplicate_options_fail_after_schema() {
        let raw = serde_json::json!([{
            "question": "Siapa yang menerbitkan faktur pajak?",
            "options": ["PKP", "PKP", "Non-PKP", "DJP", "Bank"],
            "answer": "A"
        }])
        .to_string();
        let err = parse_quiz_items(&raw, &schema()).unwrap_err();
        assert!(matches!(err, ModelOutputError::InvalidItems(_)));
    }

    #[test]
    fn quiz_item_serializes_in_wire_shape() {
        let item: QuizItem = serde_json::from_value(item_json("A")).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, item_json("A"));
    }
}
