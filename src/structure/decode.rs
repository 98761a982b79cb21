use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object or array found in response")]
    NotFound { raw: String },
    #[error("response JSON could not be decoded: {source}")]
    Invalid {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// The untouched response text, kept for diagnostics.
    pub fn raw(&self) -> &str {
        match self {
            Self::NotFound { raw } | Self::Invalid { raw, .. } => raw,
        }
    }
}

/// Locates the outermost JSON value inside free-form model output and
/// decodes it. Code fences and surrounding prose are ignored.
pub fn clean_and_parse_json(raw: &str) -> Result<Value, ParseError> {
    let cleaned = raw.replace("```json", "").replace("```JSON", "").replace("```", "");

    let start = match (cleaned.find('{'), cleaned.find('[')) {
        (Some(object), Some(array)) => object.min(array),
        (Some(object), None) => object,
        (None, Some(array)) => array,
        (None, None) => {
            return Err(ParseError::NotFound {
                raw: raw.to_owned(),
            });
        }
    };
    let end = match (cleaned.rfind('}'), cleaned.rfind(']')) {
        (Some(object), Some(array)) => object.max(array),
        (Some(end), None) | (None, Some(end)) => end,
        (None, None) => start,
    };
    if end <= start {
        return Err(ParseError::NotFound {
            raw: raw.to_owned(),
        });
    }

    serde_json::from_str(&cleaned[start..=end]).map_err(|source| ParseError::Invalid {
        raw: raw.to_owned(),
        source,
    })
}

pub fn parse_shape<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let value = clean_and_parse_json(raw)?;
    serde_json::from_value(value).map_err(|source| ParseError::Invalid {
        raw: raw.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_fences_and_prose() {
        let value = clean_and_parse_json("Sure! ```json\n{\"a\":1}\n``` thanks").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn missing_json_is_a_parse_error() {
        let error = clean_and_parse_json("no json here").unwrap_err();
        assert!(matches!(error, ParseError::NotFound { .. }));
        assert_eq!(error.raw(), "no json here");
    }

    #[test]
    fn array_before_object_starts_at_array() {
        let value = clean_and_parse_json("Here: [{\"name\":\"x\"}] done").unwrap();
        assert_eq!(value, json!([{"name": "x"}]));
    }

    #[test]
    fn invalid_json_keeps_raw_text() {
        let raw = "prefix {\"a\": } suffix";
        let error = clean_and_parse_json(raw).unwrap_err();
        assert!(matches!(error, ParseError::Invalid { .. }));
        assert_eq!(error.raw(), raw);
    }

    #[test]
    fn closing_before_opening_is_not_found() {
        assert!(matches!(
            clean_and_parse_json("} nothing {"),
            Err(ParseError::NotFound { .. })
        ));
    }
}
