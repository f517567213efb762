use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::{
    acu::parse_with_config,
    domain::{Config, ParsedDocument},
};

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    /// Whether the document parsed.
    pub valid: bool,
    /// Description of the error, for an invalid document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Advisories for a valid document, such as line items outside of any
    /// title.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Validation {
    fn valid(document: &ParsedDocument) -> Self {
        let warnings = document
            .untitled_line_items()
            .map(|item| {
                format!(
                    "line item {} ('{}') is not under any title",
                    item.code, item.description
                )
            })
            .collect();
        Self {
            valid: true,
            message: None,
            warnings,
        }
    }

    fn invalid(message: String) -> Self {
        Self {
            valid: false,
            message: Some(message),
            warnings: Vec::new(),
        }
    }
}

/// Checks that ACU text parses, without assembling or costing it.
#[must_use]
pub fn validate(source: &str, config: &Config) -> Validation {
    match parse_with_config(source, config) {
        Ok(document) => Validation::valid(&document),
        Err(error) => Validation::invalid(error.to_string()),
    }
}

/// A named document to validate.
#[derive(Debug, Clone)]
pub struct Source {
    /// Where the text came from.
    pub path: PathBuf,
    /// The ACU text, or the error raised while reading it.
    pub text: Result<String, String>,
}

/// Validates independent documents in parallel.
///
/// Results are returned in the order of `sources`.
#[instrument(level = "debug", skip_all, fields(documents = sources.len()))]
pub fn validate_many(sources: &[Source], config: &Config) -> Vec<(PathBuf, Validation)> {
    sources
        .par_iter()
        .map(|source| {
            let validation = match &source.text {
                Ok(text) => validate(text, config),
                Err(error) => Validation::invalid(error.clone()),
            };
            (source.path.clone(), validation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_document() {
        let validation = validate(
            "@budget{P1, name = \"x\"}\n@title{1, name = \"A\"}",
            &Config::default(),
        );
        assert_eq!(
            validation,
            Validation {
                valid: true,
                message: None,
                warnings: Vec::new(),
            }
        );
    }

    #[test]
    fn untitled_items_are_warnings() {
        let validation = validate(
            "@budget{P1, name = \"x\"}\n@lineitem{description = \"loose\", unit = u}",
            &Config::default(),
        );
        assert!(validation.valid);
        assert_eq!(
            validation.warnings,
            ["line item 01 ('loose') is not under any title"]
        );
    }

    #[test]
    fn invalid_document() {
        let validation = validate("@budget{P1, name = \"x\"", &Config::default());
        assert!(!validation.valid);
        assert_eq!(
            validation.message.as_deref(),
            Some("line 1: malformed block: @budget block is never closed")
        );
    }

    #[test]
    fn many_documents_keep_their_order() {
        let sources: Vec<Source> = (0..32)
            .map(|index| Source {
                path: PathBuf::from(format!("doc{index}.acu")),
                text: if index % 3 == 0 {
                    Ok(format!("@budget{{P{index}, name = \"x\"}}\n@title{{1, name = \"A\"}}"))
                } else if index % 3 == 1 {
                    Ok("@title{1}".to_string())
                } else {
                    Err("permission denied".to_string())
                },
            })
            .collect();

        let results = validate_many(&sources, &Config::default());

        assert_eq!(results.len(), sources.len());
        for (index, (path, validation)) in results.iter().enumerate() {
            assert_eq!(path, &sources[index].path);
            assert_eq!(validation.valid, index % 3 == 0, "{}", path.display());
        }
        assert_eq!(results[2].1.message.as_deref(), Some("permission denied"));
    }
}
