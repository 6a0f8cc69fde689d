use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Namespace used when the input names no owner
pub const DEFAULT_NAMESPACE: &str = "library";

/// Tag used when the input names no tag
pub const DEFAULT_TAG: &str = "latest";

static VALID_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("static pattern compiles"));

const COMMAND_WORDS: [&str; 2] = ["pull", "run"];

/// A normalized `namespace/model:tag` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentifier {
    pub namespace: String,
    pub model: String,
    pub tag: String,
}

impl ModelIdentifier {
    /// Parse free-form user text
    ///
    /// Accepts `model`, `model:tag`, `ns/model`, `ns/model:tag`, optionally
    /// preceded by `ollama pull` or `ollama run`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let reference = strip_command_prefix(raw.trim())?;
        let (name, tag) = split_tag(reference)?;
        let (namespace, model) = split_namespace(name)?;

        validate_part(namespace, "Namespace")?;
        validate_part(model, "Model name")?;
        validate_part(tag, "Tag")?;

        Ok(Self {
            namespace: namespace.to_string(),
            model: model.to_string(),
            tag: tag.to_string(),
        })
    }

    /// `namespace/model`, the registry repository path
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace, self.model)
    }
}

impl FromStr for ModelIdentifier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.model, self.tag)
    }
}

fn strip_command_prefix(input: &str) -> Result<&str, ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut words = input.split_whitespace();
    let (Some("ollama"), Some(command)) = (words.next(), words.next()) else {
        return Ok(input);
    };
    if !COMMAND_WORDS.contains(&command) {
        return Ok(input);
    }

    // Slice past the command word rather than rejoining tokens
    let after_ollama = input["ollama".len()..].trim_start();
    let rest = after_ollama[command.len()..].trim();
    if rest.is_empty() {
        return Err(ValidationError::MissingAfterPrefix(format!("ollama {command}")));
    }
    Ok(rest)
}

fn split_tag(reference: &str) -> Result<(&str, &str), ValidationError> {
    let mut parts = reference.split(':');
    let name = parts.next().unwrap_or_default().trim();
    let tag = parts.next().map_or(DEFAULT_TAG, str::trim);
    if parts.next().is_some() {
        return Err(ValidationError::TagFormat);
    }
    Ok((name, tag))
}

fn split_namespace(name: &str) -> Result<(&str, &str), ValidationError> {
    match name.split_once('/') {
        None => Ok((DEFAULT_NAMESPACE, name)),
        Some((namespace, model)) => {
            if namespace.is_empty() || model.is_empty() || model.contains('/') {
                return Err(ValidationError::NamespaceFormat);
            }
            Ok((namespace, model))
        }
    }
}

fn validate_part(part: &str, label: &'static str) -> Result<(), ValidationError> {
    if part.is_empty() {
        return Err(ValidationError::EmptyPart(label));
    }
    if !VALID_PART.is_match(part) {
        return Err(ValidationError::InvalidChars(label));
    }
    Ok(())
}
