//! HTML allow-list validation for comment content.

use std::collections::HashSet;

use regex::Regex;

use threadhub_core::config::CommentsConfig;
use threadhub_core::error::AppError;

/// Accepts comment content containing only a small set of inline tags.
///
/// Rules:
/// - content is trimmed and must be non-empty and at most
///   `max_content_length` characters;
/// - only allowed tags may appear;
/// - `<a>` may carry `href` and `title` attributes in double quotes, every
///   other tag carries none;
/// - tags nest and close properly, and a bare `<` or `&` outside a tag or
///   entity is rejected.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    allowed_tags: HashSet<String>,
    max_length: usize,
    tag_pattern: Regex,
    anchor_attr_pattern: Regex,
    entity_pattern: Regex,
}

impl ContentValidator {
    /// Build a validator from the comment limits.
    pub fn new(config: &CommentsConfig) -> Result<Self, AppError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                AppError::configuration(format!("Invalid content pattern {pattern}: {e}"))
            })
        };

        Ok(Self {
            allowed_tags: config
                .allowed_tags
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            max_length: config.max_content_length,
            tag_pattern: compile(r"<(/?)(\w+)([^<>]*)>")?,
            anchor_attr_pattern: compile(r#"\s+(href|title)="[^"<>]*""#)?,
            entity_pattern: compile(r"&(#[0-9]+|#x[0-9a-fA-F]+|[a-zA-Z]+);")?,
        })
    }

    /// Validate `raw` and return the trimmed content.
    pub fn validate(&self, raw: &str) -> Result<String, AppError> {
        let content = raw.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment content cannot be empty"));
        }

        let length = content.chars().count();
        if length > self.max_length {
            return Err(AppError::validation(format!(
                "Comment content is {length} characters, the limit is {}",
                self.max_length
            )));
        }

        self.validate_markup(content)?;
        Ok(content.to_string())
    }

    fn validate_markup(&self, content: &str) -> Result<(), AppError> {
        let mut open: Vec<String> = Vec::new();
        let mut last_end = 0;

        for caps in self.tag_pattern.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            self.validate_text(&content[last_end..whole.start()])?;
            last_end = whole.end();

            let tag = name.as_str().to_ascii_lowercase();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let attrs = caps.get(3).map_or("", |m| m.as_str());

            if !self.allowed_tags.contains(&tag) {
                return Err(AppError::validation(format!(
                    "Tag <{tag}> is not allowed; allowed tags: {}",
                    self.allowed_list()
                )));
            }

            if closing {
                if !attrs.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "Closing tag </{tag}> must not carry attributes"
                    )));
                }
                match open.pop() {
                    Some(expected) if expected == tag => {}
                    Some(expected) => {
                        return Err(AppError::validation(format!(
                            "Tag </{tag}> closes <{expected}>"
                        )));
                    }
                    None => {
                        return Err(AppError::validation(format!(
                            "Tag </{tag}> has no opening tag"
                        )));
                    }
                }
            } else {
                if tag == "a" {
                    if !self.anchor_attr_pattern.replace_all(attrs, "").trim().is_empty() {
                        return Err(AppError::validation(
                            "Tag <a> may only carry double-quoted href and title attributes",
                        ));
                    }
                } else if !attrs.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "Tag <{tag}> must not carry attributes"
                    )));
                }
                open.push(tag);
            }
        }

        self.validate_text(&content[last_end..])?;

        match open.pop() {
            Some(tag) => Err(AppError::validation(format!("Tag <{tag}> is never closed"))),
            None => Ok(()),
        }
    }

    /// Text between tags: no stray `<`, and every `&` starts an entity.
    fn validate_text(&self, text: &str) -> Result<(), AppError> {
        if text.contains('<') {
            return Err(AppError::validation("Content contains a malformed tag"));
        }
        let stripped = self.entity_pattern.replace_all(text, "");
        if stripped.contains('&') {
            return Err(AppError::validation(
                "Content contains an unescaped '&'; use &amp;",
            ));
        }
        Ok(())
    }

    fn allowed_list(&self) -> String {
        let mut tags: Vec<&str> = self.allowed_tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags.join(", ")
    }
}
