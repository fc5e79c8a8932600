//! Editable book fields and their validation rules.

use crate::domain::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const GENRE_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// The fields a caller may set when creating or replacing a book.
///
/// Rating aggregates, favorites and cart membership are never part of a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    pub image_url: String,
}

impl BookDraft {
    /// Trim fields and check length limits. Blank descriptions become `None`.
    pub fn normalize(self) -> Result<Self, DomainError> {
        let title = required("title", &self.title, TITLE_MAX_CHARS)?;
        let author = required("author", &self.author, AUTHOR_MAX_CHARS)?;
        let genre = required("genre", &self.genre, GENRE_MAX_CHARS)?;

        let description = match self.description {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.chars().count() > DESCRIPTION_MAX_CHARS {
                    return Err(DomainError::validation(format!(
                        "description must be at most {DESCRIPTION_MAX_CHARS} characters"
                    )));
                }
                Some(trimmed)
            }
            None => None,
        };

        let image_url = self.image_url.trim().to_string();
        if image_url.is_empty() {
            return Err(DomainError::validation("image_url must not be empty"));
        }

        Ok(Self {
            title,
            author,
            genre,
            description,
            image_url,
        })
    }
}

fn required(field: &'static str, value: &str, max_chars: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// User ids are opaque, but must be present.
pub fn validate_user_id(user_id: &str) -> Result<&str, DomainError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("user_id must not be empty"));
    }
    Ok(trimmed)
}
