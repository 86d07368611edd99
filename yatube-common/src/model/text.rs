use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error as _, Unexpected},
};
use thiserror::Error;

/// Post or comment body. Never empty and never padded with surrounding whitespace.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct BodyText(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The text must not be empty")]
pub struct BlankTextError;

impl BodyText {
    pub fn new(text: &str) -> Result<Self, BlankTextError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(BlankTextError)
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    /// First `max_chars` characters, used for titles and short labels.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.0.char_indices().nth(max_chars) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for BodyText {
    type Error = BlankTextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !value.is_empty() && value.trim().len() == value.len() {
            Ok(Self(value))
        } else {
            Self::new(&value)
        }
    }
}

impl<'de> Deserialize<'de> for BodyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        BodyText::try_from(inner.clone())
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&inner), &"non-blank text"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::text::{BlankTextError, BodyText};

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(BodyText::new(""), Err(BlankTextError));
        assert_eq!(BodyText::new("  \n\t "), Err(BlankTextError));
    }

    #[test]
    fn text_is_trimmed() {
        let text = BodyText::new("  hello there \n").unwrap();
        assert_eq!(text.get(), "hello there");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = BodyText::new("Тестовый пост").unwrap();
        assert_eq!(text.preview(8), "Тестовый");
        assert_eq!(text.preview(100), "Тестовый пост");
    }
}
