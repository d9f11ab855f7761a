/// Localization
///
/// The request language is parsed from `Accept-Language` and held in a
/// task-local for the duration of the request, so any code running on the
/// request's task can render messages with [`Message::localized`].
///
/// # Example
///
/// ```
/// use groundwork_shared::locale::{self, Language, Message};
///
/// # async fn example() {
/// let text = locale::scope(Language::PtBr, async {
///     Message::UserNotFound.localized()
/// })
/// .await;
///
/// assert_eq!(text, "Usuário não encontrado.");
/// # }
/// ```

pub mod messages;

pub use messages::Message;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

tokio::task_local! {
    static CURRENT_LANGUAGE: Language;
}

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    EnUs,
    PtBr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::EnUs, Language::PtBr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::EnUs => "en_us",
            Language::PtBr => "pt_br",
        }
    }

    /// Picks the language from an `Accept-Language` header value
    ///
    /// Only the first entry counts. Unsupported or missing values fall back
    /// to the default.
    pub fn from_accept_language(header: Option<&str>) -> Self {
        header
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.split(';').next())
            .and_then(|tag| tag.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "en_us" => Ok(Language::EnUs),
            "pt_br" => Ok(Language::PtBr),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Runs `fut` with `language` as the current language
pub async fn scope<F: Future>(language: Language, fut: F) -> F::Output {
    CURRENT_LANGUAGE.scope(language, fut).await
}

/// The language of the current request, or the default outside one
pub fn current() -> Language {
    CURRENT_LANGUAGE.try_with(|language| *language).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("en_US".parse::<Language>(), Ok(Language::EnUs));
        assert_eq!("pt-BR".parse::<Language>(), Ok(Language::PtBr));
        assert!("fr_FR".parse::<Language>().is_err());
    }

    #[test]
    fn test_from_accept_language() {
        assert_eq!(Language::from_accept_language(None), Language::EnUs);
        assert_eq!(Language::from_accept_language(Some("pt-BR")), Language::PtBr);
        assert_eq!(
            Language::from_accept_language(Some("pt-BR;q=0.9, en-US;q=0.8")),
            Language::PtBr
        );
        assert_eq!(
            Language::from_accept_language(Some("fr-FR, pt-BR")),
            Language::EnUs
        );
        assert_eq!(Language::from_accept_language(Some("")), Language::EnUs);
    }

    #[tokio::test]
    async fn test_scope_sets_current_language() {
        assert_eq!(current(), Language::EnUs);

        let inside = scope(Language::PtBr, async { current() }).await;
        assert_eq!(inside, Language::PtBr);

        assert_eq!(current(), Language::EnUs);
    }

    #[tokio::test]
    async fn test_scopes_are_per_task() {
        let pt = tokio::spawn(scope(Language::PtBr, async {
            tokio::task::yield_now().await;
            current()
        }));
        let en = tokio::spawn(scope(Language::EnUs, async {
            tokio::task::yield_now().await;
            current()
        }));

        assert_eq!(pt.await.unwrap(), Language::PtBr);
        assert_eq!(en.await.unwrap(), Language::EnUs);
    }
}
