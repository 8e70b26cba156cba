//! Language detection and bilingual text
//!
//! v2.1.0: Presence-based Arabic detection. One Arabic character anywhere in
//! the message flips the whole message to Arabic.
//! v2.3.0: `Bilingual` pair type. Text that reaches the user always comes
//! from a pair, and an empty side falls back to English.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Arabic, Arabic Supplement, Presentation Forms-A, Presentation Forms-B
const ARABIC_RANGES: [(u32, u32); 4] = [
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

/// Supported reply languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    #[default]
    En,
}

impl Language {
    /// Detect the language of free text
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_arabic_char) {
            Language::Ar
        } else {
            Language::En
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ar" | "arabic" => Some(Language::Ar),
            "en" | "english" => Some(Language::En),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_arabic_char(c: char) -> bool {
    let code = c as u32;
    ARABIC_RANGES
        .iter()
        .any(|&(start, end)| code >= start && code <= end)
}

/// A piece of text in both supported languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual<T = &'static str> {
    pub en: T,
    pub ar: T,
}

impl<T> Bilingual<T> {
    pub const fn new(en: T, ar: T) -> Self {
        Self { en, ar }
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Bilingual<U> {
        Bilingual {
            en: f(&self.en),
            ar: f(&self.ar),
        }
    }
}

impl<T: AsRef<str>> Bilingual<T> {
    /// Text for `lang`, or the English text when that side is empty
    pub fn get(&self, lang: Language) -> &str {
        let text = match lang {
            Language::Ar => self.ar.as_ref(),
            Language::En => self.en.as_ref(),
        };
        if text.trim().is_empty() {
            self.en.as_ref()
        } else {
            text
        }
    }
}
