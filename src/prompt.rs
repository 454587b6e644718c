//! Instruction templates appended to the source text before completion.
//!
//! Templates live in a table keyed by [`Language`]; adding a language means
//! adding a variant and a row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "English", alias = "english")]
    English,
    #[serde(rename = "ja", alias = "Japanese", alias = "japanese")]
    Japanese,
}

const INSTRUCTIONS: &[(Language, &str)] = &[
    (
        Language::English,
        "Write a product concept in under 100 words, with no section titles or symbols; \
         taking into account the product or service name, company name, the product or \
         service use case, the specific need/s it meets, what is new about this product, \
         who produced it and their history and right to make such a product, competitive \
         differentiation, the core promise to the consumer and information that can help \
         me believe this promise.",
    ),
    (
        Language::Japanese,
        "セクションタイトルや記号を使わずに、\
         日本語で200文字以内の製品コンセプトを書いてください。\
         製品またはサービスの名前、会社名、\
         製品またはサービスの用途、それが満たす具体的なニーズ、\
         この製品の新しい点、製造者とその歴史およびこの製品を作る資格、\
         競合との差別化、消費者への中核的な約束、\
         そしてその約束を信じる助けとなる情報を考慮してください。",
    ),
];

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Japanese];

    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Japanese => "ja",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Japanese => "Japanese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.tag().eq_ignore_ascii_case(wanted) || lang.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("Unsupported language '{}'", wanted))
    }
}

pub fn instruction_for(language: Language) -> &'static str {
    INSTRUCTIONS
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, text)| *text)
        .unwrap_or(INSTRUCTIONS[0].1)
}

/// Source text followed by the language's instruction.
pub fn build_prompt(content: &str, language: Language) -> String {
    let instruction = instruction_for(language);
    let mut result = String::with_capacity(content.len() + instruction.len() + 2);
    result.push_str(content);
    result.push_str("\n\n");
    result.push_str(instruction);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_an_instruction() {
        for lang in Language::ALL {
            assert!(INSTRUCTIONS.iter().any(|(l, _)| *l == lang), "{lang} missing");
        }
    }

    #[test]
    fn japanese_changes_template_not_content() {
        let text = "Acme Widget is a widget.";
        let en = build_prompt(text, Language::English);
        let ja = build_prompt(text, Language::Japanese);

        assert_ne!(en, ja);
        assert!(en.starts_with(text));
        assert!(ja.starts_with(text));
        assert!(ja.ends_with(instruction_for(Language::Japanese)));
    }

    #[test]
    fn parses_tags_and_labels() {
        assert_eq!("ja".parse::<Language>(), Ok(Language::Japanese));
        assert_eq!("English".parse::<Language>(), Ok(Language::English));
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn serde_uses_tags() {
        assert_eq!(serde_json::to_string(&Language::Japanese).unwrap(), "\"ja\"");
        let lang: Language = serde_json::from_str("\"Japanese\"").unwrap();
        assert_eq!(lang, Language::Japanese);
    }
}
