//! Language detection via script analysis and stop-word frequency.
//!
//! Two stages:
//!
//! 1. **Script analysis**: Unicode block counts identify languages with a
//!    dedicated script (Cyrillic, Arabic, Greek, Hebrew, Devanagari, Thai,
//!    Hangul, Kana, Han).
//! 2. **Latin disambiguation**: stop-word hits plus diacritics choose among
//!    English, French, Spanish, German, Italian and Portuguese.

use super::{Detection, LanguageDetector, LanguageTag};

/// Stop words that are frequent in one language and rare in the others
const LATIN_MARKERS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "the", "is", "are", "was", "were", "with", "from", "this", "that", "and", "for",
            "not", "have", "has", "had", "will", "would", "it", "they", "which", "of", "to",
        ],
    ),
    (
        "fr",
        &[
            "le", "les", "des", "est", "dans", "avec", "une", "sur", "pour", "pas", "qui", "sont",
            "ont", "mais", "cette", "ces", "nous", "vous", "du", "au", "et",
        ],
    ),
    (
        "es",
        &[
            "el", "los", "las", "está", "pero", "también", "como", "más", "hay", "muy", "del",
            "y", "es", "sus", "fue", "entre", "cuando",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "das", "und", "ist", "nicht", "mit", "sich", "auf", "für", "den", "dem",
            "ein", "eine", "auch", "von", "zu", "wird", "sind",
        ],
    ),
    (
        "it",
        &[
            "il", "lo", "gli", "della", "che", "non", "sono", "è", "anche", "nel", "alla",
            "questo", "delle", "degli", "ha",
        ],
    ),
    (
        "pt",
        &[
            "os", "não", "uma", "com", "são", "em", "um", "mais", "dos", "das", "ao", "foi",
            "pela", "pelo", "muito",
        ],
    ),
];

/// Diacritics that point towards one Latin-script language
const LATIN_DIACRITICS: &[(&str, &[char])] = &[
    ("fr", &['è', 'ê', 'ë', 'à', 'ù', 'î', 'ô', 'œ']),
    ("es", &['ñ', '¿', '¡']),
    ("de", &['ß', 'ä', 'ö']),
    ("pt", &['ã', 'õ']),
];

/// Script-based detector
#[derive(Debug, Clone)]
pub struct ScriptDetector {
    /// Texts with fewer letters than this are unknown
    pub min_letters: usize,
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self { min_letters: 3 }
    }
}

#[derive(Default)]
struct ScriptCounts {
    latin: usize,
    cyrillic: usize,
    arabic: usize,
    greek: usize,
    hebrew: usize,
    devanagari: usize,
    thai: usize,
    hangul: usize,
    kana: usize,
    han: usize,
    letters: usize,
}

impl ScriptCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            counts.letters += 1;
            match c {
                '\u{0041}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}' => counts.latin += 1,
                '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}' => counts.greek += 1,
                '\u{0400}'..='\u{052F}' | '\u{2DE0}'..='\u{2DFF}' | '\u{A640}'..='\u{A69F}' => {
                    counts.cyrillic += 1
                }
                '\u{0590}'..='\u{05FF}' => counts.hebrew += 1,
                '\u{0600}'..='\u{06FF}'
                | '\u{0750}'..='\u{077F}'
                | '\u{08A0}'..='\u{08FF}'
                | '\u{FB50}'..='\u{FDFF}'
                | '\u{FE70}'..='\u{FEFF}' => counts.arabic += 1,
                '\u{0900}'..='\u{097F}' => counts.devanagari += 1,
                '\u{0E00}'..='\u{0E7F}' => counts.thai += 1,
                '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' | '\u{AC00}'..='\u{D7AF}' => {
                    counts.hangul += 1
                }
                '\u{3040}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => counts.kana += 1,
                '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' => counts.han += 1,
                _ => {}
            }
        }
        counts
    }

    fn ratio(&self, count: usize) -> f32 {
        count as f32 / self.letters.max(1) as f32
    }
}

fn detection(code: &str, confidence: f32) -> Detection {
    Detection {
        language: LanguageTag::new(code),
        confidence: confidence.clamp(0.0, 0.95),
    }
}

impl ScriptDetector {
    pub fn new(min_letters: usize) -> Self {
        Self { min_letters }
    }

    fn detect_script(&self, counts: &ScriptCounts) -> Option<Detection> {
        // Japanese mixes kana with Han; kana alone is enough to tell it from Chinese
        let cjk = counts.kana + counts.han;
        if counts.ratio(cjk) > 0.5 {
            let kana_share = counts.kana as f32 / cjk as f32;
            let code = if kana_share > 0.1 { "ja" } else { "zh" };
            return Some(detection(code, 0.70 + counts.ratio(cjk) * 0.25));
        }

        let scripts = [
            ("ru", counts.cyrillic),
            ("ar", counts.arabic),
            ("el", counts.greek),
            ("he", counts.hebrew),
            ("hi", counts.devanagari),
            ("th", counts.thai),
            ("ko", counts.hangul),
        ];

        scripts
            .iter()
            .find(|(_, count)| counts.ratio(*count) > 0.5)
            .map(|(code, count)| detection(code, 0.70 + counts.ratio(*count) * 0.25))
    }

    fn detect_latin(&self, text: &str) -> Detection {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();

        let mut scores: Vec<(&str, f32)> = LATIN_MARKERS
            .iter()
            .map(|(code, markers)| {
                let hits = words.iter().filter(|w| markers.contains(*w)).count();
                (*code, hits as f32)
            })
            .collect();

        for (code, marks) in LATIN_DIACRITICS {
            if lower.chars().any(|c| marks.contains(&c)) {
                if let Some(entry) = scores.iter_mut().find(|entry| entry.0 == *code) {
                    entry.1 += 2.0;
                }
            }
        }

        // First listed language wins exact ties
        let (best_code, best) = scores
            .iter()
            .fold(("", 0.0f32), |acc, &(code, score)| if score > acc.1 { (code, score) } else { acc });

        if best <= 0.0 {
            return Detection::unknown();
        }

        let runner_up = scores
            .iter()
            .filter(|(code, _)| *code != best_code)
            .map(|(_, score)| *score)
            .fold(0.0f32, f32::max);

        let word_count = words.len().max(1) as f32;
        let margin = (best - runner_up) / word_count;
        detection(best_code, 0.50 + margin.min(0.35))
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect_with_confidence(&self, text: &str) -> Detection {
        let counts = ScriptCounts::of(text);
        if counts.letters < self.min_letters {
            return Detection::unknown();
        }

        if let Some(found) = self.detect_script(&counts) {
            return found;
        }

        if counts.ratio(counts.latin) > 0.5 {
            return self.detect_latin(text);
        }

        Detection::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> String {
        ScriptDetector::default().detect(text).to_string()
    }

    #[test]
    fn test_latin_languages() {
        assert_eq!(tag("The committee was not able to agree on the budget for this year."), "en");
        assert_eq!(tag("Le chien est dans le jardin avec les enfants et ils sont contents."), "fr");
        assert_eq!(tag("El perro está en el jardín y los niños también juegan muy felices."), "es");
        assert_eq!(tag("Der Hund ist nicht im Garten und die Kinder sind auch zu Hause."), "de");
        assert_eq!(tag("Il gatto non è nel giardino e anche questo libro è della scuola."), "it");
        assert_eq!(tag("Os alunos não foram à escola com os pais em uma manhã muito fria."), "pt");
    }

    #[test]
    fn test_script_languages() {
        assert_eq!(tag("Собака является млекопитающим"), "ru");
        assert_eq!(tag("القطة حيوان أليف"), "ar");
        assert_eq!(tag("Ο σκύλος είναι θηλαστικό"), "el");
        assert_eq!(tag("猫是一种常见的宠物动物"), "zh");
        assert_eq!(tag("猫はとてもかわいい動物です"), "ja");
        assert_eq!(tag("고양이는 귀여운 동물입니다"), "ko");
        assert_eq!(tag("कुत्ता एक पालतू जानवर है"), "hi");
    }

    #[test]
    fn test_unknown_inputs() {
        let detector = ScriptDetector::default();
        assert_eq!(detector.detect(""), LanguageTag::Unknown);
        assert_eq!(detector.detect("   \n "), LanguageTag::Unknown);
        assert_eq!(detector.detect("12345 67.89 %%"), LanguageTag::Unknown);
        assert_eq!(detector.detect("xqzt vbnm plkj"), LanguageTag::Unknown);
        assert_eq!(detector.detect_with_confidence("").confidence, 0.0);
    }

    #[test]
    fn test_confidence_bounds() {
        let detector = ScriptDetector::default();
        for text in ["the and of to", "Собака", "猫はかわいい", "le les des"] {
            let detection = detector.detect_with_confidence(text);
            assert!(detection.language.is_known(), "{text}");
            assert!((0.0..=0.95).contains(&detection.confidence));
        }
    }
}
