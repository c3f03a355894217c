//! Translator skill: phrase-dictionary translation plus word-list language
//! detection
//!
//! The dictionary maps lowercase English phrases to French, Spanish, German,
//! and Dutch. A reverse dictionary derived from it handles translation back
//! to English; anything else pivots through English after detecting the
//! source language. Unknown phrases come back as bracketed diagnostics in
//! the translation field rather than as request errors.

use crate::workers::harness::{AgentSkill, SkillError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Supported languages in detection priority order; score ties keep the
/// earlier entry
const LANGUAGES: [(&str, &str); 5] = [
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("nl", "Dutch"),
    ("en", "English"),
];

/// English phrase (lowercase) and its fr, es, de, nl renderings
const PHRASES: [(&str, &str, &str, &str, &str); 25] = [
    ("hello", "Bonjour", "Hola", "Hallo", "Hallo"),
    (
        "hello, how are you?",
        "Bonjour, comment allez-vous ?",
        "¡Hola, ¿cómo estás?",
        "Hallo, wie geht es Ihnen?",
        "Hallo, hoe gaat het?",
    ),
    ("good morning", "Bonjour", "Buenos días", "Guten Morgen", "Goedemorgen"),
    ("good evening", "Bonsoir", "Buenas noches", "Guten Abend", "Goedenavond"),
    ("good night", "Bonne nuit", "Buenas noches", "Gute Nacht", "Goedenacht"),
    ("thank you", "Merci", "Gracias", "Danke", "Dank je"),
    (
        "thank you very much",
        "Merci beaucoup",
        "Muchas gracias",
        "Vielen Dank",
        "Heel erg bedankt",
    ),
    ("you're welcome", "De rien", "De nada", "Bitte", "Graag gedaan"),
    ("please", "S'il vous plaît", "Por favor", "Bitte", "Alsjeblieft"),
    ("yes", "Oui", "Sí", "Ja", "Ja"),
    ("no", "Non", "No", "Nein", "Nee"),
    ("goodbye", "Au revoir", "Adiós", "Auf Wiedersehen", "Tot ziens"),
    (
        "how are you?",
        "Comment allez-vous ?",
        "¿Cómo estás?",
        "Wie geht es Ihnen?",
        "Hoe gaat het?",
    ),
    ("i love you", "Je t'aime", "Te quiero", "Ich liebe dich", "Ik hou van je"),
    (
        "where is the bathroom?",
        "Où sont les toilettes ?",
        "¿Dónde está el baño?",
        "Wo ist die Toilette?",
        "Waar is de badkamer?",
    ),
    (
        "i need help",
        "J'ai besoin d'aide",
        "Necesito ayuda",
        "Ich brauche Hilfe",
        "Ik heb hulp nodig",
    ),
    (
        "what is your name?",
        "Comment vous appelez-vous ?",
        "¿Cómo te llamas?",
        "Wie heißen Sie?",
        "Hoe heet je?",
    ),
    ("my name is", "Je m'appelle", "Me llamo", "Ich heiße", "Mijn naam is"),
    (
        "i don't understand",
        "Je ne comprends pas",
        "No entiendo",
        "Ich verstehe nicht",
        "Ik begrijp het niet",
    ),
    (
        "speak slowly please",
        "Parlez lentement s'il vous plaît",
        "Hable despacio por favor",
        "Sprechen Sie bitte langsam",
        "Spreek alstublieft langzaam",
    ),
    (
        "how much does this cost?",
        "Combien ça coûte ?",
        "¿Cuánto cuesta esto?",
        "Wie viel kostet das?",
        "Hoeveel kost dit?",
    ),
    ("i am hungry", "J'ai faim", "Tengo hambre", "Ich habe Hunger", "Ik heb honger"),
    ("i am tired", "Je suis fatigué", "Estoy cansado", "Ich bin müde", "Ik ben moe"),
    (
        "the weather is nice today",
        "Il fait beau aujourd'hui",
        "El tiempo está agradable hoy",
        "Das Wetter ist heute schön",
        "Het weer is mooi vandaag",
    ),
    (
        "artificial intelligence",
        "Intelligence artificielle",
        "Inteligencia artificial",
        "Künstliche Intelligenz",
        "Kunstmatige intelligentie",
    ),
];

const FRENCH_WORDS: [&str; 24] = [
    "le", "la", "les", "de", "du", "un", "une", "est", "sont", "avec", "pour", "dans", "sur",
    "bonjour", "merci", "oui", "non", "vous", "nous", "je", "il", "elle", "comment", "allez",
];

const SPANISH_WORDS: [&str; 24] = [
    "el", "la", "los", "las", "de", "del", "un", "una", "es", "son", "con", "para", "en", "hola",
    "gracias", "sí", "no", "usted", "nosotros", "yo", "él", "ella", "cómo", "está",
];

const GERMAN_WORDS: [&str; 24] = [
    "der", "die", "das", "ein", "eine", "ist", "sind", "mit", "für", "in", "auf", "hallo",
    "danke", "ja", "nein", "sie", "wir", "ich", "er", "wie", "geht", "bitte", "und", "nicht",
];

const DUTCH_WORDS: [&str; 23] = [
    "de", "het", "een", "is", "zijn", "met", "voor", "in", "op", "hallo", "dank", "ja", "nee",
    "u", "wij", "ik", "hij", "zij", "hoe", "gaat", "alsjeblieft", "en", "niet",
];

const ENGLISH_WORDS: [&str; 24] = [
    "the", "a", "an", "is", "are", "with", "for", "in", "on", "hello", "thank", "yes", "no",
    "you", "we", "i", "he", "she", "how", "please", "and", "not", "this", "that",
];

/// English phrase → per-language translations
static DICTIONARY: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        PHRASES
            .iter()
            .map(|(en, fr, es, de, nl)| {
                let translations =
                    HashMap::from([("fr", *fr), ("es", *es), ("de", *de), ("nl", *nl)]);
                (*en, translations)
            })
            .collect()
    });

/// Language code → lowercased translation → capitalized English phrase.
/// Built in phrase-table order so later entries win duplicate renderings.
static REVERSE_DICTIONARY: Lazy<HashMap<&'static str, HashMap<String, String>>> =
    Lazy::new(|| {
        let mut reverse: HashMap<&'static str, HashMap<String, String>> = HashMap::new();
        for (en, fr, es, de, nl) in PHRASES.iter() {
            for (lang, phrase) in [("fr", fr), ("es", es), ("de", de), ("nl", nl)] {
                reverse
                    .entry(lang)
                    .or_default()
                    .insert(phrase.to_lowercase(), capitalize(en));
            }
        }
        reverse
    });

static NON_WORD_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-záéíóúàèìòùäöüñ]").unwrap());

fn capitalize(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn pattern_words(code: &str) -> &'static [&'static str] {
    match code {
        "fr" => &FRENCH_WORDS,
        "es" => &SPANISH_WORDS,
        "de" => &GERMAN_WORDS,
        "nl" => &DUTCH_WORDS,
        _ => &ENGLISH_WORDS,
    }
}

fn language_code(target: &str) -> Option<&'static str> {
    match target.trim().to_lowercase().as_str() {
        "french" | "fr" => Some("fr"),
        "spanish" | "es" => Some("es"),
        "german" | "de" => Some("de"),
        "dutch" | "nl" => Some("nl"),
        "english" | "en" => Some("en"),
        _ => None,
    }
}

struct Detection {
    language: &'static str,
    code: &'static str,
    confidence: &'static str,
}

/// Score the text against each language's common-word list and report the
/// best match with a coarse confidence grade
fn detect(text: &str) -> Detection {
    let words: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(|word| NON_WORD_CHARS.replace_all(word, "").to_string())
        .collect();

    let scores: Vec<(&str, &str, usize)> = LANGUAGES
        .iter()
        .map(|(code, name)| {
            let word_list = pattern_words(code);
            let score = words
                .iter()
                .filter(|word| word_list.contains(&word.as_str()))
                .count();
            (*code, *name, score)
        })
        .collect();

    let total: usize = scores.iter().map(|(_, _, score)| score).sum();
    let mut best = scores[0];
    for entry in &scores[1..] {
        if entry.2 > best.2 {
            best = *entry;
        }
    }

    let confidence = if total == 0 {
        "low"
    } else {
        let share = best.2 as f64 / total as f64;
        if share > 0.6 {
            "high"
        } else if share > 0.3 {
            "medium"
        } else {
            "low"
        }
    };

    Detection {
        language: best.1,
        code: best.0,
        confidence,
    }
}

fn translate_phrase(text: &str, target_language: &str) -> String {
    let target_code = match language_code(target_language) {
        Some(code) => code,
        None => {
            return format!(
                "[Unsupported target language: \"{target_language}\". Supported: English, French, Spanish, German, Dutch]"
            )
        }
    };

    let key = text.trim().to_lowercase();

    // Direct lookup, English to target
    if target_code != "en" {
        if let Some(translations) = DICTIONARY.get(key.as_str()) {
            return match translations.get(target_code) {
                Some(phrase) => (*phrase).to_string(),
                None => format!("[No translation available for \"{text}\" → {target_language}]"),
            };
        }
    }

    // Reverse lookup, any supported language back to English
    if target_code == "en" {
        for phrases in REVERSE_DICTIONARY.values() {
            if let Some(english) = phrases.get(&key) {
                return english.clone();
            }
        }
    }

    // Cross-language: detect the source, pivot through English
    let detected = detect(text);
    if detected.code != "en" {
        if let Some(english) = REVERSE_DICTIONARY
            .get(detected.code)
            .and_then(|phrases| phrases.get(&key))
        {
            if let Some(phrase) = DICTIONARY
                .get(english.to_lowercase().as_str())
                .and_then(|translations| translations.get(target_code))
            {
                return (*phrase).to_string();
            }
            return format!("[No translation available for \"{text}\" → {target_language}]");
        }
    }

    format!(
        "[No translation found for \"{text}\" → {target_language}. Try a common phrase like \"hello\", \"thank you\", or \"good morning\".]"
    )
}

/// Translates common phrases and detects languages
pub struct TranslatorSkill;

impl AgentSkill for TranslatorSkill {
    fn name(&self) -> &str {
        "TranslatorAgent"
    }

    fn role(&self) -> &str {
        "Language Translator"
    }

    fn description(&self) -> &str {
        "Translates text between languages and detects the language of a given text."
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["translate_text".to_string(), "detect_language".to_string()]
    }

    fn execute(&self, capability: &str, payload: &Value) -> Result<Value, SkillError> {
        match capability {
            "translate_text" => {
                let text = payload.get("text").and_then(Value::as_str).unwrap_or_default();
                let target = payload
                    .get("targetLanguage")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if text.is_empty() || target.is_empty() {
                    return Err(SkillError::InvalidPayload(
                        "translate_text requires { text, targetLanguage }".to_string(),
                    ));
                }

                let detected = detect(text);
                Ok(json!({
                    "original": text,
                    "translation": translate_phrase(text, target),
                    "targetLanguage": target,
                    "detectedSourceLanguage": detected.language,
                }))
            }
            "detect_language" => {
                let text = payload.get("text").and_then(Value::as_str).unwrap_or_default();
                if text.is_empty() {
                    return Err(SkillError::InvalidPayload(
                        "detect_language requires { text }".to_string(),
                    ));
                }

                let detection = detect(text);
                Ok(json!({
                    "language": detection.language,
                    "code": detection.code,
                    "confidence": detection.confidence,
                }))
            }
            other => Err(SkillError::UnsupportedCapability(other.to_string())),
        }
    }
}
