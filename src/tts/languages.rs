//! Languages accepted by the translate speech endpoint.
//!
//! [`LANGUAGES`] is a static registry; [`find_language`] looks a code up
//! case-insensitively (`"pt-br"` finds `"pt-BR"`).

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// One supported language code.
#[derive(Debug)]
pub struct Language {
    /// Code sent as the `tl` query parameter.
    pub code: &'static str,
    /// Human-readable name.
    pub name: &'static str,
}

macro_rules! languages {
    ($($code:literal => $name:literal),* $(,)?) => {
        &[$(Language { code: $code, name: $name }),*]
    };
}

/// Every language code the endpoint speaks.
pub const LANGUAGES: &[Language] = languages![
    "af" => "Afrikaans",
    "ar" => "Arabic",
    "bg" => "Bulgarian",
    "bn" => "Bengali",
    "bs" => "Bosnian",
    "ca" => "Catalan",
    "cs" => "Czech",
    "cy" => "Welsh",
    "da" => "Danish",
    "de" => "German",
    "el" => "Greek",
    "en" => "English",
    "eo" => "Esperanto",
    "es" => "Spanish",
    "et" => "Estonian",
    "eu" => "Basque",
    "fi" => "Finnish",
    "fr" => "French",
    "fr-CA" => "French (Canada)",
    "gl" => "Galician",
    "gu" => "Gujarati",
    "ha" => "Hausa",
    "hi" => "Hindi",
    "hr" => "Croatian",
    "hu" => "Hungarian",
    "id" => "Indonesian",
    "is" => "Icelandic",
    "it" => "Italian",
    "iw" => "Hebrew",
    "ja" => "Japanese",
    "jw" => "Javanese",
    "km" => "Khmer",
    "kn" => "Kannada",
    "ko" => "Korean",
    "la" => "Latin",
    "lt" => "Lithuanian",
    "lv" => "Latvian",
    "ml" => "Malayalam",
    "mr" => "Marathi",
    "ms" => "Malay",
    "my" => "Myanmar (Burmese)",
    "ne" => "Nepali",
    "nl" => "Dutch",
    "no" => "Norwegian",
    "pa" => "Punjabi (Gurmukhi)",
    "pl" => "Polish",
    "pt" => "Portuguese (Brazil)",
    "pt-PT" => "Portuguese (Portugal)",
    "ro" => "Romanian",
    "ru" => "Russian",
    "si" => "Sinhala",
    "sk" => "Slovak",
    "sq" => "Albanian",
    "sr" => "Serbian",
    "su" => "Sundanese",
    "sv" => "Swedish",
    "sw" => "Swahili",
    "ta" => "Tamil",
    "te" => "Telugu",
    "th" => "Thai",
    "tl" => "Filipino",
    "tr" => "Turkish",
    "uk" => "Ukrainian",
    "ur" => "Urdu",
    "vi" => "Vietnamese",
    "yue" => "Cantonese",
    "zh-CN" => "Chinese (Simplified)",
    "zh-TW" => "Chinese (Traditional)",
    "zh" => "Chinese (Mandarin)",
];

/// Look up a language by code, ignoring ASCII case.
pub fn find_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}
