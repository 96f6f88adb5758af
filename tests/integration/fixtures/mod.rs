// Test fixtures with known 5-7-5 texts and expected partitions
// WHY: Detection tests need deterministic input/output pairs for validation
#![allow(dead_code)]

/// Classic senryu separated by Japanese punctuation into exactly three segments
pub const PUNCTUATED_SENRYU: &str = "ふるいけや、かわずとびこむ。みずのおと";

/// The same 17 morae with no punctuation at all
pub const CONTINUOUS_SENRYU: &str = "ふるいけやかわずとびこむみずのおと";

/// Expected lines for both forms above
pub const EXPECTED_LINES: [&str; 3] = ["ふるいけや", "かわずとびこむ", "みずのおと"];

/// Two valid segment triples: (0,1,3) joins the zero-mora "123" into the middle line, (0,2,3) into the upper line.
/// The lexicographically smaller triple must win.
pub const AMBIGUOUS_SEGMENTS: &str = "ふるいけや、123、かわずとびこむ、みずのおと";

/// Unpunctuated, so only the continuous search applies; the zero-mora "1" makes cuts at 5 and 6 both valid
pub const AMBIGUOUS_CUTS: &str = "ふるいけや1かわずとびこむみずのおと";

/// Romanized senryu, readable once romaji is converted to kana
pub const ROMAJI_SENRYU: &str = "furuikeya kawazutobikomu mizunooto";

/// Punctuation splits the text in the wrong place, only the continuous search can succeed
pub const MISPLACED_PUNCTUATION: &str = "あいうえおかき、くけこさしすせそたち";

/// Three 5-mora segments: 15 morae can never form 5-7-5
pub const FIFTEEN_MORAE: &str = "あいうえお、かきくけこ、さしすせそ";

/// Chat noise wrapped around a punctuated senryu
pub const NOISY_SENRYU: &str =
    "<@123456> ふるいけや、 https://example.com/frog かわず<:frog:998877>とびこむ。\u{3000}みずのおと 🐸😀";
