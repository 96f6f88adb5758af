// WHY: per-character kana predicates shared by the mora counter
// Table lookups only, no context: a character's contribution never depends on its neighbours

/// Small kana that fold into the preceding mora (hiragana and katakana forms)
pub const SMALL_KANA: &[char] = &[
    'ゃ', 'ゅ', 'ょ', 'ぁ', 'ぃ', 'ぅ', 'ぇ', 'ぉ', 'ゎ',
    'ャ', 'ュ', 'ョ', 'ァ', 'ィ', 'ゥ', 'ェ', 'ォ', 'ヮ',
];

/// True when the character lies in the hiragana (U+3040..U+309F) or katakana (U+30A0..U+30FF) block
pub fn is_countable_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

/// True for the small vowel/glide kana listed in [`SMALL_KANA`]
pub fn is_small_kana(c: char) -> bool {
    SMALL_KANA.contains(&c)
}

/// Count morae in an already-converted kana string.
///
/// Every countable kana adds one mora, small kana add nothing (they are skipped,
/// not subtracted, so a leading small kana is simply ignored) and anything outside
/// the two kana blocks adds nothing. `っ`, `ん` and `ー` each count as one.
pub fn count_kana_morae(text: &str) -> usize {
    text.chars()
        .filter(|&c| !is_small_kana(c) && is_countable_kana(c))
        .count()
}
