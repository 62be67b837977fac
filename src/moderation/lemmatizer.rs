//! Single-word part-of-speech tagging and lemmatization.
//!
//! Tags follow the Penn Treebank tag set so callers can reduce them with
//! [`PartOfSpeech::from_tag`]. Lemmatization mirrors WordNet's morphy: an
//! irregular-form table is consulted first, then suffix detachment rules for
//! the word class. There is no dictionary behind the rules, so they are
//! guarded against the common false positives instead.

/// Coarse word class used to pick lemmatization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Adjective,
    Verb,
    Noun,
    Adverb,
}

impl PartOfSpeech {
    /// Maps a Penn Treebank tag by its first letter; unknown tags are nouns.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.chars().next() {
            Some('J') => Self::Adjective,
            Some('V') => Self::Verb,
            Some('R') => Self::Adverb,
            _ => Self::Noun,
        }
    }
}

fn verb_exception(word: &str) -> Option<&'static str> {
    let lemma = match word {
        "went" | "gone" | "goes" => "go",
        "echoes" => "echo",
        "vetoes" => "veto",
        "torpedoes" => "torpedo",
        "ate" | "eaten" => "eat",
        "saw" | "seen" => "see",
        "said" => "say",
        "made" => "make",
        "took" | "taken" => "take",
        "gave" | "given" => "give",
        "came" => "come",
        "got" | "gotten" => "get",
        "knew" | "known" => "know",
        "thought" => "think",
        "told" => "tell",
        "found" => "find",
        "felt" => "feel",
        "kept" => "keep",
        "began" | "begun" => "begin",
        "wrote" | "written" => "write",
        "ran" => "run",
        "brought" => "bring",
        "bought" => "buy",
        "caught" => "catch",
        "taught" => "teach",
        "sent" => "send",
        "spent" => "spend",
        "built" => "build",
        "stood" => "stand",
        "understood" => "understand",
        "lost" => "lose",
        "paid" => "pay",
        "met" => "meet",
        "sat" => "sit",
        "spoke" | "spoken" => "speak",
        "broke" | "broken" => "break",
        "chose" | "chosen" => "choose",
        "drove" | "driven" => "drive",
        "fell" | "fallen" => "fall",
        "forgot" | "forgotten" => "forget",
        "hid" | "hidden" => "hide",
        "held" => "hold",
        "led" => "lead",
        "shot" => "shoot",
        "slept" => "sleep",
        "stole" | "stolen" => "steal",
        "swore" | "sworn" => "swear",
        "threw" | "thrown" => "throw",
        "woke" | "woken" => "wake",
        "wore" | "worn" => "wear",
        "fought" => "fight",
        "sang" | "sung" => "sing",
        "swam" | "swum" => "swim",
        "flew" | "flown" => "fly",
        "grew" | "grown" => "grow",
        "hung" => "hang",
        "died" | "dying" => "die",
        "lied" | "lying" => "lie",
        "tied" | "tying" => "tie",
        _ => return None,
    };
    Some(lemma)
}

fn adjective_exception(word: &str) -> Option<&'static str> {
    let lemma = match word {
        "better" | "best" => "good",
        "worse" | "worst" => "bad",
        "farther" | "farthest" => "far",
        _ => return None,
    };
    Some(lemma)
}

fn noun_exception(word: &str) -> Option<&'static str> {
    let lemma = match word {
        "children" => "child",
        "mice" => "mouse",
        "feet" => "foot",
        "teeth" => "tooth",
        "geese" => "goose",
        "oxen" => "ox",
        "wolves" => "wolf",
        "knives" => "knife",
        "lives" => "life",
        "wives" => "wife",
        "leaves" => "leaf",
        "halves" => "half",
        "selves" => "self",
        "thieves" => "thief",
        "shelves" => "shelf",
        "loaves" => "loaf",
        _ => return None,
    };
    Some(lemma)
}

/// Words whose suffix looks inflectional but is not.
fn is_invariant(word: &str) -> bool {
    matches!(
        word,
        "always"
            | "perhaps"
            | "towards"
            | "afterwards"
            | "backwards"
            | "besides"
            | "whereas"
            | "news"
            | "series"
            | "species"
            | "lens"
            | "physics"
            | "mathematics"
            | "politics"
            | "ethics"
            | "economics"
            | "chaos"
            | "canvas"
            | "atlas"
            | "bias"
            | "alias"
            | "nothing"
            | "something"
            | "anything"
            | "everything"
            | "morning"
            | "evening"
            | "ceiling"
            | "string"
            | "spring"
            | "wedding"
            | "pudding"
            | "speed"
            | "breed"
            | "greed"
            | "bleed"
            | "creed"
            | "indeed"
            | "hundred"
            | "sacred"
            | "naked"
            | "wicked"
            | "kindred"
            | "omen"
            | "amen"
            | "semen"
            | "stamen"
            | "specimen"
            | "abdomen"
            | "soldier"
            | "cashier"
            | "barrier"
            | "carrier"
            | "frontier"
            | "glacier"
    )
}

/// Bases recognised when undoing comparative and superlative suffixes.
const ADJECTIVE_BASES: &[&str] = &[
    "angry", "big", "bright", "busy", "cheap", "close", "cold", "cool", "crazy", "cute", "dark",
    "deep", "dim", "dirty", "dumb", "early", "easy", "fake", "fast", "fat", "fine", "fit",
    "flat", "funny", "glad", "great", "grim", "gross", "happy", "hard", "harsh", "heavy",
    "high", "hot", "kind", "lame", "large", "late", "lazy", "long", "loud", "low", "lucky",
    "mad", "mean", "nasty", "nice", "old", "poor", "pretty", "red", "rich", "rude", "sad",
    "safe", "short", "sick", "silly", "simple", "slim", "slow", "small", "smart", "smelly",
    "soft", "strong", "stupid", "tall", "thin", "tiny", "tough", "ugly", "weak", "weird",
    "wet", "wild", "young",
];

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn ends_with_double_consonant(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    n >= 2
        && bytes[n - 1].is_ascii_alphabetic()
        && bytes[n - 1] == bytes[n - 2]
        && !is_vowel(bytes[n - 1])
}

/// Comparative/superlative candidates that resolve to a known base.
fn adjective_base(word: &str) -> Option<&'static str> {
    let stems = [
        word.strip_suffix("iest").map(|s| format!("{s}y")),
        word.strip_suffix("ier").map(|s| format!("{s}y")),
        word.strip_suffix("est").map(str::to_string),
        word.strip_suffix("est").map(|s| format!("{s}e")),
        word.strip_suffix("er").map(str::to_string),
        word.strip_suffix("er").map(|s| format!("{s}e")),
    ];

    let known = |candidate: &str| ADJECTIVE_BASES.iter().copied().find(|b| *b == candidate);

    for stem in stems.into_iter().flatten() {
        if let Some(base) = known(&stem) {
            return Some(base);
        }
        if ends_with_double_consonant(&stem)
            && let Some(base) = known(&stem[..stem.len() - 1])
        {
            return Some(base);
        }
    }
    None
}

/// Tags a single lowercase word.
#[must_use]
pub fn tag(word: &str) -> &'static str {
    if verb_exception(word).is_some() {
        return if word.ends_with('s') { "VBZ" } else { "VBD" };
    }
    if adjective_exception(word).is_some() {
        return if word.ends_with("st") { "JJS" } else { "JJR" };
    }
    if noun_exception(word).is_some() {
        return "NNS";
    }
    if is_invariant(word) {
        return "NN";
    }
    if word.chars().all(|c| c.is_ascii_digit()) {
        return "CD";
    }

    let len = word.len();
    if len > 4 && word.ends_with("ing") {
        return "VBG";
    }
    if len > 4 && word.ends_with("ed") {
        return "VBD";
    }
    if word.ends_with("est") && adjective_base(word).is_some() {
        return "JJS";
    }
    if word.ends_with("er") && adjective_base(word).is_some() {
        return "JJR";
    }
    if len > 4 && word.ends_with("ly") {
        return "RB";
    }
    if word.ends_with('s') {
        return "NNS";
    }
    "NN"
}

/// Monosyllabic stems like `hop`, `smil` or `us` that lost a silent `e`.
fn needs_silent_e(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    let Some(&last) = bytes.last() else {
        return false;
    };

    if matches!(last, b'v' | b'c' | b'z' | b'u') {
        return true;
    }
    if is_vowel(last) || matches!(last, b'w' | b'x' | b'y') {
        return false;
    }

    let vowel_groups = bytes
        .iter()
        .enumerate()
        .filter(|(i, c)| is_vowel(**c) && (*i == 0 || !is_vowel(bytes[i - 1])))
        .count();
    if vowel_groups != 1 {
        return false;
    }

    match n {
        2 => is_vowel(bytes[0]),
        3 | 4 => is_vowel(bytes[n - 2]) && !is_vowel(bytes[n - 3]),
        _ => false,
    }
}

fn lemmatize_verb(word: &str) -> String {
    if let Some(lemma) = verb_exception(word) {
        return lemma.to_string();
    }
    if word.len() > 4
        && let Some(stem) = word.strip_suffix("ied")
    {
        return format!("{stem}y");
    }

    let Some(stem) = word
        .strip_suffix("ing")
        .or_else(|| word.strip_suffix("ed"))
    else {
        return word.to_string();
    };

    if stem.len() < 2 || !stem.bytes().any(|c| is_vowel(c) || c == b'y') {
        return word.to_string();
    }

    let keeps_double = matches!(stem.as_bytes().last(), Some(b'l' | b's' | b'z'));
    if stem.len() >= 4 && ends_with_double_consonant(stem) && !keeps_double {
        return stem[..stem.len() - 1].to_string();
    }
    if needs_silent_e(stem) {
        return format!("{stem}e");
    }
    stem.to_string()
}

fn lemmatize_noun(word: &str) -> String {
    if let Some(lemma) = noun_exception(word) {
        return lemma.to_string();
    }
    if is_invariant(word) {
        return word.to_string();
    }

    let len = word.len();
    if len >= 5
        && let Some(stem) = word.strip_suffix("men")
    {
        return format!("{stem}man");
    }

    if len <= 3 || !word.ends_with('s') {
        return word.to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if len > 4
        && let Some(stem) = word.strip_suffix("ies")
    {
        return format!("{stem}y");
    }
    for suffix in ["xes", "zzes", "ches", "shes"] {
        if word.ends_with(suffix) && !word.ends_with("aches") {
            return word[..len - 2].to_string();
        }
    }
    word[..len - 1].to_string()
}

fn lemmatize_adjective(word: &str) -> String {
    adjective_exception(word)
        .or_else(|| adjective_base(word))
        .map_or_else(|| word.to_string(), str::to_string)
}

/// Lemmatizes a lowercase word for the given word class.
#[must_use]
pub fn lemmatize(word: &str, pos: PartOfSpeech) -> String {
    if !word.is_ascii() {
        return word.to_string();
    }
    match pos {
        PartOfSpeech::Verb => lemmatize_verb(word),
        PartOfSpeech::Noun => lemmatize_noun(word),
        PartOfSpeech::Adjective => lemmatize_adjective(word),
        PartOfSpeech::Adverb => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(word: &str) -> String {
        lemmatize(word, PartOfSpeech::from_tag(tag(word)))
    }

    #[test]
    fn test_tag_prefix_mapping() {
        assert_eq!(PartOfSpeech::from_tag("JJS"), PartOfSpeech::Adjective);
        assert_eq!(PartOfSpeech::from_tag("VBG"), PartOfSpeech::Verb);
        assert_eq!(PartOfSpeech::from_tag("NNS"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::from_tag("RB"), PartOfSpeech::Adverb);
        assert_eq!(PartOfSpeech::from_tag("CD"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::from_tag(""), PartOfSpeech::Noun);
    }

    #[test]
    fn test_verbs() {
        assert_eq!(lemma("running"), "run");
        assert_eq!(lemma("stopped"), "stop");
        assert_eq!(lemma("hated"), "hate");
        assert_eq!(lemma("loved"), "love");
        assert_eq!(lemma("making"), "make");
        assert_eq!(lemma("using"), "use");
        assert_eq!(lemma("walked"), "walk");
        assert_eq!(lemma("killed"), "kill");
        assert_eq!(lemma("bullied"), "bully");
        assert_eq!(lemma("bullying"), "bully");
        assert_eq!(lemma("went"), "go");
        assert_eq!(tag("goes"), "VBZ");
        assert_eq!(lemma("goes"), "go");
        assert_eq!(lemma("echoes"), "echo");
        assert_eq!(lemma("dying"), "die");
    }

    #[test]
    fn test_nouns() {
        assert_eq!(lemma("cats"), "cat");
        assert_eq!(lemma("losers"), "loser");
        assert_eq!(lemma("glasses"), "glass");
        assert_eq!(lemma("bullies"), "bully");
        assert_eq!(lemma("boxes"), "box");
        assert_eq!(lemma("women"), "woman");
        assert_eq!(lemma("children"), "child");
        assert_eq!(lemma("houses"), "house");
        assert_eq!(lemma("headaches"), "headache");
        assert_eq!(lemma("bus"), "bus");
        assert_eq!(lemma("news"), "news");
    }

    #[test]
    fn test_adjectives() {
        assert_eq!(lemma("uglier"), "ugly");
        assert_eq!(lemma("biggest"), "big");
        assert_eq!(lemma("dumbest"), "dumb");
        assert_eq!(lemma("worst"), "bad");
        assert_eq!(lemma("nicer"), "nice");
        assert_eq!(lemma("smallest"), "small");
        assert_eq!(lemma("water"), "water");
    }

    #[test]
    fn test_adverbs_are_unchanged() {
        assert_eq!(tag("seriously"), "RB");
        assert_eq!(lemma("seriously"), "seriously");
    }

    #[test]
    fn test_lemmas_are_fixed_points() {
        for word in [
            "run", "stop", "hate", "love", "make", "use", "bully", "cat", "glass", "woman", "ugly",
            "big", "bad", "go", "die", "house",
        ] {
            assert_eq!(lemma(word), word, "{word} should be its own lemma");
        }
    }
}
