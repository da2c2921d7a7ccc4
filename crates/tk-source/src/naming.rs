//! Label and identifier derivation.

/// Words that cannot be used as a binding name.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Derives a human-readable label from a bound identifier.
///
/// A new word starts before every internal uppercase letter and at `_` or
/// `-`. Each word is title-cased: its first letter upper-cased, the rest
/// lower-cased.
///
/// # Examples
///
/// ```
/// use tk_source::label_for;
///
/// assert_eq!(label_for("capacitorPolar"), "Capacitor Polar");
/// assert_eq!(label_for("switch_closed"), "Switch Closed");
/// assert_eq!(label_for("ledRGB"), "Led R G B");
/// assert_eq!(label_for(""), "");
/// ```
#[must_use]
pub fn label_for(identifier: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in identifier.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| title_case(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Converts a file identifier into a binding name.
///
/// `_`, `-`, and other characters that cannot appear in an identifier start a
/// new camel-case word; a leading digit is prefixed with `_`.
///
/// # Examples
///
/// ```
/// use tk_source::to_js_identifier;
///
/// assert_eq!(to_js_identifier("capacitor_polar"), "capacitorPolar");
/// assert_eq!(to_js_identifier("relay-spdt"), "relaySpdt");
/// assert_eq!(to_js_identifier("7segment"), "_7segment");
/// ```
#[must_use]
pub fn to_js_identifier(file_id: &str) -> String {
    let mut out = String::with_capacity(file_id.len());
    let mut upper_next = false;
    for c in file_id.chars() {
        if c.is_ascii_alphanumeric() || c == '$' {
            if upper_next && !out.is_empty() {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    if out.is_empty() {
        return "element".to_owned();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) || RESERVED_WORDS.contains(&out.as_str()) {
        out.insert(0, '_');
    }
    out
}

/// Returns `true` if `name` can be used as a binding name.
///
/// Only ASCII identifiers are accepted.
///
/// # Examples
///
/// ```
/// use tk_source::is_js_identifier;
///
/// assert!(is_js_identifier("switch_open"));
/// assert!(!is_js_identifier("relay-spdt"));
/// assert!(!is_js_identifier("switch"));
/// ```
#[must_use]
pub fn is_js_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'$')
        && bytes.all(crate::scan::is_ident_byte)
        && !RESERVED_WORDS.contains(&name)
}

/// Renders `value` as a single-quoted string literal.
///
/// # Examples
///
/// ```
/// use tk_source::quote_js;
///
/// assert_eq!(quote_js("Op Amp"), "'Op Amp'");
/// assert_eq!(quote_js("it's"), r"'it\'s'");
/// ```
#[must_use]
pub fn quote_js(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_simple() {
        assert_eq!(label_for("resistor"), "Resistor");
        assert_eq!(label_for("vsource"), "Vsource");
        assert_eq!(label_for("opAmp"), "Op Amp");
    }

    #[test]
    fn test_label_separators() {
        assert_eq!(label_for("capacitor_polar"), "Capacitor Polar");
        assert_eq!(label_for("relay-spdt"), "Relay Spdt");
        assert_eq!(label_for("__x__"), "X");
    }

    #[test]
    fn test_label_splits_every_uppercase_letter() {
        assert_eq!(label_for("NPNTransistor"), "N P N Transistor");
        assert_eq!(label_for("ledRGB"), "Led R G B");
        assert_eq!(label_for("switch2Way"), "Switch2 Way");
    }

    #[test]
    fn test_label_title_cases_words() {
        assert_eq!(label_for("wall_Socket"), "Wall Socket");
        assert_eq!(label_for("Lamp"), "Lamp");
        assert_eq!(label_for("éclair"), "Éclair");
    }

    #[test]
    fn test_label_empty() {
        assert_eq!(label_for(""), "");
        assert_eq!(label_for("_"), "");
    }

    #[test]
    fn test_to_js_identifier() {
        assert_eq!(to_js_identifier("resistor"), "resistor");
        assert_eq!(to_js_identifier("switch_closed"), "switchClosed");
        assert_eq!(to_js_identifier("my.element"), "myElement");
        assert_eq!(to_js_identifier("switch"), "_switch");
        assert_eq!(to_js_identifier("---"), "element");
    }

    #[test]
    fn test_is_js_identifier() {
        assert!(is_js_identifier("resistor"));
        assert!(is_js_identifier("$el"));
        assert!(is_js_identifier("_7"));
        assert!(!is_js_identifier("7seg"));
        assert!(!is_js_identifier(""));
        assert!(!is_js_identifier("const"));
    }

    #[test]
    fn test_quote_js_escapes() {
        assert_eq!(quote_js(r"a\b"), r"'a\\b'");
        assert_eq!(quote_js("two\nlines"), r"'two\nlines'");
    }
}
