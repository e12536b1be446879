//! HTML entity handling.
//!
//! Named HTML entities are mapped to Unicode before tokenizing, because the
//! XML tokenizer only knows the five XML entities. Those five, together with
//! numeric references, are decoded while streaming via [`decode_entity`].

use std::sync::LazyLock;

use regex::Regex;

/// Named entity, numeric reference, or a bare ampersand.
static AMPERSAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:([a-zA-Z][a-zA-Z0-9]*);|(#[0-9]+;|#[xX][0-9a-fA-F]+;))?")
        .expect("invalid ampersand regex")
});

/// Convert named HTML entities to Unicode and escape bare ampersands.
///
/// XML entities (`amp`, `lt`, `gt`, `quot`, `apos`) and numeric references
/// are left for the tokenizer. Unknown named entities and ampersands that do
/// not start a reference become `&amp;…` so they survive as literal text.
pub fn convert_html_entities(html: &str) -> String {
    AMPERSAND_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            if caps.get(2).is_some() {
                return caps[0].to_owned();
            }
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                return "&amp;".to_owned();
            };
            if is_xml_entity(name) {
                return caps[0].to_owned();
            }
            entity_to_unicode(name).map_or_else(|| format!("&amp;{name};"), str::to_owned)
        })
        .into_owned()
}

fn is_xml_entity(name: &str) -> bool {
    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
}

/// Map a named HTML entity to its text.
fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        // Spacing
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "shy" => "",
        "zwj" => "\u{200d}",
        "zwnj" => "\u{200c}",

        // Punctuation
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "prime" => "\u{2032}",
        "Prime" => "\u{2033}",

        // Quotation marks
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "sbquo" => "\u{201a}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "lsaquo" => "\u{2039}",
        "rsaquo" => "\u{203a}",

        // Symbols
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "deg" => "\u{00b0}",
        "dagger" => "\u{2020}",
        "Dagger" => "\u{2021}",
        "iexcl" => "\u{00a1}",
        "iquest" => "\u{00bf}",

        // Currency
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",

        // Math
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "plusmn" => "\u{00b1}",
        "minus" => "\u{2212}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "frac12" => "\u{00bd}",
        "frac14" => "\u{00bc}",
        "frac34" => "\u{00be}",

        // Arrows
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",

        // Latin letters common in running text
        "auml" => "\u{00e4}",
        "ouml" => "\u{00f6}",
        "uuml" => "\u{00fc}",
        "Auml" => "\u{00c4}",
        "Ouml" => "\u{00d6}",
        "Uuml" => "\u{00dc}",
        "szlig" => "\u{00df}",
        "eacute" => "\u{00e9}",
        "egrave" => "\u{00e8}",
        "agrave" => "\u{00e0}",
        "ccedil" => "\u{00e7}",
        "ntilde" => "\u{00f1}",

        _ => return None,
    })
}

/// Decode an XML entity or numeric character reference (without `&`/`;`).
///
/// Unknown names and invalid code points are returned as written.
pub fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = match s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => s[1..].parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_curly_quotes() {
        assert_eq!(
            convert_html_entities("&ldquo;quoted&rdquo;"),
            "\u{201c}quoted\u{201d}"
        );
    }

    #[test]
    fn test_convert_nbsp_and_dash() {
        assert_eq!(
            convert_html_entities("a&nbsp;&mdash;&nbsp;b"),
            "a\u{00a0}\u{2014}\u{00a0}b"
        );
    }

    #[test]
    fn test_soft_hyphen_is_removed() {
        assert_eq!(convert_html_entities("hyph&shy;en"), "hyphen");
    }

    #[test]
    fn test_xml_entities_are_kept() {
        assert_eq!(
            convert_html_entities("&amp;&lt;&gt;&quot;&apos;"),
            "&amp;&lt;&gt;&quot;&apos;"
        );
    }

    #[test]
    fn test_numeric_references_are_kept() {
        assert_eq!(convert_html_entities("&#169; &#x201C;"), "&#169; &#x201C;");
    }

    #[test]
    fn test_bare_ampersand_is_escaped() {
        assert_eq!(convert_html_entities("AT&T & co"), "AT&amp;T &amp; co");
    }

    #[test]
    fn test_unknown_entity_is_escaped() {
        assert_eq!(convert_html_entities("&bogus;"), "&amp;bogus;");
    }

    #[test]
    fn test_decode_xml_entities() {
        assert_eq!(decode_entity("lt"), "<");
        assert_eq!(decode_entity("amp"), "&");
        assert_eq!(decode_entity("quot"), "\"");
    }

    #[test]
    fn test_decode_numeric_references() {
        assert_eq!(decode_entity("#169"), "\u{00a9}");
        assert_eq!(decode_entity("#x201c"), "\u{201c}");
        assert_eq!(decode_entity("#X201D"), "\u{201d}");
    }

    #[test]
    fn test_decode_invalid_reference_is_preserved() {
        assert_eq!(decode_entity("#xD800"), "&#xD800;");
        assert_eq!(decode_entity("nope"), "&nope;");
    }
}
