/// Separators accepted between the two role names of a jinx, in priority order.
pub const JINX_SEPARATORS: [char; 8] = ['&', '＆', '+', 'x', 'X', '-', '|', '/'];

/// Splits a compound jinx name such as `"Spy&Magician"` into its two role names.
///
/// Each separator is tried in priority order and splits at its first
/// occurrence only, so `"A-B-C"` yields `("A", "B-C")`. Returns `None` when no
/// separator produces two non-empty trimmed parts.
pub fn parse_jinx_name(name: &str) -> Option<(&str, &str)> {
    JINX_SEPARATORS.iter().find_map(|&sep| {
        let (left, right) = name.split_once(sep)?;
        let (left, right) = (left.trim(), right.trim());
        (!left.is_empty() && !right.is_empty()).then_some((left, right))
    })
}

/// Canonical `"Left&Right"` form.
pub fn jinx_name(left: &str, right: &str) -> String {
    format!("{left}&{right}")
}

/// Given one side of a jinx, returns the other side. `None` if `name` is on
/// neither side, or on both.
pub fn counterpart<'a>(compound: &'a str, name: &str) -> Option<&'a str> {
    let (left, right) = parse_jinx_name(compound)?;
    match (left == name, right == name) {
        (true, false) => Some(right),
        (false, true) => Some(left),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_names() {
        assert_eq!(parse_jinx_name("方古&紅唇女郎"), Some(("方古", "紅唇女郎")));
        assert_eq!(parse_jinx_name("A+B"), Some(("A", "B")));
        assert_eq!(parse_jinx_name(" Spy ＆ Magician "), Some(("Spy", "Magician")));
        assert_eq!(parse_jinx_name("A | B"), Some(("A", "B")));
    }

    #[test]
    fn test_parse_splits_once() {
        assert_eq!(parse_jinx_name("A-B-C"), Some(("A", "B-C")));
    }

    #[test]
    fn test_priority_order() {
        // '&' outranks '-' even when '-' comes first in the string.
        assert_eq!(parse_jinx_name("Al-Hadikhia&Scarlet Woman"), Some(("Al-Hadikhia", "Scarlet Woman")));
    }

    #[test]
    fn test_falls_through_empty_split() {
        // "&" gives an empty left side, so '+' is tried next.
        assert_eq!(parse_jinx_name("&A+B"), Some(("&A", "B")));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_jinx_name("Lonely"), None);
        assert_eq!(parse_jinx_name("A&"), None);
        assert_eq!(parse_jinx_name(""), None);
    }

    #[test]
    fn test_counterpart() {
        assert_eq!(counterpart("Spy&Magician", "Spy"), Some("Magician"));
        assert_eq!(counterpart("Spy&Magician", "Magician"), Some("Spy"));
        assert_eq!(counterpart("Spy&Magician", "Imp"), None);
        assert_eq!(counterpart("Spy&Spy", "Spy"), None);
    }
}
