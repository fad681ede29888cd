use serde::Serialize;

/// An ingredient amount as shown on a recipe page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    /// The amount with any `=` prefix removed, shown verbatim.
    #[serde(rename = "qty_display")]
    pub display: String,
    /// The numeric amount, if `display` is a plain decimal.
    #[serde(rename = "qty_value")]
    pub value: Option<f64>,
    /// `true` if the amount was written `=N`: it doesn't scale with servings.
    pub fixed: bool,
}

impl Quantity {
    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }
}

/// Normalizes a raw ingredient amount.
///
/// ```rust
/// use commonplace::recipe::normalize_quantity;
///
/// let q = normalize_quantity("=3");
/// assert_eq!((q.display.as_str(), q.value, q.fixed), ("3", Some(3.0), true));
///
/// let q = normalize_quantity("1/2");
/// assert_eq!((q.display.as_str(), q.value, q.fixed), ("1/2", None, false));
/// ```
pub fn normalize_quantity(raw: &str) -> Quantity {
    let trimmed = raw.trim();
    let (display, fixed) = match trimmed.strip_prefix('=') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };

    Quantity {
        display: display.to_string(),
        value: parse_decimal(display),
        fixed,
    }
}

/// Parses `digits` or `digits.digits`; anything else is `None`.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !fraction.map_or(true, all_digits) {
        return None;
    }

    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_quantities() {
        assert_eq!(normalize_quantity("=3"), Quantity { display: "3".into(), value: Some(3.0), fixed: true });
        assert_eq!(normalize_quantity(" = 2.5 "), Quantity { display: "2.5".into(), value: Some(2.5), fixed: true });
        assert_eq!(normalize_quantity("="), Quantity { display: "".into(), value: None, fixed: true });
    }

    #[test]
    fn only_plain_decimals_have_values() {
        assert_eq!(parse_decimal("200"), Some(200.0));
        assert_eq!(parse_decimal("0.75"), Some(0.75));
        for raw in ["", "1/2", "1-2", "a pinch", ".5", "5.", "1e3", "-1", "1.2.3", "½"] {
            assert_eq!(parse_decimal(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn unparsed_quantities_keep_their_text() {
        let q = normalize_quantity("2-3");
        assert_eq!(q.display, "2-3");
        assert_eq!(q.value, None);
        assert!(!q.fixed);
        assert!(normalize_quantity("  ").is_empty());
    }
}
