//! Numeric conversions shared by the parser, the interpreter and the transpiler.
//!
//! The language stores numbers as `f64` and converts to and from text the way
//! the host scripting runtime does, so both back ends agree on printed output.

/// Parses the longest numeric prefix of `text`, ignoring leading whitespace.
///
/// `"12px"` is 12, `"1.2.3"` is 1.2 and text with no numeric prefix is NaN.
pub fn parse_float(text: &str) -> f64 {
    scan(text.trim_start()).map_or(f64::NAN, |(value, _)| value)
}

/// Converts a whole string to a number; surrounding whitespace is ignored,
/// blank text is 0 and anything that is not entirely numeric is NaN.
pub fn to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match scan(text) {
        Some((value, len)) if len == text.len() => value,
        _ => f64::NAN,
    }
}

/// Renders a number as its text form: `2` rather than `2.0`, `NaN`,
/// `Infinity`, and exponent notation outside `[1e-6, 1e21)`.
pub fn format(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let exp = format!("{:e}", n);
        match exp.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => exp,
        }
    } else {
        format!("{}", n)
    }
}

fn scan(text: &str) -> Option<(f64, usize)> {
    let bytes = text.as_bytes();
    let mut len = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        len += 1;
    }

    if text[len..].starts_with("Infinity") {
        let negative = bytes[0] == b'-';
        let value = if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        return Some((value, len + "Infinity".len()));
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let integer = digits(len);
    len += integer;

    let mut fraction = 0;
    if bytes.get(len) == Some(&b'.') {
        fraction = digits(len + 1);
        if integer > 0 || fraction > 0 {
            len += 1 + fraction;
        }
    }

    if integer == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp_len = 1;
        if matches!(bytes.get(len + exp_len), Some(b'+' | b'-')) {
            exp_len += 1;
        }
        let exp_digits = digits(len + exp_len);
        if exp_digits > 0 {
            len += exp_len + exp_digits;
        }
    }

    text[..len].parse().ok().map(|value| (value, len))
}
