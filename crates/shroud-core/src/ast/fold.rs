// Constant evaluation used by the folding factories in `ast`.
// Every function follows Lua semantics and returns `None` where Lua would
// raise an error or where the result has no literal form; the factory then
// keeps the operator node.

use serde::{Deserialize, Serialize};

/// Value of a constant expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Constant {
    /// Lua truthiness: only `nil` and `false` are false.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Constant::Nil | Constant::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Nil => "nil",
            Constant::Boolean(_) => "boolean",
            Constant::Number(_) => "number",
            Constant::String(_) => "string",
        }
    }
}

/// Arithmetic operand coercion: numbers as-is, numeric strings parsed.
fn to_number(value: &Constant) -> Option<f64> {
    match value {
        Constant::Number(n) => Some(*n),
        Constant::String(s) => parse_lua_number(s),
        _ => None,
    }
}

/// Parse a string the way Lua's `tonumber` does for decimal and hex input.
fn parse_lua_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    // Only one leading sign.
    if negative && unsigned.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(hex, 16).ok()? as f64
    } else {
        // Rust also accepts "inf" and "NaN", Lua does not.
        if unsigned.is_empty()
            || !unsigned
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            return None;
        }
        unsigned.parse::<f64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Text form of a number when concatenated. `%.14g` prints integers below
/// 1e14 digit for digit; anything wider switches to exponent form.
fn number_to_concat_string(n: f64) -> Option<String> {
    if n.fract() == 0.0 && n.abs() < 1e14 && !(n == 0.0 && n.is_sign_negative()) {
        Some(format!("{}", n as i64))
    } else {
        None
    }
}

fn finite(n: f64) -> Option<Constant> {
    n.is_finite().then_some(Constant::Number(n))
}

fn arithmetic(a: &Constant, b: &Constant, op: impl Fn(f64, f64) -> f64) -> Option<Constant> {
    finite(op(to_number(a)?, to_number(b)?))
}

pub fn add(a: &Constant, b: &Constant) -> Option<Constant> {
    arithmetic(a, b, |x, y| x + y)
}

pub fn sub(a: &Constant, b: &Constant) -> Option<Constant> {
    arithmetic(a, b, |x, y| x - y)
}

pub fn mul(a: &Constant, b: &Constant) -> Option<Constant> {
    arithmetic(a, b, |x, y| x * y)
}

pub fn div(a: &Constant, b: &Constant) -> Option<Constant> {
    let divisor = to_number(b)?;
    if divisor == 0.0 {
        return None;
    }
    finite(to_number(a)? / divisor)
}

/// Floored modulo, `a - floor(a / b) * b`.
pub fn modulo(a: &Constant, b: &Constant) -> Option<Constant> {
    let divisor = to_number(b)?;
    if divisor == 0.0 {
        return None;
    }
    let dividend = to_number(a)?;
    finite(dividend - (dividend / divisor).floor() * divisor)
}

pub fn pow(a: &Constant, b: &Constant) -> Option<Constant> {
    arithmetic(a, b, f64::powf)
}

pub fn concat(a: &Constant, b: &Constant) -> Option<Constant> {
    fn piece(value: &Constant) -> Option<String> {
        match value {
            Constant::String(s) => Some(s.clone()),
            Constant::Number(n) => number_to_concat_string(*n),
            _ => None,
        }
    }
    Some(Constant::String(piece(a)? + &piece(b)?))
}

/// Raw equality: no coercion between types.
pub fn equals(a: &Constant, b: &Constant) -> Option<Constant> {
    Some(Constant::Boolean(a == b))
}

pub fn not_equals(a: &Constant, b: &Constant) -> Option<Constant> {
    Some(Constant::Boolean(a != b))
}

fn compare(
    a: &Constant,
    b: &Constant,
    numbers: impl Fn(f64, f64) -> bool,
    strings: impl Fn(&str, &str) -> bool,
) -> Option<Constant> {
    match (a, b) {
        (Constant::Number(x), Constant::Number(y)) => Some(Constant::Boolean(numbers(*x, *y))),
        (Constant::String(x), Constant::String(y)) => Some(Constant::Boolean(strings(x, y))),
        _ => None,
    }
}

pub fn less_than(a: &Constant, b: &Constant) -> Option<Constant> {
    compare(a, b, |x, y| x < y, |x, y| x < y)
}

pub fn greater_than(a: &Constant, b: &Constant) -> Option<Constant> {
    compare(a, b, |x, y| x > y, |x, y| x > y)
}

pub fn less_than_or_equals(a: &Constant, b: &Constant) -> Option<Constant> {
    compare(a, b, |x, y| x <= y, |x, y| x <= y)
}

pub fn greater_than_or_equals(a: &Constant, b: &Constant) -> Option<Constant> {
    compare(a, b, |x, y| x >= y, |x, y| x >= y)
}

pub fn and(a: &Constant, b: &Constant) -> Option<Constant> {
    Some(if a.is_truthy() { b.clone() } else { a.clone() })
}

pub fn or(a: &Constant, b: &Constant) -> Option<Constant> {
    Some(if a.is_truthy() { a.clone() } else { b.clone() })
}

pub fn not(a: &Constant) -> Option<Constant> {
    Some(Constant::Boolean(!a.is_truthy()))
}

pub fn negate(a: &Constant) -> Option<Constant> {
    finite(-to_number(a)?)
}

pub fn len(a: &Constant) -> Option<Constant> {
    match a {
        Constant::String(s) => Some(Constant::Number(s.len() as f64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lua_number_parsing() {
        assert_eq!(parse_lua_number("10"), Some(10.0));
        assert_eq!(parse_lua_number("  2.5 "), Some(2.5));
        assert_eq!(parse_lua_number("0x1F"), Some(31.0));
        assert_eq!(parse_lua_number("-3e2"), Some(-300.0));
        assert_eq!(parse_lua_number("inf"), None);
        assert_eq!(parse_lua_number("NaN"), None);
        assert_eq!(parse_lua_number(""), None);
        assert_eq!(parse_lua_number("12abc"), None);
        assert_eq!(parse_lua_number("+5"), Some(5.0));
        assert_eq!(parse_lua_number("--5"), None);
        assert_eq!(parse_lua_number("-+5"), None);
        assert_eq!(parse_lua_number("- 5"), None);
    }

    #[test]
    fn test_concat_number_text() {
        assert_eq!(number_to_concat_string(42.0).as_deref(), Some("42"));
        assert_eq!(number_to_concat_string(-7.0).as_deref(), Some("-7"));
        assert_eq!(number_to_concat_string(0.5), None);
        assert_eq!(number_to_concat_string(1e20), None);
        assert_eq!(number_to_concat_string(1e14), None);
        assert_eq!(number_to_concat_string(-1e14), None);
        assert_eq!(
            number_to_concat_string(99_999_999_999_999.0).as_deref(),
            Some("99999999999999")
        );
        assert_eq!(number_to_concat_string(-0.0), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Constant::Nil.is_truthy());
        assert!(!Constant::Boolean(false).is_truthy());
        assert!(Constant::Number(0.0).is_truthy());
        assert!(Constant::String(String::new()).is_truthy());
    }
}
