use super::{Format, Precision, Val};

/// ## Value display
///
/// Output of `Format::Auto` parses back to the same value.

pub fn format(val: &Val, format: Format, precision: Precision) -> String {
    match val {
        Val::Int(n) => {
            let bits = match precision {
                Precision::Bits64 => *n as u64,
                Precision::Bits32 => *n as u64 & 0xffff_ffff,
            };
            integer(*n, bits, format, |n| format!("{:x}", n), |n| format!("{:o}", n))
        }
        Val::Int32(n) => integer(
            *n as i64,
            *n as u32 as u64,
            format,
            |_| format!("{:x}", n),
            |_| format!("{:o}", n),
        ),
        Val::Double(n) => double(*n),
        Val::Float(n) => float(*n),
        Val::Measure(n, unit) => {
            let (shown, suffix) = unit.display(*n);
            format!("{}{}", measure(shown), suffix)
        }
        Val::Str(s) => match format {
            Format::Auto => quoted(s),
            _ => {
                let codes: Vec<String> = s
                    .chars()
                    .map(|c| {
                        let code = c as u32;
                        match format {
                            Format::Hex => format!("0x{:x}", code),
                            Format::Oct => format!("0{:o}", code),
                            Format::Bin => binary(code as u64),
                            _ => code.to_string(),
                        }
                    })
                    .collect();
                format!("[{}]", codes.join(","))
            }
        },
        Val::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|item| self::format(item, format, precision))
                .collect();
            format!("[{}]", items.join(","))
        }
        Val::Ident(name) => name.to_string(),
        Val::Function(name) => format!("{}(", name),
        Val::Pending => "?".to_string(),
        Val::Error(code) => format!("#{}", code),
        Val::Void => String::new(),
    }
}

/// Text of a value as `PRINT` and string concatenation see it:
/// strings are not quoted.
pub fn text(val: &Val) -> String {
    match val {
        Val::Str(s) => s.to_string(),
        _ => format(val, Format::Auto, Precision::Bits64),
    }
}

fn integer<H, O>(n: i64, bits: u64, format: Format, hex: H, oct: O) -> String
where
    H: Fn(i64) -> String,
    O: Fn(i64) -> String,
{
    match format {
        Format::Hex => format!("0x{}", hex(n)),
        Format::Oct => format!("0{}", oct(n)),
        Format::Bin => binary(bits),
        Format::Auto | Format::Dec => n.to_string(),
    }
}

/// Digits in groups of eight separated by `_`.
fn binary(n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let digits = format!("{:b}", n);
    let padded = format!("{}{}", "0".repeat((8 - digits.len() % 8) % 8), digits);
    let groups: Vec<&str> = padded
        .as_bytes()
        .chunks(8)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect();
    groups.join("_")
}

fn double(n: f64) -> String {
    if !n.is_finite() {
        return special(n);
    }
    layout(&format!("{:e}", n), 20)
}

fn float(n: f32) -> String {
    if !n.is_finite() {
        return special(n as f64);
    }
    layout(&format!("{:e}", n), 10)
}

fn measure(n: f64) -> String {
    if !n.is_finite() {
        return special(n);
    }
    layout(&format!("{:.5e}", n), 6)
}

fn special(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n < 0.0 {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

/// Lay out scientific notation from `{:e}` the way C's `%g` does:
/// plain digits unless the exponent is below -4 or reaches `limit`.
fn layout(sci: &str, limit: i32) -> String {
    let (mantissa, exponent) = match sci.find('e') {
        Some(at) => (&sci[..at], sci[at + 1..].parse::<i32>().unwrap_or(0)),
        None => (sci, 0),
    };
    let negative = mantissa.starts_with('-');
    let mut digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if digits == "0" {
        out.push('0');
        return out;
    }
    if exponent < -4 || exponent >= limit {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        out.push_str(&format!("e{}{:02}", sign, exponent.abs()));
    } else if exponent >= 0 {
        let whole = exponent as usize + 1;
        if digits.len() <= whole {
            out.push_str(&digits);
            out.push_str(&"0".repeat(whole - digits.len()));
        } else {
            out.push_str(&digits[..whole]);
            out.push('.');
            out.push_str(&digits[whole..]);
        }
    } else {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exponent - 1) as usize));
        out.push_str(&digits);
    }
    out
}

/// C string literal which the lexer reads back unchanged.
fn quoted(s: &str) -> String {
    let mut out = String::from("\"");
    let mut escaped = false;
    for ch in s.chars() {
        match ch {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 32 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
                escaped = true;
            }
            c if escaped && c.is_ascii_hexdigit() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => {
                out.push(c);
                escaped = false;
            }
        }
    }
    out.push('"');
    out
}
