//! printf-style number formatting used in reports.

/// Formats `value` like C's `%.{prec}e`, e.g. `4.000e+00`. With `signed`, positive
/// values carry a leading `+`, like `%+.{prec}e`.
pub fn sci(value: f64, prec: usize, signed: bool) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let raw = format!("{value:.prec$e}");
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if signed && value >= 0. { "+" } else { "" };
    let exp_sign = if exponent < 0 { '-' } else { '+' };

    format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.abs())
}

/// Formats `value` like C's `%g`: six significant digits, trailing zeros removed, and
/// exponent notation outside `[1e-4, 1e6)`.
pub fn general(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0. { "inf" } else { "-inf" }.into();
    }
    if value == 0. {
        return "0".into();
    }

    let exponent = value.abs().log10().floor() as i32;
    let exponent = match sci(value, 5, false).split_once('e') {
        // Rounding to six digits may bump the exponent, e.g. 999999.5.
        Some((_, e)) => e.parse().unwrap_or(exponent),
        None => exponent,
    };

    if !(-4..6).contains(&exponent) {
        let text = sci(value, 5, false);
        let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "+00"));
        return format!("{}e{exp}", trim_zeros(mantissa));
    }

    let decimals = (5 - exponent).max(0) as usize;
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
