// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tracing::warn;

/// Parses an integer the way the Go runtime prints them: optional sign, then
/// an optional `0x`/`0o`/`0b` radix prefix.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (radix, digits) = if let Some(d) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, d)
    } else if let Some(d) = unsigned
        .strip_prefix("0o")
        .or_else(|| unsigned.strip_prefix("0O"))
    {
        (8, d)
    } else if let Some(d) = unsigned
        .strip_prefix("0b")
        .or_else(|| unsigned.strip_prefix("0B"))
    {
        (2, d)
    } else {
        (10, unsigned)
    };

    // from_str_radix tolerates its own sign, which would let "--1" through.
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// [`parse_int`] with a fallback. Empty input is treated as absent and returns
/// `default` silently; anything else that does not parse (or does not fit `T`)
/// is logged and also returns `default`.
pub fn parse_int_or<T>(text: &str, default: T) -> T
where
    T: TryFrom<i64>,
{
    if text.trim().is_empty() {
        return default;
    }
    match parse_int(text).map(T::try_from) {
        Some(Ok(value)) => value,
        _ => {
            warn!(value = text, "failed to parse integer, using default");
            default
        }
    }
}
