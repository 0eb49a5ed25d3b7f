use ethers_core::types::U256;

use crate::{FormatError, BURN_ADDRESS};

/// Strip every `.` from a string.
pub fn remove_dots(s: &str) -> String {
    s.replace('.', "")
}

fn group_from_right(digits: &str, width: usize) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / width);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (len - i) % width == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Canonical dotted hex (`@ux`): lowercase, leading zeros stripped, grouped in
/// fours from the right, `0x` prefixed.
///
/// A zero value renders as `0x0` rather than a bare prefix.
pub fn add_hex_dots(hex: &str) -> String {
    let clean = remove_dots(&hex.replacen("0x", "", 1)).to_lowercase();
    let trimmed = clean.trim_start_matches('0');
    if trimmed.is_empty() {
        return BURN_ADDRESS.to_owned();
    }
    format!("0x{}", group_from_right(trimmed, 4))
}

/// Dot-grouped decimal (`@ud`), grouped in threes from the right.
pub fn add_decimal_dots(value: impl ToString) -> String {
    group_from_right(&value.to_string(), 3)
}

/// Parse a dot-grouped decimal into a `u64`. An empty string is zero.
pub fn parse_ud(s: &str) -> Result<u64, FormatError> {
    let clean = remove_dots(s.trim());
    if clean.is_empty() {
        return Ok(0);
    }
    clean
        .parse::<u64>()
        .map_err(|_| FormatError::InvalidNumber(s.to_owned()))
}

/// Parse a dot-grouped decimal that may exceed 64 bits.
pub fn parse_ud_u256(s: &str) -> Result<U256, FormatError> {
    let clean = remove_dots(s.trim());
    if clean.is_empty() {
        return Ok(U256::zero());
    }
    if !clean.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::InvalidNumber(s.to_owned()));
    }
    U256::from_dec_str(&clean).map_err(|_| FormatError::InvalidNumber(s.to_owned()))
}

/// Scale a user-entered amount such as `"1.5"` to base units of a token with
/// `decimals` decimal places. Here `.` is a decimal point, not a group
/// separator.
pub fn scale_amount(amount: &str, decimals: u8) -> Result<U256, FormatError> {
    let invalid = || FormatError::InvalidAmount {
        amount: amount.to_owned(),
        decimals,
    };
    let trimmed = amount.trim();
    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals as usize {
        return Err(invalid());
    }
    let digits = format!("{whole}{frac:0<width$}", width = decimals as usize);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| invalid())
}

/// Render base units of a token as a human amount, trimming trailing zeros.
pub fn display_token_amount(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_owned()
    } else {
        format!("{whole}.{frac}")
    }
}

/// True if `address` is a well formed 20 byte hex address (dots and `0x`
/// prefix ignored) or the burn address.
pub fn is_valid_destination(address: &str) -> bool {
    let clean = remove_dots(address.trim());
    if clean == BURN_ADDRESS {
        return true;
    }
    let hex = clean
        .strip_prefix("0x")
        .or_else(|| clean.strip_prefix("0X"))
        .unwrap_or(&clean);
    hex.len() == 40 && hex::decode(hex).is_ok()
}

/// Abbreviate a (possibly dotted) hex string to `start…end` characters.
pub fn abbreviate_hex(hash: &str, start: usize, end: usize) -> String {
    let clean = remove_dots(hash);
    if clean.len() <= start + end {
        return clean;
    }
    format!("{}…{}", &clean[..start], &clean[clean.len() - end..])
}

/// Short form of a transaction hash, e.g. `0x12ab34cd…9f8e7d6c`.
pub fn format_hash(hash: &str) -> String {
    abbreviate_hex(hash, 10, 8)
}

/// Ensure a hex string carries exactly one `0x` prefix.
pub fn add_hex_prefix(s: &str) -> String {
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    format!("0x{stripped}")
}

/// Short form of an account address, e.g. `0x7a9a...15f1`.
pub fn display_pub_key(pub_key: &str) -> String {
    let clean = remove_dots(pub_key);
    if clean.len() <= 10 {
        return clean;
    }
    format!("{}...{}", &clean[..6], &clean[clean.len() - 4..])
}

/// Serde helpers for `@ud` fields that may arrive either as dot-grouped
/// strings or as JSON numbers.
pub mod ud {
    use ethers_core::types::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    /// Deserialize a `u64` from a number or a dot-grouped string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => super::parse_ud(&s).map_err(de::Error::custom),
        }
    }

    /// Deserialize a `U256` from a number or a dot-grouped string.
    pub fn deserialize_u256<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(U256::from(n)),
            Raw::Str(s) => super::parse_ud_u256(&s).map_err(de::Error::custom),
        }
    }

    /// Deserialize an optional `U256`; `null` maps to `None`.
    pub fn deserialize_opt_u256<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<U256>, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            None => Ok(None),
            Some(Raw::Num(n)) => Ok(Some(U256::from(n))),
            Some(Raw::Str(s)) => super::parse_ud_u256(&s)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }

    /// Serialize a `U256` as a plain decimal string.
    pub fn serialize_u256_dec<S: Serializer>(v: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }
}
