//! Number format codes applied to numeric cell values
//!
//! A format code has up to four sections separated by semicolons:
//! `positive;negative;zero;text`. With two sections the second one formats
//! negative numbers (without their minus sign), with three the third formats
//! zero. The text section never applies to numbers and is dropped.
//!
//! Supported inside a numeric section:
//! - digit placeholders `0`, `#` and `?`, a decimal point, thousands grouping
//! - trailing commas that scale by 1000
//! - `%` (scales by 100) and scientific `E+`/`E-` exponents
//! - literal text: quoted strings, `\x` escapes, `[$sym-locale]` currency tags
//!
//! Date and time sections support `y`, `m`, `d`, `h`, `s` runs, `AM/PM`,
//! `A/P` and elapsed `[h]`, `[m]`, `[s]`. Fractions and conditional sections
//! such as `[>100]` are not interpreted; those codes leave the value as is.

/// Longest fractional part rendered.
const MAX_DECIMALS: usize = 15;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days from 1970-01-01 back to the day before serial 1 (1899-12-31).
const EPOCH_1900_EARLY: i64 = -25_568;
/// Days from 1970-01-01 back to 1899-12-30, the effective epoch after the
/// phantom 1900-02-29.
const EPOCH_1900: i64 = -25_569;
/// Days from 1970-01-01 back to 1904-01-01.
const EPOCH_1904: i64 = -24_107;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Built-in number format codes (ECMA-376 Part 1, 18.8.30).
pub const fn builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        5 => Some("$#,##0_);($#,##0)"),
        6 => Some("$#,##0_);[Red]($#,##0)"),
        7 => Some("$#,##0.00_);($#,##0.00)"),
        8 => Some("$#,##0.00_);[Red]($#,##0.00)"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        41 => Some(r#"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"#),
        42 => Some(r#"_($* #,##0_);_($* \(#,##0\);_($* "-"_);_(@_)"#),
        43 => Some(r#"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"#),
        44 => Some(r#"_($* #,##0.00_);_($* \(#,##0.00\);_($* "-"??_);_(@_)"#),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// A compiled format code.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
enum Section {
    General,
    Numeric(NumericSection),
    Date(Vec<DateToken>),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct NumericSection {
    prefix: String,
    suffix: String,
    has_digits: bool,
    /// `0` placeholders before the decimal point
    int_zeros: usize,
    /// `0` placeholders after the decimal point
    frac_min: usize,
    /// All placeholders after the decimal point
    frac_max: usize,
    grouping: bool,
    /// Trailing commas, each dividing by 1000
    scale: i32,
    percent: i32,
    /// Minimum exponent digits for scientific sections
    exponent: Option<usize>,
    exponent_plus: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Elapsed {
    Hours,
    Minutes,
    Seconds,
}

#[derive(Debug, Clone, PartialEq)]
enum DateToken {
    Year { full: bool },
    /// Run length: 1 `m`, 2 `mm`, 3 `mmm`, 4 `mmmm`, 5+ initial letter
    Month(usize),
    /// Run length: 1 `d`, 2 `dd`, 3 `ddd`, 4+ `dddd`
    Day(usize),
    Hour { padded: bool },
    Minute { padded: bool },
    Second { padded: bool },
    Elapsed(Elapsed),
    Meridiem { short: bool },
    Literal(String),
}

impl NumberFormat {
    /// Compile a format code.
    ///
    /// Returns `None` for `General`, text (`@`) and codes this module does
    /// not interpret; callers keep the stored value for those.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("general") || code == "@" {
            return None;
        }

        let parts = split_sections(code);
        if parts.iter().any(|part| has_condition(part)) {
            return None;
        }

        let mut sections = Vec::with_capacity(3);
        for part in parts.into_iter().take(3) {
            let section = classify_section(part)?;
            sections.push(section);
        }
        if sections.is_empty() {
            return None;
        }
        Some(Self { sections })
    }

    /// Compile a built-in format by id.
    pub fn builtin(id: u32) -> Option<Self> {
        builtin_format(id).and_then(Self::parse)
    }

    /// True when values render as dates or times.
    pub fn is_date(&self) -> bool {
        matches!(self.sections.first(), Some(Section::Date(_)))
    }

    /// Format a value. `date1904` selects the 1904 date system.
    #[allow(clippy::float_cmp)]
    pub fn format(&self, value: f64, date1904: bool) -> String {
        if !value.is_finite() {
            return format_general(value);
        }

        let (section, magnitude, signed) = match self.sections.as_slice() {
            [_, negative, ..] if value < 0.0 => (negative, -value, false),
            [_, _, zero, ..] if value == 0.0 => (zero, 0.0, false),
            [first, ..] => (first, value.abs(), value < 0.0),
            [] => return format_general(value),
        };

        match section {
            Section::General => {
                let text = format_general(magnitude);
                if signed {
                    format!("-{text}")
                } else {
                    text
                }
            }
            Section::Numeric(numeric) => numeric.render(magnitude, signed),
            // Dates before the epoch have no calendar form
            Section::Date(_) if value < 0.0 => format_general(value),
            Section::Date(tokens) => {
                render_date(tokens, magnitude, date1904).unwrap_or_else(|| format_general(value))
            }
        }
    }
}

/// Format a value with a format code, falling back to General.
pub fn format_number(value: f64, code: &str, date1904: bool) -> String {
    match NumberFormat::parse(code) {
        Some(format) => format.format(value, date1904),
        None => format_general(value),
    }
}

/// General format: integers as is, up to ten significant digits otherwise,
/// scientific notation outside `1e-9..1e11`.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    if magnitude != 0.0 && !(1e-9..1e11).contains(&magnitude) {
        let (mantissa, exponent) = split_exponent(magnitude, 5);
        let body = fixed_digits(mantissa, 1, 0, 5, false);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{body}E{exp_sign}{:02}", exponent.unsigned_abs());
    }

    let int_len = if magnitude >= 1.0 {
        usize::try_from(magnitude.log10().floor() as i64 + 1).unwrap_or(1)
    } else {
        1
    };
    let decimals = 10_usize.saturating_sub(int_len);
    format!("{sign}{}", fixed_digits(magnitude, 1, 0, decimals, false))
}

// ============================================================================
// Section parsing
// ============================================================================

/// Split on `;` outside quotes and escapes.
fn split_sections(code: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, ch) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(code.get(start..idx).unwrap_or(""));
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(code.get(start..).unwrap_or(""));
    parts
}

/// `[>100]`, `[<=0]`, `[=1]` style conditions.
fn has_condition(section: &str) -> bool {
    section
        .match_indices('[')
        .any(|(idx, _)| matches!(section.get(idx + 1..idx + 2), Some("<" | ">" | "=")))
}

/// Section text with quoted strings, escapes and bracket tags removed,
/// lowercased. Elapsed-time tags are kept as their letter.
fn bare_tokens(section: &str) -> String {
    let mut out = String::new();
    let mut chars = section.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                for quoted in chars.by_ref() {
                    if quoted == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let tag: String = chars.by_ref().take_while(|&c| c != ']').collect();
                if elapsed_unit(&tag).is_some() {
                    out.push_str(&tag.to_ascii_lowercase());
                }
            }
            c => out.push(c.to_ascii_lowercase()),
        }
    }
    out
}

fn elapsed_unit(tag: &str) -> Option<Elapsed> {
    let first = tag.chars().next()?.to_ascii_lowercase();
    if !tag.chars().all(|c| c.to_ascii_lowercase() == first) {
        return None;
    }
    match first {
        'h' => Some(Elapsed::Hours),
        'm' => Some(Elapsed::Minutes),
        's' => Some(Elapsed::Seconds),
        _ => None,
    }
}

fn classify_section(section: &str) -> Option<Section> {
    let bare = bare_tokens(section);
    let trimmed = bare.trim();

    if trimmed == "general" {
        return Some(Section::General);
    }
    if trimmed.contains('/') && trimmed.contains('?') {
        // Fractions
        return None;
    }
    if trimmed.contains(|c: char| matches!(c, 'y' | 'm' | 'd' | 'h' | 's')) {
        return Some(Section::Date(parse_date_tokens(section)));
    }
    Some(Section::Numeric(parse_numeric(section)))
}

// ============================================================================
// Numeric sections
// ============================================================================

impl NumericSection {
    fn push_literal(&mut self, text: &str) {
        if self.has_digits {
            self.suffix.push_str(text);
        } else {
            self.prefix.push_str(text);
        }
    }

    fn render(&self, magnitude: f64, signed: bool) -> String {
        if !self.has_digits {
            return format!("{}{}", self.prefix, self.suffix);
        }

        let scaled = magnitude * 100_f64.powi(self.percent) / 1000_f64.powi(self.scale);
        let body = match self.exponent {
            Some(digits) => self.render_scientific(scaled, digits),
            None => fixed_digits(
                scaled,
                self.int_zeros,
                self.frac_min,
                self.frac_max,
                self.grouping,
            ),
        };

        // A value that rounds to zero loses its sign
        let mantissa = body.split('E').next().unwrap_or("");
        let nonzero = mantissa.bytes().any(|b| matches!(b, b'1'..=b'9'));
        let sign = if signed && nonzero { "-" } else { "" };
        format!("{sign}{}{body}{}", self.prefix, self.suffix)
    }

    fn render_scientific(&self, magnitude: f64, exponent_digits: usize) -> String {
        let (mantissa, exponent) = split_exponent(magnitude, self.frac_max);
        let body = fixed_digits(
            mantissa,
            self.int_zeros.max(1),
            self.frac_min,
            self.frac_max,
            false,
        );
        let sign = if exponent < 0 {
            "-"
        } else if self.exponent_plus {
            "+"
        } else {
            ""
        };
        format!(
            "{body}E{sign}{:0>width$}",
            exponent.unsigned_abs(),
            width = exponent_digits
        )
    }
}

fn parse_numeric(section: &str) -> NumericSection {
    let mut out = NumericSection::default();
    let mut chars = section.chars().peekable();
    let mut in_fraction = false;
    let mut in_exponent = false;
    let mut pending_commas = 0_i32;

    while let Some(ch) = chars.next() {
        match ch {
            '0' | '#' | '?' => {
                if in_exponent {
                    if let Some(digits) = out.exponent.as_mut() {
                        *digits += 1;
                    }
                } else if in_fraction {
                    pending_commas = 0;
                    out.frac_max += 1;
                    if ch == '0' {
                        out.frac_min += 1;
                    }
                } else {
                    if pending_commas > 0 {
                        out.grouping = true;
                        pending_commas = 0;
                    }
                    if ch == '0' {
                        out.int_zeros += 1;
                    }
                }
                out.has_digits = true;
            }
            '.' if !in_fraction && !in_exponent => {
                out.scale += std::mem::take(&mut pending_commas);
                in_fraction = true;
                out.has_digits = true;
            }
            ',' if out.has_digits && !in_exponent => pending_commas += 1,
            'E' | 'e' if out.has_digits && matches!(chars.peek(), Some('+' | '-')) => {
                out.exponent_plus = chars.next() == Some('+');
                out.exponent = Some(0);
                out.scale += std::mem::take(&mut pending_commas);
                in_exponent = true;
            }
            '"' => {
                let text: String = chars.by_ref().take_while(|&c| c != '"').collect();
                out.push_literal(&text);
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push_literal(next.encode_utf8(&mut [0; 4]));
                }
            }
            '_' | '*' => {
                chars.next();
            }
            '[' => {
                let tag: String = chars.by_ref().take_while(|&c| c != ']').collect();
                // [$€-407] carries a currency symbol; colours are dropped
                if let Some(currency) = tag.strip_prefix('$') {
                    let symbol = currency.split('-').next().unwrap_or("");
                    out.push_literal(symbol);
                }
            }
            other => {
                if other == '%' {
                    out.percent += 1;
                }
                out.push_literal(other.encode_utf8(&mut [0; 4]));
            }
        }
    }

    out.scale += pending_commas;
    if let Some(digits) = out.exponent.as_mut() {
        *digits = (*digits).max(1);
    }
    out
}

/// Mantissa in `[1, 10)` and exponent, with rounding carried into the exponent.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn split_exponent(magnitude: f64, decimals: usize) -> (f64, i32) {
    if magnitude == 0.0 {
        return (0.0, 0);
    }
    let mut exponent = magnitude.log10().floor() as i32;
    let mut mantissa = magnitude / 10_f64.powi(exponent);
    let factor = 10_f64.powi(decimals.min(MAX_DECIMALS) as i32);
    if (mantissa * factor).round() / factor >= 10.0 {
        mantissa /= 10.0;
        exponent += 1;
    }
    (mantissa, exponent)
}

/// Fixed-point digits with rounding half away from zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn fixed_digits(
    magnitude: f64,
    int_zeros: usize,
    frac_min: usize,
    frac_max: usize,
    grouping: bool,
) -> String {
    let frac_max = frac_max.min(MAX_DECIMALS);
    let factor = 10_f64.powi(frac_max as i32);
    let rounded = if magnitude * factor < 1e15 {
        (magnitude * factor).round() / factor
    } else {
        magnitude
    };

    let text = format!("{rounded:.frac_max$}");
    let (int_digits, frac_digits) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let int_digits = int_digits.trim_start_matches('0');

    let mut int_part = format!("{int_digits:0>int_zeros$}");
    if grouping {
        int_part = group_thousands(&int_part);
    }

    let mut frac = frac_digits.to_string();
    while frac.len() > frac_min && frac.ends_with('0') {
        frac.pop();
    }

    if frac.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac}")
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// Date sections
// ============================================================================

fn advance(text: &str, bytes: usize) -> &str {
    text.get(bytes..).unwrap_or("")
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn parse_date_tokens(section: &str) -> Vec<DateToken> {
    let mut tokens = Vec::new();
    let mut rest = section;

    while let Some(ch) = rest.chars().next() {
        if starts_with_ignore_case(rest, "am/pm") {
            tokens.push(DateToken::Meridiem { short: false });
            rest = advance(rest, 5);
            continue;
        }
        if starts_with_ignore_case(rest, "a/p") {
            tokens.push(DateToken::Meridiem { short: true });
            rest = advance(rest, 3);
            continue;
        }

        let lower = ch.to_ascii_lowercase();
        match lower {
            'y' | 'm' | 'd' | 'h' | 's' => {
                let run = rest
                    .chars()
                    .take_while(|c| c.to_ascii_lowercase() == lower)
                    .count();
                tokens.push(match lower {
                    'y' => DateToken::Year { full: run > 2 },
                    'm' => DateToken::Month(run),
                    'd' => DateToken::Day(run),
                    'h' => DateToken::Hour { padded: run > 1 },
                    _ => DateToken::Second { padded: run > 1 },
                });
                rest = advance(rest, run);
            }
            '"' => {
                let body = advance(rest, 1);
                let end = body.find('"').unwrap_or(body.len());
                tokens.push(DateToken::Literal(body.get(..end).unwrap_or("").to_string()));
                rest = advance(body, end + 1);
            }
            '\\' => {
                let body = advance(rest, 1);
                match body.chars().next() {
                    Some(next) => {
                        tokens.push(DateToken::Literal(next.to_string()));
                        rest = advance(body, next.len_utf8());
                    }
                    None => rest = body,
                }
            }
            '[' => {
                let body = advance(rest, 1);
                let end = body.find(']').unwrap_or(body.len());
                if let Some(unit) = elapsed_unit(body.get(..end).unwrap_or("")) {
                    tokens.push(DateToken::Elapsed(unit));
                }
                rest = advance(body, end + 1);
            }
            '_' | '*' => {
                let body = advance(rest, 1);
                rest = match body.chars().next() {
                    Some(next) => advance(body, next.len_utf8()),
                    None => body,
                };
            }
            _ => {
                tokens.push(DateToken::Literal(ch.to_string()));
                rest = advance(rest, ch.len_utf8());
            }
        }
    }

    resolve_minutes(&mut tokens);
    tokens
}

/// `m`/`mm` mean minutes right after an hour or right before a second.
fn resolve_minutes(tokens: &mut [DateToken]) {
    let is_field = |t: &&DateToken| !matches!(t, DateToken::Literal(_));

    for idx in 0..tokens.len() {
        let Some(&DateToken::Month(run)) = tokens.get(idx) else {
            continue;
        };
        if run > 2 {
            continue;
        }
        let after_hour = tokens.iter().take(idx).rev().find(is_field).is_some_and(|t| {
            matches!(t, DateToken::Hour { .. } | DateToken::Elapsed(Elapsed::Hours))
        });
        let before_second = tokens.iter().skip(idx + 1).find(is_field).is_some_and(|t| {
            matches!(t, DateToken::Second { .. } | DateToken::Elapsed(Elapsed::Seconds))
        });
        if after_hour || before_second {
            if let Some(token) = tokens.get_mut(idx) {
                *token = DateToken::Minute { padded: run == 2 };
            }
        }
    }
}

/// Proleptic Gregorian date for a day count from 1970-01-01.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Calendar date of a serial day, keeping the 1900 system's phantom leap day.
fn serial_to_ymd(serial: i64, date1904: bool) -> (i64, i64, i64) {
    if date1904 {
        return civil_from_days(serial + EPOCH_1904);
    }
    match serial {
        0 => (1900, 1, 0),
        60 => (1900, 2, 29),
        1..=59 => civil_from_days(serial + EPOCH_1900_EARLY),
        _ => civil_from_days(serial + EPOCH_1900),
    }
}

fn name_of<'a>(names: &[&'a str], index: i64) -> &'a str {
    usize::try_from(index)
        .ok()
        .and_then(|i| names.get(i))
        .copied()
        .unwrap_or("")
}

#[allow(clippy::cast_possible_truncation)]
fn render_date(tokens: &[DateToken], value: f64, date1904: bool) -> Option<String> {
    let total = (value * SECONDS_PER_DAY).round();
    if !(0.0..1e15).contains(&total) {
        return None;
    }
    let total = total as i64;
    let serial = total / 86_400;
    let secs = total % 86_400;

    let (year, month, day) = serial_to_ymd(serial, date1904);
    let epoch = if date1904 { EPOCH_1904 } else { EPOCH_1900 };
    let weekday = (serial + epoch + 4).rem_euclid(7);
    let hour = secs / 3600;
    let minute = secs % 3600 / 60;
    let second = secs % 60;

    let twelve_hour = tokens
        .iter()
        .any(|t| matches!(t, DateToken::Meridiem { .. }));
    let shown_hour = match (twelve_hour, hour % 12) {
        (true, 0) => 12,
        (true, h) => h,
        (false, _) => hour,
    };

    let mut out = String::new();
    for token in tokens {
        match token {
            DateToken::Year { full: true } => out.push_str(&format!("{year:04}")),
            DateToken::Year { full: false } => {
                out.push_str(&format!("{:02}", year.rem_euclid(100)));
            }
            DateToken::Month(1) => out.push_str(&month.to_string()),
            DateToken::Month(2) => out.push_str(&format!("{month:02}")),
            DateToken::Month(3) => {
                out.extend(name_of(&MONTHS, month - 1).chars().take(3));
            }
            DateToken::Month(4) => out.push_str(name_of(&MONTHS, month - 1)),
            DateToken::Month(_) => out.extend(name_of(&MONTHS, month - 1).chars().take(1)),
            DateToken::Day(1) => out.push_str(&day.to_string()),
            DateToken::Day(2) => out.push_str(&format!("{day:02}")),
            DateToken::Day(3) => out.extend(name_of(&WEEKDAYS, weekday).chars().take(3)),
            DateToken::Day(_) => out.push_str(name_of(&WEEKDAYS, weekday)),
            DateToken::Hour { padded: true } => out.push_str(&format!("{shown_hour:02}")),
            DateToken::Hour { padded: false } => out.push_str(&shown_hour.to_string()),
            DateToken::Minute { padded: true } => out.push_str(&format!("{minute:02}")),
            DateToken::Minute { padded: false } => out.push_str(&minute.to_string()),
            DateToken::Second { padded: true } => out.push_str(&format!("{second:02}")),
            DateToken::Second { padded: false } => out.push_str(&second.to_string()),
            DateToken::Elapsed(Elapsed::Hours) => out.push_str(&(total / 3600).to_string()),
            DateToken::Elapsed(Elapsed::Minutes) => out.push_str(&(total / 60).to_string()),
            DateToken::Elapsed(Elapsed::Seconds) => out.push_str(&total.to_string()),
            DateToken::Meridiem { short } => {
                let pm = hour >= 12;
                out.push_str(match (short, pm) {
                    (false, false) => "AM",
                    (false, true) => "PM",
                    (true, false) => "A",
                    (true, true) => "P",
                });
            }
            DateToken::Literal(text) => out.push_str(text),
        }
    }
    Some(out)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.5, "0%", "50%")]
    #[test_case(0.1234, "0.00%", "12.34%")]
    #[test_case(1234.5, "#,##0", "1,235")]
    #[test_case(1234.567, "#,##0.00", "1,234.57")]
    #[test_case(3.0, "0.00", "3.00")]
    #[test_case(0.125, "0.00", "0.13")]
    #[test_case(-1.5, "0.00", "-1.50")]
    #[test_case(-5.0, "$#,##0.00", "-$5.00")]
    #[test_case(7.0, "000", "007")]
    #[test_case(0.5, "#.##", ".5")]
    #[test_case(1_500_000.0, "#,##0.0,,\"M\"", "1.5M")]
    #[test_case(12.0, "0 \"kg\"", "12 kg")]
    #[test_case(12.0, "[$€-407]#,##0", "€12")]
    #[test_case(12.0, "[Red]0.0", "12.0")]
    fn test_numeric_sections(value: f64, code: &str, expected: &str) {
        assert_eq!(format_number(value, code, false), expected);
    }

    #[test_case(12345.678, "0.00E+00", "1.23E+04")]
    #[test_case(0.00012, "0.00E+00", "1.20E-04")]
    #[test_case(9.999, "0.0E+0", "1.0E+1")]
    fn test_scientific(value: f64, code: &str, expected: &str) {
        assert_eq!(format_number(value, code, false), expected);
    }

    #[test]
    fn test_sections_pick_by_sign() {
        let code = "#,##0;(#,##0);\"zero\"";
        assert_eq!(format_number(1234.0, code, false), "1,234");
        assert_eq!(format_number(-1234.0, code, false), "(1,234)");
        assert_eq!(format_number(0.0, code, false), "zero");
        // Negative values that round to zero lose the sign
        assert_eq!(format_number(-0.001, "0.00", false), "0.00");
    }

    #[test]
    fn test_builtin_accounting() {
        let format = NumberFormat::builtin(43).unwrap();
        assert_eq!(format.format(1234.5, false), "1,234.50");
        assert_eq!(format.format(-1234.5, false), "(1,234.50)");
        assert_eq!(format.format(0.0, false), "-");
    }

    #[test_case(45306.0, "yyyy-mm-dd", "2024-01-15")]
    #[test_case(45306.0, "mm-dd-yy", "01-15-24")]
    #[test_case(45306.0, "d-mmm-yy", "15-Jan-24")]
    #[test_case(45306.0, "dddd, mmmm d", "Monday, January 15")]
    #[test_case(45306.75, "h:mm AM/PM", "6:00 PM")]
    #[test_case(45306.5, "hh:mm:ss", "12:00:00")]
    #[test_case(0.0416666666667, "h:mm", "1:00")]
    #[test_case(1.5, "[h]:mm:ss", "36:00:00")]
    #[test_case(45306.0, "m/d/yy h:mm", "1/15/24 0:00")]
    #[test_case(59.0, "yyyy-mm-dd", "1900-02-28")]
    #[test_case(60.0, "yyyy-mm-dd", "1900-02-29")]
    #[test_case(61.0, "yyyy-mm-dd", "1900-03-01")]
    fn test_dates(value: f64, code: &str, expected: &str) {
        assert_eq!(format_number(value, code, false), expected);
    }

    #[test]
    fn test_1904_date_system() {
        assert_eq!(format_number(0.0, "yyyy-mm-dd", true), "1904-01-01");
        assert_eq!(format_number(43844.0, "yyyy-mm-dd", true), "2024-01-15");
    }

    #[test]
    fn test_minutes_versus_months() {
        assert_eq!(format_number(45306.0 + 5.0 / 1440.0, "mm", false), "01");
        assert_eq!(format_number(45306.0 + 5.0 / 1440.0, "h:mm", false), "0:05");
        assert_eq!(format_number(125.0 / 86_400.0, "mm:ss", false), "02:05");
    }

    #[test]
    fn test_uninterpreted_codes() {
        assert!(NumberFormat::parse("General").is_none());
        assert!(NumberFormat::parse("@").is_none());
        assert!(NumberFormat::parse("# ?/?").is_none());
        assert!(NumberFormat::parse("[>100]0;0.00").is_none());
        assert!(NumberFormat::builtin(14).unwrap().is_date());
        assert!(!NumberFormat::builtin(9).unwrap().is_date());
    }

    #[test]
    fn test_general() {
        assert_eq!(format_general(42.0), "42");
        assert_eq!(format_general(-3.25), "-3.25");
        assert_eq!(format_general(1.0 / 3.0), "0.333333333");
        assert_eq!(format_general(1.5e12), "1.5E+12");
        assert_eq!(format_general(0.0), "0");
    }
}
