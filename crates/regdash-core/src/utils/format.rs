/// Format a count with thousands separators: 12345 -> "12,345"
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Share of `part` in `total` as a percentage with one decimal
pub fn format_percent(part: usize, total: usize) -> String {
    format_share(part as f64, total as f64)
}

/// Like `format_percent`, for summed values
pub fn format_share(part: f64, total: f64) -> String {
    if total == 0.0 {
        return "-".to_string();
    }
    format!("{:.1}%", part * 100.0 / total)
}

/// Whole sums get thousands separators, fractional ones one decimal
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let digits = format_count(value.abs() as usize);
        if value < 0.0 {
            format!("-{}", digits)
        } else {
            digits
        }
    } else {
        format!("{:.1}", value)
    }
}

/// Format an optional age for display
pub fn format_age(age: Option<f64>) -> String {
    match age {
        Some(a) if a.fract() == 0.0 => format!("{}", a as i64),
        Some(a) => format!("{:.1}", a),
        None => "-".to_string(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}
