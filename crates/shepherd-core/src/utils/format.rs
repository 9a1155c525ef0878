use std::cmp::Ordering;

/// Format a Brazilian phone number for display.
///
/// Area code plus 8 digits (landline) or 9 digits (mobile) become
/// "(11) 3456-7890" / "(11) 98765-4321"; a leading 55 country code is kept as
/// "+55 ". Other country codes and anything else are shown as stored.
pub fn format_phone(phone: &str) -> String {
    let trimmed = phone.trim_start();
    if trimmed.starts_with('+') && !trimmed.starts_with("+55") {
        return phone.to_string();
    }
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 | 11 => national(&digits),
        12 | 13 if digits.starts_with("55") => format!("+55 {}", national(&digits[2..])),
        _ => phone.to_string(),
    }
}

/// `digits` is a 2-digit area code followed by 8 or 9 digits.
fn national(digits: &str) -> String {
    let (area, number) = digits.split_at(2);
    let (head, tail) = number.split_at(number.len() - 4);
    format!("({}) {}-{}", area, head, tail)
}

/// Truncate to `max_len` characters, adding an ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an ISO date or date-time as "Mar 05, 2026".
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Some(d) = date
        .get(..10)
        .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    {
        d.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("(11) 3456-7890"), "(11) 3456-7890");
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("+55 11 91234-5678"), "+55 (11) 91234-5678");
        assert_eq!(format_phone("551134567890"), "+55 (11) 3456-7890");
        assert_eq!(format_phone("190"), "190");
        assert_eq!(format_phone("+1 555 123 4567"), "+1 555 123 4567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("São João", 6), "São...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-03-05T19:00:00Z"), "Mar 05, 2026");
        assert_eq!(format_date("2026-03-05"), "Mar 05, 2026");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("abc", "ABC"), Ordering::Equal);
        assert_eq!(cmp_ignore_case("apple", "Banana"), Ordering::Less);
    }
}
