use serde::{Deserialize, Serialize};

use crate::utils::format_phone;

/// A registered church member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// "Last, First" for sorted listings
    pub fn sort_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    pub fn display_phone(&self) -> String {
        match self.phone.as_deref() {
            Some(phone) if !phone.is_empty() => format_phone(phone),
            _ => "-".to_string(),
        }
    }

    /// Case-insensitive match on first name, last name or phone digits.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let lower = query.to_lowercase();
        if self.full_name().to_lowercase().contains(&lower) {
            return true;
        }
        let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return false;
        }
        self.phone
            .as_deref()
            .map(|p| {
                let phone_digits: String = p.chars().filter(|c| c.is_ascii_digit()).collect();
                phone_digits.contains(&digits)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(first: &str, last: &str, phone: Option<&str>) -> Person {
        Person {
            id: 1,
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: phone.map(String::from),
            avatar: None,
        }
    }

    #[test]
    fn test_parse_person() {
        let json = r#"{"id": 42, "firstName": "Ana", "lastName": "Souza", "phone": "11987654321", "avatar": null}"#;
        let p: Person = serde_json::from_str(json).expect("Failed to parse person JSON");
        assert_eq!(p.id, 42);
        assert_eq!(p.full_name(), "Ana Souza");
        assert_eq!(p.display_phone(), "(11) 98765-4321");
        assert!(p.avatar.is_none());
    }

    #[test]
    fn test_parse_person_missing_optional_fields() {
        let json = r#"{"id": 7, "firstName": "Paulo", "lastName": "Lima"}"#;
        let p: Person = serde_json::from_str(json).expect("Failed to parse person JSON");
        assert_eq!(p.display_phone(), "-");
        assert_eq!(p.sort_name(), "Lima, Paulo");
    }

    #[test]
    fn test_matches() {
        let p = person("Maria", "Oliveira", Some("(21) 98765-4321"));
        assert!(p.matches("mar"));
        assert!(p.matches("OLIV"));
        assert!(p.matches("maria oli"));
        assert!(p.matches("98765"));
        assert!(p.matches(""));
        assert!(!p.matches("john"));
        assert!(!p.matches("1111"));
    }
}
