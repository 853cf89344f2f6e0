//! YAML frontmatter parsing and rendering
//!
//! Each record file carries its data as YAML frontmatter delimited by `---`,
//! followed by a short markdown body for people browsing the repository:
//!
//! ```markdown
//! ---
//! _id: 4f1c2a9e0b7d4e58a1c3b2d4e5f60718
//! seatNumber: 3
//! account: tkubm1760
//! name: Lin
//! ---
//!
//! # Lin
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Parse frontmatter into `T`, returning it with the remaining body
pub fn parse<T: DeserializeOwned>(content: &str) -> Result<(T, String)> {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return Err(Error::YamlParse {
            message: "missing frontmatter".to_string(),
        });
    }

    // Find the closing delimiter
    let rest = &content[3..];
    let end_pos = rest.find("\n---").ok_or_else(|| Error::YamlParse {
        message: "unclosed frontmatter: missing closing ---".to_string(),
    })?;

    let yaml_content = rest[..end_pos].trim();
    let body_start = end_pos + 4; // Skip past "\n---"
    let body = rest[body_start..].trim_start_matches('\n').to_string();

    let value: T = serde_yaml::from_str(yaml_content)?;
    Ok((value, body))
}

/// Render `value` as frontmatter followed by `body`
pub fn render<T: Serialize>(value: &T, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(value).map_err(|err| Error::YamlSerialize {
        message: err.to_string(),
    })?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{sample_profile, Student};

    #[test]
    fn test_parse_frontmatter() {
        let content = r#"---
_id: abc123
seatNumber: 42
account: tkubm1760
name: Lin
department: Banking
gradeYear: "2"
className: A
email: lin@example.com
---

# Lin
"#;

        let (student, body): (Student, String) = parse(content).unwrap();

        assert_eq!(student.id, "abc123");
        assert_eq!(student.seat_number, 42);
        assert_eq!(student.profile.grade_year, "2");
        assert!(body.contains("# Lin"));
    }

    #[test]
    fn test_missing_frontmatter_is_an_error() {
        let result: Result<(Student, String)> = parse("# Just a document\n");
        assert!(matches!(result, Err(Error::YamlParse { .. })));
    }

    #[test]
    fn test_unclosed_frontmatter_is_an_error() {
        let result: Result<(Student, String)> = parse("---\nname: Lin\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_looking_strings_survive() {
        let student = Student::new("abc", 1, sample_profile("tku0787", "0042"));
        let rendered = render(&student, "# 0042\n").unwrap();
        let (parsed, _): (Student, String) = parse(&rendered).unwrap();

        assert_eq!(parsed.profile.name, "0042");
        assert_eq!(parsed, student);
    }
}
