//! Student records and the typed field vocabulary used to query them
//!
//! Wire names follow the roster front-end (`_id`, `seatNumber`, ...). Input
//! payloads also accept the field names the legacy forms posted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A persisted student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Store-assigned identifier
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Sequential number assigned at creation
    pub seat_number: u32,

    #[serde(flatten)]
    pub profile: StudentProfile,
}

/// The caller-supplied part of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub account: String,
    pub name: String,
    pub department: String,
    pub grade_year: String,
    pub class_name: String,
    pub email: String,
}

/// Creation payload. Every field is optional so absence can be reported by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[serde(default, alias = "帳號")]
    pub account: Option<String>,
    #[serde(default, alias = "姓名")]
    pub name: Option<String>,
    #[serde(default, alias = "院系")]
    pub department: Option<String>,
    #[serde(default, alias = "年級", alias = "grade")]
    pub grade_year: Option<String>,
    #[serde(default, alias = "班級", alias = "class")]
    pub class_name: Option<String>,
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
}

/// Partial update. `seatNumber` and `_id` are owned by the store and allocator.
pub type StudentPatch = NewStudent;

impl NewStudent {
    /// The value supplied for one of the six input fields
    pub fn get(&self, field: StudentField) -> Option<&str> {
        match field {
            StudentField::Account => self.account.as_deref(),
            StudentField::Name => self.name.as_deref(),
            StudentField::Department => self.department.as_deref(),
            StudentField::GradeYear => self.grade_year.as_deref(),
            StudentField::ClassName => self.class_name.as_deref(),
            StudentField::Email => self.email.as_deref(),
            StudentField::Id | StudentField::SeatNumber => None,
        }
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        StudentField::INPUT.iter().all(|field| self.get(*field).is_none())
    }
}

/// A field of [`Student`] that can be queried or sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentField {
    Id,
    Account,
    SeatNumber,
    Name,
    Department,
    GradeYear,
    ClassName,
    Email,
}

impl StudentField {
    /// Caller-supplied fields, in the order creation checks them
    pub const INPUT: [StudentField; 6] = [
        StudentField::Account,
        StudentField::Name,
        StudentField::Department,
        StudentField::GradeYear,
        StudentField::ClassName,
        StudentField::Email,
    ];

    /// Name used on the wire
    pub fn wire_name(self) -> &'static str {
        match self {
            StudentField::Id => "_id",
            StudentField::Account => "account",
            StudentField::SeatNumber => "seatNumber",
            StudentField::Name => "name",
            StudentField::Department => "department",
            StudentField::GradeYear => "gradeYear",
            StudentField::ClassName => "className",
            StudentField::Email => "email",
        }
    }

    /// Name used in messages
    pub fn label(self) -> &'static str {
        match self {
            StudentField::Id => "Id",
            StudentField::Account => "Account",
            StudentField::SeatNumber => "Seat Number",
            StudentField::Name => "Name",
            StudentField::Department => "Department",
            StudentField::GradeYear => "Grade",
            StudentField::ClassName => "Class",
            StudentField::Email => "Email",
        }
    }
}

impl fmt::Display for StudentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for StudentField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "_id" | "id" => StudentField::Id,
            "account" | "帳號" => StudentField::Account,
            "seatNumber" | "座號" => StudentField::SeatNumber,
            "name" | "姓名" => StudentField::Name,
            "department" | "院系" => StudentField::Department,
            "gradeYear" | "grade" | "年級" => StudentField::GradeYear,
            "className" | "class" | "班級" => StudentField::ClassName,
            "email" | "Email" => StudentField::Email,
            _ => {
                return Err(Error::UnknownField {
                    name: s.to_string(),
                })
            }
        };
        Ok(field)
    }
}

/// A field value borrowed from a record, ordered numbers-before-text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue<'a> {
    Number(u32),
    Text(&'a str),
}

impl Student {
    /// Assemble a record from its parts
    pub fn new(id: impl Into<String>, seat_number: u32, profile: StudentProfile) -> Self {
        Self {
            id: id.into(),
            seat_number,
            profile,
        }
    }

    /// Read a field
    pub fn field(&self, field: StudentField) -> FieldValue<'_> {
        match field {
            StudentField::Id => FieldValue::Text(&self.id),
            StudentField::SeatNumber => FieldValue::Number(self.seat_number),
            StudentField::Account => FieldValue::Text(&self.profile.account),
            StudentField::Name => FieldValue::Text(&self.profile.name),
            StudentField::Department => FieldValue::Text(&self.profile.department),
            StudentField::GradeYear => FieldValue::Text(&self.profile.grade_year),
            StudentField::ClassName => FieldValue::Text(&self.profile.class_name),
            StudentField::Email => FieldValue::Text(&self.profile.email),
        }
    }

    /// Equality against a raw query value.
    ///
    /// Seat numbers compare numerically, so `"05"` matches seat 5.
    pub fn field_equals(&self, field: StudentField, value: &str) -> bool {
        match self.field(field) {
            FieldValue::Number(n) => value.trim().parse::<u32>().map(|v| v == n).unwrap_or(false),
            FieldValue::Text(text) => text == value,
        }
    }

    /// Merge the set fields of a patch into this record
    pub fn apply(&mut self, patch: &StudentPatch) {
        let profile = &mut self.profile;
        if let Some(account) = &patch.account {
            profile.account = account.clone();
        }
        if let Some(name) = &patch.name {
            profile.name = name.clone();
        }
        if let Some(department) = &patch.department {
            profile.department = department.clone();
        }
        if let Some(grade_year) = &patch.grade_year {
            profile.grade_year = grade_year.clone();
        }
        if let Some(class_name) = &patch.class_name {
            profile.class_name = class_name.clone();
        }
        if let Some(email) = &patch.email {
            profile.email = email.clone();
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_profile(account: &str, name: &str) -> StudentProfile {
    StudentProfile {
        account: account.to_string(),
        name: name.to_string(),
        department: "Banking and Finance".to_string(),
        grade_year: "2".to_string(),
        class_name: "A".to_string(),
        email: format!("{}@mail.tku.edu.tw", account),
    }
}
