//! School resource models: classes and leave requests

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_status_conversions;

/// Label shown for a class without an assigned teacher
pub const NO_TEACHER_LABEL: &str = "Chưa có giáo viên";

/// A class as displayed in the admin views
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    /// Backend id; `None` before creation
    pub id: Option<i64>,
    /// Display name
    pub class_name: String,
    /// Short code
    pub class_code: String,
    /// Grade (Mầm, Chồi, Lá)
    pub grade: String,
    /// Room the class meets in
    pub room_number: String,
    /// Academic year, e.g. `2025-2026`
    pub academic_year: String,
    /// Assigned teacher or a placeholder label
    pub teacher_name: String,
    /// Enrolled students
    pub student_current: i64,
    /// Seat limit, when set
    pub student_capacity: Option<i64>,
    /// Lifecycle status; `active` when the backend omits it
    pub status: String,
}

impl ClassRecord {
    /// Normalise a backend class row, filling display defaults.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        let teacher_name = text("teacherName");
        let status = text("status");

        Self {
            id: raw.get("id").and_then(Value::as_i64),
            class_name: text("className"),
            class_code: text("classCode"),
            grade: text("grade"),
            room_number: text("roomNumber"),
            academic_year: text("academicYear"),
            teacher_name: if teacher_name.is_empty() {
                NO_TEACHER_LABEL.to_string()
            } else {
                teacher_name
            },
            student_current: raw.get("studentCurrent").and_then(Value::as_i64).unwrap_or(0),
            student_capacity: raw.get("studentCapacity").and_then(Value::as_i64),
            status: if status.is_empty() { "active".to_string() } else { status },
        }
    }

    /// Display name, falling back to the code and then the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        if !self.class_name.is_empty() {
            self.class_name.clone()
        } else if !self.class_code.is_empty() {
            self.class_code.clone()
        } else {
            format!("Lớp #{}", self.id.unwrap_or_default())
        }
    }
}

/// Body for creating or updating a class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPayload {
    /// Display name
    pub class_name: String,
    /// Grade
    pub grade: String,
    /// Room
    pub room_number: String,
    /// Academic year
    pub academic_year: String,
    /// Teacher to assign
    pub teacher_id: Option<i64>,
}

impl ClassPayload {
    /// Copy with surrounding whitespace removed from every text field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            class_name: self.class_name.trim().to_string(),
            grade: self.grade.trim().to_string(),
            room_number: self.room_number.trim().to_string(),
            academic_year: self.academic_year.trim().to_string(),
            teacher_id: self.teacher_id,
        }
    }
}

/// Dropdown entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOption {
    /// Class id
    pub value: i64,
    /// Text shown in the dropdown
    pub label: String,
}

/// Processing state of a leave request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    /// Just filed
    #[default]
    New,
    /// Awaiting a decision
    Pending,
    /// Accepted by the teacher
    Approved,
    /// Declined by the teacher
    Rejected,
    /// Withdrawn by the parent
    Cancelled,
}

impl_status_conversions!(LeaveStatus {
    New => "NEW",
    Pending => "PENDING",
    Approved => "APPROVED",
    Rejected => "REJECTED",
    Cancelled => "CANCELLED",
});

/// A parent's request for a student to be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaveRequest {
    /// Backend id
    pub id: i64,
    /// Student the request is for
    pub student_id: Option<i64>,
    /// Student display name
    pub student_name: String,
    /// Parent who filed the request
    pub parent_name: String,
    /// Class of the student
    pub class_id: Option<i64>,
    /// Class display name
    pub class_name: String,
    /// First day of absence, `yyyy-MM-dd`
    pub from_date: String,
    /// Last day of absence, `yyyy-MM-dd`
    pub to_date: String,
    /// Reason given by the parent
    pub reason: String,
    /// Processing state
    pub status: LeaveStatus,
    /// Note left by the deciding teacher
    pub teacher_note: Option<String>,
    /// Creation timestamp as sent by the backend
    pub created_at: Option<String>,
    /// Teacher who decided the request
    pub processed_by: Option<String>,
}
