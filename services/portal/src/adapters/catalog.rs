//! services/portal/src/adapters/catalog.rs
//!
//! The teacher catalog. There is no live search endpoint on the backend, so
//! the portal ships a fixed set of sample teachers behind the
//! `TeacherCatalog` port.

use async_trait::async_trait;
use padho_likho_core::domain::Teacher;
use padho_likho_core::ports::{PortError, PortResult, TeacherCatalog};

pub struct SampleTeacherCatalog {
    teachers: Vec<Teacher>,
}

impl SampleTeacherCatalog {
    pub fn new(teachers: Vec<Teacher>) -> Self {
        Self { teachers }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SampleTeacherCatalog {
    fn default() -> Self {
        Self::new(vec![
            Teacher {
                id: "1".to_string(),
                name: "Priya Sharma".to_string(),
                hourly_rate: 500.0,
                subjects: strings(&["Mathematics", "Physics"]),
                classes: strings(&["9", "10", "11", "12"]),
                availability: strings(&["10:00 AM", "11:00 AM", "4:00 PM", "5:00 PM"]),
            },
            Teacher {
                id: "2".to_string(),
                name: "Rajesh Kumar".to_string(),
                hourly_rate: 600.0,
                subjects: strings(&["Chemistry", "Biology"]),
                classes: strings(&["11", "12"]),
                availability: strings(&["9:00 AM", "2:00 PM", "6:00 PM"]),
            },
            Teacher {
                id: "3".to_string(),
                name: "Anita Desai".to_string(),
                hourly_rate: 450.0,
                subjects: strings(&["English", "Hindi"]),
                classes: strings(&["6", "7", "8", "9", "10"]),
                availability: strings(&["3:00 PM", "4:00 PM", "7:00 PM"]),
            },
            Teacher {
                id: "4".to_string(),
                name: "Vikram Singh".to_string(),
                hourly_rate: 700.0,
                subjects: strings(&["Mathematics", "Computer Science"]),
                classes: strings(&["11", "12"]),
                availability: strings(&["8:00 AM", "6:00 PM", "8:00 PM"]),
            },
        ])
    }
}

#[async_trait]
impl TeacherCatalog for SampleTeacherCatalog {
    async fn list_teachers(&self, subject: Option<&str>) -> PortResult<Vec<Teacher>> {
        let wanted = subject.map(str::to_lowercase);
        Ok(self
            .teachers
            .iter()
            .filter(|teacher| match &wanted {
                Some(wanted) => teacher
                    .subjects
                    .iter()
                    .any(|s| s.to_lowercase().contains(wanted.as_str())),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn teacher(&self, id: &str) -> PortResult<Teacher> {
        self.teachers
            .iter()
            .find(|teacher| teacher.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Teacher {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filters_by_subject_case_insensitively() {
        let catalog = SampleTeacherCatalog::default();

        let maths = catalog.list_teachers(Some("mathem")).await.unwrap();
        let names: Vec<_> = maths.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Priya Sharma", "Vikram Singh"]);

        assert_eq!(catalog.list_teachers(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unknown_teacher_is_not_found() {
        let catalog = SampleTeacherCatalog::default();
        assert_eq!(catalog.teacher("2").await.unwrap().hourly_rate, 600.0);
        assert!(matches!(catalog.teacher("99").await, Err(PortError::NotFound(_))));
    }
}
