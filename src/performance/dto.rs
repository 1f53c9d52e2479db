use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceOverview {
    pub lecture_attendance: f64,
    pub assignments_completed: f64,
    pub total_xp: i64,
    pub streak_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursePerformance {
    pub course_hash: String,
    pub course_name: String,
    pub attendance: f64,
    pub assignments: f64,
    pub quizzes: Option<f64>,
}
