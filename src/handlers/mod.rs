pub mod login;
pub mod navbar;
pub mod student_form;
pub mod students;
