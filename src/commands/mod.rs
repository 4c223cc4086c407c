/// Create a new project from a template repository.
pub mod scaffold;
