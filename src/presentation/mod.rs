// Presentation layer - Rendering of run views
pub mod console;
