pub mod form;
pub mod path_template;
pub mod redact;
