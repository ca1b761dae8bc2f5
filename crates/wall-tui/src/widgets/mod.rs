pub mod source_input;
pub mod toast;
