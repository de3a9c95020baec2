pub mod batch_import;
pub mod field_rules;
pub mod language;
pub mod line_parser;
pub mod media_acquirer;
pub mod reference_resolver;
