pub mod fields;
pub mod nav;
