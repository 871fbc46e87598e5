// Report renderers
pub mod md;
