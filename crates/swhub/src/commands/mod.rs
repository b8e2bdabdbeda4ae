pub mod disconnect;
pub mod fetch;
