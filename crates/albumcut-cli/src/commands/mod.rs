pub mod config;
pub mod cut;
pub mod doctor;
