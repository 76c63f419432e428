// Business domains
pub mod pages;
