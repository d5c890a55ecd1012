pub mod api;
pub mod basic;
pub mod pages;
