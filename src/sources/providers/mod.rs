// src/sources/providers/mod.rs
pub mod adb;
pub mod bdjobs;
pub mod bppa;
pub mod care;
pub mod pksf;
pub mod undp;
pub mod ungm;
pub mod worldbank;
