pub mod benford;
pub mod digits;
