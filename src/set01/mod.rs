pub mod c02;
pub mod c03;
pub mod c07;
pub mod c08;
