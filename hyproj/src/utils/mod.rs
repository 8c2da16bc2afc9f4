pub mod lazy;

pub use lazy::Lazy;
