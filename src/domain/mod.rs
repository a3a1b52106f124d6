pub mod engine;
pub mod errors;
pub mod lexer;
pub mod models;
pub mod parser;

pub use engine::*;
pub use errors::*;
pub use lexer::*;
pub use models::*;
pub use parser::*;
