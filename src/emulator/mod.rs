pub mod basics;
pub mod interpreter;
pub mod machine;
pub mod program;
