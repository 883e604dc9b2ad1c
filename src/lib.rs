pub mod ast;
pub mod number;
pub mod parser;
pub mod tokenizer;
pub mod transpiler;
pub mod tree_walk_interpreter;
