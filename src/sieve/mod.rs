pub mod ast;
pub mod builder;
pub mod emitter;
pub mod header;
