mod ask;
mod root;

pub use root::Cli;
