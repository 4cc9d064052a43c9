pub mod publish;
pub mod sync;
