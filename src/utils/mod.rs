// Small shared utilities: id generation, scoped timing, logging bootstrap.

pub mod id_gen;
pub mod logging;
pub mod scoped_timer;

pub use id_gen::IdGenerator;
pub use scoped_timer::ScopedTimer;
