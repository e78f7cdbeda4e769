pub mod probe;
pub mod runner;

pub use probe::{test_file_for, Prober};
pub use runner::GoTestRunner;
