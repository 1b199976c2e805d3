//! Evaluator configuration.
//!
//! An explicit immutable struct handed to the machine at construction
//! time. There is no hidden global configuration.

use std::path::PathBuf;

/// Configuration for module resolution and evaluation.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Acceptable source-file suffixes, tried in order.
    pub extensions: Vec<String>,
    /// Directories searched for modules, in order.
    pub input_paths: Vec<PathBuf>,
    /// Upper bound on reduce worker threads. Always positive.
    pub max_threads: usize,
    /// Print module-load and entry-point timing.
    pub show_timing: bool,
    /// Run module unit tests after loading (driver concern; stored here
    /// so drivers share one configuration bag).
    pub run_unit_tests: bool,
    /// Dump the surface grammar (driver concern).
    pub output_grammar: bool,
    /// Dump the primitive registry (driver concern).
    pub output_primitives: bool,
    /// Wait for a keypress before exiting (driver concern).
    pub wait_for_keypress: bool,
}

impl EvalConfig {
    /// Host parallelism, used as the default reduce worker bound.
    pub fn host_parallelism() -> usize {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            extensions: vec![".heron".to_string()],
            input_paths: vec![PathBuf::from(".")],
            max_threads: Self::host_parallelism(),
            show_timing: false,
            run_unit_tests: false,
            output_grammar: false,
            output_primitives: false,
            wait_for_keypress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_positive_thread_bound() {
        assert!(EvalConfig::default().max_threads >= 1);
    }
}
