//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no camera or
//! PLC attached.

mod loop_tests;
mod mock_hw;
mod session_tests;
