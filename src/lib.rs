//! Sample-size and duration planning for two-proportion A/B tests.
//!
//! The core is a pure pipeline: [`validate()`] the six raw inputs, derive the
//! critical values with [`stats::inverse_normal_cdf`], size each arm and
//! estimate the duration. [`engine::compute`] runs all of it.
//!
//! ```
//! use ab_sizer::{compute, RawInputs};
//!
//! let c = compute(&RawInputs::default()).unwrap();
//! let r = c.result.unwrap();
//! assert_eq!(r.total_sample_size, 2.0 * r.sample_size_per_group);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod share;
pub mod stats;
pub mod toggles;
pub mod validate;
pub mod web;

pub use engine::{compute, CalculationResult, Computation};
pub use error::{Result, SizerError};
pub use validate::{validate, Field, ParsedInputs, RawInputs};
