//! # Module: stats
//!
//! Pure numeric building blocks of the sample-size engine.
//!
//! ## Sub-modules
//! - [`quantile`]: inverse standard-normal CDF (Acklam) and forward CDF
//! - [`sample_size`]: two-proportion z-test users per arm
//! - [`duration`]: days until the slower arm fills

pub mod quantile;
pub mod sample_size;
pub mod duration;

pub use duration::{arm_daily_traffic, duration_days};
pub use quantile::{inverse_normal_cdf, normal_cdf};
pub use sample_size::{expected_variant_rate, sample_size_per_group};
