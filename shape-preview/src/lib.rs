//! Liquidity shape previews for DLMM pools
//!
//! Turns a named weight curve into per-bin weights and splits an integer
//! deposit across the bins on both sides of the active bin, without touching
//! the chain:
//!
//! ```
//! use shape_preview::{allocate, generate_weights, AllocationConstraints, ShapeParams};
//!
//! let params = ShapeParams::from([("ratio".to_string(), 0.5)]);
//! let left = generate_weights("exponential", 3, &params).unwrap();
//! let right = generate_weights("flat", 2, &ShapeParams::new()).unwrap();
//!
//! let result = allocate(1_000, &left, &right, &AllocationConstraints::default()).unwrap();
//! assert_eq!(result.total_allocated, 1_000);
//! assert_eq!(result.remainder, 0);
//! ```

pub mod allocation;
pub mod amounts;
pub mod config;
pub mod error;
pub mod types;
pub mod weights;

pub use allocation::{allocate, preview_from_shapes};
pub use error::{PreviewError, Result};
pub use types::{AllocationConstraints, AllocationResult, ShapeFamily, ShapeParams, ShapeSpec};
pub use weights::{generate_weights, generate_weights_for};
