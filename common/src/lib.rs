//! Tender Common Types
//!
//! Currency units, the three monetary amount representations, rounding
//! contexts and policies, and the operator/query extension points shared by
//! the Tender crates.

pub mod amount;
pub mod config;
pub mod context;
pub mod currency;
pub mod error;
pub mod fast;
pub mod functions;
pub mod money;
pub mod number;
pub mod operator;
pub mod registry;
pub mod rounded;
pub mod rounding;

pub use amount::*;
pub use config::*;
pub use context::*;
pub use currency::*;
pub use error::*;
pub use fast::*;
pub use functions::*;
pub use money::*;
pub use number::*;
pub use operator::*;
pub use registry::*;
pub use rounded::*;
pub use rounding::*;
