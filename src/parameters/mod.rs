//! # Parameter System
//!
//! Parameters are the model inputs a fit is allowed to change. Each one has
//! an initial guess (scalar or array), element-wise bounds and a fixed flag.
//!
//! ## Core Components
//!
//! - [`Parameter`]: a symbol with guess, bounds and fixed flag
//! - [`Parameters`]: an ordered set with unique names, split into free and
//!   fixed [`ParameterView`]s
//! - [`ParameterSelector`]: which model inputs become parameters
//! - [`pack`] / [`unpack`]: flatten named values for the optimizer and back
//!
//! ## Example Usage
//!
//! ```rust
//! use smitfit::model::Model;
//!
//! let model = Model::parse(["y == a * x + b"]).unwrap();
//! let mut params = model.define_parameters("a b").unwrap();
//!
//! params.set_guesses([("a", 0.5)]).unwrap();
//! params.set_bounds([("b", (0.0, 10.0))]).unwrap();
//! params.fix("b").unwrap();
//!
//! assert_eq!(params.free().names(), vec!["a"]);
//! assert_eq!(params.fixed().names(), vec!["b"]);
//! ```

pub mod bounds;
pub mod packing;
pub mod parameter;
pub mod parameters;
pub mod selector;

pub use bounds::{Bounds, BoundsError};
pub use packing::{pack, shape_size, unpack, Shapes};
pub use parameter::Parameter;
pub use parameters::{NameList, ParameterView, Parameters};
pub use selector::{glob_match, ParameterSelector};
