//! Value model, type lattice and vanilla runtime objects for `egg`.
//!
//! This crate is the data model the rest of the pipeline culminates in:
//! - [`Kind`]: the storage/flow-control bit-set shared by values and types
//! - [`Value`]: a tagged union with flow-control bits OR-ed on top
//! - [`Type`]: the structural type lattice with capability queries
//! - [`vanilla`]: duck-typed containers (array, dictionary, key-value,
//!   exception, iterators) implementing the object protocol
//! - [`Execution`]: the capability surface the runtime raises through
//! - [`Basket`]: the cycle-collection hook for reference-counted objects
//!
//! Nothing in this crate parses or type-checks; the `egg-parser` crate
//! consumes these types during preparation, and a future evaluator
//! consumes them during execution.

pub mod basket;
pub mod execution;
pub mod kind;
pub mod location;
pub mod string;
pub mod types;
pub mod value;
pub mod vanilla;

pub use basket::Basket;
pub use execution::{CallArguments, Execution, Parameters, Runtime};
pub use kind::Kind;
pub use location::{RuntimeLocation, SourceLocation};
pub use string::Str;
pub use types::{Assignability, IndexSignature, Parameter, ParameterFlags, Signature, Type};
pub use value::Value;
pub use vanilla::ObjectRef;
