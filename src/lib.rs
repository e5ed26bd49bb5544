//! Compile-once JSONPath lookups and in-place replacement.
//!
//! ```
//! use jpq::path::Compiled;
//! use serde_json::json;
//!
//! let plan = Compiled::compile("$.store.book[*].author").unwrap();
//! let doc = json!({"store": {"book": [{"author": "Rees"}, {"author": "Waugh"}]}});
//! assert_eq!(plan.lookup(&doc).unwrap(), json!(["Rees", "Waugh"]));
//! ```

pub mod error;
pub mod format;
pub mod output;
pub mod parser;
pub mod path;

pub use error::{CompileError, EvalError, JpqError};
pub use path::{compile, lookup, lookup_raw, replace, replace_raw, Compiled};
