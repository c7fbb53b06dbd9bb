//! # Deep query strings
//!
//! Bitrix24 accepts nested parameters in the PHP bracket convention
//! (`FILTER[NAME]=Bob&SELECT[]=ID&SELECT[]=NAME`). This module converts between
//! that form and [`ParamTree`].
//!
//! - [`encode`] - flatten a nested mapping into a form-urlencoded string
//! - [`decode`] - parse a bracketed form body back into nested mappings
//! - [`tree`] - the [`ParamTree`] value type
//!
//! ```
//! use bitrix24_client::query::{self, ParamTree};
//!
//! let params = ParamTree::map()
//!     .with("FILTER", ParamTree::map().with("NAME", "Bob"))
//!     .with("SELECT", vec!["ID", "NAME"]);
//! assert_eq!(
//!     query::encode(&params).unwrap(),
//!     "FILTER%5BNAME%5D=Bob&SELECT%5B%5D=ID&SELECT%5B%5D=NAME"
//! );
//! ```

pub mod decode;
pub mod encode;
pub mod tree;

pub use decode::{decode, decode_with_separator};
pub use encode::{encode, encode_map};
pub use tree::{ParamMap, ParamTree, Scalar};
