#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use sf_cell as cell;
pub use sf_fields as fields;
