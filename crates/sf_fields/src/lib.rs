#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod container;
mod error;
mod field;
mod leaf;
mod path;

pub mod document;

pub use container::{ContainerField, MemberMap};
pub use error::FieldError;
pub use field::Field;
pub use leaf::{LeafField, Scalar};

pub use leaf::{
    BoolField, F32Field, F64Field, I8Field, I16Field, I32Field, I64Field, StringField, U8Field,
    U16Field, U32Field, U64Field,
};
