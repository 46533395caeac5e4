pub(crate) mod common;
mod visibility;
