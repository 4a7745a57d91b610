mod arena;
mod cursor;
mod handle;
mod node;
mod raw_index;

pub(crate) use cursor::Cursor;
pub(crate) use node::ORDER;
pub(crate) use raw_index::RawIndex;
