mod compile;
mod index;
mod lookup;

pub(crate) use compile::cmd_compile;
pub(crate) use index::cmd_index;
pub(crate) use lookup::cmd_lookup;
