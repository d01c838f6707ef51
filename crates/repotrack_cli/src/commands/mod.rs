pub(crate) mod commits;
pub(crate) mod menu;
pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod refresh;
pub(crate) mod repo;
pub(crate) mod shared;
