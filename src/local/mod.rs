pub(crate) mod collection;
