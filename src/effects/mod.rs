pub(crate) mod background;
pub(crate) mod feather;
pub(crate) mod morphology;
