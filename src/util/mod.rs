pub mod process;
#[cfg(all(test, unix))]
pub(crate) mod testing;
