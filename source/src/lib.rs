pub mod binaries;
pub mod bsp;
pub mod config;
pub mod error;
pub mod meshes;
pub mod prelude;

#[cfg(test)]
mod test_util;
