//! The five platform configurations.
//!
//! Each module holds one [`PlatformCompiler`](crate::PlatformCompiler)
//! implementation with its runtime library recipe and the literal tool
//! arguments of its converters, linker and disk tools.

mod apple;
mod atari;
mod c64;
mod lynx;
mod oric;

pub use apple::Apple;
pub use atari::Atari;
pub use c64::C64;
pub use lynx::Lynx;
pub use oric::Oric;
