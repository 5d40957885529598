//! Tool adapter implementations.

pub mod jadx;
pub mod mock;
pub mod process;
pub mod registry;
pub mod smali;

pub use jadx::JadxDecompiler;
pub use mock::{MockAssembler, MockDecompiler};
pub use registry::{ToolAvailability, ToolRegistry};
pub use smali::SmaliAssembler;
