//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces that infrastructure
//! adapters must implement:
//! - Assembler: smali source unit -> DEX container
//! - Decompiler: DEX/APK container -> Java source tree

pub mod tools;

pub use tools::{
    AssembleRequest, AssembleResult, Assembler, DecompileResult, Decompiler, OutputScope,
    ToolStatus,
};
