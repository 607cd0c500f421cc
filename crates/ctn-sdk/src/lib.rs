//! # ctn-sdk
//!
//! Public SDK for using ctn service definitions from a Rust program.
//!
//! Provides two main entry points:
//! - [`Loader`](loader::Loader): Compiles a ctn file and the directories it imports from.
//! - [`ContainerBuilder`](builder::ContainerBuilder): Turns a compiled namespace into a ready container.
//!
//! # Example
//!
//! ```rust,no_run
//! use ctn_container::ClassRegistry;
//! use ctn_sdk::builder::ContainerBuilder;
//! use ctn_sdk::loader::Loader;
//!
//! # fn main() -> ctn_common::error::Result<()> {
//! let namespace = Loader::new()
//!     .import_dir("config/services")
//!     .load("config/app.ctn")?;
//! let container = ContainerBuilder::new(namespace)
//!     .registry(ClassRegistry::new())
//!     .build()?;
//! # let _ = container;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod loader;
