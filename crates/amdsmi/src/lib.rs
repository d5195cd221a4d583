//! Bindings to the AMD System Management Interface library (`libamd_smi`).
//!
//! [`AmdSmiLib`] owns one opened module and the entry points resolved from
//! it. The module is either loaded at runtime through the platform dynamic
//! loader ([`DynamicOpener`]) or, with the `static-link` feature, taken from
//! symbols linked at build time. Both paths fill the same [`EntryPoints`]
//! table, so the query API is identical.
//!
//! ```no_run
//! use amdsmi::{AmdSmiLib, InitFlags};
//!
//! let mut lib = AmdSmiLib::dynamic();
//! lib.load()?;
//! lib.init(InitFlags::AMD_GPUS)?;
//! for socket in lib.socket_handles()? {
//!     for processor in lib.processor_handles(&socket)? {
//!         println!("{}", lib.gpu_uuid(&processor)?);
//!     }
//! }
//! lib.shut_down()?;
//! # Ok::<(), amdsmi::Error>(())
//! ```

pub mod device;
pub mod entry_points;
pub mod error;
pub mod library;
pub mod module;
pub mod strings;
pub mod sys;

pub use device::Bdf;
pub use device::BoardInfo;
pub use device::ProcessorHandle;
pub use device::SocketHandle;
pub use device::VramUsage;
pub use entry_points::EntryPoints;
pub use entry_points::Requirement;
pub use error::Error;
pub use error::LoadError;
pub use library::AmdSmiLib;
pub use module::BindingKind;
pub use module::DynamicOpener;
pub use module::Module;
pub use module::ModuleOpener;
#[cfg(feature = "static-link")]
pub use module::StaticOpener;
pub use sys::InitFlags;
pub use sys::ProcessorType;
pub use sys::Status;
