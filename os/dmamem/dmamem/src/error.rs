use crate::LifecycleState;
use crate::registry::RegistryError;
use dmamem_alloc::CoherentAllocError;
use dmamem_vmem::RemapError;

/// Why [`initialize`](crate::DmaMemDriver::initialize) failed.
///
/// Every variant is terminal for the attempt; resources acquired before the
/// failure have already been released when it is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum InitError {
    #[error("device registration failed: {0}")]
    RegistrationFailed(#[from] RegistryError),
    #[error("node has no usable `{property}` reference")]
    MissingReference { property: &'static str },
    #[error("`{property}` has no 64-bit value at index {index}")]
    MalformedDescriptor { property: &'static str, index: usize },
    #[error("reserved region is empty")]
    ZeroSizedRegion,
    #[error("coherent allocation failed: {0}")]
    ResourceExhausted(#[from] CoherentAllocError),
    #[error("cannot initialize from state {0:?}")]
    InvalidState(LifecycleState),
    #[error("region descriptor is already populated")]
    DescriptorOccupied,
}

/// Why a mapping request was refused. The caller's address space is unchanged.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("device is not published")]
    NotReady,
    #[error("requested {requested:#x} bytes, region holds {available:#x}")]
    InvalidArgument { requested: u64, available: u64 },
    #[error("page table installation failed: {0}")]
    MapFailed(#[from] RemapError),
}

/// Why a diagnostic read failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum IoError {
    #[error("device is not published")]
    NotReady,
    #[error("copy to user memory faulted")]
    Fault,
}
