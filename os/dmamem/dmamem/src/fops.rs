//! The operations a published device node supports.

use crate::diagnostic::DiagnosticChannel;
use crate::mmap::{Mapped, MappingHandler};
use crate::registry::DeviceRegistry;
use crate::{DmaMemDriver, IoError, MapError};
use dmamem_alloc::CoherentAllocator;
use dmamem_addresses::VirtualAddress;
use dmamem_vmem::{RemapError, UserAddressSpace, VmArea};
use log::{debug, warn};

impl<R: DeviceRegistry, A: CoherentAllocator> DmaMemDriver<R, A> {
    /// Open the device node. Always succeeds.
    #[allow(clippy::unused_self)]
    pub const fn open(&self) {}

    /// Close the device node. Always succeeds.
    #[allow(clippy::unused_self)]
    pub const fn close(&self) {}

    /// Copy up to `len` bytes of the diagnostic message, starting at `*pos`,
    /// to `buf` in the caller's address space and advance `*pos`.
    ///
    /// Returns the number of bytes copied; `0` means end of file.
    ///
    /// # Errors
    /// - [`IoError::NotReady`] before the device is published.
    /// - [`IoError::Fault`] if `buf` is not writable; `*pos` is unchanged.
    pub fn read<S: UserAddressSpace + ?Sized>(
        &self,
        space: &S,
        buf: VirtualAddress,
        len: usize,
        pos: &mut u64,
    ) -> Result<usize, IoError> {
        if self.region().is_none() {
            return Err(IoError::NotReady);
        }
        let chunk = DiagnosticChannel::read(*pos, len);
        if chunk.is_empty() {
            return Ok(0);
        }
        space.copy_to_user(buf, chunk).map_err(|e| {
            debug!("read: {e}");
            IoError::Fault
        })?;
        *pos += chunk.len() as u64;
        Ok(chunk.len())
    }

    /// Back `area` of the caller's address space with the region.
    ///
    /// # Errors
    /// [`MapError::NotReady`] before the device is published, otherwise see
    /// [`MappingHandler::map`].
    pub fn mmap<S: UserAddressSpace + ?Sized>(
        &self,
        space: &mut S,
        area: VmArea,
    ) -> Result<Mapped, MapError> {
        let region = self.region().ok_or(MapError::NotReady)?;
        MappingHandler::new(region, self.config().cache_policy).map(space, area)
    }

    /// Map `requested_size` bytes of the region at an address chosen by
    /// the caller's address space.
    ///
    /// # Errors
    /// As [`mmap`](Self::mmap); [`MapError::MapFailed`] with
    /// [`RemapError::OutOfRange`] if no free range is large enough.
    pub fn map_memory<S: UserAddressSpace + ?Sized>(
        &self,
        space: &mut S,
        requested_size: u64,
    ) -> Result<Mapped, MapError> {
        let available = self.region().ok_or(MapError::NotReady)?.size();
        let invalid = MapError::InvalidArgument {
            requested: requested_size,
            available,
        };
        if requested_size == 0 || requested_size > available {
            warn!("rejecting mapping of {requested_size:#x} bytes, region holds {available:#x}");
            return Err(invalid);
        }
        let start = space
            .get_unmapped_area(requested_size)
            .ok_or(MapError::MapFailed(RemapError::OutOfRange))?;
        let area = VmArea::new(start, requested_size).ok_or(invalid)?;
        self.mmap(space, area)
    }
}
