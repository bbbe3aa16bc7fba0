//! # Driver Lifecycle
//!
//! ```text
//! Uninitialized ─► RegistryBound ─► RegionResolved ─► Allocated ─► Published ─► TornDown
//!       │                │                 │               │                       │
//!       └────────────────┴────── any failure ──────────────┴─► Failed              │
//!       ▲                                                                          │
//!       └──────────────────────────── initialize again ◄───────────────────────────┘
//! ```
//!
//! Initialization is a sequence of reversible steps. If one fails, the
//! steps already taken are undone in reverse order, the instance moves to
//! [`LifecycleState::Failed`], and the specific error is returned.
//!
//! State changes need `&mut self`; the per-call operations take `&self`.
//! The borrow checker therefore keeps teardown from overlapping an
//! in-flight `map_memory` or `read`.

use crate::registry::{DeviceRegistry, InMemoryRegistry, Registration};
use crate::region::{RegionAllocator, RegionDescriptor};
use crate::resolver::RegionDescriptorResolver;
use crate::{DriverConfig, InitError};
use dmamem_alloc::{CoherentAllocator, ReservedPoolAllocator};
use dmamem_sync::WriteOnce;
use dmamem_topology::Node;
use log::{debug, error, info};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    Uninitialized,
    RegistryBound,
    RegionResolved,
    Allocated,
    Published,
    TornDown,
    /// An initialization attempt failed; the instance cannot be reused.
    Failed,
}

/// What an initialization attempt holds at a given point.
#[derive(Default)]
struct Acquired {
    registration: Option<Registration>,
    pool_bound: bool,
    region: Option<RegionDescriptor>,
    descriptor_stored: bool,
}

/// One reserved-memory device.
///
/// Generic over the registration collaborator and the coherent allocator
/// so that the same driver runs against a kernel or against the simulated
/// platform.
pub struct DmaMemDriver<
    R: DeviceRegistry = InMemoryRegistry,
    A: CoherentAllocator = ReservedPoolAllocator,
> {
    config: DriverConfig,
    registry: R,
    allocator: A,
    state: LifecycleState,
    region: WriteOnce<RegionDescriptor>,
    registration: Option<Registration>,
}

impl<R: DeviceRegistry, A: CoherentAllocator> DmaMemDriver<R, A> {
    #[must_use]
    pub const fn new(config: DriverConfig, registry: R, allocator: A) -> Self {
        Self {
            config,
            registry,
            allocator,
            state: LifecycleState::Uninitialized,
            region: WriteOnce::new(),
            registration: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    #[must_use]
    pub const fn allocator(&self) -> &A {
        &self.allocator
    }

    /// The region, once the device is published.
    #[must_use]
    pub fn region(&self) -> Option<&RegionDescriptor> {
        if self.state == LifecycleState::Published {
            self.region.get()
        } else {
            None
        }
    }

    /// Whether `node` is a device this driver binds to.
    #[must_use]
    pub fn matches(&self, node: &Node<'_>) -> bool {
        node.is_compatible(self.config.compatible)
    }

    /// Bus entry point; see [`initialize`](Self::initialize).
    ///
    /// # Errors
    /// See [`InitError`].
    pub fn probe(&mut self, node: &Node<'_>) -> Result<(), InitError> {
        debug!("probing {}", node.path());
        self.initialize(node)
    }

    /// Bus exit point; see [`teardown`](Self::teardown).
    pub fn remove(&mut self) {
        self.teardown();
    }

    /// Register the device, resolve and allocate its region, and publish it.
    ///
    /// # Errors
    /// - [`InitError::InvalidState`] unless the instance is uninitialized or
    ///   torn down.
    /// - Otherwise the error of the failing step, after everything acquired
    ///   so far has been released.
    pub fn initialize(&mut self, node: &Node<'_>) -> Result<(), InitError> {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::TornDown => {}
            state => return Err(InitError::InvalidState(state)),
        }

        let mut acquired = Acquired::default();
        match self.acquire(node, &mut acquired) {
            Ok(()) => {
                self.registration = acquired.registration;
                self.state = LifecycleState::Published;
                info!("{} published", self.config.device_name);
                Ok(())
            }
            Err(e) => {
                self.rollback(acquired);
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    fn acquire(
        &mut self,
        node: &Node<'_>,
        acquired: &mut Acquired,
    ) -> Result<(), InitError> {
        let registration = Registration::acquire(
            &mut self.registry,
            self.config.device_name,
            self.config.class_name,
        )?;
        acquired.registration = Some(registration);
        self.state = LifecycleState::RegistryBound;

        let resolved = RegionDescriptorResolver::new(&self.config).resolve(node)?;
        if resolved.size == 0 {
            error!("Reserved memory region is empty");
            return Err(InitError::ZeroSizedRegion);
        }
        self.state = LifecycleState::RegionResolved;

        let allocator = RegionAllocator::new(&self.allocator, self.config.dma_mask());
        allocator.bind(&resolved.node)?;
        acquired.pool_bound = true;
        let region = allocator.allocate(resolved.size)?;
        acquired.region = Some(region);
        self.region.set(region).map_err(|_| {
            error!("Region descriptor already populated");
            InitError::DescriptorOccupied
        })?;
        acquired.descriptor_stored = true;
        self.state = LifecycleState::Allocated;

        self.registry
            .publish(registration.dev())
            .inspect_err(|_| error!("Failed to publish device"))?;
        Ok(())
    }

    fn rollback(&mut self, acquired: Acquired) {
        if acquired.descriptor_stored {
            self.region.take();
        }
        let allocator = RegionAllocator::new(&self.allocator, self.config.dma_mask());
        if let Some(region) = acquired.region {
            debug!("rollback: freeing region");
            allocator.free(&region);
        }
        if acquired.pool_bound {
            debug!("rollback: releasing pool");
            allocator.unbind();
        }
        if let Some(registration) = acquired.registration {
            debug!("rollback: unregistering {}", registration.dev());
            registration.release(&mut self.registry);
        }
    }

    /// Unpublish the device and release everything it holds.
    ///
    /// A no-op unless the device is published.
    pub fn teardown(&mut self) {
        if self.state != LifecycleState::Published {
            debug!("teardown in state {:?} ignored", self.state);
            return;
        }

        let region = self.region.take();
        let registration = self.registration.take();
        if let Some(registration) = registration {
            self.registry.unpublish(registration.dev());
        }
        self.rollback(Acquired {
            registration,
            pool_bound: true,
            region,
            descriptor_stored: false,
        });
        self.state = LifecycleState::TornDown;
        info!("{} torn down", self.config.device_name);
    }
}

impl<R: DeviceRegistry, A: CoherentAllocator> Drop for DmaMemDriver<R, A> {
    fn drop(&mut self) {
        self.teardown();
    }
}
