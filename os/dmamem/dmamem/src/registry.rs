//! # Device Registration
//!
//! The collaborator that makes the driver reachable: a device number, a
//! character device bound to it, a class, and a device node under that
//! class. [`DeviceRegistry`] exposes those primitives one by one so the
//! driver can acquire them in order and release exactly what it acquired.
//!
//! ```text
//! reserve_numbers ─► add_char_device ─► create_class ─► create_device ─► publish
//!        ▲                  ▲                 ▲                ▲             │
//! release_numbers ◄ remove_char_device ◄ destroy_class ◄ destroy_device ◄ unpublish
//! ```
//!
//! [`InMemoryRegistry`] records all of it in memory and can be told to fail
//! at any [`RegistrationStep`].

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use log::{debug, error};

/// A `major:minor` device number.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl DeviceNumber {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Opaque handle of a created device class.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassId(pub u32);

/// One acquisition step of the registration sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RegistrationStep {
    DeviceNumbers,
    CharDevice,
    Class,
    Device,
    Publish,
}

/// A registration step failed; names the step.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to allocate a device number")]
    DeviceNumbers,
    #[error("failed to add the character device")]
    CharDevice,
    #[error("failed to create the device class")]
    Class,
    #[error("failed to create the device node")]
    Device,
    #[error("failed to publish the device node")]
    Publish,
}

impl From<RegistrationStep> for RegistryError {
    fn from(step: RegistrationStep) -> Self {
        match step {
            RegistrationStep::DeviceNumbers => Self::DeviceNumbers,
            RegistrationStep::CharDevice => Self::CharDevice,
            RegistrationStep::Class => Self::Class,
            RegistrationStep::Device => Self::Device,
            RegistrationStep::Publish => Self::Publish,
        }
    }
}

/// Registration primitives of the hosting environment.
pub trait DeviceRegistry {
    /// Allocate a device number range of one minor under `name`.
    ///
    /// # Errors
    /// [`RegistryError::DeviceNumbers`].
    fn reserve_numbers(&mut self, name: &str) -> Result<DeviceNumber, RegistryError>;
    fn release_numbers(&mut self, dev: DeviceNumber);

    /// Bind a character device to `dev`.
    ///
    /// # Errors
    /// [`RegistryError::CharDevice`].
    fn add_char_device(&mut self, dev: DeviceNumber) -> Result<(), RegistryError>;
    fn remove_char_device(&mut self, dev: DeviceNumber);

    /// # Errors
    /// [`RegistryError::Class`].
    fn create_class(&mut self, name: &str) -> Result<ClassId, RegistryError>;
    fn destroy_class(&mut self, class: ClassId);

    /// Create the device node `name` for `dev` under `class`.
    ///
    /// # Errors
    /// [`RegistryError::Device`].
    fn create_device(
        &mut self,
        class: ClassId,
        dev: DeviceNumber,
        name: &str,
    ) -> Result<(), RegistryError>;
    fn destroy_device(&mut self, class: ClassId, dev: DeviceNumber);

    /// Make the device node visible to callers.
    ///
    /// # Errors
    /// [`RegistryError::Publish`].
    fn publish(&mut self, dev: DeviceNumber) -> Result<(), RegistryError>;
    fn unpublish(&mut self, dev: DeviceNumber);
}

/// What [`Registration::acquire`] obtained.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Registration {
    dev: DeviceNumber,
    class: ClassId,
}

impl Registration {
    /// Run the four acquisition steps, releasing the completed ones in
    /// reverse order if a later one fails.
    ///
    /// # Errors
    /// The [`RegistryError`] of the failing step.
    pub fn acquire<R: DeviceRegistry + ?Sized>(
        registry: &mut R,
        device_name: &str,
        class_name: &str,
    ) -> Result<Self, RegistryError> {
        let dev = registry.reserve_numbers(device_name).inspect_err(|_| {
            error!("Failed to allocate char device region");
        })?;

        if let Err(e) = registry.add_char_device(dev) {
            error!("Failed to add cdev");
            registry.release_numbers(dev);
            return Err(e);
        }

        let class = match registry.create_class(class_name) {
            Ok(class) => class,
            Err(e) => {
                error!("Failed to create class");
                registry.remove_char_device(dev);
                registry.release_numbers(dev);
                return Err(e);
            }
        };

        if let Err(e) = registry.create_device(class, dev, device_name) {
            error!("Failed to create device");
            registry.destroy_class(class);
            registry.remove_char_device(dev);
            registry.release_numbers(dev);
            return Err(e);
        }

        debug!("registered {device_name} as {dev} in class {class_name}");
        Ok(Self { dev, class })
    }

    /// Undo [`acquire`](Self::acquire).
    pub fn release<R: DeviceRegistry + ?Sized>(self, registry: &mut R) {
        registry.destroy_device(self.class, self.dev);
        registry.destroy_class(self.class);
        registry.remove_char_device(self.dev);
        registry.release_numbers(self.dev);
        debug!("unregistered {}", self.dev);
    }

    #[must_use]
    pub const fn dev(&self) -> DeviceNumber {
        self.dev
    }

    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }
}

/// Host-side [`DeviceRegistry`] keeping its bookkeeping in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    next_major: u32,
    next_class: u32,
    fail_at: Option<RegistrationStep>,
    numbers: BTreeMap<DeviceNumber, String>,
    char_devices: BTreeSet<DeviceNumber>,
    classes: BTreeMap<ClassId, String>,
    nodes: BTreeMap<DeviceNumber, (ClassId, String)>,
    published: BTreeSet<DeviceNumber>,
}

impl InMemoryRegistry {
    /// First dynamically allocated major, as on Linux.
    const FIRST_DYNAMIC_MAJOR: u32 = 511;

    #[must_use]
    pub fn new() -> Self {
        Self {
            next_major: Self::FIRST_DYNAMIC_MAJOR,
            ..Self::default()
        }
    }

    /// A registry whose `step` always fails.
    #[must_use]
    pub fn failing_at(step: RegistrationStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::new()
        }
    }

    pub const fn set_fail_at(&mut self, step: Option<RegistrationStep>) {
        self.fail_at = step;
    }

    fn check(&self, step: RegistrationStep) -> Result<(), RegistryError> {
        if self.fail_at == Some(step) {
            Err(step.into())
        } else {
            Ok(())
        }
    }

    /// `/dev` paths of the published nodes.
    #[must_use]
    pub fn published_nodes(&self) -> Vec<String> {
        self.published
            .iter()
            .filter_map(|dev| self.nodes.get(dev))
            .map(|(_, name)| alloc::format!("/dev/{name}"))
            .collect()
    }

    #[must_use]
    pub fn is_published(&self, name: &str) -> bool {
        self.published
            .iter()
            .filter_map(|dev| self.nodes.get(dev))
            .any(|(_, n)| n == name)
    }

    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.values().map(String::as_str).collect()
    }

    /// Whether nothing is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
            && self.char_devices.is_empty()
            && self.classes.is_empty()
            && self.nodes.is_empty()
            && self.published.is_empty()
    }
}

impl DeviceRegistry for InMemoryRegistry {
    fn reserve_numbers(&mut self, name: &str) -> Result<DeviceNumber, RegistryError> {
        self.check(RegistrationStep::DeviceNumbers)?;
        if self.next_major == 0 {
            self.next_major = Self::FIRST_DYNAMIC_MAJOR;
        }
        let dev = DeviceNumber::new(self.next_major, 0);
        self.next_major -= 1;
        self.numbers.insert(dev, name.to_string());
        Ok(dev)
    }

    fn release_numbers(&mut self, dev: DeviceNumber) {
        self.numbers.remove(&dev);
    }

    fn add_char_device(&mut self, dev: DeviceNumber) -> Result<(), RegistryError> {
        self.check(RegistrationStep::CharDevice)?;
        if !self.numbers.contains_key(&dev) {
            return Err(RegistryError::CharDevice);
        }
        self.char_devices.insert(dev);
        Ok(())
    }

    fn remove_char_device(&mut self, dev: DeviceNumber) {
        self.char_devices.remove(&dev);
    }

    fn create_class(&mut self, name: &str) -> Result<ClassId, RegistryError> {
        self.check(RegistrationStep::Class)?;
        if self.classes.values().any(|n| n == name) {
            return Err(RegistryError::Class);
        }
        let id = ClassId(self.next_class);
        self.next_class += 1;
        self.classes.insert(id, name.to_string());
        Ok(id)
    }

    fn destroy_class(&mut self, class: ClassId) {
        self.classes.remove(&class);
    }

    fn create_device(
        &mut self,
        class: ClassId,
        dev: DeviceNumber,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.check(RegistrationStep::Device)?;
        if !self.classes.contains_key(&class) || !self.char_devices.contains(&dev) {
            return Err(RegistryError::Device);
        }
        self.nodes.insert(dev, (class, name.to_string()));
        Ok(())
    }

    fn destroy_device(&mut self, _class: ClassId, dev: DeviceNumber) {
        self.published.remove(&dev);
        self.nodes.remove(&dev);
    }

    fn publish(&mut self, dev: DeviceNumber) -> Result<(), RegistryError> {
        self.check(RegistrationStep::Publish)?;
        if !self.nodes.contains_key(&dev) {
            return Err(RegistryError::Publish);
        }
        self.published.insert(dev);
        Ok(())
    }

    fn unpublish(&mut self, dev: DeviceNumber) {
        self.published.remove(&dev);
    }
}
