use crate::device::{is_short_id, BoundService, Device, ServiceClass, ServiceInstance};
use crate::error::RegistryError;
use crate::notify::{HostCommand, Notifier};
use crate::{dl_debug, dl_info};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Device registry query surface used by the configuration resolver.
///
/// Implementations own the device data, the resolver only reads it.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Return the default service instance of class `class`
    /// (the last picked or the only discovered one).
    async fn resolve_default_service_instance(
        &self,
        class: ServiceClass,
    ) -> Result<BoundService, RegistryError>;

    /// Return the first device, in registry order, that runs a service of class `class`
    /// and has short id equal to `short_id` (case-insensitive).
    async fn find_device_by_short_id(
        &self,
        class: ServiceClass,
        short_id: &str,
    ) -> Result<Option<Arc<Device>>, RegistryError>;

    /// Return device by its long-form id.
    async fn find_device_by_id(&self, device_id: &str)
        -> Result<Option<Arc<Device>>, RegistryError>;
}

/// Cached operator choice of the active service.
#[derive(Debug, Clone, PartialEq)]
struct Selection {
    device_id: String,
    class: ServiceClass,
    service_index: usize,
}

/// In-process registry.
///
/// Devices are kept in insertion order, this order is used when several
/// devices share the same short id (first match wins).
pub struct MemoryRegistry {
    devices: RwLock<Vec<Arc<Device>>>,
    selection: Mutex<Option<Selection>>,
    notifier: Arc<dyn Notifier>,
}

impl MemoryRegistry {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            devices: RwLock::default(),
            selection: Mutex::default(),
            notifier,
        }
    }

    /// Create registry from TOML device list.
    ///
    /// # Arguments
    ///
    /// * `data`: TOML document with `[[device]]` tables
    /// * `notifier`: host surface used for the "pick device" command
    pub fn from_toml(data: &str, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let file: RegistryFile = toml::from_str(data).context("parse device list")?;
        let registry = Self::new(notifier);
        file.devices
            .into_iter()
            .map(Device::from)
            .for_each(|device| registry.add_device(device));
        Ok(registry)
    }

    /// Load registry from TOML file at `path`.
    pub fn from_file(path: &Path, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read device list {}", path.display()))?;
        Self::from_toml(&data, notifier)
    }

    /// Add a device or replace a device with the same id (keeping its position).
    pub fn add_device(&self, device: Device) {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        match devices
            .iter_mut()
            .find(|d| d.device_id() == device.device_id())
        {
            Some(existing) => *existing = Arc::new(device),
            None => {
                dl_debug!(
                    target: "registry",
                    "device {} ({}) announced",
                    device.device_id(),
                    device.short_id()
                );
                devices.push(Arc::new(device));
            }
        }
    }

    /// Remove a device, return true if it was known.
    pub fn remove_device(&self, device_id: &str) -> bool {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let len = devices.len();
        devices.retain(|d| d.device_id() != device_id);
        len != devices.len()
    }

    /// Return all devices in registry order.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return devices running a service of class `class`, in registry order.
    pub fn devices_with_service(&self, class: ServiceClass) -> Vec<Arc<Device>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.has_service(class))
            .cloned()
            .collect()
    }

    fn device(&self, device_id: &str) -> Option<Arc<Device>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| d.device_id() == device_id)
            .cloned()
    }

    /// Remember the operator choice of the active service.
    /// Return false if the device or service does not exist.
    pub fn select(&self, device_id: &str, class: ServiceClass, service_index: usize) -> bool {
        let Some(service) = self
            .device(device_id)
            .and_then(|d| d.bind_service(class, service_index))
        else {
            return false;
        };

        dl_info!(
            target: "registry",
            "select device {} service #{service_index}",
            service.device().short_id()
        );
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = Some(Selection {
            device_id: device_id.to_string(),
            class,
            service_index,
        });
        true
    }

    /// Like [`MemoryRegistry::select`] but `name` is either a long-form device id or
    /// a short id of a device running a service of class `class`.
    pub fn select_by_name(&self, name: &str, class: ServiceClass, service_index: usize) -> bool {
        let device_id = match self.device(name) {
            Some(device) => device.device_id().to_string(),
            None if is_short_id(name) => match self.device_by_short_id(class, name) {
                Some(device) => device.device_id().to_string(),
                None => return false,
            },
            None => return false,
        };
        self.select(&device_id, class, service_index)
    }

    fn device_by_short_id(&self, class: ServiceClass, short_id: &str) -> Option<Arc<Device>> {
        self.devices_with_service(class)
            .into_iter()
            .find(|d| d.short_id().eq_ignore_ascii_case(short_id))
    }

    /// Return currently selected service if it is still present in the registry.
    pub fn selected(&self, class: ServiceClass) -> Option<BoundService> {
        let selection = self
            .selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        if selection.class != class {
            return None;
        }
        self.device(&selection.device_id)?
            .bind_service(class, selection.service_index)
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    async fn resolve_default_service_instance(
        &self,
        class: ServiceClass,
    ) -> Result<BoundService, RegistryError> {
        if let Some(selected) = self.selected(class) {
            return Ok(selected);
        }

        let mut candidates = self
            .devices_with_service(class)
            .into_iter()
            .flat_map(|device| {
                let count = device.services_of_class(class).count();
                (0..count).filter_map(move |idx| device.bind_service(class, idx))
            })
            .collect::<Vec<_>>();

        match candidates.len() {
            0 => Err(RegistryError::NotFound(class)),
            1 => {
                let service = candidates.remove(0);
                self.select(service.device().device_id(), class, service.service_index());
                Ok(service)
            }
            n => {
                dl_info!(
                    target: "registry",
                    "{n} candidates for service {class}, ask operator to pick one"
                );
                self.notifier
                    .execute_command(HostCommand::PickDeviceScriptManager);
                Err(RegistryError::NotFound(class))
            }
        }
    }

    async fn find_device_by_short_id(
        &self,
        class: ServiceClass,
        short_id: &str,
    ) -> Result<Option<Arc<Device>>, RegistryError> {
        Ok(self.device_by_short_id(class, short_id))
    }

    async fn find_device_by_id(
        &self,
        device_id: &str,
    ) -> Result<Option<Arc<Device>>, RegistryError> {
        Ok(self.device(device_id))
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "device")]
    devices: Vec<DeviceEntry>,
}

#[derive(Deserialize)]
struct DeviceEntry {
    id: String,
    short_id: Option<String>,
    #[serde(default, rename = "service")]
    services: Vec<ServiceEntry>,
}

#[derive(Deserialize)]
struct ServiceEntry {
    class: ServiceClass,
    runtime_version: Option<String>,
}

impl From<DeviceEntry> for Device {
    fn from(entry: DeviceEntry) -> Self {
        let services = entry
            .services
            .into_iter()
            .map(|s| {
                let instance = ServiceInstance::new(s.class);
                match s.runtime_version {
                    Some(v) => instance.with_runtime_version(v),
                    None => instance,
                }
            })
            .collect();

        let device = Device::new(entry.id, services);
        match entry.short_id {
            Some(short_id) => device.with_short_id(short_id),
            None => device,
        }
    }
}
