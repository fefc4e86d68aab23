//! Device and service instance model shared between the registry and the resolver.
//!
//! A [`Device`] is identified by a long-form `device_id` and carries a human memorable
//! `short_id` alias (two letters and two digits, like `XV42`). Service instances are
//! addressed by their class and position among same-class services on their device.

pub mod registry;

use once_cell::sync;
use regex::Regex;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Service class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ServiceClass(pub u32);

impl ServiceClass {
    /// Script manager service, the one able to deploy and debug programs.
    pub const SCRIPT_MANAGER: ServiceClass = ServiceClass(0x1134ea2b);
}

impl Display for ServiceClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Return true if `id` looks like a short device id (case-insensitive).
pub fn is_short_id(id: &str) -> bool {
    static SHORT_ID_RE: sync::Lazy<Regex> =
        sync::Lazy::new(|| Regex::new(r"^[A-Za-z]{2}[0-9]{2}$").expect("must compile"));
    SHORT_ID_RE.is_match(id)
}

/// Derive a short id from a long-form device id.
///
/// Hex ids are hashed over their decoded bytes, any other id over its utf-8 bytes.
/// The 32-bit FNV-1 hash is folded into 30 bits and rendered as two letters
/// followed by two digits.
pub fn derive_short_id(device_id: &str) -> String {
    let h = fold_hash(fnv1(&id_bytes(device_id)), 30);

    let letter = |n: u32| char::from(b'A' + (n % 26) as u8);
    let digit = |n: u32| char::from(b'0' + (n % 10) as u8);

    [
        letter(h),
        letter(h / 26),
        digit(h / (26 * 26)),
        digit(h / (26 * 26 * 10)),
    ]
    .iter()
    .collect()
}

fn id_bytes(device_id: &str) -> Vec<u8> {
    let is_hex = !device_id.is_empty()
        && device_id.len() % 2 == 0
        && device_id.bytes().all(|b| b.is_ascii_hexdigit());
    if !is_hex {
        return device_id.as_bytes().to_vec();
    }

    device_id
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

fn fnv1(data: &[u8]) -> u32 {
    data.iter()
        .fold(0x811c9dc5_u32, |h, b| h.wrapping_mul(0x1000193) ^ *b as u32)
}

fn fold_hash(h: u32, bits: u32) -> u32 {
    (h ^ (h >> bits)) & ((1 << bits) - 1)
}

/// One running service implementation hosted on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    service_class: ServiceClass,
    /// Position in the whole service table of the owning device.
    service_number: usize,
    runtime_version: Option<String>,
}

impl ServiceInstance {
    pub fn new(service_class: ServiceClass) -> Self {
        Self {
            service_class,
            service_number: 0,
            runtime_version: None,
        }
    }

    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    pub fn service_class(&self) -> ServiceClass {
        self.service_class
    }

    pub fn service_number(&self) -> usize {
        self.service_number
    }

    /// Runtime version reported by the service, if it reports one.
    pub fn runtime_version(&self) -> Option<&str> {
        self.runtime_version.as_deref()
    }
}

/// A device known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    device_id: String,
    short_id: String,
    services: Vec<ServiceInstance>,
}

impl Device {
    /// Create device with a short id derived from its long-form id.
    pub fn new(device_id: impl Into<String>, services: Vec<ServiceInstance>) -> Self {
        let device_id = device_id.into();
        let short_id = derive_short_id(&device_id);
        let services = services
            .into_iter()
            .enumerate()
            .map(|(number, mut service)| {
                service.service_number = number;
                service
            })
            .collect();

        Self {
            device_id,
            short_id,
            services,
        }
    }

    /// Override the derived short id.
    pub fn with_short_id(mut self, short_id: impl Into<String>) -> Self {
        self.short_id = short_id.into();
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    pub fn services(&self) -> &[ServiceInstance] {
        &self.services
    }

    /// Return services of class `class` in device order.
    pub fn services_of_class(
        &self,
        class: ServiceClass,
    ) -> impl Iterator<Item = &ServiceInstance> + '_ {
        self.services
            .iter()
            .filter(move |s| s.service_class == class)
    }

    pub fn has_service(&self, class: ServiceClass) -> bool {
        self.services_of_class(class).next().is_some()
    }

    /// Bind a service of class `class` by its position among same-class services.
    /// Return [`None`] if the index is out of range.
    pub fn bind_service(
        self: &Arc<Self>,
        class: ServiceClass,
        service_index: usize,
    ) -> Option<BoundService> {
        let service_number = self.services_of_class(class).nth(service_index)?.service_number;
        Some(BoundService {
            device: self.clone(),
            service_number,
            service_index,
        })
    }
}

/// Service instance together with its owning device.
#[derive(Debug, Clone)]
pub struct BoundService {
    device: Arc<Device>,
    service_number: usize,
    service_index: usize,
}

impl BoundService {
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn instance(&self) -> &ServiceInstance {
        &self.device.services[self.service_number]
    }

    /// Position of the instance among same-class services of the owning device.
    pub fn service_index(&self) -> usize {
        self.service_index
    }
}

impl PartialEq for BoundService {
    fn eq(&self, other: &Self) -> bool {
        self.device.device_id == other.device.device_id
            && self.service_number == other.service_number
    }
}
