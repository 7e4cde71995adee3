/// Pipeline cache blob header
///
/// Stored pipeline caches start with the 32-byte header every explicit-API
/// driver writes (header size, header version, vendor id, device id, cache
/// UUID). Data recorded on another device or driver is discarded before it
/// reaches the backend.

use bytemuck::{Pod, Zeroable};

use crate::device::DeviceProperties;

/// Size in bytes of a version-one header
pub const PIPELINE_CACHE_HEADER_SIZE: usize = 32;

/// The only supported header version
pub const PIPELINE_CACHE_HEADER_VERSION_ONE: u32 = 1;

/// Version-one pipeline cache header, as laid out in the blob
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PipelineCacheHeader {
    pub header_size: u32,
    pub header_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub pipeline_cache_uuid: [u8; 16],
}

impl PipelineCacheHeader {
    /// Header describing data produced by `properties`' device
    pub fn new(properties: &DeviceProperties) -> Self {
        Self {
            header_size: PIPELINE_CACHE_HEADER_SIZE as u32,
            header_version: PIPELINE_CACHE_HEADER_VERSION_ONE,
            vendor_id: properties.vendor_id,
            device_id: properties.device_id,
            pipeline_cache_uuid: properties.pipeline_cache_uuid,
        }
    }

    /// Read the header at the start of `data`
    ///
    /// Returns None when the blob is too short, declares a header shorter than
    /// 32 bytes or longer than the blob, or has an unknown header version.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let bytes = data.get(..PIPELINE_CACHE_HEADER_SIZE)?;
        let header: PipelineCacheHeader = bytemuck::pod_read_unaligned(bytes);

        let header_size = header.header_size as usize;
        if header_size < PIPELINE_CACHE_HEADER_SIZE || header_size > data.len() {
            return None;
        }
        if header.header_version != PIPELINE_CACHE_HEADER_VERSION_ONE {
            return None;
        }
        Some(header)
    }

    /// Whether the header was written by a device matching `properties`
    pub fn matches(&self, properties: &DeviceProperties) -> bool {
        self.vendor_id == properties.vendor_id
            && self.device_id == properties.device_id
            && self.pipeline_cache_uuid == properties.pipeline_cache_uuid
    }

    /// Header bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(self).to_vec()
    }
}

/// Whether `data` is a pipeline cache blob usable on `properties`' device
pub fn validate_pipeline_cache_data(data: &[u8], properties: &DeviceProperties) -> bool {
    PipelineCacheHeader::parse(data)
        .map(|header| header.matches(properties))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "pipeline_cache_data_tests.rs"]
mod tests;
