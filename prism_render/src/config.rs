/// Shader manager configuration

/// Tunables of the `ShaderManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderManagerConfig {
    /// Extra frames a replaced GPU object is kept alive on top of the device's
    /// command buffering count
    pub deferred_destruction_headroom: u32,
    /// Log a warning when a name or handle lookup misses
    pub warn_on_missing_lookup: bool,
}

impl Default for ShaderManagerConfig {
    fn default() -> Self {
        Self {
            deferred_destruction_headroom: 1,
            warn_on_missing_lookup: true,
        }
    }
}

impl ShaderManagerConfig {
    /// Number of frames a replaced object must survive before it is released
    pub fn age_limit(&self, command_buffering_count: u32) -> u64 {
        command_buffering_count as u64 + self.deferred_destruction_headroom as u64
    }
}
