//! Compute device selection for the translation model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::error::{Result, SubtranError};

const NVIDIA_PROBE_PATHS: [&str; 2] = ["/dev/nvidia0", "/proc/driver/nvidia/version"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Use an accelerator when one is present, otherwise the CPU
    #[default]
    Auto,
    Cuda,
    Cpu,
}

impl Device {
    /// Resolve `Auto` against the current machine. Concrete devices are returned as-is.
    pub fn resolve(self) -> Self {
        let cuda_visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
        let resolved = self.resolve_with(cuda_visible.as_deref(), |p| p.exists());
        info!("Using device: {}", resolved);
        resolved
    }

    fn resolve_with<F>(self, cuda_visible: Option<&str>, path_exists: F) -> Self
    where
        F: Fn(&Path) -> bool,
    {
        match self {
            Self::Auto => {
                if let Some(visible) = cuda_visible {
                    let visible = visible.trim();
                    // CUDA treats an empty list or -1 as "no devices"
                    if visible.is_empty() || visible == "-1" {
                        return Self::Cpu;
                    }
                    return Self::Cuda;
                }
                if NVIDIA_PROBE_PATHS.iter().any(|p| path_exists(Path::new(p))) {
                    Self::Cuda
                } else {
                    Self::Cpu
                }
            }
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Device {
    type Err = SubtranError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "cpu" => Ok(Self::Cpu),
            _ => Err(SubtranError::Config(format!(
                "Invalid device '{}'. Valid devices: auto, cuda, cpu",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_device_is_kept() {
        assert_eq!(Device::Cpu.resolve_with(Some("0"), |_| true), Device::Cpu);
        assert_eq!(Device::Cuda.resolve_with(None, |_| false), Device::Cuda);
    }

    #[test]
    fn test_auto_uses_cuda_visible_devices() {
        assert_eq!(Device::Auto.resolve_with(Some("0,1"), |_| false), Device::Cuda);
        assert_eq!(Device::Auto.resolve_with(Some("-1"), |_| true), Device::Cpu);
        assert_eq!(Device::Auto.resolve_with(Some(""), |_| true), Device::Cpu);
    }

    #[test]
    fn test_auto_probes_driver_paths() {
        let found = Device::Auto.resolve_with(None, |p| p == Path::new("/dev/nvidia0"));
        assert_eq!(found, Device::Cuda);
        assert_eq!(Device::Auto.resolve_with(None, |_| false), Device::Cpu);
    }

    #[test]
    fn test_parse() {
        assert_eq!("GPU".parse::<Device>().unwrap(), Device::Cuda);
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert!("tpu".parse::<Device>().is_err());
    }
}
