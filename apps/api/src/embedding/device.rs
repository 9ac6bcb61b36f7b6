use candle_core::Device;
use tracing::{info, warn};

/// Picks the compute device for the embedding model from the enabled cargo features.
/// Always succeeds: any GPU failure falls back to CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU for embeddings");
                return device;
            }
            Err(e) => warn!(error = %e, "Metal device unavailable"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU for embeddings");
                return device;
            }
            Err(e) => warn!(error = %e, "CUDA device unavailable"),
        }
    }

    if cfg!(any(feature = "metal", feature = "cuda")) {
        warn!("Falling back to CPU for embeddings");
    } else {
        info!("Using CPU for embeddings");
    }
    Device::Cpu
}
