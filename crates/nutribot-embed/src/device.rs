use candle_core::Device;
use tracing::info;

/// Metal when built with the `metal` feature and a GPU answers, CPU otherwise.
pub fn select_device() -> Device {
    let device = accelerator().unwrap_or(Device::Cpu);
    info!(device = describe(&device), "Selected embedding device");
    device
}

#[cfg(feature = "metal")]
fn accelerator() -> Option<Device> {
    Device::new_metal(0)
        .map_err(|e| tracing::warn!(error = %e, "Metal unavailable"))
        .ok()
}

#[cfg(not(feature = "metal"))]
fn accelerator() -> Option<Device> {
    None
}

pub fn describe(device: &Device) -> &'static str {
    if device.is_metal() {
        "metal"
    } else if device.is_cuda() {
        "cuda"
    } else {
        "cpu"
    }
}
