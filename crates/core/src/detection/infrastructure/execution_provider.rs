use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};

/// Execution providers to register on a detector session, in priority order.
///
/// The platform accelerator comes first when there is one. CPU is always
/// last so a model still loads on machines without the accelerator.
pub fn detector_execution_providers() -> Vec<ExecutionProviderDispatch> {
    let mut providers = accelerator_providers();
    providers.push(CPUExecutionProvider::default().build());
    providers
}

fn accelerator_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        log::debug!("Requesting CoreML execution provider");
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        log::debug!("Requesting DirectML execution provider");
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}
