//! Backend abstraction - Multi-backend support
//!
//! Inference runs on CUDA when the `cuda` feature is enabled and on the
//! NdArray CPU backend otherwise. No autodiff: models are only evaluated.

// --------------------------------------------------------------------------------
// BACKEND SELECTION: CUDA (preferred) or NdArray (fallback)
// --------------------------------------------------------------------------------

#[cfg(feature = "cuda")]
pub type InferenceBackend = burn_cuda::Cuda;

#[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
pub type InferenceBackend = burn_ndarray::NdArray;

#[cfg(all(not(feature = "cuda"), not(feature = "ndarray")))]
compile_error!("At least one backend (cuda, ndarray, or cpu) must be enabled!");

/// Get the default device
pub fn default_device() -> <InferenceBackend as burn::tensor::backend::Backend>::Device {
    <InferenceBackend as burn::tensor::backend::Backend>::Device::default()
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }

    #[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
    {
        "NdArray (CPU)"
    }
}
