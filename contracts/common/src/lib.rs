//! OrbitYield - shared contract helpers (Soroban)
//! Two-step admin handover and the basis-point arithmetic kernels used by
//! every reward and score computation in the workspace.

#![no_std]

pub mod admin;
pub mod math;
