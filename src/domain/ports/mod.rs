//! Ports (trait interfaces) for external collaborators.

pub mod record_client;

pub use record_client::{
    FileCreate, HostCreate, HostPatch, PlayCreate, PlayPatch, RecordClient, ResultCreate,
    RunCreate, RunPatch, TaskCreate, TaskPatch,
};
