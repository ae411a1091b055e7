//! Report generation and the report page controller

pub mod client;
pub mod controller;
pub mod ports;
pub mod state;

pub use client::{GenerateOutcome, ReportGenerationClient};
pub use controller::{ControllerSettings, ReportViewController};
pub use ports::{ReportBackend, SubReportSource};
pub use state::{RegenerateScope, ReportTab, TabContent, TabDescriptor, ViewState};
