//! Configuration management for Tolk.

mod settings;

pub use settings::{
    AnalysisSettings, DiarizationSettings, ServerSettings, Settings, TranscriptionSettings,
};
