//! The classifier module covers the backend round trip for a sensor frame and
//! the cosmetic color preview derived locally from the same readings.

pub mod client;
pub mod color;
pub mod result;

pub use client::{Classifier, HttpClassifier};
pub use color::{simulated_readings, ColorPreview, Lab, Rgb};
pub use result::{ClassificationResponse, ClassificationResult};
