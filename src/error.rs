//! Error module for the Rusty Synapse library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SynapseError {
    /// Error for a parameter outside of its domain, e.g., a non-positive time constant.
    InvalidParameter(String),
    /// Error for traces whose length does not match the simulation clock.
    IncompatibleTraces(String),
    /// Error for I/O operations, including (de)serialization.
    IOError(String),
}

impl fmt::Display for SynapseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SynapseError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SynapseError::IncompatibleTraces(e) => write!(f, "Incompatible traces: {}", e),
            SynapseError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SynapseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = SynapseError::InvalidParameter("dt must be positive".to_string());
        assert_eq!(error.to_string(), "Invalid parameters: dt must be positive");

        let error = SynapseError::IncompatibleTraces("3 != 4".to_string());
        assert_eq!(error.to_string(), "Incompatible traces: 3 != 4");
    }
}
