//! Biometric unlock capability

/// Platform biometric check (fingerprint reader, face recognition, ...)
pub trait BiometricAuthenticator {
    fn is_available(&self) -> bool;

    /// Ask the user to authenticate, showing `reason`
    fn authenticate(&self, reason: &str) -> bool;
}

/// Used on platforms without a biometric device
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBiometrics;

impl BiometricAuthenticator for NoBiometrics {
    fn is_available(&self) -> bool {
        false
    }

    fn authenticate(&self, _reason: &str) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) struct FixedBiometrics {
    pub available: bool,
    pub succeeds: bool,
}

#[cfg(test)]
impl BiometricAuthenticator for FixedBiometrics {
    fn is_available(&self) -> bool {
        self.available
    }

    fn authenticate(&self, _reason: &str) -> bool {
        self.available && self.succeeds
    }
}
