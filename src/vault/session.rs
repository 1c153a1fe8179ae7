//! Vault session state machine
//!
//! ```text
//! Uninitialized --setup--> Unlocked <--unlock-- Locked
//!                             |                   |  \
//!                             +-------lock------->+   begin_recovery
//!                                                 |        |
//!                      begin_full_reset <---------+   Recovery(Answer)
//!                              |                           | correct answer
//!                     FullReset(Warning)              Recovery(NewPassword)
//!                              | acknowledge               | new password
//!                FullReset(TypedConfirmation)          Unlocked
//!                              | "SUPPRIMER"
//!                        Uninitialized
//! ```

use std::fmt;

use crate::crypto::SecureString;
use crate::error::{MaterielError, MaterielResult};
use crate::models::{VaultItem, VaultItemId};
use crate::storage::Storage;

use super::biometric::BiometricAuthenticator;
use super::documents::{DocumentVault, NewDocument};
use super::password::{validate_recovery, PasswordManager, SecretLocation};

/// Text the user must type to confirm a full reset
pub const RESET_CONFIRMATION: &str = "SUPPRIMER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    Answer,
    NewPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    Warning,
    TypedConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Locked,
    Unlocked,
    Recovery(RecoveryStep),
    FullReset(ResetStep),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Locked => write!(f, "locked"),
            SessionState::Unlocked => write!(f, "unlocked"),
            SessionState::Recovery(RecoveryStep::Answer) => write!(f, "recovery (answer)"),
            SessionState::Recovery(RecoveryStep::NewPassword) => {
                write!(f, "recovery (new password)")
            }
            SessionState::FullReset(ResetStep::Warning) => write!(f, "full reset (warning)"),
            SessionState::FullReset(ResetStep::TypedConfirmation) => {
                write!(f, "full reset (confirmation)")
            }
        }
    }
}

/// Recovery question and answer given at setup
pub struct RecoverySetup<'r> {
    pub question: &'r str,
    pub answer: &'r str,
}

/// A user's session with the vault
pub struct VaultSession<'a> {
    storage: &'a Storage,
    manager: PasswordManager,
    state: SessionState,
    biometrics_enabled: bool,
    /// Answer verified in `Recovery(Answer)`, kept until the new password is set
    verified_answer: Option<SecureString>,
}

impl<'a> VaultSession<'a> {
    pub fn new(storage: &'a Storage, manager: PasswordManager, biometrics_enabled: bool) -> Self {
        let state = if manager.has_password() {
            SessionState::Locked
        } else {
            SessionState::Uninitialized
        };

        Self {
            storage,
            manager,
            state,
            biometrics_enabled,
            verified_answer: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == SessionState::Unlocked
    }

    pub fn recovery_question(&self) -> Option<&str> {
        self.manager.recovery_question()
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "vault state change");
        if !matches!(next, SessionState::Recovery(RecoveryStep::NewPassword)) {
            self.verified_answer = None;
        }
        self.state = next;
    }

    fn require(&self, expected: SessionState, label: &'static str) -> MaterielResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(label))
        }
    }

    fn invalid(&self, expected: &'static str) -> MaterielError {
        MaterielError::InvalidState {
            expected,
            actual: self.state.to_string(),
        }
    }

    fn require_unlocked(&self) -> MaterielResult<()> {
        self.require(SessionState::Unlocked, "unlocked")
    }

    /// Create the vault password, optionally with a recovery question
    pub fn setup(
        &mut self,
        password: &str,
        confirmation: &str,
        recovery: Option<RecoverySetup<'_>>,
    ) -> MaterielResult<SecretLocation> {
        self.require(SessionState::Uninitialized, "uninitialized")?;

        if password != confirmation {
            return Err(MaterielError::Validation("Passwords do not match".into()));
        }
        if let Some(recovery) = &recovery {
            validate_recovery(recovery.question, recovery.answer)?;
        }

        let location = self.manager.set_password(password)?;
        if let Some(recovery) = recovery {
            self.manager
                .set_recovery_question(recovery.question, recovery.answer)?;
        }

        self.transition(SessionState::Unlocked);
        Ok(location)
    }

    /// Unlock with the password; a wrong password leaves the vault locked
    pub fn unlock(&mut self, password: &str) -> MaterielResult<()> {
        self.require(SessionState::Locked, "locked")?;

        if !self.manager.verify_password(password) {
            tracing::info!("vault unlock rejected");
            return Err(MaterielError::InvalidCredentials);
        }

        self.transition(SessionState::Unlocked);
        Ok(())
    }

    /// Unlock through the platform biometric check
    ///
    /// Returns `Ok(false)` when the user fails or cancels the check.
    pub fn unlock_with_biometrics(
        &mut self,
        authenticator: &dyn BiometricAuthenticator,
        reason: &str,
    ) -> MaterielResult<bool> {
        self.require(SessionState::Locked, "locked")?;

        if !self.biometrics_enabled || !authenticator.is_available() {
            return Err(MaterielError::Validation(
                "Biometric unlock is not available".into(),
            ));
        }
        if !self.manager.has_password() {
            return Err(MaterielError::Validation(
                "Biometric unlock requires a vault password".into(),
            ));
        }

        if authenticator.authenticate(reason) {
            self.transition(SessionState::Unlocked);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn lock(&mut self) -> MaterielResult<()> {
        self.require_unlocked()?;
        self.transition(SessionState::Locked);
        Ok(())
    }

    pub fn begin_recovery(&mut self) -> MaterielResult<()> {
        self.require(SessionState::Locked, "locked")?;

        if self.manager.recovery_question().is_none() {
            return Err(MaterielError::Validation(
                "No recovery question has been set".into(),
            ));
        }

        self.transition(SessionState::Recovery(RecoveryStep::Answer));
        Ok(())
    }

    pub fn submit_recovery_answer(&mut self, answer: &str) -> MaterielResult<()> {
        self.require(SessionState::Recovery(RecoveryStep::Answer), "recovery (answer)")?;

        if !self.manager.verify_recovery_answer(answer) {
            tracing::info!("recovery answer rejected");
            return Err(MaterielError::InvalidCredentials);
        }

        self.transition(SessionState::Recovery(RecoveryStep::NewPassword));
        self.verified_answer = Some(SecureString::new(answer));
        Ok(())
    }

    pub fn submit_new_password(
        &mut self,
        new_password: &str,
        confirmation: &str,
    ) -> MaterielResult<SecretLocation> {
        self.require(
            SessionState::Recovery(RecoveryStep::NewPassword),
            "recovery (new password)",
        )?;

        if new_password != confirmation {
            return Err(MaterielError::Validation("Passwords do not match".into()));
        }

        let answer = self
            .verified_answer
            .clone()
            .ok_or_else(|| self.invalid("recovery (answer)"))?;
        let location = self
            .manager
            .reset_password_with_recovery(answer.as_str(), new_password)?;

        self.transition(SessionState::Unlocked);
        Ok(location)
    }

    pub fn begin_full_reset(&mut self) -> MaterielResult<()> {
        match self.state {
            SessionState::Locked | SessionState::Recovery(_) => {
                self.transition(SessionState::FullReset(ResetStep::Warning));
                Ok(())
            }
            _ => Err(self.invalid("locked or recovery")),
        }
    }

    pub fn acknowledge_reset_warning(&mut self) -> MaterielResult<()> {
        self.require(
            SessionState::FullReset(ResetStep::Warning),
            "full reset (warning)",
        )?;
        self.transition(SessionState::FullReset(ResetStep::TypedConfirmation));
        Ok(())
    }

    /// Erase the password, the recovery data and every vault document
    ///
    /// Returns the number of documents deleted.
    pub fn confirm_full_reset(&mut self, typed: &str) -> MaterielResult<usize> {
        self.require(
            SessionState::FullReset(ResetStep::TypedConfirmation),
            "full reset (confirmation)",
        )?;

        if typed.trim() != RESET_CONFIRMATION {
            return Err(MaterielError::Validation(format!(
                "Type {} to confirm the reset",
                RESET_CONFIRMATION
            )));
        }

        let removed = DocumentVault::new(self.storage).wipe_all()?;
        self.manager.remove_content_key()?;
        self.manager.remove_password()?;
        tracing::warn!(documents = removed, "vault fully reset");

        self.transition(SessionState::Uninitialized);
        Ok(removed)
    }

    /// Leave recovery or reset and go back to the lock screen
    pub fn cancel(&mut self) -> MaterielResult<()> {
        match self.state {
            SessionState::Recovery(_) | SessionState::FullReset(_) => {
                self.transition(SessionState::Locked);
                Ok(())
            }
            _ => Err(self.invalid("recovery or full reset")),
        }
    }

    pub fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> MaterielResult<SecretLocation> {
        self.require_unlocked()?;

        if new_password != confirmation {
            return Err(MaterielError::Validation("Passwords do not match".into()));
        }
        self.manager.change_password(old_password, new_password)
    }

    /// Replace the recovery question and answer
    pub fn set_recovery(&mut self, question: &str, answer: &str) -> MaterielResult<SecretLocation> {
        self.require_unlocked()?;
        self.manager.set_recovery_question(question, answer)
    }

    pub fn add_document(&mut self, doc: NewDocument) -> MaterielResult<VaultItem> {
        self.require_unlocked()?;
        let key = self.manager.content_key()?;
        DocumentVault::new(self.storage).add(&key, doc)
    }

    pub fn list_documents(&self) -> MaterielResult<Vec<VaultItem>> {
        self.require_unlocked()?;
        DocumentVault::new(self.storage).list()
    }

    pub fn read_document(&mut self, id: VaultItemId) -> MaterielResult<(VaultItem, Vec<u8>)> {
        self.require_unlocked()?;
        let key = self.manager.content_key()?;
        DocumentVault::new(self.storage).read(&key, id)
    }

    pub fn delete_document(&self, id: VaultItemId) -> MaterielResult<VaultItem> {
        self.require_unlocked()?;
        DocumentVault::new(self.storage).delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MaterielPaths;
    use crate::vault::biometric::{FixedBiometrics, NoBiometrics};
    use crate::vault::password::tests::Fixture;

    struct Harness {
        fx: Fixture,
        storage: Storage,
    }

    impl Harness {
        fn new() -> Self {
            let fx = Fixture::new();
            let paths = MaterielPaths::with_base_dir(fx.dir.path().join("data"));
            let storage = Storage::new(paths).unwrap();
            storage.load_all().unwrap();
            Self { fx, storage }
        }

        fn session(&self) -> VaultSession<'_> {
            VaultSession::new(&self.storage, self.fx.manager(), true)
        }
    }

    fn doc(content: &[u8]) -> NewDocument {
        NewDocument {
            title: "Photo perceuse".into(),
            kind: None,
            file_name: "perceuse.jpg".into(),
            material_id: None,
            notes: String::new(),
            content: content.to_vec(),
        }
    }

    fn setup_with_recovery(session: &mut VaultSession<'_>) {
        session
            .setup(
                "Secret1",
                "Secret1",
                Some(RecoverySetup {
                    question: "Ville natale ?",
                    answer: "Lyon",
                }),
            )
            .unwrap();
    }

    #[test]
    fn test_initial_state() {
        let h = Harness::new();
        assert_eq!(h.session().state(), SessionState::Uninitialized);

        let mut session = h.session();
        setup_with_recovery(&mut session);
        assert_eq!(session.state(), SessionState::Unlocked);

        assert_eq!(h.session().state(), SessionState::Locked);
    }

    #[test]
    fn test_setup_requires_matching_confirmation() {
        let h = Harness::new();
        let mut session = h.session();

        assert!(session.setup("Secret1", "Secret2", None).unwrap_err().is_validation());
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_setup_rejects_bad_recovery_before_storing() {
        let h = Harness::new();
        let mut session = h.session();

        let bad = RecoverySetup {
            question: "Ville ?",
            answer: "x",
        };
        assert!(session.setup("Secret1", "Secret1", Some(bad)).is_err());
        assert!(h.fx.primary.is_empty());
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_setup_only_once() {
        let h = Harness::new();
        let mut session = h.session();
        setup_with_recovery(&mut session);

        let err = session.setup("Other1", "Other1", None).unwrap_err();
        assert!(matches!(err, MaterielError::InvalidState { .. }));
    }

    #[test]
    fn test_unlock_and_lock() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = h.session();
        assert!(matches!(
            session.unlock("secret1"),
            Err(MaterielError::InvalidCredentials)
        ));
        assert_eq!(session.state(), SessionState::Locked);

        session.unlock("Secret1").unwrap();
        assert!(session.is_unlocked());

        session.lock().unwrap();
        assert_eq!(session.state(), SessionState::Locked);
        assert!(session.lock().is_err());
    }

    #[test]
    fn test_documents_require_unlocked() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = h.session();
        assert!(matches!(
            session.list_documents(),
            Err(MaterielError::InvalidState { .. })
        ));
        assert!(session.add_document(doc(b"x")).is_err());

        session.unlock("Secret1").unwrap();
        let item = session.add_document(doc(b"jpeg")).unwrap();
        let (_, content) = session.read_document(item.id).unwrap();
        assert_eq!(content, b"jpeg");
        assert_eq!(session.list_documents().unwrap().len(), 1);

        session.delete_document(item.id).unwrap();
        assert!(session.list_documents().unwrap().is_empty());
    }

    #[test]
    fn test_recovery_flow() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = h.session();
        session.begin_recovery().unwrap();
        assert_eq!(session.recovery_question(), Some("Ville natale ?"));

        assert!(session.submit_recovery_answer("Paris").is_err());
        assert_eq!(session.state(), SessionState::Recovery(RecoveryStep::Answer));

        session.submit_recovery_answer(" LYON ").unwrap();
        assert_eq!(
            session.state(),
            SessionState::Recovery(RecoveryStep::NewPassword)
        );

        assert!(session.submit_new_password("Nouveau1", "Nouveau2").is_err());
        session.submit_new_password("Nouveau1", "Nouveau1").unwrap();
        assert!(session.is_unlocked());

        let mut next = h.session();
        assert!(next.unlock("Secret1").is_err());
        next.unlock("Nouveau1").unwrap();
    }

    #[test]
    fn test_recovery_without_question() {
        let h = Harness::new();
        h.session().setup("Secret1", "Secret1", None).unwrap();

        let mut session = h.session();
        assert!(session.begin_recovery().unwrap_err().is_validation());
        assert_eq!(session.state(), SessionState::Locked);
    }

    #[test]
    fn test_cancel_returns_to_locked() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = h.session();
        session.begin_recovery().unwrap();
        session.submit_recovery_answer("lyon").unwrap();
        session.cancel().unwrap();
        assert_eq!(session.state(), SessionState::Locked);

        // the verified answer does not survive a cancel
        session.begin_recovery().unwrap();
        assert!(session.submit_new_password("Nouveau1", "Nouveau1").is_err());

        assert!(session.cancel().is_ok());
        assert!(session.cancel().is_err());
    }

    #[test]
    fn test_full_reset() {
        let h = Harness::new();
        {
            let mut session = h.session();
            setup_with_recovery(&mut session);
            session.add_document(doc(b"1")).unwrap();
            session.add_document(doc(b"2")).unwrap();
        }

        let mut session = h.session();
        assert!(session.acknowledge_reset_warning().is_err());

        session.begin_full_reset().unwrap();
        assert_eq!(session.state(), SessionState::FullReset(ResetStep::Warning));
        assert!(session.confirm_full_reset(RESET_CONFIRMATION).is_err());

        session.acknowledge_reset_warning().unwrap();
        assert!(session.confirm_full_reset("supprimer").unwrap_err().is_validation());
        assert_eq!(
            session.state(),
            SessionState::FullReset(ResetStep::TypedConfirmation)
        );

        assert_eq!(session.confirm_full_reset("SUPPRIMER").unwrap(), 2);
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(h.storage.vault_items.count().unwrap() == 0);
        assert!(h.fx.primary.is_empty());

        session.setup("Fresh1", "Fresh1", None).unwrap();
        assert!(session.is_unlocked());
    }

    #[test]
    fn test_full_reset_from_recovery() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = h.session();
        session.begin_recovery().unwrap();
        session.begin_full_reset().unwrap();
        assert_eq!(session.state(), SessionState::FullReset(ResetStep::Warning));
    }

    #[test]
    fn test_full_reset_not_from_unlocked() {
        let h = Harness::new();
        let mut session = h.session();
        setup_with_recovery(&mut session);

        assert!(session.begin_full_reset().is_err());
        assert!(session.is_unlocked());
    }

    #[test]
    fn test_change_password_while_unlocked() {
        let h = Harness::new();
        let mut session = h.session();
        setup_with_recovery(&mut session);

        assert!(matches!(
            session.change_password("wrong", "Second1", "Second1"),
            Err(MaterielError::InvalidCredentials)
        ));
        session.change_password("Secret1", "Second1", "Second1").unwrap();

        session.lock().unwrap();
        assert!(session.change_password("Second1", "Third1", "Third1").is_err());
        session.unlock("Second1").unwrap();
    }

    #[test]
    fn test_biometric_unlock() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = h.session();
        assert!(session
            .unlock_with_biometrics(&NoBiometrics, "Déverrouiller le coffre")
            .is_err());

        let refused = FixedBiometrics {
            available: true,
            succeeds: false,
        };
        assert!(!session.unlock_with_biometrics(&refused, "test").unwrap());
        assert_eq!(session.state(), SessionState::Locked);

        let accepted = FixedBiometrics {
            available: true,
            succeeds: true,
        };
        assert!(session.unlock_with_biometrics(&accepted, "test").unwrap());
        assert!(session.is_unlocked());
    }

    #[test]
    fn test_biometrics_disabled_in_settings() {
        let h = Harness::new();
        setup_with_recovery(&mut h.session());

        let mut session = VaultSession::new(&h.storage, h.fx.manager(), false);
        let accepted = FixedBiometrics {
            available: true,
            succeeds: true,
        };
        assert!(session.unlock_with_biometrics(&accepted, "test").is_err());
    }
}
