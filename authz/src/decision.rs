//! Authorization decisions returned by the decision engine.

use serde::{Deserialize, Serialize};

/// The only verdict string that grants access.
pub const PERMISSION_ALLOW: &str = "ALLOW";

/// Verdict string reported by engines that explicitly deny.
pub const PERMISSION_DENY: &str = "DENY";

/// Diagnostic metadata attached to a decision. Logged, never shown to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Ids of the policies that determined the verdict
    pub determining_policies: Vec<String>,

    /// Errors the engine hit while evaluating policies
    pub errors: Vec<String>,
}

/// A decision as reported by the engine.
///
/// The verdict is kept as the raw engine string (or its absence) so that an
/// unexpected value can never be mistaken for ALLOW.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Option<String>,
    pub diagnostics: Diagnostics,
}

impl Decision {
    pub fn new(verdict: Option<String>, diagnostics: Diagnostics) -> Self {
        Self {
            verdict,
            diagnostics,
        }
    }

    pub fn allow() -> Self {
        Self::new(Some(PERMISSION_ALLOW.to_string()), Diagnostics::default())
    }

    pub fn deny() -> Self {
        Self::new(Some(PERMISSION_DENY.to_string()), Diagnostics::default())
    }

    /// True only for a verdict exactly equal to [`PERMISSION_ALLOW`].
    ///
    /// # Security Note
    /// This must stay an equality check against ALLOW. Comparing against DENY
    /// instead would fail open on any verdict the engine adds later.
    pub fn is_allow(&self) -> bool {
        self.verdict.as_deref() == Some(PERMISSION_ALLOW)
    }
}
