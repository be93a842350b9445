//! Protocol revisions and their per-revision rules.

use thiserror::Error;

/// The protocol revisions this node knows how to execute.
///
/// The set is closed: a block whose revision is not listed here cannot be processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Revision {
    /// Launch rules.
    Zero = 0,
    /// Withdrawals and per-sender nonce ordering.
    One = 1,
    /// Set-code transactions with delegated authorities.
    Two = 2,
    /// Reserve balance enforcement.
    Three = 3,
}

/// Behavior switches that differ between revisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevisionRules {
    /// Blocks must carry withdrawals (and a withdrawals root); otherwise they must not.
    pub withdrawals: bool,
    /// Set-code transactions carrying authorization lists are accepted.
    pub authorizations: bool,
    /// A sender's transactions within a block must carry contiguous nonces.
    pub nonce_ordering: bool,
    /// Transactions leaving their sender below the reserve balance are reverted.
    pub reserve_balance: bool,
}

impl Revision {
    /// The most recent known revision.
    pub const LATEST: Self = Self::Three;

    /// The rules in force under this revision.
    pub const fn rules(self) -> RevisionRules {
        match self {
            Self::Zero => RevisionRules {
                withdrawals: false,
                authorizations: false,
                nonce_ordering: false,
                reserve_balance: false,
            },
            Self::One => RevisionRules {
                withdrawals: true,
                authorizations: false,
                nonce_ordering: true,
                reserve_balance: false,
            },
            Self::Two => RevisionRules {
                withdrawals: true,
                authorizations: true,
                nonce_ordering: true,
                reserve_balance: false,
            },
            Self::Three => RevisionRules {
                withdrawals: true,
                authorizations: true,
                nonce_ordering: true,
                reserve_balance: true,
            },
        }
    }
}

/// A raw revision number outside the known set.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown revision {0}")]
pub struct UnknownRevision(pub u8);

impl TryFrom<u8> for Revision {
    type Error = UnknownRevision;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(UnknownRevision(other)),
        }
    }
}

/// Compile-time selection of a [`Revision`].
///
/// Block processing is monomorphized per revision so rule checks fold to constants.
pub trait RevisionPolicy: Send + Sync + 'static {
    /// The revision this policy selects.
    const REVISION: Revision;
    /// The rules of [`Self::REVISION`].
    const RULES: RevisionRules = Self::REVISION.rules();
}

macro_rules! revision_policy {
    ($($name:ident => $revision:ident),* $(,)?) => {
        $(
            #[doc = concat!("Policy type for [`Revision::", stringify!($revision), "`].")]
            #[derive(Clone, Copy, Debug, Default)]
            pub struct $name;

            impl RevisionPolicy for $name {
                const REVISION: Revision = Revision::$revision;
            }
        )*
    };
}

revision_policy! {
    RevisionZero => Zero,
    RevisionOne => One,
    RevisionTwo => Two,
    RevisionThree => Three,
}
